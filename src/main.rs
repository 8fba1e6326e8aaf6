use anyhow::Context;
use lodge_kernel::settings::Settings;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let settings = Settings::load().with_context(|| "failed to load LODGE settings")?;
    lodge_telemetry::init(&settings.telemetry)?;

    tracing::info!(
        env = ?settings.environment,
        address = %settings.server.bind_address(),
        "lodge-app bootstrap starting"
    );

    lodge_app::run(&settings).await
}
