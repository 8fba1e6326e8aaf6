use anyhow::Context;
use clap::{Parser, Subcommand};
use lodge_kernel::settings::Settings;

#[derive(Debug, Parser)]
#[command(name = "lodge", version, about = "LODGE hotel booking service")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run the HTTP server
    Serve,
    /// Print the migrations contributed by every module
    Migrations {
        /// Print the SQL bodies too
        #[arg(long)]
        sql: bool,
    },
    /// Print the merged OpenAPI document
    Openapi,
    /// Print the effective settings
    Config,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let settings = Settings::load().with_context(|| "failed to load LODGE settings")?;

    match cli.command {
        Command::Serve => {
            lodge_telemetry::init(&settings.telemetry)?;
            lodge_app::run(&settings).await
        }
        Command::Migrations { sql } => {
            let registry = lodge_app::bootstrap(&settings).await?;
            for (module, migration) in registry.collect_migrations() {
                println!("{module}/{}", migration.id);
                if sql {
                    println!("{}", migration.up.trim());
                }
            }
            Ok(())
        }
        Command::Openapi => {
            let registry = lodge_app::bootstrap(&settings).await?;
            let doc = lodge_http::router::merged_openapi(&registry);
            println!("{}", serde_json::to_string_pretty(&doc)?);
            Ok(())
        }
        Command::Config => {
            println!("{settings:#?}");
            Ok(())
        }
    }
}
