//! LODGE hotel booking application.
//!
//! Wires the project modules into a [`ModuleRegistry`] and drives their
//! lifecycle around the HTTP server.

pub mod modules;

use anyhow::Context;
use lodge_kernel::{settings::Settings, InitCtx, ModuleRegistry};

pub use modules::*;

/// Register every module and run its init phase
pub async fn bootstrap(settings: &Settings) -> anyhow::Result<ModuleRegistry> {
    let mut registry = ModuleRegistry::new();
    register_all(&mut registry, settings).context("failed to register modules")?;

    let ctx = InitCtx { settings };
    registry.init_all(&ctx).await?;

    Ok(registry)
}

/// Start modules, serve HTTP until shutdown, then stop modules
pub async fn run(settings: &Settings) -> anyhow::Result<()> {
    let registry = bootstrap(settings).await?;
    let ctx = InitCtx { settings };

    registry.start_all(&ctx).await?;
    let served = lodge_http::start_server(&registry, settings).await;
    registry.stop_all().await?;

    served
}
