use async_trait::async_trait;
use axum::Router;

use crate::settings::Settings;

/// Context handed to modules during the init and start phases
pub struct InitCtx<'a> {
    pub settings: &'a Settings,
}

/// SQL migration contributed by a module
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Migration {
    pub id: &'static str,
    pub up: &'static str,
}

/// A feature module mounted by a LODGE application.
///
/// Modules own their state (stores, services) and expose it through routes.
/// The registry drives the lifecycle: `init` → `start` → ... → `stop`.
#[async_trait]
pub trait Module: Sync + Send {
    /// Unique name, also used as the mount point `/api/{name}`
    fn name(&self) -> &'static str;

    /// Called once at startup, before migrations are collected
    async fn init(&self, _ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        Ok(())
    }

    /// Router for this module's endpoints, already bound to its state
    fn routes(&self) -> Router {
        Router::new()
    }

    /// OpenAPI fragment (`paths` + `components.schemas`) merged into the
    /// application document. Paths are relative to the module mount point.
    fn openapi(&self) -> Option<serde_json::Value> {
        None
    }

    /// Migrations in the order they must be applied
    fn migrations(&self) -> Vec<Migration> {
        vec![]
    }

    async fn start(&self, _ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        Ok(())
    }

    /// Called during shutdown, in reverse registration order
    async fn stop(&self) -> anyhow::Result<()> {
        Ok(())
    }
}
