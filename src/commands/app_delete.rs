use crate::config::ContextOverrides;
use crate::context::Context;
use anyhow::{Context as _, Result};

use super::apps::locate_app;

pub struct AppDeleteCommand;

impl AppDeleteCommand {
    /// Delete an app from the active (or given) project after confirmation
    pub fn execute(ctx: &Context, app_query: &str, yes: bool, overrides: ContextOverrides<'_>) -> Result<()> {
        let resolved = ctx.resolve_context(overrides)?;
        resolved.require_project()?;
        let app = locate_app(ctx, &resolved, app_query)?;

        if !yes {
            let prompt = format!(
                "Are you sure you want to delete app '{}' (UUID: {}) from project {}?",
                app.name, app.uuid, app.project.name
            );
            if !ctx.input.confirm(&prompt, false)? {
                ctx.output.info("Aborted.");
                return Ok(());
            }
        }

        ctx.api
            .delete_app(&app.uuid)
            .context("Failed to delete app")?;
        ctx.output.success("App deleted successfully!");
        Ok(())
    }
}
