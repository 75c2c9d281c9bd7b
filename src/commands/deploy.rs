use crate::config::ContextOverrides;
use crate::context::Context;
use crate::deploy::{DeployInputs, PatchTarget, StackSchema, synthesize};
use anyhow::{Context as _, Result};
use tracing::{debug, info};

use super::apps::locate_app;

pub struct DeployCommand;

impl DeployCommand {
    /// Patch one component of an app, or its parameters.
    ///
    /// With `dry_run` the PATCH body is printed and nothing is sent.
    pub fn execute(
        ctx: &Context,
        app_query: &str,
        inputs: &DeployInputs,
        dry_run: bool,
        overrides: ContextOverrides<'_>,
    ) -> Result<()> {
        let resolved = ctx.resolve_context(overrides)?;
        let app = locate_app(ctx, &resolved, app_query)?;
        let detail = ctx
            .api
            .get_app(&app.uuid)
            .with_context(|| format!("Failed to fetch app '{}'", app.name))?;
        let schema = StackSchema::from(&detail);

        let wants_registry = inputs
            .registry_secret
            .as_deref()
            .is_some_and(|r| !r.is_empty());
        let registries = if wants_registry {
            ctx.api
                .list_registries(&app.project.uuid)
                .context("Failed to list registries for project")?
        } else {
            Vec::new()
        };
        let target = PatchTarget {
            project_name: &app.project.name,
            registries: &registries,
        };

        let request = synthesize(inputs, &schema, &target)?;
        debug!(app = %app.uuid, shape = request.shape(), body = %request.redacted(&schema), "deploy request");

        if dry_run {
            ctx.output.plain("[DRY RUN] PATCH payload:");
            ctx.output
                .plain(&serde_json::to_string_pretty(&request).context("Failed to render payload")?);
            return Ok(());
        }

        ctx.api
            .patch_app(&app.uuid, &request.to_value())
            .context("Deploy failed")?;
        info!(app = %app.name, component = %inputs.component, "deploy request sent");
        ctx.output.success("Deploy request sent successfully.");
        Ok(())
    }
}
