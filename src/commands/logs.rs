use crate::cluster::{ClusterAccess, LogOptions, LogTarget, release_selector};
use crate::config::ContextOverrides;
use crate::context::Context;
use anyhow::{Context as _, Result};
use tracing::debug;

use super::apps::locate_app;

pub struct LogsCommand;

impl LogsCommand {
    /// Tail (or follow) logs of every container in the app's release
    pub fn execute(
        ctx: &Context,
        app_query: &str,
        follow: bool,
        tail: Option<u32>,
        overrides: ContextOverrides<'_>,
    ) -> Result<()> {
        let resolved = ctx.resolve_context(overrides)?;
        let app = locate_app(ctx, &resolved, app_query)?;
        let detail = ctx.api.get_app(&app.uuid)?;

        let response = ctx
            .api
            .project_kubeconfig(&app.project.uuid)
            .context("Failed to get kubeconfig")?;
        let access = ClusterAccess::decode(&response)?;
        ctx.output.dimmed(&format!("Using namespace: {}", access.namespace));

        let pods = ctx.cluster.connect(&access)?;
        let selector = release_selector(&detail.stack.name);
        let targets = LogTarget::all(&pods.list_pods(&selector)?);
        if targets.is_empty() {
            ctx.output.info(&format!(
                "No pods found for {} in namespace {}",
                selector, access.namespace
            ));
            return Ok(());
        }
        debug!(containers = targets.len(), follow, "streaming logs");

        let options = LogOptions::new(follow, tail);
        let _in_flight = ctx.cancel.in_flight();
        pods.stream_logs(&targets, options, &mut |line| ctx.output.plain(line))
    }
}
