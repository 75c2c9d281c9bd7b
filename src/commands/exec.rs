use crate::cluster::{ClusterAccess, release_selector, shell_command};
use crate::config::ContextOverrides;
use crate::context::Context;
use crate::deploy::{ResourceKind, resolve_entry};
use crate::error::DeployError;
use anyhow::{Context as _, Result};
use tracing::debug;

use super::apps::locate_app;

/// Where and what to run inside an app
#[derive(Debug, Clone, Default)]
pub struct ExecTarget {
    pub command: String,
    pub component: Option<String>,
    pub pod: Option<String>,
    pub container: Option<String>,
}

pub struct ExecCommand;

impl ExecCommand {
    /// Run `sh -c <command>` in a pod of the app's release
    pub fn execute(ctx: &Context, app_query: &str, target: &ExecTarget, overrides: ContextOverrides<'_>) -> Result<()> {
        if target.command.trim().is_empty() {
            return Err(DeployError::MissingRequiredValue("command".to_string()).into());
        }

        let resolved = ctx.resolve_context(overrides)?;
        let app = locate_app(ctx, &resolved, app_query)?;
        let detail = ctx.api.get_app(&app.uuid)?;
        if let Some(component) = target.component.as_deref() {
            resolve_entry(ResourceKind::Component, component, &detail.components)?;
        }

        let response = ctx
            .api
            .project_kubeconfig(&app.project.uuid)
            .context("Failed to get kubeconfig")?;
        let access = ClusterAccess::decode(&response)?;
        let pods = ctx.cluster.connect(&access)?;

        let pod = match target.pod.as_deref() {
            Some(pod) => pod.to_string(),
            None => {
                let selector = release_selector(&detail.stack.name);
                pods.list_pods(&selector)?
                    .into_iter()
                    .next()
                    .map(|pod| pod.name)
                    .ok_or_else(|| {
                        anyhow::anyhow!("No pods found for {} in namespace {}", selector, access.namespace)
                    })?
            }
        };
        debug!(pod = %pod, container = ?target.container, "exec");

        let _in_flight = ctx.cancel.in_flight();
        match pods.exec(&pod, target.container.as_deref(), &shell_command(&target.command))? {
            0 => Ok(()),
            130 => Err(DeployError::Aborted.into()),
            code => anyhow::bail!("Command exited with status {}", code),
        }
    }
}
