use crate::api::types::{AppDetail, DeployedComponent, StackDeployApp};
use crate::config::{ContextOverrides, ResolvedContext};
use crate::context::Context;
use crate::deploy::{StackSchema, find_app};
use anyhow::Result;
use chrono::{DateTime, Utc};
use serde_json::Value;

pub struct AppsCommand;

impl AppsCommand {
    /// List apps of the active team within the active cluster/project
    pub fn execute_list(ctx: &Context, overrides: ContextOverrides<'_>) -> Result<()> {
        let resolved = ctx.resolve_context(overrides)?;
        resolved.require_team()?;

        let filter = resolved.app_filter();
        let apps: Vec<StackDeployApp> = ctx
            .api
            .list_apps()?
            .into_iter()
            .filter(|app| filter.cluster_uuid.is_none_or(|c| app.cluster.uuid == c))
            .filter(|app| filter.project_uuid.is_none_or(|p| app.project.uuid == p))
            .collect();

        if apps.is_empty() {
            ctx.output.info("No apps found.");
            return Ok(());
        }

        let rows: Vec<Vec<String>> = apps
            .iter()
            .map(|app| {
                vec![
                    app.uuid.clone(),
                    app.name.clone(),
                    app.project.name.clone(),
                    app.cluster.name.clone(),
                    app.status.clone(),
                ]
            })
            .collect();
        ctx.output
            .table(&["UUID", "NAME", "PROJECT", "CLUSTER", "STATUS"], &rows);
        Ok(())
    }

    /// Show an app with its components and parameters
    pub fn execute_info(ctx: &Context, app_query: &str, overrides: ContextOverrides<'_>) -> Result<()> {
        let resolved = ctx.resolve_context(overrides)?;
        let app = locate_app(ctx, &resolved, app_query)?;
        let detail = ctx.api.get_app(&app.uuid)?;
        let now = Utc::now();

        ctx.output.section(&format!("App: {}", detail.name));
        ctx.output.key_value("UUID", &app.uuid);
        ctx.output.key_value("Project", &app.project.name);
        if !app.stack.name.is_empty() {
            ctx.output.key_value("Stack", &stack_label(&app));
        }
        if !app.namespace.is_empty() {
            ctx.output.key_value("Namespace", &app.namespace);
        }
        if let Some(created) = humanize_since(&app.created_at, now) {
            ctx.output.key_value("Created", &created);
        }
        if let Some(deployed) = humanize_since(&app.updated_at, now) {
            ctx.output.key_value("Last Deployed", &deployed);
        }

        ctx.output.subsection("Components");
        for component in &detail.components {
            Self::print_component(ctx, component);
        }

        Self::print_parameters(ctx, &detail);
        Ok(())
    }

    fn print_component(ctx: &Context, component: &DeployedComponent) {
        ctx.output.key_value_highlight("Name", &component.name);
        ctx.output.key_value("Status", &component.status);

        let registry_secret = component
            .app_spec
            .as_ref()
            .map(|spec| spec.registry_secret.as_str())
            .unwrap_or_default();
        let fields = [
            ("Registry Secret", registry_secret),
            ("Build Mode", component.build_mode.as_str()),
            ("Image", component.image.as_str()),
            ("Image Tag", component.image_tag.as_str()),
            ("Git Ref", component.git_ref.as_str()),
            ("Git Repo", component.git_url.as_str()),
            ("Message", component.message.as_str()),
        ];
        for (label, value) in fields {
            if !value.is_empty() {
                ctx.output.key_value(label, value);
            }
        }
        ctx.output.blank();
    }

    fn print_parameters(ctx: &Context, detail: &AppDetail) {
        if detail.parameters.is_empty() {
            return;
        }
        let schema = StackSchema::from(detail);

        ctx.output.subsection("Parameters");
        for param in &detail.parameters {
            let shown = if schema.is_masked(&param.name) {
                "<hidden>".to_string()
            } else {
                match param.value.as_ref().or(param.default_value.as_ref()) {
                    Some(Value::String(s)) => s.clone(),
                    Some(other) => other.to_string(),
                    None => String::new(),
                }
            };
            ctx.output.key_value(&param.name, &shown);
        }
    }
}

/// Look an app up by name or UUID within the active cluster/project.
pub(crate) fn locate_app(ctx: &Context, resolved: &ResolvedContext, query: &str) -> Result<StackDeployApp> {
    resolved.require_team()?;
    let apps = ctx.api.list_apps()?;
    Ok(find_app(query, &apps, &resolved.app_filter())?.clone())
}

fn stack_label(app: &StackDeployApp) -> String {
    if app.stack.version.is_empty() {
        app.stack.name.clone()
    } else {
        format!("{} ({})", app.stack.name, app.stack.version)
    }
}

/// "3 days ago" style rendering of an RFC 3339 timestamp
pub(crate) fn humanize_since(timestamp: &str, now: DateTime<Utc>) -> Option<String> {
    let then = DateTime::parse_from_rfc3339(timestamp).ok()?.with_timezone(&Utc);
    let seconds = (now - then).num_seconds();
    if seconds < 0 {
        return Some("just now".to_string());
    }

    let (amount, unit) = match seconds {
        0..=59 => return Some("just now".to_string()),
        60..=3_599 => (seconds / 60, "minute"),
        3_600..=86_399 => (seconds / 3_600, "hour"),
        86_400..=2_591_999 => (seconds / 86_400, "day"),
        2_592_000..=31_535_999 => (seconds / 2_592_000, "month"),
        _ => (seconds / 31_536_000, "year"),
    };
    let plural = if amount == 1 { "" } else { "s" };
    Some(format!("{} {}{} ago", amount, unit, plural))
}
