use crate::context::Context;
use crate::deploy::schema::REDACTED;
use crate::deploy::{ResourceKind, StackSchema, resolve_entry};
use anyhow::{Context as _, Result};
use serde_json::Value;
use std::path::Path;

pub struct StacksCommand;

impl StacksCommand {
    pub fn execute_list(ctx: &Context) -> Result<()> {
        Self::require_team(ctx)?;
        let stacks = ctx.api.list_stacks()?;
        if stacks.is_empty() {
            ctx.output.info("No stacks found.");
            return Ok(());
        }

        let rows: Vec<Vec<String>> = stacks
            .iter()
            .map(|s| {
                vec![
                    s.name.clone(),
                    s.uuid.clone(),
                    s.version.clone(),
                    s.description.clone(),
                ]
            })
            .collect();
        ctx.output
            .table(&["NAME", "UUID", "VERSION", "DESCRIPTION"], &rows);
        Ok(())
    }

    /// Print a stack's parameters and components
    pub fn execute_show(ctx: &Context, query: &str) -> Result<()> {
        Self::require_team(ctx)?;
        let stacks = ctx.api.list_stacks()?;
        let stack = resolve_entry(ResourceKind::Stack, query, &stacks)?;
        let detail = ctx
            .api
            .get_stack(&stack.uuid)
            .with_context(|| format!("Failed to fetch stack '{}'", stack.name))?;
        let schema = StackSchema::from(&detail);

        ctx.output.section(&format!("Stack: {}", stack.label()));
        ctx.output.key_value("UUID", &stack.uuid);

        if !schema.parameters.is_empty() {
            ctx.output.subsection("Parameters");
            let rows: Vec<Vec<String>> = schema
                .parameters
                .iter()
                .map(|p| {
                    let kind = match p.param_type.as_str() {
                        "" => "-",
                        other => other,
                    };
                    let default = match p.default_label() {
                        Some(_) if p.masked => REDACTED.to_string(),
                        Some(label) => label,
                        None => String::new(),
                    };
                    let masked = if p.masked { "yes" } else { "no" };
                    vec![p.name.clone(), kind.to_string(), default, masked.to_string()]
                })
                .collect();
            ctx.output
                .table(&["NAME", "TYPE", "DEFAULT", "MASKED"], &rows);
        }

        if !detail.components.is_empty() {
            ctx.output.subsection("Components");
            let rows: Vec<Vec<String>> = detail
                .components
                .iter()
                .map(|c| vec![c.name.clone(), c.kind.clone()])
                .collect();
            ctx.output.table(&["NAME", "KIND"], &rows);
        }
        Ok(())
    }

    /// Send a hand-written PATCH body for a deployed app
    pub fn execute_patch_deploy(ctx: &Context, app_uuid: &str, file: &Path) -> Result<()> {
        Self::require_team(ctx)?;
        let raw = ctx
            .fs
            .read_to_string(file)
            .with_context(|| format!("Failed to read patch file {}", file.display()))?;
        let patch: Value = serde_json::from_str(&raw)
            .with_context(|| format!("Patch file {} is not valid JSON", file.display()))?;

        let carries_patch = patch
            .as_object()
            .is_some_and(|body| body.contains_key("components") || body.contains_key("parameters"));
        if !carries_patch {
            anyhow::bail!("Patch file must contain a 'components' or 'parameters' key");
        }

        ctx.api
            .patch_app(app_uuid, &patch)
            .context("Failed to patch deployment")?;
        ctx.output
            .success(&format!("Deployment {} patched", app_uuid));
        Ok(())
    }

    pub fn execute_delete_deploy(ctx: &Context, app_uuid: &str, yes: bool) -> Result<()> {
        Self::require_team(ctx)?;
        if !yes && !ctx.input.confirm(&format!("Delete deployment {}?", app_uuid), false)? {
            ctx.output.info("Aborted.");
            return Ok(());
        }

        ctx.api
            .delete_app(app_uuid)
            .context("Failed to delete deployment")?;
        ctx.output
            .success(&format!("Deployment {} deleted", app_uuid));
        Ok(())
    }

    fn require_team(ctx: &Context) -> Result<()> {
        ctx.resolve_context(Default::default())?.require_team()?;
        Ok(())
    }
}
