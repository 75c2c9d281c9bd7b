use crate::api::types::NewRegistry;
use crate::config::ContextOverrides;
use crate::context::Context;
use crate::deploy::{ResourceKind, resolve_entry};
use crate::traits::InputRule;
use anyhow::{Context as _, Result};
use tracing::info;

pub struct RegistryCommand;

impl RegistryCommand {
    /// Container registries of the active project
    pub fn execute_list(ctx: &Context, overrides: ContextOverrides<'_>) -> Result<()> {
        let resolved = ctx.resolve_context(overrides)?;
        let project = resolved.project(ctx.api.as_ref())?;

        let registries = ctx
            .api
            .list_registries(&project.uuid)
            .context("Failed to list registries")?;
        if registries.is_empty() {
            ctx.output
                .info(&format!("No registries found in project {}.", project.name));
            return Ok(());
        }

        let rows: Vec<Vec<String>> = registries
            .iter()
            .map(|r| {
                vec![
                    r.name.clone(),
                    r.uuid.clone(),
                    r.url.clone(),
                    r.username.clone(),
                    r.created_at.clone(),
                ]
            })
            .collect();
        ctx.output
            .table(&["NAME", "UUID", "URL", "USERNAME", "CREATED_AT"], &rows);
        Ok(())
    }

    pub fn execute_add(ctx: &Context, overrides: ContextOverrides<'_>) -> Result<()> {
        let resolved = ctx.resolve_context(overrides)?;
        let project = resolved.project(ctx.api.as_ref())?;

        let registry = NewRegistry {
            name: ctx
                .input
                .text_validated("Registry name", None, InputRule::REQUIRED)?
                .trim()
                .to_string(),
            url: ctx
                .input
                .text_validated("Registry URL", Some("ghcr.io"), InputRule::REQUIRED)?
                .trim()
                .to_string(),
            username: ctx
                .input
                .text_validated("Username", None, InputRule::REQUIRED)?
                .trim()
                .to_string(),
            password: ctx.input.password("Password", None, InputRule::REQUIRED)?,
        };

        ctx.api
            .add_registry(&project.uuid, &registry)
            .context("Failed to add registry")?;
        info!(registry = %registry.name, project = %project.name, "registry added");
        ctx.output.success(&format!(
            "Registry '{}' added to project {}",
            registry.name, project.name
        ));
        Ok(())
    }

    /// Remove a registry, looked up by name or UUID
    pub fn execute_delete(ctx: &Context, query: &str, yes: bool, overrides: ContextOverrides<'_>) -> Result<()> {
        let resolved = ctx.resolve_context(overrides)?;
        let project = resolved.project(ctx.api.as_ref())?;

        let registries = ctx.api.list_registries(&project.uuid)?;
        let registry = resolve_entry(ResourceKind::Registry, query, &registries)?;

        if !yes {
            let prompt = format!(
                "Delete registry '{}' ({}) from project {}?",
                registry.name, registry.uuid, project.name
            );
            if !ctx.input.confirm(&prompt, false)? {
                ctx.output.info("Aborted.");
                return Ok(());
            }
        }

        ctx.api
            .delete_registry(&project.uuid, &registry.uuid)
            .context("Failed to delete registry")?;
        ctx.output
            .success(&format!("Registry '{}' deleted", registry.name));
        Ok(())
    }
}
