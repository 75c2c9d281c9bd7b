use crate::config::ContextOverrides;
use crate::context::Context;
use anyhow::Result;

pub struct ProjectsCommand;

impl ProjectsCommand {
    /// Projects of the active team, narrowed to the active cluster when one is set
    pub fn execute(ctx: &Context, overrides: ContextOverrides<'_>) -> Result<()> {
        let resolved = ctx.resolve_context(overrides)?;
        resolved.require_team()?;

        let projects: Vec<_> = ctx
            .api
            .list_projects()?
            .into_iter()
            .filter(|p| {
                resolved
                    .cluster_uuid
                    .as_deref()
                    .is_none_or(|c| p.cluster.uuid == c)
            })
            .collect();
        if projects.is_empty() {
            ctx.output.info("No projects found.");
            return Ok(());
        }

        let rows: Vec<Vec<String>> = projects
            .iter()
            .map(|p| {
                vec![
                    p.name.clone(),
                    p.uuid.clone(),
                    p.cluster.name.clone(),
                    p.namespace.clone(),
                ]
            })
            .collect();
        ctx.output
            .table(&["NAME", "UUID", "CLUSTER", "NAMESPACE"], &rows);
        Ok(())
    }
}
