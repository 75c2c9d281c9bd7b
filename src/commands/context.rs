use crate::context::Context;
use crate::deploy::{Identified, ResourceKind, resolve_entry};
use crate::error::DeployError;
use anyhow::Result;
use tracing::debug;

pub struct ContextCommand;

impl ContextCommand {
    /// Show the logged-in user and the persisted team/cluster/project
    pub fn execute_show(ctx: &Context) -> Result<()> {
        let config = &ctx.config;
        let user = match config.user_display() {
            Some(user) => user,
            None if config.is_logged_in() => "(token present)".to_string(),
            None => "(not logged in)".to_string(),
        };

        ctx.output.section("Context");
        ctx.output.key_value("Logged in as", &user);

        let team = Self::describe(&config.team_uuid, || ctx.api.list_teams());
        ctx.output.key_value_highlight("Team", &team);

        let scoped = !config.team_uuid.is_empty();
        let cluster = if scoped {
            Self::describe(&config.cluster_uuid, || ctx.api.list_clusters())
        } else {
            "not set".to_string()
        };
        ctx.output.key_value("Cluster", &cluster);

        let project = if scoped {
            Self::describe(&config.project_uuid, || ctx.api.list_projects())
        } else {
            "not set".to_string()
        };
        ctx.output.key_value("Project", &project);

        Ok(())
    }

    /// "name (uuid)" when the UUID can be looked up, the bare UUID otherwise
    fn describe<T: Identified>(uuid: &str, list: impl FnOnce() -> Result<Vec<T>>) -> String {
        if uuid.is_empty() {
            return "not set".to_string();
        }
        match list() {
            Ok(items) => items
                .iter()
                .find(|item| item.uuid() == uuid)
                .map(|item| format!("{} ({})", item.name(), item.uuid()))
                .unwrap_or_else(|| uuid.to_string()),
            Err(err) => {
                debug!(error = %err, "could not resolve context name");
                uuid.to_string()
            }
        }
    }

    pub fn execute_set_team(ctx: &Context, query: &str) -> Result<()> {
        ctx.require_login()?;
        let teams = ctx.api.list_teams()?;
        let team = resolve_entry(ResourceKind::Team, query, &teams)?;

        let mut config = ctx.config.clone();
        config.team_uuid = team.uuid.clone();
        ctx.save_config(&config)?;
        ctx.output
            .success(&format!("Team context set to {} ({})", team.name, team.uuid));
        Ok(())
    }

    pub fn execute_set_cluster(ctx: &Context, query: &str) -> Result<()> {
        Self::require_team(ctx)?;
        let clusters = ctx.api.list_clusters()?;
        let cluster = resolve_entry(ResourceKind::Cluster, query, &clusters)?;

        let mut config = ctx.config.clone();
        config.cluster_uuid = cluster.uuid.clone();
        ctx.save_config(&config)?;
        ctx.output
            .success(&format!("Cluster context set to {} ({})", cluster.name, cluster.uuid));
        Ok(())
    }

    pub fn execute_set_project(ctx: &Context, query: &str) -> Result<()> {
        Self::require_team(ctx)?;
        let projects = ctx.api.list_projects()?;
        let project = resolve_entry(ResourceKind::Project, query, &projects)?;

        let mut config = ctx.config.clone();
        config.project_uuid = project.uuid.clone();
        ctx.save_config(&config)?;
        ctx.output
            .success(&format!("Project context set to {} ({})", project.name, project.uuid));
        Ok(())
    }

    fn require_team(ctx: &Context) -> Result<()> {
        ctx.require_login()?;
        if ctx.config.team_uuid.is_empty() {
            return Err(DeployError::MissingContext("team").into());
        }
        Ok(())
    }
}
