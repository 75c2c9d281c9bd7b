use crate::config::ContextOverrides;
use crate::context::Context;
use anyhow::Result;

pub struct ClustersCommand;

impl ClustersCommand {
    pub fn execute(ctx: &Context, overrides: ContextOverrides<'_>) -> Result<()> {
        let resolved = ctx.resolve_context(overrides)?;
        resolved.require_team()?;

        let clusters = ctx.api.list_clusters()?;
        if clusters.is_empty() {
            ctx.output.info("No clusters found.");
            return Ok(());
        }

        let rows: Vec<Vec<String>> = clusters
            .iter()
            .map(|c| vec![c.name.clone(), c.uuid.clone(), c.kind.clone()])
            .collect();
        ctx.output.table(&["NAME", "UUID", "TYPE"], &rows);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DeployError;
    use crate::test_helpers::{TestEnv, logged_in};

    #[test]
    fn test_lists_clusters() {
        let env = TestEnv::standard();
        ClustersCommand::execute(&env.context(), ContextOverrides::default()).unwrap();

        let (headers, rows) = env.output.first_table().unwrap();
        assert_eq!(headers, vec!["NAME", "UUID", "TYPE"]);
        assert_eq!(rows, vec![vec!["eu-west", "c-1", "eks"]]);
    }

    #[test]
    fn test_requires_team() {
        let env = TestEnv::standard();
        let ctx = env.context_with(crate::config::Config {
            team_uuid: String::new(),
            ..logged_in()
        });

        let err = ClustersCommand::execute(&ctx, ContextOverrides::default()).unwrap_err();
        assert_eq!(
            err.downcast_ref::<DeployError>(),
            Some(&DeployError::MissingContext("team"))
        );
    }

    #[test]
    fn test_team_override() {
        let env = TestEnv::standard();
        let ctx = env.context_with(crate::config::Config {
            team_uuid: String::new(),
            ..logged_in()
        });
        let overrides = ContextOverrides {
            team: Some("platform"),
            ..ContextOverrides::default()
        };

        ClustersCommand::execute(&ctx, overrides).unwrap();
        assert_eq!(env.api.team().as_deref(), Some("t-1"));
        assert!(!env.fs.has_file(&ctx.config_path));
    }
}
