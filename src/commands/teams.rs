use crate::context::Context;
use anyhow::Result;

pub struct TeamsCommand;

impl TeamsCommand {
    pub fn execute(ctx: &Context) -> Result<()> {
        ctx.require_login()?;
        let teams = ctx.api.list_teams()?;
        if teams.is_empty() {
            ctx.output.info("No teams found.");
            return Ok(());
        }

        let rows: Vec<Vec<String>> = teams
            .iter()
            .map(|t| vec![t.name.clone(), t.uuid.clone()])
            .collect();
        ctx.output.table(&["NAME", "UUID"], &rows);
        Ok(())
    }
}
