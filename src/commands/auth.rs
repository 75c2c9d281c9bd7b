use crate::config::normalize_api_url;
use crate::context::Context;
use crate::traits::InputRule;
use anyhow::{Context as _, Result};
use tracing::debug;

pub struct LoginCommand;

impl LoginCommand {
    /// Prompt for credentials, store the session token and user details
    pub fn execute(ctx: &Context) -> Result<()> {
        let api_url = ctx.input.text("Enter API URL", Some(&ctx.config.api_url))?;
        let api_url = normalize_api_url(&api_url)?;
        let email = ctx.input.text_validated("Enter email", None, InputRule::REQUIRED)?;
        let password = ctx.input.password("Enter password", None, InputRule::REQUIRED)?;

        ctx.api.set_base_url(&api_url);
        let response = ctx.api.login(email.trim(), &password).context("Login failed")?;

        let mut config = ctx.config.clone();
        config.api_url = api_url;
        config.token = response.token;
        config.user_email = email.trim().to_string();
        if !response.user.team_uuid.is_empty() {
            config.team_uuid = response.user.team_uuid;
        }

        ctx.api.set_token(Some(config.token.clone()));
        ctx.api
            .set_team((!config.team_uuid.is_empty()).then(|| config.team_uuid.clone()));

        match ctx.api.current_user() {
            Ok(user) => {
                if !user.email.is_empty() {
                    config.user_email = user.email;
                }
                config.user_first_name = user.first_name;
                config.user_last_name = user.last_name;
            }
            Err(err) => ctx
                .output
                .warning(&format!("Failed to fetch user info: {:#}", err)),
        }

        ctx.save_config(&config)?;
        debug!(api_url = %config.api_url, "session stored");

        ctx.output.success("Successfully logged in!");
        if config.team_uuid.is_empty() {
            ctx.output
                .dimmed("Select a team with 'kubenest context set-team <team>'");
        }
        Ok(())
    }
}

pub struct LogoutCommand;

impl LogoutCommand {
    pub fn execute(ctx: &Context) -> Result<()> {
        let mut config = ctx.config.clone();
        config.clear_session();
        ctx.save_config(&config)?;
        ctx.output.success("Logged out");
        Ok(())
    }
}
