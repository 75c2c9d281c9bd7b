use crate::config::ContextOverrides;
use crate::context::Context;
use crate::deploy::{CreateTarget, DeploymentRequest, StackSchema, plan_create};
use crate::traits::InputRule;
use anyhow::{Context as _, Result};
use tracing::info;

pub struct AppCreateCommand;

impl AppCreateCommand {
    /// Interactively create an app from a stack in the active project
    pub fn execute(ctx: &Context, dry_run: bool, overrides: ContextOverrides<'_>) -> Result<()> {
        let resolved = ctx.resolve_context(overrides)?;
        resolved.require_team()?;
        let project = resolved.project(ctx.api.as_ref())?;

        let name = ctx
            .input
            .text_validated("Enter app name", None, InputRule::REQUIRED)?;

        let stacks = ctx.api.list_stacks()?;
        if stacks.is_empty() {
            anyhow::bail!("No stacks available for this team");
        }
        let labels: Vec<String> = stacks.iter().map(|s| s.label()).collect();
        let picked = ctx.input.select("Select stack", labels.clone())?;
        let stack = labels
            .iter()
            .position(|label| *label == picked)
            .map(|index| &stacks[index])
            .ok_or_else(|| anyhow::anyhow!("Unknown stack selection: {}", picked))?;

        let detail = ctx
            .api
            .get_stack(&stack.uuid)
            .with_context(|| format!("Failed to fetch stack '{}'", stack.name))?;
        let schema = StackSchema::from(&detail);
        let registries = ctx.api.list_registries(&project.uuid)?;
        if registries.is_empty() {
            ctx.output
                .warning("Project has no registries; components will be created without a registry secret");
        }

        let target = CreateTarget {
            cluster_uuid: resolved
                .cluster_uuid
                .clone()
                .unwrap_or_else(|| project.cluster.uuid.clone()),
            project_uuid: project.uuid.clone(),
            project_name: project.name.clone(),
            namespace: project.namespace.clone(),
            registries,
        };

        let (parameters, request) = plan_create(ctx.input.as_ref(), name.trim(), &schema, &target)?;

        ctx.output.section("Summary");
        ctx.output.key_value_highlight("App", name.trim());
        ctx.output.key_value("Stack", &stack.label());
        ctx.output.key_value("Project", &project.name);
        ctx.output.key_value("Namespace", &project.namespace);
        if !parameters.is_empty() {
            ctx.output.subsection("Parameters");
            for (param, value) in parameters.display_rows(&schema) {
                ctx.output.key_value(&param, &value);
            }
        }
        Self::print_components(ctx, &request);

        if dry_run {
            ctx.output.plain("[DRY RUN] POST payload:");
            ctx.output
                .plain(&serde_json::to_string_pretty(&request).context("Failed to render payload")?);
            return Ok(());
        }

        if !ctx.input.confirm("Create this app?", true)? {
            ctx.output.info("Aborted.");
            return Ok(());
        }

        ctx.api
            .deploy_stack(&stack.uuid, &request.to_value())
            .context("Failed to create app")?;
        info!(app = name.trim(), stack = %stack.name, "app created");
        ctx.output
            .success(&format!("App '{}' created", name.trim()));
        Ok(())
    }

    fn print_components(ctx: &Context, request: &DeploymentRequest) {
        let DeploymentRequest::Create(create) = request else {
            return;
        };
        if create.components.is_empty() {
            return;
        }
        ctx.output.subsection("Components");
        for component in &create.components {
            let mode = component
                .app_spec
                .as_ref()
                .and_then(|spec| spec.mode)
                .map(|m| m.to_string())
                .unwrap_or_default();
            ctx.output.key_value(&component.name, &mode);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::client::Method;
    use crate::error::DeployError;
    use crate::test_helpers::{STACK, TestEnv};
    use crate::traits::{MockResponse, OutputMessage};
    use serde_json::json;

    fn answers(confirm: Option<bool>) -> Vec<MockResponse> {
        let mut responses = vec![
            MockResponse::Text("shop".into()),
            MockResponse::Select("Web Stack (1.0) - Web app with database".into()),
            // replicas, env, db_password, api_key
            MockResponse::Text("3".into()),
            MockResponse::Text(String::new()),
            MockResponse::Text("pg-secret".into()),
            MockResponse::Text("sk-1".into()),
            // component web
            MockResponse::Select("Image".into()),
            MockResponse::Select("ghcr".into()),
            MockResponse::Text("ghcr.io/acme/web".into()),
            MockResponse::Text("v1".into()),
        ];
        if let Some(answer) = confirm {
            responses.push(MockResponse::Confirm(answer));
        }
        responses
    }

    #[test]
    fn test_create_posts_full_request() {
        let env = TestEnv::standard().with_responses(answers(Some(true)));
        AppCreateCommand::execute(&env.project_context(), false, ContextOverrides::default()).unwrap();

        let mutations = env.api.mutations();
        assert_eq!(mutations.len(), 1);
        assert_eq!(mutations[0].method, Method::Post);
        assert_eq!(mutations[0].path, format!("/api/v1/stacks/{}/deploy", STACK));
        assert_eq!(
            mutations[0].body.clone().unwrap(),
            json!({
                "name": "shop",
                "parameters": {"replicas": 3, "env": "staging", "db_password": "pg-secret", "api_key": "sk-1"},
                "context": {"clusterUUID": "c-1", "projectUUID": "p-1", "namespace": "shop"},
                "components": [{
                    "name": "web",
                    "type": "app",
                    "appSpec": {
                        "displayName": "shop web",
                        "description": "shop web component",
                        "registrySecret": "ghcr",
                        "mode": "image",
                        "image": "ghcr.io/acme/web"
                    },
                    "buildSpec": {"imageTag": "v1"}
                }]
            })
        );
        assert!(env.output.has_success());
        assert!(!env.output.to_text().contains("sk-1"));
    }

    #[test]
    fn test_dry_run_sends_nothing() {
        let env = TestEnv::standard().with_responses(answers(None));
        AppCreateCommand::execute(&env.project_context(), true, ContextOverrides::default()).unwrap();

        assert!(env.api.mutations().is_empty());
        assert!(env
            .output
            .contains_message(&OutputMessage::Plain("[DRY RUN] POST payload:".into())));
        assert_eq!(env.input.remaining(), 0);
    }

    #[test]
    fn test_declined_confirmation() {
        let env = TestEnv::standard().with_responses(answers(Some(false)));
        AppCreateCommand::execute(&env.project_context(), false, ContextOverrides::default()).unwrap();

        assert!(env.api.mutations().is_empty());
        assert!(!env.output.has_success());
    }

    #[test]
    fn test_abort_during_prompts() {
        let env = TestEnv::standard().with_responses(vec![
            MockResponse::Text("shop".into()),
            MockResponse::Select("Web Stack (1.0) - Web app with database".into()),
            MockResponse::Abort,
        ]);
        let err = AppCreateCommand::execute(&env.project_context(), false, ContextOverrides::default()).unwrap_err();

        assert_eq!(err.downcast_ref::<DeployError>(), Some(&DeployError::Aborted));
        assert!(env.api.mutations().is_empty());
    }

    #[test]
    fn test_requires_project() {
        let env = TestEnv::standard();
        let err = AppCreateCommand::execute(&env.context(), false, ContextOverrides::default()).unwrap_err();

        assert_eq!(
            err.downcast_ref::<DeployError>(),
            Some(&DeployError::MissingContext("project"))
        );
        assert!(env.input.prompts().is_empty());
    }
}
