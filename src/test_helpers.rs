//! Fixtures for command tests: a small control plane with one team,
//! cluster, project, registry, stack and deployed app, plus mock wiring.

#![cfg(test)]

use serde_json::json;
use std::sync::Arc;

use crate::api::MockControlPlane;
use crate::cluster::MockCluster;
use crate::api::types::{
    AppDetail, Cluster, DeployedAppSpec, DeployedComponent, NamedRef, Project, Registry, StackComponent,
    StackDeployApp, StackDetail, StackParameter, StackRef, StackSummary, Team,
};
use crate::config::Config;
use crate::context::Context;
use crate::traits::{MockFileSystem, MockOutput, MockResponse, MockUserInput};

pub const TEAM: &str = "t-1";
pub const CLUSTER: &str = "c-1";
pub const PROJECT: &str = "p-1";
pub const STACK: &str = "s-1";
pub const APP: &str = "a-1";

/// Mocks shared with a `Context`, kept typed for assertions
pub struct TestEnv {
    pub fs: Arc<MockFileSystem>,
    pub input: Arc<MockUserInput>,
    pub output: Arc<MockOutput>,
    pub cluster: Arc<MockCluster>,
    pub api: Arc<MockControlPlane>,
}

impl TestEnv {
    pub fn new(api: MockControlPlane) -> Self {
        Self {
            fs: Arc::new(MockFileSystem::new()),
            input: Arc::new(MockUserInput::new()),
            output: Arc::new(MockOutput::new()),
            cluster: Arc::new(MockCluster::new()),
            api: Arc::new(api),
        }
    }

    /// The standard fixture control plane
    pub fn standard() -> Self {
        Self::new(standard_api())
    }

    pub fn with_cluster(mut self, cluster: MockCluster) -> Self {
        self.cluster = Arc::new(cluster);
        self
    }

    pub fn with_responses(self, responses: Vec<MockResponse>) -> Self {
        for response in responses {
            self.input.add_response(response);
        }
        self
    }

    /// Logged in, team selected, no cluster or project
    pub fn context(&self) -> Context {
        self.context_with(logged_in())
    }

    /// Logged in with team and project selected
    pub fn project_context(&self) -> Context {
        self.context_with(Config {
            project_uuid: PROJECT.into(),
            ..logged_in()
        })
    }

    pub fn context_with(&self, config: Config) -> Context {
        let mut ctx = Context::test_with(
            self.fs.clone(),
            self.input.clone(),
            self.output.clone(),
            self.cluster.clone(),
            self.api.clone(),
        );
        ctx.config = config;
        ctx
    }
}

pub fn logged_in() -> Config {
    Config {
        token: "tok".into(),
        team_uuid: TEAM.into(),
        user_email: "ops@example.com".into(),
        ..Config::default()
    }
}

pub fn team(uuid: &str, name: &str) -> Team {
    Team {
        uuid: uuid.into(),
        name: name.into(),
        description: String::new(),
    }
}

pub fn cluster(uuid: &str, name: &str) -> Cluster {
    Cluster {
        uuid: uuid.into(),
        name: name.into(),
        kind: "eks".into(),
    }
}

pub fn project(uuid: &str, name: &str, namespace: &str) -> Project {
    Project {
        uuid: uuid.into(),
        name: name.into(),
        namespace: namespace.into(),
        cluster: NamedRef {
            uuid: CLUSTER.into(),
            name: "eu-west".into(),
        },
        created_at: "2026-01-05T10:00:00Z".into(),
    }
}

pub fn registry(uuid: &str, name: &str) -> Registry {
    Registry {
        uuid: uuid.into(),
        name: name.into(),
        url: "ghcr.io".into(),
        username: "bot".into(),
        ..Registry::default()
    }
}

fn parameter(name: &str, kind: &str, default: serde_json::Value) -> StackParameter {
    StackParameter {
        name: name.into(),
        kind: kind.into(),
        default_value: (!default.is_null()).then_some(default),
        ..StackParameter::default()
    }
}

/// `web-stack`: an app component `web`, a chart `db`, four parameters
pub fn web_stack() -> (StackSummary, StackDetail) {
    let summary = StackSummary {
        uuid: STACK.into(),
        name: "web-stack".into(),
        display_name: "Web Stack".into(),
        description: "Web app with database".into(),
        version: "1.0".into(),
    };
    let detail = StackDetail {
        uuid: STACK.into(),
        name: "web-stack".into(),
        parameters: vec![
            parameter("replicas", "number", json!(1)),
            parameter("env", "string", json!("staging")),
            parameter("db_password", "", serde_json::Value::Null),
            parameter("api_key", "secret", serde_json::Value::Null),
        ],
        components: vec![
            StackComponent {
                name: "web".into(),
                kind: "app".into(),
            },
            StackComponent {
                name: "db".into(),
                kind: "chart".into(),
            },
        ],
    };
    (summary, detail)
}

/// `shop-web`, a deployment of `web-stack` in project `Shop`
pub fn shop_app() -> (StackDeployApp, AppDetail) {
    let stack = StackRef {
        uuid: STACK.into(),
        name: "web-stack".into(),
        version: "1.0".into(),
    };
    let project_ref = NamedRef {
        uuid: PROJECT.into(),
        name: "Shop".into(),
    };
    let app = StackDeployApp {
        uuid: APP.into(),
        name: "shop-web".into(),
        stack: stack.clone(),
        cluster: NamedRef {
            uuid: CLUSTER.into(),
            name: "eu-west".into(),
        },
        project: project_ref.clone(),
        namespace: "shop".into(),
        status: "running".into(),
        created_at: "2026-01-05T10:00:00Z".into(),
        updated_at: "2026-01-06T10:00:00Z".into(),
    };

    let mut replicas = parameter("replicas", "number", json!(1));
    replicas.value = Some(json!(2));
    let mut api_key = parameter("api_key", "secret", serde_json::Value::Null);
    api_key.value = Some(json!("sk-live-123"));

    let detail = AppDetail {
        uuid: APP.into(),
        name: "shop-web".into(),
        stack,
        project: project_ref,
        namespace: "shop".into(),
        components: vec![
            DeployedComponent {
                uuid: "cmp-1".into(),
                name: "web".into(),
                kind: "app".into(),
                status: "running".into(),
                build_mode: "image".into(),
                image: "ghcr.io/acme/web".into(),
                image_tag: "v1".into(),
                app_spec: Some(DeployedAppSpec {
                    registry_secret: "ghcr".into(),
                    ..DeployedAppSpec::default()
                }),
                ..DeployedComponent::default()
            },
            DeployedComponent {
                uuid: "cmp-2".into(),
                name: "db".into(),
                kind: "chart".into(),
                status: "running".into(),
                ..DeployedComponent::default()
            },
        ],
        parameters: vec![replicas, parameter("env", "string", json!("staging")), api_key],
    };
    (app, detail)
}

pub fn standard_api() -> MockControlPlane {
    let (stack, stack_detail) = web_stack();
    let (app, app_detail) = shop_app();
    MockControlPlane::new()
        .with_teams(vec![team(TEAM, "platform"), team("t-2", "payments")])
        .with_clusters(vec![cluster(CLUSTER, "eu-west")])
        .with_projects(vec![project(PROJECT, "Shop", "shop")])
        .with_registries(PROJECT, vec![registry("r-1", "ghcr")])
        .with_stack(stack, stack_detail)
        .with_app(app, app_detail)
}
