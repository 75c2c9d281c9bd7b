use anyhow::Result;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Mutex;

use super::client::{ControlPlane, Method};
use super::types::{
    AppDetail, Cluster, KubeconfigResponse, LoginResponse, NewRegistry, Project, Registry, StackDeployApp,
    StackDetail, StackSummary, Team, UserInfo,
};
use crate::error::DeployError;

/// Request observed by `MockControlPlane`
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedCall {
    pub method: Method,
    pub path: String,
    pub body: Option<Value>,
}

/// In-memory control plane with canned data that records every call
#[derive(Default)]
pub struct MockControlPlane {
    teams: Vec<Team>,
    clusters: Vec<Cluster>,
    projects: Vec<Project>,
    registries: HashMap<String, Vec<Registry>>,
    stacks: Vec<StackSummary>,
    stack_details: HashMap<String, StackDetail>,
    apps: Vec<StackDeployApp>,
    app_details: HashMap<String, AppDetail>,
    kubeconfigs: HashMap<String, KubeconfigResponse>,
    login: Option<LoginResponse>,
    user: Option<UserInfo>,
    rejection: Mutex<Option<(Method, DeployError)>>,
    calls: Mutex<Vec<RecordedCall>>,
    rejected: Mutex<Vec<RecordedCall>>,
    base_url: Mutex<Option<String>>,
    token: Mutex<Option<String>>,
    team: Mutex<Option<String>>,
}

impl MockControlPlane {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_teams(mut self, teams: Vec<Team>) -> Self {
        self.teams = teams;
        self
    }

    pub fn with_clusters(mut self, clusters: Vec<Cluster>) -> Self {
        self.clusters = clusters;
        self
    }

    pub fn with_projects(mut self, projects: Vec<Project>) -> Self {
        self.projects = projects;
        self
    }

    pub fn with_registries(mut self, project_uuid: &str, registries: Vec<Registry>) -> Self {
        self.registries.insert(project_uuid.to_string(), registries);
        self
    }

    pub fn with_stack(mut self, summary: StackSummary, detail: StackDetail) -> Self {
        self.stack_details.insert(summary.uuid.clone(), detail);
        self.stacks.push(summary);
        self
    }

    pub fn with_app(mut self, app: StackDeployApp, detail: AppDetail) -> Self {
        self.app_details.insert(app.uuid.clone(), detail);
        self.apps.push(app);
        self
    }

    pub fn with_kubeconfig(mut self, project_uuid: &str, kubeconfig: KubeconfigResponse) -> Self {
        self.kubeconfigs.insert(project_uuid.to_string(), kubeconfig);
        self
    }

    pub fn with_login(mut self, response: LoginResponse) -> Self {
        self.login = Some(response);
        self
    }

    pub fn with_user(mut self, user: UserInfo) -> Self {
        self.user = Some(user);
        self
    }

    /// The next call fails with `error` instead of answering
    /// Fail the next `method` call with `error`; earlier calls of other methods go through
    pub fn reject_next(&self, method: Method, error: DeployError) {
        *self.rejection.lock().unwrap() = Some((method, error));
    }

    /// Calls the remote refused; these never show up in `calls`
    pub fn rejected(&self) -> Vec<RecordedCall> {
        self.rejected.lock().unwrap().clone()
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }

    /// Calls that would have changed remote state
    pub fn mutations(&self) -> Vec<RecordedCall> {
        self.calls()
            .into_iter()
            .filter(|c| c.method != Method::Get)
            .collect()
    }

    pub fn base_url(&self) -> Option<String> {
        self.base_url.lock().unwrap().clone()
    }

    pub fn token(&self) -> Option<String> {
        self.token.lock().unwrap().clone()
    }

    pub fn team(&self) -> Option<String> {
        self.team.lock().unwrap().clone()
    }

    fn record(&self, method: Method, path: String, body: Option<Value>) -> Result<()> {
        let call = RecordedCall { method, path, body };
        let mut rejection = self.rejection.lock().unwrap();
        if rejection.as_ref().is_some_and(|(target, _)| *target == method) {
            if let Some((_, error)) = rejection.take() {
                self.rejected.lock().unwrap().push(call);
                return Err(error.into());
            }
        }
        self.calls.lock().unwrap().push(call);
        Ok(())
    }

    fn not_found(what: &str, uuid: &str) -> anyhow::Error {
        DeployError::RemoteRejected {
            status: 404,
            error: format!("{} {} not found", what, uuid),
            code: String::new(),
            description: String::new(),
        }
        .into()
    }
}

impl ControlPlane for MockControlPlane {
    fn set_base_url(&self, base_url: &str) {
        *self.base_url.lock().unwrap() = Some(base_url.to_string());
    }

    fn set_token(&self, token: Option<String>) {
        *self.token.lock().unwrap() = token;
    }

    fn set_team(&self, team_uuid: Option<String>) {
        *self.team.lock().unwrap() = team_uuid;
    }

    fn login(&self, email: &str, _password: &str) -> Result<LoginResponse> {
        self.record(
            Method::Post,
            "/api/v1/auth/login".into(),
            Some(serde_json::json!({ "email": email })),
        )?;
        self.login.clone().ok_or_else(|| Self::not_found("user", email))
    }

    fn current_user(&self) -> Result<UserInfo> {
        self.record(Method::Get, "/api/v1/user".into(), None)?;
        self.user.clone().ok_or_else(|| Self::not_found("user", "current"))
    }

    fn list_teams(&self) -> Result<Vec<Team>> {
        self.record(Method::Get, "/api/v1/teams".into(), None)?;
        Ok(self.teams.clone())
    }

    fn list_clusters(&self) -> Result<Vec<Cluster>> {
        self.record(Method::Get, "/api/v1/clusters".into(), None)?;
        Ok(self.clusters.clone())
    }

    fn list_projects(&self) -> Result<Vec<Project>> {
        self.record(Method::Get, "/api/v1/projects".into(), None)?;
        Ok(self.projects.clone())
    }

    fn list_registries(&self, project_uuid: &str) -> Result<Vec<Registry>> {
        self.record(Method::Get, format!("/api/v1/projects/{}/registries", project_uuid), None)?;
        Ok(self.registries.get(project_uuid).cloned().unwrap_or_default())
    }

    fn add_registry(&self, project_uuid: &str, registry: &NewRegistry) -> Result<()> {
        self.record(
            Method::Post,
            format!("/api/v1/projects/{}/registries", project_uuid),
            Some(serde_json::to_value(registry)?),
        )
    }

    fn delete_registry(&self, project_uuid: &str, registry_uuid: &str) -> Result<()> {
        self.record(
            Method::Delete,
            format!("/api/v1/projects/{}/registries/{}", project_uuid, registry_uuid),
            None,
        )
    }

    fn list_stacks(&self) -> Result<Vec<StackSummary>> {
        self.record(Method::Get, "/api/v1/stacks".into(), None)?;
        Ok(self.stacks.clone())
    }

    fn get_stack(&self, stack_uuid: &str) -> Result<StackDetail> {
        self.record(Method::Get, format!("/api/v1/stacks/{}", stack_uuid), None)?;
        self.stack_details
            .get(stack_uuid)
            .cloned()
            .ok_or_else(|| Self::not_found("stack", stack_uuid))
    }

    fn list_apps(&self) -> Result<Vec<StackDeployApp>> {
        self.record(Method::Get, "/api/v1/stackdeploys".into(), None)?;
        Ok(self.apps.clone())
    }

    fn get_app(&self, app_uuid: &str) -> Result<AppDetail> {
        self.record(Method::Get, format!("/api/v1/stackdeploys/{}", app_uuid), None)?;
        self.app_details
            .get(app_uuid)
            .cloned()
            .ok_or_else(|| Self::not_found("app", app_uuid))
    }

    fn deploy_stack(&self, stack_uuid: &str, request: &Value) -> Result<Value> {
        self.record(
            Method::Post,
            format!("/api/v1/stacks/{}/deploy", stack_uuid),
            Some(request.clone()),
        )?;
        Ok(serde_json::json!({ "uuid": "new-app" }))
    }

    fn patch_app(&self, app_uuid: &str, request: &Value) -> Result<()> {
        self.record(
            Method::Patch,
            format!("/api/v1/stackdeploys/{}", app_uuid),
            Some(request.clone()),
        )
    }

    fn delete_app(&self, app_uuid: &str) -> Result<()> {
        self.record(Method::Delete, format!("/api/v1/stackdeploys/{}", app_uuid), None)
    }

    fn project_kubeconfig(&self, project_uuid: &str) -> Result<KubeconfigResponse> {
        self.record(Method::Get, format!("/api/v1/projects/{}/kubeconfig", project_uuid), None)?;
        self.kubeconfigs
            .get(project_uuid)
            .cloned()
            .ok_or_else(|| Self::not_found("kubeconfig for project", project_uuid))
    }
}
