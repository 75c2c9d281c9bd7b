use std::fmt;
use std::sync::RwLock;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, trace};

use super::types::{
    AppDetail, Cluster, ErrorResponse, KubeconfigResponse, LoginRequest, LoginResponse, NewRegistry, Project,
    Registry, StackDeployApp, StackDetail, StackSummary, Team, UserInfo,
};
use crate::cancel::CancelToken;
use crate::error::DeployError;

const TEAMS_PATH: &str = "/api/v1/teams";
const LOGIN_PATH: &str = "/api/v1/auth/login";

/// Operations offered by the control plane
pub trait ControlPlane: Send + Sync {
    fn set_base_url(&self, base_url: &str);
    fn set_token(&self, token: Option<String>);
    fn set_team(&self, team_uuid: Option<String>);

    fn login(&self, email: &str, password: &str) -> Result<LoginResponse>;
    fn current_user(&self) -> Result<UserInfo>;

    fn list_teams(&self) -> Result<Vec<Team>>;
    fn list_clusters(&self) -> Result<Vec<Cluster>>;
    fn list_projects(&self) -> Result<Vec<Project>>;

    fn list_registries(&self, project_uuid: &str) -> Result<Vec<Registry>>;
    fn add_registry(&self, project_uuid: &str, registry: &NewRegistry) -> Result<()>;
    fn delete_registry(&self, project_uuid: &str, registry_uuid: &str) -> Result<()>;

    fn list_stacks(&self) -> Result<Vec<StackSummary>>;
    fn get_stack(&self, stack_uuid: &str) -> Result<StackDetail>;

    fn list_apps(&self) -> Result<Vec<StackDeployApp>>;
    fn get_app(&self, app_uuid: &str) -> Result<AppDetail>;
    fn deploy_stack(&self, stack_uuid: &str, request: &Value) -> Result<Value>;
    fn patch_app(&self, app_uuid: &str, request: &Value) -> Result<()>;
    fn delete_app(&self, app_uuid: &str) -> Result<()>;

    fn project_kubeconfig(&self, project_uuid: &str) -> Result<KubeconfigResponse>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
    Patch,
    Delete,
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Patch => "PATCH",
            Method::Delete => "DELETE",
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct HttpRequest {
    pub method: Method,
    pub url: String,
    pub headers: Vec<(&'static str, String)>,
    pub body: Option<String>,
}

impl HttpRequest {
    #[cfg(test)]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

/// Raw HTTP exchange, split out so the client can be tested without a server
pub trait HttpTransport: Send + Sync {
    fn send(&self, request: &HttpRequest) -> Result<HttpResponse>;
}

/// Blocking reqwest transport with a per-request deadline
pub struct ReqwestTransport {
    client: reqwest::blocking::Client,
    timeout: Duration,
}

impl ReqwestTransport {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("kubenest/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self { client, timeout })
    }
}

impl HttpTransport for ReqwestTransport {
    fn send(&self, request: &HttpRequest) -> Result<HttpResponse> {
        let mut builder = match request.method {
            Method::Get => self.client.get(&request.url),
            Method::Post => self.client.post(&request.url),
            Method::Patch => self.client.patch(&request.url),
            Method::Delete => self.client.delete(&request.url),
        };
        for (name, value) in &request.headers {
            builder = builder.header(*name, value);
        }
        if let Some(body) = &request.body {
            builder = builder.body(body.clone());
        }

        let response = builder.send().map_err(|err| {
            if err.is_timeout() {
                anyhow::Error::new(DeployError::Cancelled(format!(
                    "{} {} timed out after {}s",
                    request.method,
                    request.url,
                    self.timeout.as_secs()
                )))
            } else {
                anyhow::Error::new(err).context(format!("Failed to reach control plane at {}", request.url))
            }
        })?;

        let status = response.status().as_u16();
        let body = response
            .text()
            .with_context(|| format!("Failed to read response body from: {}", request.url))?;
        Ok(HttpResponse { status, body })
    }
}

#[derive(Debug, Default)]
struct Session {
    token: Option<String>,
    team_uuid: Option<String>,
}

/// Control-plane client over an `HttpTransport`
pub struct ApiClient<T: HttpTransport> {
    base_url: RwLock<String>,
    session: RwLock<Session>,
    transport: T,
    cancel: CancelToken,
}

impl ApiClient<ReqwestTransport> {
    pub fn connect(base_url: &str, timeout: Duration, cancel: CancelToken) -> Result<Self> {
        Ok(Self::with_transport(base_url, ReqwestTransport::new(timeout)?, cancel))
    }
}

impl<T: HttpTransport> ApiClient<T> {
    pub fn with_transport(base_url: &str, transport: T, cancel: CancelToken) -> Self {
        Self {
            base_url: RwLock::new(base_url.trim_end_matches('/').to_string()),
            session: RwLock::new(Session::default()),
            transport,
            cancel,
        }
    }

    fn build_request(&self, method: Method, path: &str, body: Option<String>) -> HttpRequest {
        let session = self.session.read().unwrap_or_else(|e| e.into_inner());
        let mut headers = vec![("Accept", "application/json".to_string())];
        if body.is_some() {
            headers.push(("Content-Type", "application/json".to_string()));
        }
        if let Some(token) = session.token.as_deref().filter(|t| !t.is_empty()) {
            headers.push(("Authorization", format!("Bearer {}", token)));
        }
        let team_scoped = path != TEAMS_PATH && path != LOGIN_PATH;
        if let Some(team) = session.team_uuid.as_deref().filter(|t| !t.is_empty())
            && team_scoped
        {
            headers.push(("X-Team-UUID", team.to_string()));
        }

        HttpRequest {
            method,
            url: format!(
                "{}{}",
                self.base_url.read().unwrap_or_else(|e| e.into_inner()),
                path
            ),
            headers,
            body,
        }
    }

    fn exchange<B: Serialize>(&self, method: Method, path: &str, body: Option<&B>) -> Result<String> {
        let operation = format!("{} {}", method, path);
        self.cancel.check(&operation)?;

        let body = body
            .map(serde_json::to_string)
            .transpose()
            .with_context(|| format!("Failed to encode request body for {}", operation))?;
        let request = self.build_request(method, path, body);
        debug!(%method, url = %request.url, "control plane request");

        let response = {
            let _guard = self.cancel.in_flight();
            self.transport.send(&request)?
        };
        debug!(%method, url = %request.url, status = response.status, "control plane response");
        trace!(bytes = response.body.len(), "response body");

        if !(200..300).contains(&response.status) {
            return Err(rejection(response).into());
        }
        Ok(response.body)
    }

    fn get<R: DeserializeOwned>(&self, path: &str) -> Result<R> {
        let body = self.exchange::<()>(Method::Get, path, None)?;
        serde_json::from_str(&body).with_context(|| format!("Failed to decode response from GET {}", path))
    }

    fn send_json<B: Serialize>(&self, method: Method, path: &str, body: &B) -> Result<String> {
        self.exchange(method, path, Some(body))
    }
}

/// Map a non-2xx response to `RemoteRejected`, falling back to the raw body
/// when it is not the documented error document.
fn rejection(response: HttpResponse) -> DeployError {
    match serde_json::from_str::<ErrorResponse>(&response.body) {
        Ok(parsed) if !parsed.error.is_empty() || !parsed.description.is_empty() => DeployError::RemoteRejected {
            status: response.status,
            code: parsed.code_text(),
            error: parsed.error,
            description: parsed.description,
        },
        _ => DeployError::RemoteRejected {
            status: response.status,
            error: response.body.trim().to_string(),
            code: String::new(),
            description: String::new(),
        },
    }
}

impl<T: HttpTransport> ControlPlane for ApiClient<T> {
    fn set_base_url(&self, base_url: &str) {
        *self.base_url.write().unwrap_or_else(|e| e.into_inner()) = base_url.trim_end_matches('/').to_string();
    }

    fn set_token(&self, token: Option<String>) {
        self.session.write().unwrap_or_else(|e| e.into_inner()).token = token;
    }

    fn set_team(&self, team_uuid: Option<String>) {
        self.session.write().unwrap_or_else(|e| e.into_inner()).team_uuid = team_uuid;
    }

    fn login(&self, email: &str, password: &str) -> Result<LoginResponse> {
        let request = LoginRequest {
            email: email.to_string(),
            password: password.to_string(),
        };
        let body = self.send_json(Method::Post, LOGIN_PATH, &request)?;
        serde_json::from_str(&body).context("Failed to decode login response")
    }

    fn current_user(&self) -> Result<UserInfo> {
        self.get("/api/v1/user")
    }

    fn list_teams(&self) -> Result<Vec<Team>> {
        self.get(TEAMS_PATH)
    }

    fn list_clusters(&self) -> Result<Vec<Cluster>> {
        self.get("/api/v1/clusters")
    }

    fn list_projects(&self) -> Result<Vec<Project>> {
        self.get("/api/v1/projects")
    }

    fn list_registries(&self, project_uuid: &str) -> Result<Vec<Registry>> {
        self.get(&format!("/api/v1/projects/{}/registries", project_uuid))
    }

    fn add_registry(&self, project_uuid: &str, registry: &NewRegistry) -> Result<()> {
        self.send_json(
            Method::Post,
            &format!("/api/v1/projects/{}/registries", project_uuid),
            registry,
        )?;
        Ok(())
    }

    fn delete_registry(&self, project_uuid: &str, registry_uuid: &str) -> Result<()> {
        self.exchange::<()>(
            Method::Delete,
            &format!("/api/v1/projects/{}/registries/{}", project_uuid, registry_uuid),
            None,
        )?;
        Ok(())
    }

    fn list_stacks(&self) -> Result<Vec<StackSummary>> {
        self.get("/api/v1/stacks")
    }

    fn get_stack(&self, stack_uuid: &str) -> Result<StackDetail> {
        self.get(&format!("/api/v1/stacks/{}", stack_uuid))
    }

    fn list_apps(&self) -> Result<Vec<StackDeployApp>> {
        self.get("/api/v1/stackdeploys")
    }

    fn get_app(&self, app_uuid: &str) -> Result<AppDetail> {
        self.get(&format!("/api/v1/stackdeploys/{}", app_uuid))
    }

    fn deploy_stack(&self, stack_uuid: &str, request: &Value) -> Result<Value> {
        let body = self.send_json(Method::Post, &format!("/api/v1/stacks/{}/deploy", stack_uuid), request)?;
        if body.trim().is_empty() {
            return Ok(Value::Null);
        }
        serde_json::from_str(&body).context("Failed to decode deploy response")
    }

    fn patch_app(&self, app_uuid: &str, request: &Value) -> Result<()> {
        self.send_json(Method::Patch, &format!("/api/v1/stackdeploys/{}", app_uuid), request)?;
        Ok(())
    }

    fn delete_app(&self, app_uuid: &str) -> Result<()> {
        self.exchange::<()>(Method::Delete, &format!("/api/v1/stackdeploys/{}", app_uuid), None)?;
        Ok(())
    }

    fn project_kubeconfig(&self, project_uuid: &str) -> Result<KubeconfigResponse> {
        self.get(&format!("/api/v1/projects/{}/kubeconfig", project_uuid))
    }
}
