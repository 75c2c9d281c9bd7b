use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::deploy::Identified;

/// `{uuid, name}` reference embedded in other records.
///
/// Projects are named by `display_name` on the wire, clusters by `name`.
/// Some responses carry both keys; `display_name` wins.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "NamedRefWire")]
pub struct NamedRef {
    pub uuid: String,
    pub name: String,
}

#[derive(Deserialize)]
struct NamedRefWire {
    #[serde(default)]
    uuid: String,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    display_name: Option<String>,
}

impl From<NamedRefWire> for NamedRef {
    fn from(wire: NamedRefWire) -> Self {
        Self {
            uuid: wire.uuid,
            name: preferred_name(wire.display_name, wire.name),
        }
    }
}

fn preferred_name(display_name: Option<String>, name: Option<String>) -> String {
    display_name
        .filter(|value| !value.is_empty())
        .or(name)
        .unwrap_or_default()
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Team {
    pub uuid: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Cluster {
    pub uuid: String,
    pub name: String,
    #[serde(default, rename = "type")]
    pub kind: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(from = "ProjectWire")]
pub struct Project {
    pub uuid: String,
    #[serde(rename = "display_name")]
    pub name: String,
    pub namespace: String,
    pub cluster: NamedRef,
    pub created_at: String,
}

#[derive(Deserialize)]
struct ProjectWire {
    uuid: String,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    display_name: Option<String>,
    #[serde(default)]
    namespace: String,
    #[serde(default)]
    cluster: NamedRef,
    #[serde(default)]
    created_at: String,
}

impl From<ProjectWire> for Project {
    fn from(wire: ProjectWire) -> Self {
        Self {
            uuid: wire.uuid,
            name: preferred_name(wire.display_name, wire.name),
            namespace: wire.namespace,
            cluster: wire.cluster,
            created_at: wire.created_at,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Registry {
    pub uuid: String,
    pub name: String,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub created_at: String,
    #[serde(default)]
    pub created_by: NamedRef,
}

/// Body of the registry creation call
#[derive(Debug, Clone, Serialize)]
pub struct NewRegistry {
    pub name: String,
    pub url: String,
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StackSummary {
    pub uuid: String,
    pub name: String,
    #[serde(default)]
    pub display_name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub version: String,
}

impl StackSummary {
    /// Label used when offering the stack in a selection prompt
    pub fn label(&self) -> String {
        let title = if self.display_name.is_empty() {
            &self.name
        } else {
            &self.display_name
        };
        let mut label = title.clone();
        if !self.version.is_empty() {
            label.push_str(&format!(" ({})", self.version));
        }
        if !self.description.is_empty() {
            label.push_str(&format!(" - {}", self.description));
        }
        label
    }
}

/// Parameter declaration as returned by the stack and app detail endpoints
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StackParameter {
    pub name: String,
    #[serde(default, rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, rename = "default_value", alias = "defaultValue")]
    pub default_value: Option<Value>,
    /// Current value, only present on app detail responses
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StackComponent {
    pub name: String,
    #[serde(default)]
    pub kind: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StackDetail {
    #[serde(default)]
    pub uuid: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub parameters: Vec<StackParameter>,
    #[serde(default)]
    pub components: Vec<StackComponent>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StackRef {
    #[serde(default)]
    pub uuid: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub version: String,
}

/// A stack deployment ("app") as listed for the team
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StackDeployApp {
    pub uuid: String,
    pub name: String,
    #[serde(default)]
    pub stack: StackRef,
    #[serde(default)]
    pub cluster: NamedRef,
    #[serde(default)]
    pub project: NamedRef,
    #[serde(default)]
    pub namespace: String,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub created_at: String,
    #[serde(default)]
    pub updated_at: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DeployedAppSpec {
    #[serde(default, rename = "displayName")]
    pub display_name: String,
    #[serde(default, rename = "registrySecret")]
    pub registry_secret: String,
    #[serde(default)]
    pub mode: String,
    #[serde(default)]
    pub image: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DeployedComponent {
    #[serde(default)]
    pub uuid: String,
    pub name: String,
    #[serde(default)]
    pub kind: String,
    #[serde(default)]
    pub phase: String,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub build_mode: String,
    #[serde(default)]
    pub image: String,
    #[serde(default)]
    pub image_tag: String,
    #[serde(default)]
    pub git_ref: String,
    #[serde(default)]
    pub git_url: String,
    #[serde(default)]
    pub message: String,
    #[serde(default, rename = "appSpec")]
    pub app_spec: Option<DeployedAppSpec>,
}

/// App detail including its components and current parameters
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppDetail {
    pub uuid: String,
    pub name: String,
    #[serde(default)]
    pub stack: StackRef,
    #[serde(default)]
    pub project: NamedRef,
    #[serde(default)]
    pub namespace: String,
    #[serde(default)]
    pub components: Vec<DeployedComponent>,
    #[serde(default)]
    pub parameters: Vec<StackParameter>,
}

#[derive(Debug, Clone, Serialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoginUser {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub team_uuid: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoginResponse {
    pub token: String,
    #[serde(default)]
    pub user: LoginUser,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserInfo {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct KubeconfigResponse {
    /// Base64-encoded kubeconfig document
    pub kubeconfig: String,
    #[serde(default)]
    pub namespace: String,
}

/// Error body returned by the control plane on non-2xx responses.
/// `code` has been observed both as a number and as a string.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ErrorResponse {
    #[serde(default)]
    pub error: String,
    #[serde(default)]
    pub code: Value,
    #[serde(default)]
    pub description: String,
}

impl ErrorResponse {
    pub fn code_text(&self) -> String {
        match &self.code {
            Value::Null => String::new(),
            Value::String(s) => s.clone(),
            other => other.to_string(),
        }
    }
}

macro_rules! identified {
    ($($ty:ty),*) => {
        $(
            impl Identified for $ty {
                fn uuid(&self) -> &str {
                    &self.uuid
                }

                fn name(&self) -> &str {
                    &self.name
                }
            }
        )*
    };
}

identified!(Team, Cluster, Project, Registry, StackSummary, StackDeployApp, DeployedComponent, NamedRef);
