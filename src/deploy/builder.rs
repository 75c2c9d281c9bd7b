//! `appSpec` / `buildSpec` assembly for a single component.

use std::fmt;
use std::str::FromStr;

use serde::Serialize;
use serde_json::{Map, Value};

use super::resolver::{ResourceKind, resolve_entry};
use super::schema::ComponentSpec;
use crate::api::types::Registry;
use crate::error::DeployError;

/// Where a component's runtime image comes from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BuildMode {
    /// Prebuilt image
    Image,
    Buildpack,
    Dockerfile,
}

impl BuildMode {
    pub const ALL: [BuildMode; 3] = [BuildMode::Image, BuildMode::Buildpack, BuildMode::Dockerfile];

    pub fn as_str(&self) -> &'static str {
        match self {
            BuildMode::Image => "image",
            BuildMode::Buildpack => "buildpack",
            BuildMode::Dockerfile => "dockerfile",
        }
    }

    /// Title shown in selection prompts
    pub fn label(&self) -> &'static str {
        match self {
            BuildMode::Image => "Image",
            BuildMode::Buildpack => "Buildpack",
            BuildMode::Dockerfile => "Dockerfile",
        }
    }

    /// Built from a git repository rather than pulled
    pub fn is_git(&self) -> bool {
        !matches!(self, BuildMode::Image)
    }
}

impl fmt::Display for BuildMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BuildMode {
    type Err = DeployError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        BuildMode::ALL
            .into_iter()
            .find(|mode| mode.as_str() == s)
            .ok_or_else(|| DeployError::UnknownBuildMode(s.to_string()))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AppSpec {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub registry_secret: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mode: Option<BuildMode>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub git_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub git_ref: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub params: Option<Map<String, Value>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildSpec {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_tag: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub git_ref: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub params: Option<Map<String, Value>>,
}

/// One entry of a request's `components` array
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ComponentPayload {
    pub name: String,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub app_spec: Option<AppSpec>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub build_spec: Option<BuildSpec>,
}

impl ComponentPayload {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }
}

/// Build details gathered for one component of a new app
#[derive(Debug, Clone, PartialEq)]
pub struct ComponentBuildInput {
    pub mode: BuildMode,
    pub image: Option<String>,
    pub git_url: Option<String>,
    pub git_ref: Option<String>,
    pub image_tag: String,
    /// Registry name (or UUID) holding the pull secret
    pub registry: Option<String>,
}

/// Where the component is being created
#[derive(Debug, Clone, Copy)]
pub struct BuildTarget<'a> {
    pub app_name: &'a str,
    pub project_name: &'a str,
    pub registries: &'a [Registry],
}

/// Look a registry up in the project, by name or UUID, returning its name.
pub fn verify_registry(name: &str, project_name: &str, registries: &[Registry]) -> Result<String, DeployError> {
    resolve_entry(ResourceKind::Registry, name, registries)
        .map(|registry| registry.name.clone())
        .map_err(|_| DeployError::RegistryNotFound {
            name: name.to_string(),
            project: project_name.to_string(),
        })
}

fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|s| !s.is_empty())
}

/// Assemble the creation payload for `component`.
///
/// Exactly one of the image path (`image`) or the git path (`gitUrl` plus
/// `gitRef`) must be supplied, matching `mode`. Nothing is sent on failure.
pub fn build(
    component: &ComponentSpec,
    input: &ComponentBuildInput,
    target: &BuildTarget<'_>,
) -> Result<ComponentPayload, DeployError> {
    let image = present(&input.image);
    let git_url = present(&input.git_url);
    let git_ref = present(&input.git_ref);

    match (image, git_url) {
        (Some(_), Some(_)) => {
            return Err(DeployError::ConflictingBuildInputs(format!(
                "component '{}' has both an image and a git repository",
                component.name
            )));
        }
        (None, None) => {
            return Err(DeployError::ConflictingBuildInputs(format!(
                "component '{}' needs either an image or a git repository",
                component.name
            )));
        }
        _ => {}
    }

    if input.mode.is_git() != git_url.is_some() {
        return Err(DeployError::ConflictingBuildInputs(format!(
            "build mode '{}' does not match the supplied {}",
            input.mode,
            if git_url.is_some() { "git repository" } else { "image" }
        )));
    }

    if git_url.is_some() && git_ref.is_none() {
        return Err(DeployError::MissingRequiredValue("gitRef".to_string()));
    }
    if input.image_tag.is_empty() {
        return Err(DeployError::MissingRequiredValue("imageTag".to_string()));
    }

    let registry_secret = present(&input.registry)
        .map(|name| verify_registry(name, target.project_name, target.registries))
        .transpose()?;

    let mut app_spec = AppSpec {
        display_name: Some(format!("{} {}", target.app_name, component.name)),
        description: Some(format!("{} {} component", target.app_name, component.name)),
        registry_secret,
        mode: Some(input.mode),
        ..Default::default()
    };
    if input.mode.is_git() {
        app_spec.git_url = git_url.map(str::to_string);
        app_spec.git_ref = git_ref.map(str::to_string);
    } else {
        app_spec.image = image.map(str::to_string);
    }

    Ok(ComponentPayload {
        name: component.name.clone(),
        kind: Some("app".to_string()),
        app_spec: Some(app_spec),
        build_spec: Some(BuildSpec {
            image_tag: Some(input.image_tag.clone()),
            ..Default::default()
        }),
    })
}
