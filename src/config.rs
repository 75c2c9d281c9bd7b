//! Persisted CLI configuration and the per-invocation resolved context.

use anyhow::{Context as _, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::debug;

use crate::api::ControlPlane;
use crate::api::types::Project;
use crate::deploy::{AppFilter, ResourceKind, resolve, resolve_entry};
use crate::error::DeployError;
use crate::traits::FileSystem;

pub const DEFAULT_API_URL: &str = "https://api.kubenest.io";
const CONFIG_DIR: &str = ".kubenest";
const CONFIG_FILE: &str = "config.json";

fn default_api_url() -> String {
    DEFAULT_API_URL.to_string()
}

/// Contents of `~/.kubenest/config.json`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_api_url")]
    pub api_url: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub token: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub team_uuid: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub cluster_uuid: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub project_uuid: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub user_email: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub user_first_name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub user_last_name: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            token: String::new(),
            team_uuid: String::new(),
            cluster_uuid: String::new(),
            project_uuid: String::new(),
            user_email: String::new(),
            user_first_name: String::new(),
            user_last_name: String::new(),
        }
    }
}

impl Config {
    pub fn is_logged_in(&self) -> bool {
        !self.token.is_empty()
    }

    /// Forget the session; the API URL and context selections other than the team survive.
    pub fn clear_session(&mut self) {
        self.token.clear();
        self.team_uuid.clear();
    }

    /// "First Last <email>", or whatever parts are known
    pub fn user_display(&self) -> Option<String> {
        let full_name = format!("{} {}", self.user_first_name, self.user_last_name)
            .trim()
            .to_string();
        match (full_name.is_empty(), self.user_email.is_empty()) {
            (true, true) => None,
            (true, false) => Some(self.user_email.clone()),
            (false, true) => Some(full_name),
            (false, false) => Some(format!("{} <{}>", full_name, self.user_email)),
        }
    }
}

/// Default location: `~/.kubenest/config.json`
pub fn default_path() -> Result<PathBuf> {
    let home_dir = dirs::home_dir().ok_or_else(|| anyhow::anyhow!("Unable to determine home directory"))?;
    Ok(home_dir.join(CONFIG_DIR).join(CONFIG_FILE))
}

/// Check that `raw` is an absolute http(s) URL and drop any trailing slash.
pub fn normalize_api_url(raw: &str) -> Result<String> {
    let trimmed = raw.trim();
    let parsed = url::Url::parse(trimmed).with_context(|| format!("Invalid API URL: {}", trimmed))?;
    if !matches!(parsed.scheme(), "http" | "https") {
        anyhow::bail!("API URL must use http or https: {}", trimmed);
    }
    Ok(trimmed.trim_end_matches('/').to_string())
}

/// Loads and saves `Config` through the `FileSystem` seam
pub struct ConfigStore<'a> {
    fs: &'a dyn FileSystem,
    path: PathBuf,
}

impl<'a> ConfigStore<'a> {
    pub fn new(fs: &'a dyn FileSystem, path: PathBuf) -> Self {
        Self { fs, path }
    }

    /// A missing file yields defaults; a malformed one is an error.
    pub fn load(&self) -> Result<Config> {
        if !self.fs.exists(&self.path) {
            debug!(path = %self.path.display(), "no config file, using defaults");
            return Ok(Config::default());
        }

        let content = self.fs.read_to_string(&self.path)?;
        serde_json::from_str(&content).with_context(|| format!("Failed to parse config file: {:?}", self.path))
    }

    pub fn save(&self, config: &Config) -> Result<()> {
        let content = serde_json::to_string_pretty(config).context("Failed to serialize config")?;
        self.fs.write(&self.path, &content)?;
        self.fs.restrict_to_owner(&self.path)?;
        debug!(path = %self.path.display(), "config saved");
        Ok(())
    }
}

/// Per-invocation `--team/--cluster/--project` values
#[derive(Debug, Clone, Copy, Default)]
pub struct ContextOverrides<'a> {
    pub team: Option<&'a str>,
    pub cluster: Option<&'a str>,
    pub project: Option<&'a str>,
}

/// Active team/cluster/project for one invocation. Never written back.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResolvedContext {
    pub team_uuid: Option<String>,
    pub cluster_uuid: Option<String>,
    pub project_uuid: Option<String>,
}

fn non_empty(value: &str) -> Option<String> {
    (!value.is_empty()).then(|| value.to_string())
}

impl ResolvedContext {
    pub fn from_config(config: &Config) -> Self {
        Self {
            team_uuid: non_empty(&config.team_uuid),
            cluster_uuid: non_empty(&config.cluster_uuid),
            project_uuid: non_empty(&config.project_uuid),
        }
    }

    /// Apply overrides on top of the persisted selection, resolving each
    /// name or UUID against the control plane.
    pub fn resolve(config: &Config, overrides: ContextOverrides<'_>, api: &dyn ControlPlane) -> Result<Self> {
        let mut resolved = Self::from_config(config);

        if let Some(team) = overrides.team {
            let uuid = resolve(ResourceKind::Team, team, &api.list_teams()?)?;
            api.set_team(Some(uuid.clone()));
            resolved.team_uuid = Some(uuid);
        }
        if let Some(cluster) = overrides.cluster {
            resolved.require_team()?;
            resolved.cluster_uuid = Some(resolve(ResourceKind::Cluster, cluster, &api.list_clusters()?)?);
        }
        if let Some(project) = overrides.project {
            resolved.require_team()?;
            resolved.project_uuid = Some(resolve(ResourceKind::Project, project, &api.list_projects()?)?);
        }

        Ok(resolved)
    }

    pub fn require_team(&self) -> Result<&str, DeployError> {
        self.team_uuid.as_deref().ok_or(DeployError::MissingContext("team"))
    }

    pub fn require_project(&self) -> Result<&str, DeployError> {
        self.project_uuid.as_deref().ok_or(DeployError::MissingContext("project"))
    }

    pub fn app_filter(&self) -> AppFilter<'_> {
        AppFilter {
            cluster_uuid: self.cluster_uuid.as_deref(),
            project_uuid: self.project_uuid.as_deref(),
        }
    }

    /// Fetch the active project record (namespace, cluster).
    pub fn project(&self, api: &dyn ControlPlane) -> Result<Project> {
        let uuid = self.require_project()?;
        let projects = api.list_projects()?;
        Ok(resolve_entry(ResourceKind::Project, uuid, &projects)?.clone())
    }
}
