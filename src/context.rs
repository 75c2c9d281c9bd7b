use crate::api::ControlPlane;
use crate::cancel::CancelToken;
use crate::cluster::{ClusterConnector, KubeConnector};
use crate::config::{Config, ConfigStore, ContextOverrides, ResolvedContext};
use crate::traits::{FileSystem, InquireUserInput, Output, RealFileSystem, TerminalOutput, UserInput};
#[cfg(test)]
use crate::traits::{MockFileSystem, MockOutput, MockUserInput};
use anyhow::Result;
use std::path::PathBuf;
use std::sync::Arc;

/// Application context that holds all dependencies for dependency injection
pub struct Context {
    pub fs: Arc<dyn FileSystem>,
    pub input: Arc<dyn UserInput>,
    pub output: Arc<dyn Output>,
    pub cluster: Arc<dyn ClusterConnector>,
    pub api: Arc<dyn ControlPlane>,
    /// Configuration as loaded at start; commands save a modified copy
    pub config: Config,
    pub config_path: PathBuf,
    /// Shared with the Ctrl-C handler; long-running streams hold it in flight
    pub cancel: CancelToken,
}

impl Context {
    /// Create a new context with real implementations (for production use)
    pub fn new(config: Config, config_path: PathBuf, api: Arc<dyn ControlPlane>, cancel: CancelToken) -> Self {
        Self {
            fs: Arc::new(RealFileSystem),
            input: Arc::new(InquireUserInput),
            output: Arc::new(TerminalOutput),
            cluster: Arc::new(KubeConnector),
            api,
            config,
            config_path,
            cancel,
        }
    }

    pub fn config_store(&self) -> ConfigStore<'_> {
        ConfigStore::new(self.fs.as_ref(), self.config_path.clone())
    }

    pub fn save_config(&self, config: &Config) -> Result<()> {
        self.config_store().save(config)
    }

    pub fn require_login(&self) -> Result<()> {
        if !self.config.is_logged_in() {
            anyhow::bail!("Not logged in. Run 'kubenest login' first");
        }
        Ok(())
    }

    /// Persisted team/cluster/project plus this invocation's overrides.
    pub fn resolve_context(&self, overrides: ContextOverrides<'_>) -> Result<ResolvedContext> {
        self.require_login()?;
        ResolvedContext::resolve(&self.config, overrides, self.api.as_ref())
    }

    /// Create a new context with mock implementations (for testing)
    #[cfg(test)]
    #[allow(dead_code)]
    pub fn test() -> Self {
        Self::test_with(
            Arc::new(MockFileSystem::new()),
            Arc::new(MockUserInput::new()),
            Arc::new(MockOutput::new()),
            Arc::new(crate::cluster::MockCluster::new()),
            Arc::new(crate::api::MockControlPlane::new()),
        )
    }

    /// Create a test context with specific mock implementations
    #[cfg(test)]
    pub fn test_with(
        fs: Arc<dyn FileSystem>,
        input: Arc<dyn UserInput>,
        output: Arc<dyn Output>,
        cluster: Arc<dyn ClusterConnector>,
        api: Arc<dyn ControlPlane>,
    ) -> Self {
        Self {
            fs,
            input,
            output,
            cluster,
            api,
            config: Config::default(),
            config_path: PathBuf::from("/home/ops/.kubenest/config.json"),
            cancel: CancelToken::new(),
        }
    }
}

impl Clone for Context {
    fn clone(&self) -> Self {
        Self {
            fs: Arc::clone(&self.fs),
            input: Arc::clone(&self.input),
            output: Arc::clone(&self.output),
            cluster: Arc::clone(&self.cluster),
            api: Arc::clone(&self.api),
            config: self.config.clone(),
            config_path: self.config_path.clone(),
            cancel: self.cancel.clone(),
        }
    }
}
