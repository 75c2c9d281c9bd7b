pub mod app_create;
pub mod app_delete;
pub mod apps;
pub mod auth;
pub mod clusters;
pub mod context;
pub mod deploy;
pub mod exec;
pub mod logs;
pub mod projects;
pub mod registry;
pub mod stacks;
pub mod teams;

pub use app_create::AppCreateCommand;
pub use app_delete::AppDeleteCommand;
pub use apps::AppsCommand;
pub use auth::{LoginCommand, LogoutCommand};
pub use clusters::ClustersCommand;
pub use context::ContextCommand;
pub use deploy::DeployCommand;
pub use exec::{ExecCommand, ExecTarget};
pub use logs::LogsCommand;
pub use projects::ProjectsCommand;
pub use registry::RegistryCommand;
pub use stacks::StacksCommand;
pub use teams::TeamsCommand;
