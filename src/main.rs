mod api;
mod cancel;
mod cluster;
mod commands;
mod config;
mod context;
mod deploy;
mod error;
mod logging;
mod output;
mod traits;

#[cfg(test)]
mod test_helpers;

use anyhow::Result;
use clap::{ArgAction, Args, Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

use api::{ApiClient, ControlPlane};
use cancel::CancelToken;
use commands::{
    AppCreateCommand, AppDeleteCommand, AppsCommand, ClustersCommand, ContextCommand, DeployCommand, ExecCommand,
    ExecTarget, LoginCommand, LogoutCommand, LogsCommand, ProjectsCommand, RegistryCommand, StacksCommand,
    TeamsCommand,
};
use config::{ConfigStore, ContextOverrides};
use context::Context;
use deploy::DeployInputs;
use traits::RealFileSystem;

#[derive(Parser)]
#[command(name = "kubenest")]
#[command(about = "Kubenest - A CLI for deploying application stacks to managed Kubernetes", long_about = None)]
#[command(version)]
struct Cli {
    /// Path to the configuration file (defaults to ~/.kubenest/config.json)
    #[arg(long, global = true, env = "KUBENEST_CONFIG", value_name = "PATH")]
    config: Option<PathBuf>,

    /// Control plane URL for this invocation only
    #[arg(long, global = true, env = "KUBENEST_API_URL", hide = true)]
    api_url: Option<String>,

    /// Per-request timeout in seconds
    #[arg(long, global = true, default_value_t = 30, value_name = "SECS")]
    timeout: u64,

    /// More diagnostic output on stderr (-v debug, -vv trace)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

/// Team/cluster/project for this invocation only; never saved
#[derive(Args, Debug, Clone, Default)]
struct ContextArgs {
    /// Team name or UUID
    #[arg(long)]
    team: Option<String>,

    /// Cluster name or UUID
    #[arg(long)]
    cluster: Option<String>,

    /// Project name or UUID
    #[arg(long)]
    project: Option<String>,
}

impl ContextArgs {
    fn overrides(&self) -> ContextOverrides<'_> {
        ContextOverrides {
            team: self.team.as_deref(),
            cluster: self.cluster.as_deref(),
            project: self.project.as_deref(),
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Log in to the control plane
    Login,

    /// Forget the stored token and team
    Logout,

    /// Show or change the active team, cluster and project
    Context {
        #[command(subcommand)]
        command: Option<ContextCommands>,
    },

    /// List teams you belong to
    Teams,

    /// List clusters of the active team
    Clusters {
        #[command(flatten)]
        context: ContextArgs,
    },

    /// List projects of the active team
    Projects {
        #[command(flatten)]
        context: ContextArgs,
    },

    /// List and manage deployed apps
    #[command(alias = "app", args_conflicts_with_subcommands = true)]
    Apps {
        #[command(subcommand)]
        command: Option<AppsCommands>,

        #[command(flatten)]
        context: ContextArgs,
    },

    /// Manage container registries of the active project
    Registry {
        #[command(subcommand)]
        command: RegistryCommands,
    },

    /// List stacks or work with raw deployments
    #[command(args_conflicts_with_subcommands = true)]
    Stacks {
        #[command(subcommand)]
        command: Option<StacksCommands>,
    },
}

#[derive(Subcommand)]
enum ContextCommands {
    /// Set the active team
    SetTeam {
        /// Team name or UUID
        team: String,
    },

    /// Set the active cluster
    SetCluster {
        /// Cluster name or UUID
        cluster: String,
    },

    /// Set the active project
    SetProject {
        /// Project name or UUID
        project: String,
    },
}

#[derive(Subcommand)]
enum AppsCommands {
    /// Show an app's components and parameters
    Info {
        /// App name or UUID
        app: String,

        #[command(flatten)]
        context: ContextArgs,
    },

    /// Create an app from a stack
    Create {
        /// Print the request body instead of sending it
        #[arg(long)]
        dry_run: bool,

        #[command(flatten)]
        context: ContextArgs,
    },

    /// Update a component or parameters of an app
    Deploy {
        /// App name or UUID
        app: String,

        /// Component to update
        #[arg(long)]
        component: String,

        /// Image URL (image mode)
        #[arg(long)]
        image: Option<String>,

        /// Image tag to deploy
        #[arg(long, conflicts_with = "git_ref")]
        image_tag: Option<String>,

        /// Git ref to build
        #[arg(long)]
        git_ref: Option<String>,

        /// Build mode: image, buildpack or dockerfile
        #[arg(long)]
        mode: Option<String>,

        /// Parameter override, repeatable
        #[arg(long = "param", value_name = "KEY=VALUE")]
        params: Vec<String>,

        /// Registry name in the app's project
        #[arg(long)]
        registry_secret: Option<String>,

        /// Print the PATCH body instead of sending it
        #[arg(long)]
        dry_run: bool,

        #[command(flatten)]
        context: ContextArgs,
    },

    /// Delete an app
    Delete {
        /// App name or UUID
        app: String,

        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,

        #[command(flatten)]
        context: ContextArgs,
    },

    /// Show logs of an app's pods
    Logs {
        /// App name or UUID
        app: String,

        /// Keep streaming new lines
        #[arg(short, long)]
        follow: bool,

        /// Lines of history per container (default 100; whole log with --follow)
        #[arg(long)]
        tail: Option<u32>,

        #[command(flatten)]
        context: ContextArgs,
    },

    /// Run a shell command in one of an app's pods
    Exec {
        /// App name or UUID
        app: String,

        /// Command passed to `sh -c`
        #[arg(short, long)]
        command: String,

        /// Component the command is meant for
        #[arg(long)]
        component: Option<String>,

        /// Pod name (defaults to the first pod of the app)
        #[arg(long)]
        pod: Option<String>,

        /// Container inside the pod
        #[arg(long)]
        container: Option<String>,

        #[command(flatten)]
        context: ContextArgs,
    },
}

#[derive(Subcommand)]
enum RegistryCommands {
    /// List registries
    List {
        #[command(flatten)]
        context: ContextArgs,
    },

    /// Add a registry
    Add {
        #[command(flatten)]
        context: ContextArgs,
    },

    /// Delete a registry
    Delete {
        /// Registry name or UUID
        registry: String,

        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,

        #[command(flatten)]
        context: ContextArgs,
    },
}

#[derive(Subcommand)]
enum StacksCommands {
    /// Show a stack's parameters and components
    Show {
        /// Stack name or UUID
        stack: String,
    },

    /// Send a JSON patch file to a deployment
    PatchDeploy {
        /// Deployment (app) UUID
        app_uuid: String,

        /// JSON file with `components` and/or `parameters`
        file: PathBuf,
    },

    /// Delete a deployment by UUID
    DeleteDeploy {
        /// Deployment (app) UUID
        app_uuid: String,

        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
}

fn main() {
    let cli = Cli::parse();

    if let Err(err) = run(cli) {
        output::error(&format!("{:#}", err));
        std::process::exit(error::exit_code(&err));
    }
}

fn run(cli: Cli) -> Result<()> {
    logging::init(cli.verbose)?;

    let config_path = match cli.config.clone() {
        Some(path) => path,
        None => config::default_path()?,
    };
    let config = ConfigStore::new(&RealFileSystem, config_path.clone()).load()?;
    let api_url = match cli.api_url.as_deref() {
        Some(url) => config::normalize_api_url(url)?,
        None => config.api_url.clone(),
    };
    debug!(config = %config_path.display(), api_url = %api_url, "starting");

    let cancel = CancelToken::new();
    cancel::install_handler(&cancel)?;

    let api = ApiClient::connect(&api_url, Duration::from_secs(cli.timeout), cancel.clone())?;
    api.set_token((!config.token.is_empty()).then(|| config.token.clone()));
    api.set_team((!config.team_uuid.is_empty()).then(|| config.team_uuid.clone()));

    let ctx = Context::new(config, config_path, Arc::new(api), cancel);
    dispatch(&ctx, cli.command)
}

fn dispatch(ctx: &Context, command: Commands) -> Result<()> {
    match command {
        Commands::Login => LoginCommand::execute(ctx),
        Commands::Logout => LogoutCommand::execute(ctx),
        Commands::Context { command } => match command {
            None => ContextCommand::execute_show(ctx),
            Some(ContextCommands::SetTeam { team }) => ContextCommand::execute_set_team(ctx, &team),
            Some(ContextCommands::SetCluster { cluster }) => ContextCommand::execute_set_cluster(ctx, &cluster),
            Some(ContextCommands::SetProject { project }) => ContextCommand::execute_set_project(ctx, &project),
        },
        Commands::Teams => TeamsCommand::execute(ctx),
        Commands::Clusters { context } => ClustersCommand::execute(ctx, context.overrides()),
        Commands::Projects { context } => ProjectsCommand::execute(ctx, context.overrides()),
        Commands::Apps { command, context } => match command {
            None => AppsCommand::execute_list(ctx, context.overrides()),
            Some(command) => dispatch_apps(ctx, command),
        },
        Commands::Registry { command } => match command {
            RegistryCommands::List { context } => RegistryCommand::execute_list(ctx, context.overrides()),
            RegistryCommands::Add { context } => RegistryCommand::execute_add(ctx, context.overrides()),
            RegistryCommands::Delete { registry, yes, context } => {
                RegistryCommand::execute_delete(ctx, &registry, yes, context.overrides())
            }
        },
        Commands::Stacks { command } => match command {
            None => StacksCommand::execute_list(ctx),
            Some(StacksCommands::Show { stack }) => StacksCommand::execute_show(ctx, &stack),
            Some(StacksCommands::PatchDeploy { app_uuid, file }) => {
                StacksCommand::execute_patch_deploy(ctx, &app_uuid, &file)
            }
            Some(StacksCommands::DeleteDeploy { app_uuid, yes }) => {
                StacksCommand::execute_delete_deploy(ctx, &app_uuid, yes)
            }
        },
    }
}

fn dispatch_apps(ctx: &Context, command: AppsCommands) -> Result<()> {
    match command {
        AppsCommands::Info { app, context } => AppsCommand::execute_info(ctx, &app, context.overrides()),
        AppsCommands::Create { dry_run, context } => AppCreateCommand::execute(ctx, dry_run, context.overrides()),
        AppsCommands::Deploy {
            app,
            component,
            image,
            image_tag,
            git_ref,
            mode,
            params,
            registry_secret,
            dry_run,
            context,
        } => {
            let inputs = DeployInputs {
                component,
                image_url: image,
                image_tag,
                git_ref,
                mode,
                params,
                registry_secret,
            };
            DeployCommand::execute(ctx, &app, &inputs, dry_run, context.overrides())
        }
        AppsCommands::Delete { app, yes, context } => AppDeleteCommand::execute(ctx, &app, yes, context.overrides()),
        AppsCommands::Logs {
            app,
            follow,
            tail,
            context,
        } => LogsCommand::execute(ctx, &app, follow, tail, context.overrides()),
        AppsCommands::Exec {
            app,
            command,
            component,
            pod,
            container,
            context,
        } => {
            let target = ExecTarget {
                command,
                component,
                pod,
                container,
            };
            ExecCommand::execute(ctx, &app, &target, context.overrides())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_deploy_rejects_git_ref_with_image_tag() {
        let parsed = Cli::try_parse_from([
            "kubenest",
            "apps",
            "deploy",
            "shop-web",
            "--component",
            "web",
            "--git-ref",
            "main",
            "--image-tag",
            "v1",
        ]);
        assert!(parsed.is_err());
    }

    #[test]
    fn test_repeated_params_and_overrides() {
        let cli = Cli::try_parse_from([
            "kubenest",
            "app",
            "deploy",
            "shop-web",
            "--component",
            "web",
            "--param",
            "replicas=3",
            "--param",
            "env=prod",
            "--project",
            "Shop",
        ])
        .unwrap();

        let Commands::Apps {
            command: Some(AppsCommands::Deploy { params, context, .. }),
            ..
        } = cli.command
        else {
            panic!("expected apps deploy");
        };
        assert_eq!(params, vec!["replicas=3", "env=prod"]);
        assert_eq!(context.overrides().project, Some("Shop"));
        assert_eq!(context.overrides().team, None);
    }

    #[test]
    fn test_apps_without_subcommand_lists() {
        let cli = Cli::try_parse_from(["kubenest", "apps", "--cluster", "eu-west", "-vv"]).unwrap();
        assert_eq!(cli.verbose, 2);
        assert!(matches!(cli.command, Commands::Apps { command: None, .. }));
    }
}
