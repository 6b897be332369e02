use clap::{Args, Parser, Subcommand};
use fold_repo::{
    config::{self, Config, ConfigOverrides},
    ConfigError,
    logging, ApiOptions, ApiServer, BootstrapOptions, RepoError, RepositoryBootstrapper,
};
use log::{error, info};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

/// Environment variable naming the default repository location.
const REPO_PATH_ENV: &str = "FOLD_REPO_PATH";
/// Configuration file name inside the repository location.
const CONFIG_FILE: &str = "node_config.json";

/// Command line options for the repository node.
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Cli {
    /// Path to the configuration file (default: <repo>/node_config.json)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the repository node and its HTTP API
    Server(ServerArgs),
    /// Inspect the configuration
    #[command(subcommand)]
    Config(ConfigCommand),
}

#[derive(Args, Debug, Default, PartialEq, Eq)]
struct ServerArgs {
    /// Port for the HTTP API (default: api.port, 3000)
    #[arg(short, long)]
    port: Option<u16>,

    /// Create the repository if it does not exist yet
    #[arg(long)]
    init_repo: bool,

    /// Run entirely in memory; nothing is read from or written to disk
    #[arg(long)]
    mem_only: bool,

    /// Do not dial bootstrap peers
    #[arg(long)]
    offline: bool,

    /// Repository location (default: $FOLD_REPO_PATH or ~/.fold_repo)
    #[arg(long)]
    repo_path: Option<PathBuf>,
}

impl ServerArgs {
    fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            port: self.port,
            mem_only: self.mem_only,
            offline: self.offline,
            repo_path: self.repo_path.clone(),
        }
    }
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
enum ConfigCommand {
    /// Check the configuration and list every violation
    Validate,
    /// Print the effective configuration
    Show,
}

fn default_repo_root() -> PathBuf {
    if let Some(path) = std::env::var_os(REPO_PATH_ENV).filter(|p| !p.is_empty()) {
        return PathBuf::from(path);
    }
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".fold_repo")
}

fn config_path(cli: &Cli, repo_root: &Path) -> PathBuf {
    cli.config.clone().unwrap_or_else(|| repo_root.join(CONFIG_FILE))
}

/// The configuration a command runs with and where it came from.
#[derive(Debug)]
struct LoadedConfig {
    config: Config,
    path: PathBuf,
    /// No file existed at `path`; built-in defaults are in use.
    defaulted: bool,
}

/// Loads the persisted configuration and fills in the default repository
/// location when none is configured.
///
/// Nothing is logged here: the logger is configured from the result.
fn load_config(cli: &Cli, repo_root: &Path) -> Result<LoadedConfig, RepoError> {
    let path = config_path(cli, repo_root);
    let (mut config, defaulted) = match Config::load(&path) {
        Ok(config) => (config, false),
        Err(ConfigError::NotFound(_)) => (Config::default(), true),
        Err(e) => return Err(e.into()),
    };
    if config.repo.path.is_none() {
        config.repo.path = Some(repo_root.to_path_buf());
    }
    Ok(LoadedConfig {
        config,
        path,
        defaulted,
    })
}

fn run_server(cli: &Cli, args: &ServerArgs) -> Result<(), RepoError> {
    let repo_root = args.repo_path.clone().unwrap_or_else(default_repo_root);
    let loaded = load_config(cli, &repo_root)?;
    let config = loaded.config.with_overrides(&args.overrides());

    if let Err(e) = logging::init(&config.logging) {
        eprintln!("Failed to initialize logging: {e}");
    }
    if loaded.defaulted {
        info!("Config file {} not found, using default config", loaded.path.display());
    }
    info!("Starting fold_repo server...");

    let mut bootstrapper = RepositoryBootstrapper::new();
    let repo = bootstrapper.bootstrap(
        &config,
        &BootstrapOptions {
            init_if_absent: args.init_repo,
        },
    )?;

    let server = ApiServer::new(repo, ApiOptions::from_config(&config))?;
    info!("Starting HTTP server on port {}...", server.options().port);

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(fold_repo::ServiceStartError::Server)?;
    runtime.block_on(server.serve())?;
    info!("Server stopped");
    Ok(())
}

fn run_config(cli: &Cli, command: &ConfigCommand) -> Result<bool, RepoError> {
    let repo_root = default_repo_root();
    match command {
        ConfigCommand::Validate => match load_config(cli, &repo_root) {
            Ok(_) => {
                println!("Configuration is valid");
                Ok(true)
            }
            Err(RepoError::Config(e)) if e.violations().is_some() => {
                if let Some(violations) = e.violations() {
                    for violation in violations.violations() {
                        println!("{violation}");
                    }
                }
                Ok(false)
            }
            Err(e) => Err(e),
        },
        ConfigCommand::Show => {
            let config = load_config(cli, &repo_root)?.config;
            let text = serde_json::to_string_pretty(&config).map_err(ConfigError::from)?;
            println!("{text}");
            Ok(true)
        }
    }
}

fn run(cli: Cli) -> Result<bool, RepoError> {
    config::check_schemas();
    match &cli.command {
        Command::Server(args) => run_server(&cli, args).map(|_| true),
        Command::Config(command) => run_config(&cli, command),
    }
}

/// Main entry point for the repository node.
///
/// # Command-Line Arguments
///
/// * `server [-p PORT] [--init-repo] [--mem-only] [--offline] [--repo-path P]`
/// * `config validate` / `config show`
/// * `-c, --config <PATH>` - configuration file for any command
///
/// # Environment Variables
///
/// * `FOLD_REPO_PATH` - repository location when `--repo-path` is not given
/// * `RUST_LOG` - overrides the configured log levels
fn main() -> ExitCode {
    match run(Cli::parse()) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            error!("{e}");
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}
