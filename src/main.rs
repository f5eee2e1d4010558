use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, bail};
use chrono::Utc;
use clap::{Args, Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

use hooksync::config::{FileConfig, GithubAppConfig, ReconcilerConfig, ServerConfig};
use hooksync::error::Error;
use hooksync::github::AppCredentials;
use hooksync::reconcile::Reconciler;
use hooksync::server::{AppState, create_router};
use hooksync::store::{SqliteStore, Store};
use hooksync::types::{Project, ProjectStatus};

#[derive(Parser)]
#[command(name = "hooksync")]
#[command(about = "GitHub App webhook ingestion and installation reconciliation", long_about = None)]
struct Cli {
    /// TOML configuration file. Command-line values override it.
    #[arg(long, global = true, env = "HOOKSYNC_CONFIG")]
    config: Option<PathBuf>,

    /// Data directory for the database
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct GithubArgs {
    /// GitHub App ID
    #[arg(long, env = "HOOKSYNC_GITHUB_APP_ID")]
    github_app_id: Option<String>,

    /// GitHub App private key, PEM or base64-encoded PEM
    #[arg(long, env = "HOOKSYNC_GITHUB_APP_PRIVATE_KEY", hide_env_values = true)]
    github_private_key: Option<String>,

    /// GitHub API base URL
    #[arg(long)]
    github_api_url: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the database
    Init,

    /// Start the webhook server and the installation reconciler
    Serve {
        /// Host to bind to
        #[arg(long)]
        host: Option<String>,

        /// Port to bind to
        #[arg(long, short)]
        port: Option<u16>,

        /// Shared secret used to verify X-Hub-Signature-256
        #[arg(long, env = "HOOKSYNC_WEBHOOK_SECRET", hide_env_values = true)]
        webhook_secret: Option<String>,

        /// Seconds between installation liveness passes
        #[arg(long)]
        reconcile_interval_secs: Option<u64>,

        #[command(flatten)]
        github: GithubArgs,
    },

    /// Manage tracked projects
    Project {
        #[command(subcommand)]
        command: ProjectCommands,
    },

    /// Run a single installation liveness pass and print the report
    Reconcile {
        #[command(flatten)]
        github: GithubArgs,
    },
}

#[derive(Subcommand)]
enum ProjectCommands {
    /// Track a repository
    Add {
        /// Repository full name, e.g. "acme/widgets"
        #[arg(long)]
        full_name: String,

        /// GitHub App installation the repository belongs to
        #[arg(long)]
        installation_id: Option<i64>,
    },

    /// List tracked projects
    List,
}

struct Settings {
    server: ServerConfig,
    github: GithubAppConfig,
    reconciler: ReconcilerConfig,
}

fn load_settings(cli: &Cli) -> anyhow::Result<Settings> {
    let mut settings = Settings {
        server: ServerConfig::default(),
        github: GithubAppConfig::default(),
        reconciler: ReconcilerConfig::default(),
    };

    if let Some(path) = &cli.config {
        let file = FileConfig::load(path)?;
        file.apply_server(&mut settings.server);
        file.apply_github(&mut settings.github)?;
        file.apply_reconciler(&mut settings.reconciler)?;
    }

    if let Some(data_dir) = &cli.data_dir {
        settings.server.data_dir = data_dir.clone();
    }

    Ok(settings)
}

fn apply_github_args(config: &mut GithubAppConfig, args: GithubArgs) {
    if let Some(app_id) = args.github_app_id {
        config.app_id = app_id;
    }
    if let Some(key) = args.github_private_key {
        config.private_key = key;
    }
    if let Some(url) = args.github_api_url {
        config.api_base_url = url;
    }
}

fn open_store(config: &ServerConfig) -> anyhow::Result<SqliteStore> {
    let db_path = config.db_path();
    if !db_path.exists() {
        bail!(
            "Database not found at {}. Run 'hooksync init' first.",
            db_path.display()
        );
    }

    let store = SqliteStore::new(&db_path)?;
    store.initialize()?;
    Ok(store)
}

fn run_init(config: &ServerConfig) -> anyhow::Result<()> {
    fs::create_dir_all(&config.data_dir)?;

    let db_path = config.db_path();
    let store = SqliteStore::new(&db_path)?;
    store.initialize()?;

    println!("Initialized database at {}", db_path.display());
    Ok(())
}

fn validate_full_name(full_name: &str) -> anyhow::Result<()> {
    let mut parts = full_name.split('/');
    let valid = matches!(
        (parts.next(), parts.next(), parts.next()),
        (Some(owner), Some(repo), None) if !owner.is_empty() && !repo.is_empty()
    );
    if !valid || full_name.contains(char::is_whitespace) {
        bail!("Invalid repository name '{full_name}'. Expected 'owner/repo'.");
    }
    Ok(())
}

fn run_project_add(
    store: &SqliteStore,
    full_name: String,
    installation_id: Option<i64>,
) -> anyhow::Result<()> {
    validate_full_name(&full_name)?;

    let now = Utc::now();
    let project = Project {
        id: Uuid::new_v4().to_string(),
        github_full_name: full_name,
        github_app_installation_id: installation_id,
        status: ProjectStatus::Verified,
        created_at: now,
        updated_at: now,
        deleted_at: None,
    };

    match store.create_project(&project) {
        Ok(()) => {}
        Err(Error::AlreadyExists(name)) => bail!("Project '{name}' already exists"),
        Err(e) => return Err(e.into()),
    }

    println!("{}", project.id);
    Ok(())
}

fn run_project_list(store: &SqliteStore) -> anyhow::Result<()> {
    let projects = store.list_projects()?;
    if projects.is_empty() {
        println!("No projects");
        return Ok(());
    }

    for project in projects {
        let installation = project
            .github_app_installation_id
            .map_or_else(|| "-".to_string(), |id| id.to_string());
        let revoked = project
            .deleted_at
            .map(|at| format!(" (revoked {})", at.to_rfc3339()))
            .unwrap_or_default();
        println!(
            "{}  {}  {}  {}{}",
            project.id, project.github_full_name, installation, project.status, revoked
        );
    }
    Ok(())
}

async fn run_reconcile(settings: Settings, store: SqliteStore) -> anyhow::Result<()> {
    if !settings.github.is_configured() {
        bail!(
            "GitHub App is not configured. Set HOOKSYNC_GITHUB_APP_ID and HOOKSYNC_GITHUB_APP_PRIVATE_KEY."
        );
    }

    let reconciler = Reconciler::new(Arc::new(store), settings.github, settings.reconciler);
    let report = reconciler.run_once().await?;
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

async fn run_serve(settings: Settings, store: SqliteStore) -> anyhow::Result<()> {
    if settings.github.is_configured() {
        // Surface a bad key now rather than on the first reconciliation pass.
        AppCredentials::new(&settings.github.app_id, &settings.github.private_key)
            .context("invalid GitHub App credentials")?;
    }
    if settings.server.webhook_secret.is_none() {
        tracing::warn!("No webhook secret configured; signatures will not be verified");
    }

    let store: Arc<dyn Store> = Arc::new(store);
    let state = Arc::new(AppState::new(
        store.clone(),
        settings.server.webhook_secret.clone(),
    ));
    let app = create_router(state);
    let addr = settings.server.socket_addr()?;

    let mut reconciler =
        Reconciler::new(store.clone(), settings.github, settings.reconciler).spawn();

    info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    let served = axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("Shutdown requested");
        })
        .await;

    reconciler.shutdown().await;
    store.close()?;
    served.context("webhook server exited unexpectedly")?;
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("hooksync=info".parse()?))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let mut settings = load_settings(&cli)?;

    match cli.command {
        Commands::Init => run_init(&settings.server)?,
        Commands::Serve {
            host,
            port,
            webhook_secret,
            reconcile_interval_secs,
            github,
        } => {
            if let Some(host) = host {
                settings.server.host = host;
            }
            if let Some(port) = port {
                settings.server.port = port;
            }
            if webhook_secret.is_some() {
                settings.server.webhook_secret = webhook_secret;
            }
            if let Some(secs) = reconcile_interval_secs {
                if secs == 0 {
                    bail!("--reconcile-interval-secs must be greater than zero");
                }
                settings.reconciler.interval = Duration::from_secs(secs);
            }
            apply_github_args(&mut settings.github, github);

            let store = open_store(&settings.server)?;
            run_serve(settings, store).await?;
        }
        Commands::Project { command } => {
            let store = open_store(&settings.server)?;
            match command {
                ProjectCommands::Add {
                    full_name,
                    installation_id,
                } => run_project_add(&store, full_name, installation_id)?,
                ProjectCommands::List => run_project_list(&store)?,
            }
        }
        Commands::Reconcile { github } => {
            apply_github_args(&mut settings.github, github);
            let store = open_store(&settings.server)?;
            run_reconcile(settings, store).await?;
        }
    }

    Ok(())
}
