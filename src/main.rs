use anyhow::{Context, Result};
use std::sync::Arc;
use std::time::Duration;
use taskgate::{
    AppState, DatabaseClient, DatabaseProvider, TaskgateConfig, UserService, build_app,
    auth::jwt::AuthService,
    cli::{
        Cli, Commands,
        init::{self, InitConfig, InitResult},
        output::Output,
    },
};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse_args();
    let output = if cli.no_color {
        Output::no_color()
    } else {
        Output::new()
    };

    match cli.command {
        Some(Commands::Init {
            path,
            force,
            host,
            port,
        }) => {
            let result = init::run(
                InitConfig {
                    path,
                    force,
                    host,
                    port,
                },
                &output,
            );
            match result {
                InitResult::Success => Ok(()),
                InitResult::AlreadyExists => std::process::exit(1),
                InitResult::Error(e) => Err(anyhow::anyhow!(e)),
            }
        }
        Some(Commands::Config { validate }) => show_config(&cli.config, validate, &output),
        Some(Commands::CreateAdmin {
            username,
            email,
            password,
        }) => {
            let config = load_config(&cli.config)?;
            init_tracing(&config.server.log_level, cli.verbose, cli.json_logs);
            create_admin(config, &username, &email, &password, &output).await
        }
        Some(Commands::Serve) | None => {
            let config = load_config(&cli.config)?;
            init_tracing(&config.server.log_level, cli.verbose, cli.json_logs);
            serve(config).await
        }
    }
}

/// Loads `.env`, then the TOML file. Any failure here is fatal.
fn load_config(path: &std::path::Path) -> Result<TaskgateConfig> {
    dotenvy::dotenv().ok();

    TaskgateConfig::load(path)
        .with_context(|| format!("Failed to load configuration from {}", path.display()))
}

fn init_tracing(log_level: &str, verbose: bool, json: bool) {
    let default_filter = if verbose {
        "debug,tower_http=debug".to_string()
    } else {
        format!("{log_level},tower_http=info")
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

async fn connect(config: &TaskgateConfig) -> Result<Arc<dyn DatabaseClient>> {
    let provider = DatabaseProvider::from_config(&config.database);
    tracing::info!(provider = %provider, "Connecting to database");

    let client = provider
        .create_client()
        .await
        .context("Failed to open database")?;
    Ok(Arc::from(client))
}

async fn serve(config: TaskgateConfig) -> Result<()> {
    let db = connect(&config).await?;
    let bind_address = config.bind_address();
    let grace = config.server.shutdown_grace();

    let state = AppState::new(config, db).context("Failed to build application state")?;
    let app = build_app(state);

    let listener = tokio::net::TcpListener::bind(&bind_address)
        .await
        .with_context(|| format!("Failed to bind {}", bind_address))?;
    tracing::info!("Taskgate listening on http://{}", bind_address);

    let shutdown = Arc::new(tokio::sync::Notify::new());
    let server_shutdown = shutdown.clone();
    let mut server = tokio::spawn(async move {
        axum::serve(listener, app)
            .with_graceful_shutdown(async move { server_shutdown.notified().await })
            .await
    });

    tokio::select! {
        result = &mut server => {
            return result.context("Server task panicked")?.context("Server error");
        }
        _ = shutdown_signal() => {}
    }

    tracing::info!(grace_secs = grace.as_secs(), "Shutdown signal received, draining requests");
    shutdown.notify_one();

    drain(server, grace).await
}

async fn drain(
    mut server: tokio::task::JoinHandle<std::io::Result<()>>,
    grace: Duration,
) -> Result<()> {
    match tokio::time::timeout(grace, &mut server).await {
        Ok(result) => {
            result.context("Server task panicked")?.context("Server error")?;
            tracing::info!("Server stopped");
        }
        Err(_) => {
            tracing::warn!("Grace period elapsed, aborting remaining requests");
            server.abort();
        }
    }
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
}

async fn create_admin(
    config: TaskgateConfig,
    username: &str,
    email: &str,
    password: &str,
    output: &Output,
) -> Result<()> {
    let db = connect(&config).await?;
    let secret = config.jwt_secret()?;
    let users = UserService::new(
        db,
        Arc::new(AuthService::new(&secret, config.auth.token_ttl_secs)),
    );

    match users.create_admin(username, email, password).await {
        Ok(profile) => {
            output.success(&format!(
                "Created administrator '{}' (id {})",
                profile.username, profile.id
            ));
            Ok(())
        }
        Err(e) => {
            output.error(&format!("Failed to create administrator: {}", e));
            Err(e.into())
        }
    }
}

fn show_config(path: &std::path::Path, validate: bool, output: &Output) -> Result<()> {
    dotenvy::dotenv().ok();

    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let config = TaskgateConfig::parse(&content)?;

    output.header("Configuration");
    output.kv("file", &path.display().to_string());
    output.kv("bind", &config.bind_address());
    output.kv("log_level", &config.server.log_level);
    output.kv(
        "request_timeout_secs",
        &config.server.request_timeout_secs.to_string(),
    );
    output.kv(
        "shutdown_grace_secs",
        &config.server.shutdown_grace_secs.to_string(),
    );
    output.kv("jwt_secret_env", &config.auth.jwt_secret_env);
    output.kv("token_ttl_secs", &config.auth.token_ttl_secs.to_string());
    output.kv(
        "database",
        &DatabaseProvider::from_config(&config.database).to_string(),
    );

    if validate {
        output.newline();
        match config.validate() {
            Ok(()) => output.success("Configuration is valid"),
            Err(e) => {
                output.error(&e.to_string());
                std::process::exit(1);
            }
        }
    }

    Ok(())
}
