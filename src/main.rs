//! catalog-report - PostgreSQL catalog and usage statistics export.

mod cli;

use catalog_report::config::{Config, ConnectionConfig};
use catalog_report::db::PostgresConnector;
use catalog_report::driver::{self, Driver, RunSummary};
use catalog_report::error::{CatalogError, Result};
use catalog_report::{logging, report};
use cli::Cli;
use std::time::Duration;
use tracing::{error, info};

/// Exit status when setup fails before any report runs.
const SETUP_FAILURE: i32 = 2;

#[tokio::main(flavor = "current_thread")]
async fn main() {
    // Credentials may live in a local .env file
    let _ = dotenvy::dotenv();

    let cli = Cli::parse_args();
    logging::init_stderr_logging(cli.log_level());

    let code = match run(&cli).await {
        Ok(summary) => summary.exit_code(),
        Err(e) => {
            error!("{}", e);
            SETUP_FAILURE
        }
    };

    std::process::exit(code);
}

async fn run(cli: &Cli) -> Result<RunSummary> {
    let config_path = cli.config_path();
    info!("Loading config from: {}", config_path.display());
    let config = Config::load_from_file(&config_path)?;

    let mut settings = config.reports.clone();
    cli.apply_report_overrides(&mut settings);

    let reports = report::select(report::builtin_reports(&settings), &cli.only).map_err(
        |unknown| CatalogError::config(format!("Unknown report(s): {}", unknown.join(", "))),
    )?;

    let mut stdout = std::io::stdout();

    if cli.list {
        driver::list_reports(&mut stdout, &reports)?;
        return Ok(RunSummary::default());
    }

    let connection = resolve_connection(cli, &config)?.ok_or_else(|| {
        CatalogError::config(
            "No database connection configured. Pass a connection string, --host/--database, \
             a [connections.default] entry, or PG* environment variables.",
        )
    })?;
    connection.require_database()?;
    info!("Connection: {}", connection.display_string());

    let connector = PostgresConnector::new(
        connection,
        Duration::from_secs(settings.query_timeout_secs),
    );
    let summary = Driver::new(connector, reports)
        .fail_fast(cli.fail_fast)
        .run(&mut stdout)
        .await;

    println!("{}", summary.closing_line());
    Ok(summary)
}

/// Resolves the final connection configuration from CLI args, config file, and environment.
///
/// Precedence: CLI arguments, then the named connection, then the default
/// connection; the `PG*` environment variables fill whatever is still unset.
fn resolve_connection(cli: &Cli, config: &Config) -> Result<Option<ConnectionConfig>> {
    resolve_connection_with(cli, config, |key| std::env::var(key).ok())
}

fn resolve_connection_with(
    cli: &Cli,
    config: &Config,
    env: impl Fn(&str) -> Option<String>,
) -> Result<Option<ConnectionConfig>> {
    let mut connection = cli.to_connection_config()?;

    if connection.is_none() {
        if let Some(name) = cli.connection_name() {
            connection = config.get_connection(Some(name)).cloned();
            if connection.is_none() {
                return Err(CatalogError::config(format!(
                    "Connection '{}' not found in config file",
                    name
                )));
            }
        }
    }

    if connection.is_none() {
        connection = config.get_connection(None).cloned();
    }

    // Environment alone is enough when it names a database
    if connection.is_none() && env("PGDATABASE").is_some() {
        connection = Some(ConnectionConfig::default());
    }

    if let Some(ref mut conn) = connection {
        conn.apply_defaults_from(env);
    }

    Ok(connection)
}
