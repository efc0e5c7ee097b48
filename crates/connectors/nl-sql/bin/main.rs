use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use nl_sql::routes::create_router;
use nl_sql::state::{self, create_state};
use nl_sql_configuration::{
    configuration_schema, parse_configuration, write_parsed_configuration, Configuration,
    ProcessEnvironment,
};
use query_engine_execution::{create_pool, PostgresEngine, RelationalEngine};

#[derive(Parser)]
#[command(version, about = "Answer business questions with generated SQL")]
struct Cli {
    /// Emit logs as JSON lines.
    #[arg(long, env = "NL_SQL_LOG_JSON", global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Serve questions over HTTP.
    Serve {
        #[arg(long, env = "NL_SQL_CONFIGURATION", default_value = ".")]
        configuration: PathBuf,
        #[arg(long, env = "PORT", default_value_t = 8080)]
        port: u16,
    },
    /// Answer a single question and exit.
    Ask {
        #[arg(long, env = "NL_SQL_CONFIGURATION", default_value = ".")]
        configuration: PathBuf,
        question: String,
    },
    /// Replace the schema section with the tables found in the database.
    Introspect {
        #[arg(long, env = "NL_SQL_CONFIGURATION", default_value = ".")]
        configuration: PathBuf,
        #[arg(long, default_value = "public")]
        schema: String,
    },
    /// Print the JSON Schema of the configuration file.
    PrintSchema,
}

#[tokio::main]
pub async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.log_json);

    match run(cli.command).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            eprintln!("{error:#}");
            ExitCode::FAILURE
        }
    }
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

async fn run(command: Command) -> anyhow::Result<()> {
    match command {
        Command::Serve {
            configuration,
            port,
        } => serve(&configuration, port).await,
        Command::Ask {
            configuration,
            question,
        } => ask(&configuration, &question).await,
        Command::Introspect {
            configuration,
            schema,
        } => introspect(&configuration, &schema).await,
        Command::PrintSchema => {
            println!("{}", serde_json::to_string_pretty(&configuration_schema())?);
            Ok(())
        }
    }
}

/// Parse and validate the configuration directory, reporting failures with
/// their error kind before anything else runs.
async fn load_configuration(configuration_dir: &Path) -> anyhow::Result<Configuration> {
    state::load_configuration(configuration_dir, ProcessEnvironment)
        .await
        .map_err(|error| {
            if let (Some(kind), Some(category)) = (error.kind(), error.category()) {
                eprintln!("{kind} ({category})");
            }
            anyhow::Error::new(error).context("invalid configuration")
        })
}

async fn serve(configuration_dir: &Path, port: u16) -> anyhow::Result<()> {
    let configuration = load_configuration(configuration_dir).await?;
    let state = create_state(&configuration, prometheus::Registry::new()).await?;
    let router = create_router(state);

    let address = SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!(%address, "Starting server");

    axum::Server::bind(&address)
        .serve(router.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(error) = tokio::signal::ctrl_c().await {
        tracing::error!(%error, "Unable to listen for the shutdown signal");
    }
    tracing::info!("Shutting down");
}

async fn ask(configuration_dir: &Path, question: &str) -> anyhow::Result<()> {
    let configuration = load_configuration(configuration_dir).await?;
    let state = create_state(&configuration, prometheus::Registry::new()).await?;

    match state.pipeline.run(question).await {
        Ok(payload) => {
            let sql = sqlformat::format(
                &payload.sql,
                &sqlformat::QueryParams::None,
                sqlformat::FormatOptions::default(),
            );
            println!("Enhanced query: {}", payload.enhanced_query);
            println!();
            println!("{sql}");
            println!();
            println!("{}", serde_json::to_string_pretty(payload.result.rows())?);
            println!();
            println!(
                "{} row(s), trace {} ({} ms)",
                payload.result.row_count(),
                payload.trace.trace_id,
                payload.trace.latency_ms
            );
            Ok(())
        }
        Err(error) => {
            if let Some(sql) = &error.sql {
                eprintln!("{sql}");
            }
            eprintln!("trace {} ({})", error.trace.trace_id, error.category);
            Err(error.into())
        }
    }
}

async fn introspect(configuration_dir: &Path, schema_name: &str) -> anyhow::Result<()> {
    let configuration = load_configuration(configuration_dir).await?;
    let parsed = parse_configuration(configuration_dir).await?;

    let pool = create_pool(
        &configuration.connection_uri,
        configuration.pool_settings.max_connections,
        configuration.pool_timeout(),
    )
    .await
    .context("unable to connect to the database")?;
    let engine = PostgresEngine::new(pool);

    let tables = engine.catalog(schema_name).await?;
    if tables.is_empty() {
        anyhow::bail!("no tables found in schema {schema_name:?}");
    }
    tracing::info!(
        schema = schema_name,
        tables = tables.len(),
        columns = tables.column_count(),
        "Introspected schema"
    );

    write_parsed_configuration(&parsed.with_static_schema(tables), configuration_dir).await?;
    Ok(())
}
