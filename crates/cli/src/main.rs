use crate::{
    commands::{BucketArgs, Commands},
    error::CliError,
    shutdown::{ExitCode, ShutdownCoordinator},
};
use clap::Parser;
use engine_config::settings::{StreamSettings, StreamSettingsBuilder};
use engine_core::future::RiakFuture;
use engine_runtime::{
    commands::{FetchValue, IndexQuery, ListKeys},
    memory::MemoryNode,
    node::Node,
};
use futures_util::{StreamExt, pin_mut};
use model::{
    core::{location::Namespace, object::IndexTerm},
    pagination::continuation::Continuation,
    query::index::IndexRange,
};
use std::{sync::Arc, time::Duration};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};
use tracing_subscriber::EnvFilter;

mod commands;
mod error;
mod output;
mod shutdown;

#[derive(Parser)]
#[command(
    name = "riakstream",
    version = "0.1.0",
    about = "Streams query results from a key/value node"
)]
struct Cli {
    #[arg(long, global = true, help = "JSON file with the node's initial contents")]
    seed: Option<String>,

    #[arg(long, global = true, help = "Upper bound on a single wait for the next chunk")]
    poll_timeout_ms: Option<u64>,

    #[arg(long, global = true, help = "Entries per streamed chunk")]
    page_size: Option<usize>,

    #[arg(long, global = true, help = "Chunks buffered ahead of the consumer")]
    queue_capacity: Option<usize>,

    #[arg(long, global = true, help = "Log filter, e.g. debug or engine_processing=trace")]
    log_level: Option<String>,

    #[arg(long, global = true, help = "Print results as JSON lines")]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[tokio::main]
async fn main() -> std::process::ExitCode {
    let cli = Cli::parse();

    let filter = match &cli.log_level {
        Some(level) => EnvFilter::new(level),
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let shutdown = ShutdownCoordinator::new(CancellationToken::new());
    shutdown.register_handlers();

    match run(cli, shutdown.cancel_token()).await {
        Ok(()) => ExitCode::Success.into(),
        Err(err) if err.is_interrupt() || shutdown.is_shutdown_requested() => {
            info!("Interrupted");
            ExitCode::ShutdownRequested.into()
        }
        Err(err) => {
            error!(error = %err, "Command failed");
            ExitCode::GeneralError.into()
        }
    }
}

async fn run(cli: Cli, interrupt: CancellationToken) -> Result<(), CliError> {
    let settings = resolve_settings(&cli)?;
    let node = load_node(cli.seed.as_deref()).await?;

    match cli.command {
        Commands::Fetch { bucket, key } => {
            let location = namespace(&bucket).location(key);
            let response = FetchValue::new(location.clone()).execute(&node).get().await?;
            output::print_fetch(&location, response.as_ref(), cli.json)?;
        }
        Commands::IndexQuery {
            bucket,
            index,
            match_term,
            start,
            end,
            max_results,
            continuation,
            return_terms,
        } => {
            let range = match (match_term, start, end) {
                (Some(term), _, _) => IndexRange::Match(parse_term(&index, &term)?),
                (None, Some(start), Some(end)) => IndexRange::Range {
                    start: parse_term(&index, &start)?,
                    end: parse_term(&index, &end)?,
                },
                _ => return Err(CliError::MissingRange),
            };
            let continuation = continuation
                .as_deref()
                .map(Continuation::from_hex)
                .transpose()?;

            let mut query = IndexQuery::new(namespace(&bucket), index, range)
                .with_continuation(continuation)
                .with_return_terms(return_terms);
            if let Some(max_results) = max_results {
                query = query.with_max_results(max_results);
            }

            let mut response = query
                .execute_interruptible(&node, &settings, interrupt)
                .await?;
            let mut count = 0usize;
            while let Some(entry) = response.next().await? {
                output::print_entry(&entry, cli.json)?;
                count += 1;
            }
            if let Some(continuation) = response.continuation() {
                output::print_continuation(continuation, cli.json);
            }
            info!(query = %response.query_info(), results = count, "Index query finished");
        }
        Commands::ListKeys { bucket } => {
            let response = ListKeys::new(namespace(&bucket))
                .execute_interruptible(&node, &settings, interrupt);
            let keys = response.into_stream();
            pin_mut!(keys);

            let mut count = 0usize;
            while let Some(key) = keys.next().await {
                output::print_key(&key?, cli.json);
                count += 1;
            }
            info!(keys = count, "Key listing finished");
        }
    }

    Ok(())
}

/// Environment first, then command line flags on top.
fn resolve_settings(cli: &Cli) -> Result<StreamSettings, CliError> {
    let mut flags = StreamSettingsBuilder::new();
    flags.poll_timeout = cli.poll_timeout_ms.map(Duration::from_millis);
    flags.page_size = cli.page_size;
    flags.queue_capacity = cli.queue_capacity;

    let settings = StreamSettingsBuilder::from_vars(std::env::vars())?
        .merge(flags)
        .build()?;
    Ok(settings)
}

async fn load_node(seed: Option<&str>) -> Result<Arc<dyn Node>, CliError> {
    let node = match seed {
        Some(path) => {
            let json = tokio::fs::read_to_string(path).await?;
            MemoryNode::from_seed_json(&json)?
        }
        None => {
            debug!("No seed given, starting with an empty node");
            MemoryNode::new(engine_runtime::memory::DEFAULT_NODE_NAME)
        }
    };
    Ok(Arc::new(node))
}

fn namespace(args: &BucketArgs) -> Namespace {
    Namespace::new(args.bucket_type.clone(), args.bucket.clone())
}

/// Integer indexes (`*_int`) take numeric terms; everything else is binary.
fn parse_term(index: &str, raw: &str) -> Result<IndexTerm, CliError> {
    if index.ends_with("_int") {
        raw.parse::<i64>()
            .map(IndexTerm::Int)
            .map_err(|_| CliError::InvalidTerm {
                index: index.to_string(),
                value: raw.to_string(),
            })
    } else {
        Ok(IndexTerm::Bin(raw.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_term_by_index_suffix() {
        assert_eq!(parse_term("age_int", "42").unwrap(), IndexTerm::Int(42));
        assert_eq!(
            parse_term("email_bin", "42").unwrap(),
            IndexTerm::Bin("42".into())
        );
        assert!(matches!(
            parse_term("age_int", "forty"),
            Err(CliError::InvalidTerm { .. })
        ));
    }

    #[test]
    fn test_flags_override_defaults() {
        let cli = Cli::parse_from([
            "riakstream",
            "--page-size",
            "5",
            "list-keys",
            "--bucket",
            "users",
        ]);
        let settings = resolve_settings(&cli).unwrap();
        assert_eq!(settings.page_size(), 5);
    }

    #[test]
    fn test_match_conflicts_with_range() {
        let parsed = Cli::try_parse_from([
            "riakstream",
            "index-query",
            "--bucket",
            "users",
            "--index",
            "age_int",
            "--match",
            "3",
            "--start",
            "1",
            "--end",
            "5",
        ]);
        assert!(parsed.is_err());
    }
}
