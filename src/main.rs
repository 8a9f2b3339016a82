use std::sync::atomic::Ordering;
use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use union_courier::config::AppConfig;
use union_courier::routes::registry;
use union_courier::routes::{Pipeline, PipelineTiming, RouteSummary};
use union_courier::signing::TxSigner;
use union_courier::transport::graphql::{IndexerClient, DEFAULT_INDEXER_ENDPOINT};
use union_courier::transport::jsonrpc::RpcProvider;

const RUN_ALL_CHOICE: u8 = 13;

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing().context("initialize tracing subscriber")?;

    if let Err(err) = run().await {
        tracing::error!(error = ?err, "fatal courier error");
        std::process::exit(1);
    }
    Ok(())
}

async fn run() -> Result<()> {
    let config = AppConfig::load().context("load configuration from environment")?;

    let signer = TxSigner::from_hex(&config.private_key).context("parse signing key")?;
    let sender = signer.address();

    let indexer_endpoint = match &config.graphql_endpoint {
        Some(url) => url.clone(),
        None => DEFAULT_INDEXER_ENDPOINT
            .parse()
            .context("default indexer endpoint")?,
    };
    let indexer =
        Arc::new(IndexerClient::new(indexer_endpoint.clone()).context("build indexer client")?);
    let provider = Arc::new(RpcProvider::new(config.rpc_overrides()));

    let (min_delay, max_delay) = config.delay_bounds();
    let timing = PipelineTiming {
        min_delay_secs: min_delay,
        max_delay_secs: max_delay,
        ..PipelineTiming::default()
    };
    let pipeline = Pipeline::new(
        provider,
        indexer,
        signer,
        config.xion_address.clone(),
        config.babylon_address.clone(),
    )
    .with_amount_overrides(config.amount_overrides())
    .with_timing(timing);

    let shutdown = pipeline.shutdown_flag();
    tokio::spawn(async move {
        if let Err(err) = tokio::signal::ctrl_c().await {
            warn!(error = %err, "ctrl_c listener error");
            return;
        }
        info!("shutdown signal received; finishing the current transfer");
        shutdown.store(true, Ordering::Relaxed);
    });

    info!(
        sender = %sender,
        indexer = %indexer_endpoint,
        "union courier online"
    );

    match config.route {
        Some(choice) => {
            let count = config.tx_count.unwrap_or(1);
            report(&dispatch(&pipeline, choice, count).await?);
        }
        None => menu_loop(&pipeline).await?,
    }
    Ok(())
}

async fn dispatch(pipeline: &Pipeline, choice: u8, count: u32) -> Result<Vec<RouteSummary>> {
    if choice == RUN_ALL_CHOICE {
        return Ok(pipeline.run_all(count).await);
    }
    let route = registry::lookup(choice)?;
    Ok(vec![pipeline.run_route(route, count).await])
}

async fn menu_loop(pipeline: &Pipeline) -> Result<()> {
    loop {
        print_menu();
        let choice = match prompt("Select a route (q to quit): ").await? {
            None => break,
            Some(line) => match line.parse::<u8>() {
                Ok(n) if (1..=RUN_ALL_CHOICE).contains(&n) => n,
                _ => {
                    println!("enter a number between 1 and {RUN_ALL_CHOICE}");
                    continue;
                }
            },
        };
        let count = match prompt("How many transfers per route? ").await? {
            None => break,
            Some(line) => match line.parse::<u32>() {
                Ok(n) if n > 0 => n,
                _ => {
                    println!("enter a positive number");
                    continue;
                }
            },
        };
        report(&dispatch(pipeline, choice, count).await?);
    }
    Ok(())
}

fn print_menu() {
    println!();
    println!("=== Union testnet courier ===");
    for route in registry::all() {
        println!("{:>3}. {}", route.id, route.pair);
    }
    println!("{RUN_ALL_CHOICE:>3}. Run every route");
}

/// Read one trimmed line from stdin. `None` means quit (q, exit, or EOF).
async fn prompt(message: &'static str) -> Result<Option<String>> {
    tokio::task::spawn_blocking(move || {
        use std::io::Write;
        print!("{message}");
        std::io::stdout().flush()?;
        let mut line = String::new();
        let read = std::io::stdin().read_line(&mut line)?;
        let line = line.trim().to_string();
        if read == 0 || line.eq_ignore_ascii_case("q") || line.eq_ignore_ascii_case("exit") {
            return Ok(None);
        }
        Ok(Some(line))
    })
    .await
    .context("stdin reader task")?
}

fn report(summaries: &[RouteSummary]) {
    for summary in summaries {
        info!(
            pair = summary.pair,
            completed = summary.completed,
            requested = summary.requested,
            aborted = summary.aborted,
            "route summary"
        );
    }
}

fn init_tracing() -> Result<()> {
    let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| "info,hyper=warn".to_string());
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(env_filter))
        .with_target(false)
        .try_init()
        .map_err(|err| anyhow!("tracing subscriber init: {err}"))
}
