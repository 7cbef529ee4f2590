use std::env;
use std::net::SocketAddr;
use std::process::ExitCode;
use std::sync::Arc;

use rinha_ledger::config::{Command, ServerConfig, VerifierConfig};
use rinha_ledger::http::{HttpEndpoint, serve};
use rinha_ledger::report::print_report;
use rinha_ledger::service::deploy;
use rinha_ledger::verifier::{Endpoint, Verifier};
use tokio::net::TcpListener;
use tokio::task::JoinSet;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let command = match Command::parse(env::args().skip(1)) {
        Ok(command) => command,
        Err(e) => {
            error!("{e}");
            eprintln!("usage: rinha-ledger serve [--isolated] [--host H] [PORT...]");
            eprintln!(
                "       rinha-ledger verify [--customer N] [--amount N] [--count N] [--credit] [--timeout-ms N] [URL...]"
            );
            return ExitCode::from(2);
        }
    };

    match command {
        Command::Serve(config) => run_server(config).await,
        Command::Verify(config) => run_verifier(config).await,
    }
}

async fn run_server(config: ServerConfig) -> ExitCode {
    let services = deploy(config.topology, config.ports.len(), &config.ledger);
    info!(topology = ?config.topology, listeners = config.ports.len(), "starting ledger");

    let mut listeners = JoinSet::new();
    for (port, service) in config.ports.iter().zip(services) {
        let addr = SocketAddr::new(config.host, *port);
        let listener = match TcpListener::bind(addr).await {
            Ok(listener) => listener,
            Err(e) => {
                error!(%addr, "failed to bind: {e}");
                return ExitCode::FAILURE;
            }
        };
        listeners.spawn(serve(listener, service));
    }

    while let Some(result) = listeners.join_next().await {
        match result {
            Ok(Ok(())) => warn!("listener stopped"),
            Ok(Err(e)) => error!("listener failed: {e}"),
            Err(e) => error!("listener task failed: {e}"),
        }
    }
    ExitCode::FAILURE
}

async fn run_verifier(config: VerifierConfig) -> ExitCode {
    let endpoints: Vec<Arc<dyn Endpoint>> = config
        .endpoints
        .iter()
        .map(|url| {
            Arc::new(HttpEndpoint::new(url.as_str(), config.request_timeout)) as Arc<dyn Endpoint>
        })
        .collect();

    let report = match Verifier::new(&config, endpoints).run().await {
        Ok(report) => report,
        Err(e) => {
            error!("{e}");
            return ExitCode::FAILURE;
        }
    };

    if let Err(e) = print_report(&report) {
        warn!("failed to write report: {e}");
    }

    match report.ensure_conserved() {
        Ok(()) => {
            info!(balance = %report.balance_after, "test passed");
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("test failed: {e}");
            ExitCode::FAILURE
        }
    }
}
