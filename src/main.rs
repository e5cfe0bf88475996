use crate::{cli::AppArgs, io::TcpTransport, message::record::Record, resolver::Resolver};
use anyhow::Result as AResult;
use std::process::ExitCode;
use tracing_subscriber::{fmt, EnvFilter};

mod cli;
mod dns_types;
mod error;
mod io;
mod message;
mod parse;
mod resolver;
#[cfg(test)]
mod testing;
mod util;

fn main() -> ExitCode {
    let app_args = match AppArgs::parse() {
        Ok(args) => args,
        Err(e) => {
            eprintln!("{e}");
            return ExitCode::FAILURE;
        }
    };
    init_logging(app_args.verbose);
    match run(app_args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{e:#}");
            ExitCode::FAILURE
        }
    }
}

/// Logs go to stderr. `RUST_LOG` wins over the verbosity flag when it's set.
fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_level));
    fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn run(app_args: AppArgs) -> AResult<()> {
    let transport = TcpTransport {
        timeout: app_args.timeout,
        ..Default::default()
    };
    let mut resolver = Resolver::new(transport, app_args.config);
    let resolution = resolver.resolve(&app_args.request)?;
    if resolution.is_empty() {
        eprintln!(
            "No {} records found for {}: {}",
            app_args.request.record_type, app_args.request.domain_name, resolution.outcome
        );
        return Ok(());
    }
    for record in sorted_for_display(resolution.into_records()) {
        println!("{record}");
    }
    Ok(())
}

/// Group records by type name, keeping server order within a type.
fn sorted_for_display(mut records: Vec<Record>) -> Vec<Record> {
    records.sort_by_cached_key(|r| r.record_type().to_string());
    records
}
