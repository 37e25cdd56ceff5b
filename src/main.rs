use std::process;

use anyhow::Result;
use clap::error::ErrorKind;
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use counterwatch::backend::BackendSession;
use counterwatch::date::parse_offset;
use counterwatch::extract::{Extraction, QueryMode};
use counterwatch::report::{self, exit_code};
use counterwatch::select::Selection;

#[derive(Parser, Debug)]
#[command(name = "counterwatch")]
#[command(version)]
#[command(about = "Extract counter time-series from a monitoring backend's check results")]
struct Args {
    /// Backend root URL
    #[arg(short = 'b', long, default_value = "http://127.0.0.1:5000")]
    backend: String,

    /// Backend login username
    #[arg(short = 'u', long, default_value = "admin")]
    username: String,

    /// Backend login password
    #[arg(short = 'p', long, default_value = "admin")]
    password: String,

    /// Comma-separated host names to extract, or "all"
    #[arg(short = 'H', long, default_value = "all")]
    hostnames: String,

    /// Comma-separated service names to extract, or "all"
    #[arg(short = 'S', long, default_value = "all")]
    services: String,

    /// Comma-separated counter names to extract, or "all"
    #[arg(short = 'M', long, default_value = "all")]
    metrics: String,

    /// Query hosts and services individually instead of one bulk log query
    #[arg(long)]
    per_entity: bool,

    /// UTC offset for displayed check dates, e.g. "+02:00"
    #[arg(long, default_value = "+00:00")]
    utc_offset: String,

    /// Run in verbose mode (more info to display)
    #[arg(short = 'v', long, conflicts_with = "quiet")]
    verbose: bool,

    /// Run in quiet mode (display nothing but the result)
    #[arg(short = 'q', long)]
    quiet: bool,
}

fn main() {
    // clap would exit 2 on a parse error; the contract reserves 2 for
    // authentication denial and 64 for usage errors.
    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(err) => {
            let code = match err.kind() {
                ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => exit_code::OK,
                _ => exit_code::USAGE,
            };
            let _ = err.print();
            process::exit(code);
        }
    };

    init_logging(&args);

    match run(args) {
        Ok(code) => process::exit(code),
        Err(err) => {
            eprintln!("Error: {err:#}");
            process::exit(1);
        }
    }
}

fn init_logging(args: &Args) {
    let default = if args.quiet {
        "off"
    } else if args.verbose {
        "counterwatch=debug,info"
    } else {
        "info"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn run(args: Args) -> Result<i32> {
    let Some(offset) = parse_offset(&args.utc_offset) else {
        eprintln!(
            "Invalid --utc-offset value '{}' (expected +HH:MM or -HH:MM)",
            args.utc_offset
        );
        return Ok(exit_code::USAGE);
    };

    let selection = Selection::parse(&args.hostnames, &args.services, &args.metrics);
    let mode = if args.per_entity {
        QueryMode::PerEntity
    } else {
        QueryMode::Bulk
    };

    // One blocking request at a time; a current-thread runtime is enough.
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;

    runtime.block_on(async {
        let mut session = BackendSession::builder()
            .endpoint(&args.backend)
            .credentials(&args.username, &args.password)
            .build();

        info!("authenticating to {}", args.backend);
        if let Err(err) = session.login().await {
            eprintln!("{err}");
            return Ok(exit_code::AUTH_DENIED);
        }
        info!("authenticated");

        let mut extraction = Extraction::new(session, selection, mode, offset);
        if let Err(err) = extraction.run().await {
            let (_, mut errors) = extraction.into_parts();
            errors.push(err.to_string());
            println!("{}", report::render_errors(&errors));
            return Ok(exit_code::NO_DATA);
        }

        let (counters, errors) = extraction.into_parts();
        if counters.is_empty() {
            println!("{}", report::render_errors(&errors));
            return Ok(exit_code::NO_DATA);
        }

        info!("got counters for {} hosts", counters.host_count());
        println!("{}", report::render_counters(&counters)?);

        if errors.is_empty() {
            Ok(exit_code::OK)
        } else {
            eprintln!("{}", report::render_errors(&errors));
            Ok(exit_code::NO_DATA)
        }
    })
}
