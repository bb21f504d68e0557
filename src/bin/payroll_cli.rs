//! payroll-cli: ad-hoc calls against the payroll platform.
//!
//! Usage:
//!   payroll-cli get <path>               Print the `data` of a single resource
//!   payroll-cli list <path>              Walk all pages, one JSON item per line
//!   payroll-cli raw <path> <out-file>    Download a binary document
//!
//! Configuration comes from `PAYROLL_*` environment variables, optionally
//! layered over a YAML file given with `--config <file>`.

use anyhow::{bail, Context};
use futures::TryStreamExt;
use payroll_client::codec::{decode_list, decode_single};
use payroll_client::{ApiClient, ApiClientBuilder, ClientConfig};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    let args: Vec<String> = std::env::args().collect();
    if args.len() < 2 {
        print_usage();
        std::process::exit(1);
    }

    let result = match args[1].as_str() {
        "get" => cmd_get(&args[2..]).await,
        "list" => cmd_list(&args[2..]).await,
        "raw" => cmd_raw(&args[2..]).await,
        "version" | "--version" | "-V" => {
            cmd_version();
            Ok(())
        }
        "help" | "--help" | "-h" => {
            print_usage();
            Ok(())
        }
        other => {
            eprintln!("Unknown command: {other}");
            eprintln!();
            print_usage();
            std::process::exit(1);
        }
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}

fn print_usage() {
    println!(
        r#"payroll-cli: payroll platform command line client

USAGE:
    payroll-cli <COMMAND> [OPTIONS]

COMMANDS:
    get <path>                  Fetch a single resource and print its data
    list <path>                 Fetch every page of a list endpoint
    raw <path> <out-file>       Download a document (PDF, CSV, ...)
    version                     Show version information
    help                        Show this help message

OPTIONS:
    --config <file>             YAML config; PAYROLL_* variables still override it

ENVIRONMENT:
    PAYROLL_BASE_URL            Platform base URL
    PAYROLL_API_TOKEN           Bearer token
    PAYROLL_DEBUG               Log every request attempt (1/true)
    RUST_LOG                    Log filter (default: warn)"#
    );
}

fn cmd_version() {
    println!("payroll-cli {}", env!("CARGO_PKG_VERSION"));
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

/// Split `--config <file>` out of the positional arguments.
fn parse_args(args: &[String]) -> anyhow::Result<(Option<PathBuf>, Vec<String>)> {
    let mut config = None;
    let mut positional = Vec::new();
    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        if arg == "--config" {
            let path = iter.next().context("--config needs a file path")?;
            config = Some(PathBuf::from(path));
        } else {
            positional.push(arg.clone());
        }
    }
    Ok((config, positional))
}

fn build_client(config: Option<PathBuf>) -> anyhow::Result<ApiClient> {
    init_logging();
    let cfg = match config {
        Some(path) => ClientConfig::from_yaml_file(&path)
            .with_context(|| format!("loading {}", path.display()))?,
        None => ClientConfig::from_env()?,
    };
    let client = ApiClientBuilder::from_config(&cfg)
        .build()
        .context("building client (is PAYROLL_BASE_URL / PAYROLL_API_TOKEN set?)")?;
    Ok(client)
}

async fn cmd_get(args: &[String]) -> anyhow::Result<()> {
    let (config, positional) = parse_args(args)?;
    let Some(path) = positional.first() else {
        bail!("usage: payroll-cli get <path>");
    };
    let client = build_client(config)?;
    let body = client.get(path).await?;
    let data: serde_json::Value = decode_single(&body)?;
    println!("{}", serde_json::to_string_pretty(&data)?);
    Ok(())
}

async fn cmd_list(args: &[String]) -> anyhow::Result<()> {
    let (config, positional) = parse_args(args)?;
    let Some(path) = positional.first() else {
        bail!("usage: payroll-cli list <path>");
    };
    let client = build_client(config)?;
    let paginator = client.paginate(path, decode_list::<serde_json::Value>);
    let mut pages = paginator.pages();
    let mut count = 0usize;
    let mut total = 0u64;
    while let Some(page) = pages.try_next().await? {
        total = page.total;
        for item in &page.items {
            println!("{}", serde_json::to_string(item)?);
            count += 1;
        }
    }
    eprintln!("{count} item(s), platform total {total}");
    Ok(())
}

async fn cmd_raw(args: &[String]) -> anyhow::Result<()> {
    let (config, positional) = parse_args(args)?;
    let (Some(path), Some(out)) = (positional.first(), positional.get(1)) else {
        bail!("usage: payroll-cli raw <path> <out-file>");
    };
    let client = build_client(config)?;
    let bytes = client.get_raw(path).await?;
    tokio::fs::write(out, &bytes)
        .await
        .with_context(|| format!("writing {out}"))?;
    eprintln!("wrote {} bytes to {out}", bytes.len());
    Ok(())
}
