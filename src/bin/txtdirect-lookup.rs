use std::path::PathBuf;

use axum::http::Request;
use clap::{Parser, Subcommand};

use txtdirect::config::{load_config, Config};
use txtdirect::dns::{lookup_zone, HickoryTxtResolver};
use txtdirect::record::Record;
use txtdirect::routing::{resolve_root, walk};

#[derive(Parser)]
#[command(name = "txtdirect-lookup")]
#[command(about = "Inspect txtdirect records", long_about = None)]
struct Cli {
    /// Configuration file; selects the resolver and enabled types.
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Resolve the record that would answer a request
    Resolve {
        /// Request host, e.g. example.com
        host: String,
        /// Request path; path records are walked when given
        #[arg(default_value = "/")]
        path: String,
    },
    /// Check a raw record string
    Check {
        /// e.g. "v=txtv0;to=https://example.com;code=301"
        record: String,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => load_config(path)?,
        None => Config::default(),
    };

    match cli.command {
        Commands::Resolve { host, path } => {
            let resolver = HickoryTxtResolver::from_config(config.redirect.resolver.as_deref())?;
            let request = Request::builder()
                .uri(path.as_str())
                .header("host", host.as_str())
                .body(())?;

            println!("zone: {}", lookup_zone(&host));
            let root = resolve_root(&host, &request, &config, &resolver).await?;
            print_record("root", &root);

            if root.record_type == txtdirect::record::RecordType::Path && path != "/" {
                let found = walk(&host, &path, &request, &config, &resolver).await?;
                print_record(&format!("path {}", found.path), &found.record);
            }
        }
        Commands::Check { record } => {
            let request = Request::builder().uri("/").body(())?;
            let parsed = Record::parse(&record, &request, &config)?;
            print_record("record", &parsed);
        }
    }

    Ok(())
}

fn print_record(label: &str, record: &Record) {
    println!("{label}:");
    println!("  type: {}", record.record_type);
    println!("  code: {}", record.code.as_u16());
    for (key, value) in [
        ("to", &record.to),
        ("root", &record.root),
        ("vcs", &record.vcs),
        ("website", &record.website),
        ("from", &record.from),
        ("re", &record.re),
    ] {
        if !value.is_empty() {
            println!("  {key}: {value}");
        }
    }
}
