use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use clap::{Parser, Subcommand};
use futures_util::future::join_all;
use serde_json::json;

use endpoint_sentinel::config::{resolve_config, validate_config};
use endpoint_sentinel::health::{HealthStatus, Prober, TcpProber};
use endpoint_sentinel::reconcile::EndpointPatch;

#[derive(Parser)]
#[command(name = "sentinel-cli")]
#[command(about = "Operator tools for endpoint-sentinel", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Probe backends once and print their health
    Probe {
        #[arg(short, long, default_value_t = 9092)]
        port: u16,

        /// Connect timeout in seconds
        #[arg(short, long, default_value_t = 3.0)]
        timeout: f64,

        #[arg(required = true)]
        ips: Vec<IpAddr>,
    },
    /// Print the resolved configuration
    Config {
        #[arg(short, long)]
        config: Option<PathBuf>,

        #[arg(long, default_value = "/.env")]
        env_file: PathBuf,
    },
    /// Print the JSON patch that would publish these healthy IPs
    Patch { ips: Vec<IpAddr> },
}

#[tokio::main]
async fn main() -> Result<ExitCode, Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Probe { port, timeout, ips } => {
            let prober = TcpProber::new(Duration::try_from_secs_f64(timeout)?);
            let addrs: Vec<SocketAddr> = ips.iter().map(|ip| SocketAddr::new(*ip, port)).collect();
            let results = join_all(addrs.iter().map(|addr| prober.probe(*addr))).await;

            let report: Vec<_> = addrs
                .iter()
                .zip(results)
                .map(|(addr, healthy)| {
                    json!({
                        "address": addr.to_string(),
                        "status": HealthStatus::from_probe(healthy),
                    })
                })
                .collect();
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        Commands::Config { config, env_file } => {
            let config = resolve_config(config.as_deref(), &env_file)?;
            println!("{}", serde_json::to_string_pretty(&config)?);

            if let Err(errors) = validate_config(&config) {
                for error in errors {
                    eprintln!("Error: {}", error);
                }
                return Ok(ExitCode::FAILURE);
            }
        }
        Commands::Patch { ips } => {
            let patch = EndpointPatch::from_healthy(ips);
            let doc: serde_json::Value = serde_json::from_str(&patch.to_json_patch()?)?;
            println!("{}", serde_json::to_string_pretty(&doc)?);
        }
    }

    Ok(ExitCode::SUCCESS)
}
