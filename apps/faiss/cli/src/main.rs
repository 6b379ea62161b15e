//! Faiss CLI
//!
//! Builds a seeded demo index file and exercises a running FaissService.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use core_config::Environment;
use core_config::tracing::{init_tracing, install_color_eyre};
use domain_search::MetricType;
use eyre::Result;

mod client;
mod create_index;

use client::QueryClient;
use create_index::IndexSpec;

const DEFAULT_ADDR: &str = "http://[::1]:50051";

#[derive(Parser)]
#[command(name = "faiss-cli")]
#[command(about = "Build demo vector indexes and query a running FaissService")]
struct Cli {
    /// Server address for the client subcommands
    #[arg(long, global = true, default_value = DEFAULT_ADDR)]
    addr: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build a seeded IVF-Flat index and write it to disk
    CreateIndex {
        #[arg(long, default_value_t = 64)]
        dim: usize,

        /// Number of vectors to generate
        #[arg(long, default_value_t = 100_000)]
        size: usize,

        /// Number of inverted lists
        #[arg(long, default_value_t = 100)]
        nlist: usize,

        #[arg(long, default_value_t = 1234)]
        seed: u64,

        /// Distance metric (l2, ip)
        #[arg(long, default_value = "l2")]
        metric: MetricType,

        /// k-means iterations
        #[arg(long, default_value_t = 10)]
        iterations: usize,

        #[arg(short, long, default_value = "index.json")]
        output: PathBuf,
    },

    /// Check that the server is up
    Heartbeat,

    /// Search neighbors of the all-ones query vector
    Search {
        k: u64,

        /// Query vector length; must match the served index
        #[arg(long, default_value_t = 64)]
        dim: usize,
    },

    /// Search neighbors of a stored vector
    SearchById { id: i64, k: u64 },
}

#[tokio::main]
async fn main() -> Result<()> {
    install_color_eyre();

    let environment = Environment::from_env();
    init_tracing(&environment);

    let cli = Cli::parse();

    match cli.command {
        Commands::CreateIndex {
            dim,
            size,
            nlist,
            seed,
            metric,
            iterations,
            output,
        } => {
            let spec = IndexSpec {
                dimension: dim,
                size,
                nlist,
                seed,
                metric,
                iterations,
            };
            tokio::task::spawn_blocking(move || create_index::run(&spec, &output)).await??;
        }

        Commands::Heartbeat => {
            let mut client = QueryClient::connect(&cli.addr).await?;
            println!("{}", client.heartbeat().await?);
        }

        Commands::Search { k, dim } => {
            let mut client = QueryClient::connect(&cli.addr).await?;
            for line in client.search(vec![1.0; dim], k).await? {
                println!("{}", line);
            }
        }

        Commands::SearchById { id, k } => {
            let mut client = QueryClient::connect(&cli.addr).await?;
            for line in client.search_by_id(id, k).await? {
                println!("{}", line);
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_index_defaults() {
        let cli = Cli::try_parse_from(["faiss-cli", "create-index"]).unwrap();
        match cli.command {
            Commands::CreateIndex {
                dim,
                size,
                nlist,
                seed,
                metric,
                output,
                ..
            } => {
                assert_eq!((dim, size, nlist, seed), (64, 100_000, 100, 1234));
                assert_eq!(metric, MetricType::L2);
                assert_eq!(output, PathBuf::from("index.json"));
            }
            _ => panic!("expected create-index"),
        }
    }

    #[test]
    fn test_search_by_id_positional_args() {
        let cli = Cli::try_parse_from(["faiss-cli", "search-by-id", "42", "5"]).unwrap();
        assert_eq!(cli.addr, DEFAULT_ADDR);
        assert!(matches!(cli.command, Commands::SearchById { id: 42, k: 5 }));
    }

    #[test]
    fn test_global_addr_after_subcommand() {
        let cli =
            Cli::try_parse_from(["faiss-cli", "search", "10", "--addr", "http://127.0.0.1:7000"])
                .unwrap();
        assert_eq!(cli.addr, "http://127.0.0.1:7000");
        assert!(matches!(cli.command, Commands::Search { k: 10, dim: 64 }));
    }

    #[test]
    fn test_unknown_metric_rejected() {
        assert!(Cli::try_parse_from(["faiss-cli", "create-index", "--metric", "hamming"]).is_err());
    }
}
