//! CLI for cluster operations

use clap::{Parser, Subcommand};
use futures_util::TryStreamExt;
use std::path::PathBuf;
use swfs_client::common::{format_bytes, parse_duration, GrowRequest};
use swfs_client::{Access, Client, ClientConfig, Params};
use tokio::io::AsyncWriteExt;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "swfs")]
#[command(about = "SeaweedFS cluster client")]
#[command(version)]
struct Cli {
    /// Master URL (overrides config file and SWFS_MASTER_URL)
    #[arg(long)]
    master: Option<String>,

    /// TOML config file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Location cache TTL, e.g. 30s, 5m
    #[arg(long)]
    cache_ttl: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Look up the servers holding a volume
    Lookup {
        volume_id: String,

        /// Known collection, speeds up the lookup
        #[arg(long)]
        collection: Option<String>,
    },

    /// Print the URL a file is read from (or written to with --write)
    Locate {
        fid: String,

        #[arg(long)]
        write: bool,
    },

    /// Assign a file id and upload a file
    Upload {
        file: PathBuf,

        #[arg(long)]
        collection: Option<String>,

        /// Time to live, e.g. 3m, 4h, 5d
        #[arg(long)]
        ttl: Option<String>,
    },

    /// Submit a file directly to the master
    Submit {
        file: PathBuf,

        #[arg(long)]
        collection: Option<String>,

        #[arg(long)]
        ttl: Option<String>,
    },

    /// Download a file
    Download {
        fid: String,

        /// Output file
        #[arg(long)]
        output: PathBuf,
    },

    /// Delete a file
    Delete { fid: String },

    /// Pre-allocate empty volumes
    Grow {
        #[arg(long, default_value = "1")]
        count: u32,

        #[arg(long)]
        collection: Option<String>,

        /// Replication class, e.g. 001
        #[arg(long)]
        replication: Option<String>,

        #[arg(long)]
        data_center: Option<String>,

        #[arg(long)]
        ttl: Option<String>,
    },

    /// Reclaim space of deleted files
    Vacuum {
        #[arg(long, default_value = "0.3")]
        threshold: f64,
    },

    /// Delete a whole collection
    DeleteCollection { collection: String },

    /// Master topology
    Status,

    /// Master leadership and peers
    ClusterStatus,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = ClientConfig::load(cli.config.as_deref())?;
    if let Some(master) = cli.master {
        config.master_url = master;
    }
    if let Some(ttl) = cli.cache_ttl.as_deref() {
        config.cache_ttl_secs = parse_duration(ttl)?.as_secs().max(1);
    }
    if let Some(level) = cli.log_level {
        config.log_level = level;
    }

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| config.log_level.clone().into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let mut client = Client::new(&config)?;

    match cli.command {
        Commands::Lookup {
            volume_id,
            collection,
        } => {
            let params = Params::new().collection(collection.as_deref());
            let result = client.lookup(&volume_id, &params).await?;
            println!("{}", serde_json::to_string_pretty(&result)?);
        }

        Commands::Locate { fid, write } => {
            let access = if write { Access::Write } else { Access::Read };
            let url = client
                .lookup_full_url_by_file_id(&fid, &Params::new(), access)
                .await?;
            println!("{}", url);
        }

        Commands::Upload {
            file,
            collection,
            ttl,
        } => {
            let (assign, descriptor) = client
                .upload_file(&file, collection.as_deref(), ttl.as_deref())
                .await?;
            println!("Uploaded {}:", descriptor.file_name);
            println!("  File id: {}", assign.file_id);
            println!("  Server: {}", assign.url);
            println!("  Size: {}", format_bytes(descriptor.file_size));
            println!("  ETag: {}", descriptor.etag.unwrap_or_default());
        }

        Commands::Submit {
            file,
            collection,
            ttl,
        } => {
            let result = client
                .submit_file(&file, collection.as_deref(), ttl.as_deref())
                .await?;
            println!("{}", serde_json::to_string_pretty(&result)?);
        }

        Commands::Download { fid, output } => {
            let downloaded = client
                .download(&fid, &Params::new(), |mut body| {
                    let output = output.clone();
                    async move {
                        // Recreated on every attempt, so a retry never appends.
                        let mut file = tokio::fs::File::create(&output).await?;
                        let mut written = 0u64;
                        while let Some(chunk) = body.try_next().await? {
                            file.write_all(&chunk).await?;
                            written += chunk.len() as u64;
                        }
                        file.flush().await?;
                        Ok::<_, swfs_client::Error>(written)
                    }
                })
                .await?;
            println!(
                "Downloaded {} ({}) to {}",
                downloaded.file_name.as_deref().unwrap_or(&fid),
                format_bytes(downloaded.value),
                output.display()
            );
        }

        Commands::Delete { fid } => {
            client.delete_file(&fid, &Params::new()).await?;
            println!("Deleted {}", fid);
        }

        Commands::Grow {
            count,
            collection,
            replication,
            data_center,
            ttl,
        } => {
            client
                .grow(&GrowRequest {
                    count,
                    collection,
                    replication,
                    data_center,
                    ttl,
                })
                .await?;
            println!("Requested {} new volume(s)", count);
        }

        Commands::Vacuum { threshold } => {
            client.garbage_collect(threshold).await?;
            println!("Vacuum triggered (garbage threshold {})", threshold);
        }

        Commands::DeleteCollection { collection } => {
            client
                .delete_collection(&Params::new().collection(Some(&collection)))
                .await?;
            println!("Deleted collection {}", collection);
        }

        Commands::Status => {
            let status = client.status().await?;
            println!("{}", serde_json::to_string_pretty(&status)?);
        }

        Commands::ClusterStatus => {
            let status = client.cluster_status().await?;
            println!("Cluster status:");
            println!("  Leader: {}", status.leader);
            println!("  Is leader: {}", status.is_leader);
            println!("  Peers: {}", status.peers.join(", "));
        }
    }

    client.close();
    Ok(())
}
