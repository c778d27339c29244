//! xrplog-mon - Ledger WebSocket monitor
//!
//! Connects to a public XRP ledger WebSocket server, classifies every push
//! message it receives, persists the classified records to a local SQLite
//! log, and prints each outcome. Offline maintenance modes list and delete
//! stored records without connecting.

use anyhow::{Context, Result};
use clap::Parser;
use tokio::sync::broadcast;
use tracing::{info, warn};

use xrplog_common::config::{database_path, resolve_root_folder, resolve_server_url};
use xrplog_common::db::{init_database, RecordStore};
use xrplog_common::events::{EventBus, LedgerEvent};
use xrplog_mon::coordinator::Coordinator;
use xrplog_mon::transport;

/// Command-line arguments for xrplog-mon
#[derive(Parser, Debug)]
#[command(name = "xrplog-mon")]
#[command(about = "XRP ledger WebSocket monitor")]
#[command(version)]
struct Args {
    /// WebSocket server URL (falls back to env, config file, then the
    /// public ledger server)
    #[arg(short, long)]
    url: Option<String>,

    /// Root folder containing the log database
    #[arg(short, long)]
    root_folder: Option<String>,

    /// Command strings to send once the connection opens (repeatable)
    #[arg(short, long = "send")]
    send: Vec<String>,

    /// Print stored records (newest first) and exit
    #[arg(long)]
    list: bool,

    /// Delete stored records by id and exit
    #[arg(long, value_delimiter = ',')]
    delete: Vec<i64>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let args = Args::parse();

    info!("Starting XRPLog monitor v{}", env!("CARGO_PKG_VERSION"));

    let root_folder = resolve_root_folder(args.root_folder.as_deref());
    let db_path = database_path(&root_folder);
    info!("Database path: {}", db_path.display());

    let pool = init_database(&db_path)
        .await
        .context("database initialization failed")?;
    let store = RecordStore::new(pool);

    // Maintenance modes run against the store without connecting
    if args.list {
        for stored in store.list_ordered_by_created_at_desc().await? {
            println!("{}", serde_json::to_string(&stored)?);
        }
        return Ok(());
    }
    if !args.delete.is_empty() {
        let removed = store.delete_by_ids(&args.delete).await?;
        info!("Deleted {removed} record(s)");
        return Ok(());
    }

    let url = resolve_server_url(args.url.as_deref())?;
    info!("Connecting to {url}");

    let bus = EventBus::new(1024);
    let mut events = bus.subscribe();

    let (handle, transport_rx) = transport::connect(&url)
        .await
        .context("connection failed")?;

    for command in &args.send {
        handle.send(command.clone()).await?;
    }

    let coordinator = Coordinator::new(bus.clone(), store);
    let coordinator_task = tokio::spawn(coordinator.run(transport_rx));

    // Log every pipeline outcome until the connection goes away or ctrl-c
    loop {
        tokio::select! {
            event = events.recv() => match event {
                Ok(LedgerEvent::ConnectionClosed { reason, .. }) => {
                    info!("Connection closed: {reason}");
                    break;
                }
                Ok(LedgerEvent::ConnectionError { message, .. }) => {
                    warn!("Connection error: {message}");
                    break;
                }
                Ok(event) => info!("{}", serde_json::to_string(&event)?),
                Err(broadcast::error::RecvError::Lagged(missed)) => {
                    warn!("Event log fell behind, missed {missed} event(s)");
                }
                Err(broadcast::error::RecvError::Closed) => break,
            },
            _ = tokio::signal::ctrl_c() => {
                info!("Shutting down");
                let _ = handle.close().await;
                break;
            }
        }
    }

    coordinator_task.abort();

    Ok(())
}
