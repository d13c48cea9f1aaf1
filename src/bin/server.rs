use clap::Parser;
use ferrokv::config::{Cli, Config};
use ferrokv::executor::{Executor, DEFAULT_GC_INTERVAL};
use ferrokv::persistence::Persister;
use ferrokv::{db, persistence};
use std::path::PathBuf;
use std::process::exit;
use tokio::net::TcpListener;
use tokio::signal;
use tokio::sync::mpsc;
use tracing::info;

#[tokio::main]
pub async fn main() -> ferrokv::Result<()> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let config = match Config::resolve(&cli) {
        Ok(config) => config,
        Err(err) => {
            eprintln!("failed to load config: {err}");
            exit(1);
        }
    };

    let db = if config.appendonly {
        match persistence::load(&PathBuf::from(&config.appendfilename)) {
            Ok(db) => db,
            Err(err) => {
                eprintln!("failed to replay {}: {err}", config.appendfilename);
                exit(1);
            }
        }
    } else {
        db::Db::new()
    };

    let (executor_tx, executor_rx) = mpsc::channel(ferrokv::executor::CHANNEL_DEPTH);

    let persist_tx = if config.appendonly {
        let (persist_tx, persist_rx) = mpsc::channel(ferrokv::executor::CHANNEL_DEPTH);
        let persister = Persister::open(
            PathBuf::from(&config.appendfilename),
            config.appendfsync,
            config.auto_aof_rewrite_after_cmds,
            persist_rx,
            executor_tx.clone(),
        )
        .await?;
        tokio::spawn(persister.run());
        Some(persist_tx)
    } else {
        None
    };

    let executor = Executor::new(db, executor_rx, persist_tx, DEFAULT_GC_INTERVAL);
    tokio::spawn(executor.run());

    let listener = TcpListener::bind(config.address()).await?;
    info!(address = %config.address(), "listening");

    ferrokv::server::run(listener, executor_tx, signal::ctrl_c()).await;

    Ok(())
}
