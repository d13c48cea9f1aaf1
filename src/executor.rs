//! The single-writer actor: the only task that ever touches a [`Db`].
//!
//! Every connection sends parsed commands in over a bounded channel and awaits a reply on a
//! one-shot channel; the executor processes them strictly one at a time, which is what lets `Db`
//! itself stay free of any locking. It also owns the periodic expiry sweep and, on request from
//! the persister, produces a point-in-time snapshot of the live dataset for the rewrite pipeline.

use crate::cmd::Command;
use crate::db::Db;
use crate::utils::now;
use crate::Frame;
use bytes::Bytes;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tokio::time::MissedTickBehavior;
use tracing::debug;

/// Default channel depth for both the command queue and the persister's write queue.
pub const CHANNEL_DEPTH: usize = 1024;

/// Default interval between expired-key GC sweeps.
pub const DEFAULT_GC_INTERVAL: Duration = Duration::from_secs(60);

pub type Handle = mpsc::Sender<Message>;

/// One live (non-expired) key, as handed to the persister's rewrite job.
pub struct SnapshotEntry {
    pub rebuild: Vec<Bytes>,
    pub expire_at: Option<i64>,
}

pub enum Message {
    Dispatch {
        command: Command,
        respond_to: oneshot::Sender<Frame>,
    },
    Snapshot {
        respond_to: oneshot::Sender<Vec<SnapshotEntry>>,
    },
}

/// A successfully-dispatched mutating command's log records, forwarded to the persister.
pub type PersistRecords = Vec<Vec<Bytes>>;

pub struct Executor {
    db: Db,
    rx: mpsc::Receiver<Message>,
    persist_tx: Option<mpsc::Sender<PersistRecords>>,
    gc_interval: Duration,
}

impl Executor {
    pub fn new(
        db: Db,
        rx: mpsc::Receiver<Message>,
        persist_tx: Option<mpsc::Sender<PersistRecords>>,
        gc_interval: Duration,
    ) -> Executor {
        Executor {
            db,
            rx,
            persist_tx,
            gc_interval,
        }
    }

    pub async fn run(mut self) {
        let mut gc_tick = tokio::time::interval(self.gc_interval);
        gc_tick.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                msg = self.rx.recv() => {
                    match msg {
                        Some(msg) => self.handle(msg).await,
                        None => break,
                    }
                }
                _ = gc_tick.tick() => {
                    let reaped = self.db.sweep_expired(now());
                    if reaped > 0 {
                        debug!(reaped, "gc sweep reaped expired keys");
                    }
                }
            }
        }
    }

    async fn handle(&mut self, msg: Message) {
        match msg {
            Message::Dispatch { command, respond_to } => {
                let reply = self.dispatch(command).await;
                let _ = respond_to.send(reply);
            }
            Message::Snapshot { respond_to } => {
                let now = now();
                let mut entries = Vec::new();
                self.db.for_each_live(now, |key, value, expire_at| {
                    entries.push(SnapshotEntry {
                        rebuild: value.rebuild_command(key),
                        expire_at,
                    });
                });
                let _ = respond_to.send(entries);
            }
        }
    }

    async fn dispatch(&mut self, command: Command) -> Frame {
        debug!(name = command.get_name(), "dispatching command");
        let now = now();
        let result = command.apply(&mut self.db, now);

        if !result.persist.is_empty() {
            if let Some(tx) = &self.persist_tx {
                if tx.send(result.persist).await.is_err() {
                    debug!("persister channel closed, dropping log records");
                }
            }
        }

        result.reply
    }
}
