//! Append-only command log and its background rewrite.
//!
//! Every mutating command the executor dispatches successfully is forwarded here as one or more
//! canonical log records (see [`crate::db::CmdResult`]); the persister serializes them as RESP
//! arrays and appends them to the log file. Once the log has grown by [`Persister::rewrite_after`]
//! records since the last rewrite, it's compacted down to the minimal set of commands that would
//! rebuild the current dataset, via a three-phase protocol that never blocks the executor for
//! longer than a snapshot request takes to answer:
//!
//! 1. fsync the current log, record its length, open a fresh temp file.
//! 2. ask the executor for a point-in-time snapshot of every live key and serialize it to the
//!    temp file — this runs interleaved with live commands, not under any lock.
//! 3. copy whatever was appended to the log between steps 1 and 2 onto the temp file, fsync it,
//!    and atomically rename it over the log.
use crate::executor::{self, PersistRecords};
use crate::frame::{self, Frame};
use crate::utils::format_local_time;
use bytes::Bytes;
use std::io::Cursor;
use std::path::{Path, PathBuf};
use tokio::fs::{File, OpenOptions};
use tokio::io::{AsyncReadExt, AsyncSeekExt, AsyncWriteExt};
use tokio::sync::{mpsc, oneshot};
use tokio::time::{interval, Duration, MissedTickBehavior};
use tracing::{error, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FsyncPolicy {
    Always,
    EverySec,
    No,
}

pub type Handle = mpsc::Sender<PersistRecords>;

pub struct Persister {
    rx: mpsc::Receiver<PersistRecords>,
    executor: executor::Handle,
    file: File,
    path: PathBuf,
    fsync: FsyncPolicy,
    rewrite_after: u64,
    since_rewrite: u64,
}

impl Persister {
    pub async fn open(
        path: PathBuf,
        fsync: FsyncPolicy,
        rewrite_after: u64,
        rx: mpsc::Receiver<PersistRecords>,
        executor: executor::Handle,
    ) -> std::io::Result<Persister> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .await?;
        Ok(Persister {
            rx,
            executor,
            file,
            path,
            fsync,
            rewrite_after,
            since_rewrite: 0,
        })
    }

    pub async fn run(mut self) {
        let mut fsync_tick = interval(Duration::from_secs(1));
        fsync_tick.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut dirty = false;

        loop {
            tokio::select! {
                records = self.rx.recv() => {
                    match records {
                        Some(records) => {
                            self.append(&records).await;
                            match self.fsync {
                                FsyncPolicy::Always => {
                                    if let Err(err) = self.file.sync_all().await {
                                        error!(%err, "fsync failed");
                                    }
                                }
                                FsyncPolicy::EverySec => dirty = true,
                                FsyncPolicy::No => {}
                            }
                            self.since_rewrite += 1;
                            if self.since_rewrite >= self.rewrite_after {
                                self.since_rewrite = 0;
                                self.rewrite().await;
                            }
                        }
                        None => break,
                    }
                }
                _ = fsync_tick.tick(), if self.fsync == FsyncPolicy::EverySec => {
                    if dirty {
                        if let Err(err) = self.file.sync_all().await {
                            error!(%err, "fsync failed");
                        }
                        dirty = false;
                    }
                }
            }
        }
    }

    async fn append(&mut self, records: &PersistRecords) {
        for record in records {
            let buf = encode_record(record);
            if let Err(err) = self.file.write_all(&buf).await {
                error!(%err, "failed to write persistence log record");
            }
        }
    }

    /// Runs the three-phase rewrite described in the module docs.
    async fn rewrite(&mut self) {
        if let Err(err) = self.file.sync_all().await {
            error!(%err, "fsync before rewrite failed");
            return;
        }
        let saved_offset = match self.file.metadata().await {
            Ok(meta) => meta.len(),
            Err(err) => {
                error!(%err, "failed to stat log before rewrite");
                return;
            }
        };

        let tmp_path = self.path.with_extension("rewrite.tmp");
        let mut tmp = match File::create(&tmp_path).await {
            Ok(f) => f,
            Err(err) => {
                error!(%err, "failed to open rewrite temp file");
                return;
            }
        };

        let (respond_to, snapshot) = oneshot::channel();
        if self
            .executor
            .send(executor::Message::Snapshot { respond_to })
            .await
            .is_err()
        {
            error!("executor channel closed, aborting rewrite");
            return;
        }
        let entries = match snapshot.await {
            Ok(entries) => entries,
            Err(_) => {
                error!("executor dropped snapshot request, aborting rewrite");
                return;
            }
        };

        for entry in &entries {
            if tmp.write_all(&encode_record(&entry.rebuild)).await.is_err() {
                error!("failed writing rewrite snapshot");
                return;
            }
            if let Some(at) = entry.expire_at {
                let key = entry.rebuild[1].clone();
                let record = vec![
                    Bytes::from_static(b"EXPIREAT"),
                    key,
                    Bytes::from(format_local_time(at)),
                ];
                if tmp.write_all(&encode_record(&record)).await.is_err() {
                    error!("failed writing rewrite snapshot expiry record");
                    return;
                }
            }
        }

        match File::open(&self.path).await {
            Ok(mut old) => {
                if old.seek(std::io::SeekFrom::Start(saved_offset)).await.is_ok() {
                    let mut tail = Vec::new();
                    if old.read_to_end(&mut tail).await.is_ok() {
                        let _ = tmp.write_all(&tail).await;
                    }
                }
            }
            Err(err) => error!(%err, "failed to reopen log to copy its tail"),
        }

        if tmp.sync_all().await.is_err() {
            error!("failed to fsync rewrite temp file");
            return;
        }
        drop(tmp);

        if let Err(err) = tokio::fs::rename(&tmp_path, &self.path).await {
            error!(%err, "failed to install rewritten log");
            return;
        }

        match OpenOptions::new().append(true).open(&self.path).await {
            Ok(file) => {
                self.file = file;
                info!("persistence log rewritten");
            }
            Err(err) => error!(%err, "failed to reopen log after rewrite"),
        }
    }
}

fn encode_record(record: &[Bytes]) -> Vec<u8> {
    let mut frame = Frame::array();
    for part in record {
        frame.push_bulk(part.clone());
    }
    let mut buf = Vec::new();
    frame.encode(&mut buf);
    buf
}

/// Replays every command frame in `data` into `db`, ignoring replies. Used at startup to rebuild
/// state from the log file; persistence is not re-triggered since `db` has no persister attached
/// yet when this runs.
pub fn replay(db: &mut crate::db::Db, data: &[u8]) {
    let mut cursor = Cursor::new(data);
    loop {
        let start = cursor.position();
        match Frame::check(&mut cursor) {
            Ok(()) => {
                cursor.set_position(start);
                let frame = Frame::parse(&mut cursor).expect("check already validated this frame");
                if let Ok(command) = crate::cmd::Command::from_frame(frame) {
                    let _ = command.apply(db, crate::utils::now());
                }
            }
            Err(frame::Error::Incomplete) | Err(frame::Error::Malformed(_)) => break,
        }
    }
}

/// Loads the dataset at `path`, or an empty one if it doesn't exist yet.
pub fn load(path: &Path) -> std::io::Result<crate::db::Db> {
    let mut db = crate::db::Db::new();
    match std::fs::read(path) {
        Ok(data) => {
            replay(&mut db, &data);
            Ok(db)
        }
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(db),
        Err(err) => Err(err),
    }
}
