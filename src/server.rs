//! Accepts connections and drives each one against the shared [`crate::executor::Executor`].
//!
//! Mirrors the accept-loop-with-backoff and broadcast-shutdown shape of a typical Tokio server:
//! the listener hands each socket to its own task, and a `broadcast` channel lets every live
//! connection learn about a shutdown without the listener tracking them individually.

use crate::connection::{Connection, ReadError};
use crate::executor::{self, Message};
use crate::shutdown::Shutdown;
use crate::{Command, Frame};
use std::future::Future;
use std::sync::Arc;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{broadcast, mpsc, oneshot, Semaphore};
use tokio::time::{self, Duration};
use tracing::{debug, error, info};

/// Max simultaneous connections. Past this, `accept` blocks until one closes.
const MAX_CONNECTIONS: usize = 10_000;

struct Listener {
    listener: TcpListener,
    executor: executor::Handle,
    limit_connections: Arc<Semaphore>,
    notify_shutdown: broadcast::Sender<()>,
    shutdown_complete_rx: mpsc::Receiver<()>,
    shutdown_complete_tx: mpsc::Sender<()>,
}

struct Handler {
    executor: executor::Handle,
    connection: Connection,
    shutdown: Shutdown,
    _shutdown_complete: mpsc::Sender<()>,
}

/// Runs the server: accepts connections against `listener`, dispatching commands to `executor`,
/// until `shutdown` resolves.
pub async fn run(listener: TcpListener, executor: executor::Handle, shutdown: impl Future) {
    let (notify_shutdown, _) = broadcast::channel(1);
    let (shutdown_complete_tx, shutdown_complete_rx) = mpsc::channel(1);

    let mut server = Listener {
        listener,
        executor,
        limit_connections: Arc::new(Semaphore::new(MAX_CONNECTIONS)),
        notify_shutdown,
        shutdown_complete_tx,
        shutdown_complete_rx,
    };

    tokio::select! {
        res = server.run() => {
            if let Err(err) = res {
                error!(%err, "failed to accept");
            }
        }
        _ = shutdown => {
            info!("shutting down");
        }
    }

    let Listener {
        mut shutdown_complete_rx,
        shutdown_complete_tx,
        notify_shutdown,
        ..
    } = server;

    drop(notify_shutdown);
    drop(shutdown_complete_tx);

    let _ = shutdown_complete_rx.recv().await;
}

impl Listener {
    async fn run(&mut self) -> crate::Result<()> {
        info!("accepting inbound connections");

        loop {
            let permit = self.limit_connections.clone().acquire_owned().await.unwrap();

            let socket = self.accept().await?;
            let mut handler = Handler {
                executor: self.executor.clone(),
                connection: Connection::new(socket),
                shutdown: Shutdown::new(self.notify_shutdown.subscribe()),
                _shutdown_complete: self.shutdown_complete_tx.clone(),
            };

            tokio::spawn(async move {
                if let Err(err) = handler.run().await {
                    error!(%err, "connection error");
                }
                drop(permit);
            });
        }
    }

    /// Retries accept failures with exponential backoff, giving up after ~64 seconds total.
    async fn accept(&mut self) -> crate::Result<TcpStream> {
        let mut backoff = 1;

        loop {
            match self.listener.accept().await {
                Ok((socket, _)) => return Ok(socket),
                Err(err) => {
                    if backoff > 64 {
                        return Err(err.into());
                    }
                }
            }

            time::sleep(Duration::from_secs(backoff)).await;
            backoff *= 2;
        }
    }
}

impl Handler {
    /// Processes one connection until the peer disconnects or shutdown is signaled. A malformed
    /// frame gets an error reply and the loop continues; any other read failure ends it.
    async fn run(&mut self) -> crate::Result<()> {
        while !self.shutdown.is_shutdown() {
            let maybe_frame = tokio::select! {
                res = self.connection.read_frame() => res,
                _ = self.shutdown.recv() => return Ok(()),
            };

            let frame = match maybe_frame {
                Ok(Some(frame)) => frame,
                Ok(None) => return Ok(()),
                Err(ReadError::Malformed(msg)) => {
                    self.connection
                        .write_frame(&Frame::Error(format!("ERR Protocol error: {msg}")))
                        .await?;
                    continue;
                }
                Err(ReadError::Io(err)) => return Err(err),
            };

            let reply = match Command::from_frame(frame) {
                Ok(command) => self.dispatch(command).await?,
                Err(err) => Frame::Error(format!("ERR {err}")),
            };

            self.connection.write_frame(&reply).await?;
        }

        Ok(())
    }

    async fn dispatch(&mut self, command: Command) -> crate::Result<Frame> {
        debug!(name = command.get_name(), "dispatching command");
        let (respond_to, recv) = oneshot::channel();
        self.executor
            .send(Message::Dispatch { command, respond_to })
            .await
            .map_err(|_| crate::Error::Other("executor channel closed".into()))?;
        recv.await
            .map_err(|_| crate::Error::Other("executor dropped reply channel".into()))
    }
}
