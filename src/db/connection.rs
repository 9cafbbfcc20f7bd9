use std::{
    path::{Path, PathBuf},
    sync::{mpsc, Arc},
    thread::{self, JoinHandle},
    time::Duration,
};

use anyhow::{anyhow, Context, Result};
use log::{error, info};
use rusqlite::Connection;
use tokio::sync::oneshot;

use super::migrations::run_migrations;

const WORKER_THREAD_NAME: &str = "emotion-report-db";
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

type DbTask = Box<dyn FnOnce(&mut Connection) + Send + 'static>;

/// Owns the worker thread. The worker drains its queue and exits once the
/// last sender is gone, so dropping the sender and joining is a clean stop.
struct Worker {
    sender: Option<mpsc::Sender<DbTask>>,
    handle: Option<JoinHandle<()>>,
}

impl Drop for Worker {
    fn drop(&mut self) {
        drop(self.sender.take());
        if let Some(handle) = self.handle.take() {
            if let Err(join_err) = handle.join() {
                error!("Sample store thread panicked: {join_err:?}");
            }
        }
    }
}

/// Handle to the sample store. Every query runs on one dedicated thread that
/// owns the SQLite connection; clones share that thread.
#[derive(Clone)]
pub struct Database {
    worker: Arc<Worker>,
    db_path: Arc<PathBuf>,
}

impl Database {
    /// Open (or create) the store at `db_path` and bring its schema up to date.
    pub fn new(db_path: PathBuf) -> Result<Self> {
        if let Some(parent) = db_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).with_context(|| {
                format!("failed to create database directory {}", parent.display())
            })?;
        }

        let (task_tx, task_rx) = mpsc::channel::<DbTask>();
        let (ready_tx, ready_rx) = mpsc::channel::<Result<()>>();
        let thread_path = db_path.clone();

        let handle = thread::Builder::new()
            .name(WORKER_THREAD_NAME.into())
            .spawn(move || {
                let mut conn = match open_connection(&thread_path) {
                    Ok(conn) => conn,
                    Err(err) => {
                        let _ = ready_tx.send(Err(err));
                        return;
                    }
                };
                if ready_tx.send(Ok(())).is_err() {
                    return;
                }

                for task in task_rx {
                    task(&mut conn);
                }
                info!("Sample store at {} closed", thread_path.display());
            })
            .context("failed to spawn database worker thread")?;

        let worker = Worker {
            sender: Some(task_tx),
            handle: Some(handle),
        };

        ready_rx
            .recv()
            .context("database worker exited before signaling readiness")??;

        info!("Sample store opened at {}", db_path.display());

        Ok(Self {
            worker: Arc::new(worker),
            db_path: Arc::new(db_path),
        })
    }

    pub fn path(&self) -> &Path {
        self.db_path.as_path()
    }

    /// Run `task` on the store thread and wait for its result.
    pub async fn execute<F, T>(&self, task: F) -> Result<T>
    where
        F: FnOnce(&mut Connection) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let sender = self
            .worker
            .sender
            .as_ref()
            .ok_or_else(|| anyhow!("sample store is closed"))?;
        let (reply_tx, reply_rx) = oneshot::channel();

        sender
            .send(Box::new(move |conn| {
                // Receiver gone means the caller stopped waiting; nothing to report.
                let _ = reply_tx.send(task(conn));
            }))
            .map_err(|_| anyhow!("sample store thread is not running"))?;

        reply_rx
            .await
            .map_err(|_| anyhow!("sample store thread dropped the query"))?
    }
}

fn open_connection(path: &Path) -> Result<Connection> {
    let mut conn = Connection::open(path)
        .with_context(|| format!("failed to open SQLite database {}", path.display()))?;

    conn.busy_timeout(BUSY_TIMEOUT)
        .context("failed to set busy timeout")?;
    if let Err(err) = conn.pragma_update(None, "journal_mode", "WAL") {
        error!("Failed to enable WAL mode: {err}");
    }

    run_migrations(&mut conn).context("failed to run database migrations")?;
    Ok(conn)
}
