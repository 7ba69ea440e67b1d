//! Background expiry sweep
//!
//! One tokio task per store. The first sweep runs immediately, then every
//! `sweep_interval`. [`SweeperHandle::shutdown`] signals the task and waits
//! for it to finish.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::observability::{log_event_at, log_event_with_fields, Event, Severity};

use super::store::PaginationStore;

pub struct Sweeper;

impl Sweeper {
    /// Must be called from within a tokio runtime.
    pub fn spawn(store: Arc<PaginationStore>) -> SweeperHandle {
        let (shutdown_tx, mut shutdown_rx) = watch::channel(false);
        // interval() panics on zero
        let period = store.config().sweep_interval().max(Duration::from_secs(1));

        let task = tokio::spawn(async move {
            log_event_with_fields(
                Event::SweeperStart,
                &[("interval_secs", &period.as_secs().to_string())],
            );
            let mut ticker = tokio::time::interval(period);

            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        if let Err(e) = store.sweep() {
                            log_event_at(
                                Severity::Error,
                                Event::TokenSweep,
                                &[("error", &e.to_string())],
                            );
                        }
                    }
                    changed = shutdown_rx.changed() => {
                        if changed.is_err() || *shutdown_rx.borrow() {
                            break;
                        }
                    }
                }
            }

            log_event_with_fields(Event::SweeperStop, &[]);
        });

        SweeperHandle { shutdown_tx, task }
    }
}

pub struct SweeperHandle {
    shutdown_tx: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl SweeperHandle {
    pub async fn shutdown(self) {
        let _ = self.shutdown_tx.send(true);
        let _ = self.task.await;
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}
