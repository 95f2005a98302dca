use std::{sync::Arc, time::Duration};

use anyhow::{anyhow, Result};
use tokio::{
    sync::Mutex,
    task::JoinHandle,
    time::{self, Instant, MissedTickBehavior},
};
use tokio_util::sync::CancellationToken;

use crate::{blocking::BlockingSignal, clock::Clock, db::TaskRecord, store::TaskStore};

use super::{recorded_minutes, FocusState};

// Set to true to enable verbose logging in this module
const ENABLE_LOGS: bool = true;

use crate::{log_debug, log_error, log_info};

struct Ticker {
    handle: JoinHandle<()>,
    cancel: CancellationToken,
}

/// Result of stopping a focus session.
#[derive(Debug)]
pub struct StopOutcome {
    pub elapsed_secs: u64,
    /// The record handed to the task store, if the session was long enough.
    pub task: Option<TaskRecord>,
    /// Background write of `task`. Resolves to the stored record, or `None`
    /// if the store rejected it. Dropping the handle does not cancel the write.
    pub persisted: Option<JoinHandle<Option<TaskRecord>>>,
}

#[derive(Clone)]
pub struct FocusController {
    state: Arc<Mutex<FocusState>>,
    ticker: Arc<Mutex<Option<Ticker>>>,
    tick_interval: Duration,
    blocking: BlockingSignal,
    tasks: Arc<dyn TaskStore>,
    clock: Arc<dyn Clock>,
    owner_id: String,
}

impl FocusController {
    pub fn new(
        owner_id: impl Into<String>,
        tasks: Arc<dyn TaskStore>,
        blocking: BlockingSignal,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            state: Arc::new(Mutex::new(FocusState::new())),
            ticker: Arc::new(Mutex::new(None)),
            tick_interval: Duration::from_secs(1),
            blocking,
            tasks,
            clock,
            owner_id: owner_id.into(),
        }
    }

    pub fn blocking(&self) -> &BlockingSignal {
        &self.blocking
    }

    pub async fn get_state(&self) -> FocusState {
        self.state.lock().await.clone()
    }

    pub async fn start(&self) -> Result<FocusState> {
        let mut state = self.state.lock().await;
        if state.is_running() {
            return Err(anyhow!("focus session already running"));
        }

        state.begin(self.clock.now());
        self.blocking.set(true);
        // Installed while the state lock is held so a concurrent stop always
        // finds the ticker it has to cancel.
        self.spawn_ticker().await;

        log_info!("focus session started for {}", self.owner_id);
        Ok(state.clone())
    }

    pub async fn stop(&self) -> Result<StopOutcome> {
        let (elapsed_secs, ticker) = {
            let mut state = self.state.lock().await;
            if !state.is_running() {
                return Err(anyhow!("no focus session running"));
            }

            // Cancelled under the state lock: the ticker re-checks the token
            // after taking the lock, so no tick lands once we return.
            let ticker = self.ticker.lock().await.take();
            if let Some(ticker) = &ticker {
                ticker.cancel.cancel();
            }
            self.blocking.set(false);
            (state.finish(), ticker)
        };

        if let Some(ticker) = ticker {
            if let Err(err) = ticker.handle.await {
                log_error!("focus ticker failed to join: {err}");
            }
        }

        let Some(minutes) = recorded_minutes(elapsed_secs) else {
            log_info!("focus session discarded after {elapsed_secs}s");
            return Ok(StopOutcome {
                elapsed_secs,
                task: None,
                persisted: None,
            });
        };

        let record = TaskRecord::focus_session(self.owner_id.clone(), minutes, self.clock.now());
        let store = self.tasks.clone();
        let pending = record.clone();
        let persisted = tokio::spawn(async move {
            match store.create_task(pending).await {
                Ok(saved) => {
                    log_info!("recorded {minutes} minute focus session as task {}", saved.id);
                    Some(saved)
                }
                Err(err) => {
                    log_error!("failed to record focus session: {err:?}");
                    None
                }
            }
        });

        Ok(StopOutcome {
            elapsed_secs,
            task: Some(record),
            persisted: Some(persisted),
        })
    }

    async fn spawn_ticker(&self) {
        let mut ticker_guard = self.ticker.lock().await;
        if let Some(stale) = ticker_guard.take() {
            stale.cancel.cancel();
            stale.handle.abort();
        }

        let state = self.state.clone();
        let cancel = CancellationToken::new();
        let token = cancel.clone();
        let tick_interval = self.tick_interval;

        let handle = tokio::spawn(async move {
            let mut interval = time::interval_at(Instant::now() + tick_interval, tick_interval);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                tokio::select! {
                    biased;
                    _ = token.cancelled() => break,
                    _ = interval.tick() => {
                        let mut guard = state.lock().await;
                        if token.is_cancelled() || !guard.tick() {
                            break;
                        }
                        log_debug!("focus tick {}", guard.elapsed_secs);
                    }
                }
            }
        });

        *ticker_guard = Some(Ticker { handle, cancel });
    }
}
