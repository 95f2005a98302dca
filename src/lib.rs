pub mod blocking;
pub mod clock;
pub mod db;
pub mod groups;
pub mod leaderboard;
pub mod settings;
pub mod stats;
pub mod store;
pub mod sync;
pub mod timer;
mod utils;

#[cfg(test)]
mod testing;

use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

use anyhow::{anyhow, Context, Result};
use log::{error, info, warn};
use tokio_util::sync::CancellationToken;

use blocking::BlockingSignal;
use clock::{Clock, SystemClock};
use db::Database;
use groups::GroupManager;
use leaderboard::{LeaderboardPublisher, LEADERBOARD_LIMIT};
use settings::SettingsStore;
use sync::TaskSync;
use timer::FocusController;

const DATA_DIR_ENV: &str = "FOCUSBOARD_DATA_DIR";
const DEBUG_ENV: &str = "FOCUSBOARD_DEBUG";

/// Everything a front end needs, wired to one database and one profile.
pub struct AppState {
    pub db: Database,
    pub settings: SettingsStore,
    pub blocking: BlockingSignal,
    pub sync: TaskSync,
    pub focus: FocusController,
    pub groups: GroupManager,
    pub leaderboard: LeaderboardPublisher,
}

impl AppState {
    pub fn open(data_dir: &Path) -> Result<Self> {
        std::fs::create_dir_all(data_dir)
            .with_context(|| format!("failed to create data directory {}", data_dir.display()))?;

        let settings = SettingsStore::new(data_dir.join("settings.json"))?;
        let db = Database::new(data_dir.join("focusboard.sqlite3"))?;
        Ok(Self::with_database(db, settings, Arc::new(SystemClock)))
    }

    pub fn with_database(db: Database, settings: SettingsStore, clock: Arc<dyn Clock>) -> Self {
        let profile = settings.profile();
        let defaults = settings.defaults();
        let store = Arc::new(db.clone());

        let blocking = BlockingSignal::new(settings.blocked_apps());
        let leaderboard = LeaderboardPublisher::new(store.clone());
        let sync = TaskSync::new(
            profile.clone(),
            store.clone(),
            leaderboard.clone(),
            clock.clone(),
            defaults.task_minutes,
        );
        let focus = FocusController::new(
            profile.user_id.clone(),
            store.clone(),
            blocking.clone(),
            clock.clone(),
        );
        let groups = GroupManager::new(profile.user_id, store, clock, defaults);

        Self {
            db,
            settings,
            blocking,
            sync,
            focus,
            groups,
            leaderboard,
        }
    }
}

fn debug_enabled() -> bool {
    std::env::var(DEBUG_ENV)
        .map(|value| value == "1" || value.eq_ignore_ascii_case("true"))
        .unwrap_or(false)
}

fn resolve_data_dir() -> Result<PathBuf> {
    if let Some(dir) = std::env::var_os(DATA_DIR_ENV) {
        return Ok(PathBuf::from(dir));
    }
    dirs::data_dir()
        .map(|dir| dir.join("focusboard"))
        .ok_or_else(|| anyhow!("no platform data directory; set {DATA_DIR_ENV}"))
}

pub fn run() -> Result<()> {
    // RUST_LOG, when set, overrides the default level.
    let level = if debug_enabled() {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .init();

    log::info!("Focusboard starting up...");

    let data_dir = resolve_data_dir()?;
    let runtime = tokio::runtime::Runtime::new().context("failed to start tokio runtime")?;
    runtime.block_on(serve(data_dir))
}

async fn serve(data_dir: PathBuf) -> Result<()> {
    let state = AppState::open(&data_dir)?;
    let cancel = CancellationToken::new();

    // Stand-in enforcement agent: reports every blocking transition.
    let mut blocking = state.blocking.subscribe();
    let denylist = state.blocking.denylist().len();
    tokio::spawn(async move {
        while blocking.changed().await.is_ok() {
            let active = *blocking.borrow_and_update();
            info!("app blocking {} ({denylist} apps)", if active { "on" } else { "off" });
        }
    });

    let mut views = state.sync.subscribe();
    tokio::spawn(async move {
        while views.changed().await.is_ok() {
            let stats = views.borrow_and_update().stats.clone();
            info!(
                "{} active / {} archived tasks, {} points, {} min today, {} day streak",
                stats.active.len(),
                stats.history.len(),
                stats.total_points,
                stats.today_minutes,
                stats.streak
            );
        }
    });

    match state.leaderboard.top(LEADERBOARD_LIMIT).await {
        Ok(top) => info!("leaderboard has {} entries", top.len()),
        Err(err) => warn!("leaderboard unavailable: {err:?}"),
    }

    let sync = state.sync.clone();
    let sync_cancel = cancel.clone();
    let sync_task = tokio::spawn(async move { sync.run(sync_cancel).await });

    tokio::signal::ctrl_c()
        .await
        .context("failed to listen for shutdown signal")?;
    info!("shutdown requested");

    if state.focus.get_state().await.is_running() {
        match state.focus.stop().await {
            Ok(outcome) => {
                if let Some(pending) = outcome.persisted {
                    if let Err(err) = pending.await {
                        error!("focus session write did not finish: {err}");
                    }
                }
            }
            Err(err) => error!("failed to stop focus session: {err:?}"),
        }
    }

    cancel.cancel();
    sync_task
        .await
        .map_err(|err| anyhow!("task sync panicked: {err}"))??;
    Ok(())
}
