//! Shared "block distracting apps" switch.
//!
//! The focus controller is the only writer. Enforcement agents subscribe and
//! react to transitions instead of polling a global.

use std::sync::Arc;

use tokio::sync::watch;

/// Package ids blocked while a focus session runs, unless configured otherwise.
pub const DEFAULT_BLOCKED_APPS: &[&str] = &[
    "com.instagram.android",
    "com.zhiliaoapp.musically",
    "com.facebook.katana",
    "com.twitter.android",
    "com.snapchat.android",
    "com.google.android.youtube",
];

#[derive(Clone)]
pub struct BlockingSignal {
    flag: Arc<watch::Sender<bool>>,
    denylist: Arc<[String]>,
}

impl BlockingSignal {
    pub fn new(denylist: Vec<String>) -> Self {
        let (flag, _) = watch::channel(false);
        Self {
            flag: Arc::new(flag),
            denylist: denylist.into(),
        }
    }

    pub fn with_default_denylist() -> Self {
        Self::new(DEFAULT_BLOCKED_APPS.iter().map(|app| app.to_string()).collect())
    }

    pub fn is_active(&self) -> bool {
        *self.flag.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.flag.subscribe()
    }

    pub fn denylist(&self) -> &[String] {
        &self.denylist
    }

    /// Whether an enforcement agent should push `app_id` out of the foreground.
    pub fn should_block(&self, app_id: &str) -> bool {
        self.is_active() && self.denylist.iter().any(|denied| denied == app_id)
    }

    /// Returns true if the flag actually changed.
    pub(crate) fn set(&self, active: bool) -> bool {
        self.flag.send_if_modified(|current| {
            if *current == active {
                false
            } else {
                *current = active;
                true
            }
        })
    }
}
