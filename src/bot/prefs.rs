//! Per-user generation preferences.

use std::collections::HashMap;

use teloxide::types::UserId;
use tokio::sync::Mutex;

/// Volatile per-user instrumental flag. Defaults to off; lost on restart.
#[derive(Default)]
pub struct PrefStore {
    instrumental: Mutex<HashMap<UserId, bool>>,
}

impl PrefStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn instrumental(&self, user_id: UserId) -> bool {
        self.instrumental.lock().await.get(&user_id).copied().unwrap_or(false)
    }

    /// Flip the flag and return the new value.
    pub async fn toggle_instrumental(&self, user_id: UserId) -> bool {
        let mut prefs = self.instrumental.lock().await;
        let flag = prefs.entry(user_id).or_insert(false);
        *flag = !*flag;
        *flag
    }
}
