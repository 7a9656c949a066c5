use std::fmt;
use std::str::FromStr;

use tracing::warn;
use uuid::Uuid;

use crate::models::{LoginHistoryEntry, StudentRecord};
use crate::store::{KeyValueStore, StoreError};

pub const KEY_USN: &str = "usn";
pub const KEY_DOB: &str = "dob";
pub const KEY_STUDENT_DATA: &str = "studentData";
pub const KEY_LOGIN_HISTORY: &str = "loginHistory";
pub const KEY_CURRENT_ENDPOINT: &str = "currentEndpoint";
pub const KEY_THEME: &str = "theme";
pub const KEY_DEVICE_ID: &str = "userId";

const HISTORY_TAIL: usize = 4;

#[derive(Debug, Clone)]
pub struct SavedSession {
    pub usn: String,
    pub dob: String,
    pub record: Option<StudentRecord>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Theme {
    Light,
    Dark,
    System,
}

impl FromStr for Theme {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.to_ascii_lowercase().as_str() {
            "light" => Ok(Theme::Light),
            "dark" => Ok(Theme::Dark),
            "system" => Ok(Theme::System),
            other => Err(format!("unknown theme {other:?}, expected light, dark or system")),
        }
    }
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Theme::Light => "light",
            Theme::Dark => "dark",
            Theme::System => "system",
        })
    }
}

pub struct Session<'a> {
    store: &'a dyn KeyValueStore,
}

impl<'a> Session<'a> {
    pub fn new(store: &'a dyn KeyValueStore) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &'a dyn KeyValueStore {
        self.store
    }

    pub async fn save(&self, usn: &str, dob: &str, record: &StudentRecord) -> Result<(), StoreError> {
        self.store.set(KEY_USN, usn).await?;
        self.store.set(KEY_DOB, dob).await?;
        self.store
            .set(KEY_STUDENT_DATA, &serde_json::to_string(record)?)
            .await
    }

    // A cached record that no longer parses is dropped, the credentials still load.
    pub async fn load(&self) -> Result<Option<SavedSession>, StoreError> {
        let (Some(usn), Some(dob)) = (self.store.get(KEY_USN).await?, self.store.get(KEY_DOB).await?)
        else {
            return Ok(None);
        };

        let record = match self.store.get(KEY_STUDENT_DATA).await? {
            Some(raw) => match serde_json::from_str(&raw) {
                Ok(record) => Some(record),
                Err(err) => {
                    warn!(error = %err, "cached student data is unreadable");
                    None
                }
            },
            None => None,
        };

        Ok(Some(SavedSession { usn, dob, record }))
    }

    pub async fn clear(&self) -> Result<(), StoreError> {
        for key in [KEY_USN, KEY_DOB, KEY_STUDENT_DATA] {
            self.store.remove(key).await?;
        }
        Ok(())
    }

    pub async fn login_history(&self) -> Result<Vec<LoginHistoryEntry>, StoreError> {
        let Some(raw) = self.store.get(KEY_LOGIN_HISTORY).await? else {
            return Ok(Vec::new());
        };
        match serde_json::from_str(&raw) {
            Ok(history) => Ok(history),
            Err(err) => {
                warn!(error = %err, "login history is unreadable, starting fresh");
                Ok(Vec::new())
            }
        }
    }

    pub async fn add_to_history(&self, entry: LoginHistoryEntry) -> Result<Vec<LoginHistoryEntry>, StoreError> {
        let history = push_history(self.login_history().await?, entry);
        self.write_history(&history).await?;
        Ok(history)
    }

    pub async fn remove_from_history(&self, usn: &str) -> Result<Vec<LoginHistoryEntry>, StoreError> {
        let mut history = self.login_history().await?;
        history.retain(|entry| !entry.usn.eq_ignore_ascii_case(usn));
        self.write_history(&history).await?;
        Ok(history)
    }

    async fn write_history(&self, history: &[LoginHistoryEntry]) -> Result<(), StoreError> {
        self.store
            .set(KEY_LOGIN_HISTORY, &serde_json::to_string(history)?)
            .await
    }

    pub async fn current_endpoint(&self) -> Result<Option<String>, StoreError> {
        self.store.get(KEY_CURRENT_ENDPOINT).await
    }

    pub async fn set_current_endpoint(&self, endpoint: &str) -> Result<(), StoreError> {
        self.store.set(KEY_CURRENT_ENDPOINT, endpoint).await
    }

    /// Stored preference; no stored value means "follow the system".
    pub async fn theme(&self) -> Result<Theme, StoreError> {
        let stored = self.store.get(KEY_THEME).await?;
        Ok(match stored.as_deref() {
            Some("dark") => Theme::Dark,
            Some("light") => Theme::Light,
            _ => Theme::System,
        })
    }

    pub async fn set_theme(&self, theme: Theme) -> Result<(), StoreError> {
        match theme {
            Theme::System => self.store.remove(KEY_THEME).await,
            other => self.store.set(KEY_THEME, &other.to_string()).await,
        }
    }

    pub async fn device_id(&self) -> Result<String, StoreError> {
        if let Some(id) = self.store.get(KEY_DEVICE_ID).await? {
            return Ok(id);
        }
        let id = Uuid::new_v4().to_string();
        self.store.set(KEY_DEVICE_ID, &id).await?;
        Ok(id)
    }
}

pub fn push_history(history: Vec<LoginHistoryEntry>, entry: LoginHistoryEntry) -> Vec<LoginHistoryEntry> {
    let mut updated = Vec::with_capacity(HISTORY_TAIL + 1);
    let rest: Vec<LoginHistoryEntry> = history
        .into_iter()
        .filter(|existing| existing.usn != entry.usn)
        .take(HISTORY_TAIL)
        .collect();
    updated.push(entry);
    updated.extend(rest);
    updated
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use chrono::Utc;

    fn entry(usn: &str) -> LoginHistoryEntry {
        LoginHistoryEntry {
            usn: usn.to_string(),
            dob: "2003-01-01".to_string(),
            name: format!("Student {usn}"),
            last_used: Utc::now(),
            endpoint: Some("newparents".to_string()),
            endpoint_title: Some("FOR ODD TERM 2025-2026".to_string()),
        }
    }

    fn record() -> StudentRecord {
        serde_json::from_str(
            r#"{"name": "Kiara Patel", "usn": "1MS21EC010", "semester": "Semester 2", "courses": []}"#,
        )
        .unwrap()
    }

    #[test]
    fn history_moves_repeat_logins_to_front() {
        let history = vec![entry("1MS21CS001"), entry("1MS21CS002")];
        let updated = push_history(history, entry("1MS21CS002"));
        let usns: Vec<&str> = updated.iter().map(|e| e.usn.as_str()).collect();
        assert_eq!(usns, vec!["1MS21CS002", "1MS21CS001"]);
    }

    #[test]
    fn history_keeps_five_accounts() {
        let history: Vec<LoginHistoryEntry> =
            (1..=5).map(|i| entry(&format!("1MS21CS00{i}"))).collect();
        let updated = push_history(history, entry("1MS21CS009"));
        assert_eq!(updated.len(), 5);
        assert_eq!(updated[0].usn, "1MS21CS009");
        assert_eq!(updated[4].usn, "1MS21CS004");
    }

    #[tokio::test]
    async fn session_save_load_and_clear() {
        let store = MemoryStore::new();
        let session = Session::new(&store);
        assert!(session.load().await.unwrap().is_none());

        session.save("1MS21EC010", "2003-02-03", &record()).await.unwrap();
        let saved = session.load().await.unwrap().unwrap();
        assert_eq!(saved.usn, "1MS21EC010");
        assert_eq!(saved.record.unwrap().name, "Kiara Patel");

        session.set_current_endpoint("newparents").await.unwrap();
        session.clear().await.unwrap();
        assert!(session.load().await.unwrap().is_none());
        assert_eq!(session.current_endpoint().await.unwrap().as_deref(), Some("newparents"));
    }

    #[tokio::test]
    async fn unreadable_cache_is_dropped() {
        let store = MemoryStore::new();
        store.set(KEY_USN, "1MS21EC010").await.unwrap();
        store.set(KEY_DOB, "2003-02-03").await.unwrap();
        store.set(KEY_STUDENT_DATA, "{not json").await.unwrap();
        store.set(KEY_LOGIN_HISTORY, "oops").await.unwrap();

        let session = Session::new(&store);
        assert!(session.load().await.unwrap().unwrap().record.is_none());
        assert!(session.login_history().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn history_survives_in_store() {
        let store = MemoryStore::new();
        let session = Session::new(&store);
        session.add_to_history(entry("1MS21CS001")).await.unwrap();
        session.add_to_history(entry("1MS21CS002")).await.unwrap();
        let remaining = session.remove_from_history("1ms21cs001").await.unwrap();
        assert_eq!(remaining.len(), 1);
        assert_eq!(session.login_history().await.unwrap()[0].usn, "1MS21CS002");
    }

    #[tokio::test]
    async fn theme_system_clears_preference() {
        let store = MemoryStore::new();
        let session = Session::new(&store);
        assert_eq!(session.theme().await.unwrap(), Theme::System);
        session.set_theme(Theme::Dark).await.unwrap();
        assert_eq!(session.theme().await.unwrap(), Theme::Dark);
        session.set_theme(Theme::System).await.unwrap();
        assert_eq!(store.get(KEY_THEME).await.unwrap(), None);
    }

    #[tokio::test]
    async fn device_id_is_stable() {
        let store = MemoryStore::new();
        let session = Session::new(&store);
        let first = session.device_id().await.unwrap();
        assert_eq!(session.device_id().await.unwrap(), first);
        assert!(Uuid::parse_str(&first).is_ok());
    }
}
