//! Community alert feed.
//!
//! Built-in alerts plus user reports. Only the user reports are
//! persisted; they are listed first, newest first.

use super::storage::KeyValueStore;
use super::{Alert, AlertError, Severity};

/// Storage key for user-submitted alerts.
pub const STORAGE_KEY: &str = "pureplate_user_alerts";

/// Alerts shipped with the app.
pub fn default_alerts() -> Vec<Alert> {
    let builtin = [
        (1, "Contaminated Milk", "Central Market, Sector 7", "2 hours ago", Severity::High),
        (2, "Fake Turmeric", "Spice Bazaar, Old Town", "5 hours ago", Severity::Medium),
        (3, "Unsafe Street Food", "Railway Station Area", "1 day ago", Severity::High),
        (4, "Adulterated Honey", "Super Mart, Green Park", "2 days ago", Severity::Low),
        (
            5,
            "Synthetic Colors in Sweets",
            "Festival Market, Main Road",
            "3 days ago",
            Severity::Medium,
        ),
    ];

    builtin
        .into_iter()
        .map(|(id, kind, location, time, severity)| Alert {
            id,
            kind: kind.to_string(),
            location: location.to_string(),
            time: time.to_string(),
            severity,
        })
        .collect()
}

/// Append-only alert list backed by a [`KeyValueStore`].
pub struct AlertStore<S: KeyValueStore> {
    storage: S,
    user_alerts: Vec<Alert>,
}

impl<S: KeyValueStore> AlertStore<S> {
    /// Loads user alerts. Missing or unreadable data starts an empty list.
    pub fn open(storage: S) -> Self {
        let user_alerts = match storage.get(STORAGE_KEY) {
            Ok(Some(json)) => serde_json::from_str(&json).unwrap_or_else(|e| {
                tracing::warn!(error = %e, "Discarding unreadable stored alerts");
                Vec::new()
            }),
            Ok(None) => Vec::new(),
            Err(e) => {
                tracing::warn!(error = %e, "Failed to load stored alerts");
                Vec::new()
            }
        };

        tracing::debug!(count = user_alerts.len(), "Loaded user alerts");
        Self {
            storage,
            user_alerts,
        }
    }

    /// User alerts (newest first) followed by the built-ins.
    pub fn alerts(&self) -> Vec<Alert> {
        self.user_alerts
            .iter()
            .cloned()
            .chain(default_alerts())
            .collect()
    }

    pub fn user_alerts(&self) -> &[Alert] {
        &self.user_alerts
    }

    /// Prepends a user alert and persists the user list.
    pub fn add_alert(
        &mut self,
        kind: impl Into<String>,
        location: impl Into<String>,
    ) -> Result<&Alert, AlertError> {
        let mut id = chrono::Utc::now().timestamp_millis();
        // Two reports in the same millisecond still get distinct ids
        if let Some(newest) = self.user_alerts.first() {
            id = id.max(newest.id + 1);
        }

        let alert = Alert {
            id,
            kind: kind.into(),
            location: location.into(),
            time: "Just now".to_string(),
            severity: Severity::Medium,
        };

        self.user_alerts.insert(0, alert);
        if let Err(e) = self.persist() {
            self.user_alerts.remove(0);
            return Err(e);
        }

        let alert = &self.user_alerts[0];
        tracing::info!(id = alert.id, kind = %alert.kind, location = %alert.location, "Alert added");
        Ok(alert)
    }

    fn persist(&mut self) -> Result<(), AlertError> {
        let json = serde_json::to_string(&self.user_alerts)?;
        self.storage.set(STORAGE_KEY, &json)
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alerts::{FileStore, MemoryStore};

    #[test]
    fn test_defaults_only_when_empty() {
        let store = AlertStore::open(MemoryStore::new());
        let alerts = store.alerts();
        assert_eq!(alerts.len(), 5);
        assert_eq!(alerts[0].kind, "Contaminated Milk");
        assert!(store.user_alerts().is_empty());
    }

    #[test]
    fn test_user_alerts_listed_first_newest_first() {
        let mut store = AlertStore::open(MemoryStore::new());
        store.add_alert("Fake Ghee", "North Market").unwrap();
        store.add_alert("Watered Milk", "Dairy Lane").unwrap();

        let alerts = store.alerts();
        assert_eq!(alerts.len(), 7);
        assert_eq!(alerts[0].kind, "Watered Milk");
        assert_eq!(alerts[1].kind, "Fake Ghee");
        assert_eq!(alerts[2].kind, "Contaminated Milk");
        assert_eq!(alerts[0].time, "Just now");
        assert_eq!(alerts[0].severity, Severity::Medium);
        assert!(alerts[0].id > alerts[1].id);
    }

    #[test]
    fn test_alerts_survive_reopen() {
        let dir = tempfile::tempdir().unwrap();
        {
            let mut store = AlertStore::open(FileStore::new(dir.path()));
            store.add_alert("Fake Ghee", "North Market").unwrap();
        }

        let reopened = AlertStore::open(FileStore::new(dir.path()));
        assert_eq!(reopened.user_alerts().len(), 1);
        assert_eq!(reopened.user_alerts()[0].location, "North Market");
    }

    #[test]
    fn test_stored_json_uses_type_field() {
        let mut store = AlertStore::open(MemoryStore::new());
        store.add_alert("Fake Ghee", "North Market").unwrap();

        let json = store.storage().get(STORAGE_KEY).unwrap().unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value[0]["type"], "Fake Ghee");
        assert_eq!(value[0]["severity"], "medium");
    }

    #[test]
    fn test_corrupt_storage_starts_empty() {
        let mut storage = MemoryStore::new();
        storage.set(STORAGE_KEY, "{not json").unwrap();

        let store = AlertStore::open(storage);
        assert!(store.user_alerts().is_empty());
        assert_eq!(store.alerts().len(), 5);
    }
}
