//! Delete reconciliation
//!
//! Removes an event key from every store that can hold it: the core
//! list, every locale's i18n file, and every lectionary file in the
//! key's category folder(s). Ferial keys that were never in the core
//! list are removed from lectionary files only.

use serde::Serialize;
use tracing::{debug, warn};

use crate::store::{CalendarPaths, JsonStore, StoreError};
use crate::temporale::classifier::LectionaryCategory;
use crate::temporale::event::Event;
use crate::types::{ApiError, Result};

/// What a successful delete removed
#[derive(Debug, Serialize)]
pub struct DeleteOutcome {
    pub event_key: String,
    /// "event" for a full delete, "ferial" for a lectionary-only delete
    #[serde(rename = "type")]
    pub delete_type: &'static str,
    /// Number of lectionary files the key was removed from
    pub lectionary_files: usize,
}

pub struct DeleteReconciler<'a> {
    store: &'a JsonStore,
    paths: &'a CalendarPaths,
}

impl<'a> DeleteReconciler<'a> {
    pub fn new(store: &'a JsonStore, paths: &'a CalendarPaths) -> Self {
        Self { store, paths }
    }

    pub async fn delete(&self, event_key: &str) -> Result<DeleteOutcome> {
        if event_key.is_empty() {
            return Err(ApiError::Validation(
                "event_key path parameter must not be empty".to_string(),
            ));
        }

        let mut core = self.load_core().await?;
        let position = core.iter().position(|e| e.event_key == event_key);

        match position {
            Some(index) => {
                core.remove(index);
                let value = serde_json::to_value(&core)
                    .map_err(|e| ApiError::Internal(format!("failed to encode core list: {}", e)))?;
                self.store
                    .write_pretty(&self.paths.core_file(), &value)
                    .await
                    .map_err(|e| ApiError::Internal(e.to_string()))?;

                self.remove_from_i18n(event_key).await?;
                let lectionary_files = self.remove_from_lectionary(event_key).await?;

                debug!("Deleted event '{}' from all stores", event_key);
                Ok(DeleteOutcome {
                    event_key: event_key.to_string(),
                    delete_type: "event",
                    lectionary_files,
                })
            }
            None => {
                let category = LectionaryCategory::of(event_key);
                if !category.is_ferial() {
                    return Err(ApiError::NotFound(format!(
                        "event '{}' not found",
                        event_key
                    )));
                }

                let lectionary_files = self.remove_from_lectionary(event_key).await?;
                debug!(
                    "Deleted ferial event '{}' from {} lectionary files",
                    event_key, lectionary_files
                );
                Ok(DeleteOutcome {
                    event_key: event_key.to_string(),
                    delete_type: "ferial",
                    lectionary_files,
                })
            }
        }
    }

    async fn load_core(&self) -> Result<Vec<Event>> {
        match self.store.read(&self.paths.core_file()).await {
            Ok(None) => Ok(Vec::new()),
            Ok(Some(value)) => match serde_json::from_value(value.as_ref().clone()) {
                Ok(events) => Ok(events),
                Err(e) => {
                    warn!("Core event file does not decode, treating as empty: {}", e);
                    Ok(Vec::new())
                }
            },
            Err(e) if matches!(e, StoreError::Malformed { .. }) => {
                warn!("Core event file is malformed, treating as empty: {}", e);
                Ok(Vec::new())
            }
            Err(e) => Err(ApiError::ServiceUnavailable(e.to_string())),
        }
    }

    async fn remove_from_i18n(&self, event_key: &str) -> Result<()> {
        for locale_name in self.paths.i18n_locales().await {
            let path = self.paths.i18n_file(&locale_name);
            self.store
                .remove_key(&path, event_key)
                .await
                .map_err(|e| ApiError::Internal(e.to_string()))?;
        }
        Ok(())
    }

    /// Remove the key from every file of its category's folder(s),
    /// skipping files that don't contain it. ImmaculateHeart and its
    /// peers classify as Sanctorum, so the sanctorum files are covered
    /// by the same path.
    async fn remove_from_lectionary(&self, event_key: &str) -> Result<usize> {
        let category = LectionaryCategory::of(event_key);
        let mut removed = 0;
        for path in self.paths.category_files(category).await {
            let was_present = self
                .store
                .remove_key(&path, event_key)
                .await
                .map_err(|e| ApiError::Internal(e.to_string()))?;
            if was_present {
                removed += 1;
            }
        }
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::temporale::reconcile::WriteReconciler;
    use serde_json::{json, Value};
    use tempfile::TempDir;

    fn festive(gospel: &str) -> Value {
        json!({
            "first_reading": "Gen 1:1",
            "responsorial_psalm": "Ps 1",
            "second_reading": "Rom 1:1",
            "gospel_acclamation": "Alleluia",
            "gospel": gospel
        })
    }

    fn ferial() -> Value {
        json!({
            "first_reading": "Gen 1:1",
            "responsorial_psalm": "Ps 1",
            "gospel_acclamation": "Alleluia",
            "gospel": "Mk 1:14"
        })
    }

    struct Fixture {
        _dir: TempDir,
        store: JsonStore,
        paths: CalendarPaths,
    }

    impl Fixture {
        fn new() -> Self {
            let dir = TempDir::new().unwrap();
            let paths = CalendarPaths::new(dir.path());
            Self {
                _dir: dir,
                store: JsonStore::new(),
                paths,
            }
        }

        async fn seed(&self) {
            let payload = json!({
                "locales": ["en", "la"],
                "events": [
                    {
                        "event_key": "Easter",
                        "grade": 7,
                        "type": "mobile",
                        "color": ["white"],
                        "i18n": {"en": "Easter Sunday", "la": "Dominica Paschae"},
                        "readings": {"en": {"A": festive("Mt 28:1"), "B": festive("Mk 16:1"), "C": festive("Lk 24:1")}}
                    },
                    {
                        "event_key": "OrdWeekday1Monday",
                        "grade": 0,
                        "type": "mobile",
                        "color": ["green"],
                        "readings": {"en": {"I": ferial(), "II": ferial()}}
                    }
                ]
            });
            WriteReconciler::new(&self.store, &self.paths)
                .put(&payload, "en")
                .await
                .unwrap();
        }

        fn deleter(&self) -> DeleteReconciler<'_> {
            DeleteReconciler::new(&self.store, &self.paths)
        }
    }

    #[tokio::test]
    async fn test_full_delete_removes_every_trace() {
        let fx = Fixture::new();
        fx.seed().await;

        let outcome = fx.deleter().delete("Easter").await.unwrap();
        assert_eq!(outcome.delete_type, "event");
        assert_eq!(outcome.lectionary_files, 3);

        let core: Vec<Event> = serde_json::from_value(
            fx.store
                .read(&fx.paths.core_file())
                .await
                .unwrap()
                .unwrap()
                .as_ref()
                .clone(),
        )
        .unwrap();
        assert!(core.is_empty());

        for locale_name in ["en", "la"] {
            let map = fx
                .store
                .read_object(&fx.paths.i18n_file(locale_name))
                .await
                .unwrap()
                .unwrap();
            assert!(!map.contains_key("Easter"));
        }

        for label in ["A", "B", "C"] {
            let path = fx
                .paths
                .year_file(LectionaryCategory::SundaysSolemnities, label, "en")
                .unwrap();
            let map = fx.store.read_object(&path).await.unwrap().unwrap();
            assert!(!map.contains_key("Easter"));
        }
    }

    #[tokio::test]
    async fn test_second_delete_is_not_found() {
        let fx = Fixture::new();
        fx.seed().await;

        fx.deleter().delete("Easter").await.unwrap();
        let err = fx.deleter().delete("Easter").await.unwrap_err();
        assert_eq!(err.error_type(), "NOT_FOUND");
    }

    #[tokio::test]
    async fn test_ferial_only_delete() {
        let fx = Fixture::new();
        fx.seed().await;

        let outcome = fx.deleter().delete("OrdWeekday1Monday").await.unwrap();
        assert_eq!(outcome.delete_type, "ferial");
        assert_eq!(outcome.lectionary_files, 2);

        // Core list and i18n files untouched
        let core: Vec<Event> = serde_json::from_value(
            fx.store
                .read(&fx.paths.core_file())
                .await
                .unwrap()
                .unwrap()
                .as_ref()
                .clone(),
        )
        .unwrap();
        assert_eq!(core.len(), 1);
    }

    #[tokio::test]
    async fn test_unknown_non_ferial_key_is_not_found() {
        let fx = Fixture::new();
        fx.seed().await;

        let err = fx.deleter().delete("NoSuchFeast").await.unwrap_err();
        assert_eq!(err.error_type(), "NOT_FOUND");
    }
}
