//! Write reconciliation
//!
//! PUT (create-only) and PATCH (merge) both accept events with inline
//! i18n and readings. The reconciler validates the payload, then routes
//! every piece of data to its file: translations into per-locale i18n
//! files, readings into per-category (and per-year) lectionary files,
//! and the stripped core attributes into the core event list.
//!
//! There is no cross-file transaction. Writes happen in the order
//! i18n -> readings -> core list, so that a truncated sequence never
//! leaves the core list referencing data the other stores don't hold:
//! an orphaned i18n or readings entry is harmless, a core event without
//! them is not.

use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;
use tracing::{debug, warn};

use crate::store::{CalendarPaths, JsonStore, StoreError};
use crate::temporale::classifier::{LectionaryCategory, YearCycle};
use crate::temporale::event::{Event, EventType, LiturgicalColor, MAX_GRADE};
use crate::temporale::locale;
use crate::temporale::readings::ReadingsShape;
use crate::types::{ApiError, Result};

/// Response body of a successful PUT
#[derive(Debug, Serialize)]
pub struct PutOutcome {
    /// Non-ferial events written to the core list
    pub stored: usize,
    /// Grade-0 events written to lectionary files only
    pub ferial: usize,
}

/// Response body of a successful PATCH
#[derive(Debug, Serialize)]
pub struct PatchOutcome {
    pub updated: usize,
    pub added: usize,
    pub ferial: usize,
}

/// A payload event after structural validation
struct ValidatedEvent {
    event: Event,
    /// locale -> translated name
    i18n: BTreeMap<String, String>,
    /// locale -> readings entry (flat or year-keyed, already validated)
    readings: BTreeMap<String, ReadingsEntry>,
}

/// How one per-locale readings entry routes to files
enum ReadingsEntry {
    /// Single object matching the event's shape
    Flat(Value),
    /// One object per year label, each matching the shape
    YearKeyed(Vec<(&'static str, Value)>),
}

pub struct WriteReconciler<'a> {
    store: &'a JsonStore,
    paths: &'a CalendarPaths,
}

impl<'a> WriteReconciler<'a> {
    pub fn new(store: &'a JsonStore, paths: &'a CalendarPaths) -> Self {
        Self { store, paths }
    }

    /// PUT /temporale: create the calendar from scratch.
    ///
    /// `required_locale` is the caller's resolved base Accept-Language
    /// locale; every non-ferial event must carry a translation for it.
    pub async fn put(&self, payload: &Value, required_locale: &str) -> Result<PutOutcome> {
        self.ensure_core_empty().await?;

        let body = payload
            .as_object()
            .ok_or_else(|| ApiError::Validation("payload must be a JSON object".to_string()))?;

        let declared_locales = parse_declared_locales(body.get("locales"))?;
        let events = parse_events_array(body.get("events"))?;

        let mut validated = Vec::with_capacity(events.len());
        let mut seen = BTreeSet::new();
        for (index, raw) in events.iter().enumerate() {
            let event = validate_event(raw, index)?;
            if !seen.insert(event.event.event_key.clone()) {
                return Err(ApiError::Validation(format!(
                    "duplicate event_key '{}'",
                    event.event.event_key
                )));
            }
            require_put_fields(&event, required_locale)?;
            validated.push(event);
        }

        // i18n first, then readings, then the core list (durability order)
        self.write_i18n_files(&validated, &declared_locales).await?;
        self.write_readings_files(&validated).await?;

        let core: Vec<&ValidatedEvent> =
            validated.iter().filter(|e| e.event.grade > 0).collect();
        self.write_core_list(core.iter().map(|e| e.event.clone()).collect())
            .await?;

        let stored = core.len();
        Ok(PutOutcome {
            stored,
            ferial: validated.len() - stored,
        })
    }

    /// PATCH /temporale: merge events into the existing calendar.
    pub async fn patch(&self, payload: &Value, required_locale: &str) -> Result<PatchOutcome> {
        let body = payload
            .as_object()
            .ok_or_else(|| ApiError::Validation("payload must be a JSON object".to_string()))?;
        let events = parse_events_array(body.get("events"))?;

        let mut core = self.load_core_or_empty().await?;
        let existing_keys: BTreeSet<String> =
            core.iter().map(|e| e.event_key.clone()).collect();

        let mut validated = Vec::with_capacity(events.len());
        let mut seen = BTreeSet::new();
        for (index, raw) in events.iter().enumerate() {
            let event = validate_event(raw, index)?;
            if !seen.insert(event.event.event_key.clone()) {
                return Err(ApiError::Validation(format!(
                    "duplicate event_key '{}'",
                    event.event.event_key
                )));
            }
            let is_new = !existing_keys.contains(&event.event.event_key);
            require_patch_fields(&event, is_new, required_locale)?;
            validated.push(event);
        }

        // (a) merge payload translations into per-locale files
        let known_locales = self.paths.i18n_locales().await;
        let i18n_updates = collect_i18n_updates(&validated);
        let introduced_locales: BTreeSet<String> = i18n_updates
            .keys()
            .filter(|l| !known_locales.contains(*l))
            .cloned()
            .collect();
        for (locale_name, entries) in &i18n_updates {
            self.merge_for_write(&self.paths.i18n_file(locale_name), entries)
                .await?;
        }

        // (b) new event keys gain a placeholder in every known locale file,
        // so no locale silently lacks the key
        let new_keys: BTreeSet<String> = validated
            .iter()
            .filter(|e| e.event.grade > 0 && !existing_keys.contains(&e.event.event_key))
            .map(|e| e.event.event_key.clone())
            .collect();
        let mut all_locales = known_locales.clone();
        all_locales.extend(i18n_updates.keys().cloned());
        self.backfill_keys_into_locales(&new_keys, &all_locales).await?;

        // (c) newly introduced locales gain placeholders for every
        // pre-existing event key, so the new file is not sparse
        for locale_name in &introduced_locales {
            self.backfill_locale_with_keys(locale_name, &existing_keys)
                .await?;
        }

        // (d) readings, exactly as on PUT
        self.write_readings_files(&validated).await?;

        // (e) apply non-ferial events to the core list
        let mut updated = 0;
        let mut added = 0;
        let mut ferial = 0;
        for event in &validated {
            if event.event.grade == 0 {
                ferial += 1;
                continue;
            }
            match core
                .iter_mut()
                .find(|e| e.event_key == event.event.event_key)
            {
                Some(existing) => {
                    *existing = event.event.clone();
                    updated += 1;
                }
                None => {
                    core.push(event.event.clone());
                    added += 1;
                }
            }
        }
        self.write_core_list(core).await?;

        Ok(PatchOutcome {
            updated,
            added,
            ferial,
        })
    }

    /// Insert an empty-string placeholder for each key into each locale
    /// file where the key is missing (payload-supplied values already
    /// merged, so placeholders never overwrite real translations).
    pub async fn backfill_keys_into_locales(
        &self,
        keys: &BTreeSet<String>,
        locales: &BTreeSet<String>,
    ) -> Result<()> {
        if keys.is_empty() {
            return Ok(());
        }
        for locale_name in locales {
            self.backfill_locale_with_keys(locale_name, keys).await?;
        }
        Ok(())
    }

    /// Insert an empty-string placeholder into one locale file for each
    /// key it does not yet contain.
    pub async fn backfill_locale_with_keys(
        &self,
        locale_name: &str,
        keys: &BTreeSet<String>,
    ) -> Result<()> {
        let path = self.paths.i18n_file(locale_name);
        let mut map = match self.store.read_object(&path).await {
            Ok(Some(existing)) => existing,
            Ok(None) => Map::new(),
            Err(e) if matches!(e, StoreError::Malformed { .. }) => {
                warn!("Rebuilding corrupt i18n file {}: {}", locale_name, e);
                Map::new()
            }
            Err(e) => return Err(ApiError::ServiceUnavailable(e.to_string())),
        };

        let mut changed = false;
        for key in keys {
            if !map.contains_key(key) {
                map.insert(key.clone(), Value::String(String::new()));
                changed = true;
            }
        }
        if changed {
            self.store
                .write_pretty(&path, &Value::Object(map))
                .await
                .map_err(|e| ApiError::Internal(e.to_string()))?;
        }
        Ok(())
    }

    /// PUT precondition: the core file must be absent, empty, or
    /// undecodable (treated as no existing data). Infrastructure
    /// failures propagate.
    async fn ensure_core_empty(&self) -> Result<()> {
        match self.store.read(&self.paths.core_file()).await {
            Ok(None) => Ok(()),
            Ok(Some(value)) => match value.as_array() {
                Some(existing) if !existing.is_empty() => Err(ApiError::Conflict(
                    "temporale data already exists; use PATCH to modify it".to_string(),
                )),
                Some(_) => Ok(()),
                None => {
                    warn!("Core event file holds non-array data, overwriting");
                    Ok(())
                }
            },
            Err(e) if matches!(e, StoreError::Malformed { .. }) => {
                warn!("Core event file is malformed, overwriting: {}", e);
                Ok(())
            }
            Err(e) => Err(ApiError::ServiceUnavailable(e.to_string())),
        }
    }

    async fn load_core_or_empty(&self) -> Result<Vec<Event>> {
        match self.store.read(&self.paths.core_file()).await {
            Ok(None) => Ok(Vec::new()),
            Ok(Some(value)) => match serde_json::from_value(value.as_ref().clone()) {
                Ok(events) => Ok(events),
                Err(e) => {
                    warn!("Core event file does not decode, starting empty: {}", e);
                    Ok(Vec::new())
                }
            },
            Err(e) if matches!(e, StoreError::Malformed { .. }) => {
                warn!("Core event file is malformed, starting empty: {}", e);
                Ok(Vec::new())
            }
            Err(e) => Err(ApiError::ServiceUnavailable(e.to_string())),
        }
    }

    /// Write one i18n file per declared or provided locale. Every
    /// non-ferial event key appears in every file, with an empty-string
    /// placeholder where the payload had no translation.
    async fn write_i18n_files(
        &self,
        events: &[ValidatedEvent],
        declared: &BTreeSet<String>,
    ) -> Result<()> {
        let mut locales = declared.clone();
        for event in events {
            locales.extend(event.i18n.keys().cloned());
        }

        for locale_name in &locales {
            let mut entries = Map::new();
            for event in events {
                if event.event.grade == 0 {
                    continue;
                }
                let name = event
                    .i18n
                    .get(locale_name)
                    .cloned()
                    .unwrap_or_default();
                entries.insert(event.event.event_key.clone(), Value::String(name));
            }
            self.merge_for_write(&self.paths.i18n_file(locale_name), &entries)
                .await?;
        }
        Ok(())
    }

    /// Route every readings entry to its lectionary file and merge.
    /// Merges are grouped per file so each file is written once.
    async fn write_readings_files(&self, events: &[ValidatedEvent]) -> Result<()> {
        let mut per_file: BTreeMap<PathBuf, Map<String, Value>> = BTreeMap::new();

        for event in events {
            let key = &event.event.event_key;
            let category = LectionaryCategory::of(key);
            for (locale_name, entry) in &event.readings {
                match entry {
                    ReadingsEntry::Flat(value) => {
                        let path = if category.cycle() == YearCycle::None {
                            self.paths.flat_file(category, locale_name)
                        } else {
                            self.paths.common_file(category, locale_name)
                        };
                        per_file
                            .entry(path)
                            .or_default()
                            .insert(key.clone(), value.clone());
                    }
                    ReadingsEntry::YearKeyed(years) => {
                        for (label, value) in years {
                            let path = self.paths.year_file(category, label, locale_name)?;
                            per_file
                                .entry(path)
                                .or_default()
                                .insert(key.clone(), value.clone());
                        }
                    }
                }
            }
        }

        for (path, entries) in &per_file {
            self.merge_for_write(path, entries).await?;
        }
        Ok(())
    }

    async fn write_core_list(&self, events: Vec<Event>) -> Result<()> {
        let value = serde_json::to_value(&events)
            .map_err(|e| ApiError::Internal(format!("failed to encode core list: {}", e)))?;
        self.store
            .write_pretty(&self.paths.core_file(), &value)
            .await
            .map_err(|e| ApiError::Internal(e.to_string()))?;
        debug!("Core event list written ({} events)", events.len());
        Ok(())
    }

    async fn merge_for_write(&self, path: &PathBuf, entries: &Map<String, Value>) -> Result<()> {
        if entries.is_empty() {
            return Ok(());
        }
        self.store
            .merge_object(path, entries)
            .await
            .map_err(|e| ApiError::Internal(e.to_string()))
    }
}

/// Collect per-locale translation updates from events that carry i18n
fn collect_i18n_updates(events: &[ValidatedEvent]) -> BTreeMap<String, Map<String, Value>> {
    let mut updates: BTreeMap<String, Map<String, Value>> = BTreeMap::new();
    for event in events {
        for (locale_name, name) in &event.i18n {
            updates
                .entry(locale_name.clone())
                .or_default()
                .insert(event.event.event_key.clone(), Value::String(name.clone()));
        }
    }
    updates
}

fn parse_declared_locales(value: Option<&Value>) -> Result<BTreeSet<String>> {
    let list = value
        .and_then(Value::as_array)
        .ok_or_else(|| ApiError::Validation("'locales' must be a non-empty array".to_string()))?;
    if list.is_empty() {
        return Err(ApiError::Validation(
            "'locales' must be a non-empty array".to_string(),
        ));
    }

    let mut locales = BTreeSet::new();
    for entry in list {
        let raw = entry
            .as_str()
            .filter(|s| !s.is_empty())
            .ok_or_else(|| ApiError::Validation("locales entries must be non-empty strings".to_string()))?;
        if raw.contains('_') || raw.contains('-') {
            return Err(ApiError::Validation(format!(
                "locale '{}' must be a base locale without region subtags",
                raw
            )));
        }
        let canonical = locale::canonicalize(raw).ok_or_else(|| {
            ApiError::Validation(format!("'{}' is not a valid locale", raw))
        })?;
        locales.insert(canonical);
    }
    Ok(locales)
}

fn parse_events_array(value: Option<&Value>) -> Result<&Vec<Value>> {
    let events = value
        .and_then(Value::as_array)
        .ok_or_else(|| ApiError::Validation("'events' must be a non-empty array".to_string()))?;
    if events.is_empty() {
        return Err(ApiError::Validation(
            "'events' must be a non-empty array".to_string(),
        ));
    }
    Ok(events)
}

/// Structural validation shared by PUT and PATCH: key, grade, type,
/// color, and the shapes of any inline i18n and readings.
fn validate_event(raw: &Value, index: usize) -> Result<ValidatedEvent> {
    let object = raw.as_object().ok_or_else(|| {
        ApiError::Validation(format!("events[{}] must be a JSON object", index))
    })?;

    let event_key = object
        .get("event_key")
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| {
            ApiError::Validation(format!(
                "events[{}] must have a non-empty string event_key",
                index
            ))
        })?
        .to_string();

    let grade = object
        .get("grade")
        .and_then(Value::as_u64)
        .filter(|g| *g <= MAX_GRADE as u64)
        .ok_or_else(|| {
            ApiError::Validation(format!(
                "event '{}' must have an integer grade between 0 and {}",
                event_key, MAX_GRADE
            ))
        })? as u8;

    let event_type = match object.get("type").and_then(Value::as_str) {
        Some("mobile") => EventType::Mobile,
        Some("fixed") => EventType::Fixed,
        _ => {
            return Err(ApiError::Validation(format!(
                "event '{}' must have type 'mobile' or 'fixed'",
                event_key
            )))
        }
    };

    let color_list = object.get("color").and_then(Value::as_array).ok_or_else(|| {
        ApiError::Validation(format!("event '{}' must have a color array", event_key))
    })?;
    if color_list.is_empty() {
        return Err(ApiError::Validation(format!(
            "event '{}' must have at least one color",
            event_key
        )));
    }
    let mut color = Vec::with_capacity(color_list.len());
    for entry in color_list {
        let token = entry.as_str().and_then(LiturgicalColor::parse).ok_or_else(|| {
            ApiError::Validation(format!(
                "event '{}' has an invalid color entry: {}",
                event_key, entry
            ))
        })?;
        color.push(token);
    }

    let i18n = validate_i18n(object.get("i18n"), &event_key)?;
    let readings = validate_readings(object.get("readings"), &event_key)?;

    Ok(ValidatedEvent {
        event: Event {
            event_key,
            grade,
            event_type,
            color,
        },
        i18n,
        readings,
    })
}

fn validate_i18n(value: Option<&Value>, event_key: &str) -> Result<BTreeMap<String, String>> {
    let mut i18n = BTreeMap::new();
    let Some(value) = value else {
        return Ok(i18n);
    };
    let map = value.as_object().ok_or_else(|| {
        ApiError::Validation(format!("event '{}' i18n must be a JSON object", event_key))
    })?;

    for (locale_name, name) in map {
        let canonical = locale::canonicalize(locale_name).ok_or_else(|| {
            ApiError::Validation(format!(
                "event '{}' i18n has invalid locale '{}'",
                event_key, locale_name
            ))
        })?;
        let name = name.as_str().ok_or_else(|| {
            ApiError::Validation(format!(
                "event '{}' i18n entry for '{}' must be a string",
                event_key, locale_name
            ))
        })?;
        i18n.insert(canonical, name.to_string());
    }
    Ok(i18n)
}

/// Validate the per-locale readings object. Each locale entry is either
/// year-keyed (every top-level key a label of the event's cycle, each
/// value matching the shape) or a single object matching the shape.
fn validate_readings(
    value: Option<&Value>,
    event_key: &str,
) -> Result<BTreeMap<String, ReadingsEntry>> {
    let mut readings = BTreeMap::new();
    let Some(value) = value else {
        return Ok(readings);
    };
    let map = value.as_object().ok_or_else(|| {
        ApiError::Validation(format!(
            "event '{}' readings must be a JSON object keyed by locale",
            event_key
        ))
    })?;

    let category = LectionaryCategory::of(event_key);
    let shape = ReadingsShape::of(event_key);

    for (locale_name, entry) in map {
        let canonical = locale::canonicalize(locale_name).ok_or_else(|| {
            ApiError::Validation(format!(
                "event '{}' readings has invalid locale '{}'",
                event_key, locale_name
            ))
        })?;

        let parsed = parse_readings_entry(event_key, category, shape, entry)?;
        readings.insert(canonical, parsed);
    }
    Ok(readings)
}

fn parse_readings_entry(
    event_key: &str,
    category: LectionaryCategory,
    shape: ReadingsShape,
    entry: &Value,
) -> Result<ReadingsEntry> {
    let cycle = category.cycle();

    if cycle != YearCycle::None {
        if let Some(map) = entry.as_object() {
            let mut years = Vec::with_capacity(map.len());
            for (label, value) in map {
                match cycle.canonical_label(label) {
                    Some(canonical) => years.push((canonical, value)),
                    None => {
                        years.clear();
                        break;
                    }
                }
            }
            if !years.is_empty() {
                let mut validated = Vec::with_capacity(years.len());
                for (canonical, value) in years {
                    shape.validate(value).map_err(|e| {
                        ApiError::Validation(format!(
                            "event '{}' readings for year {}: {}",
                            event_key, canonical, e
                        ))
                    })?;
                    validated.push((canonical, value.clone()));
                }
                return Ok(ReadingsEntry::YearKeyed(validated));
            }
        }
    }

    shape.validate(entry).map_err(|e| {
        ApiError::Validation(format!("event '{}' readings: {}", event_key, e))
    })?;
    Ok(ReadingsEntry::Flat(entry.clone()))
}

/// PUT per-event requirements beyond structure
fn require_put_fields(event: &ValidatedEvent, required_locale: &str) -> Result<()> {
    require_new_event_fields(event, required_locale)
}

/// PATCH per-event requirements: new keys behave like PUT, updates may
/// omit i18n and readings. Grade-0 rules hold regardless.
fn require_patch_fields(
    event: &ValidatedEvent,
    is_new: bool,
    required_locale: &str,
) -> Result<()> {
    if event.event.grade == 0 || is_new {
        return require_new_event_fields(event, required_locale);
    }
    Ok(())
}

fn require_new_event_fields(event: &ValidatedEvent, required_locale: &str) -> Result<()> {
    let key = &event.event.event_key;

    if event.event.grade == 0 {
        if !event.i18n.is_empty() {
            return Err(ApiError::Validation(format!(
                "ferial event '{}' must not carry i18n data",
                key
            )));
        }
        if event.readings.is_empty() {
            return Err(ApiError::Validation(format!(
                "ferial event '{}' must carry readings",
                key
            )));
        }
        return Ok(());
    }

    if !event.i18n.contains_key(required_locale) {
        return Err(ApiError::Validation(format!(
            "event '{}' must carry an i18n entry for locale '{}'",
            key, required_locale
        )));
    }
    if event.readings.is_empty() {
        return Err(ApiError::Validation(format!(
            "event '{}' must carry readings",
            key
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
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

        fn reconciler(&self) -> WriteReconciler<'_> {
            WriteReconciler::new(&self.store, &self.paths)
        }

        async fn read_map(&self, path: &std::path::Path) -> Map<String, Value> {
            self.store.read_object(path).await.unwrap().unwrap_or_default()
        }

        fn put_payload() -> Value {
            json!({
                "locales": ["en", "la"],
                "events": [
                    {
                        "event_key": "Easter",
                        "grade": 7,
                        "type": "mobile",
                        "color": ["white"],
                        "i18n": {"en": "Easter Sunday"},
                        "readings": {"en": {"A": festive("Mt 28:1"), "B": festive("Mk 16:1")}}
                    },
                    {
                        "event_key": "OrdWeekday1Monday",
                        "grade": 0,
                        "type": "mobile",
                        "color": ["green"],
                        "readings": {"en": {"I": ferial(), "II": ferial()}}
                    }
                ]
            })
        }
    }

    #[tokio::test]
    async fn test_put_splits_files_and_strips_core() {
        let fx = Fixture::new();
        let outcome = fx.reconciler().put(&Fixture::put_payload(), "en").await.unwrap();
        assert_eq!(outcome.stored, 1);
        assert_eq!(outcome.ferial, 1);

        // Core list holds only the stripped non-ferial event
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
        assert_eq!(core[0].event_key, "Easter");

        // i18n extracted per declared locale, with a placeholder where
        // no translation was supplied
        let en = fx.read_map(&fx.paths.i18n_file("en")).await;
        assert_eq!(en.get("Easter").unwrap(), "Easter Sunday");
        let la = fx.read_map(&fx.paths.i18n_file("la")).await;
        assert_eq!(la.get("Easter").unwrap(), "");
        assert!(!la.contains_key("OrdWeekday1Monday"));

        // Year-keyed readings split into per-year files
        let sundays = LectionaryCategory::SundaysSolemnities;
        let year_a = fx
            .read_map(&fx.paths.year_file(sundays, "A", "en").unwrap())
            .await;
        assert_eq!(year_a["Easter"]["gospel"], json!("Mt 28:1"));
        let ordinary = LectionaryCategory::WeekdaysOrdinary;
        let year_i = fx
            .read_map(&fx.paths.year_file(ordinary, "I", "en").unwrap())
            .await;
        assert!(year_i.contains_key("OrdWeekday1Monday"));
    }

    #[tokio::test]
    async fn test_put_conflict_leaves_stores_unchanged() {
        let fx = Fixture::new();
        fx.reconciler().put(&Fixture::put_payload(), "en").await.unwrap();

        let mut second = Fixture::put_payload();
        second["events"][0]["i18n"]["en"] = json!("Changed");
        let err = fx.reconciler().put(&second, "en").await.unwrap_err();
        assert_eq!(err.error_type(), "CONFLICT");

        let en = fx.read_map(&fx.paths.i18n_file("en")).await;
        assert_eq!(en.get("Easter").unwrap(), "Easter Sunday");
    }

    #[tokio::test]
    async fn test_put_accepts_empty_or_malformed_core_file() {
        let fx = Fixture::new();
        std::fs::write(fx.paths.core_file(), b"[]").unwrap();
        fx.reconciler().put(&Fixture::put_payload(), "en").await.unwrap();

        let fx2 = Fixture::new();
        std::fs::write(fx2.paths.core_file(), b"{ corrupt").unwrap();
        fx2.reconciler().put(&Fixture::put_payload(), "en").await.unwrap();
    }

    #[tokio::test]
    async fn test_put_validation_errors() {
        let fx = Fixture::new();
        let reconciler = fx.reconciler();

        let no_locales = json!({"locales": [], "events": [{}]});
        assert!(reconciler.put(&no_locales, "en").await.is_err());

        let regioned = json!({"locales": ["en_US"], "events": [{}]});
        let err = reconciler.put(&regioned, "en").await.unwrap_err();
        assert!(err.to_string().contains("region"));

        let mut duplicate = Fixture::put_payload();
        let first = duplicate["events"][0].clone();
        duplicate["events"].as_array_mut().unwrap().push(first);
        let err = reconciler.put(&duplicate, "en").await.unwrap_err();
        assert!(err.to_string().contains("duplicate"));

        // Non-ferial event missing the caller's locale translation
        let mut missing_locale = Fixture::put_payload();
        missing_locale["events"][0]["i18n"] = json!({"it": "Pasqua"});
        assert!(reconciler.put(&missing_locale, "en").await.is_err());

        // Ferial event carrying i18n
        let mut ferial_i18n = Fixture::put_payload();
        ferial_i18n["events"][1]["i18n"] = json!({"en": "Monday"});
        let err = reconciler.put(&ferial_i18n, "en").await.unwrap_err();
        assert!(err.to_string().contains("must not carry i18n"));

        // Readings failing shape validation
        let mut bad_readings = Fixture::put_payload();
        bad_readings["events"][0]["readings"]["en"]["A"]
            .as_object_mut()
            .unwrap()
            .remove("gospel");
        let err = reconciler.put(&bad_readings, "en").await.unwrap_err();
        assert!(err.to_string().contains("missing slot 'gospel'"));
    }

    #[tokio::test]
    async fn test_patch_adds_event_to_empty_calendar() {
        let fx = Fixture::new();
        let payload = json!({"events": [{
            "event_key": "TestFeast",
            "grade": 7,
            "type": "fixed",
            "color": ["white"],
            "i18n": {"en": "Test Feast"},
            "readings": {"en": festive("Jn 1:1")}
        }]});
        let outcome = fx.reconciler().patch(&payload, "en").await.unwrap();
        assert_eq!(outcome.added, 1);
        assert_eq!(outcome.updated, 0);

        // Flat readings for a cycled category land in the common file
        let common = fx
            .read_map(
                &fx.paths
                    .common_file(LectionaryCategory::SundaysSolemnities, "en"),
            )
            .await;
        assert_eq!(common["TestFeast"]["gospel"], json!("Jn 1:1"));
    }

    #[tokio::test]
    async fn test_patch_update_may_omit_i18n_and_readings() {
        let fx = Fixture::new();
        fx.reconciler().put(&Fixture::put_payload(), "en").await.unwrap();

        let payload = json!({"events": [{
            "event_key": "Easter",
            "grade": 7,
            "type": "mobile",
            "color": ["white", "red"]
        }]});
        let outcome = fx.reconciler().patch(&payload, "en").await.unwrap();
        assert_eq!(outcome.updated, 1);

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
        assert_eq!(core[0].color.len(), 2);
    }

    #[tokio::test]
    async fn test_patch_new_key_requires_i18n_and_readings() {
        let fx = Fixture::new();
        let payload = json!({"events": [{
            "event_key": "NewFeast",
            "grade": 5,
            "type": "fixed",
            "color": ["red"]
        }]});
        let err = fx.reconciler().patch(&payload, "en").await.unwrap_err();
        assert_eq!(err.error_type(), "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn test_patch_backfills_new_key_into_known_locales() {
        let fx = Fixture::new();
        fx.reconciler().put(&Fixture::put_payload(), "en").await.unwrap();

        let payload = json!({"events": [{
            "event_key": "NewFeast",
            "grade": 5,
            "type": "fixed",
            "color": ["red"],
            "i18n": {"en": "New Feast"},
            "readings": {"en": festive("Lk 1:1")}
        }]});
        fx.reconciler().patch(&payload, "en").await.unwrap();

        // The locale without a payload translation gains a placeholder
        let la = fx.read_map(&fx.paths.i18n_file("la")).await;
        assert_eq!(la.get("NewFeast").unwrap(), "");
        let en = fx.read_map(&fx.paths.i18n_file("en")).await;
        assert_eq!(en.get("NewFeast").unwrap(), "New Feast");
    }

    #[tokio::test]
    async fn test_patch_backfills_new_locale_with_existing_keys() {
        let fx = Fixture::new();
        fx.reconciler().put(&Fixture::put_payload(), "en").await.unwrap();

        let payload = json!({"events": [{
            "event_key": "Easter",
            "grade": 7,
            "type": "mobile",
            "color": ["white"],
            "i18n": {"it": "Pasqua"}
        }]});
        fx.reconciler().patch(&payload, "en").await.unwrap();

        let it = fx.read_map(&fx.paths.i18n_file("it")).await;
        assert_eq!(it.get("Easter").unwrap(), "Pasqua");
    }

    #[tokio::test]
    async fn test_i18n_consistency_invariant_after_patch_sequence() {
        let fx = Fixture::new();
        fx.reconciler().put(&Fixture::put_payload(), "en").await.unwrap();

        // Introduce a new locale and a new key in separate PATCHes
        fx.reconciler()
            .patch(
                &json!({"events": [{
                    "event_key": "Easter", "grade": 7, "type": "mobile",
                    "color": ["white"], "i18n": {"it": "Pasqua"}
                }]}),
                "en",
            )
            .await
            .unwrap();
        fx.reconciler()
            .patch(
                &json!({"events": [{
                    "event_key": "Pentecost", "grade": 7, "type": "mobile",
                    "color": ["red"],
                    "i18n": {"en": "Pentecost Sunday"},
                    "readings": {"en": {"vigil": festive("Jn 7:37"), "day": festive("Jn 20:19")}}
                }]}),
                "en",
            )
            .await
            .unwrap();

        // Every locale file now contains every non-ferial core key
        let core_keys = ["Easter", "Pentecost"];
        for locale_name in ["en", "la", "it"] {
            let map = fx.read_map(&fx.paths.i18n_file(locale_name)).await;
            for key in core_keys {
                assert!(
                    map.contains_key(key),
                    "locale '{}' is missing key '{}'",
                    locale_name,
                    key
                );
            }
        }
    }

    #[tokio::test]
    async fn test_backfill_directions_independently() {
        let fx = Fixture::new();
        let reconciler = fx.reconciler();

        // Forward: new keys into existing locales
        fx.store
            .merge_object(
                &fx.paths.i18n_file("en"),
                &[("Easter".to_string(), json!("Easter Sunday"))]
                    .into_iter()
                    .collect(),
            )
            .await
            .unwrap();
        let keys: BTreeSet<String> = ["Pentecost".to_string()].into();
        let locales: BTreeSet<String> = ["en".to_string()].into();
        reconciler.backfill_keys_into_locales(&keys, &locales).await.unwrap();
        let en = fx.read_map(&fx.paths.i18n_file("en")).await;
        assert_eq!(en.get("Pentecost").unwrap(), "");
        assert_eq!(en.get("Easter").unwrap(), "Easter Sunday");

        // Reverse: a new locale filled with existing keys
        let existing: BTreeSet<String> =
            ["Easter".to_string(), "Pentecost".to_string()].into();
        reconciler.backfill_locale_with_keys("pt", &existing).await.unwrap();
        let pt = fx.read_map(&fx.paths.i18n_file("pt")).await;
        assert_eq!(pt.len(), 2);
        assert!(pt.values().all(|v| v == ""));
    }

    #[tokio::test]
    async fn test_patch_ferial_event_never_touches_core() {
        let fx = Fixture::new();
        fx.reconciler().put(&Fixture::put_payload(), "en").await.unwrap();

        let payload = json!({"events": [{
            "event_key": "LentWeekday1Friday",
            "grade": 0,
            "type": "mobile",
            "color": ["purple"],
            "readings": {"en": ferial()}
        }]});
        let outcome = fx.reconciler().patch(&payload, "en").await.unwrap();
        assert_eq!(outcome.ferial, 1);
        assert_eq!(outcome.added, 0);

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
        assert!(core.iter().all(|e| e.event_key != "LentWeekday1Friday"));

        let lent = fx
            .read_map(&fx.paths.flat_file(LectionaryCategory::WeekdaysLent, "en"))
            .await;
        assert!(lent.contains_key("LentWeekday1Friday"));
    }

    #[tokio::test]
    async fn test_patch_then_read_round_trip() {
        use crate::temporale::assemble::ReadAssembler;
        use crate::temporale::names::TemplateNames;

        let fx = Fixture::new();
        let payload = json!({"events": [{
            "event_key": "TestFeast",
            "grade": 7,
            "type": "fixed",
            "color": ["white"],
            "i18n": {"en": "Test Feast"},
            "readings": {"en": festive("Jn 1:1")}
        }]});
        let outcome = fx.reconciler().patch(&payload, "en").await.unwrap();
        assert_eq!(outcome.added, 1);

        let names = TemplateNames;
        let calendar = ReadAssembler::new(&fx.store, &fx.paths, &names)
            .assemble("en")
            .await
            .unwrap();
        assert_eq!(calendar.events.len(), 1);

        let event = &calendar.events[0];
        assert_eq!(event.event_key, "TestFeast");
        assert_eq!(event.grade, 7);
        assert_eq!(event.name.as_deref(), Some("Test Feast"));
        // Flat readings, no annum wrapper: no year-cycle data was supplied
        let readings = event.readings.as_ref().unwrap();
        assert_eq!(readings["first_reading"], json!("Gen 1:1"));
        assert!(readings.get("annum_a").is_none());
    }

    #[tokio::test]
    async fn test_year_label_case_insensitive() {
        let fx = Fixture::new();
        let payload = json!({"events": [{
            "event_key": "ChristKing",
            "grade": 7,
            "type": "mobile",
            "color": ["white"],
            "i18n": {"en": "Christ the King"},
            "readings": {"en": {"a": festive("Mt 25:31"), "c": festive("Lk 23:35")}}
        }]});
        fx.reconciler().patch(&payload, "en").await.unwrap();

        let year_a = fx
            .read_map(
                &fx.paths
                    .year_file(LectionaryCategory::SundaysSolemnities, "A", "en")
                    .unwrap(),
            )
            .await;
        assert!(year_a.contains_key("ChristKing"));
    }
}
