//! Read assembly
//!
//! Builds the denormalized GET response: core events decorated with the
//! locale's display names and with readings drawn from the sanctorum,
//! ferial or year-cycle stores, plus synthesized grade-0 ferial events
//! that exist only in lectionary data.
//!
//! Reads degrade gracefully per file: a missing or corrupt locale file
//! contributes nothing and is never surfaced to the caller. Only a
//! missing core event list is an error.

use serde_json::{Map, Value};
use std::collections::BTreeSet;
use tracing::{debug, warn};

use crate::store::{CalendarPaths, JsonStore};
use crate::temporale::classifier::LectionaryCategory;
use crate::temporale::event::{Event, EventType, TemporaleEvent};
use crate::temporale::locale;
use crate::temporale::names::NameGenerator;
use crate::types::{ApiError, Result};

/// Year labels of the Sunday/Solemnity cycle as they appear in the
/// assembled response
const ANNUM_KEYS: [(&str, &str); 3] = [("A", "annum_a"), ("B", "annum_b"), ("C", "annum_c")];

/// The assembled GET response body
#[derive(Debug, serde::Serialize)]
pub struct AssembledCalendar {
    pub events: Vec<TemporaleEvent>,
    pub locale: String,
}

pub struct ReadAssembler<'a> {
    store: &'a JsonStore,
    paths: &'a CalendarPaths,
    names: &'a dyn NameGenerator,
}

impl<'a> ReadAssembler<'a> {
    pub fn new(store: &'a JsonStore, paths: &'a CalendarPaths, names: &'a dyn NameGenerator) -> Self {
        Self { store, paths, names }
    }

    /// Assemble the denormalized event list for a resolved display locale
    pub async fn assemble(&self, display_locale: &str) -> Result<AssembledCalendar> {
        let core_events = self.load_core().await?;
        let existing_keys: BTreeSet<String> =
            core_events.iter().map(|e| e.event_key.clone()).collect();

        let i18n = self
            .store
            .read_object_lenient(&self.paths.i18n_file(display_locale))
            .await;

        let lectionary_available = self.paths.lectionary_locales().await;
        let lectionary = match locale::lectionary_locale(display_locale, &lectionary_available) {
            Some(lect_locale) => Some(self.load_lectionary(&lect_locale).await),
            None => {
                debug!("No lectionary locale available; events returned without readings");
                None
            }
        };

        let mut events: Vec<TemporaleEvent> = core_events
            .into_iter()
            .map(|event| self.decorate(event, &i18n, lectionary.as_ref()))
            .collect();

        if let Some(ref stores) = lectionary {
            events.extend(derive_ferial_events(
                &stores.ferial,
                &existing_keys,
                display_locale,
                self.names,
                &i18n,
            ));
        }

        Ok(AssembledCalendar {
            events,
            locale: display_locale.to_string(),
        })
    }

    /// Load and decode the core event list.
    ///
    /// A missing file is NotFound. An undecodable file is treated the
    /// same way: the write path regards malformed core data as "no
    /// existing data", and reads mirror that.
    async fn load_core(&self) -> Result<Vec<Event>> {
        let path = self.paths.core_file();
        let value = match self.store.read(&path).await {
            Ok(Some(v)) => v,
            Ok(None) => {
                return Err(ApiError::NotFound("temporale data not found".to_string()))
            }
            Err(e) if matches!(e, crate::store::StoreError::Malformed { .. }) => {
                warn!("Core event file is malformed, treating as absent: {}", e);
                return Err(ApiError::NotFound("temporale data not found".to_string()));
            }
            Err(e) => return Err(ApiError::ServiceUnavailable(e.to_string())),
        };

        match serde_json::from_value::<Vec<Event>>(value.as_ref().clone()) {
            Ok(events) => Ok(events),
            Err(e) => {
                warn!("Core event file does not decode, treating as absent: {}", e);
                Err(ApiError::NotFound("temporale data not found".to_string()))
            }
        }
    }

    /// Load the three lectionary stores for a resolved lectionary locale:
    /// the Sunday/Solemnity year maps, the sanctorum map, the common map,
    /// and the merged ferial map (flat weekday categories plus Ordinary
    /// Time folded under annum_I/annum_II).
    async fn load_lectionary(&self, lect_locale: &str) -> LectionaryStores {
        let sundays = LectionaryCategory::SundaysSolemnities;
        let mut years = Vec::with_capacity(ANNUM_KEYS.len());
        for (label, _) in ANNUM_KEYS {
            let map = match self.paths.year_file(sundays, label, lect_locale) {
                Ok(path) => self.store.read_object_lenient(&path).await,
                Err(_) => Map::new(),
            };
            years.push(map);
        }

        let sanctorum = self
            .store
            .read_object_lenient(&self.paths.flat_file(LectionaryCategory::Sanctorum, lect_locale))
            .await;

        let common = self
            .store
            .read_object_lenient(&self.paths.common_file(sundays, lect_locale))
            .await;

        let mut ferial = Map::new();
        for category in [
            LectionaryCategory::WeekdaysAdvent,
            LectionaryCategory::WeekdaysChristmas,
            LectionaryCategory::WeekdaysLent,
            LectionaryCategory::WeekdaysEaster,
        ] {
            let map = self
                .store
                .read_object_lenient(&self.paths.flat_file(category, lect_locale))
                .await;
            for (key, value) in map {
                ferial.insert(key, value);
            }
        }

        let ordinary = LectionaryCategory::WeekdaysOrdinary;
        for label in ["I", "II"] {
            let map = match self.paths.year_file(ordinary, label, lect_locale) {
                Ok(path) => self.store.read_object_lenient(&path).await,
                Err(_) => Map::new(),
            };
            for (key, value) in map {
                let entry = ferial
                    .entry(key)
                    .or_insert_with(|| Value::Object(Map::new()));
                if let Some(wrapper) = entry.as_object_mut() {
                    wrapper.insert(format!("annum_{}", label), value);
                }
            }
        }

        // Ordinary entries stored without year data attach flat
        let ordinary_common = self
            .store
            .read_object_lenient(&self.paths.common_file(ordinary, lect_locale))
            .await;
        for (key, value) in ordinary_common {
            ferial.entry(key).or_insert(value);
        }

        LectionaryStores {
            years,
            sanctorum,
            common,
            ferial,
        }
    }

    fn decorate(
        &self,
        event: Event,
        i18n: &Map<String, Value>,
        lectionary: Option<&LectionaryStores>,
    ) -> TemporaleEvent {
        let mut assembled = TemporaleEvent::from_core(event);

        if let Some(name) = i18n.get(&assembled.event_key).and_then(Value::as_str) {
            if !name.is_empty() {
                assembled.name = Some(name.to_string());
            }
        }

        if let Some(stores) = lectionary {
            assembled.readings = stores.readings_for(&assembled.event_key);
        }

        assembled
    }
}

struct LectionaryStores {
    /// Sunday/Solemnity maps in A, B, C order
    years: Vec<Map<String, Value>>,
    sanctorum: Map<String, Value>,
    common: Map<String, Value>,
    /// Merged weekday readings: flat entries for the seasonal weekday
    /// categories, annum_I/annum_II wrappers for Ordinary Time
    ferial: Map<String, Value>,
}

impl LectionaryStores {
    /// Choose readings for one event key.
    ///
    /// Sanctorum-stored temporale events (ImmaculateHeart) attach their
    /// sanctorum entry directly, flat, with no year wrapper. Ferial and
    /// common entries also attach flat. Everything else gets an annum_*
    /// wrapper built from whichever year maps carry the key.
    fn readings_for(&self, event_key: &str) -> Option<Value> {
        if LectionaryCategory::of(event_key) == LectionaryCategory::Sanctorum {
            if let Some(entry) = self.sanctorum.get(event_key) {
                return Some(entry.clone());
            }
        }

        if let Some(entry) = self.ferial.get(event_key) {
            return Some(entry.clone());
        }

        if let Some(entry) = self.common.get(event_key) {
            return Some(entry.clone());
        }

        let mut wrapper = Map::new();
        for (index, (_, annum_key)) in ANNUM_KEYS.iter().enumerate() {
            if let Some(entry) = self.years[index].get(event_key) {
                wrapper.insert(annum_key.to_string(), entry.clone());
            }
        }
        if wrapper.is_empty() {
            None
        } else {
            Some(Value::Object(wrapper))
        }
    }
}

/// Synthesize grade-0 events for every ferial key present in the merged
/// ferial map but absent from the core event list.
///
/// Pure over its inputs: the caller supplies the map and the existing
/// key set. Names come from the generator, falling back to an i18n
/// lookup (ferial keys are not expected to have i18n entries, but a
/// translation supplied anyway wins over nothing).
pub fn derive_ferial_events(
    ferial: &Map<String, Value>,
    existing_keys: &BTreeSet<String>,
    display_locale: &str,
    names: &dyn NameGenerator,
    i18n: &Map<String, Value>,
) -> Vec<TemporaleEvent> {
    let mut events = Vec::new();

    for (key, readings) in ferial {
        if existing_keys.contains(key) {
            continue;
        }
        let category = LectionaryCategory::of(key);
        if !category.is_ferial() {
            continue;
        }
        let Some(color) = category.season_color() else {
            continue;
        };

        let name = names.generate(display_locale, key).or_else(|| {
            i18n.get(key)
                .and_then(Value::as_str)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
        });

        events.push(TemporaleEvent {
            event_key: key.clone(),
            grade: 0,
            event_type: EventType::Mobile,
            color: vec![color],
            name,
            readings: Some(readings.clone()),
        });
    }

    events
}
