//! Readings shapes and validation
//!
//! Each event key maps to exactly one of nine named shapes. A shape fixes
//! the set of reading slots a lectionary entry must carry, either flat or
//! nested one level (vigil/day, the four Christmas masses, etc.).
//! Validation is exact set equality at every checked level: no missing
//! slots, no extras, every leaf a string.

use regex::Regex;
use serde_json::Value;
use std::sync::LazyLock;

/// The five slots of a festive (Sunday/solemnity) set of readings
const FESTIVE_SLOTS: [&str; 5] = [
    "first_reading",
    "responsorial_psalm",
    "second_reading",
    "gospel_acclamation",
    "gospel",
];

/// The four slots of a ferial (weekday) set of readings
const FERIAL_SLOTS: [&str; 4] = [
    "first_reading",
    "responsorial_psalm",
    "gospel_acclamation",
    "gospel",
];

const EASTER_VIGIL_SLOTS: [&str; 18] = [
    "first_reading",
    "responsorial_psalm_1",
    "second_reading",
    "responsorial_psalm_2",
    "third_reading",
    "responsorial_psalm_3",
    "fourth_reading",
    "responsorial_psalm_4",
    "fifth_reading",
    "responsorial_psalm_5",
    "sixth_reading",
    "responsorial_psalm_6",
    "seventh_reading",
    "responsorial_psalm_7",
    "epistle",
    "responsorial_psalm",
    "gospel_acclamation",
    "gospel",
];

const PALM_SUNDAY_SLOTS: [&str; 6] = [
    "procession_gospel",
    "first_reading",
    "responsorial_psalm",
    "second_reading",
    "gospel_acclamation",
    "gospel",
];

const CHRISTMAS_MASSES: [&str; 4] = ["vigil", "night", "dawn", "day"];
const VIGIL_DAY: [&str; 2] = ["vigil", "day"];
const DAY_EVENING: [&str; 2] = ["day", "evening"];
const SCHEMAS: [&str; 2] = ["schema_1", "schema_2"];

/// Keys celebrated with a vigil Mass distinct from the day Mass
const FESTIVE_WITH_VIGIL_KEYS: [&str; 2] = ["Pentecost", "Epiphany"];
/// Keys with a morning and an evening liturgy
const WITH_EVENING_KEYS: [&str; 1] = ["HolyThursday"];
/// Memorials offering alternative reading schemas
const MULTIPLE_SCHEMAS_KEYS: [&str; 2] = ["ImmaculateHeart", "MaryMotherChurch"];

static SEASONAL_KEY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(DecWeekday|DayBeforeEpiphany|DayAfterEpiphany)").unwrap()
});
static FERIAL_KEY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(Advent|Christmas|Lent|Easter|Ord)Weekday").unwrap()
});

/// The expected structure of a readings object for one event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadingsShape {
    Festive,
    Ferial,
    Christmas,
    FestiveWithVigil,
    EasterVigil,
    PalmSunday,
    WithEvening,
    MultipleSchemas,
    Seasonal,
}

impl ReadingsShape {
    /// Determine the shape of an event key. Exception lists are checked
    /// first, then the seasonal and ferial weekday patterns; everything
    /// else is festive.
    pub fn of(event_key: &str) -> Self {
        match event_key {
            "Christmas" => return Self::Christmas,
            "EasterVigil" => return Self::EasterVigil,
            "PalmSun" => return Self::PalmSunday,
            _ => {}
        }
        if FESTIVE_WITH_VIGIL_KEYS.contains(&event_key) {
            Self::FestiveWithVigil
        } else if WITH_EVENING_KEYS.contains(&event_key) {
            Self::WithEvening
        } else if MULTIPLE_SCHEMAS_KEYS.contains(&event_key) {
            Self::MultipleSchemas
        } else if SEASONAL_KEY.is_match(event_key) {
            Self::Seasonal
        } else if FERIAL_KEY.is_match(event_key) {
            Self::Ferial
        } else {
            Self::Festive
        }
    }

    /// Expected top-level slot names, in liturgical order
    pub fn slots(&self) -> &'static [&'static str] {
        match self {
            Self::Festive => &FESTIVE_SLOTS,
            Self::Ferial | Self::Seasonal => &FERIAL_SLOTS,
            Self::EasterVigil => &EASTER_VIGIL_SLOTS,
            Self::PalmSunday => &PALM_SUNDAY_SLOTS,
            Self::Christmas => &CHRISTMAS_MASSES,
            Self::FestiveWithVigil => &VIGIL_DAY,
            Self::WithEvening => &DAY_EVENING,
            Self::MultipleSchemas => &SCHEMAS,
        }
    }

    /// For nested shapes, the slot names each inner object must carry
    pub fn inner_slots(&self) -> Option<&'static [&'static str]> {
        match self {
            Self::Christmas | Self::FestiveWithVigil | Self::WithEvening => Some(&FESTIVE_SLOTS),
            Self::MultipleSchemas => Some(&FERIAL_SLOTS),
            _ => None,
        }
    }

    pub fn is_nested(&self) -> bool {
        self.inner_slots().is_some()
    }

    /// Validate a candidate readings object against this shape.
    ///
    /// Returns the first problem found, described precisely enough for a
    /// caller to fix the payload.
    pub fn validate(&self, candidate: &Value) -> std::result::Result<(), String> {
        let map = candidate
            .as_object()
            .ok_or_else(|| "readings must be a JSON object".to_string())?;

        check_key_set(map.keys(), self.slots(), "readings")?;

        match self.inner_slots() {
            None => {
                for (slot, value) in map {
                    if !value.is_string() {
                        return Err(format!("reading slot '{}' must be a string", slot));
                    }
                }
            }
            Some(inner) => {
                for (outer, value) in map {
                    let inner_map = value.as_object().ok_or_else(|| {
                        format!("reading section '{}' must be a JSON object", outer)
                    })?;
                    check_key_set(inner_map.keys(), inner, outer)?;
                    for (slot, leaf) in inner_map {
                        if !leaf.is_string() {
                            return Err(format!(
                                "reading slot '{}.{}' must be a string",
                                outer, slot
                            ));
                        }
                    }
                }
            }
        }

        Ok(())
    }

    pub fn is_valid(&self, candidate: &Value) -> bool {
        self.validate(candidate).is_ok()
    }
}

/// Exact set equality in both directions: report missing slots before
/// unexpected ones so error messages point at the likelier mistake.
fn check_key_set<'a>(
    present: impl Iterator<Item = &'a String> + Clone,
    expected: &'static [&'static str],
    context: &str,
) -> std::result::Result<(), String> {
    for slot in expected {
        if !present.clone().any(|k| k == slot) {
            return Err(format!("{} is missing slot '{}'", context, slot));
        }
    }
    for key in present {
        if !expected.contains(&key.as_str()) {
            return Err(format!("{} has unexpected slot '{}'", context, key));
        }
    }
    Ok(())
}
