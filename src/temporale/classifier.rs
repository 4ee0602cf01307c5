//! Event key classification
//!
//! Maps an event key to its lectionary storage category, its liturgical
//! season and its year-cycle arity. Classification is a pure, total
//! function of the key: pattern lists are checked in a fixed priority
//! order, first match wins, and unmatched keys fall back to documented
//! defaults. Adding a new event key needs no code change unless it belongs
//! to the explicit Sanctorum list.

use regex::Regex;
use std::sync::LazyLock;

use crate::temporale::event::LiturgicalColor;
use crate::types::{ApiError, Result};

static ADVENT_WEEKDAY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(AdventWeekday|DecWeekday)").unwrap());
static CHRISTMAS_WEEKDAY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(ChristmasWeekday|DayBeforeEpiphany|DayAfterEpiphany)").unwrap()
});
static LENT_WEEKDAY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(LentWeekday|HolyWeek(Mon|Tue|Wed))").unwrap());
static EASTER_WEEKDAY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^EasterWeekday").unwrap());
static ORDINARY_WEEKDAY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^OrdWeekday").unwrap());

/// Temporale events whose readings live in the Sanctorum store.
/// ImmaculateHeart is the canonical case: a temporale celebration whose
/// lectionary data has always shipped with the saints' cycle.
pub const SANCTORUM_KEYS: [&str; 2] = ["ImmaculateHeart", "MaryMotherChurch"];

/// Year-cycle arity of a lectionary category
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum YearCycle {
    /// Flat storage, single file per locale
    None,
    /// Sunday/Solemnity rotation, years A/B/C
    ThreeYear,
    /// Ordinary Time weekday rotation, years I/II
    TwoYear,
}

impl YearCycle {
    /// Canonical labels for this cycle, in rotation order
    pub fn labels(&self) -> &'static [&'static str] {
        match self {
            Self::None => &[],
            Self::ThreeYear => &["A", "B", "C"],
            Self::TwoYear => &["I", "II"],
        }
    }

    /// Canonicalize a year label, case-insensitively.
    /// Only the labels of this cycle are accepted.
    pub fn canonical_label(&self, label: &str) -> Option<&'static str> {
        self.labels()
            .iter()
            .find(|l| l.eq_ignore_ascii_case(label))
            .copied()
    }
}

/// Storage category of a lectionary entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LectionaryCategory {
    SundaysSolemnities,
    WeekdaysAdvent,
    WeekdaysChristmas,
    WeekdaysLent,
    WeekdaysEaster,
    WeekdaysOrdinary,
    Sanctorum,
}

impl LectionaryCategory {
    /// Classify an event key. Pure and total: every key maps to exactly
    /// one category, defaulting to Sundays/Solemnities.
    pub fn of(event_key: &str) -> Self {
        if ADVENT_WEEKDAY.is_match(event_key) {
            Self::WeekdaysAdvent
        } else if CHRISTMAS_WEEKDAY.is_match(event_key) {
            Self::WeekdaysChristmas
        } else if LENT_WEEKDAY.is_match(event_key) {
            Self::WeekdaysLent
        } else if EASTER_WEEKDAY.is_match(event_key) {
            Self::WeekdaysEaster
        } else if ORDINARY_WEEKDAY.is_match(event_key) {
            Self::WeekdaysOrdinary
        } else if SANCTORUM_KEYS.contains(&event_key) {
            Self::Sanctorum
        } else {
            Self::SundaysSolemnities
        }
    }

    /// Folder name of this category under the lectionary directory
    pub fn folder(&self) -> &'static str {
        match self {
            Self::SundaysSolemnities => "sundays_solemnities",
            Self::WeekdaysAdvent => "weekdays_advent",
            Self::WeekdaysChristmas => "weekdays_christmas",
            Self::WeekdaysLent => "weekdays_lent",
            Self::WeekdaysEaster => "weekdays_easter",
            Self::WeekdaysOrdinary => "weekdays_ordinary",
            Self::Sanctorum => "sanctorum",
        }
    }

    pub fn cycle(&self) -> YearCycle {
        match self {
            Self::SundaysSolemnities => YearCycle::ThreeYear,
            Self::WeekdaysOrdinary => YearCycle::TwoYear,
            _ => YearCycle::None,
        }
    }

    /// Whether events of this category are ferial (grade-0 weekdays that
    /// exist only in lectionary data, never in the core event list)
    pub fn is_ferial(&self) -> bool {
        matches!(
            self,
            Self::WeekdaysAdvent
                | Self::WeekdaysChristmas
                | Self::WeekdaysLent
                | Self::WeekdaysEaster
                | Self::WeekdaysOrdinary
        )
    }

    /// Fixed seasonal color used when synthesizing ferial events
    pub fn season_color(&self) -> Option<LiturgicalColor> {
        match self {
            Self::WeekdaysAdvent | Self::WeekdaysLent => Some(LiturgicalColor::Purple),
            Self::WeekdaysChristmas | Self::WeekdaysEaster => Some(LiturgicalColor::White),
            Self::WeekdaysOrdinary => Some(LiturgicalColor::Green),
            _ => None,
        }
    }

    /// Subfolder for a year label of a cycled category.
    ///
    /// Calling this on a flat category, or with a label outside the
    /// cycle's alphabet, is a caller bug and fails loudly.
    pub fn year_folder(&self, label: &str) -> Result<String> {
        let cycle = self.cycle();
        if cycle == YearCycle::None {
            return Err(ApiError::Internal(format!(
                "category {} has no year cycle",
                self.folder()
            )));
        }
        let canonical = cycle.canonical_label(label).ok_or_else(|| {
            ApiError::Internal(format!(
                "invalid year label '{}' for category {}",
                label,
                self.folder()
            ))
        })?;
        Ok(format!("{}/{}", self.folder(), canonical))
    }
}

/// Liturgical season of an event key
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Season {
    Advent,
    Christmas,
    Lent,
    Easter,
    OrdinaryTime,
}

static ADVENT_SEASON: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(Advent|DecWeekday)").unwrap());
static CHRISTMAS_SEASON: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(Christmas|MotherGod|Epiphany|DayBeforeEpiphany|DayAfterEpiphany|BaptismLord|HolyFamily)")
        .unwrap()
});
static LENT_SEASON: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(Lent|AshWednesday|PalmSun|HolyWeek|HolyThurs|GoodFri|HolySat)").unwrap()
});
static EASTER_SEASON: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(Easter|DivineMercy|Ascension|Pentecost)").unwrap()
});

impl Season {
    /// Classify an event key's season, defaulting to Ordinary Time
    pub fn of(event_key: &str) -> Self {
        if ADVENT_SEASON.is_match(event_key) {
            Self::Advent
        } else if CHRISTMAS_SEASON.is_match(event_key) {
            Self::Christmas
        } else if LENT_SEASON.is_match(event_key) {
            Self::Lent
        } else if EASTER_SEASON.is_match(event_key) {
            Self::Easter
        } else {
            Self::OrdinaryTime
        }
    }
}
