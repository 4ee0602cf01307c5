//! Event types
//!
//! The core event list persists only `event_key`, `grade`, `type` and
//! `color`. Names and readings are denormalized in at read time from the
//! i18n and lectionary stores, and stripped back out before any write.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Highest liturgical grade (solemnity)
pub const MAX_GRADE: u8 = 7;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventType {
    Mobile,
    Fixed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LiturgicalColor {
    White,
    Red,
    Green,
    Purple,
    Rose,
    Black,
}

impl LiturgicalColor {
    /// Parse a color token as it appears in payloads
    pub fn parse(token: &str) -> Option<Self> {
        match token {
            "white" => Some(Self::White),
            "red" => Some(Self::Red),
            "green" => Some(Self::Green),
            "purple" => Some(Self::Purple),
            "rose" => Some(Self::Rose),
            "black" => Some(Self::Black),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::White => "white",
            Self::Red => "red",
            Self::Green => "green",
            Self::Purple => "purple",
            Self::Rose => "rose",
            Self::Black => "black",
        }
    }
}

/// A persisted core-list event. Grade-0 (ferial) events never appear here.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    pub event_key: String,
    pub grade: u8,
    #[serde(rename = "type")]
    pub event_type: EventType,
    pub color: Vec<LiturgicalColor>,
}

/// A denormalized event as returned by GET: the persisted attributes plus
/// the locale-resolved name and the assembled readings, when available.
#[derive(Debug, Clone, Serialize)]
pub struct TemporaleEvent {
    pub event_key: String,
    pub grade: u8,
    #[serde(rename = "type")]
    pub event_type: EventType,
    pub color: Vec<LiturgicalColor>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub readings: Option<Value>,
}

impl TemporaleEvent {
    pub fn from_core(event: Event) -> Self {
        Self {
            event_key: event.event_key,
            grade: event.grade,
            event_type: event.event_type,
            color: event.color,
            name: None,
            readings: None,
        }
    }
}
