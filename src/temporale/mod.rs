//! Temporale engine
//!
//! The synchronization core of the calendar API: classification of event
//! keys, readings shape validation, locale resolution, the denormalizing
//! read assembler, and the write/delete reconcilers that keep the core
//! event list, per-locale i18n files and lectionary files consistent.

pub mod assemble;
pub mod classifier;
pub mod delete;
pub mod event;
pub mod locale;
pub mod names;
pub mod readings;
pub mod reconcile;

pub use assemble::{AssembledCalendar, ReadAssembler};
pub use classifier::{LectionaryCategory, Season, YearCycle};
pub use delete::{DeleteOutcome, DeleteReconciler};
pub use event::{Event, EventType, LiturgicalColor, TemporaleEvent};
pub use locale::{canonicalize, lectionary_locale, select_locale, LATIN};
pub use names::{NameGenerator, TemplateNames};
pub use readings::ReadingsShape;
pub use reconcile::{PatchOutcome, PutOutcome, WriteReconciler};
