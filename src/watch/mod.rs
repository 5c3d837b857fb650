//! Watch runtime: change events, store rules and the notify-backed producer.

mod events;
mod rules;
mod runtime;

pub use events::{convert_event, ChangeEvent, ChangeKind, EventFilter};
pub use rules::EventRules;
pub use runtime::{produce, WatchRuntime};
