//! Browser DOM layer for weaver-input.
//!
//! Turns a contenteditable root into a stream of [`weaver_input::ViewEvent`]s.
//! It assumes a `wasm32-unknown-unknown` target environment.
//!
//! # Architecture
//!
//! - `dom`: node references, UTF-16 offsets and the DOM selection
//! - `mutations`: DOM mutation records to input-core records
//! - `events`: keydown conversion
//! - `source`: mutation observer and listeners feeding an `EventChannel`
//!
//! # Re-exports
//!
//! This crate re-exports `weaver-input` for convenience, so consumers
//! only need to depend on `weaver-input-browser`.

pub use weaver_input;
pub use weaver_input::*;

pub mod dom;
pub mod events;
pub mod mutations;
pub mod source;

pub use dom::{node_ref, selection_hint, utf16_to_char_offset, window_selection_hint};
pub use events::key_event_from_dom;
pub use mutations::{convert_record, convert_records};
pub use source::{DomInputSource, SourceError};
