//! Reply content: the row-oriented table, its snapshot cache, and assembly
//! of stored message slots into outbound payloads.
//!
//! Flow: table file → [`ContentTable`] (parsed, indexed by action and name)
//! → [`ContentStore`] snapshot → [`assemble`] an entry's five slots.

pub mod assemble;
pub mod entry;
pub mod error;
pub mod store;
pub mod table;

pub use {
    assemble::{Decoded, MalformedPayload, SlotOutcome, SlotReport, assemble, decode_payload, inspect},
    entry::{ReplyEntry, SLOT_COUNT},
    error::{Error, Result},
    store::ContentStore,
    table::{ContentTable, REQUIRED_COLUMNS},
};
