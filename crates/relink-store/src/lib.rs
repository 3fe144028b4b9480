//! Relink Store -- the persistence substrate for the Relink game core.
//!
//! Everything the game remembers lives in an external string-keyed,
//! string-valued substrate, typically a single save file. This crate
//! provides:
//!
//! - [`backend::StorageBackend`] -- the substrate trait, with an in-memory
//!   implementation for tests and a single-file JSON implementation for
//!   real saves.
//! - [`codec`] -- the tagged-map wire shape keyed collections are encoded
//!   with (`{"dataType":"Map","value":[["k",v],...]}`).
//! - [`store::PersistentStore`] -- a keyed container whose every effective
//!   mutation is synchronously durable and observable.
//! - [`cell::PersistentCell`] -- a singleton persisted scalar.
//!
//! # Durability Contract
//!
//! A mutation that changes contents persists the full collection to the
//! backend *before* returning and records a change event for the
//! presentation layer to drain. A mutation that would not change contents
//! is a complete no-op: no backend write, no event.
//!
//! # Corruption Recovery
//!
//! Stores and cells fail closed. A malformed persisted value never
//! propagates a parse error upward: the container reinitializes to its
//! default, re-persists valid text, and reports the recovery as an event.
//! The persisted surface is a user-facing save file; losing one collection
//! beats losing the session.

pub mod backend;
pub mod cell;
pub mod codec;
pub mod store;
