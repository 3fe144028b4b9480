//! Relink Core -- game semantics for the Relink persistent-state game.
//!
//! The game world is a set of dormant nodes the player reconnects by
//! spending energy, and a manufactory that turns owned resources into new
//! ones through learned recipes. Every piece of state is durably persisted
//! through [`relink_store`] the moment it changes; a fresh process restores
//! the whole session from the save surface.
//!
//! # Key Types
//!
//! - [`session::Session`] -- owns the backend and every store; exposes the
//!   inward operations (`connect`, `disconnect`, `learn`, `forget`,
//!   `craft`, energy access).
//! - [`node::NodeRecord`] -- per-entity lifecycle state machine
//!   (Hidden / Broken / Disabled / Alive) with write-once identity and
//!   connection cost.
//! - [`recipe::RecipeDef`] -- immutable crafting definition with effects
//!   modeled as serializable data, not closures.
//! - [`manufactory::Manufactory`] -- resource ledger, known-recipe
//!   registry, and the atomic crafting contract.
//! - [`energy::EnergyAccount`] -- the single spendable balance gating node
//!   connection, in milliwatts.
//! - [`presenter::Presenter`] -- the outward render/notify surface; the
//!   core calls it, never owns it.
//!
//! # Control Flow
//!
//! Bootstrap opens (or first-initializes) the persisted state, node
//! records restore themselves, and from then on every user-facing event
//! (connect, disconnect, learn, craft) runs to completion on the single
//! thread, persisting as it goes and notifying the presenter.

pub mod behavior;
pub mod catalog;
#[cfg(feature = "data-loader")]
pub mod data_loader;
pub mod energy;
pub mod error;
pub mod format;
pub mod ledger;
pub mod manufactory;
pub mod node;
pub mod presenter;
pub mod recipe;
pub mod rng;
pub mod session;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
