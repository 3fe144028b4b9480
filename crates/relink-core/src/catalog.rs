//! Shipped game content: node roster, recipes, and the boot sequence.
//!
//! The world starts with a single reachable node -- Mithril, the vast
//! manufactory -- and one learnable recipe. Everything here is plain data
//! plus the first-run script; the mechanics live in the other modules.

use crate::behavior::NodeKind;
use crate::energy::MilliWatts;
use crate::error::GameResult;
use crate::node::{NodeSpec, NodeState};
use crate::presenter::Presenter;
use crate::recipe::{CraftEffect, RecipeDef};
use crate::session::Session;
use relink_store::backend::StorageBackend;

/// Narrative shown the very first time the session boots.
pub const WAKE_THOUGHT: &str =
    "You wake up. You're not sure how long it's been. You realize you can't feel anything.";

/// Narrative opening the first scan.
pub const SCAN_THOUGHT: &str =
    "Three Nodes remain. Only one is intact enough to respond to pings.";

/// Narrative closing the first scan.
pub const BATTERY_THOUGHT: &str =
    "Your batteries have almost entirely run dry. You'll have to work quickly.";

/// Energy granted on the first scan.
pub const FIRST_SCAN_ENERGY_MW: MilliWatts = 1420;

/// Scrap granted on the first scan.
pub const FIRST_SCAN_SCRAP: u32 = 3;

/// The Mithril node: the one intact manufactory.
pub fn mithril() -> NodeSpec {
    NodeSpec {
        id: "Mithril".to_string(),
        kind: NodeKind::Manufactory,
        conn_cost: 500,
        initial_upkeep: 0,
    }
}

/// The starting recipe: scrap in, steel and electronics out.
pub fn refine_scrap() -> RecipeDef {
    RecipeDef {
        display_name: "Refine Scrap".to_string(),
        time: 5000,
        inputs: vec![("Scrap".to_string(), 1)],
        output_desc: "Steel: 2-5, Electronics: 1".to_string(),
        effects: vec![
            CraftEffect::Grant {
                resource: "Steel".to_string(),
                min: 2,
                max: 5,
            },
            CraftEffect::Grant {
                resource: "Electronics".to_string(),
                min: 1,
                max: 1,
            },
        ],
    }
}

/// Register the shipped node roster on a fresh session.
pub fn install<B: StorageBackend>(session: &mut Session<B>) -> GameResult<()> {
    session.add_node(&mithril())
}

/// Boot the session: emit the wake narrative on the very first run, then
/// scan. Later boots restore silently and scan for new nodes.
pub fn boot<B: StorageBackend>(
    session: &mut Session<B>,
    presenter: &mut dyn Presenter,
) -> GameResult<()> {
    if !session.booted_before()? {
        presenter.thought(WAKE_THOUGHT);
        session.mark_booted()?;
    }
    scan(session, presenter)
}

/// Scan for nodes. The first scan runs the opening script: grants the
/// starting energy and scrap, surfaces Mithril, and teaches the starting
/// recipe. Repeat scans currently find nothing new.
pub fn scan<B: StorageBackend>(
    session: &mut Session<B>,
    presenter: &mut dyn Presenter,
) -> GameResult<()> {
    if session.scanned_before()? {
        return Ok(());
    }

    presenter.thought(SCAN_THOUGHT);
    session.set_energy(FIRST_SCAN_ENERGY_MW, presenter)?;
    session.reveal("Mithril", NodeState::Disabled, presenter)?;
    session.learn(refine_scrap(), presenter)?;
    session.credit_resource("Scrap", FIRST_SCAN_SCRAP, presenter)?;
    session.mark_scanned()?;
    presenter.thought(BATTERY_THOUGHT);
    Ok(())
}
