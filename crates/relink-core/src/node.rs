//! Per-entity lifecycle state machine.
//!
//! Each node persists its own state and upkeep under `node.<id>.state` and
//! `node.<id>.upkeep`. Identity and connection cost are write-once: the
//! fields are private with getters only, so reassignment is a compile
//! error rather than a runtime check.
//!
//! The disconnect confirmation is an explicit two-state sub-machine
//! (`Idle` / `PendingConfirm`) driven purely by confirm/cancel events --
//! no timers, no display coupling -- so the anti-accidental-action guard
//! is unit-testable headless.

use crate::behavior::NodeKind;
use crate::energy::MilliWatts;
use crate::error::{GameError, GameResult};
use crate::rng::SimRng;
use relink_store::backend::StorageBackend;
use relink_store::cell::{CellEvent, PersistentCell};
use serde::{Deserialize, Serialize};

/// Lifecycle state of a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NodeState {
    /// Not surfaced to the player at all.
    Hidden,
    /// Surfaced but inert; leaving requires an out-of-scope repair.
    Broken,
    /// Surfaced and connectable.
    Disabled,
    /// Fully interactive; accrues upkeep.
    Alive,
}

impl NodeState {
    /// Parse the persisted text form, rejecting anything outside the
    /// enumeration.
    pub fn parse(text: &str) -> Option<Self> {
        match text {
            "Hidden" => Some(Self::Hidden),
            "Broken" => Some(Self::Broken),
            "Disabled" => Some(Self::Disabled),
            "Alive" => Some(Self::Alive),
            _ => None,
        }
    }
}

/// Display strings shown on a Broken node's connection panel.
pub const CONNECTION_ERROR_REASONS: [&str; 3] = [
    "ERR_CONN: IMPEDANCE OUTSIDE TOLERANCE",
    "ERR_CONN: SIGNAL CHECKSUM INVALID",
    "ERR_CONN: ADC REPORTED -INFINITY",
];

/// Pick the reason a Broken node's panel shows. Presenters call this when
/// rendering the Broken state.
pub fn connection_error_reason(rng: &mut SimRng) -> &'static str {
    let index = rng.range_inclusive(0, CONNECTION_ERROR_REASONS.len() as u32 - 1);
    CONNECTION_ERROR_REASONS[index as usize]
}

/// Two-phase disconnect confirmation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConfirmState {
    #[default]
    Idle,
    PendingConfirm,
}

/// Construction parameters for a node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeSpec {
    /// Identity; write-once.
    pub id: String,
    /// Behavior variant.
    pub kind: NodeKind,
    /// Cost to connect, in mW; write-once ("will not increase").
    pub conn_cost: MilliWatts,
    /// Upkeep installed when no persisted value exists.
    pub initial_upkeep: MilliWatts,
}

/// A node's persisted record. Exclusively owns its backend entries; no
/// other component writes them.
#[derive(Debug)]
pub struct NodeRecord {
    id: String,
    kind: NodeKind,
    conn_cost: MilliWatts,
    state: PersistentCell<NodeState>,
    upkeep: PersistentCell<MilliWatts>,
    confirm: ConfirmState,
}

impl NodeRecord {
    /// Restore a node from the backend, or initialize it to
    /// `{ state: Hidden, upkeep: spec.initial_upkeep }` and persist that.
    /// Corrupt persisted text self-heals to those same defaults.
    pub fn open(backend: &mut dyn StorageBackend, spec: &NodeSpec) -> GameResult<Self> {
        let state = PersistentCell::open_or(
            backend,
            format!("node.{}.state", spec.id),
            NodeState::Hidden,
        )?;
        let upkeep = PersistentCell::open_or(
            backend,
            format!("node.{}.upkeep", spec.id),
            spec.initial_upkeep,
        )?;
        Ok(Self {
            id: spec.id.clone(),
            kind: spec.kind,
            conn_cost: spec.conn_cost,
            state,
            upkeep,
            confirm: ConfirmState::Idle,
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn kind(&self) -> NodeKind {
        self.kind
    }

    pub fn conn_cost(&self) -> MilliWatts {
        self.conn_cost
    }

    pub fn state(&self) -> NodeState {
        *self.state.get()
    }

    pub fn upkeep(&self) -> MilliWatts {
        *self.upkeep.get()
    }

    pub fn confirm_state(&self) -> ConfirmState {
        self.confirm
    }

    /// Set the lifecycle state. Setting the current state is a complete
    /// no-op (no persist, no event); returns whether anything changed.
    pub fn set_state(
        &mut self,
        backend: &mut dyn StorageBackend,
        state: NodeState,
    ) -> GameResult<bool> {
        Ok(self.state.set_if_changed(backend, state)?)
    }

    /// Set the upkeep cost. Always persists; upkeep is expected to change
    /// through upgrade actions and always re-renders.
    pub fn set_upkeep(
        &mut self,
        backend: &mut dyn StorageBackend,
        upkeep: MilliWatts,
    ) -> GameResult<()> {
        self.upkeep.set(backend, upkeep)?;
        Ok(())
    }

    /// Phase 1 of disconnect: arm the pending confirmation. Requires an
    /// Alive node; arming twice is a no-op.
    pub fn arm_disconnect(&mut self) -> GameResult<()> {
        if self.state() != NodeState::Alive {
            return Err(GameError::WrongState {
                node: self.id.clone(),
                state: self.state(),
                required: NodeState::Alive,
            });
        }
        self.confirm = ConfirmState::PendingConfirm;
        Ok(())
    }

    /// Cancel an armed disconnect; the node stays Alive untouched.
    pub fn cancel_disconnect(&mut self) -> GameResult<()> {
        if self.confirm != ConfirmState::PendingConfirm {
            return Err(GameError::ConfirmNotPending(self.id.clone()));
        }
        self.confirm = ConfirmState::Idle;
        Ok(())
    }

    /// Consume an armed confirmation. The caller performs the actual
    /// Alive -> Disabled transition afterwards.
    pub fn take_confirmation(&mut self) -> GameResult<()> {
        if self.confirm != ConfirmState::PendingConfirm {
            return Err(GameError::ConfirmNotPending(self.id.clone()));
        }
        self.confirm = ConfirmState::Idle;
        Ok(())
    }

    /// Drain change/recovery events from both persisted cells.
    pub fn drain_events(&mut self) -> Vec<CellEvent> {
        let mut events = self.state.drain_events();
        events.extend(self.upkeep.drain_events());
        events
    }
}
