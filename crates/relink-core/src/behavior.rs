//! Per-entity behavior variants.
//!
//! Each variant is a [`NodeKind`] tag resolved through [`behavior`] to a
//! capability implementation: the one-time first-activation thought and
//! the build/teardown hooks for the entity's interactive surface. A
//! variant with no overrides still satisfies the full state machine
//! contract.

use crate::presenter::Presenter;
use serde::{Deserialize, Serialize};

/// Behavior variant tag. Serializable so data-driven content can name it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum NodeKind {
    /// Plain node: no interactive surface, fallback activation thought.
    #[default]
    Relay,
    /// Factory node: owns a resource ledger, known recipes, and a
    /// crafting surface.
    Manufactory,
}

/// Entity-specific hooks invoked around lifecycle transitions.
#[allow(unused_variables)]
pub trait NodeBehavior {
    /// Narrative text emitted the first time this node goes Alive.
    /// Deduplication happens in the presenter's `thought_once`.
    fn first_activation_thought(&self, node_id: &str) -> Option<String> {
        None
    }

    /// Invoked on entry into Alive, after the node renders.
    fn on_activate(&self, node_id: &str, presenter: &mut dyn Presenter) {}

    /// Invoked on exit from Alive, before the node re-renders.
    fn on_deactivate(&self, node_id: &str, presenter: &mut dyn Presenter) {}
}

/// Resolve a kind tag to its behavior implementation.
pub fn behavior(kind: NodeKind) -> &'static dyn NodeBehavior {
    match kind {
        NodeKind::Relay => &RelayBehavior,
        NodeKind::Manufactory => &ManufactoryBehavior,
    }
}

struct RelayBehavior;

impl NodeBehavior for RelayBehavior {
    fn first_activation_thought(&self, _node_id: &str) -> Option<String> {
        Some("I've never seen this node before. I wonder if my software has a bug...".to_string())
    }
}

struct ManufactoryBehavior;

impl NodeBehavior for ManufactoryBehavior {
    fn first_activation_thought(&self, _node_id: &str) -> Option<String> {
        Some(
            "Mithril used to be a bustling refinery and factory, but now the conveyors \
             are silent and the cauldrons run dry. It's time to change that."
                .to_string(),
        )
    }

    fn on_activate(&self, node_id: &str, presenter: &mut dyn Presenter) {
        presenter.build_surface(node_id);
    }

    fn on_deactivate(&self, node_id: &str, presenter: &mut dyn Presenter) {
        presenter.teardown_surface(node_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::presenter::NullPresenter;

    #[test]
    fn relay_has_fallback_thought_and_noop_hooks() {
        let b = behavior(NodeKind::Relay);
        assert!(b.first_activation_thought("Aurora").is_some());
        // Hooks are callable no-ops.
        let mut p = NullPresenter;
        b.on_activate("Aurora", &mut p);
        b.on_deactivate("Aurora", &mut p);
    }

    #[test]
    fn manufactory_thought_differs_from_relay() {
        let relay = behavior(NodeKind::Relay).first_activation_thought("x");
        let manu = behavior(NodeKind::Manufactory).first_activation_thought("x");
        assert_ne!(relay, manu);
    }

    #[test]
    fn kind_serializes_by_name() {
        let json = serde_json::to_string(&NodeKind::Manufactory).unwrap();
        assert_eq!(json, "\"Manufactory\"");
    }
}
