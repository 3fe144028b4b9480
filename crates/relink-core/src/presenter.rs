//! Outward render/notify surface.
//!
//! The core never owns a display. Everything user-visible goes through
//! this trait, implemented by the presentation layer; every method has a
//! no-op default so headless code and tests run against a bare impl.

use crate::energy::MilliWatts;
use crate::node::NodeState;

/// Snapshot of a node handed to the presenter for rendering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeView {
    pub id: String,
    pub state: NodeState,
    pub conn_cost: MilliWatts,
    pub upkeep: MilliWatts,
}

/// The presentation layer's inbound surface.
#[allow(unused_variables)]
pub trait Presenter {
    /// Render (or re-render) a surfaced node.
    fn render_node(&mut self, view: &NodeView) {}

    /// Remove a node that went Hidden from the display.
    fn remove_node(&mut self, node_id: &str) {}

    /// Transient error indicator on a failed connect. Feedback only;
    /// auto-clearing is the presenter's business.
    fn connect_error_flash(&mut self, node_id: &str) {}

    /// The energy balance changed.
    fn energy_changed(&mut self, mw: MilliWatts) {}

    /// The resource ledger of a manufactory changed.
    fn resources_changed(&mut self, node_id: &str) {}

    /// The known-recipe registry changed; any recipe-selection surface
    /// rebuilds from current registry contents.
    fn recipes_changed(&mut self, node_id: &str) {}

    /// Append a narrative thought to the log.
    fn thought(&mut self, text: &str) {}

    /// Append a narrative thought at most once per account lifetime. The
    /// presenter owns the already-shown set.
    fn thought_once(&mut self, text: &str) {}

    /// Build a node's entity-specific interactive surface (Alive entry).
    fn build_surface(&mut self, node_id: &str) {}

    /// Tear down a node's interactive surface (non-Alive exit).
    fn teardown_surface(&mut self, node_id: &str) {}
}

/// Presenter that displays nothing. For headless sessions and tests.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullPresenter;

impl Presenter for NullPresenter {}
