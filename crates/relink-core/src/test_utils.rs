//! Shared test helpers for unit and integration tests.
//!
//! Gated behind `#[cfg(any(test, feature = "test-utils"))]` so these helpers
//! are available in unit tests and in the integration-tests crate (via the
//! `test-utils` feature).

use crate::energy::MilliWatts;
use crate::presenter::{NodeView, Presenter};
use std::collections::HashSet;

// ===========================================================================
// Recording presenter
// ===========================================================================

/// Presenter that records every call for later assertion.
///
/// `thought_once` keeps an already-shown set, so the one-time narrative
/// contract can be tested end to end.
#[derive(Debug, Default)]
pub struct RecordingPresenter {
    pub rendered: Vec<NodeView>,
    pub removed: Vec<String>,
    pub connect_flashes: Vec<String>,
    pub energy_updates: Vec<MilliWatts>,
    pub resource_updates: Vec<String>,
    pub recipe_updates: Vec<String>,
    pub thoughts: Vec<String>,
    pub surfaces_built: Vec<String>,
    pub surfaces_torn_down: Vec<String>,
    shown_once: HashSet<String>,
}

impl RecordingPresenter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Render calls for one node, in order.
    pub fn renders_of(&self, node_id: &str) -> Vec<&NodeView> {
        self.rendered.iter().filter(|v| v.id == node_id).collect()
    }

    /// The most recent rendered view of a node.
    pub fn last_render_of(&self, node_id: &str) -> Option<&NodeView> {
        self.rendered.iter().rev().find(|v| v.id == node_id)
    }

    pub fn saw_thought(&self, text: &str) -> bool {
        self.thoughts.iter().any(|t| t == text)
    }

    pub fn thought_count(&self, text: &str) -> usize {
        self.thoughts.iter().filter(|t| *t == text).count()
    }
}

impl Presenter for RecordingPresenter {
    fn render_node(&mut self, view: &NodeView) {
        self.rendered.push(view.clone());
    }

    fn remove_node(&mut self, node_id: &str) {
        self.removed.push(node_id.to_string());
    }

    fn connect_error_flash(&mut self, node_id: &str) {
        self.connect_flashes.push(node_id.to_string());
    }

    fn energy_changed(&mut self, mw: MilliWatts) {
        self.energy_updates.push(mw);
    }

    fn resources_changed(&mut self, node_id: &str) {
        self.resource_updates.push(node_id.to_string());
    }

    fn recipes_changed(&mut self, node_id: &str) {
        self.recipe_updates.push(node_id.to_string());
    }

    fn thought(&mut self, text: &str) {
        self.thoughts.push(text.to_string());
    }

    fn thought_once(&mut self, text: &str) {
        if self.shown_once.insert(text.to_string()) {
            self.thoughts.push(text.to_string());
        }
    }

    fn build_surface(&mut self, node_id: &str) {
        self.surfaces_built.push(node_id.to_string());
    }

    fn teardown_surface(&mut self, node_id: &str) {
        self.surfaces_torn_down.push(node_id.to_string());
    }
}
