//! The session: explicit owner of the backend and every store.
//!
//! One `Session` value is constructed at startup and handed to whatever
//! needs it: single-instance-per-process semantics without hidden global
//! state. All inward operations (`connect`, the two-phase
//! disconnect, `learn`/`forget`/`craft`, energy access) live here and run
//! to completion on the calling thread, persisting as they go and
//! notifying the presenter.

use crate::behavior::{NodeKind, behavior};
use crate::energy::{EnergyAccount, MilliWatts};
use crate::error::{GameError, GameResult};
use crate::ledger::Quantity;
use crate::manufactory::{CustomEffectFn, CustomEffects, Manufactory};
use crate::node::{NodeRecord, NodeSpec, NodeState};
use crate::presenter::{NodeView, Presenter};
use crate::recipe::{CraftReport, RecipeDef};
use crate::rng::SimRng;
use relink_store::backend::StorageBackend;
use relink_store::cell::CellEvent;
use relink_store::store::StoreEvent;

/// Sentinel key marking that the session has ever booted.
pub const SENTINEL_STATE: &str = "state";

/// Sentinel key marking that the first scan has run; its value is the
/// surfaced node count.
pub const SENTINEL_NODE_COUNT: &str = "node_count";

/// A running game session over one storage backend.
pub struct Session<B: StorageBackend> {
    backend: B,
    rng: SimRng,
    energy: EnergyAccount,
    nodes: Vec<NodeRecord>,
    manufactory: Option<Manufactory>,
    custom_effects: CustomEffects,
    recovery_log: Vec<String>,
}

impl<B: StorageBackend> Session<B> {
    /// Open a session, restoring (or first-initializing) the energy
    /// account. Nodes are registered afterwards via [`add_node`]
    /// (typically from the catalog or the data loader).
    ///
    /// [`add_node`]: Self::add_node
    pub fn open(backend: B) -> GameResult<Self> {
        let seed = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_nanos() as u64)
            .unwrap_or(0x5EED);
        Self::open_seeded(backend, seed)
    }

    /// Open with a pinned RNG seed, making craft yields reproducible.
    pub fn open_seeded(mut backend: B, seed: u64) -> GameResult<Self> {
        let mut energy = EnergyAccount::open(&mut backend)?;
        let mut recovery_log = Vec::new();
        log_cell_recoveries(&mut recovery_log, "player.energy", energy.drain_events());
        Ok(Self {
            backend,
            rng: SimRng::new(seed),
            energy,
            nodes: Vec::new(),
            manufactory: None,
            custom_effects: CustomEffects::new(),
            recovery_log,
        })
    }

    // -- Registration --

    /// Register a node, restoring its persisted record. A `Manufactory`
    /// kind also opens the factory stores; only one manufactory may exist
    /// per session.
    pub fn add_node(&mut self, spec: &NodeSpec) -> GameResult<()> {
        if self.nodes.iter().any(|n| n.id() == spec.id) {
            return Err(GameError::DuplicateNode(spec.id.clone()));
        }
        if spec.kind == NodeKind::Manufactory && self.manufactory.is_some() {
            return Err(GameError::ManufactoryExists(spec.id.clone()));
        }

        let mut node = NodeRecord::open(&mut self.backend, spec)?;
        let cell_events = node.drain_events();
        log_cell_recoveries(&mut self.recovery_log, node.id(), cell_events);

        if spec.kind == NodeKind::Manufactory {
            let mut manufactory = Manufactory::open(&mut self.backend, spec.id.as_str())?;
            let ledger_events = manufactory.drain_ledger_events();
            log_store_recoveries(&mut self.recovery_log, manufactory.node_id(), ledger_events);
            let recipe_events = manufactory.drain_recipe_events();
            log_store_recoveries(&mut self.recovery_log, spec.id.as_str(), recipe_events);
            self.manufactory = Some(manufactory);
        }

        self.nodes.push(node);
        Ok(())
    }

    /// Register a handler for a custom craft-effect key.
    pub fn register_effect(&mut self, key: impl Into<String>, handler: CustomEffectFn) {
        self.custom_effects.register(key, handler);
    }

    // -- Queries --

    /// The underlying backend, for inspection of the persisted form.
    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Tear the session down, handing the backend back (all state is
    /// already persisted, so a later open restores it).
    pub fn into_backend(self) -> B {
        self.backend
    }

    pub fn node(&self, node_id: &str) -> Option<&NodeRecord> {
        self.nodes.iter().find(|n| n.id() == node_id)
    }

    pub fn nodes(&self) -> impl Iterator<Item = &NodeRecord> {
        self.nodes.iter()
    }

    pub fn manufactory(&self) -> Option<&Manufactory> {
        self.manufactory.as_ref()
    }

    /// Corruption-recovery reports accumulated while opening stores.
    /// Draining them is the caller's chance to log the self-heal.
    pub fn take_recovery_reports(&mut self) -> Vec<String> {
        std::mem::take(&mut self.recovery_log)
    }

    // -- Energy --

    pub fn energy(&self) -> MilliWatts {
        self.energy.get()
    }

    pub fn set_energy(
        &mut self,
        mw: MilliWatts,
        presenter: &mut dyn Presenter,
    ) -> GameResult<()> {
        self.energy.set(&mut self.backend, mw)?;
        presenter.energy_changed(mw);
        Ok(())
    }

    // -- Node lifecycle --

    /// Surface a hidden node as Broken or Disabled (externally triggered
    /// unlock/reveal).
    pub fn reveal(
        &mut self,
        node_id: &str,
        target: NodeState,
        presenter: &mut dyn Presenter,
    ) -> GameResult<()> {
        let index = self.node_index(node_id)?;
        let current = self.nodes[index].state();
        if current != NodeState::Hidden {
            return Err(GameError::WrongState {
                node: node_id.to_string(),
                state: current,
                required: NodeState::Hidden,
            });
        }
        if !matches!(target, NodeState::Broken | NodeState::Disabled) {
            return Err(GameError::WrongState {
                node: node_id.to_string(),
                state: current,
                required: NodeState::Disabled,
            });
        }
        self.apply_state(index, target, presenter)
    }

    /// Connect a disabled node: debit the connection cost and bring it
    /// Alive. A shortfall changes nothing and raises the presenter's
    /// transient error flash.
    pub fn connect(&mut self, node_id: &str, presenter: &mut dyn Presenter) -> GameResult<()> {
        let index = self.node_index(node_id)?;
        let node = &self.nodes[index];
        if node.state() != NodeState::Disabled {
            return Err(GameError::WrongState {
                node: node_id.to_string(),
                state: node.state(),
                required: NodeState::Disabled,
            });
        }

        let cost = node.conn_cost();
        match self.energy.debit(&mut self.backend, cost) {
            Ok(()) => {}
            Err(e @ GameError::InsufficientEnergy { .. }) => {
                presenter.connect_error_flash(node_id);
                return Err(e);
            }
            Err(e) => return Err(e),
        }
        presenter.energy_changed(self.energy.get());
        self.apply_state(index, NodeState::Alive, presenter)
    }

    /// Phase 1 of disconnect: arm the confirmation. No node state changes.
    pub fn begin_disconnect(&mut self, node_id: &str) -> GameResult<()> {
        let index = self.node_index(node_id)?;
        self.nodes[index].arm_disconnect()
    }

    /// Cancel an armed disconnect; the node stays Alive.
    pub fn cancel_disconnect(&mut self, node_id: &str) -> GameResult<()> {
        let index = self.node_index(node_id)?;
        self.nodes[index].cancel_disconnect()
    }

    /// Phase 2 of disconnect: perform the Alive -> Disabled transition.
    pub fn confirm_disconnect(
        &mut self,
        node_id: &str,
        presenter: &mut dyn Presenter,
    ) -> GameResult<()> {
        let index = self.node_index(node_id)?;
        self.nodes[index].take_confirmation()?;
        self.apply_state(index, NodeState::Disabled, presenter)
    }

    /// Set a node's upkeep (upgrade path). Always persists and
    /// re-renders.
    pub fn set_upkeep(
        &mut self,
        node_id: &str,
        upkeep: MilliWatts,
        presenter: &mut dyn Presenter,
    ) -> GameResult<()> {
        let index = self.node_index(node_id)?;
        self.nodes[index].set_upkeep(&mut self.backend, upkeep)?;
        presenter.render_node(&view_of(&self.nodes[index]));
        Ok(())
    }

    // -- Recipes and crafting --

    /// Learn a recipe into the manufactory's registry.
    pub fn learn(&mut self, recipe: RecipeDef, presenter: &mut dyn Presenter) -> GameResult<String> {
        let manufactory = self.manufactory.as_mut().ok_or(GameError::NoManufactory)?;
        let id = manufactory.learn(&mut self.backend, recipe)?;
        if !manufactory.drain_recipe_events().is_empty() {
            let node_id = manufactory.node_id().to_string();
            presenter.recipes_changed(&node_id);
        }
        Ok(id)
    }

    /// Forget a recipe; unknown ids are a non-fatal `None`.
    pub fn forget(
        &mut self,
        recipe_id: &str,
        presenter: &mut dyn Presenter,
    ) -> GameResult<Option<RecipeDef>> {
        let manufactory = self.manufactory.as_mut().ok_or(GameError::NoManufactory)?;
        let prior = manufactory.forget(&mut self.backend, recipe_id)?;
        if !manufactory.drain_recipe_events().is_empty() {
            let node_id = manufactory.node_id().to_string();
            presenter.recipes_changed(&node_id);
        }
        Ok(prior)
    }

    /// Whether the ledger satisfies every input of a known recipe.
    pub fn can_craft(&self, recipe_id: &str) -> GameResult<bool> {
        let manufactory = self.manufactory.as_ref().ok_or(GameError::NoManufactory)?;
        manufactory.can_craft(recipe_id)
    }

    /// Craft a known recipe (verify, consume, apply effects, count).
    pub fn craft(
        &mut self,
        recipe_id: &str,
        presenter: &mut dyn Presenter,
    ) -> GameResult<CraftReport> {
        let manufactory = self.manufactory.as_mut().ok_or(GameError::NoManufactory)?;
        let report = manufactory.craft(
            &mut self.backend,
            &mut self.rng,
            &mut self.custom_effects,
            recipe_id,
        )?;
        if !manufactory.drain_ledger_events().is_empty() {
            let node_id = manufactory.node_id().to_string();
            presenter.resources_changed(&node_id);
        }
        Ok(report)
    }

    /// Directly credit a resource (bootstrap grants, salvage rewards).
    pub fn credit_resource(
        &mut self,
        resource: &str,
        qty: Quantity,
        presenter: &mut dyn Presenter,
    ) -> GameResult<()> {
        let manufactory = self.manufactory.as_mut().ok_or(GameError::NoManufactory)?;
        manufactory
            .ledger_mut()
            .credit(&mut self.backend, resource, qty)?;
        if !manufactory.drain_ledger_events().is_empty() {
            let node_id = manufactory.node_id().to_string();
            presenter.resources_changed(&node_id);
        }
        Ok(())
    }

    // -- Bootstrap sentinels --

    /// Whether the boot sentinel has ever been written.
    pub fn booted_before(&self) -> GameResult<bool> {
        Ok(self.backend.read(SENTINEL_STATE)?.is_some())
    }

    /// Write the boot sentinel.
    pub fn mark_booted(&mut self) -> GameResult<()> {
        self.backend.write(SENTINEL_STATE, "\"Primary\"")?;
        Ok(())
    }

    /// Whether the first scan has ever completed.
    pub fn scanned_before(&self) -> GameResult<bool> {
        Ok(self.backend.read(SENTINEL_NODE_COUNT)?.is_some())
    }

    /// Write the scan sentinel with the surfaced node count.
    pub fn mark_scanned(&mut self) -> GameResult<()> {
        let surfaced = self
            .nodes
            .iter()
            .filter(|n| n.state() != NodeState::Hidden)
            .count();
        self.backend.write(SENTINEL_NODE_COUNT, &surfaced.to_string())?;
        Ok(())
    }

    // -- Internals --

    fn node_index(&self, node_id: &str) -> GameResult<usize> {
        self.nodes
            .iter()
            .position(|n| n.id() == node_id)
            .ok_or_else(|| GameError::NodeNotFound(node_id.to_string()))
    }

    /// Perform a state transition: persist (deduped), then render and run
    /// the behavior hooks. A same-state set does nothing at all.
    fn apply_state(
        &mut self,
        index: usize,
        new: NodeState,
        presenter: &mut dyn Presenter,
    ) -> GameResult<()> {
        let node = &mut self.nodes[index];
        let old = node.state();
        if !node.set_state(&mut self.backend, new)? {
            return Ok(());
        }

        let hooks = behavior(node.kind());
        let id = node.id().to_string();

        if old == NodeState::Alive && new != NodeState::Alive {
            hooks.on_deactivate(&id, presenter);
        }

        if new == NodeState::Hidden {
            presenter.remove_node(&id);
        } else {
            presenter.render_node(&view_of(&self.nodes[index]));
        }

        if new == NodeState::Alive {
            if let Some(text) = hooks.first_activation_thought(&id) {
                presenter.thought_once(&text);
            }
            hooks.on_activate(&id, presenter);
        }
        Ok(())
    }
}

impl<B: StorageBackend> std::fmt::Debug for Session<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("energy", &self.energy.get())
            .field("nodes", &self.nodes.len())
            .field("manufactory", &self.manufactory.is_some())
            .finish()
    }
}

fn view_of(node: &NodeRecord) -> NodeView {
    NodeView {
        id: node.id().to_string(),
        state: node.state(),
        conn_cost: node.conn_cost(),
        upkeep: node.upkeep(),
    }
}

fn log_cell_recoveries(log: &mut Vec<String>, what: &str, events: Vec<CellEvent>) {
    for event in events {
        if let CellEvent::CorruptionRecovered { reason } = event {
            log.push(format!("{what}: recovered corrupt persisted value ({reason})"));
        }
    }
}

fn log_store_recoveries(log: &mut Vec<String>, what: &str, events: Vec<StoreEvent>) {
    for event in events {
        if let StoreEvent::CorruptionRecovered { reason } = event {
            log.push(format!("{what}: recovered corrupt persisted value ({reason})"));
        }
    }
}
