//! The manufactory: resource ledger, known-recipe registry, and the
//! atomic crafting contract.
//!
//! A manufactory belongs to one factory node and persists under keys
//! derived from that node's id (`mithril.currentResources`,
//! `mithril.knownRecipes`, `node.mithril.build-btn-successful-clicks` for
//! the shipped content).
//!
//! Crafting is all-or-nothing: every input is verified before anything is
//! debited, so a rejected craft leaves the ledger and the build counter
//! untouched. Completion runs once per craft action; the `&mut` receiver
//! serializes crafts within a process.

use crate::error::{GameError, GameResult};
use crate::ledger::ResourceLedger;
use crate::recipe::{CraftEffect, CraftReport, RecipeDef};
use crate::rng::SimRng;
use relink_store::backend::StorageBackend;
use relink_store::cell::PersistentCell;
use relink_store::store::{PersistentStore, StoreEvent};
use std::collections::HashMap;

/// Handler for a [`CraftEffect::Custom`] key. Registered by game code;
/// receives the ledger and the backend it persists through.
pub type CustomEffectFn =
    Box<dyn FnMut(&mut ResourceLedger, &mut dyn StorageBackend) -> GameResult<()>>;

/// Registry of custom craft-effect handlers, keyed by the opaque effect
/// key. An effect with no registered handler is skipped.
#[derive(Default)]
pub struct CustomEffects {
    handlers: HashMap<String, CustomEffectFn>,
}

impl CustomEffects {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, key: impl Into<String>, handler: CustomEffectFn) {
        self.handlers.insert(key.into(), handler);
    }

    fn get_mut(&mut self, key: &str) -> Option<&mut CustomEffectFn> {
        self.handlers.get_mut(key)
    }
}

impl std::fmt::Debug for CustomEffects {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CustomEffects")
            .field("keys", &self.handlers.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// Per-factory-node crafting state.
#[derive(Debug)]
pub struct Manufactory {
    node_id: String,
    ledger: ResourceLedger,
    recipes: PersistentStore<String, RecipeDef>,
    builds: PersistentCell<u64>,
}

impl Manufactory {
    /// Restore a manufactory for the given node, initializing empty
    /// stores on first open.
    pub fn open(backend: &mut dyn StorageBackend, node_id: &str) -> GameResult<Self> {
        let lc = node_id.to_lowercase();
        let ledger = ResourceLedger::open(backend, &format!("{lc}.currentResources"))?;
        let recipes = PersistentStore::open(backend, format!("{lc}.knownRecipes"))?;
        let builds =
            PersistentCell::open_or(backend, format!("node.{lc}.build-btn-successful-clicks"), 0)?;
        Ok(Self {
            node_id: node_id.to_string(),
            ledger,
            recipes,
            builds,
        })
    }

    /// The owning node's id.
    pub fn node_id(&self) -> &str {
        &self.node_id
    }

    pub fn ledger(&self) -> &ResourceLedger {
        &self.ledger
    }

    pub fn ledger_mut(&mut self) -> &mut ResourceLedger {
        &mut self.ledger
    }

    /// Lifetime count of successful crafts.
    pub fn successful_builds(&self) -> u64 {
        *self.builds.get()
    }

    // -- Recipe registry --

    /// Learn a recipe: insert it under its derived id. A colliding id
    /// overwrites the earlier entry. Returns the id.
    pub fn learn(&mut self, backend: &mut dyn StorageBackend, recipe: RecipeDef) -> GameResult<String> {
        let id = recipe.id();
        self.recipes.set(backend, id.clone(), recipe)?;
        Ok(id)
    }

    /// Forget a recipe, returning the prior definition. Unknown ids are a
    /// non-fatal `None`.
    pub fn forget(
        &mut self,
        backend: &mut dyn StorageBackend,
        recipe_id: &str,
    ) -> GameResult<Option<RecipeDef>> {
        Ok(self.recipes.delete(backend, &recipe_id.to_string())?)
    }

    pub fn knows(&self, recipe_id: &str) -> bool {
        self.recipes.has(&recipe_id.to_string())
    }

    pub fn recipe(&self, recipe_id: &str) -> Option<&RecipeDef> {
        self.recipes.get(&recipe_id.to_string())
    }

    /// Known recipes in learn order.
    pub fn known_recipes(&self) -> impl Iterator<Item = &RecipeDef> {
        self.recipes.entries().map(|(_, r)| r)
    }

    // -- Crafting --

    /// Whether the ledger currently satisfies every input of a known
    /// recipe. Unknown ids are an error, not `false`.
    pub fn can_craft(&self, recipe_id: &str) -> GameResult<bool> {
        let recipe = self
            .recipe(recipe_id)
            .ok_or_else(|| GameError::RecipeNotFound(recipe_id.to_string()))?;
        Ok(recipe
            .required()
            .iter()
            .all(|(resource, qty)| self.ledger.holds(resource, *qty)))
    }

    /// Craft a known recipe: verify all inputs, consume them, apply every
    /// completion effect, bump the build counter. Precondition failures
    /// leave everything untouched.
    pub fn craft(
        &mut self,
        backend: &mut dyn StorageBackend,
        rng: &mut SimRng,
        custom: &mut CustomEffects,
        recipe_id: &str,
    ) -> GameResult<CraftReport> {
        let recipe = self
            .recipe(recipe_id)
            .ok_or_else(|| GameError::RecipeNotFound(recipe_id.to_string()))?
            .clone();

        // Verify everything up front; nothing is consumed on rejection.
        for (resource, qty) in recipe.required() {
            let available = self.ledger.amount(resource);
            if available < qty {
                return Err(GameError::InsufficientResource {
                    resource: resource.to_string(),
                    required: qty,
                    available,
                });
            }
        }

        let mut consumed = Vec::with_capacity(recipe.inputs.len());
        for (resource, qty) in &recipe.inputs {
            self.ledger.debit(backend, resource, *qty)?;
            consumed.push((resource.clone(), *qty));
        }

        let mut granted = Vec::new();
        for effect in &recipe.effects {
            match effect {
                CraftEffect::Grant { resource, min, max } => {
                    let qty = rng.range_inclusive(*min, *max);
                    self.ledger.credit(backend, resource, qty)?;
                    granted.push((resource.clone(), qty));
                }
                CraftEffect::Custom(key) => {
                    if let Some(handler) = custom.get_mut(key) {
                        handler(&mut self.ledger, backend)?;
                    }
                }
            }
        }

        let total_builds = self.successful_builds() + 1;
        self.builds.set_if_changed(backend, total_builds)?;

        Ok(CraftReport {
            recipe_id: recipe_id.to_string(),
            consumed,
            granted,
            total_builds,
        })
    }

    /// Drain ledger change events.
    pub fn drain_ledger_events(&mut self) -> Vec<StoreEvent> {
        self.ledger.drain_events()
    }

    /// Drain recipe-registry change events.
    pub fn drain_recipe_events(&mut self) -> Vec<StoreEvent> {
        self.recipes.drain_events()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recipe::recipe_id;
    use relink_store::backend::MemoryBackend;

    fn refine_scrap() -> RecipeDef {
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

    fn setup(backend: &mut MemoryBackend) -> Manufactory {
        Manufactory::open(backend, "Mithril").unwrap()
    }

    #[test]
    fn storage_keys_derive_from_node_id() {
        let mut backend = MemoryBackend::new();
        let _ = setup(&mut backend);
        let keys: Vec<&str> = backend.keys().collect();
        assert!(keys.contains(&"mithril.currentResources"));
        assert!(keys.contains(&"mithril.knownRecipes"));
        assert!(keys.contains(&"node.mithril.build-btn-successful-clicks"));
    }

    #[test]
    fn learn_then_knows() {
        let mut backend = MemoryBackend::new();
        let mut m = setup(&mut backend);
        let id = m.learn(&mut backend, refine_scrap()).unwrap();
        assert_eq!(id, "refine-scrap");
        assert!(m.knows("refine-scrap"));
    }

    #[test]
    fn forget_returns_prior_definition() {
        let mut backend = MemoryBackend::new();
        let mut m = setup(&mut backend);
        m.learn(&mut backend, refine_scrap()).unwrap();

        let prior = m.forget(&mut backend, "refine-scrap").unwrap();
        assert_eq!(prior.as_ref().map(|r| r.display_name.as_str()), Some("Refine Scrap"));
        assert!(!m.knows("refine-scrap"));
    }

    #[test]
    fn forget_unknown_is_none() {
        let mut backend = MemoryBackend::new();
        let mut m = setup(&mut backend);
        assert_eq!(m.forget(&mut backend, "ghost").unwrap(), None);
    }

    #[test]
    fn colliding_display_names_overwrite() {
        let mut backend = MemoryBackend::new();
        let mut m = setup(&mut backend);
        m.learn(&mut backend, refine_scrap()).unwrap();

        let mut replacement = refine_scrap();
        replacement.display_name = "refine scrap".to_string();
        replacement.time = 9000;
        let id = m.learn(&mut backend, replacement).unwrap();

        assert_eq!(id, recipe_id("Refine Scrap"));
        assert_eq!(m.known_recipes().count(), 1);
        assert_eq!(m.recipe("refine-scrap").unwrap().time, 9000);
    }

    #[test]
    fn can_craft_tracks_ledger() {
        let mut backend = MemoryBackend::new();
        let mut m = setup(&mut backend);
        m.learn(&mut backend, refine_scrap()).unwrap();

        assert!(!m.can_craft("refine-scrap").unwrap());
        m.ledger_mut().credit(&mut backend, "Scrap", 1).unwrap();
        assert!(m.can_craft("refine-scrap").unwrap());
    }

    #[test]
    fn can_craft_unknown_recipe_is_error() {
        let mut backend = MemoryBackend::new();
        let m = setup(&mut backend);
        assert!(matches!(
            m.can_craft("ghost"),
            Err(GameError::RecipeNotFound(_))
        ));
    }

    #[test]
    fn craft_consumes_inputs_and_grants_outputs() {
        let mut backend = MemoryBackend::new();
        let mut m = setup(&mut backend);
        let mut rng = SimRng::new(7);
        let mut custom = CustomEffects::new();
        m.learn(&mut backend, refine_scrap()).unwrap();
        m.ledger_mut().credit(&mut backend, "Scrap", 3).unwrap();

        let report = m
            .craft(&mut backend, &mut rng, &mut custom, "refine-scrap")
            .unwrap();

        assert_eq!(m.ledger().amount("Scrap"), 2);
        assert_eq!(report.consumed, vec![("Scrap".to_string(), 1)]);
        assert_eq!(report.granted.len(), 2);
        let steel = m.ledger().amount("Steel");
        assert!((2..=5).contains(&steel), "steel yield out of range: {steel}");
        assert_eq!(m.ledger().amount("Electronics"), 1);
        assert_eq!(report.total_builds, 1);
    }

    #[test]
    fn craft_without_inputs_rejected_untouched() {
        let mut backend = MemoryBackend::new();
        let mut m = setup(&mut backend);
        let mut rng = SimRng::new(7);
        let mut custom = CustomEffects::new();
        m.learn(&mut backend, refine_scrap()).unwrap();

        let result = m.craft(&mut backend, &mut rng, &mut custom, "refine-scrap");
        assert!(matches!(
            result,
            Err(GameError::InsufficientResource { .. })
        ));
        assert_eq!(m.ledger().amount("Steel"), 0);
        assert_eq!(m.successful_builds(), 0);
    }

    #[test]
    fn craft_unknown_recipe_rejected() {
        let mut backend = MemoryBackend::new();
        let mut m = setup(&mut backend);
        let mut rng = SimRng::new(7);
        let mut custom = CustomEffects::new();
        assert!(matches!(
            m.craft(&mut backend, &mut rng, &mut custom, "ghost"),
            Err(GameError::RecipeNotFound(_))
        ));
    }

    #[test]
    fn craft_runs_custom_effect_handler() {
        let mut backend = MemoryBackend::new();
        let mut m = setup(&mut backend);
        let mut rng = SimRng::new(7);
        let mut custom = CustomEffects::new();
        custom.register(
            "salvage-bonus",
            Box::new(|ledger, backend| ledger.credit(backend, "Wiring", 2)),
        );

        let mut recipe = refine_scrap();
        recipe.effects.push(CraftEffect::Custom("salvage-bonus".to_string()));
        m.learn(&mut backend, recipe).unwrap();
        m.ledger_mut().credit(&mut backend, "Scrap", 1).unwrap();

        m.craft(&mut backend, &mut rng, &mut custom, "refine-scrap")
            .unwrap();
        assert_eq!(m.ledger().amount("Wiring"), 2);
    }

    #[test]
    fn unregistered_custom_effect_is_skipped() {
        let mut backend = MemoryBackend::new();
        let mut m = setup(&mut backend);
        let mut rng = SimRng::new(7);
        let mut custom = CustomEffects::new();

        let mut recipe = refine_scrap();
        recipe.effects = vec![CraftEffect::Custom("nobody-home".to_string())];
        m.learn(&mut backend, recipe).unwrap();
        m.ledger_mut().credit(&mut backend, "Scrap", 1).unwrap();

        let report = m
            .craft(&mut backend, &mut rng, &mut custom, "refine-scrap")
            .unwrap();
        assert!(report.granted.is_empty());
        assert_eq!(report.total_builds, 1);
    }

    #[test]
    fn build_counter_persists_across_reopen() {
        let mut backend = MemoryBackend::new();
        {
            let mut m = setup(&mut backend);
            let mut rng = SimRng::new(7);
            let mut custom = CustomEffects::new();
            m.learn(&mut backend, refine_scrap()).unwrap();
            m.ledger_mut().credit(&mut backend, "Scrap", 2).unwrap();
            m.craft(&mut backend, &mut rng, &mut custom, "refine-scrap").unwrap();
            m.craft(&mut backend, &mut rng, &mut custom, "refine-scrap").unwrap();
        }
        let m = setup(&mut backend);
        assert_eq!(m.successful_builds(), 2);
    }

    #[test]
    fn recipes_persist_across_reopen() {
        let mut backend = MemoryBackend::new();
        {
            let mut m = setup(&mut backend);
            m.learn(&mut backend, refine_scrap()).unwrap();
        }
        let m = setup(&mut backend);
        assert!(m.knows("refine-scrap"));
        assert_eq!(m.recipe("refine-scrap").unwrap().effects.len(), 2);
    }
}
