//! Crafting recipes.
//!
//! A [`RecipeDef`] is immutable after construction: display name, crafting
//! time, ordered input requirements, a free-form output description, and a
//! list of completion effects. Effects are data, not closures, so learned
//! recipes round-trip the save file faithfully.

use crate::ledger::{Quantity, ResourceName};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Derive a registry id from a display name: lower-cased, spaces replaced
/// with `-`. Two display names normalizing to the same id collide, and the
/// later learn overwrites the earlier entry.
pub fn recipe_id(display_name: &str) -> String {
    display_name.to_lowercase().replace(' ', "-")
}

/// What a completed craft does to the resource ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum CraftEffect {
    /// Credit a uniformly random integer quantity in `[min, max]`.
    Grant {
        resource: ResourceName,
        min: Quantity,
        max: Quantity,
    },

    /// Game-defined effect. The key is opaque to the core; game code
    /// registers a handler for it on the session.
    Custom(String),
}

/// An immutable crafting definition. Becomes "known" via an explicit
/// learn; may be forgotten later; never mutated after construction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecipeDef {
    /// Human-readable name; the registry id derives from it.
    pub display_name: String,

    /// Crafting duration in milliseconds. Recorded for display; no clock
    /// advances it yet (scheduled completion is an extension point).
    pub time: u64,

    /// Required inputs, order-preserving. All must be satisfied to craft.
    pub inputs: Vec<(ResourceName, Quantity)>,

    /// Free-form output description for display. Not validated against
    /// the ledger.
    pub output_desc: String,

    /// Completion effects, applied in order on a successful craft.
    pub effects: Vec<CraftEffect>,
}

impl RecipeDef {
    /// The registry id this recipe learns under.
    pub fn id(&self) -> String {
        recipe_id(&self.display_name)
    }

    /// Input requirements aggregated by resource (a recipe listing the
    /// same resource twice needs the sum).
    pub fn required(&self) -> BTreeMap<&str, Quantity> {
        let mut required: BTreeMap<&str, Quantity> = BTreeMap::new();
        for (resource, qty) in &self.inputs {
            *required.entry(resource.as_str()).or_default() += qty;
        }
        required
    }

    /// Multi-line requirements text for the recipe-selection surface.
    pub fn render_requirements(&self) -> String {
        let mut out = format!("{}: {{\n  Time: {}h\n  Inputs: {{\n", self.display_name, self.time);
        for (resource, qty) in &self.inputs {
            out.push_str(&format!("    {resource}: {qty}\n"));
        }
        out.push_str(&format!("  }},\n  Outputs: {}\n}}", self.output_desc));
        out
    }
}

/// Outcome of a successful craft.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CraftReport {
    /// Registry id of the crafted recipe.
    pub recipe_id: String,
    /// Inputs consumed, in recipe order.
    pub consumed: Vec<(ResourceName, Quantity)>,
    /// Resources granted by the effects, in effect order.
    pub granted: Vec<(ResourceName, Quantity)>,
    /// Lifetime successful-build count after this craft.
    pub total_builds: u64,
}
