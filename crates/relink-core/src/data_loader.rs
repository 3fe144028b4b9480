//! Data-driven content loading from JSON.
//!
//! Feature-gated behind `data-loader`. Parses a content pack (nodes plus
//! recipes) out of JSON and installs it into a [`Session`], so new game
//! content ships as data files rather than code. Custom craft effects are
//! referenced by key and still need a handler registered on the session.

use crate::behavior::NodeKind;
use crate::energy::MilliWatts;
use crate::error::GameError;
use crate::node::NodeSpec;
use crate::presenter::Presenter;
use crate::recipe::{CraftEffect, RecipeDef};
use crate::session::Session;
use relink_store::backend::StorageBackend;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors that can occur during content loading.
#[derive(Debug, thiserror::Error)]
pub enum DataLoadError {
    #[error("JSON parse error: {0}")]
    JsonParse(#[from] serde_json::Error),
    #[error("game error: {0}")]
    Game(#[from] GameError),
    #[error("recipe {recipe}: grant of {resource} has min {min} > max {max}")]
    InvalidGrantRange {
        recipe: String,
        resource: String,
        min: u32,
        max: u32,
    },
}

// ---------------------------------------------------------------------------
// JSON data structures
// ---------------------------------------------------------------------------

/// Top-level content pack for JSON deserialization.
#[derive(Debug, serde::Deserialize)]
pub struct ContentData {
    #[serde(default)]
    pub nodes: Vec<NodeData>,
    #[serde(default)]
    pub recipes: Vec<RecipeData>,
}

/// JSON representation of a node.
#[derive(Debug, serde::Deserialize)]
pub struct NodeData {
    pub id: String,
    #[serde(default)]
    pub kind: NodeKind,
    pub conn_cost: MilliWatts,
    #[serde(default)]
    pub upkeep: MilliWatts,
}

/// JSON representation of a recipe.
#[derive(Debug, serde::Deserialize)]
pub struct RecipeData {
    pub name: String,
    pub time: u64,
    #[serde(default)]
    pub inputs: Vec<InputData>,
    #[serde(default)]
    pub output_desc: String,
    #[serde(default)]
    pub effects: Vec<EffectData>,
}

/// JSON representation of a recipe input.
#[derive(Debug, serde::Deserialize)]
pub struct InputData {
    pub resource: String,
    pub quantity: u32,
}

/// JSON representation of a completion effect.
#[derive(Debug, serde::Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EffectData {
    Grant {
        resource: String,
        min: u32,
        /// Omitted max means a fixed yield of `min`.
        max: Option<u32>,
    },
    Custom {
        key: String,
    },
}

// ---------------------------------------------------------------------------
// Loading functions
// ---------------------------------------------------------------------------

/// A parsed, validated content pack ready to install.
#[derive(Debug)]
pub struct ContentPack {
    pub nodes: Vec<NodeSpec>,
    pub recipes: Vec<RecipeDef>,
}

/// Parse a content pack from a JSON string.
pub fn load_content_json(json: &str) -> Result<ContentPack, DataLoadError> {
    let data: ContentData = serde_json::from_str(json)?;
    build_pack(data)
}

/// Parse a content pack from JSON bytes.
pub fn load_content_json_bytes(bytes: &[u8]) -> Result<ContentPack, DataLoadError> {
    let data: ContentData = serde_json::from_slice(bytes)?;
    build_pack(data)
}

/// Install a parsed pack: register every node, then teach every recipe.
/// Recipes need the pack (or the session) to carry a manufactory node.
pub fn install_content<B: StorageBackend>(
    session: &mut Session<B>,
    pack: &ContentPack,
    presenter: &mut dyn Presenter,
) -> Result<(), DataLoadError> {
    for spec in &pack.nodes {
        session.add_node(spec)?;
    }
    for recipe in &pack.recipes {
        session.learn(recipe.clone(), presenter)?;
    }
    Ok(())
}

fn build_pack(data: ContentData) -> Result<ContentPack, DataLoadError> {
    let nodes = data
        .nodes
        .into_iter()
        .map(|n| NodeSpec {
            id: n.id,
            kind: n.kind,
            conn_cost: n.conn_cost,
            initial_upkeep: n.upkeep,
        })
        .collect();

    let mut recipes = Vec::with_capacity(data.recipes.len());
    for recipe in data.recipes {
        let mut effects = Vec::with_capacity(recipe.effects.len());
        for effect in recipe.effects {
            effects.push(match effect {
                EffectData::Grant { resource, min, max } => {
                    let max = max.unwrap_or(min);
                    if min > max {
                        return Err(DataLoadError::InvalidGrantRange {
                            recipe: recipe.name.clone(),
                            resource,
                            min,
                            max,
                        });
                    }
                    CraftEffect::Grant { resource, min, max }
                }
                EffectData::Custom { key } => CraftEffect::Custom(key),
            });
        }
        recipes.push(RecipeDef {
            display_name: recipe.name,
            time: recipe.time,
            inputs: recipe
                .inputs
                .into_iter()
                .map(|i| (i.resource, i.quantity))
                .collect(),
            output_desc: recipe.output_desc,
            effects,
        });
    }

    Ok(ContentPack { nodes, recipes })
}

// ===========================================================================
// Tests
// ===========================================================================
