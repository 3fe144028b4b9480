//! Error taxonomy for game operations.
//!
//! Everything here is a non-fatal result value: shortfalls and wrong-state
//! calls leave the world untouched and are surfaced as transient feedback.
//! True programming errors (reassigning a node's identity or connection
//! cost) are unrepresentable -- those fields have no setters. Corrupt
//! persisted state is recovered inside the store layer and never reaches
//! this enum.

use crate::node::NodeState;
use relink_store::backend::StorageError;

/// Result alias used across the crate.
pub type GameResult<T> = Result<T, GameError>;

/// Errors returned by the public game operations.
#[derive(Debug, thiserror::Error)]
pub enum GameError {
    #[error("insufficient energy: need {required} mW, have {available} mW")]
    InsufficientEnergy { required: u64, available: u64 },

    #[error("insufficient {resource}: need {required}, have {available}")]
    InsufficientResource {
        resource: String,
        required: u32,
        available: u32,
    },

    #[error("node {node} is {state:?}, operation requires {required:?}")]
    WrongState {
        node: String,
        state: NodeState,
        required: NodeState,
    },

    #[error("node not found: {0}")]
    NodeNotFound(String),

    #[error("recipe not known: {0}")]
    RecipeNotFound(String),

    #[error("no disconnect is pending for node {0}")]
    ConfirmNotPending(String),

    #[error("node {0} is already registered")]
    DuplicateNode(String),

    #[error("a manufactory already exists on node {0}")]
    ManufactoryExists(String),

    #[error("no manufactory node exists in this session")]
    NoManufactory,

    #[error(transparent)]
    Storage(#[from] StorageError),
}
