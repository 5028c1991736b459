//! Error types for input reconciliation.

use thiserror::Error;

use crate::types::{ModelPosition, NodeRef};

/// Errors that can occur while turning view input into model changes.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum InputError {
    /// A children mutation shape the normalizer cannot interpret.
    ///
    /// Normal batch handling drops these silently and lets the next render
    /// resync the view from the model.
    #[error("unsupported mutation: {0}")]
    UnsupportedMutation(UnsupportedMutation),

    /// A view node could not be mapped to a model position (stale reference).
    #[error("cannot map view node `{0}` to a model position")]
    Mapping(NodeRef),

    /// A write addressed a position that does not exist in the model.
    #[error("invalid model position {0}")]
    InvalidPosition(ModelPosition),

    /// The model rejected a change for another reason.
    #[error("model error: {0}")]
    Model(String),

    /// Configuration could not be parsed or failed validation.
    #[error("invalid input config: {0}")]
    Config(String),
}

/// Why a children mutation was not turned into a text change.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnsupportedMutation {
    #[error("nodes were removed")]
    RemovedNodes,
    #[error("an element was inserted")]
    InsertedElement,
    #[error("more than one node was inserted")]
    MultipleInsertedNodes,
    #[error("existing children changed instead of a trailing append")]
    NotTrailingAppend,
    #[error("no nodes were inserted")]
    NoInsertedNodes,
}

impl From<UnsupportedMutation> for InputError {
    fn from(reason: UnsupportedMutation) -> Self {
        InputError::UnsupportedMutation(reason)
    }
}

impl From<serde_json::Error> for InputError {
    fn from(e: serde_json::Error) -> Self {
        InputError::Config(e.to_string())
    }
}
