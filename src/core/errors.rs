// src/core/errors.rs

use crate::models::MenuId;
use thiserror::Error;

/// Every failure the menu core can surface to its callers.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MenuError {
    /// A condition tree used an operator outside the closed set. This is a schema
    /// mismatch between the menu data and this evaluator; it is never defaulted.
    #[error("Unrecognized condition kind '{0}'.")]
    UnrecognizedConditionKind(String),

    /// A known condition kind carried the wrong kind of operand.
    #[error("Malformed condition: {0}")]
    MalformedCondition(String),

    /// The data source could not deliver a menu. Not cached; the next fetch retries.
    #[error("Menu '{id}' is unavailable: {reason}")]
    DataUnavailable { id: MenuId, reason: String },

    /// An attach direction string was not one of `left`, `right`, `top`, `bottom`.
    #[error("Invalid attach direction '{0}'.")]
    InvalidAttachDirection(String),

    #[error("Menu '{menu}' has no entry at index {index} (it has {len}).")]
    EntryOutOfRange {
        menu: MenuId,
        index: usize,
        len: usize,
    },

    #[error("Item {index} of menu '{menu}' is disabled.")]
    DisabledItem { menu: MenuId, index: usize },

    #[error("No menu is open at level {0}.")]
    UnknownLevel(usize),

    #[error("No menu is open.")]
    NoOpenMenu,
}
