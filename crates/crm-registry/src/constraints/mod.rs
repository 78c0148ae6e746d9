//! # Constraint Engine
//!
//! HolderLink uniqueness rules and the index declarations that back them.

pub mod engine;
pub mod indexes;

pub use engine::ConstraintEngine;
pub use indexes::{
    alias_indexes, holder_indexes, holder_link_indexes, ALIAS_ACCOUNT_ID_INDEX,
    ALIAS_ID_HOLDER_INDEX, ALIAS_LEDGER_ACCOUNT_INDEX, HOLDER_LINK_ALIAS_LINK_TYPE_INDEX,
    HOLDER_LINK_PRIMARY_HOLDER_INDEX, PRIMARY_KEY_INDEX,
};
