//! # rulestore-core
//!
//! Foundation crate for the rulestore policy persistence adapters:
//! the in-memory policy model, the per-column load filter, the storage
//! contracts adapters implement, and the shared error type.

pub mod adapter;
pub mod error;
pub mod filter;
pub mod model;

pub use adapter::{
    BatchPolicyAdapter, FilteredPolicyAdapter, PolicyAdapter, UpdatablePolicyAdapter,
};
pub use error::{StoreError, StoreResult};
pub use filter::PolicyFilter;
pub use model::PolicyModel;
