//! Storage contracts between an authorization engine and its adapters.
//!
//! Split by capability: every adapter implements `PolicyAdapter`;
//! filtered loading, batch writes, and in-place updates are separate
//! contracts an engine can require individually. All methods are
//! synchronous and take `&mut self` (one connection, one caller).

use crate::error::StoreResult;
use crate::filter::PolicyFilter;
use crate::model::PolicyModel;

// ─── Core contract ───────────────────────────────────────────────────

/// Load, save, and single-rule mutation of a persisted policy set.
///
/// The `sec` parameter ("p" or "g") is part of the engine-facing
/// contract; relational adapters key rows by `ptype` alone and accept
/// it for interface compatibility.
pub trait PolicyAdapter {
    /// Read every persisted rule into the model.
    fn load_policy(&mut self, model: &mut PolicyModel) -> StoreResult<()>;

    /// Replace the entire table with the model's "p" and "g" sections.
    fn save_policy(&mut self, model: &PolicyModel) -> StoreResult<()>;

    /// Persist one rule.
    fn add_policy(&mut self, sec: &str, ptype: &str, rule: &[String]) -> StoreResult<()>;

    /// Delete rules matching the given rule's non-empty fields.
    fn remove_policy(&mut self, sec: &str, ptype: &str, rule: &[String]) -> StoreResult<()>;

    /// Delete rules whose columns `field_index..` match `field_values`;
    /// empty values in the range match anything.
    fn remove_filtered_policy(
        &mut self,
        sec: &str,
        ptype: &str,
        field_index: usize,
        field_values: &[String],
    ) -> StoreResult<()>;
}

// ─── Filtered loading ────────────────────────────────────────────────

/// Partial policy loading for engines that window large rule sets.
pub trait FilteredPolicyAdapter: PolicyAdapter {
    /// Load only the rules matching `filter`; `None` behaves exactly
    /// like `load_policy`.
    fn load_filtered_policy(
        &mut self,
        model: &mut PolicyModel,
        filter: Option<&PolicyFilter>,
    ) -> StoreResult<()>;

    /// Whether the most recent load was filtered. Engines consult this
    /// before allowing a full save; the adapter only records it.
    fn is_filtered(&self) -> bool;
}

// ─── Batch writes ────────────────────────────────────────────────────

/// Multi-rule writes, atomic per call.
pub trait BatchPolicyAdapter: PolicyAdapter {
    /// Persist several rules of one policy type; all or none.
    fn add_policies(&mut self, sec: &str, ptype: &str, rules: &[Vec<String>]) -> StoreResult<()>;

    /// Delete several rules of one policy type; all or none.
    fn remove_policies(&mut self, sec: &str, ptype: &str, rules: &[Vec<String>])
        -> StoreResult<()>;
}

// ─── In-place updates ────────────────────────────────────────────────

/// Rewriting persisted rules without a full save.
pub trait UpdatablePolicyAdapter: PolicyAdapter {
    /// Rewrite the row matching `old_rule` to hold `new_rule`.
    fn update_policy(
        &mut self,
        sec: &str,
        ptype: &str,
        old_rule: &[String],
        new_rule: &[String],
    ) -> StoreResult<()>;

    /// Pairwise rewrite; the lists must be the same length and the
    /// whole batch is atomic.
    fn update_policies(
        &mut self,
        sec: &str,
        ptype: &str,
        old_rules: &[Vec<String>],
        new_rules: &[Vec<String>],
    ) -> StoreResult<()>;

    /// Replace every rule matching the field-range predicate with
    /// `new_rules`, returning the displaced rules.
    fn update_filtered_policies(
        &mut self,
        sec: &str,
        ptype: &str,
        new_rules: &[Vec<String>],
        field_index: usize,
        field_values: &[String],
    ) -> StoreResult<Vec<Vec<String>>>;
}
