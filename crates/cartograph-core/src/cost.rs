//! # Cost Registry
//!
//! Named functions deciding the cost of `EdgeCost::Computed` edges.
//!
//! Map files only ever store the function name. The registry is populated in
//! code when the store is built, so nothing read from disk is ever executed.
//! Functions run inline during path searches: they must be fast and must not
//! have side effects.

use crate::primitives::COST_FN_CLOSED;
use crate::{Cost, CostFnId, EdgeCost, NavError};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// A dynamic cost function. `None` means the edge is currently closed.
pub type CostFn = Arc<dyn Fn() -> Option<Cost> + Send + Sync>;

/// Registry of dynamic cost functions keyed by name.
#[derive(Clone, Default)]
pub struct CostRegistry {
    functions: BTreeMap<CostFnId, CostFn>,
}

impl fmt::Debug for CostRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CostRegistry")
            .field("functions", &self.functions.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl CostRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry holding the built-in functions.
    ///
    /// - `closed`: the edge is never traversable
    #[must_use]
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register(COST_FN_CLOSED, || None);
        registry
    }

    /// Register (or replace) a function under `name`.
    pub fn register<F>(&mut self, name: impl Into<String>, function: F)
    where
        F: Fn() -> Option<Cost> + Send + Sync + 'static,
    {
        self.functions
            .insert(CostFnId::new(name), Arc::new(function));
    }

    /// Check if a function is registered.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.functions.contains_key(&CostFnId::new(name))
    }

    /// Registered function names in sorted order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.functions.keys().map(CostFnId::as_str)
    }

    /// Current cost of an edge.
    ///
    /// - `Disabled` → `Ok(None)`
    /// - `Fixed(c)` → `Ok(Some(c))`
    /// - `Computed(name)` → the function's answer, or
    ///   `NavError::UnknownCostFunction` if `name` is not registered
    pub fn evaluate(&self, cost: &EdgeCost) -> Result<Option<Cost>, NavError> {
        match cost {
            EdgeCost::Disabled => Ok(None),
            EdgeCost::Fixed(c) => Ok(Some(*c)),
            EdgeCost::Computed(id) => {
                let function = self
                    .functions
                    .get(id)
                    .ok_or_else(|| NavError::UnknownCostFunction(id.0.clone()))?;
                Ok(function())
            }
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};

    #[test]
    fn static_costs_need_no_functions() {
        let registry = CostRegistry::new();
        assert_eq!(registry.evaluate(&EdgeCost::Disabled).expect("eval"), None);
        assert_eq!(
            registry.evaluate(&EdgeCost::Fixed(Cost(300))).expect("eval"),
            Some(Cost(300))
        );
    }

    #[test]
    fn builtin_closed_is_never_open() {
        let registry = CostRegistry::with_builtins();
        assert!(registry.contains("closed"));
        assert_eq!(
            registry
                .evaluate(&EdgeCost::computed("closed"))
                .expect("eval"),
            None
        );
    }

    #[test]
    fn unknown_function_is_an_error() {
        let registry = CostRegistry::with_builtins();
        let result = registry.evaluate(&EdgeCost::computed(";e $mystery"));
        assert!(matches!(result, Err(NavError::UnknownCostFunction(name)) if name == ";e $mystery"));
    }

    #[test]
    fn functions_see_captured_state() {
        let winter = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&winter);

        let mut registry = CostRegistry::new();
        registry.register("icy_pass", move || {
            if flag.load(Ordering::Relaxed) {
                None
            } else {
                Some(Cost(5000))
            }
        });

        let edge = EdgeCost::computed("icy_pass");
        assert_eq!(registry.evaluate(&edge).expect("eval"), Some(Cost(5000)));
        winter.store(true, Ordering::Relaxed);
        assert_eq!(registry.evaluate(&edge).expect("eval"), None);
    }

    #[test]
    fn names_are_sorted() {
        let mut registry = CostRegistry::with_builtins();
        registry.register("ferry", || Some(Cost(20_000)));
        let names: Vec<_> = registry.names().collect();
        assert_eq!(names, vec!["closed", "ferry"]);
    }
}
