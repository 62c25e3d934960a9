//! Operational Context Providers
//!
//! Maintenance history and cycle counts live in external systems
//! (maintenance database, MES). The store asks an [`OperationalContext`]
//! for them on every recomputation.

use crate::sync;
use feature_engine::MachineContext;
use std::collections::HashMap;
use std::sync::RwLock;

/// Source of per-machine operational context
pub trait OperationalContext: Send + Sync {
    /// Context for a machine; unknown machines get a default
    fn context(&self, machine_id: &str) -> MachineContext;
}

/// Provider with no external data; every machine reports zeros
#[derive(Debug, Clone, Copy, Default)]
pub struct NoContext;

impl OperationalContext for NoContext {
    fn context(&self, _machine_id: &str) -> MachineContext {
        MachineContext::default()
    }
}

/// In-memory provider, updated by whoever syncs maintenance records
#[derive(Debug, Default)]
pub struct StaticContext {
    entries: RwLock<HashMap<String, MachineContext>>,
    fallback: MachineContext,
}

impl StaticContext {
    /// Create an empty provider
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a provider returning `fallback` for unknown machines
    pub fn with_fallback(fallback: MachineContext) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            fallback,
        }
    }

    /// Set context for a machine
    pub fn set(&self, machine_id: impl Into<String>, context: MachineContext) {
        sync::write(&self.entries).insert(machine_id.into(), context);
    }
}

impl OperationalContext for StaticContext {
    fn context(&self, machine_id: &str) -> MachineContext {
        sync::read(&self.entries)
            .get(machine_id)
            .copied()
            .unwrap_or(self.fallback)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_static_context_lookup() {
        let provider = StaticContext::with_fallback(MachineContext {
            hours_since_maintenance: 1.0,
            cumulative_cycles: 2,
        });
        provider.set(
            "CNC-ALPHA-921",
            MachineContext {
                hours_since_maintenance: 312.0,
                cumulative_cycles: 104_000,
            },
        );

        assert_eq!(provider.context("CNC-ALPHA-921").cumulative_cycles, 104_000);
        assert_eq!(provider.context("LATHE-7").cumulative_cycles, 2);
        assert_eq!(NoContext.context("LATHE-7"), MachineContext::default());
    }
}
