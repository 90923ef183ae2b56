//! Probes: the per-step checks the dispatcher invokes.
//!
//! A probe calls one client operation with the step's arguments and asserts
//! the response shape. Probes are registered once at startup in a
//! [`ProbeRegistry`]; a step with no registered probe is skipped, not failed.

mod builtin;
mod scenario;
mod step;

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::Result;
use crate::exchange::{CallArgs, Exchange};

pub use builtin::{LoadMarketsProbe, Shape, ShapeProbe};
pub use scenario::{balance_is_empty, ScenarioProbe};
pub use step::{Scenario, Step};

/// A step-specific check against a live client.
#[async_trait]
pub trait Probe: Send + Sync {
    /// Run the check, returning the client's response.
    async fn run(&self, exchange: &mut dyn Exchange, args: &CallArgs) -> Result<Value>;
}

/// Statically registered step → probe table.
#[derive(Default, Clone)]
pub struct ProbeRegistry {
    probes: HashMap<Step, Arc<dyn Probe>>,
}

impl ProbeRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a probe, replacing any earlier one for the same step.
    pub fn register<P>(&mut self, step: impl Into<Step>, probe: P)
    where
        P: Probe + 'static,
    {
        self.probes.insert(step.into(), Arc::new(probe));
    }

    /// Builder-style [`ProbeRegistry::register`].
    #[must_use]
    pub fn with<P>(mut self, step: impl Into<Step>, probe: P) -> Self
    where
        P: Probe + 'static,
    {
        self.register(step, probe);
        self
    }

    /// Drop the probe for a step, if any.
    pub fn unregister(&mut self, step: impl Into<Step>) {
        self.probes.remove(&step.into());
    }

    #[must_use]
    pub fn get(&self, step: Step) -> Option<Arc<dyn Probe>> {
        self.probes.get(&step).cloned()
    }

    #[must_use]
    pub fn contains(&self, step: Step) -> bool {
        self.probes.contains_key(&step)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.probes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.probes.is_empty()
    }

    /// The default probe set shipped with the harness.
    #[must_use]
    pub fn builtin() -> Self {
        builtin::register_all(Self::new())
    }
}
