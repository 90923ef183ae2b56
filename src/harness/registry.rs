//! Capability gate: declared support plus probe availability.

use std::fmt;
use std::sync::Arc;

use crate::exchange::Capabilities;
use crate::probe::{Probe, ProbeRegistry, Step};

/// Why a step did not run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// The client does not declare the capability.
    NotSupported,
    /// No probe is registered for the step.
    ProbeUnavailable,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotSupported => f.write_str("not supported"),
            Self::ProbeUnavailable => f.write_str("probe unavailable"),
        }
    }
}

/// Read-only view joining a client's capabilities with the probe table.
#[derive(Clone, Copy)]
pub struct CapabilityRegistry<'a> {
    capabilities: &'a Capabilities,
    probes: &'a ProbeRegistry,
}

impl<'a> CapabilityRegistry<'a> {
    #[must_use]
    pub fn new(capabilities: &'a Capabilities, probes: &'a ProbeRegistry) -> Self {
        Self {
            capabilities,
            probes,
        }
    }

    #[must_use]
    pub fn is_supported(&self, step: Step) -> bool {
        self.capabilities.supports(step.capability())
    }

    #[must_use]
    pub fn has_probe(&self, step: Step) -> bool {
        self.probes.contains(step)
    }

    /// The probe to run, or why the step is skipped. Capability is checked
    /// first.
    pub fn resolve(&self, step: Step) -> Result<Arc<dyn Probe>, SkipReason> {
        if !self.is_supported(step) {
            return Err(SkipReason::NotSupported);
        }
        self.probes.get(step).ok_or(SkipReason::ProbeUnavailable)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exchange::Method;
    use crate::probe::Scenario;

    #[test]
    fn unsupported_wins_over_missing_probe() {
        let caps = Capabilities::new();
        let probes = ProbeRegistry::new();
        let registry = CapabilityRegistry::new(&caps, &probes);

        assert_eq!(
            registry.resolve(Step::Call(Method::FetchLedger)).err(),
            Some(SkipReason::NotSupported)
        );
    }

    #[test]
    fn supported_without_probe_is_unavailable() {
        let caps = Capabilities::new().with(Method::FetchLedger);
        let probes = ProbeRegistry::new();
        let registry = CapabilityRegistry::new(&caps, &probes);

        assert!(registry.is_supported(Step::Call(Method::FetchLedger)));
        assert!(!registry.has_probe(Step::Call(Method::FetchLedger)));
        assert_eq!(
            registry.resolve(Step::Call(Method::FetchLedger)).err(),
            Some(SkipReason::ProbeUnavailable)
        );
    }

    #[test]
    fn scenarios_use_their_method_capability() {
        let caps = Capabilities::new().with(Method::CreateOrder);
        let probes = ProbeRegistry::builtin();
        let registry = CapabilityRegistry::new(&caps, &probes);

        assert!(registry.resolve(Scenario::InvalidOrder.into()).is_ok());
        assert_eq!(
            registry.resolve(Scenario::OrderNotFound.into()).err(),
            Some(SkipReason::NotSupported)
        );
    }

    #[test]
    fn skip_reasons_render_for_logs() {
        assert_eq!(SkipReason::NotSupported.to_string(), "not supported");
        assert_eq!(SkipReason::ProbeUnavailable.to_string(), "probe unavailable");
    }
}
