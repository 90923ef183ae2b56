//! The gated step-invocation primitive.
//!
//! Every conformance step goes through [`Dispatcher::run_step`], so skip
//! semantics and step logging are uniform regardless of step identity.

use std::sync::Arc;
use std::time::Instant;

use parking_lot::Mutex;
use serde_json::Value;
use tracing::{debug, info};

use super::registry::{CapabilityRegistry, SkipReason};
use crate::error::Result;
use crate::exchange::{CallArgs, Exchange};
use crate::probe::{ProbeRegistry, Step};

/// What happened to one dispatched step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepOutcome {
    Passed,
    Skipped(SkipReason),
    /// The probe failed; carries the error tag.
    Failed(&'static str),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepRecord {
    pub step: Step,
    pub outcome: StepOutcome,
}

/// Runs steps against a client, gated by capability and probe presence.
pub struct Dispatcher {
    probes: Arc<ProbeRegistry>,
    journal: Mutex<Vec<StepRecord>>,
}

impl Dispatcher {
    #[must_use]
    pub fn new(probes: Arc<ProbeRegistry>) -> Self {
        Self {
            probes,
            journal: Mutex::new(Vec::new()),
        }
    }

    #[must_use]
    pub fn probes(&self) -> &ProbeRegistry {
        &self.probes
    }

    /// Run one step.
    ///
    /// Returns `Ok(None)` when the step is skipped. Probe results and
    /// failures pass through unchanged.
    pub async fn run_step(
        &self,
        step: impl Into<Step>,
        exchange: &mut dyn Exchange,
        args: CallArgs,
    ) -> Result<Option<Value>> {
        let step = step.into();
        let resolved = CapabilityRegistry::new(exchange.capabilities(), &self.probes).resolve(step);

        let probe = match resolved {
            Ok(probe) => probe,
            Err(reason) => {
                info!(exchange = %exchange.id(), %step, "# Skipping Test ({reason})");
                self.record(step, StepOutcome::Skipped(reason));
                return Ok(None);
            }
        };

        info!(exchange = %exchange.id(), %step, %args, "Testing");
        let start = Instant::now();
        let result = probe.run(exchange, &args).await;
        let elapsed_ms = start.elapsed().as_millis() as u64;

        match result {
            Ok(value) => {
                debug!(%step, elapsed_ms, "Step passed");
                self.record(step, StepOutcome::Passed);
                Ok(Some(value))
            }
            Err(err) => {
                debug!(%step, elapsed_ms, error = %err, "Step failed");
                self.record(step, StepOutcome::Failed(err.tag()));
                Err(err)
            }
        }
    }

    fn record(&self, step: Step, outcome: StepOutcome) {
        self.journal.lock().push(StepRecord { step, outcome });
    }

    /// Every step dispatched so far, in order.
    #[must_use]
    pub fn journal(&self) -> Vec<StepRecord> {
        self.journal.lock().clone()
    }

    /// Steps that ran and passed, in order.
    #[must_use]
    pub fn passed(&self) -> Vec<Step> {
        self.journal
            .lock()
            .iter()
            .filter(|record| record.outcome == StepOutcome::Passed)
            .map(|record| record.step)
            .collect()
    }

    /// Forget recorded steps; the failover loop calls this per attempt.
    pub fn clear_journal(&self) {
        self.journal.lock().clear();
    }
}
