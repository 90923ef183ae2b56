//! Test probes.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::Value;

use crate::error::{ExchangeError, Result};
use crate::exchange::{CallArgs, Exchange};
use crate::probe::{Probe, ProbeRegistry, Step};

/// Shared log of `(step, args)` pairs in invocation order.
pub type ProbeLog = Arc<Mutex<Vec<(Step, CallArgs)>>>;

/// Records each invocation and returns a fixed value.
pub struct RecordingProbe {
    step: Step,
    log: ProbeLog,
    response: Value,
}

impl RecordingProbe {
    pub fn new(step: Step, log: ProbeLog) -> Self {
        Self {
            step,
            log,
            response: Value::Null,
        }
    }

    pub fn with_response(mut self, response: Value) -> Self {
        self.response = response;
        self
    }
}

#[async_trait]
impl Probe for RecordingProbe {
    async fn run(&self, _exchange: &mut dyn Exchange, args: &CallArgs) -> Result<Value> {
        self.log.lock().unwrap().push((self.step, args.clone()));
        Ok(self.response.clone())
    }
}

/// Fails every invocation with a fixed client error.
pub struct FailingProbe {
    error: ExchangeError,
}

impl FailingProbe {
    pub fn new(error: ExchangeError) -> Self {
        Self { error }
    }
}

#[async_trait]
impl Probe for FailingProbe {
    async fn run(&self, _exchange: &mut dyn Exchange, _args: &CallArgs) -> Result<Value> {
        Err(self.error.clone().into())
    }
}

/// A registry with a [`RecordingProbe`] for each step, sharing one log.
pub fn recording_registry<I, S>(steps: I) -> (ProbeRegistry, ProbeLog)
where
    I: IntoIterator<Item = S>,
    S: Into<Step>,
{
    let log = ProbeLog::default();
    let mut registry = ProbeRegistry::new();
    for step in steps {
        let step = step.into();
        registry.register(step, RecordingProbe::new(step, Arc::clone(&log)));
    }
    (registry, log)
}

/// Steps recorded so far.
pub fn recorded_steps(log: &ProbeLog) -> Vec<Step> {
    log.lock().unwrap().iter().map(|(step, _)| *step).collect()
}
