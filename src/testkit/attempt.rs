//! Scripted conformance attempts.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::error::{Error, Result};
use crate::exchange::Exchange;
use crate::harness::Attempt;

/// An attempt that pops pre-loaded results (defaults to `Ok(())` when
/// exhausted) and records the route each attempt ran on.
pub struct ScriptedAttempt {
    results: Mutex<VecDeque<Result<()>>>,
    routes: Arc<Mutex<Vec<String>>>,
    count: Arc<AtomicU32>,
}

impl ScriptedAttempt {
    pub fn new() -> Self {
        Self {
            results: Mutex::new(VecDeque::new()),
            routes: Arc::new(Mutex::new(Vec::new())),
            count: Arc::new(AtomicU32::new(0)),
        }
    }

    pub fn with_results(self, results: Vec<Result<()>>) -> Self {
        *self.results.lock().unwrap() = results.into();
        self
    }

    /// Fail every attempt with errors produced by `make`.
    pub fn failing_with<F>(attempts: usize, make: F) -> Self
    where
        F: Fn() -> Error,
    {
        Self::new().with_results((0..attempts).map(|_| Err(make())).collect())
    }

    pub fn count(&self) -> u32 {
        self.count.load(Ordering::SeqCst)
    }

    /// Routes in the order attempts ran on them.
    pub fn routes(&self) -> Vec<String> {
        self.routes.lock().unwrap().clone()
    }
}

impl Default for ScriptedAttempt {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Attempt for ScriptedAttempt {
    async fn attempt(&self, exchange: &mut dyn Exchange) -> Result<()> {
        self.count.fetch_add(1, Ordering::SeqCst);
        self.routes.lock().unwrap().push(exchange.route().to_string());
        self.results.lock().unwrap().pop_front().unwrap_or(Ok(()))
    }
}
