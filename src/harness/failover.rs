//! Route failover around a full conformance pass.
//!
//! Each attempt runs the whole script over one access route. Transient
//! failures rotate to the next route (wrapping) until every route has been
//! tried once; authentication and nonce failures end the run cleanly; any
//! other failure is re-raised unchanged.

use async_trait::async_trait;
use tracing::{error, info, warn};

use super::classify::{classify, FailureKind};
use crate::error::Result;
use crate::exchange::Exchange;

/// Longest failure message logged per attempt, in characters.
const MAX_LOGGED_MESSAGE: usize = 200;

/// One full pass the controller can retry.
#[async_trait]
pub trait Attempt: Send + Sync {
    async fn attempt(&self, exchange: &mut dyn Exchange) -> Result<()>;
}

/// How a failover run ended, short of a re-raised failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    Success { attempts: usize, route: String },
    /// Every route failed transiently; the last failure is logged only.
    RetriesExhausted { attempts: usize, last_error: String },
    AuthAbort { attempts: usize, error: String },
    NonceAbort { attempts: usize, error: String },
}

impl RunOutcome {
    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    #[must_use]
    pub fn attempts(&self) -> usize {
        match self {
            Self::Success { attempts, .. }
            | Self::RetriesExhausted { attempts, .. }
            | Self::AuthAbort { attempts, .. }
            | Self::NonceAbort { attempts, .. } => *attempts,
        }
    }
}

/// Rotation position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Cursor {
    index: usize,
    attempts_left: usize,
}

impl Cursor {
    fn advance(&mut self, len: usize) {
        self.index = (self.index + 1) % len;
        self.attempts_left -= 1;
    }
}

pub struct FailoverController {
    routes: Vec<String>,
    preferred: Option<String>,
}

impl FailoverController {
    /// An empty route list is treated as the direct route alone.
    #[must_use]
    pub fn new(routes: Vec<String>) -> Self {
        let routes = if routes.is_empty() {
            vec![String::new()]
        } else {
            routes
        };
        Self {
            routes,
            preferred: None,
        }
    }

    #[must_use]
    pub fn with_preferred_route(mut self, route: Option<String>) -> Self {
        self.preferred = route;
        self
    }

    #[must_use]
    pub fn routes(&self) -> &[String] {
        &self.routes
    }

    /// Starting index: the preferred route, else the client's current
    /// route, else 0.
    #[must_use]
    pub fn seed_index(&self, current_route: &str) -> usize {
        if let Some(preferred) = &self.preferred {
            if let Some(index) = self.position(preferred) {
                return index;
            }
            warn!(route = %preferred, "Preferred route is not in the route list, ignoring");
        }
        self.position(current_route).unwrap_or(0)
    }

    fn position(&self, route: &str) -> Option<usize> {
        self.routes.iter().position(|candidate| candidate == route)
    }

    /// Run `attempt` until it succeeds, routes run out, or a failure ends
    /// the run.
    pub async fn run<A>(&self, attempt: &A, exchange: &mut dyn Exchange) -> Result<RunOutcome>
    where
        A: Attempt + ?Sized,
    {
        let len = self.routes.len();
        let mut cursor = Cursor {
            index: self.seed_index(exchange.route()),
            attempts_left: len,
        };
        let mut last_error = String::new();

        while cursor.attempts_left > 0 {
            let attempts = len - cursor.attempts_left + 1;
            let route = &self.routes[cursor.index];

            exchange.set_route(route);
            if !route.is_empty() {
                let origin = exchange.new_origin();
                exchange.set_origin(origin);
            }
            info!(
                exchange = %exchange.id(),
                attempt = attempts,
                max_attempts = len,
                route = %display_route(route),
                "Starting conformance attempt"
            );

            let err = match attempt.attempt(exchange).await {
                Ok(()) => {
                    info!(exchange = %exchange.id(), attempts, "Conformance run passed");
                    return Ok(RunOutcome::Success {
                        attempts,
                        route: route.clone(),
                    });
                }
                Err(err) => err,
            };

            cursor.advance(len);
            let message = err.to_string();
            warn!("[{}] {}", err.tag(), truncate(&message, MAX_LOGGED_MESSAGE));

            match classify(&err) {
                FailureKind::Transient(cause) => {
                    info!(%cause, attempts_left = cursor.attempts_left, "Rotating route");
                    last_error = message;
                }
                FailureKind::Authentication => {
                    return Ok(RunOutcome::AuthAbort {
                        attempts,
                        error: message,
                    });
                }
                FailureKind::InvalidNonce => {
                    return Ok(RunOutcome::NonceAbort {
                        attempts,
                        error: message,
                    });
                }
                kind => {
                    error!(?kind, tag = err.tag(), "Conformance run failed");
                    return Err(err);
                }
            }
        }

        warn!(attempts = len, "All routes exhausted");
        Ok(RunOutcome::RetriesExhausted {
            attempts: len,
            last_error,
        })
    }
}

fn display_route(route: &str) -> &str {
    if route.is_empty() {
        "direct"
    } else {
        route
    }
}

/// Truncate to at most `max` characters.
fn truncate(message: &str, max: usize) -> &str {
    match message.char_indices().nth(max) {
        Some((end, _)) => &message[..end],
        None => message,
    }
}
