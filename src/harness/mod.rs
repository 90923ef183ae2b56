//! The conformance engine: capability gate, selection heuristics, step
//! dispatch, the fixed script, and route failover.

mod classify;
mod dispatcher;
mod failover;
mod registry;
mod script;
mod selector;

pub use classify::{classify, classify_kind, FailureKind, TransientCause};
pub use dispatcher::{Dispatcher, StepOutcome, StepRecord};
pub use failover::{Attempt, FailoverController, RunOutcome};
pub use registry::{CapabilityRegistry, SkipReason};
pub use script::{verify_markets, ConformanceScript, UNRELIABLE_ORDER_BOOK};
pub use selector::{
    first_eligible, is_dated_contract, select_code, select_symbol, summarize_symbols,
    PREFERRED_CODES, PREFERRED_SYMBOLS, WELL_KNOWN_SYMBOLS,
};
