//! Capability-gated step dispatch.

mod support;

use std::sync::Arc;

use conformance::error::{Error, ExchangeError, ExchangeErrorKind};
use conformance::exchange::{CallArgs, Method};
use conformance::harness::{Dispatcher, SkipReason, StepOutcome};
use conformance::probe::{ProbeRegistry, Scenario, Step};
use conformance::testkit::probe::{recorded_steps, recording_registry, FailingProbe};
use serde_json::Value;

#[tokio::test]
async fn unsupported_step_never_invokes_its_probe() {
    let (registry, log) = recording_registry([Method::FetchTicker, Method::FetchTrades]);
    let dispatcher = Dispatcher::new(Arc::new(registry));
    let mut exchange = support::sandbox("paper", &[Method::FetchTrades]).build();

    let result = dispatcher
        .run_step(Method::FetchTicker, &mut exchange, CallArgs::symbol("BTC/USD"))
        .await
        .unwrap();

    assert!(result.is_none());
    assert!(recorded_steps(&log).is_empty());
    assert_eq!(
        dispatcher.journal()[0].outcome,
        StepOutcome::Skipped(SkipReason::NotSupported)
    );
}

#[tokio::test]
async fn missing_probe_is_a_skip_not_a_failure() {
    let dispatcher = Dispatcher::new(Arc::new(ProbeRegistry::new()));
    let mut exchange = support::sandbox("paper", &[Method::FetchLedger]).build();

    let result = dispatcher
        .run_step(Method::FetchLedger, &mut exchange, CallArgs::code(Some("BTC")))
        .await
        .unwrap();

    assert!(result.is_none());
    assert_eq!(
        dispatcher.journal()[0].outcome,
        StepOutcome::Skipped(SkipReason::ProbeUnavailable)
    );
    // The client itself is never called for a skipped step.
    assert!(exchange.journal().lock().calls.is_empty());
}

#[tokio::test]
async fn supported_step_passes_args_through() {
    let (registry, log) = recording_registry([Method::FetchOrders]);
    let dispatcher = Dispatcher::new(Arc::new(registry));
    let mut exchange = support::sandbox("paper", &[Method::FetchOrders]).build();

    let args = CallArgs::symbol("ETH/BTC").with_param("limit", 5);
    let result = dispatcher
        .run_step(Method::FetchOrders, &mut exchange, args.clone())
        .await
        .unwrap();

    assert_eq!(result, Some(Value::Null));
    let log = log.lock().unwrap();
    assert_eq!(log.len(), 1);
    assert_eq!(log[0], (Step::Call(Method::FetchOrders), args));
}

#[tokio::test]
async fn probe_failure_propagates_unchanged() {
    let registry = ProbeRegistry::new().with(
        Method::FetchBalance,
        FailingProbe::new(ExchangeError::new(
            ExchangeErrorKind::AuthenticationError,
            "invalid api key",
        )),
    );
    let dispatcher = Dispatcher::new(Arc::new(registry));
    let mut exchange = support::sandbox("paper", &[Method::FetchBalance]).build();

    let err = dispatcher
        .run_step(Method::FetchBalance, &mut exchange, CallArgs::none())
        .await
        .unwrap_err();

    assert!(matches!(
        &err,
        Error::Exchange(e) if e.kind == ExchangeErrorKind::AuthenticationError && e.message == "invalid api key"
    ));
    assert_eq!(
        dispatcher.journal()[0].outcome,
        StepOutcome::Failed("AuthenticationError")
    );
}

#[tokio::test]
async fn scenario_is_gated_by_its_method_capability() {
    let (registry, log) = recording_registry([Scenario::OrderNotFound]);
    let dispatcher = Dispatcher::new(Arc::new(registry));

    let mut without = support::sandbox("paper", &[Method::CreateOrder]).build();
    dispatcher
        .run_step(Scenario::OrderNotFound, &mut without, CallArgs::symbol("BTC/USD"))
        .await
        .unwrap();
    assert!(recorded_steps(&log).is_empty());

    let mut with = support::sandbox("paper", &[Method::CancelOrder]).build();
    dispatcher
        .run_step(Scenario::OrderNotFound, &mut with, CallArgs::symbol("BTC/USD"))
        .await
        .unwrap();
    assert_eq!(recorded_steps(&log), vec![Step::Scenario(Scenario::OrderNotFound)]);
}

#[tokio::test]
async fn no_step_runs_for_a_client_declaring_nothing() {
    let steps: Vec<Step> = Method::ALL.iter().copied().map(Step::from).collect();
    let (registry, log) = recording_registry(steps.clone());
    let dispatcher = Dispatcher::new(Arc::new(registry));
    let mut exchange = support::sandbox("bare", &[]).build();

    for step in steps {
        let result = dispatcher
            .run_step(step, &mut exchange, CallArgs::symbol("BTC/USD"))
            .await
            .unwrap();
        assert!(result.is_none());
    }

    assert!(recorded_steps(&log).is_empty());
    assert!(dispatcher.passed().is_empty());
}
