//! Route failover around full conformance attempts.

mod support;

use conformance::adapter::sandbox::{FailureRule, SandboxExchange};
use conformance::error::{AssertionError, Error, ExchangeError, ExchangeErrorKind};
use conformance::exchange::{Exchange, Method};
use conformance::harness::{FailoverController, RunOutcome};
use conformance::testkit::attempt::ScriptedAttempt;
use conformance::testkit::domain::market;

fn routes(routes: &[&str]) -> Vec<String> {
    routes.iter().map(|route| route.to_string()).collect()
}

fn timeout() -> Error {
    ExchangeError::request_timeout("request timed out after 20000 ms").into()
}

#[tokio::test]
async fn timeouts_on_every_route_exhaust_without_raising() {
    let controller = FailoverController::new(routes(&["", "proxy-a/", "proxy-b/"]));
    let attempt = ScriptedAttempt::failing_with(3, timeout);
    let mut exchange = support::sandbox("paper", &[]).build();

    let outcome = controller.run(&attempt, &mut exchange).await.unwrap();

    assert_eq!(attempt.count(), 3);
    assert_eq!(attempt.routes(), vec!["", "proxy-a/", "proxy-b/"]);
    assert!(matches!(
        outcome,
        RunOutcome::RetriesExhausted { attempts: 3, ref last_error } if last_error.contains("timed out")
    ));
}

#[tokio::test]
async fn rotation_wraps_from_the_seeded_route() {
    let controller = FailoverController::new(routes(&["", "proxy-a/", "proxy-b/"]));
    let attempt = ScriptedAttempt::failing_with(3, || {
        ExchangeError::new(ExchangeErrorKind::DdosProtection, "cloudflare").into()
    });
    let mut exchange = support::sandbox("paper", &[]).build();
    exchange.set_route("proxy-b/");

    controller.run(&attempt, &mut exchange).await.unwrap();

    assert_eq!(attempt.routes(), vec!["proxy-b/", "", "proxy-a/"]);
}

#[tokio::test]
async fn preferred_route_seeds_the_rotation() {
    let controller = FailoverController::new(routes(&["", "proxy-a/", "proxy-b/"]))
        .with_preferred_route(Some("proxy-a/".into()));
    let attempt = ScriptedAttempt::failing_with(1, timeout);
    let mut exchange = support::sandbox("paper", &[]).build();

    let outcome = controller.run(&attempt, &mut exchange).await.unwrap();

    assert_eq!(attempt.routes(), vec!["proxy-a/", "proxy-b/"]);
    assert_eq!(
        outcome,
        RunOutcome::Success {
            attempts: 2,
            route: "proxy-b/".into()
        }
    );
}

#[tokio::test]
async fn authentication_failure_stops_after_one_attempt() {
    let controller = FailoverController::new(routes(&["", "proxy-a/", "proxy-b/"]));
    let attempt = ScriptedAttempt::new().with_results(vec![Err(ExchangeError::new(
        ExchangeErrorKind::AuthenticationError,
        "invalid signature",
    )
    .into())]);
    let mut exchange = support::sandbox("paper", &[]).build();

    let outcome = controller.run(&attempt, &mut exchange).await.unwrap();

    assert_eq!(attempt.count(), 1);
    assert!(matches!(outcome, RunOutcome::AuthAbort { attempts: 1, .. }));
}

#[tokio::test]
async fn invalid_nonce_stops_cleanly() {
    let controller = FailoverController::new(routes(&["", "proxy-a/"]));
    let attempt = ScriptedAttempt::new().with_results(vec![
        Err(timeout()),
        Err(ExchangeError::new(ExchangeErrorKind::InvalidNonce, "nonce too small").into()),
    ]);
    let mut exchange = support::sandbox("paper", &[]).build();

    let outcome = controller.run(&attempt, &mut exchange).await.unwrap();

    assert_eq!(attempt.count(), 2);
    assert!(matches!(outcome, RunOutcome::NonceAbort { attempts: 2, .. }));
}

#[tokio::test]
async fn unclassified_failure_is_reraised_unchanged() {
    let controller = FailoverController::new(routes(&["", "proxy-a/"]));
    let attempt = ScriptedAttempt::new().with_results(vec![Err(ExchangeError::new(
        ExchangeErrorKind::BadSymbol,
        "unknown symbol XYZ/ABC",
    )
    .into())]);
    let mut exchange = support::sandbox("paper", &[]).build();

    let err = controller.run(&attempt, &mut exchange).await.unwrap_err();

    assert_eq!(attempt.count(), 1);
    assert!(matches!(
        err,
        Error::Exchange(ExchangeError { kind: ExchangeErrorKind::BadSymbol, ref message })
            if message == "unknown symbol XYZ/ABC"
    ));
}

#[tokio::test]
async fn fresh_origin_only_on_forwarding_routes() {
    let controller = FailoverController::new(routes(&["", "proxy-a/", "proxy-b/"]));
    let attempt = ScriptedAttempt::failing_with(3, timeout);
    let mut exchange = support::sandbox("paper", &[]).build();
    let journal = exchange.journal();

    controller.run(&attempt, &mut exchange).await.unwrap();

    let journal = journal.lock();
    assert_eq!(journal.routes, vec!["", "proxy-a/", "proxy-b/"]);
    assert_eq!(journal.origins.len(), 2);
    assert_ne!(journal.origins[0], journal.origins[1]);
}

#[tokio::test]
async fn structural_failure_is_never_retried() {
    let controller = FailoverController::new(routes(&["", "proxy-a/", "proxy-b/"]));
    let script = support::builtin_script();
    let mut exchange = SandboxExchange::builder("broken")
        .capability(Method::LoadMarkets)
        .market(market("BTC/USD"))
        .symbols(vec!["BTC/USD".into(), "ETH/BTC".into()])
        .build();
    let journal = exchange.journal();

    let err = controller.run(&script, &mut exchange).await.unwrap_err();

    assert!(matches!(
        err,
        Error::Assertion(AssertionError::SymbolCountMismatch { .. })
    ));
    assert_eq!(journal.lock().routes.len(), 1);
}

#[tokio::test]
async fn script_recovers_on_the_next_route() {
    let controller = FailoverController::new(routes(&["", "proxy-a/"]));
    let script = support::builtin_script();
    let mut exchange = support::sandbox("paper", &[Method::LoadMarkets, Method::FetchTicker])
        .fail(
            FailureRule::new(Method::LoadMarkets, ExchangeErrorKind::ExchangeNotAvailable)
                .on_route(""),
        )
        .build();

    let outcome = controller.run(&script, &mut exchange).await.unwrap();

    assert_eq!(
        outcome,
        RunOutcome::Success {
            attempts: 2,
            route: "proxy-a/".into()
        }
    );
    assert!(script.dispatcher().passed().len() >= 2);
}
