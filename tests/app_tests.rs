//! Application-level runs over pre-built sandbox clients.

mod support;

use std::sync::Arc;

use conformance::adapter::sandbox::FailureRule;
use conformance::app::{App, RunStatus};
use conformance::config::ExchangeSettings;
use conformance::error::ExchangeErrorKind;
use conformance::exchange::{Exchange, Method};
use conformance::harness::RunOutcome;
use conformance::probe::ProbeRegistry;

fn builtin() -> Arc<ProbeRegistry> {
    Arc::new(ProbeRegistry::builtin())
}

#[tokio::test]
async fn single_symbol_mode_never_rotates_routes() {
    let config = support::config_with_routes(&["", "proxy-a/"]);
    let mut exchange = support::sandbox("paper", &[Method::FetchTicker, Method::FetchStatus]).build();
    let journal = exchange.journal();

    let status = App::run_exchange(&config, &mut exchange, None, Some("ETH/BTC"), builtin())
        .await
        .unwrap();

    assert_eq!(status, RunStatus::SymbolTested);
    let journal = journal.lock();
    assert!(journal.routes.is_empty());
    assert_eq!(journal.methods(), vec![Method::LoadMarkets, Method::FetchTicker]);
    assert_eq!(journal.calls[1].args.symbol.as_deref(), Some("ETH/BTC"));
}

#[tokio::test]
async fn configured_proxy_is_tried_first() {
    let config = support::config_with_routes(&["", "proxy-a/", "proxy-b/"]);
    let settings = ExchangeSettings {
        proxy: Some("proxy-b/".into()),
        ..ExchangeSettings::default()
    };
    let mut exchange = support::sandbox("paper", &[Method::FetchTicker]).build();

    let status = App::run_exchange(&config, &mut exchange, Some(&settings), None, builtin())
        .await
        .unwrap();

    assert_eq!(
        status,
        RunStatus::Completed(RunOutcome::Success {
            attempts: 1,
            route: "proxy-b/".into()
        })
    );
    assert_eq!(exchange.route(), "proxy-b/");
}

#[tokio::test]
async fn authentication_failure_completes_without_raising() {
    let config = support::config_with_routes(&["", "proxy-a/"]);
    let mut exchange = support::sandbox("paper", &[Method::FetchTicker])
        .fail(FailureRule::new(Method::FetchTicker, ExchangeErrorKind::AuthenticationError))
        .build();

    let status = App::run_exchange(&config, &mut exchange, None, None, builtin())
        .await
        .unwrap();

    assert!(matches!(
        status,
        RunStatus::Completed(RunOutcome::AuthAbort { attempts: 1, .. })
    ));
}
