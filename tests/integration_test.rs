use axum::http::StatusCode;
use lotsignal::api::{self, AppState};
use lotsignal::datasource::BrokerageError;
use lotsignal::{
    Bar, CycleSettings, Decimal, Evaluator, MockBrokerage, StrategyConfig, Symbol, TimeNs,
    TradingContext,
};
use std::sync::Arc;
use tower::util::ServiceExt;

fn setup_test_state(mock: MockBrokerage) -> AppState {
    let settings = CycleSettings::new(
        Symbol::new("BTC/USD".to_string()),
        StrategyConfig {
            settlement_delay_ms: 0,
            hold_delay_ms: 0,
            ..StrategyConfig::default()
        },
    );
    let context = TradingContext::new(Decimal::from_str_canonical("10000").unwrap(), TimeNs::now());
    let evaluator = Evaluator::new(Arc::new(mock), settings, context);

    AppState::new(evaluator)
}

fn setup_test_app(mock: MockBrokerage) -> axum::Router {
    api::create_router(setup_test_state(mock))
}

async fn send(app: axum::Router, method: &str, uri: &str) -> (StatusCode, serde_json::Value) {
    let request = axum::http::Request::builder()
        .method(method)
        .uri(uri)
        .body(axum::body::Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    let status = response.status();

    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, serde_json::from_slice(&body).unwrap())
}

#[tokio::test]
async fn test_health_endpoint() {
    let app = setup_test_app(MockBrokerage::new());
    let (status, body) = send(app, "GET", "/health").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn test_ready_endpoint_reports_symbol() {
    let app = setup_test_app(MockBrokerage::new());
    let (status, body) = send(app, "GET", "/ready").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ready");
    assert_eq!(body["symbol"], "BTC/USD");
}

#[tokio::test]
async fn test_ready_does_not_wait_for_running_cycle() {
    let state = setup_test_state(MockBrokerage::new());
    let app = api::create_router(state.clone());
    let _cycle_in_progress = state.evaluator.lock().await;

    let (status, body) = tokio::time::timeout(
        std::time::Duration::from_secs(1),
        send(app, "GET", "/ready"),
    )
    .await
    .expect("ready blocked on the evaluator lock");

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["symbol"], "BTC/USD");
    assert_eq!(body["equity"], 10000.0);
}

#[tokio::test]
async fn test_evaluate_waiting_for_data_envelope() {
    let bars: Vec<Bar> = (0..5)
        .map(|i| Bar {
            time: TimeNs::now(),
            close: Decimal::from(rust_decimal::Decimal::from(100 + i)),
        })
        .collect();
    let app = setup_test_app(MockBrokerage::new().with_bars(bars));
    let (status, body) = send(app, "POST", "/v1/evaluate").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["statusCode"], 200);
    assert_eq!(body["body"]["action"], "none");
    assert!(body["body"]["signals"].is_null());
    assert!(body["body"]["error"]
        .as_str()
        .unwrap()
        .contains("insufficient data"));
}

#[tokio::test]
async fn test_evaluate_hold_envelope_mirrors_signals() {
    let now_ms = TimeNs::now().as_i64() / TimeNs::NANOS_PER_MS;
    let bars: Vec<Bar> = (0..25)
        .map(|i| Bar {
            time: TimeNs::from_ms(now_ms - (25 - i) * 60_000),
            close: Decimal::from_str_canonical("100").unwrap(),
        })
        .collect();
    let mock = MockBrokerage::new()
        .with_bars(bars)
        .with_ask(Decimal::from_str_canonical("100").unwrap());
    let app = setup_test_app(mock);
    let (status, body) = send(app, "POST", "/v1/evaluate").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["body"]["action"], "none");
    assert_eq!(body["body"]["signals"]["canBuy"], true);
    assert_eq!(body["body"]["signals"]["trendUp"], false);
    assert_eq!(body["body"]["noActionCount"], 1);
    assert!(body["body"]["error"].is_null());
}

#[tokio::test]
async fn test_evaluate_brokerage_failure_is_bad_gateway() {
    let mock = MockBrokerage::new().failing_with(BrokerageError::HttpError {
        status: 503,
        message: "maintenance".to_string(),
    });
    let app = setup_test_app(mock);
    let (status, body) = send(app, "POST", "/v1/evaluate").await;

    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert!(body["error"].as_str().unwrap().contains("maintenance"));
}
