use crate::infra::{AppState, PolicyState};
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::Extension;
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::io::Cursor;
use tracing::info;
use vendowise::error::AppError;
use vendowise::policy_store::PolicyDocument;
use vendowise::report::OutcomeView;
use vendowise::{
    Dataset, DatasetKind, RiskEvaluator, RiskFactorConfig, RiskSummary, SupplierRecord,
};

#[derive(Debug, Deserialize)]
pub(crate) struct EvaluateRequest {
    #[serde(default)]
    pub(crate) records: Option<Vec<SupplierRecord>>,
    #[serde(default)]
    pub(crate) csv: Option<String>,
    #[serde(default)]
    pub(crate) kind: DatasetKind,
    #[serde(default)]
    pub(crate) policy: Option<PolicyDocument>,
}

#[derive(Debug, Serialize)]
pub(crate) struct EvaluateResponse {
    pub(crate) kind: DatasetKind,
    pub(crate) policy: RiskFactorConfig,
    pub(crate) outcomes: Vec<OutcomeView>,
    pub(crate) summary: RiskSummary,
}

pub(crate) fn risk_routes() -> axum::Router {
    axum::Router::new()
        .route("/health", get(healthcheck))
        .route("/ready", get(readiness_endpoint))
        .route("/metrics", get(metrics_endpoint))
        .route(
            "/api/v1/risk/policy",
            get(policy_endpoint).put(update_policy_endpoint),
        )
        .route("/api/v1/risk/evaluate", post(evaluate_endpoint))
}

pub(crate) async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

pub(crate) async fn readiness_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    let ready = state.readiness.load(std::sync::atomic::Ordering::Relaxed);
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let payload = if ready {
        json!({ "status": "ready" })
    } else {
        json!({ "status": "initializing" })
    };

    (status, Json(payload))
}

pub(crate) async fn metrics_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}

pub(crate) async fn policy_endpoint(
    Extension(policy): Extension<PolicyState>,
) -> Json<RiskFactorConfig> {
    Json(policy.snapshot())
}

pub(crate) async fn update_policy_endpoint(
    Extension(policy): Extension<PolicyState>,
    Json(document): Json<PolicyDocument>,
) -> Result<Json<RiskFactorConfig>, AppError> {
    let config = document.into_config()?;
    let active = tokio::task::spawn_blocking(move || policy.replace(config))
        .await
        .map_err(|err| AppError::Io(std::io::Error::other(err)))??;
    Ok(Json(active))
}

pub(crate) async fn evaluate_endpoint(
    Extension(policy): Extension<PolicyState>,
    Json(payload): Json<EvaluateRequest>,
) -> Result<Json<EvaluateResponse>, AppError> {
    let EvaluateRequest {
        records,
        csv,
        kind,
        policy: override_policy,
    } = payload;

    let config = match override_policy {
        Some(document) => document.into_config()?,
        None => policy.snapshot(),
    };
    let evaluator = RiskEvaluator::new(config)?;

    let dataset = match (records, csv) {
        (Some(_), None) if kind != DatasetKind::Supplier => {
            return Err(AppError::Request(format!(
                "`records` are supplier rows; send `{kind}` data as `csv`"
            )))
        }
        (Some(records), None) => Dataset::Suppliers(records),
        (None, Some(csv)) => Dataset::from_reader(kind, Cursor::new(csv.into_bytes()))?,
        (Some(_), Some(_)) => {
            return Err(AppError::Request(
                "send either `records` or `csv`, not both".to_string(),
            ))
        }
        (None, None) => {
            return Err(AppError::Request(
                "request body needs `records` or `csv`".to_string(),
            ))
        }
    };

    let outcomes = dataset.evaluate(&evaluator)?;
    let summary = RiskSummary::from_outcomes(&outcomes);
    info!(
        kind = dataset.kind().key(),
        records = summary.records,
        invalid = summary.invalid,
        "risk evaluation served"
    );

    Ok(Json(EvaluateResponse {
        kind: dataset.kind(),
        policy: evaluator.config().clone(),
        outcomes: OutcomeView::from_outcomes(&outcomes),
        summary,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use metrics_exporter_prometheus::PrometheusBuilder;
    use serde_json::Value;
    use std::sync::atomic::AtomicBool;
    use std::sync::Arc;
    use tower::ServiceExt;
    use vendowise::PolicyStore;

    struct Harness {
        router: axum::Router,
        policy: PolicyState,
        _dir: tempfile::TempDir,
    }

    fn harness(ready: bool) -> Harness {
        let dir = tempfile::tempdir().expect("temp dir");
        let store = PolicyStore::new(dir.path().join("vendowise_config.json"));
        let policy = PolicyState::new(store, RiskFactorConfig::default());
        let app_state = AppState {
            readiness: Arc::new(AtomicBool::new(ready)),
            metrics: Arc::new(PrometheusBuilder::new().build_recorder().handle()),
        };

        let router = risk_routes()
            .layer(Extension(policy.clone()))
            .layer(Extension(app_state));

        Harness {
            router,
            policy,
            _dir: dir,
        }
    }

    fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(serde_json::to_vec(&body).expect("serialize body")))
            .expect("request")
    }

    async fn read_json(response: axum::response::Response) -> Value {
        let bytes = to_bytes(response.into_body(), 1024 * 1024)
            .await
            .expect("body");
        serde_json::from_slice(&bytes).expect("json")
    }

    fn late_supplier() -> Value {
        json!({
            "supplier": "Delta Components",
            "ordered_qty": 300,
            "received_qty": 250,
            "rejected_qty": 30,
            "expected_delivery_date": "2024-03-01",
            "actual_delivery_date": "2024-03-11",
            "payment_terms_days": 45,
            "stock_buffer_days": 12,
            "location_risk": 2,
            "freight_cost": 900
        })
    }

    #[tokio::test]
    async fn readiness_reflects_flag() {
        let response = harness(false)
            .router
            .oneshot(Request::get("/ready").body(Body::empty()).expect("request"))
            .await
            .expect("router dispatch");
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);

        let response = harness(true)
            .router
            .oneshot(Request::get("/health").body(Body::empty()).expect("request"))
            .await
            .expect("router dispatch");
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn evaluate_records_returns_outcomes_and_summary() {
        let request = json_request(
            "POST",
            "/api/v1/risk/evaluate",
            json!({ "records": [late_supplier(), { "supplier": "Gamma" }] }),
        );

        let response = harness(true)
            .router
            .oneshot(request)
            .await
            .expect("router dispatch");
        assert_eq!(response.status(), StatusCode::OK);

        let body = read_json(response).await;
        assert_eq!(body["kind"], "supplier");
        assert_eq!(body["outcomes"][0]["classification"], "high");
        assert_eq!(
            body["outcomes"][0]["verdict"]["reasons"],
            json!(["delay", "rejection_rate", "partial_delivery"])
        );
        assert!(body["outcomes"][1]["error"].is_string());
        assert_eq!(body["summary"]["records"], 2);
        assert_eq!(body["summary"]["invalid"], 1);
    }

    #[tokio::test]
    async fn evaluate_accepts_inline_csv_and_policy_override() {
        let csv = "Item Code,Current Stock (Qty),Daily Avg Consumption,Expected Delay (days)\n\
BOLT-8,120,40,9\n";
        let request = json_request(
            "POST",
            "/api/v1/risk/evaluate",
            json!({
                "csv": csv,
                "kind": "inventory",
                "policy": {
                    "enabled_factors": ["delay", "stock_buffer"],
                    "scoring_mode": {"mode": "weighted", "high_cutoff": 0.6, "medium_cutoff": 0.0}
                }
            }),
        );

        let response = harness(true)
            .router
            .oneshot(request)
            .await
            .expect("router dispatch");
        assert_eq!(response.status(), StatusCode::OK);

        let body = read_json(response).await;
        assert_eq!(body["outcomes"][0]["subject"], "BOLT-8");
        assert_eq!(body["outcomes"][0]["classification"], "high");
        assert_eq!(body["outcomes"][0]["verdict"]["score"], 1.0);
    }

    #[tokio::test]
    async fn evaluate_rejects_invalid_policy_override() {
        let request = json_request(
            "POST",
            "/api/v1/risk/evaluate",
            json!({
                "records": [late_supplier()],
                "policy": {
                    "enabled_factors": ["delay"],
                    "scoring_mode": {"mode": "count_threshold", "min_count": 4}
                }
            }),
        );

        let response = harness(true)
            .router
            .oneshot(request)
            .await
            .expect("router dispatch");
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn evaluate_reports_missing_csv_columns() {
        let request = json_request(
            "POST",
            "/api/v1/risk/evaluate",
            json!({ "csv": "Supplier,Qty_Ordered\nDelta,10\n", "kind": "purchase_orders" }),
        );

        let response = harness(true)
            .router
            .oneshot(request)
            .await
            .expect("router dispatch");
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body = read_json(response).await;
        let message = body["error"].as_str().expect("error message");
        assert!(message.contains("po_number"));
    }

    #[tokio::test]
    async fn evaluate_requires_exactly_one_source() {
        let request = json_request("POST", "/api/v1/risk/evaluate", json!({}));
        let response = harness(true)
            .router
            .oneshot(request)
            .await
            .expect("router dispatch");
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn evaluate_rejects_records_for_other_kinds() {
        let request = json_request(
            "POST",
            "/api/v1/risk/evaluate",
            json!({ "records": [late_supplier()], "kind": "inventory" }),
        );

        let response = harness(true)
            .router
            .oneshot(request)
            .await
            .expect("router dispatch");
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body = read_json(response).await;
        let message = body["error"].as_str().expect("error message");
        assert!(message.contains("inventory"));
    }

    #[tokio::test]
    async fn policy_update_persists_and_swaps_snapshot() {
        let harness = harness(true);
        let request = json_request(
            "PUT",
            "/api/v1/risk/policy",
            json!({
                "enabled_factors": ["delay", "rejection_rate"],
                "thresholds": {"delay_days": 2}
            }),
        );

        let response = harness
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("router dispatch");
        assert_eq!(response.status(), StatusCode::OK);

        let active = harness.policy.snapshot();
        assert_eq!(active.enabled_factors.len(), 2);
        assert_eq!(active.threshold(vendowise::ThresholdKey::DelayDays), Some(2.0));

        let response = harness
            .router
            .clone()
            .oneshot(Request::get("/api/v1/risk/policy").body(Body::empty()).expect("request"))
            .await
            .expect("router dispatch");
        let body = read_json(response).await;
        assert_eq!(body["enabled_factors"], json!(["delay", "rejection_rate"]));
        assert_eq!(body["thresholds"]["delay_days"], 2.0);
    }

    #[tokio::test]
    async fn invalid_policy_update_keeps_previous_snapshot() {
        let harness = harness(true);
        let request = json_request(
            "PUT",
            "/api/v1/risk/policy",
            json!({
                "enabled_factors": ["delay"],
                "scoring_mode": {"mode": "weighted", "high_cutoff": 0.1, "medium_cutoff": 0.5}
            }),
        );

        let response = harness
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("router dispatch");
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(harness.policy.snapshot(), RiskFactorConfig::default());
    }
}
