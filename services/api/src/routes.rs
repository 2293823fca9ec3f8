use crate::infra::{Analytics, AppState};
use axum::body::Bytes;
use axum::extract::{Query, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Extension, Json, Router};
use edu_insight::analytics::batch::export_to_string;
use edu_insight::analytics::view::{Facet, FacetFilters, PageMeta};
use edu_insight::analytics::{
    assistant_context, build_view, AnalyticsSummary, BatchError, RejectedRow, ViewAction,
};
use edu_insight::error::AppError;
use edu_insight::{ScoredRecord, StudentRecord, ViewState};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;

pub(crate) fn analytics_router(analytics: Arc<Analytics>) -> Router {
    Router::new()
        .route("/health", get(healthcheck))
        .route("/ready", get(readiness_endpoint))
        .route("/metrics", get(metrics_endpoint))
        .route("/api/v1/predict", post(predict_endpoint))
        .route("/api/v1/predict/batch", post(predict_batch_endpoint))
        .route("/api/v1/table", post(table_endpoint))
        .route("/api/v1/summary", get(summary_endpoint))
        .route("/api/v1/assistant/context", get(assistant_context_endpoint))
        .with_state(analytics)
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

pub(crate) async fn predict_endpoint(
    State(analytics): State<Arc<Analytics>>,
    Json(record): Json<StudentRecord>,
) -> Result<Json<ScoredRecord>, AppError> {
    let scored = analytics.engine.predict_one(record)?;
    Ok(Json(scored))
}

#[derive(Debug, Serialize)]
pub(crate) struct BatchPredictionResponse {
    pub(crate) total_rows: usize,
    pub(crate) accepted: usize,
    pub(crate) rejected: Vec<RejectedRow>,
    pub(crate) records: Vec<ScoredRecord>,
    pub(crate) export_csv: String,
}

/// Scores a CSV body on the blocking pool. Row-level problems are reported
/// alongside the scored rows; only a broken header fails the request.
pub(crate) async fn predict_batch_endpoint(
    State(analytics): State<Arc<Analytics>>,
    body: Bytes,
) -> Result<Json<BatchPredictionResponse>, AppError> {
    let (outcome, export_csv) = tokio::task::spawn_blocking(move || {
        let outcome = analytics.engine.predict_batch(&body[..])?;
        let export_csv = export_to_string(&outcome.records)?;
        Ok::<_, BatchError>((outcome, export_csv))
    })
    .await
    .map_err(std::io::Error::other)??;

    Ok(Json(BatchPredictionResponse {
        total_rows: outcome.total_rows,
        accepted: outcome.accepted(),
        rejected: outcome.rejected,
        records: outcome.records,
        export_csv,
    }))
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct TableRequest {
    #[serde(default)]
    pub(crate) state: ViewState,
    #[serde(default)]
    pub(crate) action: Option<ViewAction>,
}

#[derive(Debug, Serialize)]
pub(crate) struct TableResponse<'a> {
    pub(crate) state: ViewState,
    pub(crate) meta: PageMeta,
    pub(crate) rows: Vec<&'a ScoredRecord>,
}

pub(crate) async fn table_endpoint(
    State(analytics): State<Arc<Analytics>>,
    Json(request): Json<TableRequest>,
) -> Response {
    let mut state = match request.action {
        Some(action) => request.state.apply(action),
        None => request.state,
    };

    let view = build_view(&analytics.dataset, &state);
    state.page = view.meta.page;

    Json(TableResponse {
        state,
        meta: view.meta,
        rows: view.rows,
    })
    .into_response()
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct FacetQuery {
    pub(crate) school: Option<String>,
    pub(crate) gender: Option<String>,
    pub(crate) motivation: Option<String>,
}

impl FacetQuery {
    fn filters(self) -> FacetFilters {
        let facet = |value: Option<String>| value.map(Facet::from).unwrap_or_default();
        FacetFilters {
            school: facet(self.school),
            gender: facet(self.gender),
            motivation: facet(self.motivation),
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct SummaryResponse<'a> {
    pub(crate) summary: &'a AnalyticsSummary,
    pub(crate) filters: FacetFilters,
    pub(crate) estimated_count: usize,
}

pub(crate) async fn summary_endpoint(
    State(analytics): State<Arc<Analytics>>,
    Query(query): Query<FacetQuery>,
) -> Response {
    let filters = query.filters();
    let estimated_count = analytics.summary.estimate_count(&filters);

    Json(SummaryResponse {
        summary: &analytics.summary,
        filters,
        estimated_count,
    })
    .into_response()
}

pub(crate) async fn assistant_context_endpoint(
    State(analytics): State<Arc<Analytics>>,
) -> Json<serde_json::Value> {
    Json(json!({ "context": assistant_context(&analytics.summary) }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use edu_insight::PersonaEngine;
    use serde_json::Value;
    use tower::ServiceExt;

    const HEADER: &str = "Hours_Studied,Attendance,Sleep_Hours,Previous_Scores,Tutoring_Sessions,Physical_Activity,Motivation_Level,Internet_Access,Learning_Disabilities,Peer_Influence,Exam_Score,School_Type,Gender";

    fn sample_csv() -> String {
        [
            HEADER,
            "23,84,7,73,0,3,Low,Yes,No,Positive,67,Public,Male",
            "19,64,8,59,2,4,Low,Yes,No,Negative,61,Public,Female",
            "24,98,7,91,2,4,Medium,Yes,No,Neutral,74,Private,Male",
            "4,62,6,55,0,2,Low,No,Yes,Negative,57,Public,Female",
            "29,89,8,91,1,3,High,Yes,No,Positive,78,Private,Female",
            "25,60,7,98,1,2,Low,Yes,No,Negative,60,Public,Male",
            "12,81",
        ]
        .join("\n")
    }

    fn analytics() -> Arc<Analytics> {
        let engine = PersonaEngine::standard();
        let outcome = engine
            .predict_batch(sample_csv().as_bytes())
            .expect("sample scores");
        Arc::new(Analytics::new(engine, Some(outcome)))
    }

    async fn read_json_body(response: Response) -> Value {
        let body = axum::body::to_bytes(response.into_body(), 1 << 20)
            .await
            .expect("read body");
        serde_json::from_slice(&body).expect("json payload")
    }

    fn json_request(method: &str, uri: &str, payload: Value) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(payload.to_string()))
            .expect("request builds")
    }

    #[tokio::test]
    async fn health_reports_ok() {
        let response = analytics_router(analytics())
            .oneshot(
                Request::get("/health")
                    .body(Body::empty())
                    .expect("request builds"),
            )
            .await
            .expect("route executes");

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(read_json_body(response).await["status"], "ok");
    }

    #[tokio::test]
    async fn predict_scores_a_single_record() {
        let payload = json!({
            "hours_studied": 5.0,
            "attendance": 65.0,
            "sleep_hours": 7.0,
            "previous_scores": 60.0,
            "tutoring_sessions": 0.0,
            "physical_activity": 3.0,
            "exam_score": 55.0,
            "motivation_level": "Low",
            "internet_access": "No",
            "learning_disabilities": "Yes",
            "peer_influence": "Negative"
        });

        let response = analytics_router(analytics())
            .oneshot(json_request("POST", "/api/v1/predict", payload))
            .await
            .expect("route executes");

        assert_eq!(response.status(), StatusCode::OK);
        let body = read_json_body(response).await;
        assert_eq!(body["risk"]["risk_score"], 10);
        assert_eq!(body["risk"]["tier"], "High");
        assert_eq!(body["classification"]["persona_id"], "struggling_learner");
    }

    #[tokio::test]
    async fn batch_reports_rejected_rows_and_export() {
        let response = analytics_router(analytics())
            .oneshot(
                Request::post("/api/v1/predict/batch")
                    .header(header::CONTENT_TYPE, "text/csv")
                    .body(Body::from(sample_csv()))
                    .expect("request builds"),
            )
            .await
            .expect("route executes");

        assert_eq!(response.status(), StatusCode::OK);
        let body = read_json_body(response).await;
        assert_eq!(body["total_rows"], 7);
        assert_eq!(body["accepted"], 6);
        assert_eq!(body["rejected"][0]["row"], 7);
        assert_eq!(body["rejected"][0]["error"]["kind"], "insufficient_columns");
        let export = body["export_csv"].as_str().expect("export is text");
        assert!(export.starts_with("Row,Persona,Risk Score,Risk Tier\n"));
        assert_eq!(export.lines().count(), 7);
    }

    #[tokio::test]
    async fn batch_rejects_badly_encoded_rows_individually() {
        let mut body = format!("{HEADER}\n").into_bytes();
        body.extend_from_slice(b"23,84,7,73,0,3,Low,Yes,No,Positive,67,Public,Male\n");
        body.extend_from_slice(b"19,64,8,59,2,4,Low,Yes,No,Negative,61,Pub\xfflic,Female\n");

        let response = analytics_router(analytics())
            .oneshot(
                Request::post("/api/v1/predict/batch")
                    .header(header::CONTENT_TYPE, "text/csv")
                    .body(Body::from(body))
                    .expect("request builds"),
            )
            .await
            .expect("route executes");

        assert_eq!(response.status(), StatusCode::OK);
        let body = read_json_body(response).await;
        assert_eq!(body["accepted"], 1);
        assert_eq!(body["rejected"][0]["row"], 2);
        assert_eq!(body["rejected"][0]["error"]["kind"], "invalid_encoding");
        assert_eq!(body["rejected"][0]["error"]["column"], "School_Type");
    }

    #[tokio::test]
    async fn batch_without_required_headers_is_bad_request() {
        let response = analytics_router(analytics())
            .oneshot(
                Request::post("/api/v1/predict/batch")
                    .body(Body::from("Hours_Studied,Attendance\n1,2\n"))
                    .expect("request builds"),
            )
            .await
            .expect("route executes");

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = read_json_body(response).await;
        let message = body["error"].as_str().expect("error message");
        assert!(message.contains("Exam_Score"));
    }

    #[tokio::test]
    async fn table_applies_action_and_resets_page() {
        let payload = json!({
            "state": { "scope": "all_students", "page": 3 },
            "action": { "type": "set_school", "value": "Public" }
        });

        let response = analytics_router(analytics())
            .oneshot(json_request("POST", "/api/v1/table", payload))
            .await
            .expect("route executes");

        assert_eq!(response.status(), StatusCode::OK);
        let body = read_json_body(response).await;
        assert_eq!(body["state"]["page"], 1);
        assert_eq!(body["state"]["filters"]["school"], "Public");
        assert_eq!(body["meta"]["total_rows"], 4);
        let rows = body["rows"].as_array().expect("rows array");
        assert!(rows
            .iter()
            .all(|row| row["record"]["school"] == "Public"));
    }

    #[tokio::test]
    async fn table_defaults_to_high_risk_scope() {
        let response = analytics_router(analytics())
            .oneshot(json_request("POST", "/api/v1/table", json!({})))
            .await
            .expect("route executes");

        let body = read_json_body(response).await;
        let rows = body["rows"].as_array().expect("rows array");
        assert!(!rows.is_empty());
        assert!(rows.iter().all(|row| row["risk"]["tier"] == "High"));
    }

    #[tokio::test]
    async fn summary_estimates_filtered_count() {
        let response = analytics_router(analytics())
            .oneshot(
                Request::get("/api/v1/summary?school=Public&gender=Female")
                    .body(Body::empty())
                    .expect("request builds"),
            )
            .await
            .expect("route executes");

        assert_eq!(response.status(), StatusCode::OK);
        let body = read_json_body(response).await;
        assert_eq!(body["summary"]["kpis"]["total"], 6);
        // 6 * 4/6 * 3/6
        assert_eq!(body["estimated_count"], 2);
    }

    #[tokio::test]
    async fn assistant_context_mentions_totals() {
        let response = analytics_router(analytics())
            .oneshot(
                Request::get("/api/v1/assistant/context")
                    .body(Body::empty())
                    .expect("request builds"),
            )
            .await
            .expect("route executes");

        let body = read_json_body(response).await;
        let context = body["context"].as_str().expect("context text");
        assert!(context.contains("- Total students: 6\n"));
        assert!(context.contains("LEARNER PERSONAS:"));
    }
}
