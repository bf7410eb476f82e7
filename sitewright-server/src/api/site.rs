//! Site build submission handler

use axum::{Json, extract::State, extract::rejection::JsonRejection};
use sitewright_core::domain::request::BuildRequest;
use sitewright_core::dto::site::SubmitResponse;

use crate::api::error::ApiResult;
use crate::state::AppState;

/// POST /generate-site
/// Accept a build request and run it in the background
///
/// Answers as soon as the build is scheduled. The outcome reaches the
/// caller later through its `webhook_url`.
pub async fn generate_site(
    State(state): State<AppState>,
    payload: Result<Json<BuildRequest>, JsonRejection>,
) -> ApiResult<Json<SubmitResponse>> {
    let Json(req) = payload?;
    tracing::info!("Build requested for '{}'", req.business_name);

    let accepted = state.orchestrator.submit(req)?;

    Ok(Json(accepted.into()))
}

#[cfg(test)]
mod tests {
    use crate::api::test_support::{app_in, send, write_script};
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use serde_json::json;

    fn submit(body: serde_json::Value) -> Request<Body> {
        Request::post("/generate-site")
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn request_body(name: &str) -> serde_json::Value {
        json!({
            "business_name": name,
            "niche": "pizzeria",
            "address": "Piazza Verdi 3",
            "tel": "0187 111111",
            "webhook_url": "http://127.0.0.1:9/hook"
        })
    }

    #[tokio::test]
    async fn test_accepts_and_acknowledges() {
        let dir = tempfile::tempdir().unwrap();
        write_script(dir.path(), "exit 0");
        let (app, state) = app_in(dir.path());

        let (status, body) = send(app, submit(request_body("Da Mario"))).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            body,
            json!({
                "status": "processing",
                "message": "Job added to queue.",
                "site_slug": "da-mario",
                "site_url": "http://sites.example/da-mario/index.html"
            })
        );
        assert_eq!(state.orchestrator.registry().list().len(), 1);
    }

    #[tokio::test]
    async fn test_missing_build_program_is_a_server_error() {
        let dir = tempfile::tempdir().unwrap();
        let (app, state) = app_in(dir.path());

        let (status, body) = send(app, submit(request_body("Da Mario"))).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(body["error"].as_str().unwrap().contains("not found"));
        assert!(state.orchestrator.registry().list().is_empty());
    }

    #[tokio::test]
    async fn test_unusable_subject_is_a_bad_request() {
        let dir = tempfile::tempdir().unwrap();
        write_script(dir.path(), "exit 0");
        let (app, state) = app_in(dir.path());

        let (status, body) = send(app, submit(request_body("!!!"))).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].is_string());
        assert!(state.orchestrator.registry().list().is_empty());
    }

    #[tokio::test]
    async fn test_missing_fields_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        write_script(dir.path(), "exit 0");
        let (app, _) = app_in(dir.path());

        let (status, body) = send(app, submit(json!({ "business_name": "Da Mario" }))).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].as_str().unwrap().contains("niche"));
    }

    #[tokio::test]
    async fn test_malformed_body_gets_json_error() {
        let dir = tempfile::tempdir().unwrap();
        write_script(dir.path(), "exit 0");
        let (app, _) = app_in(dir.path());

        let request = Request::post("/generate-site")
            .header("content-type", "application/json")
            .body(Body::from("{not json"))
            .unwrap();
        let (status, body) = send(app, request).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].is_string());
    }
}
