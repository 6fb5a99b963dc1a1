use axum::{routing::get, Router};
use tower_http::trace::TraceLayer;

use super::health;
use super::predict;
use super::state::AppState;

/// Router without state; only the probes that need no services
pub fn create_router() -> Router {
    Router::new()
        .route("/health", get(health::health_check))
        .route("/live", get(health::live_check))
        .layer(TraceLayer::new_for_http())
}

/// Create the full router with application state
pub fn create_router_with_state(state: AppState) -> Router {
    Router::new()
        .route("/", get(predict::index))
        .route("/home", get(predict::index))
        .route(
            "/predict",
            get(predict::predict_form).post(predict::predict_submit),
        )
        .route("/health", get(health::health_check))
        .route("/ready", get(health::ready_check))
        .route("/live", get(health::live_check))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::body::{to_bytes, Body};
    use axum::http::{header, Request, StatusCode};
    use tower::ServiceExt;

    use super::*;
    use crate::api::state::MockPredictionServiceTrait;
    use crate::domain::registry::ModelUri;
    use crate::domain::request_log::RequestStore;
    use crate::domain::DomainError;
    use crate::infrastructure::request_log::InMemoryRequestStore;
    use crate::infrastructure::services::Readiness;

    const VALID_FORM: &str = "Podcast_Name=Tech+Talks&Episode_Length_minutes=45&Genre=Technology\
                              &Publication_Day=Monday&Publication_Time=Evening";

    fn app(predictor: MockPredictionServiceTrait, store: Arc<InMemoryRequestStore>) -> Router {
        create_router_with_state(AppState::new(Arc::new(predictor), store))
    }

    fn post_form(body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/predict")
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn get_request(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    async fn body_text(response: axum::response::Response) -> String {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn test_stateless_router_probes() {
        let response = create_router().oneshot(get_request("/health")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(body_text(response).await.contains("\"healthy\""));

        let response = create_router().oneshot(get_request("/live")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_landing_pages() {
        let store = Arc::new(InMemoryRequestStore::new());
        for uri in ["/", "/home", "/predict"] {
            let response = app(MockPredictionServiceTrait::new(), store.clone())
                .oneshot(get_request(uri))
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::OK);
            assert!(body_text(response).await.contains("<h1>"));
        }
    }

    #[tokio::test]
    async fn test_submit_predicts_and_stores() {
        let mut predictor = MockPredictionServiceTrait::new();
        predictor
            .expect_predict()
            .withf(|record| record.podcast_name == "Tech Talks")
            .times(1)
            .returning(|_| Ok(31.25));
        let store = Arc::new(InMemoryRequestStore::new());

        let response = app(predictor, store.clone())
            .oneshot(post_form(VALID_FORM))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert!(body_text(response).await.contains("31.25 minutes"));

        let observations = store.live_observations().await.unwrap();
        assert_eq!(observations.len(), 1);
        assert_eq!(observations[0].prediction, 31.25);
        assert_eq!(observations[0].request.genre, "Technology");
    }

    #[tokio::test]
    async fn test_invalid_form_is_bad_request_and_not_stored() {
        let mut predictor = MockPredictionServiceTrait::new();
        predictor.expect_predict().never();
        let store = Arc::new(InMemoryRequestStore::new());

        let response = app(predictor, store.clone())
            .oneshot(post_form(
                "Podcast_Name=Tech+Talks&Episode_Length_minutes=abc&Genre=Technology\
                 &Publication_Day=Monday&Publication_Time=Evening",
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(body_text(response).await.contains("Episode_Length_minutes"));
        assert!(store.list_requests().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_untrained_model_is_unavailable() {
        let mut predictor = MockPredictionServiceTrait::new();
        predictor
            .expect_predict()
            .returning(|_| Err(DomainError::artifact_missing("predict: run training first")));
        let store = Arc::new(InMemoryRequestStore::new());

        let response = app(predictor, store.clone())
            .oneshot(post_form(VALID_FORM))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert!(store.list_predictions().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_registry_failure_is_bad_gateway() {
        let mut predictor = MockPredictionServiceTrait::new();
        predictor
            .expect_predict()
            .returning(|_| Err(DomainError::registry("predict: registry unreachable")));

        let response = app(predictor, Arc::new(InMemoryRequestStore::new()))
            .oneshot(post_form(VALID_FORM))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    }

    #[tokio::test]
    async fn test_wrong_content_type_is_rejected_as_json() {
        let request = Request::builder()
            .method("POST")
            .uri("/predict")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from("{}"))
            .unwrap();

        let response = app(
            MockPredictionServiceTrait::new(),
            Arc::new(InMemoryRequestStore::new()),
        )
        .oneshot(request)
        .await
        .unwrap();

        assert_eq!(response.status(), StatusCode::UNSUPPORTED_MEDIA_TYPE);
        assert!(body_text(response).await.contains("form_parse_error"));
    }

    #[tokio::test]
    async fn test_ready_reflects_artifacts() {
        let mut predictor = MockPredictionServiceTrait::new();
        predictor.expect_readiness().times(1).returning(|| Readiness {
            preprocessor: Err("Preprocessor 'preprocessor_obj.json' not found".to_string()),
            model: Err("No run parameters found".to_string()),
        });
        let response = app(predictor, Arc::new(InMemoryRequestStore::new()))
            .oneshot(get_request("/ready"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);

        let mut predictor = MockPredictionServiceTrait::new();
        predictor.expect_readiness().times(1).returning(|| Readiness {
            preprocessor: Ok("preprocessor_obj.json".to_string()),
            model: Ok(ModelUri::new("podcast", 1).unwrap()),
        });
        let response = app(predictor, Arc::new(InMemoryRequestStore::new()))
            .oneshot(get_request("/ready"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(body_text(response).await.contains("\"ready\":true"));
    }
}
