use async_trait::async_trait;
use axum::extract::{FromRequest, Request};
use axum::Json;
use serde::de::DeserializeOwned;

use crate::api::errors::ApiError;

/// `Json` body extractor whose rejections render as `ApiError`: a body that
/// fails to deserialize is a 400 naming the offending field.
pub(crate) struct ApiJson<T>(pub(crate) T);

#[async_trait]
impl<T, S> FromRequest<S> for ApiJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(request: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(request, state).await?;
        Ok(Self(value))
    }
}

#[cfg(test)]
mod tests {
    use axum::body::{to_bytes, Body};
    use axum::http::{header, Request, StatusCode};
    use axum::routing::post;
    use axum::Router;
    use tower::ServiceExt;

    use super::ApiJson;
    use crate::schemas::answer::AnswerCreate;

    fn app() -> Router {
        Router::new().route(
            "/answers",
            post(|ApiJson(payload): ApiJson<AnswerCreate>| async move { payload.question_id }),
        )
    }

    async fn post_json(body: &'static str) -> (StatusCode, serde_json::Value) {
        let request = Request::builder()
            .method("POST")
            .uri("/answers")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body))
            .unwrap();
        let response = app().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn missing_field_is_a_validation_error() {
        let (status, body) = post_json(r#"{"value":"A"}"#).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["status"], 400);
        assert!(body["detail"].as_str().unwrap().contains("question_id"));
        assert!(body["errors"]["question_id"].is_array());
    }

    #[tokio::test]
    async fn wrong_type_names_the_field() {
        let (status, body) = post_json(r#"{"question_id":"q1","status":7}"#).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["errors"]["status"].is_array());
    }

    #[tokio::test]
    async fn malformed_json_is_a_bad_request() {
        let (status, body) = post_json(r#"{"question_id":"#).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body.get("errors").is_none());
        assert!(body["detail"].is_string());
    }
}
