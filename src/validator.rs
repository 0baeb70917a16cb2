use anyhow::anyhow;
use axum::{
    Json,
    extract::{
        FromRequest, FromRequestParts, Query, Request,
        rejection::{JsonRejection, QueryRejection},
    },
    http::request::Parts,
};
use serde::de::DeserializeOwned;
use validator::{Validate, ValidationErrors};

use classpulse_core::AppError;

fn format_errors(errors: &ValidationErrors) -> String {
    let mut messages: Vec<String> = errors
        .field_errors()
        .iter()
        .flat_map(|(field, errors)| {
            errors.iter().map(move |error| {
                error
                    .message
                    .as_ref()
                    .map(|msg| msg.to_string())
                    .unwrap_or_else(|| format!("{} is invalid", field))
            })
        })
        .collect();
    messages.sort();
    messages.dedup();
    messages.join(", ")
}

/// Turns serde's deserialization text into a client-facing message.
fn serde_rejection(error_msg: &str) -> Option<AppError> {
    if error_msg.contains("missing field") {
        let field = error_msg
            .split("missing field `")
            .nth(1)
            .and_then(|s| s.split('`').next())
            .unwrap_or("unknown");
        return Some(AppError::bad_request(anyhow!("{} is required", field)));
    }

    if error_msg.contains("unknown variant") {
        let value = error_msg
            .split("unknown variant `")
            .nth(1)
            .and_then(|s| s.split('`').next())
            .unwrap_or("unknown");
        return Some(AppError::bad_request(anyhow!("Invalid value: {}", value)));
    }

    if error_msg.contains("invalid type") || error_msg.contains("invalid value") {
        return Some(AppError::bad_request(anyhow!(
            "Invalid field type in request"
        )));
    }

    None
}

/// JSON body extractor that also runs `validator` rules. Every failure is a 400
/// `ValidationError`.
#[derive(Debug, Clone, Copy, Default)]
pub struct ValidatedJson<T>(pub T);

impl<T, S> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|rejection| {
                if let Some(err) = serde_rejection(&rejection.body_text()) {
                    return err;
                }

                if matches!(rejection, JsonRejection::MissingJsonContentType(_)) {
                    return AppError::bad_request(anyhow!(
                        "Missing 'Content-Type: application/json' header"
                    ));
                }

                AppError::bad_request(anyhow!("Invalid request body"))
            })?;

        value
            .validate()
            .map_err(|errors| AppError::bad_request(anyhow!("{}", format_errors(&errors))))?;

        Ok(ValidatedJson(value))
    }
}

/// Query-string extractor whose rejections use the shared error body.
#[derive(Debug, Clone, Copy, Default)]
pub struct ValidatedQuery<T>(pub T);

impl<T, S> FromRequestParts<S> for ValidatedQuery<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Query(value) = Query::<T>::from_request_parts(parts, state)
            .await
            .map_err(|rejection: QueryRejection| {
                let error_msg = rejection.body_text();
                serde_rejection(&error_msg).unwrap_or_else(|| {
                    AppError::bad_request(anyhow!("Invalid query parameters"))
                })
            })?;

        Ok(ValidatedQuery(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request as HttpRequest, StatusCode};
    use serde::Deserialize;

    #[derive(Debug, Deserialize, Validate)]
    struct Sample {
        #[validate(range(min = 1, max = 5, message = "Rating must be between 1 and 5"))]
        rating: i32,
        kind: Kind,
    }

    #[derive(Debug, Deserialize)]
    #[serde(rename_all = "lowercase")]
    enum Kind {
        Good,
    }

    async fn extract(body: &str) -> Result<ValidatedJson<Sample>, AppError> {
        let req = HttpRequest::builder()
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        ValidatedJson::<Sample>::from_request(req, &()).await
    }

    #[tokio::test]
    async fn test_valid_body() {
        let ValidatedJson(sample) = extract(r#"{"rating":3,"kind":"good"}"#).await.unwrap();
        assert_eq!(sample.rating, 3);
        assert!(matches!(sample.kind, Kind::Good));
    }

    #[tokio::test]
    async fn test_validation_failure_is_400() {
        let err = extract(r#"{"rating":6,"kind":"good"}"#).await.unwrap_err();
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
        assert_eq!(err.message(), "Rating must be between 1 and 5");
    }

    #[tokio::test]
    async fn test_missing_field_names_the_field() {
        let err = extract(r#"{"kind":"good"}"#).await.unwrap_err();
        assert_eq!(err.message(), "rating is required");
    }

    #[tokio::test]
    async fn test_unknown_enum_value() {
        let err = extract(r#"{"rating":1,"kind":"bad"}"#).await.unwrap_err();
        assert_eq!(err.message(), "Invalid value: bad");
    }

    #[tokio::test]
    async fn test_wrong_type() {
        let err = extract(r#"{"rating":"x","kind":"good"}"#).await.unwrap_err();
        assert_eq!(err.message(), "Invalid field type in request");
    }

    #[derive(Debug, Deserialize)]
    struct Filters {
        kind: Option<Kind>,
        #[serde(default, deserialize_with = "classpulse_core::pagination::deserialize_optional_i64")]
        page: Option<i64>,
    }

    async fn extract_query(uri: &str) -> Result<ValidatedQuery<Filters>, AppError> {
        let req = HttpRequest::builder().uri(uri).body(()).unwrap();
        let (mut parts, _) = req.into_parts();
        ValidatedQuery::<Filters>::from_request_parts(&mut parts, &()).await
    }

    #[tokio::test]
    async fn test_valid_query() {
        let ValidatedQuery(filters) = extract_query("/x?kind=good&page=2").await.unwrap();
        assert!(matches!(filters.kind, Some(Kind::Good)));
        assert_eq!(filters.page, Some(2));
    }

    #[tokio::test]
    async fn test_query_unknown_enum_value() {
        let err = extract_query("/x?kind=bogus").await.unwrap_err();
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
        assert_eq!(err.message(), "Invalid value: bogus");
    }

    #[tokio::test]
    async fn test_query_unparseable_number() {
        let err = extract_query("/x?page=abc").await.unwrap_err();
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
        assert_eq!(err.message(), "Invalid query parameters");
    }
}
