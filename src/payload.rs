use std::collections::HashMap;

use axum::{
    Form,
    body::Bytes,
    extract::{FromRequest, Request},
    http::header,
};
use serde_json::{Map, Value};

use crate::error::{AppError, FieldErrors, INVALID_INTEGER};

pub const MALFORMED_BODY: &str = "Request body must be a JSON object or form data.";
pub const INVALID_STRING: &str = "Not a valid string.";

/// Request body as loose fields, accepted either as a JSON object or as
/// `application/x-www-form-urlencoded` data. An empty body has no fields.
#[derive(Debug, Default)]
pub struct Payload(Map<String, Value>);

impl<S: Send + Sync> FromRequest<S> for Payload {
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let is_form = req
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .is_some_and(|value| value.starts_with("application/x-www-form-urlencoded"));

        if is_form {
            let Form(fields) = Form::<HashMap<String, String>>::from_request(req, state)
                .await
                .map_err(|_| malformed())?;
            return Ok(Self(fields.into_iter().map(|(k, v)| (k, Value::String(v))).collect()));
        }

        let bytes = Bytes::from_request(req, state).await.map_err(|_| malformed())?;
        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(Self::default());
        }
        match serde_json::from_slice(&bytes) {
            Ok(Value::Object(fields)) => Ok(Self(fields)),
            _ => Err(malformed()),
        }
    }
}

fn malformed() -> AppError {
    AppError::Validation(FieldErrors::from([("body", MALFORMED_BODY)]))
}

impl Payload {
    /// Non-empty string field. `null`, a missing key or `""` are all absent.
    pub fn text(&self, field: &str) -> Result<Option<&str>, &'static str> {
        match self.0.get(field) {
            None | Some(Value::Null) => Ok(None),
            Some(Value::String(s)) => Ok(Some(s.as_str()).filter(|s| !s.is_empty())),
            Some(_) => Err(INVALID_STRING),
        }
    }

    /// Integer field given either as a JSON number or as a numeric string.
    pub fn integer(&self, field: &str) -> Result<Option<i32>, &'static str> {
        match self.0.get(field) {
            None | Some(Value::Null) => Ok(None),
            Some(Value::String(s)) if s.is_empty() => Ok(None),
            Some(Value::String(s)) => s.trim().parse().map(Some).map_err(|_| INVALID_INTEGER),
            Some(Value::Number(n)) => n
                .as_i64()
                .and_then(|n| i32::try_from(n).ok())
                .map(Some)
                .ok_or(INVALID_INTEGER),
            Some(_) => Err(INVALID_INTEGER),
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn payload(value: Value) -> Payload {
        match value {
            Value::Object(fields) => Payload(fields),
            _ => unreachable!(),
        }
    }

    #[test]
    fn integers_accept_numbers_and_numeric_strings() {
        let body = payload(json!({"a": 1, "b": "2", "c": "x", "d": 1.5, "e": null, "f": ""}));

        assert_eq!(body.integer("a"), Ok(Some(1)));
        assert_eq!(body.integer("b"), Ok(Some(2)));
        assert_eq!(body.integer("c"), Err(INVALID_INTEGER));
        assert_eq!(body.integer("d"), Err(INVALID_INTEGER));
        assert_eq!(body.integer("e"), Ok(None));
        assert_eq!(body.integer("f"), Ok(None));
        assert_eq!(body.integer("missing"), Ok(None));
    }

    #[test]
    fn text_rejects_non_strings() {
        let body = payload(json!({"title": 5, "comment": "", "plot": " "}));

        assert_eq!(body.text("title"), Err(INVALID_STRING));
        assert_eq!(body.text("comment"), Ok(None));
        assert_eq!(body.text("plot"), Ok(Some(" ")));
    }
}
