//! Outgoing request description
//!
//! An [`OutgoingRequest`] is a plain value: method, path relative to the API
//! base URL, query pairs, optional JSON body and extra headers. The client
//! rebuilds the physical request from it for every attempt, so one value is
//! reused across retries unchanged.

use reqwest::Method;
use serde::Serialize;
use serde_json::Value;

use super::errors::ApiError;

#[derive(Debug, Clone, PartialEq)]
pub struct OutgoingRequest {
    method: Method,
    path: String,
    query: Vec<(String, String)>,
    body: Option<Value>,
    headers: Vec<(String, String)>,
}

impl OutgoingRequest {
    /// Request with no query, body or extra headers
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self { method, path: path.into(), query: Vec::new(), body: None, headers: Vec::new() }
    }

    /// `GET path`
    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    /// `POST path`
    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    /// `PUT path`
    pub fn put(path: impl Into<String>) -> Self {
        Self::new(Method::PUT, path)
    }

    /// `DELETE path`
    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::DELETE, path)
    }

    /// Append a query pair
    pub fn query(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.query.push((key.into(), value.to_string()));
        self
    }

    /// Append a query pair when `value` is present
    pub fn query_opt<V: ToString>(self, key: impl Into<String>, value: Option<V>) -> Self {
        match value {
            Some(value) => self.query(key, value),
            None => self,
        }
    }

    /// Attach a JSON body
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::InvalidRequest`] if `body` cannot be serialized
    pub fn json<T: Serialize + ?Sized>(mut self, body: &T) -> Result<Self, ApiError> {
        let value = serde_json::to_value(body)
            .map_err(|e| ApiError::InvalidRequest(format!("Failed to serialize body: {e}")))?;
        self.body = Some(value);
        Ok(self)
    }

    /// Add a header; overrides a default header of the same name
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// HTTP method
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// Path relative to the base URL
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Query parameters in insertion order
    pub fn query_pairs(&self) -> &[(String, String)] {
        &self.query
    }

    /// JSON body, if any
    pub fn body(&self) -> Option<&Value> {
        self.body.as_ref()
    }

    /// Extra headers, applied after the standard ones
    pub fn headers(&self) -> &[(String, String)] {
        &self.headers
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn builds_request_parts() {
        let request = OutgoingRequest::post("/campaigns")
            .query("page", 2)
            .query_opt("status", Some("draft"))
            .query_opt::<&str>("search", None)
            .header("Idempotency-Key", "abc")
            .json(&json!({"name": "Spring sale"}))
            .unwrap();

        assert_eq!(request.method(), &Method::POST);
        assert_eq!(request.path(), "/campaigns");
        assert_eq!(
            request.query_pairs(),
            &[("page".to_string(), "2".to_string()), ("status".to_string(), "draft".to_string())]
        );
        assert_eq!(request.headers(), &[("Idempotency-Key".to_string(), "abc".to_string())]);
        assert_eq!(request.body(), Some(&json!({"name": "Spring sale"})));
    }

    #[test]
    fn unserializable_body_is_invalid_request() {
        use std::collections::HashMap;

        // JSON object keys must be strings
        let mut body = HashMap::new();
        body.insert((1, 2), "value");

        let result = OutgoingRequest::post("/x").json(&body);
        assert!(matches!(result, Err(ApiError::InvalidRequest(_))));
    }
}
