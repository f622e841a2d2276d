//! Description of an API call, kept so it can be sent a second time.

use crate::transport::{Method, OutboundRequest};
use serde_json::Value;

/// An API call as issued by the caller.
///
/// `retried` is set the first time the call is re-sent after a refresh and is
/// never cleared, so a call is retried at most once.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestDescriptor {
    pub method: Method,
    pub path: String,
    pub query: Vec<(String, String)>,
    pub headers: Vec<(String, String)>,
    pub body: Option<Value>,
    pub retried: bool,
}

impl RequestDescriptor {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            headers: Vec::new(),
            body: None,
            retried: false,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::Get, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::Post, path)
    }

    pub fn put(path: impl Into<String>) -> Self {
        Self::new(Method::Put, path)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::Delete, path)
    }

    pub fn with_query(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.query.push((key.into(), value.to_string()));
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    /// Build the wire request, with `Authorization: Bearer <token>` when a
    /// token is given. Any caller-set Authorization header is replaced.
    pub fn to_outbound(&self, bearer: Option<&str>) -> OutboundRequest {
        let mut headers: Vec<(String, String)> = self
            .headers
            .iter()
            .filter(|(name, _)| bearer.is_none() || !name.eq_ignore_ascii_case("Authorization"))
            .cloned()
            .collect();
        if let Some(token) = bearer {
            headers.push(("Authorization".to_string(), format!("Bearer {token}")));
        }

        OutboundRequest {
            method: self.method,
            path: self.path.clone(),
            query: self.query.clone(),
            headers,
            body: self.body.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_to_outbound_attaches_bearer() {
        let descriptor = RequestDescriptor::get("/clothes").with_query("limit", 12);
        let outbound = descriptor.to_outbound(Some("T1"));

        assert_eq!(outbound.method, Method::Get);
        assert_eq!(outbound.bearer_token(), Some("T1"));
        assert_eq!(outbound.query, vec![("limit".to_string(), "12".to_string())]);
    }

    #[test]
    fn test_to_outbound_without_token_has_no_authorization() {
        let outbound = RequestDescriptor::post("/users/login")
            .with_body(json!({"email": "a@b.co"}))
            .to_outbound(None);
        assert_eq!(outbound.header("Authorization"), None);
        assert_eq!(outbound.body, Some(json!({"email": "a@b.co"})));
    }

    #[test]
    fn test_bearer_replaces_existing_authorization() {
        let outbound = RequestDescriptor::get("/users/me")
            .with_header("Authorization", "Bearer stale")
            .with_header("X-Trace", "1")
            .to_outbound(Some("fresh"));

        let auth: Vec<_> = outbound
            .headers
            .iter()
            .filter(|(name, _)| name == "Authorization")
            .collect();
        assert_eq!(auth.len(), 1);
        assert_eq!(outbound.bearer_token(), Some("fresh"));
        assert_eq!(outbound.header("x-trace"), Some("1"));
    }

    #[test]
    fn test_new_descriptor_is_not_retried() {
        assert!(!RequestDescriptor::delete("/cloth/3").retried);
    }
}
