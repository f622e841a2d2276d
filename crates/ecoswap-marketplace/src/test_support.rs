//! Scripted transport shared by the marketplace unit tests.

use async_trait::async_trait;
use ecoswap_session::{
    ApiClient, ApiResponse, HttpTransport, Method, OutboundRequest, RefreshConfig, SessionManager,
    TransportError,
};
use ecoswap_storage::{CredentialStore, SessionCredentials, UserProfile};
use parking_lot::Mutex;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

/// Answers `(method, path)` pairs from a script; unscripted calls get 404.
#[derive(Default)]
pub struct ScriptedTransport {
    replies: Mutex<HashMap<(Method, String), (u16, Value)>>,
    sent: Mutex<Vec<OutboundRequest>>,
}

impl ScriptedTransport {
    pub fn reply(&self, method: Method, path: &str, status: u16, body: Value) {
        self.replies
            .lock()
            .insert((method, path.to_string()), (status, body));
    }

    pub fn sent(&self) -> Vec<OutboundRequest> {
        self.sent.lock().clone()
    }

    pub fn last(&self) -> OutboundRequest {
        self.sent().pop().unwrap()
    }
}

#[async_trait]
impl HttpTransport for ScriptedTransport {
    async fn send(&self, request: OutboundRequest) -> Result<ApiResponse, TransportError> {
        let reply = self
            .replies
            .lock()
            .get(&(request.method, request.path.clone()))
            .cloned();
        self.sent.lock().push(request);

        let (status, body) = reply.unwrap_or((404, serde_json::json!({ "error": "Not found" })));
        Ok(ApiResponse::new(status, body.to_string()))
    }
}

/// A signed-in client over a scripted transport.
pub fn signed_in() -> (Arc<ScriptedTransport>, ApiClient) {
    let transport = Arc::new(ScriptedTransport::default());
    let credentials = CredentialStore::in_memory();
    credentials
        .replace(SessionCredentials {
            access_token: Some("T1".to_string()),
            refresh_token: Some("R1".to_string()),
            user: Some(UserProfile::new("7").with_name("Ana")),
        })
        .unwrap();

    let session = SessionManager::new(transport.clone(), credentials, RefreshConfig::default());
    (transport, ApiClient::new(Arc::new(session)))
}
