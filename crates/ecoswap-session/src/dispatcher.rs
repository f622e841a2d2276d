//! Request dispatch with bearer credentials.

use crate::request::RequestDescriptor;
use crate::transport::{ApiResponse, HttpTransport};
use crate::TransportError;
use ecoswap_storage::CredentialStore;
use std::sync::Arc;
use tracing::debug;

/// Attaches the current access token to requests and hands them to the transport.
#[derive(Clone)]
pub struct Dispatcher {
    transport: Arc<dyn HttpTransport>,
    credentials: Arc<CredentialStore>,
}

impl Dispatcher {
    pub fn new(transport: Arc<dyn HttpTransport>, credentials: Arc<CredentialStore>) -> Self {
        Self {
            transport,
            credentials,
        }
    }

    /// Send with `Authorization: Bearer <token>`.
    ///
    /// `token` overrides the stored access token; it is set when a request is
    /// re-sent with the token a refresh just produced. Without either, the
    /// header is omitted.
    pub async fn dispatch(
        &self,
        descriptor: &RequestDescriptor,
        token: Option<&str>,
    ) -> Result<ApiResponse, TransportError> {
        let stored;
        let bearer = match token {
            Some(token) => Some(token),
            None => {
                stored = self.credentials.access_token();
                stored.as_deref()
            }
        };

        debug!(
            method = %descriptor.method,
            path = %descriptor.path,
            authenticated = bearer.is_some(),
            retried = descriptor.retried,
            "Dispatching request"
        );

        self.transport.send(descriptor.to_outbound(bearer)).await
    }

    /// Send without credentials (login, registration, refresh).
    pub async fn send_unauthenticated(
        &self,
        descriptor: &RequestDescriptor,
    ) -> Result<ApiResponse, TransportError> {
        debug!(
            method = %descriptor.method,
            path = %descriptor.path,
            "Dispatching unauthenticated request"
        );

        self.transport.send(descriptor.to_outbound(None)).await
    }
}
