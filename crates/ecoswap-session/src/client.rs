//! Typed JSON façade over the shared session.

use crate::request::RequestDescriptor;
use crate::session::SessionManager;
use crate::transport::ApiResponse;
use crate::ApiResult;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;

/// Cheaply clonable handle for issuing authenticated API calls.
#[derive(Clone)]
pub struct ApiClient {
    session: Arc<SessionManager>,
}

impl ApiClient {
    pub fn new(session: Arc<SessionManager>) -> Self {
        Self { session }
    }

    pub fn session(&self) -> &Arc<SessionManager> {
        &self.session
    }

    /// Send a request through dispatch, interception and refresh.
    pub async fn execute(&self, descriptor: RequestDescriptor) -> ApiResult<ApiResponse> {
        self.session.execute(descriptor).await
    }

    /// Send a request and decode the JSON response body.
    pub async fn execute_json<T: DeserializeOwned>(
        &self,
        descriptor: RequestDescriptor,
    ) -> ApiResult<T> {
        let response = self.execute(descriptor).await?;
        Ok(response.json()?)
    }

    pub async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> ApiResult<T> {
        let descriptor = query
            .iter()
            .fold(RequestDescriptor::get(path), |d, (key, value)| {
                d.with_query(*key, value)
            });
        self.execute_json(descriptor).await
    }

    pub async fn post_json<B, T>(&self, path: &str, body: &B) -> ApiResult<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let descriptor = RequestDescriptor::post(path).with_body(serde_json::to_value(body)?);
        self.execute_json(descriptor).await
    }

    pub async fn put_json<B, T>(&self, path: &str, body: &B) -> ApiResult<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let descriptor = RequestDescriptor::put(path).with_body(serde_json::to_value(body)?);
        self.execute_json(descriptor).await
    }

    pub async fn delete_json<T: DeserializeOwned>(&self, path: &str) -> ApiResult<T> {
        self.execute_json(RequestDescriptor::delete(path)).await
    }
}
