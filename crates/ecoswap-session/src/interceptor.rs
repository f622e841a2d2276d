//! Response inspection and the refresh-then-retry loop.

use crate::dispatcher::Dispatcher;
use crate::refresh::RefreshCoordinator;
use crate::request::RequestDescriptor;
use crate::transport::ApiResponse;
use crate::{ApiError, ApiResult, HttpFailure, TransportError};
use tracing::{debug, warn};

const UNAUTHORIZED: u16 = 401;

/// What to do with the outcome of one send.
#[derive(Debug)]
pub(crate) enum Verdict {
    /// Hand the response to the caller.
    Deliver(ApiResponse),
    /// First `401` for this request: recover credentials, then re-send.
    Refresh(HttpFailure),
    /// Propagate without retrying.
    Reject(ApiError),
}

/// Classify one send. Marks the descriptor as retried when it asks for a refresh.
pub(crate) fn inspect(
    descriptor: &mut RequestDescriptor,
    result: Result<ApiResponse, TransportError>,
) -> Verdict {
    let response = match result {
        Ok(response) => response,
        Err(e) => return Verdict::Reject(ApiError::Network(e)),
    };

    if response.is_success() {
        return Verdict::Deliver(response);
    }

    let failure = HttpFailure::new(response.status, response.body);
    if failure.status != UNAUTHORIZED {
        return Verdict::Reject(ApiError::Status(failure));
    }

    if descriptor.retried {
        warn!(
            method = %descriptor.method,
            path = %descriptor.path,
            "Request rejected again after refresh"
        );
        return Verdict::Reject(ApiError::Unauthorized(failure));
    }

    descriptor.retried = true;
    Verdict::Refresh(failure)
}

/// Send `descriptor`, recovering from one authorization failure.
pub(crate) async fn execute(
    dispatcher: &Dispatcher,
    coordinator: &RefreshCoordinator,
    mut descriptor: RequestDescriptor,
) -> ApiResult<ApiResponse> {
    let mut token: Option<String> = None;

    loop {
        let result = dispatcher.dispatch(&descriptor, token.as_deref()).await;
        match inspect(&mut descriptor, result) {
            Verdict::Deliver(response) => return Ok(response),
            Verdict::Reject(error) => return Err(error),
            Verdict::Refresh(failure) => {
                debug!(path = %descriptor.path, "Authorization rejected, recovering");
                token = Some(coordinator.recover(failure).await?);
            }
        }
    }
}
