//! Timeout and bounded retry around the bot move service.

use crate::games::catchup::Move;
use crate::services::{MoveRequest, MoveService, ServiceError, ServiceErrorKind};
use std::time::Duration;
use tracing::{debug, instrument, warn};

/// Asks `service` for a move, bounding each attempt by `timeout`.
///
/// Failed attempts are retried up to `retries` more times, waiting
/// `backoff * attempt` in between. A service that answers but refuses to
/// move is not retried. Returns the last error once attempts run out.
#[instrument(skip(service, request), fields(service = service.name(), is_p1_turn = request.is_p1_turn))]
pub async fn fetch_with_policy(
    service: &dyn MoveService,
    request: &MoveRequest,
    timeout: Duration,
    retries: u32,
    backoff: Duration,
) -> Result<Move, ServiceError> {
    let mut attempt = 0u32;
    loop {
        let error = match tokio::time::timeout(timeout, service.request_move(request)).await {
            Ok(Ok(mv)) => {
                debug!(attempt, %mv, "Move service answered");
                return Ok(mv);
            }
            Ok(Err(e)) => e,
            Err(_) => ServiceError::timeout(timeout),
        };

        if error.kind == ServiceErrorKind::Rejected || attempt >= retries {
            warn!(attempt, error = %error, "Giving up on move service");
            return Err(error);
        }

        attempt += 1;
        warn!(attempt, error = %error, "Move service failed, retrying");
        tokio::time::sleep(backoff * attempt).await;
    }
}
