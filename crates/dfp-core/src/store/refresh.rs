// ── Background refresh loop ──
//
// Drives `Controller::refresh_once` forever: the normal interval after a
// good pass, the longer backoff after a failed one. Errors never leave the
// loop; only the availability flag reports health. The loop ends when its
// cancellation token fires.

use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::controller::Controller;

/// Observable state of the refresh loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshState {
    /// No pass has run yet, or the last pass had nothing registered.
    Idle,
    /// A pass is in progress and holds the cache write lock.
    Fetching,
    /// The last pass committed a fresh snapshot.
    Available,
    /// The last pass failed; the previous snapshot is still served.
    Unavailable,
    /// The background task has been shut down.
    Stopped,
}

pub(crate) async fn refresh_task(
    controller: Controller,
    interval: Duration,
    backoff: Duration,
    cancel: CancellationToken,
) {
    debug!(
        interval_ms = interval.as_millis(),
        backoff_secs = backoff.as_secs(),
        "refresh task started"
    );

    loop {
        let outcome = tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            outcome = controller.refresh_once() => outcome,
        };

        let delay = match outcome {
            Ok(()) => interval,
            Err(e) => {
                warn!(
                    error = %e,
                    backoff_secs = backoff.as_secs(),
                    "refresh pass failed, backing off"
                );
                backoff
            }
        };

        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            () = tokio::time::sleep(delay) => {}
        }
    }

    debug!("refresh task stopped");
}
