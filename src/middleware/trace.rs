//! Per-request tracing.

use std::future::Future;
use std::time::Instant;

use tracing::{Instrument, info, info_span, warn};

use crate::method::Method;
use crate::response::Response;

/// Runs `respond` inside a `request` span and logs the outcome.
///
/// Server errors log at `warn`; everything else at `info`.
pub async fn instrument<F>(method: Method, path: &str, respond: F) -> Response
where
    F: Future<Output = Response>,
{
    let span = info_span!("request", %method, path = %path);
    let started = Instant::now();
    let response = respond.instrument(span.clone()).await;
    let latency_ms = started.elapsed().as_secs_f64() * 1000.0;
    let status = response.status_code();

    span.in_scope(|| {
        if status >= 500 {
            warn!(status, latency_ms, "request completed");
        } else {
            info!(status, latency_ms, "request completed");
        }
    });
    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::status::Status;

    #[tokio::test]
    async fn passes_response_through() {
        let res = instrument(Method::Get, "/books", async { Response::status(Status::Created) }).await;
        assert_eq!(res.status_code(), 201);
    }
}
