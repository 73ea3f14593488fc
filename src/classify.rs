//! Outcome classification.
//!
//! Turns whatever a strategy produced into a [`FetchOutcome`]:
//! - error → `Failed`, message kept, no status, no body
//! - 403 → `Blocked`, body dropped even if one arrived
//! - 200 (or no status at all, as with the headless browser) → `Success`
//! - anything else → `Failed`, but status and body are kept for debugging

use crate::error::ProbeError;
use crate::types::{FetchOutcome, RawResponse, Verdict};

pub const STATUS_OK: u16 = 200;
pub const STATUS_FORBIDDEN: u16 = 403;

pub fn classify(raw: Result<RawResponse, ProbeError>) -> FetchOutcome {
    let response = match raw {
        Ok(r) => r,
        Err(e) => return FetchOutcome::failed(e.to_string()),
    };

    match response.status.unwrap_or(STATUS_OK) {
        STATUS_FORBIDDEN => FetchOutcome::blocked(STATUS_FORBIDDEN),
        STATUS_OK => FetchOutcome::success(STATUS_OK, response.body),
        other => FetchOutcome {
            verdict: Verdict::Failed,
            status_code: Some(other),
            body: Some(response.body),
            error_message: Some(format!("unexpected status {other}")),
        },
    }
}
