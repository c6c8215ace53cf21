//! Response/call correspondence check.

use crate::types::{ToolCall, ToolExecutionResult};
use serde::Serialize;

/// Verdict of [`validate_response_match`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResponseMatch {
    pub valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ResponseMatch {
    fn ok() -> Self {
        Self {
            valid: true,
            error: None,
        }
    }

    fn mismatch(reason: String) -> Self {
        Self {
            valid: false,
            error: Some(reason),
        }
    }
}

/// Check that `results` answers `calls` one-to-one and in order.
pub fn validate_response_match(calls: &[ToolCall], results: &[ToolExecutionResult]) -> ResponseMatch {
    if calls.len() != results.len() {
        return ResponseMatch::mismatch(format!(
            "Response count mismatch: expected {} results, got {}",
            calls.len(),
            results.len()
        ));
    }

    match calls
        .iter()
        .zip(results)
        .position(|(call, result)| call.id != result.call_id)
    {
        Some(i) => ResponseMatch::mismatch(format!(
            "Response order mismatch at index {}: expected call id '{}', got '{}'",
            i, calls[i].id, results[i].call_id
        )),
        None => ResponseMatch::ok(),
    }
}
