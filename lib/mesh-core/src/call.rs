//! Outcome of an outbound call to another service

/// Result of `call(target)`, built per request and never persisted
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CallResult {
    /// The upstream answered with any status; carries its response body.
    ///
    /// The body is decoded lossily: bytes that are not valid UTF-8 become U+FFFD.
    Success(String),
    /// Discovery returned no instances for the target
    NotFound,
    /// The outbound request failed at the transport level or timed out
    UpstreamError(String),
}

impl CallResult {
    /// Short label used for metrics and logs
    pub fn outcome(&self) -> &'static str {
        match self {
            CallResult::Success(_) => "success",
            CallResult::NotFound => "not_found",
            CallResult::UpstreamError(_) => "upstream_error",
        }
    }
}
