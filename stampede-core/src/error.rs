use thiserror::Error;

/// Invalid configuration. Fatal: surfaces before any request is sent.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("virtual_users must be greater than zero")]
    ZeroVirtualUsers,

    #[error("duration must be positive")]
    ZeroDuration,

    #[error("request_timeout must be positive")]
    ZeroRequestTimeout,

    #[error("scenario must contain at least one request")]
    EmptyScenario,

    #[error("invalid target url `{url}`: {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("unsupported http method `{0}`")]
    InvalidMethod(String),
}

/// Internal invariant violation in result aggregation. Indicates an engine
/// bug, not a request failure.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AggregationError {
    #[error("summarize called before drain: {reported} of {launched} virtual users reported")]
    Incomplete { launched: u32, reported: u32 },
}

/// The only error type a run as a whole can fail with. Per-request failures
/// never surface here; they are recorded as outcomes and the run continues.
#[derive(Debug, Error)]
pub enum RunError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Aggregation(#[from] AggregationError),
}
