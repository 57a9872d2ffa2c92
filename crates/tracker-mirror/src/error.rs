//! Errors raised while decoding the event stream.

/// Errors from decoding server-sent frames.
#[derive(Debug, thiserror::Error)]
pub enum MirrorError {
    /// The frame carried no payload.
    #[error("empty event frame")]
    EmptyFrame,

    /// The payload was not a valid object event.
    #[error("malformed event payload: {source}")]
    Malformed {
        /// The underlying JSON error.
        #[from]
        source: serde_json::Error,
    },

    /// The `mirror` config section could not be parsed.
    #[error("invalid mirror config: {source}")]
    Config {
        /// The underlying YAML error.
        #[from]
        source: serde_yml::Error,
    },
}
