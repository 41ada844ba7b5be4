//! Error types for the Oracle.
//!
//! Note that [`OracleError`] never escapes `cognize` -- a timeout or
//! malformed response there is absorbed into a fallback `CognitiveFrame`
//! (spec §4.5). It is surfaced from `synthesize`/`transcribe`, which have
//! no fallback-frame equivalent to fall back to.

#[derive(Debug, thiserror::Error)]
pub enum OracleError {
    #[error("template render error: {0}")]
    Template(String),

    #[error("provider error: {0}")]
    Provider(String),

    #[error("response parse error: {0}")]
    Parse(String),

    #[error("config error: {0}")]
    Config(String),

    #[error("serde error: {0}")]
    Serde(#[from] serde_json::Error),
}
