//! Golden-trace conformance checking.
//!
//! - **record**: parses one fixed-format line of the reference log.
//! - **verifier**: reads the log forward, one record per instruction fetch, and compares it with
//!   the model's CPU state until the log runs out or something diverges.

use thiserror::Error;

pub mod record;
pub mod verifier;

#[cfg(test)]
mod tests;

pub use record::{Field, TraceRecord};
pub use verifier::{
    Divergence, FieldMismatch, GoldenTrace, TraceVerifier, Verdict, VerifierState, VerifyOptions,
};

/// A reference line that could not be read. Distinct from a divergence: the trace is at fault,
/// not the model.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("trace line {line}: {kind}")]
pub struct TraceError {
    pub line: usize,
    pub kind: TraceErrorKind,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TraceErrorKind {
    #[error("line is {len} bytes, shorter than the field block")]
    TooShort { len: usize },
    #[error("missing {0} field")]
    MissingField(Field),
    #[error("{0} value out of range")]
    BadValue(Field),
    #[error("read failed: {0}")]
    Io(String),
}
