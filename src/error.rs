//! Error types for score editing.
//!
//! Expected no-op conditions (a click outside any staff, a duration that
//! does not fit the measure) are not errors; they are reported through
//! outcome values. Everything here is either a structural problem with
//! the score or an invariant violation that must not be swallowed.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum EditError {
    /// Clef sign/line combination with no reference pitch
    #[error("unsupported clef: {sign} on line {line}")]
    UnsupportedClef { sign: char, line: u8 },

    /// A pitch that cannot be located in the pitch table
    #[error("pitch {0} is outside the pitch table")]
    PitchNotInTable(String),

    /// The barline closing a measure was not found (corrupted staff)
    #[error("no measure-end barline after element {from} in staff {staff}")]
    MissingBarline { staff: usize, from: usize },

    /// A duration can't be halved or a proportion can't be decomposed
    #[error("duration not representable: {0}")]
    UnrepresentableDuration(String),

    #[error("invalid duration: 1/{denominator} with {dots} dot(s)")]
    InvalidDuration { denominator: u32, dots: u8 },

    #[error("staff {0} does not exist")]
    StaffOutOfRange(usize),

    #[error("element {element} does not exist in staff {staff}")]
    ElementOutOfRange { staff: usize, element: usize },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// The excess-removal search did not converge
    #[error("excess-removal search stalled in measure {measure} of staff {staff}")]
    ReclaimStalled { staff: usize, measure: usize },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
