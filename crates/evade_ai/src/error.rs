//! Error types for the evasion system

use thiserror::Error;

/// Evasion errors. All of them abort the current tick; none of them leave
/// the agent with an undefined escape point.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum EvasionError {
    /// A configuration value is out of range
    #[error("Invalid evasion config: {field} {reason}")]
    InvalidConfig {
        field: &'static str,
        reason: String,
    },

    /// The escape direction was requested with no threats to flee from
    #[error("Escape direction requested without any threats")]
    NoThreats,

    /// A probe fan was requested with zero rays
    #[error("Probe fan requested with zero rays")]
    NoRays,

    /// Scoring was requested with an empty candidate set
    #[error("No escape candidates to score")]
    NoCandidates,

    /// Panic escalation tried to re-enter more than once in a tick
    #[error("Panic escalation re-entered at depth {0}")]
    EscalationDepth(u32),
}

/// Result type for evasion operations
pub type Result<T> = std::result::Result<T, EvasionError>;
