//! Domain records for the member/team roster.
//!
//! # Invariants
//! - Identifiers are assigned by storage on first save and never reused.
//! - A member references at most one team; the team keeps back-references.
//! - Records are validated before every write.

use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod member;
pub mod projection;
pub mod team;

/// Validation failures for member/team records.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModelValidationError {
    BlankUsername,
    NegativeAge(i32),
    BlankTeamName,
    /// Team must be saved before members can reference it.
    TeamNotPersisted,
    /// A bulk assignment would store a value the column cannot hold.
    InvalidFieldValue {
        field: &'static str,
        reason: &'static str,
    },
}

impl Display for ModelValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BlankUsername => write!(f, "member username cannot be blank"),
            Self::NegativeAge(age) => write!(f, "member age cannot be negative, got {age}"),
            Self::BlankTeamName => write!(f, "team name cannot be blank"),
            Self::TeamNotPersisted => write!(f, "team must be saved before it can be referenced"),
            Self::InvalidFieldValue { field, reason } => {
                write!(f, "invalid value for `{field}`: {reason}")
            }
        }
    }
}

impl Error for ModelValidationError {}
