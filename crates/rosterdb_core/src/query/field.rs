//! Typed, per-entity query fields.
//!
//! Every field knows the SQL expression it reads from and, if it maps to a
//! plain column of the entity table, the column it may write to. Fields that
//! traverse a relationship need the entity's join.

use super::value::FieldValue;
use crate::model::ModelValidationError;
use std::fmt::Debug;

/// What a writable column accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    /// NOT NULL text that must contain a non-whitespace character.
    RequiredText,
    /// NOT NULL integer within `min..=max`.
    BoundedInteger { min: i64, max: i64 },
    /// Nullable reference to another table's id.
    OptionalReference,
}

impl ColumnKind {
    /// Rejects values the column could store but records could not read back.
    pub fn check(
        self,
        property: &'static str,
        value: &FieldValue,
    ) -> Result<(), ModelValidationError> {
        let reason = match (self, value) {
            (Self::RequiredText, FieldValue::Text(text)) if text.trim().is_empty() => {
                "text cannot be blank"
            }
            (Self::RequiredText, FieldValue::Text(_)) => return Ok(()),
            (Self::RequiredText, _) => "expected text",
            (Self::BoundedInteger { min, max }, FieldValue::Integer(number))
                if (min..=max).contains(number) =>
            {
                return Ok(())
            }
            (Self::BoundedInteger { .. }, FieldValue::Integer(_)) => "integer out of range",
            (Self::BoundedInteger { .. }, _) => "expected an integer",
            (Self::OptionalReference, FieldValue::Integer(_) | FieldValue::Null) => return Ok(()),
            (Self::OptionalReference, FieldValue::Text(_)) => "expected an id or null",
        };
        Err(ModelValidationError::InvalidFieldValue {
            field: property,
            reason,
        })
    }
}

pub trait Field: Copy + Eq + Debug + 'static {
    /// Property name used by derived query names (`username`, `teamName`).
    fn property(self) -> &'static str;
    /// Qualified SQL expression in select context (`m.username`).
    fn expr(self) -> &'static str;
    /// Writable column on the entity table, if any.
    fn column(self) -> Option<&'static str>;
    /// Accepted values for a writable column; `None` for read-only fields.
    fn kind(self) -> Option<ColumnKind>;
    fn requires_join(self) -> bool {
        false
    }
    fn all() -> &'static [Self];

    /// Case-insensitive lookup by property name.
    fn from_property(name: &str) -> Option<Self> {
        Self::all()
            .iter()
            .copied()
            .find(|field| field.property().eq_ignore_ascii_case(name))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MemberField {
    Id,
    Username,
    Age,
    TeamId,
    /// Name of the referenced team; read-only, resolved through the join.
    TeamName,
}

impl Field for MemberField {
    fn property(self) -> &'static str {
        match self {
            Self::Id => "id",
            Self::Username => "username",
            Self::Age => "age",
            Self::TeamId => "teamId",
            Self::TeamName => "teamName",
        }
    }

    fn expr(self) -> &'static str {
        match self {
            Self::Id => "m.member_id",
            Self::Username => "m.username",
            Self::Age => "m.age",
            Self::TeamId => "m.team_id",
            Self::TeamName => "t.name",
        }
    }

    fn column(self) -> Option<&'static str> {
        match self {
            Self::Id => None,
            Self::Username => Some("username"),
            Self::Age => Some("age"),
            Self::TeamId => Some("team_id"),
            Self::TeamName => None,
        }
    }

    fn kind(self) -> Option<ColumnKind> {
        match self {
            Self::Username => Some(ColumnKind::RequiredText),
            Self::Age => Some(ColumnKind::BoundedInteger {
                min: 0,
                max: i64::from(i32::MAX),
            }),
            Self::TeamId => Some(ColumnKind::OptionalReference),
            Self::Id | Self::TeamName => None,
        }
    }

    fn requires_join(self) -> bool {
        matches!(self, Self::TeamName)
    }

    fn all() -> &'static [Self] {
        &[
            Self::Id,
            Self::Username,
            Self::Age,
            Self::TeamId,
            Self::TeamName,
        ]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TeamField {
    Id,
    Name,
}

impl Field for TeamField {
    fn property(self) -> &'static str {
        match self {
            Self::Id => "id",
            Self::Name => "name",
        }
    }

    fn expr(self) -> &'static str {
        match self {
            Self::Id => "t.team_id",
            Self::Name => "t.name",
        }
    }

    fn column(self) -> Option<&'static str> {
        match self {
            Self::Id => None,
            Self::Name => Some("name"),
        }
    }

    fn kind(self) -> Option<ColumnKind> {
        match self {
            Self::Id => None,
            Self::Name => Some(ColumnKind::RequiredText),
        }
    }

    fn all() -> &'static [Self] {
        &[Self::Id, Self::Name]
    }
}
