//! Identity-provider subject identifiers.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Errors that can occur when parsing a [`UserId`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum UserIdError {
    /// The input string is empty or only whitespace.
    #[error("user id cannot be empty")]
    Empty,
    /// The input string is too long.
    #[error("user id must be at most {max} characters")]
    TooLong {
        /// Maximum allowed length.
        max: usize,
    },
    /// The input collides with the reserved `self` alias.
    #[error("user id cannot be the reserved alias \"self\"")]
    Reserved,
}

/// A user's identifier: the `sub` claim issued by the identity provider.
///
/// The value is stable for the lifetime of the account and never generated
/// locally. It only ever enters the system through verified claims.
///
/// ## Examples
///
/// ```
/// use forkful_core::UserId;
///
/// assert!(UserId::parse("0b6c5a3e-0f5d-4bfb-9d1d-6d3f0d4c2a11").is_ok());
/// assert!(UserId::parse("").is_err());
/// assert!(UserId::parse("SELF").is_err());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
    /// Maximum length of a subject identifier (OIDC allows 255 ASCII chars).
    pub const MAX_LENGTH: usize = 255;

    /// Parse a `UserId` from a string.
    ///
    /// # Errors
    ///
    /// Returns an error if the input is empty, longer than 255 characters, or
    /// equal to the `self` alias.
    pub fn parse(s: &str) -> Result<Self, UserIdError> {
        if s.trim().is_empty() {
            return Err(UserIdError::Empty);
        }

        if s.len() > Self::MAX_LENGTH {
            return Err(UserIdError::TooLong {
                max: Self::MAX_LENGTH,
            });
        }

        if UserRef::is_self_alias(s) {
            return Err(UserIdError::Reserved);
        }

        Ok(Self(s.to_owned()))
    }

    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for UserId {
    type Err = UserIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl AsRef<str> for UserId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// A reference to a user as it appears in a request path.
///
/// Callers may address themselves with the literal `self` (any casing)
/// instead of their own identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserRef {
    /// The caller, whoever they are.
    SelfAlias,
    /// A specific user.
    Id(UserId),
}

impl UserRef {
    /// The alias token.
    pub const SELF_ALIAS: &'static str = "self";

    /// Whether `s` is the `self` alias (case-insensitive).
    #[must_use]
    pub fn is_self_alias(s: &str) -> bool {
        s.eq_ignore_ascii_case(Self::SELF_ALIAS)
    }

    /// Parse a path segment.
    ///
    /// # Errors
    ///
    /// Returns an error if the segment is neither the alias nor a valid id.
    pub fn parse(s: &str) -> Result<Self, UserIdError> {
        if Self::is_self_alias(s) {
            return Ok(Self::SelfAlias);
        }
        UserId::parse(s).map(Self::Id)
    }

    /// Resolve to a concrete identifier, substituting `caller` for the alias.
    #[must_use]
    pub fn resolve(self, caller: &UserId) -> UserId {
        match self {
            Self::SelfAlias => caller.clone(),
            Self::Id(id) => id,
        }
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Type<sqlx::Postgres> for UserId {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <String as sqlx::Type<sqlx::Postgres>>::type_info()
    }

    fn compatible(ty: &sqlx::postgres::PgTypeInfo) -> bool {
        <String as sqlx::Type<sqlx::Postgres>>::compatible(ty)
    }
}

#[cfg(feature = "postgres")]
impl<'r> sqlx::Decode<'r, sqlx::Postgres> for UserId {
    fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let s = <String as sqlx::Decode<sqlx::Postgres>>::decode(value)?;
        // Database values are assumed valid
        Ok(Self(s))
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Encode<'_, sqlx::Postgres> for UserId {
    fn encode_by_ref(
        &self,
        buf: &mut sqlx::postgres::PgArgumentBuffer,
    ) -> Result<sqlx::encode::IsNull, sqlx::error::BoxDynError> {
        <String as sqlx::Encode<sqlx::Postgres>>::encode_by_ref(&self.0, buf)
    }
}
