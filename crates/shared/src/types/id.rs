//! Typed IDs for type-safe entity references.
//!
//! Using typed IDs prevents accidentally passing a `ClientId` where a `ContractId` is expected.
//! IDs are positive integers; a new ID is always `max(existing, 0) + 1` within its collection.

use serde::{Deserialize, Serialize};

/// Macro to generate typed ID wrappers.
macro_rules! typed_id {
    ($name:ident, $doc:expr) => {
        #[doc = $doc]
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(pub i64);

        impl $name {
            /// Wraps a raw integer ID.
            #[must_use]
            pub const fn new(id: i64) -> Self {
                Self(id)
            }

            /// Returns the raw integer.
            #[must_use]
            pub const fn get(self) -> i64 {
                self.0
            }

            /// Next free ID after the given ones.
            #[must_use]
            pub fn next_after<I>(existing: I) -> Self
            where
                I: IntoIterator<Item = Self>,
            {
                let max = existing.into_iter().map(|id| id.0).max().unwrap_or(0);
                Self(max.max(0) + 1)
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl std::str::FromStr for $name {
            type Err = std::num::ParseIntError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Ok(Self(s.trim().parse()?))
            }
        }

        impl From<$name> for i64 {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

typed_id!(ClientId, "Unique identifier for a client.");
typed_id!(ContractId, "Unique identifier for a contract.");
typed_id!(ProjectId, "Unique identifier for a project.");
typed_id!(TimeEntryId, "Unique identifier for a time entry.");
typed_id!(PaymentId, "Unique identifier for a payment.");
typed_id!(CategoryId, "Unique identifier for a time entry category.");
typed_id!(UserId, "Unique identifier for a user.");

impl CategoryId {
    /// The protected "General" category every entry falls back to.
    pub const GENERAL: Self = Self(1);
}
