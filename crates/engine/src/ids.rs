//! Tenant and model identifiers
//!
//! Both are validated [`Name`]s: they become directory names under the data
//! directory, so they follow the same charset and length rules as path
//! segments.

use arbor_core::{Name, NameError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

macro_rules! name_id {
    ($(#[$meta:meta])* $ty:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $ty(Name);

        impl $ty {
            /// Validate and wrap an identifier
            pub fn new(id: impl Into<String>) -> Result<Self, NameError> {
                Name::new(id).map($ty)
            }

            /// The identifier as a string slice
            pub fn as_str(&self) -> &str {
                self.0.as_str()
            }

            /// The underlying name
            pub fn as_name(&self) -> &Name {
                &self.0
            }
        }

        impl From<Name> for $ty {
            fn from(name: Name) -> Self {
                $ty(name)
            }
        }

        impl FromStr for $ty {
            type Err = NameError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::new(s)
            }
        }

        impl AsRef<str> for $ty {
            fn as_ref(&self) -> &str {
                self.as_str()
            }
        }

        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

name_id!(
    /// Identifier of a tenant
    AccountId
);

name_id!(
    /// Identifier of a model, unique within its account
    ModelId
);
