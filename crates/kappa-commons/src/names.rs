//! Type-safe wrappers for user, namespace, and role names.
//!
//! Ensures a username cannot be accidentally used where a namespace name is
//! expected. All wrappers are thin `String` newtypes with the same surface.

use std::fmt;

use serde::{Deserialize, Serialize};

macro_rules! name_type {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        pub struct $name(String);

        impl $name {
            /// Creates a new wrapper from a string.
            pub fn new(name: impl Into<String>) -> Self {
                Self(name.into())
            }

            /// Returns the name as a string slice.
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Consumes the wrapper and returns the inner `String`.
            pub fn into_string(self) -> String {
                self.0
            }

            pub fn is_empty(&self) -> bool {
                self.0.is_empty()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self(s)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(s.to_string())
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

name_type! {
    /// A login identity. Unique key within the `users` partition.
    UserName
}

name_type! {
    /// A role name scoped to a single namespace.
    RoleName
}

name_type! {
    /// A period-delimited namespace path, e.g. `acme.logs.events`.
    NamespaceName
}

impl NamespaceName {
    /// A root namespace contains no period.
    pub fn is_root(&self) -> bool {
        !self.0.contains('.')
    }

    /// Returns the parent namespace path, or `None` for root namespaces.
    ///
    /// The parent of `a.b.c` is `a.b`; `a` has no parent.
    pub fn parent(&self) -> Option<NamespaceName> {
        self.0
            .rfind('.')
            .map(|idx| NamespaceName::new(&self.0[..idx]))
    }
}
