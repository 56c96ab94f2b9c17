//! The shared parser and the `define_id!` macro behind every typed ID.

use ulid::Ulid;

use crate::IdError;

/// Parses the canonical `{prefix}_{ulid}` form shared by every ID type.
pub fn parse_prefixed(prefix: &'static str, raw: &str) -> Result<Ulid, IdError> {
    if raw.is_empty() {
        return Err(IdError::Empty);
    }
    match raw.split_once('_') {
        None => Err(IdError::MissingSeparator),
        Some((actual, _)) if actual != prefix => Err(IdError::InvalidPrefix {
            expected: prefix,
            actual: actual.to_string(),
        }),
        Some((_, suffix)) => suffix
            .parse()
            .map_err(|e: ulid::DecodeError| IdError::InvalidUlid(e.to_string())),
    }
}

/// Defines a prefixed, ULID-backed ID type.
///
/// `define_id!(EventId, "evt")` produces a `Copy` newtype whose canonical
/// form is `evt_<ULID>`. The canonical string is also the wire format, so
/// the type serializes as JSON text, and ordering follows creation time.
#[macro_export]
macro_rules! define_id {
    ($name:ident, $prefix:literal) => {
        #[doc = concat!("Typed ID with the `", $prefix, "_` prefix.")]
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
        pub struct $name($crate::Ulid);

        impl $name {
            /// Canonical prefix, without the trailing underscore.
            pub const PREFIX: &'static str = $prefix;

            /// Generates a fresh, time-ordered ID.
            #[must_use]
            pub fn new() -> Self {
                Self($crate::Ulid::new())
            }

            /// The ULID behind the prefix.
            #[must_use]
            pub const fn ulid(&self) -> $crate::Ulid {
                self.0
            }

            /// Parses the canonical `{prefix}_{ulid}` form.
            pub fn parse(raw: &str) -> Result<Self, $crate::IdError> {
                $crate::parse_prefixed(Self::PREFIX, raw).map(Self)
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}_{}", Self::PREFIX, self.0)
            }
        }

        impl std::str::FromStr for $name {
            type Err = $crate::IdError;

            fn from_str(raw: &str) -> Result<Self, Self::Err> {
                Self::parse(raw)
            }
        }

        impl serde::Serialize for $name {
            fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
            where
                S: serde::Serializer,
            {
                serializer.collect_str(self)
            }
        }

        impl<'de> serde::Deserialize<'de> for $name {
            fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
            where
                D: serde::Deserializer<'de>,
            {
                let raw = String::deserialize(deserializer)?;
                Self::parse(&raw).map_err(serde::de::Error::custom)
            }
        }
    };
}
