use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::ops::BitOr;

macro_rules! string_newtype {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            pub fn new(value: impl Into<String>) -> Self {
                Self(value.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }

            pub fn is_empty(&self) -> bool {
                self.0.is_empty()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self(value.to_string())
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                Self(value)
            }
        }
    };
}

string_newtype!(
    /// Package name in the target ecosystem. Compared as an exact string.
    PkgName
);
string_newtype!(
    /// Version constraint or source locator, passed through uninterpreted.
    /// Empty means unconstrained.
    PkgSpec
);
string_newtype!(
    /// Concrete resolved version as reported by a lockfile.
    PkgVersion
);

/// Display metadata for one package, produced by search and info.
///
/// JSON `null` or missing fields decode as empty values, so helper scripts
/// can hand back partial records.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PkgInfo {
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub description: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub version: String,
    #[serde(rename = "homepageURL", default, deserialize_with = "null_as_default")]
    pub homepage_url: String,
    #[serde(rename = "documentationURL", default, deserialize_with = "null_as_default")]
    pub documentation_url: String,
    #[serde(rename = "sourceCodeURL", default, deserialize_with = "null_as_default")]
    pub source_code_url: String,
    #[serde(rename = "bugTrackerURL", default, deserialize_with = "null_as_default")]
    pub bug_tracker_url: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub author: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub license: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub dependencies: Vec<String>,
}

impl PkgInfo {
    /// An entirely empty record means the index does not know the package.
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

pub(crate) fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Author details as reported by a package index.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuthorInfo {
    pub name: String,
    pub email: String,
    pub url: String,
}

impl fmt::Display for AuthorInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parts = Vec::new();
        if !self.name.is_empty() {
            parts.push(self.name.clone());
        }
        if !self.email.is_empty() {
            parts.push(format!("<{}>", self.email));
        }
        if !self.url.is_empty() {
            parts.push(format!("({})", self.url));
        }
        f.write_str(&parts.join(" "))
    }
}

/// Documented deviations of a backend from the ideal operation contract.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Quirks(u8);

impl Quirks {
    pub const NONE: Quirks = Quirks(0);
    /// Search/info results and installs depend on remote state at call time.
    pub const NOT_REPRODUCIBLE: Quirks = Quirks(1 << 0);
    /// Add and remove also install, so no separate install step is needed.
    pub const ADD_REMOVE_ALSO_INSTALLS: Quirks = Quirks(1 << 1);

    pub fn contains(self, other: Quirks) -> bool {
        self.0 & other.0 == other.0
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub fn labels(self) -> Vec<&'static str> {
        let mut labels = Vec::new();
        if self.contains(Self::NOT_REPRODUCIBLE) {
            labels.push("not-reproducible");
        }
        if self.contains(Self::ADD_REMOVE_ALSO_INSTALLS) {
            labels.push("add-remove-also-installs");
        }
        labels
    }
}

impl BitOr for Quirks {
    type Output = Quirks;

    fn bitor(self, rhs: Quirks) -> Quirks {
        Quirks(self.0 | rhs.0)
    }
}

impl fmt::Display for Quirks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return f.write_str("none");
        }
        f.write_str(&self.labels().join(", "))
    }
}

#[cfg(test)]
mod tests;
