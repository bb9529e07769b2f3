//! Owning identifiers for registrable values.

use std::fmt;
use std::str::FromStr;

use crate::error::LoaderError;

/// Identifier of a registrable value: a producer namespace plus a path.
///
/// The namespace names the producer (mod, plugin, module) that owns the
/// value; the registry files entrypoints into per-producer buckets keyed by
/// it. The path distinguishes values within one producer, but carries no
/// identity weight of its own - two distinct values may share a path.
///
/// # Examples
///
/// ```
/// use waymark_core::LoaderId;
///
/// let id = LoaderId::new("mymod", "items/gold_ring").unwrap();
/// assert_eq!(id.namespace(), "mymod");
/// assert_eq!(id.to_string(), "mymod:items/gold_ring");
///
/// let parsed: LoaderId = "mymod:items/gold_ring".parse().unwrap();
/// assert_eq!(parsed, id);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LoaderId {
    namespace: String,
    path: String,
}

impl LoaderId {
    /// Creates an identifier from a namespace and a path.
    ///
    /// The namespace accepts `[a-z0-9_.-]`, the path additionally `/`.
    /// Both segments must be non-empty.
    pub fn new(
        namespace: impl Into<String>,
        path: impl Into<String>,
    ) -> Result<Self, LoaderError> {
        let namespace = namespace.into();
        let path = path.into();

        if namespace.is_empty() {
            return Err(invalid(&namespace, &path, "empty namespace"));
        }
        if path.is_empty() {
            return Err(invalid(&namespace, &path, "empty path"));
        }
        if !namespace.chars().all(is_namespace_char) {
            return Err(invalid(&namespace, &path, "invalid character in namespace"));
        }
        if !path.chars().all(is_path_char) {
            return Err(invalid(&namespace, &path, "invalid character in path"));
        }

        Ok(Self { namespace, path })
    }

    /// Parses an identifier from its `namespace:path` form.
    pub fn parse(s: &str) -> Result<Self, LoaderError> {
        match s.split_once(':') {
            Some((namespace, path)) => Self::new(namespace, path),
            None => Err(LoaderError::InvalidLoaderId {
                value: s.to_owned(),
                reason: "expected 'namespace:path'",
            }),
        }
    }

    /// The producer namespace.
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// The path within the producer namespace.
    pub fn path(&self) -> &str {
        &self.path
    }
}

impl fmt::Display for LoaderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.namespace, self.path)
    }
}

impl FromStr for LoaderId {
    type Err = LoaderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

fn is_namespace_char(c: char) -> bool {
    matches!(c, 'a'..='z' | '0'..='9' | '_' | '.' | '-')
}

fn is_path_char(c: char) -> bool {
    is_namespace_char(c) || c == '/'
}

fn invalid(namespace: &str, path: &str, reason: &'static str) -> LoaderError {
    LoaderError::InvalidLoaderId {
        value: format!("{namespace}:{path}"),
        reason,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roundtrips_through_display_and_parse() {
        let id = LoaderId::new("mymod", "items/gold_ring").unwrap();
        let parsed = LoaderId::parse(&id.to_string()).unwrap();
        assert_eq!(parsed, id);
    }

    #[test]
    fn rejects_empty_segments() {
        assert!(LoaderId::new("", "path").is_err());
        assert!(LoaderId::new("mymod", "").is_err());
    }

    #[test]
    fn rejects_invalid_characters() {
        assert!(LoaderId::new("MyMod", "path").is_err());
        assert!(LoaderId::new("mymod", "has space").is_err());
        // '/' is valid in paths but not namespaces.
        assert!(LoaderId::new("my/mod", "path").is_err());
        assert!(LoaderId::new("mymod", "a/b").is_ok());
    }

    #[test]
    fn parse_requires_separator() {
        let err = LoaderId::parse("no-separator").unwrap_err();
        assert!(matches!(err, LoaderError::InvalidLoaderId { .. }));
    }
}
