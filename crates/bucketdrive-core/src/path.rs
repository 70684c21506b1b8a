//! Logical path newtype: the only way to address backend objects.
//!
//! `DrivePath` is an opaque string validated on construction. Paths are
//! backend-relative and slash-separated; leading and trailing slashes are
//! trimmed away so the stored form is always the canonical one that appears
//! in request routes and in returned entries.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{DriveError, DriveResult};

/// Logical, backend-relative path to a file or directory.
///
/// Invariants (enforced at construction):
/// - No `.` or `..` components
/// - No empty components (`//`)
/// - No null bytes
/// - Stored without leading or trailing slashes (`""` is the root)
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DrivePath(String);

impl DrivePath {
    /// Create a new drive path, trimming surrounding slashes and validating
    /// all invariants.
    pub fn new(path: &str) -> DriveResult<Self> {
        let trimmed = path.trim_matches('/');
        if trimmed.contains('\0') {
            return Err(DriveError::InvalidPath(
                "path cannot contain null bytes".to_string(),
            ));
        }
        if !trimmed.is_empty() {
            for component in trimmed.split('/') {
                if component.is_empty() {
                    return Err(DriveError::InvalidPath(format!(
                        "path cannot contain empty components: {path}"
                    )));
                }
                if component == "." || component == ".." {
                    return Err(DriveError::InvalidPath(format!(
                        "path cannot contain '{component}' components: {path}"
                    )));
                }
            }
        }
        Ok(Self(trimmed.to_string()))
    }

    /// The backend root (empty path).
    pub fn root() -> Self {
        Self(String::new())
    }

    /// The canonical string form, without surrounding slashes.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether this is the backend root.
    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    /// The final path component, used as the display name. Empty for root.
    pub fn name(&self) -> &str {
        self.0.rsplit('/').next().unwrap_or("")
    }

    /// Append a child component, validating the result.
    pub fn join(&self, child: &str) -> DriveResult<Self> {
        if self.is_root() {
            Self::new(child)
        } else {
            Self::new(&format!("{}/{}", self.0, child))
        }
    }
}

impl fmt::Display for DrivePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Serialize for DrivePath {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for DrivePath {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        DrivePath::new(&raw).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trims_surrounding_slashes() {
        assert_eq!(DrivePath::new("/a/b.txt/").unwrap().as_str(), "a/b.txt");
        assert_eq!(DrivePath::new("a/b.txt").unwrap().as_str(), "a/b.txt");
    }

    #[test]
    fn test_root_forms() {
        assert!(DrivePath::new("").unwrap().is_root());
        assert!(DrivePath::new("/").unwrap().is_root());
        assert!(DrivePath::root().is_root());
    }

    #[test]
    fn test_rejects_dot_components() {
        assert!(DrivePath::new("a/../b").is_err());
        assert!(DrivePath::new("./a").is_err());
    }

    #[test]
    fn test_rejects_empty_components() {
        assert!(DrivePath::new("a//b").is_err());
    }

    #[test]
    fn test_rejects_null_bytes() {
        assert!(DrivePath::new("a\0b").is_err());
    }

    #[test]
    fn test_name_is_final_component() {
        assert_eq!(DrivePath::new("a/b/c.txt").unwrap().name(), "c.txt");
        assert_eq!(DrivePath::new("c.txt").unwrap().name(), "c.txt");
        assert_eq!(DrivePath::root().name(), "");
    }

    #[test]
    fn test_join() {
        let dir = DrivePath::new("docs").unwrap();
        assert_eq!(dir.join("notes.md").unwrap().as_str(), "docs/notes.md");
        assert_eq!(DrivePath::root().join("top").unwrap().as_str(), "top");
        assert!(dir.join("..").is_err());
    }
}
