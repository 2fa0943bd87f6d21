//! Server-generated stored names
//!
//! A stored name is `<token><extension>`: the token is a random UUID v4 rendered as 32
//! lowercase hex characters and the extension is copied from the client's original filename.

use uuid::Uuid;

/// Identifier under which a blob is retrievable
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StoredName(String);

impl StoredName {
    /// Generates a fresh stored name, keeping the extension of `original_name` if it has one
    pub fn generate(original_name: Option<&str>) -> Self {
        let token = Uuid::new_v4().simple().to_string();
        Self(format!("{}{}", token, extension_of(original_name)))
    }

    /// Returns the inner string as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes the name, returning the owned string
    pub fn into_string(self) -> String {
        self.0
    }
}

impl std::fmt::Display for StoredName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for StoredName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Returns the substring of `original_name` from its last `.` (inclusive)
///
/// Absent names and names without a `.` have no extension.
pub fn extension_of(original_name: Option<&str>) -> &str {
    original_name
        .and_then(|name| name.rfind('.').map(|idx| &name[idx..]))
        .unwrap_or("")
}
