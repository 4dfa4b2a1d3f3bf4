//! Extension selection
//!
//! Turns a `;`-separated list such as `"txt;.CPP"` into a normalized set of
//! dot-prefixed, lower-cased extensions and tests file names against it.

use std::fmt;
use std::path::Path;

/// Separator between tokens in an extension list
pub const EXTENSION_SEPARATOR: char = ';';

/// Normalized set of file extensions (`.txt`, `.cpp`, ...)
///
/// Encounter order is preserved so logs stay deterministic. Duplicates are
/// collapsed on insertion.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtensionSet {
    extensions: Vec<String>,
}

impl ExtensionSet {
    /// Parse a `;`-separated extension list
    ///
    /// Empty tokens are dropped, a missing leading dot is added and every
    /// token is lower-cased. An empty list yields a set that matches nothing.
    ///
    /// # Example
    /// ```
    /// use selectzip::ExtensionSet;
    /// let set = ExtensionSet::parse("txt;.CPP;;");
    /// assert_eq!(set.as_slice(), [".txt", ".cpp"]);
    /// ```
    pub fn parse(list: &str) -> Self {
        let mut set = Self::default();
        for token in list.split(EXTENSION_SEPARATOR) {
            if token.is_empty() {
                continue;
            }
            let token = if token.starts_with('.') {
                token.to_lowercase()
            } else {
                format!(".{}", token).to_lowercase()
            };
            if !set.extensions.contains(&token) {
                set.extensions.push(token);
            }
        }
        set
    }

    /// Check whether a file name carries one of the selected extensions
    ///
    /// The comparison is an exact match on the lower-cased extension,
    /// including its leading dot. A name without an extension never matches.
    pub fn matches<P: AsRef<Path>>(&self, file_name: P) -> bool {
        match dotted_extension(file_name.as_ref()) {
            Some(ext) => self.extensions.iter().any(|e| *e == ext),
            None => false,
        }
    }

    /// The normalized extensions in encounter order
    pub fn as_slice(&self) -> &[String] {
        &self.extensions
    }

    /// Number of distinct extensions
    pub fn len(&self) -> usize {
        self.extensions.len()
    }

    /// Check if the set is empty
    pub fn is_empty(&self) -> bool {
        self.extensions.is_empty()
    }
}

impl fmt::Display for ExtensionSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.extensions.join(";"))
    }
}

/// Lower-cased extension of the final path component, with its leading dot
///
/// Follows `Path::extension`, so dot-files such as `.gitignore` have none.
fn dotted_extension(path: &Path) -> Option<String> {
    path.extension()
        .map(|ext| format!(".{}", ext.to_string_lossy().to_lowercase()))
}
