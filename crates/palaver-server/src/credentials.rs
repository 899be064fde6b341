//! Flat-file credential store.
//!
//! One `username:password` pair per line, loaded once at startup and
//! immutable afterwards. The file is never written back.

use std::{collections::HashMap, fs, path::Path};

use crate::error::ServerError;

/// Read-only username → password map.
#[derive(Debug, Default)]
pub struct CredentialStore {
    users: HashMap<String, String>,
}

impl CredentialStore {
    /// Load credentials from `path`.
    ///
    /// An unreadable file is a fatal startup error. Lines without a colon
    /// are skipped; everything after the first colon is the password.
    pub fn load(path: &Path) -> Result<Self, ServerError> {
        let contents = fs::read_to_string(path).map_err(|e| {
            ServerError::Config(format!(
                "failed to read credential file '{}': {e}",
                path.display()
            ))
        })?;

        Ok(Self::parse(&contents))
    }

    fn parse(contents: &str) -> Self {
        let mut users = HashMap::new();
        for line in contents.lines() {
            if let Some((username, password)) = line.split_once(':') {
                users.insert(username.to_string(), password.to_string());
            }
        }
        Self { users }
    }

    /// Check a username/password pair against the store.
    pub fn verify(&self, username: &str, password: &str) -> bool {
        self.users.get(username).is_some_and(|stored| stored == password)
    }

    /// Number of loaded entries.
    pub fn len(&self) -> usize {
        self.users.len()
    }

    /// Whether the store holds no entries.
    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }
}

/// Remove every space character anywhere in the string.
///
/// Authentication strips embedded spaces from usernames and passwords, not
/// just leading and trailing ones: `"a li ce"` becomes `"alice"`.
pub fn scrub(input: &str) -> String {
    input.chars().filter(|c| *c != ' ').collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_reads_pairs_and_skips_malformed_lines() {
        let store = CredentialStore::parse("alice:secret\nnot a pair\nbob:hunter2\n");

        assert_eq!(store.len(), 2);
        assert!(store.verify("alice", "secret"));
        assert!(store.verify("bob", "hunter2"));
        assert!(!store.verify("not a pair", ""));
    }

    #[test]
    fn password_keeps_everything_after_the_first_colon() {
        let store = CredentialStore::parse("carol:pass:with:colons\n");
        assert!(store.verify("carol", "pass:with:colons"));
    }

    #[test]
    fn verify_requires_exact_match() {
        let store = CredentialStore::parse("alice:secret\n");

        assert!(!store.verify("alice", "Secret"));
        assert!(!store.verify("alice", ""));
        assert!(!store.verify("mallory", "secret"));
    }

    #[test]
    fn load_missing_file_is_config_error() {
        let result = CredentialStore::load(Path::new("/nonexistent/users.txt"));
        assert!(matches!(result, Err(ServerError::Config(_))));
    }

    #[test]
    fn scrub_removes_all_spaces() {
        assert_eq!(scrub("  alice  "), "alice");
        assert_eq!(scrub("a li ce"), "alice");
        assert_eq!(scrub("alice"), "alice");
        assert_eq!(scrub("   "), "");
    }
}
