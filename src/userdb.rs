//! UID to user-name resolution
//!
//! The table is a snapshot of the system user database taken once at
//! startup. Lookups during report printing never touch libc again, so the
//! final output phase needs no locking and sees a consistent view.

use std::collections::HashMap;

/// Snapshot of the passwd database
#[derive(Debug, Default, Clone)]
pub struct UserTable {
    names: HashMap<u32, String>,
}

impl UserTable {
    /// Take a snapshot of all known users.
    ///
    /// Must be called before worker threads are spawned: the underlying
    /// passwd iteration is not thread-safe.
    pub fn snapshot() -> Self {
        let mut names = HashMap::new();
        for user in unsafe { users::all_users() } {
            names.insert(user.uid(), user.name().to_string_lossy().into_owned());
        }
        Self { names }
    }

    /// Build a table from a fixed mapping.
    pub fn from_names(names: HashMap<u32, String>) -> Self {
        Self { names }
    }

    /// Resolve a UID; unknown IDs render as `unknown(<id>)`.
    pub fn name(&self, uid: u32) -> String {
        match self.names.get(&uid) {
            Some(name) => name.clone(),
            None => format!("unknown({uid})"),
        }
    }

    /// Number of users in the snapshot
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// True when the snapshot is empty
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}
