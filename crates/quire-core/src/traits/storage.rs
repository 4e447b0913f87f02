//! Storage capability trait.

use crate::Result;

/// Synchronous key-value persistence for session state.
///
/// The session core never branches on its execution environment; callers
/// inject the medium instead. Interactive clients pass a durable
/// implementation, non-interactive contexts pass [`NullStorage`](crate::NullStorage).
pub trait Storage: Send + Sync {
    /// Read a value. Absent keys and unreadable media both yield `None`.
    fn get(&self, key: &str) -> Option<String>;

    /// Write a value, replacing any previous one.
    fn set(&self, key: &str, value: &str) -> Result<()>;

    /// Write several values as one logical operation.
    ///
    /// Implementations backed by a single medium should override this so
    /// that no reader observes a partially written state.
    fn set_all(&self, entries: &[(&str, &str)]) -> Result<()> {
        for (key, value) in entries {
            self.set(key, value)?;
        }
        Ok(())
    }

    /// Remove a value. Removing an absent key is not an error.
    fn remove(&self, key: &str) -> Result<()>;

    /// Remove several keys as one logical operation.
    fn remove_all(&self, keys: &[&str]) -> Result<()> {
        for key in keys {
            self.remove(key)?;
        }
        Ok(())
    }
}
