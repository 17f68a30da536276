use crate::config::{ConfigMetadata, ConfigStore, Configuration};

use super::RuntimeState;

/// Result of a committed change
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Applied {
    /// Human-readable description of the new value
    pub summary: String,
    /// Whether the change reached disk
    pub saved: bool,
}

/// Owner of all mutable settings state.
///
/// Holds the durable [`Configuration`], its [`RuntimeState`] mirror and the
/// store they persist to. Handlers receive the session by `&mut`, so at most
/// one mutation is in flight at any time.
#[derive(Debug)]
pub struct Session {
    config: Configuration,
    runtime: RuntimeState,
    store: ConfigStore,
    /// Memory holds changes the last save failed to write
    dirty: bool,
}

impl Session {
    /// Create a session from an already loaded configuration
    pub fn new(store: ConfigStore, config: Configuration) -> Self {
        let runtime = RuntimeState::from(&config);
        Self {
            config,
            runtime,
            store,
            dirty: false,
        }
    }

    /// Load settings from the store and build a session around them
    pub fn load(store: ConfigStore) -> (Self, ConfigMetadata) {
        let (config, meta) = store.load();
        (Self::new(store, config), meta)
    }

    pub fn config(&self) -> &Configuration {
        &self.config
    }

    pub fn runtime(&self) -> &RuntimeState {
        &self.runtime
    }

    pub fn store(&self) -> &ConfigStore {
        &self.store
    }

    /// True when memory is ahead of disk after a failed save
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Apply an already validated change to the configuration and its
    /// runtime mirror in one step, then persist.
    pub(crate) fn commit<F>(&mut self, summary: String, change: F) -> Applied
    where
        F: FnOnce(&mut Configuration),
    {
        change(&mut self.config);
        self.runtime = RuntimeState::from(&self.config);
        let saved = self.persist();
        Applied { summary, saved }
    }

    /// Write the configuration to disk, tracking failure in the dirty flag.
    /// Memory is never rolled back.
    pub fn persist(&mut self) -> bool {
        match self.store.save(&self.config) {
            Ok(()) => {
                self.dirty = false;
                true
            }
            Err(e) => {
                log::warn!(
                    "Could not save settings to {}: {} (changes kept in memory only)",
                    self.store.path().display(),
                    e
                );
                self.dirty = true;
                false
            }
        }
    }
}
