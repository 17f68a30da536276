// Tickpress Trigger Surface
// Named hotkey triggers and their key bindings

use std::fmt::Write as _;

use indexmap::IndexMap;
use strum::IntoEnumIterator;
use strum_macros::{Display, EnumIter, IntoStaticStr};

use crate::key::Key;

/// Every action a hotkey can be bound to.
///
/// The set is fixed for the lifetime of a run: each trigger is bound to
/// exactly one key at startup and bindings are never changed afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter, IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
pub enum Trigger {
    ShowHelp,
    ShowStatus,
    SetPickupKey,
    SetSyncInterval,
    SetNonHostLag,
    ReloadDefaults,
    ToggleHostMode,
    Arm,
    Quit,
}

impl Trigger {
    /// Short description used in the help listing
    pub fn description(self) -> &'static str {
        match self {
            Trigger::ShowHelp => "show available triggers",
            Trigger::ShowStatus => "show current settings",
            Trigger::SetPickupKey => "change pickup key",
            Trigger::SetSyncInterval => "change sync interval",
            Trigger::SetNonHostLag => "change non-host lag",
            Trigger::ReloadDefaults => "reload factory defaults",
            Trigger::ToggleHostMode => "toggle host mode",
            Trigger::Arm => "arm: press at the next sync boundary",
            Trigger::Quit => "quit",
        }
    }
}

/// Errors that can occur when building a binding table
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BindingError {
    #[error("key {0} is bound more than once")]
    DuplicateKey(Key),

    #[error("trigger '{0}' is bound more than once")]
    DuplicateTrigger(Trigger),

    #[error("trigger '{0}' has no key bound")]
    Unbound(Trigger),
}

/// One-to-one mapping between hotkeys and triggers.
///
/// Insertion order is kept so the help text lists keys in the order
/// they were bound.
#[derive(Debug, Clone)]
pub struct Bindings {
    by_key: IndexMap<Key, Trigger>,
}

impl Bindings {
    /// Build a binding table, rejecting duplicates and unbound triggers.
    pub fn new<I>(pairs: I) -> Result<Self, BindingError>
    where
        I: IntoIterator<Item = (Key, Trigger)>,
    {
        let mut by_key = IndexMap::new();
        for (key, trigger) in pairs {
            if by_key.contains_key(&key) {
                return Err(BindingError::DuplicateKey(key));
            }
            if by_key.values().any(|t| *t == trigger) {
                return Err(BindingError::DuplicateTrigger(trigger));
            }
            by_key.insert(key, trigger);
        }

        if let Some(missing) = Trigger::iter().find(|t| !by_key.values().any(|b| b == t)) {
            return Err(BindingError::Unbound(missing));
        }

        Ok(Self { by_key })
    }

    /// The stock F1-F9 layout. F7/F8/F9 keep their classic
    /// toggle/arm/quit roles.
    pub fn default_layout() -> Self {
        let layout = [
            (Key(59), Trigger::ShowHelp),
            (Key(60), Trigger::ShowStatus),
            (Key(61), Trigger::SetPickupKey),
            (Key(62), Trigger::SetSyncInterval),
            (Key(63), Trigger::SetNonHostLag),
            (Key(64), Trigger::ReloadDefaults),
            (Key(65), Trigger::ToggleHostMode),
            (Key(66), Trigger::Arm),
            (Key(67), Trigger::Quit),
        ];
        Self {
            by_key: layout.into_iter().collect(),
        }
    }

    /// Look up the trigger bound to a key
    pub fn trigger_for(&self, key: Key) -> Option<Trigger> {
        self.by_key.get(&key).copied()
    }

    /// Look up the key bound to a trigger
    pub fn key_for(&self, trigger: Trigger) -> Option<Key> {
        self.by_key
            .iter()
            .find(|(_, t)| **t == trigger)
            .map(|(k, _)| *k)
    }

    /// Iterate bindings in insertion order
    pub fn iter(&self) -> impl Iterator<Item = (Key, Trigger)> + '_ {
        self.by_key.iter().map(|(k, t)| (*k, *t))
    }

    /// Static help text listing every binding
    pub fn help_text(&self) -> String {
        let mut text = String::from("Available triggers:\n");
        for (key, trigger) in self.iter() {
            let _ = writeln!(text, "  {:<4} {}", key.name(), trigger.description());
        }
        text
    }
}

impl Default for Bindings {
    fn default() -> Self {
        Self::default_layout()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_layout_is_valid() {
        let pairs: Vec<_> = Bindings::default_layout().iter().collect();
        assert!(Bindings::new(pairs).is_ok());
    }

    #[test]
    fn test_default_layout_classic_keys() {
        let bindings = Bindings::default_layout();
        assert_eq!(bindings.trigger_for(Key(65)), Some(Trigger::ToggleHostMode));
        assert_eq!(bindings.trigger_for(Key(66)), Some(Trigger::Arm));
        assert_eq!(bindings.trigger_for(Key(67)), Some(Trigger::Quit));
        assert_eq!(bindings.key_for(Trigger::Arm), Some(Key(66)));
        assert_eq!(bindings.trigger_for(Key(33)), None);
    }

    #[test]
    fn test_duplicate_key_rejected() {
        let mut pairs: Vec<_> = Bindings::default_layout().iter().collect();
        pairs.push((Key(66), Trigger::Quit));
        assert_eq!(
            Bindings::new(pairs).unwrap_err(),
            BindingError::DuplicateKey(Key(66))
        );
    }

    #[test]
    fn test_duplicate_trigger_rejected() {
        let mut pairs: Vec<_> = Bindings::default_layout().iter().collect();
        pairs.push((Key(68), Trigger::Arm));
        assert_eq!(
            Bindings::new(pairs).unwrap_err(),
            BindingError::DuplicateTrigger(Trigger::Arm)
        );
    }

    #[test]
    fn test_unbound_trigger_rejected() {
        let pairs: Vec<_> = Bindings::default_layout()
            .iter()
            .filter(|(_, t)| *t != Trigger::Quit)
            .collect();
        assert_eq!(
            Bindings::new(pairs).unwrap_err(),
            BindingError::Unbound(Trigger::Quit)
        );
    }

    #[test]
    fn test_help_text_lists_every_trigger() {
        let help = Bindings::default_layout().help_text();
        for trigger in Trigger::iter() {
            assert!(help.contains(trigger.description()), "missing {trigger}");
        }
        assert!(help.contains("F8"));
    }

    #[test]
    fn test_trigger_display_is_snake_case() {
        assert_eq!(Trigger::SetNonHostLag.to_string(), "set_non_host_lag");
        let name: &'static str = Trigger::Arm.into();
        assert_eq!(name, "arm");
    }
}
