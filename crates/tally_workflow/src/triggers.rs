//! Mapping platform trigger names to workflow triggers.

use derive_getters::Getters;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tally_core::{ButtonStyle, Trigger, TriggerButton};
use tally_error::ConfigError;

/// How one trigger shows up on the platform.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Getters)]
pub struct TriggerBinding {
    /// Custom id of the button
    button_id: String,
    /// Reaction emoji that fires the same trigger
    emoji: String,
    /// Button label
    label: String,
}

impl TriggerBinding {
    /// Create a binding.
    pub fn new(
        button_id: impl Into<String>,
        emoji: impl Into<String>,
        label: impl Into<String>,
    ) -> Self {
        Self {
            button_id: button_id.into(),
            emoji: emoji.into(),
            label: label.into(),
        }
    }
}

/// Bindings for every workflow trigger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Getters, derive_setters::Setters)]
#[setters(prefix = "with_")]
pub struct TriggerConfig {
    /// Accept the submission
    #[serde(default = "default_approve")]
    approve: TriggerBinding,
    /// Turn the submission down
    #[serde(default = "default_reject")]
    reject: TriggerBinding,
    /// Show the next pending submission
    #[serde(default = "default_advance")]
    advance: TriggerBinding,
    /// Delete a rejected submission
    #[serde(default = "default_remove")]
    remove: TriggerBinding,
}

fn default_approve() -> TriggerBinding {
    TriggerBinding::new("score-verify-btn", "✔️", "Verify")
}

fn default_reject() -> TriggerBinding {
    TriggerBinding::new("score-reject-btn", "❌", "Reject")
}

fn default_advance() -> TriggerBinding {
    TriggerBinding::new("score-next-btn", "👍", "Next")
}

fn default_remove() -> TriggerBinding {
    TriggerBinding::new("score-remove-btn", "👎", "Remove")
}

impl Default for TriggerConfig {
    fn default() -> Self {
        Self {
            approve: default_approve(),
            reject: default_reject(),
            advance: default_advance(),
            remove: default_remove(),
        }
    }
}

impl TriggerConfig {
    fn binding(&self, trigger: Trigger) -> &TriggerBinding {
        match trigger {
            Trigger::Approve => &self.approve,
            Trigger::Reject => &self.reject,
            Trigger::Advance => &self.advance,
            Trigger::Remove => &self.remove,
        }
    }
}

/// Dispatch table from trigger names (button ids and emoji) to triggers.
///
/// Built once at startup and handed to the workflow.
///
/// # Examples
///
/// ```
/// use tally_core::Trigger;
/// use tally_workflow::{TriggerConfig, TriggerTable};
///
/// let table = TriggerTable::from_config(&TriggerConfig::default()).unwrap();
/// assert_eq!(table.lookup("score-verify-btn"), Some(Trigger::Approve));
/// assert_eq!(table.lookup("👎"), Some(Trigger::Remove));
/// assert_eq!(table.lookup("🍕"), None);
/// ```
#[derive(Debug, Clone)]
pub struct TriggerTable {
    by_name: HashMap<String, Trigger>,
    buttons: HashMap<Trigger, TriggerButton>,
}

impl TriggerTable {
    /// Build the table, rejecting names bound to more than one trigger.
    pub fn from_config(config: &TriggerConfig) -> Result<Self, ConfigError> {
        let mut by_name = HashMap::new();
        let mut buttons = HashMap::new();

        for trigger in [
            Trigger::Approve,
            Trigger::Reject,
            Trigger::Advance,
            Trigger::Remove,
        ] {
            let binding = config.binding(trigger);
            for name in [&binding.button_id, &binding.emoji] {
                if name.is_empty() {
                    return Err(ConfigError::new(format!(
                        "trigger '{}' has an empty name",
                        trigger
                    )));
                }
                if let Some(existing) = by_name.insert(name.clone(), trigger) {
                    if existing != trigger {
                        return Err(ConfigError::new(format!(
                            "trigger name '{}' is bound to both {} and {}",
                            name, existing, trigger
                        )));
                    }
                }
            }
            buttons.insert(
                trigger,
                TriggerButton {
                    id: binding.button_id.clone(),
                    label: binding.label.clone(),
                    style: style(trigger),
                },
            );
        }

        Ok(Self { by_name, buttons })
    }

    /// Trigger fired by a button id or reaction emoji.
    pub fn lookup(&self, name: &str) -> Option<Trigger> {
        self.by_name.get(name).copied()
    }

    /// Buttons for the given triggers, in order.
    pub fn buttons(&self, triggers: &[Trigger]) -> Vec<TriggerButton> {
        triggers
            .iter()
            .filter_map(|t| self.buttons.get(t).cloned())
            .collect()
    }
}

fn style(trigger: Trigger) -> ButtonStyle {
    match trigger {
        Trigger::Approve => ButtonStyle::Success,
        Trigger::Reject | Trigger::Remove => ButtonStyle::Danger,
        Trigger::Advance => ButtonStyle::Primary,
    }
}
