//! Structured projection of a session as the chat platform displays it.

use serde::{Deserialize, Serialize};

/// One named field of a rendering.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderedField {
    /// Field label
    pub name: String,
    /// Field content
    pub value: String,
}

impl RenderedField {
    /// Create a field.
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// A rendered artifact body (an embed, on Discord).
///
/// Once the cache forgets a session this is the only durable copy of it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderedState {
    /// Free text; reviewable items carry their recognition marker here
    pub description: String,
    /// Attached image
    pub image_url: Option<String>,
    /// Named fields in display order
    pub fields: Vec<RenderedField>,
}

impl RenderedState {
    /// A rendering with only a description.
    pub fn notice(description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            ..Self::default()
        }
    }

    /// First field with the given name.
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|f| f.name == name)
            .map(|f| f.value.as_str())
    }
}

/// Visual weight of a trigger button.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ButtonStyle {
    /// Neutral action
    Primary,
    /// Positive action
    Success,
    /// Destructive action
    Danger,
}

/// A named trigger attached to an artifact.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TriggerButton {
    /// Id the platform echoes back when the trigger fires
    pub id: String,
    /// Label shown to members
    pub label: String,
    /// Visual weight
    pub style: ButtonStyle,
}
