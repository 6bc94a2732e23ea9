//! Edit actions exchanged with the network relay.
//!
//! The engine consumes actions through `Canvas::apply_action` and emits them
//! through an [`ActionSink`] after committed local edits. Transport is the
//! host's concern.

use crate::shapes::{EntityId, SceneObject, Stroke};
use serde::{Deserialize, Serialize};

/// A single scene edit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum Action {
    /// Append a stroke (replacing one with the same id).
    Stroke { stroke: Stroke },
    /// Upsert an object.
    Object { object: SceneObject },
    /// Upsert an object that already exists.
    Modify { object: SceneObject },
    Delete {
        #[serde(rename = "objectId")]
        object_id: EntityId,
    },
    DeleteStroke {
        #[serde(rename = "strokeId")]
        stroke_id: EntityId,
    },
    /// Bulk or ambiguous change: peers should re-request the whole board.
    Refresh,
    /// Any `type` this version does not know.
    #[serde(other)]
    Unknown,
}

impl Action {
    /// Parse an action, logging and dropping malformed payloads.
    pub fn parse(json: &str) -> Option<Self> {
        match serde_json::from_str(json) {
            Ok(action) => Some(action),
            Err(err) => {
                log::warn!("Ignoring malformed action: {err}");
                None
            }
        }
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

/// Receiver of locally committed actions (the outbound network side).
pub trait ActionSink {
    fn on_action(&mut self, action: &Action);
}

impl<F> ActionSink for F
where
    F: FnMut(&Action),
{
    fn on_action(&mut self, action: &Action) {
        self(action)
    }
}
