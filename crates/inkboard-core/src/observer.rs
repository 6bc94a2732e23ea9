//! Listener interfaces for the surrounding UI chrome.

use crate::shapes::{EntityId, EntityRef, ObjectKind};
use crate::tools::ToolKind;

/// Summary of the current selection.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SelectionInfo {
    pub entities: Vec<EntityRef>,
    /// The single selected object, if exactly one object is selected.
    pub primary_object: Option<EntityId>,
    pub primary_kind: Option<ObjectKind>,
    /// Every selected entity shares one non-null group id.
    pub grouped: bool,
    /// Every selected entity is locked.
    pub locked: bool,
}

impl SelectionInfo {
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }
}

/// Callbacks fired synchronously after the state they describe changed.
///
/// All methods default to no-ops so hosts implement only what they need.
pub trait CanvasObserver {
    fn on_selection_change(&mut self, _info: &SelectionInfo) {}
    /// Fired on transitions only.
    fn on_dirty_change(&mut self, _is_dirty: bool) {}
    fn on_zoom_change(&mut self, _scale: f64) {}
    fn on_tool_change(&mut self, _tool: &ToolKind) {}
}
