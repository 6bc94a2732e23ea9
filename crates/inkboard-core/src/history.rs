//! Undo log.
//!
//! Each entry carries exactly what is needed to invert one committed
//! operation. There is no redo stack.

use crate::scene::SceneStore;
use crate::shapes::{EntityId, EntityRef, SceneObject, Stroke};
use crate::transform::EntityGeometry;

/// Maximum number of undo entries to keep.
const MAX_UNDO_HISTORY: usize = 200;

/// An entity removed from the scene, kept whole for reinsertion.
#[derive(Debug, Clone, PartialEq)]
pub enum RemovedEntity {
    Object(SceneObject),
    Stroke(Stroke),
}

impl RemovedEntity {
    pub fn entity_ref(&self) -> EntityRef {
        match self {
            RemovedEntity::Object(object) => EntityRef::Object(object.id),
            RemovedEntity::Stroke(stroke) => EntityRef::Stroke(stroke.id),
        }
    }
}

/// Before/after geometry of one transformed entity.
#[derive(Debug, Clone, PartialEq)]
pub struct GeometryChange {
    pub entity: EntityRef,
    pub before: EntityGeometry,
    pub after: EntityGeometry,
}

/// Text state recorded by a text edit.
#[derive(Debug, Clone, PartialEq)]
pub struct TextSnapshot {
    pub text: String,
    pub font_size: f64,
}

impl TextSnapshot {
    pub fn capture(object: &SceneObject) -> Option<Self> {
        object.text().map(|content| Self {
            text: content.text.clone(),
            font_size: content.font_size,
        })
    }

    pub fn apply(&self, object: &mut SceneObject) {
        if let Some(content) = object.text_mut() {
            content.text = self.text.clone();
            content.font_size = self.font_size;
        }
    }
}

/// One undoable operation.
#[derive(Debug, Clone, PartialEq)]
pub enum HistoryEntry {
    StrokeAdd { id: EntityId },
    ObjectAdd { id: EntityId },
    DeleteSingle { removed: RemovedEntity, index: usize },
    /// Deleted entities with their original indices, ascending.
    DeleteMulti {
        objects: Vec<(usize, SceneObject)>,
        strokes: Vec<(usize, Stroke)>,
    },
    Transform { changes: Vec<GeometryChange> },
    TextEdit {
        id: EntityId,
        before: TextSnapshot,
        after: TextSnapshot,
    },
    /// Previous `groupId` of every member touched by a group/ungroup.
    GroupChange { members: Vec<(EntityRef, Option<String>)> },
}

impl HistoryEntry {
    pub fn name(&self) -> &'static str {
        match self {
            HistoryEntry::StrokeAdd { .. } => "stroke-add",
            HistoryEntry::ObjectAdd { .. } => "object-add",
            HistoryEntry::DeleteSingle { .. } => "delete-single",
            HistoryEntry::DeleteMulti { .. } => "delete-multi",
            HistoryEntry::Transform { .. } => "transform",
            HistoryEntry::TextEdit { .. } => "text-edit",
            HistoryEntry::GroupChange { .. } => "group-change",
        }
    }
}

/// What an undo did to the scene, for observers and peers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UndoEffect {
    Removed(EntityRef),
    Restored(EntityRef),
    Modified(EntityRef),
}

/// Append-only stack of [`HistoryEntry`] values.
#[derive(Debug, Clone, Default)]
pub struct HistoryManager {
    entries: Vec<HistoryEntry>,
}

impl HistoryManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn can_undo(&self) -> bool {
        !self.entries.is_empty()
    }

    pub fn last(&self) -> Option<&HistoryEntry> {
        self.entries.last()
    }

    pub fn push(&mut self, entry: HistoryEntry) {
        log::debug!("history push: {}", entry.name());
        self.entries.push(entry);
        if self.entries.len() > MAX_UNDO_HISTORY {
            self.entries.remove(0);
        }
    }

    /// Record a transform, keeping only entities whose geometry changed.
    /// Returns whether an entry was pushed.
    pub fn push_transform(&mut self, changes: Vec<GeometryChange>) -> bool {
        let changes: Vec<_> = changes.into_iter().filter(|c| c.before != c.after).collect();
        if changes.is_empty() {
            return false;
        }
        self.push(HistoryEntry::Transform { changes });
        true
    }

    /// Record a text edit if it changed anything.
    pub fn push_text_edit(&mut self, id: EntityId, before: TextSnapshot, after: TextSnapshot) -> bool {
        if before == after {
            return false;
        }
        self.push(HistoryEntry::TextEdit { id, before, after });
        true
    }

    /// Drop the most recent entry if it is the add of `entity`.
    ///
    /// Used when a draft turns out degenerate and is removed again.
    pub fn discard_add(&mut self, entity: EntityRef) -> bool {
        let matches = match (self.entries.last(), entity) {
            (Some(HistoryEntry::ObjectAdd { id }), EntityRef::Object(target)) => *id == target,
            (Some(HistoryEntry::StrokeAdd { id }), EntityRef::Stroke(target)) => *id == target,
            _ => false,
        };
        if matches {
            self.entries.pop();
        }
        matches
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Pop the latest entry and apply its inverse to `store`.
    pub fn undo(&mut self, store: &mut SceneStore) -> Option<Vec<UndoEffect>> {
        let entry = self.entries.pop()?;
        log::debug!("history undo: {}", entry.name());
        let effects = match entry {
            HistoryEntry::StrokeAdd { id } => {
                store.remove_stroke(id);
                vec![UndoEffect::Removed(EntityRef::Stroke(id))]
            }
            HistoryEntry::ObjectAdd { id } => {
                store.remove_object(id);
                vec![UndoEffect::Removed(EntityRef::Object(id))]
            }
            HistoryEntry::DeleteSingle { removed, index } => {
                let entity = removed.entity_ref();
                match removed {
                    RemovedEntity::Object(object) => store.insert_object_at(index, object),
                    RemovedEntity::Stroke(stroke) => store.insert_stroke_at(index, stroke),
                }
                vec![UndoEffect::Restored(entity)]
            }
            HistoryEntry::DeleteMulti { objects, strokes } => {
                let mut effects = Vec::with_capacity(objects.len() + strokes.len());
                for (index, object) in objects {
                    effects.push(UndoEffect::Restored(EntityRef::Object(object.id)));
                    store.insert_object_at(index, object);
                }
                for (index, stroke) in strokes {
                    effects.push(UndoEffect::Restored(EntityRef::Stroke(stroke.id)));
                    store.insert_stroke_at(index, stroke);
                }
                effects
            }
            HistoryEntry::Transform { changes } => changes
                .into_iter()
                .map(|change| {
                    change.before.restore(store, change.entity);
                    UndoEffect::Modified(change.entity)
                })
                .collect(),
            HistoryEntry::TextEdit { id, before, .. } => {
                if let Some(object) = store.find_object_mut(id) {
                    before.apply(object);
                }
                vec![UndoEffect::Modified(EntityRef::Object(id))]
            }
            HistoryEntry::GroupChange { members } => members
                .into_iter()
                .map(|(entity, group_id)| {
                    store.set_group_id(entity, group_id);
                    UndoEffect::Modified(entity)
                })
                .collect(),
        };
        Some(effects)
    }
}
