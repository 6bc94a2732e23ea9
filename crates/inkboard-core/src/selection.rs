//! The current multi-selection.

use crate::shapes::{EntityId, EntityRef};

/// Ordered set of selected entities (in selection order).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    entities: Vec<EntityRef>,
}

impl Selection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entities(&self) -> &[EntityRef] {
        &self.entities
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn contains(&self, entity: EntityRef) -> bool {
        self.entities.contains(&entity)
    }

    /// Selected object ids, in selection order.
    pub fn objects(&self) -> impl Iterator<Item = EntityId> + '_ {
        self.entities.iter().filter_map(|e| match e {
            EntityRef::Object(id) => Some(*id),
            EntityRef::Stroke(_) => None,
        })
    }

    /// Selected stroke ids, in selection order.
    pub fn strokes(&self) -> impl Iterator<Item = EntityId> + '_ {
        self.entities.iter().filter_map(|e| match e {
            EntityRef::Stroke(id) => Some(*id),
            EntityRef::Object(_) => None,
        })
    }

    /// The object id when the selection is exactly one object.
    pub fn single_object(&self) -> Option<EntityId> {
        match self.entities.as_slice() {
            [EntityRef::Object(id)] => Some(*id),
            _ => None,
        }
    }

    /// Replace the selection, dropping duplicates.
    pub fn set(&mut self, entities: impl IntoIterator<Item = EntityRef>) {
        self.entities.clear();
        self.extend(entities);
    }

    pub fn extend(&mut self, entities: impl IntoIterator<Item = EntityRef>) {
        for entity in entities {
            if !self.entities.contains(&entity) {
                self.entities.push(entity);
            }
        }
    }

    pub fn remove(&mut self, entity: EntityRef) -> bool {
        let before = self.entities.len();
        self.entities.retain(|e| *e != entity);
        self.entities.len() != before
    }

    pub fn retain(&mut self, keep: impl FnMut(&EntityRef) -> bool) {
        self.entities.retain(keep);
    }

    pub fn clear(&mut self) {
        self.entities.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_dedups_and_keeps_order() {
        let mut selection = Selection::new();
        selection.set([EntityRef::Stroke(2), EntityRef::Object(1), EntityRef::Stroke(2)]);
        assert_eq!(selection.entities(), &[EntityRef::Stroke(2), EntityRef::Object(1)]);
        assert_eq!(selection.objects().collect::<Vec<_>>(), vec![1]);
        assert_eq!(selection.strokes().collect::<Vec<_>>(), vec![2]);
    }

    #[test]
    fn test_single_object() {
        let mut selection = Selection::new();
        selection.set([EntityRef::Object(4)]);
        assert_eq!(selection.single_object(), Some(4));
        selection.extend([EntityRef::Stroke(1)]);
        assert_eq!(selection.single_object(), None);
        assert!(selection.remove(EntityRef::Stroke(1)));
        assert!(!selection.remove(EntityRef::Stroke(1)));
        assert_eq!(selection.single_object(), Some(4));
    }
}
