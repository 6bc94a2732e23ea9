//! Canonical scene collections and id allocation.

use crate::shapes::{EntityId, EntityRef, SceneObject, Stroke};
use kurbo::Rect;
use std::collections::BTreeMap;

/// Canonical mutable collections of strokes and objects.
///
/// Vector order is z-order, back to front. Strokes and objects draw from
/// independent id counters that only ever move forward.
#[derive(Debug, Clone)]
pub struct SceneStore {
    strokes: Vec<Stroke>,
    objects: Vec<SceneObject>,
    next_stroke_id: EntityId,
    next_object_id: EntityId,
}

impl Default for SceneStore {
    fn default() -> Self {
        Self::new()
    }
}

impl SceneStore {
    pub fn new() -> Self {
        Self {
            strokes: Vec::new(),
            objects: Vec::new(),
            next_stroke_id: 1,
            next_object_id: 1,
        }
    }

    pub fn strokes(&self) -> &[Stroke] {
        &self.strokes
    }

    pub fn objects(&self) -> &[SceneObject] {
        &self.objects
    }

    pub fn next_stroke_id(&self) -> EntityId {
        self.next_stroke_id
    }

    pub fn next_object_id(&self) -> EntityId {
        self.next_object_id
    }

    pub fn is_empty(&self) -> bool {
        self.strokes.is_empty() && self.objects.is_empty()
    }

    /// Assign the next stroke id, append, and return the id.
    pub fn add_stroke(&mut self, mut stroke: Stroke) -> EntityId {
        let id = self.next_stroke_id;
        self.next_stroke_id += 1;
        stroke.id = id;
        self.strokes.push(stroke);
        id
    }

    /// Assign the next object id, append, and return the id.
    pub fn add_object(&mut self, mut object: SceneObject) -> EntityId {
        let id = self.next_object_id;
        self.next_object_id += 1;
        object.id = id;
        self.objects.push(object);
        id
    }

    /// Reinsert an object at a z-order index (clamped to the end).
    pub fn insert_object_at(&mut self, index: usize, object: SceneObject) {
        self.next_object_id = self.next_object_id.max(object.id + 1);
        let index = index.min(self.objects.len());
        self.objects.insert(index, object);
    }

    /// Reinsert a stroke at a z-order index (clamped to the end).
    pub fn insert_stroke_at(&mut self, index: usize, stroke: Stroke) {
        self.next_stroke_id = self.next_stroke_id.max(stroke.id + 1);
        let index = index.min(self.strokes.len());
        self.strokes.insert(index, stroke);
    }

    /// Remove an object, returning its former index with it.
    pub fn remove_object(&mut self, id: EntityId) -> Option<(usize, SceneObject)> {
        let index = self.object_index(id)?;
        Some((index, self.objects.remove(index)))
    }

    /// Remove a stroke, returning its former index with it.
    pub fn remove_stroke(&mut self, id: EntityId) -> Option<(usize, Stroke)> {
        let index = self.stroke_index(id)?;
        Some((index, self.strokes.remove(index)))
    }

    /// Remove either kind of entity. Returns whether anything was removed.
    pub fn remove_by_id(&mut self, entity: EntityRef) -> bool {
        match entity {
            EntityRef::Object(id) => self.remove_object(id).is_some(),
            EntityRef::Stroke(id) => self.remove_stroke(id).is_some(),
        }
    }

    pub fn delete_stroke_by_id(&mut self, id: EntityId) -> bool {
        self.remove_stroke(id).is_some()
    }

    pub fn object_index(&self, id: EntityId) -> Option<usize> {
        self.objects.iter().position(|o| o.id == id)
    }

    pub fn stroke_index(&self, id: EntityId) -> Option<usize> {
        self.strokes.iter().position(|s| s.id == id)
    }

    pub fn find_object(&self, id: EntityId) -> Option<&SceneObject> {
        self.objects.iter().find(|o| o.id == id)
    }

    pub fn find_object_mut(&mut self, id: EntityId) -> Option<&mut SceneObject> {
        self.objects.iter_mut().find(|o| o.id == id)
    }

    pub fn find_stroke(&self, id: EntityId) -> Option<&Stroke> {
        self.strokes.iter().find(|s| s.id == id)
    }

    pub fn find_stroke_mut(&mut self, id: EntityId) -> Option<&mut Stroke> {
        self.strokes.iter_mut().find(|s| s.id == id)
    }

    pub fn contains(&self, entity: EntityRef) -> bool {
        match entity {
            EntityRef::Object(id) => self.object_index(id).is_some(),
            EntityRef::Stroke(id) => self.stroke_index(id).is_some(),
        }
    }

    /// Insert an object if its id is unseen, otherwise replace it in place
    /// keeping its z-order index. Returns `true` when inserted.
    pub fn upsert_object(&mut self, object: SceneObject) -> bool {
        self.next_object_id = self.next_object_id.max(object.id + 1);
        match self.object_index(object.id) {
            Some(index) => {
                self.objects[index] = object;
                false
            }
            None => {
                self.objects.push(object);
                true
            }
        }
    }

    /// Append an externally supplied stroke. It keeps its id unless that id
    /// is already taken locally, in which case it is renumbered. The local
    /// counter always ends up past the incoming id. Returns the stored id.
    pub fn append_remote_stroke(&mut self, mut stroke: Stroke) -> EntityId {
        self.next_stroke_id = self.next_stroke_id.max(stroke.id + 1);
        if stroke.id == 0 || self.stroke_index(stroke.id).is_some() {
            stroke.id = self.next_stroke_id;
            self.next_stroke_id += 1;
        }
        let id = stroke.id;
        self.strokes.push(stroke);
        id
    }

    /// Derived `groupId -> members` index, in z-order within each group.
    pub fn group_index(&self) -> BTreeMap<String, Vec<EntityRef>> {
        let mut index: BTreeMap<String, Vec<EntityRef>> = BTreeMap::new();
        for object in &self.objects {
            if let Some(group) = &object.group_id {
                index.entry(group.clone()).or_default().push(EntityRef::Object(object.id));
            }
        }
        for stroke in &self.strokes {
            if let Some(group) = &stroke.group_id {
                index.entry(group.clone()).or_default().push(EntityRef::Stroke(stroke.id));
            }
        }
        index
    }

    /// All entities sharing `group_id`.
    pub fn group_members(&self, group_id: &str) -> Vec<EntityRef> {
        let objects = self
            .objects
            .iter()
            .filter(|o| o.group_id.as_deref() == Some(group_id))
            .map(|o| EntityRef::Object(o.id));
        let strokes = self
            .strokes
            .iter()
            .filter(|s| s.group_id.as_deref() == Some(group_id))
            .map(|s| EntityRef::Stroke(s.id));
        objects.chain(strokes).collect()
    }

    pub fn group_id_of(&self, entity: EntityRef) -> Option<&str> {
        match entity {
            EntityRef::Object(id) => self.find_object(id)?.group_id.as_deref(),
            EntityRef::Stroke(id) => self.find_stroke(id)?.group_id.as_deref(),
        }
    }

    pub fn set_group_id(&mut self, entity: EntityRef, group_id: Option<String>) {
        match entity {
            EntityRef::Object(id) => {
                if let Some(object) = self.find_object_mut(id) {
                    object.group_id = group_id;
                }
            }
            EntityRef::Stroke(id) => {
                if let Some(stroke) = self.find_stroke_mut(id) {
                    stroke.group_id = group_id;
                }
            }
        }
    }

    pub fn is_locked(&self, entity: EntityRef) -> bool {
        match entity {
            EntityRef::Object(id) => self.find_object(id).is_some_and(|o| o.locked),
            EntityRef::Stroke(id) => self.find_stroke(id).is_some_and(|s| s.locked),
        }
    }

    /// World bounds of a single entity.
    pub fn entity_bounds(&self, entity: EntityRef) -> Option<Rect> {
        match entity {
            EntityRef::Object(id) => self.find_object(id).map(SceneObject::bounds),
            EntityRef::Stroke(id) => self.find_stroke(id).map(Stroke::bounds),
        }
    }

    /// Union of all entity bounds, or `None` for an empty scene.
    pub fn content_bounds(&self) -> Option<Rect> {
        self.objects
            .iter()
            .map(SceneObject::bounds)
            .chain(self.strokes.iter().map(Stroke::bounds))
            .reduce(|acc, r| acc.union(r))
    }

    /// Replace all content (board import). Counters become one past the
    /// largest id seen, and never fall below `next_object_id_hint`.
    pub fn replace_all(
        &mut self,
        strokes: Vec<Stroke>,
        objects: Vec<SceneObject>,
        next_object_id_hint: EntityId,
    ) {
        let max_stroke = strokes.iter().map(|s| s.id).max().unwrap_or(0);
        let max_object = objects.iter().map(|o| o.id).max().unwrap_or(0);
        self.next_stroke_id = max_stroke + 1;
        self.next_object_id = (max_object + 1).max(next_object_id_hint);
        self.strokes = strokes;
        self.objects = objects;
    }

    pub fn clear(&mut self) {
        self.strokes.clear();
        self.objects.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shapes::{ObjectBody, SerializableColor, StrokeKind};
    use kurbo::Point;

    fn rect(x: f64) -> SceneObject {
        SceneObject::new(ObjectBody::Rect, x, 0.0, 10.0, 10.0)
    }

    fn stroke() -> Stroke {
        Stroke::new(StrokeKind::Pen, SerializableColor::black(), 2.0, Point::ZERO)
    }

    #[test]
    fn test_ids_are_monotonic_and_independent() {
        let mut store = SceneStore::new();
        assert_eq!(store.add_object(rect(0.0)), 1);
        assert_eq!(store.add_object(rect(0.0)), 2);
        assert_eq!(store.add_stroke(stroke()), 1);
        store.remove_object(2);
        assert_eq!(store.add_object(rect(0.0)), 3);
    }

    #[test]
    fn test_remove_and_reinsert_restores_index() {
        let mut store = SceneStore::new();
        for i in 0..4 {
            store.add_object(rect(f64::from(i)));
        }
        let (index, object) = store.remove_object(2).unwrap();
        assert_eq!(index, 1);
        store.insert_object_at(index, object);
        let ids: Vec<_> = store.objects().iter().map(|o| o.id).collect();
        assert_eq!(ids, vec![1, 2, 3, 4]);
    }

    #[test]
    fn test_upsert_object_replaces_in_place() {
        let mut store = SceneStore::new();
        store.add_object(rect(0.0));
        store.add_object(rect(1.0));
        let mut changed = store.find_object(1).unwrap().clone();
        changed.x = 99.0;
        assert!(!store.upsert_object(changed));
        assert_eq!(store.objects()[0].x, 99.0);

        let mut remote = rect(5.0);
        remote.id = 40;
        assert!(store.upsert_object(remote));
        assert_eq!(store.add_object(rect(0.0)), 41);
    }

    #[test]
    fn test_remote_stroke_appends_and_advances_counter() {
        let mut store = SceneStore::new();
        let mut remote = stroke();
        remote.id = 12;
        assert_eq!(store.append_remote_stroke(remote.clone()), 12);
        assert_eq!(store.append_remote_stroke(remote), 13);
        assert_eq!(store.strokes().len(), 2);
        assert_eq!(store.add_stroke(stroke()), 14);
    }

    #[test]
    fn test_remote_stroke_never_replaces_local() {
        let mut store = SceneStore::new();
        let local = store.add_stroke(Stroke::new(StrokeKind::Pen, SerializableColor::black(), 2.0, Point::new(1.0, 1.0)));
        let mut remote = Stroke::new(StrokeKind::Pen, SerializableColor::black(), 2.0, Point::new(500.0, 500.0));
        remote.id = local;
        let stored = store.append_remote_stroke(remote);
        assert_ne!(stored, local);
        assert_eq!(store.strokes().len(), 2);
        assert_eq!(store.find_stroke(local).unwrap().points, vec![Point::new(1.0, 1.0)]);
        assert_eq!(store.find_stroke(stored).unwrap().points, vec![Point::new(500.0, 500.0)]);
    }

    #[test]
    fn test_group_index() {
        let mut store = SceneStore::new();
        let a = store.add_object(rect(0.0));
        let b = store.add_object(rect(1.0));
        let s = store.add_stroke(stroke());
        store.set_group_id(EntityRef::Object(a), Some("g".to_string()));
        store.set_group_id(EntityRef::Stroke(s), Some("g".to_string()));
        store.set_group_id(EntityRef::Object(b), Some("h".to_string()));
        let index = store.group_index();
        assert_eq!(index["g"], vec![EntityRef::Object(a), EntityRef::Stroke(s)]);
        assert_eq!(store.group_members("h"), vec![EntityRef::Object(b)]);
    }

    #[test]
    fn test_replace_all_reconstructs_counters() {
        let mut store = SceneStore::new();
        let mut a = rect(0.0);
        a.id = 7;
        let mut s = stroke();
        s.id = 3;
        store.replace_all(vec![s], vec![a], 2);
        assert_eq!(store.next_object_id(), 8);
        assert_eq!(store.next_stroke_id(), 4);
        store.replace_all(Vec::new(), Vec::new(), 20);
        assert_eq!(store.next_object_id(), 20);
    }

    #[test]
    fn test_content_bounds() {
        let mut store = SceneStore::new();
        assert!(store.content_bounds().is_none());
        store.add_object(rect(0.0));
        store.add_object(rect(30.0));
        assert_eq!(store.content_bounds(), Some(Rect::new(0.0, 0.0, 40.0, 10.0)));
    }
}
