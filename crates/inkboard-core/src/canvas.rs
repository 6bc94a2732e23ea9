//! Runtime canvas: scene, view, history, selection and the collaborators
//! attached to them.
//!
//! Every local mutation that is committed goes through a `Canvas` method so
//! that history, the dirty flag, observers and the outbound action sink stay
//! consistent. Remote edits enter through [`Canvas::apply_action`], which
//! touches the scene only.

use crate::board::{BOARD_VERSION, BoardData, BoardError};
use crate::camera::Camera;
use crate::config::EngineConfig;
use crate::hit::HandleMetrics;
use crate::history::{HistoryEntry, HistoryManager, RemovedEntity, UndoEffect};
use crate::observer::{CanvasObserver, SelectionInfo};
use crate::scene::SceneStore;
use crate::selection::Selection;
use crate::shapes::{
    DecodeError, EntityId, EntityRef, LinkContent, ObjectBody, ObjectKind, RasterImage, SceneObject,
    SerializableColor, Stroke, TextContent,
};
use crate::sync::{Action, ActionSink};
use crate::tools::{ToolKind, ToolStyle};
use kurbo::{Point, Rect, Vec2};
use uuid::Uuid;

/// Longest side given to an inserted image, in world units.
const MAX_IMAGE_EXTENT: f64 = 480.0;
/// Text color of inserted links.
const LINK_COLOR: SerializableColor = SerializableColor::new(0x1e, 0x66, 0xf5, 255);

/// Externally supplied entities not yet merged into the scene.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PendingLayer {
    pub strokes: Vec<Stroke>,
    pub objects: Vec<SceneObject>,
}

impl PendingLayer {
    pub fn is_empty(&self) -> bool {
        self.strokes.is_empty() && self.objects.is_empty()
    }
}

/// The whiteboard runtime state.
pub struct Canvas {
    pub(crate) store: SceneStore,
    pub(crate) camera: Camera,
    pub(crate) history: HistoryManager,
    pub(crate) selection: Selection,
    pub(crate) config: EngineConfig,
    pub(crate) style: ToolStyle,
    tool: ToolKind,
    clipboard: Option<SceneObject>,
    paste_count: u32,
    background: Option<RasterImage>,
    pending: PendingLayer,
    dirty: bool,
    device_pixel_ratio: f64,
    editing: Option<EntityId>,
    observers: Vec<Box<dyn CanvasObserver>>,
    action_sink: Option<Box<dyn ActionSink>>,
}

impl Default for Canvas {
    fn default() -> Self {
        Self::new()
    }
}

impl Canvas {
    pub fn new() -> Self {
        Self::with_config(EngineConfig::default())
    }

    pub fn with_config(config: EngineConfig) -> Self {
        Self {
            store: SceneStore::new(),
            camera: Camera::with_limits(config.min_scale, config.max_scale),
            history: HistoryManager::new(),
            selection: Selection::new(),
            config,
            style: ToolStyle::default(),
            tool: ToolKind::default(),
            clipboard: None,
            paste_count: 0,
            background: None,
            pending: PendingLayer::default(),
            dirty: false,
            device_pixel_ratio: 1.0,
            editing: None,
            observers: Vec::new(),
            action_sink: None,
        }
    }

    pub fn store(&self) -> &SceneStore {
        &self.store
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    pub fn history(&self) -> &HistoryManager {
        &self.history
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn style(&self) -> &ToolStyle {
        &self.style
    }

    pub fn style_mut(&mut self) -> &mut ToolStyle {
        &mut self.style
    }

    pub fn tool(&self) -> &ToolKind {
        &self.tool
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn background(&self) -> Option<&RasterImage> {
        self.background.as_ref()
    }

    pub fn pending(&self) -> &PendingLayer {
        &self.pending
    }

    pub fn clipboard(&self) -> Option<&SceneObject> {
        self.clipboard.as_ref()
    }

    /// Object whose text is open in the editor overlay.
    pub fn editing_object(&self) -> Option<EntityId> {
        self.editing
    }

    pub(crate) fn set_editing(&mut self, editing: Option<EntityId>) {
        self.editing = editing;
    }

    pub fn device_pixel_ratio(&self) -> f64 {
        self.device_pixel_ratio
    }

    pub fn set_device_pixel_ratio(&mut self, ratio: f64) {
        if ratio > 0.0 {
            self.device_pixel_ratio = ratio;
        }
    }

    // --- collaborators -------------------------------------------------

    pub fn add_observer(&mut self, observer: Box<dyn CanvasObserver>) {
        self.observers.push(observer);
    }

    /// Attach (or detach with `None`) the outbound action receiver.
    pub fn set_action_sink(&mut self, sink: Option<Box<dyn ActionSink>>) {
        self.action_sink = sink;
    }

    pub(crate) fn emit(&mut self, action: Action) {
        if let Some(sink) = self.action_sink.as_mut() {
            sink.on_action(&action);
        }
    }

    /// Emit the current state of an entity as an upsert.
    pub(crate) fn publish(&mut self, entity: EntityRef, created: bool) {
        let action = match entity {
            EntityRef::Object(id) => self.store.find_object(id).cloned().map(|object| {
                if created {
                    Action::Object { object }
                } else {
                    Action::Modify { object }
                }
            }),
            EntityRef::Stroke(id) => self
                .store
                .find_stroke(id)
                .cloned()
                .map(|stroke| Action::Stroke { stroke }),
        };
        if let Some(action) = action {
            self.emit(action);
        }
    }

    pub(crate) fn publish_removed(&mut self, entity: EntityRef) {
        let action = match entity {
            EntityRef::Object(object_id) => Action::Delete { object_id },
            EntityRef::Stroke(stroke_id) => Action::DeleteStroke { stroke_id },
        };
        self.emit(action);
    }

    pub(crate) fn mark_dirty(&mut self) {
        if !self.dirty {
            self.dirty = true;
            for observer in &mut self.observers {
                observer.on_dirty_change(true);
            }
        }
    }

    /// Clear the dirty flag after the host persisted the board.
    pub fn mark_saved(&mut self) {
        if self.dirty {
            self.dirty = false;
            for observer in &mut self.observers {
                observer.on_dirty_change(false);
            }
        }
    }

    pub(crate) fn notify_zoom(&mut self) {
        let scale = self.camera.scale;
        for observer in &mut self.observers {
            observer.on_zoom_change(scale);
        }
    }

    pub(crate) fn notify_selection(&mut self) {
        let info = self.selection_info();
        for observer in &mut self.observers {
            observer.on_selection_change(&info);
        }
    }

    pub fn set_tool(&mut self, tool: ToolKind) {
        if self.tool != tool {
            log::debug!("tool -> {tool:?}");
            self.tool = tool;
            let tool = self.tool.clone();
            for observer in &mut self.observers {
                observer.on_tool_change(&tool);
            }
        }
    }

    // --- view ------------------------------------------------------------

    pub fn screen_to_world(&self, screen_point: Point) -> Point {
        self.camera.screen_to_world(screen_point)
    }

    pub fn world_to_screen(&self, world_point: Point) -> Point {
        self.camera.world_to_screen(world_point)
    }

    /// Handle layout and hit sizes at the current zoom.
    pub fn handle_metrics(&self) -> HandleMetrics {
        HandleMetrics {
            scale: self.camera.scale,
            device_pixel_ratio: self.device_pixel_ratio,
            hit_px: self.config.handle_hit_px,
            rotate_offset_px: self.config.rotate_handle_offset_px,
        }
    }

    pub fn pan_by(&mut self, delta: Vec2) {
        self.camera.pan(delta);
    }

    /// Zoom keeping the world point under `screen_point` fixed.
    pub fn zoom_at_screen_point(&mut self, screen_point: Point, factor: f64) -> bool {
        let changed = self.camera.zoom_at_screen_point(screen_point, factor);
        if changed {
            self.notify_zoom();
        }
        changed
    }

    pub fn set_view(&mut self, scale: f64, offset: Vec2) {
        self.camera.scale = scale.clamp(self.camera.min_scale, self.camera.max_scale);
        self.camera.offset = offset;
        self.notify_zoom();
    }

    // --- selection -------------------------------------------------------

    pub fn selection_info(&self) -> SelectionInfo {
        let entities = self.selection.entities().to_vec();
        let primary_object = self.selection.single_object();
        let primary_kind = primary_object
            .and_then(|id| self.store.find_object(id))
            .map(SceneObject::kind);
        let first_group = entities.first().and_then(|e| self.store.group_id_of(*e));
        let grouped = first_group.is_some()
            && entities
                .iter()
                .all(|e| self.store.group_id_of(*e) == first_group);
        let locked = !entities.is_empty() && entities.iter().all(|e| self.store.is_locked(*e));
        SelectionInfo {
            entities,
            primary_object,
            primary_kind,
            grouped,
            locked,
        }
    }

    /// Replace the selection, notifying observers on change.
    pub fn set_selection(&mut self, entities: impl IntoIterator<Item = EntityRef>) {
        let mut next = Selection::new();
        next.set(entities.into_iter().filter(|e| self.store.contains(*e)));
        if next != self.selection {
            self.selection = next;
            self.notify_selection();
        }
    }

    pub fn clear_selection(&mut self) {
        self.set_selection(Vec::new());
    }

    pub fn select_all(&mut self) {
        let all: Vec<EntityRef> = self
            .store
            .objects()
            .iter()
            .map(|o| EntityRef::Object(o.id))
            .chain(self.store.strokes().iter().map(|s| EntityRef::Stroke(s.id)))
            .collect();
        self.set_selection(all);
    }

    /// The entity plus every other member of its group.
    pub fn expand_group(&self, entity: EntityRef) -> Vec<EntityRef> {
        match self.store.group_id_of(entity) {
            Some(group_id) => self.store.group_members(group_id),
            None => vec![entity],
        }
    }

    /// Drop selected entities that no longer exist.
    pub(crate) fn prune_selection(&mut self) {
        let before = self.selection.len();
        let store = &self.store;
        self.selection.retain(|e| store.contains(*e));
        if self.selection.len() != before {
            self.notify_selection();
        }
        if let Some(id) = self.editing {
            if self.store.find_object(id).is_none() {
                self.editing = None;
            }
        }
    }

    /// Existing, unlocked selected entities.
    fn editable_selection(&self) -> Vec<EntityRef> {
        self.selection
            .entities()
            .iter()
            .copied()
            .filter(|e| self.store.contains(*e) && !self.store.is_locked(*e))
            .collect()
    }

    // --- committed local edits ------------------------------------------

    /// Add a finished object: records history, marks dirty and publishes.
    pub fn add_object(&mut self, mut object: SceneObject) -> EntityId {
        object.is_annotation = self.config.privileged;
        let id = self.store.add_object(object);
        self.history.push(HistoryEntry::ObjectAdd { id });
        self.publish(EntityRef::Object(id), true);
        self.mark_dirty();
        id
    }

    /// Add a finished stroke: records history, marks dirty and publishes.
    pub fn add_stroke(&mut self, mut stroke: Stroke) -> EntityId {
        stroke.is_annotation = self.config.privileged;
        let id = self.store.add_stroke(stroke);
        self.history.push(HistoryEntry::StrokeAdd { id });
        self.publish(EntityRef::Stroke(id), true);
        self.mark_dirty();
        id
    }

    /// Delete the selection, skipping locked entities.
    ///
    /// One entity records a `delete-single` entry, more record one
    /// `delete-multi`. Returns `false` when nothing was deletable.
    pub fn delete_selection(&mut self) -> bool {
        let targets = self.editable_selection();
        match targets.as_slice() {
            [] => return false,
            [entity] => {
                let removed = match *entity {
                    EntityRef::Object(id) => self
                        .store
                        .remove_object(id)
                        .map(|(index, o)| (index, RemovedEntity::Object(o))),
                    EntityRef::Stroke(id) => self
                        .store
                        .remove_stroke(id)
                        .map(|(index, s)| (index, RemovedEntity::Stroke(s))),
                };
                if let Some((index, removed)) = removed {
                    self.history.push(HistoryEntry::DeleteSingle { removed, index });
                }
            }
            _ => {
                let mut objects: Vec<(usize, SceneObject)> = Vec::new();
                let mut strokes: Vec<(usize, Stroke)> = Vec::new();
                for entity in &targets {
                    match *entity {
                        EntityRef::Object(id) => {
                            if let (Some(index), Some(o)) = (self.store.object_index(id), self.store.find_object(id)) {
                                objects.push((index, o.clone()));
                            }
                        }
                        EntityRef::Stroke(id) => {
                            if let (Some(index), Some(s)) = (self.store.stroke_index(id), self.store.find_stroke(id)) {
                                strokes.push((index, s.clone()));
                            }
                        }
                    }
                }
                objects.sort_by_key(|(index, _)| *index);
                strokes.sort_by_key(|(index, _)| *index);
                for (_, object) in objects.iter().rev() {
                    self.store.remove_object(object.id);
                }
                for (_, stroke) in strokes.iter().rev() {
                    self.store.remove_stroke(stroke.id);
                }
                self.history.push(HistoryEntry::DeleteMulti { objects, strokes });
            }
        }
        for entity in &targets {
            self.publish_removed(*entity);
        }
        self.prune_selection();
        self.mark_dirty();
        true
    }

    /// Undo the latest history entry. Returns `false` when there is none.
    pub fn undo(&mut self) -> bool {
        let Some(effects) = self.history.undo(&mut self.store) else {
            return false;
        };
        for effect in effects {
            match effect {
                UndoEffect::Removed(entity) => self.publish_removed(entity),
                UndoEffect::Restored(entity) => self.publish(entity, true),
                UndoEffect::Modified(entity) => self.publish(entity, false),
            }
        }
        self.prune_selection();
        self.mark_dirty();
        true
    }

    /// Copy the representative (first selected) object. Images are not
    /// copyable.
    pub fn copy_selection(&mut self) -> bool {
        let Some(object) = self
            .selection
            .objects()
            .find_map(|id| self.store.find_object(id))
        else {
            return false;
        };
        if object.kind() == ObjectKind::Image {
            log::debug!("image objects are not copied");
            return false;
        }
        self.clipboard = Some(object.clone());
        self.paste_count = 0;
        true
    }

    /// Paste the clipboard object offset from the original, cascading with
    /// each paste. Returns the new id, or `None` with an empty clipboard.
    pub fn paste(&mut self) -> Option<EntityId> {
        let mut object = self.clipboard.clone()?;
        self.paste_count += 1;
        let offset = self.config.paste_offset * f64::from(self.paste_count);
        object.translate(Vec2::new(offset, offset));
        object.group_id = None;
        object.locked = false;
        let id = self.add_object(object);
        self.set_selection([EntityRef::Object(id)]);
        Some(id)
    }

    /// Put the selection (two or more entities) under a fresh group id.
    pub fn group_selection(&mut self) -> bool {
        let targets: Vec<EntityRef> = self
            .selection
            .entities()
            .iter()
            .copied()
            .filter(|e| self.store.contains(*e))
            .collect();
        if targets.len() < 2 {
            return false;
        }
        let group_id = Uuid::new_v4().to_string();
        self.change_groups(&targets, Some(group_id));
        true
    }

    /// Clear the group id of every selected grouped entity.
    pub fn ungroup_selection(&mut self) -> bool {
        let targets: Vec<EntityRef> = self
            .selection
            .entities()
            .iter()
            .copied()
            .filter(|e| self.store.group_id_of(*e).is_some())
            .collect();
        if targets.is_empty() {
            return false;
        }
        self.change_groups(&targets, None);
        true
    }

    fn change_groups(&mut self, targets: &[EntityRef], group_id: Option<String>) {
        let members = targets
            .iter()
            .map(|e| (*e, self.store.group_id_of(*e).map(str::to_string)))
            .collect();
        for entity in targets {
            self.store.set_group_id(*entity, group_id.clone());
        }
        self.history.push(HistoryEntry::GroupChange { members });
        for entity in targets {
            self.publish(*entity, false);
        }
        self.mark_dirty();
        self.notify_selection();
    }

    /// Lock or unlock every selected entity.
    pub fn set_selection_locked(&mut self, locked: bool) -> bool {
        let targets: Vec<EntityRef> = self
            .selection
            .entities()
            .iter()
            .copied()
            .filter(|e| self.store.contains(*e) && self.store.is_locked(*e) != locked)
            .collect();
        if targets.is_empty() {
            return false;
        }
        for entity in &targets {
            match *entity {
                EntityRef::Object(id) => {
                    if let Some(object) = self.store.find_object_mut(id) {
                        object.locked = locked;
                    }
                }
                EntityRef::Stroke(id) => {
                    if let Some(stroke) = self.store.find_stroke_mut(id) {
                        stroke.locked = locked;
                    }
                }
            }
            self.publish(*entity, false);
        }
        self.mark_dirty();
        self.notify_selection();
        true
    }

    /// Insert a link object with its top-left corner at a world point.
    pub fn insert_link(&mut self, url: &str, at: Point) -> EntityId {
        let content = TextContent {
            text: url.to_string(),
            font_size: self.style.font_size,
            text_color: LINK_COLOR,
            ..TextContent::default()
        };
        let width = (url.chars().count() as f64 * content.font_size * 0.6).max(80.0);
        let height = content.line_height() + 8.0;
        let body = ObjectBody::Link(LinkContent {
            content,
            url: url.to_string(),
        });
        let id = self.add_object(SceneObject::new(body, at.x, at.y, width, height));
        self.set_selection([EntityRef::Object(id)]);
        id
    }

    /// Insert a decoded raster centered on a world point, scaled down to fit
    /// [`MAX_IMAGE_EXTENT`].
    pub fn insert_image(&mut self, raster: RasterImage, at: Point) -> EntityId {
        let natural_w = f64::from(raster.width()).max(1.0);
        let natural_h = f64::from(raster.height()).max(1.0);
        let fit = (MAX_IMAGE_EXTENT / natural_w.max(natural_h)).min(1.0);
        let (w, h) = (natural_w * fit, natural_h * fit);
        let mut object = SceneObject::new(ObjectBody::Image { raster }, at.x - w / 2.0, at.y - h / 2.0, w, h);
        object.stroke = SerializableColor::transparent();
        let id = self.add_object(object);
        self.set_selection([EntityRef::Object(id)]);
        id
    }

    /// Decode encoded image bytes and insert them. A decode failure leaves
    /// the canvas untouched.
    pub fn insert_image_bytes(&mut self, bytes: &[u8], at: Point) -> Result<EntityId, DecodeError> {
        let raster = RasterImage::decode(bytes).inspect_err(|e| log::warn!("Image decode failed: {e}"))?;
        Ok(self.insert_image(raster, at))
    }

    /// Decode and set the background raster (placed at the world origin).
    pub fn set_background_bytes(&mut self, bytes: &[u8]) -> Result<(), DecodeError> {
        let raster = RasterImage::decode(bytes).inspect_err(|e| log::warn!("Background decode failed: {e}"))?;
        self.set_background(Some(raster));
        Ok(())
    }

    pub fn set_background(&mut self, background: Option<RasterImage>) {
        self.background = background;
        self.emit(Action::Refresh);
        self.mark_dirty();
    }

    // --- pending overlay ---------------------------------------------------

    /// Stage external entities to be shown as a ghost layer.
    pub fn set_pending(&mut self, strokes: Vec<Stroke>, objects: Vec<SceneObject>) {
        self.pending = PendingLayer { strokes, objects };
    }

    /// Move staged entities into the scene the way `apply_action` does:
    /// strokes are appended, objects upserted.
    /// Returns the number of merged entities.
    pub fn merge_pending(&mut self) -> usize {
        let pending = std::mem::take(&mut self.pending);
        let count = pending.strokes.len() + pending.objects.len();
        if count == 0 {
            return 0;
        }
        for stroke in pending.strokes {
            self.store.append_remote_stroke(stroke);
        }
        for object in pending.objects {
            self.store.upsert_object(object);
        }
        log::info!("Merged {count} pending entities");
        self.emit(Action::Refresh);
        self.mark_dirty();
        count
    }

    pub fn clear_pending(&mut self) {
        self.pending = PendingLayer::default();
    }

    // --- network and persistence boundary -----------------------------------

    /// Apply a remote action directly to the scene, without history, dirty
    /// tracking or re-emission. Returns whether the scene changed.
    pub fn apply_action(&mut self, action: Action) -> bool {
        let changed = match action {
            Action::Stroke { stroke } => {
                self.store.append_remote_stroke(stroke);
                true
            }
            Action::Object { object } | Action::Modify { object } => {
                self.store.upsert_object(object);
                true
            }
            Action::Delete { object_id } => self.store.remove_object(object_id).is_some(),
            Action::DeleteStroke { stroke_id } => self.store.delete_stroke_by_id(stroke_id),
            Action::Refresh => {
                log::debug!("refresh requested by peer");
                false
            }
            Action::Unknown => {
                log::warn!("Ignoring action of unknown type");
                false
            }
        };
        if changed {
            self.prune_selection();
        }
        changed
    }

    /// Parse and apply a JSON action. Malformed payloads are ignored.
    pub fn apply_action_json(&mut self, json: &str) -> bool {
        match Action::parse(json) {
            Some(action) => self.apply_action(action),
            None => false,
        }
    }

    pub fn export_board_data(&self) -> BoardData {
        BoardData {
            version: BOARD_VERSION,
            scale: self.camera.scale,
            offset_x: self.camera.offset.x,
            offset_y: self.camera.offset.y,
            next_object_id: self.store.next_object_id(),
            strokes: self.store.strokes().to_vec(),
            objects: self.store.objects().to_vec(),
            background: self.background.clone(),
        }
    }

    /// Replace the board with `data`. History, selection and pending data
    /// are reset and the board becomes clean.
    pub fn import_board_data(&mut self, data: BoardData) -> Result<(), BoardError> {
        data.check_version()?;
        log::info!(
            "Importing board: {} strokes, {} objects",
            data.strokes.len(),
            data.objects.len()
        );
        self.store.replace_all(data.strokes, data.objects, data.next_object_id);
        self.background = data.background;
        self.history.clear();
        self.pending = PendingLayer::default();
        self.editing = None;
        self.set_selection(Vec::new());
        self.set_view(data.scale, Vec2::new(data.offset_x, data.offset_y));
        self.mark_saved();
        Ok(())
    }

    pub fn export_json(&self) -> Result<String, BoardError> {
        self.export_board_data().to_json()
    }

    pub fn import_json(&mut self, json: &str) -> Result<(), BoardError> {
        self.import_board_data(BoardData::from_json(json)?)
    }

    /// Bounds of all content including the background raster.
    pub fn content_bounds(&self) -> Option<Rect> {
        let background = self.background.as_ref().map(|raster| {
            Rect::new(0.0, 0.0, f64::from(raster.width()), f64::from(raster.height()))
        });
        match (self.store.content_bounds(), background) {
            (Some(a), Some(b)) => Some(a.union(b)),
            (a, b) => a.or(b),
        }
    }
}
