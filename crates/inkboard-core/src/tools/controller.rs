//! Pointer and keyboard state machine.
//!
//! `ToolController` owns only transient gesture state. Everything it commits
//! goes through the [`Canvas`] so history, dirty tracking and outbound
//! actions stay in one place.

use super::{ShapeTool, ToolKind};
use crate::camera::PinchGesture;
use crate::canvas::Canvas;
use crate::hit::{self, HandleKind};
use crate::history::{GeometryChange, HistoryEntry, RemovedEntity, TextSnapshot};
use crate::input::{Key, KeyInput, MouseButton, PointerInput, PointerKind, WheelInput};
use crate::shapes::{
    EntityId, EntityRef, ObjectBody, ObjectKind, SceneObject, SerializableColor, Stroke, StrokeKind, TextContent,
    stamp_preset,
};
use crate::transform::{self, EntityGeometry, HandleDrag};
use kurbo::{Point, Rect};
use std::collections::BTreeMap;

/// Height over side of an equilateral triangle.
const EQUILATERAL_RATIO: f64 = 0.866_025_403_784_438_6;
/// Initial box of a text object.
const TEXT_BOX: (f64, f64) = (160.0, 25.0);
/// Initial box of a sticky note.
const STICKY_BOX: (f64, f64) = (200.0, 200.0);

/// The single active interaction.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum InteractionState {
    #[default]
    Idle,
    DrawingStroke {
        stroke_id: EntityId,
    },
    DrawingShape {
        object_id: EntityId,
        anchor: Point,
        shape: ShapeTool,
    },
    Panning {
        last_screen: Point,
    },
    PinchZooming(PinchGesture),
    BoxSelecting {
        anchor: Point,
        current: Point,
        additive: bool,
    },
    DraggingSelection {
        start: Point,
        originals: Vec<(EntityRef, EntityGeometry)>,
    },
    ResizingObject {
        object_id: EntityId,
        drag: HandleDrag,
    },
    RotatingObject {
        object_id: EntityId,
        drag: HandleDrag,
    },
    ErasingStroke,
    EditingText {
        object_id: EntityId,
        before: TextSnapshot,
        created: bool,
    },
}

impl InteractionState {
    pub fn name(&self) -> &'static str {
        match self {
            InteractionState::Idle => "idle",
            InteractionState::DrawingStroke { .. } => "drawing-stroke",
            InteractionState::DrawingShape { .. } => "drawing-shape",
            InteractionState::Panning { .. } => "panning",
            InteractionState::PinchZooming(_) => "pinch-zooming",
            InteractionState::BoxSelecting { .. } => "box-selecting",
            InteractionState::DraggingSelection { .. } => "dragging-selection",
            InteractionState::ResizingObject { .. } => "resizing-object",
            InteractionState::RotatingObject { .. } => "rotating-object",
            InteractionState::ErasingStroke => "erasing-stroke",
            InteractionState::EditingText { .. } => "editing-text",
        }
    }
}

/// Turns pointer, wheel and key input into canvas operations.
#[derive(Debug, Default)]
pub struct ToolController {
    state: InteractionState,
    /// Active touch points in screen coordinates, by pointer id.
    touches: BTreeMap<u32, Point>,
    /// A stroke or shape draft stopped receiving moves after the pointer
    /// left the canvas.
    suspended: bool,
}

impl ToolController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &InteractionState {
        &self.state
    }

    pub fn is_idle(&self) -> bool {
        self.state == InteractionState::Idle
    }

    /// Pending box-select rectangle in world coordinates.
    pub fn marquee(&self) -> Option<Rect> {
        match self.state {
            InteractionState::BoxSelecting { anchor, current, .. } => Some(Rect::from_points(anchor, current)),
            _ => None,
        }
    }

    /// Drop all gesture state without committing anything.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    fn set_state(&mut self, state: InteractionState) {
        if std::mem::discriminant(&self.state) != std::mem::discriminant(&state) {
            log::debug!("interaction {} -> {}", self.state.name(), state.name());
        }
        self.state = state;
    }

    // --- pointer ----------------------------------------------------------

    pub fn pointer_down(&mut self, canvas: &mut Canvas, input: &PointerInput) {
        if input.kind == PointerKind::Touch {
            self.touches.insert(input.pointer_id, input.position);
            if self.touches.len() >= 2 {
                self.begin_pinch(canvas);
                return;
            }
        }
        if matches!(self.state, InteractionState::PinchZooming(_)) {
            return;
        }

        let world = canvas.screen_to_world(input.position);

        if let InteractionState::EditingText { object_id, .. } = self.state {
            let inside = canvas
                .store
                .find_object(object_id)
                .is_some_and(|o| hit::object_contains(o, world, 0.0));
            if inside {
                return;
            }
            self.commit_text(canvas);
        }
        if self.suspended {
            self.finish(canvas);
        }

        let wants_pan = matches!(input.button, MouseButton::Middle | MouseButton::Right)
            || input.modifiers.pan_key
            || *canvas.tool() == ToolKind::Pan;
        if wants_pan {
            self.finish(canvas);
            self.set_state(InteractionState::Panning {
                last_screen: input.position,
            });
            return;
        }

        match canvas.tool().clone() {
            ToolKind::Select => self.select_down(canvas, input, world),
            ToolKind::Pan => {}
            ToolKind::Pen | ToolKind::Highlighter | ToolKind::PixelEraser => {
                if let Some(kind) = canvas.tool().stroke_kind() {
                    self.begin_stroke(canvas, kind, world);
                }
            }
            ToolKind::Eraser => {
                self.set_state(InteractionState::ErasingStroke);
                erase_at(canvas, world);
            }
            ToolKind::Text => self.create_text(canvas, world, false),
            ToolKind::Sticky => self.create_text(canvas, world, true),
            ToolKind::Shape(shape) => self.begin_shape(canvas, shape, world),
            ToolKind::Stamp(key) => self.place_stamp(canvas, &key, world),
        }
    }

    pub fn pointer_move(&mut self, canvas: &mut Canvas, input: &PointerInput) {
        if input.kind == PointerKind::Touch {
            if let Some(position) = self.touches.get_mut(&input.pointer_id) {
                *position = input.position;
            }
        }
        if self.suspended {
            return;
        }
        let world = canvas.screen_to_world(input.position);
        let min_distance = canvas.config.min_point_distance;

        match &mut self.state {
            InteractionState::Idle | InteractionState::EditingText { .. } => {}
            InteractionState::DrawingStroke { stroke_id } => {
                if let Some(stroke) = canvas.store.find_stroke_mut(*stroke_id) {
                    stroke.push_point(world, min_distance);
                }
            }
            InteractionState::DrawingShape { object_id, anchor, shape } => {
                if let Some(object) = canvas.store.find_object_mut(*object_id) {
                    update_shape_draft(object, *anchor, *shape, world, input.modifiers.shift);
                }
            }
            InteractionState::Panning { last_screen } => {
                let delta = input.position - *last_screen;
                *last_screen = input.position;
                canvas.pan_by(delta);
            }
            InteractionState::PinchZooming(gesture) => {
                let mut points = self.touches.values();
                if let (Some(a), Some(b)) = (points.next(), points.next()) {
                    gesture.update(&mut canvas.camera, *a, *b);
                    canvas.notify_zoom();
                }
            }
            InteractionState::BoxSelecting { current, .. } => *current = world,
            InteractionState::DraggingSelection { start, originals } => {
                transform::translate(&mut canvas.store, originals, world - *start);
            }
            InteractionState::ResizingObject { object_id, drag }
            | InteractionState::RotatingObject { object_id, drag } => {
                if let Some(object) = canvas.store.find_object_mut(*object_id) {
                    drag.update(object, world, input.modifiers.shift);
                }
            }
            InteractionState::ErasingStroke => erase_at(canvas, world),
        }
    }

    pub fn pointer_up(&mut self, canvas: &mut Canvas, input: &PointerInput) {
        if input.kind == PointerKind::Touch {
            self.touches.remove(&input.pointer_id);
            if matches!(self.state, InteractionState::PinchZooming(_)) {
                if self.touches.len() < 2 {
                    self.set_state(InteractionState::Idle);
                }
                return;
            }
        }
        if let InteractionState::BoxSelecting { current, .. } = &mut self.state {
            *current = canvas.screen_to_world(input.position);
        }
        self.finish(canvas);
    }

    /// The pointer left the canvas. Drags, pans and box selections finish
    /// as on pointer-up; stroke and shape drafts just stop following the
    /// pointer until the next pointer-down. A touch that leaves is dropped
    /// from the active set, since its pointer-up may never arrive.
    pub fn pointer_leave(&mut self, canvas: &mut Canvas, input: &PointerInput) {
        if input.kind == PointerKind::Touch {
            self.touches.remove(&input.pointer_id);
        }
        match self.state {
            InteractionState::DrawingStroke { .. } | InteractionState::DrawingShape { .. } => {
                self.suspended = true;
            }
            InteractionState::PinchZooming(_) => {
                if self.touches.len() < 2 {
                    self.set_state(InteractionState::Idle);
                }
            }
            InteractionState::EditingText { .. } => {}
            _ => self.finish(canvas),
        }
    }

    pub fn wheel(&mut self, canvas: &mut Canvas, input: &WheelInput) -> bool {
        if input.delta.y == 0.0 {
            return false;
        }
        let factor = canvas.config.wheel_zoom_step.powf(-input.delta.y.signum());
        canvas.zoom_at_screen_point(input.position, factor)
    }

    // --- keyboard -----------------------------------------------------------

    /// Handle a key press. Returns whether the key was consumed.
    pub fn key_down(&mut self, canvas: &mut Canvas, input: &KeyInput) -> bool {
        if matches!(self.state, InteractionState::EditingText { .. }) {
            // Typing belongs to the text overlay.
            if input.key == Key::Escape {
                self.cancel_text(canvas);
                return true;
            }
            return false;
        }

        if input.modifiers.command() {
            return match input.char() {
                Some('z') => {
                    self.finish(canvas);
                    canvas.undo()
                }
                Some('c') => canvas.copy_selection(),
                Some('v') => canvas.paste().is_some(),
                Some('g') if input.modifiers.shift => canvas.ungroup_selection(),
                Some('g') => canvas.group_selection(),
                Some('a') => {
                    canvas.select_all();
                    true
                }
                _ => false,
            };
        }

        match input.key {
            Key::Delete | Key::Backspace => {
                self.finish(canvas);
                canvas.delete_selection()
            }
            Key::Escape => {
                if matches!(self.state, InteractionState::BoxSelecting { .. }) {
                    self.set_state(InteractionState::Idle);
                }
                canvas.clear_selection();
                true
            }
            _ => false,
        }
    }

    // --- text editing ---------------------------------------------------------

    /// Write the editor's draft into the edited object.
    pub fn update_text(&mut self, canvas: &mut Canvas, text: &str) -> bool {
        let InteractionState::EditingText { object_id, .. } = self.state else {
            return false;
        };
        match canvas.store.find_object_mut(object_id).and_then(SceneObject::text_mut) {
            Some(content) => {
                content.text = text.to_string();
                true
            }
            None => false,
        }
    }

    /// Close the editor keeping the text. Returns whether a change was
    /// committed.
    pub fn commit_text(&mut self, canvas: &mut Canvas) -> bool {
        let InteractionState::EditingText {
            object_id,
            before,
            created,
        } = std::mem::take(&mut self.state)
        else {
            return false;
        };
        log::debug!("interaction editing-text -> idle");
        canvas.set_editing(None);
        let Some(object) = canvas.store.find_object(object_id) else {
            return false;
        };
        let Some(after) = TextSnapshot::capture(object) else {
            return false;
        };
        let entity = EntityRef::Object(object_id);

        if created {
            if object.kind() == ObjectKind::Text && after.text.trim().is_empty() {
                discard_created(canvas, object_id);
                return false;
            }
            canvas.publish(entity, true);
            canvas.mark_dirty();
            return true;
        }
        if canvas.history.push_text_edit(object_id, before, after) {
            canvas.publish(entity, false);
            canvas.mark_dirty();
            return true;
        }
        false
    }

    /// Close the editor restoring the text it opened with.
    pub fn cancel_text(&mut self, canvas: &mut Canvas) {
        let InteractionState::EditingText {
            object_id,
            before,
            created,
        } = std::mem::take(&mut self.state)
        else {
            return;
        };
        log::debug!("interaction editing-text -> idle (cancelled)");
        canvas.set_editing(None);
        let Some(object) = canvas.store.find_object_mut(object_id) else {
            return;
        };
        before.apply(object);
        if created {
            if object.kind() == ObjectKind::Text {
                discard_created(canvas, object_id);
            } else {
                canvas.publish(EntityRef::Object(object_id), true);
                canvas.mark_dirty();
            }
        }
    }

    fn begin_text_edit(&mut self, canvas: &mut Canvas, object_id: EntityId, created: bool) {
        let Some(before) = canvas.store.find_object(object_id).and_then(TextSnapshot::capture) else {
            return;
        };
        canvas.set_editing(Some(object_id));
        canvas.set_selection([EntityRef::Object(object_id)]);
        self.set_state(InteractionState::EditingText {
            object_id,
            before,
            created,
        });
    }

    // --- gesture starts -----------------------------------------------------

    fn select_down(&mut self, canvas: &mut Canvas, input: &PointerInput, world: Point) {
        if let Some(state) = handle_drag_at(canvas, world) {
            self.set_state(state);
            return;
        }

        let tolerance = canvas.camera.px_to_world(canvas.config.stroke_hit_tolerance_px);
        let Some(entity) = hit::hit_test(&canvas.store, world, tolerance) else {
            let additive = input.modifiers.shift;
            if !additive {
                canvas.clear_selection();
            }
            self.set_state(InteractionState::BoxSelecting {
                anchor: world,
                current: world,
                additive,
            });
            return;
        };

        if let EntityRef::Object(id) = entity {
            let editable = canvas
                .store
                .find_object(id)
                .is_some_and(|o| o.kind().has_text() && !o.locked);
            if input.click_count >= 2 && editable {
                self.begin_text_edit(canvas, id, false);
                return;
            }
        }

        let members = canvas.expand_group(entity);
        if input.modifiers.shift {
            let mut next = canvas.selection.clone();
            if next.contains(entity) {
                for member in &members {
                    next.remove(*member);
                }
            } else {
                next.extend(members);
            }
            canvas.set_selection(next.entities().to_vec());
        } else if !canvas.selection.contains(entity) {
            canvas.set_selection(members);
        }

        if !canvas.selection.contains(entity) {
            return;
        }
        let originals = canvas
            .selection
            .entities()
            .iter()
            .filter(|e| !canvas.store.is_locked(**e))
            .filter_map(|e| EntityGeometry::capture(&canvas.store, *e).map(|g| (*e, g)))
            .collect();
        self.set_state(InteractionState::DraggingSelection { start: world, originals });
    }

    fn begin_stroke(&mut self, canvas: &mut Canvas, kind: StrokeKind, world: Point) {
        let (color, width) = canvas.style.ink(kind);
        let mut stroke = Stroke::new(kind, color, width, world);
        stroke.is_annotation = canvas.config.privileged;
        let stroke_id = canvas.store.add_stroke(stroke);
        canvas.history.push(HistoryEntry::StrokeAdd { id: stroke_id });
        self.set_state(InteractionState::DrawingStroke { stroke_id });
    }

    fn begin_shape(&mut self, canvas: &mut Canvas, shape: ShapeTool, world: Point) {
        let Some(body) = ObjectBody::shape(shape.object_kind(), world) else {
            return;
        };
        let mut object = SceneObject::new(body, world.x, world.y, 0.0, 0.0);
        object.stroke = canvas.style.stroke_color;
        object.fill = canvas.style.fill_color;
        object.stroke_width = canvas.style.stroke_width;
        object.is_annotation = canvas.config.privileged;
        let object_id = canvas.store.add_object(object);
        canvas.history.push(HistoryEntry::ObjectAdd { id: object_id });
        self.set_state(InteractionState::DrawingShape {
            object_id,
            anchor: world,
            shape,
        });
    }

    fn create_text(&mut self, canvas: &mut Canvas, world: Point, sticky: bool) {
        let content = TextContent {
            font_size: canvas.style.font_size,
            text_color: canvas.style.stroke_color,
            ..TextContent::default()
        };
        let mut object = if sticky {
            let mut note = SceneObject::new(ObjectBody::Sticky(content), world.x, world.y, STICKY_BOX.0, STICKY_BOX.1);
            note.fill = canvas.style.sticky_color;
            note
        } else {
            let height = TEXT_BOX.1.max(content.line_height());
            SceneObject::new(ObjectBody::Text(content), world.x, world.y, TEXT_BOX.0, height)
        };
        object.stroke = SerializableColor::transparent();
        object.is_annotation = canvas.config.privileged;
        let id = canvas.store.add_object(object);
        canvas.history.push(HistoryEntry::ObjectAdd { id });
        canvas.set_tool(ToolKind::Select);
        self.begin_text_edit(canvas, id, true);
    }

    fn place_stamp(&mut self, canvas: &mut Canvas, key: &str, world: Point) {
        let preset = stamp_preset(key);
        let size = preset.base_size;
        let mut object = SceneObject::new(
            ObjectBody::Stamp {
                stamp_key: preset.key.to_string(),
            },
            world.x - size / 2.0,
            world.y - size / 2.0,
            size,
            size,
        );
        object.stroke = canvas.style.stroke_color;
        canvas.add_object(object);
    }

    fn begin_pinch(&mut self, canvas: &mut Canvas) {
        self.finish(canvas);
        let mut points = self.touches.values();
        if let (Some(a), Some(b)) = (points.next(), points.next()) {
            let gesture = PinchGesture::begin(&canvas.camera, *a, *b);
            self.set_state(InteractionState::PinchZooming(gesture));
        }
    }

    // --- gesture ends ---------------------------------------------------------

    /// Finalize the active gesture and return to idle. Text editing is left
    /// open.
    pub fn finish(&mut self, canvas: &mut Canvas) {
        self.suspended = false;
        let state = std::mem::take(&mut self.state);
        if !matches!(state, InteractionState::Idle | InteractionState::EditingText { .. }) {
            log::debug!("interaction {} -> idle", state.name());
        }
        match state {
            InteractionState::Idle | InteractionState::Panning { .. } | InteractionState::ErasingStroke => {}
            InteractionState::EditingText { .. } => {
                self.state = state;
                return;
            }
            InteractionState::PinchZooming(_) => {}
            InteractionState::DrawingStroke { stroke_id } => {
                canvas.publish(EntityRef::Stroke(stroke_id), true);
                canvas.mark_dirty();
            }
            InteractionState::DrawingShape { object_id, .. } => finish_shape(canvas, object_id),
            InteractionState::BoxSelecting {
                anchor,
                current,
                additive,
            } => {
                let hits = hit::entities_in_rect(&canvas.store, Rect::from_points(anchor, current));
                if additive {
                    let mut next = canvas.selection.clone();
                    next.extend(hits);
                    canvas.set_selection(next.entities().to_vec());
                } else {
                    canvas.set_selection(hits);
                }
            }
            InteractionState::DraggingSelection { originals, .. } => {
                let changes = originals
                    .into_iter()
                    .filter_map(|(entity, before)| {
                        EntityGeometry::capture(&canvas.store, entity).map(|after| GeometryChange {
                            entity,
                            before,
                            after,
                        })
                    })
                    .collect();
                commit_geometry(canvas, changes);
            }
            InteractionState::ResizingObject { object_id, drag }
            | InteractionState::RotatingObject { object_id, drag } => {
                let entity = EntityRef::Object(object_id);
                if let Some(after) = EntityGeometry::capture(&canvas.store, entity) {
                    let before = EntityGeometry::Object(drag.before);
                    commit_geometry(canvas, vec![GeometryChange { entity, before, after }]);
                }
            }
        }
    }
}

/// Delete every eligible entity under the eraser, one history entry each.
fn erase_at(canvas: &mut Canvas, world: Point) {
    let tolerance = canvas.camera.px_to_world(canvas.config.stroke_hit_tolerance_px);
    let annotations_only = canvas.config.eraser_annotations_only;
    let mut erased = false;

    while let Some(id) = canvas
        .store
        .strokes()
        .iter()
        .rev()
        .find(|s| !s.locked && (!annotations_only || s.is_annotation) && s.hits(world, tolerance))
        .map(|s| s.id)
    {
        if let Some((index, stroke)) = canvas.store.remove_stroke(id) {
            canvas.history.push(HistoryEntry::DeleteSingle {
                removed: RemovedEntity::Stroke(stroke),
                index,
            });
            canvas.publish_removed(EntityRef::Stroke(id));
            erased = true;
        }
    }

    if canvas.config.privileged {
        while let Some(id) = canvas
            .store
            .objects()
            .iter()
            .rev()
            .find(|o| {
                !o.locked && (!annotations_only || o.is_annotation) && hit::object_contains(o, world, tolerance)
            })
            .map(|o| o.id)
        {
            if let Some((index, object)) = canvas.store.remove_object(id) {
                canvas.history.push(HistoryEntry::DeleteSingle {
                    removed: RemovedEntity::Object(object),
                    index,
                });
                canvas.publish_removed(EntityRef::Object(id));
                erased = true;
            }
        }
    }

    if erased {
        canvas.prune_selection();
        canvas.mark_dirty();
    }
}

/// A resize, rotate, vertex or depth drag on the single selected object, if
/// the pointer is on one of its handles.
fn handle_drag_at(canvas: &Canvas, world: Point) -> Option<InteractionState> {
    let object_id = canvas.selection.single_object()?;
    let object = canvas.store.find_object(object_id)?;
    if object.locked {
        return None;
    }
    let handle = hit::hit_test_handles(object, world, &canvas.handle_metrics())?;
    let drag = HandleDrag::begin(object, handle, world);
    Some(match handle {
        HandleKind::Rotate => InteractionState::RotatingObject { object_id, drag },
        HandleKind::Corner(_) | HandleKind::Endpoint(_) | HandleKind::Vertex(_) | HandleKind::Depth => {
            InteractionState::ResizingObject { object_id, drag }
        }
    })
}

/// Size the shape draft from the anchor to the pointer. With `constrain`
/// the box becomes a square (an equilateral box for triangles).
fn update_shape_draft(object: &mut SceneObject, anchor: Point, shape: ShapeTool, pointer: Point, constrain: bool) {
    let mut dx = pointer.x - anchor.x;
    let mut dy = pointer.y - anchor.y;
    if constrain && !object.is_linear() {
        if shape == ShapeTool::Triangle {
            let side = dx.abs().max(dy.abs() / EQUILATERAL_RATIO);
            dx = side.copysign(dx);
            dy = (side * EQUILATERAL_RATIO).copysign(dy);
        } else {
            let side = dx.abs().max(dy.abs());
            dx = side.copysign(dx);
            dy = side.copysign(dy);
        }
    }
    object.x = anchor.x;
    object.y = anchor.y;
    object.width = dx;
    object.height = dy;
    object.fit_triangle_to_box();
}

/// Commit a shape draft, or drop it with its history entry when it is
/// smaller than the minimum size on both axes.
fn finish_shape(canvas: &mut Canvas, object_id: EntityId) {
    let min_size = canvas.config.min_shape_size;
    let Some(object) = canvas.store.find_object_mut(object_id) else {
        return;
    };
    if object.width.abs() < min_size && object.height.abs() < min_size {
        log::debug!("discarding degenerate {} draft", object.kind().name());
        canvas.store.remove_object(object_id);
        canvas.history.discard_add(EntityRef::Object(object_id));
        return;
    }
    object.normalize();
    let entity = EntityRef::Object(object_id);
    canvas.publish(entity, true);
    canvas.mark_dirty();
    canvas.set_selection([entity]);
    canvas.set_tool(ToolKind::Select);
}

/// Remove a just-created object together with its `object-add` entry.
fn discard_created(canvas: &mut Canvas, object_id: EntityId) {
    canvas.store.remove_object(object_id);
    canvas.history.discard_add(EntityRef::Object(object_id));
    canvas.prune_selection();
}

/// Record the net geometry change of a gesture and publish what moved.
fn commit_geometry(canvas: &mut Canvas, changes: Vec<GeometryChange>) {
    let moved: Vec<EntityRef> = changes
        .iter()
        .filter(|c| c.before != c.after)
        .map(|c| c.entity)
        .collect();
    if !canvas.history.push_transform(changes) {
        return;
    }
    for entity in moved {
        canvas.publish(entity, false);
    }
    canvas.mark_dirty();
}
