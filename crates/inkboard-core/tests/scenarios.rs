//! End-to-end behavior of the engine through its public API.

use inkboard_core::hit::hit_test_object;
use inkboard_core::transform::{ObjectGeometry, resize_box};
use inkboard_core::{
    Action, BoardData, Camera, Corner, Engine, EntityRef, ObjectBody, ObjectKind, PointerInput, SceneObject,
    SerializableColor, ShapeTool, Stroke, StrokeKind, ToolKind,
};
use kurbo::{Point, Vec2};

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn drag(engine: &mut Engine, from: Point, to: Point) {
    engine.pointer_down(&PointerInput::mouse(from));
    engine.pointer_move(&PointerInput::mouse(to));
    engine.pointer_up(&PointerInput::mouse(to));
}

fn click(engine: &mut Engine, at: Point) {
    engine.pointer_down(&PointerInput::mouse(at));
    engine.pointer_up(&PointerInput::mouse(at));
}

#[test]
fn zoom_keeps_world_point_under_cursor() {
    init_logging();
    for factor in [0.5, 0.9, 1.1, 1.7, 3.0] {
        for (sx, sy) in [(0.0, 0.0), (50.0, 50.0), (-120.0, 300.5), (999.0, 3.25)] {
            let mut camera = Camera::new();
            camera.offset = Vec2::new(13.0, -42.0);
            camera.scale = 1.3;
            let screen = Point::new(sx, sy);
            let before = camera.screen_to_world(screen);
            camera.zoom_at_screen_point(screen, factor);
            let after = camera.screen_to_world(screen);
            assert!((before - after).hypot() < 1e-9, "factor {factor} at {screen:?}");
        }
    }
}

#[test]
fn zoom_at_fifty_fifty() {
    let mut engine = Engine::new();
    let screen = Point::new(50.0, 50.0);
    let world = engine.canvas().screen_to_world(screen);
    assert!(engine.canvas_mut().zoom_at_screen_point(screen, 1.1));
    assert!((engine.canvas().camera().scale - 1.1).abs() < 1e-12);
    let back = engine.canvas().world_to_screen(world);
    assert!((back - screen).hypot() < 1e-9);
}

#[test]
fn undo_of_add_restores_previous_state() {
    init_logging();
    let mut engine = Engine::new();
    engine
        .canvas_mut()
        .add_object(SceneObject::new(ObjectBody::Rect, 0.0, 0.0, 10.0, 10.0));
    let before = engine.canvas().store().objects().to_vec();

    engine.set_tool(ToolKind::Shape(ShapeTool::Cylinder));
    drag(&mut engine, Point::new(100.0, 100.0), Point::new(160.0, 200.0));
    assert_eq!(engine.canvas().store().objects().len(), 2);

    assert!(engine.undo());
    assert_eq!(engine.canvas().store().objects(), before.as_slice());
}

#[test]
fn undo_of_stroke_add_removes_stroke() {
    let mut engine = Engine::new();
    engine.set_tool(ToolKind::Highlighter);
    drag(&mut engine, Point::new(0.0, 0.0), Point::new(40.0, 0.0));
    assert_eq!(engine.canvas().store().strokes().len(), 1);
    assert_eq!(engine.canvas().store().strokes()[0].kind, StrokeKind::Highlighter);
    engine.undo();
    assert!(engine.canvas().store().strokes().is_empty());
}

#[test]
fn undo_of_delete_reinserts_at_index() {
    init_logging();
    let mut engine = Engine::new();
    for id in [1, 2, 5, 7] {
        let mut object = SceneObject::new(ObjectBody::Rect, id as f64 * 30.0, 0.0, 20.0, 20.0);
        object.id = id;
        engine.apply_action(Action::Object { object });
    }
    let canvas = engine.canvas_mut();
    canvas.set_selection([EntityRef::Object(5)]);
    assert!(canvas.delete_selection());
    assert_eq!(canvas.store().object_index(5), None);
    assert!(canvas.undo());
    assert_eq!(canvas.store().object_index(5), Some(2));
    let ids: Vec<u64> = canvas.store().objects().iter().map(|o| o.id).collect();
    assert_eq!(ids, vec![1, 2, 5, 7]);
}

#[test]
fn aspect_locked_resize_preserves_ratio() {
    for kind in [ObjectBody::Rect, ObjectBody::Ellipse] {
        let object = SceneObject::new(kind, 10.0, 20.0, 160.0, 90.0);
        let ratio = 90.0 / 160.0;
        let before = ObjectGeometry::capture(&object);
        for corner in [Corner::TopLeft, Corner::TopRight, Corner::BottomLeft, Corner::BottomRight] {
            for pointer in [
                Point::new(400.0, 25.0),
                Point::new(-80.0, 300.0),
                Point::new(15.0, 21.0),
                Point::new(170.0, -40.0),
                Point::new(10.0, 20.0),
                Point::new(170.0, 110.0),
            ] {
                let rect = resize_box(&before, corner, pointer, true);
                assert!(rect.width() > 0.0, "{corner:?} {pointer:?}");
                assert!((rect.height() / rect.width() - ratio).abs() < 1e-9, "{corner:?} {pointer:?}");
            }
        }
    }
}

#[test]
fn topmost_object_wins_hit_test() {
    let mut engine = Engine::new();
    let canvas = engine.canvas_mut();
    canvas.add_object(SceneObject::new(ObjectBody::Rect, 0.0, 0.0, 100.0, 100.0));
    let later = canvas.add_object(SceneObject::new(ObjectBody::Ellipse, 50.0, 50.0, 100.0, 100.0));
    assert_eq!(hit_test_object(canvas.store(), Point::new(75.0, 75.0), 0.0), Some(later));
}

#[test]
fn export_import_round_trip() {
    init_logging();
    let mut engine = Engine::new();
    engine.set_tool(ToolKind::Pen);
    engine.pointer_down(&PointerInput::mouse(Point::new(0.0, 0.0)));
    for i in 1..20 {
        let t = f64::from(i);
        engine.pointer_move(&PointerInput::mouse(Point::new(t * 3.25, (t % 4.0) * 7.5)));
    }
    engine.pointer_up(&PointerInput::mouse(Point::new(70.0, 0.0)));

    for shape in [ShapeTool::Triangle, ShapeTool::TriPrism, ShapeTool::DoubleArrow] {
        engine.set_tool(ToolKind::Shape(shape));
        drag(&mut engine, Point::new(200.0, 200.0), Point::new(120.0, 330.0));
    }
    engine.set_tool(ToolKind::Stamp("heart".into()));
    click(&mut engine, Point::new(500.0, 20.0));

    let json = engine.export_board_data().to_json().unwrap();
    let mut restored = Engine::new();
    restored.import_board_data(BoardData::from_json(&json).unwrap()).unwrap();

    let (a, b) = (engine.canvas().store(), restored.canvas().store());
    assert_eq!(a.strokes().len(), b.strokes().len());
    for (x, y) in a.strokes().iter().zip(b.strokes()) {
        assert_eq!(x.id, y.id);
        assert_eq!(x.points, y.points);
    }
    for (x, y) in a.objects().iter().zip(b.objects()) {
        assert_eq!((x.id, x.kind()), (y.id, y.kind()));
        assert_eq!((x.x, x.y, x.width, x.height), (y.x, y.y, y.width, y.height));
    }
    assert_eq!(a.objects().len(), b.objects().len());
}

#[test]
fn import_advances_id_counters() {
    let mut engine = Engine::new();
    let mut stroke = Stroke::new(StrokeKind::Pen, SerializableColor::black(), 2.0, Point::ZERO);
    stroke.id = 41;
    let mut object = SceneObject::new(ObjectBody::Rect, 0.0, 0.0, 5.0, 5.0);
    object.id = 12;
    let data = BoardData {
        next_object_id: 3,
        strokes: vec![stroke],
        objects: vec![object],
        ..BoardData::default()
    };
    engine.import_board_data(data).unwrap();
    let canvas = engine.canvas_mut();
    assert_eq!(canvas.add_object(SceneObject::new(ObjectBody::Rect, 0.0, 0.0, 5.0, 5.0)), 13);
    assert_eq!(
        canvas.add_stroke(Stroke::new(StrokeKind::Pen, SerializableColor::black(), 2.0, Point::ZERO)),
        42
    );
}

#[test]
fn rect_tool_drag_produces_expected_object() {
    init_logging();
    let mut engine = Engine::new();
    engine.set_tool(ToolKind::Shape(ShapeTool::Rect));
    drag(&mut engine, Point::new(100.0, 100.0), Point::new(300.0, 200.0));

    let objects = engine.canvas().store().objects();
    assert_eq!(objects.len(), 1);
    let rect = &objects[0];
    assert_eq!(rect.kind(), ObjectKind::Rect);
    assert_eq!((rect.x, rect.y, rect.width, rect.height), (100.0, 100.0, 200.0, 100.0));
}

#[test]
fn grouped_objects_select_together() {
    init_logging();
    let mut engine = Engine::new();
    let canvas = engine.canvas_mut();
    let a = canvas.add_object(SceneObject::new(ObjectBody::Rect, 0.0, 0.0, 50.0, 50.0));
    let b = canvas.add_object(SceneObject::new(ObjectBody::Rect, 200.0, 0.0, 50.0, 50.0));
    canvas.set_selection([EntityRef::Object(a), EntityRef::Object(b)]);
    assert!(canvas.group_selection());

    let group_a = canvas.store().find_object(a).unwrap().group_id.clone();
    let group_b = canvas.store().find_object(b).unwrap().group_id.clone();
    assert!(group_a.is_some());
    assert_eq!(group_a, group_b);

    canvas.clear_selection();
    click(&mut engine, Point::new(225.0, 25.0));
    let selection = engine.canvas().selection();
    assert_eq!(selection.len(), 2);
    assert!(selection.contains(EntityRef::Object(a)));
    assert!(selection.contains(EntityRef::Object(b)));
}

#[test]
fn malformed_remote_actions_are_ignored() {
    let mut engine = Engine::new();
    let canvas = engine.canvas_mut();
    assert!(!canvas.apply_action_json(r#"{"type":"laser","x":1}"#));
    assert!(!canvas.apply_action_json("not json"));
    assert!(!canvas.apply_action_json(r#"{"type":"delete-stroke","strokeId":99}"#));
    assert!(canvas.store().is_empty());
}
