//! Inkboard Core Library
//!
//! Platform-agnostic scene model, view transform, hit testing, transform
//! algorithms, undo log and tool state machine for the inkboard whiteboard.

pub mod board;
pub mod camera;
pub mod canvas;
pub mod config;
pub mod engine;
pub mod hit;
pub mod history;
pub mod input;
pub mod observer;
pub mod scene;
pub mod selection;
pub mod shapes;
pub mod storage;
pub mod sync;
pub mod tools;
pub mod transform;

pub use board::{BOARD_VERSION, BoardData, BoardError};
pub use camera::{Camera, PinchGesture};
pub use canvas::{Canvas, PendingLayer};
pub use config::EngineConfig;
pub use engine::Engine;
pub use hit::{Corner, Handle, HandleKind, HandleMetrics, get_handles, hit_test, hit_test_handles};
pub use history::{HistoryEntry, HistoryManager};
pub use input::{Key, KeyInput, Modifiers, MouseButton, PointerInput, PointerKind, WheelInput};
pub use observer::{CanvasObserver, SelectionInfo};
pub use scene::SceneStore;
pub use selection::Selection;
pub use shapes::{EntityId, EntityRef, ObjectBody, ObjectKind, SceneObject, SerializableColor, Stroke, StrokeKind};
pub use storage::{MemoryStorage, Storage, StorageError, StorageResult};
pub use sync::{Action, ActionSink};
pub use tools::{InteractionState, ShapeTool, ToolController, ToolKind, ToolStyle};
