//! Host-facing facade: a [`Canvas`] driven by a [`ToolController`].

use crate::board::{BoardData, BoardError};
use crate::canvas::Canvas;
use crate::config::EngineConfig;
use crate::input::{KeyInput, PointerInput, WheelInput};
use crate::storage::{Storage, StorageResult};
use crate::sync::Action;
use crate::tools::{ToolController, ToolKind};

/// The whiteboard engine a host embeds.
#[derive(Default)]
pub struct Engine {
    canvas: Canvas,
    controller: ToolController,
}

impl Engine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: EngineConfig) -> Self {
        Self {
            canvas: Canvas::with_config(config),
            controller: ToolController::new(),
        }
    }

    pub fn canvas(&self) -> &Canvas {
        &self.canvas
    }

    pub fn canvas_mut(&mut self) -> &mut Canvas {
        &mut self.canvas
    }

    pub fn controller(&self) -> &ToolController {
        &self.controller
    }

    pub fn pointer_down(&mut self, input: &PointerInput) {
        self.controller.pointer_down(&mut self.canvas, input);
    }

    pub fn pointer_move(&mut self, input: &PointerInput) {
        self.controller.pointer_move(&mut self.canvas, input);
    }

    pub fn pointer_up(&mut self, input: &PointerInput) {
        self.controller.pointer_up(&mut self.canvas, input);
    }

    pub fn pointer_leave(&mut self, input: &PointerInput) {
        self.controller.pointer_leave(&mut self.canvas, input);
    }

    pub fn wheel(&mut self, input: &WheelInput) -> bool {
        self.controller.wheel(&mut self.canvas, input)
    }

    pub fn key_down(&mut self, input: &KeyInput) -> bool {
        self.controller.key_down(&mut self.canvas, input)
    }

    /// Switch tools, closing any open text editor first.
    pub fn set_tool(&mut self, tool: ToolKind) {
        self.controller.commit_text(&mut self.canvas);
        self.controller.finish(&mut self.canvas);
        self.canvas.set_tool(tool);
    }

    pub fn update_text(&mut self, text: &str) -> bool {
        self.controller.update_text(&mut self.canvas, text)
    }

    pub fn commit_text(&mut self) -> bool {
        self.controller.commit_text(&mut self.canvas)
    }

    pub fn cancel_text(&mut self) {
        self.controller.cancel_text(&mut self.canvas);
    }

    pub fn undo(&mut self) -> bool {
        self.controller.finish(&mut self.canvas);
        self.canvas.undo()
    }

    pub fn apply_action(&mut self, action: Action) -> bool {
        self.canvas.apply_action(action)
    }

    pub fn export_board_data(&self) -> BoardData {
        self.canvas.export_board_data()
    }

    /// Replace the board. Any gesture in progress is dropped.
    pub fn import_board_data(&mut self, data: BoardData) -> Result<(), BoardError> {
        self.canvas.import_board_data(data)?;
        self.controller.reset();
        Ok(())
    }

    /// Persist the board under `id` and mark it saved.
    pub async fn save_to(&mut self, storage: &dyn Storage, id: &str) -> StorageResult<()> {
        let data = self.canvas.export_board_data();
        storage.save(id, &data).await?;
        self.canvas.mark_saved();
        log::info!("Board {id} saved");
        Ok(())
    }

    /// Load the board stored under `id`.
    pub async fn load_from(&mut self, storage: &dyn Storage, id: &str) -> StorageResult<()> {
        let data = storage.load(id).await?;
        self.import_board_data(data)?;
        log::info!("Board {id} loaded");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shapes::{ObjectBody, SceneObject};
    use crate::storage::{MemoryStorage, StorageError};
    use crate::storage::test_util::block_on;
    use crate::tools::ShapeTool;
    use kurbo::Point;

    #[test]
    fn test_save_and_load_round_trip() {
        let storage = MemoryStorage::new();
        let mut engine = Engine::new();
        engine.canvas_mut().add_object(SceneObject::new(ObjectBody::Ellipse, 5.0, 5.0, 40.0, 20.0));
        assert!(engine.canvas().is_dirty());

        block_on(engine.save_to(&storage, "board")).unwrap();
        assert!(!engine.canvas().is_dirty());

        let mut other = Engine::new();
        block_on(other.load_from(&storage, "board")).unwrap();
        assert_eq!(other.canvas().store().objects(), engine.canvas().store().objects());
    }

    #[test]
    fn test_load_missing_board() {
        let storage = MemoryStorage::new();
        let mut engine = Engine::new();
        let result = block_on(engine.load_from(&storage, "missing"));
        assert!(matches!(result, Err(StorageError::NotFound(_))));
    }

    #[test]
    fn test_set_tool_commits_open_text() {
        let mut engine = Engine::new();
        engine.set_tool(ToolKind::Sticky);
        engine.pointer_down(&PointerInput::mouse(Point::new(0.0, 0.0)));
        assert!(engine.canvas().editing_object().is_some());
        engine.update_text("note");
        engine.set_tool(ToolKind::Shape(ShapeTool::Rect));
        assert!(engine.canvas().editing_object().is_none());
        assert_eq!(engine.canvas().store().objects()[0].text().unwrap().text, "note");
    }
}
