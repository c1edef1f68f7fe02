//! Pointer-driven drag, resize and inline text editing.
//!
//! The engine is a small state machine over {Idle, Dragging, Resizing,
//! Editing}. It reads the current page snapshot and produces
//! [`InteractionUpdate`]s; applying them to the store is up to the caller.

use crate::ids::{ElementId, PageId};
use crate::model::{DocumentPage, ElementUpdate, MIN_ELEMENT_SIZE, PAGE_SIZE};
use crate::snap::{Guide, SNAP_THRESHOLD, snap_to_guides};
use crate::store::DocumentStore;
use crate::text::markup_to_plain_text;
use crate::view::ViewTransform;
use kurbo::{Point, Rect, Size, Vec2};
use thiserror::Error;

/// Interaction errors.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum InteractionError {
    #[error("Another interaction is already in progress")]
    Busy,
    #[error("Element not found: {0}")]
    ElementNotFound(ElementId),
    #[error("Element is locked: {0}")]
    Locked(ElementId),
    #[error("Element has no editable text: {0}")]
    NotEditable(ElementId),
}

pub type Result<T> = std::result::Result<T, InteractionError>;

/// Tunables for drag and resize.
#[derive(Debug, Clone, PartialEq)]
pub struct InteractionConfig {
    pub snap_threshold: f64,
    pub snapping: bool,
    pub min_size: Size,
    pub page_size: Size,
}

impl Default for InteractionConfig {
    fn default() -> Self {
        Self {
            snap_threshold: SNAP_THRESHOLD,
            snapping: true,
            min_size: MIN_ELEMENT_SIZE,
            page_size: PAGE_SIZE,
        }
    }
}

impl InteractionConfig {
    pub fn with_snap_threshold(mut self, threshold: f64) -> Self {
        self.snap_threshold = threshold;
        self
    }

    pub fn with_snapping(mut self, snapping: bool) -> Self {
        self.snapping = snapping;
        self
    }

    pub fn with_min_size(mut self, min_size: Size) -> Self {
        self.min_size = min_size;
        self
    }
}

/// State captured when a drag or resize starts.
#[derive(Debug, Clone, PartialEq)]
pub struct ManipulationState {
    pub page_id: PageId,
    pub element_id: ElementId,
    /// Pointer position (screen space) at pointer-down.
    pub start_pointer: Point,
    /// Latest pointer position (screen space).
    pub current_pointer: Point,
    pub start_position: Point,
    pub start_size: Size,
}

impl ManipulationState {
    /// Pointer delta in screen pixels.
    pub fn delta(&self) -> Vec2 {
        self.current_pointer - self.start_pointer
    }
}

/// Current interaction mode.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum InteractionState {
    #[default]
    Idle,
    Dragging(ManipulationState),
    Resizing(ManipulationState),
    Editing { page_id: PageId, element_id: ElementId },
}

impl InteractionState {
    pub fn is_idle(&self) -> bool {
        matches!(self, Self::Idle)
    }

    pub fn is_editing(&self) -> bool {
        matches!(self, Self::Editing { .. })
    }

    /// Element the current session acts on, if any.
    pub fn element_id(&self) -> Option<&ElementId> {
        match self {
            Self::Idle => None,
            Self::Dragging(m) | Self::Resizing(m) => Some(&m.element_id),
            Self::Editing { element_id, .. } => Some(element_id),
        }
    }
}

/// Geometry change produced by a pointer move.
#[derive(Debug, Clone, PartialEq)]
pub enum InteractionUpdate {
    Move {
        page_id: PageId,
        element_id: ElementId,
        position: Point,
        guides: Vec<Guide>,
    },
    Resize {
        page_id: PageId,
        element_id: ElementId,
        size: Size,
    },
}

impl InteractionUpdate {
    /// Write the change into the store.
    pub fn apply_to(&self, store: &mut DocumentStore) -> bool {
        match self {
            Self::Move { page_id, element_id, position, .. } => {
                store.move_element(page_id, element_id, *position)
            }
            Self::Resize { page_id, element_id, size } => {
                store.resize_element(page_id, element_id, *size)
            }
        }
    }
}

/// Edited text to write back when an inline edit ends.
#[derive(Debug, Clone, PartialEq)]
pub struct EditCommit {
    pub page_id: PageId,
    pub element_id: ElementId,
    pub update: ElementUpdate,
}

impl EditCommit {
    pub fn apply_to(&self, store: &mut DocumentStore) -> bool {
        store.update_element(&self.page_id, &self.element_id, &self.update)
    }
}

#[derive(Debug, Clone, Default)]
pub struct InteractionEngine {
    config: InteractionConfig,
    state: InteractionState,
    guides: Vec<Guide>,
}

impl InteractionEngine {
    pub fn new(config: InteractionConfig) -> Self {
        Self {
            config,
            state: InteractionState::Idle,
            guides: Vec::new(),
        }
    }

    pub fn config(&self) -> &InteractionConfig {
        &self.config
    }

    pub fn state(&self) -> &InteractionState {
        &self.state
    }

    /// Guide lines to draw for the current drag.
    pub fn guides(&self) -> &[Guide] {
        &self.guides
    }

    /// Start moving an element.
    pub fn begin_drag(&mut self, page: &DocumentPage, element_id: &ElementId, pointer: Point) -> Result<()> {
        let manipulation = self.begin_manipulation(page, element_id, pointer)?;
        log::debug!("Drag start on {element_id}");
        self.state = InteractionState::Dragging(manipulation);
        Ok(())
    }

    /// Start resizing an element from its bottom-right handle.
    pub fn begin_resize(&mut self, page: &DocumentPage, element_id: &ElementId, pointer: Point) -> Result<()> {
        let manipulation = self.begin_manipulation(page, element_id, pointer)?;
        log::debug!("Resize start on {element_id}");
        self.state = InteractionState::Resizing(manipulation);
        Ok(())
    }

    fn begin_manipulation(
        &self,
        page: &DocumentPage,
        element_id: &ElementId,
        pointer: Point,
    ) -> Result<ManipulationState> {
        if !self.state.is_idle() {
            return Err(InteractionError::Busy);
        }
        let element = page
            .element(element_id)
            .ok_or_else(|| InteractionError::ElementNotFound(element_id.clone()))?;
        if element.locked {
            return Err(InteractionError::Locked(element_id.clone()));
        }
        Ok(ManipulationState {
            page_id: page.id.clone(),
            element_id: element_id.clone(),
            start_pointer: pointer,
            current_pointer: pointer,
            start_position: element.position,
            start_size: element.size,
        })
    }

    /// Track the pointer. `page` is the current snapshot of the page being edited.
    ///
    /// Returns `None` when no drag or resize is active.
    pub fn pointer_move(&mut self, page: &DocumentPage, pointer: Point, view: &ViewTransform) -> Option<InteractionUpdate> {
        match &mut self.state {
            InteractionState::Dragging(m) => {
                m.current_pointer = pointer;
                let delta = view.screen_delta_to_page(m.delta());
                let candidate = m.start_position + delta;
                let candidate = Point::new(candidate.x.max(0.0), candidate.y.max(0.0));
                let (page_id, element_id, size) = (m.page_id.clone(), m.element_id.clone(), m.start_size);

                let (position, guides) = if self.config.snapping {
                    let siblings: Vec<Rect> = page
                        .elements
                        .iter()
                        .filter(|el| el.id() != &element_id)
                        .map(|el| el.bounds())
                        .collect();
                    let snapped = snap_to_guides(
                        Rect::from_origin_size(candidate, size),
                        &siblings,
                        self.config.page_size,
                        self.config.snap_threshold,
                    );
                    (snapped.point, snapped.guides)
                } else {
                    (candidate, Vec::new())
                };
                self.guides.clone_from(&guides);
                Some(InteractionUpdate::Move { page_id, element_id, position, guides })
            }
            InteractionState::Resizing(m) => {
                m.current_pointer = pointer;
                let delta = view.screen_delta_to_page(m.delta());
                let size = Size::new(
                    (m.start_size.width + delta.x).max(self.config.min_size.width),
                    (m.start_size.height + delta.y).max(self.config.min_size.height),
                );
                Some(InteractionUpdate::Resize {
                    page_id: m.page_id.clone(),
                    element_id: m.element_id.clone(),
                    size,
                })
            }
            InteractionState::Idle | InteractionState::Editing { .. } => None,
        }
    }

    /// End any drag or resize and clear guides. Editing is unaffected.
    pub fn pointer_up(&mut self) {
        if matches!(self.state, InteractionState::Dragging(_) | InteractionState::Resizing(_)) {
            log::debug!("Pointer up, ending {:?}", self.state.element_id());
            self.state = InteractionState::Idle;
        }
        self.guides.clear();
    }

    /// Enter inline editing on a text box or note.
    pub fn begin_edit(&mut self, page: &DocumentPage, element_id: &ElementId) -> Result<()> {
        if !self.state.is_idle() {
            return Err(InteractionError::Busy);
        }
        let element = page
            .element(element_id)
            .ok_or_else(|| InteractionError::ElementNotFound(element_id.clone()))?;
        if !element.is_text_like() {
            return Err(InteractionError::NotEditable(element_id.clone()));
        }
        self.state = InteractionState::Editing {
            page_id: page.id.clone(),
            element_id: element_id.clone(),
        };
        Ok(())
    }

    /// Leave editing (focus loss or Escape) with the editor's markup.
    ///
    /// Returns the content update to apply, or `None` when not editing.
    pub fn commit_edit(&mut self, markup: &str) -> Option<EditCommit> {
        if !self.state.is_editing() {
            return None;
        }
        let InteractionState::Editing { page_id, element_id } = std::mem::take(&mut self.state) else {
            return None;
        };
        Some(EditCommit {
            page_id,
            element_id,
            update: ElementUpdate::new().with_content(markup_to_plain_text(markup)),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ids::SequentialIds;
    use crate::model::ElementKind;

    fn setup() -> (DocumentStore, PageId, ElementId, ElementId) {
        let mut store = DocumentStore::with_ids(SequentialIds::new());
        let page = store.state().pages[0].id.clone();
        let shape = store.add_shape_to_page(&page, Some(Point::new(100.0, 100.0))).unwrap();
        let text = store.add_text_to_page(&page, Some(Point::new(300.0, 400.0))).unwrap();
        (store, page, shape, text)
    }

    fn page_of(store: &DocumentStore, id: &PageId) -> DocumentPage {
        store.state().page(id).unwrap().clone()
    }

    #[test]
    fn test_drag_scales_delta_by_zoom() {
        let (store, page_id, shape, _) = setup();
        let page = page_of(&store, &page_id);
        let mut engine = InteractionEngine::default();
        let view = ViewTransform::new(50);

        engine.begin_drag(&page, &shape, Point::new(10.0, 10.0)).unwrap();
        let update = engine.pointer_move(&page, Point::new(30.0, 40.0), &view).unwrap();
        let InteractionUpdate::Move { position, .. } = update else {
            panic!("expected move");
        };
        assert_eq!(position, Point::new(140.0, 160.0));
    }

    #[test]
    fn test_drag_clamps_at_origin_only() {
        let (store, page_id, shape, _) = setup();
        let page = page_of(&store, &page_id);
        let mut engine = InteractionEngine::new(InteractionConfig::default().with_snapping(false));
        let view = ViewTransform::new(100);

        engine.begin_drag(&page, &shape, Point::ZERO).unwrap();
        let update = engine.pointer_move(&page, Point::new(-500.0, 2000.0), &view).unwrap();
        let InteractionUpdate::Move { position, .. } = update else {
            panic!("expected move");
        };
        assert_eq!(position, Point::new(0.0, 2100.0));
    }

    #[test]
    fn test_drag_snaps_top_edge_and_clears_guides() {
        let (mut store, page_id, shape, _) = setup();
        let page = page_of(&store, &page_id);
        let mut engine = InteractionEngine::default();
        let view = ViewTransform::new(100);

        // Text sits at y = 400; move the shape's top to y = 397.
        engine.begin_drag(&page, &shape, Point::ZERO).unwrap();
        let update = engine.pointer_move(&page, Point::new(-40.0, 297.0), &view).unwrap();
        let InteractionUpdate::Move { position, ref guides, .. } = update else {
            panic!("expected move");
        };
        assert_eq!(position.y, 400.0);
        assert!(guides.contains(&Guide::horizontal(400.0)));
        assert!(!engine.guides().is_empty());

        assert!(update.apply_to(&mut store));
        engine.pointer_up();
        assert!(engine.guides().is_empty());
        assert!(engine.state().is_idle());
        let state = store.state();
        assert_eq!(state.page(&page_id).unwrap().element(&shape).unwrap().position.y, 400.0);
    }

    #[test]
    fn test_resize_floors_at_min_size() {
        let (store, page_id, shape, _) = setup();
        let page = page_of(&store, &page_id);
        let mut engine = InteractionEngine::default();
        let view = ViewTransform::new(100);

        engine.begin_resize(&page, &shape, Point::new(220.0, 220.0)).unwrap();
        let update = engine.pointer_move(&page, Point::new(230.0, 240.0), &view).unwrap();
        assert!(matches!(update, InteractionUpdate::Resize { size, .. } if size == Size::new(130.0, 140.0)));

        let update = engine.pointer_move(&page, Point::ZERO, &view).unwrap();
        assert!(matches!(update, InteractionUpdate::Resize { size, .. } if size == MIN_ELEMENT_SIZE));
    }

    #[test]
    fn test_locked_element_cannot_move() {
        let (mut store, page_id, shape, _) = setup();
        store.update_element(&page_id, &shape, &ElementUpdate::new().with_locked(true));
        let page = page_of(&store, &page_id);
        let mut engine = InteractionEngine::default();
        assert_eq!(
            engine.begin_drag(&page, &shape, Point::ZERO),
            Err(InteractionError::Locked(shape.clone()))
        );
        assert_eq!(
            engine.begin_resize(&page, &shape, Point::ZERO),
            Err(InteractionError::Locked(shape))
        );
    }

    #[test]
    fn test_one_session_at_a_time() {
        let (store, page_id, shape, text) = setup();
        let page = page_of(&store, &page_id);
        let mut engine = InteractionEngine::default();
        engine.begin_drag(&page, &shape, Point::ZERO).unwrap();
        assert_eq!(engine.begin_resize(&page, &text, Point::ZERO), Err(InteractionError::Busy));
        assert_eq!(engine.begin_edit(&page, &text), Err(InteractionError::Busy));
    }

    #[test]
    fn test_editing_blocks_drag() {
        let (store, page_id, _, text) = setup();
        let page = page_of(&store, &page_id);
        let mut engine = InteractionEngine::default();
        engine.begin_edit(&page, &text).unwrap();
        assert_eq!(engine.begin_drag(&page, &text, Point::ZERO), Err(InteractionError::Busy));
        assert!(engine.pointer_move(&page, Point::ZERO, &ViewTransform::default()).is_none());
        engine.pointer_up();
        assert!(engine.state().is_editing());
    }

    #[test]
    fn test_edit_only_text_like() {
        let (store, page_id, shape, _) = setup();
        let page = page_of(&store, &page_id);
        let mut engine = InteractionEngine::default();
        assert_eq!(engine.begin_edit(&page, &shape), Err(InteractionError::NotEditable(shape)));
    }

    #[test]
    fn test_commit_edit_writes_plain_text() {
        let (mut store, page_id, _, text) = setup();
        let page = page_of(&store, &page_id);
        let mut engine = InteractionEngine::default();
        engine.begin_edit(&page, &text).unwrap();
        let commit = engine.commit_edit("Line one<br>Line &amp; two").unwrap();
        assert!(engine.state().is_idle());
        assert!(commit.apply_to(&mut store));

        let state = store.state();
        let ElementKind::Text(content) = &state.page(&page_id).unwrap().element(&text).unwrap().kind else {
            panic!("expected text");
        };
        assert_eq!(content.content, "Line one\nLine & two");
        assert!(engine.commit_edit("ignored").is_none());
    }
}
