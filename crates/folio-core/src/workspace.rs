//! Editor workspace: keyboard commands, clipboard, asset uploads and drops,
//! and pointer routing into the interaction engine.

use crate::assets::{self, AssetLibrary, AssetPayload, UploadedFile};
use crate::ids::{AssetId, ElementId, IdGenerator, PageId};
use crate::interaction::{self, InteractionConfig, InteractionEngine, InteractionUpdate};
use crate::model::PageElement;
use crate::snap::Guide;
use crate::store::{DEFAULT_INSERT_POSITION, DocumentStore};
use crate::view::ViewTransform;
use kurbo::Point;

/// Where pasted elements land.
pub const PASTE_POSITION: Point = Point::new(60.0, 60.0);

/// Editor commands reachable from the keyboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyCommand {
    ZoomIn,
    ZoomOut,
    ResetZoom,
    ToggleAssetPanel,
    Duplicate,
    Copy,
    Paste,
    Delete,
    Escape,
}

impl KeyCommand {
    /// Map a key (as reported by `KeyboardEvent.key`) to a command.
    ///
    /// `ctrl_or_meta` is true when Ctrl (or Cmd on macOS) is held.
    pub fn from_key(key: &str, ctrl_or_meta: bool) -> Option<Self> {
        if ctrl_or_meta {
            let command = match key {
                "=" => KeyCommand::ZoomIn,
                "-" => KeyCommand::ZoomOut,
                "0" => KeyCommand::ResetZoom,
                "b" => KeyCommand::ToggleAssetPanel,
                "d" => KeyCommand::Duplicate,
                "c" => KeyCommand::Copy,
                "v" => KeyCommand::Paste,
                _ => return None,
            };
            return Some(command);
        }
        match key {
            "Delete" | "Backspace" => Some(KeyCommand::Delete),
            "Escape" => Some(KeyCommand::Escape),
            _ => None,
        }
    }

    /// Commands that must not fire while a text field has focus.
    pub fn is_suppressed_in_text_input(self) -> bool {
        matches!(self, KeyCommand::Copy | KeyCommand::Paste | KeyCommand::Delete)
    }
}

/// Data carried by a drop onto a page.
#[derive(Debug, Clone, Default)]
pub struct DropData {
    /// Contents of the [`assets::ASSET_DRAG_KEY`] entry, if present.
    pub asset: Option<String>,
    pub files: Vec<UploadedFile>,
}

/// Result of importing uploaded files.
#[derive(Debug, Default)]
struct Imported {
    assets: Vec<AssetId>,
    elements: Vec<ElementId>,
}

/// Everything the editor surface needs besides rendering.
pub struct Workspace {
    pub store: DocumentStore,
    pub view: ViewTransform,
    pub assets: AssetLibrary,
    engine: InteractionEngine,
    clipboard: Option<PageElement>,
    ids: Box<dyn IdGenerator>,
    asset_panel_open: bool,
    text_input_focused: bool,
}

impl Workspace {
    /// `ids` is used for asset ids and for elements created from drops.
    pub fn new(store: DocumentStore, ids: impl IdGenerator + 'static) -> Self {
        Self {
            store,
            view: ViewTransform::default(),
            assets: AssetLibrary::new(),
            engine: InteractionEngine::default(),
            clipboard: None,
            ids: Box::new(ids),
            asset_panel_open: true,
            text_input_focused: false,
        }
    }

    pub fn with_interaction_config(mut self, config: InteractionConfig) -> Self {
        self.engine = InteractionEngine::new(config);
        self
    }

    pub fn engine(&self) -> &InteractionEngine {
        &self.engine
    }

    pub fn clipboard(&self) -> Option<&PageElement> {
        self.clipboard.as_ref()
    }

    pub fn asset_panel_open(&self) -> bool {
        self.asset_panel_open
    }

    pub fn text_input_focused(&self) -> bool {
        self.text_input_focused
    }

    /// Tell the workspace whether a text field currently has focus.
    pub fn set_text_input_focused(&mut self, focused: bool) {
        self.text_input_focused = focused;
    }

    pub fn guides(&self) -> &[Guide] {
        self.engine.guides()
    }

    // --- Keyboard ---

    /// Handle a key press. Returns true if it mapped to a command that ran.
    pub fn handle_key(&mut self, key: &str, ctrl_or_meta: bool) -> bool {
        KeyCommand::from_key(key, ctrl_or_meta).is_some_and(|command| self.execute(command))
    }

    /// Run a command. Returns false when it did not apply.
    pub fn execute(&mut self, command: KeyCommand) -> bool {
        if self.text_input_focused && command.is_suppressed_in_text_input() {
            log::debug!("{command:?} suppressed while a text field has focus");
            return false;
        }
        match command {
            KeyCommand::ZoomIn => self.view.zoom_in(),
            KeyCommand::ZoomOut => self.view.zoom_out(),
            KeyCommand::ResetZoom => {
                self.view.reset_zoom();
                true
            }
            KeyCommand::ToggleAssetPanel => {
                self.asset_panel_open = !self.asset_panel_open;
                true
            }
            KeyCommand::Duplicate => self.duplicate_selected().is_some(),
            KeyCommand::Copy => self.copy_selected(),
            KeyCommand::Paste => self.paste().is_some(),
            KeyCommand::Delete => self.delete_selected(),
            KeyCommand::Escape => {
                self.store.select_element(None);
                true
            }
        }
    }

    fn selection(&self) -> Option<(PageId, ElementId)> {
        let state = self.store.state();
        let element = state.selected_element()?;
        Some((state.selected_page_id.clone()?, element.id().clone()))
    }

    pub fn duplicate_selected(&mut self) -> Option<ElementId> {
        let (page_id, element_id) = self.selection()?;
        self.store.duplicate_element_in_page(&page_id, &element_id)
    }

    pub fn copy_selected(&mut self) -> bool {
        self.clipboard = self.store.selected_element().cloned();
        self.clipboard.is_some()
    }

    /// Paste the clipboard onto the selected page at [`PASTE_POSITION`].
    pub fn paste(&mut self) -> Option<ElementId> {
        let page_id = self.store.selected_page()?.id.clone();
        self.paste_at(&page_id, PASTE_POSITION)
    }

    pub fn paste_at(&mut self, page_id: &PageId, position: Point) -> Option<ElementId> {
        let element = self.clipboard.as_ref()?;
        self.store.paste_element(page_id, element, position)
    }

    /// Paste at a context-menu location given in screen coordinates.
    pub fn paste_at_screen(&mut self, page_id: &PageId, client: Point, page_origin: Point) -> Option<ElementId> {
        let position = self.view.screen_to_page_clamped(client, page_origin);
        self.paste_at(page_id, position)
    }

    pub fn delete_selected(&mut self) -> bool {
        match self.selection() {
            Some((page_id, element_id)) => self.store.delete_element(&page_id, &element_id),
            None => false,
        }
    }

    // --- Assets ---

    /// Add uploaded files to the asset library. Non-images and undecodable
    /// files are skipped. When a page is selected each asset is also placed
    /// on it at `position` (or the default insert position).
    pub fn upload_files(&mut self, files: &[UploadedFile], position: Option<Point>) -> Vec<AssetId> {
        let page_id = self.store.selected_page().map(|page| page.id.clone());
        self.import_files(files, page_id.as_ref(), position.unwrap_or(DEFAULT_INSERT_POSITION))
            .assets
    }

    fn import_files(&mut self, files: &[UploadedFile], page_id: Option<&PageId>, position: Point) -> Imported {
        let mut imported = Imported::default();
        for file in files.iter().filter(|file| file.is_image()) {
            let asset = match assets::decode_upload(file, self.ids.as_mut()) {
                Ok(asset) => asset,
                Err(err) => {
                    log::warn!("Skipping upload: {err}");
                    continue;
                }
            };
            if let Some(page_id) = page_id {
                let placed = self.store.add_image_to_page(
                    page_id,
                    asset.src.clone(),
                    asset.name.clone(),
                    f64::from(asset.natural_width),
                    f64::from(asset.natural_height),
                    Some(position),
                );
                imported.elements.extend(placed);
            }
            imported.assets.push(asset.id.clone());
            self.assets.add(asset);
        }
        imported
    }

    /// Handle a drop onto a page. An asset payload takes precedence over files.
    ///
    /// Returns the last element the drop created, if any.
    pub fn drop_on_page(&mut self, page_id: &PageId, client: Point, page_origin: Point, data: &DropData) -> Option<ElementId> {
        let position = self.view.screen_to_page(client, page_origin);
        if let Some(raw) = &data.asset {
            let element = AssetPayload::parse(raw)?.to_element(self.ids.as_mut(), position)?;
            return self.store.add_element(page_id, element);
        }
        self.import_files(&data.files, Some(page_id), position).elements.pop()
    }

    // --- Pointer ---

    /// Pointer-down on an element body: select it and start dragging.
    pub fn pointer_down_on_element(&mut self, page_id: &PageId, element_id: &ElementId, pointer: Point) -> interaction::Result<()> {
        self.select(page_id, element_id);
        let page = self.page_snapshot(page_id, element_id)?;
        self.engine.begin_drag(&page, element_id, pointer)
    }

    /// Pointer-down on the resize handle.
    pub fn pointer_down_on_handle(&mut self, page_id: &PageId, element_id: &ElementId, pointer: Point) -> interaction::Result<()> {
        self.select(page_id, element_id);
        let page = self.page_snapshot(page_id, element_id)?;
        self.engine.begin_resize(&page, element_id, pointer)
    }

    /// Double-click on an element: enter inline editing for text and notes.
    pub fn double_click(&mut self, page_id: &PageId, element_id: &ElementId) -> interaction::Result<()> {
        let page = self.page_snapshot(page_id, element_id)?;
        self.engine.begin_edit(&page, element_id)?;
        self.text_input_focused = true;
        Ok(())
    }

    /// Inline editor lost focus or saw Escape.
    pub fn commit_edit(&mut self, markup: &str) -> bool {
        self.text_input_focused = false;
        self.engine
            .commit_edit(markup)
            .is_some_and(|commit| commit.apply_to(&mut self.store))
    }

    pub fn pointer_move(&mut self, pointer: Point) -> Option<InteractionUpdate> {
        let page_id = match self.engine.state() {
            interaction::InteractionState::Dragging(m) | interaction::InteractionState::Resizing(m) => m.page_id.clone(),
            _ => return None,
        };
        let state = self.store.state();
        let page = state.page(&page_id)?;
        let update = self.engine.pointer_move(page, pointer, &self.view)?;
        update.apply_to(&mut self.store);
        Some(update)
    }

    pub fn pointer_up(&mut self) {
        self.engine.pointer_up();
    }

    fn select(&mut self, page_id: &PageId, element_id: &ElementId) {
        if self.store.state().selected_page_id.as_ref() != Some(page_id) {
            self.store.select_page(Some(page_id));
        }
        self.store.select_element(Some(element_id));
    }

    fn page_snapshot(&self, page_id: &PageId, element_id: &ElementId) -> interaction::Result<crate::model::DocumentPage> {
        self.store
            .state()
            .page(page_id)
            .cloned()
            .ok_or_else(|| interaction::InteractionError::ElementNotFound(element_id.clone()))
    }
}
