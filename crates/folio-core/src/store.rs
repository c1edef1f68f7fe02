//! Document store: the single owner of the current document snapshot.
//!
//! Every operation builds a new [`DocumentState`] and swaps it in whole, so a
//! snapshot handed out by [`DocumentStore::state`] never changes afterwards.
//! Operations that address a missing page or element leave the state alone.

use crate::color::RgbaColor;
use crate::ids::{ElementId, IdGenerator, PageId, RandomIds};
use crate::model::{
    self, DocumentPage, DocumentState, ElementUpdate, ModelError, PageElement,
};
use kurbo::{Point, Size, Vec2};
use std::collections::HashSet;
use std::sync::Arc;

/// Where convenience inserts place new elements.
pub const DEFAULT_INSERT_POSITION: Point = Point::new(40.0, 40.0);

/// Offset applied to duplicated elements.
pub const DUPLICATE_OFFSET: Vec2 = Vec2::new(20.0, 20.0);

/// Number of pages in a fresh document.
const INITIAL_PAGE_COUNT: usize = 3;

/// Callback invoked with every new snapshot.
pub type Listener = Box<dyn FnMut(&Arc<DocumentState>)>;

/// Handle returned by [`DocumentStore::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

pub struct DocumentStore {
    state: Arc<DocumentState>,
    ids: Box<dyn IdGenerator>,
    listeners: Vec<(SubscriptionId, Listener)>,
    next_subscription: u64,
}

impl Default for DocumentStore {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for DocumentStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DocumentStore")
            .field("state", &self.state)
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

impl DocumentStore {
    /// A fresh untitled document with random ids.
    pub fn new() -> Self {
        Self::with_ids(RandomIds)
    }

    /// A fresh untitled document: three empty pages, the first one selected.
    pub fn with_ids(ids: impl IdGenerator + 'static) -> Self {
        let mut ids: Box<dyn IdGenerator> = Box::new(ids);
        let pages: Vec<DocumentPage> = (0..INITIAL_PAGE_COUNT)
            .map(|_| model::create_page(ids.as_mut()))
            .collect();
        let state = DocumentState {
            id: "doc-1".to_string(),
            name: "Untitled Document".to_string(),
            selected_page_id: pages.first().map(|page| page.id.clone()),
            selected_element_id: None,
            pages,
        };
        Self::from_parts(state, ids)
    }

    /// Start from an existing document.
    ///
    /// The document must have at least one page and unique page and element ids.
    pub fn with_state(
        state: DocumentState,
        ids: impl IdGenerator + 'static,
    ) -> Result<Self, ModelError> {
        validate(&state)?;
        Ok(Self::from_parts(state, Box::new(ids)))
    }

    fn from_parts(state: DocumentState, ids: Box<dyn IdGenerator>) -> Self {
        Self {
            state: Arc::new(state),
            ids,
            listeners: Vec::new(),
            next_subscription: 0,
        }
    }

    /// The current snapshot.
    pub fn state(&self) -> Arc<DocumentState> {
        Arc::clone(&self.state)
    }

    /// Register a listener called after every state change.
    pub fn subscribe(&mut self, listener: impl FnMut(&Arc<DocumentState>) + 'static) -> SubscriptionId {
        let id = SubscriptionId(self.next_subscription);
        self.next_subscription += 1;
        self.listeners.push((id, Box::new(listener)));
        id
    }

    /// Remove a listener. Returns false if it was not registered.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(listener_id, _)| *listener_id != id);
        self.listeners.len() != before
    }

    /// Apply `op` to a copy of the state; commit and notify only if it reports a change.
    fn mutate<R>(
        &mut self,
        name: &str,
        op: impl FnOnce(&mut DocumentState, &mut dyn IdGenerator) -> Option<R>,
    ) -> Option<R> {
        let mut next = DocumentState::clone(&self.state);
        let Some(result) = op(&mut next, self.ids.as_mut()) else {
            log::debug!("{name}: no change");
            return None;
        };
        self.state = Arc::new(next);
        for (_, listener) in &mut self.listeners {
            listener(&self.state);
        }
        Some(result)
    }

    // --- Queries ---

    pub fn selected_page(&self) -> Option<&DocumentPage> {
        self.state.selected_page()
    }

    pub fn selected_element(&self) -> Option<&PageElement> {
        self.state.selected_element()
    }

    pub fn total_element_count(&self) -> usize {
        self.state.total_element_count()
    }

    // --- Document and pages ---

    pub fn set_document_name(&mut self, name: impl Into<String>) {
        let name = name.into();
        self.mutate("set_document_name", |state, _| {
            (state.name != name).then(|| state.name = name)
        });
    }

    /// Select a page (or none). Always clears the element selection.
    pub fn select_page(&mut self, id: Option<&PageId>) {
        self.mutate("select_page", |state, _| {
            if let Some(id) = id {
                if !state.contains_page(id) {
                    return None;
                }
            }
            let selected = id.cloned();
            if state.selected_page_id == selected && state.selected_element_id.is_none() {
                return None;
            }
            state.selected_page_id = selected;
            state.selected_element_id = None;
            Some(())
        });
    }

    /// Select an element (or none) without touching the page selection.
    /// Only elements on the selected page can be selected.
    pub fn select_element(&mut self, id: Option<&ElementId>) {
        self.mutate("select_element", |state, _| {
            if let Some(id) = id {
                if state.selected_page().and_then(|page| page.element(id)).is_none() {
                    log::debug!("Ignoring selection of {id} outside the selected page");
                    return None;
                }
            }
            let selected = id.cloned();
            (state.selected_element_id != selected).then(|| state.selected_element_id = selected)
        });
    }

    /// Append a fresh page and select it.
    pub fn add_page(&mut self) -> PageId {
        let page = model::create_page(self.ids.as_mut());
        let id = page.id.clone();
        self.mutate("add_page", |state, _| {
            state.selected_page_id = Some(page.id.clone());
            state.selected_element_id = None;
            state.pages.push(page);
            Some(())
        });
        id
    }

    /// Remove a page. The last remaining page is never removed.
    /// Any deletion clears the element selection.
    pub fn delete_page(&mut self, id: &PageId) -> bool {
        self.mutate("delete_page", |state, _| {
            if state.pages.len() <= 1 {
                log::debug!("Refusing to delete the last page {id}");
                return None;
            }
            let index = state.page_index(id)?;
            state.pages.remove(index);
            if state.selected_page_id.as_ref() == Some(id) {
                state.selected_page_id = state.pages.first().map(|page| page.id.clone());
            }
            state.selected_element_id = None;
            Some(())
        })
        .is_some()
    }

    /// Deep-clone a page after the original, with fresh page and element ids.
    pub fn duplicate_page(&mut self, id: &PageId) -> Option<PageId> {
        self.mutate("duplicate_page", |state, ids| {
            let index = state.page_index(id)?;
            let source = &state.pages[index];
            let copy = DocumentPage {
                id: ids.page_id(),
                background_color: source.background_color,
                elements: source
                    .elements
                    .iter()
                    .map(|el| el.with_id(ids.element_id()))
                    .collect(),
            };
            let copy_id = copy.id.clone();
            state.pages.insert(index + 1, copy);
            state.selected_page_id = Some(copy_id.clone());
            state.selected_element_id = None;
            Some(copy_id)
        })
    }

    /// Move the page at `from` to index `to`.
    pub fn reorder_pages(&mut self, from: usize, to: usize) -> bool {
        self.mutate("reorder_pages", |state, _| {
            if from == to || from >= state.pages.len() || to >= state.pages.len() {
                return None;
            }
            let page = state.pages.remove(from);
            state.pages.insert(to, page);
            Some(())
        })
        .is_some()
    }

    pub fn update_page_background(&mut self, id: &PageId, color: RgbaColor) {
        self.mutate("update_page_background", |state, _| {
            let page = state.page_mut(id)?;
            (page.background_color != color).then(|| page.background_color = color)
        });
    }

    // --- Elements ---

    /// Append an element on top of its siblings and select it.
    ///
    /// The supplied z-index is replaced by `sibling count + 1`, and the id is
    /// replaced when it is already used in the document.
    pub fn add_element(&mut self, page_id: &PageId, element: PageElement) -> Option<ElementId> {
        self.mutate("add_element", |state, ids| {
            let mut element = element;
            if state.contains_element(&element.id) {
                let fresh = ids.element_id();
                log::debug!("Element id {} already in use, assigning {fresh}", element.id);
                element.id = fresh;
            }
            let page = state.page_mut(page_id)?;
            element.z_index = next_z(page);
            let id = element.id.clone();
            page.elements.push(element);
            select(state, page_id, &id);
            Some(id)
        })
    }

    /// Shallow-merge `update` into an element.
    pub fn update_element(&mut self, page_id: &PageId, element_id: &ElementId, update: &ElementUpdate) -> bool {
        self.mutate("update_element", |state, _| {
            let element = state.page_mut(page_id)?.element_mut(element_id)?;
            let before = element.clone();
            update.apply(element);
            (*element != before).then_some(())
        })
        .is_some()
    }

    pub fn delete_element(&mut self, page_id: &PageId, element_id: &ElementId) -> bool {
        self.mutate("delete_element", |state, _| {
            let page = state.page_mut(page_id)?;
            let index = page.elements.iter().position(|el| &el.id == element_id)?;
            page.elements.remove(index);
            if state.selected_element_id.as_ref() == Some(element_id) {
                state.selected_element_id = None;
            }
            Some(())
        })
        .is_some()
    }

    /// Clone an element with a fresh id, offset by (20, 20) and brought to front.
    pub fn duplicate_element_in_page(&mut self, page_id: &PageId, element_id: &ElementId) -> Option<ElementId> {
        self.mutate("duplicate_element_in_page", |state, ids| {
            let page = state.page_mut(page_id)?;
            let mut copy = page.element(element_id)?.with_id(ids.element_id());
            copy.position += DUPLICATE_OFFSET;
            copy.z_index = next_z(page);
            let id = copy.id.clone();
            page.elements.push(copy);
            select(state, page_id, &id);
            Some(id)
        })
    }

    /// Insert a copy of `element` (for example from the clipboard) at `position`.
    pub fn paste_element(&mut self, page_id: &PageId, element: &PageElement, position: Point) -> Option<ElementId> {
        let mut copy = element.with_id(self.ids.element_id());
        copy.position = position;
        self.add_element(page_id, copy)
    }

    /// Set the z-index above every sibling: `max(z, 0) + 1`.
    pub fn bring_to_front(&mut self, page_id: &PageId, element_id: &ElementId) {
        self.mutate("bring_to_front", |state, _| {
            let page = state.page_mut(page_id)?;
            let z = page.max_z_index().unwrap_or(0).max(0) + 1;
            set_z(page, element_id, z)
        });
    }

    /// Set the z-index to `max(0, min(min z, 1) - 1)`.
    ///
    /// This can tie with a sibling's z-index; paint order then falls back to
    /// insertion order.
    pub fn send_to_back(&mut self, page_id: &PageId, element_id: &ElementId) {
        self.mutate("send_to_back", |state, _| {
            let page = state.page_mut(page_id)?;
            let z = (page.min_z_index().unwrap_or(1).min(1) - 1).max(0);
            set_z(page, element_id, z)
        });
    }

    pub fn add_text_to_page(&mut self, page_id: &PageId, position: Option<Point>) -> Option<ElementId> {
        let element = model::create_text_element(
            self.ids.as_mut(),
            position.unwrap_or(DEFAULT_INSERT_POSITION),
            None,
        );
        self.add_element(page_id, element)
    }

    pub fn add_note_to_page(&mut self, page_id: &PageId, position: Option<Point>) -> Option<ElementId> {
        let element =
            model::create_note_element(self.ids.as_mut(), position.unwrap_or(DEFAULT_INSERT_POSITION));
        self.add_element(page_id, element)
    }

    pub fn add_shape_to_page(&mut self, page_id: &PageId, position: Option<Point>) -> Option<ElementId> {
        let element =
            model::create_shape_element(self.ids.as_mut(), position.unwrap_or(DEFAULT_INSERT_POSITION));
        self.add_element(page_id, element)
    }

    pub fn add_image_to_page(
        &mut self,
        page_id: &PageId,
        src: impl Into<String>,
        file_name: impl Into<String>,
        natural_width: f64,
        natural_height: f64,
        position: Option<Point>,
    ) -> Option<ElementId> {
        let element = model::create_image_element(
            self.ids.as_mut(),
            position.unwrap_or(DEFAULT_INSERT_POSITION),
            src,
            file_name,
            natural_width,
            natural_height,
        );
        self.add_element(page_id, element)
    }

    pub fn move_element(&mut self, page_id: &PageId, element_id: &ElementId, position: Point) -> bool {
        self.update_element(page_id, element_id, &ElementUpdate::new().with_position(position))
    }

    pub fn resize_element(&mut self, page_id: &PageId, element_id: &ElementId, size: Size) -> bool {
        self.update_element(page_id, element_id, &ElementUpdate::new().with_size(size))
    }
}

fn next_z(page: &DocumentPage) -> i64 {
    page.elements.len() as i64 + 1
}

fn set_z(page: &mut DocumentPage, element_id: &ElementId, z: i64) -> Option<()> {
    let element = page.element_mut(element_id)?;
    (element.z_index != z).then(|| element.z_index = z)
}

/// Select an element together with its owning page.
fn select(state: &mut DocumentState, page_id: &PageId, element_id: &ElementId) {
    state.selected_page_id = Some(page_id.clone());
    state.selected_element_id = Some(element_id.clone());
}

fn validate(state: &DocumentState) -> Result<(), ModelError> {
    if state.pages.is_empty() {
        return Err(ModelError::NoPages);
    }
    let mut seen = HashSet::new();
    for page in &state.pages {
        if !seen.insert(page.id.as_str()) {
            return Err(ModelError::DuplicateId(page.id.to_string()));
        }
        for element in &page.elements {
            if !seen.insert(element.id.as_str()) {
                return Err(ModelError::DuplicateId(element.id.to_string()));
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ids::SequentialIds;
    use crate::model::{ElementKind, create_shape_element, create_text_element};
    use std::cell::RefCell;
    use std::rc::Rc;

    fn store() -> DocumentStore {
        DocumentStore::with_ids(SequentialIds::new())
    }

    fn first_page(store: &DocumentStore) -> PageId {
        store.state().pages[0].id.clone()
    }

    #[test]
    fn test_initial_document() {
        let store = store();
        let state = store.state();
        assert_eq!(state.name, "Untitled Document");
        assert_eq!(state.pages.len(), 3);
        assert_eq!(state.selected_page_id.as_ref(), Some(&state.pages[0].id));
        assert!(state.selected_element_id.is_none());
    }

    #[test]
    fn test_add_element_forces_z_index() {
        let mut store = store();
        let page = first_page(&store);
        let mut ids = SequentialIds::new();
        for expected in 1..=4 {
            let mut el = create_shape_element(&mut ids, Point::ZERO);
            el.z_index = 99;
            let el = el.with_id(ElementId::new(format!("custom-{expected}")));
            let id = store.add_element(&page, el).unwrap();
            let state = store.state();
            assert_eq!(state.page(&page).unwrap().element(&id).unwrap().z_index, expected);
            assert_eq!(state.selected_element_id.as_ref(), Some(&id));
        }
    }

    #[test]
    fn test_add_element_replaces_colliding_id() {
        let mut store = store();
        let page = first_page(&store);
        let first = store.add_shape_to_page(&page, None).unwrap();
        let clone = store.state().page(&page).unwrap().element(&first).unwrap().clone();
        let second = store.add_element(&page, clone).unwrap();
        assert_ne!(first, second);
        assert_eq!(store.state().page(&page).unwrap().elements.len(), 2);
    }

    #[test]
    fn test_add_element_to_missing_page_is_noop() {
        let mut store = store();
        let before = store.state();
        let mut ids = SequentialIds::new();
        let el = create_shape_element(&mut ids, Point::ZERO);
        assert!(store.add_element(&PageId::new("nope"), el).is_none());
        assert!(Arc::ptr_eq(&before, &store.state()));
    }

    #[test]
    fn test_add_page_selects_it() {
        let mut store = store();
        let page = first_page(&store);
        store.add_shape_to_page(&page, None);
        let added = store.add_page();
        let state = store.state();
        assert_eq!(state.pages.len(), 4);
        assert_eq!(state.pages[3].id, added);
        assert_eq!(state.selected_page_id.as_ref(), Some(&added));
        assert!(state.selected_element_id.is_none());
    }

    #[test]
    fn test_delete_last_page_is_noop() {
        let mut store = store();
        let ids: Vec<PageId> = store.state().pages.iter().map(|p| p.id.clone()).collect();
        assert!(store.delete_page(&ids[0]));
        assert!(store.delete_page(&ids[1]));
        let before = store.state();
        assert!(!store.delete_page(&ids[2]));
        assert_eq!(*before, *store.state());
        assert_eq!(store.state().pages.len(), 1);
    }

    #[test]
    fn test_delete_selected_page_selects_first() {
        let mut store = store();
        let ids: Vec<PageId> = store.state().pages.iter().map(|p| p.id.clone()).collect();
        store.select_page(Some(&ids[1]));
        store.add_note_to_page(&ids[1], None);
        store.delete_page(&ids[1]);
        let state = store.state();
        assert_eq!(state.selected_page_id.as_ref(), Some(&ids[0]));
        assert!(state.selected_element_id.is_none());
    }

    #[test]
    fn test_delete_other_page_clears_element() {
        let mut store = store();
        let ids: Vec<PageId> = store.state().pages.iter().map(|p| p.id.clone()).collect();
        let el = store.add_shape_to_page(&ids[0], None).unwrap();
        assert_eq!(store.state().selected_element_id.as_ref(), Some(&el));
        assert!(store.delete_page(&ids[2]));
        let state = store.state();
        assert_eq!(state.selected_page_id.as_ref(), Some(&ids[0]));
        assert!(state.selected_element_id.is_none());
        assert!(state.page(&ids[0]).unwrap().element(&el).is_some());
    }

    #[test]
    fn test_duplicate_page_fresh_ids() {
        let mut store = store();
        let page = first_page(&store);
        store.add_text_to_page(&page, None);
        store.add_shape_to_page(&page, Some(Point::new(100.0, 100.0)));
        store.update_page_background(&page, RgbaColor::NOTE_YELLOW);

        let copy_id = store.duplicate_page(&page).unwrap();
        let state = store.state();
        assert_eq!(state.pages[1].id, copy_id);
        assert_eq!(state.selected_page_id.as_ref(), Some(&copy_id));
        assert!(state.selected_element_id.is_none());

        let source = state.page(&page).unwrap();
        let copy = state.page(&copy_id).unwrap();
        assert_ne!(source.id, copy.id);
        assert_eq!(copy.background_color, source.background_color);
        assert_eq!(copy.elements.len(), source.elements.len());
        for (a, b) in source.elements.iter().zip(&copy.elements) {
            assert_ne!(a.id(), b.id());
            assert_eq!(a.with_id(b.id().clone()), *b);
        }
    }

    #[test]
    fn test_select_page_clears_element() {
        let mut store = store();
        let ids: Vec<PageId> = store.state().pages.iter().map(|p| p.id.clone()).collect();
        let el = store.add_shape_to_page(&ids[0], None).unwrap();
        assert_eq!(store.state().selected_element_id, Some(el));
        store.select_page(Some(&ids[1]));
        assert!(store.state().selected_element_id.is_none());
        assert_eq!(store.state().selected_page_id.as_ref(), Some(&ids[1]));
    }

    #[test]
    fn test_select_element_keeps_page() {
        let mut store = store();
        let page = first_page(&store);
        let el = store.add_text_to_page(&page, None).unwrap();
        store.select_element(None);
        assert!(store.selected_element().is_none());
        store.select_element(Some(&el));
        assert_eq!(store.selected_element().unwrap().id(), &el);
        assert_eq!(store.selected_page().unwrap().id, page);
    }

    #[test]
    fn test_select_element_off_selected_page_is_noop() {
        let mut store = store();
        let ids: Vec<PageId> = store.state().pages.iter().map(|p| p.id.clone()).collect();
        let el = store.add_shape_to_page(&ids[0], None).unwrap();
        store.select_page(Some(&ids[1]));
        let before = store.state();
        store.select_element(Some(&el));
        assert!(Arc::ptr_eq(&before, &store.state()));
        assert!(store.state().selected_element_id.is_none());
        assert_eq!(store.state().selected_page_id.as_ref(), Some(&ids[1]));

        store.select_page(None);
        store.select_element(Some(&el));
        assert!(store.state().selected_element_id.is_none());
    }

    #[test]
    fn test_update_element_round_trip() {
        let mut store = store();
        let page = first_page(&store);
        let mut ids = SequentialIds::new();
        let el = create_text_element(&mut ids, Point::new(10.0, 10.0), None);
        let id = store.add_element(&page, el).unwrap();
        let before = store.state().page(&page).unwrap().element(&id).unwrap().clone();

        assert!(store.update_element(&page, &id, &ElementUpdate::new().with_content("Hello")));
        let after = store.state().page(&page).unwrap().element(&id).unwrap().clone();
        let ElementKind::Text(text) = &after.kind else {
            panic!("expected text");
        };
        assert_eq!(text.content, "Hello");
        let mut expected = before;
        if let ElementKind::Text(text) = &mut expected.kind {
            text.content = "Hello".to_string();
        }
        assert_eq!(after, expected);
    }

    #[test]
    fn test_delete_selected_element_clears_selection() {
        let mut store = store();
        let page = first_page(&store);
        let el = store.add_shape_to_page(&page, None).unwrap();
        assert!(store.delete_element(&page, &el));
        assert!(store.state().selected_element_id.is_none());
        assert!(!store.delete_element(&page, &el));
    }

    #[test]
    fn test_duplicate_element_offsets_and_fronts() {
        let mut store = store();
        let page = first_page(&store);
        let a = store.add_shape_to_page(&page, Some(Point::new(10.0, 10.0))).unwrap();
        store.add_text_to_page(&page, None);
        let copy = store.duplicate_element_in_page(&page, &a).unwrap();
        let state = store.state();
        let el = state.page(&page).unwrap().element(&copy).unwrap();
        assert_eq!(el.position, Point::new(30.0, 30.0));
        assert_eq!(el.z_index, 3);
        assert_eq!(state.selected_element_id.as_ref(), Some(&copy));
    }

    #[test]
    fn test_z_order_operations() {
        let mut store = store();
        let page = first_page(&store);
        let a = store.add_shape_to_page(&page, None).unwrap();
        let b = store.add_shape_to_page(&page, None).unwrap();
        let c = store.add_shape_to_page(&page, None).unwrap();

        store.bring_to_front(&page, &a);
        let z = |store: &DocumentStore, id: &ElementId| {
            store.state().page(&page).unwrap().element(id).unwrap().z_index
        };
        assert_eq!(z(&store, &a), 4);

        store.send_to_back(&page, &c);
        assert_eq!(z(&store, &c), 0);

        // Sending b back ties it with c; the earlier-inserted one paints first.
        store.send_to_back(&page, &b);
        assert_eq!(z(&store, &b), 0);
        let state = store.state();
        let order: Vec<&ElementId> = state.page(&page).unwrap().paint_order().iter().map(|el| el.id()).collect();
        assert_eq!(order, vec![&b, &c, &a]);
    }

    #[test]
    fn test_move_and_resize() {
        let mut store = store();
        let page = first_page(&store);
        let id = store.add_shape_to_page(&page, None).unwrap();
        store.move_element(&page, &id, Point::new(5.0, 6.0));
        store.resize_element(&page, &id, Size::new(10.0, 300.0));
        let state = store.state();
        let el = state.page(&page).unwrap().element(&id).unwrap();
        assert_eq!(el.position, Point::new(5.0, 6.0));
        assert_eq!(el.size, Size::new(40.0, 300.0));
    }

    #[test]
    fn test_reorder_pages() {
        let mut store = store();
        let ids: Vec<PageId> = store.state().pages.iter().map(|p| p.id.clone()).collect();
        assert!(store.reorder_pages(0, 2));
        let order: Vec<PageId> = store.state().pages.iter().map(|p| p.id.clone()).collect();
        assert_eq!(order, vec![ids[1].clone(), ids[2].clone(), ids[0].clone()]);
        assert!(!store.reorder_pages(0, 7));
    }

    #[test]
    fn test_snapshots_are_immutable() {
        let mut store = store();
        let before = store.state();
        store.set_document_name("Report");
        assert_eq!(before.name, "Untitled Document");
        assert_eq!(store.state().name, "Report");
    }

    #[test]
    fn test_listeners_notified_on_change_only() {
        let mut store = store();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        let sub = store.subscribe(move |state| sink.borrow_mut().push(state.name.clone()));

        store.set_document_name("A");
        store.set_document_name("A");
        store.delete_page(&PageId::new("missing"));
        assert_eq!(*seen.borrow(), vec!["A".to_string()]);

        assert!(store.unsubscribe(sub));
        store.set_document_name("B");
        assert_eq!(seen.borrow().len(), 1);
        assert!(!store.unsubscribe(sub));
    }

    #[test]
    fn test_with_state_validates() {
        let mut ids = SequentialIds::new();
        let empty = DocumentState {
            id: "d".into(),
            name: "n".into(),
            pages: Vec::new(),
            selected_page_id: None,
            selected_element_id: None,
        };
        assert_eq!(
            DocumentStore::with_state(empty, SequentialIds::new()).unwrap_err(),
            ModelError::NoPages
        );

        let mut page = model::create_page(&mut ids);
        let el = create_shape_element(&mut ids, Point::ZERO);
        page.elements = vec![el.clone(), el];
        let dup = DocumentState {
            id: "d".into(),
            name: "n".into(),
            pages: vec![page],
            selected_page_id: None,
            selected_element_id: None,
        };
        assert!(matches!(
            DocumentStore::with_state(dup, SequentialIds::new()),
            Err(ModelError::DuplicateId(_))
        ));
    }

    #[test]
    fn test_paste_element_uses_fresh_id() {
        let mut store = store();
        let page = first_page(&store);
        let id = store.add_note_to_page(&page, None).unwrap();
        let original = store.selected_element().unwrap().clone();
        let pasted = store.paste_element(&page, &original, Point::new(60.0, 60.0)).unwrap();
        assert_ne!(id, pasted);
        let state = store.state();
        assert_eq!(state.page(&page).unwrap().element(&pasted).unwrap().position, Point::new(60.0, 60.0));
        assert_eq!(store.total_element_count(), 2);
    }
}
