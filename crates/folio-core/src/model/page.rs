//! Pages and the document snapshot.

use super::element::PageElement;
use crate::color::RgbaColor;
use crate::ids::{ElementId, PageId};
use serde::{Deserialize, Serialize};

/// A fixed-size A4 canvas holding elements in insertion order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentPage {
    pub id: PageId,
    pub background_color: RgbaColor,
    /// Insertion order. Paint order comes from [`DocumentPage::paint_order`].
    #[serde(default)]
    pub elements: Vec<PageElement>,
}

impl DocumentPage {
    /// An empty page with a white background.
    pub fn new(id: PageId) -> Self {
        Self {
            id,
            background_color: RgbaColor::WHITE,
            elements: Vec::new(),
        }
    }

    pub fn element(&self, id: &ElementId) -> Option<&PageElement> {
        self.elements.iter().find(|el| &el.id == id)
    }

    pub(crate) fn element_mut(&mut self, id: &ElementId) -> Option<&mut PageElement> {
        self.elements.iter_mut().find(|el| &el.id == id)
    }

    pub fn contains(&self, id: &ElementId) -> bool {
        self.element(id).is_some()
    }

    /// Elements sorted by z-index ascending. Ties keep insertion order.
    pub fn paint_order(&self) -> Vec<&PageElement> {
        let mut ordered: Vec<&PageElement> = self.elements.iter().collect();
        ordered.sort_by_key(|el| el.z_index);
        ordered
    }

    pub fn max_z_index(&self) -> Option<i64> {
        self.elements.iter().map(|el| el.z_index).max()
    }

    pub fn min_z_index(&self) -> Option<i64> {
        self.elements.iter().map(|el| el.z_index).min()
    }
}

/// One immutable snapshot of the whole document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentState {
    pub id: String,
    pub name: String,
    pub pages: Vec<DocumentPage>,
    #[serde(default)]
    pub selected_page_id: Option<PageId>,
    #[serde(default)]
    pub selected_element_id: Option<ElementId>,
}

impl DocumentState {
    pub fn page(&self, id: &PageId) -> Option<&DocumentPage> {
        self.pages.iter().find(|page| &page.id == id)
    }

    pub(crate) fn page_mut(&mut self, id: &PageId) -> Option<&mut DocumentPage> {
        self.pages.iter_mut().find(|page| &page.id == id)
    }

    pub fn page_index(&self, id: &PageId) -> Option<usize> {
        self.pages.iter().position(|page| &page.id == id)
    }

    /// The selected page, or `None` when unset or no longer present.
    pub fn selected_page(&self) -> Option<&DocumentPage> {
        self.selected_page_id.as_ref().and_then(|id| self.page(id))
    }

    /// The selected element, looked up on the selected page only.
    pub fn selected_element(&self) -> Option<&PageElement> {
        let id = self.selected_element_id.as_ref()?;
        self.selected_page()?.element(id)
    }

    /// Find an element anywhere in the document along with its page.
    pub fn find_element(&self, id: &ElementId) -> Option<(&DocumentPage, &PageElement)> {
        self.pages
            .iter()
            .find_map(|page| page.element(id).map(|el| (page, el)))
    }

    pub fn contains_element(&self, id: &ElementId) -> bool {
        self.find_element(id).is_some()
    }

    pub fn contains_page(&self, id: &PageId) -> bool {
        self.page(id).is_some()
    }

    pub fn total_element_count(&self) -> usize {
        self.pages.iter().map(|page| page.elements.len()).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ElementKind, ShapeContent};
    use kurbo::{Point, Size};

    fn shape(id: &str, z: i64) -> PageElement {
        let mut el = PageElement::new(
            ElementId::new(id),
            Point::ZERO,
            Size::new(10.0, 10.0),
            ElementKind::Shape(ShapeContent {
                background_color: RgbaColor::SHAPE_BLUE,
                border_radius: 0.0,
            }),
        );
        el.z_index = z;
        el
    }

    fn state() -> DocumentState {
        let mut a = DocumentPage::new(PageId::new("page-a"));
        a.elements = vec![shape("el-1", 3), shape("el-2", 1), shape("el-3", 1)];
        let b = DocumentPage::new(PageId::new("page-b"));
        DocumentState {
            id: "doc".into(),
            name: "Doc".into(),
            pages: vec![a, b],
            selected_page_id: Some(PageId::new("page-a")),
            selected_element_id: Some(ElementId::new("el-2")),
        }
    }

    #[test]
    fn test_paint_order_is_stable() {
        let doc = state();
        let order: Vec<&str> = doc.pages[0]
            .paint_order()
            .iter()
            .map(|el| el.id().as_str())
            .collect();
        assert_eq!(order, vec!["el-2", "el-3", "el-1"]);
    }

    #[test]
    fn test_selected_accessors() {
        let doc = state();
        assert_eq!(doc.selected_page().unwrap().id.as_str(), "page-a");
        assert_eq!(doc.selected_element().unwrap().id().as_str(), "el-2");
    }

    #[test]
    fn test_dangling_selection_resolves_to_none() {
        let mut doc = state();
        doc.selected_element_id = Some(ElementId::new("el-gone"));
        assert!(doc.selected_element().is_none());

        doc.selected_page_id = Some(PageId::new("page-gone"));
        assert!(doc.selected_page().is_none());
        assert!(doc.selected_element().is_none());
    }

    #[test]
    fn test_element_on_other_page_is_not_selected() {
        let mut doc = state();
        doc.selected_page_id = Some(PageId::new("page-b"));
        assert!(doc.selected_element().is_none());
    }

    #[test]
    fn test_z_extents_and_counts() {
        let doc = state();
        assert_eq!(doc.pages[0].max_z_index(), Some(3));
        assert_eq!(doc.pages[0].min_z_index(), Some(1));
        assert_eq!(doc.pages[1].max_z_index(), None);
        assert_eq!(doc.total_element_count(), 3);
        assert!(doc.find_element(&ElementId::new("el-3")).is_some());
    }
}
