//! Snap-to-guide alignment for dragged elements.

use kurbo::{Point, Rect, Size};

/// Distance within which an edge snaps onto a target (page units).
pub const SNAP_THRESHOLD: f64 = 5.0;

/// Orientation of a guide line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GuideAxis {
    /// A vertical line at some x, produced by horizontal snapping.
    Vertical,
    /// A horizontal line at some y, produced by vertical snapping.
    Horizontal,
}

/// A transient alignment line shown while dragging.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Guide {
    pub axis: GuideAxis,
    /// Coordinate of the line in page space.
    pub position: f64,
}

impl Guide {
    pub fn vertical(x: f64) -> Self {
        Self { axis: GuideAxis::Vertical, position: x }
    }

    pub fn horizontal(y: f64) -> Self {
        Self { axis: GuideAxis::Horizontal, position: y }
    }
}

/// Type of snap target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SnapTargetKind {
    /// Page start or end edge.
    PageEdge,
    /// Leading edge of a sibling (left or top).
    Start,
    /// Trailing edge of a sibling (right or bottom).
    End,
    /// Center line of a sibling.
    Center,
}

/// A coordinate on one axis that edges can snap to.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SnapTarget {
    pub value: f64,
    pub kind: SnapTargetKind,
}

/// Result of a snap operation.
#[derive(Debug, Clone, PartialEq)]
pub struct SnapResult {
    /// The snapped top-left position.
    pub point: Point,
    pub snapped_x: bool,
    pub snapped_y: bool,
    /// One guide per snapped axis.
    pub guides: Vec<Guide>,
}

impl SnapResult {
    /// Create a result with no snapping.
    pub fn none(point: Point) -> Self {
        Self {
            point,
            snapped_x: false,
            snapped_y: false,
            guides: Vec::new(),
        }
    }

    pub fn is_snapped(&self) -> bool {
        self.snapped_x || self.snapped_y
    }
}

/// Targets on one axis: the page edges, then each sibling's start, end and center.
pub fn axis_targets(page_extent: f64, siblings: &[(f64, f64)]) -> Vec<SnapTarget> {
    let mut targets = Vec::with_capacity(2 + siblings.len() * 3);
    targets.push(SnapTarget { value: 0.0, kind: SnapTargetKind::PageEdge });
    targets.push(SnapTarget { value: page_extent, kind: SnapTargetKind::PageEdge });
    for &(start, end) in siblings {
        targets.push(SnapTarget { value: start, kind: SnapTargetKind::Start });
        targets.push(SnapTarget { value: end, kind: SnapTargetKind::End });
        targets.push(SnapTarget { value: (start + end) / 2.0, kind: SnapTargetKind::Center });
    }
    targets
}

/// Snap one axis of an element spanning `start..start + extent`.
///
/// Targets are tried in order; for each, the element's start, end and
/// center are compared. The first comparison under `threshold` wins.
/// Returns the new start and the target coordinate that was hit.
pub fn snap_axis(start: f64, extent: f64, targets: &[SnapTarget], threshold: f64) -> Option<(f64, f64)> {
    let edges = [(start, 0.0), (start + extent, extent), (start + extent / 2.0, extent / 2.0)];
    targets.iter().find_map(|target| {
        edges
            .iter()
            .find(|(edge, _)| (edge - target.value).abs() < threshold)
            .map(|(_, offset)| (target.value - offset, target.value))
    })
}

/// Snap a candidate bounding box against the page edges and sibling bounds.
///
/// Each axis is snapped at most once.
pub fn snap_to_guides(candidate: Rect, siblings: &[Rect], page: Size, threshold: f64) -> SnapResult {
    let xs: Vec<(f64, f64)> = siblings.iter().map(|r| (r.x0, r.x1)).collect();
    let ys: Vec<(f64, f64)> = siblings.iter().map(|r| (r.y0, r.y1)).collect();

    let mut result = SnapResult::none(candidate.origin());

    if let Some((x, guide)) = snap_axis(candidate.x0, candidate.width(), &axis_targets(page.width, &xs), threshold) {
        result.point.x = x;
        result.snapped_x = true;
        result.guides.push(Guide::vertical(guide));
    }
    if let Some((y, guide)) = snap_axis(candidate.y0, candidate.height(), &axis_targets(page.height, &ys), threshold) {
        result.point.y = y;
        result.snapped_y = true;
        result.guides.push(Guide::horizontal(guide));
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: Size = Size::new(595.0, 842.0);

    #[test]
    fn test_no_snap_far_from_targets() {
        let candidate = Rect::new(100.0, 100.0, 150.0, 130.0);
        let result = snap_to_guides(candidate, &[], PAGE, SNAP_THRESHOLD);
        assert!(!result.is_snapped());
        assert_eq!(result.point, Point::new(100.0, 100.0));
        assert!(result.guides.is_empty());
    }

    #[test]
    fn test_top_snaps_to_sibling_top() {
        let sibling = Rect::new(300.0, 200.0, 400.0, 260.0);
        let candidate = Rect::from_origin_size((50.0, 203.0), (40.0, 30.0));
        let result = snap_to_guides(candidate, &[sibling], PAGE, SNAP_THRESHOLD);
        assert!(result.snapped_y);
        assert!(!result.snapped_x);
        assert_eq!(result.point.y, 200.0);
        assert_eq!(result.guides, vec![Guide::horizontal(200.0)]);
    }

    #[test]
    fn test_bottom_snaps_to_page_end() {
        let candidate = Rect::from_origin_size((100.0, 740.0), (40.0, 100.0));
        let result = snap_to_guides(candidate, &[], PAGE, SNAP_THRESHOLD);
        assert_eq!(result.point.y, 742.0);
        assert_eq!(result.guides, vec![Guide::horizontal(842.0)]);
    }

    #[test]
    fn test_center_snaps_to_sibling_center() {
        let sibling = Rect::new(200.0, 400.0, 300.0, 500.0);
        // Candidate center x = 248, sibling center x = 250.
        let candidate = Rect::from_origin_size((228.0, 10.0), (40.0, 40.0));
        let result = snap_to_guides(candidate, &[sibling], PAGE, SNAP_THRESHOLD);
        assert_eq!(result.point.x, 230.0);
        assert_eq!(result.guides, vec![Guide::vertical(250.0)]);
    }

    #[test]
    fn test_threshold_is_exclusive() {
        let candidate = Rect::from_origin_size((5.0, 100.0), (40.0, 40.0));
        let result = snap_to_guides(candidate, &[], PAGE, SNAP_THRESHOLD);
        assert!(!result.snapped_x);
    }

    #[test]
    fn test_first_match_wins_per_axis() {
        // Left edge is near the page start and the right edge near a sibling.
        let sibling = Rect::new(44.0, 300.0, 90.0, 340.0);
        let candidate = Rect::from_origin_size((3.0, 100.0), (40.0, 40.0));
        let result = snap_to_guides(candidate, &[sibling], PAGE, SNAP_THRESHOLD);
        assert_eq!(result.point.x, 0.0);
        assert_eq!(result.guides.len(), 1);
    }

    #[test]
    fn test_axis_targets_order() {
        let targets = axis_targets(595.0, &[(10.0, 30.0)]);
        let values: Vec<f64> = targets.iter().map(|t| t.value).collect();
        assert_eq!(values, vec![0.0, 595.0, 10.0, 30.0, 20.0]);
        assert_eq!(targets[4].kind, SnapTargetKind::Center);
    }
}
