//! Monitor layout domain entity.
//!
//! A layout is a snapshot of the physical monitors in one shared desktop
//! coordinate space, as reported by the compositor or X server. Rectangles are
//! kept sorted by their left edge so that the position of a rectangle in the
//! layout doubles as its *positional* monitor index: the leftmost monitor is
//! index 0, the next one to the right is index 1, and so on.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Broadcast-facing monitor index.
///
/// This is the number sent on the wire and turned into a hotkey on the client
/// side. It is distinct from any compositor-assigned monitor id. The type holds
/// any `u8`; the wire range is enforced by the protocol codec.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct MonitorId(u8);

impl MonitorId {
    /// Wraps a raw index.
    pub const fn new(raw: u8) -> Self {
        Self(raw)
    }

    /// Returns the raw index.
    pub const fn get(self) -> u8 {
        self.0
    }

    /// Converts a zero-based layout position into an index.
    ///
    /// Returns `None` when the position does not fit in one byte.
    pub fn from_position(position: usize) -> Option<Self> {
        u8::try_from(position).ok().map(Self)
    }
}

impl fmt::Display for MonitorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<MonitorId> for i64 {
    fn from(id: MonitorId) -> Self {
        i64::from(id.0)
    }
}

/// One cursor position in desktop coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CursorSample {
    pub x: i32,
    pub y: i32,
}

impl CursorSample {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Squared Euclidean distance to `other`, computed in `i64` so that
    /// extreme coordinates cannot overflow.
    pub fn distance_squared(&self, other: &CursorSample) -> i64 {
        let dx = i64::from(self.x) - i64::from(other.x);
        let dy = i64::from(self.y) - i64::from(other.y);
        dx * dx + dy * dy
    }
}

/// A physical monitor positioned in desktop space.
///
/// `width` and `height` are logical pixels, i.e. already divided by the
/// display scale factor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonitorRect {
    /// Connector or output name, e.g. `DP-1` or `HDMI-A-1`.
    pub name: String,
    /// Left edge in desktop space (may be negative).
    pub x: i32,
    /// Top edge in desktop space (may be negative).
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl MonitorRect {
    pub fn new(name: impl Into<String>, x: i32, y: i32, width: u32, height: u32) -> Self {
        Self {
            name: name.into(),
            x,
            y,
            width,
            height,
        }
    }

    /// Returns the rightmost X coordinate (exclusive).
    pub fn right(&self) -> i64 {
        i64::from(self.x) + i64::from(self.width)
    }

    /// Returns the bottommost Y coordinate (exclusive).
    pub fn bottom(&self) -> i64 {
        i64::from(self.y) + i64::from(self.height)
    }

    /// Half-open containment: `x <= px < x + width` and `y <= py < y + height`.
    pub fn contains(&self, point: CursorSample) -> bool {
        let px = i64::from(point.x);
        let py = i64::from(point.y);
        px >= i64::from(self.x) && px < self.right() && py >= i64::from(self.y) && py < self.bottom()
    }
}

/// An ordered snapshot of the monitors currently attached.
///
/// Construction sorts the rectangles by `x` with a stable sort, so monitors
/// sharing a left edge keep the order the provider reported them in. When
/// rectangles overlap, the first match in this order wins.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MonitorLayout {
    monitors: Vec<MonitorRect>,
}

impl MonitorLayout {
    /// Builds a layout from rectangles in any order.
    pub fn new(mut monitors: Vec<MonitorRect>) -> Self {
        monitors.sort_by_key(|m| m.x);
        Self { monitors }
    }

    /// Monitors in positional order.
    pub fn monitors(&self) -> &[MonitorRect] {
        &self.monitors
    }

    pub fn len(&self) -> usize {
        self.monitors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.monitors.is_empty()
    }

    /// Finds the first monitor containing `point`.
    ///
    /// Returns the monitor's positional index together with the rectangle, or
    /// `None` when the point lies outside every monitor (e.g. in a gap between
    /// monitors of different heights).
    pub fn locate(&self, point: CursorSample) -> Option<(usize, &MonitorRect)> {
        self.monitors
            .iter()
            .enumerate()
            .find(|(_, rect)| rect.contains(point))
    }

    /// Positional monitor index for `point`, if it fits in a [`MonitorId`].
    pub fn positional_index(&self, point: CursorSample) -> Option<MonitorId> {
        self.locate(point)
            .and_then(|(position, _)| MonitorId::from_position(position))
    }
}

impl fmt::Display for MonitorLayout {
    /// One line per monitor: `index: name x=[start-end)`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (position, m) in self.monitors.iter().enumerate() {
            if position > 0 {
                writeln!(f)?;
            }
            write!(f, "{position}: {} x=[{}-{})", m.name, m.x, m.right())?;
        }
        Ok(())
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn strip(name: &str, x: i32, width: u32) -> MonitorRect {
        MonitorRect::new(name, x, 0, width, 100)
    }

    // ── MonitorRect ───────────────────────────────────────────────────────────

    #[test]
    fn test_rect_right_returns_x_plus_width() {
        let rect = MonitorRect::new("DP-1", 100, 0, 1920, 1080);
        assert_eq!(rect.right(), 2020);
    }

    #[test]
    fn test_rect_contains_is_half_open() {
        let rect = MonitorRect::new("DP-1", 0, 0, 100, 100);
        assert!(rect.contains(CursorSample::new(0, 0)));
        assert!(rect.contains(CursorSample::new(99, 99)));
        assert!(!rect.contains(CursorSample::new(100, 50)), "right edge is exclusive");
        assert!(!rect.contains(CursorSample::new(50, 100)), "bottom edge is exclusive");
        assert!(!rect.contains(CursorSample::new(-1, 50)));
    }

    #[test]
    fn test_rect_contains_handles_negative_origin() {
        let rect = MonitorRect::new("HDMI-A-1", -1920, -200, 1920, 1080);
        assert!(rect.contains(CursorSample::new(-1, 0)));
        assert!(!rect.contains(CursorSample::new(0, 0)));
    }

    #[test]
    fn test_rect_contains_does_not_overflow_at_extremes() {
        let rect = MonitorRect::new("big", i32::MAX - 10, 0, u32::MAX, 10);
        assert!(rect.contains(CursorSample::new(i32::MAX, 5)));
    }

    // ── MonitorLayout ─────────────────────────────────────────────────────────

    #[test]
    fn test_containment_maps_points_to_positional_index() {
        // Arrange
        let layout = MonitorLayout::new(vec![strip("A", 0, 100), strip("B", 100, 100)]);

        // Act / Assert
        assert_eq!(layout.positional_index(CursorSample::new(50, 10)), Some(MonitorId::new(0)));
        assert_eq!(layout.positional_index(CursorSample::new(150, 10)), Some(MonitorId::new(1)));
        assert_eq!(layout.positional_index(CursorSample::new(250, 10)), None);
    }

    #[test]
    fn test_layout_sorts_by_x_regardless_of_input_order() {
        let layout = MonitorLayout::new(vec![
            strip("right", 3840, 1920),
            strip("left", -1920, 1920),
            strip("middle", 0, 3840),
        ]);

        let names: Vec<&str> = layout.monitors().iter().map(|m| m.name.as_str()).collect();
        assert_eq!(names, ["left", "middle", "right"]);
        assert_eq!(layout.positional_index(CursorSample::new(-5, 5)), Some(MonitorId::new(0)));
    }

    #[test]
    fn test_layout_sort_is_stable_for_equal_x() {
        // Two monitors stacked vertically share x=0.
        let layout = MonitorLayout::new(vec![
            MonitorRect::new("top", 0, 0, 100, 100),
            MonitorRect::new("bottom", 0, 100, 100, 100),
        ]);

        assert_eq!(layout.monitors()[0].name, "top");
        assert_eq!(layout.monitors()[1].name, "bottom");
        assert_eq!(layout.positional_index(CursorSample::new(10, 150)), Some(MonitorId::new(1)));
    }

    #[test]
    fn test_overlapping_rects_resolve_to_first_in_order() {
        let layout = MonitorLayout::new(vec![strip("A", 0, 200), strip("B", 100, 200)]);

        let (position, rect) = layout.locate(CursorSample::new(150, 10)).expect("inside A");
        assert_eq!(position, 0);
        assert_eq!(rect.name, "A");
    }

    #[test]
    fn test_empty_layout_resolves_nothing() {
        let layout = MonitorLayout::default();
        assert!(layout.is_empty());
        assert_eq!(layout.locate(CursorSample::new(0, 0)), None);
    }

    #[test]
    fn test_display_lists_each_monitor_span() {
        let layout = MonitorLayout::new(vec![strip("DP-1", 0, 1920), strip("DP-2", 1920, 2560)]);
        assert_eq!(layout.to_string(), "0: DP-1 x=[0-1920)\n1: DP-2 x=[1920-4480)");
    }

    // ── MonitorId / CursorSample ──────────────────────────────────────────────

    #[test]
    fn test_monitor_id_from_position_rejects_values_above_u8() {
        assert_eq!(MonitorId::from_position(255), Some(MonitorId::new(255)));
        assert_eq!(MonitorId::from_position(256), None);
    }

    #[test]
    fn test_distance_squared() {
        let a = CursorSample::new(0, 0);
        let b = CursorSample::new(3, 4);
        assert_eq!(a.distance_squared(&b), 25);
        assert_eq!(b.distance_squared(&a), 25);
    }
}
