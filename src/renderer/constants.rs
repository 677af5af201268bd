//! Shared constants for the layout renderer (all in SVG user units).

// ── Page & margins ──────────────────────────────────────────────────
pub(super) const PAGE_MARGIN_LEFT: f64 = 20.0;
pub(super) const FIRST_SYSTEM_TOP: f64 = 60.0;

// ── Staff dimensions ────────────────────────────────────────────────
pub(super) const STAFF_LINE_SPACING: f64 = 10.0; // distance between staff lines
pub(super) const HALF_SPACE: f64 = STAFF_LINE_SPACING / 2.0; // one staff position
pub(super) const STAFF_HEIGHT: f64 = 40.0; // 5 lines, 4 spaces
pub(super) const STAFF_GAP: f64 = 60.0; // vertical gap between staves of a system
pub(super) const SYSTEM_SPACING: f64 = 80.0; // vertical space between systems

// ── Glyph extents ───────────────────────────────────────────────────
pub(super) const NOTEHEAD_HALF_HEIGHT: f64 = 4.0;
pub(super) const REST_TOP: f64 = 10.0; // below the staff's top line
pub(super) const REST_BOTTOM: f64 = 30.0;
pub(super) const CLEF_OVERHANG: f64 = 10.0; // above and below the staff
pub(super) const DOT_SPACE: f64 = 6.0; // extra advance per augmentation dot
pub(super) const KEY_ACCIDENTAL_SPACE: f64 = 10.0;

// ── Colors ──────────────────────────────────────────────────────────
pub(super) const NOTE_COLOR: &str = "#1a1a1a";
pub(super) const STAFF_COLOR: &str = "#555555";
pub(super) const BARLINE_COLOR: &str = "#333333";
pub(super) const REST_COLOR: &str = "#1a1a1a";
pub(super) const PLACEHOLDER_COLOR: &str = "#c04040";
