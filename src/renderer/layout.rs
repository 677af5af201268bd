//! Layout computation. Places every symbol on its system and assigns
//! its bounding box, and produces the staff-line coordinates of each
//! system.
//!
//! Symbols advance left to right from the page margin; a line break
//! restarts the cursor on the next system. Glyph sizes come from a
//! lookup table keyed by glyph kind, so a rest drawn as a placeholder
//! note takes exactly the room of a note.

use crate::error::EditError;
use crate::model::*;
use crate::pitch::{self, MIDDLE_LINE};
use super::constants::*;

// ═══════════════════════════════════════════════════════════════════════
// Glyph metrics
// ═══════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum GlyphKind {
    NoteHead,
    Rest,
    CorrectRest,
    Barline,
    Clef,
    Key,
    Time,
    LineBreak,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct GlyphMetrics {
    /// Horizontal room taken, cursor to cursor
    pub(crate) advance: f64,
    /// Ink starts this far right of the cursor
    pub(crate) offset: f64,
    pub(crate) width: f64,
}

const fn metrics(advance: f64, offset: f64, width: f64) -> GlyphMetrics {
    GlyphMetrics { advance, offset, width }
}

const GLYPH_TABLE: [(GlyphKind, GlyphMetrics); 8] = [
    (GlyphKind::NoteHead, metrics(30.0, 4.0, 12.0)),
    (GlyphKind::Rest, metrics(24.0, 8.0, 10.0)),
    (GlyphKind::CorrectRest, metrics(24.0, 7.0, 10.0)),
    (GlyphKind::Barline, metrics(12.0, 5.0, 1.0)),
    (GlyphKind::Clef, metrics(32.0, 2.0, 24.0)),
    (GlyphKind::Key, metrics(4.0, 2.0, 0.0)),
    (GlyphKind::Time, metrics(24.0, 4.0, 16.0)),
    (GlyphKind::LineBreak, metrics(0.0, 0.0, 0.0)),
];

pub(crate) fn glyph_kind(kind: &SymbolKind) -> GlyphKind {
    match kind {
        SymbolKind::Note(_) => GlyphKind::NoteHead,
        SymbolKind::Rest(rest) => match rest.render {
            RenderKind::Standard => GlyphKind::Rest,
            RenderKind::Correct => GlyphKind::CorrectRest,
            RenderKind::Placeholder => GlyphKind::NoteHead,
        },
        SymbolKind::Barline(_) => GlyphKind::Barline,
        SymbolKind::Clef(_) => GlyphKind::Clef,
        SymbolKind::Key(_) => GlyphKind::Key,
        SymbolKind::Time(_) => GlyphKind::Time,
        SymbolKind::LineBreak => GlyphKind::LineBreak,
    }
}

pub(crate) fn glyph_metrics(glyph: GlyphKind) -> GlyphMetrics {
    GLYPH_TABLE
        .iter()
        .find(|(kind, _)| *kind == glyph)
        .map(|(_, m)| *m)
        .unwrap_or(metrics(0.0, 0.0, 0.0))
}

/// Metrics for a concrete symbol: dots and key accidentals widen the base glyph.
fn symbol_metrics(kind: &SymbolKind) -> GlyphMetrics {
    let mut m = glyph_metrics(glyph_kind(kind));
    match kind {
        SymbolKind::Note(n) => m.advance += n.duration.dots() as f64 * DOT_SPACE,
        SymbolKind::Rest(r) => m.advance += r.duration.dots() as f64 * DOT_SPACE,
        SymbolKind::Key(k) => {
            let accidentals = k.fifths.unsigned_abs() as f64 * KEY_ACCIDENTAL_SPACE;
            m.advance += accidentals;
            m.width += accidentals;
        }
        _ => {}
    }
    m
}

// ═══════════════════════════════════════════════════════════════════════
// System geometry
// ═══════════════════════════════════════════════════════════════════════

pub(super) fn system_height(staff_count: usize) -> f64 {
    let staves = staff_count.max(1) as f64;
    staves * STAFF_HEIGHT + (staves - 1.0) * STAFF_GAP + SYSTEM_SPACING
}

pub(super) fn staff_top(system: usize, staff: usize, staff_count: usize) -> f64 {
    FIRST_SYSTEM_TOP
        + system as f64 * system_height(staff_count)
        + staff as f64 * (STAFF_HEIGHT + STAFF_GAP)
}

fn staff_lines(top: f64) -> Vec<f64> {
    (0..5).map(|i| top + i as f64 * STAFF_LINE_SPACING).collect()
}

/// Vertical extent of a symbol on a staff whose top line is at `top`.
fn vertical_extent(kind: &SymbolKind, top: f64, clef: &Clef) -> Result<(f64, f64), EditError> {
    let extent = match kind {
        SymbolKind::Note(n) => {
            let y = top + pitch::staff_position(&n.pitch, clef)? as f64 * HALF_SPACE;
            (y - NOTEHEAD_HALF_HEIGHT, y + NOTEHEAD_HALF_HEIGHT)
        }
        SymbolKind::Rest(r) if r.render == RenderKind::Placeholder => {
            let y = top + MIDDLE_LINE as f64 * HALF_SPACE;
            (y - NOTEHEAD_HALF_HEIGHT, y + NOTEHEAD_HALF_HEIGHT)
        }
        SymbolKind::Rest(_) => (top + REST_TOP, top + REST_BOTTOM),
        SymbolKind::Clef(_) => (top - CLEF_OVERHANG, top + STAFF_HEIGHT + CLEF_OVERHANG),
        SymbolKind::Barline(_)
        | SymbolKind::Key(_)
        | SymbolKind::Time(_)
        | SymbolKind::LineBreak => (top, top + STAFF_HEIGHT),
    };
    Ok(extent)
}

// ═══════════════════════════════════════════════════════════════════════
// Main layout computation
// ═══════════════════════════════════════════════════════════════════════

pub(super) fn compute_layout(score: &mut Score) -> Result<(), EditError> {
    let staff_count = score.staves.len();
    let system_count = 1 + score
        .staves
        .iter()
        .map(Staff::line_break_count)
        .max()
        .unwrap_or(0);

    score.systems = (0..system_count)
        .map(|sys| System {
            y: staff_top(sys, 0, staff_count),
            staff_lines: (0..staff_count)
                .map(|s| staff_lines(staff_top(sys, s, staff_count)))
                .collect(),
        })
        .collect();

    for (s, staff) in score.staves.iter_mut().enumerate() {
        let mut system = 0;
        let mut x = PAGE_MARGIN_LEFT;
        let mut clef = Clef::default();

        for element in staff.elements.iter_mut() {
            if element.is_line_break() {
                system += 1;
                x = PAGE_MARGIN_LEFT;
            }
            if let SymbolKind::Clef(c) = element.kind {
                clef = c;
            }
            let top = staff_top(system, s, staff_count);
            let m = symbol_metrics(&element.kind);
            let (y0, y1) = vertical_extent(&element.kind, top, &clef)?;
            element.bounds = Some(BoundingBox {
                left: x + m.offset,
                top: y0,
                right: x + m.offset + m.width,
                bottom: y1,
            });
            x += m.advance;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::duration::Duration;

    #[test]
    fn placeholder_rest_uses_note_metrics() {
        let placeholder = SymbolKind::Rest(Rest { duration: Duration::HALF, render: RenderKind::Placeholder });
        let rest = SymbolKind::Rest(Rest { duration: Duration::HALF, render: RenderKind::Standard });
        assert_eq!(symbol_metrics(&placeholder), glyph_metrics(GlyphKind::NoteHead));
        assert_ne!(symbol_metrics(&rest).advance, symbol_metrics(&placeholder).advance);
    }

    #[test]
    fn line_break_starts_next_system() {
        let mut score = Score::new(vec![Staff::new(vec![
            Symbol::clef(Clef::TREBLE),
            Symbol::rest(Duration::WHOLE),
            Symbol::barline(BarStyle::Regular),
            Symbol::line_break(),
            Symbol::rest(Duration::WHOLE),
        ])]);
        compute_layout(&mut score).unwrap();

        assert_eq!(score.systems.len(), 2);
        assert_eq!(score.systems[0].staff_lines[0], vec![60.0, 70.0, 80.0, 90.0, 100.0]);
        assert_eq!(score.systems[1].y, 60.0 + system_height(1));

        let second_rest = score.staves[0].elements[4].bounds.unwrap();
        assert_eq!(second_rest.left, PAGE_MARGIN_LEFT + 8.0);
        assert_eq!(second_rest.top, score.systems[1].y + REST_TOP);
    }

    #[test]
    fn note_height_follows_pitch() {
        let mut score = Score::new(vec![Staff::new(vec![
            Symbol::clef(Clef::TREBLE),
            Symbol::note(Pitch::natural(Step::F, 5), Duration::QUARTER, StemDirection::Down),
            Symbol::note(Pitch::natural(Step::E, 4), Duration::QUARTER, StemDirection::Up),
        ])]);
        compute_layout(&mut score).unwrap();
        let top_line = score.staves[0].elements[1].bounds.unwrap();
        let bottom_line = score.staves[0].elements[2].bounds.unwrap();
        assert_eq!(top_line.top, 60.0 - NOTEHEAD_HALF_HEIGHT);
        assert_eq!(bottom_line.bottom, 100.0 + NOTEHEAD_HALF_HEIGHT);
    }
}
