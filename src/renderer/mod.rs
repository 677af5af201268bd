//! Rendering collaborator.
//!
//! The editing engines never compute geometry themselves: they ask a
//! [`Renderer`] to lay the score out *now* and then read back the
//! bounding boxes and staff-line coordinates it assigned. The call is
//! synchronous and must not mutate anything but geometry.
//!
//! [`LayoutRenderer`] is a deterministic implementation with fixed glyph
//! metrics, suitable for headless hosts and tests. [`score_to_svg`]
//! draws whatever geometry the last render produced.

mod constants;
pub(crate) mod layout;
mod svg_builder;

use crate::error::EditError;
use crate::model::*;
use constants::*;
use svg_builder::{empty_svg, SvgBuilder};

/// Lays a score out, filling `Symbol::bounds` and `Score::systems`.
pub trait Renderer {
    fn render(&mut self, score: &mut Score) -> Result<(), EditError>;
}

/// Fixed-metrics renderer: symbols advance left to right from the page
/// margin, and each line break starts a new system below the previous one.
#[derive(Debug, Clone, Copy, Default)]
pub struct LayoutRenderer;

impl Renderer for LayoutRenderer {
    fn render(&mut self, score: &mut Score) -> Result<(), EditError> {
        layout::compute_layout(score)
    }
}

// ═══════════════════════════════════════════════════════════════════════
// SVG output
// ═══════════════════════════════════════════════════════════════════════

/// Draw the last rendered geometry of a score as SVG.
///
/// Staff lines span `page_width`; symbols without bounds are skipped.
pub fn score_to_svg(score: &Score, page_width: f64) -> String {
    if score.staves.is_empty() || score.systems.is_empty() {
        return empty_svg("Nothing rendered");
    }

    let height = score
        .systems
        .last()
        .map_or(0.0, |sys| sys.y + layout::system_height(score.staves.len()));
    let mut svg = SvgBuilder::new(page_width, height);
    svg.rect(0.0, 0.0, page_width, height, "white");

    for system in &score.systems {
        for lines in &system.staff_lines {
            for &y in lines {
                svg.line(PAGE_MARGIN_LEFT, y, page_width - PAGE_MARGIN_LEFT, y, STAFF_COLOR, 0.8);
            }
        }
    }

    for staff in &score.staves {
        for element in &staff.elements {
            let Some(b) = element.bounds else { continue };
            match &element.kind {
                SymbolKind::Note(note) => {
                    let color = if note.render == RenderKind::Placeholder {
                        PLACEHOLDER_COLOR
                    } else {
                        NOTE_COLOR
                    };
                    let filled = note.duration.denominator() >= 4;
                    svg.notehead(
                        b.mid_x(),
                        (b.top + b.bottom) / 2.0,
                        (b.right - b.left) / 2.0,
                        (b.bottom - b.top) / 2.0,
                        filled,
                        color,
                    );
                }
                SymbolKind::Rest(_) => {
                    svg.rect(b.left, b.top, b.right - b.left, b.bottom - b.top, REST_COLOR);
                }
                SymbolKind::Barline(bar) => {
                    let width = if bar.style == BarStyle::Final { 3.0 } else { 1.0 };
                    svg.line(b.left, b.top, b.left, b.bottom, BARLINE_COLOR, width);
                }
                SymbolKind::Clef(clef) => {
                    let label = match clef.sign {
                        ClefSign::G => "G",
                        ClefSign::F => "F",
                        ClefSign::C => "C",
                    };
                    svg.text(b.mid_x(), (b.top + b.bottom) / 2.0, label, 20.0, NOTE_COLOR);
                }
                SymbolKind::Time(time) => {
                    let label = format!("{}/{}", time.beats, time.beat_type);
                    svg.text(b.mid_x(), (b.top + b.bottom) / 2.0, &label, 14.0, NOTE_COLOR);
                }
                SymbolKind::Key(_) | SymbolKind::LineBreak => {}
            }
        }
    }

    svg.build()
}
