//! Line/system re-flow: re-wraps each staff into systems that fit the
//! viewport, breaking only at barlines.
//!
//! Widths are measured with every rest laid out as a placeholder note,
//! so the wrap points do not depend on whether a slot currently holds a
//! rest or a note.

use log::debug;

use crate::error::EditError;
use crate::model::{RenderKind, Score, Symbol, SymbolKind};
use crate::rebuild::{rebuild_measures, StaffObserver};
use crate::renderer::Renderer;

/// Re-flow every staff of the score against `viewport_width`, then
/// rebuild its measures.
pub fn reflow_score<R: Renderer + ?Sized>(
    score: &mut Score,
    renderer: &mut R,
    viewport_width: f64,
    observer: &mut dyn StaffObserver,
) -> Result<(), EditError> {
    for staff_idx in 0..score.staves.len() {
        reflow_staff(score, staff_idx, renderer, viewport_width)?;
        renderer.render(score)?;
        let system_count = score.systems.len();
        rebuild_measures(&mut score.staves[staff_idx], staff_idx, system_count, observer);
    }
    Ok(())
}

/// Strip and re-insert the line breaks of one staff.
///
/// Leaves the staff's rests as rests again; the caller re-renders and
/// rebuilds measures.
pub fn reflow_staff<R: Renderer + ?Sized>(
    score: &mut Score,
    staff_idx: usize,
    renderer: &mut R,
    viewport_width: f64,
) -> Result<(), EditError> {
    let staff = score.staff_mut(staff_idx)?;
    staff.elements.retain(|e| !e.is_line_break());
    let saved = set_rest_placeholders(&mut staff.elements);
    renderer.render(score)?;

    let mut line_start = 0;
    let mut last_barline: Option<usize> = None;
    let mut i = 0;
    while i < score.staves[staff_idx].elements.len() {
        let element = &score.staves[staff_idx].elements[i];
        let is_barline = element.is_barline();
        let overflows = i > 0 && element.bounds.is_some_and(|b| b.right > viewport_width);
        if overflows {
            if let Some(bar) = last_barline.filter(|&b| b >= line_start) {
                debug!("staff {staff_idx}: line break after element {bar} (element {i} overflows {viewport_width})");
                score.staves[staff_idx].elements.insert(bar + 1, Symbol::line_break());
                renderer.render(score)?;
                line_start = bar + 1;
                last_barline = None;
                i = bar + 2;
                continue;
            }
        }
        if is_barline {
            last_barline = Some(i);
        }
        i += 1;
    }

    restore_rest_render(&mut score.staves[staff_idx].elements, &saved);
    Ok(())
}

/// Lay every rest out as a placeholder note.
///
/// Returns the rests' previous render kinds, in order, for
/// [`restore_rest_render`].
pub(crate) fn set_rest_placeholders(elements: &mut [Symbol]) -> Vec<RenderKind> {
    elements
        .iter_mut()
        .filter_map(|e| match &mut e.kind {
            SymbolKind::Rest(rest) => Some(std::mem::replace(&mut rest.render, RenderKind::Placeholder)),
            _ => None,
        })
        .collect()
}

/// Give the rests back the render kinds saved by [`set_rest_placeholders`].
///
/// Rests are matched by order, so other symbols may have been inserted
/// in between.
pub(crate) fn restore_rest_render(elements: &mut [Symbol], saved: &[RenderKind]) {
    let rests = elements.iter_mut().filter_map(|e| match &mut e.kind {
        SymbolKind::Rest(rest) => Some(rest),
        _ => None,
    });
    for (rest, &render) in rests.zip(saved) {
        rest.render = render;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EditorConfig;
    use crate::model::*;
    use crate::renderer::LayoutRenderer;

    fn blank(measures: usize) -> Score {
        let config = EditorConfig { default_measure_count: measures, ..EditorConfig::default() };
        Score::blank(&[Clef::TREBLE], TimeSignature::default(), Key::default(), &config).unwrap()
    }

    fn break_positions(score: &Score) -> Vec<usize> {
        score.staves[0]
            .elements
            .iter()
            .enumerate()
            .filter(|(_, e)| e.is_line_break())
            .map(|(i, _)| i)
            .collect()
    }

    #[test]
    fn wide_viewport_needs_no_breaks() {
        let mut score = blank(4);
        reflow_score(&mut score, &mut LayoutRenderer, 1000.0, &mut ()).unwrap();
        assert!(break_positions(&score).is_empty());
        assert_eq!(score.systems.len(), 1);
    }

    #[test]
    fn breaks_follow_barlines() {
        // Header takes 20..80, each measure 42 units as laid out with note metrics
        let mut score = blank(12);
        reflow_score(&mut score, &mut LayoutRenderer, 300.0, &mut ()).unwrap();

        let breaks = break_positions(&score);
        assert_eq!(breaks, vec![13, 26]);
        for &b in &breaks {
            assert!(score.staves[0].elements[b - 1].is_barline());
        }
        assert_eq!(score.systems.len(), 3);
        let systems: Vec<usize> = score.staves[0].measures().iter().map(|m| m.system).collect();
        assert_eq!(systems, vec![0, 0, 0, 0, 0, 1, 1, 1, 1, 1, 1, 2]);
    }

    #[test]
    fn reflow_is_idempotent() {
        let mut score = blank(12);
        reflow_score(&mut score, &mut LayoutRenderer, 300.0, &mut ()).unwrap();
        let first = score.staves[0].elements.clone();
        reflow_score(&mut score, &mut LayoutRenderer, 300.0, &mut ()).unwrap();
        assert_eq!(score.staves[0].elements, first);
    }

    #[test]
    fn plain_rests_keep_their_render_kind() {
        let mut staff = Staff::new(vec![
            Symbol::clef(Clef::TREBLE),
            Symbol::rest(crate::duration::Duration::WHOLE),
            Symbol::barline(BarStyle::Regular),
            Symbol::correct_rest(crate::duration::Duration::WHOLE),
            Symbol::barline(BarStyle::Final),
        ]);
        crate::rebuild::rebuild_measures(&mut staff, 0, 1, &mut ());
        let mut score = Score::new(vec![staff]);
        reflow_score(&mut score, &mut LayoutRenderer, 1000.0, &mut ()).unwrap();

        let kinds: Vec<RenderKind> =
            score.staves[0].elements.iter().filter_map(Symbol::render_kind).collect();
        assert_eq!(kinds, vec![RenderKind::Standard, RenderKind::Correct]);
    }

    #[test]
    fn rests_come_back_as_rests() {
        let mut score = blank(2);
        reflow_score(&mut score, &mut LayoutRenderer, 300.0, &mut ()).unwrap();
        assert!(score.staves[0].elements.iter().all(|e| !e.is_placeholder()));
    }
}
