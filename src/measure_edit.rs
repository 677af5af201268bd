//! Measure add/remove, plus the small single-symbol edits that operate on
//! a selection: shifting a note's pitch and clearing a note to a rest.
//!
//! Adding and removing work across every staff so that measure numbers
//! stay aligned between staves, then re-flow the score.

use log::debug;

use crate::config::EditorConfig;
use crate::duration;
use crate::error::EditError;
use crate::model::{BarStyle, Score, Staff, Symbol, SymbolKind};
use crate::pitch;
use crate::rebuild::StaffObserver;
use crate::reflow::reflow_score;
use crate::renderer::Renderer;

/// A selected symbol, addressed by staff and element index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Selection {
    pub staff: usize,
    pub element: usize,
}

/// Measure number owning the selected element.
fn selected_measure_number(score: &Score, selection: Selection) -> Result<u32, EditError> {
    let staff = score.staff(selection.staff)?;
    let element = staff.elements.get(selection.element).ok_or(EditError::ElementOutOfRange {
        staff: selection.staff,
        element: selection.element,
    })?;
    element
        .measure()
        .and_then(|m| staff.measures().get(m))
        .map(|m| m.number)
        .ok_or(EditError::MissingBarline { staff: selection.staff, from: selection.element })
}

fn next_barline(staff: &Staff, staff_idx: usize, from: usize) -> Result<usize, EditError> {
    staff.elements[from..]
        .iter()
        .position(Symbol::is_barline)
        .map(|offset| from + offset)
        .ok_or(EditError::MissingBarline { staff: staff_idx, from })
}

/// Measure-filling rests for the time signature in force at `index`.
fn filling_rests(staff: &Staff, index: usize) -> Result<Vec<Symbol>, EditError> {
    let time = staff.governing_time(index).unwrap_or_default();
    Ok(duration::fill(time.proportion())?
        .into_iter()
        .map(Symbol::correct_rest)
        .collect())
}

/// Add one measure of rests to every staff.
///
/// With a selection the new measure follows the selected symbol's
/// measure; without one it becomes the last measure.
pub fn add_measure<R: Renderer + ?Sized>(
    score: &mut Score,
    renderer: &mut R,
    selection: Option<Selection>,
    viewport_width: f64,
    observer: &mut dyn StaffObserver,
) -> Result<(), EditError> {
    let number = selection
        .map(|sel| selected_measure_number(score, sel))
        .transpose()?;

    for (staff_idx, staff) in score.staves.iter_mut().enumerate() {
        match number {
            Some(number) => {
                let Some(range) = staff.measure_by_number(number).and_then(|m| staff.measure_range(m))
                else {
                    debug!("staff {staff_idx} has no measure {number}; nothing added");
                    continue;
                };
                let bar = next_barline(staff, staff_idx, range.start)?;
                let mut inserted = vec![Symbol::barline(BarStyle::Regular)];
                inserted.extend(filling_rests(staff, bar)?);
                debug!("staff {staff_idx}: new measure after measure {number} at element {bar}");
                staff.elements.splice(bar..bar, inserted);
            }
            None if staff.elements.is_empty() => {
                let mut inserted = filling_rests(staff, 0)?;
                inserted.push(Symbol::barline(BarStyle::Final));
                staff.elements = inserted;
            }
            None => {
                let at = staff.elements.len() - 1;
                let mut inserted = vec![Symbol::barline(BarStyle::Regular)];
                inserted.extend(filling_rests(staff, at)?);
                debug!("staff {staff_idx}: new measure appended before element {at}");
                staff.elements.splice(at..at, inserted);
            }
        }
    }

    reflow_score(score, renderer, viewport_width, observer)
}

/// Remove one measure from every staff.
///
/// Returns `Ok(false)` without touching the score when the first staff is
/// already down to `config.min_measure_count` measures. Clefs, keys and
/// time signatures inside the removed measure are kept.
pub fn remove_measure<R: Renderer + ?Sized>(
    score: &mut Score,
    renderer: &mut R,
    config: &EditorConfig,
    selection: Option<Selection>,
    viewport_width: f64,
    observer: &mut dyn StaffObserver,
) -> Result<bool, EditError> {
    let count = score.staff(0).map_or(0, |s| s.measures().len());
    if count <= config.min_measure_count {
        debug!("remove ignored: {count} measure(s), minimum is {}", config.min_measure_count);
        return Ok(false);
    }
    let number = selection
        .map(|sel| selected_measure_number(score, sel))
        .transpose()?;

    for (staff_idx, staff) in score.staves.iter_mut().enumerate() {
        let measure = match number {
            Some(number) => staff.measure_by_number(number),
            None => staff
                .elements
                .len()
                .checked_sub(2)
                .and_then(|i| staff.elements[i].measure()),
        };
        let Some(range) = measure.and_then(|m| staff.measure_range(m)) else {
            debug!("staff {staff_idx}: no matching measure to remove");
            continue;
        };
        remove_measure_at(staff, staff_idx, range.start)?;
    }

    reflow_score(score, renderer, viewport_width, observer)?;
    Ok(true)
}

/// Delete notes, rests and line breaks from `start` up to the closing
/// barline, then the barline itself. A final barline survives by taking
/// the place of the previous measure's barline.
fn remove_measure_at(staff: &mut Staff, staff_idx: usize, start: usize) -> Result<(), EditError> {
    let mut i = start;
    while i < staff.elements.len() {
        match &staff.elements[i].kind {
            SymbolKind::Barline(bar) => {
                if bar.style == BarStyle::Final && start > 0 && staff.elements[start - 1].is_barline() {
                    staff.elements.remove(start - 1);
                } else {
                    staff.elements.remove(i);
                }
                debug!("staff {staff_idx}: removed measure starting at element {start}");
                return Ok(());
            }
            SymbolKind::Note(_) | SymbolKind::Rest(_) | SymbolKind::LineBreak => {
                staff.elements.remove(i);
            }
            SymbolKind::Clef(_) | SymbolKind::Key(_) | SymbolKind::Time(_) => i += 1,
        }
    }
    Err(EditError::MissingBarline { staff: staff_idx, from: start })
}

/// Move the selected note by `steps` diatonic steps (positive is up).
///
/// A zero shift, or one that would leave the staff plus its extra ledger
/// lines, is ignored. The stem is recomputed from the new position.
pub fn shift_pitch(
    score: &mut Score,
    config: &EditorConfig,
    selection: Selection,
    steps: isize,
) -> Result<bool, EditError> {
    let staff = score.staff_mut(selection.staff)?;
    let clef = staff.governing_clef(selection.element).unwrap_or_default();
    let element = staff.elements.get_mut(selection.element).ok_or(EditError::ElementOutOfRange {
        staff: selection.staff,
        element: selection.element,
    })?;
    let SymbolKind::Note(note) = &mut element.kind else {
        debug!("shift ignored: element {} is not a note", selection.element);
        return Ok(false);
    };
    if steps == 0 {
        return Ok(false);
    }

    let position = pitch::staff_position(&note.pitch, &clef)? - steps;
    let ledger = config.ledger_positions();
    if position < -ledger || position > pitch::BOTTOM_LINE + ledger {
        debug!("shift ignored: position {position} is outside the legal range");
        return Ok(false);
    }
    note.pitch = pitch::shift_pitch(&note.pitch, steps)?;
    note.stem = pitch::stem_for_position(position);
    debug!("note {} moved to {} (position {position})", selection.element, note.pitch);
    Ok(true)
}

/// Replace the selected note with a rest of the same duration.
///
/// Returns `Ok(false)` if the selection isn't a note.
pub fn clear_symbol<R: Renderer + ?Sized>(
    score: &mut Score,
    renderer: &mut R,
    selection: Selection,
    viewport_width: f64,
    observer: &mut dyn StaffObserver,
) -> Result<bool, EditError> {
    let staff = score.staff_mut(selection.staff)?;
    let element = staff.elements.get_mut(selection.element).ok_or(EditError::ElementOutOfRange {
        staff: selection.staff,
        element: selection.element,
    })?;
    let SymbolKind::Note(note) = &element.kind else {
        return Ok(false);
    };
    let duration = note.duration;
    *element = Symbol::correct_rest(duration);

    reflow_score(score, renderer, viewport_width, observer)?;
    Ok(true)
}
