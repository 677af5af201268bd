//! Measure insertion: places a note or rest at a clicked position and
//! takes exactly its length back out of the surrounding content, so the
//! measure still adds up to its time signature.
//!
//! The reclaim search walks outward from the new symbol. Rests are
//! consumed first (split by repeated halving, or removed whole). Notes
//! only become eligible once the search has bounced off notes, barlines
//! or the measure ends more than once without finishing.

use std::ops::Range;

use log::{debug, trace};

use crate::config::EditorConfig;
use crate::duration::{self, Duration, Proportion};
use crate::error::EditError;
use crate::hit_test;
use crate::model::{Note, RenderKind, Rest, Score, Symbol, SymbolKind};
use crate::pitch;
use crate::rebuild::StaffObserver;
use crate::reflow::{reflow_score, restore_rest_render, set_rest_placeholders};
use crate::renderer::Renderer;

/// Placeholder glyphs sit slightly left of where the note head's visual
/// centre reads; shift their midpoint right by this much.
const PLACEHOLDER_MID_OFFSET: f64 = 2.0;

/// A pointer-driven insertion request.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InsertRequest {
    pub x: f64,
    pub y: f64,
    /// Content width used for the re-flow that follows a successful insert
    pub viewport_width: f64,
    /// `None` means no duration is selected: nothing is inserted
    pub duration: Option<Duration>,
    pub is_rest: bool,
}

/// Why a request left the score untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IgnoreReason {
    NoDuration,
    OutsideStaff,
    OutsideMeasure,
    EmptyMeasure,
    ExceedsMeasure,
    /// The measure's notes and rests are shorter than the new symbol
    NotEnoughContent,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    Inserted { staff: usize, measure_number: u32 },
    Ignored(IgnoreReason),
}

/// Where the new symbol goes relative to the measure's elements.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Slot {
    /// Last element whose midpoint is at or left of the click
    left: Option<usize>,
    /// The click reads closer to the right neighbour than to the left one
    toward_right: bool,
}

/// Insert a note or rest at a click position.
///
/// Always re-flows the score after a successful insertion.
pub fn insert_at<R: Renderer + ?Sized>(
    score: &mut Score,
    renderer: &mut R,
    config: &EditorConfig,
    request: &InsertRequest,
    observer: &mut dyn StaffObserver,
) -> Result<InsertOutcome, EditError> {
    let Some(duration) = request.duration else {
        debug!("insert ignored: no duration selected");
        return Ok(InsertOutcome::Ignored(IgnoreReason::NoDuration));
    };
    let Some(hit) = hit_test::staff_line_at(request.y, &score.systems, config) else {
        debug!("insert ignored: y={} is not on a staff", request.y);
        return Ok(InsertOutcome::Ignored(IgnoreReason::OutsideStaff));
    };
    let position = hit.index as isize - config.ledger_positions();
    let staff_idx = hit.staff;

    let staff = score.staff(staff_idx)?;
    let Some(measure) =
        hit_test::measure_at(request.x, request.y, staff, staff_idx, &score.systems, config)
    else {
        debug!("insert ignored: ({}, {}) is not inside a measure", request.x, request.y);
        return Ok(InsertOutcome::Ignored(IgnoreReason::OutsideMeasure));
    };
    let Some(range) = staff.measure_range(measure) else {
        return Ok(InsertOutcome::Ignored(IgnoreReason::OutsideMeasure));
    };
    if range.len() <= 1 {
        debug!("insert ignored: measure {measure} of staff {staff_idx} is empty");
        return Ok(InsertOutcome::Ignored(IgnoreReason::EmptyMeasure));
    }
    let measure_number = staff.measures()[measure].number;

    // Lay the measure out as if every rest were a note, then find the slot
    let saved = set_rest_placeholders(&mut score.staves[staff_idx].elements[range.clone()]);
    renderer.render(score)?;
    let slot = find_slot(&score.staves[staff_idx].elements, range.clone(), request.x);

    let staff = &score.staves[staff_idx];
    let time = staff.governing_time(range.end).unwrap_or_default();
    let clef = staff.governing_clef(range.end).unwrap_or_default();
    let available = staff.elements[range.clone()]
        .iter()
        .map(Symbol::proportion)
        .fold(Proportion::from_integer(0), |acc, p| acc + p);

    restore_rest_render(&mut score.staves[staff_idx].elements[range.clone()], &saved);

    let wanted = duration.proportion();
    if wanted > time.proportion() || wanted > available {
        renderer.render(score)?;
        let reason = if wanted > time.proportion() {
            IgnoreReason::ExceedsMeasure
        } else {
            IgnoreReason::NotEnoughContent
        };
        debug!("insert ignored: {duration} in measure {measure_number} ({reason:?})");
        return Ok(InsertOutcome::Ignored(reason));
    }

    let pitch = pitch::pitch_at_staff_line(position, &clef)?;
    let stem = pitch::stem_for_position(position);
    let index = slot.left.map_or(range.start, |l| l + 1);
    let elements = &mut score.staves[staff_idx].elements;
    elements.insert(
        index,
        Symbol::new(SymbolKind::Note(Note {
            pitch,
            duration,
            stem,
            render: RenderKind::Placeholder,
        })),
    );
    debug!("staff {staff_idx}: inserting {duration} {pitch} at element {index}");

    let mut range = range.start..range.end + 1;
    reclaim(elements, &mut range, index, slot.toward_right, wanted).map_err(|failure| match failure {
        ReclaimFailure::Stalled => EditError::ReclaimStalled { staff: staff_idx, measure },
        ReclaimFailure::Duration(err) => err,
    })?;

    finish_placeholders(&mut elements[range.start..], request.is_rest);
    reflow_score(score, renderer, request.viewport_width, observer)?;

    Ok(InsertOutcome::Inserted { staff: staff_idx, measure_number })
}

fn midpoint(element: &Symbol) -> Option<f64> {
    let b = element.bounds?;
    let offset = match &element.kind {
        SymbolKind::Rest(r) if r.render == RenderKind::Placeholder => PLACEHOLDER_MID_OFFSET,
        _ => 0.0,
    };
    Some(b.mid_x() + offset)
}

fn find_slot(elements: &[Symbol], range: Range<usize>, x: f64) -> Slot {
    let mut left = None;
    for i in range.clone() {
        if midpoint(&elements[i]).is_some_and(|m| m <= x) {
            left = Some(i);
        }
    }
    // Never insert after the measure's closing barline
    if let Some(l) = left {
        if l + 1 == range.end && elements[l].is_barline() {
            left = l.checked_sub(1).filter(|&p| p >= range.start);
        }
    }

    let right = left.map_or(range.start, |l| l + 1);
    let left_distance = left
        .and_then(|l| midpoint(&elements[l]))
        .map_or(f64::INFINITY, |m| x - m);
    let right_distance = (right < range.end)
        .then(|| midpoint(&elements[right]))
        .flatten()
        .map_or(f64::INFINITY, |m| m - x);

    Slot { left, toward_right: right_distance < left_distance }
}

#[derive(Debug)]
enum ReclaimFailure {
    /// The search ran past its step budget
    Stalled,
    Duration(EditError),
}

/// Remove exactly `excess` worth of rests (and, once allowed, notes)
/// around `start`, keeping `range` in step with the element vector.
fn reclaim(
    elements: &mut Vec<Symbol>,
    range: &mut Range<usize>,
    start: usize,
    toward_right: bool,
    mut excess: Proportion,
) -> Result<(), ReclaimFailure> {
    let zero = Proportion::from_integer(0);
    let budget = 2 * (range.len() + 2) * (range.len() + 2);
    let mut cursor = start as isize;
    let mut direction: isize = if toward_right { 1 } else { -1 };
    let mut bounces = 0u32;
    let mut steps = 0usize;

    while excess != zero {
        steps += 1;
        if steps > budget {
            return Err(ReclaimFailure::Stalled);
        }

        cursor += direction;
        if cursor < range.start as isize {
            direction = 1;
            cursor = range.start as isize;
            bounces += 1;
            trace!("reclaim: bounced off measure start ({bounces})");
            continue;
        }
        if cursor >= range.end as isize {
            direction = -1;
            cursor = range.end as isize - 1;
            bounces += 1;
            trace!("reclaim: bounced off measure end ({bounces})");
            continue;
        }

        let idx = cursor as usize;
        let override_mode = bounces > 1;
        let element = &elements[idx];
        let reclaimable = match &element.kind {
            SymbolKind::Note(n) if n.render == RenderKind::Placeholder => continue,
            SymbolKind::Rest(_) => true,
            SymbolKind::Note(_) if override_mode => true,
            SymbolKind::Note(_) | SymbolKind::Barline(_) => {
                direction = -direction;
                bounces += 1;
                trace!("reclaim: bounced off element {idx} ({bounces})");
                false
            }
            _ => {
                direction = -direction;
                false
            }
        };
        if !reclaimable {
            continue;
        }

        let weight = element.proportion();
        if weight > excess {
            let pieces = shrunk(element, weight - excess).map_err(ReclaimFailure::Duration)?;
            trace!("reclaim: split element {idx} into {} piece(s)", pieces.len());
            let added = pieces.len();
            elements.splice(idx..idx + 1, pieces);
            range.end = range.end + added - 1;
            excess = zero;
        } else {
            trace!("reclaim: removed element {idx} worth {weight}");
            elements.remove(idx);
            range.end -= 1;
            excess -= weight;
            // The element sliding into the freed slot is visited next
            if direction > 0 {
                cursor -= 1;
            }
        }
    }
    Ok(())
}

/// Replacement symbols worth `keep` for a rest or note being shortened.
fn shrunk(element: &Symbol, keep: Proportion) -> Result<Vec<Symbol>, EditError> {
    let Some(from) = element.duration() else {
        return Ok(Vec::new());
    };
    let durations = duration::decompose(keep, from)?;
    let pieces = durations
        .into_iter()
        .map(|d| match &element.kind {
            SymbolKind::Note(n) => Symbol::new(SymbolKind::Note(Note { duration: d, ..n.clone() })),
            _ => Symbol::correct_rest(d),
        })
        .collect();
    Ok(pieces)
}

/// Turn the inserted placeholder into its final note or rest.
fn finish_placeholders(elements: &mut [Symbol], is_rest: bool) {
    for element in elements {
        let SymbolKind::Note(note) = &mut element.kind else { continue };
        if note.render != RenderKind::Placeholder {
            continue;
        }
        if is_rest {
            let duration = note.duration;
            element.kind = SymbolKind::Rest(Rest { duration, render: RenderKind::Correct });
        } else {
            note.render = RenderKind::Standard;
        }
    }
}
