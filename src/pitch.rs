//! Diatonic pitch table and staff-position mapping.
//!
//! Staff positions count half-lines downward from the top staff line:
//! 0 is the top line, 1 the space below it, 8 the bottom line. Negative
//! positions and positions past 8 sit on or between ledger lines.

use crate::error::EditError;
use crate::model::{Clef, ClefSign, Pitch, StemDirection, Step};

/// Lowest octave in the table (C1).
const LOWEST_OCTAVE: i8 = 1;
/// C1 through C7 inclusive.
pub const TABLE_LEN: usize = 6 * 7 + 1;

/// Position of the middle staff line.
pub const MIDDLE_LINE: isize = 4;
/// Position of the bottom staff line.
pub const BOTTOM_LINE: isize = 8;

/// Natural pitch at a table index (ascending, 0 = C1).
pub fn table_pitch(index: usize) -> Pitch {
    let index = index.min(TABLE_LEN - 1);
    Pitch::natural(Step::ALL[index % 7], LOWEST_OCTAVE + (index / 7) as i8)
}

/// Table index of a pitch, matched by letter and octave.
pub fn table_index(pitch: &Pitch) -> Result<usize, EditError> {
    let offset = (pitch.octave as i32 - LOWEST_OCTAVE as i32) * 7 + pitch.step as i32;
    if offset < 0 || offset as usize >= TABLE_LEN {
        return Err(EditError::PitchNotInTable(pitch.to_string()));
    }
    Ok(offset as usize)
}

/// Pitch sitting on the top staff line for a clef.
pub fn top_line_pitch(clef: &Clef) -> Result<Pitch, EditError> {
    let (step, octave) = match (clef.sign, clef.line) {
        (ClefSign::G, 1) => (Step::A, 5),
        (ClefSign::G, 2) => (Step::F, 5),
        (ClefSign::F, 3) => (Step::C, 4),
        (ClefSign::F, 4) => (Step::A, 3),
        (ClefSign::F, 5) => (Step::F, 3),
        (ClefSign::C, 1) => (Step::D, 5),
        (ClefSign::C, 2) => (Step::B, 4),
        (ClefSign::C, 3) => (Step::G, 4),
        (ClefSign::C, 4) => (Step::E, 4),
        (ClefSign::C, 5) => (Step::C, 4),
        (sign, line) => {
            let sign = match sign {
                ClefSign::G => 'G',
                ClefSign::F => 'F',
                ClefSign::C => 'C',
            };
            return Err(EditError::UnsupportedClef { sign, line });
        }
    };
    Ok(Pitch::natural(step, octave))
}

fn clamp_index(index: isize) -> usize {
    index.clamp(0, TABLE_LEN as isize - 1) as usize
}

/// Pitch at a staff position under a clef, clamped to the table.
pub fn pitch_at_staff_line(position: isize, clef: &Clef) -> Result<Pitch, EditError> {
    let top = table_index(&top_line_pitch(clef)?)? as isize;
    Ok(table_pitch(clamp_index(top - position)))
}

/// Staff position of a pitch under a clef.
pub fn staff_position(pitch: &Pitch, clef: &Clef) -> Result<isize, EditError> {
    let top = table_index(&top_line_pitch(clef)?)? as isize;
    Ok(top - table_index(pitch)? as isize)
}

/// Move a pitch by diatonic steps (positive is up), clamped to the table.
///
/// The result is always a natural; any alteration is dropped.
pub fn shift_pitch(pitch: &Pitch, steps: isize) -> Result<Pitch, EditError> {
    let index = table_index(pitch)? as isize;
    Ok(table_pitch(clamp_index(index + steps)))
}

/// Stems point down once a note reaches the middle line or above.
pub fn stem_for_position(position: isize) -> StemDirection {
    if position <= MIDDLE_LINE {
        StemDirection::Down
    } else {
        StemDirection::Up
    }
}
