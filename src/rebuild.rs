//! Measure rebuild: regroups a staff's elements into measures.
//!
//! Always a full pass over the staff: every element's measure
//! back-reference and every measure's system assignment is recomputed,
//! so nothing can be left pointing at a measure that no longer exists.

use crate::model::{Measure, Staff};

/// Notified after a staff's measures have been rebuilt.
pub trait StaffObserver {
    fn measures_rebuilt(&mut self, staff_index: usize, staff: &Staff);
}

impl StaffObserver for () {
    fn measures_rebuilt(&mut self, _staff_index: usize, _staff: &Staff) {}
}

/// Rebuild `staff.measures` in one left-to-right pass.
///
/// Each barline closes the current measure. An element's system is the
/// number of line breaks up to and including it, clamped to
/// `system_count`. A trailing empty measure is dropped unless it is the
/// only one.
pub fn rebuild_measures(
    staff: &mut Staff,
    staff_index: usize,
    system_count: usize,
    observer: &mut dyn StaffObserver,
) {
    staff.measures.clear();
    let last_system = system_count.saturating_sub(1);
    let mut breaks = 0usize;
    let mut current = Measure { number: 1, system: 0, first: 0, len: 0 };

    for (i, element) in staff.elements.iter_mut().enumerate() {
        if element.is_line_break() {
            breaks += 1;
        }
        if current.len == 0 {
            current.first = i;
            current.system = breaks.min(last_system);
        }
        element.measure = Some(staff.measures.len());
        current.len += 1;

        if element.is_barline() {
            let number = current.number + 1;
            staff.measures.push(current);
            current = Measure { number, system: breaks.min(last_system), first: i + 1, len: 0 };
        }
    }

    if current.len > 0 || staff.measures.is_empty() {
        staff.measures.push(current);
    }

    log::trace!(
        "staff {staff_index}: rebuilt {} measures over {} elements",
        staff.measures.len(),
        staff.elements.len()
    );
    observer.measures_rebuilt(staff_index, staff);
}
