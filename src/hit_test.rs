//! Click-to-position resolution: screen coordinates to staff positions
//! and measures, using the geometry of the last render.

use crate::config::EditorConfig;
use crate::model::{Staff, System};

/// Lines per staff.
const STAFF_LINES: usize = 5;

/// A vertical click resolved onto a staff.
#[derive(Debug, Clone, PartialEq)]
pub struct LineHit {
    pub system: usize,
    pub staff: usize,
    /// Index into `positions`; 0 is the topmost ledger line considered
    pub index: usize,
    /// Every line and space position of the expanded staff, top to bottom
    pub positions: Vec<f64>,
}

/// Extend five staff lines by `extra` ledger lines on each side, spaced
/// by the staff's average line gap.
pub fn expand_staff_lines(lines: &[f64], extra: usize) -> Vec<f64> {
    let (Some(&first), Some(&last)) = (lines.first(), lines.last()) else {
        return Vec::new();
    };
    let gap = if lines.len() > 1 {
        (last - first) / (lines.len() - 1) as f64
    } else {
        0.0
    };
    let mut expanded = Vec::with_capacity(lines.len() + 2 * extra);
    expanded.extend((1..=extra).rev().map(|k| first - k as f64 * gap));
    expanded.extend_from_slice(lines);
    expanded.extend((1..=extra).map(|k| last + k as f64 * gap));
    expanded
}

/// Insert the midpoint between every adjacent pair, so the list holds
/// spaces as well as lines.
pub fn interpolate_half_lines(lines: &[f64]) -> Vec<f64> {
    let mut positions = Vec::with_capacity(lines.len() * 2);
    for pair in lines.windows(2) {
        positions.push(pair[0]);
        positions.push((pair[0] + pair[1]) / 2.0);
    }
    if let Some(&last) = lines.last() {
        positions.push(last);
    }
    positions
}

/// Resolve a vertical coordinate to a line/space position on the first
/// staff whose expanded span (plus the snap threshold) contains it.
pub fn staff_line_at(y: f64, systems: &[System], config: &EditorConfig) -> Option<LineHit> {
    let threshold = config.snap_threshold as f64;
    for (system_idx, system) in systems.iter().enumerate() {
        for (staff_idx, lines) in system.staff_lines.iter().enumerate() {
            for group in lines.chunks(STAFF_LINES) {
                let positions =
                    interpolate_half_lines(&expand_staff_lines(group, config.extra_ledger_lines));
                let (Some(&min), Some(&max)) = (positions.first(), positions.last()) else {
                    continue;
                };
                if y < min - threshold || y > max + threshold {
                    continue;
                }
                let index = closest_index(&positions, y);
                return Some(LineHit { system: system_idx, staff: staff_idx, index, positions });
            }
        }
    }
    None
}

fn closest_index(positions: &[f64], y: f64) -> usize {
    let mut best = 0;
    for (i, &p) in positions.iter().enumerate() {
        if (p - y).abs() < (positions[best] - y).abs() {
            best = i;
        }
    }
    best
}

/// Find the measure of `staff` whose hit rectangle contains the click.
///
/// Each measure spans horizontally from the previous barline (or the left
/// edge when it starts a system) to its own closing barline, and
/// vertically over the closing barline plus the ledger-line allowance.
/// Elements after the last barline form an open-ended measure.
pub fn measure_at(
    x: f64,
    y: f64,
    staff: &Staff,
    staff_idx: usize,
    systems: &[System],
    config: &EditorConfig,
) -> Option<usize> {
    let threshold = config.snap_threshold as f64;
    let extra = config.extra_ledger_lines as f64;
    let measures = staff.measures();

    let mut prev: Option<usize> = None;
    for (idx, element) in staff.elements.iter().enumerate() {
        if !element.is_barline() {
            continue;
        }
        let (Some(bounds), Some(measure)) = (element.bounds, element.measure()) else {
            continue;
        };
        let left = left_edge(staff, prev, measure);
        let allowance = (bounds.bottom - bounds.top) / 4.0 * extra + threshold;
        if x >= left
            && x <= bounds.right
            && y >= bounds.top - allowance
            && y <= bounds.bottom + allowance
        {
            return Some(measure);
        }
        prev = Some(idx);
    }

    // Open-ended measure after the last barline
    let first_after = prev.map_or(0, |p| p + 1);
    let open = staff.elements.get(first_after)?;
    let measure = open.measure()?;
    let left = left_edge(staff, prev, measure);
    let system = measures.get(measure)?.system;
    let last_bar = prev.map(|p| &staff.elements[p]);
    let bar_system = last_bar
        .and_then(|bar| bar.measure())
        .and_then(|m| measures.get(m))
        .map(|m| m.system);
    let (top, bottom) = match last_bar.and_then(|bar| bar.bounds) {
        Some(bar) if bar_system == Some(system) => (bar.top, bar.bottom),
        _ => {
            // The open measure continues on another system: use its staff lines
            let lines = systems.get(system)?.staff_lines.get(staff_idx)?;
            let top = lines.iter().copied().fold(f64::INFINITY, f64::min);
            let bottom = lines.iter().copied().fold(f64::NEG_INFINITY, f64::max);
            (top, bottom)
        }
    };
    let allowance = (bottom - top) / 4.0 * extra + threshold;
    if x >= left && y >= top - allowance && y <= bottom + allowance {
        return Some(measure);
    }
    None
}

/// Left bound of a measure: the previous barline's right edge, or 0 when
/// the measure opens a system.
fn left_edge(staff: &Staff, prev_barline: Option<usize>, measure: usize) -> f64 {
    let Some(prev) = prev_barline else { return 0.0 };
    let bar = &staff.elements[prev];
    let measures = staff.measures();
    let prev_system = bar.measure().and_then(|m| measures.get(m)).map(|m| m.system);
    let this_system = measures.get(measure).map(|m| m.system);
    if prev_system != this_system {
        return 0.0;
    }
    bar.bounds.map_or(0.0, |b| b.right)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::*;
    use crate::renderer::{LayoutRenderer, Renderer};
    use crate::rebuild::rebuild_measures;

    fn one_staff(lines: Vec<f64>) -> Vec<System> {
        vec![System { y: lines[0], staff_lines: vec![lines] }]
    }

    #[test]
    fn expands_and_interpolates() {
        let expanded = expand_staff_lines(&[100.0, 110.0, 120.0, 130.0, 140.0], 1);
        assert_eq!(expanded, vec![90.0, 100.0, 110.0, 120.0, 130.0, 140.0, 150.0]);
        let positions = interpolate_half_lines(&expanded);
        assert_eq!(positions.len(), 13);
        assert_eq!(&positions[..3], &[90.0, 95.0, 100.0]);
    }

    #[test]
    fn click_just_above_ledger_area_snaps_to_it() {
        let config = EditorConfig { snap_threshold: 5, extra_ledger_lines: 1, ..EditorConfig::default() };
        let systems = one_staff(vec![100.0, 110.0, 120.0, 130.0, 140.0]);

        let hit = staff_line_at(86.0, &systems, &config).expect("inside threshold");
        assert_eq!(hit.index, 0);
        assert_eq!(hit.positions[hit.index], 90.0);

        let hit = staff_line_at(123.0, &systems, &config).unwrap();
        assert_eq!(hit.positions[hit.index], 125.0);

        assert!(staff_line_at(84.0, &systems, &config).is_none());
        assert!(staff_line_at(156.0, &systems, &config).is_none());
    }

    #[test]
    fn second_staff_of_a_system() {
        let config = EditorConfig { extra_ledger_lines: 0, ..EditorConfig::default() };
        let systems = vec![System {
            y: 0.0,
            staff_lines: vec![
                vec![0.0, 10.0, 20.0, 30.0, 40.0],
                vec![100.0, 110.0, 120.0, 130.0, 140.0],
            ],
        }];
        let hit = staff_line_at(110.0, &systems, &config).unwrap();
        assert_eq!((hit.system, hit.staff, hit.index), (0, 1, 2));
    }

    fn rendered_two_measures() -> Score {
        let mut staff = Staff::new(vec![
            Symbol::clef(Clef::TREBLE),
            Symbol::rest(crate::duration::Duration::WHOLE),
            Symbol::barline(BarStyle::Regular),
            Symbol::rest(crate::duration::Duration::WHOLE),
            Symbol::barline(BarStyle::Final),
        ]);
        rebuild_measures(&mut staff, 0, 1, &mut ());
        let mut score = Score::new(vec![staff]);
        LayoutRenderer.render(&mut score).unwrap();
        score
    }

    #[test]
    fn measure_boxes_follow_barlines() {
        let config = EditorConfig::default();
        let score = rendered_two_measures();
        let staff = &score.staves[0];
        // barlines drawn at 81..82 and 117..118
        assert_eq!(measure_at(10.0, 80.0, staff, 0, &score.systems, &config), Some(0));
        assert_eq!(measure_at(82.0, 80.0, staff, 0, &score.systems, &config), Some(0));
        assert_eq!(measure_at(100.0, 80.0, staff, 0, &score.systems, &config), Some(1));
        assert_eq!(measure_at(200.0, 80.0, staff, 0, &score.systems, &config), None);
        // allowance: 40 / 4 * 2 ledger lines + 5 threshold = 25
        assert_eq!(measure_at(100.0, 36.0, staff, 0, &score.systems, &config), Some(1));
        assert_eq!(measure_at(100.0, 34.0, staff, 0, &score.systems, &config), None);
    }

    #[test]
    fn open_measure_after_last_barline() {
        let config = EditorConfig::default();
        let mut score = rendered_two_measures();
        score.staves[0].elements.push(Symbol::rest(crate::duration::Duration::HALF));
        rebuild_measures(&mut score.staves[0], 0, 1, &mut ());
        LayoutRenderer.render(&mut score).unwrap();
        let staff = &score.staves[0];
        assert_eq!(measure_at(500.0, 80.0, staff, 0, &score.systems, &config), Some(2));
    }

    #[test]
    fn open_measure_on_the_next_system_uses_that_systems_staff() {
        let config = EditorConfig::default();
        let mut staff = Staff::new(vec![
            Symbol::clef(Clef::TREBLE),
            Symbol::rest(crate::duration::Duration::WHOLE),
            Symbol::barline(BarStyle::Regular),
            Symbol::line_break(),
            Symbol::rest(crate::duration::Duration::WHOLE),
        ]);
        rebuild_measures(&mut staff, 0, 2, &mut ());
        let mut score = Score::new(vec![staff]);
        LayoutRenderer.render(&mut score).unwrap();
        assert_eq!(score.systems.len(), 2);
        assert_eq!(score.systems[1].staff_lines[0], vec![180.0, 190.0, 200.0, 210.0, 220.0]);

        let staff = &score.staves[0];
        assert_eq!(staff.measures()[1].system, 1);
        // Same x on the first system still hits the first measure
        assert_eq!(measure_at(30.0, 80.0, staff, 0, &score.systems, &config), Some(0));
        assert_eq!(measure_at(30.0, 200.0, staff, 0, &score.systems, &config), Some(1));
        // allowance below the second staff: 220 + 25
        assert_eq!(measure_at(30.0, 244.0, staff, 0, &score.systems, &config), Some(1));
        assert_eq!(measure_at(30.0, 250.0, staff, 0, &score.systems, &config), None);
    }
}
