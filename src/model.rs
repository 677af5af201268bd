//! Data model for an editable score.
//!
//! A staff is a flat, temporally ordered sequence of symbols and is the
//! single source of truth. Measures and systems are derived from it:
//! measures are rebuilt from scratch after every edit, systems are
//! produced by the renderer.

use std::fmt;
use std::ops::Range;

use serde::{Deserialize, Serialize};

use crate::config::EditorConfig;
use crate::duration::{self, Duration, Proportion};
use crate::error::EditError;
use crate::rebuild::rebuild_measures;

/// A complete score: staves plus the systems they were last rendered into.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Score {
    pub staves: Vec<Staff>,
    /// Rendered line groupings; replaced on every render pass
    pub systems: Vec<System>,
}

/// One rendered line of music.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct System {
    /// Y coordinate of the system's top staff line
    pub y: f64,
    /// Staff-line y coordinates, indexed by staff (five per staff, top first)
    pub staff_lines: Vec<Vec<f64>>,
}

/// An ordered sequence of symbols for one instrument or voice.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Staff {
    pub elements: Vec<Symbol>,
    pub(crate) measures: Vec<Measure>,
}

/// A contiguous run of staff elements closed by a barline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Measure {
    /// 1-based, contiguous within a staff
    pub number: u32,
    /// Index into `Score::systems`
    pub system: usize,
    /// Index of the first element in `Staff::elements`
    pub first: usize,
    /// Number of elements (closing barline included)
    pub len: usize,
}

/// Axis-aligned rendered bounds of a symbol.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub left: f64,
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
}

impl BoundingBox {
    pub fn mid_x(&self) -> f64 {
        (self.left + self.right) / 2.0
    }
}

/// One musical symbol placed on a staff.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Symbol {
    pub kind: SymbolKind,
    /// Owning measure (index into `Staff::measures`), set by the rebuild
    pub(crate) measure: Option<usize>,
    /// Set by the renderer
    pub bounds: Option<BoundingBox>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SymbolKind {
    Note(Note),
    Rest(Rest),
    Barline(Barline),
    Clef(Clef),
    Time(TimeSignature),
    Key(Key),
    /// Print suggestion starting a new system
    LineBreak,
}

/// How a note or rest is drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum RenderKind {
    #[default]
    Standard,
    /// Rest glyph chosen by the editor rather than the file
    Correct,
    /// Transient stand-in laid out with note-glyph metrics
    Placeholder,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Note {
    pub pitch: Pitch,
    pub duration: Duration,
    pub stem: StemDirection,
    pub render: RenderKind,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rest {
    pub duration: Duration,
    pub render: RenderKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StemDirection {
    Up,
    Down,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Step {
    C,
    D,
    E,
    F,
    G,
    A,
    B,
}

impl Step {
    pub const ALL: [Step; 7] = [Step::C, Step::D, Step::E, Step::F, Step::G, Step::A, Step::B];

    pub fn letter(&self) -> char {
        match self {
            Step::C => 'C',
            Step::D => 'D',
            Step::E => 'E',
            Step::F => 'F',
            Step::G => 'G',
            Step::A => 'A',
            Step::B => 'B',
        }
    }
}

/// Diatonic pitch with an optional chromatic alteration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pitch {
    pub step: Step,
    /// Middle C is C4
    pub octave: i8,
    /// -1 flat, 1 sharp
    pub alter: Option<i8>,
}

impl Pitch {
    pub fn natural(step: Step, octave: i8) -> Self {
        Self { step, octave, alter: None }
    }

    /// Diatonic steps above C0.
    pub fn diatonic_index(&self) -> i32 {
        self.octave as i32 * 7 + self.step as i32
    }
}

impl fmt::Display for Pitch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.step.letter())?;
        match self.alter {
            Some(a) if a > 0 => f.write_str(&"#".repeat(a as usize))?,
            Some(a) if a < 0 => f.write_str(&"b".repeat(a.unsigned_abs() as usize))?,
            _ => {}
        }
        write!(f, "{}", self.octave)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum BarStyle {
    #[default]
    Regular,
    Double,
    /// Light-heavy closing barline
    Final,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Barline {
    pub style: BarStyle,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ClefSign {
    G,
    F,
    C,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Clef {
    pub sign: ClefSign,
    /// Staff line the clef sits on, 1 = bottom
    pub line: u8,
}

impl Clef {
    pub const TREBLE: Clef = Clef { sign: ClefSign::G, line: 2 };
    pub const BASS: Clef = Clef { sign: ClefSign::F, line: 4 };
    pub const ALTO: Clef = Clef { sign: ClefSign::C, line: 3 };
    pub const TENOR: Clef = Clef { sign: ClefSign::C, line: 4 };
}

impl Default for Clef {
    fn default() -> Self {
        Clef::TREBLE
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeSignature {
    pub beats: u32,
    pub beat_type: u32,
}

impl TimeSignature {
    pub fn new(beats: u32, beat_type: u32) -> Self {
        Self { beats, beat_type }
    }

    /// Total measure length as a fraction of a whole note.
    pub fn proportion(&self) -> Proportion {
        Proportion::new(self.beats as i64, self.beat_type.max(1) as i64)
    }
}

impl Default for TimeSignature {
    fn default() -> Self {
        Self { beats: 4, beat_type: 4 }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Key {
    /// Sharps (positive) or flats (negative)
    pub fifths: i8,
}

// ═══════════════════════════════════════════════════════════════════════
// Symbol helpers
// ═══════════════════════════════════════════════════════════════════════

impl Symbol {
    pub fn new(kind: SymbolKind) -> Self {
        Self { kind, measure: None, bounds: None }
    }

    pub fn note(pitch: Pitch, duration: Duration, stem: StemDirection) -> Self {
        Self::new(SymbolKind::Note(Note {
            pitch,
            duration,
            stem,
            render: RenderKind::Standard,
        }))
    }

    pub fn rest(duration: Duration) -> Self {
        Self::new(SymbolKind::Rest(Rest { duration, render: RenderKind::Standard }))
    }

    /// Rest created by the editor itself.
    pub fn correct_rest(duration: Duration) -> Self {
        Self::new(SymbolKind::Rest(Rest { duration, render: RenderKind::Correct }))
    }

    pub fn barline(style: BarStyle) -> Self {
        Self::new(SymbolKind::Barline(Barline { style }))
    }

    pub fn clef(clef: Clef) -> Self {
        Self::new(SymbolKind::Clef(clef))
    }

    pub fn time(time: TimeSignature) -> Self {
        Self::new(SymbolKind::Time(time))
    }

    pub fn key(key: Key) -> Self {
        Self::new(SymbolKind::Key(key))
    }

    pub fn line_break() -> Self {
        Self::new(SymbolKind::LineBreak)
    }

    /// Index of the owning measure after the last rebuild.
    pub fn measure(&self) -> Option<usize> {
        self.measure
    }

    pub fn is_barline(&self) -> bool {
        matches!(self.kind, SymbolKind::Barline(_))
    }

    pub fn is_line_break(&self) -> bool {
        matches!(self.kind, SymbolKind::LineBreak)
    }

    pub fn duration(&self) -> Option<Duration> {
        match &self.kind {
            SymbolKind::Note(n) => Some(n.duration),
            SymbolKind::Rest(r) => Some(r.duration),
            _ => None,
        }
    }

    /// Rhythmic weight; zero for everything that isn't a note or rest.
    pub fn proportion(&self) -> Proportion {
        self.duration()
            .map_or(Proportion::from_integer(0), |d| d.proportion())
    }

    pub fn render_kind(&self) -> Option<RenderKind> {
        match &self.kind {
            SymbolKind::Note(n) => Some(n.render),
            SymbolKind::Rest(r) => Some(r.render),
            _ => None,
        }
    }

    pub fn is_placeholder(&self) -> bool {
        self.render_kind() == Some(RenderKind::Placeholder)
    }
}

// ═══════════════════════════════════════════════════════════════════════
// Staff queries
// ═══════════════════════════════════════════════════════════════════════

impl Staff {
    pub fn new(elements: Vec<Symbol>) -> Self {
        Self { elements, measures: Vec::new() }
    }

    pub fn measures(&self) -> &[Measure] {
        &self.measures
    }

    /// Element range of a measure, located through the back-references.
    pub fn measure_range(&self, measure: usize) -> Option<Range<usize>> {
        let len = self.measures.get(measure)?.len;
        let start = self
            .elements
            .iter()
            .position(|e| e.measure == Some(measure))?;
        Some(start..start + len)
    }

    /// Index of the measure carrying a given 1-based number.
    pub fn measure_by_number(&self, number: u32) -> Option<usize> {
        self.measures.iter().position(|m| m.number == number)
    }

    /// Sum of note and rest proportions inside a measure.
    pub fn measure_proportion(&self, measure: usize) -> Option<Proportion> {
        let range = self.measure_range(measure)?;
        Some(
            self.elements[range]
                .iter()
                .map(Symbol::proportion)
                .fold(Proportion::from_integer(0), |acc, p| acc + p),
        )
    }

    /// Last time signature among the elements before `end`.
    pub fn governing_time(&self, end: usize) -> Option<TimeSignature> {
        self.elements[..end.min(self.elements.len())]
            .iter()
            .rev()
            .find_map(|e| match e.kind {
                SymbolKind::Time(t) => Some(t),
                _ => None,
            })
    }

    /// Last clef among the elements before `end`.
    pub fn governing_clef(&self, end: usize) -> Option<Clef> {
        self.elements[..end.min(self.elements.len())]
            .iter()
            .rev()
            .find_map(|e| match e.kind {
                SymbolKind::Clef(c) => Some(c),
                _ => None,
            })
    }

    pub fn line_break_count(&self) -> usize {
        self.elements.iter().filter(|e| e.is_line_break()).count()
    }

    /// Turn editor rests back into plain rests for a serializer.
    pub fn normalize_rests(&mut self) {
        for element in &mut self.elements {
            if let SymbolKind::Rest(rest) = &mut element.kind {
                rest.render = RenderKind::Standard;
            }
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════
// Score construction and access
// ═══════════════════════════════════════════════════════════════════════

impl Score {
    pub fn new(staves: Vec<Staff>) -> Self {
        Self { staves, systems: Vec::new() }
    }

    /// A score with one staff per clef, each holding
    /// `config.default_measure_count` measures of rests and a final barline.
    pub fn blank(
        clefs: &[Clef],
        time: TimeSignature,
        key: Key,
        config: &EditorConfig,
    ) -> Result<Self, EditError> {
        let rests = duration::fill(time.proportion())?;
        let mut staves = Vec::with_capacity(clefs.len());
        for (idx, &clef) in clefs.iter().enumerate() {
            let mut elements = vec![Symbol::clef(clef), Symbol::key(key), Symbol::time(time)];
            for m in 0..config.default_measure_count {
                elements.extend(rests.iter().map(|&d| Symbol::correct_rest(d)));
                let style = if m + 1 == config.default_measure_count {
                    BarStyle::Final
                } else {
                    BarStyle::Regular
                };
                elements.push(Symbol::barline(style));
            }
            let mut staff = Staff::new(elements);
            rebuild_measures(&mut staff, idx, 1, &mut ());
            staves.push(staff);
        }
        Ok(Self::new(staves))
    }

    pub fn staff(&self, idx: usize) -> Result<&Staff, EditError> {
        self.staves.get(idx).ok_or(EditError::StaffOutOfRange(idx))
    }

    pub fn staff_mut(&mut self, idx: usize) -> Result<&mut Staff, EditError> {
        self.staves.get_mut(idx).ok_or(EditError::StaffOutOfRange(idx))
    }

    pub fn normalize_rests(&mut self) {
        for staff in &mut self.staves {
            staff.normalize_rests();
        }
    }
}
