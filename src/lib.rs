//! scoreflow — measure re-flow, note insertion and system layout engine
//! for a score editor.
//!
//! A [`Score`] holds staves of flat symbol sequences. Editing operations
//! (inserting at a click, adding or removing measures, shifting a pitch)
//! keep every measure's rhythmic total equal to its time signature, then
//! re-wrap the staves into systems that fit the viewport.
//!
//! # Example
//! ```
//! use scoreflow::{Clef, Duration, Editor, EditorConfig, InsertRequest, Key, LayoutRenderer, Score, TimeSignature};
//!
//! let config = EditorConfig::default();
//! let score = Score::blank(&[Clef::TREBLE], TimeSignature::default(), Key::default(), &config).unwrap();
//! let mut editor = Editor::new(score, config, LayoutRenderer, 800.0).unwrap();
//!
//! let outcome = editor
//!     .insert_at(&InsertRequest {
//!         x: 90.0,
//!         y: 60.0,
//!         viewport_width: 800.0,
//!         duration: Some(Duration::QUARTER),
//!         is_rest: false,
//!     })
//!     .unwrap();
//! println!("{outcome:?}");
//! ```

pub mod config;
pub mod duration;
pub mod editor;
pub mod error;
pub mod hit_test;
pub mod insertion;
pub mod measure_edit;
pub mod model;
pub mod pitch;
pub mod rebuild;
pub mod reflow;
pub mod renderer;

pub use config::EditorConfig;
pub use duration::{Duration, Proportion};
pub use editor::Editor;
pub use error::EditError;
pub use insertion::{insert_at, IgnoreReason, InsertOutcome, InsertRequest};
pub use measure_edit::{add_measure, clear_symbol, remove_measure, shift_pitch, Selection};
pub use model::*;
pub use rebuild::{rebuild_measures, StaffObserver};
pub use reflow::reflow_score;
pub use renderer::{score_to_svg, LayoutRenderer, Renderer};

/// Convert a score, geometry included, to pretty JSON.
pub fn score_to_json(score: &Score) -> Result<String, EditError> {
    Ok(serde_json::to_string_pretty(score)?)
}

/// Read back a score written by [`score_to_json`].
pub fn score_from_json(json: &str) -> Result<Score, EditError> {
    Ok(serde_json::from_str(json)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_keeps_measures_and_render_kinds() {
        let config = EditorConfig::default();
        let mut score = Score::blank(&[Clef::ALTO], TimeSignature::new(6, 8), Key { fifths: -2 }, &config).unwrap();
        LayoutRenderer.render(&mut score).unwrap();

        let json = score_to_json(&score).unwrap();
        let back = score_from_json(&json).unwrap();
        assert_eq!(back.staves[0].elements, score.staves[0].elements);
        assert_eq!(back.staves[0].measures(), score.staves[0].measures());
        assert_eq!(back.systems, score.systems);
    }

    #[test]
    fn out_of_range_duration_in_json_is_rejected() {
        let config = EditorConfig::default();
        let score = Score::blank(&[Clef::TREBLE], TimeSignature::default(), Key::default(), &config).unwrap();
        let json = score_to_json(&score).unwrap();
        assert!(json.contains("\"power\": 0"));

        let corrupted = json.replacen("\"power\": 0", "\"power\": 70", 1);
        assert!(matches!(score_from_json(&corrupted), Err(EditError::Json(_))));
    }

    #[test]
    fn malformed_json_is_an_error() {
        assert!(matches!(score_from_json("{ not json"), Err(EditError::Json(_))));
    }
}
