//! Editor facade: owns a score together with its configuration, renderer
//! and observers, and exposes one method per editing operation.
//!
//! Every method leaves the score rendered and its measures rebuilt.

use crate::config::EditorConfig;
use crate::error::EditError;
use crate::insertion::{self, InsertOutcome, InsertRequest};
use crate::measure_edit::{self, Selection};
use crate::model::{Score, Staff};
use crate::rebuild::StaffObserver;
use crate::reflow::reflow_score;
use crate::renderer::{score_to_svg, Renderer};

/// Fans a rebuild notification out to every subscriber.
#[derive(Default)]
struct Observers(Vec<Box<dyn StaffObserver>>);

impl StaffObserver for Observers {
    fn measures_rebuilt(&mut self, staff_index: usize, staff: &Staff) {
        for observer in &mut self.0 {
            observer.measures_rebuilt(staff_index, staff);
        }
    }
}

pub struct Editor<R: Renderer> {
    score: Score,
    config: EditorConfig,
    renderer: R,
    observers: Observers,
    viewport_width: f64,
}

impl<R: Renderer> Editor<R> {
    /// Validate the configuration, then render and re-flow `score`.
    pub fn new(
        score: Score,
        config: EditorConfig,
        renderer: R,
        viewport_width: f64,
    ) -> Result<Self, EditError> {
        config.validate()?;
        let mut editor = Self {
            score,
            config,
            renderer,
            observers: Observers::default(),
            viewport_width,
        };
        editor.renderer.render(&mut editor.score)?;
        editor.reflow()?;
        Ok(editor)
    }

    pub fn score(&self) -> &Score {
        &self.score
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn viewport_width(&self) -> f64 {
        self.viewport_width
    }

    /// Give the score back, e.g. to hand it to a serializer.
    pub fn into_score(self) -> Score {
        self.score
    }

    /// Register an observer for measure rebuilds.
    pub fn subscribe(&mut self, observer: Box<dyn StaffObserver>) {
        self.observers.0.push(observer);
    }

    /// Change the viewport width and re-flow.
    pub fn set_viewport_width(&mut self, width: f64) -> Result<(), EditError> {
        self.viewport_width = width;
        self.reflow()
    }

    /// Insert a note or rest at a click position.
    ///
    /// The request's own viewport width is used for the re-flow.
    pub fn insert_at(&mut self, request: &InsertRequest) -> Result<InsertOutcome, EditError> {
        self.viewport_width = request.viewport_width;
        insertion::insert_at(
            &mut self.score,
            &mut self.renderer,
            &self.config,
            request,
            &mut self.observers,
        )
    }

    pub fn add_measure(&mut self, selection: Option<Selection>) -> Result<(), EditError> {
        measure_edit::add_measure(
            &mut self.score,
            &mut self.renderer,
            selection,
            self.viewport_width,
            &mut self.observers,
        )
    }

    pub fn remove_measure(&mut self, selection: Option<Selection>) -> Result<bool, EditError> {
        measure_edit::remove_measure(
            &mut self.score,
            &mut self.renderer,
            &self.config,
            selection,
            self.viewport_width,
            &mut self.observers,
        )
    }

    /// Shift the selected note's pitch; re-renders when it moved.
    pub fn shift_pitch(&mut self, selection: Selection, steps: isize) -> Result<bool, EditError> {
        let moved = measure_edit::shift_pitch(&mut self.score, &self.config, selection, steps)?;
        if moved {
            self.renderer.render(&mut self.score)?;
        }
        Ok(moved)
    }

    pub fn clear_symbol(&mut self, selection: Selection) -> Result<bool, EditError> {
        measure_edit::clear_symbol(
            &mut self.score,
            &mut self.renderer,
            selection,
            self.viewport_width,
            &mut self.observers,
        )
    }

    pub fn reflow(&mut self) -> Result<(), EditError> {
        reflow_score(&mut self.score, &mut self.renderer, self.viewport_width, &mut self.observers)
    }

    pub fn to_svg(&self) -> String {
        score_to_svg(&self.score, self.viewport_width)
    }

    pub fn to_json(&self) -> Result<String, EditError> {
        crate::score_to_json(&self.score)
    }
}
