//! Welding of independently built shells into shared topology.

mod bubble;
mod engine;
mod orient;
mod union_find;
pub(crate) mod weld;

pub use engine::Stitch;

/// Stitch configuration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StitchFlags {
    /// Require a closed shell; otherwise the result is reported incomplete.
    pub form_solid_body: bool,
    /// Upper bound on every vertex's matching bubble.
    pub stitch_precision: f64,
}

impl Default for StitchFlags {
    fn default() -> Self {
        Self {
            form_solid_body: true,
            stitch_precision: 1e-5,
        }
    }
}

impl StitchFlags {
    /// Sets whether an open result is reported as incomplete.
    #[must_use]
    pub fn with_form_solid_body(mut self, form_solid_body: bool) -> Self {
        self.form_solid_body = form_solid_body;
        self
    }

    /// Sets the upper bound on matching bubbles.
    #[must_use]
    pub fn with_stitch_precision(mut self, stitch_precision: f64) -> Self {
        self.stitch_precision = stitch_precision;
        self
    }
}
