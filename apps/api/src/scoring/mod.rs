// Scoring and report composition.
// Pure functions only: no I/O, no clock reads outside `compose`. Rendering lives in `render`.

pub mod aggregate;
pub mod compose;
pub mod feedback;
pub mod recommend;

pub use aggregate::AnswerSet;
pub use compose::{compose, Profile, ReportDocument};
