//! Core analysis pipeline: scan source for spec citations and step comments,
//! parse canonical algorithm steps, match one against the other, and compute
//! coverage.
//!
//! Submodules correspond one-to-one with the pipeline stages: [`normalize`]
//! (text normalisation and similarity), [`scanner`] (document scanning),
//! [`steps`] (algorithm step tree parsing), [`scope`] (scope assignment),
//! [`matcher`] (match classification), [`coverage`] (coverage computation).

pub mod coverage;
pub mod matcher;
pub mod normalize;
pub mod scanner;
pub mod scope;
pub mod steps;

pub use coverage::CoverageResult;
pub use matcher::MatchResult;
pub use scanner::{StepComment, UrlMatch};
pub use steps::AlgorithmStep;

/// Result of validating one step comment against its cited algorithm.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepValidation {
    /// The step comment found in source.
    pub step: StepComment,
    /// How well it matched the canonical spec text.
    pub result: MatchResult,
    /// The canonical step text it was matched against, empty if not found.
    pub spec_text: String,
    /// The algorithm's anchor name.
    pub algo_name: String,
}
