use thiserror::Error;

/// Problems found while validating authored content.
///
/// Gameplay functions never fail; these errors only surface when content is
/// loaded, so broken data is caught before it can gate anything.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ContentError {
    #[error("storylet slug {0:?} is declared more than once")]
    DuplicateStorylet(String),
    #[error("storylet {0:?} has a malformed requirement")]
    MalformedRequirement(String),
    #[error("arc {0:?} is declared more than once")]
    DuplicateArc(String),
    #[error("arc {0:?} declares no steps")]
    EmptyArc(String),
    #[error("arc {arc_id:?} step {step_index} costs zero slots")]
    ZeroSlotStep { arc_id: String, step_index: usize },
    #[error("experiment id must not be empty")]
    EmptyExperimentId,
    #[error("experiment {0:?} is declared more than once")]
    DuplicateExperiment(String),
}
