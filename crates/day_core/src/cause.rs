use std::fmt;

use serde::{Deserialize, Serialize};

/// Reason codes attached to every change recorded in a [`crate::diff::Diff`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Code {
    AllocationDrain,
    AllocationRecovery,
    OvernightRecovery,
    StressDecay,
    TensionFatigue,
    TensionUnfinishedAssignment,
    AllocationVector,
    ChoiceFlagVector,
    ChoiceOutcome,
    ArcPayoff,
    DispositionCost,
}

impl Code {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AllocationDrain => "allocation_drain",
            Self::AllocationRecovery => "allocation_recovery",
            Self::OvernightRecovery => "overnight_recovery",
            Self::StressDecay => "stress_decay",
            Self::TensionFatigue => "tension_fatigue",
            Self::TensionUnfinishedAssignment => "tension_unfinished_assignment",
            Self::AllocationVector => "allocation_vector",
            Self::ChoiceFlagVector => "choice_flag_vector",
            Self::ChoiceOutcome => "choice_outcome",
            Self::ArcPayoff => "arc_payoff",
            Self::DispositionCost => "disposition_cost",
        }
    }
}

impl fmt::Display for Code {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Structured cause entry used for diagnostics and auditing.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Entry {
    pub target: String,
    pub code: Code,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub note: Option<String>,
}

impl Entry {
    pub fn new<T: Into<String>>(target: T, code: Code, note: Option<String>) -> Self {
        Self {
            target: target.into(),
            code,
            note,
        }
    }
}
