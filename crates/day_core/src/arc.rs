//! Multi-day narrative arc progression.
//!
//! A [`UserArc`] moves `active -> completed | abandoned`. Every gate here answers
//! with `Option`/`bool`: an arc that cannot move today simply stays put and is
//! asked again tomorrow.

use std::borrow::Cow;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::cause::Code;
use crate::diff::Diff;
use crate::error::ContentError;
use crate::reduce::apply_outcome;
use crate::state::{DailyState, Outcome};
use crate::storylet::{ContentPool, RunHistory};

pub const DEFAULT_STEP_COST_SLOTS: u32 = 1;
pub const MAX_OFFER_TONE: u32 = 3;
pub const MAX_HESITATION_SURCHARGE: i32 = 3;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArcStatus {
    Active,
    Completed,
    Abandoned,
}

/// A player's progress through one arc.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserArc {
    pub arc_id: String,
    pub status: ArcStatus,
    pub step_index: usize,
    pub started_day_index: u32,
    pub last_advanced_day_index: Option<u32>,
}

fn default_cost_slots() -> u32 {
    DEFAULT_STEP_COST_SLOTS
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArcStep {
    pub slug: String,
    /// Minimum days since the previous advance (or the arc start).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_day_gap: Option<u32>,
    #[serde(default)]
    pub due_offset_days: u32,
    #[serde(default)]
    pub expires_after_days: u32,
    #[serde(default = "default_cost_slots")]
    pub cost_slots: u32,
}

impl ArcStep {
    pub fn new(slug: impl Into<String>) -> Self {
        Self {
            slug: slug.into(),
            min_day_gap: None,
            due_offset_days: 0,
            expires_after_days: 0,
            cost_slots: DEFAULT_STEP_COST_SLOTS,
        }
    }

    pub fn with_min_day_gap(mut self, gap: u32) -> Self {
        self.min_day_gap = Some(gap);
        self
    }
}

/// Static arc content.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArcDefinition {
    pub arc_id: String,
    pub steps: Vec<ArcStep>,
    /// Applied once, when the final step is passed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payoff: Option<Outcome>,
}

impl ArcDefinition {
    pub fn validate(&self) -> Result<(), ContentError> {
        if self.steps.is_empty() {
            return Err(ContentError::EmptyArc(self.arc_id.clone()));
        }
        if let Some(step_index) = self.steps.iter().position(|step| step.cost_slots == 0) {
            return Err(ContentError::ZeroSlotStep {
                arc_id: self.arc_id.clone(),
                step_index,
            });
        }
        Ok(())
    }
}

/// The day's attention budget.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotBudget {
    pub used: u32,
    pub total: u32,
}

impl SlotBudget {
    pub fn has_capacity(&self, cost: u32) -> bool {
        has_slot_capacity(self.used, self.total, cost)
    }
}

/// Everything the gate reads besides the arc itself.
#[derive(Clone, Copy, Debug)]
pub struct ArcContext<'a> {
    pub current_day: u32,
    pub pool: &'a ContentPool,
    pub player_state: &'a Value,
    pub history: &'a RunHistory,
    /// `None` skips the slot check.
    pub slots: Option<SlotBudget>,
}

/// Why an arc did not advance today.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Blocked {
    NotActive(ArcStatus),
    AlreadyAdvancedToday,
    NoRemainingStep,
    BeforeAnchorDay { anchor: u32 },
    DayGapNotMet { required: u32, elapsed: u32 },
    ContentMissing(String),
    ContentIneligible(String),
    AlreadyConsumed(String),
    OutOfSlots { used: u32, total: u32, cost: u32 },
}

impl fmt::Display for Blocked {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotActive(status) => write!(f, "arc is {:?}", status),
            Self::AlreadyAdvancedToday => f.write_str("already advanced today"),
            Self::NoRemainingStep => f.write_str("no remaining step"),
            Self::BeforeAnchorDay { anchor } => write!(f, "current day precedes day {}", anchor),
            Self::DayGapNotMet { required, elapsed } => {
                write!(f, "needs {} day gap, {} elapsed", required, elapsed)
            }
            Self::ContentMissing(slug) => write!(f, "{} not in content pool", slug),
            Self::ContentIneligible(slug) => write!(f, "{} not eligible", slug),
            Self::AlreadyConsumed(slug) => write!(f, "{} already consumed", slug),
            Self::OutOfSlots { used, total, cost } => {
                write!(f, "slots {}+{} exceed {}", used, cost, total)
            }
        }
    }
}

/// Run every gate for the arc's current step, reporting the first failure.
pub fn step_gate<'d>(
    arc: &UserArc,
    definition: &'d ArcDefinition,
    ctx: &ArcContext<'_>,
) -> Result<&'d ArcStep, Blocked> {
    if arc.status != ArcStatus::Active {
        return Err(Blocked::NotActive(arc.status));
    }
    if arc.last_advanced_day_index == Some(ctx.current_day) {
        return Err(Blocked::AlreadyAdvancedToday);
    }
    let step = definition
        .steps
        .get(arc.step_index)
        .ok_or(Blocked::NoRemainingStep)?;

    let anchor = arc.last_advanced_day_index.unwrap_or(arc.started_day_index);
    let elapsed = ctx
        .current_day
        .checked_sub(anchor)
        .ok_or(Blocked::BeforeAnchorDay { anchor })?;
    let required = step.min_day_gap.unwrap_or(0);
    if elapsed < required {
        return Err(Blocked::DayGapNotMet { required, elapsed });
    }

    if !ctx.pool.contains(&step.slug) {
        return Err(Blocked::ContentMissing(step.slug.clone()));
    }
    if !ctx.pool.is_eligible(&step.slug, ctx.player_state) {
        return Err(Blocked::ContentIneligible(step.slug.clone()));
    }
    if ctx.history.is_consumed(&step.slug) {
        return Err(Blocked::AlreadyConsumed(step.slug.clone()));
    }
    if let Some(slots) = ctx.slots {
        if !slots.has_capacity(step.cost_slots) {
            return Err(Blocked::OutOfSlots {
                used: slots.used,
                total: slots.total,
                cost: step.cost_slots,
            });
        }
    }
    Ok(step)
}

/// The step the arc may play today, if any.
pub fn next_step<'d>(
    arc: &UserArc,
    definition: &'d ArcDefinition,
    ctx: &ArcContext<'_>,
) -> Option<&'d ArcStep> {
    match step_gate(arc, definition, ctx) {
        Ok(step) => Some(step),
        Err(reason) => {
            debug!(arc = %arc.arc_id, day = ctx.current_day, %reason, "arc step gated");
            None
        }
    }
}

/// Open an arc for the player when its first step is playable today.
pub fn start_arc(definition: &ArcDefinition, ctx: &ArcContext<'_>) -> Option<UserArc> {
    let candidate = UserArc {
        arc_id: definition.arc_id.clone(),
        status: ArcStatus::Active,
        step_index: 0,
        started_day_index: ctx.current_day,
        last_advanced_day_index: None,
    };
    next_step(&candidate, definition, ctx)?;
    Some(candidate)
}

/// Result of a successful advance.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ArcAdvance {
    pub arc: UserArc,
    pub played_slug: Option<String>,
    pub state: DailyState,
    /// Payoff changes; empty unless the arc completed.
    pub diff: Diff,
    pub slots_used: Option<u32>,
}

/// Advance the arc by one step if every gate passes.
///
/// Passing the final step applies the definition's payoff to `state` and marks
/// the arc completed. An active arc whose index already sits past the last step
/// completes on its next eligible day without playing content.
pub fn advance_arc(
    arc: &UserArc,
    definition: &ArcDefinition,
    state: &DailyState,
    ctx: &ArcContext<'_>,
) -> Option<ArcAdvance> {
    let mut next = arc.clone();
    let (played_slug, slots_used) = match step_gate(arc, definition, ctx) {
        Ok(step) => (
            Some(step.slug.clone()),
            ctx.slots.map(|slots| slots.used.saturating_add(step.cost_slots)),
        ),
        Err(Blocked::NoRemainingStep) => (None, ctx.slots.map(|slots| slots.used)),
        Err(reason) => {
            debug!(arc = %arc.arc_id, day = ctx.current_day, %reason, "arc did not advance");
            return None;
        }
    };

    next.step_index = arc.step_index.saturating_add(usize::from(played_slug.is_some()));
    next.last_advanced_day_index = Some(ctx.current_day);

    let mut diff = Diff::default();
    let mut next_state = state.clone();
    if next.step_index >= definition.steps.len() {
        let (paid, payoff_diff) = apply_outcome(state, definition.payoff.as_ref(), Code::ArcPayoff);
        next_state = paid.into_owned();
        diff = payoff_diff;
        next.status = ArcStatus::Completed;
        debug!(arc = %arc.arc_id, day = ctx.current_day, "arc completed");
    }

    Some(ArcAdvance {
        arc: next,
        played_slug,
        state: next_state,
        diff,
        slots_used,
    })
}

/// Stop an active arc. Finished arcs are returned unchanged.
pub fn abandon_arc(arc: &UserArc) -> UserArc {
    let mut next = arc.clone();
    if next.status == ArcStatus::Active {
        next.status = ArcStatus::Abandoned;
    }
    next
}

/// Saturating urgency level used to pick offer copy: 0, 1, 2, then 3 forever.
pub fn offer_tone(times_shown: u32) -> u32 {
    times_shown.min(MAX_OFFER_TONE)
}

/// Add the hesitation surcharge to a disposition cost.
///
/// Non-positive hesitation leaves the cost untouched; otherwise stress grows by
/// `min(3, hesitation / 2)`.
pub fn apply_disposition_cost(cost: &Outcome, hesitation: i32) -> Outcome {
    if hesitation <= 0 {
        return cost.clone();
    }
    let surcharge = (hesitation / 2).min(MAX_HESITATION_SURCHARGE);
    Outcome {
        stress: cost.stress.saturating_add(surcharge),
        ..cost.clone()
    }
}

/// `slots_used + step_cost_slots <= slots_total`, evaluated without overflow.
pub fn has_slot_capacity(slots_used: u32, slots_total: u32, step_cost_slots: u32) -> bool {
    slots_used
        .checked_add(step_cost_slots)
        .is_some_and(|needed| needed <= slots_total)
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepSchedule {
    pub due_day: u32,
    pub expire_day: u32,
}

pub fn step_schedule(step: &ArcStep, current_day: u32) -> StepSchedule {
    let due_day = current_day.saturating_add(step.due_offset_days);
    StepSchedule {
        due_day,
        expire_day: due_day.saturating_add(step.expires_after_days),
    }
}

/// An ephemeral presentation of the arc's current step.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArcOffer {
    pub arc_id: String,
    pub step_index: usize,
    pub slug: String,
    pub due_day: u32,
    pub expires_on_day: u32,
    pub cost: Outcome,
    #[serde(default)]
    pub times_shown: u32,
}

impl ArcOffer {
    pub fn tone(&self) -> u32 {
        offer_tone(self.times_shown)
    }
}

pub fn is_offer_expired(offer: &ArcOffer, current_day: u32) -> bool {
    current_day > offer.expires_on_day
}

/// Build an offer for the arc's current step with an escalated cost.
pub fn build_offer(
    arc: &UserArc,
    definition: &ArcDefinition,
    current_day: u32,
    base_cost: &Outcome,
    hesitation: i32,
) -> Option<ArcOffer> {
    if arc.status != ArcStatus::Active {
        return None;
    }
    let step = definition.steps.get(arc.step_index)?;
    let schedule = step_schedule(step, current_day);
    Some(ArcOffer {
        arc_id: arc.arc_id.clone(),
        step_index: arc.step_index,
        slug: step.slug.clone(),
        due_day: schedule.due_day,
        expires_on_day: schedule.expire_day,
        cost: apply_disposition_cost(base_cost, hesitation),
        times_shown: 0,
    })
}

pub fn record_offer_shown(offer: &ArcOffer) -> ArcOffer {
    ArcOffer {
        times_shown: offer.times_shown.saturating_add(1),
        ..offer.clone()
    }
}

/// Charge an offer's cost against the day. Expired offers cannot be taken.
pub fn accept_offer<'a>(
    state: &'a DailyState,
    offer: &ArcOffer,
    current_day: u32,
) -> Option<(Cow<'a, DailyState>, Diff)> {
    if is_offer_expired(offer, current_day) {
        debug!(arc = %offer.arc_id, day = current_day, "offer expired");
        return None;
    }
    Some(apply_outcome(state, Some(&offer.cost), Code::DispositionCost))
}
