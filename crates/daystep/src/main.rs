use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::PathBuf;

use anyhow::{ensure, Context, Result};
use clap::Parser;
use day_core::allocation::{Allocation, Posture};
use day_core::arc::{advance_arc, start_arc, ArcContext, SlotBudget, UserArc};
use day_core::config::TraceConfig;
use day_core::day::{advance_day, DayPlan};
use day_core::diff::Diff;
use day_core::io::content::Content;
use day_core::io::frame::{make_frame, ArcMark, Frame};
use day_core::io::script::RunScript;
use day_core::storylet::RunHistory;
use day_core::tension::{UnresolvedTension, FATIGUE, UNFINISHED_ASSIGNMENT};
use day_core::trace::{ResourceTrace, TraceEvent};
use rand::Rng;
use rand_chacha::ChaCha8Rng;
use rand_seeder::Seeder;
use tracing::{debug, info};

#[derive(Parser, Debug)]
#[command(name = "daystep", about = "Batch replay of daily runs into NDJSON frames")]
struct Args {
    /// Path to the run script JSON document.
    #[arg(long, value_name = "PATH")]
    script: PathBuf,

    /// Output NDJSON file path.
    #[arg(long)]
    out: PathBuf,

    /// Optional path to emit resource trace events as NDJSON. Enables the trace.
    #[arg(long = "trace-out", value_name = "PATH")]
    trace_out: Option<PathBuf>,

    /// Append this many generated days after the scripted ones.
    #[arg(long = "synthetic-days", default_value_t = 0)]
    synthetic_days: u32,

    /// Seed label for generated days.
    #[arg(long = "synthetic-seed", default_value = "daystep")]
    synthetic_seed: String,
}

/// Deterministically generate plausible days from a seed label.
fn synthetic_days(label: &str, count: u32) -> Vec<DayPlan> {
    let mut rng: ChaCha8Rng = Seeder::from(label).make_rng();
    (0..count)
        .map(|_| {
            let mut cuts = [0i32; 4];
            for cut in &mut cuts {
                *cut = rng.gen_range(0..=100);
            }
            cuts.sort_unstable();
            let allocation = Allocation::new(
                cuts[0],
                cuts[1] - cuts[0],
                cuts[2] - cuts[1],
                cuts[3] - cuts[2],
                100 - cuts[3],
            );
            let posture = if rng.gen_bool(0.25) {
                Posture::Push
            } else {
                Posture::Steady
            };
            let mut tensions = Vec::new();
            if rng.gen_bool(0.2) {
                tensions.push(UnresolvedTension::new(FATIGUE, Some(rng.gen_range(1..=3))));
            }
            if rng.gen_bool(0.2) {
                tensions.push(UnresolvedTension::new(UNFINISHED_ASSIGNMENT, None));
            }
            DayPlan {
                allocation: Some(allocation),
                posture,
                tensions,
                ..DayPlan::default()
            }
        })
        .collect()
}

/// Try to start or advance every arc for `day`.
///
/// Returns the frame marks and the payoff changes applied to `state`.
fn progress_arcs(
    content: &Content,
    script: &RunScript,
    arcs: &mut BTreeMap<String, UserArc>,
    history: &mut RunHistory,
    state: &mut day_core::DailyState,
    day: u32,
) -> (Vec<ArcMark>, Diff) {
    let mut marks = Vec::new();
    let mut payoffs = Diff::default();
    let mut slots_used = 0;
    for (arc_id, definition) in &content.arcs {
        let slots = script.slots_per_day.map(|total| SlotBudget {
            used: slots_used,
            total,
        });
        let ctx = ArcContext {
            current_day: day,
            pool: &content.pool,
            player_state: &script.player_state,
            history: &*history,
            slots,
        };
        let current = match arcs.get(arc_id) {
            Some(arc) => arc.clone(),
            None => match start_arc(definition, &ctx) {
                Some(arc) => arc,
                None => continue,
            },
        };
        match advance_arc(&current, definition, state, &ctx) {
            Some(advance) => {
                if let Some(used) = advance.slots_used {
                    slots_used = used;
                }
                if let Some(slug) = &advance.played_slug {
                    history.consume(slug.clone());
                }
                payoffs.merge(&advance.diff);
                *state = advance.state;
                marks.push(ArcMark::new(&advance.arc, advance.played_slug));
                arcs.insert(arc_id.clone(), advance.arc);
            }
            None => {
                arcs.insert(arc_id.clone(), current);
            }
        }
    }
    (marks, payoffs)
}

/// Replay every day of `script`, returning one frame per day.
///
/// The trace buffer is drained into `on_trace` after every day, so it never
/// holds more than one day of events.
fn replay(
    script: &RunScript,
    trace_config: TraceConfig,
    on_trace: &mut dyn FnMut(Vec<TraceEvent>) -> Result<()>,
) -> Result<Vec<Frame>> {
    let content = script
        .content
        .clone()
        .validate()
        .with_context(|| format!("content in script {:?} is invalid", script.name))?;

    let experiments: BTreeMap<String, String> = content
        .experiments
        .iter()
        .map(|definition| {
            let assignment = definition.assign(&script.user_id);
            (assignment.experiment_id, assignment.variant)
        })
        .collect();

    let mut state = script.initial.clone();
    let mut arcs = BTreeMap::new();
    let mut history = RunHistory::new();
    let mut frames = Vec::with_capacity(script.days.len());
    let mut trace = ResourceTrace::new(trace_config);

    for plan in &script.days {
        let day = state.day_index;
        let (arc_marks, mut diff) =
            progress_arcs(&content, script, &mut arcs, &mut history, &mut state, day);
        let transition = advance_day(&state, plan, Some(&mut trace));
        diff.merge(&transition.diff);
        if !trace.is_empty() {
            on_trace(trace.drain())?;
        }
        ensure!(
            day.checked_add(1) == Some(transition.next.day_index),
            "day rollover out of order: {} -> {}",
            day,
            transition.next.day_index
        );
        debug!(day, energy = transition.next.energy, stress = transition.next.stress, "day resolved");
        frames.push(make_frame(
            day,
            transition.end,
            &transition.next,
            diff,
            arc_marks,
            experiments.clone(),
            transition.chronicle,
        ));
        state = transition.next;
    }

    Ok(frames)
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_target(false)
        .init();

    let args = Args::parse();

    let mut script = RunScript::load_from_path(&args.script)
        .with_context(|| format!("failed to read script {:?}", args.script))?;
    script
        .days
        .extend(synthetic_days(&args.synthetic_seed, args.synthetic_days));

    let trace_config = if args.trace_out.is_some() {
        TraceConfig::enabled()
    } else {
        TraceConfig::from_env()
    };
    let mut trace_writer = match &args.trace_out {
        Some(path) => Some(BufWriter::new(File::create(path).with_context(|| {
            format!("failed to create trace file at {:?}", path)
        })?)),
        None => None,
    };
    let mut trace_events = 0usize;
    let frames = replay(&script, trace_config, &mut |events| {
        trace_events += events.len();
        if let Some(writer) = trace_writer.as_mut() {
            for event in &events {
                serde_json::to_writer(&mut *writer, event)?;
                writer.write_all(b"\n")?;
            }
        }
        Ok(())
    })?;
    if let Some(writer) = trace_writer.as_mut() {
        writer.flush()?;
    }

    let frame_file =
        File::create(&args.out).with_context(|| format!("failed to create {:?}", args.out))?;
    let mut frame_writer = BufWriter::new(frame_file);
    for frame in &frames {
        frame_writer.write_all(frame.to_ndjson()?.as_bytes())?;
    }
    frame_writer.flush()?;

    info!(days = frames.len(), trace_events, script = %script.name, "replay finished");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{replay, synthetic_days, Args};
    use clap::{error::ErrorKind, Parser};
    use day_core::config::TraceConfig;
    use day_core::io::script::RunScript;
    use day_core::trace::{TraceEvent, TRACE_CAPACITY};

    const SCRIPT: &str = r#"{
        "name": "first_week",
        "user_id": "player-7",
        "initial": {"day_index": 2, "energy": 70, "stress": 20},
        "days": [
            {"allocation": {"study": 40, "work": 20, "social": 10, "health": 20, "fun": 10}},
            {"allocation": {"study": 10, "work": 10, "social": 20, "health": 30, "fun": 30},
             "flags": {"reflect": true}},
            {"allocation": {"study": 50, "work": 30, "social": 0, "health": 10, "fun": 10},
             "posture": "push", "tensions": [{"key": "fatigue"}]}
        ],
        "content": {
            "storylets": [{"slug": "first_week_intro"}, {"slug": "first_week_exam"}],
            "arcs": [{"arc_id": "first_week",
                      "steps": [{"slug": "first_week_intro"}, {"slug": "first_week_exam", "min_day_gap": 1}],
                      "payoff": {"vectors": {"focus": 2}}}],
            "experiments": [{"id": "exp:reflection_copy", "variants": ["short", "long"]}]
        },
        "slots_per_day": 1
    }"#;

    fn script() -> RunScript {
        RunScript::from_reader(SCRIPT.as_bytes()).expect("script parses")
    }

    fn ignore(_: Vec<TraceEvent>) -> anyhow::Result<()> {
        Ok(())
    }

    #[test]
    fn requires_script() {
        let err = Args::try_parse_from(["daystep", "--out", "out.ndjson"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MissingRequiredArgument);
    }

    #[test]
    fn scripted_arc_completes_within_the_week() {
        let frames = replay(&script(), TraceConfig::default(), &mut ignore).expect("replay succeeds");
        assert_eq!(frames.len(), 3);
        assert_eq!(frames[0].day, 2);
        assert_eq!(frames[0].end.end_energy, 61);
        assert_eq!(frames[0].arcs[0].played.as_deref(), Some("first_week_intro"));
        assert_eq!(frames[1].arcs[0].played.as_deref(), Some("first_week_exam"));
        assert!(frames[2].arcs.is_empty());
        assert!(frames[1].experiments.contains_key("exp:reflection_copy"));
    }

    #[test]
    fn paired_runs_are_deterministic_over_200_days() {
        let mut script = script();
        script.days.extend(synthetic_days("determinism", 200));

        let run_once = || {
            replay(&script, TraceConfig::enabled(), &mut ignore)
                .expect("replay succeeds")
                .iter()
                .map(|frame| frame.to_ndjson().expect("frame serializes"))
                .collect::<Vec<_>>()
        };

        let first = run_once();
        let second = run_once();
        assert_eq!(first.len(), 203);
        assert_eq!(first, second);
    }

    #[test]
    fn trace_is_streamed_per_day_without_growing_the_buffer() {
        let mut script = script();
        script.days.extend(synthetic_days("streamed", 200));

        let mut batches = Vec::new();
        replay(&script, TraceConfig::enabled(), &mut |events| {
            batches.push(events);
            Ok(())
        })
        .expect("replay succeeds");

        assert_eq!(batches.len(), 203);
        assert!(batches.iter().all(|batch| !batch.is_empty() && batch.len() < TRACE_CAPACITY));
        let total: usize = batches.iter().map(Vec::len).sum();
        assert!(total > TRACE_CAPACITY);
        assert!(batches
            .windows(2)
            .all(|pair| pair[0][0].day_index < pair[1][0].day_index));
    }

    #[test]
    fn disabled_trace_streams_nothing() {
        let mut calls = 0;
        replay(&script(), TraceConfig::default(), &mut |_| {
            calls += 1;
            Ok(())
        })
        .expect("replay succeeds");
        assert_eq!(calls, 0);
    }

    #[test]
    fn synthetic_allocations_sum_to_one_hundred() {
        for plan in synthetic_days("sums", 50) {
            let allocation = plan.allocation.expect("generated days allocate");
            assert_eq!(allocation.total(), 100);
        }
    }
}
