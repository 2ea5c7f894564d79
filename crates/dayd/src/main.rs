use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use clap::Parser;
use day_core::arc::{step_gate, ArcContext, ArcDefinition, ArcStep, SlotBudget, UserArc};
use day_core::config::TraceConfig;
use day_core::day::{advance_day, DayPlan, DayTransition};
use day_core::experiment::{Assignment, ExperimentDefinition};
use day_core::storylet::{ContentPool, RunHistory, Storylet};
use day_core::trace::{ResourceTrace, TraceEvent};
use day_core::{pct_in_rollout, DailyState, Requirement};
use futures::{SinkExt, StreamExt};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::net::TcpListener;
use tokio::sync::broadcast::{self, error::RecvError};
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

#[derive(Parser, Debug)]
#[command(name = "dayd", about = "HTTP daemon for the daily-run rules")]
struct Args {
    /// Address to bind (defaults to 127.0.0.1).
    #[arg(long, default_value = "127.0.0.1")]
    bind: String,

    /// Port to listen on.
    #[arg(long, default_value_t = 8787)]
    port: u16,

    /// Record trace events regardless of DAY_CORE_TRACE.
    #[arg(long)]
    trace: bool,
}

#[derive(Clone)]
struct AppState {
    trace: Arc<Mutex<ResourceTrace>>,
    tx: broadcast::Sender<String>,
}

impl AppState {
    fn new(config: TraceConfig) -> Self {
        let (tx, _rx) = broadcast::channel::<String>(256);
        Self {
            trace: Arc::new(Mutex::new(ResourceTrace::new(config))),
            tx,
        }
    }
}

struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn unprocessable(message: impl ToString) -> Self {
        Self {
            status: StatusCode::UNPROCESSABLE_ENTITY,
            message: message.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(json!({ "error": self.message }))).into_response()
    }
}

#[derive(Debug, Deserialize)]
struct AdvanceRequest {
    state: DailyState,
    #[serde(default)]
    plan: DayPlan,
}

#[derive(Debug, Deserialize)]
struct EvaluateRequest {
    requirement: Requirement,
    #[serde(default)]
    state: Value,
}

#[derive(Debug, Serialize, PartialEq, Eq)]
struct EvaluateResponse {
    eligible: bool,
    well_formed: bool,
}

#[derive(Debug, Deserialize)]
struct AssignRequest {
    user_id: String,
    experiment: ExperimentDefinition,
}

#[derive(Debug, Deserialize)]
struct RolloutRequest {
    user_id: String,
    key: String,
    pct: i32,
}

#[derive(Debug, Serialize, PartialEq, Eq)]
struct RolloutResponse {
    in_rollout: bool,
}

#[derive(Debug, Deserialize)]
struct NextStepRequest {
    arc: UserArc,
    definition: ArcDefinition,
    current_day: u32,
    #[serde(default)]
    storylets: Vec<Storylet>,
    #[serde(default)]
    player_state: Value,
    #[serde(default)]
    consumed: RunHistory,
    #[serde(default)]
    slots: Option<SlotBudget>,
}

#[derive(Debug, Serialize, PartialEq, Eq)]
struct NextStepResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    step: Option<ArcStep>,
    #[serde(skip_serializing_if = "Option::is_none")]
    blocked: Option<String>,
}

fn router(state: AppState) -> Router {
    Router::new()
        .route("/v1/day/advance", post(advance))
        .route("/v1/requirements/evaluate", post(evaluate))
        .route("/v1/experiments/assign", post(assign))
        .route("/v1/rollout", post(rollout))
        .route("/v1/arcs/next", post(next_arc_step))
        .route("/v1/trace", get(trace_snapshot))
        .route("/v1/trace/stream", get(ws_handler))
        .with_state(state)
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_target(false)
        .init();

    let args = Args::parse();

    let config = if args.trace {
        TraceConfig::enabled()
    } else {
        TraceConfig::from_env()
    };
    let app = router(AppState::new(config));

    let addr: SocketAddr = format!("{}:{}", args.bind, args.port)
        .parse()
        .with_context(|| format!("invalid bind address {}:{}", args.bind, args.port))?;

    info!(%addr, trace = config.enabled, "starting dayd");
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    axum::serve(listener, app.into_make_service())
        .await
        .context("server error")?;
    Ok(())
}

async fn advance(
    State(app): State<AppState>,
    Json(request): Json<AdvanceRequest>,
) -> Json<DayTransition> {
    let mut shared = app.trace.lock().await;
    let mut scratch = ResourceTrace::new(TraceConfig {
        enabled: shared.is_enabled(),
    });
    let transition = advance_day(&request.state, &request.plan, Some(&mut scratch));

    for event in scratch.drain() {
        match serde_json::to_string(&event) {
            Ok(line) => {
                if app.tx.send(line).is_err() {
                    tracing::trace!(day = event.day_index, "no trace subscribers");
                }
            }
            Err(err) => error!(?err, "failed to encode trace event"),
        }
        shared.push(event);
    }
    for cause in &transition.diff.causes {
        debug!(target: "cause", code = %cause.code, target_key = %cause.target, note = ?cause.note);
    }

    Json(transition)
}

async fn evaluate(Json(request): Json<EvaluateRequest>) -> Json<EvaluateResponse> {
    Json(EvaluateResponse {
        eligible: request.requirement.evaluate(&request.state),
        well_formed: request.requirement.is_well_formed(),
    })
}

async fn assign(Json(request): Json<AssignRequest>) -> Result<Json<Assignment>, ApiError> {
    if request.experiment.id.trim().is_empty() {
        return Err(ApiError::unprocessable("experiment id must not be empty"));
    }
    Ok(Json(request.experiment.assign(&request.user_id)))
}

async fn rollout(Json(request): Json<RolloutRequest>) -> Json<RolloutResponse> {
    Json(RolloutResponse {
        in_rollout: pct_in_rollout(&request.user_id, &request.key, request.pct),
    })
}

async fn next_arc_step(
    Json(request): Json<NextStepRequest>,
) -> Result<Json<NextStepResponse>, ApiError> {
    request
        .definition
        .validate()
        .map_err(ApiError::unprocessable)?;
    let pool = ContentPool::from_storylets(request.storylets).map_err(ApiError::unprocessable)?;
    let ctx = ArcContext {
        current_day: request.current_day,
        pool: &pool,
        player_state: &request.player_state,
        history: &request.consumed,
        slots: request.slots,
    };
    let response = match step_gate(&request.arc, &request.definition, &ctx) {
        Ok(step) => NextStepResponse {
            step: Some(step.clone()),
            blocked: None,
        },
        Err(reason) => NextStepResponse {
            step: None,
            blocked: Some(reason.to_string()),
        },
    };
    Ok(Json(response))
}

async fn trace_snapshot(State(app): State<AppState>) -> Json<Vec<TraceEvent>> {
    Json(app.trace.lock().await.events())
}

async fn ws_handler(ws: WebSocketUpgrade, State(app): State<AppState>) -> impl IntoResponse {
    ws.on_upgrade(|socket| async move { handle_socket(socket, app.tx.subscribe()).await })
}

async fn handle_socket(socket: WebSocket, mut rx: broadcast::Receiver<String>) {
    let (mut sender, mut receiver) = socket.split();
    loop {
        tokio::select! {
            event = rx.recv() => match event {
                Ok(line) => {
                    if sender.send(Message::Text(line)).await.is_err() {
                        debug!("trace subscriber disconnected");
                        break;
                    }
                }
                Err(RecvError::Lagged(skipped)) => warn!(skipped, "trace subscriber lagged"),
                Err(RecvError::Closed) => break,
            },
            incoming = receiver.next() => match incoming {
                Some(Ok(Message::Close(_))) | Some(Err(_)) | None => break,
                Some(Ok(_)) => {}
            },
        }
    }
}
