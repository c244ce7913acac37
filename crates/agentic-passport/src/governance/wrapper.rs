//! Governance wrapper: audit instrumentation around an opaque agent.
//!
//! Every call runs `INIT → PRE_CHECK → EXECUTE → POST_LOG | ERROR_LOG`.
//! The wrapper never alters the capability's output or error. It is not a
//! policy gate; the only thing that can stop a call is a registration or
//! pre-check failure in enforcing mode.

use std::time::Instant;

use futures::stream::{self, BoxStream, StreamExt};
use serde::Serialize;
use serde_json::{json, Map, Value};
use tokio::sync::OnceCell;
use uuid::Uuid;

use crate::error::{PassportError, Result};
use crate::time;

use super::capability::{AgentCapability, StreamingCapability};
use super::config::GovernanceConfig;
use super::sink::{AuditSink, GovernanceEvent};

const TEXT_PREVIEW_CHARS: usize = 200;
const JSON_PREVIEW_CHARS: usize = 500;
const INTENT_DESCRIPTION_CHARS: usize = 100;

/// Error surfaced by a governed call.
#[derive(Debug)]
pub enum GovernedError<E> {
    /// The capability's own error, untouched.
    Capability(E),
    /// Governance stopped the call before the capability ran (enforcing
    /// mode only).
    Aborted(PassportError),
}

impl<E> GovernedError<E> {
    /// The capability error, if that is what this is.
    pub fn into_capability(self) -> Option<E> {
        match self {
            Self::Capability(e) => Some(e),
            Self::Aborted(_) => None,
        }
    }
}

impl<E: std::fmt::Display> std::fmt::Display for GovernedError<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Capability(e) => write!(f, "{e}"),
            Self::Aborted(e) => write!(f, "{e}"),
        }
    }
}

impl<E: std::fmt::Debug + std::fmt::Display> std::error::Error for GovernedError<E> {}

/// What the agent appears to be about to do, derived from its input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeclaredIntent {
    pub target: String,
    pub action: String,
    pub description: String,
}

/// Per-call bookkeeping shared by the pipeline phases.
struct CallContext {
    action_id: String,
    started: Instant,
    input_preview: String,
    intent: DeclaredIntent,
}

impl CallContext {
    fn new<I: Serialize>(input: &I, mission_scope: &str) -> Self {
        let value = serde_json::to_value(input).unwrap_or(Value::Null);
        Self {
            action_id: Uuid::new_v4().to_string(),
            started: Instant::now(),
            input_preview: preview(&value),
            intent: extract_intent(&value, mission_scope),
        }
    }

    fn elapsed_ms(&self) -> u64 {
        time::saturating_millis(self.started.elapsed())
    }
}

/// Wraps a capability with registration, intent declaration and outcome
/// logging against an [`AuditSink`].
pub struct GovernanceWrapper<C, S> {
    capability: C,
    sink: S,
    config: GovernanceConfig,
    registered: OnceCell<()>,
}

impl<C, S> GovernanceWrapper<C, S>
where
    C: AgentCapability,
    S: AuditSink,
{
    pub fn new(capability: C, sink: S, config: GovernanceConfig) -> Self {
        log::info!(
            "governance wrapper for {} (scope {}, mode {})",
            config.agent_id,
            config.mission_scope,
            config.compliance_mode
        );
        Self {
            capability,
            sink,
            config,
            registered: OnceCell::new(),
        }
    }

    pub fn config(&self) -> &GovernanceConfig {
        &self.config
    }

    pub fn capability(&self) -> &C {
        &self.capability
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn is_initialized(&self) -> bool {
        self.registered.initialized()
    }

    /// Register with the governance endpoint, once.
    ///
    /// A failure leaves the wrapper uninitialized so the next call retries.
    /// Outside enforcing mode the failure is swallowed.
    pub async fn initialize(&self) -> Result<()> {
        let outcome = self
            .registered
            .get_or_try_init(|| {
                time::bounded(
                    self.config.timeout(),
                    "governance registration",
                    self.sink.ensure_registered(&self.config),
                )
            })
            .await;

        match outcome {
            Ok(_) => Ok(()),
            Err(e) => {
                log::warn!(
                    "governance registration failed for {}: {e}",
                    self.config.agent_id
                );
                if self.config.compliance_mode.is_blocking() {
                    Err(e)
                } else {
                    Ok(())
                }
            }
        }
    }

    /// Run the capability under governance.
    pub async fn invoke(
        &self,
        input: C::Input,
    ) -> std::result::Result<C::Output, GovernedError<C::Error>> {
        let ctx = CallContext::new(&input, &self.config.mission_scope);
        log::debug!("governed invoke {}", ctx.action_id);

        if let Err(e) = self.begin(&ctx).await {
            self.error_log(&ctx, &e.to_string()).await;
            return Err(GovernedError::Aborted(e));
        }

        match self.capability.invoke(input).await {
            Ok(output) => {
                let result = serde_json::to_value(&output).unwrap_or(Value::Null);
                self.post_log(&ctx, preview(&result)).await;
                Ok(output)
            }
            Err(e) => {
                self.error_log(&ctx, &e.to_string()).await;
                Err(GovernedError::Capability(e))
            }
        }
    }

    /// INIT and PRE_CHECK. Errors only in enforcing mode.
    async fn begin(&self, ctx: &CallContext) -> Result<()> {
        self.initialize().await?;

        let mut context = Map::new();
        context.insert("actionId".into(), json!(ctx.action_id));
        context.insert("intent".into(), json!(ctx.intent));
        context.insert("inputPreview".into(), json!(ctx.input_preview));
        context.insert("phase".into(), json!("pre-execution"));
        let event = GovernanceEvent::new(
            &self.config,
            "intent-declared",
            "Agent declared intent to execute action",
            context,
        );

        if let Err(e) = self.emit(&event).await {
            log::warn!("pre-execution check failed for {}: {e}", ctx.action_id);
            if self.config.compliance_mode.is_blocking() {
                return Err(PassportError::Governance(e.to_string()));
            }
        }
        Ok(())
    }

    async fn post_log(&self, ctx: &CallContext, result_preview: String) {
        let mut context = Map::new();
        context.insert("actionId".into(), json!(ctx.action_id));
        context.insert("executionTimeMs".into(), json!(ctx.elapsed_ms()));
        context.insert("inputPreview".into(), json!(ctx.input_preview));
        context.insert("resultPreview".into(), json!(result_preview));
        context.insert("phase".into(), json!("post-execution"));
        context.insert("success".into(), json!(true));
        let event = GovernanceEvent::new(
            &self.config,
            "execution-completed",
            "Agent completed execution successfully",
            context,
        );
        if let Err(e) = self.emit(&event).await {
            log::warn!("post-execution logging failed for {}: {e}", ctx.action_id);
        }
    }

    async fn error_log(&self, ctx: &CallContext, message: &str) {
        let mut context = Map::new();
        context.insert("actionId".into(), json!(ctx.action_id));
        context.insert("executionTimeMs".into(), json!(ctx.elapsed_ms()));
        context.insert("inputPreview".into(), json!(ctx.input_preview));
        context.insert("error".into(), json!(message));
        context.insert("phase".into(), json!("error"));
        context.insert("success".into(), json!(false));
        let event = GovernanceEvent::new(
            &self.config,
            "execution-failed",
            format!("Agent execution failed: {message}"),
            context,
        );
        if let Err(e) = self.emit(&event).await {
            log::warn!("failed to log execution error for {}: {e}", ctx.action_id);
        }
    }

    async fn emit(&self, event: &GovernanceEvent) -> Result<()> {
        time::bounded(
            self.config.timeout(),
            "governance log-action",
            self.sink.log_event(event),
        )
        .await
    }
}

enum StreamState<'a, I, T> {
    Start(I),
    Running {
        inner: BoxStream<'a, T>,
        collected: String,
    },
    Finished,
}

impl<C, S> GovernanceWrapper<C, S>
where
    C: StreamingCapability,
    S: AuditSink,
{
    /// Stream the capability under governance.
    ///
    /// Chunks are handed on as soon as the capability yields them; text is
    /// accumulated only to build the post-log preview.
    pub fn stream(
        &self,
        input: C::Input,
    ) -> BoxStream<'_, std::result::Result<C::Chunk, GovernedError<C::Error>>> {
        let ctx = CallContext::new(&input, &self.config.mission_scope);
        log::debug!("governed stream {}", ctx.action_id);

        stream::unfold(
            (StreamState::Start(input), ctx),
            move |(mut state, ctx)| async move {
                loop {
                    match state {
                        StreamState::Start(input) => {
                            if let Err(e) = self.begin(&ctx).await {
                                self.error_log(&ctx, &e.to_string()).await;
                                return Some((
                                    Err(GovernedError::Aborted(e)),
                                    (StreamState::Finished, ctx),
                                ));
                            }
                            state = StreamState::Running {
                                inner: self.capability.stream(input),
                                collected: String::new(),
                            };
                        }
                        StreamState::Running {
                            mut inner,
                            mut collected,
                        } => match inner.next().await {
                            Some(Ok(chunk)) => {
                                collected.push_str(chunk.as_ref());
                                return Some((
                                    Ok(chunk),
                                    (StreamState::Running { inner, collected }, ctx),
                                ));
                            }
                            Some(Err(e)) => {
                                self.error_log(&ctx, &e.to_string()).await;
                                return Some((
                                    Err(GovernedError::Capability(e)),
                                    (StreamState::Finished, ctx),
                                ));
                            }
                            None => {
                                self.post_log(&ctx, preview_text(&collected)).await;
                                return None;
                            }
                        },
                        StreamState::Finished => return None,
                    }
                }
            },
        )
        .boxed()
    }
}

// ── Previews ──────────────────────────────────────────────────────────────────

fn take_chars(s: &str, n: usize) -> &str {
    match s.char_indices().nth(n) {
        Some((i, _)) => &s[..i],
        None => s,
    }
}

/// Text preview: at most 200 characters, with `...` when cut.
pub fn preview_text(s: &str) -> String {
    if s.chars().count() > TEXT_PREVIEW_CHARS {
        format!("{}...", take_chars(s, TEXT_PREVIEW_CHARS))
    } else {
        s.to_string()
    }
}

/// Preview of any serialized value: strings as text, everything else as
/// pretty JSON cut to 500 characters.
pub fn preview(value: &Value) -> String {
    match value {
        Value::String(s) => preview_text(s),
        other => {
            let pretty = serde_json::to_string_pretty(other).unwrap_or_default();
            take_chars(&pretty, JSON_PREVIEW_CHARS).to_string()
        }
    }
}

/// Derive the declared intent from a serialized input.
pub fn extract_intent(input: &Value, mission_scope: &str) -> DeclaredIntent {
    let target = mission_scope.to_string();
    match input {
        Value::String(s) => DeclaredIntent {
            target,
            action: "process-input".into(),
            description: take_chars(s, INTENT_DESCRIPTION_CHARS).to_string(),
        },
        Value::Object(map) => {
            let non_empty = |key: &str| {
                map.get(key)
                    .and_then(Value::as_str)
                    .filter(|s| !s.is_empty())
                    .map(str::to_string)
            };
            DeclaredIntent {
                target,
                action: non_empty("action").unwrap_or_else(|| "execute-workflow".into()),
                description: non_empty("description").unwrap_or_else(|| {
                    take_chars(&input.to_string(), INTENT_DESCRIPTION_CHARS).to_string()
                }),
            }
        }
        _ => DeclaredIntent {
            target,
            action: "unknown".into(),
            description: "No description available".into(),
        },
    }
}
