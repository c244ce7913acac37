//! Audit sinks for governance events.
//!
//! The HTTP sink speaks the trust-fabric API:
//!
//! | Call | Request |
//! |------|---------|
//! | lookup | `GET {endpoint}/api/admin/agents/{agentId}` |
//! | register (on 404) | `POST {endpoint}/api/admin/register-agent` |
//! | event | `POST {endpoint}/api/log-action` |

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use crate::error::{PassportError, Result};

use super::config::GovernanceConfig;

/// Role recorded for agents registered by the wrapper itself.
pub const SELF_REGISTERED_ROLE: &str = "LangGraph Agent";
pub const SELF_REGISTERED_PURPOSE: &str = "Automated task execution";

/// One audit record sent to the governance endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GovernanceEvent {
    pub agent_id: String,
    pub action: String,
    pub details: String,
    pub context: Map<String, Value>,
}

impl GovernanceEvent {
    /// Build an event, stamping the context with the time, mission scope
    /// and compliance mode.
    pub fn new(
        config: &GovernanceConfig,
        action: impl Into<String>,
        details: impl Into<String>,
        mut context: Map<String, Value>,
    ) -> Self {
        context.insert("timestamp".into(), json!(crate::time::now_rfc3339()));
        context.insert("missionScope".into(), json!(config.mission_scope));
        context.insert(
            "complianceMode".into(),
            json!(config.compliance_mode.as_str()),
        );
        Self {
            agent_id: config.agent_id.clone(),
            action: action.into(),
            details: details.into(),
            context,
        }
    }

    pub fn phase(&self) -> Option<&str> {
        self.context.get("phase").and_then(Value::as_str)
    }
}

/// Destination for governance registration and events.
#[async_trait]
pub trait AuditSink: Send + Sync {
    /// Make sure the agent is known to the endpoint, registering it if not.
    async fn ensure_registered(&self, config: &GovernanceConfig) -> Result<()>;

    async fn log_event(&self, event: &GovernanceEvent) -> Result<()>;
}

#[async_trait]
impl<T: AuditSink + ?Sized> AuditSink for std::sync::Arc<T> {
    async fn ensure_registered(&self, config: &GovernanceConfig) -> Result<()> {
        (**self).ensure_registered(config).await
    }

    async fn log_event(&self, event: &GovernanceEvent) -> Result<()> {
        (**self).log_event(event).await
    }
}

/// [`AuditSink`] backed by the trust-fabric HTTP API.
#[derive(Debug, Clone)]
pub struct HttpAuditSink {
    client: reqwest::Client,
    endpoint: String,
    api_key: Option<String>,
}

impl HttpAuditSink {
    pub fn new(config: &GovernanceConfig) -> Result<Self> {
        config.validate()?;
        let client = reqwest::Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| PassportError::Config(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            client,
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
        })
    }

    fn request(&self, method: reqwest::Method, path: &str) -> reqwest::RequestBuilder {
        let req = self
            .client
            .request(method, format!("{}{path}", self.endpoint));
        match &self.api_key {
            Some(key) => req.bearer_auth(key),
            None => req,
        }
    }

    async fn send(&self, req: reqwest::RequestBuilder, what: &str) -> Result<reqwest::Response> {
        req.send()
            .await
            .map_err(|e| PassportError::Governance(format!("{what}: {e}")))
    }

    async fn expect_success(resp: reqwest::Response, what: &str) -> Result<()> {
        let status = resp.status();
        if status.is_success() {
            return Ok(());
        }
        let body = resp.text().await.unwrap_or_default();
        Err(PassportError::Governance(format!(
            "{what}: HTTP {status}: {body}"
        )))
    }
}

#[async_trait]
impl AuditSink for HttpAuditSink {
    async fn ensure_registered(&self, config: &GovernanceConfig) -> Result<()> {
        let lookup = self
            .send(
                self.request(
                    reqwest::Method::GET,
                    &format!("/api/admin/agents/{}", config.agent_id),
                ),
                "agent lookup",
            )
            .await?;
        if lookup.status() != reqwest::StatusCode::NOT_FOUND {
            return Self::expect_success(lookup, "agent lookup").await;
        }

        let body = json!({
            "agentId": config.agent_id,
            "role": SELF_REGISTERED_ROLE,
            "purpose": SELF_REGISTERED_PURPOSE,
            "missionScope": config.mission_scope,
        });
        let resp = self
            .send(
                self.request(reqwest::Method::POST, "/api/admin/register-agent")
                    .json(&body),
                "agent registration",
            )
            .await?;
        Self::expect_success(resp, "agent registration").await?;
        log::info!("registered agent {} with governance endpoint", config.agent_id);
        Ok(())
    }

    async fn log_event(&self, event: &GovernanceEvent) -> Result<()> {
        let resp = self
            .send(
                self.request(reqwest::Method::POST, "/api/log-action").json(event),
                "log action",
            )
            .await?;
        Self::expect_success(resp, "log action").await
    }
}
