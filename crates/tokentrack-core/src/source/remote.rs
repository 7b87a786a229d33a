//! Gateway strategy: one JSON-RPC `session.status` call per sample.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{Unavailable, UsageSource};
use crate::config::GatewaySettings;
use crate::usage::{TokenSplit, UsageSample};

/// Gateway path for JSON-RPC calls
const RPC_PATH: &str = "/v1/rpc";

/// RPC method returning per-turn usage for a session
const STATUS_METHOD: &str = "session.status";

/// JSON-RPC request envelope
#[derive(Debug, Clone, Serialize)]
pub struct RpcRequest<'a> {
    pub jsonrpc: &'static str,
    pub method: &'static str,
    pub params: StatusParams<'a>,
    pub id: u32,
}

/// Params of `session.status`
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusParams<'a> {
    pub session_key: &'a str,
}

impl<'a> RpcRequest<'a> {
    /// `session.status` request for a session
    pub fn session_status(session_key: &'a str) -> Self {
        Self {
            jsonrpc: "2.0",
            method: STATUS_METHOD,
            params: StatusParams { session_key },
            id: 1,
        }
    }
}

#[derive(Debug, Deserialize)]
struct RpcResponse {
    #[serde(default)]
    result: Option<SessionStatus>,
    #[serde(default)]
    error: Option<RpcError>,
}

#[derive(Debug, Deserialize)]
struct RpcError {
    #[serde(default)]
    code: i64,
    #[serde(default)]
    message: String,
}

/// `result` of `session.status`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SessionStatus {
    /// Turns reported for the session; absent means the payload is unusable
    #[serde(default)]
    pub turns: Option<Vec<Turn>>,
}

/// One conversation turn
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Turn {
    #[serde(default)]
    pub usage: Option<TurnUsage>,
}

/// Token usage of a turn
#[derive(Debug, Clone, Copy, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TurnUsage {
    #[serde(default)]
    pub input_tokens: u64,
    #[serde(default)]
    pub output_tokens: u64,
}

impl SessionStatus {
    /// Sum input and output tokens over every turn that reports usage
    pub fn token_split(&self) -> Result<TokenSplit, Unavailable> {
        let turns = self
            .turns
            .as_ref()
            .ok_or_else(|| Unavailable::Malformed("result has no turns".to_string()))?;

        Ok(turns
            .iter()
            .filter_map(|turn| turn.usage)
            .fold(TokenSplit::default(), |acc, usage| TokenSplit {
                input: acc.input.saturating_add(usage.input_tokens),
                output: acc.output.saturating_add(usage.output_tokens),
            }))
    }
}

/// Samples the token count from the gateway's session status
pub struct RemoteSource {
    agent: ureq::Agent,
    endpoint: String,
    token: Option<String>,
    session_key: String,
}

impl RemoteSource {
    /// Polling period for the gateway
    pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(2);

    /// Create a source for the configured gateway
    pub fn new(gateway: &GatewaySettings) -> Self {
        let config = ureq::Agent::config_builder()
            .timeout_global(Some(Duration::from_millis(gateway.timeout_ms)))
            .http_status_as_error(false)
            .build();

        Self {
            agent: ureq::Agent::new_with_config(config),
            endpoint: format!("{}{}", gateway.base_url.trim_end_matches('/'), RPC_PATH),
            token: gateway.bearer_token(),
            session_key: gateway.session_key.clone(),
        }
    }

    /// Full RPC URL
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn fetch_status(&self) -> Result<SessionStatus, Unavailable> {
        let mut request = self.agent.post(self.endpoint.as_str());
        if let Some(ref token) = self.token {
            request = request.header("Authorization", format!("Bearer {}", token));
        }

        let mut response = request
            .send_json(RpcRequest::session_status(&self.session_key))
            .map_err(|e| Unavailable::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(Unavailable::Status(status.as_u16()));
        }

        let body: RpcResponse = response
            .body_mut()
            .read_json()
            .map_err(|e| Unavailable::Malformed(e.to_string()))?;

        if let Some(err) = body.error {
            return Err(Unavailable::Rpc(format!("{} (code {})", err.message, err.code)));
        }

        body.result
            .ok_or_else(|| Unavailable::Malformed("missing result".to_string()))
    }
}

impl UsageSource for RemoteSource {
    fn sample(&self) -> Result<UsageSample, Unavailable> {
        let split = self.fetch_status()?.token_split()?;
        debug!(
            "Gateway sample: {} input + {} output tokens",
            split.input, split.output
        );
        Ok(UsageSample::from_split(split))
    }

    fn name(&self) -> &'static str {
        "remote"
    }

    fn default_interval(&self) -> Duration {
        Self::DEFAULT_INTERVAL
    }
}
