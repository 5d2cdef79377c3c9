//! `invoke`, `listTools`, and `health` handlers (spec §6.1).

use axum::extract::State;
use axum::Json;
use pgw_domain::ProviderStatus;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::error::ApiError;
use super::state::AppState;
use crate::process_gauge;

/// Request body for `POST /invoke`.
#[derive(Debug, Deserialize)]
pub struct InvokeRequest {
    /// Provider to dispatch to.
    pub provider_name: String,
    /// Tool name within that provider's catalogue.
    pub tool_name: String,
    /// Arguments object, passed through to the provider verbatim.
    #[serde(default)]
    pub input: Value,
}

/// Successful `invoke` response body (spec §6.1).
#[derive(Debug, Serialize)]
pub struct InvokeResponse {
    success: bool,
    result: Value,
}

/// `POST /invoke`: dispatch a single tool call (spec §4.6, §6.1).
pub async fn invoke(
    State(state): State<AppState>,
    Json(request): Json<InvokeRequest>,
) -> Result<Json<InvokeResponse>, ApiError> {
    let result = state
        .supervisor
        .call(&request.provider_name, &request.tool_name, request.input)
        .await?;
    Ok(Json(InvokeResponse { success: true, result }))
}

/// One entry in the `listTools` snapshot (spec §6.1).
#[derive(Debug, Serialize)]
pub struct ToolSummary {
    name: String,
    description: String,
    server: String,
    input_schema: Value,
    output_schema: Value,
}

/// `GET /tools`: snapshot of the current tool catalogue.
pub async fn list_tools(State(state): State<AppState>) -> Json<Vec<ToolSummary>> {
    let tools = state
        .supervisor
        .list_tools()
        .into_iter()
        .map(|descriptor| ToolSummary {
            name: descriptor.tool_name,
            description: descriptor.description,
            server: descriptor.provider_name,
            input_schema: descriptor.input_schema,
            output_schema: descriptor.output_schema,
        })
        .collect();
    Json(tools)
}

/// `health` response body (spec §6.1).
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    status: &'static str,
    uptime_seconds: u64,
    servers: std::collections::HashMap<String, ProviderStatus>,
}

/// `GET /health`: aggregate fleet status, `"ok"` iff every provider is
/// `Available`.
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let servers = state.supervisor.snapshot_status();
    process_gauge::record(&servers);
    let status = if servers.values().all(|s| s.is_available()) {
        "ok"
    } else {
        "degraded"
    };
    Json(HealthResponse {
        status,
        uptime_seconds: state.started_at.elapsed().as_secs(),
        servers,
    })
}

/// `GET /metrics`: Prometheus text exposition for the process-count
/// gauge and any other registered metrics (spec §2 ancillary slice).
pub async fn metrics(State(state): State<AppState>) -> String {
    state.metrics_handle.render()
}
