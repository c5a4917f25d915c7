//! REST API handlers for record ingest, rollups, cross-filtering, and
//! period comparisons.

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};

use adpulse_analytics::{
    compare, resolve, resolve_periods_with_fallback, snapshot, sort_rollups, ComparisonMode,
    ComparisonWindow, FilterAxis, FilterSelection, MetricDelta, RecordStore, RollupSource,
    SortOrder,
};
use adpulse_core::config::AppConfig;
use adpulse_core::error::{AdpulseError, AdpulseResult};
use adpulse_core::metrics::Metric;
use adpulse_core::types::{Dimension, PerformanceRecord, RollupRecord};

/// Shared application state for REST handlers.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<RecordStore>,
    pub selection: Arc<parking_lot::RwLock<FilterSelection>>,
    pub config: Arc<AppConfig>,
    pub start_time: Instant,
}

#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}

fn bad_request(error: &str, message: impl Into<String>) -> (StatusCode, Json<ErrorResponse>) {
    metrics::counter!("api.validation_errors").increment(1);
    (
        StatusCode::BAD_REQUEST,
        Json(ErrorResponse {
            error: error.to_string(),
            message: message.into(),
        }),
    )
}

// ─── Ingest ─────────────────────────────────────────────────────────────────

#[derive(Deserialize)]
pub struct IngestRequest {
    pub records: Vec<PerformanceRecord>,
    /// Optional pre-joined accelerants, ordered finest to coarsest.
    #[serde(default)]
    pub sources: Vec<SourcePayload>,
}

#[derive(Deserialize)]
pub struct SourcePayload {
    pub name: String,
    pub grain: Vec<Dimension>,
    pub records: Vec<PerformanceRecord>,
}

#[derive(Serialize)]
pub struct IngestResponse {
    pub generation: u64,
    pub records: usize,
    pub sources: usize,
}

fn validate_ingest(request: &IngestRequest, config: &AppConfig) -> AdpulseResult<()> {
    let fail = |msg: &str| Err(AdpulseError::Validation(msg.to_string()));
    if request.records.len() > config.ingest.max_batch_size {
        return fail("batch exceeds maximum record count");
    }
    for record in &request.records {
        if record.platform.is_empty() {
            return fail("record 'platform' must not be empty");
        }
        if record.platform.len() > config.ingest.max_field_len
            || record.channel.len() > config.ingest.max_field_len
        {
            return fail("record dimension exceeds maximum length");
        }
    }
    for source in &request.sources {
        if source.name.is_empty() {
            return fail("source 'name' must not be empty");
        }
        if source.grain.is_empty() {
            return fail("source 'grain' must list at least one dimension");
        }
    }
    Ok(())
}

/// POST /v1/records — replace the record store with a freshly fetched batch.
pub async fn ingest(
    State(state): State<AppState>,
    Json(request): Json<IngestRequest>,
) -> Result<Json<IngestResponse>, (StatusCode, Json<ErrorResponse>)> {
    if let Err(e) = validate_ingest(&request, &state.config) {
        warn!(error = %e, "Ingest validation failed");
        return Err(bad_request("invalid_ingest", e.to_string()));
    }

    let accelerants: Vec<RollupSource> = request
        .sources
        .into_iter()
        .map(|s| RollupSource::new(s.name, s.grain, s.records))
        .collect();

    let record_count = request.records.len();
    let source_count = accelerants.len() + 1;

    let ticket = state.store.begin_fetch();
    if !state.store.commit(ticket, request.records, accelerants) {
        return Err((
            StatusCode::CONFLICT,
            Json(ErrorResponse {
                error: "superseded_fetch".to_string(),
                message: "A newer fetch replaced this batch".to_string(),
            }),
        ));
    }

    // New base data invalidates the interactive selection.
    *state.selection.write() = FilterSelection::reset();
    metrics::counter!("api.ingests").increment(1);
    info!(records = record_count, "Record batch ingested");

    Ok(Json(IngestResponse {
        generation: ticket.generation(),
        records: record_count,
        sources: source_count,
    }))
}

// ─── Rollups ────────────────────────────────────────────────────────────────

#[derive(Deserialize)]
pub struct RollupQuery {
    /// Comma-separated dimensions, e.g. `month,platform`.
    pub group_by: String,
    pub sort_by: Option<String>,
    pub order: Option<String>,
}

#[derive(Serialize)]
pub struct RollupResponse {
    pub generation: u64,
    pub source: Option<String>,
    pub buckets: Vec<RollupRecord>,
}

/// GET /v1/rollup — aggregate under the active cross-filter selection.
pub async fn get_rollup(
    State(state): State<AppState>,
    Query(query): Query<RollupQuery>,
) -> Result<Json<RollupResponse>, (StatusCode, Json<ErrorResponse>)> {
    let dims = parse_dimensions(&query.group_by)
        .map_err(|msg| bad_request("invalid_group_by", msg))?;
    let sort_by = match &query.sort_by {
        Some(name) => parse_metric(name).map_err(|msg| bad_request("invalid_sort_by", msg))?,
        None => Metric::Spend,
    };
    let order = match query.order.as_deref() {
        None | Some("descending") => SortOrder::Descending,
        Some("ascending") => SortOrder::Ascending,
        Some(other) => {
            return Err(bad_request(
                "invalid_order",
                format!("unknown sort order '{other}'"),
            ))
        }
    };

    let data = state.store.snapshot();
    let selection = state.selection.read().clone();
    let resolution = resolve(&data.sources, &selection, &dims);
    let source = resolution.source.map(str::to_string);
    let mut buckets = adpulse_analytics::rollup(resolution.records.into_iter(), &dims);
    sort_rollups(&mut buckets, sort_by, order);

    Ok(Json(RollupResponse {
        generation: data.generation,
        source,
        buckets,
    }))
}

// ─── Cross-filter ───────────────────────────────────────────────────────────

#[derive(Deserialize)]
pub struct ToggleRequest {
    pub axis: FilterAxis,
    pub value: String,
}

/// GET /v1/filters — the active selection.
pub async fn get_filters(State(state): State<AppState>) -> Json<FilterSelection> {
    Json(state.selection.read().clone())
}

/// POST /v1/filters/toggle — apply one click on a filter axis.
pub async fn toggle_filter(
    State(state): State<AppState>,
    Json(request): Json<ToggleRequest>,
) -> Result<Json<FilterSelection>, (StatusCode, Json<ErrorResponse>)> {
    if request.value.is_empty() || request.value.len() > state.config.ingest.max_field_len {
        return Err(bad_request(
            "invalid_filter_value",
            "filter value must be non-empty and within length limits",
        ));
    }

    let mut selection = state.selection.write();
    *selection = selection.toggle(request.axis, &request.value);
    metrics::counter!("api.filter_toggles").increment(1);
    Ok(Json(selection.clone()))
}

/// POST /v1/filters/reset — clear every axis.
pub async fn reset_filters(State(state): State<AppState>) -> Json<FilterSelection> {
    let mut selection = state.selection.write();
    *selection = FilterSelection::reset();
    Json(selection.clone())
}

// ─── Comparison ─────────────────────────────────────────────────────────────

#[derive(Deserialize)]
pub struct ComparisonRequest {
    #[serde(flatten)]
    pub mode: ComparisonMode,
    /// Anchor date for relative modes; defaults to today.
    pub as_of: Option<NaiveDate>,
}

#[derive(Serialize)]
pub struct ComparisonResponse {
    pub window: ComparisonWindow,
    pub source: Option<String>,
    pub metrics: Vec<MetricDelta>,
}

/// POST /v1/comparison — period-over-period deltas under the active
/// selection.
pub async fn get_comparison(
    State(state): State<AppState>,
    Json(request): Json<ComparisonRequest>,
) -> Json<ComparisonResponse> {
    let today = request.as_of.unwrap_or_else(|| Utc::now().date_naive());
    let window = resolve_periods_with_fallback(
        &request.mode,
        today,
        state.config.comparison.fallback_days,
    );

    let data = state.store.snapshot();
    let selection = state.selection.read().clone();
    // Window filtering needs day-level dates, which pre-aggregated
    // accelerants do not guarantee.
    let resolution = resolve(&data.sources, &selection, &[Dimension::Date]);

    let current = snapshot(
        resolution
            .records
            .iter()
            .copied()
            .filter(|r| window.current.contains(r.date)),
    );
    let previous = snapshot(
        resolution
            .records
            .iter()
            .copied()
            .filter(|r| window.previous.contains(r.date)),
    );

    Json(ComparisonResponse {
        window,
        source: resolution.source.map(str::to_string),
        metrics: compare(&current, &previous),
    })
}

// ─── Probes ─────────────────────────────────────────────────────────────────

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub node_id: String,
    pub uptime_secs: u64,
    pub generation: u64,
}

/// GET /health — health check endpoint.
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        node_id: state.config.node_id.clone(),
        uptime_secs: state.start_time.elapsed().as_secs(),
        generation: state.store.snapshot().generation,
    })
}

/// GET /ready — readiness probe.
pub async fn readiness(State(state): State<AppState>) -> StatusCode {
    if state.start_time.elapsed().as_secs() > 0 {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    }
}

/// GET /live — liveness probe.
pub async fn liveness() -> StatusCode {
    StatusCode::OK
}

// ─── Query parsing ──────────────────────────────────────────────────────────

fn parse_dimensions(raw: &str) -> Result<Vec<Dimension>, String> {
    let dims: Result<Vec<Dimension>, String> = raw
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(parse_dimension)
        .collect();
    let dims = dims?;
    if dims.is_empty() {
        return Err("group_by must list at least one dimension".to_string());
    }
    Ok(dims)
}

fn parse_dimension(name: &str) -> Result<Dimension, String> {
    match name {
        "date" => Ok(Dimension::Date),
        "month" => Ok(Dimension::Month),
        "platform" => Ok(Dimension::Platform),
        "channel" => Ok(Dimension::Channel),
        "funnel_stage" => Ok(Dimension::FunnelStage),
        "device" => Ok(Dimension::Device),
        "region" => Ok(Dimension::Region),
        "ad_type" => Ok(Dimension::AdType),
        "placement" => Ok(Dimension::Placement),
        other => Err(format!("unknown dimension '{other}'")),
    }
}

fn parse_metric(name: &str) -> Result<Metric, String> {
    match name {
        "spend" => Ok(Metric::Spend),
        "impressions" => Ok(Metric::Impressions),
        "clicks" => Ok(Metric::Clicks),
        "conversions" => Ok(Metric::Conversions),
        "revenue" => Ok(Metric::Revenue),
        "reach" => Ok(Metric::Reach),
        "ctr" => Ok(Metric::Ctr),
        "cpc" => Ok(Metric::Cpc),
        "cpm" => Ok(Metric::Cpm),
        "cpa" => Ok(Metric::Cpa),
        "conversion_rate" => Ok(Metric::ConversionRate),
        "roas" => Ok(Metric::Roas),
        other => Err(format!("unknown metric '{other}'")),
    }
}
