//! Request identity and per-caller quota.
//!
//! Every analyze call fans out to one media listing, one comment listing per
//! post and a search request, so callers are budgeted in upstream-request
//! units rather than raw HTTP calls.

use std::{
    collections::{HashMap, HashSet},
    sync::Arc,
    time::{Duration, Instant},
};

use axum::{
    extract::{Request, State},
    http::{
        header::{AUTHORIZATION, RETRY_AFTER},
        HeaderValue,
    },
    middleware::Next,
    response::{IntoResponse, Response},
};
use tokio::sync::Mutex;
use tracing::Instrument;
use uuid::Uuid;

use crate::api::ApiError;

/// Units charged for `POST /api/v1/analyze`.
pub const ANALYZE_COST: u32 = 10;
/// Units charged for `POST /api/v1/instagram/verify` (profile plus permissions).
pub const VERIFY_COST: u32 = 2;

const ANONYMOUS: &str = "anonymous";
const QUOTA_REMAINING_HEADER: &str = "x-quota-remaining";

/// Newtype wrapping a request ID string, stored as a request extension.
#[derive(Debug, Clone)]
pub struct RequestId(pub String);

/// Who the quota is charged to: the presented API key, or a shared
/// anonymous bucket when auth is disabled.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Caller(String);

/// Accepted API keys.
#[derive(Debug, Clone)]
pub struct AuthState {
    api_keys: Arc<HashSet<String>>,
    pub enabled: bool,
}

impl AuthState {
    /// Reads `PULSE_API_KEYS` (comma-separated).
    pub fn from_env(is_development: bool) -> anyhow::Result<Self> {
        let raw = std::env::var("PULSE_API_KEYS").unwrap_or_default();
        Self::from_keys(&raw, is_development)
    }

    /// An empty key list disables auth in development and is an error
    /// anywhere else.
    pub fn from_keys(raw: &str, is_development: bool) -> anyhow::Result<Self> {
        let api_keys: HashSet<String> = raw
            .split(',')
            .map(str::trim)
            .filter(|key| !key.is_empty())
            .map(ToOwned::to_owned)
            .collect();

        let enabled = !api_keys.is_empty();
        if !enabled {
            anyhow::ensure!(
                is_development,
                "PULSE_API_KEYS is required outside development"
            );
            tracing::warn!("PULSE_API_KEYS not set; every caller shares the anonymous quota");
        }

        Ok(Self {
            api_keys: Arc::new(api_keys),
            enabled,
        })
    }

    fn identify(&self, token: Option<&str>) -> Option<Caller> {
        if !self.enabled {
            return Some(Caller(ANONYMOUS.to_owned()));
        }
        token
            .filter(|t| self.api_keys.contains(*t))
            .map(|t| Caller(t.to_owned()))
    }
}

#[derive(Debug, Clone, Copy)]
struct QuotaWindow {
    started_at: Instant,
    spent: u32,
}

/// Per-caller budget of upstream requests, refilled every window.
#[derive(Debug, Clone)]
pub struct CallerQuota {
    units_per_window: u32,
    window: Duration,
    windows: Arc<Mutex<HashMap<Caller, QuotaWindow>>>,
}

impl CallerQuota {
    #[must_use]
    pub fn new(units_per_window: u32, window: Duration) -> Self {
        Self {
            units_per_window,
            window,
            windows: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Charge `cost` units to `caller`.
    ///
    /// Returns the units left in the window, or the wait until the caller's
    /// window resets when the charge does not fit.
    async fn charge(&self, caller: &Caller, cost: u32) -> Result<u32, Duration> {
        let now = Instant::now();
        let mut windows = self.windows.lock().await;
        windows.retain(|_, w| now.duration_since(w.started_at) < self.window);

        let entry = windows.entry(caller.clone()).or_insert(QuotaWindow {
            started_at: now,
            spent: 0,
        });
        if entry.spent.saturating_add(cost) > self.units_per_window {
            return Err(self
                .window
                .saturating_sub(now.duration_since(entry.started_at)));
        }
        entry.spent += cost;
        Ok(self.units_per_window - entry.spent)
    }
}

fn route_cost(path: &str) -> u32 {
    if path.ends_with("/analyze") {
        ANALYZE_COST
    } else if path.ends_with("/verify") {
        VERIFY_COST
    } else {
        1
    }
}

fn request_id_of(req: &Request) -> String {
    req.extensions()
        .get::<RequestId>()
        .map(|id| id.0.clone())
        .unwrap_or_default()
}

/// Assigns a request ID (reusing an incoming `x-request-id`), echoes it on
/// the response and runs the rest of the stack inside a `request` span.
pub async fn request_id(mut req: Request, next: Next) -> Response {
    let id = req
        .headers()
        .get("x-request-id")
        .and_then(|v| v.to_str().ok())
        .map_or_else(|| Uuid::new_v4().to_string(), String::from);

    let span = tracing::info_span!(
        "request",
        request_id = %id,
        method = %req.method(),
        path = %req.uri().path(),
    );
    req.extensions_mut().insert(RequestId(id.clone()));

    let mut res = next.run(req).instrument(span).await;

    if let Ok(val) = HeaderValue::from_str(&id) {
        res.headers_mut().insert("x-request-id", val);
    }
    res
}

/// Resolves the [`Caller`] from the bearer token, rejecting unknown keys.
pub async fn identify_caller(
    State(auth): State<AuthState>,
    mut req: Request,
    next: Next,
) -> Response {
    let token = extract_bearer_token(req.headers().get(AUTHORIZATION));
    let Some(caller) = auth.identify(token) else {
        tracing::warn!("rejected request without a valid api key");
        return ApiError::new(
            request_id_of(&req),
            "unauthorized",
            "missing or invalid bearer token",
        )
        .into_response();
    };

    req.extensions_mut().insert(caller);
    next.run(req).await
}

/// Charges the route's cost against the caller's quota.
pub async fn enforce_caller_quota(
    State(quota): State<CallerQuota>,
    req: Request,
    next: Next,
) -> Response {
    let caller = req
        .extensions()
        .get::<Caller>()
        .cloned()
        .unwrap_or_else(|| Caller(ANONYMOUS.to_owned()));
    let cost = route_cost(req.uri().path());

    match quota.charge(&caller, cost).await {
        Ok(remaining) => {
            let mut res = next.run(req).await;
            res.headers_mut()
                .insert(QUOTA_REMAINING_HEADER, HeaderValue::from(remaining));
            res
        }
        Err(wait) => {
            let retry_after = wait.as_secs() + u64::from(wait.subsec_nanos() > 0);
            tracing::warn!(cost, retry_after_secs = retry_after, "caller quota exhausted");
            let mut res = ApiError::new(
                request_id_of(&req),
                "rate_limited",
                format!("quota exhausted; retry in {retry_after}s"),
            )
            .into_response();
            res.headers_mut()
                .insert(RETRY_AFTER, HeaderValue::from(retry_after));
            res
        }
    }
}

fn extract_bearer_token(value: Option<&HeaderValue>) -> Option<&str> {
    value
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|s| !s.is_empty())
}
