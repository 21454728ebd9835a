use axum::{extract::State, Extension, Json};
use pulse_core::{InstagramCredentials, SearchCredentials};
use pulse_sentiment::{AggregateReport, AggregateRequest};
use serde::Deserialize;

use crate::middleware::RequestId;

use super::{ApiResponse, AppState, ResponseMeta};

/// Body of `POST /api/v1/analyze`. Every field is optional; a missing
/// provider bundle skips that provider.
#[derive(Debug, Default, Deserialize)]
pub(super) struct AnalyzeBody {
    #[serde(default)]
    pub instagram: Option<InstagramCredentials>,
    #[serde(default)]
    pub search: Option<SearchCredentials>,
    #[serde(default)]
    pub query: Option<String>,
    #[serde(default)]
    pub count: Option<u32>,
}

impl AnalyzeBody {
    fn into_request(self, state: &AppState) -> AggregateRequest {
        let query = self
            .query
            .filter(|q| !q.trim().is_empty())
            .unwrap_or_else(|| state.default_query.clone());
        AggregateRequest {
            instagram: self.instagram,
            search: self.search,
            query,
            count: self.count.unwrap_or(state.default_count),
        }
    }
}

pub(super) async fn analyze(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Json(body): Json<AnalyzeBody>,
) -> Json<ApiResponse<AggregateReport>> {
    let request = body.into_request(&state);
    tracing::info!(
        request_id = %req_id.0,
        query = %request.query,
        count = request.count,
        instagram = request.instagram.is_some(),
        search = request.search.is_some(),
        "analyze request"
    );

    let report = state.aggregator.aggregate(&request).await;

    Json(ApiResponse {
        data: report,
        meta: ResponseMeta::new(req_id.0),
    })
}
