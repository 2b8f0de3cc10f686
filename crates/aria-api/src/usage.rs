// Usage-summary dashboard route: today's Cost Governor budget status for
// a user, the same view the chat route consults before every LLM call.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;
use utoipa::ToSchema;

use crate::AppState;

pub fn routes(state: AppState) -> Router {
    Router::new()
        .route("/v1/users/:user_id/usage", get(get_usage))
        .with_state(state)
}

#[derive(Debug, Serialize, ToSchema)]
pub struct UsageSummary {
    pub tokens_used_today: u64,
    pub daily_token_budget: u64,
    pub thinking_tokens_used_today: u64,
    pub daily_thinking_budget: u64,
    pub percent_used: f64,
    pub should_reduce_effort: bool,
    pub budget_exceeded: bool,
}

/// GET /v1/users/{user_id}/usage
#[utoipa::path(
    get,
    path = "/v1/users/{user_id}/usage",
    params(("user_id" = String, Path, description = "User ID")),
    responses((status = 200, description = "Today's budget status", body = UsageSummary)),
    tag = "usage"
)]
async fn get_usage(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<Json<UsageSummary>, StatusCode> {
    let status = state
        .cost_governor
        .check_budget(&user_id)
        .await
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;

    Ok(Json(UsageSummary {
        tokens_used_today: status.tokens_used_today,
        daily_token_budget: status.daily_token_budget,
        thinking_tokens_used_today: status.thinking_tokens_used_today,
        daily_thinking_budget: status.daily_thinking_budget,
        percent_used: status.percent_used,
        should_reduce_effort: status.should_reduce_effort,
        budget_exceeded: status.budget_exceeded,
    }))
}
