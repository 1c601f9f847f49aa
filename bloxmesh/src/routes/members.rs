use axum::{
    extract::{Path, State},
    http::HeaderMap,
    Json,
};
use bloxmesh_core::members::kick_member;
use bloxmesh_models::{
    automation::AutomationDocument,
    roblox::id::{GroupId, UserId},
};

use super::actor;
use crate::{error::ApiError, state::AppState};

pub async fn kick(
    State(state): State<AppState>,
    Path((group_id, user_id)): Path<(u64, u64)>,
    headers: HeaderMap,
) -> Result<Json<AutomationDocument>, ApiError> {
    let actor = actor(&headers);
    let document = kick_member(
        state.roblox.as_ref(),
        &state.database,
        state.audit.as_ref(),
        GroupId(group_id),
        actor.as_deref(),
        UserId(user_id),
    )
    .await?;
    Ok(Json(document))
}
