//! Vote handler

use axum::{extract::rejection::JsonRejection, extract::State, Json};
use serde::Deserialize;

use super::{json_body, parse_uuid, required};
use crate::AppState;
use campusrate_common::{
    auth::AuthContext,
    errors::Result,
    services::{VotableRef, VotableType, VoteCounts, VoteType},
};

/// Body of `POST /votes`
#[derive(Debug, Deserialize)]
pub struct VoteRequest {
    pub votable_type: Option<String>,
    pub votable_id: Option<String>,
    pub vote_type: Option<String>,
}

/// Toggle the caller's vote and return the target's recounted totals
pub async fn cast_vote(
    State(state): State<AppState>,
    auth: AuthContext,
    payload: std::result::Result<Json<VoteRequest>, JsonRejection>,
) -> Result<Json<VoteCounts>> {
    let request = json_body(payload)?;

    let kind: VotableType = required(request.votable_type, "votable_type")?.parse()?;
    let id = parse_uuid(&required(request.votable_id, "votable_id")?, "votable_id")?;
    let vote_type: VoteType = required(request.vote_type, "vote_type")?.parse()?;

    let counts = state
        .votes()
        .cast_vote(&auth, VotableRef::new(kind, id), vote_type)
        .await?;

    Ok(Json(counts))
}
