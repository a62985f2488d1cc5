//! Search handler

use axum::{
    extract::rejection::QueryRejection,
    extract::{Query, State},
    Json,
};
use serde::Deserialize;
use validator::Validate;

use super::query_params;
use crate::AppState;
use campusrate_common::{
    errors::{AppError, Result},
    services::{SearchResults, SearchScope},
};

/// `GET /search?query=&type=all&limit=20`
#[derive(Debug, Default, Deserialize, Validate)]
pub struct SearchParams {
    #[serde(default)]
    #[validate(length(max = 200))]
    pub query: Option<String>,

    /// all | professors | courses | buildings | cafes
    #[serde(rename = "type")]
    pub kind: Option<String>,

    /// Kept as text so a malformed value yields our own 400
    pub limit: Option<String>,
}

impl SearchParams {
    fn scope(&self) -> Result<SearchScope> {
        match self.kind.as_deref().filter(|k| !k.is_empty()) {
            Some(kind) => kind.parse(),
            None => Ok(SearchScope::All),
        }
    }

    fn requested_limit(&self) -> Result<Option<u64>> {
        self.limit
            .as_deref()
            .filter(|l| !l.is_empty())
            .map(|l| {
                l.trim().parse::<u64>().map_err(|_| AppError::InvalidFormat {
                    message: format!("limit must be a non-negative integer, got '{}'", l),
                })
            })
            .transpose()
    }
}

pub async fn search(
    State(state): State<AppState>,
    params: std::result::Result<Query<SearchParams>, QueryRejection>,
) -> Result<Json<SearchResults>> {
    let params = query_params(params)?;
    params.validate()?;

    let scope = params.scope()?;
    let limit = state.config.search_limit(params.requested_limit()?);
    let query = params.query.unwrap_or_default();

    let results = state.search().search(&query, scope, limit).await?;

    Ok(Json(results))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_params_defaults() {
        let params = SearchParams::default();
        assert_eq!(params.scope().unwrap(), SearchScope::All);
        assert_eq!(params.requested_limit().unwrap(), None);
    }

    #[test]
    fn test_params_parsing() {
        let params = SearchParams {
            query: Some("comp".into()),
            kind: Some("courses".into()),
            limit: Some("5".into()),
        };
        assert_eq!(params.scope().unwrap(), SearchScope::Courses);
        assert_eq!(params.requested_limit().unwrap(), Some(5));

        let bad = SearchParams {
            limit: Some("ten".into()),
            kind: Some("rooms".into()),
            ..Default::default()
        };
        assert!(bad.requested_limit().is_err());
        assert!(bad.scope().is_err());
    }
}
