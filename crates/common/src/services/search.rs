//! Search dispatch
//!
//! Fans a free-text query out to the requested entity kinds with a
//! case-insensitive substring match per kind. No ranking: rows come back in
//! whatever order the store yields them.

use crate::db::models::{Building, Cafe, Course, Professor};
use crate::errors::{AppError, Result};
use crate::metrics;
use crate::store::Store;
use serde::Serialize;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Instant;

/// Which kinds a search covers
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SearchScope {
    #[default]
    All,
    Professors,
    Courses,
    Buildings,
    Cafes,
}

impl SearchScope {
    pub fn as_str(&self) -> &'static str {
        match self {
            SearchScope::All => "all",
            SearchScope::Professors => "professors",
            SearchScope::Courses => "courses",
            SearchScope::Buildings => "buildings",
            SearchScope::Cafes => "cafes",
        }
    }

    fn includes(&self, kind: SearchScope) -> bool {
        *self == SearchScope::All || *self == kind
    }
}

impl FromStr for SearchScope {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "all" => Ok(SearchScope::All),
            "professors" => Ok(SearchScope::Professors),
            "courses" => Ok(SearchScope::Courses),
            "buildings" => Ok(SearchScope::Buildings),
            "cafes" => Ok(SearchScope::Cafes),
            other => Err(AppError::Validation {
                message: format!("unknown search type '{}'", other),
                field: Some("type".to_string()),
            }),
        }
    }
}

/// Matches grouped by kind; kinds outside the scope are absent from the JSON
#[derive(Debug, Clone, Default, Serialize)]
pub struct SearchResults {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub professors: Option<Vec<Professor>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub courses: Option<Vec<Course>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub buildings: Option<Vec<Building>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub cafes: Option<Vec<Cafe>>,
}

impl SearchResults {
    /// Total rows across all kinds
    pub fn total(&self) -> usize {
        self.professors.as_ref().map_or(0, Vec::len)
            + self.courses.as_ref().map_or(0, Vec::len)
            + self.buildings.as_ref().map_or(0, Vec::len)
            + self.cafes.as_ref().map_or(0, Vec::len)
    }

    /// Each in-scope kind mapped to an empty list
    fn empty(scope: SearchScope) -> Self {
        Self {
            professors: scope.includes(SearchScope::Professors).then(Vec::new),
            courses: scope.includes(SearchScope::Courses).then(Vec::new),
            buildings: scope.includes(SearchScope::Buildings).then(Vec::new),
            cafes: scope.includes(SearchScope::Cafes).then(Vec::new),
        }
    }
}

/// Search operations over a [`Store`]
#[derive(Clone)]
pub struct SearchService {
    store: Arc<dyn Store>,
}

impl SearchService {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    /// Run one substring query per in-scope kind, each capped at `limit`
    pub async fn search(&self, query: &str, scope: SearchScope, limit: u64) -> Result<SearchResults> {
        let start = Instant::now();
        let needle = query.trim();

        if needle.is_empty() {
            return Ok(SearchResults::empty(scope));
        }

        let store = &self.store;
        let (professors, courses, buildings, cafes) = futures::try_join!(
            async {
                if scope.includes(SearchScope::Professors) {
                    store.search_professors(needle, limit).await.map(Some)
                } else {
                    Ok(None)
                }
            },
            async {
                if scope.includes(SearchScope::Courses) {
                    store.search_courses(needle, limit).await.map(Some)
                } else {
                    Ok(None)
                }
            },
            async {
                if scope.includes(SearchScope::Buildings) {
                    store.search_buildings(needle, limit).await.map(Some)
                } else {
                    Ok(None)
                }
            },
            async {
                if scope.includes(SearchScope::Cafes) {
                    store.search_cafes(needle, limit).await.map(Some)
                } else {
                    Ok(None)
                }
            },
        )?;

        let results = SearchResults {
            professors,
            courses,
            buildings,
            cafes,
        };

        let elapsed = start.elapsed();
        metrics::record_search(elapsed.as_secs_f64(), scope.as_str(), results.total());

        tracing::info!(
            query = %needle,
            scope = scope.as_str(),
            limit = limit,
            results = results.total(),
            latency_ms = elapsed.as_millis() as u64,
            "Search completed"
        );

        Ok(results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    async fn seeded() -> Arc<MemoryStore> {
        let store = Arc::new(MemoryStore::new());
        store.insert_course(Course::new("COMP101", "Intro to Computing")).await;
        store.insert_course(Course::new("HIST210", "History of Computation")).await;
        store.insert_course(Course::new("BIO110", "Cell Biology")).await;
        store.insert_course(Course::new("ECON100", "Principles of Economics")).await;
        store.insert_professor(Professor::new("Dr. Compton")).await;
        store.insert_building(Building::new("Computer Science Hall", Some("CSH"))).await;
        store.insert_cafe(Cafe::new("Compass Coffee")).await;
        store
    }

    #[tokio::test]
    async fn test_courses_scope_matches_code_or_name() {
        let store = seeded().await;
        let service = SearchService::new(store);

        let results = service.search("COMP", SearchScope::Courses, 20).await.unwrap();
        let courses = results.courses.clone().unwrap();
        let codes: Vec<_> = courses.iter().map(|c| c.code.as_str()).collect();

        assert_eq!(codes, vec!["COMP101", "HIST210"]);
        assert!(courses.iter().all(|c| {
            c.code.to_lowercase().contains("comp") || c.name.to_lowercase().contains("comp")
        }));

        let json = serde_json::to_value(&results).unwrap();
        let keys: Vec<_> = json.as_object().unwrap().keys().cloned().collect();
        assert_eq!(keys, vec!["courses".to_string()]);
    }

    #[tokio::test]
    async fn test_all_scope_fans_out() {
        let service = SearchService::new(seeded().await);

        let results = service.search("comp", SearchScope::All, 20).await.unwrap();

        assert_eq!(results.professors.as_ref().map(Vec::len), Some(1));
        assert_eq!(results.courses.as_ref().map(Vec::len), Some(2));
        assert_eq!(results.buildings.as_ref().map(Vec::len), Some(1));
        assert_eq!(results.cafes.as_ref().map(Vec::len), Some(1));
        assert_eq!(results.total(), 5);
    }

    #[tokio::test]
    async fn test_limit_caps_each_kind() {
        let service = SearchService::new(seeded().await);
        let results = service.search("o", SearchScope::Courses, 2).await.unwrap();
        assert_eq!(results.courses.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_blank_query_returns_empty_groups() {
        let service = SearchService::new(seeded().await);
        let results = service.search("   ", SearchScope::Cafes, 20).await.unwrap();
        assert_eq!(results.cafes, Some(vec![]));
        assert!(results.courses.is_none());
    }

    #[test]
    fn test_parse_scope() {
        assert_eq!("all".parse::<SearchScope>().unwrap(), SearchScope::All);
        assert_eq!("cafes".parse::<SearchScope>().unwrap(), SearchScope::Cafes);
        assert!("libraries".parse::<SearchScope>().is_err());
    }
}
