use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap, HashSet};
use validator::Validate;

use crate::error::{Error, Result};
use crate::models::problem::{Difficulty, Problem};
use crate::models::progress::ProgressStatus;
use crate::services::catalog_service::{CatalogFilter, CatalogView, Page, SortOrder};

/// Query string of the stateless problem listing. `topics` is a
/// comma-separated list.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProblemListQuery {
    pub difficulty: Option<String>,
    pub topics: Option<String>,
    pub search: Option<String>,
    pub sort: Option<String>,
    pub page: Option<usize>,
}

/// `None`, blank, `any` and `all` (any case) leave difficulty unfiltered.
pub fn parse_difficulty(raw: Option<&str>) -> Result<Option<Difficulty>> {
    match raw.map(str::trim) {
        None | Some("") => Ok(None),
        Some(raw) if raw.eq_ignore_ascii_case("any") || raw.eq_ignore_ascii_case("all") => Ok(None),
        Some(raw) => raw.parse::<Difficulty>().map(Some),
    }
}

fn topic_set<'a>(topics: impl Iterator<Item = &'a str>) -> BTreeSet<String> {
    topics
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

impl ProblemListQuery {
    pub fn filter(&self) -> Result<CatalogFilter> {
        Ok(CatalogFilter {
            difficulty: parse_difficulty(self.difficulty.as_deref())?,
            topics: topic_set(self.topics.as_deref().unwrap_or_default().split(',')),
            search: self.search.clone(),
        })
    }

    pub fn sort(&self) -> Result<SortOrder> {
        self.sort.as_deref().unwrap_or_default().parse()
    }
}

/// Row shown in catalog listings.
#[derive(Debug, Clone, Serialize)]
pub struct CatalogEntry {
    pub id: String,
    pub title: String,
    pub difficulty: Difficulty,
    pub topics: Vec<String>,
    pub problem_summary: String,
    pub status: ProgressStatus,
    pub is_favorite: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub selected: Option<bool>,
}

/// Per-user decorations applied to catalog rows.
#[derive(Debug, Clone, Default)]
pub struct UserMarks {
    pub statuses: HashMap<String, ProgressStatus>,
    pub favorites: HashSet<String>,
}

impl UserMarks {
    pub fn entry(&self, problem: &Problem, selected: Option<bool>) -> CatalogEntry {
        CatalogEntry {
            id: problem.id.clone(),
            title: problem.title.clone(),
            difficulty: problem.difficulty,
            topics: problem.topics.clone(),
            problem_summary: problem.problem_summary.clone(),
            status: self
                .statuses
                .get(&problem.id)
                .copied()
                .unwrap_or(ProgressStatus::NotAttempted),
            is_favorite: self.favorites.contains(&problem.id),
            selected,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CatalogViewResponse {
    pub filter: CatalogFilter,
    pub sort: SortOrder,
    pub available_topics: Vec<String>,
    pub page: Page<CatalogEntry>,
    pub selection: Vec<String>,
}

impl CatalogViewResponse {
    pub fn render(view: &CatalogView, marks: &UserMarks) -> Self {
        let available_topics: BTreeSet<String> = view
            .problems()
            .iter()
            .flat_map(|p| p.topics.iter().cloned())
            .collect();

        Self {
            filter: view.filter().clone(),
            sort: view.sort(),
            available_topics: available_topics.into_iter().collect(),
            page: view
                .current_page()
                .map(|p| marks.entry(p, Some(view.is_selected(&p.id)))),
            selection: view.selection().to_vec(),
        }
    }
}

/// Body of `PUT /api/catalog/filter`; accepts the same difficulty spellings
/// as the listing query.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateFilterRequest {
    #[serde(default)]
    pub difficulty: Option<String>,
    #[serde(default)]
    pub topics: Vec<String>,
    #[serde(default)]
    pub search: Option<String>,
}

impl UpdateFilterRequest {
    pub fn filter(&self) -> Result<CatalogFilter> {
        Ok(CatalogFilter {
            difficulty: parse_difficulty(self.difficulty.as_deref())?,
            topics: topic_set(self.topics.iter().map(String::as_str)),
            search: self.search.clone(),
        })
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpdateSortRequest {
    pub sort: SortOrder,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct GoToPageRequest {
    #[validate(range(min = 1))]
    pub page: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct SelectionToggleResponse {
    pub problem_id: String,
    pub selected: bool,
    pub selection: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct BulkFavoriteResponse {
    pub added: u64,
    pub already_favorite: u64,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct SelectionQuizSetRequest {
    #[validate(length(max = 200))]
    pub name: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    #[default]
    Json,
    Xlsx,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ExportQuery {
    #[serde(default)]
    pub format: ExportFormat,
}

pub fn require_selection(ids: &[String]) -> Result<()> {
    if ids.is_empty() {
        return Err(Error::BadRequest(
            crate::services::quiz_set_service::EMPTY_SELECTION_PROMPT.to_string(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn query_parses_topics_and_difficulty() {
        let query = ProblemListQuery {
            difficulty: Some("Medium".to_string()),
            topics: Some(" graphs, ,dp ".to_string()),
            search: Some("path".to_string()),
            sort: Some("title".to_string()),
            page: Some(2),
        };
        let filter = query.filter().unwrap();
        assert_eq!(filter.difficulty, Some(Difficulty::Medium));
        assert_eq!(
            filter.topics.into_iter().collect::<Vec<_>>(),
            vec!["dp".to_string(), "graphs".to_string()]
        );
        assert_eq!(query.sort().unwrap(), SortOrder::Title);
    }

    #[test]
    fn any_difficulty_means_no_filter() {
        let query = ProblemListQuery {
            difficulty: Some("any".to_string()),
            ..Default::default()
        };
        assert_eq!(query.filter().unwrap(), CatalogFilter::default());
        assert_eq!(query.sort().unwrap(), SortOrder::Default);
    }

    #[test]
    fn filter_body_accepts_any_and_mixed_case() {
        let body: UpdateFilterRequest = serde_json::from_value(serde_json::json!({
            "difficulty": "any",
            "topics": ["design", " "]
        }))
        .unwrap();
        let filter = body.filter().unwrap();
        assert_eq!(filter.difficulty, None);
        assert_eq!(filter.topics.into_iter().collect::<Vec<_>>(), vec!["design".to_string()]);

        let body: UpdateFilterRequest =
            serde_json::from_value(serde_json::json!({ "difficulty": "Easy" })).unwrap();
        assert_eq!(body.filter().unwrap().difficulty, Some(Difficulty::Easy));

        let body: UpdateFilterRequest =
            serde_json::from_value(serde_json::json!({ "difficulty": "ANY" })).unwrap();
        assert_eq!(body.filter().unwrap(), CatalogFilter::default());
    }

    #[test]
    fn unknown_difficulty_is_bad_request() {
        let query = ProblemListQuery {
            difficulty: Some("extreme".to_string()),
            ..Default::default()
        };
        assert!(matches!(query.filter(), Err(Error::BadRequest(_))));
    }

    #[test]
    fn entry_carries_user_marks() {
        let problem = crate::models::problem::fixture("p1", "Two Sum", Difficulty::Easy, &["arrays"]);
        let mut marks = UserMarks::default();
        marks.statuses.insert("p1".to_string(), ProgressStatus::Completed);
        marks.favorites.insert("p1".to_string());

        let entry = marks.entry(&problem, None);
        assert_eq!(entry.status, ProgressStatus::Completed);
        assert!(entry.is_favorite);

        let empty = UserMarks::default().entry(&problem, Some(true));
        assert_eq!(empty.status, ProgressStatus::NotAttempted);
        assert!(!empty.is_favorite);
        assert_eq!(empty.selected, Some(true));
    }
}
