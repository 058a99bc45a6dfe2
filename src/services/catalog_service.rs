use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::{BTreeSet, HashMap};
use std::str::FromStr;
use std::sync::{Arc, Mutex};

use crate::error::{Error, Result};
use crate::models::problem::{Difficulty, Problem};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CatalogFilter {
    pub difficulty: Option<Difficulty>,
    pub topics: BTreeSet<String>,
    pub search: Option<String>,
}

impl CatalogFilter {
    /// Difficulty AND topic intersection AND case-insensitive title substring.
    /// Inactive predicates always pass.
    pub fn matches(&self, problem: &Problem) -> bool {
        if let Some(difficulty) = self.difficulty {
            if problem.difficulty != difficulty {
                return false;
            }
        }
        if !self.topics.is_empty() && !problem.topics.iter().any(|t| self.topics.contains(t)) {
            return false;
        }
        match self.search_term() {
            Some(term) => problem.title.to_lowercase().contains(&term),
            None => true,
        }
    }

    fn search_term(&self) -> Option<String> {
        self.search
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_lowercase)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    #[default]
    Default,
    Difficulty,
    Title,
}

impl FromStr for SortOrder {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "" | "default" => Ok(SortOrder::Default),
            "difficulty" => Ok(SortOrder::Difficulty),
            "title" => Ok(SortOrder::Title),
            other => Err(Error::BadRequest(format!("Unknown sort order: {}", other))),
        }
    }
}

fn compare_titles(a: &str, b: &str) -> Ordering {
    a.to_lowercase().cmp(&b.to_lowercase())
}

/// Derives the visible list without touching the source collection.
/// Both sorts are stable: equal keys keep catalog order.
pub fn visible<'a>(problems: &'a [Problem], filter: &CatalogFilter, sort: SortOrder) -> Vec<&'a Problem> {
    let mut items: Vec<&Problem> = problems.iter().filter(|p| filter.matches(p)).collect();
    match sort {
        SortOrder::Default => {}
        SortOrder::Difficulty => items.sort_by_key(|p| p.difficulty),
        SortOrder::Title => items.sort_by(|a, b| compare_titles(&a.title, &b.title)),
    }
    items
}

#[derive(Debug, Clone, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: usize,
    pub per_page: usize,
    pub total: usize,
    pub total_pages: usize,
}

impl<T> Page<T> {
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            page: self.page,
            per_page: self.per_page,
            total: self.total,
            total_pages: self.total_pages,
        }
    }
}

pub fn total_pages(total: usize, per_page: usize) -> usize {
    if per_page == 0 {
        0
    } else {
        total.div_ceil(per_page)
    }
}

pub fn clamp_page(requested: usize, total_pages: usize) -> usize {
    requested.clamp(1, total_pages.max(1))
}

pub fn paginate<T: Clone>(items: &[T], page: usize, per_page: usize) -> Page<T> {
    let per_page = per_page.max(1);
    let total_pages = total_pages(items.len(), per_page);
    let page = clamp_page(page, total_pages);
    let start = (page - 1) * per_page;
    let end = (start + per_page).min(items.len());

    Page {
        items: items[start..end].to_vec(),
        page,
        per_page,
        total: items.len(),
        total_pages,
    }
}

/// One user's catalog screen: the loaded collection plus filter, sort, page
/// and multi-select state.
#[derive(Debug, Clone)]
pub struct CatalogView {
    problems: Arc<Vec<Problem>>,
    filter: CatalogFilter,
    sort: SortOrder,
    page: usize,
    per_page: usize,
    visible_len: usize,
    selection: Vec<String>,
    touched_at: DateTime<Utc>,
}

impl CatalogView {
    pub fn new(problems: Arc<Vec<Problem>>, per_page: usize, now: DateTime<Utc>) -> Self {
        let visible_len = problems.len();
        Self {
            problems,
            filter: CatalogFilter::default(),
            sort: SortOrder::Default,
            page: 1,
            per_page: per_page.max(1),
            visible_len,
            selection: Vec::new(),
            touched_at: now,
        }
    }

    pub fn problems(&self) -> &[Problem] {
        &self.problems
    }

    pub fn filter(&self) -> &CatalogFilter {
        &self.filter
    }

    pub fn sort(&self) -> SortOrder {
        self.sort
    }

    pub fn visible(&self) -> Vec<&Problem> {
        visible(&self.problems, &self.filter, self.sort)
    }

    pub fn set_filter(&mut self, filter: CatalogFilter) {
        self.filter = filter;
        self.refresh();
    }

    pub fn set_sort(&mut self, sort: SortOrder) {
        self.sort = sort;
        self.refresh();
    }

    /// Swaps in a freshly loaded collection, dropping selected ids that no
    /// longer exist.
    pub fn replace_collection(&mut self, problems: Arc<Vec<Problem>>) {
        self.problems = problems;
        let problems = Arc::clone(&self.problems);
        self.selection.retain(|id| problems.iter().any(|p| &p.id == id));
        self.refresh();
    }

    fn refresh(&mut self) {
        let len = self.visible().len();
        if len != self.visible_len {
            self.visible_len = len;
            self.page = 1;
        }
    }

    pub fn total_pages(&self) -> usize {
        total_pages(self.visible_len, self.per_page)
    }

    /// Out-of-range requests are clamped to `[1, total_pages]`.
    pub fn go_to_page(&mut self, page: usize) -> usize {
        self.page = clamp_page(page, self.total_pages());
        self.page
    }

    /// Borrows from the loaded collection; callers copy out only what they render.
    pub fn current_page(&self) -> Page<&Problem> {
        paginate(&self.visible(), self.page, self.per_page)
    }

    pub fn toggle_selection(&mut self, problem_id: &str) -> Result<bool> {
        if !self.problems.iter().any(|p| p.id == problem_id) {
            return Err(Error::NotFound(format!("Problem {} not found", problem_id)));
        }
        if let Some(pos) = self.selection.iter().position(|id| id == problem_id) {
            self.selection.remove(pos);
            Ok(false)
        } else {
            self.selection.push(problem_id.to_string());
            Ok(true)
        }
    }

    pub fn selection(&self) -> &[String] {
        &self.selection
    }

    pub fn is_selected(&self, problem_id: &str) -> bool {
        self.selection.iter().any(|id| id == problem_id)
    }

    pub fn clear_selection(&mut self) {
        self.selection.clear();
    }

    /// Full records of the selection, in catalog order.
    pub fn selected_problems(&self) -> Vec<Problem> {
        self.problems
            .iter()
            .filter(|p| self.is_selected(&p.id))
            .cloned()
            .collect()
    }

    fn touch(&mut self, now: DateTime<Utc>) {
        self.touched_at = now;
    }
}

/// Catalog views keyed by user id.
#[derive(Clone, Default)]
pub struct CatalogWorkspaces {
    views: Arc<Mutex<HashMap<String, CatalogView>>>,
}

impl CatalogWorkspaces {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, CatalogView>> {
        self.views.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn contains(&self, user_id: &str) -> bool {
        self.lock().contains_key(user_id)
    }

    /// Keeps an existing view if another request created one first.
    pub fn insert_if_absent(&self, user_id: &str, view: CatalogView) {
        self.lock().entry(user_id.to_string()).or_insert(view);
    }

    pub fn with_view<R>(
        &self,
        user_id: &str,
        now: DateTime<Utc>,
        f: impl FnOnce(&mut CatalogView) -> R,
    ) -> Result<R> {
        let mut views = self.lock();
        let view = views
            .get_mut(user_id)
            .ok_or_else(|| Error::NotFound("Catalog has not been loaded".to_string()))?;
        view.touch(now);
        Ok(f(view))
    }

    pub fn remove(&self, user_id: &str) -> bool {
        self.lock().remove(user_id).is_some()
    }

    pub fn evict_idle(&self, cutoff: DateTime<Utc>) -> usize {
        let mut views = self.lock();
        let before = views.len();
        views.retain(|_, view| view.touched_at >= cutoff);
        before - views.len()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
