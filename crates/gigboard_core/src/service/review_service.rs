//! Review aggregation over all project trees.
//!
//! # Invariants
//! - Ranking is `rating DESC, created_at DESC, review id ASC`.
//! - Pages are 1-based; a page past the end is empty but keeps totals.

use crate::model::project::ProjectId;
use crate::model::task::{Review, TaskId, MAX_RATING, MIN_RATING};
use crate::repo::project_repo::{ProjectRepository, RepoResult};

/// Default reviews per page.
pub const REVIEWS_DEFAULT_PAGE_SIZE: u32 = 10;
/// Hard upper bound on reviews per page.
pub const REVIEWS_PAGE_SIZE_MAX: u32 = 50;

/// Filter and pagination options for review listing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReviewQuery {
    /// Only reviews about this account.
    pub reviewee: Option<String>,
    /// Only reviews rated at least this high.
    pub min_rating: Option<u8>,
    /// 1-based page; `0` is treated as `1`.
    pub page: u32,
    pub page_size: Option<u32>,
}

/// One review with the context it was left in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReviewEntry {
    pub review: Review,
    pub project_id: ProjectId,
    pub project_name: String,
    pub task_id: TaskId,
    pub task_title: String,
}

/// One page of ranked reviews.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReviewPage {
    pub items: Vec<ReviewEntry>,
    /// Matching reviews across all pages.
    pub total: usize,
    pub page: u32,
    pub page_size: u32,
    pub page_count: u32,
}

/// Rating statistics for one reviewee.
#[derive(Debug, Clone, PartialEq)]
pub struct ReviewSummary {
    pub count: usize,
    /// `None` when there are no reviews.
    pub average_rating: Option<f64>,
    /// `distribution[i]` counts reviews rated `i + 1`.
    pub distribution: [usize; 5],
}

/// Read-only review aggregator.
pub struct ReviewService<R: ProjectRepository> {
    repo: R,
    default_page_size: u32,
}

impl<R: ProjectRepository> ReviewService<R> {
    pub fn new(repo: R) -> Self {
        Self {
            repo,
            default_page_size: REVIEWS_DEFAULT_PAGE_SIZE,
        }
    }

    /// Overrides the page size used when a query leaves it unset.
    pub fn with_default_page_size(mut self, page_size: u32) -> Self {
        self.default_page_size = page_size.clamp(1, REVIEWS_PAGE_SIZE_MAX);
        self
    }

    /// Collects, ranks and paginates reviews.
    pub fn list_reviews(&self, query: &ReviewQuery) -> RepoResult<ReviewPage> {
        let mut entries = self.collect(query.reviewee.as_deref())?;
        if let Some(min_rating) = query.min_rating {
            entries.retain(|entry| entry.review.rating >= min_rating);
        }
        entries.sort_by(|a, b| {
            b.review
                .rating
                .cmp(&a.review.rating)
                .then(b.review.created_at.cmp(&a.review.created_at))
                .then(a.review.id.cmp(&b.review.id))
        });

        let page_size = normalize_page_size(query.page_size, self.default_page_size);
        let page = query.page.max(1);
        let total = entries.len();
        let page_count = total.div_ceil(page_size as usize) as u32;
        let skip = (page as usize - 1).saturating_mul(page_size as usize);
        let items = entries
            .into_iter()
            .skip(skip)
            .take(page_size as usize)
            .collect();

        Ok(ReviewPage {
            items,
            total,
            page,
            page_size,
            page_count,
        })
    }

    /// Rating statistics for one reviewee.
    pub fn summary(&self, reviewee: &str) -> RepoResult<ReviewSummary> {
        let entries = self.collect(Some(reviewee))?;
        let mut distribution = [0usize; 5];
        let mut rating_sum = 0u64;
        for entry in &entries {
            let rating = entry.review.rating.clamp(MIN_RATING, MAX_RATING);
            distribution[usize::from(rating - MIN_RATING)] += 1;
            rating_sum += u64::from(rating);
        }
        let count = entries.len();
        let average_rating = (count > 0).then(|| rating_sum as f64 / count as f64);
        Ok(ReviewSummary {
            count,
            average_rating,
            distribution,
        })
    }

    fn collect(&self, reviewee: Option<&str>) -> RepoResult<Vec<ReviewEntry>> {
        let mut entries = Vec::new();
        for project in self.repo.list_projects()? {
            for task in project.tasks() {
                let Some(review) = &task.review else {
                    continue;
                };
                if reviewee.is_some_and(|wanted| review.reviewee != wanted) {
                    continue;
                }
                entries.push(ReviewEntry {
                    review: review.clone(),
                    project_id: project.id,
                    project_name: project.name.clone(),
                    task_id: task.id,
                    task_title: task.title.clone(),
                });
            }
        }
        Ok(entries)
    }
}

/// Normalizes a requested page size against the default and hard cap.
pub fn normalize_page_size(page_size: Option<u32>, default_page_size: u32) -> u32 {
    match page_size {
        Some(0) | None => default_page_size.clamp(1, REVIEWS_PAGE_SIZE_MAX),
        Some(value) if value > REVIEWS_PAGE_SIZE_MAX => REVIEWS_PAGE_SIZE_MAX,
        Some(value) => value,
    }
}

#[cfg(test)]
mod tests {
    use super::{normalize_page_size, REVIEWS_PAGE_SIZE_MAX};

    #[test]
    fn page_size_defaults_and_caps() {
        assert_eq!(normalize_page_size(None, 10), 10);
        assert_eq!(normalize_page_size(Some(0), 10), 10);
        assert_eq!(normalize_page_size(Some(7), 10), 7);
        assert_eq!(
            normalize_page_size(Some(500), 10),
            REVIEWS_PAGE_SIZE_MAX
        );
        assert_eq!(normalize_page_size(None, 0), 1);
    }
}
