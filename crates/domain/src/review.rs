use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const MIN_RATING: i16 = 1;
pub const MAX_RATING: i16 = 5;
pub const MIN_COMMENT_LEN: usize = 10;
pub const MAX_COMMENT_LEN: usize = 500;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ReviewError {
    #[error("rating must be an integer between 1 and 5")]
    RatingOutOfRange,
    #[error("comment must be between 10 and 500 characters")]
    CommentLength,
}

/// Bounds-checks a review submission: star rating in [1,5], comment length
/// in [10,500] characters.
pub fn validate_review(rating: i16, comment: &str) -> Result<(), ReviewError> {
    if !(MIN_RATING..=MAX_RATING).contains(&rating) {
        return Err(ReviewError::RatingOutOfRange);
    }
    let len = comment.chars().count();
    if !(MIN_COMMENT_LEN..=MAX_COMMENT_LEN).contains(&len) {
        return Err(ReviewError::CommentLength);
    }
    Ok(())
}

/// Read-side aggregation over a product's reviews. Computed on demand,
/// never stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReviewStatistics {
    pub count: usize,
    /// Mean rating rounded to one decimal place.
    pub average: f64,
    /// Percentage of reviews per star, five down to one, each rounded to the
    /// nearest integer percent.
    pub distribution: [u32; 5],
}

impl ReviewStatistics {
    /// The zeroed shape returned for products without reviews.
    pub fn empty() -> Self {
        Self {
            count: 0,
            average: 0.0,
            distribution: [0; 5],
        }
    }

    pub fn from_ratings(ratings: &[i16]) -> Self {
        if ratings.is_empty() {
            return Self::empty();
        }

        let count = ratings.len();
        let sum: i64 = ratings.iter().map(|r| i64::from(*r)).sum();
        let average = (sum as f64 / count as f64 * 10.0).round() / 10.0;

        let mut distribution = [0u32; 5];
        for (slot, star) in (MIN_RATING..=MAX_RATING).rev().enumerate() {
            let star_count = ratings.iter().filter(|r| **r == star).count();
            distribution[slot] =
                (star_count as f64 / count as f64 * 100.0).round() as u32;
        }

        Self {
            count,
            average,
            distribution,
        }
    }
}
