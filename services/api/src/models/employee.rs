//! Employee and encouragement models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Sanitation worker
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Employee {
    pub id: Uuid,
    pub employee_code: String,
    pub name: String,
    pub job: String,
    pub zone: String,
    pub main_area: Option<String>,
    pub age: Option<i32>,
    pub photo_url: Option<String>,
    /// Mean of every encouragement received, unrounded
    pub rating: f64,
    pub total_ratings: i32,
    pub is_active: bool,
    pub user_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Encouragement form
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewEncouragement {
    pub employee_id: Uuid,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub address: String,
    /// Any integer parses; the 1..=5 range is checked before writing
    pub rating: i64,
    pub description: Option<String>,
}

/// Request to attach an uploaded photo to an employee record
#[derive(Debug, Clone, Deserialize)]
pub struct EmployeePhotoUpdate {
    pub photo_url: String,
}

/// Aggregate after one more rating: the weighted mean and the new count
pub fn next_rating(rating: f64, total_ratings: i32, submitted: i16) -> (f64, i32) {
    let total = total_ratings.max(0);
    let next_total = total + 1;
    let mean = (rating * f64::from(total) + f64::from(submitted)) / f64::from(next_total);
    (mean, next_total)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_rating_becomes_the_mean() {
        assert_eq!(next_rating(0.0, 0, 4), (4.0, 1));
    }

    #[test]
    fn test_weighted_mean_over_all_aggregates() {
        for total in 0..50 {
            for old in [1.0, 2.5, 3.75, 5.0] {
                for submitted in 1..=5_i16 {
                    let (mean, count) = next_rating(old, total, submitted);
                    let expected =
                        (old * f64::from(total) + f64::from(submitted)) / f64::from(total + 1);
                    assert!((mean - expected).abs() < 1e-12);
                    assert_eq!(count, total + 1);
                    assert!((1.0..=5.0).contains(&mean));
                }
            }
        }
    }

    #[test]
    fn test_mean_is_not_rounded() {
        let (mean, count) = next_rating(4.0, 2, 5);
        assert_eq!(count, 3);
        assert!((mean - 13.0 / 3.0).abs() < 1e-12);
    }
}
