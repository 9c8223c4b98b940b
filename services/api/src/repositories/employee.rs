//! Employee repository for database operations

use common::error::{DatabaseError, DatabaseResult};
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use crate::models::employee::{Employee, next_rating};

/// Name of the unique constraint allowing one encouragement per user and employee
pub const ENCOURAGEMENTS_USER_EMPLOYEE_KEY: &str = "employee_encouragements_user_employee_key";

const EMPLOYEE_COLUMNS: &str = "id, employee_code, name, job, zone, main_area, age, photo_url, \
    rating, total_ratings, is_active, user_id, created_at, updated_at";

/// Validated encouragement ready to be stored
#[derive(Debug, Clone)]
pub struct EncouragementInsert<'a> {
    pub employee_id: Uuid,
    pub username: &'a str,
    pub address: &'a str,
    pub rating: i16,
    pub description: Option<&'a str>,
}

/// Employee repository
#[derive(Clone)]
pub struct EmployeeRepository {
    pool: PgPool,
}

impl EmployeeRepository {
    /// Create a new employee repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Active employees, best rated first
    pub async fn list_active(&self) -> DatabaseResult<Vec<Employee>> {
        let employees = sqlx::query_as::<_, Employee>(&format!(
            "SELECT {EMPLOYEE_COLUMNS} FROM employees WHERE is_active ORDER BY rating DESC, name"
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(employees)
    }

    pub async fn find_by_id(&self, id: Uuid) -> DatabaseResult<Option<Employee>> {
        let employee = sqlx::query_as::<_, Employee>(&format!(
            "SELECT {EMPLOYEE_COLUMNS} FROM employees WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(employee)
    }

    /// Store an encouragement and fold its rating into the employee aggregate
    ///
    /// Runs in one transaction. The employee row is locked before the insert,
    /// so concurrent raters are applied one after another. A repeat rating
    /// fails with a uniqueness violation on
    /// [`ENCOURAGEMENTS_USER_EMPLOYEE_KEY`] and leaves the aggregate untouched.
    /// Returns `None` when there is no active employee with that id.
    pub async fn record_encouragement(
        &self,
        user_id: Uuid,
        encouragement: &EncouragementInsert<'_>,
    ) -> DatabaseResult<Option<Employee>> {
        let mut tx = self.pool.begin().await.map_err(DatabaseError::Connection)?;

        // NO KEY UPDATE does not conflict with the KEY SHARE lock the
        // encouragement's foreign key check takes on the same row
        let aggregate = sqlx::query_as::<_, (f64, i32)>(
            r#"
            SELECT rating, total_ratings
            FROM employees
            WHERE id = $1 AND is_active
            FOR NO KEY UPDATE
            "#,
        )
        .bind(encouragement.employee_id)
        .fetch_optional(&mut *tx)
        .await?;

        let Some((rating, total_ratings)) = aggregate else {
            return Ok(None);
        };

        sqlx::query(
            r#"
            INSERT INTO employee_encouragements
                (employee_id, user_id, username, address, rating, description)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(encouragement.employee_id)
        .bind(user_id)
        .bind(encouragement.username)
        .bind(encouragement.address)
        .bind(encouragement.rating)
        .bind(encouragement.description)
        .execute(&mut *tx)
        .await?;

        let (rating, total_ratings) = next_rating(rating, total_ratings, encouragement.rating);

        let employee = sqlx::query_as::<_, Employee>(&format!(
            r#"
            UPDATE employees
            SET rating = $2, total_ratings = $3, updated_at = NOW()
            WHERE id = $1
            RETURNING {EMPLOYEE_COLUMNS}
            "#
        ))
        .bind(encouragement.employee_id)
        .bind(rating)
        .bind(total_ratings)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        info!(
            "Employee {} now rated {:.2} over {} ratings",
            employee.id, employee.rating, employee.total_ratings
        );
        Ok(Some(employee))
    }

    /// Replace an employee's photo
    pub async fn update_photo(
        &self,
        id: Uuid,
        photo_url: &str,
    ) -> DatabaseResult<Option<Employee>> {
        let employee = sqlx::query_as::<_, Employee>(&format!(
            r#"
            UPDATE employees
            SET photo_url = $2, updated_at = NOW()
            WHERE id = $1
            RETURNING {EMPLOYEE_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(photo_url)
        .fetch_optional(&self.pool)
        .await?;

        Ok(employee)
    }
}
