//! Database service for finanzas-service.
//!
//! Every operation takes the acting owner extracted from the bearer token and
//! folds it into the WHERE clause; a record belonging to someone else is
//! indistinguishable from one that does not exist. Each operation is a single
//! statement or a single transaction, so the uniqueness and referential
//! invariants hold under concurrent writers.

use crate::models::{Category, CreateMovement, Movement, UpdateMovement};
use chrono::NaiveDate;
use service_core::error::AppError;
use sqlx::postgres::{PgPool, PgPoolOptions};
use std::time::Duration;
use tracing::{info, instrument};
use uuid::Uuid;

const CATEGORY_COLUMNS: &str = "category_id, user_id, name, color, created_utc";
const MOVEMENT_COLUMNS: &str =
    "movement_id, user_id, category_id, date, amount, kind, note, created_utc";

/// Database connection pool wrapper.
#[derive(Clone)]
pub struct Database {
    pool: PgPool,
}

impl Database {
    /// Create a new database connection pool.
    #[instrument(skip(database_url), fields(service = "finanzas-service"))]
    pub async fn new(
        database_url: &str,
        max_connections: u32,
        min_connections: u32,
    ) -> Result<Self, AppError> {
        info!(
            max_connections = max_connections,
            min_connections = min_connections,
            "Connecting to PostgreSQL"
        );

        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .min_connections(min_connections)
            .acquire_timeout(Duration::from_secs(30))
            .idle_timeout(Duration::from_secs(600))
            .connect(database_url)
            .await
            .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to connect: {}", e)))?;

        info!("PostgreSQL connection pool established");

        Ok(Self { pool })
    }

    /// Check database health.
    #[instrument(skip(self))]
    pub async fn health_check(&self) -> Result<(), AppError> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Health check failed: {}", e)))?;
        Ok(())
    }

    /// Run database migrations.
    #[instrument(skip(self))]
    pub async fn run_migrations(&self) -> Result<(), AppError> {
        info!("Running database migrations");
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Migration failed: {}", e)))?;
        info!("Database migrations completed");
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Category Operations
    // -------------------------------------------------------------------------

    /// Create a new category for the owner.
    ///
    /// A duplicate `(owner, name)` surfaces as a conflict via the unique index
    /// even when two creates race past any earlier check.
    #[instrument(skip(self), fields(user_id = %user_id))]
    pub async fn create_category(
        &self,
        user_id: Uuid,
        name: &str,
        color: Option<&str>,
    ) -> Result<Category, AppError> {
        let category = sqlx::query_as::<_, Category>(&format!(
            "INSERT INTO categories (category_id, user_id, name, color) \
             VALUES ($1, $2, $3, $4) RETURNING {CATEGORY_COLUMNS}"
        ))
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(name)
        .bind(color)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db_err) if db_err.is_unique_violation() => {
                AppError::Conflict(anyhow::anyhow!("Category '{}' already exists", name))
            }
            _ => map_db_error("Failed to create category", e),
        })?;

        info!(category_id = %category.category_id, "Category created");

        Ok(category)
    }

    /// List the owner's categories, name ascending.
    #[instrument(skip(self), fields(user_id = %user_id))]
    pub async fn list_categories(&self, user_id: Uuid) -> Result<Vec<Category>, AppError> {
        let categories = sqlx::query_as::<_, Category>(&format!(
            "SELECT {CATEGORY_COLUMNS} FROM categories WHERE user_id = $1 ORDER BY name"
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_db_error("Failed to list categories", e))?;

        Ok(categories)
    }

    /// Rename or recolor a category owned by `user_id`.
    #[instrument(skip(self), fields(user_id = %user_id, category_id = %category_id))]
    pub async fn update_category(
        &self,
        user_id: Uuid,
        category_id: Uuid,
        name: &str,
        color: Option<&str>,
    ) -> Result<Category, AppError> {
        let category = sqlx::query_as::<_, Category>(&format!(
            "UPDATE categories SET name = $3, color = $4 \
             WHERE category_id = $1 AND user_id = $2 RETURNING {CATEGORY_COLUMNS}"
        ))
        .bind(category_id)
        .bind(user_id)
        .bind(name)
        .bind(color)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db_err) if db_err.is_unique_violation() => {
                AppError::Conflict(anyhow::anyhow!("Category '{}' already exists", name))
            }
            _ => map_db_error("Failed to update category", e),
        })?
        .ok_or_else(category_not_found)?;

        Ok(category)
    }

    /// Delete a category owned by `user_id`.
    ///
    /// Runs in one transaction: a nonexistent (or foreign-owned) id is a plain
    /// not-found; a category still referenced by any movement is refused. The
    /// RESTRICT foreign key backstops a movement insert racing the delete.
    #[instrument(skip(self), fields(user_id = %user_id, category_id = %category_id))]
    pub async fn delete_category(&self, user_id: Uuid, category_id: Uuid) -> Result<(), AppError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| map_db_error("Failed to begin transaction", e))?;

        let owned: Option<i32> = sqlx::query_scalar(
            "SELECT 1 FROM categories WHERE category_id = $1 AND user_id = $2 FOR UPDATE",
        )
        .bind(category_id)
        .bind(user_id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| map_db_error("Failed to lock category", e))?;

        if owned.is_none() {
            return Err(category_not_found());
        }

        let in_use: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM movements WHERE category_id = $1)",
        )
        .bind(category_id)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| map_db_error("Failed to check category references", e))?;

        if in_use {
            return Err(AppError::Conflict(anyhow::anyhow!("category_in_use")));
        }

        sqlx::query("DELETE FROM categories WHERE category_id = $1 AND user_id = $2")
            .bind(category_id)
            .bind(user_id)
            .execute(&mut *tx)
            .await
            .map_err(|e| match e {
                sqlx::Error::Database(ref db_err) if db_err.is_foreign_key_violation() => {
                    AppError::Conflict(anyhow::anyhow!("category_in_use"))
                }
                _ => map_db_error("Failed to delete category", e),
            })?;

        tx.commit()
            .await
            .map_err(|e| map_db_error("Failed to commit transaction", e))?;

        info!(category_id = %category_id, "Category deleted");

        Ok(())
    }

    // -------------------------------------------------------------------------
    // Movement Operations
    // -------------------------------------------------------------------------

    /// Create a new movement.
    ///
    /// The insert only happens when the target category exists and belongs to
    /// the same owner; the guard and the insert are one statement, and the
    /// foreign key settles any race against a concurrent category delete.
    #[instrument(skip(self, input), fields(user_id = %input.user_id, category_id = %input.category_id))]
    pub async fn create_movement(&self, input: &CreateMovement) -> Result<Movement, AppError> {
        let movement = sqlx::query_as::<_, Movement>(&format!(
            "INSERT INTO movements (movement_id, user_id, category_id, date, amount, kind, note) \
             SELECT $1, $2, $3, $4, $5, $6, $7 \
             WHERE EXISTS (SELECT 1 FROM categories WHERE category_id = $3 AND user_id = $2) \
             RETURNING {MOVEMENT_COLUMNS}"
        ))
        .bind(Uuid::new_v4())
        .bind(input.user_id)
        .bind(input.category_id)
        .bind(input.date)
        .bind(input.amount.round_dp(2))
        .bind(input.kind)
        .bind(&input.note)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db_err) if db_err.is_foreign_key_violation() => {
                invalid_category()
            }
            _ => map_db_error("Failed to create movement", e),
        })?
        .ok_or_else(invalid_category)?;

        info!(movement_id = %movement.movement_id, "Movement created");

        Ok(movement)
    }

    /// List the owner's movements, optionally bounded by inclusive dates,
    /// newest first.
    #[instrument(skip(self), fields(user_id = %user_id))]
    pub async fn list_movements(
        &self,
        user_id: Uuid,
        from: Option<NaiveDate>,
        to: Option<NaiveDate>,
    ) -> Result<Vec<Movement>, AppError> {
        let movements = sqlx::query_as::<_, Movement>(&format!(
            "SELECT {MOVEMENT_COLUMNS} FROM movements \
             WHERE user_id = $1 \
               AND ($2::date IS NULL OR date >= $2) \
               AND ($3::date IS NULL OR date <= $3) \
             ORDER BY date DESC, created_utc DESC"
        ))
        .bind(user_id)
        .bind(from)
        .bind(to)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_db_error("Failed to list movements", e))?;

        Ok(movements)
    }

    /// Fetch one movement owned by `user_id`.
    #[instrument(skip(self), fields(user_id = %user_id, movement_id = %movement_id))]
    pub async fn get_movement(
        &self,
        user_id: Uuid,
        movement_id: Uuid,
    ) -> Result<Movement, AppError> {
        sqlx::query_as::<_, Movement>(&format!(
            "SELECT {MOVEMENT_COLUMNS} FROM movements WHERE movement_id = $1 AND user_id = $2"
        ))
        .bind(movement_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_db_error("Failed to get movement", e))?
        .ok_or_else(movement_not_found)
    }

    /// Replace a movement owned by `user_id`.
    ///
    /// A movement the owner does not hold is not-found; a new category the
    /// owner does not hold is an invalid category. Checked and applied inside
    /// one transaction.
    #[instrument(skip(self, input), fields(user_id = %input.user_id, movement_id = %input.movement_id))]
    pub async fn update_movement(&self, input: &UpdateMovement) -> Result<Movement, AppError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| map_db_error("Failed to begin transaction", e))?;

        let owned: Option<i32> = sqlx::query_scalar(
            "SELECT 1 FROM movements WHERE movement_id = $1 AND user_id = $2 FOR UPDATE",
        )
        .bind(input.movement_id)
        .bind(input.user_id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| map_db_error("Failed to lock movement", e))?;

        if owned.is_none() {
            return Err(movement_not_found());
        }

        let category_owned: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM categories WHERE category_id = $1 AND user_id = $2)",
        )
        .bind(input.category_id)
        .bind(input.user_id)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| map_db_error("Failed to check category ownership", e))?;

        if !category_owned {
            return Err(invalid_category());
        }

        let movement = sqlx::query_as::<_, Movement>(&format!(
            "UPDATE movements SET category_id = $3, date = $4, amount = $5, kind = $6, note = $7 \
             WHERE movement_id = $1 AND user_id = $2 RETURNING {MOVEMENT_COLUMNS}"
        ))
        .bind(input.movement_id)
        .bind(input.user_id)
        .bind(input.category_id)
        .bind(input.date)
        .bind(input.amount.round_dp(2))
        .bind(input.kind)
        .bind(&input.note)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db_err) if db_err.is_foreign_key_violation() => {
                invalid_category()
            }
            _ => map_db_error("Failed to update movement", e),
        })?;

        tx.commit()
            .await
            .map_err(|e| map_db_error("Failed to commit transaction", e))?;

        Ok(movement)
    }

    /// Delete a movement owned by `user_id`.
    #[instrument(skip(self), fields(user_id = %user_id, movement_id = %movement_id))]
    pub async fn delete_movement(&self, user_id: Uuid, movement_id: Uuid) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM movements WHERE movement_id = $1 AND user_id = $2")
            .bind(movement_id)
            .bind(user_id)
            .execute(&self.pool)
            .await
            .map_err(|e| map_db_error("Failed to delete movement", e))?;

        if result.rows_affected() == 0 {
            return Err(movement_not_found());
        }

        info!(movement_id = %movement_id, "Movement deleted");

        Ok(())
    }
}

/// Serialization failures and deadlocks are retryable by the caller; anything
/// else is a plain database error. The service itself never retries.
fn map_db_error(context: &str, e: sqlx::Error) -> AppError {
    if let sqlx::Error::Database(ref db_err) = e {
        if matches!(db_err.code().as_deref(), Some("40001") | Some("40P01")) {
            tracing::warn!(error = %db_err, "Transient storage conflict");
            return AppError::ServiceUnavailable;
        }
    }
    AppError::DatabaseError(anyhow::anyhow!("{}: {}", context, e))
}

fn category_not_found() -> AppError {
    AppError::NotFound(anyhow::anyhow!("Category not found"))
}

fn movement_not_found() -> AppError {
    AppError::NotFound(anyhow::anyhow!("Movement not found"))
}

fn invalid_category() -> AppError {
    AppError::Unprocessable(anyhow::anyhow!("invalid_category"))
}
