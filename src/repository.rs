use crate::error::ServiceError;
use crate::models::{UpdateUserRequest, User};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::PgPool;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::RwLock;

/// UserRepository
///
/// The data-access contract consumed by the users handlers and the auth extractor.
/// A missing row is always reported as `ServiceError::NotFound`; every other failure
/// is passed through untouched.
///
/// **Send + Sync + async_trait** make `Arc<dyn UserRepository>` shareable across
/// Axum's task boundaries.
#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn list_users(&self) -> Result<Vec<User>, ServiceError>;
    async fn get_user(&self, id: i64) -> Result<User, ServiceError>;
    // Partial update: only `Some` fields are written.
    async fn update_user(&self, id: i64, changes: UpdateUserRequest)
    -> Result<User, ServiceError>;
    async fn delete_user(&self, id: i64) -> Result<(), ServiceError>;
}

/// RepositoryState
///
/// The shared handle stored in `AppState`.
pub type RepositoryState = Arc<dyn UserRepository>;

const USER_COLUMNS: &str = "id, name, email, role, created_at, updated_at";

/// PostgresUserRepository
///
/// `UserRepository` backed by the `users` table.
pub struct PostgresUserRepository {
    pool: PgPool,
}

impl PostgresUserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserRepository for PostgresUserRepository {
    async fn list_users(&self) -> Result<Vec<User>, ServiceError> {
        let query = format!("SELECT {USER_COLUMNS} FROM users ORDER BY id");
        let users = sqlx::query_as::<_, User>(&query)
            .fetch_all(&self.pool)
            .await?;
        Ok(users)
    }

    async fn get_user(&self, id: i64) -> Result<User, ServiceError> {
        let query = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1");
        sqlx::query_as::<_, User>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(ServiceError::NotFound)
    }

    /// update_user
    ///
    /// `COALESCE` keeps the stored value for every column whose parameter is NULL,
    /// so `None` fields are left untouched.
    async fn update_user(
        &self,
        id: i64,
        changes: UpdateUserRequest,
    ) -> Result<User, ServiceError> {
        let query = format!(
            r#"
            UPDATE users
            SET name = COALESCE($2, name),
                email = COALESCE($3, email),
                role = COALESCE($4, role),
                updated_at = NOW()
            WHERE id = $1
            RETURNING {USER_COLUMNS}
            "#
        );
        sqlx::query_as::<_, User>(&query)
            .bind(id)
            .bind(changes.name)
            .bind(changes.email)
            .bind(changes.role.map(|role| role.as_str()))
            .fetch_optional(&self.pool)
            .await?
            .ok_or(ServiceError::NotFound)
    }

    async fn delete_user(&self, id: i64) -> Result<(), ServiceError> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(ServiceError::NotFound);
        }
        Ok(())
    }
}

/// InMemoryUserRepository
///
/// `UserRepository` over a `BTreeMap`, used by the test suites and for running the
/// router without a database. `set_failing(true)` makes every call return
/// `ServiceError::Internal`.
#[derive(Default)]
pub struct InMemoryUserRepository {
    users: RwLock<BTreeMap<i64, User>>,
    failing: AtomicBool,
}

impl InMemoryUserRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_users(users: impl IntoIterator<Item = User>) -> Self {
        Self {
            users: RwLock::new(users.into_iter().map(|user| (user.id, user)).collect()),
            failing: AtomicBool::new(false),
        }
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    fn check_available(&self) -> Result<(), ServiceError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(ServiceError::Internal(
                "in-memory store unavailable".to_string(),
            ));
        }
        Ok(())
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn list_users(&self) -> Result<Vec<User>, ServiceError> {
        self.check_available()?;
        Ok(self.users.read().await.values().cloned().collect())
    }

    async fn get_user(&self, id: i64) -> Result<User, ServiceError> {
        self.check_available()?;
        self.users
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or(ServiceError::NotFound)
    }

    async fn update_user(
        &self,
        id: i64,
        changes: UpdateUserRequest,
    ) -> Result<User, ServiceError> {
        self.check_available()?;
        let mut users = self.users.write().await;
        let user = users.get_mut(&id).ok_or(ServiceError::NotFound)?;

        if let Some(name) = changes.name {
            user.name = name;
        }
        if let Some(email) = changes.email {
            user.email = email;
        }
        if let Some(role) = changes.role {
            user.role = role.as_str().to_string();
        }
        user.updated_at = Utc::now();

        Ok(user.clone())
    }

    async fn delete_user(&self, id: i64) -> Result<(), ServiceError> {
        self.check_available()?;
        self.users
            .write()
            .await
            .remove(&id)
            .map(|_| ())
            .ok_or(ServiceError::NotFound)
    }
}
