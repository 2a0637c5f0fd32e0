use user_accounts_api::{
    error::ServiceError,
    models::{Role, UpdateUserRequest, User},
    repository::{InMemoryUserRepository, PostgresUserRepository, UserRepository},
};
use chrono::Utc;
use sqlx::PgPool;

// --- Test Context and Setup ---

/// Holds the database pool for the Postgres-backed tests.
struct DbTestContext {
    pool: PgPool,
}

impl DbTestContext {
    async fn setup() -> Self {
        dotenv::dotenv().ok();

        let db_url = std::env::var("DATABASE_URL")
            .expect("DATABASE_URL must be set to run integration tests");

        let pool = PgPool::connect(&db_url)
            .await
            .expect("Failed to connect to database for integration tests.");

        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .expect("Failed to run database migrations.");

        DbTestContext { pool }
    }

    fn repository(&self) -> PostgresUserRepository {
        PostgresUserRepository::new(self.pool.clone())
    }

    async fn create_test_user(&self, role: &str) -> User {
        let email = format!("{}-{}@test.com", role, Utc::now().timestamp_nanos_opt().unwrap_or(0));
        sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (name, email, password, role)
            VALUES ($1, $2, 'not-a-real-hash', $3)
            RETURNING id, name, email, role, created_at, updated_at
            "#,
        )
        .bind("Test User")
        .bind(email)
        .bind(role)
        .fetch_one(&self.pool)
        .await
        .expect("Failed to seed test user")
    }
}

fn sample_user(id: i64, role: &str) -> User {
    User {
        id,
        name: format!("User {id}"),
        email: format!("user{id}@example.com"),
        role: role.to_string(),
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}

// --- In-memory repository ---

#[tokio::test]
async fn test_in_memory_lists_in_id_order() {
    let repo = InMemoryUserRepository::with_users([
        sample_user(3, "user"),
        sample_user(1, "admin"),
        sample_user(2, "user"),
    ]);

    let ids: Vec<i64> = repo.list_users().await.unwrap().iter().map(|u| u.id).collect();
    assert_eq!(ids, vec![1, 2, 3]);
}

#[tokio::test]
async fn test_in_memory_partial_update_keeps_other_fields() {
    let repo = InMemoryUserRepository::with_users([sample_user(1, "user")]);

    let updated = repo
        .update_user(
            1,
            UpdateUserRequest {
                role: Some(Role::Admin),
                ..UpdateUserRequest::default()
            },
        )
        .await
        .unwrap();

    assert_eq!(updated.role, "admin");
    assert_eq!(updated.name, "User 1");
    assert_eq!(updated.email, "user1@example.com");
    assert_eq!(repo.get_user(1).await.unwrap(), updated);
}

#[tokio::test]
async fn test_in_memory_missing_rows_are_not_found() {
    let repo = InMemoryUserRepository::new();

    assert!(matches!(repo.get_user(1).await, Err(ServiceError::NotFound)));
    assert!(matches!(repo.delete_user(1).await, Err(ServiceError::NotFound)));
    assert!(matches!(
        repo.update_user(1, UpdateUserRequest::default()).await,
        Err(ServiceError::NotFound)
    ));
}

#[tokio::test]
async fn test_in_memory_failure_switch() {
    let repo = InMemoryUserRepository::with_users([sample_user(1, "user")]);
    repo.set_failing(true);

    assert!(matches!(repo.list_users().await, Err(ServiceError::Internal(_))));
    assert!(matches!(repo.get_user(1).await, Err(ServiceError::Internal(_))));

    repo.set_failing(false);
    assert!(repo.get_user(1).await.is_ok());
}

// --- Postgres repository ---

#[tokio::test]
#[ignore = "requires a running Postgres (DATABASE_URL)"]
async fn test_postgres_update_and_delete_lifecycle() {
    let ctx = DbTestContext::setup().await;
    let repo = ctx.repository();
    let user = ctx.create_test_user("user").await;

    let fetched = repo.get_user(user.id).await.unwrap();
    assert_eq!(fetched.email, user.email);

    let updated = repo
        .update_user(
            user.id,
            UpdateUserRequest {
                name: Some("Renamed".to_string()),
                ..UpdateUserRequest::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.name, "Renamed");
    assert_eq!(updated.role, "user");
    assert!(updated.updated_at >= user.updated_at);

    assert!(repo.list_users().await.unwrap().iter().any(|u| u.id == user.id));

    repo.delete_user(user.id).await.unwrap();
    assert!(matches!(repo.get_user(user.id).await, Err(ServiceError::NotFound)));
    assert!(matches!(repo.delete_user(user.id).await, Err(ServiceError::NotFound)));
}

#[tokio::test]
#[ignore = "requires a running Postgres (DATABASE_URL)"]
async fn test_postgres_role_change_is_persisted() {
    let ctx = DbTestContext::setup().await;
    let repo = ctx.repository();
    let user = ctx.create_test_user("user").await;

    let updated = repo
        .update_user(
            user.id,
            UpdateUserRequest {
                role: Some(Role::Admin),
                ..UpdateUserRequest::default()
            },
        )
        .await
        .unwrap();

    assert_eq!(updated.role, "admin");
    assert_eq!(repo.get_user(user.id).await.unwrap().role, "admin");

    repo.delete_user(user.id).await.unwrap();
}
