pub mod test_helpers {
    use crate::config::settings::AppConfig;
    use crate::services::message_cipher::CipherError;
    use crate::services::password::hash_password;
    use crate::services::MockEmailService;
    use crate::AppState;
    use sqlx::{sqlite::SqlitePoolOptions, SqlitePool};
    use tempfile::NamedTempFile;

    /// Create a new in-memory SQLite database for testing
    pub async fn create_test_db() -> Result<SqlitePool, sqlx::Error> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect(":memory:")
            .await?;

        // Run migrations
        sqlx::migrate!("./migrations").run(&pool).await?;

        Ok(pool)
    }

    /// Create a temporary file-based SQLite database for testing
    /// Useful when a test needs the data to survive a pool reconnect
    pub async fn create_test_db_file() -> Result<(SqlitePool, NamedTempFile), sqlx::Error> {
        let temp_file = NamedTempFile::new().map_err(sqlx::Error::Io)?;
        let db_path = temp_file
            .path()
            .to_str()
            .ok_or_else(|| sqlx::Error::Configuration("Invalid database path".into()))?;
        let database_url = format!("sqlite://{}", db_path);

        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect(&database_url)
            .await?;

        // Run migrations
        sqlx::migrate!("./migrations").run(&pool).await?;

        Ok((pool, temp_file))
    }

    /// Configuration with fixed secrets for deterministic tests
    pub fn test_config() -> AppConfig {
        AppConfig {
            jwt_secret: "test-jwt-secret".to_string(),
            token_ttl_secs: 3600,
            encryption_key: b"0123456789abcdef0123456789abcdef".to_vec(),
            otp_expiry_minutes: 10,
        }
    }

    /// Full application state over the given pool, with the mock email backend
    pub fn test_state(pool: SqlitePool) -> Result<AppState, CipherError> {
        AppState::new(pool, &test_config(), Box::new(MockEmailService))
    }

    /// Insert a test user with hashed password
    pub async fn insert_test_user(
        pool: &SqlitePool,
        email: &str,
        password: &str,
        full_name: &str,
        verified: bool,
    ) -> Result<i64, sqlx::Error> {
        let password_hash = hash_password(password).map_err(|e| {
            sqlx::Error::Configuration(format!("Password hashing failed: {}", e).into())
        })?;

        let result = sqlx::query(
            "INSERT INTO users (email, password_hash, full_name, email_verified) VALUES (?, ?, ?, ?)",
        )
        .bind(email)
        .bind(password_hash)
        .bind(full_name)
        .bind(verified)
        .execute(pool)
        .await?;

        Ok(result.last_insert_rowid())
    }
}
