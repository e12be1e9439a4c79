//! Database schema migrations for the accounts table

use sqlx::postgres::PgPool;
use tracing::info;

use crate::domain::DomainError;

/// Represents a database migration
#[derive(Debug, Clone)]
pub struct Migration {
    /// Migration version, applied in ascending order
    pub version: i64,
    pub description: String,
    /// SQL to run when applying the migration
    pub up: String,
    /// SQL to run when reverting the migration
    pub down: String,
}

impl Migration {
    pub fn new(
        version: i64,
        description: impl Into<String>,
        up: impl Into<String>,
        down: impl Into<String>,
    ) -> Self {
        Self {
            version,
            description: description.into(),
            up: up.into(),
            down: down.into(),
        }
    }
}

/// PostgreSQL migrator tracking applied versions in `_migrations`
#[derive(Debug, Clone)]
pub struct PostgresMigrator {
    pool: PgPool,
    migrations: Vec<Migration>,
}

impl PostgresMigrator {
    /// Migrator for the account schema
    pub fn new(pool: PgPool) -> Self {
        Self::with_migrations(pool, account_migrations())
    }

    pub fn with_migrations(pool: PgPool, mut migrations: Vec<Migration>) -> Self {
        migrations.sort_by_key(|m| m.version);
        Self { pool, migrations }
    }

    async fn ensure_migrations_table(&self) -> Result<(), DomainError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS _migrations (
                version BIGINT PRIMARY KEY,
                description TEXT NOT NULL,
                installed_on TIMESTAMPTZ NOT NULL DEFAULT NOW()
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| DomainError::storage(format!("Failed to create migrations table: {}", e)))?;

        Ok(())
    }

    /// Returns all applied migration versions
    pub async fn applied_versions(&self) -> Result<Vec<i64>, DomainError> {
        self.ensure_migrations_table().await?;

        sqlx::query_scalar("SELECT version FROM _migrations ORDER BY version")
            .fetch_all(&self.pool)
            .await
            .map_err(|e| DomainError::storage(format!("Failed to get applied migrations: {}", e)))
    }

    /// Apply every pending migration, each in its own transaction
    ///
    /// Returns the number of migrations applied.
    pub async fn run(&self) -> Result<usize, DomainError> {
        let applied = self.applied_versions().await?;
        let mut count = 0;

        for migration in pending(&self.migrations, &applied) {
            let mut tx = self.pool.begin().await.map_err(|e| {
                DomainError::storage(format!("Failed to begin migration transaction: {}", e))
            })?;

            sqlx::raw_sql(&migration.up)
                .execute(&mut *tx)
                .await
                .map_err(|e| {
                    DomainError::storage(format!(
                        "Failed to run migration {}: {}",
                        migration.version, e
                    ))
                })?;

            sqlx::query("INSERT INTO _migrations (version, description) VALUES ($1, $2)")
                .bind(migration.version)
                .bind(&migration.description)
                .execute(&mut *tx)
                .await
                .map_err(|e| {
                    DomainError::storage(format!(
                        "Failed to record migration {}: {}",
                        migration.version, e
                    ))
                })?;

            tx.commit().await.map_err(|e| {
                DomainError::storage(format!(
                    "Failed to commit migration {}: {}",
                    migration.version, e
                ))
            })?;

            info!(version = migration.version, description = %migration.description, "Applied migration");
            count += 1;
        }

        Ok(count)
    }

    /// Revert the most recently applied migration, if any
    pub async fn revert_last(&self) -> Result<Option<i64>, DomainError> {
        let applied = self.applied_versions().await?;

        let Some(migration) = applied
            .last()
            .and_then(|v| self.migrations.iter().find(|m| m.version == *v))
        else {
            return Ok(None);
        };

        let mut tx = self.pool.begin().await.map_err(|e| {
            DomainError::storage(format!("Failed to begin migration transaction: {}", e))
        })?;

        sqlx::raw_sql(&migration.down)
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                DomainError::storage(format!(
                    "Failed to revert migration {}: {}",
                    migration.version, e
                ))
            })?;

        sqlx::query("DELETE FROM _migrations WHERE version = $1")
            .bind(migration.version)
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                DomainError::storage(format!(
                    "Failed to remove migration record {}: {}",
                    migration.version, e
                ))
            })?;

        tx.commit().await.map_err(|e| {
            DomainError::storage(format!(
                "Failed to commit revert of {}: {}",
                migration.version, e
            ))
        })?;

        info!(version = migration.version, "Reverted migration");
        Ok(Some(migration.version))
    }
}

fn pending<'a>(migrations: &'a [Migration], applied: &[i64]) -> Vec<&'a Migration> {
    migrations
        .iter()
        .filter(|m| !applied.contains(&m.version))
        .collect()
}

/// Schema for the accounts table
pub fn account_migrations() -> Vec<Migration> {
    vec![
        Migration::new(
            1,
            "Create accounts table",
            r#"
            CREATE TABLE IF NOT EXISTS accounts (
                id UUID PRIMARY KEY,
                username VARCHAR(30) NOT NULL,
                password_hash TEXT NOT NULL,
                email VARCHAR(254),
                first_name VARCHAR(30),
                last_name VARCHAR(30),
                role VARCHAR(20) NOT NULL DEFAULT 'software_engineer',
                phone_number VARCHAR(20),
                bio VARCHAR(500),
                avatar VARCHAR(255),
                is_active BOOLEAN NOT NULL DEFAULT TRUE,
                is_staff BOOLEAN NOT NULL DEFAULT FALSE,
                is_superuser BOOLEAN NOT NULL DEFAULT FALSE,
                is_email_verified BOOLEAN NOT NULL DEFAULT FALSE,
                date_joined TIMESTAMPTZ NOT NULL DEFAULT NOW(),
                updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
                last_login TIMESTAMPTZ,
                last_activity TIMESTAMPTZ,
                CONSTRAINT accounts_username_key UNIQUE (username),
                CONSTRAINT accounts_email_key UNIQUE (email),
                CONSTRAINT accounts_role_check CHECK (role IN (
                    'product_manager', 'admin', 'software_engineer',
                    'software_architect', 'data_engineer'
                ))
            )
            "#,
            "DROP TABLE IF EXISTS accounts",
        ),
        Migration::new(
            2,
            "Add account indexes",
            r#"
            CREATE INDEX IF NOT EXISTS idx_accounts_username ON accounts (username);
            CREATE INDEX IF NOT EXISTS idx_accounts_email ON accounts (email);
            CREATE INDEX IF NOT EXISTS idx_accounts_role ON accounts (role);
            CREATE INDEX IF NOT EXISTS idx_accounts_is_active ON accounts (is_active);
            CREATE INDEX IF NOT EXISTS idx_accounts_date_joined ON accounts (date_joined);
            CREATE INDEX IF NOT EXISTS idx_accounts_username_is_active ON accounts (username, is_active);
            "#,
            r#"
            DROP INDEX IF EXISTS idx_accounts_username_is_active;
            DROP INDEX IF EXISTS idx_accounts_date_joined;
            DROP INDEX IF EXISTS idx_accounts_is_active;
            DROP INDEX IF EXISTS idx_accounts_role;
            DROP INDEX IF EXISTS idx_accounts_email;
            DROP INDEX IF EXISTS idx_accounts_username;
            "#,
        ),
    ]
}
