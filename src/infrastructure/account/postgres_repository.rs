//! PostgreSQL account repository implementation

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{postgres::PgRow, PgPool, Postgres, QueryBuilder, Row};
use uuid::Uuid;

use crate::domain::account::{
    email_taken, username_taken, Account, AccountId, AccountQuery, AccountRecord,
    AccountRepository, Role,
};
use crate::domain::DomainError;

const ACCOUNT_COLUMNS: &str = "id, username, password_hash, email, first_name, last_name, role, \
     phone_number, bio, avatar, is_active, is_staff, is_superuser, is_email_verified, \
     date_joined, updated_at, last_login, last_activity";

const USERNAME_CONSTRAINT: &str = "accounts_username_key";
const EMAIL_CONSTRAINT: &str = "accounts_email_key";

/// PostgreSQL implementation of AccountRepository
#[derive(Debug, Clone)]
pub struct PostgresAccountRepository {
    pool: PgPool,
}

impl PostgresAccountRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn fetch_one_by(
        &self,
        column: &'static str,
        value: &str,
    ) -> Result<Option<Account>, DomainError> {
        let sql = format!("SELECT {} FROM accounts WHERE {} = $1", ACCOUNT_COLUMNS, column);

        let row = sqlx::query(&sql)
            .bind(value)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| DomainError::storage(format!("Failed to get account: {}", e)))?;

        row.as_ref().map(row_to_account).transpose()
    }

    async fn touch_timestamp(
        &self,
        column: &'static str,
        id: &AccountId,
    ) -> Result<(), DomainError> {
        let sql = format!("UPDATE accounts SET {} = NOW() WHERE id = $1", column);

        let result = sqlx::query(&sql)
            .bind(id.as_uuid())
            .execute(&self.pool)
            .await
            .map_err(|e| DomainError::storage(format!("Failed to update {}: {}", column, e)))?;

        if result.rows_affected() == 0 {
            return Err(DomainError::not_found(format!("Account '{}' not found", id)));
        }

        Ok(())
    }
}

#[async_trait]
impl AccountRepository for PostgresAccountRepository {
    async fn get(&self, id: &AccountId) -> Result<Option<Account>, DomainError> {
        let sql = format!("SELECT {} FROM accounts WHERE id = $1", ACCOUNT_COLUMNS);

        let row = sqlx::query(&sql)
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| DomainError::storage(format!("Failed to get account: {}", e)))?;

        row.as_ref().map(row_to_account).transpose()
    }

    async fn get_by_username(&self, username: &str) -> Result<Option<Account>, DomainError> {
        self.fetch_one_by("username", username).await
    }

    async fn get_by_email(&self, email: &str) -> Result<Option<Account>, DomainError> {
        self.fetch_one_by("email", email).await
    }

    async fn create(&self, mut account: Account) -> Result<Account, DomainError> {
        account.normalize();

        sqlx::query(
            r#"
            INSERT INTO accounts (id, username, password_hash, email, first_name, last_name,
                                  role, phone_number, bio, avatar, is_active, is_staff,
                                  is_superuser, is_email_verified, date_joined, updated_at,
                                  last_login, last_activity)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18)
            "#,
        )
        .bind(account.id().as_uuid())
        .bind(account.username())
        .bind(account.password_hash())
        .bind(account.email())
        .bind(account.first_name())
        .bind(account.last_name())
        .bind(account.role().as_str())
        .bind(account.phone_number())
        .bind(account.bio())
        .bind(account.avatar())
        .bind(account.is_active())
        .bind(account.is_staff())
        .bind(account.is_superuser())
        .bind(account.is_email_verified())
        .bind(account.date_joined())
        .bind(account.updated_at())
        .bind(account.last_login())
        .bind(account.last_activity())
        .execute(&self.pool)
        .await
        .map_err(|e| map_write_error(e, &account, "create"))?;

        Ok(account)
    }

    async fn update(&self, account: &Account) -> Result<Account, DomainError> {
        let mut account = account.clone();
        account.normalize();

        let result = sqlx::query(
            r#"
            UPDATE accounts
            SET username = $2, password_hash = $3, email = $4, first_name = $5,
                last_name = $6, role = $7, phone_number = $8, bio = $9, avatar = $10,
                is_active = $11, is_staff = $12, is_superuser = $13,
                is_email_verified = $14, updated_at = $15
            WHERE id = $1
            "#,
        )
        .bind(account.id().as_uuid())
        .bind(account.username())
        .bind(account.password_hash())
        .bind(account.email())
        .bind(account.first_name())
        .bind(account.last_name())
        .bind(account.role().as_str())
        .bind(account.phone_number())
        .bind(account.bio())
        .bind(account.avatar())
        .bind(account.is_active())
        .bind(account.is_staff())
        .bind(account.is_superuser())
        .bind(account.is_email_verified())
        .bind(account.updated_at())
        .execute(&self.pool)
        .await
        .map_err(|e| map_write_error(e, &account, "update"))?;

        if result.rows_affected() == 0 {
            return Err(DomainError::not_found(format!(
                "Account '{}' not found",
                account.id()
            )));
        }

        Ok(account)
    }

    async fn list(&self, query: &AccountQuery) -> Result<Vec<Account>, DomainError> {
        let mut builder =
            QueryBuilder::<Postgres>::new(format!("SELECT {} FROM accounts", ACCOUNT_COLUMNS));
        push_filters(&mut builder, query);
        builder.push(" ORDER BY date_joined DESC");

        if let Some(limit) = query.limit {
            builder.push(" LIMIT ").push_bind(to_sql_bound(limit));
        }

        if query.offset > 0 {
            builder.push(" OFFSET ").push_bind(to_sql_bound(query.offset));
        }

        let rows = builder
            .build()
            .fetch_all(&self.pool)
            .await
            .map_err(|e| DomainError::storage(format!("Failed to list accounts: {}", e)))?;

        rows.iter().map(row_to_account).collect()
    }

    async fn count(&self, query: &AccountQuery) -> Result<usize, DomainError> {
        let mut builder = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM accounts");
        push_filters(&mut builder, query);

        let count = builder
            .build_query_scalar::<i64>()
            .fetch_one(&self.pool)
            .await
            .map_err(|e| DomainError::storage(format!("Failed to count accounts: {}", e)))?;

        Ok(usize::try_from(count).unwrap_or_default())
    }

    async fn record_login(&self, id: &AccountId) -> Result<(), DomainError> {
        self.touch_timestamp("last_login", id).await
    }

    async fn record_activity(&self, id: &AccountId) -> Result<(), DomainError> {
        self.touch_timestamp("last_activity", id).await
    }
}

/// LIMIT/OFFSET value; anything beyond `i64::MAX` already means "past the end"
fn to_sql_bound(value: usize) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}

fn push_filters(builder: &mut QueryBuilder<'_, Postgres>, query: &AccountQuery) {
    builder.push(" WHERE TRUE");

    if let Some(role) = query.role {
        builder.push(" AND role = ").push_bind(role.as_str());
    }

    let flags = [
        ("is_active", query.is_active),
        ("is_staff", query.is_staff),
        ("is_superuser", query.is_superuser),
        ("is_email_verified", query.is_email_verified),
    ];

    for (column, value) in flags {
        if let Some(value) = value {
            builder.push(format!(" AND {} = ", column)).push_bind(value);
        }
    }

    if let Some(since) = query.joined_since {
        builder.push(" AND date_joined >= ").push_bind(since);
    }

    if let Some(until) = query.joined_until {
        builder.push(" AND date_joined <= ").push_bind(until);
    }

    if let Some(term) = query.search_term() {
        let pattern = format!("%{}%", escape_like(&term));
        builder.push(" AND (");

        let columns = ["username", "email", "first_name", "last_name", "phone_number"];

        for (i, column) in columns.iter().enumerate() {
            if i > 0 {
                builder.push(" OR ");
            }
            builder
                .push(format!("{} ILIKE ", column))
                .push_bind(pattern.clone());
        }

        builder.push(")");
    }
}

fn escape_like(term: &str) -> String {
    term.replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

fn map_write_error(error: sqlx::Error, account: &Account, action: &str) -> DomainError {
    let constraint = error
        .as_database_error()
        .and_then(|db| db.constraint())
        .map(str::to_string);

    match constraint.as_deref() {
        Some(USERNAME_CONSTRAINT) => username_taken(account.username()),
        Some(EMAIL_CONSTRAINT) => email_taken(account.email().unwrap_or_default()),
        Some(other) => DomainError::conflict(format!(
            "Failed to {} account: constraint '{}' violated",
            action, other
        )),
        None => DomainError::storage(format!("Failed to {} account: {}", action, error)),
    }
}

fn row_to_account(row: &PgRow) -> Result<Account, DomainError> {
    let read = |e: sqlx::Error| DomainError::storage(format!("Invalid account row: {}", e));

    let id: Uuid = row.try_get("id").map_err(read)?;
    let role: String = row.try_get("role").map_err(read)?;
    let role: Role = role
        .parse()
        .map_err(|e| DomainError::storage(format!("Invalid role in database: {}", e)))?;

    Ok(Account::restore(AccountRecord {
        id: AccountId::from_uuid(id),
        username: row.try_get("username").map_err(read)?,
        password_hash: row.try_get("password_hash").map_err(read)?,
        email: row.try_get("email").map_err(read)?,
        first_name: row.try_get("first_name").map_err(read)?,
        last_name: row.try_get("last_name").map_err(read)?,
        role,
        phone_number: row.try_get("phone_number").map_err(read)?,
        bio: row.try_get("bio").map_err(read)?,
        avatar: row.try_get("avatar").map_err(read)?,
        is_active: row.try_get("is_active").map_err(read)?,
        is_staff: row.try_get("is_staff").map_err(read)?,
        is_superuser: row.try_get("is_superuser").map_err(read)?,
        is_email_verified: row.try_get("is_email_verified").map_err(read)?,
        date_joined: row.try_get::<DateTime<Utc>, _>("date_joined").map_err(read)?,
        updated_at: row.try_get::<DateTime<Utc>, _>("updated_at").map_err(read)?,
        last_login: row.try_get("last_login").map_err(read)?,
        last_activity: row.try_get("last_activity").map_err(read)?,
    }))
}
