use async_trait::async_trait;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::auth::repo_types::{
    AdminRecord, NewPrincipal, Principal, PrincipalKind, ProfileChanges, StoreError, UserRecord,
    WithPassword,
};

/// Lookup and creation of users and admins. Reads never include the password hash
/// except through [`CredentialStore::find_by_email_with_password`].
#[async_trait]
pub trait CredentialStore: Send + Sync {
    async fn find_by_email(
        &self,
        kind: PrincipalKind,
        email: &str,
    ) -> Result<Option<Principal>, StoreError>;

    async fn find_by_email_with_password(
        &self,
        kind: PrincipalKind,
        email: &str,
    ) -> Result<Option<WithPassword<Principal>>, StoreError>;

    async fn find_by_id(&self, kind: PrincipalKind, id: Uuid)
        -> Result<Option<Principal>, StoreError>;

    /// Fails with `DuplicateEmail` if the email is taken within `kind`.
    async fn create(&self, kind: PrincipalKind, new: NewPrincipal)
        -> Result<Principal, StoreError>;

    /// `Ok(None)` when no record has `id`.
    async fn update_profile(
        &self,
        kind: PrincipalKind,
        id: Uuid,
        changes: ProfileChanges,
    ) -> Result<Option<Principal>, StoreError>;

    async fn clear(&self, kind: PrincipalKind) -> Result<u64, StoreError>;
}

#[derive(FromRow)]
struct UserWithHash {
    #[sqlx(flatten)]
    record: UserRecord,
    password_hash: String,
}

#[derive(FromRow)]
struct AdminWithHash {
    #[sqlx(flatten)]
    record: AdminRecord,
    password_hash: String,
}

const USER_COLUMNS: &str = "id, name, email, is_admin, created_at, updated_at";
const ADMIN_COLUMNS: &str = "id, name, email, created_at, updated_at";

fn columns(kind: PrincipalKind) -> &'static str {
    match kind {
        PrincipalKind::User => USER_COLUMNS,
        PrincipalKind::Admin => ADMIN_COLUMNS,
    }
}

/// Unique index on email is the source of truth for duplicates, including racing inserts.
fn map_write_err(e: sqlx::Error, email: &str) -> StoreError {
    if let Some(db_err) = e.as_database_error() {
        if db_err.is_unique_violation() {
            return StoreError::DuplicateEmail(email.to_string());
        }
    }
    StoreError::from(e)
}

#[derive(Clone)]
pub struct PgCredentialStore {
    db: PgPool,
}

impl PgCredentialStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl CredentialStore for PgCredentialStore {
    async fn find_by_email(
        &self,
        kind: PrincipalKind,
        email: &str,
    ) -> Result<Option<Principal>, StoreError> {
        let sql = format!(
            "SELECT {} FROM {} WHERE email = $1",
            columns(kind),
            kind.table()
        );
        let principal = match kind {
            PrincipalKind::User => sqlx::query_as::<_, UserRecord>(&sql)
                .bind(email)
                .fetch_optional(&self.db)
                .await?
                .map(Principal::User),
            PrincipalKind::Admin => sqlx::query_as::<_, AdminRecord>(&sql)
                .bind(email)
                .fetch_optional(&self.db)
                .await?
                .map(Principal::Admin),
        };
        Ok(principal)
    }

    async fn find_by_email_with_password(
        &self,
        kind: PrincipalKind,
        email: &str,
    ) -> Result<Option<WithPassword<Principal>>, StoreError> {
        let sql = format!(
            "SELECT {}, password_hash FROM {} WHERE email = $1",
            columns(kind),
            kind.table()
        );
        let found = match kind {
            PrincipalKind::User => sqlx::query_as::<_, UserWithHash>(&sql)
                .bind(email)
                .fetch_optional(&self.db)
                .await?
                .map(|row| WithPassword {
                    record: Principal::User(row.record),
                    password_hash: row.password_hash,
                }),
            PrincipalKind::Admin => sqlx::query_as::<_, AdminWithHash>(&sql)
                .bind(email)
                .fetch_optional(&self.db)
                .await?
                .map(|row| WithPassword {
                    record: Principal::Admin(row.record),
                    password_hash: row.password_hash,
                }),
        };
        Ok(found)
    }

    async fn find_by_id(
        &self,
        kind: PrincipalKind,
        id: Uuid,
    ) -> Result<Option<Principal>, StoreError> {
        let sql = format!(
            "SELECT {} FROM {} WHERE id = $1",
            columns(kind),
            kind.table()
        );
        let principal = match kind {
            PrincipalKind::User => sqlx::query_as::<_, UserRecord>(&sql)
                .bind(id)
                .fetch_optional(&self.db)
                .await?
                .map(Principal::User),
            PrincipalKind::Admin => sqlx::query_as::<_, AdminRecord>(&sql)
                .bind(id)
                .fetch_optional(&self.db)
                .await?
                .map(Principal::Admin),
        };
        Ok(principal)
    }

    async fn create(
        &self,
        kind: PrincipalKind,
        new: NewPrincipal,
    ) -> Result<Principal, StoreError> {
        let sql = format!(
            r#"
            INSERT INTO {} (id, name, email, password_hash)
            VALUES ($1, $2, $3, $4)
            RETURNING {}
            "#,
            kind.table(),
            columns(kind)
        );
        let id = Uuid::new_v4();
        let principal = match kind {
            PrincipalKind::User => sqlx::query_as::<_, UserRecord>(&sql)
                .bind(id)
                .bind(&new.name)
                .bind(&new.email)
                .bind(&new.password_hash)
                .fetch_one(&self.db)
                .await
                .map(Principal::User),
            PrincipalKind::Admin => sqlx::query_as::<_, AdminRecord>(&sql)
                .bind(id)
                .bind(&new.name)
                .bind(&new.email)
                .bind(&new.password_hash)
                .fetch_one(&self.db)
                .await
                .map(Principal::Admin),
        }
        .map_err(|e| map_write_err(e, &new.email))?;
        Ok(principal)
    }

    async fn update_profile(
        &self,
        kind: PrincipalKind,
        id: Uuid,
        changes: ProfileChanges,
    ) -> Result<Option<Principal>, StoreError> {
        let sql = format!(
            r#"
            UPDATE {}
               SET name = COALESCE($2, name),
                   email = COALESCE($3, email),
                   updated_at = now()
             WHERE id = $1
            RETURNING {}
            "#,
            kind.table(),
            columns(kind)
        );
        let email = changes.email.clone().unwrap_or_default();
        let updated = match kind {
            PrincipalKind::User => sqlx::query_as::<_, UserRecord>(&sql)
                .bind(id)
                .bind(changes.name)
                .bind(changes.email)
                .fetch_optional(&self.db)
                .await
                .map(|row| row.map(Principal::User)),
            PrincipalKind::Admin => sqlx::query_as::<_, AdminRecord>(&sql)
                .bind(id)
                .bind(changes.name)
                .bind(changes.email)
                .fetch_optional(&self.db)
                .await
                .map(|row| row.map(Principal::Admin)),
        }
        .map_err(|e| map_write_err(e, &email))?;
        Ok(updated)
    }

    async fn clear(&self, kind: PrincipalKind) -> Result<u64, StoreError> {
        let sql = format!("DELETE FROM {}", kind.table());
        let res = sqlx::query(&sql).execute(&self.db).await?;
        Ok(res.rows_affected())
    }
}
