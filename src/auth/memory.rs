use std::collections::HashMap;

use async_trait::async_trait;
use time::OffsetDateTime;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::auth::repo::CredentialStore;
use crate::auth::repo_types::{
    AdminRecord, NewPrincipal, Principal, PrincipalKind, ProfileChanges, StoreError, UserRecord,
    WithPassword,
};

#[derive(Debug, Clone)]
struct Stored {
    principal: Principal,
    password_hash: String,
}

/// Process-local credential store. Each kind is its own map, so uniqueness and id lookups
/// never cross collections.
#[derive(Default)]
pub struct MemoryCredentialStore {
    collections: RwLock<HashMap<PrincipalKind, HashMap<Uuid, Stored>>>,
}

impl MemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a record with a caller-chosen id, for exercising ids shared across
    /// collections.
    #[cfg(test)]
    pub(crate) async fn insert_with_id(
        &self,
        kind: PrincipalKind,
        id: Uuid,
        new: NewPrincipal,
    ) -> Result<Principal, StoreError> {
        self.insert(kind, id, new).await
    }

    async fn insert(
        &self,
        kind: PrincipalKind,
        id: Uuid,
        new: NewPrincipal,
    ) -> Result<Principal, StoreError> {
        let mut guard = self.collections.write().await;
        let coll = guard.entry(kind).or_default();
        if coll.values().any(|s| s.principal.email() == new.email) {
            return Err(StoreError::DuplicateEmail(new.email));
        }
        if coll.contains_key(&id) {
            return Err(StoreError::Database(format!("{} id {id} already present", kind.table())));
        }
        let principal = build(kind, id, &new);
        coll.insert(
            id,
            Stored {
                principal: principal.clone(),
                password_hash: new.password_hash,
            },
        );
        Ok(principal)
    }
}

fn build(kind: PrincipalKind, id: Uuid, new: &NewPrincipal) -> Principal {
    let now = OffsetDateTime::now_utc();
    match kind {
        PrincipalKind::User => Principal::User(UserRecord {
            id,
            name: new.name.clone(),
            email: new.email.clone(),
            is_admin: false,
            created_at: now,
            updated_at: now,
        }),
        PrincipalKind::Admin => Principal::Admin(AdminRecord {
            id,
            name: new.name.clone(),
            email: new.email.clone(),
            created_at: now,
            updated_at: now,
        }),
    }
}

#[async_trait]
impl CredentialStore for MemoryCredentialStore {
    async fn find_by_email(
        &self,
        kind: PrincipalKind,
        email: &str,
    ) -> Result<Option<Principal>, StoreError> {
        let guard = self.collections.read().await;
        Ok(guard.get(&kind).and_then(|coll| {
            coll.values()
                .find(|s| s.principal.email() == email)
                .map(|s| s.principal.clone())
        }))
    }

    async fn find_by_email_with_password(
        &self,
        kind: PrincipalKind,
        email: &str,
    ) -> Result<Option<WithPassword<Principal>>, StoreError> {
        let guard = self.collections.read().await;
        Ok(guard.get(&kind).and_then(|coll| {
            coll.values()
                .find(|s| s.principal.email() == email)
                .map(|s| WithPassword {
                    record: s.principal.clone(),
                    password_hash: s.password_hash.clone(),
                })
        }))
    }

    async fn find_by_id(
        &self,
        kind: PrincipalKind,
        id: Uuid,
    ) -> Result<Option<Principal>, StoreError> {
        let guard = self.collections.read().await;
        Ok(guard
            .get(&kind)
            .and_then(|coll| coll.get(&id))
            .map(|s| s.principal.clone()))
    }

    async fn create(
        &self,
        kind: PrincipalKind,
        new: NewPrincipal,
    ) -> Result<Principal, StoreError> {
        self.insert(kind, Uuid::new_v4(), new).await
    }

    async fn update_profile(
        &self,
        kind: PrincipalKind,
        id: Uuid,
        changes: ProfileChanges,
    ) -> Result<Option<Principal>, StoreError> {
        let mut guard = self.collections.write().await;
        let coll = guard.entry(kind).or_default();

        if let Some(email) = &changes.email {
            let taken = coll
                .iter()
                .any(|(other, s)| *other != id && s.principal.email() == email);
            if taken {
                return Err(StoreError::DuplicateEmail(email.clone()));
            }
        }

        let Some(stored) = coll.get_mut(&id) else {
            return Ok(None);
        };
        let now = OffsetDateTime::now_utc();
        match &mut stored.principal {
            Principal::User(u) => {
                if let Some(name) = changes.name {
                    u.name = name;
                }
                if let Some(email) = changes.email {
                    u.email = email;
                }
                u.updated_at = now;
            }
            Principal::Admin(a) => {
                if let Some(name) = changes.name {
                    a.name = name;
                }
                if let Some(email) = changes.email {
                    a.email = email;
                }
                a.updated_at = now;
            }
        }
        Ok(Some(stored.principal.clone()))
    }

    async fn clear(&self, kind: PrincipalKind) -> Result<u64, StoreError> {
        let mut guard = self.collections.write().await;
        Ok(guard.remove(&kind).map(|c| c.len() as u64).unwrap_or(0))
    }
}
