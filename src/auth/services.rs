use lazy_static::lazy_static;
use regex::Regex;
use tracing::{info, warn};

use crate::auth::{
    dto::{AuthResponse, LoginRequest, RegisterRequest, UpdateProfileRequest, UpdatedProfileResponse},
    password::{hash_password_blocking, verify_dummy_blocking, verify_password_blocking},
    repo_types::{
        NewPrincipal, Principal, PrincipalKind, ProfileChanges, StoreError, UserRecord,
        WithPassword,
    },
};
use crate::error::ApiError;
use crate::state::AppState;

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

fn duplicate(kind: PrincipalKind) -> ApiError {
    match kind {
        PrincipalKind::User => ApiError::DuplicateEmail("User already exists".into()),
        PrincipalKind::Admin => {
            ApiError::DuplicateEmail("Admin already exists with this email".into())
        }
    }
}

fn non_blank(v: Option<String>) -> Option<String> {
    v.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
}

/// Creates a principal in `kind`'s collection and issues its first token.
pub async fn register(
    state: &AppState,
    kind: PrincipalKind,
    req: RegisterRequest,
) -> Result<AuthResponse, ApiError> {
    let name = req.name.trim().to_string();
    let email = req.email.trim().to_string();
    if name.is_empty() || email.is_empty() || req.password.is_empty() {
        return Err(ApiError::BadRequest(
            "Please provide name, email and password".into(),
        ));
    }
    if !is_valid_email(&email) {
        warn!(%email, "invalid email");
        return Err(ApiError::BadRequest("Invalid email".into()));
    }

    if state.credentials.find_by_email(kind, &email).await?.is_some() {
        warn!(?kind, %email, "email already registered");
        return Err(duplicate(kind));
    }

    let password_hash = hash_password_blocking(req.password).await?;

    // a concurrent registration may have won since the lookup; the store's answer decides
    let principal = state
        .credentials
        .create(
            kind,
            NewPrincipal {
                name,
                email,
                password_hash,
            },
        )
        .await
        .map_err(|e| match e {
            StoreError::DuplicateEmail(email) => {
                warn!(?kind, %email, "lost registration race");
                duplicate(kind)
            }
            other => other.into(),
        })?;

    let token = state.keys.sign(principal.id())?;
    info!(?kind, principal_id = %principal.id(), "registered");
    Ok(AuthResponse::new(&principal, token))
}

/// Checks credentials against `kind`'s collection only. Unknown email and wrong password
/// produce the same error after the same amount of hashing work.
pub async fn login(
    state: &AppState,
    kind: PrincipalKind,
    req: LoginRequest,
) -> Result<AuthResponse, ApiError> {
    let email = req.email.trim();
    let found = state
        .credentials
        .find_by_email_with_password(kind, email)
        .await?;

    let Some(WithPassword {
        record,
        password_hash,
    }) = found
    else {
        verify_dummy_blocking(req.password).await;
        warn!(?kind, %email, "login unknown email");
        return Err(ApiError::InvalidCredentials);
    };

    if !verify_password_blocking(req.password, password_hash).await? {
        warn!(?kind, %email, principal_id = %record.id(), "login invalid password");
        return Err(ApiError::InvalidCredentials);
    }

    let token = state.keys.sign(record.id())?;
    info!(?kind, principal_id = %record.id(), "logged in");
    Ok(AuthResponse::new(&record, token))
}

pub async fn update_profile(
    state: &AppState,
    user: UserRecord,
    req: UpdateProfileRequest,
) -> Result<UpdatedProfileResponse, ApiError> {
    let changes = ProfileChanges {
        name: non_blank(req.name),
        email: non_blank(req.email),
    };
    if let Some(email) = &changes.email {
        if !is_valid_email(email) {
            return Err(ApiError::BadRequest("Invalid email".into()));
        }
    }

    let updated = state
        .credentials
        .update_profile(PrincipalKind::User, user.id, changes)
        .await
        .map_err(|e| match e {
            StoreError::DuplicateEmail(_) => ApiError::DuplicateEmail("Email already in use".into()),
            other => other.into(),
        })?
        .and_then(Principal::into_user)
        .ok_or_else(|| ApiError::NotFound("User not found".into()))?;

    let token = state.keys.sign(updated.id)?;
    info!(user_id = %updated.id, "profile updated");
    Ok(UpdatedProfileResponse {
        profile: updated.into(),
        token,
    })
}
