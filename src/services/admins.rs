use chrono::Utc;
use serde::Deserialize;

use super::{is_valid_email, new_id, require_fields, trimmed};
use crate::{
    auth::{PasswordHasher, TokenService},
    config::{AdminPassword, BootstrapAdmin},
    db::{
        models::{Admin, AdminView, Role},
        Filter, Store, StoreError,
    },
    error::AppError,
};

const MIN_PASSWORD_LENGTH: usize = 8;
const INVALID_CREDENTIALS: &str = "Invalid credentials";
const DUPLICATE_EMAIL: &str = "Admin with this email already exists";

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Credentials {
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewAdmin {
    pub email: Option<String>,
    pub password: Option<String>,
    pub name: Option<String>,
    pub role: Option<String>,
}

/// Issued on successful login.
#[derive(Debug, Clone)]
pub struct Session {
    pub token: String,
    pub admin: AdminView,
}

async fn find_by_email(store: &Store, email: &str) -> Result<Option<Admin>, AppError> {
    Ok(store
        .collection::<Admin>()
        .find_one(&Filter::all().eq_ignore_case("email", email))
        .await?)
}

/// Unknown email and wrong password fail identically.
pub async fn login(
    store: &Store,
    passwords: &PasswordHasher,
    tokens: &TokenService,
    credentials: Credentials,
) -> Result<Session, AppError> {
    require_fields(&[
        ("email", credentials.email.as_deref()),
        ("password", credentials.password.as_deref()),
    ])
    .map_err(|_| AppError::validation("Email and password are required"))?;

    let email = trimmed(credentials.email);
    let password = credentials.password.unwrap_or_default();

    let Some(mut admin) = find_by_email(store, &email).await? else {
        tracing::warn!("Login attempt for unknown user");
        return Err(AppError::unauthorized(INVALID_CREDENTIALS));
    };

    if !passwords.verify(password, admin.password_hash.clone()).await {
        tracing::warn!(admin_id = %admin.id, "Failed login attempt");
        return Err(AppError::unauthorized(INVALID_CREDENTIALS));
    }

    let now = Utc::now();
    admin.last_login_at = Some(now);
    admin.updated_at = now;
    if let Err(e) = store.collection::<Admin>().update(&admin).await {
        tracing::warn!(admin_id = %admin.id, "Failed to record last login: {}", e);
    }

    let (token, _) = tokens
        .issue(&admin.id, &admin.email, admin.role.as_str())
        .map_err(|e| AppError::internal(format!("failed to create token: {e}")))?;

    tracing::info!(admin_id = %admin.id, "Successful login");
    Ok(Session {
        token,
        admin: AdminView::from(&admin),
    })
}

pub async fn create(
    store: &Store,
    passwords: &PasswordHasher,
    input: NewAdmin,
) -> Result<AdminView, AppError> {
    require_fields(&[
        ("email", input.email.as_deref()),
        ("password", input.password.as_deref()),
        ("name", input.name.as_deref()),
    ])?;

    let email = trimmed(input.email);
    if !is_valid_email(&email) {
        return Err(AppError::validation("Invalid email format"));
    }

    let password = input.password.unwrap_or_default();
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(AppError::validation(format!(
            "Password must be at least {MIN_PASSWORD_LENGTH} characters long"
        )));
    }

    let role = match input.role.as_deref().map(str::trim).filter(|r| !r.is_empty()) {
        Some(raw) => Role::parse(raw).ok_or_else(|| {
            AppError::validation("Invalid role. Must be one of: admin, super_admin")
        })?,
        None => Role::Admin,
    };

    if find_by_email(store, &email).await?.is_some() {
        return Err(AppError::conflict(DUPLICATE_EMAIL));
    }

    let password_hash = passwords.hash(password).await?;
    let admin = insert_admin(store, email, trimmed(input.name), role, password_hash).await?;
    tracing::info!(admin_id = %admin.id, role = admin.role.as_str(), "Admin created");
    Ok(AdminView::from(&admin))
}

async fn insert_admin(
    store: &Store,
    email: String,
    name: String,
    role: Role,
    password_hash: String,
) -> Result<Admin, AppError> {
    let now = Utc::now();
    let admin = Admin {
        id: new_id(),
        email,
        password_hash,
        name,
        role,
        last_login_at: None,
        created_at: now,
        updated_at: now,
    };

    store
        .collection::<Admin>()
        .insert(&admin)
        .await
        .map_err(|e| match e {
            StoreError::Duplicate => AppError::conflict(DUPLICATE_EMAIL),
            other => other.into(),
        })?;
    Ok(admin)
}

/// Seeds the configured super admin. Returns `false` if it already exists.
pub async fn bootstrap(
    store: &Store,
    passwords: &PasswordHasher,
    seed: &BootstrapAdmin,
) -> Result<bool, AppError> {
    let email = seed.email.trim().to_string();
    if find_by_email(store, &email).await?.is_some() {
        return Ok(false);
    }

    let password_hash = match &seed.password {
        AdminPassword::Hashed(hash) => hash.clone(),
        AdminPassword::Plain(plain) => passwords.hash(plain.clone()).await?,
    };

    match insert_admin(store, email, seed.name.clone(), Role::SuperAdmin, password_hash).await {
        Ok(admin) => {
            tracing::info!(admin_id = %admin.id, "Bootstrap admin created");
            Ok(true)
        }
        Err(AppError::Conflict(_)) => Ok(false),
        Err(e) => Err(e),
    }
}
