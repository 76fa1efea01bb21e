use std::sync::Arc;

use time::OffsetDateTime;
use tracing::{info, warn};

use crate::{
    auth::{
        dto::{LoginRequest, Profile, RegisterRequest, Session, UpdateProfileRequest},
        jwt::JwtKeys,
        password::CredentialHasher,
        repo::{IdentityStore, StoreError},
        repo_types::{NewUser, UserAttendance},
        validation::{Field, FieldErrors, Rules, RULES},
    },
    error::AppError,
};

fn phone_conflict(phone: &str) -> AppError {
    AppError::Conflict(FieldErrors::single(
        Field::Phone,
        format!("{phone} already registered"),
    ))
}

/// Writes that can hit the phone uniqueness index report it as a conflict.
fn write_error(e: StoreError, phone: &str) -> AppError {
    match e {
        StoreError::PhoneTaken => phone_conflict(phone),
        other => other.into(),
    }
}

/// Registration, login and profile operations.
pub struct IdentityService {
    store: Arc<dyn IdentityStore>,
    hasher: CredentialHasher,
    keys: JwtKeys,
    rules: &'static Rules,
}

impl IdentityService {
    pub fn new(store: Arc<dyn IdentityStore>, hasher: CredentialHasher, keys: JwtKeys) -> Self {
        Self {
            store,
            hasher,
            keys,
            rules: &RULES,
        }
    }

    pub fn with_rules(mut self, rules: &'static Rules) -> Self {
        self.rules = rules;
        self
    }

    pub async fn register(&self, req: &RegisterRequest) -> Result<i64, AppError> {
        let mut errors = FieldErrors::new();
        self.rules.check_full_name(&mut errors, &req.full_name);
        self.rules.check_password(&mut errors, &req.password);
        self.rules.check_phone(&mut errors, &req.phone);
        errors.into_result().map_err(|fields| {
            warn!(%fields, "register rejected");
            AppError::Validation(fields)
        })?;

        if self.store.find_by_phone(&req.phone).await?.is_some() {
            warn!(phone = %req.phone, "phone already registered");
            return Err(phone_conflict(&req.phone));
        }

        let password_hash = self.hasher.hash(&req.password)?;
        let now = OffsetDateTime::now_utc();
        let id = self
            .store
            .create(&NewUser {
                full_name: req.full_name.clone(),
                phone: req.phone.clone(),
                password_hash,
                created_at: now,
                updated_at: now,
            })
            .await
            .map_err(|e| write_error(e, &req.phone))?;

        info!(user_id = id, "user registered");
        Ok(id)
    }

    pub async fn login(&self, req: &LoginRequest) -> Result<Session, AppError> {
        let mut errors = FieldErrors::new();
        self.rules.check_password(&mut errors, &req.password);
        self.rules.check_phone(&mut errors, &req.phone);
        errors.into_result().map_err(AppError::Validation)?;

        let Some(user) = self.store.find_by_phone(&req.phone).await? else {
            warn!(phone = %req.phone, "login unknown phone");
            return Err(AppError::InvalidCredentials);
        };

        let matched = self
            .hasher
            .verify(&user.password_hash, &req.password)
            .map_err(|e| AppError::Dependency(e.into()))?;
        if !matched {
            warn!(user_id = user.id, "login invalid password");
            return Err(AppError::InvalidCredentials);
        }

        let now = OffsetDateTime::now_utc();
        self.store
            .record_login(&UserAttendance {
                user_id: user.id,
                login_at: now,
            })
            .await?;
        self.store.increment_login_summary(user.id).await?;

        let token = self.keys.issue(&user, now)?;
        info!(user_id = user.id, "user logged in");
        Ok(Session { id: user.id, token })
    }

    pub async fn get_profile(&self, token: &str) -> Result<Profile, AppError> {
        let id = self.keys.verify(token)?;
        let user = self.store.find_by_id(id).await?.ok_or_else(|| {
            warn!(user_id = id, "token subject not found");
            AppError::NotFound
        })?;
        Ok(Profile {
            full_name: user.full_name,
            phone: user.phone,
        })
    }

    /// Phone is mandatory; an empty or missing full name keeps the current one.
    pub async fn update_profile(
        &self,
        token: &str,
        req: &UpdateProfileRequest,
    ) -> Result<(), AppError> {
        let id = self.keys.verify(token)?;

        let phone = req.phone.as_deref().unwrap_or_default();
        let full_name = req.full_name.as_deref().filter(|n| !n.is_empty());
        let mut errors = FieldErrors::new();
        self.rules.check_phone(&mut errors, phone);
        if let Some(name) = full_name {
            self.rules.check_full_name(&mut errors, name);
        }
        errors.into_result().map_err(AppError::Validation)?;

        let mut user = self.store.find_by_id(id).await?.ok_or_else(|| {
            warn!(user_id = id, "token subject not found");
            AppError::NotFound
        })?;

        if user.phone != phone {
            if let Some(holder) = self.store.find_by_phone(phone).await? {
                if holder.id != user.id {
                    warn!(user_id = id, phone, "phone already registered");
                    return Err(phone_conflict(phone));
                }
            }
        }

        if let Some(name) = full_name {
            user.full_name = name.to_owned();
        }
        user.phone = phone.to_owned();
        user.updated_at = OffsetDateTime::now_utc();
        self.store
            .update(&user)
            .await
            .map_err(|e| write_error(e, phone))?;

        info!(user_id = id, "profile updated");
        Ok(())
    }
}
