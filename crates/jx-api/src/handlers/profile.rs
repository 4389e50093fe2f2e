//! Self-service profile: view, edit, and password change.

use axum::{Json, extract::State};
use chrono::Utc;
use serde_json::json;
use tracing::warn;

use jx_core::api::companies::CompanyCard;
use jx_core::api::users::{PasswordChangePayload, ProfileResponse, ProfileUpdate};
use jx_core::auth::password;
use jx_core::db::{
    fetch_company_by_employer, fetch_user_by_id, update_password_hash, update_profile,
    upsert_company,
};
use jx_core::domain::Role;

use crate::SharedState;
use crate::auth::AuthUser;
use crate::error::ApiError;
use crate::handlers::validate::{optional_within, required_within};

fn validate_profile(payload: &ProfileUpdate) -> Result<(), ApiError> {
    required_within(&payload.full_name, 100, "full_name")?;
    optional_within(payload.phone_number.as_ref(), 20, "phone_number")?;
    optional_within(payload.skills.as_ref(), 500, "skills")?;
    optional_within(payload.bio.as_ref(), 1_000, "bio")?;
    optional_within(payload.avatar_url.as_ref(), 255, "avatar_url")?;
    optional_within(payload.cv_url.as_ref(), 255, "cv_url")?;

    if let Some(company) = &payload.company {
        required_within(&company.name, 200, "company.name")?;
        optional_within(company.description.as_ref(), 2_000, "company.description")?;
        optional_within(company.logo_url.as_ref(), 255, "company.logo_url")?;
        optional_within(company.website.as_ref(), 255, "company.website")?;
        optional_within(company.address.as_ref(), 255, "company.address")?;
        optional_within(company.city.as_ref(), 100, "company.city")?;
    }

    Ok(())
}

async fn load_profile(state: &SharedState, user_id: i64) -> Result<ProfileResponse, ApiError> {
    let user = fetch_user_by_id(&state.pool, user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("user {user_id} not found")))?;

    // A verify key that no longer opens is reported as absent, not an error.
    let verify_key = match user.verify_key.as_deref() {
        Some(blob) => match state.verify_key.decrypt(blob) {
            Ok(key) => Some(key),
            Err(err) => {
                warn!(user_id = user.id, error = %err, "stored verify key failed to decrypt");
                None
            }
        },
        None => None,
    };

    let company = if user.role == Role::Employer {
        fetch_company_by_employer(&state.pool, user.id)
            .await?
            .map(CompanyCard::from)
    } else {
        None
    };

    Ok(ProfileResponse::from_parts(user, verify_key, company))
}

pub async fn my_profile(
    State(state): State<SharedState>,
    auth: AuthUser,
) -> Result<Json<ProfileResponse>, ApiError> {
    let profile = load_profile(&state, auth.user_id).await?;
    Ok(Json(profile))
}

/// Saves the profile and, for employers, the embedded company section in
/// one request. Returns the freshly loaded profile.
pub async fn update_my_profile(
    State(state): State<SharedState>,
    auth: AuthUser,
    Json(payload): Json<ProfileUpdate>,
) -> Result<Json<ProfileResponse>, ApiError> {
    validate_profile(&payload)?;
    if payload.company.is_some() && auth.role != Role::Employer {
        return Err(ApiError::BadRequest(
            "only employers maintain a company profile".into(),
        ));
    }

    let now = Utc::now();
    let updated = update_profile(&state.pool, auth.user_id, &payload, now).await?;
    if !updated {
        return Err(ApiError::NotFound(format!(
            "user {} not found",
            auth.user_id
        )));
    }

    if let Some(company) = &payload.company {
        upsert_company(&state.pool, auth.user_id, company, now).await?;
    }

    let profile = load_profile(&state, auth.user_id).await?;
    Ok(Json(profile))
}

pub async fn change_password(
    State(state): State<SharedState>,
    auth: AuthUser,
    Json(payload): Json<PasswordChangePayload>,
) -> Result<Json<serde_json::Value>, ApiError> {
    if payload.new_password.chars().count() < 6 {
        return Err(ApiError::BadRequest(
            "new password must be at least 6 characters".into(),
        ));
    }
    // bcrypt input limit.
    if payload.new_password.len() > 72 {
        return Err(ApiError::BadRequest(
            "new password must be at most 72 bytes".into(),
        ));
    }

    let user = fetch_user_by_id(&state.pool, auth.user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("user {} not found", auth.user_id)))?;

    let current_ok = password::verify_password(&payload.current_password, &user.password_hash)
        .await
        .map_err(|err| ApiError::Internal(format!("password handling failed: {err}")))?;
    if !current_ok {
        return Err(ApiError::BadRequest("current password is incorrect".into()));
    }

    let hash = password::hash_password(&payload.new_password, None)
        .await
        .map_err(|err| ApiError::Internal(format!("password handling failed: {err}")))?;
    let updated = update_password_hash(&state.pool, auth.user_id, &hash, Utc::now()).await?;

    Ok(Json(json!({ "updated": updated })))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn update() -> ProfileUpdate {
        ProfileUpdate {
            full_name: "Dana Osei".into(),
            phone_number: Some("+49123456789".into()),
            skills: Some("rust, sql".into()),
            bio: None,
            avatar_url: None,
            cv_url: None,
            company: None,
        }
    }

    #[test]
    fn validate_profile_accepts_plain_update() {
        assert!(validate_profile(&update()).is_ok());
    }

    #[test]
    fn validate_profile_rejects_blank_name() {
        let mut payload = update();
        payload.full_name = " ".into();

        let err = validate_profile(&payload).unwrap_err();
        assert!(matches!(err, ApiError::BadRequest(message) if message.contains("full_name")));
    }

    #[test]
    fn validate_profile_rejects_oversized_phone() {
        let mut payload = update();
        payload.phone_number = Some("0".repeat(21));

        let err = validate_profile(&payload).unwrap_err();
        assert!(matches!(err, ApiError::BadRequest(message) if message.contains("phone_number")));
    }

    #[test]
    fn validate_profile_checks_company_section() {
        let mut payload = update();
        payload.company = Some(jx_core::api::companies::CompanyUpdate {
            name: String::new(),
            description: None,
            logo_url: None,
            website: None,
            address: None,
            city: None,
        });

        let err = validate_profile(&payload).unwrap_err();
        assert!(matches!(err, ApiError::BadRequest(message) if message.contains("company.name")));
    }
}
