//! TOTP factor handlers.
//!
//! Each handler validates its body, makes exactly one provider call and
//! reshapes the result. Provider failures become a 500 carrying the
//! provider's error payload; nothing is retried.

use axum::extract::{rejection::JsonRejection, Json, State};
use service_core::error::AppError;
use validator::Validate;

use crate::dtos::{
    ChallengeResponse, CreateFactorRequest, CreateFactorResponse, FactorCodeRequest,
    VerifyFactorResponse,
};
use crate::AppState;

/// A body that is not JSON reads as an empty one, so it fails validation
/// with the same message as a body missing every field.
fn body<T: Default>(payload: Result<Json<T>, JsonRejection>) -> T {
    payload.map(|Json(req)| req).unwrap_or_else(|rejection| {
        tracing::debug!(error = %rejection.body_text(), "Rejected request body");
        T::default()
    })
}

/// Create a TOTP factor - implementation.
#[tracing::instrument(skip(state, req))]
pub async fn create_factor_impl(
    state: &AppState,
    req: CreateFactorRequest,
) -> Result<CreateFactorResponse, AppError> {
    req.validate()?;

    let friendly_name = req
        .friendly_name
        .filter(|name| !name.trim().is_empty())
        .unwrap_or_else(|| state.config.factor.default_friendly_name.clone());

    let factor = state
        .provider
        .create_factor(&req.identity, &friendly_name)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "create-factor error");
            AppError::from(e)
        })?;

    tracing::info!(factor_sid = %factor.sid, status = ?factor.status, "Factor created");
    Ok(factor.into())
}

/// Create a TOTP factor for an identity.
///
/// POST /api/create-factor
pub async fn create_factor(
    State(state): State<AppState>,
    payload: Result<Json<CreateFactorRequest>, JsonRejection>,
) -> Result<Json<CreateFactorResponse>, AppError> {
    let req = body(payload);
    let response = create_factor_impl(&state, req).await?;
    Ok(Json(response))
}

/// Verify a factor with a code - implementation.
#[tracing::instrument(skip(state, req))]
pub async fn verify_factor_impl(
    state: &AppState,
    req: FactorCodeRequest,
) -> Result<VerifyFactorResponse, AppError> {
    req.validate()?;

    let updated = state
        .provider
        .verify_factor(&req.identity, &req.factor_sid, &req.code)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, factor_sid = %req.factor_sid, "verify-factor error");
            AppError::from(e)
        })?;

    tracing::info!(factor_sid = %updated.sid, status = ?updated.status, "Factor update submitted");
    Ok(updated.into())
}

/// Verify a freshly created factor with the first code from the user's app.
///
/// POST /api/verify-factor
pub async fn verify_factor(
    State(state): State<AppState>,
    payload: Result<Json<FactorCodeRequest>, JsonRejection>,
) -> Result<Json<VerifyFactorResponse>, AppError> {
    let req = body(payload);
    let response = verify_factor_impl(&state, req).await?;
    Ok(Json(response))
}

/// Challenge a verified factor - implementation.
///
/// A denied challenge is a normal result, not an error.
#[tracing::instrument(skip(state, req))]
pub async fn challenge_impl(
    state: &AppState,
    req: FactorCodeRequest,
) -> Result<ChallengeResponse, AppError> {
    req.validate()?;

    let challenge = state
        .provider
        .create_challenge(&req.identity, &req.factor_sid, &req.code)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, factor_sid = %req.factor_sid, "challenge error");
            AppError::from(e)
        })?;

    tracing::info!(
        challenge_sid = %challenge.sid,
        status = ?challenge.status,
        "Challenge created"
    );
    Ok(challenge.into())
}

/// Authenticate with a code against a verified factor.
///
/// POST /api/challenge
pub async fn challenge(
    State(state): State<AppState>,
    payload: Result<Json<FactorCodeRequest>, JsonRejection>,
) -> Result<Json<ChallengeResponse>, AppError> {
    let req = body(payload);
    let response = challenge_impl(&state, req).await?;
    Ok(Json(response))
}
