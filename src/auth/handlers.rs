use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use tracing::{instrument, warn};

use crate::{
    auth::{
        dto::{
            Data, Empty, LoginRequest, Profile, RegisterRequest, RegisterResponse, Session,
            UpdateProfileRequest,
        },
        extractors::BearerToken,
    },
    error::AppError,
    state::AppState,
};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
}

pub fn me_routes() -> Router<AppState> {
    Router::new().route("/auth/me", get(get_me).put(update_me))
}

fn body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, AppError> {
    payload.map(|Json(v)| v).map_err(|e| {
        warn!(error = %e, "undecodable request body");
        AppError::InvalidFormat
    })
}

#[instrument(skip(state, payload))]
pub async fn register(
    State(state): State<AppState>,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Data<RegisterResponse>>), AppError> {
    let req = body(payload)?;
    let id = state.identity.register(&req).await?;
    Ok((StatusCode::CREATED, Json(Data::new(RegisterResponse { id }))))
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<Data<Session>>, AppError> {
    let req = body(payload)?;
    let session = state.identity.login(&req).await?;
    Ok(Json(Data::new(session)))
}

#[instrument(skip(state, token))]
pub async fn get_me(
    State(state): State<AppState>,
    BearerToken(token): BearerToken,
) -> Result<Json<Data<Profile>>, AppError> {
    let profile = state.identity.get_profile(&token).await?;
    Ok(Json(Data::new(profile)))
}

#[instrument(skip(state, token, payload))]
pub async fn update_me(
    State(state): State<AppState>,
    BearerToken(token): BearerToken,
    payload: Result<Json<UpdateProfileRequest>, JsonRejection>,
) -> Result<Json<Empty>, AppError> {
    let req = body(payload)?;
    state.identity.update_profile(&token, &req).await?;
    Ok(Json(Empty::default()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn login_response_serialization() {
        let response = Data::new(Session {
            id: 12,
            token: "abc".into(),
        });
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["data"]["id"], 12);
        assert_eq!(json["data"]["token"], "abc");
    }

    #[test]
    fn profile_response_uses_wire_names() {
        let response = Data::new(Profile {
            full_name: "Nivea".into(),
            phone: "+6212345678".into(),
        });
        let json = serde_json::to_string(&response).unwrap();
        assert!(json.contains("\"fullname\":\"Nivea\""));
        assert!(!json.contains("password"));
    }

    #[test]
    fn register_request_reads_wire_names_and_defaults_missing_fields() {
        let req: RegisterRequest =
            serde_json::from_str(r#"{"fullname":"Nivea","phone":"+6212345678"}"#).unwrap();
        assert_eq!(req.full_name, "Nivea");
        assert_eq!(req.password, "");
    }

    #[test]
    fn update_request_fields_are_optional() {
        let req: UpdateProfileRequest = serde_json::from_str("{}").unwrap();
        assert!(req.phone.is_none());
        assert!(req.full_name.is_none());
    }
}
