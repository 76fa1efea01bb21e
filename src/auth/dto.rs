use serde::{Deserialize, Serialize};

/// Request body for user registration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct RegisterRequest {
    #[serde(rename = "fullname")]
    pub full_name: String,
    pub password: String,
    pub phone: String,
}

/// Request body for login.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct LoginRequest {
    pub phone: String,
    pub password: String,
}

/// Request body for profile update. `phone` is required, `fullname` is not.
#[derive(Debug, Default, Deserialize)]
pub struct UpdateProfileRequest {
    pub phone: Option<String>,
    #[serde(rename = "fullname")]
    pub full_name: Option<String>,
}

/// Successful response wrapper: `{"data": ...}`.
#[derive(Debug, Serialize)]
pub struct Data<T> {
    pub data: T,
}

impl<T> Data<T> {
    pub fn new(data: T) -> Self {
        Self { data }
    }
}

#[derive(Debug, Serialize)]
pub struct RegisterResponse {
    pub id: i64,
}

/// Returned by a successful login.
#[derive(Debug, Clone, Serialize)]
pub struct Session {
    pub id: i64,
    pub token: String,
}

/// Public part of the user returned to its owner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Profile {
    #[serde(rename = "fullname")]
    pub full_name: String,
    pub phone: String,
}

#[derive(Debug, Default, Serialize)]
pub struct Empty {}
