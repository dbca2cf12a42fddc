use actix_web::{post, web, HttpResponse};
use chrono::Utc;
use log::info;
use uuid::Uuid;

use crate::dtos::auth_dtos::{LoginIn, LoginOut, SignupIn, SignupOut};
use crate::error::ApiError;
use crate::models::user::User;
use crate::repositories::user_repository::UserRepository;
use crate::services::auth_service::AuthService;
use crate::validation;
use crate::AppState;

/// POST /auth/signup
#[post("/signup")]
pub async fn signup(
    state: web::Data<AppState>,
    auth: web::Data<AuthService>,
    body: web::Json<SignupIn>,
) -> Result<HttpResponse, ApiError> {
    let email = body.email.trim().to_lowercase();
    validation::validate_signup(&email, &body.password, &body.name)?;

    if UserRepository::find_by_email(&state.pool, &email)
        .await?
        .is_some()
    {
        return Err(ApiError::DuplicateEmail);
    }

    let user = User {
        id: Uuid::new_v4(),
        email,
        password_hash: auth.hash_password(&body.password)?,
        name: body.name.trim().to_string(),
        created_at: Utc::now(),
    };
    UserRepository::insert(&state.pool, &user).await?;

    info!("user {} signed up", user.id);
    Ok(HttpResponse::Created().json(SignupOut {
        message: "User created.".to_string(),
        user_id: user.id,
    }))
}

/// POST /auth/login
#[post("/login")]
pub async fn login(
    state: web::Data<AppState>,
    auth: web::Data<AuthService>,
    body: web::Json<LoginIn>,
) -> Result<HttpResponse, ApiError> {
    let email = body.email.trim().to_lowercase();

    let user = UserRepository::find_by_email(&state.pool, &email)
        .await?
        .ok_or_else(|| {
            ApiError::NotFound("A user with this email could not be found.".to_string())
        })?;

    auth.verify_password(&body.password, &user.password_hash)?;
    let (token, expires_in) = auth.issue_token(&user)?;

    info!("user {} logged in", user.id);
    Ok(HttpResponse::Ok().json(LoginOut {
        token,
        user_id: user.id,
        expires_in,
    }))
}
