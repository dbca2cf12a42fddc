use actix_web::{dev::Payload, web, FromRequest, HttpRequest};
use futures::future::{ready, Ready};
use uuid::Uuid;

use crate::error::ApiError;
use crate::services::auth_service::AuthService;

/// Extractor for routes requiring authentication: pulls the bearer token
/// from the `Authorization` header and verifies it against the signing
/// secret. Handlers receive the authenticated user id only.
#[derive(Debug)]
pub struct AuthenticatedUser {
    pub user_id: Uuid,
}

impl FromRequest for AuthenticatedUser {
    type Error = ApiError;
    type Future = Ready<Result<AuthenticatedUser, ApiError>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(extract(req))
    }
}

fn extract(req: &HttpRequest) -> Result<AuthenticatedUser, ApiError> {
    let auth_header = req
        .headers()
        .get("Authorization")
        .ok_or_else(|| ApiError::Unauthorized("Not authenticated.".to_string()))?
        .to_str()
        .map_err(|_| ApiError::Unauthorized("Invalid Authorization header.".to_string()))?;

    let token = auth_header
        .strip_prefix("Bearer ")
        .ok_or_else(|| ApiError::Unauthorized("Invalid Authorization header.".to_string()))?
        .trim();

    let auth = req
        .app_data::<web::Data<AuthService>>()
        .ok_or_else(|| ApiError::Internal("auth service not configured".to_string()))?;

    let user_id = auth.verify_token(token)?;
    Ok(AuthenticatedUser { user_id })
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::test::TestRequest;
    use chrono::Utc;

    use crate::models::user::User;

    fn service_and_token() -> (AuthService, String, Uuid) {
        let svc = AuthService::new("extractor-secret");
        let user = User {
            id: Uuid::new_v4(),
            email: "ada@example.com".to_string(),
            password_hash: String::new(),
            name: "Ada".to_string(),
            created_at: Utc::now(),
        };
        let (token, _) = svc.issue_token(&user).unwrap();
        (svc, token, user.id)
    }

    #[actix_web::test]
    async fn valid_bearer_token_yields_the_user_id() {
        let (svc, token, user_id) = service_and_token();
        let req = TestRequest::default()
            .app_data(web::Data::new(svc))
            .insert_header(("Authorization", format!("Bearer {}", token)))
            .to_http_request();

        let authed = AuthenticatedUser::from_request(&req, &mut Payload::None)
            .await
            .unwrap();
        assert_eq!(authed.user_id, user_id);
    }

    #[actix_web::test]
    async fn missing_header_is_unauthorized() {
        let (svc, _, _) = service_and_token();
        let req = TestRequest::default()
            .app_data(web::Data::new(svc))
            .to_http_request();

        let err = AuthenticatedUser::from_request(&req, &mut Payload::None)
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Unauthorized(_)));
    }

    #[actix_web::test]
    async fn non_bearer_scheme_is_unauthorized() {
        let (svc, token, _) = service_and_token();
        let req = TestRequest::default()
            .app_data(web::Data::new(svc))
            .insert_header(("Authorization", format!("Basic {}", token)))
            .to_http_request();

        let err = AuthenticatedUser::from_request(&req, &mut Payload::None)
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Unauthorized(_)));
    }

    #[actix_web::test]
    async fn tampered_token_is_unauthorized() {
        let (svc, token, _) = service_and_token();
        let mut forged = token;
        forged.push('x');
        let req = TestRequest::default()
            .app_data(web::Data::new(svc))
            .insert_header(("Authorization", format!("Bearer {}", forged)))
            .to_http_request();

        let err = AuthenticatedUser::from_request(&req, &mut Payload::None)
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Unauthorized(_)));
    }
}
