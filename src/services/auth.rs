// 认证服务
// 处理注册、登录与找回密码

use crate::db::entities::user;
use crate::db::repositories::UserRepository;
use crate::errors::OrgDeskError;
use crate::services::session::{verify_password, SessionManager};
use chrono::{Duration, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use sea_orm::DatabaseConnection;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument, warn};
use utoipa::ToSchema;

static EMAIL_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("invalid email regex"));

pub const MIN_PASSWORD_LENGTH: usize = 8;
pub const RESET_TOKEN_TTL_HOURS: i64 = 1;
pub const FORGOT_PASSWORD_MESSAGE: &str = "If an account exists, a reset link has been sent.";

/// 注册请求
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct SignupRequest {
    pub email: String,
    pub password: String,
    pub name: String,
}

/// 登录请求
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// 找回密码请求
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct ForgotPasswordRequest {
    #[serde(default)]
    pub email: String,
}

/// 登录或注册后返回的用户信息
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AuthenticatedUser {
    pub id: uuid::Uuid,
    pub email: String,
    pub name: Option<String>,
}

impl From<&user::Model> for AuthenticatedUser {
    fn from(user: &user::Model) -> Self {
        Self {
            id: user.id,
            email: user.email.clone(),
            name: user.name.clone(),
        }
    }
}

/// 认证服务
pub struct AuthService {
    db: Arc<DatabaseConnection>,
    sessions: SessionManager,
}

impl AuthService {
    pub fn new(db: Arc<DatabaseConnection>, sessions: SessionManager) -> Self {
        Self { db, sessions }
    }

    /// 注册新用户并签发会话令牌
    #[instrument(skip(self, request), fields(email = %request.email))]
    pub async fn signup(&self, request: SignupRequest) -> Result<(AuthenticatedUser, String), OrgDeskError> {
        validate_signup(&request)?;

        if UserRepository::find_by_email(self.db.as_ref(), &request.email)
            .await?
            .is_some()
        {
            return Err(OrgDeskError::conflict("Email already in use"));
        }

        let password_hash = self.sessions.hash_password(&request.password)?;
        let user = UserRepository::create(
            self.db.as_ref(),
            &request.email,
            Some(request.name.trim().to_string()),
            Some(password_hash),
        )
        .await?;

        let token = self.sessions.issue(user.id)?;
        info!(user_id = %user.id, "用户注册成功");
        Ok((AuthenticatedUser::from(&user), token))
    }

    /// 校验凭据并签发会话令牌
    #[instrument(skip(self, request), fields(email = %request.email))]
    pub async fn login(&self, request: LoginRequest) -> Result<(AuthenticatedUser, String), OrgDeskError> {
        let invalid = || OrgDeskError::unauthorized("Invalid credentials");

        let user = UserRepository::find_by_email(self.db.as_ref(), &request.email)
            .await?
            .ok_or_else(invalid)?;
        let hash = user.password_hash.as_deref().ok_or_else(invalid)?;

        if !verify_password(&request.password, hash) {
            warn!(user_id = %user.id, "登录密码错误");
            return Err(invalid());
        }

        let token = self.sessions.issue(user.id)?;
        info!(user_id = %user.id, "用户登录成功");
        Ok((AuthenticatedUser::from(&user), token))
    }

    /// 为已存在的用户生成重置令牌，对外总是返回同一条消息
    #[instrument(skip(self, request))]
    pub async fn forgot_password(&self, request: ForgotPasswordRequest) -> Result<&'static str, OrgDeskError> {
        let email = request.email.trim();
        if email.is_empty() {
            return Err(OrgDeskError::validation("email", "Email is required"));
        }

        if let Some(user) = UserRepository::find_by_email(self.db.as_ref(), email).await? {
            let token = crate::services::storage::generate_access_token();
            let expiry = Utc::now() + Duration::hours(RESET_TOKEN_TTL_HOURS);
            UserRepository::set_reset_token(self.db.as_ref(), user.id, token.clone(), expiry).await?;

            // TODO: 接入邮件服务后改为发送重置链接
            info!(user_id = %user.id, reset_token = %token, "已生成密码重置令牌");
        }

        Ok(FORGOT_PASSWORD_MESSAGE)
    }
}

pub fn is_valid_email(email: &str) -> bool {
    EMAIL_REGEX.is_match(email.trim())
}

fn validate_signup(request: &SignupRequest) -> Result<(), OrgDeskError> {
    if !is_valid_email(&request.email) {
        return Err(OrgDeskError::validation("email", "Please enter a valid email."));
    }
    if request.password.len() < MIN_PASSWORD_LENGTH {
        return Err(OrgDeskError::validation(
            "password",
            "Password must be at least 8 characters long.",
        ));
    }
    if request.name.trim().chars().count() < 2 {
        return Err(OrgDeskError::validation(
            "name",
            "Name must be at least 2 characters long.",
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};
    use uuid::Uuid;

    fn sessions() -> SessionManager {
        let mut security = AppConfig::default().security;
        security.bcrypt_cost = 4;
        SessionManager::new(&security, false)
    }

    fn user_with_password(password: Option<&str>) -> user::Model {
        user::Model {
            id: Uuid::new_v4(),
            email: "admin@example.com".to_string(),
            name: Some("Admin User".to_string()),
            password_hash: password.map(|p| bcrypt::hash(p, 4).unwrap()),
            profile_picture_url: None,
            reset_token: None,
            reset_token_expiry: None,
            created_at: Utc::now().into(),
            updated_at: Utc::now().into(),
        }
    }

    #[test]
    fn test_email_validation() {
        assert!(is_valid_email("user@example.com"));
        assert!(!is_valid_email("user@example"));
        assert!(!is_valid_email("not an email"));
    }

    #[tokio::test]
    async fn test_signup_validation() {
        let db = Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection());
        let service = AuthService::new(db, sessions());

        let err = service
            .signup(SignupRequest {
                email: "a@b.co".to_string(),
                password: "short".to_string(),
                name: "Al".to_string(),
            })
            .await
            .unwrap_err();
        assert_eq!(err.status_code(), 400);
    }

    #[tokio::test]
    async fn test_signup_duplicate_email() {
        let db = Arc::new(MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![user_with_password(None)]])
            .into_connection());
        let service = AuthService::new(db, sessions());

        let err = service
            .signup(SignupRequest {
                email: "Admin@Example.com".to_string(),
                password: "long-enough".to_string(),
                name: "Admin".to_string(),
            })
            .await
            .unwrap_err();
        assert_eq!(err.status_code(), 409);
        assert_eq!(err.message(), "Email already in use");
    }

    #[tokio::test]
    async fn test_login_success_and_failure() {
        let user = user_with_password(Some("Admin@123"));
        let db = Arc::new(MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![user.clone()]])
            .append_query_results([vec![user.clone()]])
            .append_query_results([vec![user_with_password(None)]])
            .into_connection());
        let sessions = sessions();
        let service = AuthService::new(db, sessions.clone());

        let (logged_in, token) = service
            .login(LoginRequest {
                email: "admin@example.com".to_string(),
                password: "Admin@123".to_string(),
            })
            .await
            .unwrap();
        assert_eq!(logged_in.id, user.id);
        assert_eq!(sessions.verify(&token).unwrap().user_id, user.id);

        let wrong = LoginRequest {
            email: "admin@example.com".to_string(),
            password: "nope".to_string(),
        };
        assert_eq!(
            service.login(wrong.clone()).await.unwrap_err().message(),
            "Invalid credentials"
        );
        // 无密码哈希的账户同样拒绝
        assert_eq!(service.login(wrong).await.unwrap_err().status_code(), 401);
    }

    #[tokio::test]
    async fn test_forgot_password() {
        let db = Arc::new(MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<user::Model>::new()])
            .append_query_results([vec![user_with_password(None)]])
            .append_exec_results([MockExecResult {
                last_insert_id: 0,
                rows_affected: 1,
            }])
            .into_connection());
        let service = AuthService::new(db, sessions());

        let missing = ForgotPasswordRequest {
            email: "nobody@example.com".to_string(),
        };
        assert_eq!(service.forgot_password(missing).await.unwrap(), FORGOT_PASSWORD_MESSAGE);

        let existing = ForgotPasswordRequest {
            email: "admin@example.com".to_string(),
        };
        assert_eq!(service.forgot_password(existing).await.unwrap(), FORGOT_PASSWORD_MESSAGE);

        let empty = ForgotPasswordRequest { email: "  ".to_string() };
        assert_eq!(service.forgot_password(empty).await.unwrap_err().message(), "Email is required");
    }
}
