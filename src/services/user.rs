// 用户资料服务

use crate::db::repositories::UserRepository;
use crate::errors::OrgDeskError;
use crate::services::session::{verify_password, SessionManager};
use crate::services::storage::{FileStorageService, IncomingFile, UploadFileOptions};
use sea_orm::DatabaseConnection;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument};
use utoipa::ToSchema;
use uuid::Uuid;

/// 头像访问令牌有效期：一年
pub const PROFILE_PICTURE_TOKEN_HOURS: i64 = 24 * 365;

/// 当前用户信息
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub id: Uuid,
    pub name: Option<String>,
    pub email: String,
    pub profile_picture_url: Option<String>,
    pub created_at: chrono::DateTime<chrono::FixedOffset>,
}

/// 修改密码请求
#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordRequest {
    #[serde(default)]
    pub current_password: String,
    #[serde(default)]
    pub new_password: String,
    #[serde(default)]
    pub confirm_password: String,
}

/// 用户资料服务
pub struct UserService {
    db: Arc<DatabaseConnection>,
    storage: Arc<FileStorageService>,
    sessions: SessionManager,
}

impl UserService {
    pub fn new(db: Arc<DatabaseConnection>, storage: Arc<FileStorageService>, sessions: SessionManager) -> Self {
        Self { db, storage, sessions }
    }

    #[instrument(skip(self))]
    pub async fn get_profile(&self, user_id: Uuid) -> Result<UserProfile, OrgDeskError> {
        let user = UserRepository::find_by_id(self.db.as_ref(), user_id)
            .await?
            .ok_or_else(|| OrgDeskError::not_found("User not found"))?;

        Ok(UserProfile {
            id: user.id,
            name: user.name,
            email: user.email,
            profile_picture_url: user.profile_picture_url,
            created_at: user.created_at,
        })
    }

    /// 更新姓名与头像，空文件忽略
    #[instrument(skip(self, picture))]
    pub async fn update_profile(
        &self,
        user_id: Uuid,
        name: Option<String>,
        picture: Option<IncomingFile>,
    ) -> Result<UserProfile, OrgDeskError> {
        let name = name.map(|n| n.trim().to_string());
        if matches!(name.as_deref(), Some("")) {
            return Err(OrgDeskError::validation("name", "Name is required"));
        }

        let user = UserRepository::find_by_id(self.db.as_ref(), user_id)
            .await?
            .ok_or_else(|| OrgDeskError::not_found("User not found"))?;

        let picture_url = match picture.filter(|p| !p.bytes.is_empty()) {
            Some(picture) => {
                let uploaded = self
                    .storage
                    .upload(UploadFileOptions {
                        bytes: picture.bytes,
                        file_name: picture.file_name,
                        mime_type: picture.mime_type,
                        organization_id: None,
                        user_id: Some(user_id),
                        is_secure: true,
                        token_expiry_hours: Some(PROFILE_PICTURE_TOKEN_HOURS),
                    })
                    .await?;
                Some(uploaded.file_url)
            }
            None => None,
        };

        let updated = UserRepository::update_profile(self.db.as_ref(), user, name, picture_url).await?;
        info!(user_id = %user_id, "用户资料已更新");

        Ok(UserProfile {
            id: updated.id,
            name: updated.name,
            email: updated.email,
            profile_picture_url: updated.profile_picture_url,
            created_at: updated.created_at,
        })
    }

    #[instrument(skip(self, request))]
    pub async fn change_password(
        &self,
        user_id: Uuid,
        request: ChangePasswordRequest,
    ) -> Result<(), OrgDeskError> {
        validate_password_change(&request)?;

        let user = UserRepository::find_by_id(self.db.as_ref(), user_id)
            .await?
            .ok_or_else(|| OrgDeskError::not_found("User not found"))?;
        let hash = user
            .password_hash
            .as_deref()
            .ok_or_else(|| OrgDeskError::not_found("User not found"))?;

        if !verify_password(&request.current_password, hash) {
            return Err(OrgDeskError::validation(
                "currentPassword",
                "Current password is incorrect",
            ));
        }

        let new_hash = self.sessions.hash_password(&request.new_password)?;
        UserRepository::update_password(self.db.as_ref(), user_id, new_hash).await
    }
}

pub fn validate_password_change(request: &ChangePasswordRequest) -> Result<(), OrgDeskError> {
    if request.current_password.is_empty() {
        return Err(OrgDeskError::validation(
            "currentPassword",
            "Current password is required",
        ));
    }
    if request.new_password.len() < super::auth::MIN_PASSWORD_LENGTH {
        return Err(OrgDeskError::validation(
            "newPassword",
            "Password must be at least 8 characters",
        ));
    }
    if request.new_password != request.confirm_password {
        return Err(OrgDeskError::validation("confirmPassword", "Passwords don't match"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;
    use crate::db::entities::user;
    use object_store::memory::InMemory;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};

    fn service(db: Arc<DatabaseConnection>) -> UserService {
        let mut security = AppConfig::default().security;
        security.bcrypt_cost = 4;
        let storage = FileStorageService::with_store(
            db.clone(),
            Arc::new(InMemory::new()),
            AppConfig::default().storage,
        );
        UserService::new(db, Arc::new(storage), SessionManager::new(&security, false))
    }

    fn user(password: &str) -> user::Model {
        user::Model {
            id: Uuid::new_v4(),
            email: "viewer@example.com".to_string(),
            name: Some("Viewer User".to_string()),
            password_hash: Some(bcrypt::hash(password, 4).unwrap()),
            profile_picture_url: None,
            reset_token: None,
            reset_token_expiry: None,
            created_at: chrono::Utc::now().into(),
            updated_at: chrono::Utc::now().into(),
        }
    }

    fn request(current: &str, new: &str, confirm: &str) -> ChangePasswordRequest {
        ChangePasswordRequest {
            current_password: current.to_string(),
            new_password: new.to_string(),
            confirm_password: confirm.to_string(),
        }
    }

    #[test]
    fn test_password_change_validation() {
        assert!(validate_password_change(&request("", "long-enough", "long-enough")).is_err());
        assert!(validate_password_change(&request("old", "short", "short")).is_err());

        let err = validate_password_change(&request("old", "long-enough", "different!")).unwrap_err();
        assert_eq!(err.message(), "Passwords don't match");

        assert!(validate_password_change(&request("old", "long-enough", "long-enough")).is_ok());
    }

    #[tokio::test]
    async fn test_get_profile_not_found() {
        let db = Arc::new(MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<user::Model>::new()])
            .into_connection());

        let err = service(db).get_profile(Uuid::new_v4()).await.unwrap_err();
        assert_eq!(err.status_code(), 404);
        assert_eq!(err.message(), "User not found");
    }

    #[tokio::test]
    async fn test_change_password() {
        let existing = user("Admin@123");
        let db = Arc::new(MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![existing.clone()]])
            .append_query_results([vec![existing.clone()]])
            .append_exec_results([MockExecResult {
                last_insert_id: 0,
                rows_affected: 1,
            }])
            .into_connection());
        let service = service(db);

        let err = service
            .change_password(existing.id, request("wrong", "new-password", "new-password"))
            .await
            .unwrap_err();
        assert_eq!(err.message(), "Current password is incorrect");

        service
            .change_password(existing.id, request("Admin@123", "new-password", "new-password"))
            .await
            .unwrap();
    }
}
