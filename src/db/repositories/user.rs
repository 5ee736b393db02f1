// 用户仓储实现

use crate::db::entities::{prelude::*, user};
use crate::errors::OrgDeskError;
use sea_orm::{prelude::*, *};
use tracing::{info, instrument};
use uuid::Uuid;

/// 用户仓储
pub struct UserRepository;

impl UserRepository {
    /// 创建用户，邮箱统一转为小写
    #[instrument(skip(db, password_hash))]
    pub async fn create<C: ConnectionTrait>(
        db: &C,
        email: &str,
        name: Option<String>,
        password_hash: Option<String>,
    ) -> Result<user::Model, OrgDeskError> {
        let now = chrono::Utc::now();
        let model = user::ActiveModel {
            id: Set(Uuid::new_v4()),
            email: Set(normalize_email(email)),
            name: Set(name),
            password_hash: Set(password_hash),
            profile_picture_url: Set(None),
            reset_token: Set(None),
            reset_token_expiry: Set(None),
            created_at: Set(now.into()),
            updated_at: Set(now.into()),
        };

        let created = model.insert(db).await?;
        info!(user_id = %created.id, "用户创建成功");
        Ok(created)
    }

    #[instrument(skip(db))]
    pub async fn find_by_id<C: ConnectionTrait>(
        db: &C,
        id: Uuid,
    ) -> Result<Option<user::Model>, OrgDeskError> {
        Ok(User::find_by_id(id).one(db).await?)
    }

    #[instrument(skip(db))]
    pub async fn find_by_email<C: ConnectionTrait>(
        db: &C,
        email: &str,
    ) -> Result<Option<user::Model>, OrgDeskError> {
        Ok(User::find()
            .filter(user::Column::Email.eq(normalize_email(email)))
            .one(db)
            .await?)
    }

    /// 更新姓名与头像，`None` 表示保持不变
    #[instrument(skip(db, existing))]
    pub async fn update_profile(
        db: &DatabaseConnection,
        existing: user::Model,
        name: Option<String>,
        profile_picture_url: Option<String>,
    ) -> Result<user::Model, OrgDeskError> {
        let mut model: user::ActiveModel = existing.into();
        if let Some(name) = name {
            model.name = Set(Some(name));
        }
        if let Some(url) = profile_picture_url {
            model.profile_picture_url = Set(Some(url));
        }
        model.updated_at = Set(chrono::Utc::now().into());

        Ok(model.update(db).await?)
    }

    #[instrument(skip(db, password_hash))]
    pub async fn update_password(
        db: &DatabaseConnection,
        user_id: Uuid,
        password_hash: String,
    ) -> Result<(), OrgDeskError> {
        User::update_many()
            .col_expr(user::Column::PasswordHash, Expr::value(Some(password_hash)))
            .col_expr(
                user::Column::UpdatedAt,
                Expr::value(DateTimeWithTimeZone::from(chrono::Utc::now())),
            )
            .filter(user::Column::Id.eq(user_id))
            .exec(db)
            .await?;
        info!(user_id = %user_id, "用户密码已更新");
        Ok(())
    }

    #[instrument(skip(db, token))]
    pub async fn set_reset_token(
        db: &DatabaseConnection,
        user_id: Uuid,
        token: String,
        expiry: chrono::DateTime<chrono::Utc>,
    ) -> Result<(), OrgDeskError> {
        User::update_many()
            .col_expr(user::Column::ResetToken, Expr::value(Some(token)))
            .col_expr(
                user::Column::ResetTokenExpiry,
                Expr::value(Some(DateTimeWithTimeZone::from(expiry))),
            )
            .filter(user::Column::Id.eq(user_id))
            .exec(db)
            .await?;
        Ok(())
    }
}

/// 邮箱比较不区分大小写
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}
