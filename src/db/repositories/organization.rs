// 组织仓储实现

use crate::db::entities::{organization, organization_access, prelude::*};
use crate::errors::OrgDeskError;
use sea_orm::{prelude::*, *};
use tracing::{info, instrument};
use uuid::Uuid;

/// 组织仓储
pub struct OrganizationRepository;

impl OrganizationRepository {
    #[instrument(skip(db))]
    pub async fn create<C: ConnectionTrait>(
        db: &C,
        name: &str,
        code: &str,
    ) -> Result<organization::Model, OrgDeskError> {
        Self::create_with_id(db, Uuid::new_v4(), name, code).await
    }

    /// 使用指定 ID 创建组织（种子数据需要固定 ID）
    #[instrument(skip(db))]
    pub async fn create_with_id<C: ConnectionTrait>(
        db: &C,
        id: Uuid,
        name: &str,
        code: &str,
    ) -> Result<organization::Model, OrgDeskError> {
        let now = chrono::Utc::now();
        let model = organization::ActiveModel {
            id: Set(id),
            name: Set(name.to_string()),
            code: Set(code.to_string()),
            logo_url: Set(None),
            created_at: Set(now.into()),
            updated_at: Set(now.into()),
        };

        let created = model.insert(db).await?;
        info!(organization_id = %created.id, code = %created.code, "组织创建成功");
        Ok(created)
    }

    #[instrument(skip(db))]
    pub async fn find_by_id<C: ConnectionTrait>(
        db: &C,
        id: Uuid,
    ) -> Result<Option<organization::Model>, OrgDeskError> {
        Ok(Organization::find_by_id(id).one(db).await?)
    }

    #[instrument(skip(db))]
    pub async fn find_by_code<C: ConnectionTrait>(
        db: &C,
        code: &str,
    ) -> Result<Option<organization::Model>, OrgDeskError> {
        Ok(Organization::find()
            .filter(organization::Column::Code.eq(code))
            .one(db)
            .await?)
    }

    /// 用户可访问的组织，按加入时间排序
    #[instrument(skip(db))]
    pub async fn list_for_user(
        db: &DatabaseConnection,
        user_id: Uuid,
    ) -> Result<Vec<organization::Model>, OrgDeskError> {
        let rows = OrganizationAccess::find()
            .filter(organization_access::Column::UserId.eq(user_id))
            .order_by_asc(organization_access::Column::CreatedAt)
            .find_also_related(Organization)
            .all(db)
            .await?;

        Ok(rows.into_iter().filter_map(|(_, org)| org).collect())
    }

    /// 更新名称，`logo_url` 为 `None` 时保留原值
    #[instrument(skip(db, existing))]
    pub async fn update(
        db: &DatabaseConnection,
        existing: organization::Model,
        name: String,
        logo_url: Option<String>,
    ) -> Result<organization::Model, OrgDeskError> {
        let mut model: organization::ActiveModel = existing.into();
        model.name = Set(name);
        if let Some(url) = logo_url {
            model.logo_url = Set(Some(url));
        }
        model.updated_at = Set(chrono::Utc::now().into());

        let updated = model.update(db).await?;
        info!(organization_id = %updated.id, "组织信息已更新");
        Ok(updated)
    }
}
