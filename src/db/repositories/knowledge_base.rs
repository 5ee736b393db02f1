// 知识库仓储实现

use crate::db::entities::{knowledge_base, prelude::*};
use crate::errors::OrgDeskError;
use sea_orm::{prelude::*, *};
use tracing::{info, instrument};
use uuid::Uuid;

/// 知识库仓储
pub struct KnowledgeBaseRepository;

impl KnowledgeBaseRepository {
    #[instrument(skip(db))]
    pub async fn create(
        db: &DatabaseConnection,
        organization_id: Uuid,
        name: &str,
        description: Option<String>,
        vector_store_id: Option<String>,
        status: KnowledgeBaseStatus,
    ) -> Result<knowledge_base::Model, OrgDeskError> {
        let now = chrono::Utc::now();
        let model = knowledge_base::ActiveModel {
            id: Set(Uuid::new_v4()),
            organization_id: Set(organization_id),
            name: Set(name.to_string()),
            description: Set(description),
            vector_store_id: Set(vector_store_id),
            status: Set(status),
            created_at: Set(now.into()),
            updated_at: Set(now.into()),
        };

        let created = model.insert(db).await?;
        info!(knowledge_base_id = %created.id, organization_id = %organization_id, "知识库创建成功");
        Ok(created)
    }

    /// 每个组织至多一个知识库
    #[instrument(skip(db))]
    pub async fn find_by_organization(
        db: &DatabaseConnection,
        organization_id: Uuid,
    ) -> Result<Option<knowledge_base::Model>, OrgDeskError> {
        Ok(KnowledgeBase::find()
            .filter(knowledge_base::Column::OrganizationId.eq(organization_id))
            .one(db)
            .await?)
    }

    /// 更新名称与描述，`None` 表示保持不变
    #[instrument(skip(db, existing))]
    pub async fn update_details(
        db: &DatabaseConnection,
        existing: knowledge_base::Model,
        name: Option<String>,
        description: Option<String>,
    ) -> Result<knowledge_base::Model, OrgDeskError> {
        let mut model: knowledge_base::ActiveModel = existing.into();
        if let Some(name) = name {
            model.name = Set(name);
        }
        if let Some(description) = description {
            model.description = Set(Some(description));
        }
        model.updated_at = Set(chrono::Utc::now().into());
        Ok(model.update(db).await?)
    }

    /// 替换向量库 ID 并更新状态
    #[instrument(skip(db, existing))]
    pub async fn set_vector_store(
        db: &DatabaseConnection,
        existing: knowledge_base::Model,
        vector_store_id: Option<String>,
        status: KnowledgeBaseStatus,
    ) -> Result<knowledge_base::Model, OrgDeskError> {
        let mut model: knowledge_base::ActiveModel = existing.into();
        model.vector_store_id = Set(vector_store_id);
        model.status = Set(status);
        model.updated_at = Set(chrono::Utc::now().into());

        let updated = model.update(db).await?;
        info!(knowledge_base_id = %updated.id, status = ?updated.status, "知识库向量库已更新");
        Ok(updated)
    }
}
