// Agent 仓储实现

use crate::db::entities::{agent, prelude::*};
use crate::errors::OrgDeskError;
use sea_orm::{prelude::*, *};
use tracing::{info, instrument};
use uuid::Uuid;

/// 创建 Agent 所需字段
#[derive(Debug, Clone)]
pub struct NewAgent {
    pub name: String,
    pub description: Option<String>,
    pub system_prompt: Option<String>,
    pub model: String,
    pub temperature: f64,
    pub max_tokens: Option<i32>,
    pub knowledge_base_id: Option<Uuid>,
    pub is_active: bool,
}

/// 部分更新，`None` 表示保持不变
#[derive(Debug, Clone, Default)]
pub struct AgentChanges {
    pub name: Option<String>,
    pub description: Option<String>,
    pub system_prompt: Option<String>,
    pub model: Option<String>,
    pub temperature: Option<f64>,
    pub max_tokens: Option<i32>,
    pub knowledge_base_id: Option<Uuid>,
    pub is_active: Option<bool>,
}

/// Agent 仓储
pub struct AgentRepository;

impl AgentRepository {
    #[instrument(skip(db, input), fields(name = %input.name))]
    pub async fn create(
        db: &DatabaseConnection,
        organization_id: Uuid,
        input: NewAgent,
    ) -> Result<agent::Model, OrgDeskError> {
        let now = chrono::Utc::now();
        let created = agent::ActiveModel {
            id: Set(Uuid::new_v4()),
            organization_id: Set(organization_id),
            name: Set(input.name),
            description: Set(input.description),
            system_prompt: Set(input.system_prompt),
            model: Set(input.model),
            temperature: Set(input.temperature),
            max_tokens: Set(input.max_tokens),
            knowledge_base_id: Set(input.knowledge_base_id),
            is_active: Set(input.is_active),
            created_at: Set(now.into()),
            updated_at: Set(now.into()),
        }
        .insert(db)
        .await?;

        info!(agent_id = %created.id, organization_id = %organization_id, "Agent 创建成功");
        Ok(created)
    }

    /// 组织内的 Agent，最新创建的排在前面
    #[instrument(skip(db))]
    pub async fn list_by_organization(
        db: &DatabaseConnection,
        organization_id: Uuid,
    ) -> Result<Vec<agent::Model>, OrgDeskError> {
        Ok(Agent::find()
            .filter(agent::Column::OrganizationId.eq(organization_id))
            .order_by_desc(agent::Column::CreatedAt)
            .all(db)
            .await?)
    }

    /// 仅在 Agent 属于该组织时返回
    #[instrument(skip(db))]
    pub async fn find_in_organization(
        db: &DatabaseConnection,
        id: Uuid,
        organization_id: Uuid,
    ) -> Result<Option<agent::Model>, OrgDeskError> {
        Ok(Agent::find_by_id(id)
            .filter(agent::Column::OrganizationId.eq(organization_id))
            .one(db)
            .await?)
    }

    #[instrument(skip(db, existing, changes))]
    pub async fn update(
        db: &DatabaseConnection,
        existing: agent::Model,
        changes: AgentChanges,
    ) -> Result<agent::Model, OrgDeskError> {
        let mut model: agent::ActiveModel = existing.into();
        if let Some(name) = changes.name {
            model.name = Set(name);
        }
        if let Some(description) = changes.description {
            model.description = Set(Some(description));
        }
        if let Some(prompt) = changes.system_prompt {
            model.system_prompt = Set(Some(prompt));
        }
        if let Some(m) = changes.model {
            model.model = Set(m);
        }
        if let Some(temperature) = changes.temperature {
            model.temperature = Set(temperature);
        }
        if let Some(max_tokens) = changes.max_tokens {
            model.max_tokens = Set(Some(max_tokens));
        }
        if let Some(kb_id) = changes.knowledge_base_id {
            model.knowledge_base_id = Set(Some(kb_id));
        }
        if let Some(active) = changes.is_active {
            model.is_active = Set(active);
        }
        model.updated_at = Set(chrono::Utc::now().into());

        Ok(model.update(db).await?)
    }

    #[instrument(skip(db))]
    pub async fn delete(db: &DatabaseConnection, id: Uuid) -> Result<(), OrgDeskError> {
        Agent::delete_by_id(id).exec(db).await?;
        info!(agent_id = %id, "Agent 已删除");
        Ok(())
    }
}
