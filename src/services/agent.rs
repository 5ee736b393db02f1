// Agent 服务
// 组织内 Agent 的增删改查，关联知识库须属于同一组织

use crate::db::entities::{agent, knowledge_base, KnowledgeBaseStatus};
use crate::db::entities::agent::{DEFAULT_MODEL, DEFAULT_TEMPERATURE};
use crate::db::repositories::{AgentChanges, AgentRepository, KnowledgeBaseRepository, NewAgent};
use crate::errors::OrgDeskError;
use sea_orm::DatabaseConnection;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument};
use utoipa::ToSchema;
use uuid::Uuid;

/// Agent 引用的知识库摘要
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct KnowledgeBaseRef {
    pub id: Uuid,
    pub name: String,
    pub status: KnowledgeBaseStatus,
}

impl From<&knowledge_base::Model> for KnowledgeBaseRef {
    fn from(kb: &knowledge_base::Model) -> Self {
        Self {
            id: kb.id,
            name: kb.name.clone(),
            status: kb.status,
        }
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AgentResponse {
    #[serde(flatten)]
    #[schema(value_type = Object)]
    pub agent: agent::Model,
    pub knowledge_base: Option<KnowledgeBaseRef>,
}

#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateAgentRequest {
    #[serde(default)]
    pub name: String,
    pub description: Option<String>,
    pub system_prompt: Option<String>,
    pub model: Option<String>,
    pub temperature: Option<f64>,
    pub max_tokens: Option<i32>,
    pub knowledge_base_id: Option<Uuid>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateAgentRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub system_prompt: Option<String>,
    pub model: Option<String>,
    pub temperature: Option<f64>,
    pub max_tokens: Option<i32>,
    pub knowledge_base_id: Option<Uuid>,
    pub is_active: Option<bool>,
}

/// Agent 服务
pub struct AgentService {
    db: Arc<DatabaseConnection>,
}

impl AgentService {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// 最新创建的排在前面
    #[instrument(skip(self))]
    pub async fn list(&self, organization_id: Uuid) -> Result<Vec<AgentResponse>, OrgDeskError> {
        let agents = AgentRepository::list_by_organization(self.db.as_ref(), organization_id).await?;
        let kb = KnowledgeBaseRepository::find_by_organization(self.db.as_ref(), organization_id).await?;

        Ok(agents
            .into_iter()
            .map(|agent| with_knowledge_base(agent, kb.as_ref()))
            .collect())
    }

    #[instrument(skip(self))]
    pub async fn get(&self, organization_id: Uuid, agent_id: Uuid) -> Result<AgentResponse, OrgDeskError> {
        let agent = self.require(organization_id, agent_id).await?;
        let kb = KnowledgeBaseRepository::find_by_organization(self.db.as_ref(), organization_id).await?;
        Ok(with_knowledge_base(agent, kb.as_ref()))
    }

    #[instrument(skip(self, request))]
    pub async fn create(
        &self,
        organization_id: Uuid,
        request: CreateAgentRequest,
    ) -> Result<AgentResponse, OrgDeskError> {
        let name = request.name.trim().to_string();
        if name.is_empty() {
            return Err(OrgDeskError::validation("name", "Name is required"));
        }

        let kb = self.check_knowledge_base(organization_id, request.knowledge_base_id).await?;

        let created = AgentRepository::create(
            self.db.as_ref(),
            organization_id,
            NewAgent {
                name,
                description: request.description,
                system_prompt: request.system_prompt,
                model: request.model.filter(|m| !m.is_empty()).unwrap_or_else(|| DEFAULT_MODEL.to_string()),
                temperature: request.temperature.unwrap_or(DEFAULT_TEMPERATURE),
                max_tokens: request.max_tokens,
                knowledge_base_id: request.knowledge_base_id,
                is_active: request.is_active.unwrap_or(true),
            },
        )
        .await?;

        info!(agent_id = %created.id, "Agent 已创建");
        Ok(with_knowledge_base(created, kb.as_ref()))
    }

    #[instrument(skip(self, request))]
    pub async fn update(
        &self,
        organization_id: Uuid,
        agent_id: Uuid,
        request: UpdateAgentRequest,
    ) -> Result<AgentResponse, OrgDeskError> {
        let existing = self.require(organization_id, agent_id).await?;

        if let Some(name) = request.name.as_deref() {
            if name.trim().is_empty() {
                return Err(OrgDeskError::validation("name", "Name is required"));
            }
        }
        self.check_knowledge_base(organization_id, request.knowledge_base_id).await?;

        let changes = AgentChanges {
            name: request.name.map(|n| n.trim().to_string()),
            description: request.description,
            system_prompt: request.system_prompt,
            model: request.model,
            temperature: request.temperature,
            max_tokens: request.max_tokens,
            knowledge_base_id: request.knowledge_base_id,
            is_active: request.is_active,
        };
        let updated = AgentRepository::update(self.db.as_ref(), existing, changes).await?;
        let kb = KnowledgeBaseRepository::find_by_organization(self.db.as_ref(), organization_id).await?;

        Ok(with_knowledge_base(updated, kb.as_ref()))
    }

    #[instrument(skip(self))]
    pub async fn delete(&self, organization_id: Uuid, agent_id: Uuid) -> Result<(), OrgDeskError> {
        let existing = self.require(organization_id, agent_id).await?;
        AgentRepository::delete(self.db.as_ref(), existing.id).await
    }

    async fn require(&self, organization_id: Uuid, agent_id: Uuid) -> Result<agent::Model, OrgDeskError> {
        AgentRepository::find_in_organization(self.db.as_ref(), agent_id, organization_id)
            .await?
            .ok_or_else(|| OrgDeskError::not_found("Agent not found"))
    }

    /// 指定的知识库必须属于当前组织
    async fn check_knowledge_base(
        &self,
        organization_id: Uuid,
        knowledge_base_id: Option<Uuid>,
    ) -> Result<Option<knowledge_base::Model>, OrgDeskError> {
        let Some(knowledge_base_id) = knowledge_base_id else {
            return Ok(None);
        };

        KnowledgeBaseRepository::find_by_organization(self.db.as_ref(), organization_id)
            .await?
            .filter(|kb| kb.id == knowledge_base_id)
            .map(Some)
            .ok_or_else(|| OrgDeskError::not_found("Knowledge base not found or access denied"))
    }
}

fn with_knowledge_base(agent: agent::Model, kb: Option<&knowledge_base::Model>) -> AgentResponse {
    let knowledge_base = kb
        .filter(|kb| agent.knowledge_base_id == Some(kb.id))
        .map(KnowledgeBaseRef::from);
    AgentResponse { agent, knowledge_base }
}
