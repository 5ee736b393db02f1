// 知识库服务层
// 管理组织知识库、训练记录及后台训练任务

use crate::db::entities::{file_storage, knowledge_base, training_file, training_website};
use crate::db::entities::{KnowledgeBaseStatus, TrainingStatus};
use crate::db::repositories::{KnowledgeBaseRepository, TrainingRepository};
use crate::errors::OrgDeskError;
use crate::services::storage::FileStorageService;
use crate::services::vector_store::{VectorStoreClient, VectorStoreParams};
use sea_orm::DatabaseConnection;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info, instrument, warn};
use utoipa::ToSchema;
use uuid::Uuid;

/// 创建知识库请求
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct CreateKnowledgeBaseRequest {
    #[serde(default)]
    pub name: String,
    pub description: Option<String>,
}

/// 更新知识库请求
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct UpdateKnowledgeBaseRequest {
    pub name: Option<String>,
    pub description: Option<String>,
}

/// 训练文件及其存储信息
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TrainingFileDetail {
    #[serde(flatten)]
    #[schema(value_type = Object)]
    pub training: training_file::Model,
    #[schema(value_type = Option<Object>)]
    pub file_storage: Option<file_storage::Model>,
}

/// 知识库详情
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct KnowledgeBaseDetail {
    #[serde(flatten)]
    #[schema(value_type = Object)]
    pub knowledge_base: knowledge_base::Model,
    pub training_files: Vec<TrainingFileDetail>,
    #[schema(value_type = Vec<Object>)]
    pub training_websites: Vec<training_website::Model>,
}

/// 知识库服务
#[derive(Clone)]
pub struct KnowledgeBaseService {
    db: Arc<DatabaseConnection>,
    storage: Arc<FileStorageService>,
    vector_store: Arc<dyn VectorStoreClient>,
}

impl KnowledgeBaseService {
    pub fn new(
        db: Arc<DatabaseConnection>,
        storage: Arc<FileStorageService>,
        vector_store: Arc<dyn VectorStoreClient>,
    ) -> Self {
        Self {
            db,
            storage,
            vector_store,
        }
    }

    async fn require(&self, organization_id: Uuid) -> Result<knowledge_base::Model, OrgDeskError> {
        KnowledgeBaseRepository::find_by_organization(self.db.as_ref(), organization_id)
            .await?
            .ok_or_else(|| OrgDeskError::not_found("Knowledge base not found"))
    }

    /// 组织知识库及全部训练记录，最新的排在前面
    #[instrument(skip(self))]
    pub async fn get(&self, organization_id: Uuid) -> Result<KnowledgeBaseDetail, OrgDeskError> {
        let kb = self.require(organization_id).await?;
        self.detail(kb).await
    }

    async fn detail(&self, kb: knowledge_base::Model) -> Result<KnowledgeBaseDetail, OrgDeskError> {
        let training_files = TrainingRepository::list_files(self.db.as_ref(), kb.id)
            .await?
            .into_iter()
            .map(|(training, file_storage)| TrainingFileDetail {
                training,
                file_storage,
            })
            .collect();
        let training_websites = TrainingRepository::list_websites(self.db.as_ref(), kb.id).await?;

        Ok(KnowledgeBaseDetail {
            knowledge_base: kb,
            training_files,
            training_websites,
        })
    }

    /// 创建知识库，向量库创建失败时记为 ERROR
    #[instrument(skip(self, request))]
    pub async fn create(
        &self,
        organization_id: Uuid,
        request: CreateKnowledgeBaseRequest,
    ) -> Result<KnowledgeBaseDetail, OrgDeskError> {
        let name = request.name.trim();
        if name.is_empty() {
            return Err(OrgDeskError::validation("name", "Name is required"));
        }

        if KnowledgeBaseRepository::find_by_organization(self.db.as_ref(), organization_id)
            .await?
            .is_some()
        {
            return Err(OrgDeskError::validation(
                "organizationId",
                "Knowledge base already exists for this organization",
            ));
        }

        let description = request.description.filter(|d| !d.is_empty());
        let (vector_store_id, status) = self
            .create_vector_store(format!("{} - Knowledge Base", name), description.clone())
            .await;

        let kb = KnowledgeBaseRepository::create(
            self.db.as_ref(),
            organization_id,
            name,
            description,
            vector_store_id,
            status,
        )
        .await?;

        Ok(KnowledgeBaseDetail {
            knowledge_base: kb,
            training_files: Vec::new(),
            training_websites: Vec::new(),
        })
    }

    /// 组织创建时附带的知识库，任何失败只记录日志
    #[instrument(skip(self))]
    pub async fn provision_for_organization(&self, organization_id: Uuid, organization_name: &str) {
        let description = format!("Knowledge base for {}", organization_name);
        let (vector_store_id, status) = self
            .create_vector_store(
                format!("{} - Knowledge Base", organization_name),
                Some(description.clone()),
            )
            .await;

        if let Err(e) = KnowledgeBaseRepository::create(
            self.db.as_ref(),
            organization_id,
            &format!("{} Knowledge Base", organization_name),
            Some(description),
            vector_store_id,
            status,
        )
        .await
        {
            error!(organization_id = %organization_id, error = %e, "创建组织知识库失败");
        }
    }

    async fn create_vector_store(
        &self,
        name: String,
        description: Option<String>,
    ) -> (Option<String>, KnowledgeBaseStatus) {
        let params = VectorStoreParams {
            name: Some(name),
            description,
        };
        match self.vector_store.create(params).await {
            Ok(store) => (Some(store.id), KnowledgeBaseStatus::Ready),
            Err(e) => {
                error!(error = %e, "创建向量库失败");
                (None, KnowledgeBaseStatus::Error)
            }
        }
    }

    /// 先尽力同步向量库，再更新数据库
    #[instrument(skip(self, request))]
    pub async fn update(
        &self,
        organization_id: Uuid,
        request: UpdateKnowledgeBaseRequest,
    ) -> Result<KnowledgeBaseDetail, OrgDeskError> {
        let kb = self.require(organization_id).await?;
        let name = request.name.filter(|n| !n.trim().is_empty());

        if let Some(vector_store_id) = kb.vector_store_id.as_deref() {
            let params = VectorStoreParams {
                name: Some(name.clone().unwrap_or_else(|| kb.name.clone())),
                description: request
                    .description
                    .clone()
                    .filter(|d| !d.is_empty())
                    .or_else(|| kb.description.clone()),
            };
            if let Err(e) = self.vector_store.update(vector_store_id, params).await {
                warn!(vector_store_id = %vector_store_id, error = %e, "更新向量库失败");
            }
        }

        let updated = KnowledgeBaseRepository::update_details(self.db.as_ref(), kb, name, request.description).await?;
        self.detail(updated).await
    }

    /// 已就绪的知识库及其向量库 ID
    async fn trainable(&self, organization_id: Uuid) -> Result<(knowledge_base::Model, String), OrgDeskError> {
        let kb = self.require(organization_id).await?;
        let vector_store_id = kb
            .vector_store_id
            .clone()
            .ok_or_else(|| OrgDeskError::validation("vectorStoreId", "Vector store not initialized"))?;
        Ok((kb, vector_store_id))
    }

    /// 登记文件训练并在后台上传
    #[instrument(skip(self))]
    pub async fn train_file(
        &self,
        organization_id: Uuid,
        file_storage_id: Uuid,
    ) -> Result<training_file::Model, OrgDeskError> {
        let (kb, vector_store_id) = self.trainable(organization_id).await?;
        let file = self.storage.find_record(file_storage_id).await?;

        if TrainingRepository::find_file(self.db.as_ref(), kb.id, file_storage_id)
            .await?
            .is_some()
        {
            return Err(OrgDeskError::validation("fileStorageId", "File is already being trained"));
        }

        let training = TrainingRepository::create_file(self.db.as_ref(), kb.id, file_storage_id).await?;

        let service = self.clone();
        let training_id = training.id;
        tokio::spawn(async move {
            service
                .run_file_training(training_id, vector_store_id, file)
                .await;
        });

        Ok(training)
    }

    /// 后台文件训练：读取对象、上传向量库并记录结果
    #[instrument(skip(self, file), fields(file_id = %file.id))]
    pub async fn run_file_training(
        &self,
        training_id: Uuid,
        vector_store_id: String,
        file: file_storage::Model,
    ) {
        let outcome = async {
            let bytes = self.storage.read_object(&file.file_path).await?;
            self.vector_store
                .upload_file(&vector_store_id, bytes, &file.file_name)
                .await
        }
        .await;

        let (status, message) = settle(outcome, "Failed to upload file");
        if let Err(e) = TrainingRepository::finish_file(self.db.as_ref(), training_id, status, message).await {
            error!(training_id = %training_id, error = %e, "写入文件训练结果失败");
        }
    }

    /// 登记网站训练并在后台抓取上传
    #[instrument(skip(self))]
    pub async fn train_website(
        &self,
        organization_id: Uuid,
        url: &str,
    ) -> Result<training_website::Model, OrgDeskError> {
        let url = url.trim();
        if url::Url::parse(url).is_err() {
            return Err(OrgDeskError::validation("url", "Invalid URL"));
        }

        let (kb, vector_store_id) = self.trainable(organization_id).await?;

        if TrainingRepository::find_website(self.db.as_ref(), kb.id, url)
            .await?
            .is_some()
        {
            return Err(OrgDeskError::validation("url", "URL is already being trained"));
        }

        let training = TrainingRepository::create_website(self.db.as_ref(), kb.id, url).await?;

        let service = self.clone();
        let training_id = training.id;
        let url = url.to_string();
        tokio::spawn(async move {
            service
                .run_website_training(training_id, vector_store_id, url)
                .await;
        });

        Ok(training)
    }

    #[instrument(skip(self))]
    pub async fn run_website_training(&self, training_id: Uuid, vector_store_id: String, url: String) {
        let outcome = self.vector_store.upload_url(&vector_store_id, &url).await;

        let (status, message) = settle(outcome, "Failed to upload website");
        if let Err(e) = TrainingRepository::finish_website(self.db.as_ref(), training_id, status, message).await {
            error!(training_id = %training_id, error = %e, "写入网站训练结果失败");
        }
    }

    /// 清空向量库文件与训练记录，知识库恢复为 READY
    #[instrument(skip(self))]
    pub async fn reset(&self, organization_id: Uuid) -> Result<(), OrgDeskError> {
        let kb = self.require(organization_id).await?;

        if let Some(vector_store_id) = kb.vector_store_id.as_deref() {
            match self.vector_store.list_files(vector_store_id).await {
                Ok(files) => {
                    for file in files {
                        if let Err(e) = self.vector_store.remove_file(vector_store_id, &file.id).await {
                            warn!(file_id = %file.id, error = %e, "移除向量库文件失败");
                        }
                    }
                }
                Err(e) => warn!(vector_store_id = %vector_store_id, error = %e, "列出向量库文件失败"),
            }
        }

        TrainingRepository::clear(self.db.as_ref(), kb.id).await?;
        let vector_store_id = kb.vector_store_id.clone();
        KnowledgeBaseRepository::set_vector_store(self.db.as_ref(), kb, vector_store_id, KnowledgeBaseStatus::Ready)
            .await?;

        info!(organization_id = %organization_id, "知识库已重置");
        Ok(())
    }
}

/// 训练结果转为最终状态与错误消息
fn settle<T>(outcome: Result<T, OrgDeskError>, fallback: &str) -> (TrainingStatus, Option<String>) {
    match outcome {
        Ok(_) => (TrainingStatus::Completed, None),
        Err(e) => {
            error!(error = %e, "训练任务失败");
            let message = e.message();
            let message = if message.is_empty() {
                fallback.to_string()
            } else {
                message
            };
            (TrainingStatus::Failed, Some(message))
        }
    }
}

#[cfg(test)]
mod tests;
