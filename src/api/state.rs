// 应用共享状态

use std::sync::Arc;

use sea_orm::DatabaseConnection;

use crate::config::AppConfig;
use crate::errors::OrgDeskError;
use crate::services::{
    AgentService, AuthService, FileStorageService, KnowledgeBaseService, OpenAiVectorStoreClient,
    OrganizationService, PermissionService, RoleService, SessionManager, TeamService, UserService,
    VectorStoreClient,
};

/// 注入到每个处理器的共享状态
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<DatabaseConnection>,
    pub config: Arc<AppConfig>,
    pub sessions: SessionManager,
    pub storage: Arc<FileStorageService>,
    pub vector_store: Arc<dyn VectorStoreClient>,
}

impl AppState {
    /// 按配置创建对象存储与向量库客户端
    pub fn new(db: Arc<DatabaseConnection>, config: AppConfig) -> Result<Self, OrgDeskError> {
        let storage = Arc::new(FileStorageService::from_config(db.clone(), config.storage.clone())?);
        let vector_store: Arc<dyn VectorStoreClient> =
            Arc::new(OpenAiVectorStoreClient::new(&config.vector_store)?);
        Ok(Self::with_parts(db, config, storage, vector_store))
    }

    pub fn with_parts(
        db: Arc<DatabaseConnection>,
        config: AppConfig,
        storage: Arc<FileStorageService>,
        vector_store: Arc<dyn VectorStoreClient>,
    ) -> Self {
        Self {
            sessions: SessionManager::from_config(&config),
            config: Arc::new(config),
            db,
            storage,
            vector_store,
        }
    }

    pub fn auth(&self) -> AuthService {
        AuthService::new(self.db.clone(), self.sessions.clone())
    }

    pub fn users(&self) -> UserService {
        UserService::new(self.db.clone(), self.storage.clone(), self.sessions.clone())
    }

    pub fn permissions(&self) -> PermissionService {
        PermissionService::new(self.db.clone())
    }

    pub fn knowledge_bases(&self) -> KnowledgeBaseService {
        KnowledgeBaseService::new(self.db.clone(), self.storage.clone(), self.vector_store.clone())
    }

    pub fn organizations(&self) -> OrganizationService {
        OrganizationService::new(self.db.clone(), self.storage.clone(), self.knowledge_bases())
    }

    pub fn team(&self) -> TeamService {
        TeamService::new(self.db.clone(), self.sessions.clone())
    }

    pub fn agents(&self) -> AgentService {
        AgentService::new(self.db.clone())
    }

    pub fn roles(&self) -> RoleService {
        RoleService::new(self.db.clone())
    }
}
