// 服务层模块
// 包含所有业务逻辑服务

pub mod agent;
pub mod auth;
pub mod knowledge_base;
pub mod organization;
pub mod rbac;
pub mod role;
pub mod session;
pub mod storage;
pub mod team;
pub mod user;
pub mod vector_store;

pub use agent::AgentService;
pub use auth::AuthService;
pub use knowledge_base::KnowledgeBaseService;
pub use organization::OrganizationService;
pub use rbac::{PermissionAction, PermissionFlags, PermissionMap, PermissionService};
pub use role::RoleService;
pub use session::{SessionClaims, SessionManager};
pub use storage::{FileStorageService, IncomingFile, UploadFileOptions, UploadResult};
pub use team::TeamService;
pub use user::UserService;
pub use vector_store::{OpenAiVectorStoreClient, VectorStoreClient};
