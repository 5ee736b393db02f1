// 数据库仓储模块
// 提供数据访问层的抽象

// 组织与成员
pub mod organization;
pub mod organization_access;
pub mod user;

// 角色权限
pub mod role;

// 文件与知识库
pub mod file_storage;
pub mod knowledge_base;
pub mod training;

pub mod agent;

pub use organization::OrganizationRepository;
pub use organization_access::OrganizationAccessRepository;
pub use user::UserRepository;

pub use role::{PermissionInput, RoleRepository};

pub use file_storage::{FileStorageRepository, NewFileRecord};
pub use knowledge_base::KnowledgeBaseRepository;
pub use training::TrainingRepository;

pub use agent::{AgentChanges, AgentRepository, NewAgent};
