// 实体预导入模块
// 提供便捷的实体导入

pub use super::agent::{ActiveModel as AgentActiveModel, Entity as Agent, Model as AgentModel};
pub use super::file_storage::{
    ActiveModel as FileStorageActiveModel, Entity as FileStorage, Model as FileStorageModel,
};
pub use super::knowledge_base::{
    ActiveModel as KnowledgeBaseActiveModel, Entity as KnowledgeBase, KnowledgeBaseStatus,
    Model as KnowledgeBaseModel,
};
pub use super::organization::{
    ActiveModel as OrganizationActiveModel, Entity as Organization, Model as OrganizationModel,
};
pub use super::organization_access::{
    ActiveModel as OrganizationAccessActiveModel, Entity as OrganizationAccess, LegacyRole,
    Model as OrganizationAccessModel,
};
pub use super::permission::{
    ActiveModel as PermissionActiveModel, Entity as Permission, Model as PermissionModel,
};
pub use super::role::{ActiveModel as RoleActiveModel, Entity as Role, Model as RoleModel};
pub use super::role_permission::{
    ActiveModel as RolePermissionActiveModel, Entity as RolePermission,
    Model as RolePermissionModel,
};
pub use super::training_file::{
    ActiveModel as TrainingFileActiveModel, Entity as TrainingFile, Model as TrainingFileModel,
    TrainingStatus,
};
pub use super::training_website::{
    ActiveModel as TrainingWebsiteActiveModel, Entity as TrainingWebsite,
    Model as TrainingWebsiteModel,
};
pub use super::user::{ActiveModel as UserActiveModel, Entity as User, Model as UserModel};
