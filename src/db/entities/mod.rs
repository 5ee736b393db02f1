// 数据库实体模块
// 包含所有 SeaORM 实体定义

// 组织与成员
pub mod organization;
pub mod user;
pub mod organization_access;

// 角色权限
pub mod role;
pub mod permission;
pub mod role_permission;

// 文件与知识库
pub mod file_storage;
pub mod knowledge_base;
pub mod training_file;
pub mod training_website;

pub mod agent;

pub mod prelude;
pub use prelude::*;
