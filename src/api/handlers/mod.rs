// API 处理器模块
// 每个子模块对应一组资源路由

pub mod agent;
pub mod auth;
pub mod files;
pub mod knowledge_base;
pub mod organization;
pub mod role;
pub mod team;
pub mod user;

pub use agent::configure_agent_routes;
pub use auth::configure_auth_routes;
pub use files::configure_file_routes;
pub use knowledge_base::configure_knowledge_base_routes;
pub use organization::configure_organization_routes;
pub use role::configure_role_routes;
pub use team::configure_team_routes;
pub use user::configure_user_routes;
