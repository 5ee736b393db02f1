// API 模块
// 路由、处理器、提取器与响应封装

pub mod extractors;
pub mod handlers;
pub mod multipart;
pub mod responses;
pub mod routes;
pub mod state;

pub use extractors::{ListQueryExtractor, OrganizationExtractor, SessionExtractor};
pub use responses::{ApiResponse, HttpResponseBuilder, SuccessFlag};
pub use routes::{configure_routes, ApiDoc};
pub use state::AppState;
