// OrgDesk 核心库
// 服务端二进制与数据库管理工具共用

pub mod api;
pub mod config;
pub mod db;
pub mod errors;
pub mod health;
pub mod logging;
pub mod services;
