// 数据库模块
// 包含数据库连接、实体定义和操作

pub mod cli;
pub mod connection;
pub mod entities;
pub mod migrations;
pub mod repositories;

#[cfg(test)]
mod tests;

pub use connection::*;
pub use migrations::*;
pub use repositories::*;
