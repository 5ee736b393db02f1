// 配置加载器
// 处理配置文件加载和环境变量解析

use crate::config::AppConfig;
use config::ConfigError;
use dotenvy::dotenv;
use orgdesk_common::CommonError;
use std::sync::OnceLock;
use tracing::{info, warn};

/// 全局配置实例
static CONFIG: OnceLock<AppConfig> = OnceLock::new();

/// 配置加载器
pub struct ConfigLoader;

impl ConfigLoader {
    /// 初始化配置
    pub fn init() -> Result<&'static AppConfig, CommonError> {
        if let Err(e) = dotenv() {
            warn!("无法加载 .env 文件: {}", e);
        }

        let config = AppConfig::load().map_err(convert_config_error)?;
        config.validate()?;

        if config.security.jwt_secret == crate::config::DEFAULT_JWT_SECRET {
            warn!("JWT_SECRET 未设置，正在使用默认密钥");
        }

        let config = CONFIG.get_or_init(|| config);

        info!("配置加载成功");
        info!("环境: {}", config.environment.name);
        info!("版本: {}", config.environment.version);
        info!("服务器: {}:{}", config.server.host, config.server.port);

        Ok(config)
    }

    /// 获取配置
    pub fn get() -> Result<&'static AppConfig, CommonError> {
        CONFIG
            .get()
            .ok_or_else(|| CommonError::internal("配置未初始化，请先调用 ConfigLoader::init()"))
    }

    /// 打印配置摘要
    pub fn print_summary(config: &AppConfig) {
        println!("=== OrgDesk 配置摘要 ===");
        println!("环境: {}", config.environment.name);
        println!("版本: {}", config.environment.version);
        println!("调试模式: {}", config.environment.debug);
        println!("服务器: {}:{}", config.server.host, config.server.port);
        println!("工作线程: {:?}", config.server.workers);
        println!(
            "数据库连接池: {}-{}",
            config.database.min_connections, config.database.max_connections
        );
        println!("对象存储: {} (桶: {})", config.storage.endpoint_url(), config.storage.bucket);
        println!("应用地址: {}", config.storage.app_url);
        println!("向量库服务: {}", config.vector_store.base_url);
        println!("日志级别: {}", config.logging.level);
        println!("========================");
    }
}

/// 配置错误转换辅助函数
pub fn convert_config_error(err: ConfigError) -> CommonError {
    CommonError::configuration(format!("配置错误: {}", err))
}
