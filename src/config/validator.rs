// 配置验证器
// 提供详细的配置验证逻辑

use crate::config::{AppConfig, DEFAULT_JWT_SECRET};
use orgdesk_common::CommonError;
use std::path::Path;
use url::Url;

/// 配置验证器
pub struct ConfigValidator;

impl ConfigValidator {
    /// 验证完整配置
    pub fn validate_all(config: &AppConfig) -> Result<(), Vec<CommonError>> {
        let results = [
            Self::validate_server(&config.server),
            Self::validate_database(&config.database),
            Self::validate_security(&config.security, config.is_production()),
            Self::validate_storage(&config.storage),
            Self::validate_vector_store(&config.vector_store),
            Self::validate_logging(&config.logging),
            Self::validate_environment(&config.environment),
        ];

        let errors: Vec<CommonError> = results.into_iter().filter_map(Result::err).collect();

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// 验证服务器配置
    pub fn validate_server(config: &crate::config::ServerConfig) -> Result<(), CommonError> {
        if config.port == 0 {
            return Err(CommonError::validation("服务器端口不能为 0"));
        }

        if config.host.is_empty() {
            return Err(CommonError::validation("服务器主机地址不能为空"));
        }

        if let Some(workers) = config.workers {
            if workers == 0 {
                return Err(CommonError::validation("工作线程数不能为 0"));
            }
            if workers > 64 {
                return Err(CommonError::validation("工作线程数不建议超过 64"));
            }
        }

        Ok(())
    }

    /// 验证数据库配置
    pub fn validate_database(config: &crate::config::DatabaseConfig) -> Result<(), CommonError> {
        if config.url.is_empty() {
            return Err(CommonError::validation("数据库 URL 不能为空"));
        }

        if Url::parse(&config.url).is_err() {
            return Err(CommonError::validation("数据库 URL 格式无效"));
        }

        if config.max_connections == 0 {
            return Err(CommonError::validation("数据库最大连接数不能为 0"));
        }

        if config.min_connections > config.max_connections {
            return Err(CommonError::validation("数据库最小连接数不能大于最大连接数"));
        }

        if config.connect_timeout == 0 {
            return Err(CommonError::validation("数据库连接超时不能为 0"));
        }

        Ok(())
    }

    /// 验证安全配置
    pub fn validate_security(
        config: &crate::config::SecurityConfig,
        production: bool,
    ) -> Result<(), CommonError> {
        if config.jwt_secret.is_empty() {
            return Err(CommonError::validation("JWT 密钥不能为空"));
        }

        if production && config.jwt_secret == DEFAULT_JWT_SECRET {
            return Err(CommonError::validation("生产环境必须设置 JWT_SECRET"));
        }

        if config.session_ttl_days <= 0 {
            return Err(CommonError::validation("会话有效期必须大于 0 天"));
        }

        if config.session_cookie.is_empty() {
            return Err(CommonError::validation("会话 Cookie 名称不能为空"));
        }

        if !(4..=31).contains(&config.bcrypt_cost) {
            return Err(CommonError::validation("bcrypt 成本参数必须在 4-31 之间"));
        }

        Ok(())
    }

    /// 验证存储配置
    ///
    /// 访问密钥在首次使用时才检查。
    pub fn validate_storage(config: &crate::config::StorageConfig) -> Result<(), CommonError> {
        if config.endpoint.is_empty() {
            return Err(CommonError::validation("存储服务地址不能为空"));
        }

        if config.bucket.is_empty() {
            return Err(CommonError::validation("存储桶名称不能为空"));
        }

        if Url::parse(&config.app_url).is_err() {
            return Err(CommonError::validation("应用地址 APP_URL 格式无效"));
        }

        if let Some(ref public_url) = config.public_url {
            if !public_url.is_empty() && Url::parse(public_url).is_err() {
                return Err(CommonError::validation("STORAGE_URL 格式无效"));
            }
        }

        if config.default_token_expiry_hours <= 0 {
            return Err(CommonError::validation("文件访问令牌有效期必须大于 0 小时"));
        }

        if config.max_file_size == 0 {
            return Err(CommonError::validation("最大文件大小不能为 0"));
        }

        Ok(())
    }

    /// 验证向量库配置
    pub fn validate_vector_store(
        config: &crate::config::VectorStoreConfig,
    ) -> Result<(), CommonError> {
        if Url::parse(&config.base_url).is_err() {
            return Err(CommonError::validation("向量库服务地址格式无效"));
        }

        if config.timeout == 0 {
            return Err(CommonError::validation("向量库请求超时不能为 0"));
        }

        Ok(())
    }

    /// 验证日志配置
    pub fn validate_logging(config: &crate::config::LoggingConfig) -> Result<(), CommonError> {
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&config.level.as_str()) {
            return Err(CommonError::validation(format!(
                "无效的日志级别: {}，有效值: {:?}",
                config.level, valid_levels
            )));
        }

        let valid_formats = ["json", "pretty", "compact"];
        if !valid_formats.contains(&config.format.as_str()) {
            return Err(CommonError::validation(format!(
                "无效的日志格式: {}，有效值: {:?}",
                config.format, valid_formats
            )));
        }

        if config.file_enabled {
            let Some(ref path) = config.file_path else {
                return Err(CommonError::validation("启用文件日志时必须指定日志文件路径"));
            };
            let log_dir = Path::new(path).parent().unwrap_or(Path::new("."));
            if !log_dir.as_os_str().is_empty() && !log_dir.exists() {
                std::fs::create_dir_all(log_dir).map_err(|e| {
                    CommonError::validation(format!("无法创建日志目录: {}", e))
                })?;
            }
        }

        Ok(())
    }

    /// 验证环境配置
    pub fn validate_environment(
        config: &crate::config::EnvironmentConfig,
    ) -> Result<(), CommonError> {
        let valid_environments = ["development", "staging", "production", "test"];
        if !valid_environments.contains(&config.name.as_str()) {
            return Err(CommonError::validation(format!(
                "无效的环境名称: {}，有效值: {:?}",
                config.name, valid_environments
            )));
        }

        if config.version.is_empty() {
            return Err(CommonError::validation("版本信息不能为空"));
        }

        Ok(())
    }
}
