// 应用程序设置和配置
// 定义配置结构体和加载逻辑

use config::{Config, ConfigError, Environment, File};
use orgdesk_common::CommonError;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// 未配置时使用的 JWT 密钥，生产环境禁止使用
pub const DEFAULT_JWT_SECRET: &str = "default-secret-key-change-me";

/// 应用程序配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub security: SecurityConfig,
    pub storage: StorageConfig,
    pub vector_store: VectorStoreConfig,
    pub logging: LoggingConfig,
    pub environment: EnvironmentConfig,
}

/// 服务器配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub workers: Option<usize>,
    pub keep_alive: u64,
}

/// 数据库配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
    pub connect_timeout: u64,
    pub idle_timeout: u64,
    pub max_lifetime: u64,
}

/// 安全与会话配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityConfig {
    pub jwt_secret: String,
    pub session_ttl_days: i64,
    pub session_cookie: String,
    pub bcrypt_cost: u32,
    pub cors_origins: Vec<String>,
}

/// 对象存储配置（MinIO / S3 兼容）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    pub endpoint: String,
    pub port: u16,
    pub use_ssl: bool,
    pub access_key: String,
    pub secret_key: String,
    pub bucket: String,
    pub region: String,
    /// 公开文件的访问前缀，未设置时由 endpoint 和 port 拼接
    pub public_url: Option<String>,
    /// 应用对外地址，用于生成受保护文件的下载链接
    pub app_url: String,
    pub default_token_expiry_hours: i64,
    pub max_file_size: usize,
}

/// 向量库服务配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VectorStoreConfig {
    pub api_key: String,
    pub base_url: String,
    pub timeout: u64,
}

/// 日志配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String,
    pub file_enabled: bool,
    pub file_path: Option<String>,
}

/// 环境配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnvironmentConfig {
    pub name: String,
    pub debug: bool,
    pub version: String,
}

/// 兼容旧部署的环境变量及其对应的配置键
const LEGACY_ENV_KEYS: &[(&str, &str)] = &[
    ("DATABASE_URL", "database.url"),
    ("JWT_SECRET", "security.jwt_secret"),
    ("STORAGE_ENDPOINT", "storage.endpoint"),
    ("STORAGE_PORT", "storage.port"),
    ("STORAGE_USE_SSL", "storage.use_ssl"),
    ("STORAGE_ACCESS_KEY", "storage.access_key"),
    ("STORAGE_SECRET_KEY", "storage.secret_key"),
    ("STORAGE_BUCKET", "storage.bucket"),
    ("STORAGE_URL", "storage.public_url"),
    ("APP_URL", "storage.app_url"),
    ("OPENAI_API_KEY", "vector_store.api_key"),
    ("NODE_ENV", "environment.name"),
    ("APP_ENV", "environment.name"),
];

impl AppConfig {
    /// 从环境变量和配置文件加载配置
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = Config::builder();

        // 1. 默认配置
        config = config.add_source(Config::try_from(&AppConfig::default())?);

        // 2. 配置文件
        if Path::new("config.toml").exists() {
            config = config.add_source(File::with_name("config"));
        }

        // 3. ORGDESK__SECTION__KEY 形式的环境变量
        config = config.add_source(
            Environment::with_prefix("ORGDESK")
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        );

        // 4. 旧部署的环境变量优先级最高
        for (var, key) in LEGACY_ENV_KEYS {
            if let Ok(value) = std::env::var(var) {
                if !value.is_empty() {
                    config = config.set_override(*key, value)?;
                }
            }
        }

        let config = config.build()?;
        let mut app_config: AppConfig = config.try_deserialize()?;

        app_config.environment.version = env!("CARGO_PKG_VERSION").to_string();

        Ok(app_config)
    }

    /// 验证配置
    pub fn validate(&self) -> Result<(), CommonError> {
        use crate::config::ConfigValidator;

        match ConfigValidator::validate_all(self) {
            Ok(()) => Ok(()),
            Err(errors) => {
                let error_messages: Vec<String> = errors.iter().map(|e| e.to_string()).collect();
                Err(CommonError::configuration(format!(
                    "配置验证失败: {}",
                    error_messages.join("; ")
                )))
            }
        }
    }

    pub fn is_development(&self) -> bool {
        self.environment.name == "development"
    }

    pub fn is_production(&self) -> bool {
        self.environment.name == "production"
    }

    pub fn is_test(&self) -> bool {
        self.environment.name == "test"
    }
}

impl StorageConfig {
    /// 公开文件的访问前缀
    pub fn storage_url(&self) -> String {
        match &self.public_url {
            Some(url) if !url.is_empty() => url.trim_end_matches('/').to_string(),
            _ => {
                let scheme = if self.use_ssl { "https" } else { "http" };
                format!("{}://{}:{}", scheme, self.endpoint, self.port)
            }
        }
    }

    /// S3 客户端使用的 endpoint
    pub fn endpoint_url(&self) -> String {
        let scheme = if self.use_ssl { "https" } else { "http" };
        format!("{}://{}:{}", scheme, self.endpoint, self.port)
    }

    pub fn has_credentials(&self) -> bool {
        !self.access_key.is_empty() && !self.secret_key.is_empty()
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 8080,
                workers: None,
                keep_alive: 75,
            },
            database: DatabaseConfig {
                url: "postgresql://localhost/orgdesk".to_string(),
                max_connections: 10,
                min_connections: 1,
                connect_timeout: 30,
                idle_timeout: 600,
                max_lifetime: 1800,
            },
            security: SecurityConfig {
                jwt_secret: DEFAULT_JWT_SECRET.to_string(),
                session_ttl_days: 7,
                session_cookie: "session".to_string(),
                bcrypt_cost: 12,
                cors_origins: vec!["http://localhost:3000".to_string()],
            },
            storage: StorageConfig {
                endpoint: "localhost".to_string(),
                port: 9000,
                use_ssl: true,
                access_key: String::new(),
                secret_key: String::new(),
                bucket: "ims-files".to_string(),
                region: "us-east-1".to_string(),
                public_url: None,
                app_url: "http://localhost:3000".to_string(),
                default_token_expiry_hours: 24,
                max_file_size: 20 * 1024 * 1024, // 20MB
            },
            vector_store: VectorStoreConfig {
                api_key: String::new(),
                base_url: "https://api.openai.com/v1".to_string(),
                timeout: 60,
            },
            logging: LoggingConfig {
                level: "info".to_string(),
                format: "json".to_string(),
                file_enabled: false,
                file_path: None,
            },
            environment: EnvironmentConfig {
                name: "development".to_string(),
                debug: true,
                version: "0.1.0".to_string(),
            },
        }
    }
}
