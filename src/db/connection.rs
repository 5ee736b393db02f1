// 数据库连接管理
// 处理数据库连接池和连接配置

use crate::config::DatabaseConfig;
use crate::errors::OrgDeskError;
use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection, Statement};
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, instrument, warn};

/// 数据库连接管理器
pub struct DatabaseManager {
    connection: Arc<DatabaseConnection>,
    config: DatabaseConfig,
}

impl DatabaseManager {
    /// 建立连接池
    #[instrument(skip(config))]
    pub async fn connect(config: DatabaseConfig) -> Result<Self, OrgDeskError> {
        let mut opt = ConnectOptions::new(config.url.clone());

        opt.max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .connect_timeout(Duration::from_secs(config.connect_timeout))
            .idle_timeout(Duration::from_secs(config.idle_timeout))
            .max_lifetime(Duration::from_secs(config.max_lifetime))
            .sqlx_logging(true)
            .sqlx_logging_level(tracing::log::LevelFilter::Debug);

        info!(
            url = %Self::mask_password(&config.url),
            max_connections = config.max_connections,
            min_connections = config.min_connections,
            "连接数据库"
        );

        let connection = Database::connect(opt)
            .await
            .map_err(|e| OrgDeskError::database(format!("数据库连接失败: {}", e)))?;

        Ok(Self {
            connection: Arc::new(connection),
            config,
        })
    }

    /// 获取共享的数据库连接
    pub fn get_connection(&self) -> Arc<DatabaseConnection> {
        self.connection.clone()
    }

    pub fn get_config(&self) -> &DatabaseConfig {
        &self.config
    }

    /// 数据库健康检查
    #[instrument(skip(self))]
    pub async fn health_check(&self) -> Result<(), OrgDeskError> {
        ping(&self.connection).await
    }

    /// 查询数据库版本
    #[instrument(skip(self))]
    pub async fn check_version(&self) -> Result<String, OrgDeskError> {
        let row = self
            .connection
            .query_one(Statement::from_string(
                self.connection.get_database_backend(),
                "SELECT version()".to_string(),
            ))
            .await?
            .ok_or_else(|| OrgDeskError::database("无法获取数据库版本"))?;

        let version: String = row.try_get("", "version")?;
        info!(version = %version, "数据库版本");
        Ok(version)
    }

    /// 关闭数据库连接
    ///
    /// 连接仍被其他服务持有时只释放本地引用。
    #[instrument(skip(self))]
    pub async fn close(self) -> Result<(), OrgDeskError> {
        match Arc::try_unwrap(self.connection) {
            Ok(connection) => {
                info!("关闭数据库连接");
                connection
                    .close()
                    .await
                    .map_err(|e| OrgDeskError::database(format!("关闭数据库连接失败: {}", e)))
            }
            Err(_) => {
                warn!("数据库连接仍在使用，跳过关闭");
                Ok(())
            }
        }
    }

    /// 屏蔽密码信息用于日志记录
    pub fn mask_password(url: &str) -> String {
        match url::Url::parse(url) {
            Ok(mut parsed_url) => {
                if parsed_url.password().is_some() {
                    let _ = parsed_url.set_password(Some("***"));
                }
                parsed_url.to_string()
            }
            Err(_) => "***".to_string(),
        }
    }
}

/// 对任意连接执行 `SELECT 1`
pub async fn ping(db: &DatabaseConnection) -> Result<(), OrgDeskError> {
    let result = db
        .execute(Statement::from_string(
            db.get_database_backend(),
            "SELECT 1".to_string(),
        ))
        .await;

    match result {
        Ok(_) => Ok(()),
        Err(e) => {
            error!(error = %e, "数据库健康检查失败");
            Err(OrgDeskError::database(format!("数据库健康检查失败: {}", e)))
        }
    }
}
