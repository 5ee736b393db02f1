// 数据库迁移模块
// 包含所有迁移脚本和管理功能

use crate::errors::OrgDeskError;
use sea_orm::{ConnectionTrait, DatabaseConnection, Statement, TransactionTrait, Value};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{info, instrument, warn};

pub mod migrations;
pub mod seed_data;

pub use migrations::*;
pub use seed_data::*;

/// 迁移信息
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Migration {
    pub version: String,
    pub name: String,
    pub description: String,
    pub up_sql: String,
    pub down_sql: String,
    pub dependencies: Vec<String>,
}

impl Migration {
    /// 迁移内容的 sha256 校验和
    pub fn checksum(&self) -> String {
        use sha2::{Digest, Sha256};
        let mut hasher = Sha256::new();
        hasher.update(self.up_sql.as_bytes());
        hasher.update(self.down_sql.as_bytes());
        format!("{:x}", hasher.finalize())
    }
}

/// 迁移状态
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MigrationStatus {
    pub version: String,
    pub name: String,
    pub applied_at: Option<chrono::DateTime<chrono::Utc>>,
    pub is_applied: bool,
    pub checksum: String,
}

/// 架构验证结果
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchemaValidation {
    pub is_valid: bool,
    pub missing_tables: Vec<String>,
    pub errors: Vec<String>,
}

/// 迁移管理器
pub struct MigrationManager {
    db: Arc<DatabaseConnection>,
}

impl MigrationManager {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// 初始化迁移记录表
    #[instrument(skip(self))]
    pub async fn init(&self) -> Result<(), OrgDeskError> {
        info!("初始化数据库迁移系统");

        let create_migrations_table = r#"
            CREATE TABLE IF NOT EXISTS schema_migrations (
                version VARCHAR(255) PRIMARY KEY,
                name VARCHAR(255) NOT NULL,
                description TEXT,
                checksum VARCHAR(64) NOT NULL,
                applied_at TIMESTAMP WITH TIME ZONE DEFAULT CURRENT_TIMESTAMP,
                execution_time_ms INTEGER DEFAULT 0
            );

            CREATE INDEX IF NOT EXISTS idx_schema_migrations_applied_at
            ON schema_migrations(applied_at);
        "#;

        execute_script(self.db.as_ref(), create_migrations_table).await?;

        info!("迁移系统初始化完成");
        Ok(())
    }

    /// 所有可用的迁移，按版本排序
    pub fn get_available_migrations(&self) -> Vec<Migration> {
        let mut all = migrations::get_all_migrations();
        all.sort_by(|a, b| a.version.cmp(&b.version));
        all
    }

    /// 已应用的迁移
    #[instrument(skip(self))]
    pub async fn get_applied_migrations(&self) -> Result<Vec<MigrationStatus>, OrgDeskError> {
        let query = r#"
            SELECT version, name, applied_at, checksum
            FROM schema_migrations
            ORDER BY applied_at
        "#;

        let rows = self
            .db
            .query_all(Statement::from_string(
                self.db.get_database_backend(),
                query.to_string(),
            ))
            .await?;

        rows.into_iter()
            .map(|row| -> Result<MigrationStatus, OrgDeskError> {
                let applied_at: chrono::DateTime<chrono::Utc> = row.try_get("", "applied_at")?;
                Ok(MigrationStatus {
                    version: row.try_get("", "version")?,
                    name: row.try_get("", "name")?,
                    applied_at: Some(applied_at),
                    is_applied: true,
                    checksum: row.try_get("", "checksum")?,
                })
            })
            .collect()
    }

    /// 检查迁移状态
    #[instrument(skip(self))]
    pub async fn check_status(&self) -> Result<Vec<MigrationStatus>, OrgDeskError> {
        let applied: HashMap<String, MigrationStatus> = self
            .get_applied_migrations()
            .await?
            .into_iter()
            .map(|m| (m.version.clone(), m))
            .collect();

        Ok(merge_status(self.get_available_migrations(), &applied))
    }

    /// 应用待处理的迁移
    #[instrument(skip(self))]
    pub async fn migrate(&self) -> Result<Vec<String>, OrgDeskError> {
        info!("开始应用数据库迁移");

        let pending: Vec<String> = self
            .check_status()
            .await?
            .into_iter()
            .filter(|s| !s.is_applied)
            .map(|s| s.version)
            .collect();

        let available = self.get_available_migrations();
        let mut applied_versions = Vec::new();

        for version in pending {
            let migration = available
                .iter()
                .find(|m| m.version == version)
                .ok_or_else(|| OrgDeskError::internal(format!("找不到迁移: {}", version)))?;

            self.apply_migration(migration).await?;
            applied_versions.push(version);
        }

        if applied_versions.is_empty() {
            info!("没有待处理的迁移");
        } else {
            info!(count = applied_versions.len(), "迁移应用完成");
        }

        Ok(applied_versions)
    }

    /// 在事务中应用单个迁移
    #[instrument(skip(self, migration), fields(version = %migration.version))]
    async fn apply_migration(&self, migration: &Migration) -> Result<(), OrgDeskError> {
        info!(name = %migration.name, "应用迁移");

        let start_time = std::time::Instant::now();
        let txn = self.db.begin().await?;

        if let Err(e) = execute_script(&txn, &migration.up_sql).await {
            txn.rollback().await?;
            return Err(OrgDeskError::database(format!(
                "迁移 {} 执行失败: {}",
                migration.version, e
            )));
        }

        let execution_time = start_time.elapsed().as_millis() as i32;
        let record = Statement::from_sql_and_values(
            txn.get_database_backend(),
            r#"INSERT INTO schema_migrations (version, name, description, checksum, execution_time_ms)
               VALUES ($1, $2, $3, $4, $5)"#,
            [
                Value::from(migration.version.clone()),
                Value::from(migration.name.clone()),
                Value::from(migration.description.clone()),
                Value::from(migration.checksum()),
                Value::from(execution_time),
            ],
        );

        if let Err(e) = txn.execute(record).await {
            txn.rollback().await?;
            return Err(OrgDeskError::database(format!(
                "记录迁移 {} 失败: {}",
                migration.version, e
            )));
        }

        txn.commit().await?;

        info!(execution_time_ms = execution_time, "迁移应用成功");
        Ok(())
    }

    /// 回滚指定版本的迁移
    #[instrument(skip(self))]
    pub async fn rollback(&self, version: &str) -> Result<(), OrgDeskError> {
        warn!(version = %version, "回滚数据库迁移");

        let migration = self
            .get_available_migrations()
            .into_iter()
            .find(|m| m.version == version)
            .ok_or_else(|| OrgDeskError::not_found(format!("迁移 {} 不存在", version)))?;

        let txn = self.db.begin().await?;

        if let Err(e) = execute_script(&txn, &migration.down_sql).await {
            txn.rollback().await?;
            return Err(OrgDeskError::database(format!(
                "迁移 {} 回滚失败: {}",
                version, e
            )));
        }

        let delete = Statement::from_sql_and_values(
            txn.get_database_backend(),
            "DELETE FROM schema_migrations WHERE version = $1",
            [Value::from(version.to_string())],
        );
        txn.execute(delete).await?;
        txn.commit().await?;

        info!(version = %version, "迁移回滚完成");
        Ok(())
    }

    /// 验证必需的表是否存在
    #[instrument(skip(self))]
    pub async fn validate_schema(&self) -> Result<SchemaValidation, OrgDeskError> {
        let mut validation = SchemaValidation {
            is_valid: true,
            missing_tables: Vec::new(),
            errors: Vec::new(),
        };

        for table_name in REQUIRED_TABLES {
            if !self.table_exists(table_name).await? {
                validation.missing_tables.push(table_name.to_string());
                validation.is_valid = false;
            }
        }

        let status = self.check_status().await?;
        let available: HashMap<String, String> = self
            .get_available_migrations()
            .into_iter()
            .map(|m| (m.version.clone(), m.checksum()))
            .collect();
        for applied in status.iter().filter(|s| s.is_applied) {
            if available.get(&applied.version) != Some(&applied.checksum) {
                validation
                    .errors
                    .push(format!("迁移 {} 的校验和不匹配", applied.version));
                validation.is_valid = false;
            }
        }

        if validation.is_valid {
            info!("数据库架构验证通过");
        } else {
            warn!("数据库架构验证失败: {:?}", validation);
        }

        Ok(validation)
    }

    async fn table_exists(&self, table_name: &str) -> Result<bool, OrgDeskError> {
        let result = self
            .db
            .query_one(Statement::from_sql_and_values(
                self.db.get_database_backend(),
                "SELECT EXISTS (SELECT FROM information_schema.tables WHERE table_name = $1) AS exists",
                [Value::from(table_name.to_string())],
            ))
            .await?;

        Ok(result
            .and_then(|row| row.try_get::<bool>("", "exists").ok())
            .unwrap_or(false))
    }
}

/// 业务表清单
pub const REQUIRED_TABLES: [&str; 11] = [
    "organizations",
    "users",
    "roles",
    "permissions",
    "role_permissions",
    "organization_access",
    "file_storage",
    "knowledge_bases",
    "training_files",
    "training_websites",
    "agents",
];

/// 合并可用迁移与已应用记录
fn merge_status(
    available: Vec<Migration>,
    applied: &HashMap<String, MigrationStatus>,
) -> Vec<MigrationStatus> {
    available
        .into_iter()
        .map(|migration| {
            let checksum = migration.checksum();
            match applied.get(&migration.version) {
                Some(existing) => {
                    if existing.checksum != checksum {
                        warn!(version = %migration.version, "迁移校验和不匹配，可能已被修改");
                    }
                    existing.clone()
                }
                None => MigrationStatus {
                    version: migration.version,
                    name: migration.name,
                    applied_at: None,
                    is_applied: false,
                    checksum,
                },
            }
        })
        .collect()
}

/// 按分号拆分并逐条执行 SQL 脚本
pub fn split_statements(sql: &str) -> Vec<String> {
    sql.split(';')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

async fn execute_script<C: ConnectionTrait>(conn: &C, sql: &str) -> Result<(), OrgDeskError> {
    for statement in split_statements(sql) {
        conn.execute(Statement::from_string(conn.get_database_backend(), statement))
            .await?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_migrations_are_ordered_and_unique() {
        let all = migrations::get_all_migrations();
        let mut versions: Vec<&str> = all.iter().map(|m| m.version.as_str()).collect();
        let original = versions.clone();
        versions.sort();
        versions.dedup();
        assert_eq!(versions, original);
    }

    #[test]
    fn test_dependencies_exist() {
        let all = migrations::get_all_migrations();
        for migration in &all {
            for dep in &migration.dependencies {
                let position = all.iter().position(|m| &m.version == dep);
                let own = all.iter().position(|m| m.version == migration.version);
                assert!(position.is_some(), "缺少依赖 {}", dep);
                assert!(position < own, "依赖 {} 必须先于 {}", dep, migration.version);
            }
        }
    }

    #[test]
    fn test_every_required_table_is_created() {
        let up: String = migrations::get_all_migrations()
            .iter()
            .map(|m| m.up_sql.clone())
            .collect();
        for table in REQUIRED_TABLES {
            assert!(
                up.contains(&format!("CREATE TABLE {} (", table)),
                "缺少建表语句: {}",
                table
            );
        }
    }

    #[test]
    fn test_training_targets_are_unique_per_knowledge_base() {
        let up: String = migrations::get_all_migrations()
            .iter()
            .map(|m| m.up_sql.clone())
            .collect();
        assert!(up.contains("UNIQUE (knowledge_base_id, file_storage_id)"));
        assert!(up.contains("UNIQUE (knowledge_base_id, url)"));
    }

    #[test]
    fn test_split_statements() {
        let statements = split_statements("CREATE TABLE a (id INT);\n\n  ; DROP TABLE b;");
        assert_eq!(statements, vec!["CREATE TABLE a (id INT)", "DROP TABLE b"]);
    }

    #[test]
    fn test_merge_status_marks_pending() {
        let available = migrations::get_all_migrations();
        let first = available[0].clone();
        let mut applied = HashMap::new();
        applied.insert(
            first.version.clone(),
            MigrationStatus {
                version: first.version.clone(),
                name: first.name.clone(),
                applied_at: Some(chrono::Utc::now()),
                is_applied: true,
                checksum: first.checksum(),
            },
        );

        let status = merge_status(available.clone(), &applied);
        assert_eq!(status.len(), available.len());
        assert!(status[0].is_applied);
        assert!(status[1..].iter().all(|s| !s.is_applied));
    }
}
