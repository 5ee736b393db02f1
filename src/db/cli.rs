// 数据库管理 CLI 工具
// 提供迁移与种子数据命令行功能

use crate::config::AppConfig;
use crate::db::connection::DatabaseManager;
use crate::db::migrations::{get_system_user, MigrationManager, SeedDataManager};
use crate::errors::OrgDeskError;
use sea_orm::DatabaseConnection;
use std::sync::Arc;
use tracing::info;

/// CLI 命令
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CliCommand {
    Migration(MigrationCommand),
    Seed(SeedCommand),
}

/// 迁移命令
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MigrationCommand {
    /// 初始化迁移记录表
    Init,
    Status,
    /// 应用待处理的迁移
    Migrate,
    Rollback { version: String },
    /// 校验表与校验和
    Validate,
}

/// 种子数据命令
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SeedCommand {
    Init,
    Clean,
    Reseed,
    /// 确保系统用户存在
    SystemUser,
}

/// CLI 执行器
pub struct CliExecutor {
    db: Arc<DatabaseConnection>,
    config: AppConfig,
}

impl CliExecutor {
    pub async fn new(config: AppConfig) -> Result<Self, OrgDeskError> {
        let manager = DatabaseManager::connect(config.database.clone()).await?;
        let db = manager.get_connection();

        Ok(Self { db, config })
    }

    pub async fn execute(&self, command: CliCommand) -> Result<(), OrgDeskError> {
        match command {
            CliCommand::Migration(cmd) => self.execute_migration_command(cmd).await,
            CliCommand::Seed(cmd) => self.execute_seed_command(cmd).await,
        }
    }

    async fn execute_migration_command(&self, command: MigrationCommand) -> Result<(), OrgDeskError> {
        let manager = MigrationManager::new(self.db.clone());

        match command {
            MigrationCommand::Init => {
                manager.init().await?;
                println!("✅ 迁移系统初始化完成");
            }
            MigrationCommand::Status => {
                manager.init().await?;
                let status = manager.check_status().await?;

                println!("📊 迁移状态:");
                println!("{:<20} {:<40} {:<12} {:<20}", "版本", "名称", "状态", "应用时间");
                println!("{}", "-".repeat(92));

                for migration in status {
                    let status_str = if migration.is_applied { "✅ 已应用" } else { "⏳ 待应用" };
                    let applied_at = migration
                        .applied_at
                        .map(|dt| dt.format("%Y-%m-%d %H:%M:%S").to_string())
                        .unwrap_or_else(|| "-".to_string());

                    println!(
                        "{:<20} {:<40} {:<12} {:<20}",
                        migration.version, migration.name, status_str, applied_at
                    );
                }
            }
            MigrationCommand::Migrate => {
                manager.init().await?;
                let applied = manager.migrate().await?;

                if applied.is_empty() {
                    println!("✅ 没有待应用的迁移");
                } else {
                    println!("✅ 成功应用 {} 个迁移:", applied.len());
                    for version in applied {
                        println!("  - {}", version);
                    }
                }
            }
            MigrationCommand::Rollback { version } => {
                info!("回滚迁移: {}", version);
                manager.rollback(&version).await?;
                println!("✅ 迁移 {} 回滚完成", version);
            }
            MigrationCommand::Validate => {
                let validation = manager.validate_schema().await?;

                if validation.is_valid {
                    println!("✅ 数据库架构验证通过");
                } else {
                    println!("❌ 数据库架构验证失败:");
                    for table in validation.missing_tables {
                        println!("  缺失的表: {}", table);
                    }
                    for error in validation.errors {
                        println!("  错误: {}", error);
                    }
                }
            }
        }

        Ok(())
    }

    async fn execute_seed_command(&self, command: SeedCommand) -> Result<(), OrgDeskError> {
        let manager = SeedDataManager::new(self.db.clone(), self.config.security.bcrypt_cost);

        match command {
            SeedCommand::Init => {
                manager.seed_all().await?;
                println!("✅ 种子数据初始化完成");
            }
            SeedCommand::Clean => {
                manager.clean_seed_data().await?;
                println!("✅ 种子数据清理完成");
            }
            SeedCommand::Reseed => {
                manager.reseed().await?;
                println!("✅ 种子数据重新初始化完成");
            }
            SeedCommand::SystemUser => {
                let user = get_system_user(self.db.as_ref()).await?;
                println!("✅ 系统用户: {} ({})", user.email, user.id);
            }
        }

        Ok(())
    }
}

/// 解析命令行参数，`args[0]` 为程序名
pub fn parse_args(args: &[String]) -> Result<CliCommand, OrgDeskError> {
    let command = args
        .get(1)
        .ok_or_else(|| OrgDeskError::validation("args", "请提供命令"))?;
    let subcommand = args.get(2).map(String::as_str);

    match command.as_str() {
        "migration" | "migrate" => {
            let cmd = match subcommand {
                Some("init") => MigrationCommand::Init,
                Some("status") => MigrationCommand::Status,
                Some("migrate") | Some("up") => MigrationCommand::Migrate,
                Some("rollback") | Some("down") => {
                    let version = args
                        .get(3)
                        .ok_or_else(|| OrgDeskError::validation("version", "请提供要回滚的版本"))?;
                    MigrationCommand::Rollback { version: version.clone() }
                }
                Some("validate") => MigrationCommand::Validate,
                Some(_) => return Err(OrgDeskError::validation("migration", "未知的迁移子命令")),
                None => return Err(OrgDeskError::validation("migration", "请提供迁移子命令")),
            };
            Ok(CliCommand::Migration(cmd))
        }
        "seed" => {
            let cmd = match subcommand {
                Some("init") => SeedCommand::Init,
                Some("clean") => SeedCommand::Clean,
                Some("reseed") => SeedCommand::Reseed,
                Some("system-user") => SeedCommand::SystemUser,
                Some(_) => return Err(OrgDeskError::validation("seed", "未知的种子数据子命令")),
                None => return Err(OrgDeskError::validation("seed", "请提供种子数据子命令")),
            };
            Ok(CliCommand::Seed(cmd))
        }
        _ => Err(OrgDeskError::validation("args", "未知的命令")),
    }
}

pub fn print_help() {
    println!("OrgDesk 数据库管理工具");
    println!();
    println!("用法:");
    println!("  orgdesk-db <命令> <子命令> [选项]");
    println!();
    println!("迁移命令:");
    println!("  migration init                初始化迁移系统");
    println!("  migration status              检查迁移状态");
    println!("  migration migrate             应用待处理的迁移");
    println!("  migration rollback <version>  回滚指定版本的迁移");
    println!("  migration validate            验证数据库架构");
    println!();
    println!("种子数据命令:");
    println!("  seed init                     初始化种子数据");
    println!("  seed clean                    清理种子数据");
    println!("  seed reseed                   重新初始化种子数据");
    println!("  seed system-user              确保系统用户存在");
}
