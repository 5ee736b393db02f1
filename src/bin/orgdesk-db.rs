// OrgDesk 数据库管理 CLI 工具

use orgdesk::config::AppConfig;
use orgdesk::logging::LoggingSetup;
use orgdesk::db::cli::{parse_args, print_help, CliExecutor};
use std::env;
use tracing::{error, info};

#[tokio::main]
async fn main() {
    let args: Vec<String> = env::args().collect();

    if args.len() < 2 || args.iter().any(|a| a == "--help" || a == "-h") {
        print_help();
        return;
    }

    let _ = dotenvy::dotenv();
    let config = match AppConfig::load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("加载配置失败: {}", e);
            std::process::exit(1);
        }
    };

    let _guard = match LoggingSetup::init(&LoggingSetup::cli_config(&config.logging)) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("初始化日志失败: {}", e);
            std::process::exit(1);
        }
    };

    let command = match parse_args(&args) {
        Ok(command) => command,
        Err(e) => {
            error!("解析命令失败: {}", e);
            print_help();
            std::process::exit(1);
        }
    };

    let executor = match CliExecutor::new(config).await {
        Ok(executor) => executor,
        Err(e) => {
            error!("初始化 CLI 执行器失败: {}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = executor.execute(command).await {
        error!("执行命令失败: {}", e);
        std::process::exit(1);
    }

    info!("命令执行完成");
}
