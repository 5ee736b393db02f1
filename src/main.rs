use std::time::Duration;

use actix_cors::Cors;
use actix_web::{http::header, web, App, HttpServer};

use orgdesk::api::{configure_routes, AppState};
use orgdesk::config::{ConfigLoader, SecurityConfig};
use orgdesk::db::{DatabaseManager, MigrationManager};
use orgdesk::errors::ErrorHandlerMiddleware;
use orgdesk::health::configure_health_routes;
use orgdesk::logging::LoggingSetup;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // 初始化配置
    let config = ConfigLoader::init().map_err(|e| std::io::Error::other(e.to_string()))?;

    // 初始化结构化日志系统，文件日志的 guard 需持有到进程退出
    let _log_guard = LoggingSetup::init(&config.logging).map_err(|e| std::io::Error::other(e.to_string()))?;

    tracing::info!("🚀 启动 OrgDesk v{}", config.environment.version);

    // 初始化数据库连接
    let database = DatabaseManager::connect(config.database.clone())
        .await
        .map_err(|e| std::io::Error::other(e.to_string()))?;
    database
        .health_check()
        .await
        .map_err(|e| std::io::Error::other(e.to_string()))?;
    let db = database.get_connection();

    // 检查并应用待处理的迁移
    let migration_manager = MigrationManager::new(db.clone());
    migration_manager
        .init()
        .await
        .map_err(|e| std::io::Error::other(e.to_string()))?;
    match migration_manager.migrate().await {
        Ok(applied) if !applied.is_empty() => {
            tracing::info!("应用了 {} 个数据库迁移", applied.len());
        }
        Ok(_) => {}
        Err(e) => {
            tracing::warn!("数据库迁移检查失败: {}", e);
        }
    }

    ConfigLoader::print_summary(config);

    let state = AppState::new(db, config.clone()).map_err(|e| std::io::Error::other(e.to_string()))?;
    let state = web::Data::new(state);
    let security = config.security.clone();

    tracing::info!("🌐 服务器启动地址: http://{}:{}", config.server.host, config.server.port);
    tracing::info!("📋 接口文档: http://{}:{}/api/docs/", config.server.host, config.server.port);

    let mut server = HttpServer::new(move || {
        App::new()
            .wrap(cors(&security))
            .wrap(ErrorHandlerMiddleware)
            .wrap(tracing_actix_web::TracingLogger::default())
            .app_data(state.clone())
            .configure(configure_health_routes)
            .configure(configure_routes)
    })
    .keep_alive(Duration::from_secs(config.server.keep_alive));

    if let Some(workers) = config.server.workers {
        server = server.workers(workers);
    }

    server
        .bind((config.server.host.clone(), config.server.port))?
        .run()
        .await
}

/// 会话依赖 Cookie，跨域请求需携带凭据
fn cors(security: &SecurityConfig) -> Cors {
    let cors = Cors::default()
        .allowed_methods(vec!["GET", "POST", "PUT", "PATCH", "DELETE", "OPTIONS"])
        .allowed_headers(vec![header::CONTENT_TYPE, header::ACCEPT, header::AUTHORIZATION])
        .allowed_header("X-Organization-Id")
        .supports_credentials()
        .max_age(3600);

    security
        .cors_origins
        .iter()
        .fold(cors, |cors, origin| cors.allowed_origin(origin))
}
