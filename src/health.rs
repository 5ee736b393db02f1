// 健康检查端点

use std::time::Instant;

use actix_web::{web, HttpResponse, Result};
use serde::Serialize;
use utoipa::ToSchema;

use crate::api::state::AppState;
use crate::db::connection::ping;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Unhealthy,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: HealthStatus,
    pub service: String,
    pub version: String,
    #[schema(value_type = String)]
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

impl HealthResponse {
    fn new(status: HealthStatus) -> Self {
        Self {
            status,
            service: "orgdesk".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            timestamp: chrono::Utc::now(),
        }
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReadinessResponse {
    #[serde(flatten)]
    pub health: HealthResponse,
    pub database: HealthStatus,
    pub database_response_time_ms: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// 存活检查
#[utoipa::path(
    get,
    path = "/health",
    tag = "Health",
    responses((status = 200, description = "服务存活", body = HealthResponse))
)]
pub async fn health_check() -> Result<HttpResponse> {
    Ok(HttpResponse::Ok().json(HealthResponse::new(HealthStatus::Healthy)))
}

/// 就绪检查，包含数据库连通性
#[utoipa::path(
    get,
    path = "/health/ready",
    tag = "Health",
    responses(
        (status = 200, description = "服务就绪", body = ReadinessResponse),
        (status = 503, description = "数据库不可用", body = ReadinessResponse)
    )
)]
pub async fn readiness_check(state: web::Data<AppState>) -> Result<HttpResponse> {
    let started = Instant::now();
    let result = ping(&state.db).await;
    let elapsed = started.elapsed().as_millis() as u64;

    let (status, error) = match result {
        Ok(()) => (HealthStatus::Healthy, None),
        Err(e) => (HealthStatus::Unhealthy, Some(e.message())),
    };
    let body = ReadinessResponse {
        health: HealthResponse::new(status),
        database: status,
        database_response_time_ms: elapsed,
        error,
    };

    Ok(match status {
        HealthStatus::Healthy => HttpResponse::Ok().json(body),
        HealthStatus::Unhealthy => HttpResponse::ServiceUnavailable().json(body),
    })
}

/// 根路径
pub async fn index() -> Result<HttpResponse> {
    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": "OrgDesk API",
        "version": env!("CARGO_PKG_VERSION"),
        "docs": "/api/docs/"
    })))
}

pub fn configure_health_routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/", web::get().to(index))
        .route("/health", web::get().to(health_check))
        .route("/health/ready", web::get().to(readiness_check));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[actix_web::test]
    async fn test_health_check() {
        let resp = health_check().await.unwrap();
        assert_eq!(resp.status(), 200);
    }

    #[actix_web::test]
    async fn test_index() {
        let resp = index().await.unwrap();
        assert_eq!(resp.status(), 200);
    }

    #[test]
    fn test_health_serialization() {
        let json = serde_json::to_value(HealthResponse::new(HealthStatus::Healthy)).unwrap();
        assert_eq!(json["status"], "healthy");
        assert_eq!(json["service"], "orgdesk");
    }
}
