// 错误响应格式化

use crate::errors::OrgDeskError;
use actix_web::HttpResponse;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// 错误响应结构
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: ErrorDetail,
    pub timestamp: DateTime<Utc>,
    #[serde(skip)]
    status: u16,
}

/// 错误详情
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
    pub details: Option<serde_json::Value>,
}

impl ErrorResponse {
    /// 从 OrgDeskError 创建错误响应
    pub fn from_error(error: &OrgDeskError) -> Self {
        let details = match error {
            OrgDeskError::Validation { field, .. } => Some(serde_json::json!({ "field": field })),
            OrgDeskError::FileProcessing {
                file_name: Some(file_name),
                ..
            } => Some(serde_json::json!({ "file_name": file_name })),
            OrgDeskError::VectorStore {
                status: Some(status),
                ..
            } => Some(serde_json::json!({ "upstream_status": status })),
            OrgDeskError::ExternalService { service, .. } => {
                Some(serde_json::json!({ "service": service }))
            }
            OrgDeskError::Timeout { operation } => {
                Some(serde_json::json!({ "operation": operation }))
            }
            _ => None,
        };

        // 服务端错误不向客户端暴露内部细节
        let message = match error {
            OrgDeskError::Database { .. } | OrgDeskError::Configuration { .. } => {
                "Internal server error".to_string()
            }
            _ => error.message(),
        };

        Self {
            success: false,
            error: ErrorDetail {
                code: error.error_code().to_string(),
                message,
                details,
            },
            timestamp: Utc::now(),
            status: error.status_code(),
        }
    }

    /// HTTP 状态码
    pub fn status(&self) -> u16 {
        self.status
    }

    /// 转换为 HTTP 响应
    pub fn into_http_response(self) -> HttpResponse {
        HttpResponse::build(
            actix_web::http::StatusCode::from_u16(self.status)
                .unwrap_or(actix_web::http::StatusCode::INTERNAL_SERVER_ERROR),
        )
        .json(self)
    }
}
