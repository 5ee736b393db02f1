// API 响应封装
// 成功响应统一为 { success: true, data, ... }，错误响应由 errors 模块生成

use actix_web::{cookie::Cookie, HttpResponse, Result as ActixResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// 统一 API 响应结构
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub request_id: String,
    pub timestamp: DateTime<Utc>,
}

impl<T> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: None,
            request_id: generate_request_id(),
            timestamp: Utc::now(),
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }
}

impl ApiResponse<()> {
    /// 只有消息没有数据的响应
    pub fn message_only(message: impl Into<String>) -> Self {
        Self {
            success: true,
            data: None,
            message: Some(message.into()),
            request_id: generate_request_id(),
            timestamp: Utc::now(),
        }
    }
}

/// `{ "success": true }`
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SuccessFlag {
    pub success: bool,
}

impl SuccessFlag {
    pub fn yes() -> Self {
        Self { success: true }
    }
}

/// HTTP 响应构建器
pub struct HttpResponseBuilder;

impl HttpResponseBuilder {
    /// 200 OK
    pub fn ok<T: Serialize>(data: T) -> ActixResult<HttpResponse> {
        Ok(HttpResponse::Ok().json(ApiResponse::ok(data)))
    }

    /// 201 Created
    pub fn created<T: Serialize>(data: T) -> ActixResult<HttpResponse> {
        Ok(HttpResponse::Created().json(ApiResponse::ok(data)))
    }

    /// 200 OK，只带消息
    pub fn message(message: impl Into<String>) -> ActixResult<HttpResponse> {
        Ok(HttpResponse::Ok().json(ApiResponse::message_only(message)))
    }

    /// 200 OK 并写入 Cookie
    pub fn ok_with_cookie<T: Serialize>(data: T, cookie: Cookie<'static>) -> ActixResult<HttpResponse> {
        Ok(HttpResponse::Ok().cookie(cookie).json(ApiResponse::ok(data)))
    }

    /// 201 Created 并写入 Cookie
    pub fn created_with_cookie<T: Serialize>(data: T, cookie: Cookie<'static>) -> ActixResult<HttpResponse> {
        Ok(HttpResponse::Created().cookie(cookie).json(ApiResponse::ok(data)))
    }
}

fn generate_request_id() -> String {
    Uuid::new_v4().to_string()
}
