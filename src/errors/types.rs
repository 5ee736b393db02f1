// 统一错误类型定义

use actix_web::{HttpResponse, ResponseError};
use orgdesk_common::CommonError;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::error;

/// OrgDesk 统一错误类型
#[derive(Debug, Error, Serialize, Deserialize)]
#[serde(tag = "error_type", content = "details")]
pub enum OrgDeskError {
    /// 配置错误
    #[error("配置错误: {message}")]
    Configuration { message: String },

    /// 数据库错误
    #[error("数据库错误: {message}")]
    Database { message: String },

    /// 认证错误
    #[error("认证错误: {message}")]
    Authentication { message: String },

    /// 授权错误
    #[error("授权错误: {message}")]
    Authorization { message: String },

    /// 验证错误
    #[error("验证错误: {field} - {message}")]
    Validation { field: String, message: String },

    /// 组织上下文错误
    #[error("组织错误: {message}")]
    Organization { message: String },

    /// 资源未找到
    #[error("资源未找到: {message}")]
    NotFound { message: String },

    /// 资源冲突
    #[error("资源冲突: {message}")]
    Conflict { message: String },

    /// 文件处理错误
    #[error("文件处理错误: {message}")]
    FileProcessing {
        message: String,
        file_name: Option<String>,
    },

    /// 对象存储错误
    #[error("存储错误: {message}")]
    Storage { message: String },

    /// 向量库服务错误
    #[error("向量库错误: {message}")]
    VectorStore {
        message: String,
        status: Option<u16>,
    },

    /// 外部服务错误
    #[error("外部服务错误: {service} - {message}")]
    ExternalService { service: String, message: String },

    /// 内部服务器错误
    #[error("内部服务器错误: {message}")]
    Internal { message: String },

    /// 超时错误
    #[error("请求超时: {operation}")]
    Timeout { operation: String },
}

impl OrgDeskError {
    /// 获取错误代码
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Configuration { .. } => "CONFIGURATION_ERROR",
            Self::Database { .. } => "DATABASE_ERROR",
            Self::Authentication { .. } => "AUTHENTICATION_ERROR",
            Self::Authorization { .. } => "AUTHORIZATION_ERROR",
            Self::Validation { .. } => "VALIDATION_ERROR",
            Self::Organization { .. } => "ORGANIZATION_ERROR",
            Self::NotFound { .. } => "NOT_FOUND",
            Self::Conflict { .. } => "CONFLICT",
            Self::FileProcessing { .. } => "FILE_PROCESSING_ERROR",
            Self::Storage { .. } => "STORAGE_ERROR",
            Self::VectorStore { .. } => "VECTOR_STORE_ERROR",
            Self::ExternalService { .. } => "EXTERNAL_SERVICE_ERROR",
            Self::Internal { .. } => "INTERNAL_ERROR",
            Self::Timeout { .. } => "TIMEOUT_ERROR",
        }
    }

    /// 获取 HTTP 状态码
    pub fn status_code(&self) -> u16 {
        match self {
            Self::Configuration { .. } => 500,
            Self::Database { .. } => 500,
            Self::Authentication { .. } => 401,
            Self::Authorization { .. } => 403,
            Self::Validation { .. } => 400,
            Self::Organization { .. } => 400,
            Self::NotFound { .. } => 404,
            Self::Conflict { .. } => 409,
            Self::FileProcessing { .. } => 400,
            Self::Storage { .. } => 500,
            Self::VectorStore { .. } => 502,
            Self::ExternalService { .. } => 502,
            Self::Internal { .. } => 500,
            Self::Timeout { .. } => 408,
        }
    }

    /// 面向客户端的错误消息（不带分类前缀）
    pub fn message(&self) -> String {
        match self {
            Self::Configuration { message }
            | Self::Database { message }
            | Self::Authentication { message }
            | Self::Authorization { message }
            | Self::Validation { message, .. }
            | Self::Organization { message }
            | Self::NotFound { message }
            | Self::Conflict { message }
            | Self::FileProcessing { message, .. }
            | Self::Storage { message }
            | Self::VectorStore { message, .. }
            | Self::ExternalService { message, .. }
            | Self::Internal { message } => message.clone(),
            Self::Timeout { operation } => format!("{} 超时", operation),
        }
    }

    /// 是否为客户端错误
    pub fn is_client_error(&self) -> bool {
        matches!(self.status_code(), 400..=499)
    }

    /// 是否为服务器错误
    pub fn is_server_error(&self) -> bool {
        matches!(self.status_code(), 500..=599)
    }

    /// 是否应该记录错误日志
    pub fn should_log(&self) -> bool {
        !matches!(
            self,
            Self::Validation { .. }
                | Self::NotFound { .. }
                | Self::Authentication { .. }
                | Self::Organization { .. }
        )
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    pub fn database(message: impl Into<String>) -> Self {
        Self::Database {
            message: message.into(),
        }
    }

    /// 创建未授权错误
    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::Authentication {
            message: message.into(),
        }
    }

    /// 创建禁止访问错误
    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::Authorization {
            message: message.into(),
        }
    }

    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// 创建组织上下文错误
    pub fn organization(message: impl Into<String>) -> Self {
        Self::Organization {
            message: message.into(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound {
            message: message.into(),
        }
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict {
            message: message.into(),
        }
    }

    pub fn file_processing(message: impl Into<String>) -> Self {
        Self::FileProcessing {
            message: message.into(),
            file_name: None,
        }
    }

    /// 创建文件处理错误（带文件名）
    pub fn file_processing_with_name(
        message: impl Into<String>,
        file_name: impl Into<String>,
    ) -> Self {
        Self::FileProcessing {
            message: message.into(),
            file_name: Some(file_name.into()),
        }
    }

    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage {
            message: message.into(),
        }
    }

    pub fn vector_store(message: impl Into<String>) -> Self {
        Self::VectorStore {
            message: message.into(),
            status: None,
        }
    }

    /// 创建向量库错误（带上游状态码）
    pub fn vector_store_with_status(message: impl Into<String>, status: u16) -> Self {
        Self::VectorStore {
            message: message.into(),
            status: Some(status),
        }
    }

    pub fn external_service(service: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ExternalService {
            service: service.into(),
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    pub fn timeout(operation: impl Into<String>) -> Self {
        Self::Timeout {
            operation: operation.into(),
        }
    }
}

/// 实现 ResponseError trait 以便与 Actix Web 集成
impl ResponseError for OrgDeskError {
    fn status_code(&self) -> actix_web::http::StatusCode {
        actix_web::http::StatusCode::from_u16(self.status_code())
            .unwrap_or(actix_web::http::StatusCode::INTERNAL_SERVER_ERROR)
    }

    fn error_response(&self) -> HttpResponse {
        if self.should_log() {
            error!(
                error_code = %self.error_code(),
                error_message = %self,
                "处理请求时发生错误"
            );
        }

        crate::errors::ErrorResponse::from_error(self).into_http_response()
    }
}

impl From<CommonError> for OrgDeskError {
    fn from(err: CommonError) -> Self {
        match err {
            CommonError::Validation { message } => Self::validation("general", message),
            CommonError::Permission { message } => Self::forbidden(message),
            CommonError::NotFound { resource } => Self::not_found(resource),
            CommonError::Configuration { message } => Self::configuration(message),
            CommonError::ExternalService { service, message } => {
                Self::external_service(service, message)
            }
            CommonError::Internal { message } => Self::internal(message),
        }
    }
}

impl From<sea_orm::DbErr> for OrgDeskError {
    fn from(err: sea_orm::DbErr) -> Self {
        match err {
            // 唯一约束冲突
            sea_orm::DbErr::Exec(sea_orm::RuntimeErr::SqlxError(sqlx::Error::Database(ref e)))
            | sea_orm::DbErr::Query(sea_orm::RuntimeErr::SqlxError(sqlx::Error::Database(ref e)))
                if e.code().as_deref() == Some("23505") =>
            {
                Self::conflict("Resource already exists")
            }
            sea_orm::DbErr::ConnectionAcquire(_) => Self::database("无法获取数据库连接"),
            sea_orm::DbErr::TryIntoErr { .. } => Self::database("数据类型转换错误"),
            sea_orm::DbErr::Conn(msg) => Self::database(format!("数据库连接错误: {}", msg)),
            sea_orm::DbErr::Exec(msg) => Self::database(format!("数据库执行错误: {}", msg)),
            sea_orm::DbErr::Query(msg) => Self::database(format!("数据库查询错误: {}", msg)),
            sea_orm::DbErr::RecordNotFound(msg) => Self::not_found(msg),
            _ => Self::database(format!("数据库错误: {}", err)),
        }
    }
}

impl From<config::ConfigError> for OrgDeskError {
    fn from(err: config::ConfigError) -> Self {
        Self::configuration(format!("配置加载错误: {}", err))
    }
}

impl From<std::io::Error> for OrgDeskError {
    fn from(err: std::io::Error) -> Self {
        match err.kind() {
            std::io::ErrorKind::NotFound => Self::not_found("文件或目录不存在"),
            std::io::ErrorKind::PermissionDenied => Self::forbidden("文件访问权限不足"),
            std::io::ErrorKind::TimedOut => Self::timeout("文件操作"),
            _ => Self::internal(format!("IO 错误: {}", err)),
        }
    }
}

impl From<serde_json::Error> for OrgDeskError {
    fn from(err: serde_json::Error) -> Self {
        Self::validation("json", format!("JSON 解析错误: {}", err))
    }
}

impl From<uuid::Error> for OrgDeskError {
    fn from(err: uuid::Error) -> Self {
        Self::validation("uuid", format!("UUID 格式错误: {}", err))
    }
}

impl From<object_store::Error> for OrgDeskError {
    fn from(err: object_store::Error) -> Self {
        match err {
            object_store::Error::NotFound { path, .. } => {
                Self::not_found(format!("存储对象不存在: {}", path))
            }
            _ => Self::storage(format!("对象存储操作失败: {}", err)),
        }
    }
}

impl From<reqwest::Error> for OrgDeskError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::timeout("外部 HTTP 请求")
        } else {
            Self::external_service("http", err.to_string())
        }
    }
}

/// 令牌校验失败在会话层单独处理，走到这里的只有签发失败
impl From<jsonwebtoken::errors::Error> for OrgDeskError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        Self::internal(format!("会话令牌签发失败: {}", err))
    }
}

impl From<bcrypt::BcryptError> for OrgDeskError {
    fn from(err: bcrypt::BcryptError) -> Self {
        Self::internal(format!("密码哈希失败: {}", err))
    }
}

impl From<actix_multipart::MultipartError> for OrgDeskError {
    fn from(err: actix_multipart::MultipartError) -> Self {
        Self::file_processing(format!("表单解析失败: {}", err))
    }
}
