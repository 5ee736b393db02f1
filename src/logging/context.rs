// 日志上下文管理

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// 请求上下文
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequestContext {
    pub request_id: String,
    pub user_id: Option<String>,
    pub organization_id: Option<String>,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub method: Option<String>,
    pub path: Option<String>,
    pub start_time: chrono::DateTime<chrono::Utc>,
}

impl RequestContext {
    pub fn new() -> Self {
        Self {
            request_id: Uuid::new_v4().to_string(),
            user_id: None,
            organization_id: None,
            ip_address: None,
            user_agent: None,
            method: None,
            path: None,
            start_time: chrono::Utc::now(),
        }
    }

    /// 从 HTTP 请求创建上下文，沿用中间件分配的请求 ID
    pub fn from_http_request(req: &actix_web::HttpRequest) -> Self {
        let mut context = Self::new();

        if let Some(request_id) = crate::errors::get_request_id(req) {
            context.request_id = request_id;
        }

        context.method = Some(req.method().to_string());
        context.path = Some(req.path().to_string());
        context.ip_address = req
            .connection_info()
            .realip_remote_addr()
            .map(|s| s.to_string());
        context.user_agent = req
            .headers()
            .get("user-agent")
            .and_then(|h| h.to_str().ok())
            .map(|s| s.to_string());

        context
    }

    pub fn with_user_id(mut self, user_id: impl ToString) -> Self {
        self.user_id = Some(user_id.to_string());
        self
    }

    pub fn with_organization_id(mut self, organization_id: impl ToString) -> Self {
        self.organization_id = Some(organization_id.to_string());
        self
    }

    /// 转换为日志字段
    pub fn to_log_fields(&self) -> Vec<(&'static str, String)> {
        let mut fields = vec![
            ("request_id", self.request_id.clone()),
            ("start_time", self.start_time.to_rfc3339()),
        ];

        let optional = [
            ("user_id", &self.user_id),
            ("organization_id", &self.organization_id),
            ("ip_address", &self.ip_address),
            ("user_agent", &self.user_agent),
            ("method", &self.method),
            ("path", &self.path),
        ];
        for (key, value) in optional {
            if let Some(value) = value {
                fields.push((key, value.clone()));
            }
        }

        fields
    }
}

impl Default for RequestContext {
    fn default() -> Self {
        Self::new()
    }
}

/// 带请求上下文记录日志
#[macro_export]
macro_rules! log_with_context {
    ($level:ident, $context:expr, $($arg:tt)*) => {
        tracing::$level!(
            request_id = %$context.request_id,
            user_id = ?$context.user_id,
            organization_id = ?$context.organization_id,
            path = ?$context.path,
            $($arg)*
        );
    };
}
