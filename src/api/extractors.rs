// API 请求提取器
// 会话、当前组织与列表查询参数

use actix_web::{dev::Payload, web, FromRequest, HttpRequest};
use futures::future::{ready, Ready};
use orgdesk_common::{ListQuery, ListQueryParams};
use uuid::Uuid;

use crate::api::state::AppState;
use crate::errors::OrgDeskError;
use crate::logging::RequestContext;
use crate::services::session::SessionClaims;

/// 当前组织 Cookie
pub const ORGANIZATION_COOKIE: &str = "organizationId";
/// Cookie 缺失时的备用请求头
pub const ORGANIZATION_HEADER: &str = "X-Organization-Id";

/// 已登录用户
#[derive(Debug, Clone)]
pub struct SessionExtractor {
    pub user_id: Uuid,
    pub claims: SessionClaims,
}

impl SessionExtractor {
    fn extract(req: &HttpRequest) -> Result<Self, OrgDeskError> {
        let state = req
            .app_data::<web::Data<AppState>>()
            .ok_or_else(|| OrgDeskError::internal("AppState 未注册"))?;
        let sessions = &state.sessions;

        let Some(claims) = req
            .cookie(sessions.cookie_name())
            .and_then(|cookie| sessions.verify(cookie.value()))
        else {
            let context = RequestContext::from_http_request(req);
            crate::log_with_context!(debug, context, "会话缺失或已失效");
            return Err(OrgDeskError::unauthorized("Unauthorized"));
        };

        Ok(Self {
            user_id: claims.user_id,
            claims,
        })
    }
}

impl FromRequest for SessionExtractor {
    type Error = OrgDeskError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(Self::extract(req))
    }
}

/// 当前选中的组织
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrganizationExtractor {
    pub organization_id: Uuid,
}

impl OrganizationExtractor {
    /// 读取 Cookie 或请求头中的原始值
    pub fn raw(req: &HttpRequest) -> Option<String> {
        req.cookie(ORGANIZATION_COOKIE)
            .map(|cookie| cookie.value().to_string())
            .or_else(|| {
                req.headers()
                    .get(ORGANIZATION_HEADER)
                    .and_then(|h| h.to_str().ok())
                    .map(str::to_string)
            })
            .filter(|value| !value.trim().is_empty())
    }

    fn extract(req: &HttpRequest) -> Result<Self, OrgDeskError> {
        let raw = Self::raw(req).ok_or_else(|| OrgDeskError::organization("Organization ID is required"))?;
        let organization_id = Uuid::parse_str(raw.trim()).map_err(|_| {
            let context = RequestContext::from_http_request(req).with_organization_id(&raw);
            crate::log_with_context!(warn, context, "组织 ID 格式无效");
            OrgDeskError::validation("organizationId", "Invalid organization ID")
        })?;
        Ok(Self { organization_id })
    }
}

impl FromRequest for OrganizationExtractor {
    type Error = OrgDeskError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(Self::extract(req))
    }
}

/// 列表查询参数，非法值回退为默认值
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListQueryExtractor(pub ListQuery);

impl FromRequest for ListQueryExtractor {
    type Error = OrgDeskError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let params: ListQueryParams = serde_urlencoded::from_str(req.query_string()).unwrap_or_default();
        ready(Ok(Self(ListQuery::from_params(&params))))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;
    use crate::services::{FileStorageService, OpenAiVectorStoreClient};
    use actix_web::{cookie::Cookie, test::TestRequest};
    use object_store::memory::InMemory;
    use sea_orm::{DatabaseBackend, MockDatabase};
    use std::sync::Arc;

    fn state() -> AppState {
        let config = AppConfig::default();
        let db = Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection());
        let storage = Arc::new(FileStorageService::with_store(
            db.clone(),
            Arc::new(InMemory::new()),
            config.storage.clone(),
        ));
        let vector_store = Arc::new(OpenAiVectorStoreClient::new(&config.vector_store).unwrap());
        AppState::with_parts(db, config, storage, vector_store)
    }

    #[actix_web::test]
    async fn test_session_from_cookie() {
        let state = state();
        let user_id = Uuid::new_v4();
        let token = state.sessions.issue(user_id).unwrap();

        let req = TestRequest::default()
            .app_data(web::Data::new(state))
            .cookie(Cookie::new("session", token))
            .to_http_request();

        let session = SessionExtractor::extract(&req).unwrap();
        assert_eq!(session.user_id, user_id);
    }

    #[actix_web::test]
    async fn test_missing_session_is_unauthorized() {
        let req = TestRequest::default()
            .app_data(web::Data::new(state()))
            .cookie(Cookie::new("session", "garbage"))
            .to_http_request();

        let err = SessionExtractor::extract(&req).unwrap_err();
        assert_eq!(err.status_code(), 401);
        assert_eq!(err.message(), "Unauthorized");
    }

    #[actix_web::test]
    async fn test_organization_cookie_then_header() {
        let from_cookie = Uuid::new_v4();
        let from_header = Uuid::new_v4();

        let req = TestRequest::default()
            .cookie(Cookie::new(ORGANIZATION_COOKIE, from_cookie.to_string()))
            .insert_header((ORGANIZATION_HEADER, from_header.to_string()))
            .to_http_request();
        assert_eq!(OrganizationExtractor::extract(&req).unwrap().organization_id, from_cookie);

        let req = TestRequest::default()
            .insert_header((ORGANIZATION_HEADER, from_header.to_string()))
            .to_http_request();
        assert_eq!(OrganizationExtractor::extract(&req).unwrap().organization_id, from_header);
    }

    #[actix_web::test]
    async fn test_missing_organization() {
        let req = TestRequest::default().to_http_request();
        let err = OrganizationExtractor::extract(&req).unwrap_err();
        assert_eq!(err.status_code(), 400);
        assert_eq!(err.message(), "Organization ID is required");

        let req = TestRequest::default()
            .cookie(Cookie::new(ORGANIZATION_COOKIE, "not-a-uuid"))
            .to_http_request();
        assert_eq!(OrganizationExtractor::extract(&req).unwrap_err().status_code(), 400);
    }

    #[actix_web::test]
    async fn test_list_query_extractor() {
        let req = TestRequest::get()
            .uri("/api/team?page=2&pageSize=500&q=%20acme%20")
            .to_http_request();
        let ListQueryExtractor(query) = ListQueryExtractor::from_request(&req, &mut Payload::None)
            .await
            .unwrap();
        assert_eq!(query.page, 2);
        assert_eq!(query.page_size, 100);
        assert_eq!(query.q, "acme");
    }
}
