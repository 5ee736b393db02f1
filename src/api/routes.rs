// API 路由定义
// 汇总各资源的路由与 OpenAPI 文档

use actix_web::{error::JsonPayloadError, web, HttpRequest};
use tracing::warn;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::api::handlers::{
    agent, auth, configure_agent_routes, configure_auth_routes, configure_file_routes,
    configure_knowledge_base_routes, configure_organization_routes, configure_role_routes,
    configure_team_routes, configure_user_routes, files, knowledge_base, organization, role, team,
    user,
};
use crate::errors::OrgDeskError;

/// API 文档聚合
#[derive(OpenApi)]
#[openapi(
    info(
        title = "OrgDesk API",
        description = "多租户组织管理后台接口文档",
        version = "1.0.0",
        license(name = "MIT", url = "https://opensource.org/licenses/MIT")
    ),
    paths(
        crate::health::health_check,
        crate::health::readiness_check,
        auth::signup,
        auth::login,
        auth::logout,
        auth::forgot_password,
        user::me,
        user::update_profile,
        user::change_password,
        organization::list_organizations,
        organization::create_organization,
        organization::current_organization,
        organization::update_organization,
        organization::organization_permissions,
        team::list_members,
        team::invite_member,
        team::update_member,
        team::remove_member,
        agent::list_agents,
        agent::create_agent,
        agent::get_agent,
        agent::update_agent,
        agent::delete_agent,
        role::list_roles,
        role::create_role,
        role::get_role,
        role::update_role,
        role::delete_role,
        knowledge_base::get_knowledge_base,
        knowledge_base::create_knowledge_base,
        knowledge_base::update_knowledge_base,
        knowledge_base::train_file,
        knowledge_base::train_website,
        knowledge_base::reset_knowledge_base,
        files::upload_file,
        files::download_file,
        files::delete_file,
    ),
    components(schemas(
        crate::health::HealthStatus,
        crate::health::HealthResponse,
        crate::health::ReadinessResponse,
        crate::api::responses::SuccessFlag,
        crate::services::auth::SignupRequest,
        crate::services::auth::LoginRequest,
        crate::services::auth::ForgotPasswordRequest,
        crate::services::auth::AuthenticatedUser,
        crate::services::user::UserProfile,
        crate::services::user::ChangePasswordRequest,
        crate::services::organization::OrganizationSummary,
        crate::services::organization::CreateOrganizationRequest,
        crate::services::rbac::PermissionFlags,
        crate::services::team::MemberUser,
        crate::services::team::TeamMember,
        crate::services::team::InviteMemberRequest,
        crate::services::team::UpdateMemberRequest,
        crate::services::agent::KnowledgeBaseRef,
        crate::services::agent::AgentResponse,
        crate::services::agent::CreateAgentRequest,
        crate::services::agent::UpdateAgentRequest,
        crate::services::role::PermissionRequest,
        crate::services::role::RoleRequest,
        crate::services::role::RoleWithPermissions,
        crate::services::knowledge_base::CreateKnowledgeBaseRequest,
        crate::services::knowledge_base::UpdateKnowledgeBaseRequest,
        crate::services::knowledge_base::TrainingFileDetail,
        crate::services::knowledge_base::KnowledgeBaseDetail,
        crate::services::storage::UploadResult,
        crate::api::handlers::knowledge_base::TrainFileRequest,
        crate::api::handlers::knowledge_base::TrainWebsiteRequest,
        crate::api::handlers::files::UploadFileForm,
        crate::api::handlers::organization::UpdateOrganizationForm,
        crate::api::handlers::user::UpdateProfileForm,
        crate::db::entities::organization::Model,
        crate::db::entities::organization_access::LegacyRole,
        crate::db::entities::role::Model,
        crate::db::entities::permission::Model,
        crate::db::entities::agent::Model,
        crate::db::entities::knowledge_base::Model,
        crate::db::entities::knowledge_base::KnowledgeBaseStatus,
        crate::db::entities::training_file::Model,
        crate::db::entities::training_file::TrainingStatus,
        crate::db::entities::training_website::Model,
        crate::db::entities::file_storage::Model,
    )),
    tags(
        (name = "Health", description = "健康检查"),
        (name = "Auth", description = "注册、登录与找回密码"),
        (name = "User", description = "当前用户资料"),
        (name = "Organization", description = "组织管理"),
        (name = "Team", description = "组织成员管理"),
        (name = "Agent", description = "Agent 配置管理"),
        (name = "Role", description = "角色与权限管理"),
        (name = "Knowledge Base", description = "知识库与训练"),
        (name = "Files", description = "文件上传与下载"),
    )
)]
pub struct ApiDoc;

/// JSON 请求体解析失败时统一返回校验错误
fn json_error_handler(err: JsonPayloadError, req: &HttpRequest) -> actix_web::Error {
    warn!(path = %req.path(), error = %err, "请求体解析失败");
    OrgDeskError::validation("body", "Invalid request body").into()
}

/// 配置 API 路由
///
/// Swagger UI 需先于 `/api` 作用域注册，否则会被作用域截获。
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(SwaggerUi::new("/api/docs/{_:.*}").url("/api/openapi.json", ApiDoc::openapi()))
        .service(
            web::scope("/api")
                .app_data(web::JsonConfig::default().error_handler(json_error_handler))
                .configure(configure_auth_routes)
                .configure(configure_user_routes)
                .configure(configure_organization_routes)
                .configure(configure_team_routes)
                .configure(configure_agent_routes)
                .configure(configure_role_routes)
                .configure(configure_knowledge_base_routes)
                .configure(configure_file_routes),
        );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::state::AppState;
    use crate::config::AppConfig;
    use crate::db::entities::user;
    use crate::services::{FileStorageService, OpenAiVectorStoreClient};
    use actix_web::{http::header::ContentType, test as actix_test, App};
    use object_store::memory::InMemory;
    use sea_orm::{DatabaseBackend, DatabaseConnection, MockDatabase};
    use std::sync::Arc;

    fn state(db: Arc<DatabaseConnection>) -> AppState {
        let config = AppConfig::default();
        let storage = Arc::new(FileStorageService::with_store(
            db.clone(),
            Arc::new(InMemory::new()),
            config.storage.clone(),
        ));
        let vector_store = Arc::new(OpenAiVectorStoreClient::new(&config.vector_store).unwrap());
        AppState::with_parts(db, config, storage, vector_store)
    }

    #[test]
    fn test_openapi_document() {
        let doc = ApiDoc::openapi();
        assert_eq!(doc.info.title, "OrgDesk API");
        assert!(doc.paths.paths.contains_key("/api/auth/login"));
        assert!(doc.paths.paths.contains_key("/api/knowledge-base/train-file"));
        assert!(doc.paths.paths.contains_key("/health/ready"));

        let json = serde_json::to_value(&doc).unwrap();
        for (path, method) in [
            ("/api/files", "post"),
            ("/api/user/profile", "patch"),
            ("/api/organizations/{organization_id}", "patch"),
        ] {
            let content = &json["paths"][path][method]["requestBody"]["content"];
            assert!(content["multipart/form-data"]["schema"].is_object(), "{} 缺少表单结构", path);
        }
        assert_eq!(
            json["components"]["schemas"]["UploadFileForm"]["properties"]["file"]["format"],
            "binary"
        );
    }

    fn collect_refs(value: &serde_json::Value, refs: &mut Vec<String>) {
        match value {
            serde_json::Value::Object(map) => {
                for (key, child) in map {
                    match child {
                        serde_json::Value::String(r) if key == "$ref" => refs.push(r.clone()),
                        _ => collect_refs(child, refs),
                    }
                }
            }
            serde_json::Value::Array(items) => items.iter().for_each(|item| collect_refs(item, refs)),
            _ => {}
        }
    }

    #[test]
    fn test_every_schema_reference_is_registered() {
        let json = serde_json::to_value(ApiDoc::openapi()).unwrap();
        let mut refs = Vec::new();
        collect_refs(&json["paths"], &mut refs);
        assert!(!refs.is_empty());

        for r in refs {
            let name = r.trim_start_matches("#/components/schemas/");
            assert!(json["components"]["schemas"][name].is_object(), "未注册的结构: {}", name);
        }
    }

    #[actix_web::test]
    async fn test_malformed_json_body() {
        let db = Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection());
        let app = actix_test::init_service(
            App::new()
                .app_data(web::Data::new(state(db)))
                .configure(configure_routes),
        )
        .await;

        let req = actix_test::TestRequest::post()
            .uri("/api/auth/login")
            .insert_header(ContentType::json())
            .set_payload("{not json")
            .to_request();
        let resp = actix_test::call_service(&app, req).await;
        assert_eq!(resp.status(), 400);

        let body: serde_json::Value = actix_test::read_body_json(resp).await;
        assert_eq!(body["error"]["message"], "Invalid request body");
    }

    #[actix_web::test]
    async fn test_protected_route_requires_session() {
        let db = Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection());
        let app = actix_test::init_service(
            App::new()
                .app_data(web::Data::new(state(db)))
                .configure(configure_routes),
        )
        .await;

        let req = actix_test::TestRequest::get().uri("/api/agents").to_request();
        let resp = actix_test::call_service(&app, req).await;
        assert_eq!(resp.status(), 401);
    }

    #[actix_web::test]
    async fn test_login_unknown_user() {
        let db = Arc::new(MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<user::Model>::new()])
            .into_connection());
        let app = actix_test::init_service(
            App::new()
                .app_data(web::Data::new(state(db)))
                .configure(configure_routes),
        )
        .await;

        let req = actix_test::TestRequest::post()
            .uri("/api/auth/login")
            .set_json(serde_json::json!({ "email": "nobody@example.com", "password": "whatever1" }))
            .to_request();
        let resp = actix_test::call_service(&app, req).await;
        assert_eq!(resp.status(), 401);

        let body: serde_json::Value = actix_test::read_body_json(resp).await;
        assert_eq!(body["success"], false);
        assert_eq!(body["error"]["message"], "Invalid credentials");
    }
}
