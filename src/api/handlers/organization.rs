// 组织 API 处理器

use actix_multipart::Multipart;
use actix_web::{web, HttpRequest, HttpResponse, Result as ActixResult};
use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::api::extractors::{OrganizationExtractor, SessionExtractor};
use crate::api::multipart::MultipartForm;
use crate::api::responses::HttpResponseBuilder;
use crate::api::state::AppState;
use crate::services::organization::CreateOrganizationRequest;

/// 组织更新表单字段，仅用于接口文档
#[allow(dead_code)]
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateOrganizationForm {
    pub name: String,
    #[schema(value_type = Option<String>, format = Binary)]
    pub logo_file: Option<Vec<u8>>,
}

/// 当前用户所属的组织
#[utoipa::path(
    get,
    path = "/api/organizations",
    tag = "Organization",
    responses(
        (status = 200, description = "组织列表", body = [OrganizationSummary]),
        (status = 401, description = "未登录")
    )
)]
pub async fn list_organizations(state: web::Data<AppState>, session: SessionExtractor) -> ActixResult<HttpResponse> {
    let organizations = state.organizations().list(session.user_id).await?;
    HttpResponseBuilder::ok(organizations)
}

/// 创建组织，创建者成为管理员
#[utoipa::path(
    post,
    path = "/api/organizations",
    tag = "Organization",
    request_body = CreateOrganizationRequest,
    responses(
        (status = 201, description = "组织已创建", body = OrganizationSummary),
        (status = 400, description = "名称为空")
    )
)]
pub async fn create_organization(
    state: web::Data<AppState>,
    session: SessionExtractor,
    request: web::Json<CreateOrganizationRequest>,
) -> ActixResult<HttpResponse> {
    let created = state
        .organizations()
        .create(session.user_id, request.into_inner())
        .await?;
    HttpResponseBuilder::created(created)
}

/// 当前选中的组织，未选中或无权访问时回退到第一个组织
#[utoipa::path(
    get,
    path = "/api/organizations/current",
    tag = "Organization",
    responses(
        (status = 200, description = "当前组织，可能为 null", body = Organization),
        (status = 401, description = "未登录")
    )
)]
pub async fn current_organization(
    req: HttpRequest,
    state: web::Data<AppState>,
    session: SessionExtractor,
) -> ActixResult<HttpResponse> {
    let selected = OrganizationExtractor::raw(&req).and_then(|raw| Uuid::parse_str(raw.trim()).ok());
    let current = state.organizations().current(session.user_id, selected).await?;
    HttpResponseBuilder::ok(current)
}

/// 更新组织名称与 Logo（multipart：name、logoFile）
#[utoipa::path(
    patch,
    path = "/api/organizations/{organization_id}",
    tag = "Organization",
    params(("organization_id" = Uuid, Path, description = "组织 ID")),
    request_body(content = UpdateOrganizationForm, content_type = "multipart/form-data", description = "name 必填，logoFile 可选"),
    responses(
        (status = 200, description = "更新后的组织", body = Organization),
        (status = 400, description = "名称为空"),
        (status = 403, description = "无权访问或无更新权限")
    )
)]
pub async fn update_organization(
    state: web::Data<AppState>,
    session: SessionExtractor,
    path: web::Path<Uuid>,
    payload: Multipart,
) -> ActixResult<HttpResponse> {
    let organization_id = path.into_inner();
    let mut form = MultipartForm::read(payload, state.config.storage.max_file_size).await?;
    let name = form.text("name").unwrap_or_default().to_string();
    let logo = form.take_file("logoFile");

    let updated = state
        .organizations()
        .update(session.user_id, organization_id, &name, logo)
        .await?;
    HttpResponseBuilder::ok(updated)
}

/// 当前用户在组织内的权限
#[utoipa::path(
    get,
    path = "/api/organizations/{organization_id}/permissions",
    tag = "Organization",
    params(("organization_id" = Uuid, Path, description = "组织 ID")),
    responses((status = 200, description = "资源到权限标志的映射", body = HashMap<String, PermissionFlags>))
)]
pub async fn organization_permissions(
    state: web::Data<AppState>,
    session: SessionExtractor,
    path: web::Path<Uuid>,
) -> ActixResult<HttpResponse> {
    let permissions = state
        .organizations()
        .permissions(session.user_id, path.into_inner())
        .await?;
    HttpResponseBuilder::ok(permissions)
}

pub fn configure_organization_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/organizations")
            .route("", web::get().to(list_organizations))
            .route("", web::post().to(create_organization))
            .route("/current", web::get().to(current_organization))
            .route("/{organization_id}", web::patch().to(update_organization))
            .route("/{organization_id}/permissions", web::get().to(organization_permissions)),
    );
}
