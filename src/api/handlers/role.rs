// 角色 API 处理器

use actix_web::{web, HttpResponse, Result as ActixResult};
use uuid::Uuid;

use crate::api::extractors::SessionExtractor;
use crate::api::responses::{HttpResponseBuilder, SuccessFlag};
use crate::api::state::AppState;
use crate::services::role::RoleRequest;

#[utoipa::path(
    get,
    path = "/api/roles",
    tag = "Role",
    responses((status = 200, description = "角色及权限，最新的在前", body = [RoleWithPermissions]))
)]
pub async fn list_roles(state: web::Data<AppState>, _session: SessionExtractor) -> ActixResult<HttpResponse> {
    let roles = state.roles().list().await?;
    HttpResponseBuilder::ok(roles)
}

#[utoipa::path(
    post,
    path = "/api/roles",
    tag = "Role",
    request_body = RoleRequest,
    responses(
        (status = 201, description = "自定义角色已创建", body = RoleWithPermissions),
        (status = 400, description = "缺少名称或权限列表")
    )
)]
pub async fn create_role(
    state: web::Data<AppState>,
    _session: SessionExtractor,
    request: web::Json<RoleRequest>,
) -> ActixResult<HttpResponse> {
    let role = state.roles().create(request.into_inner()).await?;
    HttpResponseBuilder::created(role)
}

#[utoipa::path(
    get,
    path = "/api/roles/{role_id}",
    tag = "Role",
    params(("role_id" = Uuid, Path, description = "角色 ID")),
    responses(
        (status = 200, description = "角色详情", body = RoleWithPermissions),
        (status = 404, description = "角色不存在")
    )
)]
pub async fn get_role(
    state: web::Data<AppState>,
    _session: SessionExtractor,
    path: web::Path<Uuid>,
) -> ActixResult<HttpResponse> {
    let role = state.roles().get(path.into_inner()).await?;
    HttpResponseBuilder::ok(role)
}

#[utoipa::path(
    put,
    path = "/api/roles/{role_id}",
    tag = "Role",
    params(("role_id" = Uuid, Path, description = "角色 ID")),
    request_body = RoleRequest,
    responses(
        (status = 200, description = "更新后的角色", body = RoleWithPermissions),
        (status = 404, description = "角色不存在")
    )
)]
pub async fn update_role(
    state: web::Data<AppState>,
    _session: SessionExtractor,
    path: web::Path<Uuid>,
    request: web::Json<RoleRequest>,
) -> ActixResult<HttpResponse> {
    let role = state
        .roles()
        .update(path.into_inner(), request.into_inner())
        .await?;
    HttpResponseBuilder::ok(role)
}

#[utoipa::path(
    delete,
    path = "/api/roles/{role_id}",
    tag = "Role",
    params(("role_id" = Uuid, Path, description = "角色 ID")),
    responses(
        (status = 200, description = "角色已删除", body = SuccessFlag),
        (status = 400, description = "角色仍被成员使用"),
        (status = 404, description = "角色不存在")
    )
)]
pub async fn delete_role(
    state: web::Data<AppState>,
    _session: SessionExtractor,
    path: web::Path<Uuid>,
) -> ActixResult<HttpResponse> {
    state.roles().delete(path.into_inner()).await?;
    HttpResponseBuilder::ok(SuccessFlag::yes())
}

pub fn configure_role_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/roles")
            .route("", web::get().to(list_roles))
            .route("", web::post().to(create_role))
            .route("/{role_id}", web::get().to(get_role))
            .route("/{role_id}", web::put().to(update_role))
            .route("/{role_id}", web::delete().to(delete_role)),
    );
}
