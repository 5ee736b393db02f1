// 团队成员 API 处理器

use actix_web::{web, HttpResponse, Result as ActixResult};
use uuid::Uuid;

use crate::api::extractors::{ListQueryExtractor, OrganizationExtractor, SessionExtractor};
use crate::api::responses::{HttpResponseBuilder, SuccessFlag};
use crate::api::state::AppState;
use crate::services::team::{InviteMemberRequest, UpdateMemberRequest};

/// 分页列出组织成员
#[utoipa::path(
    get,
    path = "/api/team",
    tag = "Team",
    params(
        ("page" = Option<u64>, Query, description = "页码，从 1 开始"),
        ("pageSize" = Option<u64>, Query, description = "每页数量，5 到 100"),
        ("q" = Option<String>, Query, description = "按姓名或邮箱搜索")
    ),
    responses(
        (status = 200, description = "成员分页列表", body = [TeamMember]),
        (status = 400, description = "缺少组织 ID")
    )
)]
pub async fn list_members(
    state: web::Data<AppState>,
    _session: SessionExtractor,
    organization: OrganizationExtractor,
    query: ListQueryExtractor,
) -> ActixResult<HttpResponse> {
    let page = state.team().list(organization.organization_id, &query.0).await?;
    HttpResponseBuilder::ok(page)
}

/// 邀请成员
#[utoipa::path(
    post,
    path = "/api/team",
    tag = "Team",
    request_body = InviteMemberRequest,
    responses(
        (status = 201, description = "成员已加入", body = TeamMember),
        (status = 403, description = "无 USER 创建权限"),
        (status = 409, description = "已是组织成员")
    )
)]
pub async fn invite_member(
    state: web::Data<AppState>,
    session: SessionExtractor,
    organization: OrganizationExtractor,
    request: web::Json<InviteMemberRequest>,
) -> ActixResult<HttpResponse> {
    let member = state
        .team()
        .invite(session.user_id, organization.organization_id, request.into_inner())
        .await?;
    HttpResponseBuilder::created(member)
}

/// 修改成员角色
#[utoipa::path(
    patch,
    path = "/api/team/{access_id}",
    tag = "Team",
    params(("access_id" = Uuid, Path, description = "成员访问记录 ID")),
    request_body = UpdateMemberRequest,
    responses(
        (status = 200, description = "更新后的成员", body = TeamMember),
        (status = 404, description = "成员不存在或不属于当前组织")
    )
)]
pub async fn update_member(
    state: web::Data<AppState>,
    session: SessionExtractor,
    organization: OrganizationExtractor,
    path: web::Path<Uuid>,
    request: web::Json<UpdateMemberRequest>,
) -> ActixResult<HttpResponse> {
    let member = state
        .team()
        .update_role(
            session.user_id,
            organization.organization_id,
            path.into_inner(),
            &request.role,
        )
        .await?;
    HttpResponseBuilder::ok(member)
}

/// 移除成员
#[utoipa::path(
    delete,
    path = "/api/team/{access_id}",
    tag = "Team",
    params(("access_id" = Uuid, Path, description = "成员访问记录 ID")),
    responses(
        (status = 200, description = "成员已移除", body = SuccessFlag),
        (status = 404, description = "成员不存在或不属于当前组织")
    )
)]
pub async fn remove_member(
    state: web::Data<AppState>,
    session: SessionExtractor,
    organization: OrganizationExtractor,
    path: web::Path<Uuid>,
) -> ActixResult<HttpResponse> {
    state
        .team()
        .remove(session.user_id, organization.organization_id, path.into_inner())
        .await?;
    HttpResponseBuilder::ok(SuccessFlag::yes())
}

pub fn configure_team_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/team")
            .route("", web::get().to(list_members))
            .route("", web::post().to(invite_member))
            .route("/{access_id}", web::patch().to(update_member))
            .route("/{access_id}", web::delete().to(remove_member)),
    );
}
