// Agent API 处理器

use actix_web::{web, HttpResponse, Result as ActixResult};
use uuid::Uuid;

use crate::api::extractors::{OrganizationExtractor, SessionExtractor};
use crate::api::responses::{HttpResponseBuilder, SuccessFlag};
use crate::api::state::AppState;
use crate::services::agent::{CreateAgentRequest, UpdateAgentRequest};

#[utoipa::path(
    get,
    path = "/api/agents",
    tag = "Agent",
    responses((status = 200, description = "组织内的 Agent，最新的在前", body = [AgentResponse]))
)]
pub async fn list_agents(
    state: web::Data<AppState>,
    _session: SessionExtractor,
    organization: OrganizationExtractor,
) -> ActixResult<HttpResponse> {
    let agents = state.agents().list(organization.organization_id).await?;
    HttpResponseBuilder::ok(agents)
}

#[utoipa::path(
    post,
    path = "/api/agents",
    tag = "Agent",
    request_body = CreateAgentRequest,
    responses(
        (status = 201, description = "Agent 已创建", body = AgentResponse),
        (status = 400, description = "名称为空"),
        (status = 404, description = "知识库不存在或不属于当前组织")
    )
)]
pub async fn create_agent(
    state: web::Data<AppState>,
    _session: SessionExtractor,
    organization: OrganizationExtractor,
    request: web::Json<CreateAgentRequest>,
) -> ActixResult<HttpResponse> {
    let agent = state
        .agents()
        .create(organization.organization_id, request.into_inner())
        .await?;
    HttpResponseBuilder::created(agent)
}

#[utoipa::path(
    get,
    path = "/api/agents/{agent_id}",
    tag = "Agent",
    params(("agent_id" = Uuid, Path, description = "Agent ID")),
    responses(
        (status = 200, description = "Agent 详情", body = AgentResponse),
        (status = 404, description = "Agent 不存在")
    )
)]
pub async fn get_agent(
    state: web::Data<AppState>,
    _session: SessionExtractor,
    organization: OrganizationExtractor,
    path: web::Path<Uuid>,
) -> ActixResult<HttpResponse> {
    let agent = state
        .agents()
        .get(organization.organization_id, path.into_inner())
        .await?;
    HttpResponseBuilder::ok(agent)
}

#[utoipa::path(
    patch,
    path = "/api/agents/{agent_id}",
    tag = "Agent",
    params(("agent_id" = Uuid, Path, description = "Agent ID")),
    request_body = UpdateAgentRequest,
    responses(
        (status = 200, description = "更新后的 Agent", body = AgentResponse),
        (status = 404, description = "Agent 或知识库不存在")
    )
)]
pub async fn update_agent(
    state: web::Data<AppState>,
    _session: SessionExtractor,
    organization: OrganizationExtractor,
    path: web::Path<Uuid>,
    request: web::Json<UpdateAgentRequest>,
) -> ActixResult<HttpResponse> {
    let agent = state
        .agents()
        .update(organization.organization_id, path.into_inner(), request.into_inner())
        .await?;
    HttpResponseBuilder::ok(agent)
}

#[utoipa::path(
    delete,
    path = "/api/agents/{agent_id}",
    tag = "Agent",
    params(("agent_id" = Uuid, Path, description = "Agent ID")),
    responses(
        (status = 200, description = "Agent 已删除", body = SuccessFlag),
        (status = 404, description = "Agent 不存在")
    )
)]
pub async fn delete_agent(
    state: web::Data<AppState>,
    _session: SessionExtractor,
    organization: OrganizationExtractor,
    path: web::Path<Uuid>,
) -> ActixResult<HttpResponse> {
    state
        .agents()
        .delete(organization.organization_id, path.into_inner())
        .await?;
    HttpResponseBuilder::ok(SuccessFlag::yes())
}

pub fn configure_agent_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/agents")
            .route("", web::get().to(list_agents))
            .route("", web::post().to(create_agent))
            .route("/{agent_id}", web::get().to(get_agent))
            .route("/{agent_id}", web::patch().to(update_agent))
            .route("/{agent_id}", web::delete().to(delete_agent)),
    );
}
