// 知识库 API 处理器

use actix_web::{web, HttpResponse, Result as ActixResult};
use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::api::extractors::{OrganizationExtractor, SessionExtractor};
use crate::api::responses::{HttpResponseBuilder, SuccessFlag};
use crate::api::state::AppState;
use crate::errors::OrgDeskError;
use crate::services::knowledge_base::{CreateKnowledgeBaseRequest, UpdateKnowledgeBaseRequest};

#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TrainFileRequest {
    pub file_storage_id: Option<Uuid>,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct TrainWebsiteRequest {
    #[serde(default)]
    pub url: String,
}

/// 当前组织的知识库及训练记录
#[utoipa::path(
    get,
    path = "/api/knowledge-base",
    tag = "Knowledge Base",
    responses(
        (status = 200, description = "知识库详情", body = KnowledgeBaseDetail),
        (status = 404, description = "知识库不存在")
    )
)]
pub async fn get_knowledge_base(
    state: web::Data<AppState>,
    _session: SessionExtractor,
    organization: OrganizationExtractor,
) -> ActixResult<HttpResponse> {
    let detail = state.knowledge_bases().get(organization.organization_id).await?;
    HttpResponseBuilder::ok(detail)
}

#[utoipa::path(
    post,
    path = "/api/knowledge-base",
    tag = "Knowledge Base",
    request_body = CreateKnowledgeBaseRequest,
    responses(
        (status = 201, description = "知识库已创建", body = KnowledgeBaseDetail),
        (status = 400, description = "组织已有知识库")
    )
)]
pub async fn create_knowledge_base(
    state: web::Data<AppState>,
    _session: SessionExtractor,
    organization: OrganizationExtractor,
    request: web::Json<CreateKnowledgeBaseRequest>,
) -> ActixResult<HttpResponse> {
    let detail = state
        .knowledge_bases()
        .create(organization.organization_id, request.into_inner())
        .await?;
    HttpResponseBuilder::created(detail)
}

#[utoipa::path(
    patch,
    path = "/api/knowledge-base",
    tag = "Knowledge Base",
    request_body = UpdateKnowledgeBaseRequest,
    responses(
        (status = 200, description = "更新后的知识库", body = KnowledgeBaseDetail),
        (status = 404, description = "知识库不存在")
    )
)]
pub async fn update_knowledge_base(
    state: web::Data<AppState>,
    _session: SessionExtractor,
    organization: OrganizationExtractor,
    request: web::Json<UpdateKnowledgeBaseRequest>,
) -> ActixResult<HttpResponse> {
    let detail = state
        .knowledge_bases()
        .update(organization.organization_id, request.into_inner())
        .await?;
    HttpResponseBuilder::ok(detail)
}

/// 提交文件训练，立即返回 PROCESSING 记录
#[utoipa::path(
    post,
    path = "/api/knowledge-base/train-file",
    tag = "Knowledge Base",
    request_body = TrainFileRequest,
    responses(
        (status = 201, description = "训练已开始", body = TrainingFile),
        (status = 400, description = "缺少文件 ID、向量库未初始化或文件已在训练"),
        (status = 404, description = "知识库或文件不存在")
    )
)]
pub async fn train_file(
    state: web::Data<AppState>,
    _session: SessionExtractor,
    organization: OrganizationExtractor,
    request: web::Json<TrainFileRequest>,
) -> ActixResult<HttpResponse> {
    let file_storage_id = request
        .file_storage_id
        .ok_or_else(|| OrgDeskError::validation("fileStorageId", "fileStorageId is required"))?;

    let training = state
        .knowledge_bases()
        .train_file(organization.organization_id, file_storage_id)
        .await?;
    HttpResponseBuilder::created(training)
}

/// 提交网站训练，立即返回 PROCESSING 记录
#[utoipa::path(
    post,
    path = "/api/knowledge-base/train-website",
    tag = "Knowledge Base",
    request_body = TrainWebsiteRequest,
    responses(
        (status = 201, description = "训练已开始", body = TrainingWebsite),
        (status = 400, description = "URL 无效、向量库未初始化或 URL 已在训练"),
        (status = 404, description = "知识库不存在")
    )
)]
pub async fn train_website(
    state: web::Data<AppState>,
    _session: SessionExtractor,
    organization: OrganizationExtractor,
    request: web::Json<TrainWebsiteRequest>,
) -> ActixResult<HttpResponse> {
    let training = state
        .knowledge_bases()
        .train_website(organization.organization_id, &request.url)
        .await?;
    HttpResponseBuilder::created(training)
}

/// 清空向量库文件与训练记录
#[utoipa::path(
    post,
    path = "/api/knowledge-base/reset",
    tag = "Knowledge Base",
    responses(
        (status = 200, description = "知识库已重置", body = SuccessFlag),
        (status = 404, description = "知识库不存在")
    )
)]
pub async fn reset_knowledge_base(
    state: web::Data<AppState>,
    _session: SessionExtractor,
    organization: OrganizationExtractor,
) -> ActixResult<HttpResponse> {
    state.knowledge_bases().reset(organization.organization_id).await?;
    HttpResponseBuilder::ok(SuccessFlag::yes())
}

pub fn configure_knowledge_base_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/knowledge-base")
            .route("", web::get().to(get_knowledge_base))
            .route("", web::post().to(create_knowledge_base))
            .route("", web::patch().to(update_knowledge_base))
            .route("/train-file", web::post().to(train_file))
            .route("/train-website", web::post().to(train_website))
            .route("/reset", web::post().to(reset_knowledge_base)),
    );
}
