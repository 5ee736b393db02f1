// 文件 API 处理器

use actix_multipart::Multipart;
use actix_web::{
    http::header::{ContentDisposition, DispositionParam, DispositionType},
    web, HttpResponse, Result as ActixResult,
};
use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::api::extractors::SessionExtractor;
use crate::api::multipart::{parse_flag, MultipartForm};
use crate::api::responses::{HttpResponseBuilder, SuccessFlag};
use crate::api::state::AppState;
use crate::errors::OrgDeskError;
use crate::services::storage::UploadFileOptions;

/// 上传表单字段，仅用于接口文档
#[allow(dead_code)]
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UploadFileForm {
    #[schema(value_type = String, format = Binary)]
    pub file: Vec<u8>,
    pub organization_id: Option<Uuid>,
    pub is_secure: Option<bool>,
    pub token_expiry_hours: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct FileTokenQuery {
    pub token: Option<String>,
}

/// 上传文件（multipart：file、organizationId、isSecure、tokenExpiryHours）
#[utoipa::path(
    post,
    path = "/api/files",
    tag = "Files",
    request_body(content = UploadFileForm, content_type = "multipart/form-data", description = "file 必填"),
    responses(
        (status = 201, description = "上传成功", body = UploadResult),
        (status = 400, description = "缺少文件或文件过大"),
        (status = 401, description = "未登录")
    )
)]
pub async fn upload_file(
    state: web::Data<AppState>,
    session: SessionExtractor,
    payload: Multipart,
) -> ActixResult<HttpResponse> {
    let mut form = MultipartForm::read(payload, state.config.storage.max_file_size).await?;
    let file = form
        .take_file("file")
        .ok_or_else(|| OrgDeskError::validation("file", "No file provided"))?;

    let organization_id = form
        .text("organizationId")
        .map(Uuid::parse_str)
        .transpose()
        .map_err(|_| OrgDeskError::validation("organizationId", "Invalid organization ID"))?;
    let token_expiry_hours = form
        .text("tokenExpiryHours")
        .map(str::parse::<i64>)
        .transpose()
        .map_err(|_| OrgDeskError::validation("tokenExpiryHours", "Invalid token expiry"))?;

    let uploaded = state
        .storage
        .upload(UploadFileOptions {
            bytes: file.bytes,
            file_name: file.file_name,
            mime_type: file.mime_type,
            organization_id,
            user_id: Some(session.user_id),
            is_secure: parse_flag(form.text("isSecure")),
            token_expiry_hours,
        })
        .await?;
    HttpResponseBuilder::created(uploaded)
}

/// 下载文件，受保护文件需要 token
#[utoipa::path(
    get,
    path = "/api/files/{file_id}",
    tag = "Files",
    params(
        ("file_id" = Uuid, Path, description = "文件 ID"),
        ("token" = Option<String>, Query, description = "受保护文件的访问令牌")
    ),
    responses(
        (status = 200, description = "文件内容"),
        (status = 401, description = "令牌无效或已过期"),
        (status = 404, description = "文件不存在")
    )
)]
pub async fn download_file(
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
    query: web::Query<FileTokenQuery>,
) -> ActixResult<HttpResponse> {
    let file = state
        .storage
        .get_file(path.into_inner(), query.token.as_deref())
        .await?;

    let disposition = ContentDisposition {
        disposition: DispositionType::Inline,
        parameters: vec![DispositionParam::Filename(file.file_name)],
    };

    Ok(HttpResponse::Ok()
        .content_type(file.mime_type)
        .insert_header(disposition)
        .body(file.bytes))
}

#[utoipa::path(
    delete,
    path = "/api/files/{file_id}",
    tag = "Files",
    params(("file_id" = Uuid, Path, description = "文件 ID")),
    responses(
        (status = 200, description = "文件已删除", body = SuccessFlag),
        (status = 404, description = "文件不存在")
    )
)]
pub async fn delete_file(
    state: web::Data<AppState>,
    _session: SessionExtractor,
    path: web::Path<Uuid>,
) -> ActixResult<HttpResponse> {
    state.storage.delete_file(path.into_inner()).await?;
    HttpResponseBuilder::ok(SuccessFlag::yes())
}

pub fn configure_file_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/files")
            .route("", web::post().to(upload_file))
            .route("/{file_id}", web::get().to(download_file))
            .route("/{file_id}", web::delete().to(delete_file)),
    );
}
