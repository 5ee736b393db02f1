// 当前用户 API 处理器

use actix_multipart::Multipart;
use actix_web::{web, HttpResponse, Result as ActixResult};
use serde::Deserialize;
use utoipa::ToSchema;

use crate::api::extractors::SessionExtractor;
use crate::api::multipart::MultipartForm;
use crate::api::responses::HttpResponseBuilder;
use crate::api::state::AppState;
use crate::services::user::ChangePasswordRequest;

/// 资料更新表单字段，仅用于接口文档
#[allow(dead_code)]
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProfileForm {
    pub name: Option<String>,
    #[schema(value_type = Option<String>, format = Binary)]
    pub profile_picture_file: Option<Vec<u8>>,
}

/// 当前用户资料
#[utoipa::path(
    get,
    path = "/api/user/me",
    tag = "User",
    responses(
        (status = 200, description = "用户资料", body = UserProfile),
        (status = 401, description = "未登录"),
        (status = 404, description = "用户不存在")
    )
)]
pub async fn me(state: web::Data<AppState>, session: SessionExtractor) -> ActixResult<HttpResponse> {
    let profile = state.users().get_profile(session.user_id).await?;
    HttpResponseBuilder::ok(profile)
}

/// 更新资料（multipart：name、profilePictureFile）
#[utoipa::path(
    patch,
    path = "/api/user/profile",
    tag = "User",
    request_body(content = UpdateProfileForm, content_type = "multipart/form-data", description = "name 与 profilePictureFile 均可选"),
    responses(
        (status = 200, description = "更新后的资料", body = UserProfile),
        (status = 401, description = "未登录")
    )
)]
pub async fn update_profile(
    state: web::Data<AppState>,
    session: SessionExtractor,
    payload: Multipart,
) -> ActixResult<HttpResponse> {
    let mut form = MultipartForm::read(payload, state.config.storage.max_file_size).await?;
    let name = form.text("name").map(str::to_string);
    let picture = form.take_file("profilePictureFile");

    let profile = state
        .users()
        .update_profile(session.user_id, name, picture)
        .await?;
    HttpResponseBuilder::ok(profile)
}

/// 修改密码
#[utoipa::path(
    post,
    path = "/api/user/password",
    tag = "User",
    request_body = ChangePasswordRequest,
    responses(
        (status = 200, description = "密码已更新"),
        (status = 400, description = "当前密码错误、新密码不合法或两次输入不一致")
    )
)]
pub async fn change_password(
    state: web::Data<AppState>,
    session: SessionExtractor,
    request: web::Json<ChangePasswordRequest>,
) -> ActixResult<HttpResponse> {
    state
        .users()
        .change_password(session.user_id, request.into_inner())
        .await?;
    HttpResponseBuilder::message("Password updated successfully")
}

pub fn configure_user_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/user")
            .route("/me", web::get().to(me))
            .route("/profile", web::patch().to(update_profile))
            .route("/password", web::post().to(change_password)),
    );
}
