// 认证 API 处理器

use actix_web::{web, HttpResponse, Result as ActixResult};

use crate::api::responses::{ApiResponse, HttpResponseBuilder};
use crate::api::state::AppState;
use crate::services::auth::{ForgotPasswordRequest, LoginRequest, SignupRequest};

/// 注册
#[utoipa::path(
    post,
    path = "/api/auth/signup",
    tag = "Auth",
    request_body = SignupRequest,
    responses(
        (status = 201, description = "注册成功，写入会话 Cookie", body = AuthenticatedUser),
        (status = 400, description = "邮箱、密码或姓名不合法"),
        (status = 409, description = "邮箱已被使用")
    )
)]
pub async fn signup(state: web::Data<AppState>, request: web::Json<SignupRequest>) -> ActixResult<HttpResponse> {
    let (user, token) = state.auth().signup(request.into_inner()).await?;
    HttpResponseBuilder::created_with_cookie(user, state.sessions.session_cookie(token))
}

/// 登录
#[utoipa::path(
    post,
    path = "/api/auth/login",
    tag = "Auth",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "登录成功，写入会话 Cookie", body = AuthenticatedUser),
        (status = 401, description = "凭据无效")
    )
)]
pub async fn login(state: web::Data<AppState>, request: web::Json<LoginRequest>) -> ActixResult<HttpResponse> {
    let (user, token) = state.auth().login(request.into_inner()).await?;
    HttpResponseBuilder::ok_with_cookie(user, state.sessions.session_cookie(token))
}

/// 登出
#[utoipa::path(
    post,
    path = "/api/auth/logout",
    tag = "Auth",
    responses((status = 200, description = "会话 Cookie 已清除"))
)]
pub async fn logout(state: web::Data<AppState>) -> ActixResult<HttpResponse> {
    Ok(HttpResponse::Ok()
        .cookie(state.sessions.clear_cookie())
        .json(ApiResponse::message_only("Logged out")))
}

/// 忘记密码
#[utoipa::path(
    post,
    path = "/api/auth/forgot-password",
    tag = "Auth",
    request_body = ForgotPasswordRequest,
    responses(
        (status = 200, description = "无论账号是否存在都返回同一条消息"),
        (status = 400, description = "邮箱为空")
    )
)]
pub async fn forgot_password(
    state: web::Data<AppState>,
    request: web::Json<ForgotPasswordRequest>,
) -> ActixResult<HttpResponse> {
    let message = state.auth().forgot_password(request.into_inner()).await?;
    HttpResponseBuilder::message(message)
}

pub fn configure_auth_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/auth")
            .route("/signup", web::post().to(signup))
            .route("/login", web::post().to(login))
            .route("/logout", web::post().to(logout))
            .route("/forgot-password", web::post().to(forgot_password)),
    );
}
