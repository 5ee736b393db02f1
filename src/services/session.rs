// 会话服务
// 签发与校验会话令牌，处理密码哈希

use crate::config::{AppConfig, SecurityConfig};
use crate::errors::OrgDeskError;
use actix_web::cookie::{time::Duration as CookieDuration, Cookie, SameSite};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use uuid::Uuid;

/// 会话令牌载荷
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionClaims {
    pub user_id: Uuid,
    pub iat: i64,
    pub exp: i64,
}

/// 会话管理器
#[derive(Clone)]
pub struct SessionManager {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    ttl: Duration,
    cookie_name: String,
    secure_cookie: bool,
    bcrypt_cost: u32,
}

impl SessionManager {
    pub fn new(security: &SecurityConfig, secure_cookie: bool) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(security.jwt_secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(security.jwt_secret.as_bytes()),
            ttl: Duration::days(security.session_ttl_days),
            cookie_name: security.session_cookie.clone(),
            secure_cookie,
            bcrypt_cost: security.bcrypt_cost,
        }
    }

    /// 生产环境下 Cookie 带 Secure 标志
    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(&config.security, config.is_production())
    }

    pub fn cookie_name(&self) -> &str {
        &self.cookie_name
    }

    /// 签发会话令牌
    pub fn issue(&self, user_id: Uuid) -> Result<String, OrgDeskError> {
        self.issue_token_at(user_id, Utc::now().timestamp())
    }

    /// 以指定签发时间签发令牌
    pub fn issue_token_at(&self, user_id: Uuid, issued_at: i64) -> Result<String, OrgDeskError> {
        let claims = SessionClaims {
            user_id,
            iat: issued_at,
            exp: issued_at + self.ttl.num_seconds(),
        };

        Ok(encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)?)
    }

    /// 校验令牌，签名错误、格式错误或过期均返回 `None`
    pub fn verify(&self, token: &str) -> Option<SessionClaims> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;

        match decode::<SessionClaims>(token, &self.decoding_key, &validation) {
            Ok(data) => Some(data.claims),
            Err(e) => {
                debug!(error = %e, "会话令牌无效");
                None
            }
        }
    }

    /// 会话 Cookie
    pub fn session_cookie(&self, token: String) -> Cookie<'static> {
        Cookie::build(self.cookie_name.clone(), token)
            .path("/")
            .http_only(true)
            .same_site(SameSite::Lax)
            .secure(self.secure_cookie)
            .max_age(CookieDuration::seconds(self.ttl.num_seconds()))
            .finish()
    }

    /// 用于清除会话的过期 Cookie
    pub fn clear_cookie(&self) -> Cookie<'static> {
        let mut cookie = Cookie::build(self.cookie_name.clone(), "")
            .path("/")
            .http_only(true)
            .same_site(SameSite::Lax)
            .secure(self.secure_cookie)
            .finish();
        cookie.make_removal();
        cookie
    }

    pub fn hash_password(&self, password: &str) -> Result<String, OrgDeskError> {
        Ok(bcrypt::hash(password, self.bcrypt_cost)?)
    }
}

/// 校验密码，哈希格式错误时同样视为不匹配
pub fn verify_password(password: &str, hash: &str) -> bool {
    match bcrypt::verify(password, hash) {
        Ok(matched) => matched,
        Err(e) => {
            warn!(error = %e, "密码哈希校验失败");
            false
        }
    }
}
