// 文件存储服务
// 对象写入 MinIO/S3，元数据写入 file_storage 表

use crate::config::StorageConfig;
use crate::db::entities::file_storage;
use crate::db::repositories::{FileStorageRepository, NewFileRecord};
use crate::errors::OrgDeskError;
use bytes::Bytes;
use chrono::{DateTime, Duration, Utc};
use object_store::{aws::AmazonS3Builder, path::Path, ObjectStore, PutPayload};
use rand::RngCore;
use sea_orm::DatabaseConnection;
use serde::Serialize;
use std::sync::Arc;
use tracing::{info, instrument, warn};
use utoipa::ToSchema;
use uuid::Uuid;

pub const DEFAULT_MIME_TYPE: &str = "application/octet-stream";

/// 上传参数
#[derive(Debug, Clone, Default)]
pub struct UploadFileOptions {
    pub bytes: Bytes,
    pub file_name: String,
    pub mime_type: Option<String>,
    pub organization_id: Option<Uuid>,
    pub user_id: Option<Uuid>,
    pub is_secure: bool,
    /// 为空时使用配置中的默认有效期
    pub token_expiry_hours: Option<i64>,
}

/// 上传结果
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UploadResult {
    pub file_storage_id: Uuid,
    pub file_path: String,
    pub file_url: String,
    pub access_token: Option<String>,
    pub token_expiry: Option<DateTime<Utc>>,
}

/// 读取到的文件内容
#[derive(Debug, Clone)]
pub struct StoredFile {
    pub bytes: Bytes,
    pub mime_type: String,
    pub file_name: String,
}

/// 从 multipart 表单收到的文件
#[derive(Debug, Clone)]
pub struct IncomingFile {
    pub bytes: Bytes,
    pub file_name: String,
    pub mime_type: Option<String>,
}

/// 文件存储服务
pub struct FileStorageService {
    db: Arc<DatabaseConnection>,
    store: Option<Arc<dyn ObjectStore>>,
    config: StorageConfig,
}

impl FileStorageService {
    /// 使用给定的对象存储后端
    pub fn with_store(db: Arc<DatabaseConnection>, store: Arc<dyn ObjectStore>, config: StorageConfig) -> Self {
        Self {
            db,
            store: Some(store),
            config,
        }
    }

    /// 按配置构建 S3 客户端，缺少访问密钥时推迟到首次使用才报错
    pub fn from_config(db: Arc<DatabaseConnection>, config: StorageConfig) -> Result<Self, OrgDeskError> {
        if !config.has_credentials() {
            warn!("未配置存储访问密钥，文件上传与下载将不可用");
            return Ok(Self {
                db,
                store: None,
                config,
            });
        }

        let s3 = AmazonS3Builder::new()
            .with_endpoint(config.endpoint_url())
            .with_bucket_name(&config.bucket)
            .with_region(&config.region)
            .with_access_key_id(&config.access_key)
            .with_secret_access_key(&config.secret_key)
            .with_allow_http(!config.use_ssl)
            .with_virtual_hosted_style_request(false)
            .build()?;

        info!(endpoint = %config.endpoint_url(), bucket = %config.bucket, "对象存储客户端已创建");
        Ok(Self::with_store(db, Arc::new(s3), config))
    }

    fn store(&self) -> Result<&Arc<dyn ObjectStore>, OrgDeskError> {
        self.store.as_ref().ok_or_else(|| {
            OrgDeskError::configuration("STORAGE_ACCESS_KEY and STORAGE_SECRET_KEY must be set")
        })
    }

    pub fn config(&self) -> &StorageConfig {
        &self.config
    }

    /// 写入对象并保存元数据
    #[instrument(skip(self, options), fields(file_name = %options.file_name, size = options.bytes.len()))]
    pub async fn upload(&self, options: UploadFileOptions) -> Result<UploadResult, OrgDeskError> {
        let store = self.store()?;
        let id = Uuid::new_v4();
        let extension = file_extension(&options.file_name);
        let file_path = object_path(
            &format!("{}.{}", Uuid::new_v4(), extension),
            options.organization_id,
            options.user_id,
        );

        store
            .put(&Path::from(file_path.as_str()), PutPayload::from(options.bytes.clone()))
            .await?;

        let (access_token, token_expiry) = if options.is_secure {
            let hours = options
                .token_expiry_hours
                .unwrap_or(self.config.default_token_expiry_hours);
            (Some(generate_access_token()), Some(Utc::now() + Duration::hours(hours)))
        } else {
            (None, None)
        };

        let record = NewFileRecord {
            id,
            file_name: options.file_name.clone(),
            file_path: file_path.clone(),
            file_type: extension.to_string(),
            file_size: options.bytes.len() as i64,
            mime_type: options.mime_type.clone(),
            is_secure: options.is_secure,
            access_token: access_token.clone(),
            token_expiry,
            organization_id: options.organization_id,
            user_id: options.user_id,
        };
        FileStorageRepository::create(self.db.as_ref(), record).await?;

        let file_url = self.url_for(id, &file_path, access_token.as_deref());
        info!(file_id = %id, path = %file_path, secure = options.is_secure, "文件上传成功");

        Ok(UploadResult {
            file_storage_id: id,
            file_path,
            file_url,
            access_token,
            token_expiry,
        })
    }

    /// 读取文件，安全文件需要匹配且未过期的访问令牌
    #[instrument(skip(self, token))]
    pub async fn get_file(&self, id: Uuid, token: Option<&str>) -> Result<StoredFile, OrgDeskError> {
        let record = FileStorageRepository::find_by_id(self.db.as_ref(), id)
            .await?
            .ok_or_else(|| OrgDeskError::not_found("File not found"))?;

        check_access(&record, token, Utc::now())?;

        let bytes = self.read_object(&record.file_path).await?;
        Ok(StoredFile {
            bytes,
            mime_type: record
                .mime_type
                .unwrap_or_else(|| DEFAULT_MIME_TYPE.to_string()),
            file_name: record.file_name,
        })
    }

    /// 按对象路径读取原始内容
    pub async fn read_object(&self, file_path: &str) -> Result<Bytes, OrgDeskError> {
        let result = self.store()?.get(&Path::from(file_path)).await?;
        Ok(result.bytes().await?)
    }

    /// 读取元数据记录
    pub async fn find_record(&self, id: Uuid) -> Result<file_storage::Model, OrgDeskError> {
        FileStorageRepository::find_by_id(self.db.as_ref(), id)
            .await?
            .ok_or_else(|| OrgDeskError::not_found("File not found"))
    }

    /// 删除对象与元数据
    #[instrument(skip(self))]
    pub async fn delete_file(&self, id: Uuid) -> Result<(), OrgDeskError> {
        let record = self.find_record(id).await?;

        self.store()?.delete(&Path::from(record.file_path.as_str())).await?;
        FileStorageRepository::delete(self.db.as_ref(), id).await?;

        info!(file_id = %id, "文件已删除");
        Ok(())
    }

    /// 安全文件走应用内下载地址，公开文件直接指向存储
    pub fn url_for(&self, id: Uuid, file_path: &str, access_token: Option<&str>) -> String {
        match access_token {
            Some(token) => format!(
                "{}/api/files/{}?token={}",
                self.config.app_url.trim_end_matches('/'),
                id,
                token
            ),
            None => format!(
                "{}/{}/{}",
                self.config.storage_url(),
                self.config.bucket,
                file_path
            ),
        }
    }
}

/// 最后一个 `.` 之后的部分，没有 `.` 时为整个文件名
pub fn file_extension(file_name: &str) -> &str {
    file_name.rsplit('.').next().unwrap_or(file_name)
}

/// 组织优先，其次用户，否则放入 public
pub fn object_path(stored_name: &str, organization_id: Option<Uuid>, user_id: Option<Uuid>) -> String {
    match (organization_id, user_id) {
        (Some(org), _) => format!("organizations/{}/{}", org, stored_name),
        (None, Some(user)) => format!("users/{}/{}", user, stored_name),
        (None, None) => format!("public/{}", stored_name),
    }
}

/// 32 字节随机数的十六进制编码
pub fn generate_access_token() -> String {
    let mut bytes = [0u8; 32];
    rand::thread_rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}

/// 校验安全文件的访问令牌
pub fn check_access(
    record: &file_storage::Model,
    token: Option<&str>,
    now: DateTime<Utc>,
) -> Result<(), OrgDeskError> {
    if !record.is_secure {
        return Ok(());
    }

    match (token, record.access_token.as_deref()) {
        (Some(given), Some(expected)) if given == expected => {}
        _ => return Err(OrgDeskError::unauthorized("Invalid or missing access token")),
    }

    if let Some(expiry) = record.token_expiry {
        if expiry < now {
            return Err(OrgDeskError::unauthorized("Access token has expired"));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;
    use object_store::memory::InMemory;
    use sea_orm::{DatabaseBackend, MockDatabase};

    fn storage_config() -> StorageConfig {
        let mut config = AppConfig::default().storage;
        config.use_ssl = false;
        config
    }

    fn record_from(result: &UploadResult, options: &UploadFileOptions) -> file_storage::Model {
        file_storage::Model {
            id: result.file_storage_id,
            file_name: options.file_name.clone(),
            file_path: result.file_path.clone(),
            file_type: file_extension(&options.file_name).to_string(),
            file_size: options.bytes.len() as i64,
            mime_type: options.mime_type.clone(),
            is_secure: options.is_secure,
            access_token: result.access_token.clone(),
            token_expiry: result.token_expiry.map(Into::into),
            organization_id: options.organization_id,
            user_id: options.user_id,
            created_at: Utc::now().into(),
        }
    }

    #[test]
    fn test_file_extension() {
        assert_eq!(file_extension("report.final.pdf"), "pdf");
        assert_eq!(file_extension("README"), "README");
    }

    #[test]
    fn test_object_path_prefix() {
        let org = Uuid::new_v4();
        let user = Uuid::new_v4();

        assert_eq!(object_path("a.png", Some(org), Some(user)), format!("organizations/{}/a.png", org));
        assert_eq!(object_path("a.png", None, Some(user)), format!("users/{}/a.png", user));
        assert_eq!(object_path("a.png", None, None), "public/a.png");
    }

    #[test]
    fn test_access_token_format() {
        let token = generate_access_token();
        assert_eq!(token.len(), 64);
        assert!(token.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[tokio::test]
    async fn test_upload_then_get_round_trip() {
        let store: Arc<dyn ObjectStore> = Arc::new(InMemory::new());
        let options = UploadFileOptions {
            bytes: Bytes::from_static(b"hello knowledge base"),
            file_name: "notes.txt".to_string(),
            mime_type: Some("text/plain".to_string()),
            user_id: Some(Uuid::new_v4()),
            is_secure: true,
            ..Default::default()
        };

        let placeholder = file_storage::Model {
            id: Uuid::new_v4(),
            file_name: String::new(),
            file_path: String::new(),
            file_type: String::new(),
            file_size: 0,
            mime_type: None,
            is_secure: false,
            access_token: None,
            token_expiry: None,
            organization_id: None,
            user_id: None,
            created_at: Utc::now().into(),
        };
        let upload_db = Arc::new(MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![placeholder]])
            .into_connection());
        let uploader = FileStorageService::with_store(upload_db, store.clone(), storage_config());
        let result = uploader.upload(options.clone()).await.unwrap();

        assert!(result.file_path.starts_with("users/"));
        assert!(result.file_path.ends_with(".txt"));
        let token = result.access_token.clone().unwrap();
        assert_eq!(
            result.file_url,
            format!("http://localhost:3000/api/files/{}?token={}", result.file_storage_id, token)
        );

        let read_db = Arc::new(MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![record_from(&result, &options)]])
            .into_connection());
        let reader = FileStorageService::with_store(read_db, store, storage_config());
        let file = reader.get_file(result.file_storage_id, Some(&token)).await.unwrap();

        assert_eq!(file.bytes, options.bytes);
        assert_eq!(file.mime_type, "text/plain");
        assert_eq!(file.file_name, "notes.txt");
    }

    #[tokio::test]
    async fn test_get_file_rejects_bad_token() {
        let options = UploadFileOptions {
            file_name: "secret.pdf".to_string(),
            is_secure: true,
            ..Default::default()
        };
        let result = UploadResult {
            file_storage_id: Uuid::new_v4(),
            file_path: "public/x.pdf".to_string(),
            file_url: String::new(),
            access_token: Some("expected".to_string()),
            token_expiry: Some(Utc::now() + Duration::hours(1)),
        };

        let db = Arc::new(MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![record_from(&result, &options)]])
            .into_connection());
        let service = FileStorageService::with_store(db, Arc::new(InMemory::new()), storage_config());

        let err = service.get_file(result.file_storage_id, Some("wrong")).await.unwrap_err();
        assert_eq!(err.status_code(), 401);
        assert_eq!(err.message(), "Invalid or missing access token");
    }

    #[test]
    fn test_expired_token() {
        let mut result = UploadResult {
            file_storage_id: Uuid::new_v4(),
            file_path: "public/x.pdf".to_string(),
            file_url: String::new(),
            access_token: Some("t".to_string()),
            token_expiry: Some(Utc::now() - Duration::hours(1)),
        };
        let options = UploadFileOptions {
            file_name: "x.pdf".to_string(),
            is_secure: true,
            ..Default::default()
        };

        let err = check_access(&record_from(&result, &options), Some("t"), Utc::now()).unwrap_err();
        assert_eq!(err.message(), "Access token has expired");

        result.token_expiry = None;
        assert!(check_access(&record_from(&result, &options), Some("t"), Utc::now()).is_ok());
        assert!(check_access(&record_from(&result, &options), None, Utc::now()).is_err());
    }

    #[tokio::test]
    async fn test_public_url_and_missing_credentials() {
        let db = Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection());
        let service = FileStorageService::from_config(db, storage_config()).unwrap();

        assert_eq!(
            service.url_for(Uuid::new_v4(), "public/logo.png", None),
            "http://localhost:9000/ims-files/public/logo.png"
        );

        let err = service.upload(UploadFileOptions::default()).await.unwrap_err();
        assert_eq!(err.error_code(), "CONFIGURATION_ERROR");
    }
}
