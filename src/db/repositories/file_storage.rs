// 文件存储元数据仓储实现

use crate::db::entities::{file_storage, prelude::*};
use crate::errors::OrgDeskError;
use sea_orm::{prelude::*, *};
use tracing::{info, instrument};
use uuid::Uuid;

/// 新文件元数据
#[derive(Debug, Clone)]
pub struct NewFileRecord {
    pub id: Uuid,
    pub file_name: String,
    pub file_path: String,
    pub file_type: String,
    pub file_size: i64,
    pub mime_type: Option<String>,
    pub is_secure: bool,
    pub access_token: Option<String>,
    pub token_expiry: Option<chrono::DateTime<chrono::Utc>>,
    pub organization_id: Option<Uuid>,
    pub user_id: Option<Uuid>,
}

/// 文件存储仓储
pub struct FileStorageRepository;

impl FileStorageRepository {
    #[instrument(skip(db, record), fields(file_name = %record.file_name))]
    pub async fn create(
        db: &DatabaseConnection,
        record: NewFileRecord,
    ) -> Result<file_storage::Model, OrgDeskError> {
        let model = file_storage::ActiveModel {
            id: Set(record.id),
            file_name: Set(record.file_name),
            file_path: Set(record.file_path),
            file_type: Set(record.file_type),
            file_size: Set(record.file_size),
            mime_type: Set(record.mime_type),
            is_secure: Set(record.is_secure),
            access_token: Set(record.access_token),
            token_expiry: Set(record.token_expiry.map(Into::into)),
            organization_id: Set(record.organization_id),
            user_id: Set(record.user_id),
            created_at: Set(chrono::Utc::now().into()),
        };

        let created = model.insert(db).await?;
        info!(file_id = %created.id, size = created.file_size, "文件元数据已保存");
        Ok(created)
    }

    #[instrument(skip(db))]
    pub async fn find_by_id(
        db: &DatabaseConnection,
        id: Uuid,
    ) -> Result<Option<file_storage::Model>, OrgDeskError> {
        Ok(FileStorage::find_by_id(id).one(db).await?)
    }

    #[instrument(skip(db))]
    pub async fn delete(db: &DatabaseConnection, id: Uuid) -> Result<(), OrgDeskError> {
        FileStorage::delete_by_id(id).exec(db).await?;
        info!(file_id = %id, "文件元数据已删除");
        Ok(())
    }
}
