// 训练记录仓储实现

use crate::db::entities::{prelude::*, training_file, training_website};
use crate::errors::OrgDeskError;
use sea_orm::{prelude::*, *};
use tracing::{info, instrument};
use uuid::Uuid;

/// 训练记录仓储，覆盖文件与网站两类训练
pub struct TrainingRepository;

/// 并发提交同一训练目标时，唯一约束冲突按重复训练处理
fn already_training(err: OrgDeskError, field: &str, message: &str) -> OrgDeskError {
    match err {
        OrgDeskError::Conflict { .. } => OrgDeskError::validation(field, message),
        other => other,
    }
}

/// 只有成功完成的训练才记录处理时间
fn processed_at(status: TrainingStatus) -> Option<DateTimeWithTimeZone> {
    (status == TrainingStatus::Completed).then(|| chrono::Utc::now().into())
}

impl TrainingRepository {
    /// 同一文件在该知识库下的训练记录，不论状态
    #[instrument(skip(db))]
    pub async fn find_file(
        db: &DatabaseConnection,
        knowledge_base_id: Uuid,
        file_storage_id: Uuid,
    ) -> Result<Option<training_file::Model>, OrgDeskError> {
        Ok(TrainingFile::find()
            .filter(training_file::Column::KnowledgeBaseId.eq(knowledge_base_id))
            .filter(training_file::Column::FileStorageId.eq(file_storage_id))
            .one(db)
            .await?)
    }

    #[instrument(skip(db))]
    pub async fn create_file(
        db: &DatabaseConnection,
        knowledge_base_id: Uuid,
        file_storage_id: Uuid,
    ) -> Result<training_file::Model, OrgDeskError> {
        let created = training_file::ActiveModel {
            id: Set(Uuid::new_v4()),
            knowledge_base_id: Set(knowledge_base_id),
            file_storage_id: Set(file_storage_id),
            status: Set(TrainingStatus::Processing),
            error_message: Set(None),
            processed_at: Set(None),
            created_at: Set(chrono::Utc::now().into()),
        }
        .insert(db)
        .await
        .map_err(|e| already_training(e.into(), "fileStorageId", "File is already being trained"))?;

        info!(training_id = %created.id, "文件训练记录已创建");
        Ok(created)
    }

    /// 写入文件训练的最终状态
    #[instrument(skip(db))]
    pub async fn finish_file(
        db: &DatabaseConnection,
        id: Uuid,
        status: TrainingStatus,
        error_message: Option<String>,
    ) -> Result<(), OrgDeskError> {
        let mut update = TrainingFile::update_many()
            .col_expr(training_file::Column::Status, Expr::value(status))
            .col_expr(training_file::Column::ErrorMessage, Expr::value(error_message));
        if let Some(at) = processed_at(status) {
            update = update.col_expr(training_file::Column::ProcessedAt, Expr::value(at));
        }
        update
            .filter(training_file::Column::Id.eq(id))
            .exec(db)
            .await?;
        Ok(())
    }

    #[instrument(skip(db))]
    pub async fn list_files(
        db: &DatabaseConnection,
        knowledge_base_id: Uuid,
    ) -> Result<Vec<(training_file::Model, Option<FileStorageModel>)>, OrgDeskError> {
        Ok(TrainingFile::find()
            .filter(training_file::Column::KnowledgeBaseId.eq(knowledge_base_id))
            .order_by_desc(training_file::Column::CreatedAt)
            .find_also_related(FileStorage)
            .all(db)
            .await?)
    }

    /// 同一网址在该知识库下的训练记录，不论状态
    #[instrument(skip(db))]
    pub async fn find_website(
        db: &DatabaseConnection,
        knowledge_base_id: Uuid,
        url: &str,
    ) -> Result<Option<training_website::Model>, OrgDeskError> {
        Ok(TrainingWebsite::find()
            .filter(training_website::Column::KnowledgeBaseId.eq(knowledge_base_id))
            .filter(training_website::Column::Url.eq(url))
            .one(db)
            .await?)
    }

    #[instrument(skip(db))]
    pub async fn create_website(
        db: &DatabaseConnection,
        knowledge_base_id: Uuid,
        url: &str,
    ) -> Result<training_website::Model, OrgDeskError> {
        let created = training_website::ActiveModel {
            id: Set(Uuid::new_v4()),
            knowledge_base_id: Set(knowledge_base_id),
            url: Set(url.to_string()),
            status: Set(TrainingStatus::Processing),
            error_message: Set(None),
            processed_at: Set(None),
            created_at: Set(chrono::Utc::now().into()),
        }
        .insert(db)
        .await
        .map_err(|e| already_training(e.into(), "url", "URL is already being trained"))?;

        info!(training_id = %created.id, url = %url, "网站训练记录已创建");
        Ok(created)
    }

    #[instrument(skip(db))]
    pub async fn finish_website(
        db: &DatabaseConnection,
        id: Uuid,
        status: TrainingStatus,
        error_message: Option<String>,
    ) -> Result<(), OrgDeskError> {
        let mut update = TrainingWebsite::update_many()
            .col_expr(training_website::Column::Status, Expr::value(status))
            .col_expr(training_website::Column::ErrorMessage, Expr::value(error_message));
        if let Some(at) = processed_at(status) {
            update = update.col_expr(training_website::Column::ProcessedAt, Expr::value(at));
        }
        update
            .filter(training_website::Column::Id.eq(id))
            .exec(db)
            .await?;
        Ok(())
    }

    #[instrument(skip(db))]
    pub async fn list_websites(
        db: &DatabaseConnection,
        knowledge_base_id: Uuid,
    ) -> Result<Vec<training_website::Model>, OrgDeskError> {
        Ok(TrainingWebsite::find()
            .filter(training_website::Column::KnowledgeBaseId.eq(knowledge_base_id))
            .order_by_desc(training_website::Column::CreatedAt)
            .all(db)
            .await?)
    }

    /// 删除知识库下全部训练记录，返回 (文件数, 网站数)
    #[instrument(skip(db))]
    pub async fn clear(
        db: &DatabaseConnection,
        knowledge_base_id: Uuid,
    ) -> Result<(u64, u64), OrgDeskError> {
        let files = TrainingFile::delete_many()
            .filter(training_file::Column::KnowledgeBaseId.eq(knowledge_base_id))
            .exec(db)
            .await?;
        let websites = TrainingWebsite::delete_many()
            .filter(training_website::Column::KnowledgeBaseId.eq(knowledge_base_id))
            .exec(db)
            .await?;

        info!(
            knowledge_base_id = %knowledge_base_id,
            files = files.rows_affected,
            websites = websites.rows_affected,
            "训练记录已清空"
        );
        Ok((files.rows_affected, websites.rows_affected))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unique_violation_means_already_training() {
        let err = already_training(
            OrgDeskError::conflict("Resource already exists"),
            "url",
            "URL is already being trained",
        );
        assert_eq!(err.status_code(), 400);
        assert_eq!(err.message(), "URL is already being trained");

        let err = already_training(OrgDeskError::database("连接断开"), "url", "URL is already being trained");
        assert_eq!(err.error_code(), "DATABASE_ERROR");
    }

    #[tokio::test]
    async fn test_failed_training_keeps_processed_at_empty() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_exec_results([
                MockExecResult { last_insert_id: 0, rows_affected: 1 },
                MockExecResult { last_insert_id: 0, rows_affected: 1 },
            ])
            .into_connection();

        TrainingRepository::finish_file(&db, Uuid::new_v4(), TrainingStatus::Failed, Some("boom".to_string()))
            .await
            .unwrap();
        TrainingRepository::finish_file(&db, Uuid::new_v4(), TrainingStatus::Completed, None)
            .await
            .unwrap();

        let log = db.into_transaction_log();
        assert_eq!(log.len(), 2);
        assert!(!format!("{:?}", log[0]).contains("processed_at"));
        assert!(format!("{:?}", log[1]).contains("processed_at"));
    }
}
