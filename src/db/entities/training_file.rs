// 训练文件实体定义

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// 训练任务状态，训练文件与训练网站共用
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize, ToSchema)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "training_status")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TrainingStatus {
    #[sea_orm(string_value = "PROCESSING")]
    Processing,
    #[sea_orm(string_value = "COMPLETED")]
    Completed,
    #[sea_orm(string_value = "FAILED")]
    Failed,
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize, ToSchema)]
#[schema(as = TrainingFile)]
#[sea_orm(table_name = "training_files")]
#[serde(rename_all = "camelCase")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    pub knowledge_base_id: Uuid,

    pub file_storage_id: Uuid,

    pub status: TrainingStatus,

    #[sea_orm(column_type = "Text", nullable)]
    pub error_message: Option<String>,

    #[sea_orm(nullable)]
    #[schema(value_type = Option<String>)]
    pub processed_at: Option<DateTimeWithTimeZone>,

    #[schema(value_type = String)]
    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::knowledge_base::Entity",
        from = "Column::KnowledgeBaseId",
        to = "super::knowledge_base::Column::Id",
        on_delete = "Cascade"
    )]
    KnowledgeBase,

    #[sea_orm(
        belongs_to = "super::file_storage::Entity",
        from = "Column::FileStorageId",
        to = "super::file_storage::Column::Id",
        on_delete = "Cascade"
    )]
    FileStorage,
}

impl Related<super::knowledge_base::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::KnowledgeBase.def()
    }
}

impl Related<super::file_storage::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::FileStorage.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
