// 知识库实体定义

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// 知识库状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize, ToSchema)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "knowledge_base_status")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum KnowledgeBaseStatus {
    #[sea_orm(string_value = "PENDING")]
    Pending,
    #[sea_orm(string_value = "CREATING")]
    Creating,
    #[sea_orm(string_value = "READY")]
    Ready,
    #[sea_orm(string_value = "ERROR")]
    Error,
}

/// 知识库实体，每个组织至多一个
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize, ToSchema)]
#[schema(as = KnowledgeBase)]
#[sea_orm(table_name = "knowledge_bases")]
#[serde(rename_all = "camelCase")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    #[sea_orm(unique)]
    pub organization_id: Uuid,

    #[sea_orm(column_type = "String(Some(255))")]
    pub name: String,

    #[sea_orm(column_type = "Text", nullable)]
    pub description: Option<String>,

    /// 外部向量库 ID，创建失败时为空
    #[sea_orm(column_type = "String(Some(255))", nullable)]
    pub vector_store_id: Option<String>,

    pub status: KnowledgeBaseStatus,

    #[schema(value_type = String)]
    pub created_at: DateTimeWithTimeZone,
    #[schema(value_type = String)]
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::organization::Entity",
        from = "Column::OrganizationId",
        to = "super::organization::Column::Id",
        on_delete = "Cascade"
    )]
    Organization,

    #[sea_orm(has_many = "super::training_file::Entity")]
    TrainingFiles,

    #[sea_orm(has_many = "super::training_website::Entity")]
    TrainingWebsites,

    #[sea_orm(has_many = "super::agent::Entity")]
    Agents,
}

impl Related<super::organization::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Organization.def()
    }
}

impl Related<super::training_file::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::TrainingFiles.def()
    }
}

impl Related<super::training_website::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::TrainingWebsites.def()
    }
}

impl Related<super::agent::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Agents.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
