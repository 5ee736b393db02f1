// 文件存储元数据实体

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// 对象存储中一个文件的元数据
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize, ToSchema)]
#[schema(as = FileStorage)]
#[sea_orm(table_name = "file_storage")]
#[serde(rename_all = "camelCase")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    /// 上传时的原始文件名
    #[sea_orm(column_type = "String(Some(500))")]
    pub file_name: String,

    /// 存储桶内的对象路径
    #[sea_orm(column_type = "String(Some(1000))")]
    pub file_path: String,

    /// 扩展名
    #[sea_orm(column_type = "String(Some(100))")]
    pub file_type: String,

    pub file_size: i64,

    #[sea_orm(column_type = "String(Some(255))", nullable)]
    pub mime_type: Option<String>,

    pub is_secure: bool,

    #[sea_orm(column_type = "String(Some(128))", nullable)]
    #[serde(skip_serializing)]
    pub access_token: Option<String>,

    #[sea_orm(nullable)]
    #[schema(value_type = Option<String>)]
    pub token_expiry: Option<DateTimeWithTimeZone>,

    #[sea_orm(nullable)]
    pub organization_id: Option<Uuid>,

    #[sea_orm(nullable)]
    pub user_id: Option<Uuid>,

    #[schema(value_type = String)]
    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::organization::Entity",
        from = "Column::OrganizationId",
        to = "super::organization::Column::Id",
        on_delete = "SetNull"
    )]
    Organization,

    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::UserId",
        to = "super::user::Column::Id",
        on_delete = "SetNull"
    )]
    User,

    #[sea_orm(has_many = "super::training_file::Entity")]
    TrainingFiles,
}

impl Related<super::organization::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Organization.def()
    }
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl Related<super::training_file::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::TrainingFiles.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
