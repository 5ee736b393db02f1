// 用户实体定义

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// 用户实体
///
/// 密码哈希与重置令牌不参与序列化，接口层使用 `UserSummary` 输出。
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "users")]
#[serde(rename_all = "camelCase")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    #[sea_orm(column_type = "String(Some(255))", unique)]
    pub email: String,

    #[sea_orm(column_type = "String(Some(255))", nullable)]
    pub name: Option<String>,

    /// 邀请创建或第三方登录的用户可能没有密码
    #[sea_orm(column_type = "String(Some(255))", nullable)]
    #[serde(skip_serializing)]
    pub password_hash: Option<String>,

    #[sea_orm(column_type = "Text", nullable)]
    pub profile_picture_url: Option<String>,

    #[sea_orm(column_type = "String(Some(255))", nullable)]
    #[serde(skip_serializing)]
    pub reset_token: Option<String>,

    #[sea_orm(nullable)]
    #[serde(skip_serializing)]
    pub reset_token_expiry: Option<DateTimeWithTimeZone>,

    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::organization_access::Entity")]
    Access,
}

impl Related<super::organization_access::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Access.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
