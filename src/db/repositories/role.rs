// 角色与权限仓储实现

use crate::db::entities::{permission, prelude::*, role, role_permission};
use crate::errors::OrgDeskError;
use sea_orm::{prelude::*, *};
use tracing::{info, instrument};
use uuid::Uuid;

/// 创建或替换权限时使用的权限标志
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PermissionInput {
    pub resource: String,
    pub can_create: bool,
    pub can_read: bool,
    pub can_update: bool,
    pub can_delete: bool,
}

/// 角色仓储
pub struct RoleRepository;

impl RoleRepository {
    /// 所有角色及其权限，最新创建的在前
    #[instrument(skip(db))]
    pub async fn list_with_permissions(
        db: &DatabaseConnection,
    ) -> Result<Vec<(role::Model, Vec<permission::Model>)>, OrgDeskError> {
        Ok(Role::find()
            .order_by_desc(role::Column::CreatedAt)
            .find_with_related(Permission)
            .all(db)
            .await?)
    }

    #[instrument(skip(db))]
    pub async fn find_by_id<C: ConnectionTrait>(
        db: &C,
        id: Uuid,
    ) -> Result<Option<role::Model>, OrgDeskError> {
        Ok(Role::find_by_id(id).one(db).await?)
    }

    #[instrument(skip(db))]
    pub async fn find_by_name<C: ConnectionTrait>(
        db: &C,
        name: &str,
    ) -> Result<Option<role::Model>, OrgDeskError> {
        Ok(Role::find()
            .filter(role::Column::Name.eq(name))
            .one(db)
            .await?)
    }

    /// 角色关联的权限，按关联顺序返回
    #[instrument(skip(db))]
    pub async fn permissions_for_role<C: ConnectionTrait>(
        db: &C,
        role_id: Uuid,
    ) -> Result<Vec<permission::Model>, OrgDeskError> {
        Ok(Permission::find()
            .inner_join(RolePermission)
            .filter(role_permission::Column::RoleId.eq(role_id))
            .all(db)
            .await?)
    }

    #[instrument(skip(db))]
    pub async fn create<C: ConnectionTrait>(
        db: &C,
        name: &str,
        is_custom: bool,
    ) -> Result<role::Model, OrgDeskError> {
        let now = chrono::Utc::now();
        let model = role::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(name.to_string()),
            is_custom: Set(is_custom),
            created_at: Set(now.into()),
            updated_at: Set(now.into()),
        };

        let created = model.insert(db).await?;
        info!(role_id = %created.id, name = %created.name, "角色创建成功");
        Ok(created)
    }

    #[instrument(skip(db, existing))]
    pub async fn rename<C: ConnectionTrait>(
        db: &C,
        existing: role::Model,
        name: String,
    ) -> Result<role::Model, OrgDeskError> {
        let mut model: role::ActiveModel = existing.into();
        model.name = Set(name);
        model.updated_at = Set(chrono::Utc::now().into());
        Ok(model.update(db).await?)
    }

    /// 创建权限记录并关联到角色
    #[instrument(skip(db, input))]
    pub async fn attach_permission<C: ConnectionTrait>(
        db: &C,
        role_id: Uuid,
        input: &PermissionInput,
    ) -> Result<permission::Model, OrgDeskError> {
        let created = permission::ActiveModel {
            id: Set(Uuid::new_v4()),
            resource: Set(input.resource.clone()),
            can_create: Set(input.can_create),
            can_read: Set(input.can_read),
            can_update: Set(input.can_update),
            can_delete: Set(input.can_delete),
            created_at: Set(chrono::Utc::now().into()),
        }
        .insert(db)
        .await?;

        role_permission::ActiveModel {
            id: Set(Uuid::new_v4()),
            role_id: Set(role_id),
            permission_id: Set(created.id),
        }
        .insert(db)
        .await?;

        Ok(created)
    }

    /// 删除角色的全部权限关联
    #[instrument(skip(db))]
    pub async fn detach_permissions<C: ConnectionTrait>(
        db: &C,
        role_id: Uuid,
    ) -> Result<u64, OrgDeskError> {
        let result = RolePermission::delete_many()
            .filter(role_permission::Column::RoleId.eq(role_id))
            .exec(db)
            .await?;
        Ok(result.rows_affected)
    }

    #[instrument(skip(db))]
    pub async fn delete<C: ConnectionTrait>(db: &C, role_id: Uuid) -> Result<(), OrgDeskError> {
        Role::delete_by_id(role_id).exec(db).await?;
        info!(role_id = %role_id, "角色已删除");
        Ok(())
    }
}
