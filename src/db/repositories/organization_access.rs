// 组织成员访问仓储实现

use crate::db::entities::{organization_access, prelude::*, user};
use crate::errors::OrgDeskError;
use orgdesk_common::ListQuery;
use sea_orm::sea_query::Func;
use sea_orm::{prelude::*, *};
use tracing::{info, instrument};
use uuid::Uuid;

/// 组织成员访问仓储
pub struct OrganizationAccessRepository;

/// 姓名或邮箱包含关键字，不区分大小写
fn member_search(q: &str) -> Condition {
    let pattern = format!("%{}%", q.to_lowercase());
    Condition::any()
        .add(Expr::expr(Func::lower(Expr::col((user::Entity, user::Column::Name)))).like(&pattern))
        .add(Expr::expr(Func::lower(Expr::col((user::Entity, user::Column::Email)))).like(&pattern))
}

impl OrganizationAccessRepository {
    #[instrument(skip(db))]
    pub async fn create<C: ConnectionTrait>(
        db: &C,
        user_id: Uuid,
        organization_id: Uuid,
        legacy_role: LegacyRole,
        role_id: Option<Uuid>,
    ) -> Result<organization_access::Model, OrgDeskError> {
        let model = organization_access::ActiveModel {
            id: Set(Uuid::new_v4()),
            user_id: Set(user_id),
            organization_id: Set(organization_id),
            legacy_role: Set(legacy_role),
            role_id: Set(role_id),
            created_at: Set(chrono::Utc::now().into()),
        };

        let created = model.insert(db).await?;
        info!(
            user_id = %user_id,
            organization_id = %organization_id,
            role = %legacy_role,
            "成员访问记录已创建"
        );
        Ok(created)
    }

    /// 查找用户在组织中的访问记录
    #[instrument(skip(db))]
    pub async fn find<C: ConnectionTrait>(
        db: &C,
        user_id: Uuid,
        organization_id: Uuid,
    ) -> Result<Option<organization_access::Model>, OrgDeskError> {
        Ok(OrganizationAccess::find()
            .filter(organization_access::Column::UserId.eq(user_id))
            .filter(organization_access::Column::OrganizationId.eq(organization_id))
            .one(db)
            .await?)
    }

    #[instrument(skip(db))]
    pub async fn find_by_id(
        db: &DatabaseConnection,
        id: Uuid,
    ) -> Result<Option<organization_access::Model>, OrgDeskError> {
        Ok(OrganizationAccess::find_by_id(id).one(db).await?)
    }

    /// 用户最早加入的组织访问记录
    #[instrument(skip(db))]
    pub async fn first_for_user(
        db: &DatabaseConnection,
        user_id: Uuid,
    ) -> Result<Option<organization_access::Model>, OrgDeskError> {
        Ok(OrganizationAccess::find()
            .filter(organization_access::Column::UserId.eq(user_id))
            .order_by_asc(organization_access::Column::CreatedAt)
            .one(db)
            .await?)
    }

    /// 分页列出组织成员，按加入时间倒序
    #[instrument(skip(db))]
    pub async fn list_members(
        db: &DatabaseConnection,
        organization_id: Uuid,
        query: &ListQuery,
    ) -> Result<(Vec<(organization_access::Model, Option<user::Model>)>, u64), OrgDeskError> {
        let mut select = OrganizationAccess::find()
            .filter(organization_access::Column::OrganizationId.eq(organization_id))
            .find_also_related(User)
            .order_by_desc(organization_access::Column::CreatedAt);

        if query.has_search() {
            select = select.filter(member_search(&query.q));
        }

        let paginator = select.paginate(db, query.page_size);
        let total = paginator.num_items().await?;
        let rows = paginator.fetch_page(query.page - 1).await?;

        Ok((rows, total))
    }

    #[instrument(skip(db, existing))]
    pub async fn update_role(
        db: &DatabaseConnection,
        existing: organization_access::Model,
        legacy_role: LegacyRole,
    ) -> Result<organization_access::Model, OrgDeskError> {
        let mut model: organization_access::ActiveModel = existing.into();
        model.legacy_role = Set(legacy_role);
        Ok(model.update(db).await?)
    }

    #[instrument(skip(db))]
    pub async fn delete(db: &DatabaseConnection, id: Uuid) -> Result<(), OrgDeskError> {
        OrganizationAccess::delete_by_id(id).exec(db).await?;
        info!(access_id = %id, "成员访问记录已删除");
        Ok(())
    }

    /// 是否有成员使用该自定义角色
    #[instrument(skip(db))]
    pub async fn is_role_assigned(
        db: &DatabaseConnection,
        role_id: Uuid,
    ) -> Result<bool, OrgDeskError> {
        Ok(OrganizationAccess::find()
            .filter(organization_access::Column::RoleId.eq(role_id))
            .one(db)
            .await?
            .is_some())
    }
}
