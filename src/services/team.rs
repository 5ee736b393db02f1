// 团队成员服务

use crate::db::entities::{organization_access, user, LegacyRole};
use crate::db::repositories::{OrganizationAccessRepository, UserRepository};
use crate::errors::OrgDeskError;
use crate::services::rbac::{PermissionAction, PermissionService};
use crate::services::session::SessionManager;
use orgdesk_common::{ListQuery, PaginatedResponse};
use sea_orm::DatabaseConnection;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument};
use utoipa::ToSchema;
use uuid::Uuid;

/// 受邀用户首次登录使用的密码
pub const DEFAULT_MEMBER_PASSWORD: &str = "123456";
const USER_RESOURCE: &str = "USER";
const MEMBER_NOT_FOUND: &str = "Unauthorized or member not found";

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct MemberUser {
    pub id: Uuid,
    pub name: Option<String>,
    pub email: String,
}

/// 团队成员
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TeamMember {
    pub id: Uuid,
    pub user: Option<MemberUser>,
    pub role: LegacyRole,
    #[schema(value_type = String)]
    pub created_at: chrono::DateTime<chrono::FixedOffset>,
}

impl TeamMember {
    fn from_row(access: organization_access::Model, user: Option<user::Model>) -> Self {
        Self {
            id: access.id,
            user: user.map(|u| MemberUser {
                id: u.id,
                name: u.name,
                email: u.email,
            }),
            role: access.legacy_role,
            created_at: access.created_at,
        }
    }
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct InviteMemberRequest {
    #[serde(default)]
    pub email: String,
    pub name: Option<String>,
    pub role: Option<String>,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct UpdateMemberRequest {
    #[serde(default)]
    pub role: String,
}

/// 团队成员服务
pub struct TeamService {
    db: Arc<DatabaseConnection>,
    sessions: SessionManager,
    permissions: PermissionService,
}

impl TeamService {
    pub fn new(db: Arc<DatabaseConnection>, sessions: SessionManager) -> Self {
        let permissions = PermissionService::new(db.clone());
        Self {
            db,
            sessions,
            permissions,
        }
    }

    #[instrument(skip(self))]
    pub async fn list(
        &self,
        organization_id: Uuid,
        query: &ListQuery,
    ) -> Result<PaginatedResponse<TeamMember>, OrgDeskError> {
        let (rows, total) = OrganizationAccessRepository::list_members(self.db.as_ref(), organization_id, query).await?;
        let members = rows
            .into_iter()
            .map(|(access, user)| TeamMember::from_row(access, user))
            .collect();
        Ok(PaginatedResponse::new(members, total, query.page, query.page_size))
    }

    /// 邀请成员，邮箱未注册时用默认密码建号
    #[instrument(skip(self, request), fields(email = %request.email))]
    pub async fn invite(
        &self,
        actor_id: Uuid,
        organization_id: Uuid,
        request: InviteMemberRequest,
    ) -> Result<TeamMember, OrgDeskError> {
        self.permissions
            .require_permission(actor_id, organization_id, USER_RESOURCE, PermissionAction::Create)
            .await?;

        let email = request.email.trim();
        if !super::auth::is_valid_email(email) {
            return Err(OrgDeskError::validation("email", "Invalid email address"));
        }
        let role = parse_role(request.role.as_deref().unwrap_or("VIEWER"))?;

        let member = match UserRepository::find_by_email(self.db.as_ref(), email).await? {
            Some(existing) => existing,
            None => {
                let hash = self.sessions.hash_password(DEFAULT_MEMBER_PASSWORD)?;
                let name = request.name.map(|n| n.trim().to_string()).filter(|n| !n.is_empty());
                UserRepository::create(self.db.as_ref(), email, name, Some(hash)).await?
            }
        };

        if OrganizationAccessRepository::find(self.db.as_ref(), member.id, organization_id)
            .await?
            .is_some()
        {
            return Err(OrgDeskError::conflict("User is already a member of this organization"));
        }

        let access = OrganizationAccessRepository::create(self.db.as_ref(), member.id, organization_id, role, None).await?;
        info!(organization_id = %organization_id, user_id = %member.id, role = %role, "成员已加入组织");

        Ok(TeamMember::from_row(access, Some(member)))
    }

    #[instrument(skip(self))]
    pub async fn update_role(
        &self,
        actor_id: Uuid,
        organization_id: Uuid,
        access_id: Uuid,
        role: &str,
    ) -> Result<TeamMember, OrgDeskError> {
        self.permissions
            .require_permission(actor_id, organization_id, USER_RESOURCE, PermissionAction::Update)
            .await?;
        let role = parse_role(role)?;

        let access = self.member_of(organization_id, access_id).await?;
        let updated = OrganizationAccessRepository::update_role(self.db.as_ref(), access, role).await?;
        let user = UserRepository::find_by_id(self.db.as_ref(), updated.user_id).await?;

        Ok(TeamMember::from_row(updated, user))
    }

    #[instrument(skip(self))]
    pub async fn remove(&self, actor_id: Uuid, organization_id: Uuid, access_id: Uuid) -> Result<(), OrgDeskError> {
        self.permissions
            .require_permission(actor_id, organization_id, USER_RESOURCE, PermissionAction::Delete)
            .await?;

        let access = self.member_of(organization_id, access_id).await?;
        OrganizationAccessRepository::delete(self.db.as_ref(), access.id).await
    }

    async fn member_of(
        &self,
        organization_id: Uuid,
        access_id: Uuid,
    ) -> Result<organization_access::Model, OrgDeskError> {
        OrganizationAccessRepository::find_by_id(self.db.as_ref(), access_id)
            .await?
            .filter(|access| access.organization_id == organization_id)
            .ok_or_else(|| OrgDeskError::not_found(MEMBER_NOT_FOUND))
    }
}

fn parse_role(value: &str) -> Result<LegacyRole, OrgDeskError> {
    LegacyRole::parse(value).ok_or_else(|| OrgDeskError::validation("role", "Invalid role"))
}
