// 权限解析服务
// 自定义角色按权限行匹配，未绑定自定义角色时回退到固定角色表

use crate::db::entities::{permission, LegacyRole};
use crate::db::repositories::{OrganizationAccessRepository, RoleRepository};
use crate::errors::OrgDeskError;
use sea_orm::DatabaseConnection;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use tracing::{debug, instrument};
use utoipa::ToSchema;
use uuid::Uuid;

/// 固定角色覆盖的资源
pub const LEGACY_RESOURCES: [&str; 2] = ["ORGANIZATION", "USER"];

/// 权限动作
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
pub enum PermissionAction {
    #[serde(rename = "C")]
    Create,
    #[serde(rename = "R")]
    Read,
    #[serde(rename = "U")]
    Update,
    #[serde(rename = "D")]
    Delete,
}

impl PermissionAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Create => "C",
            Self::Read => "R",
            Self::Update => "U",
            Self::Delete => "D",
        }
    }
}

impl fmt::Display for PermissionAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PermissionAction {
    type Err = OrgDeskError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "C" => Ok(Self::Create),
            "R" => Ok(Self::Read),
            "U" => Ok(Self::Update),
            "D" => Ok(Self::Delete),
            other => Err(OrgDeskError::validation(
                "action",
                format!("Unknown permission action: {}", other),
            )),
        }
    }
}

/// 单个资源上的 CRUD 标志
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PermissionFlags {
    pub can_create: bool,
    pub can_read: bool,
    pub can_update: bool,
    pub can_delete: bool,
}

impl PermissionFlags {
    pub const ALL: Self = Self::new(true, true, true, true);
    pub const READ_UPDATE: Self = Self::new(false, true, true, false);
    pub const READ_ONLY: Self = Self::new(false, true, false, false);

    pub const fn new(can_create: bool, can_read: bool, can_update: bool, can_delete: bool) -> Self {
        Self {
            can_create,
            can_read,
            can_update,
            can_delete,
        }
    }

    pub fn allows(&self, action: PermissionAction) -> bool {
        match action {
            PermissionAction::Create => self.can_create,
            PermissionAction::Read => self.can_read,
            PermissionAction::Update => self.can_update,
            PermissionAction::Delete => self.can_delete,
        }
    }
}

impl From<&permission::Model> for PermissionFlags {
    fn from(row: &permission::Model) -> Self {
        Self::new(row.can_create, row.can_read, row.can_update, row.can_delete)
    }
}

/// 资源 → 权限标志
pub type PermissionMap = BTreeMap<String, PermissionFlags>;

/// 固定角色表
pub fn legacy_allows(role: LegacyRole, action: PermissionAction) -> bool {
    match role {
        LegacyRole::Admin | LegacyRole::Manager => true,
        LegacyRole::Editor => action != PermissionAction::Delete,
        LegacyRole::Viewer => action == PermissionAction::Read,
        LegacyRole::Guest => false,
    }
}

/// 自定义角色：第一条资源匹配的权限行决定结果
pub fn custom_allows(rows: &[permission::Model], resource: &str, action: PermissionAction) -> bool {
    rows.iter()
        .find(|row| row.resource == resource)
        .map(|row| PermissionFlags::from(row).allows(action))
        .unwrap_or(false)
}

/// 固定角色在 ORGANIZATION 与 USER 上的权限
pub fn legacy_permission_map(role: LegacyRole) -> PermissionMap {
    let flags = match role {
        LegacyRole::Admin => PermissionFlags::ALL,
        LegacyRole::Manager | LegacyRole::Editor => PermissionFlags::READ_UPDATE,
        LegacyRole::Viewer => PermissionFlags::READ_ONLY,
        LegacyRole::Guest => return PermissionMap::new(),
    };

    LEGACY_RESOURCES
        .iter()
        .map(|resource| (resource.to_string(), flags))
        .collect()
}

/// 自定义角色的权限行转为映射，同一资源保留第一条
pub fn custom_permission_map(rows: &[permission::Model]) -> PermissionMap {
    let mut map = PermissionMap::new();
    for row in rows {
        map.entry(row.resource.clone())
            .or_insert_with(|| PermissionFlags::from(row));
    }
    map
}

/// 权限服务
#[derive(Clone)]
pub struct PermissionService {
    db: Arc<DatabaseConnection>,
}

impl PermissionService {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// 判断用户在组织内对资源是否拥有某动作的权限
    #[instrument(skip(self))]
    pub async fn has_permission(
        &self,
        user_id: Uuid,
        organization_id: Uuid,
        resource: &str,
        action: PermissionAction,
    ) -> Result<bool, OrgDeskError> {
        let Some(access) = OrganizationAccessRepository::find(self.db.as_ref(), user_id, organization_id).await? else {
            debug!("用户不属于该组织");
            return Ok(false);
        };

        let allowed = match access.role_id {
            Some(role_id) => {
                let rows = RoleRepository::permissions_for_role(self.db.as_ref(), role_id).await?;
                custom_allows(&rows, resource, action)
            }
            None => legacy_allows(access.legacy_role, action),
        };

        debug!(allowed, "权限解析完成");
        Ok(allowed)
    }

    /// 无权限时返回 403
    pub async fn require_permission(
        &self,
        user_id: Uuid,
        organization_id: Uuid,
        resource: &str,
        action: PermissionAction,
    ) -> Result<(), OrgDeskError> {
        if self
            .has_permission(user_id, organization_id, resource, action)
            .await?
        {
            Ok(())
        } else {
            Err(OrgDeskError::forbidden(format!(
                "Permission denied: {} on {}",
                action, resource
            )))
        }
    }

    #[instrument(skip(self))]
    pub async fn get_user_permissions(
        &self,
        user_id: Uuid,
        organization_id: Uuid,
    ) -> Result<PermissionMap, OrgDeskError> {
        let Some(access) = OrganizationAccessRepository::find(self.db.as_ref(), user_id, organization_id).await? else {
            return Ok(PermissionMap::new());
        };

        match access.role_id {
            Some(role_id) => {
                let rows = RoleRepository::permissions_for_role(self.db.as_ref(), role_id).await?;
                Ok(custom_permission_map(&rows))
            }
            None => Ok(legacy_permission_map(access.legacy_role)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::entities::organization_access;
    use sea_orm::{DatabaseBackend, MockDatabase};

    fn permission_row(resource: &str, flags: PermissionFlags) -> permission::Model {
        permission::Model {
            id: Uuid::new_v4(),
            resource: resource.to_string(),
            can_create: flags.can_create,
            can_read: flags.can_read,
            can_update: flags.can_update,
            can_delete: flags.can_delete,
            created_at: chrono::Utc::now().into(),
        }
    }

    fn access_row(legacy_role: LegacyRole, role_id: Option<Uuid>) -> organization_access::Model {
        organization_access::Model {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            organization_id: Uuid::new_v4(),
            legacy_role,
            role_id,
            created_at: chrono::Utc::now().into(),
        }
    }

    #[test]
    fn test_legacy_table() {
        use PermissionAction::*;

        for action in [Create, Read, Update, Delete] {
            assert!(legacy_allows(LegacyRole::Admin, action));
            assert!(legacy_allows(LegacyRole::Manager, action));
            assert!(!legacy_allows(LegacyRole::Guest, action));
        }

        assert!(legacy_allows(LegacyRole::Editor, Update));
        assert!(!legacy_allows(LegacyRole::Editor, Delete));
        assert!(legacy_allows(LegacyRole::Viewer, Read));
        assert!(!legacy_allows(LegacyRole::Viewer, Create));
    }

    #[test]
    fn test_custom_first_match_wins() {
        let rows = vec![
            permission_row("USER", PermissionFlags::READ_ONLY),
            permission_row("USER", PermissionFlags::ALL),
        ];

        assert!(custom_allows(&rows, "USER", PermissionAction::Read));
        assert!(!custom_allows(&rows, "USER", PermissionAction::Delete));
        assert!(!custom_allows(&rows, "ORGANIZATION", PermissionAction::Read));

        let map = custom_permission_map(&rows);
        assert_eq!(map.get("USER"), Some(&PermissionFlags::READ_ONLY));
    }

    #[test]
    fn test_legacy_permission_map() {
        let admin = legacy_permission_map(LegacyRole::Admin);
        assert_eq!(admin.len(), 2);
        assert_eq!(admin["ORGANIZATION"], PermissionFlags::ALL);

        let editor = legacy_permission_map(LegacyRole::Editor);
        assert_eq!(editor["USER"], PermissionFlags::READ_UPDATE);

        assert!(legacy_permission_map(LegacyRole::Guest).is_empty());
    }

    #[test]
    fn test_action_parsing() {
        assert_eq!("U".parse::<PermissionAction>().unwrap(), PermissionAction::Update);
        assert!("X".parse::<PermissionAction>().is_err());
        assert_eq!(PermissionAction::Delete.to_string(), "D");
    }

    #[tokio::test]
    async fn test_no_access_denies() {
        let db = Arc::new(MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<organization_access::Model>::new()])
            .into_connection());
        let service = PermissionService::new(db);

        let allowed = service
            .has_permission(Uuid::new_v4(), Uuid::new_v4(), "USER", PermissionAction::Read)
            .await
            .unwrap();
        assert!(!allowed);
    }

    #[tokio::test]
    async fn test_custom_role_overrides_legacy() {
        let role_id = Uuid::new_v4();
        let db = Arc::new(MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![access_row(LegacyRole::Admin, Some(role_id))]])
            .append_query_results([vec![permission_row("USER", PermissionFlags::READ_ONLY)]])
            .into_connection());
        let service = PermissionService::new(db);

        let err = service
            .require_permission(Uuid::new_v4(), Uuid::new_v4(), "USER", PermissionAction::Delete)
            .await
            .unwrap_err();
        assert_eq!(err.status_code(), 403);
        assert_eq!(err.message(), "Permission denied: D on USER");
    }

    #[tokio::test]
    async fn test_get_user_permissions_legacy() {
        let db = Arc::new(MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![access_row(LegacyRole::Viewer, None)]])
            .into_connection());
        let service = PermissionService::new(db);

        let map = service
            .get_user_permissions(Uuid::new_v4(), Uuid::new_v4())
            .await
            .unwrap();
        assert_eq!(map["ORGANIZATION"], PermissionFlags::READ_ONLY);
    }
}
