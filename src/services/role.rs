// 自定义角色服务

use crate::db::entities::{permission, role};
use crate::db::repositories::{OrganizationAccessRepository, PermissionInput, RoleRepository};
use crate::errors::OrgDeskError;
use sea_orm::{DatabaseConnection, TransactionTrait};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument};
use utoipa::ToSchema;
use uuid::Uuid;

const INVALID_BODY: &str = "Invalid request body";

/// 请求中的单条权限，缺省的标志视为 false
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PermissionRequest {
    #[serde(default)]
    pub resource: String,
    #[serde(default)]
    pub can_create: bool,
    #[serde(default)]
    pub can_read: bool,
    #[serde(default)]
    pub can_update: bool,
    #[serde(default)]
    pub can_delete: bool,
}

impl From<&PermissionRequest> for PermissionInput {
    fn from(request: &PermissionRequest) -> Self {
        Self {
            resource: request.resource.trim().to_string(),
            can_create: request.can_create,
            can_read: request.can_read,
            can_update: request.can_update,
            can_delete: request.can_delete,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct RoleRequest {
    pub name: Option<String>,
    pub permissions: Option<Vec<PermissionRequest>>,
}

/// 角色及其权限
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct RoleWithPermissions {
    #[serde(flatten)]
    #[schema(value_type = Object)]
    pub role: role::Model,
    #[schema(value_type = Vec<Object>)]
    pub permissions: Vec<permission::Model>,
}

/// 角色服务
pub struct RoleService {
    db: Arc<DatabaseConnection>,
}

impl RoleService {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    #[instrument(skip(self))]
    pub async fn list(&self) -> Result<Vec<RoleWithPermissions>, OrgDeskError> {
        let rows = RoleRepository::list_with_permissions(self.db.as_ref()).await?;
        Ok(rows
            .into_iter()
            .map(|(role, permissions)| RoleWithPermissions { role, permissions })
            .collect())
    }

    #[instrument(skip(self))]
    pub async fn get(&self, role_id: Uuid) -> Result<RoleWithPermissions, OrgDeskError> {
        let role = self.require(role_id).await?;
        let permissions = RoleRepository::permissions_for_role(self.db.as_ref(), role_id).await?;
        Ok(RoleWithPermissions { role, permissions })
    }

    /// 名称和权限列表都必须提供
    #[instrument(skip(self, request))]
    pub async fn create(&self, request: RoleRequest) -> Result<RoleWithPermissions, OrgDeskError> {
        let name = request
            .name
            .as_deref()
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .ok_or_else(|| OrgDeskError::validation("name", INVALID_BODY))?;
        let requested = request
            .permissions
            .as_deref()
            .ok_or_else(|| OrgDeskError::validation("permissions", INVALID_BODY))?;

        let txn = self.db.begin().await?;
        let role = RoleRepository::create(&txn, name, true).await?;
        let mut permissions = Vec::with_capacity(requested.len());
        for entry in requested {
            permissions.push(RoleRepository::attach_permission(&txn, role.id, &entry.into()).await?);
        }
        txn.commit().await?;

        info!(role_id = %role.id, count = permissions.len(), "自定义角色已创建");
        Ok(RoleWithPermissions { role, permissions })
    }

    /// 改名；给出权限列表时整体替换
    #[instrument(skip(self, request))]
    pub async fn update(&self, role_id: Uuid, request: RoleRequest) -> Result<RoleWithPermissions, OrgDeskError> {
        let existing = self.require(role_id).await?;

        let txn = self.db.begin().await?;
        let role = match request.name.as_deref().map(str::trim).filter(|n| !n.is_empty()) {
            Some(name) => RoleRepository::rename(&txn, existing, name.to_string()).await?,
            None => existing,
        };

        let permissions = match request.permissions.as_deref() {
            Some(requested) => {
                RoleRepository::detach_permissions(&txn, role_id).await?;
                let mut attached = Vec::with_capacity(requested.len());
                for entry in requested {
                    attached.push(RoleRepository::attach_permission(&txn, role_id, &entry.into()).await?);
                }
                attached
            }
            None => RoleRepository::permissions_for_role(&txn, role_id).await?,
        };
        txn.commit().await?;

        Ok(RoleWithPermissions { role, permissions })
    }

    /// 仍被成员使用的角色不能删除
    #[instrument(skip(self))]
    pub async fn delete(&self, role_id: Uuid) -> Result<(), OrgDeskError> {
        self.require(role_id).await?;

        if OrganizationAccessRepository::is_role_assigned(self.db.as_ref(), role_id).await? {
            return Err(OrgDeskError::validation(
                "roleId",
                "Cannot delete role that is assigned to users",
            ));
        }

        let txn = self.db.begin().await?;
        RoleRepository::detach_permissions(&txn, role_id).await?;
        RoleRepository::delete(&txn, role_id).await?;
        txn.commit().await?;
        Ok(())
    }

    async fn require(&self, role_id: Uuid) -> Result<role::Model, OrgDeskError> {
        RoleRepository::find_by_id(self.db.as_ref(), role_id)
            .await?
            .ok_or_else(|| OrgDeskError::not_found("Role not found"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::entities::{organization_access, role_permission, LegacyRole};
    use sea_orm::{DatabaseBackend, MockDatabase};

    fn role(name: &str) -> role::Model {
        role::Model {
            id: Uuid::new_v4(),
            name: name.to_string(),
            is_custom: true,
            created_at: chrono::Utc::now().into(),
            updated_at: chrono::Utc::now().into(),
        }
    }

    fn permission(resource: &str) -> permission::Model {
        permission::Model {
            id: Uuid::new_v4(),
            resource: resource.to_string(),
            can_create: false,
            can_read: true,
            can_update: false,
            can_delete: false,
            created_at: chrono::Utc::now().into(),
        }
    }

    #[tokio::test]
    async fn test_create_requires_name_and_permissions() {
        let db = Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection());
        let service = RoleService::new(db);

        let err = service
            .create(RoleRequest {
                name: None,
                permissions: Some(Vec::new()),
            })
            .await
            .unwrap_err();
        assert_eq!(err.message(), "Invalid request body");

        let err = service
            .create(RoleRequest {
                name: Some("Auditor".to_string()),
                permissions: None,
            })
            .await
            .unwrap_err();
        assert_eq!(err.status_code(), 400);
    }

    #[tokio::test]
    async fn test_create_custom_role() {
        let created = role("Auditor");
        let perm = permission("USER");
        let link = role_permission::Model {
            id: Uuid::new_v4(),
            role_id: created.id,
            permission_id: perm.id,
        };

        let db = Arc::new(MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![created.clone()]])
            .append_query_results([vec![perm.clone()]])
            .append_query_results([vec![link]])
            .into_connection());

        let request: RoleRequest = serde_json::from_value(serde_json::json!({
            "name": "Auditor",
            "permissions": [{ "resource": "USER", "canRead": true }]
        }))
        .unwrap();

        let result = RoleService::new(db).create(request).await.unwrap();
        assert!(result.role.is_custom);
        assert_eq!(result.permissions, vec![perm]);
    }

    #[tokio::test]
    async fn test_delete_assigned_role() {
        let existing = role("Auditor");
        let access = organization_access::Model {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            organization_id: Uuid::new_v4(),
            legacy_role: LegacyRole::Viewer,
            role_id: Some(existing.id),
            created_at: chrono::Utc::now().into(),
        };

        let db = Arc::new(MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![existing.clone()]])
            .append_query_results([vec![access]])
            .into_connection());

        let err = RoleService::new(db).delete(existing.id).await.unwrap_err();
        assert_eq!(err.message(), "Cannot delete role that is assigned to users");
    }

    #[tokio::test]
    async fn test_get_missing_role() {
        let db = Arc::new(MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<role::Model>::new()])
            .into_connection());

        let err = RoleService::new(db).get(Uuid::new_v4()).await.unwrap_err();
        assert_eq!(err.status_code(), 404);
        assert_eq!(err.message(), "Role not found");
    }
}
