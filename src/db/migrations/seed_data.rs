// 种子数据管理
// 用于开发和测试环境的初始数据

use crate::db::entities::{prelude::*, user};
use crate::db::repositories::{
    OrganizationAccessRepository, OrganizationRepository, PermissionInput, RoleRepository,
    UserRepository,
};
use crate::errors::OrgDeskError;
use sea_orm::{ConnectionTrait, DatabaseConnection, EntityTrait, TransactionTrait};
use std::sync::Arc;
use tracing::{info, instrument};
use uuid::Uuid;

/// 种子用户的统一密码
pub const SEED_PASSWORD: &str = "Admin@123";

pub const ACME_ORGANIZATION_ID: Uuid = Uuid::from_u128(0x4161239b_4dd2_40d5_ac7f_dd6d317d11f5);
pub const TEST_ORGANIZATION_ID: Uuid = Uuid::from_u128(0xd9421175_be94_4553_b288_3a9118fada20);

pub const SYSTEM_USER_EMAIL: &str = "system@example.com";
pub const DEFAULT_ORGANIZATION_CODE: &str = "ORG-001";

/// 种子数据管理器
pub struct SeedDataManager {
    db: Arc<DatabaseConnection>,
    bcrypt_cost: u32,
}

impl SeedDataManager {
    pub fn new(db: Arc<DatabaseConnection>, bcrypt_cost: u32) -> Self {
        Self { db, bcrypt_cost }
    }

    /// 初始化所有种子数据，已有种子组织时跳过
    #[instrument(skip(self))]
    pub async fn seed_all(&self) -> Result<(), OrgDeskError> {
        info!("开始初始化种子数据");

        if OrganizationRepository::find_by_id(self.db.as_ref(), ACME_ORGANIZATION_ID)
            .await?
            .is_some()
        {
            info!("检测到现有种子数据，跳过初始化");
            return Ok(());
        }

        let txn = self.db.begin().await?;

        let acme =
            OrganizationRepository::create_with_id(&txn, ACME_ORGANIZATION_ID, "Acme Corporation", "ACME-001")
                .await?;
        let test_org = OrganizationRepository::create_with_id(
            &txn,
            TEST_ORGANIZATION_ID,
            "Test Organization",
            "TEST-001",
        )
        .await?;

        let password_hash = bcrypt::hash(SEED_PASSWORD, self.bcrypt_cost)?;
        let admin = self.create_user(&txn, "admin@example.com", "Admin User", &password_hash).await?;
        let manager = self.create_user(&txn, "manager@example.com", "Manager User", &password_hash).await?;
        let viewer = self.create_user(&txn, "viewer@example.com", "Viewer User", &password_hash).await?;
        let tester = self.create_user(&txn, "test@test.com", "Test User", &password_hash).await?;
        info!("种子用户已创建 (密码: {})", SEED_PASSWORD);

        let mut role_ids = Vec::new();
        for (name, grants) in seed_roles() {
            let role = RoleRepository::create(&txn, name, false).await?;
            for grant in &grants {
                RoleRepository::attach_permission(&txn, role.id, grant).await?;
            }
            role_ids.push((name, role.id));
        }
        let role_id = |name: &str| role_ids.iter().find(|(n, _)| *n == name).map(|(_, id)| *id);

        let memberships = [
            (admin.id, acme.id, LegacyRole::Admin, role_id("Admin")),
            (manager.id, acme.id, LegacyRole::Manager, role_id("Manager")),
            (viewer.id, acme.id, LegacyRole::Viewer, role_id("Viewer")),
            (tester.id, test_org.id, LegacyRole::Admin, role_id("Admin")),
        ];
        for (user_id, organization_id, legacy_role, role_id) in memberships {
            OrganizationAccessRepository::create(&txn, user_id, organization_id, legacy_role, role_id)
                .await?;
        }

        txn.commit().await?;
        info!("种子数据初始化完成");
        Ok(())
    }

    /// 按依赖逆序清空种子涉及的表
    #[instrument(skip(self))]
    pub async fn clean_seed_data(&self) -> Result<(), OrgDeskError> {
        info!("清理种子数据");

        let txn = self.db.begin().await?;
        RolePermission::delete_many().exec(&txn).await?;
        OrganizationAccess::delete_many().exec(&txn).await?;
        Permission::delete_many().exec(&txn).await?;
        Role::delete_many().exec(&txn).await?;
        FileStorage::delete_many().exec(&txn).await?;
        User::delete_many().exec(&txn).await?;
        Organization::delete_many().exec(&txn).await?;
        txn.commit().await?;

        info!("种子数据清理完成");
        Ok(())
    }

    pub async fn reseed(&self) -> Result<(), OrgDeskError> {
        self.clean_seed_data().await?;
        self.seed_all().await
    }

    async fn create_user<C: ConnectionTrait>(
        &self,
        db: &C,
        email: &str,
        name: &str,
        password_hash: &str,
    ) -> Result<user::Model, OrgDeskError> {
        UserRepository::create(db, email, Some(name.to_string()), Some(password_hash.to_string()))
            .await
    }
}

/// 返回系统用户，首次调用时一并创建默认组织并授予 ADMIN
#[instrument(skip(db))]
pub async fn get_system_user(db: &DatabaseConnection) -> Result<user::Model, OrgDeskError> {
    if let Some(existing) = UserRepository::find_by_email(db, SYSTEM_USER_EMAIL).await? {
        return Ok(existing);
    }

    let txn = db.begin().await?;
    let system = UserRepository::create(&txn, SYSTEM_USER_EMAIL, Some("System User".to_string()), None)
        .await?;
    let organization = match OrganizationRepository::find_by_code(&txn, DEFAULT_ORGANIZATION_CODE).await? {
        Some(org) => org,
        None => OrganizationRepository::create(&txn, "Default Organization", DEFAULT_ORGANIZATION_CODE).await?,
    };
    OrganizationAccessRepository::create(&txn, system.id, organization.id, LegacyRole::Admin, None)
        .await?;
    txn.commit().await?;

    info!(user_id = %system.id, "系统用户已创建");
    Ok(system)
}

/// 内置角色及其权限，Guest 不带任何权限
pub fn seed_roles() -> Vec<(&'static str, Vec<PermissionInput>)> {
    let grant = |resource: &str, c: bool, r: bool, u: bool, d: bool| PermissionInput {
        resource: resource.to_string(),
        can_create: c,
        can_read: r,
        can_update: u,
        can_delete: d,
    };

    vec![
        (
            "Admin",
            vec![
                grant("ORGANIZATION", true, true, true, true),
                grant("USER", true, true, true, true),
            ],
        ),
        (
            "Manager",
            vec![
                grant("ORGANIZATION", false, true, true, false),
                grant("USER", false, true, true, false),
            ],
        ),
        (
            "Editor",
            vec![
                grant("ORGANIZATION", false, true, true, false),
                grant("USER", false, true, true, false),
            ],
        ),
        (
            "Viewer",
            vec![
                grant("ORGANIZATION", false, true, false, false),
                grant("USER", false, true, false, false),
            ],
        ),
        ("Guest", vec![]),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seed_roles() {
        let roles = seed_roles();
        let names: Vec<_> = roles.iter().map(|(name, _)| *name).collect();
        assert_eq!(names, vec!["Admin", "Manager", "Editor", "Viewer", "Guest"]);

        let (_, viewer) = &roles[3];
        assert!(viewer.iter().all(|p| p.can_read && !p.can_update));
        assert!(roles[4].1.is_empty());
    }

    #[test]
    fn test_fixed_organization_ids() {
        assert_eq!(
            ACME_ORGANIZATION_ID.to_string(),
            "4161239b-4dd2-40d5-ac7f-dd6d317d11f5"
        );
        assert_eq!(
            TEST_ORGANIZATION_ID.to_string(),
            "d9421175-be94-4553-b288-3a9118fada20"
        );
    }
}
