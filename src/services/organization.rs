// 组织服务
// 组织的创建、切换、资料更新与权限查询

use crate::db::entities::{organization, LegacyRole};
use crate::db::repositories::{OrganizationAccessRepository, OrganizationRepository};
use crate::errors::OrgDeskError;
use crate::services::knowledge_base::KnowledgeBaseService;
use crate::services::rbac::{PermissionAction, PermissionMap, PermissionService};
use crate::services::storage::{FileStorageService, IncomingFile, UploadFileOptions};
use rand::Rng;
use sea_orm::{DatabaseConnection, TransactionTrait};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument};
use utoipa::ToSchema;
use uuid::Uuid;

/// 所有组织当前统一展示的套餐
pub const DEFAULT_PLAN: &str = "Enterprise";
const CODE_MAX_LEN: usize = 10;
const RANDOM_CODE_LEN: usize = 6;
const CODE_CHARSET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// 组织列表项
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct OrganizationSummary {
    pub id: Uuid,
    pub name: String,
    pub code: String,
    pub plan: String,
}

impl From<organization::Model> for OrganizationSummary {
    fn from(model: organization::Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            code: model.code,
            plan: DEFAULT_PLAN.to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct CreateOrganizationRequest {
    #[serde(default)]
    pub name: String,
}

/// 组织服务
pub struct OrganizationService {
    db: Arc<DatabaseConnection>,
    storage: Arc<FileStorageService>,
    knowledge_bases: KnowledgeBaseService,
    permissions: PermissionService,
}

impl OrganizationService {
    pub fn new(
        db: Arc<DatabaseConnection>,
        storage: Arc<FileStorageService>,
        knowledge_bases: KnowledgeBaseService,
    ) -> Self {
        let permissions = PermissionService::new(db.clone());
        Self {
            db,
            storage,
            knowledge_bases,
            permissions,
        }
    }

    #[instrument(skip(self))]
    pub async fn list(&self, user_id: Uuid) -> Result<Vec<OrganizationSummary>, OrgDeskError> {
        let organizations = OrganizationRepository::list_for_user(self.db.as_ref(), user_id).await?;
        Ok(organizations.into_iter().map(OrganizationSummary::from).collect())
    }

    /// 创建组织并把创建者设为管理员，随后尽力创建知识库
    #[instrument(skip(self, request))]
    pub async fn create(
        &self,
        user_id: Uuid,
        request: CreateOrganizationRequest,
    ) -> Result<OrganizationSummary, OrgDeskError> {
        let name = request.name.trim().to_string();
        if name.is_empty() {
            return Err(OrgDeskError::validation("name", "Name is required"));
        }

        let mut code = organization_code(&name);
        if OrganizationRepository::find_by_code(self.db.as_ref(), &code).await?.is_some() {
            code = random_code();
        }

        let txn = self.db.begin().await?;
        let created = OrganizationRepository::create(&txn, &name, &code).await?;
        OrganizationAccessRepository::create(&txn, user_id, created.id, LegacyRole::Admin, None).await?;
        txn.commit().await?;

        info!(organization_id = %created.id, code = %created.code, "组织已创建");

        self.knowledge_bases
            .provision_for_organization(created.id, &created.name)
            .await;

        Ok(created.into())
    }

    /// Cookie 中的组织可访问时返回它，否则回退到用户的第一个组织
    #[instrument(skip(self))]
    pub async fn current(
        &self,
        user_id: Uuid,
        selected: Option<Uuid>,
    ) -> Result<Option<organization::Model>, OrgDeskError> {
        if let Some(organization_id) = selected {
            if OrganizationAccessRepository::find(self.db.as_ref(), user_id, organization_id)
                .await?
                .is_some()
            {
                if let Some(found) = OrganizationRepository::find_by_id(self.db.as_ref(), organization_id).await? {
                    return Ok(Some(found));
                }
            }
        }

        match OrganizationAccessRepository::first_for_user(self.db.as_ref(), user_id).await? {
            Some(access) => OrganizationRepository::find_by_id(self.db.as_ref(), access.organization_id).await,
            None => Ok(None),
        }
    }

    /// 更新名称与 Logo，Logo 作为公开文件存储
    #[instrument(skip(self, logo))]
    pub async fn update(
        &self,
        user_id: Uuid,
        organization_id: Uuid,
        name: &str,
        logo: Option<IncomingFile>,
    ) -> Result<organization::Model, OrgDeskError> {
        if OrganizationAccessRepository::find(self.db.as_ref(), user_id, organization_id)
            .await?
            .is_none()
        {
            return Err(OrgDeskError::forbidden("You don't have access to this organization"));
        }
        self.permissions
            .require_permission(user_id, organization_id, "ORGANIZATION", PermissionAction::Update)
            .await?;

        let name = name.trim();
        if name.is_empty() {
            return Err(OrgDeskError::validation("name", "Organization name is required"));
        }

        let existing = OrganizationRepository::find_by_id(self.db.as_ref(), organization_id)
            .await?
            .ok_or_else(|| OrgDeskError::not_found("Organization not found"))?;

        let logo_url = match logo.filter(|l| !l.bytes.is_empty()) {
            Some(logo) => {
                let uploaded = self.storage.upload(logo_upload(organization_id, logo)).await?;
                Some(uploaded.file_url)
            }
            None => existing.logo_url.clone(),
        };

        let updated = OrganizationRepository::update(self.db.as_ref(), existing, name.to_string(), logo_url).await?;
        info!(organization_id = %organization_id, "组织资料已更新");
        Ok(updated)
    }

    pub async fn permissions(&self, user_id: Uuid, organization_id: Uuid) -> Result<PermissionMap, OrgDeskError> {
        self.permissions.get_user_permissions(user_id, organization_id).await
    }
}

/// Logo 归属组织而非上传者
fn logo_upload(organization_id: Uuid, logo: IncomingFile) -> UploadFileOptions {
    UploadFileOptions {
        bytes: logo.bytes,
        file_name: logo.file_name,
        mime_type: logo.mime_type,
        organization_id: Some(organization_id),
        user_id: None,
        is_secure: false,
        token_expiry_hours: None,
    }
}

/// 名称转大写后只保留字母数字，取前 10 位；为空时随机生成
pub fn organization_code(name: &str) -> String {
    let code: String = name
        .to_uppercase()
        .chars()
        .filter(|c| c.is_ascii_uppercase() || c.is_ascii_digit())
        .take(CODE_MAX_LEN)
        .collect();

    if code.is_empty() { random_code() } else { code }
}

/// `ORG-` 加 6 位大写字母数字
pub fn random_code() -> String {
    let mut rng = rand::thread_rng();
    let suffix: String = (0..RANDOM_CODE_LEN)
        .map(|_| CODE_CHARSET[rng.gen_range(0..CODE_CHARSET.len())] as char)
        .collect();
    format!("ORG-{}", suffix)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;
    use crate::db::entities::organization_access;
    use crate::services::vector_store::OpenAiVectorStoreClient;
    use object_store::memory::InMemory;
    use sea_orm::{DatabaseBackend, MockDatabase};

    fn service(db: Arc<DatabaseConnection>) -> OrganizationService {
        let config = AppConfig::default();
        let storage = Arc::new(FileStorageService::with_store(
            db.clone(),
            Arc::new(InMemory::new()),
            config.storage.clone(),
        ));
        let vector_store = Arc::new(OpenAiVectorStoreClient::new(&config.vector_store).unwrap());
        let knowledge_bases = KnowledgeBaseService::new(db.clone(), storage.clone(), vector_store);
        OrganizationService::new(db, storage, knowledge_bases)
    }

    fn organization(name: &str, code: &str) -> organization::Model {
        organization::Model {
            id: Uuid::new_v4(),
            name: name.to_string(),
            code: code.to_string(),
            logo_url: None,
            created_at: chrono::Utc::now().into(),
            updated_at: chrono::Utc::now().into(),
        }
    }

    #[test]
    fn test_organization_code() {
        assert_eq!(organization_code("Acme Corp"), "ACMECORP");
        assert_eq!(organization_code("globex-international-2024"), "GLOBEXINTE");

        let fallback = organization_code("!!! ???");
        assert!(fallback.starts_with("ORG-"));
        assert_eq!(fallback.len(), 10);
        assert!(fallback[4..].chars().all(|c| c.is_ascii_uppercase() || c.is_ascii_digit()));
    }

    #[test]
    fn test_summary_plan() {
        let summary = OrganizationSummary::from(organization("Acme Corporation", "ACME-001"));
        assert_eq!(summary.plan, "Enterprise");
        assert_eq!(summary.code, "ACME-001");
    }

    #[test]
    fn test_logo_belongs_to_organization() {
        let org = Uuid::new_v4();
        let options = logo_upload(
            org,
            IncomingFile {
                bytes: bytes::Bytes::from_static(b"png"),
                file_name: "logo.png".to_string(),
                mime_type: Some("image/png".to_string()),
            },
        );

        assert_eq!(options.organization_id, Some(org));
        assert_eq!(options.user_id, None);
        assert!(!options.is_secure);
    }

    #[tokio::test]
    async fn test_create_requires_name() {
        let db = Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection());
        let request = CreateOrganizationRequest { name: "   ".to_string() };

        let err = service(db).create(Uuid::new_v4(), request).await.unwrap_err();
        assert_eq!(err.message(), "Name is required");
    }

    #[tokio::test]
    async fn test_update_without_access_is_forbidden() {
        let db = Arc::new(MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<organization_access::Model>::new()])
            .into_connection());

        let err = service(db)
            .update(Uuid::new_v4(), Uuid::new_v4(), "Renamed", None)
            .await
            .unwrap_err();
        assert_eq!(err.status_code(), 403);
        assert_eq!(err.message(), "You don't have access to this organization");
    }

    #[tokio::test]
    async fn test_current_falls_back_to_first_organization() {
        let user_id = Uuid::new_v4();
        let first = organization("Acme Corporation", "ACME-001");
        let access = organization_access::Model {
            id: Uuid::new_v4(),
            user_id,
            organization_id: first.id,
            legacy_role: LegacyRole::Admin,
            role_id: None,
            created_at: chrono::Utc::now().into(),
        };

        let db = Arc::new(MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<organization_access::Model>::new()])
            .append_query_results([vec![access]])
            .append_query_results([vec![first.clone()]])
            .into_connection());

        let current = service(db)
            .current(user_id, Some(Uuid::new_v4()))
            .await
            .unwrap();
        assert_eq!(current, Some(first));
    }
}
