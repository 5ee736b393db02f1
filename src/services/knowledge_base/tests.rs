// 知识库服务测试

use super::*;
use crate::config::AppConfig;
use async_trait::async_trait;
use bytes::Bytes;
use object_store::{memory::InMemory, path::Path, ObjectStore};
use crate::services::vector_store::{VectorStore, VectorStoreFile};
use sea_orm::prelude::DateTimeWithTimeZone;
use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};
use std::sync::Mutex;

/// 记录调用的向量库替身
#[derive(Default)]
struct FakeVectorStore {
    fail_with: Option<String>,
    uploads: Mutex<Vec<String>>,
}

#[async_trait]
impl VectorStoreClient for FakeVectorStore {
    async fn create(&self, params: VectorStoreParams) -> Result<VectorStore, OrgDeskError> {
        match &self.fail_with {
            Some(message) => Err(OrgDeskError::vector_store(message.clone())),
            None => Ok(VectorStore {
                id: "vs_test".to_string(),
                name: params.name,
                status: Some("completed".to_string()),
                created_at: None,
                file_counts: None,
            }),
        }
    }

    async fn retrieve(&self, _vector_store_id: &str) -> Result<Option<VectorStore>, OrgDeskError> {
        Ok(None)
    }

    async fn update(&self, vector_store_id: &str, params: VectorStoreParams) -> Result<VectorStore, OrgDeskError> {
        Ok(VectorStore {
            id: vector_store_id.to_string(),
            name: params.name,
            status: None,
            created_at: None,
            file_counts: None,
        })
    }

    async fn delete(&self, _vector_store_id: &str) -> Result<(), OrgDeskError> {
        Ok(())
    }

    async fn upload_file(&self, _vector_store_id: &str, bytes: Bytes, file_name: &str) -> Result<String, OrgDeskError> {
        if let Some(message) = &self.fail_with {
            return Err(OrgDeskError::vector_store(message.clone()));
        }
        self.uploads
            .lock()
            .unwrap()
            .push(format!("{}:{}", file_name, bytes.len()));
        Ok("file_1".to_string())
    }

    async fn upload_url(&self, _vector_store_id: &str, url: &str) -> Result<String, OrgDeskError> {
        if let Some(message) = &self.fail_with {
            return Err(OrgDeskError::vector_store(message.clone()));
        }
        self.uploads.lock().unwrap().push(url.to_string());
        Ok("file_2".to_string())
    }

    async fn list_files(&self, _vector_store_id: &str) -> Result<Vec<VectorStoreFile>, OrgDeskError> {
        Ok(Vec::new())
    }

    async fn remove_file(&self, _vector_store_id: &str, _file_id: &str) -> Result<(), OrgDeskError> {
        Ok(())
    }
}

fn now() -> DateTimeWithTimeZone {
    chrono::Utc::now().into()
}

fn kb_model(organization_id: Uuid, vector_store_id: Option<&str>) -> knowledge_base::Model {
    knowledge_base::Model {
        id: Uuid::new_v4(),
        organization_id,
        name: "Acme Knowledge Base".to_string(),
        description: None,
        vector_store_id: vector_store_id.map(str::to_string),
        status: KnowledgeBaseStatus::Ready,
        created_at: now(),
        updated_at: now(),
    }
}

fn file_model(id: Uuid, file_path: &str) -> file_storage::Model {
    file_storage::Model {
        id,
        file_name: "handbook.pdf".to_string(),
        file_path: file_path.to_string(),
        file_type: "pdf".to_string(),
        file_size: 11,
        mime_type: Some("application/pdf".to_string()),
        is_secure: false,
        access_token: None,
        token_expiry: None,
        organization_id: None,
        user_id: None,
        created_at: now(),
    }
}

fn training_model(knowledge_base_id: Uuid, file_storage_id: Uuid) -> training_file::Model {
    training_file::Model {
        id: Uuid::new_v4(),
        knowledge_base_id,
        file_storage_id,
        status: TrainingStatus::Processing,
        error_message: None,
        processed_at: None,
        created_at: now(),
    }
}

fn service(
    db: Arc<DatabaseConnection>,
    store: Arc<dyn ObjectStore>,
    vector_store: Arc<dyn VectorStoreClient>,
) -> KnowledgeBaseService {
    let mut config = AppConfig::default().storage;
    config.use_ssl = false;
    let storage = Arc::new(FileStorageService::with_store(db.clone(), store, config));
    KnowledgeBaseService::new(db, storage, vector_store)
}

/// 释放服务持有的连接后取出执行过的语句
fn transaction_log(service: KnowledgeBaseService, db: Arc<DatabaseConnection>) -> String {
    drop(service);
    let db = Arc::try_unwrap(db).ok().expect("连接仍被共享");
    format!("{:?}", db.into_transaction_log())
}

fn exec_ok() -> MockExecResult {
    MockExecResult {
        last_insert_id: 0,
        rows_affected: 1,
    }
}

#[tokio::test]
async fn test_file_training_completes() {
    let store: Arc<dyn ObjectStore> = Arc::new(InMemory::new());
    store
        .put(&Path::from("public/handbook.pdf"), Bytes::from_static(b"hello world").into())
        .await
        .unwrap();

    let db = Arc::new(MockDatabase::new(DatabaseBackend::Postgres)
        .append_exec_results([exec_ok()])
        .into_connection());
    let vector_store = Arc::new(FakeVectorStore::default());
    let service = service(db.clone(), store, vector_store.clone());

    let file = file_model(Uuid::new_v4(), "public/handbook.pdf");
    service
        .run_file_training(Uuid::new_v4(), "vs_test".to_string(), file)
        .await;

    assert_eq!(*vector_store.uploads.lock().unwrap(), vec!["handbook.pdf:11".to_string()]);
    let log = transaction_log(service, db);
    assert!(log.contains("COMPLETED"));
    assert!(log.contains("processed_at"));
}

#[tokio::test]
async fn test_website_training_records_vendor_failure() {
    let db = Arc::new(MockDatabase::new(DatabaseBackend::Postgres)
        .append_exec_results([exec_ok()])
        .into_connection());
    let vector_store = Arc::new(FakeVectorStore {
        fail_with: Some("Failed to fetch URL: 404 Not Found".to_string()),
        ..Default::default()
    });
    let service = service(db.clone(), Arc::new(InMemory::new()), vector_store);

    service
        .run_website_training(
            Uuid::new_v4(),
            "vs_test".to_string(),
            "https://example.com/docs".to_string(),
        )
        .await;

    let log = transaction_log(service, db);
    assert!(log.contains("FAILED"));
    assert!(log.contains("Failed to fetch URL: 404 Not Found"));
    assert!(!log.contains("processed_at"));
}

#[tokio::test]
async fn test_train_file_rejects_duplicate() {
    let organization_id = Uuid::new_v4();
    let file_id = Uuid::new_v4();
    let kb = kb_model(organization_id, Some("vs_test"));
    let existing = training_model(kb.id, file_id);

    let db = Arc::new(MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([vec![kb]])
        .append_query_results([vec![file_model(file_id, "public/handbook.pdf")]])
        .append_query_results([vec![existing]])
        .into_connection());
    let service = service(db, Arc::new(InMemory::new()), Arc::new(FakeVectorStore::default()));

    let err = service.train_file(organization_id, file_id).await.unwrap_err();
    assert_eq!(err.status_code(), 400);
    assert_eq!(err.message(), "File is already being trained");
}

#[tokio::test]
async fn test_train_file_requires_vector_store() {
    let organization_id = Uuid::new_v4();
    let db = Arc::new(MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([vec![kb_model(organization_id, None)]])
        .into_connection());
    let service = service(db, Arc::new(InMemory::new()), Arc::new(FakeVectorStore::default()));

    let err = service
        .train_file(organization_id, Uuid::new_v4())
        .await
        .unwrap_err();
    assert_eq!(err.message(), "Vector store not initialized");
}

#[tokio::test]
async fn test_train_website_rejects_invalid_url() {
    let db = Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection());
    let service = service(db, Arc::new(InMemory::new()), Arc::new(FakeVectorStore::default()));

    let err = service
        .train_website(Uuid::new_v4(), "not a url")
        .await
        .unwrap_err();
    assert_eq!(err.message(), "Invalid URL");
}

#[tokio::test]
async fn test_get_missing_knowledge_base() {
    let db = Arc::new(MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([Vec::<knowledge_base::Model>::new()])
        .into_connection());
    let service = service(db, Arc::new(InMemory::new()), Arc::new(FakeVectorStore::default()));

    let err = service.get(Uuid::new_v4()).await.unwrap_err();
    assert_eq!(err.status_code(), 404);
    assert_eq!(err.message(), "Knowledge base not found");
}

#[tokio::test]
async fn test_create_rejects_second_knowledge_base() {
    let organization_id = Uuid::new_v4();
    let db = Arc::new(MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([vec![kb_model(organization_id, Some("vs_test"))]])
        .into_connection());
    let service = service(db, Arc::new(InMemory::new()), Arc::new(FakeVectorStore::default()));

    let request = CreateKnowledgeBaseRequest {
        name: "Docs".to_string(),
        description: None,
    };
    let err = service.create(organization_id, request).await.unwrap_err();
    assert_eq!(err.message(), "Knowledge base already exists for this organization");
}

#[tokio::test]
async fn test_create_marks_error_when_vendor_fails() {
    let organization_id = Uuid::new_v4();
    let mut created = kb_model(organization_id, None);
    created.status = KnowledgeBaseStatus::Error;

    let db = Arc::new(MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([Vec::<knowledge_base::Model>::new()])
        .append_query_results([vec![created]])
        .into_connection());
    let vector_store = Arc::new(FakeVectorStore {
        fail_with: Some("quota exceeded".to_string()),
        ..Default::default()
    });
    let service = service(db, Arc::new(InMemory::new()), vector_store);

    let request = CreateKnowledgeBaseRequest {
        name: "Docs".to_string(),
        description: Some("Product docs".to_string()),
    };
    let detail = service.create(organization_id, request).await.unwrap();
    assert_eq!(detail.knowledge_base.status, KnowledgeBaseStatus::Error);
    assert!(detail.knowledge_base.vector_store_id.is_none());
    assert!(detail.training_files.is_empty());
}
