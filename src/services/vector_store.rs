// 向量库客户端
// 封装外部向量库厂商的 HTTP API

use crate::config::VectorStoreConfig;
use crate::errors::OrgDeskError;
use async_trait::async_trait;
use bytes::Bytes;
use reqwest::{multipart, Method, RequestBuilder, Response, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info, instrument};
use utoipa::ToSchema;

const BETA_HEADER: &str = "OpenAI-Beta";
const BETA_VALUE: &str = "assistants=v2";
const DEFAULT_FILE_NAME: &str = "content.txt";

/// 厂商侧的向量库
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct VectorStore {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub created_at: Option<i64>,
    #[serde(default)]
    pub file_counts: Option<FileCounts>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct FileCounts {
    pub in_progress: u64,
    pub completed: u64,
    pub failed: u64,
    pub cancelled: u64,
}

/// 向量库中的文件
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct VectorStoreFile {
    pub id: String,
    #[serde(default)]
    pub status: Option<String>,
}

/// 创建或更新向量库的参数
#[derive(Debug, Clone, Default, Serialize)]
pub struct VectorStoreParams {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// 向量库客户端
#[async_trait]
pub trait VectorStoreClient: Send + Sync {
    async fn create(&self, params: VectorStoreParams) -> Result<VectorStore, OrgDeskError>;

    /// 厂商返回 404 时为 `None`
    async fn retrieve(&self, vector_store_id: &str) -> Result<Option<VectorStore>, OrgDeskError>;

    async fn update(
        &self,
        vector_store_id: &str,
        params: VectorStoreParams,
    ) -> Result<VectorStore, OrgDeskError>;

    async fn delete(&self, vector_store_id: &str) -> Result<(), OrgDeskError>;

    /// 上传文件并加入向量库，返回厂商文件 ID
    async fn upload_file(
        &self,
        vector_store_id: &str,
        bytes: Bytes,
        file_name: &str,
    ) -> Result<String, OrgDeskError>;

    /// 抓取网页文本后上传
    async fn upload_url(&self, vector_store_id: &str, url: &str) -> Result<String, OrgDeskError>;

    async fn list_files(&self, vector_store_id: &str) -> Result<Vec<VectorStoreFile>, OrgDeskError>;

    async fn remove_file(&self, vector_store_id: &str, file_id: &str) -> Result<(), OrgDeskError>;
}

#[derive(Debug, Deserialize)]
struct FileObject {
    id: String,
}

#[derive(Debug, Deserialize)]
struct FileList {
    data: Vec<VectorStoreFile>,
}

/// OpenAI 向量库客户端
pub struct OpenAiVectorStoreClient {
    http_client: reqwest::Client,
    api_key: String,
    base_url: String,
}

impl OpenAiVectorStoreClient {
    pub fn new(config: &VectorStoreConfig) -> Result<Self, OrgDeskError> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout))
            .build()
            .map_err(|e| OrgDeskError::configuration(format!("创建 HTTP 客户端失败: {}", e)))?;

        Ok(Self {
            http_client,
            api_key: config.api_key.clone(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    /// API 密钥在首次调用时校验
    fn request(&self, method: Method, path: &str) -> Result<RequestBuilder, OrgDeskError> {
        if self.api_key.is_empty() {
            return Err(OrgDeskError::configuration(
                "OPENAI_API_KEY environment variable is not set",
            ));
        }

        Ok(self
            .http_client
            .request(method, format!("{}{}", self.base_url, path))
            .bearer_auth(&self.api_key)
            .header(BETA_HEADER, BETA_VALUE))
    }

    /// 非 2xx 响应转为带厂商消息的错误
    async fn check(response: Response) -> Result<Response, OrgDeskError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        Err(OrgDeskError::vector_store_with_status(
            vendor_error_message(&body, status),
            status.as_u16(),
        ))
    }

    async fn attach_file(&self, vector_store_id: &str, file_id: &str) -> Result<(), OrgDeskError> {
        let response = self
            .request(Method::POST, &format!("/vector_stores/{}/files", vector_store_id))?
            .json(&serde_json::json!({ "file_id": file_id }))
            .send()
            .await?;
        Self::check(response).await?;
        Ok(())
    }
}

#[async_trait]
impl VectorStoreClient for OpenAiVectorStoreClient {
    #[instrument(skip(self, params), fields(name = ?params.name))]
    async fn create(&self, params: VectorStoreParams) -> Result<VectorStore, OrgDeskError> {
        let response = self
            .request(Method::POST, "/vector_stores")?
            .json(&params)
            .send()
            .await?;
        let store: VectorStore = Self::check(response).await?.json().await?;

        info!(vector_store_id = %store.id, "向量库创建成功");
        Ok(store)
    }

    #[instrument(skip(self))]
    async fn retrieve(&self, vector_store_id: &str) -> Result<Option<VectorStore>, OrgDeskError> {
        let response = self
            .request(Method::GET, &format!("/vector_stores/{}", vector_store_id))?
            .send()
            .await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        Ok(Some(Self::check(response).await?.json().await?))
    }

    #[instrument(skip(self, params))]
    async fn update(
        &self,
        vector_store_id: &str,
        params: VectorStoreParams,
    ) -> Result<VectorStore, OrgDeskError> {
        let response = self
            .request(Method::POST, &format!("/vector_stores/{}", vector_store_id))?
            .json(&params)
            .send()
            .await?;
        Ok(Self::check(response).await?.json().await?)
    }

    #[instrument(skip(self))]
    async fn delete(&self, vector_store_id: &str) -> Result<(), OrgDeskError> {
        let response = self
            .request(Method::DELETE, &format!("/vector_stores/{}", vector_store_id))?
            .send()
            .await?;
        Self::check(response).await?;
        info!(vector_store_id = %vector_store_id, "向量库已删除");
        Ok(())
    }

    #[instrument(skip(self, bytes), fields(size = bytes.len()))]
    async fn upload_file(
        &self,
        vector_store_id: &str,
        bytes: Bytes,
        file_name: &str,
    ) -> Result<String, OrgDeskError> {
        let part = multipart::Part::bytes(bytes.to_vec())
            .file_name(file_name.to_string())
            .mime_str("application/octet-stream")?;
        let form = multipart::Form::new()
            .text("purpose", "assistants")
            .part("file", part);

        let response = self
            .request(Method::POST, "/files")?
            .multipart(form)
            .send()
            .await?;
        let uploaded: FileObject = Self::check(response).await?.json().await?;

        self.attach_file(vector_store_id, &uploaded.id).await?;

        info!(file_id = %uploaded.id, vector_store_id = %vector_store_id, "文件已加入向量库");
        Ok(uploaded.id)
    }

    #[instrument(skip(self))]
    async fn upload_url(&self, vector_store_id: &str, url: &str) -> Result<String, OrgDeskError> {
        let response = self.http_client.get(url).send().await?;
        if !response.status().is_success() {
            return Err(OrgDeskError::external_service(
                "website",
                format!("Failed to fetch URL: {}", response.status()),
            ));
        }

        let content = response.text().await?;
        let file_name = file_name_from_url(url);
        debug!(file_name = %file_name, length = content.len(), "网页内容已抓取");

        self.upload_file(vector_store_id, Bytes::from(content), &file_name)
            .await
    }

    #[instrument(skip(self))]
    async fn list_files(&self, vector_store_id: &str) -> Result<Vec<VectorStoreFile>, OrgDeskError> {
        let response = self
            .request(Method::GET, &format!("/vector_stores/{}/files", vector_store_id))?
            .send()
            .await?;
        let list: FileList = Self::check(response).await?.json().await?;
        Ok(list.data)
    }

    #[instrument(skip(self))]
    async fn remove_file(&self, vector_store_id: &str, file_id: &str) -> Result<(), OrgDeskError> {
        let response = self
            .request(
                Method::DELETE,
                &format!("/vector_stores/{}/files/{}", vector_store_id, file_id),
            )?
            .send()
            .await?;
        Self::check(response).await?;
        Ok(())
    }
}

/// 取路径最后一段作为文件名，为空时用 `content.txt`
pub fn file_name_from_url(url: &str) -> String {
    url::Url::parse(url)
        .ok()
        .and_then(|parsed| {
            parsed
                .path_segments()
                .and_then(|mut segments| segments.next_back().map(str::to_string))
        })
        .filter(|segment| !segment.is_empty())
        .unwrap_or_else(|| DEFAULT_FILE_NAME.to_string())
}

/// 厂商错误体形如 `{"error": {"message": ...}}`
fn vendor_error_message(body: &str, status: StatusCode) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|value| value["error"]["message"].as_str().map(str::to_string))
        .unwrap_or_else(|| format!("Vector store request failed: {}", status))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;
    use wiremock::matchers::{body_string_contains, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client(server: &MockServer, api_key: &str) -> OpenAiVectorStoreClient {
        let mut config = AppConfig::default().vector_store;
        config.api_key = api_key.to_string();
        config.base_url = server.uri();
        OpenAiVectorStoreClient::new(&config).unwrap()
    }

    #[test]
    fn test_file_name_from_url() {
        assert_eq!(file_name_from_url("https://example.com/docs/guide.html"), "guide.html");
        assert_eq!(file_name_from_url("https://example.com/"), "content.txt");
        assert_eq!(file_name_from_url("https://example.com"), "content.txt");
    }

    #[tokio::test]
    async fn test_missing_api_key() {
        let server = MockServer::start().await;
        let err = client(&server, "")
            .create(VectorStoreParams::default())
            .await
            .unwrap_err();

        assert_eq!(err.message(), "OPENAI_API_KEY environment variable is not set");
    }

    #[tokio::test]
    async fn test_create_sends_beta_header() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/vector_stores"))
            .and(header("OpenAI-Beta", "assistants=v2"))
            .and(header("Authorization", "Bearer sk-test"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "id": "vs_123",
                "name": "Acme - Knowledge Base",
                "status": "completed",
                "created_at": 1700000000
            })))
            .expect(1)
            .mount(&server)
            .await;

        let store = client(&server, "sk-test")
            .create(VectorStoreParams {
                name: Some("Acme - Knowledge Base".to_string()),
                description: Some("Knowledge base for Acme".to_string()),
            })
            .await
            .unwrap();

        assert_eq!(store.id, "vs_123");
        assert_eq!(store.name.as_deref(), Some("Acme - Knowledge Base"));
    }

    #[tokio::test]
    async fn test_retrieve_not_found_is_none() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/vector_stores/vs_missing"))
            .respond_with(ResponseTemplate::new(404).set_body_json(serde_json::json!({
                "error": { "message": "No vector store found" }
            })))
            .mount(&server)
            .await;

        let result = client(&server, "sk-test").retrieve("vs_missing").await.unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn test_vendor_error_message() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path("/vector_stores/vs_1"))
            .respond_with(ResponseTemplate::new(400).set_body_json(serde_json::json!({
                "error": { "message": "Invalid vector store id" }
            })))
            .mount(&server)
            .await;

        let err = client(&server, "sk-test").delete("vs_1").await.unwrap_err();
        assert_eq!(err.status_code(), 502);
        assert_eq!(err.message(), "Invalid vector store id");
    }

    #[tokio::test]
    async fn test_upload_url_fetches_and_attaches() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/pages/about.html"))
            .respond_with(ResponseTemplate::new(200).set_body_string("About us"))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/files"))
            .and(body_string_contains("about.html"))
            .and(body_string_contains("assistants"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({ "id": "file-abc" })))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/vector_stores/vs_1/files"))
            .and(body_string_contains("file-abc"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({ "id": "file-abc" })))
            .expect(1)
            .mount(&server)
            .await;

        let url = format!("{}/pages/about.html", server.uri());
        let file_id = client(&server, "sk-test").upload_url("vs_1", &url).await.unwrap();
        assert_eq!(file_id, "file-abc");
    }

    #[tokio::test]
    async fn test_upload_url_fetch_failure() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/missing"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let url = format!("{}/missing", server.uri());
        let err = client(&server, "sk-test").upload_url("vs_1", &url).await.unwrap_err();
        assert_eq!(err.message(), "Failed to fetch URL: 404 Not Found");
    }

    #[tokio::test]
    async fn test_list_and_remove_files() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/vector_stores/vs_1/files"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "object": "list",
                "data": [{ "id": "file-1", "status": "completed" }, { "id": "file-2" }]
            })))
            .mount(&server)
            .await;
        Mock::given(method("DELETE"))
            .and(path("/vector_stores/vs_1/files/file-1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({ "deleted": true })))
            .expect(1)
            .mount(&server)
            .await;

        let client = client(&server, "sk-test");
        let files = client.list_files("vs_1").await.unwrap();
        assert_eq!(files.len(), 2);
        assert_eq!(files[1].status, None);

        client.remove_file("vs_1", "file-1").await.unwrap();
    }
}
