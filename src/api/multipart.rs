// multipart 表单读取

use std::collections::HashMap;

use actix_multipart::Multipart;
use bytes::BytesMut;
use futures::StreamExt;

use crate::errors::OrgDeskError;
use crate::services::IncomingFile;

/// 已读入内存的表单
#[derive(Debug, Default)]
pub struct MultipartForm {
    fields: HashMap<String, String>,
    files: HashMap<String, IncomingFile>,
}

impl MultipartForm {
    /// 读取全部字段；带文件名的字段视为文件，单个文件不得超过 `max_file_size`
    pub async fn read(mut payload: Multipart, max_file_size: usize) -> Result<Self, OrgDeskError> {
        let mut form = Self::default();

        while let Some(field) = payload.next().await {
            let mut field = field.map_err(|e| OrgDeskError::validation("body", e.to_string()))?;
            let name = field.name().to_string();
            let file_name = field
                .content_disposition()
                .get_filename()
                .map(str::to_string);
            let mime_type = field.content_type().map(|ct| ct.to_string());

            let mut data = BytesMut::new();
            while let Some(chunk) = field.next().await {
                let chunk = chunk.map_err(|e| OrgDeskError::validation(name.as_str(), e.to_string()))?;
                if data.len() + chunk.len() > max_file_size {
                    return Err(OrgDeskError::file_processing_with_name(
                        format!("File exceeds the maximum size of {} bytes", max_file_size),
                        file_name.clone().unwrap_or_else(|| name.clone()),
                    ));
                }
                data.extend_from_slice(&chunk);
            }

            match file_name {
                Some(file_name) => {
                    form.files.insert(
                        name,
                        IncomingFile {
                            bytes: data.freeze(),
                            file_name,
                            mime_type,
                        },
                    );
                }
                None => {
                    form.fields
                        .insert(name, String::from_utf8_lossy(&data).into_owned());
                }
            }
        }

        Ok(form)
    }

    /// 去除首尾空白后的文本字段，空串视为缺失
    pub fn text(&self, name: &str) -> Option<&str> {
        self.fields
            .get(name)
            .map(|value| value.trim())
            .filter(|value| !value.is_empty())
    }

    /// 取出非空文件
    pub fn take_file(&mut self, name: &str) -> Option<IncomingFile> {
        self.files.remove(name).filter(|file| !file.bytes.is_empty())
    }

    #[cfg(test)]
    pub fn from_parts(fields: Vec<(&str, &str)>, files: Vec<(&str, &'static [u8])>) -> Self {
        Self {
            fields: fields
                .into_iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            files: files
                .into_iter()
                .map(|(k, v)| {
                    (
                        k.to_string(),
                        IncomingFile {
                            bytes: bytes::Bytes::from_static(v),
                            file_name: format!("{}.bin", k),
                            mime_type: None,
                        },
                    )
                })
                .collect(),
        }
    }
}

/// 解析布尔字段，接受 true/1/on
pub fn parse_flag(value: Option<&str>) -> bool {
    matches!(
        value.map(|v| v.to_ascii_lowercase()).as_deref(),
        Some("true") | Some("1") | Some("on")
    )
}
