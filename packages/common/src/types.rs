// 通用类型定义

use serde::{Deserialize, Serialize};

/// 默认每页数量
pub const DEFAULT_PAGE_SIZE: u64 = 10;
/// 查询参数允许的最小每页数量
pub const MIN_PAGE_SIZE: u64 = 5;
/// 每页数量上限
pub const MAX_PAGE_SIZE: u64 = 100;

/// 列表查询的原始参数（字符串形式，容忍非法输入）
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListQueryParams {
    pub page: Option<String>,
    pub page_size: Option<String>,
    pub q: Option<String>,
}

/// 规范化后的列表查询
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListQuery {
    pub page: u64,
    pub page_size: u64,
    pub q: String,
}

impl ListQuery {
    /// 从查询字符串参数构建
    ///
    /// 无法解析或为 0 的值回退到默认值；页码至少为 1，
    /// 每页数量限制在 5..=100。
    pub fn from_params(params: &ListQueryParams) -> Self {
        let page = parse_non_zero(params.page.as_deref()).unwrap_or(1).max(1) as u64;

        let page_size = parse_non_zero(params.page_size.as_deref())
            .unwrap_or(DEFAULT_PAGE_SIZE as i64)
            .clamp(MIN_PAGE_SIZE as i64, MAX_PAGE_SIZE as i64) as u64;

        let q = params
            .q
            .as_deref()
            .map(str::trim)
            .unwrap_or_default()
            .to_string();

        Self { page, page_size, q }
    }

    /// 偏移量
    pub fn offset(&self) -> u64 {
        (self.page - 1) * self.page_size
    }

    /// 是否带搜索关键词
    pub fn has_search(&self) -> bool {
        !self.q.is_empty()
    }
}

impl Default for ListQuery {
    fn default() -> Self {
        Self {
            page: 1,
            page_size: DEFAULT_PAGE_SIZE,
            q: String::new(),
        }
    }
}

fn parse_non_zero(raw: Option<&str>) -> Option<i64> {
    raw.and_then(|value| value.trim().parse::<i64>().ok())
        .filter(|value| *value != 0)
}

/// 分页响应
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaginatedResponse<T> {
    pub data: Vec<T>,
    pub total: u64,
    pub page: u64,
    pub page_size: u64,
    pub total_pages: u64,
}

impl<T> PaginatedResponse<T> {
    pub fn new(data: Vec<T>, total: u64, page: u64, page_size: u64) -> Self {
        let total_pages = if page_size == 0 {
            0
        } else {
            total.div_ceil(page_size)
        };
        Self {
            data,
            total,
            page,
            page_size,
            total_pages,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(page: Option<&str>, page_size: Option<&str>, q: Option<&str>) -> ListQueryParams {
        ListQueryParams {
            page: page.map(String::from),
            page_size: page_size.map(String::from),
            q: q.map(String::from),
        }
    }

    #[test]
    fn test_list_query_defaults() {
        let query = ListQuery::from_params(&ListQueryParams::default());
        assert_eq!(query, ListQuery::default());
        assert_eq!(query.offset(), 0);
    }

    #[test]
    fn test_list_query_clamps_values() {
        let query = ListQuery::from_params(&params(Some("-4"), Some("1000"), Some("  acme  ")));
        assert_eq!(query.page, 1);
        assert_eq!(query.page_size, 100);
        assert_eq!(query.q, "acme");

        let query = ListQuery::from_params(&params(Some("3"), Some("2"), None));
        assert_eq!(query.page, 3);
        assert_eq!(query.page_size, 5);
        assert_eq!(query.offset(), 10);
    }

    #[test]
    fn test_list_query_invalid_numbers_fall_back() {
        let query = ListQuery::from_params(&params(Some("abc"), Some("0"), Some("")));
        assert_eq!(query.page, 1);
        assert_eq!(query.page_size, 10);
        assert!(!query.has_search());
    }

    #[test]
    fn test_paginated_response_total_pages() {
        let page = PaginatedResponse::new(vec![1, 2, 3], 21, 1, 10);
        assert_eq!(page.total_pages, 3);

        let json = serde_json::to_value(&page).unwrap();
        assert_eq!(json["pageSize"], 10);
    }
}
