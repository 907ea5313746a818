//! API response wrapper types.
//!
//! Provides a unified response format for all API endpoints.

use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;

/// Standard API response wrapper.
///
/// All API endpoints return responses in this format for consistency.
#[derive(Debug, Serialize, ToSchema)]
pub struct ApiResponse<T: Serialize> {
    /// Whether the request was successful.
    pub success: bool,

    /// Response data (present on success).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,

    /// Error details (present on failure).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ApiError>,

    /// Response metadata.
    pub meta: ResponseMeta,
}

/// API error details.
#[derive(Debug, Serialize, ToSchema)]
pub struct ApiError {
    /// Error code for client handling (e.g., "LOGIN_REQUIRED", "VALIDATION_ERROR").
    pub code: String,

    /// Human-readable error message.
    pub message: String,
}

/// Response metadata.
#[derive(Debug, Serialize, ToSchema)]
pub struct ResponseMeta {
    /// Request ID for tracing.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,

    /// Response timestamp.
    pub timestamp: DateTime<Utc>,

    /// Service name that handled the request.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub service: Option<String>,
}

impl Default for ResponseMeta {
    fn default() -> Self {
        Self {
            request_id: None,
            timestamp: Utc::now(),
            service: None,
        }
    }
}

/// Offset/limit paging information for navigation listings.
///
/// The navigation tree paginates by absolute offset (the `pos` family of
/// parameters), not by page number.
#[derive(Debug, Serialize, ToSchema)]
pub struct PageInfo {
    /// Offset of the first returned item.
    pub pos: u32,

    /// Configured page size.
    pub page_size: u32,

    /// Total number of matching items, when the strategy can know it
    /// without a second query.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total: Option<u64>,

    /// Whether more items exist past this page.
    pub has_more: bool,
}

/// A single page of items plus its paging information.
#[derive(Debug, Serialize, ToSchema)]
pub struct PagedData<T: Serialize> {
    /// Items within the requested page.
    pub items: Vec<T>,

    /// Paging information.
    pub page: PageInfo,
}

impl<T: Serialize> PagedData<T> {
    /// Creates a page with a known total count.
    pub fn with_total(items: Vec<T>, pos: u32, page_size: u32, total: u64) -> Self {
        let has_more = (pos as u64 + items.len() as u64) < total;
        Self {
            items,
            page: PageInfo {
                pos,
                page_size,
                total: Some(total),
                has_more,
            },
        }
    }

    /// Creates a page where only "is there another page" is known.
    pub fn open_ended(items: Vec<T>, pos: u32, page_size: u32, has_more: bool) -> Self {
        Self {
            items,
            page: PageInfo {
                pos,
                page_size,
                total: None,
                has_more,
            },
        }
    }
}

impl<T: Serialize> ApiResponse<T> {
    /// Creates a successful response with data.
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            meta: ResponseMeta::default(),
        }
    }

    /// Creates a successful response with data and service name.
    pub fn ok_with_service(data: T, service: impl Into<String>) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            meta: ResponseMeta {
                service: Some(service.into()),
                ..Default::default()
            },
        }
    }

    /// Sets the request ID on the response.
    pub fn with_request_id(mut self, request_id: impl Into<String>) -> Self {
        self.meta.request_id = Some(request_id.into());
        self
    }
}

impl ApiResponse<()> {
    /// Creates an error response.
    pub fn err(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(ApiError {
                code: code.into(),
                message: message.into(),
            }),
            meta: ResponseMeta::default(),
        }
    }

    /// Creates a success response without data.
    pub fn success() -> Self {
        Self {
            success: true,
            data: None,
            error: None,
            meta: ResponseMeta::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paged_data_with_total() {
        let page = PagedData::with_total(vec!["a", "b"], 0, 2, 5);
        assert!(page.page.has_more);
        assert_eq!(page.page.total, Some(5));

        let last = PagedData::with_total(vec!["e"], 4, 2, 5);
        assert!(!last.page.has_more);
    }

    #[test]
    fn test_error_envelope_shape() {
        let resp = ApiResponse::err("LOGIN_REQUIRED", "no cookie");
        assert!(!resp.success);
        assert_eq!(resp.error.as_ref().unwrap().code, "LOGIN_REQUIRED");
        assert!(resp.data.is_none());
    }
}
