//! Application constants
//!
//! Centralized location for wire-level constants shared by the client and
//! its tests.

// Request headers
pub const HEADER_AUTHORIZATION: &str = "Authorization";
pub const HEADER_SHOP_DOMAIN: &str = "X-Shop-Domain";
pub const HEADER_REQUEST_ID: &str = "X-Request-ID";
pub const HEADER_CONTENT_TYPE: &str = "Content-Type";
pub const HEADER_RETRY_AFTER: &str = "Retry-After";
pub const CONTENT_TYPE_JSON: &str = "application/json";

// Tenant resolution
pub const SHOP_QUERY_PARAM: &str = "shop";
pub const HOST_QUERY_PARAM: &str = "host";
pub const DEFAULT_SHOP_DOMAIN_SUFFIX: &str = ".myshopify.com";

// Client defaults
pub const DEFAULT_API_BASE_URL: &str = "https://api.smsdesk.app/v1";
pub const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 30_000;
pub const DEFAULT_MAX_RETRIES: u32 = 3;
pub const DEFAULT_RETRY_BASE_DELAY_MS: u64 = 1_000;
pub const DEFAULT_RETRY_MAX_DELAY_MS: u64 = 30_000;

// Event emission
pub const EVENT_API_ERROR: &str = "api-error";
pub const EVENT_BUS_CAPACITY: usize = 64;
