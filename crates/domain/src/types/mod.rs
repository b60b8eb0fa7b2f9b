//! Domain types and models
//!
//! Wire DTOs exchanged by the typed operation facade. Field names follow
//! the backend's snake_case JSON.

pub mod automation;
pub mod campaign;
pub mod contact;
pub mod discount;
pub mod segment;
pub mod shop;

use serde::{Deserialize, Serialize};

pub use automation::{Automation, AutomationToggle, AutomationTrigger, AutomationUpdate};
pub use campaign::{
    Campaign, CampaignFilter, CampaignStats, CampaignStatus, CampaignUpdate, NewCampaign,
    SendReceipt, TestMessageRequest,
};
pub use contact::{ConsentStatus, Contact, ContactFilter, ContactUpdate, NewContact};
pub use discount::{Discount, DiscountKind, DiscountUpdate, NewDiscount};
pub use segment::{
    NewSegment, Segment, SegmentCondition, SegmentPreview, SegmentPreviewRequest, SegmentUpdate,
};
pub use shop::ShopDomain;

/// Paginated list envelope used by every list endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    #[serde(default)]
    pub total: u64,
    #[serde(default = "first_page")]
    pub page: u32,
    #[serde(default)]
    pub limit: u32,
}

impl<T> Page<T> {
    /// Whether more items exist past this page
    pub fn has_more(&self) -> bool {
        let seen = u64::from(self.page.saturating_sub(1)) * u64::from(self.limit)
            + self.items.len() as u64;
        seen < self.total
    }
}

const fn first_page() -> u32 {
    1
}

/// Acknowledgement returned by delete and test-send endpoints
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Acknowledgement {
    #[serde(default)]
    pub success: bool,
}

/// Response of the `/health` endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthStatus {
    pub status: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_defaults_when_metadata_missing() {
        let page: Page<String> = serde_json::from_str(r#"{"items": ["a", "b"]}"#).unwrap();
        assert_eq!(page.page, 1);
        assert_eq!(page.total, 0);
        assert!(!page.has_more());
    }

    #[test]
    fn page_reports_remaining_items() {
        let page = Page { items: vec![1, 2], total: 5, page: 1, limit: 2 };
        assert!(page.has_more());

        let last = Page { items: vec![5], total: 5, page: 3, limit: 2 };
        assert!(!last.has_more());
    }
}
