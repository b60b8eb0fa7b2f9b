//! Triggered message automations

use serde::{Deserialize, Serialize};

use crate::impl_domain_status_conversions;

/// Storefront event that starts an automation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AutomationTrigger {
    Welcome,
    AbandonedCart,
    OrderConfirmation,
    ShippingUpdate,
    WinBack,
}

impl_domain_status_conversions!(AutomationTrigger {
    Welcome => "welcome",
    AbandonedCart => "abandoned_cart",
    OrderConfirmation => "order_confirmation",
    ShippingUpdate => "shipping_update",
    WinBack => "win_back",
});

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Automation {
    pub id: String,
    pub name: String,
    pub trigger: AutomationTrigger,
    pub message: String,
    /// Wait between the trigger event and the send
    #[serde(default)]
    pub delay_minutes: u32,
    #[serde(default)]
    pub active: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AutomationUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delay_minutes: Option<u32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AutomationToggle {
    pub active: bool,
}
