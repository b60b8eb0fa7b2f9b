//! Tenant (shop) resolution
//!
//! The hosting page supplies its current inputs through a [`PageContext`];
//! [`ShopResolver`] turns them into a validated [`ShopDomain`]. Resolution
//! is pure: no I/O, no errors, and the same inputs always give the same
//! answer.
//!
//! Priority, first match wins:
//! 1. the tenant supplied by the calling context
//! 2. the `shop` query parameter of the page URL
//! 3. the `host` query parameter, base64-decoded to a URL whose hostname
//!    has at least three labels
//!
//! Every candidate must end with the configured domain suffix.

use std::sync::Arc;

use base64::alphabet;
use base64::engine::general_purpose::{GeneralPurpose, GeneralPurposeConfig};
use base64::engine::DecodePaddingMode;
use base64::Engine as _;
use parking_lot::RwLock;
use smsdesk_domain::constants::{
    DEFAULT_SHOP_DOMAIN_SUFFIX, HOST_QUERY_PARAM, SHOP_QUERY_PARAM,
};
use smsdesk_domain::ShopDomain;
use tracing::trace;
use url::Url;

const LENIENT_PADDING: GeneralPurposeConfig =
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent);

const HOST_ENGINES: [GeneralPurpose; 2] = [
    GeneralPurpose::new(&alphabet::STANDARD, LENIENT_PADDING),
    GeneralPurpose::new(&alphabet::URL_SAFE, LENIENT_PADDING),
];

/// Base used to read query parameters from relative page URLs (`?shop=..`)
const RELATIVE_URL_BASE: &str = "http://localhost/";

const MIN_HOST_LABELS: usize = 3;

/// Inputs the hosting page exposes for tenant resolution
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ShopInputs {
    /// Tenant explicitly supplied by the hosting page
    pub context_shop: Option<String>,
    /// Current page URL, absolute or query-only
    pub page_url: Option<String>,
}

impl ShopInputs {
    /// No inputs
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the tenant supplied by the hosting page
    pub fn with_context_shop(mut self, shop: impl Into<String>) -> Self {
        self.context_shop = Some(shop.into());
        self
    }

    /// Set the current page URL
    pub fn with_page_url(mut self, url: impl Into<String>) -> Self {
        self.page_url = Some(url.into());
        self
    }
}

/// Source of the current [`ShopInputs`]; read once per logical operation
pub trait PageContext: Send + Sync {
    fn shop_inputs(&self) -> ShopInputs;
}

/// Fixed inputs
#[derive(Debug, Clone, Default)]
pub struct StaticPageContext {
    inputs: ShopInputs,
}

impl StaticPageContext {
    /// Context that always reports `inputs`
    pub fn new(inputs: ShopInputs) -> Self {
        Self { inputs }
    }

    /// Context with no tenant information
    pub fn empty() -> Self {
        Self::default()
    }
}

impl PageContext for StaticPageContext {
    fn shop_inputs(&self) -> ShopInputs {
        self.inputs.clone()
    }
}

/// Inputs that the hosting page updates as it navigates.
///
/// Clones share state.
#[derive(Debug, Clone, Default)]
pub struct SharedPageContext {
    inputs: Arc<RwLock<ShopInputs>>,
}

impl SharedPageContext {
    /// Context starting from `inputs`
    pub fn new(inputs: ShopInputs) -> Self {
        Self { inputs: Arc::new(RwLock::new(inputs)) }
    }

    /// Replace the hosting page's tenant
    pub fn set_context_shop(&self, shop: Option<String>) {
        self.inputs.write().context_shop = shop;
    }

    /// Replace the current page URL
    pub fn set_page_url(&self, url: Option<String>) {
        self.inputs.write().page_url = url;
    }

    /// Replace all inputs at once
    pub fn replace(&self, inputs: ShopInputs) {
        *self.inputs.write() = inputs;
    }
}

impl PageContext for SharedPageContext {
    fn shop_inputs(&self) -> ShopInputs {
        self.inputs.read().clone()
    }
}

/// Resolves the tenant for one operation
#[derive(Debug, Clone)]
pub struct ShopResolver {
    suffix: String,
}

impl Default for ShopResolver {
    fn default() -> Self {
        Self::new(DEFAULT_SHOP_DOMAIN_SUFFIX)
    }
}

impl ShopResolver {
    /// Resolver accepting tenants ending in `suffix`
    pub fn new(suffix: impl Into<String>) -> Self {
        Self { suffix: suffix.into() }
    }

    /// Required domain suffix
    pub fn suffix(&self) -> &str {
        &self.suffix
    }

    /// Resolve the tenant from `inputs`, or `None` when nothing matches
    pub fn resolve(&self, inputs: &ShopInputs) -> Option<ShopDomain> {
        if let Some(shop) = inputs
            .context_shop
            .as_deref()
            .and_then(|candidate| ShopDomain::parse(candidate, &self.suffix))
        {
            trace!(shop = %shop, "tenant resolved from page context");
            return Some(shop);
        }

        let page_url = inputs.page_url.as_deref().and_then(parse_page_url)?;

        if let Some(shop) = query_param(&page_url, SHOP_QUERY_PARAM)
            .and_then(|candidate| ShopDomain::parse(&candidate, &self.suffix))
        {
            trace!(shop = %shop, "tenant resolved from shop parameter");
            return Some(shop);
        }

        let shop = query_param(&page_url, HOST_QUERY_PARAM)
            .and_then(|encoded| self.shop_from_host(&encoded));
        if let Some(shop) = &shop {
            trace!(shop = %shop, "tenant resolved from host parameter");
        }
        shop
    }

    /// [`ShopResolver::resolve`] as a string; empty when unresolved
    pub fn resolve_str(&self, inputs: &ShopInputs) -> String {
        self.resolve(inputs).map(|shop| shop.as_str().to_string()).unwrap_or_default()
    }

    fn shop_from_host(&self, encoded: &str) -> Option<ShopDomain> {
        let decoded = decode_host(encoded)?;
        let decoded = decoded.trim();
        let url = if decoded.contains("://") {
            Url::parse(decoded)
        } else {
            Url::parse(&format!("https://{decoded}"))
        }
        .ok()?;

        let hostname = url.host_str()?;
        if hostname.split('.').filter(|label| !label.is_empty()).count() < MIN_HOST_LABELS {
            return None;
        }
        ShopDomain::parse(hostname, &self.suffix)
    }
}

fn parse_page_url(raw: &str) -> Option<Url> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    Url::parse(raw).ok().or_else(|| Url::parse(RELATIVE_URL_BASE).ok()?.join(raw).ok())
}

fn query_param(url: &Url, name: &str) -> Option<String> {
    url.query_pairs()
        .find(|(key, _)| key == name)
        .map(|(_, value)| value.into_owned())
        .filter(|value| !value.trim().is_empty())
}

fn decode_host(encoded: &str) -> Option<String> {
    // Form decoding turns an unescaped '+' into a space
    let normalized: String =
        encoded.trim().chars().map(|c| if c == ' ' { '+' } else { c }).collect();

    HOST_ENGINES
        .iter()
        .find_map(|engine| engine.decode(normalized.as_bytes()).ok())
        .and_then(|bytes| String::from_utf8(bytes).ok())
}
