//! Macro for implementing Display and FromStr for wire-level enums
//!
//! Status and trigger enums travel as lowercase snake_case strings both in
//! JSON bodies and in query parameters (`?status=scheduled`). The macro
//! keeps the two representations in one place.
//!
//! # Example
//!
//! ```rust
//! use smsdesk_domain::impl_domain_status_conversions;
//!
//! #[derive(Debug, Clone, Copy, PartialEq, Eq)]
//! pub enum DeliveryState {
//!     Queued,
//!     Delivered,
//!     Undeliverable,
//! }
//!
//! impl_domain_status_conversions!(DeliveryState {
//!     Queued => "queued",
//!     Delivered => "delivered",
//!     Undeliverable => "undeliverable",
//! });
//!
//! assert_eq!(DeliveryState::Queued.to_string(), "queued");
//! assert_eq!("DELIVERED".parse::<DeliveryState>().unwrap(), DeliveryState::Delivered);
//! ```

/// Implements Display and FromStr traits for wire-level enums
///
/// Parsing is case-insensitive; display is the exact string given in the
/// mapping. Unknown strings produce `Err("Invalid <Enum>: <input>")`.
#[macro_export]
macro_rules! impl_domain_status_conversions {
    ($enum_name:ident { $($variant:ident => $str:literal),+ $(,)? }) => {
        impl $enum_name {
            /// Wire representation of this value
            pub const fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $str,)+
                }
            }
        }

        impl std::fmt::Display for $enum_name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl std::str::FromStr for $enum_name {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s.trim().to_lowercase().as_str() {
                    $($str => Ok(Self::$variant),)+
                    _ => Err(format!("Invalid {}: {}", stringify!($enum_name), s)),
                }
            }
        }
    };
}
