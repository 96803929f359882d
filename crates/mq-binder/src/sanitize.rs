//! MQ object-name sanitisation.
//!
//! Queue, topic, and subscription names are limited to 48 characters drawn
//! from `A-Z a-z 0-9 . / _ %`. Binding names come from application
//! configuration and routinely break both rules, so every name is passed
//! through [`sanitise_object_name`] before it reaches the queue manager.

use mq_binder_admin::{is_object_name_char, MQ_OBJECT_NAME_LENGTH};

/// Maximum length of a sanitised object name.
pub const MAX_OBJECT_NAME_LENGTH: usize = MQ_OBJECT_NAME_LENGTH;

/// Derive a legal MQ object name from `candidate`.
///
/// Illegal characters (including all whitespace) are dropped. If the result
/// is still longer than [`MAX_OBJECT_NAME_LENGTH`], leading characters are
/// cut so the most specific suffix (`<topic>.<group>`) survives.
///
/// ```rust
/// use mq_binder::sanitise_object_name;
///
/// assert_eq!(sanitise_object_name("orders-out.billing"), "ordersout.billing");
/// ```
pub fn sanitise_object_name(candidate: &str) -> String {
    let sanitised: String = candidate.chars().filter(|c| is_object_name_char(*c)).collect();
    // Only ASCII survives the filter, so byte offsets are char offsets.
    match sanitised.len().checked_sub(MAX_OBJECT_NAME_LENGTH) {
        Some(excess) if excess > 0 => sanitised[excess..].to_string(),
        _ => sanitised,
    }
}
