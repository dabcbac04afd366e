/// Domain layer
///
/// Entity definitions, status lifecycles and the pure computations the
/// services persist: budget totals and alerts, progress percentages and
/// overdue checks. Nothing in here touches the database.

pub mod budget;
pub mod document;
pub mod milestone;
pub mod photo;
pub mod progress;
pub mod project;
pub mod resource;
pub mod supplier;
pub mod task;
pub mod template;
pub mod user;

pub use budget::{Budget, BudgetAlert, BudgetItem, BudgetTotals, BudgetView};
pub use document::{Document, DocumentKind};
pub use milestone::{Milestone, MilestoneStatus};
pub use photo::{Photo, PhotoMetadata};
pub use progress::ProgressSummary;
pub use project::{Project, ProjectStatus};
pub use resource::{Resource, ResourceKind, ResourceStatus, ResourceView};
pub use supplier::Supplier;
pub use task::{Task, TaskPriority, TaskStatus};
pub use template::WorkItemTemplate;
pub use user::{Session, User};

use serde::{Deserialize, Deserializer};

/// Deserialize a field that distinguishes "absent" from "explicitly null".
///
/// Used with `#[serde(default, deserialize_with = "double_option")]` on update
/// payloads: missing keeps the stored value, `null` clears it.
pub(crate) fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// Round a monetary amount to cents
pub fn round_cents(amount: f64) -> f64 {
    (amount * 100.0).round() / 100.0
}

/// Trim a free-text field, turning blank strings into `None`
pub(crate) fn non_blank(value: Option<String>) -> Option<String> {
    value.and_then(|v| {
        let trimmed = v.trim();
        (!trimmed.is_empty()).then(|| trimmed.to_string())
    })
}

/// Validate a monetary amount: finite and not negative
pub(crate) fn validate_amount(field: &str, amount: f64) -> crate::error::ServiceResult<()> {
    if !amount.is_finite() || amount < 0.0 {
        return Err(crate::error::ServiceError::validation(format!(
            "{field} must be a non-negative number"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Deserialize)]
    struct Patch {
        #[serde(default, deserialize_with = "double_option")]
        price: Option<Option<f64>>,
    }

    #[test]
    fn double_option_separates_missing_from_null() {
        let missing: Patch = serde_json::from_str("{}").unwrap();
        assert_eq!(missing.price, None);

        let cleared: Patch = serde_json::from_str(r#"{"price": null}"#).unwrap();
        assert_eq!(cleared.price, Some(None));

        let set: Patch = serde_json::from_str(r#"{"price": 12.5}"#).unwrap();
        assert_eq!(set.price, Some(Some(12.5)));
    }

    #[test]
    fn cents_rounding() {
        assert_eq!(round_cents(0.1 + 0.2), 0.3);
        assert_eq!(round_cents(10.005_1), 10.01);
    }

    #[test]
    fn amounts_must_be_finite_and_positive() {
        assert!(validate_amount("cost", 0.0).is_ok());
        assert!(validate_amount("cost", -1.0).is_err());
        assert!(validate_amount("cost", f64::NAN).is_err());
        assert!(validate_amount("cost", f64::INFINITY).is_err());
    }

    #[test]
    fn blank_text_becomes_none() {
        assert_eq!(non_blank(Some("   ".into())), None);
        assert_eq!(non_blank(Some(" Kitchen ".into())), Some("Kitchen".into()));
        assert_eq!(non_blank(None), None);
    }
}
