//! Human-readable payment description.

use crate::models::receipt::Category;

use super::rules::format_clp;

/// Build the description from already-resolved fields.
///
/// Nothing is produced without a finite amount.
pub fn describe(
    vendor: Option<&str>,
    amount: Option<f64>,
    category: Option<Category>,
) -> Option<String> {
    let amount = format_clp(amount?)?;

    let description = match (vendor, category) {
        (Some(vendor), Some(category)) => {
            format!("Pago a {} ({}) por ${}", vendor, category, amount)
        }
        (Some(vendor), None) => format!("Pago a {} por ${}", vendor, amount),
        (None, Some(category)) => format!("Pago ({}) por ${}", category, amount),
        (None, None) => format!("Pago por ${}", amount),
    };

    Some(description)
}
