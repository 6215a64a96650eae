use chrono::{DateTime, Utc};

/// Day-first rendering used in outbound wholesaler mail and admin listings.
pub fn format_order_date(value: &DateTime<Utc>) -> String {
    value.format("%d-%m-%Y %H:%M").to_string()
}
