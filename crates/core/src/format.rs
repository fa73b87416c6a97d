use std::fmt::Write as _;

use crate::domain::request::DiningRequest;
use crate::domain::restaurant::RestaurantRecord;

/// Composes the notification text for a resolved set of recommendations.
///
/// Deterministic concatenation: a header naming every request parameter, one
/// numbered sentence per record, then a closing sentence.
pub fn format_recommendations(request: &DiningRequest, records: &[RestaurantRecord]) -> String {
    let mut message = format!(
        "Hello! Here are my {} restaurant suggestions in {} for {} people, for {} at {}: ",
        request.cuisine,
        request.location,
        request.party_size,
        request.dining_date.format("%Y-%m-%d"),
        request.dining_time,
    );
    for (index, record) in records.iter().enumerate() {
        let _ = write!(
            message,
            "{}. {}, located at {}. ",
            index + 1,
            record.name,
            record.address.join(" "),
        );
    }
    message.push_str("Enjoy your meal!");
    message
}
