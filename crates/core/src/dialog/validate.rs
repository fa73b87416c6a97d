use chrono::NaiveDate;

use crate::config::DialogConfig;
use crate::domain::request::{SlotField, SlotValues};

/// Business hours for dining suggestions: bookings from 9:00 through 18:59.
const OPENING_HOUR: u32 = 9;
const CLOSING_HOUR: u32 = 18;

/// Outcome of one validation pass. Invalid results with no message tell the
/// dialog front-end to re-ask using the platform's own built-in prompt for
/// the violated slot.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ValidationResult {
    pub valid: bool,
    pub violated_field: Option<SlotField>,
    pub message: Option<String>,
}

impl ValidationResult {
    pub fn pass() -> Self {
        Self { valid: true, violated_field: None, message: None }
    }

    pub fn fail(field: SlotField, message: Option<String>) -> Self {
        Self { valid: false, violated_field: Some(field), message }
    }
}

/// Checks the collected slots in fixed order (cuisine, location, date, time)
/// and returns on the first violation; later slots are not examined that
/// turn. Absent slots never violate.
pub fn validate_dining_request(
    slots: &SlotValues,
    today: NaiveDate,
    config: &DialogConfig,
) -> ValidationResult {
    if let Some(cuisine) = slots.get(SlotField::Cuisine) {
        if !config.offers_cuisine(cuisine) {
            return ValidationResult::fail(
                SlotField::Cuisine,
                Some(format!(
                    "We do not have suggestions for {cuisine}, would you like a different \
                     cuisine? Our most popular cuisine is {}.",
                    config.default_cuisine()
                )),
            );
        }
    }

    if let Some(location) = slots.get(SlotField::Location) {
        if !location.eq_ignore_ascii_case(&config.location) {
            return ValidationResult::fail(
                SlotField::Location,
                Some(format!(
                    "We do not have suggestions in {location}, would you like a different \
                     location? Our most popular location is {}.",
                    config.location
                )),
            );
        }
    }

    if let Some(date) = slots.get(SlotField::DiningDate) {
        match NaiveDate::parse_from_str(date, "%Y-%m-%d") {
            Err(_) => {
                return ValidationResult::fail(
                    SlotField::DiningDate,
                    Some(
                        "I did not understand that, what date would you like for dining \
                         suggestions?"
                            .to_string(),
                    ),
                );
            }
            // No same-day bookings.
            Ok(parsed) if parsed <= today => {
                return ValidationResult::fail(
                    SlotField::DiningDate,
                    Some(
                        "Please choose a date from tomorrow onwards, what date would you like \
                         for dining suggestions?"
                            .to_string(),
                    ),
                );
            }
            Ok(_) => {}
        }
    }

    if let Some(time) = slots.get(SlotField::DiningTime) {
        match parse_clock(time) {
            None => {
                // Not a valid time; the platform's built-in prompt re-asks.
                return ValidationResult::fail(SlotField::DiningTime, None);
            }
            Some((hour, _minute)) if !(OPENING_HOUR..=CLOSING_HOUR).contains(&hour) => {
                return ValidationResult::fail(
                    SlotField::DiningTime,
                    Some(
                        "Our business hours are from nine a.m. to six p.m. Can you specify a \
                         time during this range?"
                            .to_string(),
                    ),
                );
            }
            Some(_) => {}
        }
    }

    ValidationResult::pass()
}

/// Accepts exactly `HH:MM` (5 characters, both components numeric).
fn parse_clock(time: &str) -> Option<(u32, u32)> {
    if time.len() != 5 {
        return None;
    }
    let (hour, minute) = time.split_once(':')?;
    Some((hour.parse().ok()?, minute.parse().ok()?))
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::{validate_dining_request, ValidationResult};
    use crate::config::DialogConfig;
    use crate::domain::request::{SlotField, SlotValues};

    fn config() -> DialogConfig {
        DialogConfig {
            cuisines: vec!["italian".to_string(), "thai".to_string(), "mexican".to_string()],
            location: "boston".to_string(),
            utc_offset_hours: -5,
        }
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 8, 30).expect("date")
    }

    fn slots() -> SlotValues {
        SlotValues {
            cuisine: Some("Italian".to_string()),
            location: Some("Boston".to_string()),
            party_size: Some("2".to_string()),
            dining_date: Some("2026-09-01".to_string()),
            dining_time: Some("12:00".to_string()),
            contact_handle: Some("+15550001111".to_string()),
        }
    }

    #[test]
    fn all_valid_slots_pass() {
        assert_eq!(
            validate_dining_request(&slots(), today(), &config()),
            ValidationResult::pass()
        );
    }

    #[test]
    fn empty_slots_pass_because_absence_is_not_a_violation() {
        assert_eq!(
            validate_dining_request(&SlotValues::default(), today(), &config()),
            ValidationResult::pass()
        );
    }

    #[test]
    fn unknown_cuisine_is_flagged_with_default_suggestion() {
        let mut input = slots();
        input.cuisine = Some("klingon".to_string());

        let result = validate_dining_request(&input, today(), &config());
        assert_eq!(result.violated_field, Some(SlotField::Cuisine));
        let message = result.message.expect("message");
        assert!(message.contains("klingon"));
        assert!(message.contains("italian"));
    }

    #[test]
    fn cuisine_membership_is_case_insensitive() {
        let mut input = slots();
        input.cuisine = Some("THAI".to_string());

        assert!(validate_dining_request(&input, today(), &config()).valid);
    }

    #[test]
    fn wrong_location_is_flagged_before_date_problems() {
        let mut input = slots();
        input.location = Some("seattle".to_string());
        input.dining_date = Some("not a date".to_string());

        let result = validate_dining_request(&input, today(), &config());
        assert_eq!(result.violated_field, Some(SlotField::Location));
    }

    #[test]
    fn unparseable_date_gets_generic_reprompt() {
        let mut input = slots();
        input.dining_date = Some("next friday-ish".to_string());

        let result = validate_dining_request(&input, today(), &config());
        assert_eq!(result.violated_field, Some(SlotField::DiningDate));
        assert!(result.message.expect("message").contains("did not understand"));
    }

    #[test]
    fn same_day_booking_is_rejected() {
        let mut input = slots();
        input.dining_date = Some("2026-08-30".to_string());

        let result = validate_dining_request(&input, today(), &config());
        assert_eq!(result.violated_field, Some(SlotField::DiningDate));
        assert!(result.message.expect("message").contains("tomorrow onwards"));
    }

    #[test]
    fn past_date_is_rejected() {
        let mut input = slots();
        input.dining_date = Some("2020-01-01".to_string());

        let result = validate_dining_request(&input, today(), &config());
        assert_eq!(result.violated_field, Some(SlotField::DiningDate));
    }

    #[test]
    fn tomorrow_is_accepted() {
        let mut input = slots();
        input.dining_date = Some("2026-08-31".to_string());

        assert!(validate_dining_request(&input, today(), &config()).valid);
    }

    #[test]
    fn wrong_length_time_has_no_custom_message() {
        for raw in ["9:00", "12:000", "noon"] {
            let mut input = slots();
            input.dining_time = Some(raw.to_string());

            let result = validate_dining_request(&input, today(), &config());
            assert_eq!(result.violated_field, Some(SlotField::DiningTime), "time {raw}");
            assert_eq!(result.message, None, "time {raw}");
        }
    }

    #[test]
    fn non_numeric_time_components_have_no_custom_message() {
        let mut input = slots();
        input.dining_time = Some("ab:cd".to_string());

        let result = validate_dining_request(&input, today(), &config());
        assert_eq!(result.violated_field, Some(SlotField::DiningTime));
        assert_eq!(result.message, None);
    }

    #[test]
    fn time_outside_business_hours_gets_hours_message() {
        for raw in ["08:59", "19:00", "23:30"] {
            let mut input = slots();
            input.dining_time = Some(raw.to_string());

            let result = validate_dining_request(&input, today(), &config());
            assert_eq!(result.violated_field, Some(SlotField::DiningTime), "time {raw}");
            assert!(result.message.expect("message").contains("business hours"), "time {raw}");
        }
    }

    #[test]
    fn business_hour_boundaries_are_inclusive() {
        for raw in ["09:00", "18:59"] {
            let mut input = slots();
            input.dining_time = Some(raw.to_string());

            assert!(validate_dining_request(&input, today(), &config()).valid, "time {raw}");
        }
    }

    #[test]
    fn validation_short_circuits_on_first_violation() {
        let mut input = slots();
        input.cuisine = Some("klingon".to_string());
        input.dining_time = Some("bad".to_string());

        let result = validate_dining_request(&input, today(), &config());
        assert_eq!(result.violated_field, Some(SlotField::Cuisine));
    }
}
