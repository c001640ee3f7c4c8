//! Meal time selection and display
//!
//! Everything is stored in UTC. The user's timezone preference only affects
//! how typed times are interpreted and how stored times are shown.

use super::action::TimeChoice;
use chrono::{DateTime, Duration, NaiveDateTime, SecondsFormat, TimeZone, Utc};
use chrono_tz::Tz;

/// Format of typed custom times and of displayed times
pub const CUSTOM_TIME_FORMAT: &str = "%Y-%m-%d %H:%M";

/// Width of the raw fallback display (`YYYY-MM-DDTHH:MM`)
const RAW_DISPLAY_WIDTH: usize = 16;

/// Resolve a relative choice against `now`; `None` for custom/skip
pub fn resolve_choice(choice: TimeChoice, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
    choice.minutes_ago().map(|m| now - Duration::minutes(m))
}

/// Parse a typed `YYYY-MM-DD HH:MM` in the user's zone (UTC when unset)
///
/// Returns `None` for unparsable input and for local times that do not exist
/// (DST gaps). Ambiguous local times resolve to the earlier instant.
pub fn parse_custom(input: &str, zone: Option<&str>) -> Option<DateTime<Utc>> {
    let naive = NaiveDateTime::parse_from_str(input.trim(), CUSTOM_TIME_FORMAT).ok()?;

    let tz = zone.and_then(|z| match z.parse::<Tz>() {
        Ok(tz) => Some(tz),
        Err(_) => {
            log::warn!("[DIARY] Unknown timezone '{}', reading custom time as UTC", z);
            None
        }
    });

    match tz {
        Some(tz) => tz
            .from_local_datetime(&naive)
            .earliest()
            .map(|local| local.with_timezone(&Utc)),
        None => Some(Utc.from_utc_datetime(&naive)),
    }
}

/// Render a stored instant for the user
///
/// Unset zone: `2024-01-15 14:30 UTC`. Known zone: `2024-01-15 15:30 (Europe/Berlin)`.
/// Unknown zone: the raw stored value cut to `2024-01-15T14:30`, with a warning.
pub fn format_for_user(datetime_utc: &DateTime<Utc>, zone: Option<&str>) -> String {
    let Some(zone) = zone else {
        return format!("{} UTC", datetime_utc.format(CUSTOM_TIME_FORMAT));
    };

    match zone.parse::<Tz>() {
        Ok(tz) => format!(
            "{} ({})",
            datetime_utc.with_timezone(&tz).format(CUSTOM_TIME_FORMAT),
            zone
        ),
        Err(_) => {
            log::warn!("[DIARY] Failed to convert time to timezone '{}', showing raw value", zone);
            raw_display(datetime_utc)
        }
    }
}

fn raw_display(datetime_utc: &DateTime<Utc>) -> String {
    datetime_utc
        .to_rfc3339_opts(SecondsFormat::Secs, true)
        .chars()
        .take(RAW_DISPLAY_WIDTH)
        .collect()
}

/// Label for the user's zone on prompts
pub fn zone_label(zone: Option<&str>) -> &str {
    zone.unwrap_or("UTC")
}
