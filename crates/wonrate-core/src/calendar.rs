//! Date-window arithmetic in the institution's publishing timezone.
//!
//! Every upstream publishes against the same fixed UTC+9 calendar, so all
//! window math converts "now" to that offset first and never consults the
//! host timezone. The deterministic functions take `now` as a parameter;
//! callers pass `OffsetDateTime::now_utc()`.

use time::macros::offset;
use time::{Duration, OffsetDateTime, UtcOffset, Weekday};

use crate::RateDate;

/// Fixed reference offset for publish-date arithmetic.
pub const PUBLISH_OFFSET: UtcOffset = offset!(+9);

/// When "now" rolls over into the next publish period.
///
/// Example with the defaults: the weekly tariff is anchored to Sunday, and
/// the institution publishes the next period's rate from Friday 17:00
/// local, so from that cutoff through Saturday the upcoming Sunday is
/// already a valid target date.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CutoverRule {
    pub anchor: Weekday,
    pub cutoff_weekday: Weekday,
    pub cutoff_hour: u8,
}

impl Default for CutoverRule {
    fn default() -> Self {
        Self {
            anchor: Weekday::Sunday,
            cutoff_weekday: Weekday::Friday,
            cutoff_hour: 17,
        }
    }
}

/// Calendar date of "now" in the publish timezone.
pub fn today(now: OffsetDateTime) -> RateDate {
    RateDate::new(now.to_offset(PUBLISH_OFFSET).date())
}

/// The `count` most recent occurrences of `anchor`, most recent first,
/// spaced exactly 7 days apart, starting from the latest occurrence at or
/// before "now" in the publish timezone.
pub fn recent_anchor_dates(now: OffsetDateTime, anchor: Weekday, count: usize) -> Vec<RateDate> {
    let local = now.to_offset(PUBLISH_OFFSET).date();
    let days_back = days_between(anchor, local.weekday());
    let latest = local - Duration::days(i64::from(days_back));

    (0..count)
        .map(|step| RateDate::new(latest - Duration::days(7 * step as i64)))
        .collect()
}

/// The *next* anchor date when "now" has passed the cutoff for the current
/// period, `None` otherwise.
///
/// The window runs from `cutoff_weekday` at `cutoff_hour` (inclusive) up
/// to, but not including, the anchor day itself; on the anchor day the
/// recent-anchor window already covers the new period.
pub fn cutover_date(now: OffsetDateTime, rule: &CutoverRule) -> Option<RateDate> {
    let local = now.to_offset(PUBLISH_OFFSET);
    let weekday = local.weekday();

    let window_len = days_between(rule.cutoff_weekday, rule.anchor);
    let position = days_between(rule.cutoff_weekday, weekday);

    let in_window = if position == 0 {
        local.hour() >= rule.cutoff_hour
    } else {
        position < window_len
    };

    if !in_window {
        return None;
    }

    let days_ahead = days_between(weekday, rule.anchor);
    Some(RateDate::new(
        local.date() + Duration::days(i64::from(days_ahead)),
    ))
}

/// Days from `from` forward to the next occurrence of `to`, in 0..7.
fn days_between(from: Weekday, to: Weekday) -> u8 {
    (to.number_days_from_sunday() + 7 - from.number_days_from_sunday()) % 7
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    #[test]
    fn recent_fridays_from_a_wednesday() {
        let now = datetime!(2024-03-13 12:00 UTC);
        let dates = recent_anchor_dates(now, Weekday::Friday, 4);

        let dashed: Vec<String> = dates.iter().map(|d| d.dashed()).collect();
        assert_eq!(dashed, ["2024-03-08", "2024-03-01", "2024-02-23", "2024-02-16"]);
    }

    #[test]
    fn anchor_day_itself_is_the_latest_occurrence() {
        // 2024-03-10 is a Sunday in UTC+9 until 15:00 UTC.
        let now = datetime!(2024-03-10 08:00 UTC);
        let dates = recent_anchor_dates(now, Weekday::Sunday, 2);
        assert_eq!(dates[0].dashed(), "2024-03-10");
        assert_eq!(dates[1].dashed(), "2024-03-03");
    }

    #[test]
    fn window_crosses_month_and_year_boundaries() {
        let now = datetime!(2024-01-02 00:00 UTC);
        let dates = recent_anchor_dates(now, Weekday::Sunday, 3);
        let dashed: Vec<String> = dates.iter().map(|d| d.dashed()).collect();
        assert_eq!(dashed, ["2023-12-31", "2023-12-24", "2023-12-17"]);
    }

    #[test]
    fn offset_shifts_the_local_weekday() {
        // Friday 23:00 UTC is already Saturday in UTC+9.
        let now = datetime!(2024-03-08 23:00 UTC);
        let dates = recent_anchor_dates(now, Weekday::Saturday, 1);
        assert_eq!(dates[0].dashed(), "2024-03-09");
    }

    #[test]
    fn zero_count_yields_empty_window() {
        let now = datetime!(2024-03-13 12:00 UTC);
        assert!(recent_anchor_dates(now, Weekday::Friday, 0).is_empty());
    }

    #[test]
    fn cutover_opens_friday_at_cutoff_hour() {
        let rule = CutoverRule::default();

        // Friday 16:59 KST: not yet.
        let before = datetime!(2024-03-08 07:59 UTC);
        assert_eq!(cutover_date(before, &rule), None);

        // Friday 17:00 KST: next Sunday is live.
        let at_cutoff = datetime!(2024-03-08 08:00 UTC);
        let date = cutover_date(at_cutoff, &rule).expect("cutover should apply");
        assert_eq!(date.dashed(), "2024-03-10");
    }

    #[test]
    fn cutover_covers_saturday_but_not_the_anchor_day() {
        let rule = CutoverRule::default();

        let saturday = datetime!(2024-03-09 03:00 UTC);
        let date = cutover_date(saturday, &rule).expect("cutover should apply");
        assert_eq!(date.dashed(), "2024-03-10");

        // Sunday morning KST.
        let sunday = datetime!(2024-03-10 01:00 UTC);
        assert_eq!(cutover_date(sunday, &rule), None);
    }

    #[test]
    fn cutover_ignores_midweek() {
        let rule = CutoverRule::default();
        let tuesday = datetime!(2024-03-05 12:00 UTC);
        assert_eq!(cutover_date(tuesday, &rule), None);
    }
}
