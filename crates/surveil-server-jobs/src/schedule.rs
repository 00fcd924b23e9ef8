// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Cron expression parsing and next-fire calculation.

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use cron::Schedule;
use std::str::FromStr;

use crate::error::{JobError, Result};

/// Convert a standard 5-field Unix cron expression to the 7-field format
/// expected by the `cron` crate.
///
/// 5-field format: minute hour day-of-month month day-of-week
/// 7-field format: second minute hour day-of-month month day-of-week year
///
/// Unix cron numbers weekdays 0-7 with both 0 and 7 meaning Sunday, while the
/// `cron` crate numbers them 1-7 starting at Sunday, so numeric weekdays are
/// renumbered. Six and seven field expressions and `@hourly`-style
/// descriptors pass through.
fn convert_to_cron_crate_format(expression: &str) -> String {
	let expression = expression.trim();
	let fields: Vec<&str> = expression.split_whitespace().collect();
	if let [minute, hour, day_of_month, month, day_of_week] = fields.as_slice() {
		format!(
			"0 {minute} {hour} {day_of_month} {month} {} *",
			unix_weekdays_to_cron_crate(day_of_week)
		)
	} else {
		expression.to_string()
	}
}

fn unix_weekdays_to_cron_crate(field: &str) -> String {
	field
		.split(',')
		.map(unix_weekday_item)
		.collect::<Vec<_>>()
		.join(",")
}

/// Renumber one list item (`n`, `a-b`, with an optional `/step`). Names, `*`
/// and anything unparseable are left for the `cron` crate to judge.
fn unix_weekday_item(item: &str) -> String {
	let (base, step) = match item.split_once('/') {
		Some((base, step)) => (base, Some(step)),
		None => (item, None),
	};
	let suffix = step.map(|step| format!("/{step}")).unwrap_or_default();

	if let Some((start, end)) = base.split_once('-') {
		let (Ok(start), Ok(end)) = (start.parse::<u8>(), end.parse::<u8>()) else {
			return item.to_string();
		};
		if start > end || end > 7 {
			return item.to_string();
		}
		if end < 7 {
			return format!("{}-{}{suffix}", start + 1, end + 1);
		}
		// Ranges ending at 7 wrap back to Sunday.
		return match (start, step) {
			(0, _) => format!("1-7{suffix}"),
			(7, _) => format!("1{suffix}"),
			(_, None) => format!("{}-7,1", start + 1),
			(_, Some(step)) => match step.parse::<usize>() {
				Ok(step) if step > 0 => (start..=7)
					.step_by(step)
					.map(|day| (day % 7 + 1).to_string())
					.collect::<Vec<_>>()
					.join(","),
				_ => item.to_string(),
			},
		};
	}

	match base.parse::<u8>() {
		Ok(day) if day <= 7 => format!("{}{suffix}", day % 7 + 1),
		_ => item.to_string(),
	}
}

/// Parse an expression into a schedule.
pub fn parse_expression(expression: &str) -> Result<Schedule> {
	if expression.trim().is_empty() {
		return Err(JobError::InvalidExpression {
			expression: expression.to_string(),
			message: "expression is empty".to_string(),
		});
	}
	Schedule::from_str(&convert_to_cron_crate_format(expression)).map_err(|e| {
		JobError::InvalidExpression {
			expression: expression.to_string(),
			message: e.to_string(),
		}
	})
}

/// Validate an expression without calculating a fire time.
pub fn validate_expression(expression: &str) -> Result<()> {
	parse_expression(expression).map(|_| ())
}

/// Next time `expression` fires strictly after `after`, evaluated in `tz`.
pub fn next_fire_time(expression: &str, tz: Tz, after: DateTime<Utc>) -> Result<DateTime<Utc>> {
	let schedule = parse_expression(expression)?;
	next_after(&schedule, tz, after).ok_or_else(|| JobError::InvalidExpression {
		expression: expression.to_string(),
		message: "schedule never fires again".to_string(),
	})
}

pub(crate) fn next_after(schedule: &Schedule, tz: Tz, after: DateTime<Utc>) -> Option<DateTime<Utc>> {
	schedule
		.after(&after.with_timezone(&tz))
		.next()
		.map(|next| next.with_timezone(&Utc))
}

#[cfg(test)]
mod tests {
	use super::*;
	use chrono::{Datelike, TimeZone, Timelike, Weekday};
	use proptest::prelude::*;

	#[test]
	fn five_field_expressions_fire_on_the_minute() {
		let after = Utc.with_ymd_and_hms(2025, 1, 1, 10, 7, 30).unwrap();
		let next = next_fire_time("*/15 * * * *", chrono_tz::UTC, after).unwrap();
		assert_eq!(next, Utc.with_ymd_and_hms(2025, 1, 1, 10, 15, 0).unwrap());
	}

	#[test]
	fn default_cadence_is_twice_daily() {
		let after = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
		let next = next_fire_time("0 */12 * * *", chrono_tz::UTC, after).unwrap();
		assert_eq!(next, Utc.with_ymd_and_hms(2025, 1, 1, 12, 0, 0).unwrap());
	}

	#[test]
	fn sunday_is_zero_or_seven() {
		// 2025-01-01 is a Wednesday.
		let after = Utc.with_ymd_and_hms(2025, 1, 1, 12, 0, 0).unwrap();
		let sunday = Utc.with_ymd_and_hms(2025, 1, 5, 0, 0, 0).unwrap();
		assert_eq!(next_fire_time("0 0 * * 0", chrono_tz::UTC, after).unwrap(), sunday);
		assert_eq!(next_fire_time("0 0 * * 7", chrono_tz::UTC, after).unwrap(), sunday);
		assert_eq!(next_fire_time("0 0 * * SUN", chrono_tz::UTC, after).unwrap(), sunday);
	}

	#[test]
	fn weekday_range_starts_on_monday() {
		let saturday = Utc.with_ymd_and_hms(2025, 1, 4, 12, 0, 0).unwrap();
		let next = next_fire_time("0 9 * * 1-5", chrono_tz::UTC, saturday).unwrap();
		assert_eq!(next.weekday(), Weekday::Mon);
		assert_eq!(next, Utc.with_ymd_and_hms(2025, 1, 6, 9, 0, 0).unwrap());

		let friday_evening = Utc.with_ymd_and_hms(2025, 1, 10, 12, 0, 0).unwrap();
		let next = next_fire_time("0 9 * * 1-5", chrono_tz::UTC, friday_evening).unwrap();
		assert_eq!(next.weekday(), Weekday::Mon);
	}

	#[test]
	fn numeric_weekdays_are_renumbered() {
		assert_eq!(convert_to_cron_crate_format("0 9 * * 1-5"), "0 0 9 * * 2-6 *");
		assert_eq!(convert_to_cron_crate_format("0 9 * * 0,3"), "0 0 9 * * 1,4 *");
		assert_eq!(convert_to_cron_crate_format("0 9 * * 5-7"), "0 0 9 * * 6-7,1 *");
		assert_eq!(convert_to_cron_crate_format("0 9 * * 1-7/2"), "0 0 9 * * 2,4,6,1 *");
		assert_eq!(convert_to_cron_crate_format("0 9 * * */2"), "0 0 9 * * */2 *");
		assert_eq!(convert_to_cron_crate_format("0 9 * * MON-FRI"), "0 0 9 * * MON-FRI *");
		assert_eq!(convert_to_cron_crate_format("0 0 9 * * 2"), "0 0 9 * * 2");
		assert!(validate_expression("0 9 * * 8").is_err());
	}

	#[test]
	fn descriptors_and_extended_forms_are_accepted() {
		assert!(validate_expression("@hourly").is_ok());
		assert!(validate_expression("@daily").is_ok());
		assert!(validate_expression("30 0 */6 * * *").is_ok());
		assert!(validate_expression("0 0 0 1 1 * 2099").is_ok());
	}

	#[test]
	fn garbage_is_rejected() {
		for expr in ["not-a-cron", "", "   ", "* * *", "61 * * * *"] {
			assert!(
				matches!(
					validate_expression(expr),
					Err(JobError::InvalidExpression { .. })
				),
				"{expr:?} should be rejected"
			);
		}
	}

	#[test]
	fn evaluation_follows_timezone() {
		let after = Utc.with_ymd_and_hms(2025, 6, 1, 0, 0, 0).unwrap();
		let next = next_fire_time("0 9 * * *", chrono_tz::Australia::Sydney, after).unwrap();
		// 09:00 AEST is 23:00 UTC the previous day.
		assert_eq!(next, Utc.with_ymd_and_hms(2025, 6, 1, 23, 0, 0).unwrap());
	}

	#[test]
	fn past_only_schedule_has_no_next_time() {
		let after = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
		assert!(next_fire_time("0 0 0 1 1 * 2001", chrono_tz::UTC, after).is_err());
	}

	proptest! {
		#[test]
		fn next_fire_is_strictly_later(step in 1u32..60, offset_secs in 0i64..86_400) {
			let after = Utc.with_ymd_and_hms(2025, 3, 1, 0, 0, 0).unwrap()
				+ chrono::Duration::seconds(offset_secs);
			let expr = format!("*/{step} * * * *");
			let next = next_fire_time(&expr, chrono_tz::UTC, after).unwrap();
			prop_assert!(next > after);
			prop_assert_eq!(next.second(), 0);
			prop_assert!(next - after <= chrono::Duration::hours(1));
		}
	}
}
