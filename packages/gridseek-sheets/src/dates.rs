use time::{
	Date, Duration, PrimitiveDateTime, Time,
	format_description::BorrowedFormatItem,
	macros::{date, format_description},
};

const ISO_DATE: &[BorrowedFormatItem<'static>] = format_description!("[year]-[month]-[day]");
const ISO_TIME: &[BorrowedFormatItem<'static>] = format_description!("[hour]:[minute]:[second]");
const ISO_DATETIME: &[BorrowedFormatItem<'static>] =
	format_description!("[year]-[month]-[day]T[hour]:[minute]:[second]");

const DATE_INPUTS: &[&[BorrowedFormatItem<'static>]] =
	&[format_description!("[year]-[month]-[day]"), format_description!("[year]/[month]/[day]")];
const DATETIME_INPUTS: &[&[BorrowedFormatItem<'static>]] = &[
	format_description!("[year]-[month]-[day] [hour]:[minute]:[second]"),
	format_description!("[year]-[month]-[day]T[hour]:[minute]:[second]"),
	format_description!("[year]-[month]-[day] [hour]:[minute]"),
	format_description!("[year]-[month]-[day]T[hour]:[minute]"),
];

const SECONDS_PER_DAY: f64 = 86_400.0;

/// Recognizes the unambiguous date shapes found in CSV exports and returns them in canonical
/// ISO-8601 form. Locale-dependent shapes such as `01/02/2024` are left alone.
pub fn parse_text_date(raw: &str) -> Option<String> {
	let raw = raw.trim();

	if raw.len() < 8 || !raw.as_bytes()[0].is_ascii_digit() {
		return None;
	}

	for format in DATETIME_INPUTS {
		if let Ok(value) = PrimitiveDateTime::parse(raw, *format) {
			return format_datetime(value);
		}
	}
	for format in DATE_INPUTS {
		if let Ok(value) = Date::parse(raw, *format) {
			return value.format(ISO_DATE).ok();
		}
	}

	None
}

/// Converts an Excel serial date (1900 date system) to ISO-8601.
///
/// Whole serials become `YYYY-MM-DD`, serials below one become a bare `HH:MM:SS`, and
/// everything else becomes `YYYY-MM-DDTHH:MM:SS`.
pub fn excel_serial_to_iso(serial: f64) -> Option<String> {
	if !serial.is_finite() || serial < 0.0 {
		return None;
	}

	let days = serial.trunc();
	let seconds = ((serial - days) * SECONDS_PER_DAY).round() as i64;

	if days == 0.0 {
		let time = Time::MIDNIGHT + Duration::seconds(seconds.min(86_399));

		return time.format(ISO_TIME).ok();
	}

	let epoch = date!(1899 - 12 - 30).midnight();
	let value = epoch
		.checked_add(Duration::days(days as i64))?
		.checked_add(Duration::seconds(seconds))?;

	format_datetime(value)
}

fn format_datetime(value: PrimitiveDateTime) -> Option<String> {
	if value.time() == Time::MIDNIGHT {
		value.date().format(ISO_DATE).ok()
	} else {
		value.format(ISO_DATETIME).ok()
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn text_dates_are_canonicalized() {
		assert_eq!(parse_text_date("2024-03-05").as_deref(), Some("2024-03-05"));
		assert_eq!(parse_text_date("2024/03/05").as_deref(), Some("2024-03-05"));
		assert_eq!(parse_text_date("2024-03-05 14:30").as_deref(), Some("2024-03-05T14:30:00"));
		assert_eq!(
			parse_text_date("2024-03-05T14:30:15").as_deref(),
			Some("2024-03-05T14:30:15")
		);
	}

	#[test]
	fn non_dates_are_left_alone() {
		assert_eq!(parse_text_date("Revenue"), None);
		assert_eq!(parse_text_date("03/05/2024"), None);
		assert_eq!(parse_text_date("2024-13-40"), None);
		assert_eq!(parse_text_date("12345678"), None);
	}

	#[test]
	fn excel_serials_convert_to_iso() {
		assert_eq!(excel_serial_to_iso(45_292.0).as_deref(), Some("2024-01-01"));
		assert_eq!(excel_serial_to_iso(45_292.5).as_deref(), Some("2024-01-01T12:00:00"));
		assert_eq!(excel_serial_to_iso(0.25).as_deref(), Some("06:00:00"));
		assert_eq!(excel_serial_to_iso(-1.0), None);
	}
}
