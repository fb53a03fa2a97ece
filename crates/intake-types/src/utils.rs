//! Small formatting helpers shared across crates.

use chrono::NaiveDate;

/// Date format used everywhere a due date is shown to or read from a user.
pub const DATE_FORMAT: &str = "%d.%m.%Y";

/// Formats a due date in the user-facing day.month.year form.
pub fn format_date(date: NaiveDate) -> String {
	date.format(DATE_FORMAT).to_string()
}

/// Truncates a label to `max` characters for menu buttons.
///
/// Operates on characters, not bytes, so multi-byte text never splits
/// mid-character. An ellipsis marks truncated labels.
pub fn truncate_label(text: &str, max: usize) -> String {
	if text.chars().count() <= max {
		text.to_string()
	} else {
		let mut out: String = text.chars().take(max).collect();
		out.push('…');
		out
	}
}
