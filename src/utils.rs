use time::{Date, OffsetDateTime, UtcOffset};

/// Formats a rupee amount with Indian digit grouping, e.g. `₹1,00,000`.
pub fn format_currency(amount: u32) -> String {
    let digits = amount.to_string();
    if digits.len() <= 3 {
        return format!("₹{digits}");
    }

    let (head, tail) = digits.split_at(digits.len() - 3);
    let mut groups: Vec<&str> = Vec::new();
    let mut end = head.len();
    while end > 2 {
        groups.push(&head[end - 2..end]);
        end -= 2;
    }
    groups.push(&head[..end]);
    groups.reverse();

    format!("₹{},{}", groups.join(","), tail)
}

/// Today's date in the local timezone, or UTC when the offset is unknown.
pub fn today() -> Date {
    let offset = UtcOffset::current_local_offset().unwrap_or(UtcOffset::UTC);
    OffsetDateTime::now_utc().to_offset(offset).date()
}

/// `HH:MM` of a timestamp, in local time when available.
pub fn clock_time(timestamp: OffsetDateTime) -> String {
    let offset = UtcOffset::current_local_offset().unwrap_or(UtcOffset::UTC);
    let local = timestamp.to_offset(offset);
    format!("{:02}:{:02}", local.hour(), local.minute())
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    #[test]
    fn small_amounts_have_no_separator() {
        assert_eq!(format_currency(0), "₹0");
        assert_eq!(format_currency(499), "₹499");
    }

    #[test]
    fn indian_grouping() {
        assert_eq!(format_currency(1250), "₹1,250");
        assert_eq!(format_currency(99_999), "₹99,999");
        assert_eq!(format_currency(100_000), "₹1,00,000");
        assert_eq!(format_currency(12_345_678), "₹1,23,45,678");
    }

    #[test]
    fn clock_time_is_zero_padded() {
        let formatted = clock_time(datetime!(2024-01-01 03:07 UTC));
        assert_eq!(formatted.len(), 5);
        assert_eq!(&formatted[2..3], ":");
    }
}
