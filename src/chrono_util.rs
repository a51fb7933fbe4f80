use chrono::{Datelike, NaiveDate};

/// `3/15/12` or `03/15/2012` -> `2012-03-15`.
///
/// Text that is not a date is returned as is (trimmed), so the result is
/// either an ISO date or the input text.
pub fn normalize_date(text: &str) -> String {
    match parse_game_date(text) {
        Some(date) => date.format("%Y-%m-%d").to_string(),
        None => text.trim().to_owned(),
    }
}

/// Two-digit years are tried first.  The data starts after 2000, so a
/// two-digit year that lands before 1990 is moved to the next century.
pub fn parse_game_date(text: &str) -> Option<NaiveDate> {
    let text = text.trim();
    if let Ok(date) = NaiveDate::parse_from_str(text, "%m/%d/%y") {
        return if date.year() < 1990 {
            date.with_year(date.year() + 100)
        } else {
            Some(date)
        };
    }
    NaiveDate::parse_from_str(text, "%m/%d/%Y").ok()
}

#[cfg(test)]
mod tests {
    use super::normalize_date;

    #[test]
    fn test_two_digit_year() {
        assert_eq!(normalize_date("3/15/12"), "2012-03-15");
        assert_eq!(normalize_date("03/05/00"), "2000-03-05");
        assert_eq!(normalize_date("1/5/75"), "2075-01-05");
        assert_eq!(normalize_date("11/20/95"), "1995-11-20");
    }

    #[test]
    fn test_four_digit_year() {
        assert_eq!(normalize_date("3/15/2012"), "2012-03-15");
        assert_eq!(normalize_date(" 12/01/2019 "), "2019-12-01");
    }

    #[test]
    fn test_passthrough() {
        assert_eq!(normalize_date("TBA"), "TBA");
        assert_eq!(normalize_date("Nov. 16"), "Nov. 16");
        assert_eq!(normalize_date("2/30/12"), "2/30/12");
        assert_eq!(normalize_date(""), "");
    }
}
