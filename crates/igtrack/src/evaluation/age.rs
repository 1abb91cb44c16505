use chrono::{Datelike, NaiveDate};

/// Whole months between `date_of_birth` and `as_of`.
///
/// A month only counts once its day-of-month anniversary has been reached. A
/// birth date after `as_of` yields zero rather than an error.
pub fn age_in_months(date_of_birth: NaiveDate, as_of: NaiveDate) -> u32 {
    let mut months = (as_of.year() - date_of_birth.year()) * 12
        + (as_of.month() as i32 - date_of_birth.month() as i32);

    if as_of.day() < date_of_birth.day() {
        months -= 1;
    }

    u32::try_from(months).unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).expect("valid date")
    }

    #[test]
    fn anniversary_not_yet_reached_subtracts_a_month() {
        assert_eq!(age_in_months(date(2020, 1, 15), date(2021, 1, 10)), 11);
    }

    #[test]
    fn anniversary_reached_counts_full_month() {
        assert_eq!(age_in_months(date(2020, 1, 15), date(2021, 1, 20)), 12);
        assert_eq!(age_in_months(date(2020, 1, 15), date(2021, 1, 15)), 12);
    }

    #[test]
    fn same_day_is_zero_months() {
        assert_eq!(age_in_months(date(2023, 5, 4), date(2023, 5, 4)), 0);
    }

    #[test]
    fn birth_after_reference_date_clamps_to_zero() {
        assert_eq!(age_in_months(date(2024, 3, 1), date(2023, 12, 31)), 0);
        assert_eq!(age_in_months(date(2024, 3, 20), date(2024, 3, 2)), 0);
    }

    #[test]
    fn crosses_year_boundary() {
        assert_eq!(age_in_months(date(2015, 6, 1), date(2024, 1, 1)), 103);
        assert_eq!(age_in_months(date(2023, 11, 30), date(2024, 2, 29)), 2);
    }
}
