//! Locale presentation helpers for the public site and admin dashboards.
//! Pure functions, deterministic for identical inputs.

use chrono::{Datelike, NaiveDate};

const MONTHS_ID: [&str; 12] = [
    "Januari",
    "Februari",
    "Maret",
    "April",
    "Mei",
    "Juni",
    "Juli",
    "Agustus",
    "September",
    "Oktober",
    "November",
    "Desember",
];

/// Format an amount as whole rupiah: "Rp 500.000". Dot thousands grouping,
/// zero fractional digits, sign ahead of the symbol.
pub fn format_rupiah(amount: f64) -> String {
    let value = amount.round() as i64;
    let sign = if value < 0 { "-" } else { "" };
    format!("{}Rp {}", sign, group_thousands(value.unsigned_abs()))
}

fn group_thousands(n: u64) -> String {
    let digits = n.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().rev().enumerate() {
        if i > 0 && i % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(ch);
    }
    grouped.chars().rev().collect()
}

/// Indonesian long date: "17 Agustus 2025".
pub fn format_date_id(date: NaiveDate) -> String {
    format!(
        "{} {} {}",
        date.day(),
        MONTHS_ID[date.month0() as usize],
        date.year()
    )
}

/// Month name for a 1-based month number; None outside 1..=12.
pub fn month_name_id(month: u32) -> Option<&'static str> {
    MONTHS_ID.get(month.checked_sub(1)? as usize).copied()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rupiah_groups_thousands_with_dots() {
        assert_eq!(format_rupiah(500000.0), "Rp 500.000");
        assert_eq!(format_rupiah(1500000.0), "Rp 1.500.000");
        assert_eq!(format_rupiah(12345678.0), "Rp 12.345.678");
    }

    #[test]
    fn rupiah_has_no_fractional_digits() {
        let formatted = format_rupiah(500000.49);
        assert_eq!(formatted, "Rp 500.000");
        assert!(!formatted.contains(','));
    }

    #[test]
    fn rupiah_small_and_zero_amounts() {
        assert_eq!(format_rupiah(0.0), "Rp 0");
        assert_eq!(format_rupiah(999.0), "Rp 999");
        assert_eq!(format_rupiah(1000.0), "Rp 1.000");
    }

    #[test]
    fn rupiah_negative_sign_precedes_symbol() {
        assert_eq!(format_rupiah(-250000.0), "-Rp 250.000");
    }

    #[test]
    fn indonesian_long_date() {
        let date = NaiveDate::from_ymd_opt(2025, 8, 17).unwrap();
        assert_eq!(format_date_id(date), "17 Agustus 2025");
    }

    #[test]
    fn month_names() {
        assert_eq!(month_name_id(1), Some("Januari"));
        assert_eq!(month_name_id(12), Some("Desember"));
        assert_eq!(month_name_id(0), None);
        assert_eq!(month_name_id(13), None);
    }
}
