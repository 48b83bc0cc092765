// Utility helpers for normalization, numeric coercion and formatting.
//
// This module centralizes all the "dirty" cell handling so the rest of the
// pipeline can assume canonical keys and guaranteed-numeric values.
use num_format::{Locale, ToFormattedString};

const MONTHS: [(&str, &str); 12] = [
    ("jan", "January"),
    ("feb", "February"),
    ("mar", "March"),
    ("apr", "April"),
    ("may", "May"),
    ("jun", "June"),
    ("jul", "July"),
    ("aug", "August"),
    ("sep", "September"),
    ("oct", "October"),
    ("nov", "November"),
    ("dec", "December"),
];

/// Canonical person identifier: uppercase, trimmed, whitespace runs replaced
/// by `_` and repeated underscores collapsed.
///
/// Blank or missing input yields `None`, which keeps the record out of every
/// person-keyed aggregate.
pub fn normalize_id(raw: Option<&str>) -> Option<String> {
    let s = raw?.trim();
    if s.is_empty() {
        return None;
    }
    let mut out = String::with_capacity(s.len());
    for c in s.to_uppercase().chars() {
        let c = if c.is_whitespace() { '_' } else { c };
        if c == '_' && out.ends_with('_') {
            continue;
        }
        out.push(c);
    }
    Some(out)
}

/// Map a month label to its full English name by 3-letter prefix
/// (`"jan"`, `"JANUARY"`, `"Jan-2024"` all give `"January"`).
///
/// Labels that match no prefix pass through capitalized.
pub fn normalize_month(raw: Option<&str>) -> Option<String> {
    let s = raw?.trim().to_lowercase();
    if let Some((_, full)) = MONTHS.iter().find(|(abbr, _)| s.starts_with(abbr)) {
        return Some(full.to_string());
    }
    let mut chars = s.chars();
    let first = chars.next()?;
    Some(first.to_uppercase().chain(chars).collect())
}

/// Parse a cell into `f64`, returning NaN for anything unparsable.
///
/// - Trims whitespace.
/// - Strips thousands separators like `","` and a trailing `"%"`.
/// - Missing and empty cells are NaN as well.
pub fn to_number(s: Option<&str>) -> f64 {
    let Some(s) = s.map(str::trim) else {
        return f64::NAN;
    };
    let s = s.strip_suffix('%').unwrap_or(s).trim().replace(',', "");
    if s.is_empty() {
        return f64::NAN;
    }
    s.parse::<f64>().unwrap_or(f64::NAN)
}

/// NaN and infinities become 0.
pub fn fill_zero(v: f64) -> f64 {
    if v.is_finite() {
        v
    } else {
        0.0
    }
}

/// Coerce-then-fill: the single entry point for numeric text entering the
/// model.
pub fn coerce(s: Option<&str>) -> f64 {
    fill_zero(to_number(s))
}

/// Two decimal places, ties to even (`0.125` gives `0.12`).
pub fn round2(v: f64) -> f64 {
    (v * 100.0).round_ties_even() / 100.0
}

pub fn average(v: &[f64]) -> f64 {
    // Standard arithmetic mean; returns 0 for an empty slice to avoid NaNs.
    if v.is_empty() {
        return 0.0;
    }
    let sum: f64 = v.iter().copied().sum();
    sum / v.len() as f64
}

pub fn format_number(n: f64, decimals: usize) -> String {
    // Format a floating-point value with:
    // - a fixed number of decimal places, and
    // - locale-aware thousands separators (e.g., `1,234,567.89`).
    if !n.is_finite() {
        return String::new();
    }
    let s = format!("{:.*}", decimals, n.abs());
    let mut parts = s.split('.');
    let int_part = parts.next().unwrap_or("0");
    let frac_part = parts.next();
    let int_val: i64 = int_part.parse().unwrap_or(0);
    let mut res = int_val.to_formatted_string(&Locale::en);
    if let Some(frac) = frac_part {
        res.push('.');
        res.push_str(frac);
    }
    // `-0.00` reads badly in a report; only keep the sign for a visible value.
    if n.is_sign_negative() && s.chars().any(|c| c.is_ascii_digit() && c != '0') {
        format!("-{}", res)
    } else {
        res
    }
}

pub fn format_int<T>(n: T) -> String
where
    T: ToFormattedString,
{
    n.to_formatted_string(&Locale::en)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn id_variants_collapse_to_one_key() {
        let expected = Some("QAI_001".to_string());
        assert_eq!(normalize_id(Some("qai 001")), expected);
        assert_eq!(normalize_id(Some("QAI__001")), expected);
        assert_eq!(normalize_id(Some("  Qai   001 ")), expected);
        assert_eq!(normalize_id(Some("qai _ 001")), expected);
        assert_eq!(normalize_id(Some("qai\t001")), expected);
    }

    #[test]
    fn blank_id_is_absent() {
        assert_eq!(normalize_id(None), None);
        assert_eq!(normalize_id(Some("")), None);
        assert_eq!(normalize_id(Some("   ")), None);
    }

    #[test]
    fn every_month_prefix_maps_to_full_name() {
        for (abbr, full) in MONTHS {
            assert_eq!(normalize_month(Some(abbr)).as_deref(), Some(full));
            assert_eq!(
                normalize_month(Some(&abbr.to_uppercase())).as_deref(),
                Some(full)
            );
        }
        assert_eq!(normalize_month(Some(" september ")).as_deref(), Some("September"));
        assert_eq!(normalize_month(Some("Jan-2024")).as_deref(), Some("January"));
    }

    #[test]
    fn unknown_month_passes_through_capitalized() {
        assert_eq!(normalize_month(Some("q1 review")).as_deref(), Some("Q1 review"));
        assert_eq!(normalize_month(Some("  ")), None);
        assert_eq!(normalize_month(None), None);
    }

    #[test]
    fn to_number_is_nan_on_garbage() {
        assert!(to_number(Some("abc")).is_nan());
        assert!(to_number(Some("")).is_nan());
        assert!(to_number(None).is_nan());
        assert_eq!(to_number(Some(" 1,250.5 ")), 1250.5);
        assert_eq!(to_number(Some("12.5%")), 12.5);
        assert_eq!(to_number(Some("-3")), -3.0);
    }

    #[test]
    fn coerce_fills_zero() {
        assert_eq!(coerce(Some("n/a")), 0.0);
        assert_eq!(coerce(None), 0.0);
        assert_eq!(coerce(Some("inf")), 0.0);
        assert_eq!(coerce(Some("NaN")), 0.0);
        assert_eq!(coerce(Some("0.75")), 0.75);
    }

    #[test]
    fn round2_rounds_to_cents() {
        assert_eq!(round2(33.333333), 33.33);
        assert_eq!(round2(66.666666), 66.67);
        assert_eq!(round2(5.0), 5.0);
    }

    #[test]
    fn round2_sends_ties_to_even() {
        assert_eq!(round2(0.125), 0.12);
        assert_eq!(round2(0.375), 0.38);
        assert_eq!(round2(-0.125), -0.12);
    }

    #[test]
    fn format_number_groups_thousands() {
        assert_eq!(format_number(1234567.891, 2), "1,234,567.89");
        assert_eq!(format_number(-12.5, 2), "-12.50");
        assert_eq!(format_number(-0.001, 2), "0.00");
        assert_eq!(format_number(f64::NAN, 2), "");
        assert_eq!(format_int(9855usize), "9,855");
    }
}
