//! Value formatting helpers
//!
//! Every user-facing coordinate goes through these: absolute value, three
//! decimals, cardinal suffix. Raw signed decimals never reach answer text.

/// `15.234°N` / `3.000°S`
pub fn format_lat(lat: f64) -> String {
    format!("{:.3}°{}", lat.abs(), if lat >= 0.0 { 'N' } else { 'S' })
}

/// `65.000°E` / `12.500°W`
pub fn format_lon(lon: f64) -> String {
    format!("{:.3}°{}", lon.abs(), if lon >= 0.0 { 'E' } else { 'W' })
}

/// Thousands-separated integer: `122215` -> `122,215`
pub fn thousands(value: i64) -> String {
    let digits = value.abs().to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    if value < 0 {
        format!("-{out}")
    } else {
        out
    }
}

/// Integer day span rendered as years + days.
pub fn format_duration_days(days: i64) -> String {
    let years = days / 365;
    let remaining = days % 365;
    if years > 0 {
        format!("{years} years, {remaining} days")
    } else {
        format!("{days} days")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_coordinate_formatting() {
        assert_eq!(format_lat(15.2341), "15.234°N");
        assert_eq!(format_lat(-3.0), "3.000°S");
        assert_eq!(format_lon(65.0), "65.000°E");
        assert_eq!(format_lon(-12.5), "12.500°W");
    }

    #[test]
    fn test_thousands() {
        assert_eq!(thousands(0), "0");
        assert_eq!(thousands(999), "999");
        assert_eq!(thousands(1000), "1,000");
        assert_eq!(thousands(122_215), "122,215");
        assert_eq!(thousands(-5200), "-5,200");
    }

    #[test]
    fn test_duration() {
        assert_eq!(format_duration_days(40), "40 days");
        assert_eq!(format_duration_days(800), "2 years, 70 days");
    }
}
