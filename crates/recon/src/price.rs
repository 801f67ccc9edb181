//! Currency text ↔ integer cents.
//!
//! Price exports come out of spreadsheet tools with comma decimals and a Euro
//! sign, sometimes mangled to `â‚¬` when UTF-8 was read as Windows-1252.
//! All arithmetic happens on cents; text is only produced at the edges.

const EURO_SIGNS: [&str; 2] = ["â‚¬", "€"];

/// Parse currency text into cents. Returns `None` for anything that is not a
/// plain decimal amount after stripping currency symbols.
///
/// ```
/// use reprice_recon::price::parse_price;
/// assert_eq!(parse_price("10,50€"), Some(1050));
/// assert_eq!(parse_price(" 1.234,56 â‚¬"), Some(123456));
/// assert_eq!(parse_price("12"), Some(1200));
/// assert_eq!(parse_price("n/a"), None);
/// ```
pub fn parse_price(raw: &str) -> Option<i64> {
    let mut text = raw.to_string();
    for sign in EURO_SIGNS {
        text = text.replace(sign, "");
    }
    let text = text.trim();

    let normalized = match (text.rfind(','), text.rfind('.')) {
        // 1.234,56
        (Some(c), Some(d)) if c > d => text.replace('.', "").replace(',', "."),
        // 1,234.56
        (Some(_), Some(_)) => text.replace(',', ""),
        (Some(_), None) => {
            if text.matches(',').count() > 1 {
                return None;
            }
            text.replace(',', ".")
        }
        _ => text.to_string(),
    };

    parse_decimal_cents(&normalized)
}

fn parse_decimal_cents(text: &str) -> Option<i64> {
    let (negative, body) = match text.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, text.strip_prefix('+').unwrap_or(text)),
    };

    let (int_part, frac_part) = match body.split_once('.') {
        Some((i, f)) => (i, f),
        None => (body, ""),
    };

    if int_part.is_empty() && frac_part.is_empty() {
        return None;
    }
    if !int_part.bytes().all(|b| b.is_ascii_digit()) || !frac_part.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }

    let units: i64 = if int_part.is_empty() { 0 } else { int_part.parse().ok()? };
    let frac = frac_part.as_bytes();
    let digit = |i: usize| frac.get(i).map(|b| (b - b'0') as i64).unwrap_or(0);

    let mut cents = units.checked_mul(100)?.checked_add(digit(0) * 10 + digit(1))?;
    if digit(2) >= 5 {
        cents = cents.checked_add(1)?;
    }

    Some(if negative { -cents } else { cents })
}

/// Render cents as `123.45`.
pub fn format_price(cents: i64) -> String {
    let sign = if cents < 0 { "-" } else { "" };
    let abs = cents.unsigned_abs();
    format!("{sign}{}.{:02}", abs / 100, abs % 100)
}

/// Linear interpolation between two reference pack sizes:
/// `lower_price + (upper_price - lower_price) / (upper - lower) * (pieces - lower)`,
/// rounded half away from zero to whole cents. `None` when the result does
/// not fit in cents.
pub fn interpolate_cents(
    lower_pieces: u32,
    lower_price: i64,
    upper_pieces: u32,
    upper_price: i64,
    pieces: u32,
) -> Option<i64> {
    let span = upper_pieces as i128 - lower_pieces as i128;
    if span == 0 {
        return Some(lower_price);
    }
    let numerator = (upper_price as i128 - lower_price as i128) * (pieces as i128 - lower_pieces as i128);
    i64::try_from(lower_price as i128 + div_round_half_away(numerator, span)).ok()
}

fn div_round_half_away(numerator: i128, denominator: i128) -> i128 {
    let quotient = numerator / denominator;
    let remainder = numerator % denominator;
    if remainder.abs() * 2 >= denominator.abs() {
        if (numerator < 0) != (denominator < 0) {
            quotient - 1
        } else {
            quotient + 1
        }
    } else {
        quotient
    }
}
