// Byte counts -> "12.34 MiB" / "1.50 GiB"

/// Mebibyte figures at or above this switch to GiB.
pub const GIB_THRESHOLD_MIB: f64 = 1000.0;

/// Total characters kept for the figure (integer part, point and fraction).
const FIGURE_WIDTH: usize = 5;
const MAX_FRACTION_DIGITS: usize = 2;
/// Decimals rendered before cutting. Float formatting with a precision is exact, and
/// byte counts over 2^20 or 2^30 never sit this close below a two-decimal step.
const EXACT_DIGITS: usize = 20;

/// Format a byte count as MiB below 1000 MiB and as GiB from there on.
///
/// The figure is truncated, not rounded: at most two fractional digits, and fewer
/// once the integer part grows so the figure stays five characters wide
/// (`1.00`, `12.34`, `999.0`). The integer part itself is never cut.
/// Negative and non-finite inputs are formatted as zero.
pub fn format_bytes(bytes: f64) -> String {
    let bytes = if bytes.is_finite() && bytes > 0.0 {
        bytes
    } else {
        0.0
    };
    let mebibytes = bytes / 1024.0 / 1024.0;
    let gibibytes = mebibytes / 1024.0;
    if mebibytes < GIB_THRESHOLD_MIB {
        format!("{} MiB", truncate_figure(mebibytes))
    } else {
        format!("{} GiB", truncate_figure(gibibytes))
    }
}

/// Format two byte counts as `"<a> / <b>"`.
pub fn format_byte_pair(a: f64, b: f64) -> String {
    format!("{} / {}", format_bytes(a), format_bytes(b))
}

/// Format a percentage with two decimals, e.g. `5.50%`.
pub fn format_percent(value: f64) -> String {
    format!("{:.2}%", value)
}

fn truncate_figure(value: f64) -> String {
    // Render far past the kept precision, then cut digits instead of rounding them.
    let fixed = format!("{:.*}", EXACT_DIGITS, value);
    let (int_part, frac_part) = fixed.split_once('.').unwrap_or((fixed.as_str(), ""));
    let frac_digits = FIGURE_WIDTH
        .saturating_sub(int_part.len() + 1)
        .min(MAX_FRACTION_DIGITS)
        .min(frac_part.len());
    if frac_digits == 0 {
        int_part.to_string()
    } else {
        format!("{}.{}", int_part, &frac_part[..frac_digits])
    }
}
