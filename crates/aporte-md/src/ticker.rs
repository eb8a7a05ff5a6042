//! Ticker normalization before a provider call.
//!
//! B3 (Brazilian exchange) tickers are written without an exchange suffix by
//! users (`WEGE3`, `ITUB4`, `TAEE11`) but Yahoo expects `.SA`. The rule here is
//! a **heuristic**, not a lookup: any ticker whose last character is `3`, `4`
//! or `1` is treated as Brazilian. It misfires on non-Brazilian symbols that
//! happen to end in those digits; pass an explicit suffix (e.g. `6501.T`) to
//! opt out.

/// Exchange suffix appended to tickers that look Brazilian.
pub const B3_SUFFIX: &str = ".SA";

const B3_TRAILING_DIGITS: [char; 3] = ['3', '4', '1'];

/// Apply the B3 suffix heuristic to a single ticker.
///
/// Tickers that already contain a `.` (explicit exchange suffix) and FX /
/// index symbols (`USDBRL=X`, `^BVSP`) are returned unchanged.
pub fn normalize_ticker(ticker: &str) -> String {
    let t = ticker.trim();
    if t.contains('.') || t.contains('=') || t.starts_with('^') {
        return t.to_string();
    }
    match t.chars().last() {
        Some(c) if B3_TRAILING_DIGITS.contains(&c) => format!("{t}{B3_SUFFIX}"),
        _ => t.to_string(),
    }
}

/// Split a whitespace-separated ticker list, dropping empty entries.
///
/// Order is preserved; duplicates are kept (each is a separate position).
pub fn parse_ticker_list(s: &str) -> Vec<String> {
    s.split_whitespace().map(str::to_string).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn brazilian_share_classes_get_suffix() {
        assert_eq!(normalize_ticker("WEGE3"), "WEGE3.SA");
        assert_eq!(normalize_ticker("ITUB4"), "ITUB4.SA");
        assert_eq!(normalize_ticker("TAEE11"), "TAEE11.SA");
    }

    #[test]
    fn other_tickers_are_untouched() {
        assert_eq!(normalize_ticker("AAPL"), "AAPL");
        assert_eq!(normalize_ticker("BRK-B"), "BRK-B");
        assert_eq!(normalize_ticker("VALE5"), "VALE5");
    }

    #[test]
    fn explicit_suffix_is_respected() {
        assert_eq!(normalize_ticker("WEGE3.SA"), "WEGE3.SA");
        assert_eq!(normalize_ticker("6501.T"), "6501.T");
        assert_eq!(normalize_ticker("USDBRL=X"), "USDBRL=X");
        assert_eq!(normalize_ticker("^BVSP"), "^BVSP");
    }

    #[test]
    fn heuristic_misfires_on_foreign_digit_tickers() {
        // Documented limitation: a bare "3" ending is assumed to be B3.
        assert_eq!(normalize_ticker("7203"), "7203.SA");
    }

    #[test]
    fn whitespace_is_trimmed() {
        assert_eq!(normalize_ticker("  PETR4 "), "PETR4.SA");
    }

    #[test]
    fn ticker_list_splits_on_any_whitespace() {
        assert_eq!(
            parse_ticker_list("WEGE3  AAPL\tITUB4\n"),
            vec!["WEGE3", "AAPL", "ITUB4"]
        );
        assert!(parse_ticker_list("   ").is_empty());
    }
}
