/// A-share symbol grammar: exactly six ASCII digits (e.g. "600519",
/// "000001"). Adapters derive their vendor-prefixed form from the leading
/// digit.
pub fn is_valid_symbol(symbol: &str) -> bool {
    symbol.len() == 6 && symbol.bytes().all(|b| b.is_ascii_digit())
}

/// Exchange prefix for vendors that address symbols as `sh600519` /
/// `sz000001`: Shanghai listings start with '6', everything else trades in
/// Shenzhen.
pub fn exchange_prefix(symbol: &str) -> &'static str {
    if symbol.starts_with('6') {
        "sh"
    } else {
        "sz"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_symbols() {
        assert!(is_valid_symbol("600519"));
        assert!(is_valid_symbol("000001"));
        assert!(is_valid_symbol("300750"));
    }

    #[test]
    fn test_invalid_symbols() {
        assert!(!is_valid_symbol(""));
        assert!(!is_valid_symbol("60051"));
        assert!(!is_valid_symbol("6005190"));
        assert!(!is_valid_symbol("AAPL"));
        assert!(!is_valid_symbol("sh600519"));
        assert!(!is_valid_symbol("60051９")); // full-width digit
    }

    #[test]
    fn test_exchange_prefix() {
        assert_eq!(exchange_prefix("600519"), "sh");
        assert_eq!(exchange_prefix("601318"), "sh");
        assert_eq!(exchange_prefix("000001"), "sz");
        assert_eq!(exchange_prefix("300750"), "sz");
    }
}
