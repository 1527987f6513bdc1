//! Masking of key values for log output.

/// Mask a key value for logging.
///
/// Values of up to eight characters are returned as-is; longer values keep
/// their first and last four characters with every character in between
/// replaced by `*`.
pub fn mask_key(value: &str) -> String {
    let value = value.trim();
    let chars: Vec<char> = value.chars().collect();
    if chars.len() <= 8 {
        return value.to_string();
    }
    let head: String = chars[..4].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{head}{}{tail}", "*".repeat(chars.len() - 8))
}

/// Render a key for logs according to the `log_full_key` switch.
pub fn display_key(value: &str, full: bool) -> String {
    if full {
        value.to_string()
    } else {
        mask_key(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_values_unmasked() {
        assert_eq!(mask_key("ABCD-123"), "ABCD-123");
        assert_eq!(mask_key(""), "");
    }

    #[test]
    fn test_long_values_masked() {
        assert_eq!(mask_key("ABCD-EFGH-IJKL"), "ABCD******IJKL");
        assert_eq!(mask_key("  123456789  "), "1234*6789");
    }

    #[test]
    fn test_display_key_switch() {
        assert_eq!(display_key("ABCD-EFGH-IJKL", true), "ABCD-EFGH-IJKL");
        assert_eq!(display_key("ABCD-EFGH-IJKL", false), "ABCD******IJKL");
    }
}
