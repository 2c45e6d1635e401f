//! Input shape checks shared by the relayer endpoint and the client flows.

/// Length of a full account address including the `0x` prefix
pub const ADDRESS_LEN: usize = 66;

/// Non-empty and only hex digits (no `0x` prefix)
pub fn is_hex(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| b.is_ascii_hexdigit())
}

/// Full-length `0x` + 64 hex address, the only form the relayer accepts
pub fn is_full_address(s: &str) -> bool {
    s.len() == ADDRESS_LEN && s.strip_prefix("0x").map(is_hex).unwrap_or(false)
}

/// Any account address the fullnode understands, short forms such as
/// `0x1` included
pub fn is_account_address(s: &str) -> bool {
    match s.strip_prefix("0x") {
        Some(rest) => rest.len() <= 64 && is_hex(rest),
        None => false,
    }
}

/// Long form of an account address: `0x` + 64 lowercase hex digits, the
/// form the fullnode reports in function ids. `None` if not an address.
pub fn normalize_address(s: &str) -> Option<String> {
    if !is_account_address(s) {
        return None;
    }
    let hex = &s[2..];
    Some(format!("0x{:0>64}", hex.to_ascii_lowercase()))
}

/// Shorten a sensitive value for logs
pub fn truncate(s: &str, keep: usize) -> String {
    match s.char_indices().nth(keep) {
        Some((idx, _)) => format!("{}...", &s[..idx]),
        None => s.to_string(),
    }
}
