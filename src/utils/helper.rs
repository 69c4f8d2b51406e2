/// Check that `s` looks like an EVM account address (`0x` followed by 40 hex digits).
pub fn is_valid_address(s: &str) -> bool {
    match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        Some(hex) => hex.len() == 40 && hex.bytes().all(|b| b.is_ascii_hexdigit()),
        None => false,
    }
}

/// Parse an address from string, with better error messages
pub fn parse_address(s: &str) -> anyhow::Result<String> {
    let trimmed = s.trim();
    if is_valid_address(trimmed) {
        Ok(trimmed.to_string())
    } else {
        Err(anyhow::anyhow!("Invalid address {}: expected 0x followed by 40 hex digits", s))
    }
}

/// Format an address for display (truncated)
pub fn format_address(address: &str) -> String {
    if address.len() <= 12 || !address.is_ascii() {
        return address.to_string();
    }
    format!("{}...{}", &address[..6], &address[address.len() - 4..])
}
