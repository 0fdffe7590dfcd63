//! Email address values (RFC 5322 §3.4) as carried in `From:` and `To:`.

/// Domain used for synthesized addresses and Message-IDs.
pub const SENTINEL_DOMAIN: &str = "swoft.ai";

/// Address substituted when a message has no usable `From:` or `To:`.
pub const UNKNOWN_ADDRESS: &str = "unknown@swoft.ai";

/// An address with an optional display name.
///
/// - `"Kevin <kevin@swoft.ai>"` → `name = Some("Kevin")`, `address = "kevin@swoft.ai"`
/// - `"kevin@swoft.ai"` → `name = None`
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct EmailAddress {
    pub address: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl EmailAddress {
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            name: None,
        }
    }

    pub fn with_name(address: impl Into<String>, name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            address: address.into(),
            name: (!name.is_empty()).then_some(name),
        }
    }

    /// The `unknown@swoft.ai` placeholder.
    pub fn unknown() -> Self {
        Self::new(UNKNOWN_ADDRESS)
    }

    /// Parse one address from a header fragment.
    ///
    /// Accepts `addr`, `<addr>`, `Name <addr>` and `"Quoted, Name" <addr>`.
    /// Returns `None` for blank input.
    pub fn parse(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return None;
        }

        if let (Some(open), Some(close)) = (trimmed.rfind('<'), trimmed.rfind('>')) {
            if close > open {
                let address = trimmed[open + 1..close].trim();
                if address.is_empty() {
                    return None;
                }
                return Some(Self::with_name(address, strip_quotes(&trimmed[..open])));
            }
        }

        Some(Self::new(trimmed))
    }

    /// Parse a comma-separated address list, honoring quotes and angle brackets.
    pub fn parse_list(raw: &str) -> Vec<Self> {
        let mut results = Vec::new();
        let mut current = String::new();
        let mut in_quotes = false;
        let mut in_angle = false;

        for ch in raw.chars() {
            match ch {
                '"' => in_quotes = !in_quotes,
                '<' if !in_quotes => in_angle = true,
                '>' if !in_quotes => in_angle = false,
                ',' if !in_quotes && !in_angle => {
                    results.extend(Self::parse(&current));
                    current.clear();
                    continue;
                }
                _ => {}
            }
            current.push(ch);
        }
        results.extend(Self::parse(&current));
        results
    }
}

fn strip_quotes(s: &str) -> String {
    let trimmed = s.trim();
    if trimmed.len() >= 2 && trimmed.starts_with('"') && trimmed.ends_with('"') {
        trimmed[1..trimmed.len() - 1].trim().to_string()
    } else {
        trimmed.to_string()
    }
}

impl std::fmt::Display for EmailAddress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.name {
            Some(name) => write!(f, "{name} <{}>", self.address),
            None => f.write_str(&self.address),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_bare_address() {
        let addr = EmailAddress::parse("kevin@swoft.ai").unwrap();
        assert_eq!(addr.address, "kevin@swoft.ai");
        assert_eq!(addr.name, None);
    }

    #[test]
    fn test_parse_name_and_address() {
        let addr = EmailAddress::parse("Kevin Lee <kevin@swoft.ai>").unwrap();
        assert_eq!(addr.address, "kevin@swoft.ai");
        assert_eq!(addr.name.as_deref(), Some("Kevin Lee"));
    }

    #[test]
    fn test_parse_empty_angle() {
        assert!(EmailAddress::parse("Nobody <>").is_none());
        assert!(EmailAddress::parse("   ").is_none());
    }

    #[test]
    fn test_parse_list_with_quoted_comma() {
        let list = EmailAddress::parse_list("\"Lee, Kevin\" <kevin@swoft.ai>, ops@swoft.ai");
        assert_eq!(list.len(), 2);
        assert_eq!(list[0].name.as_deref(), Some("Lee, Kevin"));
        assert_eq!(list[1].address, "ops@swoft.ai");
    }

    #[test]
    fn test_display() {
        assert_eq!(
            EmailAddress::with_name("a@b.com", "Alice").to_string(),
            "Alice <a@b.com>"
        );
        assert_eq!(EmailAddress::with_name("a@b.com", "").to_string(), "a@b.com");
    }
}
