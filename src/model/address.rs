//! Rendered email addresses.

/// A single mailbox from a `From:`/`To:` header.
///
/// # Examples
/// - `"Juan García <juan@ejemplo.com>"` → `display_name = "Juan García"`, `address = "juan@ejemplo.com"`
/// - `"user@example.com"` → `display_name = ""`, `address = "user@example.com"`
#[derive(Debug, Clone, PartialEq)]
pub struct EmailAddress {
    /// Human-readable display name (may be empty).
    pub display_name: String,
    /// The bare email address (`user@domain`).
    pub address: String,
}

impl EmailAddress {
    /// Build from a parsed `mail_parser::Addr`.
    pub fn from_addr(addr: &mail_parser::Addr<'_>) -> Self {
        Self {
            display_name: addr.name.as_deref().unwrap_or("").trim().to_string(),
            address: addr.address.as_deref().unwrap_or("").trim().to_string(),
        }
    }

    /// Flatten a header value (plain list or RFC 5322 groups) into mailboxes.
    pub fn list_from(address: Option<&mail_parser::Address<'_>>) -> Vec<Self> {
        match address {
            Some(mail_parser::Address::List(list)) => list.iter().map(Self::from_addr).collect(),
            Some(mail_parser::Address::Group(groups)) => groups
                .iter()
                .flat_map(|group| group.addresses.iter())
                .map(Self::from_addr)
                .collect(),
            None => Vec::new(),
        }
    }

    /// Format for display: `"Display Name <address>"` or just `"address"`.
    pub fn display(&self) -> String {
        match (self.display_name.is_empty(), self.address.is_empty()) {
            (true, _) => self.address.clone(),
            (false, true) => self.display_name.clone(),
            (false, false) => format!("{} <{}>", self.display_name, self.address),
        }
    }
}

/// Render a list of mailboxes as one comma-separated header line.
pub fn render_list(addresses: &[EmailAddress]) -> String {
    addresses
        .iter()
        .map(EmailAddress::display)
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join(", ")
}

impl std::fmt::Display for EmailAddress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display())
    }
}
