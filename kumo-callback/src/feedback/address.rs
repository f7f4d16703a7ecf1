//! Recipient address validation.
//!
//! Parsing is delegated to mailparse's RFC 5322 address-list parser, which
//! is lenient about what it calls a mailbox. The single mailbox it returns
//! is then checked for `local-part@domain` syntax. Bare mailboxes mailparse
//! cannot tokenize (a quoted local part such as `"john doe"@example.com`)
//! are checked directly.

use std::net::{Ipv4Addr, Ipv6Addr};

use mailparse::{addrparse, MailAddr, MailParseError};
use serde_json::Value;
use thiserror::Error;

/// Why a recipient could not be used as an address.
#[derive(Debug, Error)]
pub enum AddressError {
    #[error("recipient is not a string")]
    NotText,

    #[error("{0}")]
    Parse(#[from] MailParseError),

    #[error("expected a single address, found {0}")]
    NotSingle(usize),

    #[error("address groups are not supported")]
    Group,

    #[error("\"{addr}\" {problem}")]
    Syntax { addr: String, problem: &'static str },
}

/// Parse a recipient value into a normalized bare address.
///
/// Accepts `user@example.com` as well as `Jane <user@example.com>`, and
/// returns the bare address in both cases.
pub fn parse_recipient(recipient: &Value) -> Result<String, AddressError> {
    let raw = recipient.as_str().ok_or(AddressError::NotText)?;

    let list = match addrparse(raw) {
        Ok(list) => list,
        Err(e) => return bare_mailbox(raw.trim()).ok_or(AddressError::Parse(e)),
    };
    if list.len() != 1 {
        return Err(AddressError::NotSingle(list.len()));
    }

    let addr = match &list[0] {
        MailAddr::Single(info) => info.addr.trim(),
        MailAddr::Group(_) => return Err(AddressError::Group),
    };

    check_syntax(addr).map_err(|problem| AddressError::Syntax {
        addr: addr.to_string(),
        problem,
    })?;

    Ok(addr.to_string())
}

/// Accept input that is a lone `local-part@domain`, with no display name.
fn bare_mailbox(raw: &str) -> Option<String> {
    if raw.contains('<') || check_syntax(raw).is_err() {
        return None;
    }
    Some(raw.to_string())
}

fn check_syntax(addr: &str) -> Result<(), &'static str> {
    let (local, domain) = addr
        .rsplit_once('@')
        .ok_or("does not contain an \"@\"")?;

    check_local_part(local)?;
    check_domain(domain)
}

fn check_local_part(local: &str) -> Result<(), &'static str> {
    if local.is_empty() {
        return Err("has an empty local part");
    }
    if local.len() > 64 {
        return Err("has a local part longer than 64 octets");
    }

    // quoted-string: anything printable except a bare quote or backslash
    if local.len() >= 2 && local.starts_with('"') && local.ends_with('"') {
        let inner = &local[1..local.len() - 1];
        let mut escaped = false;
        for c in inner.chars() {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == '"' || c.is_control() {
                return Err("has an invalid quoted local part");
            }
        }
        return if escaped {
            Err("has an invalid quoted local part")
        } else {
            Ok(())
        };
    }

    // dot-atom
    if local.split('.').any(|atom| atom.is_empty() || !atom.chars().all(is_atext)) {
        return Err("has an invalid local part");
    }

    Ok(())
}

fn check_domain(domain: &str) -> Result<(), &'static str> {
    if domain.is_empty() {
        return Err("has an empty domain");
    }
    if domain.len() > 255 {
        return Err("has a domain longer than 255 octets");
    }

    if domain.starts_with('[') && domain.ends_with(']') {
        return check_address_literal(&domain[1..domain.len() - 1]);
    }

    for label in domain.split('.') {
        if label.is_empty() || label.len() > 63 {
            return Err("has an invalid domain");
        }
        if label.starts_with('-') || label.ends_with('-') {
            return Err("has a domain label starting or ending with \"-\"");
        }
        if !label.chars().all(|c| c.is_alphanumeric() || c == '-') {
            return Err("has an invalid character in its domain");
        }
    }

    Ok(())
}

/// `[IPv4]`, `[IPv6:...]` or a general `[tag:value]` literal (RFC 5321).
fn check_address_literal(literal: &str) -> Result<(), &'static str> {
    if literal.parse::<Ipv4Addr>().is_ok() {
        return Ok(());
    }

    if let Some(v6) = literal.strip_prefix("IPv6:") {
        return v6
            .parse::<Ipv6Addr>()
            .map(|_| ())
            .map_err(|_| "has an invalid IPv6 address literal");
    }

    match literal.split_once(':') {
        Some((tag, value))
            if !tag.is_empty()
                && tag.chars().all(|c| c.is_ascii_alphanumeric() || c == '-')
                && !value.is_empty()
                && value.chars().all(|c| c.is_ascii_graphic() && !matches!(c, '[' | ']' | '\\')) =>
        {
            Ok(())
        }
        _ => Err("has an invalid domain literal"),
    }
}

/// RFC 5322 `atext`, widened to non-ASCII letters for internationalized mail.
fn is_atext(c: char) -> bool {
    c.is_alphanumeric() || "!#$%&'*+-/=?^_`{|}~".contains(c)
}
