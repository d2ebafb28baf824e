//! Numeric ordering over textual IP addresses
//!
//! Addresses are ranked by folding their segments into a single `u128`:
//! IPv4 octets are shifted in 8 bits at a time, IPv6 groups 16 bits at a time.
//! Both families share the same integer space, so an IPv4 key (at most 32 bits)
//! sorts before most IPv6 keys but is not guaranteed to be separated from them.
//!
//! ## Limitations
//!
//! IPv6 zero compression (`::`) and mixed notation (`::ffff:1.2.3.4`) are not
//! expanded. Both produce a segment that is empty or not hexadecimal and are
//! therefore rejected. Callers that sort use [`rank_or_fallback`], which places
//! such addresses at [`FALLBACK_RANK`].

use crate::error::{Error, Result};
use tracing::debug;

/// Rank assigned to addresses that cannot be parsed
pub const FALLBACK_RANK: u128 = 0;

const IPV4_OCTETS: usize = 4;
const IPV6_MAX_GROUPS: usize = 8;
const IPV6_GROUP_DIGITS: usize = 4;

/// Address family, detected from the presence of a colon
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddressFamily {
    V4,
    V6,
}

impl AddressFamily {
    /// Detect the family the way the ranking does: any `:` means IPv6
    pub fn detect(address: &str) -> Self {
        if address.contains(':') {
            AddressFamily::V6
        } else {
            AddressFamily::V4
        }
    }
}

/// Convert an address into its numeric sort key
///
/// # Errors
///
/// Returns [`Error::AddressParse`] for empty segments, non-numeric segments,
/// out-of-range values or the wrong number of segments.
pub fn rank(address: &str) -> Result<u128> {
    match AddressFamily::detect(address) {
        AddressFamily::V4 => rank_v4(address),
        AddressFamily::V6 => rank_v6(address),
    }
}

/// Rank an address, falling back to [`FALLBACK_RANK`] when it is malformed
pub fn rank_or_fallback(address: &str) -> u128 {
    rank(address).unwrap_or_else(|e| {
        debug!("Ranking '{}' as {}: {}", address, FALLBACK_RANK, e);
        FALLBACK_RANK
    })
}

fn rank_v4(address: &str) -> Result<u128> {
    let octets: Vec<&str> = address.split('.').collect();
    if octets.len() != IPV4_OCTETS {
        return Err(Error::address_parse(
            address,
            format!("expected {} octets, got {}", IPV4_OCTETS, octets.len()),
        ));
    }

    octets.iter().try_fold(0u128, |acc, octet| {
        if octet.is_empty() {
            return Err(Error::address_parse(address, "empty octet"));
        }
        if !octet.bytes().all(|b| b.is_ascii_digit()) {
            return Err(Error::address_parse(
                address,
                format!("octet '{}' is not decimal", octet),
            ));
        }
        let value: u8 = octet.parse().map_err(|_| {
            Error::address_parse(address, format!("octet '{}' exceeds 255", octet))
        })?;
        Ok((acc << 8) | u128::from(value))
    })
}

fn rank_v6(address: &str) -> Result<u128> {
    let groups: Vec<&str> = address.split(':').collect();
    if groups.len() > IPV6_MAX_GROUPS {
        return Err(Error::address_parse(
            address,
            format!("expected at most {} groups, got {}", IPV6_MAX_GROUPS, groups.len()),
        ));
    }

    groups.iter().try_fold(0u128, |acc, group| {
        if group.is_empty() {
            return Err(Error::address_parse(
                address,
                "empty group (zero compression is not expanded)",
            ));
        }
        if group.len() > IPV6_GROUP_DIGITS || !group.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(Error::address_parse(
                address,
                format!("group '{}' is not a 16-bit hex value", group),
            ));
        }
        let value = u16::from_str_radix(group, 16).map_err(|e| {
            Error::address_parse(address, format!("group '{}': {}", group, e))
        })?;
        Ok((acc << 16) | u128::from(value))
    })
}
