//! Tor onion addresses
//!
//! This module defines v2 and v3 Tor onion addresses. The address text is
//! validated once and then stored inline, so the value is `Copy` and can be
//! handed across the node without allocation.

use std::{
    cmp::Ordering,
    fmt::{self, Display},
    str::{self, FromStr},
};

use serde::{Deserialize, Serialize};

use crate::{
    error::AddressError,
    network_address::{parse::split_host_port, serde_helper::TorAddressArchive, AddressType, Zone},
};

/// The host string carried by addresses that were default constructed or
/// sanitised away during deserialization.
pub(crate) const UNKNOWN_TOR_HOST: &str = "<unknown tor host>";

/// A v2 onion host is 16 base32 characters plus `.onion`.
const V2_HOST_LEN: usize = 22;
/// A v3 onion host is 56 base32 characters plus `.onion`.
/// <https://spec.torproject.org/rend-spec/encoding-onion-addresses.html>
const V3_HOST_LEN: usize = 62;

/// The validated host portion of a [`TorAddress`].
///
/// The discriminant doubles as the unknown-sentinel detector, keeping string
/// comparisons off the lookup path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum TorHost {
    /// No valid host present.
    Unknown,
    /// A v2 onion host, `.onion` suffix included.
    V2([u8; V2_HOST_LEN]),
    /// A v3 onion host, `.onion` suffix included.
    V3([u8; V3_HOST_LEN]),
}

/// A Tor onion address and virtual port.
///
/// Immutable after construction, so freely shareable and copyable across
/// threads. A port of `0` means "unspecified" and is omitted from the
/// [`Display`] form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "TorAddressArchive", into = "TorAddressArchive")]
pub struct TorAddress {
    host: TorHost,
    port: u16,
}

impl TorAddress {
    /// Attempt to parse `address` as `<host>[:<port>]`.
    ///
    /// The port suffix, when present and non-empty, must be a decimal in
    /// `0..=65535`; otherwise `default_port` is used. The host must be
    /// exactly a v2 (22 character) or v3 (62 character) onion host.
    ///
    /// # Errors
    /// [`AddressError::InvalidPort`] if the port suffix fails to parse and
    /// [`AddressError::InvalidTorAddress`] if the host fails validation.
    pub fn make(address: &str, default_port: u16) -> Result<Self, AddressError> {
        let (host, port) = split_host_port(address, default_port)?;

        match check_host(host) {
            Some(host) => Ok(Self { host, port }),
            None => Err(AddressError::InvalidTorAddress),
        }
    }

    /// The distinguished "no address present" value.
    pub const fn unknown() -> Self {
        Self {
            host: TorHost::Unknown,
            port: 0,
        }
    }

    /// Whether this is the [`TorAddress::unknown`] sentinel.
    pub const fn is_unknown(&self) -> bool {
        matches!(self.host, TorHost::Unknown)
    }

    /// Whether a ban list entry can meaningfully refer to this address.
    ///
    /// `false` only for the unknown sentinel, which names no host at all.
    pub const fn is_blockable(&self) -> bool {
        !self.is_unknown()
    }

    /// Onion addresses are never local.
    pub const fn is_local(&self) -> bool {
        false
    }

    /// Onion addresses are never loopback.
    pub const fn is_loopback(&self) -> bool {
        false
    }

    /// The address type tag carried by the generic
    /// [`NetworkAddress`](crate::NetworkAddress).
    pub const fn get_type_id(&self) -> AddressType {
        AddressType::Tor
    }

    /// The network zone this address routes through.
    pub const fn get_zone(&self) -> Zone {
        Zone::Tor
    }

    /// The host text, `.onion` suffix included.
    ///
    /// Returns the sentinel string (not an empty string) for the unknown
    /// value.
    pub fn host_str(&self) -> &str {
        match &self.host {
            TorHost::Unknown => UNKNOWN_TOR_HOST,
            TorHost::V2(host) => str::from_utf8(host).expect("host was validated as ASCII"),
            TorHost::V3(host) => str::from_utf8(host).expect("host was validated as ASCII"),
        }
    }

    /// The virtual port, `0` when unspecified.
    pub const fn port(&self) -> u16 {
        self.port
    }

    /// Whether `other` names the same host, ports ignored.
    pub fn is_same_host(&self, other: &Self) -> bool {
        self.host == other.host
    }

    /// Rebuild an address from untrusted wire fields.
    ///
    /// A host that is over-long, fails validation or does not match the
    /// sentinel degrades to [`TorAddress::unknown`] instead of erroring: a
    /// hostile peer must not be able to grow allocations or abort a load by
    /// lying about the host field.
    pub(crate) fn from_wire_parts(host: &str, port: u16) -> Self {
        if host == UNKNOWN_TOR_HOST {
            return Self::unknown();
        }

        match check_host(host) {
            Some(host) => Self { host, port },
            None => {
                tracing::trace!(
                    len = host.len(),
                    "replacing invalid tor host field with the unknown sentinel"
                );
                Self::unknown()
            }
        }
    }
}

/// Validate a complete onion host, returning its inline representation.
///
/// Every byte outside the `.onion` suffix must be in the base32 alphabet
/// `[a-z2-7]`, which also rejects embedded NULs and control bytes.
fn check_host(host: &str) -> Option<TorHost> {
    let label = host.strip_suffix(".onion")?;

    if !label
        .bytes()
        .all(|c| c.is_ascii_lowercase() || (b'2'..=b'7').contains(&c))
    {
        return None;
    }

    match label.len() {
        16 => Some(TorHost::V2(host.as_bytes().try_into().ok()?)),
        56 => Some(TorHost::V3(host.as_bytes().try_into().ok()?)),
        _ => None,
    }
}

impl Default for TorAddress {
    fn default() -> Self {
        Self::unknown()
    }
}

impl Ord for TorAddress {
    /// Hosts compare lexicographically with ties broken by port, except that
    /// the unknown sentinel orders before every valid host. (The sentinel
    /// text itself would not: `<` sorts after `2`.)
    fn cmp(&self, other: &Self) -> Ordering {
        match (self.is_unknown(), other.is_unknown()) {
            (true, false) => Ordering::Less,
            (false, true) => Ordering::Greater,
            _ => self
                .host_str()
                .cmp(other.host_str())
                .then(self.port.cmp(&other.port)),
        }
    }
}

impl PartialOrd for TorAddress {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Display for TorAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.port == 0 {
            f.write_str(self.host_str())
        } else {
            write!(f, "{}:{}", self.host_str(), self.port)
        }
    }
}

impl FromStr for TorAddress {
    type Err = AddressError;

    fn from_str(address: &str) -> Result<Self, Self::Err> {
        Self::make(address, 0)
    }
}
