//! I2P b32 addresses, the same contract as [`TorAddress`](crate::TorAddress)
//! over the `.b32.i2p` namespace.

use std::{
    cmp::Ordering,
    fmt::{self, Display},
    str::{self, FromStr},
};

use serde::{Deserialize, Serialize};

use crate::{
    error::AddressError,
    network_address::{parse::split_host_port, serde_helper::I2pAddressArchive, AddressType, Zone},
};

pub(crate) const UNKNOWN_I2P_HOST: &str = "<unknown i2p host>";

/// A b32 host is 52 base32 characters plus `.b32.i2p`.
const B32_HOST_LEN: usize = 60;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum I2pHost {
    Unknown,
    B32([u8; B32_HOST_LEN]),
}

/// An I2P b32 address and virtual port.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "I2pAddressArchive", into = "I2pAddressArchive")]
pub struct I2pAddress {
    host: I2pHost,
    port: u16,
}

impl I2pAddress {
    /// Attempt to parse `address` as `<host>[:<port>]`.
    ///
    /// # Errors
    /// [`AddressError::InvalidPort`] if the port suffix fails to parse and
    /// [`AddressError::InvalidI2pAddress`] if the host fails validation.
    pub fn make(address: &str, default_port: u16) -> Result<Self, AddressError> {
        let (host, port) = split_host_port(address, default_port)?;

        match check_host(host) {
            Some(host) => Ok(Self { host, port }),
            None => Err(AddressError::InvalidI2pAddress),
        }
    }

    /// The distinguished "no address present" value.
    pub const fn unknown() -> Self {
        Self {
            host: I2pHost::Unknown,
            port: 0,
        }
    }

    /// Whether this is the [`I2pAddress::unknown`] sentinel.
    pub const fn is_unknown(&self) -> bool {
        matches!(self.host, I2pHost::Unknown)
    }

    /// Whether a ban list entry can meaningfully refer to this address.
    pub const fn is_blockable(&self) -> bool {
        !self.is_unknown()
    }

    /// I2P addresses are never local.
    pub const fn is_local(&self) -> bool {
        false
    }

    /// I2P addresses are never loopback.
    pub const fn is_loopback(&self) -> bool {
        false
    }

    /// The address type tag carried by the generic
    /// [`NetworkAddress`](crate::NetworkAddress).
    pub const fn get_type_id(&self) -> AddressType {
        AddressType::I2p
    }

    /// The network zone this address routes through.
    pub const fn get_zone(&self) -> Zone {
        Zone::I2p
    }

    /// The host text, `.b32.i2p` suffix included, or the sentinel string for
    /// the unknown value.
    pub fn host_str(&self) -> &str {
        match &self.host {
            I2pHost::Unknown => UNKNOWN_I2P_HOST,
            I2pHost::B32(host) => str::from_utf8(host).expect("host was validated as ASCII"),
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

    /// Rebuild an address from untrusted wire fields, degrading to
    /// [`I2pAddress::unknown`] instead of erroring.
    pub(crate) fn from_wire_parts(host: &str, port: u16) -> Self {
        if host == UNKNOWN_I2P_HOST {
            return Self::unknown();
        }

        match check_host(host) {
            Some(host) => Self { host, port },
            None => {
                tracing::trace!(
                    len = host.len(),
                    "replacing invalid i2p host field with the unknown sentinel"
                );
                Self::unknown()
            }
        }
    }
}

fn check_host(host: &str) -> Option<I2pHost> {
    let label = host.strip_suffix(".b32.i2p")?;

    if label.len() != 52 {
        return None;
    }

    if !label
        .bytes()
        .all(|c| c.is_ascii_lowercase() || (b'2'..=b'7').contains(&c))
    {
        return None;
    }

    Some(I2pHost::B32(host.as_bytes().try_into().ok()?))
}

impl Default for I2pAddress {
    fn default() -> Self {
        Self::unknown()
    }
}

impl Ord for I2pAddress {
    /// Lexicographic by host then port, with the unknown sentinel first.
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

impl PartialOrd for I2pAddress {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Display for I2pAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.port == 0 {
            f.write_str(self.host_str())
        } else {
            write!(f, "{}:{}", self.host_str(), self.port)
        }
    }
}

impl FromStr for I2pAddress {
    type Err = AddressError;

    fn from_str(address: &str) -> Result<Self, Self::Err> {
        Self::make(address, 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const B32_I2P: &str = "vww6ybal4bd7szmgncyruucpgfkqahzddi37ktceo3ah7ngmcopn.b32.i2p";
    const B32_I2P_2: &str = "xmrto2bturnore26xmrto2bturnore26xmrto2bturnore26xmr2.b32.i2p";

    #[test]
    fn invalid() {
        assert!(I2pAddress::make("", 0).is_err());
        assert!(I2pAddress::make(":", 0).is_err());
        assert!(I2pAddress::make(".b32.i2p", 0).is_err());
        assert!(I2pAddress::make(".b32.i2p:", 0).is_err());
        assert!(I2pAddress::make(&B32_I2P[1..], 0).is_err());
        assert!(I2pAddress::make(&B32_I2P[..B32_I2P.len() - 1], 0).is_err());
        assert_eq!(
            Err(AddressError::InvalidPort),
            I2pAddress::make(&format!("{B32_I2P}:65536"), 0)
        );
        assert_eq!(
            Err(AddressError::InvalidPort),
            I2pAddress::make(&format!("{B32_I2P}:-1"), 0)
        );

        let mut i2p = B32_I2P.to_string();
        i2p.replace_range(10..11, "\u{1}");
        assert_eq!(
            Err(AddressError::InvalidI2pAddress),
            I2pAddress::make(&i2p, 0)
        );
    }

    #[test]
    fn unknown_sentinel() {
        let i2p = I2pAddress::default();

        assert_eq!("<unknown i2p host>", i2p.host_str());
        assert_eq!("<unknown i2p host>", i2p.to_string());
        assert_eq!(0, i2p.port());
        assert!(i2p.is_unknown());
        assert!(!i2p.is_blockable());
        assert_eq!(AddressType::I2p, i2p.get_type_id());
        assert_eq!(Zone::I2p, i2p.get_zone());
        assert_eq!(I2pAddress::unknown(), i2p);
    }

    #[test]
    fn valid() {
        let address1 = I2pAddress::make(B32_I2P, 0).unwrap();

        assert_eq!(0, address1.port());
        assert_eq!(B32_I2P, address1.host_str());
        assert_eq!(B32_I2P, address1.to_string());
        assert!(address1.is_blockable());

        let address2 = I2pAddress::make(&format!("{B32_I2P_2}:6545"), 0).unwrap();

        assert_eq!(6545, address2.port());
        assert_eq!(B32_I2P_2, address2.host_str());
        assert_eq!(format!("{B32_I2P_2}:6545"), address2.to_string());
        assert!(!address2.is_same_host(&address1));
        assert!(address1 < address2);

        let address3 = I2pAddress::make(&format!("{B32_I2P}:"), 65535).unwrap();

        assert_eq!(65535, address3.port());
        assert_eq!(B32_I2P, address3.host_str());
        assert_ne!(address3, address1);
        assert!(address3.is_same_host(&address1));
        assert!(address1 < address3);
        assert!(address3 < address2);
    }
}
