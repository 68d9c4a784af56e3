//! IPv4 subnets, as accepted by ban lists and connection filters.

use std::{
    fmt::{self, Display},
    net::Ipv4Addr,
};

use crate::error::AddressError;

/// An IPv4 network prefix in CIDR notation.
///
/// The network part is stored already masked down, so two subnets written
/// with different host bits compare equal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Ipv4NetworkSubnet {
    network: Ipv4Addr,
    mask: u8,
}

impl Ipv4NetworkSubnet {
    /// Build a subnet from any address inside it and a prefix length.
    pub fn new(address: Ipv4Addr, mask: u8) -> Self {
        let mask = mask.min(32);
        let bits = u32::MAX.checked_shl(32 - u32::from(mask)).unwrap_or(0);

        Self {
            network: Ipv4Addr::from(u32::from(address) & bits),
            mask,
        }
    }

    /// The masked network address.
    pub const fn network(&self) -> Ipv4Addr {
        self.network
    }

    /// The prefix length.
    pub const fn mask(&self) -> u8 {
        self.mask
    }

    /// Whether `address` falls inside this subnet.
    pub fn contains(&self, address: Ipv4Addr) -> bool {
        Self::new(address, self.mask) == *self
    }
}

impl Display for Ipv4NetworkSubnet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.network, self.mask)
    }
}

/// Parse `a.b.c.d/bits` into an [`Ipv4NetworkSubnet`].
///
/// A missing `/bits` is accepted as a single-host `/32` subnet only when
/// `allow_implicit_32` is set.
///
/// # Errors
/// [`AddressError::InvalidMask`] for a missing or out-of-range prefix
/// length, [`AddressError::UnsupportedAddress`] for a bad network part.
pub fn get_ipv4_subnet_address(
    address: &str,
    allow_implicit_32: bool,
) -> Result<Ipv4NetworkSubnet, AddressError> {
    let (host, mask) = match address.rsplit_once('/') {
        Some((host, mask)) => (
            host,
            mask.parse::<u8>()
                .ok()
                .filter(|mask| *mask <= 32)
                .ok_or(AddressError::InvalidMask)?,
        ),
        None if allow_implicit_32 => (address, 32),
        None => return Err(AddressError::InvalidMask),
    };

    let ip: Ipv4Addr = host
        .parse()
        .map_err(|_| AddressError::UnsupportedAddress)?;

    Ok(Ipv4NetworkSubnet::new(ip, mask))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse() {
        assert_eq!(
            "0.0.0.0/32",
            get_ipv4_subnet_address("0.0.0.0", true).unwrap().to_string()
        );
        assert_eq!(
            Err(AddressError::InvalidMask),
            get_ipv4_subnet_address("0.0.0.0", false)
        );
        assert_eq!(
            "0.0.0.0/32",
            get_ipv4_subnet_address("0.0.0.0/32", false).unwrap().to_string()
        );
        assert_eq!(
            "0.0.0.0/0",
            get_ipv4_subnet_address("0.0.0.0/0", false).unwrap().to_string()
        );
        // Host bits are masked away.
        assert_eq!(
            "12.34.0.0/16",
            get_ipv4_subnet_address("12.34.56.78/16", false).unwrap().to_string()
        );

        assert_eq!(
            Err(AddressError::InvalidMask),
            get_ipv4_subnet_address("12.34.56.78/33", false)
        );
        assert_eq!(
            Err(AddressError::UnsupportedAddress),
            get_ipv4_subnet_address("12.34.56/16", false)
        );
    }

    #[test]
    fn contains() {
        let subnet = get_ipv4_subnet_address("12.34.56.78/16", false).unwrap();

        assert!(subnet.contains(Ipv4Addr::new(12, 34, 0, 1)));
        assert!(subnet.contains(Ipv4Addr::new(12, 34, 255, 255)));
        assert!(!subnet.contains(Ipv4Addr::new(12, 35, 0, 1)));

        let all = get_ipv4_subnet_address("0.0.0.0/0", false).unwrap();
        assert!(all.contains(Ipv4Addr::new(255, 255, 255, 255)));
    }
}
