//! Network addresses.
//!
//! This module defines the addresses that get passed around the network.
//! Four kinds are carried: IPv4, IPv6 (both under [`NetworkAddress::Clear`]),
//! Tor and I2P. The anonymity-network kinds are self-authenticating
//! hostnames, fixed-length base32 encodings of a public-key hash plus a
//! namespace suffix, so validation is purely syntactic and never touches a
//! resolver.

use std::{
    fmt::{self, Display},
    net::{self, SocketAddr},
};

use serde::{Deserialize, Serialize};
use thiserror::Error;

mod epee_builder;
mod i2p;
mod parse;
mod serde_helper;
mod subnet;
mod tor;

pub use i2p::I2pAddress;
pub use parse::get_network_address;
pub use subnet::{get_ipv4_subnet_address, Ipv4NetworkSubnet};
pub use tor::TorAddress;

use serde_helper::TaggedNetworkAddress;

/// The network zone an address routes through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Zone {
    /// The public internet.
    Public,
    /// The Tor network.
    Tor,
    /// The I2P network.
    I2p,
    /// No usable address: the payload is an unknown sentinel.
    Invalid,
}

impl Zone {
    /// The zone name used in logs and config sections.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Public => "public",
            Self::Tor => "tor",
            Self::I2p => "i2p",
            Self::Invalid => "invalid",
        }
    }
}

impl Display for Zone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The address kind tag, doubling as the `type` tag of the keyed wire form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum AddressType {
    /// No address.
    Invalid = 0,
    /// IPv4.
    Ipv4 = 1,
    /// IPv6.
    Ipv6 = 2,
    /// I2P.
    I2p = 3,
    /// Tor.
    Tor = 4,
}

impl From<AddressType> for u8 {
    fn from(value: AddressType) -> Self {
        value as Self
    }
}

impl TryFrom<u8> for AddressType {
    type Error = u8;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::Invalid),
            1 => Ok(Self::Ipv4),
            2 => Ok(Self::Ipv6),
            3 => Ok(Self::I2p),
            4 => Ok(Self::Tor),
            _ => Err(value),
        }
    }
}

/// A network address which can be encoded into the format required
/// to send to other peers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "TaggedNetworkAddress")]
#[serde(into = "TaggedNetworkAddress")]
pub enum NetworkAddress {
    /// A clear-net address.
    Clear(SocketAddr),
    /// A Tor onion address.
    Tor(TorAddress),
    /// An I2P b32 address.
    I2p(I2pAddress),
}

impl NetworkAddress {
    /// The zone this address routes through.
    ///
    /// [`Zone::Invalid`] is returned only when the payload is an
    /// unknown-sentinel address, the one way a [`NetworkAddress`] can hold
    /// "no address present".
    pub const fn get_zone(&self) -> Zone {
        match self {
            Self::Clear(_) => Zone::Public,
            Self::Tor(addr) => {
                if addr.is_unknown() {
                    Zone::Invalid
                } else {
                    Zone::Tor
                }
            }
            Self::I2p(addr) => {
                if addr.is_unknown() {
                    Zone::Invalid
                } else {
                    Zone::I2p
                }
            }
        }
    }

    /// The address kind tag.
    pub const fn get_type_id(&self) -> AddressType {
        match self {
            Self::Clear(SocketAddr::V4(_)) => AddressType::Ipv4,
            Self::Clear(SocketAddr::V6(_)) => AddressType::Ipv6,
            Self::Tor(_) => AddressType::Tor,
            Self::I2p(_) => AddressType::I2p,
        }
    }

    /// The host portion as text, without the port.
    pub fn host_str(&self) -> String {
        match self {
            Self::Clear(addr) => addr.ip().to_string(),
            Self::Tor(addr) => addr.host_str().to_string(),
            Self::I2p(addr) => addr.host_str().to_string(),
        }
    }

    /// The port, `0` when unspecified.
    pub const fn port(&self) -> u16 {
        match self {
            Self::Clear(addr) => addr.port(),
            Self::Tor(addr) => addr.port(),
            Self::I2p(addr) => addr.port(),
        }
    }

    /// Whether this address is on a local network.
    pub fn is_local(&self) -> bool {
        match self {
            Self::Clear(SocketAddr::V4(addr)) => {
                addr.ip().is_private() || addr.ip().is_link_local()
            }
            Self::Clear(SocketAddr::V6(addr)) => addr.ip().is_unique_local(),
            Self::Tor(_) | Self::I2p(_) => false,
        }
    }

    /// Whether this address is a loopback address.
    pub fn is_loopback(&self) -> bool {
        match self {
            Self::Clear(addr) => addr.ip().is_loopback(),
            Self::Tor(_) | Self::I2p(_) => false,
        }
    }

    /// Whether a ban list entry can meaningfully refer to this address.
    pub const fn is_blockable(&self) -> bool {
        match self {
            Self::Clear(_) => true,
            Self::Tor(addr) => addr.is_blockable(),
            Self::I2p(addr) => addr.is_blockable(),
        }
    }
}

impl Display for NetworkAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Clear(addr) => addr.fmt(f),
            Self::Tor(addr) => addr.fmt(f),
            Self::I2p(addr) => addr.fmt(f),
        }
    }
}

impl From<net::SocketAddrV4> for NetworkAddress {
    fn from(value: net::SocketAddrV4) -> Self {
        Self::Clear(value.into())
    }
}

impl From<net::SocketAddrV6> for NetworkAddress {
    fn from(value: net::SocketAddrV6) -> Self {
        Self::Clear(value.into())
    }
}

impl From<SocketAddr> for NetworkAddress {
    fn from(value: SocketAddr) -> Self {
        Self::Clear(value)
    }
}

impl From<TorAddress> for NetworkAddress {
    fn from(value: TorAddress) -> Self {
        Self::Tor(value)
    }
}

impl From<I2pAddress> for NetworkAddress {
    fn from(value: I2pAddress) -> Self {
        Self::I2p(value)
    }
}

/// Error when a [`NetworkAddress`] holds a different zone's address than the
/// one asked for.
#[derive(Debug, Error)]
#[error("network address is not in the correct zone")]
pub struct NetworkAddressIncorrectZone;

impl TryFrom<NetworkAddress> for TorAddress {
    type Error = NetworkAddressIncorrectZone;

    fn try_from(value: NetworkAddress) -> Result<Self, Self::Error> {
        match value {
            NetworkAddress::Tor(addr) => Ok(addr),
            _ => Err(NetworkAddressIncorrectZone),
        }
    }
}

impl TryFrom<NetworkAddress> for I2pAddress {
    type Error = NetworkAddressIncorrectZone;

    fn try_from(value: NetworkAddress) -> Result<Self, Self::Error> {
        match value {
            NetworkAddress::I2p(addr) => Ok(addr),
            _ => Err(NetworkAddressIncorrectZone),
        }
    }
}

impl TryFrom<NetworkAddress> for SocketAddr {
    type Error = NetworkAddressIncorrectZone;

    fn try_from(value: NetworkAddress) -> Result<Self, Self::Error> {
        match value {
            NetworkAddress::Clear(addr) => Ok(addr),
            _ => Err(NetworkAddressIncorrectZone),
        }
    }
}
