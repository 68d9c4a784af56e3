//! Helper types for the archival serde forms of the address types.
//!
//! Deserialization of the per-address archives is infallible by
//! construction: a record that fails validation degrades to the unknown
//! sentinel instead of erroring, so hostile archive contents can never
//! abort a load (see [`TorAddress::unknown`]).

use std::net::{Ipv4Addr, Ipv6Addr, SocketAddr, SocketAddrV4, SocketAddrV6};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::network_address::{AddressType, I2pAddress, NetworkAddress, TorAddress};

/// The version tag written into address archives.
const ADDRESS_ARCHIVE_VERSION: u8 = 1;

/// The versioned archival record of a [`TorAddress`].
#[derive(Serialize, Deserialize)]
pub(crate) struct TorAddressArchive {
    version: u8,
    host: String,
    port: u16,
}

impl From<TorAddress> for TorAddressArchive {
    fn from(value: TorAddress) -> Self {
        Self {
            version: ADDRESS_ARCHIVE_VERSION,
            host: value.host_str().to_string(),
            port: value.port(),
        }
    }
}

impl From<TorAddressArchive> for TorAddress {
    fn from(value: TorAddressArchive) -> Self {
        if value.version != ADDRESS_ARCHIVE_VERSION {
            tracing::trace!(
                version = value.version,
                "unhandled tor address archive version"
            );
            return Self::unknown();
        }

        Self::from_wire_parts(&value.host, value.port)
    }
}

/// The versioned archival record of an [`I2pAddress`].
#[derive(Serialize, Deserialize)]
pub(crate) struct I2pAddressArchive {
    version: u8,
    host: String,
    port: u16,
}

impl From<I2pAddress> for I2pAddressArchive {
    fn from(value: I2pAddress) -> Self {
        Self {
            version: ADDRESS_ARCHIVE_VERSION,
            host: value.host_str().to_string(),
            port: value.port(),
        }
    }
}

impl From<I2pAddressArchive> for I2pAddress {
    fn from(value: I2pAddressArchive) -> Self {
        if value.version != ADDRESS_ARCHIVE_VERSION {
            tracing::trace!(
                version = value.version,
                "unhandled i2p address archive version"
            );
            return Self::unknown();
        }

        Self::from_wire_parts(&value.host, value.port)
    }
}

/// The serde form of a [`NetworkAddress`]: an address kind tag plus a
/// superset of every kind's fields.
#[derive(Serialize, Deserialize)]
pub(crate) struct TaggedNetworkAddress {
    #[serde(rename = "type")]
    ty: u8,
    addr: AllFieldsNetworkAddress,
}

#[derive(Error, Debug)]
#[error("Invalid network address")]
pub(crate) struct InvalidNetworkAddress;

impl TryFrom<TaggedNetworkAddress> for NetworkAddress {
    type Error = InvalidNetworkAddress;

    fn try_from(value: TaggedNetworkAddress) -> Result<Self, Self::Error> {
        value
            .addr
            .try_into_network_address(value.ty)
            .ok_or(InvalidNetworkAddress)
    }
}

impl From<NetworkAddress> for TaggedNetworkAddress {
    fn from(value: NetworkAddress) -> Self {
        match value {
            NetworkAddress::Clear(SocketAddr::V4(addr)) => Self {
                ty: AddressType::Ipv4.into(),
                addr: AllFieldsNetworkAddress {
                    m_ip: Some(u32::from_be_bytes(addr.ip().octets())),
                    m_port: Some(addr.port()),
                    ..Default::default()
                },
            },
            NetworkAddress::Clear(SocketAddr::V6(addr)) => Self {
                ty: AddressType::Ipv6.into(),
                addr: AllFieldsNetworkAddress {
                    addr: Some(addr.ip().octets()),
                    m_port: Some(addr.port()),
                    ..Default::default()
                },
            },
            NetworkAddress::Tor(tor) => Self {
                ty: AddressType::Tor.into(),
                addr: AllFieldsNetworkAddress {
                    host: Some(tor.host_str().to_string()),
                    port: Some(tor.port()),
                    ..Default::default()
                },
            },
            NetworkAddress::I2p(i2p) => Self {
                ty: AddressType::I2p.into(),
                addr: AllFieldsNetworkAddress {
                    host: Some(i2p.host_str().to_string()),
                    port: Some(i2p.port()),
                    ..Default::default()
                },
            },
        }
    }
}

#[derive(Serialize, Deserialize, Default)]
struct AllFieldsNetworkAddress {
    #[serde(skip_serializing_if = "Option::is_none")]
    m_ip: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    m_port: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    addr: Option<[u8; 16]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    host: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    port: Option<u16>,
}

impl AllFieldsNetworkAddress {
    fn try_into_network_address(self, ty: u8) -> Option<NetworkAddress> {
        Some(match AddressType::try_from(ty).ok()? {
            AddressType::Ipv4 => {
                NetworkAddress::from(SocketAddrV4::new(Ipv4Addr::from(self.m_ip?), self.m_port?))
            }
            AddressType::Ipv6 => NetworkAddress::from(SocketAddrV6::new(
                Ipv6Addr::from(self.addr?),
                self.m_port?,
                0,
                0,
            )),
            AddressType::Tor => {
                NetworkAddress::from(TorAddress::from_wire_parts(&self.host?, self.port?))
            }
            AddressType::I2p => {
                NetworkAddress::from(I2pAddress::from_wire_parts(&self.host?, self.port?))
            }
            AddressType::Invalid => return None,
        })
    }
}
