//! Keyed wire forms of the address types.
//!
//! Each anonymity-network address serializes as an object with exactly the
//! fields `host` (string) and `port` (u16); embedding one in an outer
//! message under a field named for the kind gives the `tor`/`i2p` section
//! layout peers expect. Loading applies the same sanitise-to-unknown policy
//! as the archival forms: a lying host field must never grow an allocation
//! or abort the load.

use std::net::{Ipv4Addr, Ipv6Addr, SocketAddr, SocketAddrV4, SocketAddrV6};

use bytes::{Buf, BufMut};

use cuprate_epee_encoding::{
    epee_object, read_epee_value, write_field, EpeeObject, EpeeObjectBuilder,
};

use crate::network_address::{AddressType, I2pAddress, NetworkAddress, TorAddress};

#[derive(Default)]
pub struct TorAddressBuilder {
    host: Option<String>,
    port: Option<u16>,
}

impl EpeeObjectBuilder<TorAddress> for TorAddressBuilder {
    fn add_field<B: Buf>(&mut self, name: &str, b: &mut B) -> cuprate_epee_encoding::Result<bool> {
        match name {
            "host" => {
                if self.host.replace(read_epee_value(b)?).is_some() {
                    return Err(cuprate_epee_encoding::Error::Format(
                        "Duplicate field in data.",
                    ));
                }
                Ok(true)
            }
            "port" => {
                if self.port.replace(read_epee_value(b)?).is_some() {
                    return Err(cuprate_epee_encoding::Error::Format(
                        "Duplicate field in data.",
                    ));
                }
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    fn finish(self) -> cuprate_epee_encoding::Result<TorAddress> {
        let host = self
            .host
            .ok_or(cuprate_epee_encoding::Error::Format("Missing host field"))?;

        Ok(TorAddress::from_wire_parts(&host, self.port.unwrap_or(0)))
    }
}

impl EpeeObject for TorAddress {
    type Builder = TorAddressBuilder;

    fn number_of_fields(&self) -> u64 {
        2
    }

    fn write_fields<B: BufMut>(self, w: &mut B) -> cuprate_epee_encoding::Result<()> {
        write_field(self.host_str().to_string(), "host", w)?;
        write_field(self.port(), "port", w)
    }
}

#[derive(Default)]
pub struct I2pAddressBuilder {
    host: Option<String>,
    port: Option<u16>,
}

impl EpeeObjectBuilder<I2pAddress> for I2pAddressBuilder {
    fn add_field<B: Buf>(&mut self, name: &str, b: &mut B) -> cuprate_epee_encoding::Result<bool> {
        match name {
            "host" => {
                if self.host.replace(read_epee_value(b)?).is_some() {
                    return Err(cuprate_epee_encoding::Error::Format(
                        "Duplicate field in data.",
                    ));
                }
                Ok(true)
            }
            "port" => {
                if self.port.replace(read_epee_value(b)?).is_some() {
                    return Err(cuprate_epee_encoding::Error::Format(
                        "Duplicate field in data.",
                    ));
                }
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    fn finish(self) -> cuprate_epee_encoding::Result<I2pAddress> {
        let host = self
            .host
            .ok_or(cuprate_epee_encoding::Error::Format("Missing host field"))?;

        Ok(I2pAddress::from_wire_parts(&host, self.port.unwrap_or(0)))
    }
}

impl EpeeObject for I2pAddress {
    type Builder = I2pAddressBuilder;

    fn number_of_fields(&self) -> u64 {
        2
    }

    fn write_fields<B: BufMut>(self, w: &mut B) -> cuprate_epee_encoding::Result<()> {
        write_field(self.host_str().to_string(), "host", w)?;
        write_field(self.port(), "port", w)
    }
}

#[derive(Default)]
pub struct TaggedNetworkAddress {
    ty: Option<u8>,
    addr: Option<AllFieldsNetworkAddress>,
}

epee_object!(
    TaggedNetworkAddress,
    ty("type"): Option<u8>,
    addr: Option<AllFieldsNetworkAddress>,
);

impl EpeeObjectBuilder<NetworkAddress> for TaggedNetworkAddress {
    fn add_field<B: Buf>(&mut self, name: &str, b: &mut B) -> cuprate_epee_encoding::Result<bool> {
        match name {
            "type" => {
                if std::mem::replace(&mut self.ty, Some(read_epee_value(b)?)).is_some() {
                    return Err(cuprate_epee_encoding::Error::Format(
                        "Duplicate field in data.",
                    ));
                }
                Ok(true)
            }
            "addr" => {
                if std::mem::replace(&mut self.addr, read_epee_value(b)?).is_some() {
                    return Err(cuprate_epee_encoding::Error::Format(
                        "Duplicate field in data.",
                    ));
                }
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    fn finish(self) -> cuprate_epee_encoding::Result<NetworkAddress> {
        self.try_into().map_err(|_| {
            cuprate_epee_encoding::Error::Value("Invalid network address".to_string())
        })
    }
}

/// Error for a tagged address whose tag and fields do not line up.
pub struct InvalidNetworkAddress;

impl TryFrom<TaggedNetworkAddress> for NetworkAddress {
    type Error = InvalidNetworkAddress;

    fn try_from(value: TaggedNetworkAddress) -> Result<Self, Self::Error> {
        value
            .addr
            .ok_or(InvalidNetworkAddress)?
            .try_into_network_address(value.ty.ok_or(InvalidNetworkAddress)?)
            .ok_or(InvalidNetworkAddress)
    }
}

impl From<NetworkAddress> for TaggedNetworkAddress {
    fn from(value: NetworkAddress) -> Self {
        match value {
            NetworkAddress::Clear(SocketAddr::V4(addr)) => Self {
                ty: Some(AddressType::Ipv4.into()),
                addr: Some(AllFieldsNetworkAddress {
                    m_ip: Some(u32::from_be_bytes(addr.ip().octets())),
                    m_port: Some(addr.port()),
                    ..Default::default()
                }),
            },
            NetworkAddress::Clear(SocketAddr::V6(addr)) => Self {
                ty: Some(AddressType::Ipv6.into()),
                addr: Some(AllFieldsNetworkAddress {
                    addr: Some(addr.ip().octets()),
                    m_port: Some(addr.port()),
                    ..Default::default()
                }),
            },
            NetworkAddress::Tor(tor) => Self {
                ty: Some(AddressType::Tor.into()),
                addr: Some(AllFieldsNetworkAddress {
                    host: Some(tor.host_str().to_string()),
                    port: Some(tor.port()),
                    ..Default::default()
                }),
            },
            NetworkAddress::I2p(i2p) => Self {
                ty: Some(AddressType::I2p.into()),
                addr: Some(AllFieldsNetworkAddress {
                    host: Some(i2p.host_str().to_string()),
                    port: Some(i2p.port()),
                    ..Default::default()
                }),
            },
        }
    }
}

impl EpeeObject for NetworkAddress {
    type Builder = TaggedNetworkAddress;

    fn number_of_fields(&self) -> u64 {
        TaggedNetworkAddress::from(*self).number_of_fields()
    }

    fn write_fields<B: BufMut>(self, w: &mut B) -> cuprate_epee_encoding::Result<()> {
        TaggedNetworkAddress::from(self).write_fields(w)
    }
}

#[derive(Default)]
struct AllFieldsNetworkAddress {
    m_ip: Option<u32>,
    m_port: Option<u16>,
    addr: Option<[u8; 16]>,
    host: Option<String>,
    port: Option<u16>,
}

epee_object!(
    AllFieldsNetworkAddress,
    m_ip: Option<u32>,
    m_port: Option<u16>,
    addr: Option<[u8; 16]>,
    host: Option<String>,
    port: Option<u16>,
);

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
