//! The dispatching endpoint parser.
//!
//! Turns a textual `<host>[:<port>]` endpoint into a typed
//! [`NetworkAddress`], classifying by host suffix before any validation so
//! that a malformed onion host is reported as a Tor problem rather than
//! falling through to the IPv4 parser.

use std::net::{Ipv4Addr, SocketAddrV4};

use crate::{
    error::AddressError,
    network_address::{I2pAddress, NetworkAddress, TorAddress},
};

/// Parse a textual endpoint into a typed [`NetworkAddress`].
///
/// Dispatching is on the host portion, in order: a `.onion` suffix goes to
/// [`TorAddress::make`], a `.b32.i2p` suffix to [`I2pAddress::make`], a
/// dotted-quad IPv4 is accepted directly and anything else is
/// [`AddressError::UnsupportedAddress`].
///
/// A host that is only the bare suffix (`".onion"`, `".b32.i2p"`) still
/// reaches the matching constructor and fails as that variant's invalid
/// address, while a host missing the leading dot entirely (`"onion"`) is
/// unsupported.
///
/// # Errors
/// Any of the [`AddressError`] categories except
/// [`AddressError::InvalidMask`].
pub fn get_network_address(
    address: &str,
    default_port: u16,
) -> Result<NetworkAddress, AddressError> {
    let host = address.rsplit_once(':').map_or(address, |(host, _)| host);

    if host.ends_with(".onion") {
        return TorAddress::make(address, default_port).map(Into::into);
    }

    if host.ends_with(".b32.i2p") {
        return I2pAddress::make(address, default_port).map(Into::into);
    }

    let (host, port) = split_host_port(address, default_port)?;
    let ip: Ipv4Addr = host
        .parse()
        .map_err(|_| AddressError::UnsupportedAddress)?;

    Ok(SocketAddrV4::new(ip, port).into())
}

/// Split `address` at the last `:` into a host and a port.
///
/// No suffix, or an empty one (`"host:"`), resolves to `default_port`.
pub(crate) fn split_host_port(
    address: &str,
    default_port: u16,
) -> Result<(&str, u16), AddressError> {
    match address.rsplit_once(':') {
        None => Ok((address, default_port)),
        Some((host, "")) => Ok((host, default_port)),
        Some((host, port)) => Ok((
            host,
            port.parse().map_err(|_| AddressError::InvalidPort)?,
        )),
    }
}
