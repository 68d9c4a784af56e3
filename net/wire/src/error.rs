//! Errors returned when parsing textual endpoints.

use thiserror::Error;

/// An error categorising why a textual endpoint could not be turned into a
/// [`NetworkAddress`](crate::NetworkAddress).
///
/// These are returned, never panicked: the caller decides whether a bad
/// endpoint is fatal (a config value at startup) or transient (a misbehaving
/// peer, logged and dropped).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum AddressError {
    /// The input could not be classified as any known address kind.
    #[error("network address is not of a supported kind")]
    UnsupportedAddress,
    /// The input was classified as a Tor address but failed validation.
    #[error("invalid tor address")]
    InvalidTorAddress,
    /// The input was classified as an I2P address but failed validation.
    #[error("invalid i2p address")]
    InvalidI2pAddress,
    /// The port suffix failed to parse or is out of range.
    #[error("invalid port")]
    InvalidPort,
    /// The subnet mask is missing or out of range.
    #[error("invalid network mask")]
    InvalidMask,
}
