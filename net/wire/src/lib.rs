//! # Galena Wire
//!
//! A crate defining the network address value types passed around the node
//! and the parser that classifies textual endpoints into them.
//!
//! Addresses are immutable values: parse/validate once, then copy freely.
//! Nothing here performs Tor or I2P cryptography or resolves hostnames;
//! validation is purely syntactic.
//!
//! ## License
//!
//! This project is licensed under the MIT License.

// Coding conventions
#![forbid(unsafe_code)]
#![deny(non_upper_case_globals)]
#![deny(non_camel_case_types)]
#![deny(unused_mut)]
#![deny(missing_docs)]

pub mod error;
pub mod network_address;

pub use error::AddressError;
pub use network_address::{
    get_ipv4_subnet_address, get_network_address, AddressType, I2pAddress, Ipv4NetworkSubnet,
    NetworkAddress, NetworkAddressIncorrectZone, TorAddress, Zone,
};
