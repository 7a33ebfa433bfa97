//! Resolves protocol addresses to link-layer hardware addresses by speaking ARP (RFC 826)
//! directly over a raw `AF_PACKET` socket, bypassing the kernel's own ARP cache.
//!
//! ```no_run
//! use std::net::Ipv4Addr;
//!
//! # fn main() -> Result<(), arp_client::Error> {
//! // None discovers the device bound to the default route.
//! let mut client = arp_client::Client::open(None)?;
//! let mac = client.resolve(Ipv4Addr::new(192, 168, 0, 1).into())?;
//! println!("192.168.0.1 is at {}", mac);
//! # Ok(())
//! # }
//! ```

mod client;
pub use self::client::{Client, Transport};

mod error;
pub use self::error::Error;

pub mod netdev;
