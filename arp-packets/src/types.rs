use std::fmt;

pub type PacketData = Vec<u8>;

pub const ARP_ETHER_TYPE: u16 = 0x0806;
pub const IPV4_ETHER_TYPE: u16 = 0x0800;
pub const IPV6_ETHER_TYPE: u16 = 0x86DD;

/// A 6 byte link-layer (MAC) address.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct MacAddr {
    pub bytes: [u8; 6],
}

impl MacAddr {
    pub fn new(bytes: [u8; 6]) -> MacAddr {
        MacAddr { bytes }
    }

    /// The all-ones address, delivered to every host on the segment.
    pub fn broadcast() -> MacAddr {
        MacAddr::new([0xff; 6])
    }

    pub fn zero() -> MacAddr {
        MacAddr::new([0; 6])
    }

    pub fn is_broadcast(&self) -> bool {
        self.bytes == [0xff; 6]
    }
}

impl From<[u8; 6]> for MacAddr {
    fn from(bytes: [u8; 6]) -> MacAddr {
        MacAddr::new(bytes)
    }
}

impl fmt::Display for MacAddr {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let b = &self.bytes;
        write!(
            f,
            "{:02x}:{:02x}:{:02x}:{:02x}:{:02x}:{:02x}",
            b[0], b[1], b[2], b[3], b[4], b[5]
        )
    }
}

impl fmt::Debug for MacAddr {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mac_addr_display() {
        let mac = MacAddr::new([0xde, 0xad, 0xbe, 0xef, 0x00, 0x01]);
        assert_eq!(format!("{}", mac), "de:ad:be:ef:00:01");
    }

    #[test]
    fn broadcast_is_all_ones() {
        assert!(MacAddr::broadcast().is_broadcast());
        assert!(!MacAddr::zero().is_broadcast());
    }
}
