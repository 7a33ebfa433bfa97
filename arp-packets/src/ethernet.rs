use crate::{ArpPacket, MacAddr, PacketData, ARP_ETHER_TYPE};
use std::convert::{TryFrom, TryInto};

const HEADER_LEN: usize = 14;

///
/// An Ethernet II frame over an owned byte buffer.
///
/// 0                    6                    12                      14
/// |---6 byte Dest_MAC--|---6 byte Src_MAC---|--2 Byte EtherType---|
///
#[derive(Clone, Debug)]
pub struct EthernetFrame {
    pub data: PacketData,
}

impl EthernetFrame {
    pub fn from_buffer(frame: PacketData) -> Result<EthernetFrame, &'static str> {
        if frame.len() < HEADER_LEN {
            return Err("Frame is less than the minimum of 14 bytes");
        }

        Ok(EthernetFrame { data: frame })
    }

    /// Returns an empty EthernetFrame where all values are populated to zero. This function
    /// allocates a new buffer to hold the header.
    pub fn empty() -> EthernetFrame {
        EthernetFrame {
            data: vec![0; HEADER_LEN],
        }
    }

    pub fn dest_mac(&self) -> MacAddr {
        let bytes = <[u8; 6]>::try_from(&self.data[0..6]).unwrap();
        MacAddr::new(bytes)
    }

    pub fn src_mac(&self) -> MacAddr {
        let bytes = <[u8; 6]>::try_from(&self.data[6..12]).unwrap();
        MacAddr::new(bytes)
    }

    pub fn set_dest_mac(&mut self, mac: MacAddr) {
        self.data[..6].copy_from_slice(&mac.bytes[..6]);
    }

    pub fn set_src_mac(&mut self, mac: MacAddr) {
        self.data[6..12].copy_from_slice(&mac.bytes[..6]);
    }

    pub fn ether_type(&self) -> u16 {
        u16::from_be_bytes(self.data[12..=13].try_into().unwrap())
    }

    pub fn set_ether_type(&mut self, ether_type: u16) {
        self.data[12..=13].copy_from_slice(&ether_type.to_be_bytes());
    }

    pub fn payload(&self) -> &[u8] {
        &self.data[HEADER_LEN..]
    }

    pub fn set_payload(&mut self, payload: &[u8]) {
        self.data.truncate(HEADER_LEN);
        self.data.reserve_exact(payload.len());
        self.data.extend(payload);
    }

    /// Wraps an encoded ARP packet in a frame carrying the ARP ether type. The caller still
    /// has to fill in the source and destination MACs.
    pub fn encap_arp(packet: &ArpPacket) -> EthernetFrame {
        let mut frame = EthernetFrame::empty();
        frame.set_payload(&packet.encode());
        frame.set_ether_type(ARP_ETHER_TYPE);
        frame
    }
}

/// EthernetFrames are considered the same if they carry the same bytes from the layer 2
/// header onward.
impl PartialEq for EthernetFrame {
    fn eq(&self, other: &Self) -> bool {
        self.data == other.data
    }
}

impl Eq for EthernetFrame {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_frame_is_all_zero() {
        let frame = EthernetFrame::empty();
        assert_eq!(frame.data.len(), 14);
        assert_eq!(frame.dest_mac(), MacAddr::zero());
        assert_eq!(frame.src_mac(), MacAddr::zero());
        assert_eq!(frame.ether_type(), 0);
        assert!(frame.payload().is_empty());
    }

    #[test]
    fn from_buffer_rejects_runt_frames() {
        assert!(EthernetFrame::from_buffer(vec![0; 13]).is_err());
        assert!(EthernetFrame::from_buffer(vec![0; 14]).is_ok());
    }

    #[test]
    fn header_fields_roundtrip() {
        let mut frame = EthernetFrame::empty();
        frame.set_dest_mac(MacAddr::broadcast());
        frame.set_src_mac(MacAddr::new([1, 2, 3, 4, 5, 6]));
        frame.set_ether_type(ARP_ETHER_TYPE);
        frame.set_payload(&[0xaa, 0xbb, 0xcc]);

        let parsed = EthernetFrame::from_buffer(frame.data.clone()).unwrap();
        assert_eq!(parsed.dest_mac(), MacAddr::broadcast());
        assert_eq!(parsed.src_mac(), MacAddr::new([1, 2, 3, 4, 5, 6]));
        assert_eq!(parsed.ether_type(), ARP_ETHER_TYPE);
        assert_eq!(parsed.payload(), &[0xaa, 0xbb, 0xcc]);
    }

    #[test]
    fn set_payload_replaces_previous_payload() {
        let mut frame = EthernetFrame::empty();
        frame.set_payload(&[1; 40]);
        frame.set_payload(&[2; 8]);
        assert_eq!(frame.payload(), &[2; 8]);
    }
}
