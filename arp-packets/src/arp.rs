use crate::MacAddr;
use std::convert::{TryFrom, TryInto};
use std::error::Error;
use std::fmt;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

pub enum ArpOp {
    Request = 1,
    Reply = 2,
}

pub enum ArpHardwareType {
    Ethernet = 1,
}

/// Length of the fixed part of the header, before the variable-length addresses.
pub const ARP_FIXED_LEN: usize = 8;

/// Smallest packet this codec accepts: the fixed header plus an Ethernet/IPv4 sized body.
pub const ARP_MIN_LEN: usize = 28;

const HARDWARE_ADDR_LEN: u8 = 6;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ArpDecodeError {
    /// Input is shorter than the 28 byte minimum.
    Truncated(usize),
    /// The header's length fields promise more bytes than the buffer holds.
    BodyTruncated { expected: usize, actual: usize },
    /// Hardware addresses of this length can't be represented here (only 6 byte
    /// link-layer addresses are).
    BadHardwareLen(u8),
    /// Protocol address length other than 4 (IPv4) or 16 (IPv6).
    BadProtocolLen(u8),
}

impl fmt::Display for ArpDecodeError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ArpDecodeError::Truncated(len) => {
                write!(f, "packet is {} bytes, shorter than the {} byte minimum", len, ARP_MIN_LEN)
            }
            ArpDecodeError::BodyTruncated { expected, actual } => {
                write!(f, "header declares a {} byte packet but only {} bytes are present", expected, actual)
            }
            ArpDecodeError::BadHardwareLen(len) => {
                write!(f, "unsupported hardware address length {}", len)
            }
            ArpDecodeError::BadProtocolLen(len) => {
                write!(f, "unsupported protocol address length {}", len)
            }
        }
    }
}

impl Error for ArpDecodeError {}

///
/// The packet structure described in RFC 826, network byte order:
///
/// `hw-type(2) | proto-type(2) | hw-len(1) | proto-len(1) | opcode(2) |
///  sender-hw(hw-len) | sender-proto(proto-len) | target-hw(hw-len) | target-proto(proto-len)`
///
/// Fields are private so the length fields can't drift from the addresses actually stored:
/// the protocol address setters recompute the protocol address length from the address
/// family (4 for IPv4, 16 for IPv6), and the hardware address length is always 6.
///
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ArpPacket {
    hardware_type: u16,
    protocol_type: u16,
    hardware_addr_len: u8,
    protocol_addr_len: u8,
    opcode: u16,
    sender_hardware_addr: MacAddr,
    sender_protocol_addr: IpAddr,
    target_hardware_addr: MacAddr,
    target_protocol_addr: IpAddr,
}

impl Default for ArpPacket {
    /// The all-zero packet, as produced by [`ArpPacket::decode_lossy`] on unusable input.
    fn default() -> ArpPacket {
        ArpPacket {
            hardware_type: 0,
            protocol_type: 0,
            hardware_addr_len: 0,
            protocol_addr_len: 0,
            opcode: 0,
            sender_hardware_addr: MacAddr::zero(),
            sender_protocol_addr: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            target_hardware_addr: MacAddr::zero(),
            target_protocol_addr: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
        }
    }
}

impl ArpPacket {
    fn preset(opcode: ArpOp) -> ArpPacket {
        ArpPacket {
            hardware_type: ArpHardwareType::Ethernet as u16,
            protocol_type: crate::IPV4_ETHER_TYPE,
            hardware_addr_len: HARDWARE_ADDR_LEN,
            protocol_addr_len: 4,
            opcode: opcode as u16,
            ..ArpPacket::default()
        }
    }

    /// A Request packet preset for Ethernet/IPv4, addresses zeroed.
    pub fn request() -> ArpPacket {
        ArpPacket::preset(ArpOp::Request)
    }

    /// A Reply packet preset for Ethernet/IPv4, addresses zeroed.
    pub fn reply() -> ArpPacket {
        ArpPacket::preset(ArpOp::Reply)
    }

    pub fn hardware_type(&self) -> u16 {
        self.hardware_type
    }

    pub fn protocol_type(&self) -> u16 {
        self.protocol_type
    }

    pub fn hardware_addr_len(&self) -> u8 {
        self.hardware_addr_len
    }

    pub fn protocol_addr_len(&self) -> u8 {
        self.protocol_addr_len
    }

    pub fn opcode(&self) -> u16 {
        self.opcode
    }

    pub fn sender_hardware_addr(&self) -> MacAddr {
        self.sender_hardware_addr
    }

    pub fn sender_protocol_addr(&self) -> IpAddr {
        self.sender_protocol_addr
    }

    pub fn target_hardware_addr(&self) -> MacAddr {
        self.target_hardware_addr
    }

    pub fn target_protocol_addr(&self) -> IpAddr {
        self.target_protocol_addr
    }

    pub fn set_opcode(&mut self, opcode: ArpOp) {
        self.opcode = opcode as u16;
    }

    pub fn set_sender_hardware_addr(&mut self, addr: MacAddr) {
        self.sender_hardware_addr = addr;
    }

    pub fn set_target_hardware_addr(&mut self, addr: MacAddr) {
        self.target_hardware_addr = addr;
    }

    /// Sets the sender protocol address, recomputing the protocol address length from the
    /// address family.
    pub fn set_sender_protocol_addr(&mut self, addr: IpAddr) {
        self.sender_protocol_addr = addr;
        self.protocol_addr_len = protocol_addr_len_of(&addr);
    }

    /// Sets the target protocol address, recomputing the protocol address length from the
    /// address family.
    pub fn set_target_protocol_addr(&mut self, addr: IpAddr) {
        self.target_protocol_addr = addr;
        self.protocol_addr_len = protocol_addr_len_of(&addr);
    }

    /// Length of the encoded packet: `8 + 2*hw-len + 2*proto-len`.
    pub fn encoded_len(&self) -> usize {
        ARP_FIXED_LEN + 2 * self.hardware_addr_len as usize + 2 * self.protocol_addr_len as usize
    }

    pub fn encode(&self) -> Vec<u8> {
        let hlen = self.hardware_addr_len as usize;
        let plen = self.protocol_addr_len as usize;
        let mut buf = vec![0; self.encoded_len()];

        buf[0..2].copy_from_slice(&self.hardware_type.to_be_bytes());
        buf[2..4].copy_from_slice(&self.protocol_type.to_be_bytes());
        buf[4] = self.hardware_addr_len;
        buf[5] = self.protocol_addr_len;
        buf[6..8].copy_from_slice(&self.opcode.to_be_bytes());

        let mut offset = ARP_FIXED_LEN;
        offset = put(&mut buf, offset, &self.sender_hardware_addr.bytes, hlen);
        offset = put(&mut buf, offset, &ip_octets(&self.sender_protocol_addr), plen);
        offset = put(&mut buf, offset, &self.target_hardware_addr.bytes, hlen);
        put(&mut buf, offset, &ip_octets(&self.target_protocol_addr), plen);

        buf
    }

    pub fn decode(input: &[u8]) -> Result<ArpPacket, ArpDecodeError> {
        if input.len() < ARP_MIN_LEN {
            return Err(ArpDecodeError::Truncated(input.len()));
        }

        let mut packet = ArpPacket::default();
        packet.read_fixed_header(input);

        if packet.hardware_addr_len != HARDWARE_ADDR_LEN {
            return Err(ArpDecodeError::BadHardwareLen(packet.hardware_addr_len));
        }
        if packet.protocol_addr_len != 4 && packet.protocol_addr_len != 16 {
            return Err(ArpDecodeError::BadProtocolLen(packet.protocol_addr_len));
        }
        if input.len() < packet.encoded_len() {
            return Err(ArpDecodeError::BodyTruncated {
                expected: packet.encoded_len(),
                actual: input.len(),
            });
        }

        packet.read_addresses(input);
        Ok(packet)
    }

    /// The legacy permissive decode: unusable input degrades to zeroed fields instead of
    /// failing. Input shorter than 28 bytes yields the all-default packet; input long
    /// enough for the fixed header but shorter than the declared body yields the header
    /// fields with all four addresses left zero. Never panics, never reads out of bounds.
    pub fn decode_lossy(input: &[u8]) -> ArpPacket {
        let mut packet = ArpPacket::default();
        if input.len() < ARP_MIN_LEN {
            return packet;
        }

        packet.read_fixed_header(input);

        if packet.hardware_addr_len != HARDWARE_ADDR_LEN
            || (packet.protocol_addr_len != 4 && packet.protocol_addr_len != 16)
            || input.len() < packet.encoded_len()
        {
            return packet;
        }

        packet.read_addresses(input);
        packet
    }

    fn read_fixed_header(&mut self, input: &[u8]) {
        self.hardware_type = u16::from_be_bytes(input[0..2].try_into().unwrap());
        self.protocol_type = u16::from_be_bytes(input[2..4].try_into().unwrap());
        self.hardware_addr_len = input[4];
        self.protocol_addr_len = input[5];
        self.opcode = u16::from_be_bytes(input[6..8].try_into().unwrap());
    }

    // Callers have validated hardware_addr_len == 6, protocol_addr_len ∈ {4, 16} and the
    // buffer length.
    fn read_addresses(&mut self, input: &[u8]) {
        let hlen = self.hardware_addr_len as usize;
        let plen = self.protocol_addr_len as usize;

        let mut offset = ARP_FIXED_LEN;
        self.sender_hardware_addr = MacAddr::new(input[offset..offset + hlen].try_into().unwrap());
        offset += hlen;
        self.sender_protocol_addr = read_ip(&input[offset..offset + plen]);
        offset += plen;
        self.target_hardware_addr = MacAddr::new(input[offset..offset + hlen].try_into().unwrap());
        offset += hlen;
        self.target_protocol_addr = read_ip(&input[offset..offset + plen]);
    }
}

// Copies `bytes` into the `len` sized field at `offset`, zero-padding if the value is
// shorter than the field, and returns the offset of the next field.
fn put(buf: &mut [u8], offset: usize, bytes: &[u8], len: usize) -> usize {
    let n = len.min(bytes.len());
    buf[offset..offset + n].copy_from_slice(&bytes[..n]);
    offset + len
}

fn ip_octets(addr: &IpAddr) -> Vec<u8> {
    match addr {
        IpAddr::V4(v4) => v4.octets().to_vec(),
        IpAddr::V6(v6) => v6.octets().to_vec(),
    }
}

fn read_ip(bytes: &[u8]) -> IpAddr {
    if bytes.len() == 16 {
        IpAddr::V6(Ipv6Addr::from(<[u8; 16]>::try_from(bytes).unwrap()))
    } else {
        IpAddr::V4(Ipv4Addr::from(<[u8; 4]>::try_from(bytes).unwrap()))
    }
}

fn protocol_addr_len_of(addr: &IpAddr) -> u8 {
    match addr {
        IpAddr::V4(_) => 4,
        IpAddr::V6(_) => 16,
    }
}
