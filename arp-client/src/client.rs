use crate::{netdev, Error};
use arp_packets::{ArpOp, ArpPacket, EthernetFrame, MacAddr, ARP_ETHER_TYPE};
use log::{debug, trace};
use rawlink::{BoundSocket, Socket};
use std::io;
use std::net::{IpAddr, Ipv4Addr};
use std::time::Duration;

// Big enough for any frame an Ethernet MTU can carry.
const READ_BUFFER_LEN: usize = 1500;

/// The link transport a [`Client`] drives: blocking frame read/write on one device, plus
/// the device's own hardware address. Implemented by [`rawlink::BoundSocket`]; tests
/// substitute scripted doubles.
pub trait Transport {
    /// Blocks until a frame arrives, copies it into `buf` and returns its length.
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize>;
    /// Writes one frame, blocking until it is queued.
    fn write(&mut self, buf: &[u8]) -> io::Result<usize>;
    /// Releases the transport.
    fn close(&mut self) -> io::Result<()>;
    /// The hardware address of the bound device.
    fn hardware_addr(&self) -> MacAddr;
}

impl Transport for BoundSocket {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.recv(buf)
    }

    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.send(buf)
    }

    fn close(&mut self) -> io::Result<()> {
        // The descriptor is released when the socket drops.
        Ok(())
    }

    fn hardware_addr(&self) -> MacAddr {
        MacAddr::new(BoundSocket::hardware_addr(self))
    }
}

/// An ARP session: one transport, one local protocol address.
///
/// Fully synchronous; [`Client::resolve`] blocks the calling thread for the whole round
/// trip. A session supports one resolution in flight at a time: the read stream is not
/// demultiplexed per request, so a second concurrent `resolve` on the same session could
/// consume the reply meant for the first.
pub struct Client<T: Transport> {
    transport: T,
    ip: IpAddr,
}

impl Client<BoundSocket> {
    /// Opens a session on the named device, or on the device bound to the default route
    /// when `device` is `None`. The session's protocol address is the first IPv4 address
    /// configured on the device, or the unspecified address if it has none.
    pub fn open(device: Option<&str>) -> Result<Client<BoundSocket>, Error> {
        let name = match device {
            Some(device) => device.to_string(),
            None => netdev::default_route_device().unwrap_or_default(),
        };
        if name.is_empty() {
            return Err(Error::Config(
                "no device given and default route discovery failed".to_string(),
            ));
        }

        let socket = Socket::new().map_err(|err| Error::Config(format!("socket: {}", err)))?;
        let socket = socket
            .bind(&name)
            .map_err(|err| Error::Config(format!("binding to {}: {}", name, err)))?;
        let ip = netdev::first_ipv4_addr(&name)
            .map_err(|err| Error::Config(format!("enumerating addresses of {}: {}", name, err)))?
            .map(IpAddr::V4)
            .unwrap_or_else(|| IpAddr::V4(Ipv4Addr::UNSPECIFIED));

        debug!("session on {} as {} ({})", name, ip, Transport::hardware_addr(&socket));
        Ok(Client { transport: socket, ip })
    }

    /// Bounds how long a single blocking read may wait. The engine itself has no timeout
    /// policy; with a bound set, a quiet segment surfaces as `Error::Transport` of kind
    /// `WouldBlock` from [`Client::resolve`] or [`Client::read_packet`].
    pub fn set_read_timeout(&mut self, timeout: Option<Duration>) -> Result<(), Error> {
        self.transport
            .set_recv_timeout(timeout)
            .map_err(Error::Transport)
    }
}

impl<T: Transport> Client<T> {
    /// Builds a session over an already-open transport. `ip` is the local protocol
    /// address used as the sender address of outgoing requests.
    pub fn with_transport(transport: T, ip: IpAddr) -> Client<T> {
        Client { transport, ip }
    }

    /// The session's local protocol address.
    pub fn local_addr(&self) -> IpAddr {
        self.ip
    }

    /// The hardware address of the session's device.
    pub fn hardware_addr(&self) -> MacAddr {
        self.transport.hardware_addr()
    }

    /// Closes the session, releasing the transport.
    pub fn close(mut self) -> Result<(), Error> {
        self.transport.close().map_err(Error::Transport)
    }

    /// Blocks until the next ARP packet arrives. Frames carrying any other ether type
    /// are discarded and the read retried, without bound. An ARP-tagged frame whose
    /// payload fails to decode surfaces as [`Error::Malformed`].
    pub fn read_packet(&mut self) -> Result<ArpPacket, Error> {
        let mut buf = vec![0; READ_BUFFER_LEN];
        loop {
            let len = self.transport.read(&mut buf).map_err(Error::Transport)?;
            trace!("read {} byte frame", len);

            let frame = match EthernetFrame::from_buffer(buf[..len].to_vec()) {
                Ok(frame) => frame,
                Err(reason) => {
                    debug!("discarding runt frame: {}", reason);
                    continue;
                }
            };
            if frame.ether_type() != ARP_ETHER_TYPE {
                continue;
            }

            return ArpPacket::decode(frame.payload()).map_err(Error::Malformed);
        }
    }

    /// Encodes `packet`, wraps it in a frame from the session's hardware address to
    /// `dest` with the ARP ether type, and performs one blocking write.
    pub fn write_packet(&mut self, packet: &ArpPacket, dest: MacAddr) -> Result<(), Error> {
        let mut frame = EthernetFrame::encap_arp(packet);
        frame.set_src_mac(self.transport.hardware_addr());
        frame.set_dest_mac(dest);

        self.transport.write(&frame.data).map_err(Error::Transport)?;
        Ok(())
    }

    /// Broadcasts a request asking who has `ip`.
    pub fn request(&mut self, ip: IpAddr) -> Result<(), Error> {
        let mut packet = ArpPacket::request();
        packet.set_sender_hardware_addr(self.transport.hardware_addr());
        packet.set_sender_protocol_addr(self.ip);
        packet.set_target_hardware_addr(MacAddr::broadcast());
        packet.set_target_protocol_addr(ip);

        self.write_packet(&packet, MacAddr::broadcast())
    }

    /// Broadcasts a request for `ip` and blocks until a reply whose sender protocol
    /// address is `ip` arrives, returning the sender's hardware address. Everything
    /// else -- replies from other hosts, requests, malformed packets -- is discarded and
    /// the wait continues; only a transport failure ends it early. Callers wanting a
    /// bounded wait set a read timeout on the transport first.
    pub fn resolve(&mut self, ip: IpAddr) -> Result<MacAddr, Error> {
        self.request(ip)?;

        loop {
            let packet = match self.read_packet() {
                Ok(packet) => packet,
                Err(Error::Malformed(defect)) => {
                    debug!("discarding malformed ARP packet: {}", defect);
                    continue;
                }
                Err(err) => return Err(err),
            };

            if packet.opcode() == ArpOp::Reply as u16 && packet.sender_protocol_addr() == ip {
                return Ok(packet.sender_hardware_addr());
            }
            debug!(
                "discarding ARP packet (opcode {}) from {}",
                packet.opcode(),
                packet.sender_protocol_addr()
            );
        }
    }
}
