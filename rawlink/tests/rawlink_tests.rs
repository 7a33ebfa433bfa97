#![cfg(target_os = "linux")]

use arp_packets as packets;
use rand::{self, Rng};
use std::{net::Ipv4Addr, sync::mpsc, thread, time::Duration};

// Requires CAP_NET_RAW, so it doesn't run in CI. Run with:
//   sudo -E cargo test -p rawlink -- --ignored
#[test]
#[ignore]
fn layer2_arp_loopback() {
    // If this takes more than a second to occur, something's definitely wrong.
    let timeout = Duration::from_secs(1);

    let mut rng = rand::thread_rng();

    let side_a = rawlink::Socket::new().unwrap();
    let mut side_a = side_a.bind("lo").unwrap();

    let side_b = rawlink::Socket::new().unwrap();

    let (tx, rx) = mpsc::channel();

    let thread_b = thread::spawn(move || {
        let mut side_b = side_b.bind("lo").unwrap();
        side_b.set_recv_timeout(Some(timeout)).unwrap();

        // Keep reading until an ARP frame shows up; the loopback device sees
        // unrelated traffic too.
        let mut in_buffer = vec![0; 1500];
        loop {
            let len = side_b.recv(&mut in_buffer).unwrap();
            let frame = match packets::EthernetFrame::from_buffer(in_buffer[..len].to_vec()) {
                Ok(frame) => frame,
                Err(_) => continue,
            };
            if frame.ether_type() == packets::ARP_ETHER_TYPE {
                tx.send(frame).unwrap();
                return;
            }
        }
    });

    // now send an ARP request from side a to side b
    let sender_mac = {
        let mut bytes = [0u8; 6];
        rng.fill(&mut bytes[..]);
        packets::MacAddr::new(bytes)
    };
    let mut arp = packets::ArpPacket::request();
    arp.set_sender_hardware_addr(sender_mac);
    arp.set_sender_protocol_addr(Ipv4Addr::new(10, 0, 0, 1).into());
    arp.set_target_hardware_addr(packets::MacAddr::broadcast());
    arp.set_target_protocol_addr(Ipv4Addr::new(10, 0, 0, 2).into());

    let mut eth = packets::EthernetFrame::encap_arp(&arp);
    eth.set_src_mac(sender_mac);
    eth.set_dest_mac(packets::MacAddr::broadcast());

    side_a.send(&eth.data).unwrap();

    let received = rx.recv_timeout(timeout).unwrap();
    thread_b.join().unwrap();

    assert_eq!(received.ether_type(), packets::ARP_ETHER_TYPE);
    let received_arp = packets::ArpPacket::decode(received.payload()).unwrap();
    assert_eq!(received_arp, arp);
}

#[test]
fn bind_rejects_overlong_device_names() {
    if let Ok(socket) = rawlink::Socket::new() {
        let err = socket.bind("a-device-name-well-past-ifnamsiz").unwrap_err();
        assert_eq!(err.kind(), std::io::ErrorKind::InvalidInput);
    }
    // Without CAP_NET_RAW the socket can't even be created; nothing to assert.
}
