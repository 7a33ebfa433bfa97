//! OS-side device and address discovery: which device carries the default route, and
//! which IPv4 address a device is configured with.

use log::debug;
use std::ffi::CStr;
use std::fs;
use std::io;
use std::net::Ipv4Addr;
use std::process::Command;
use std::ptr;

/// Name of the device the default route is bound to, or `None` if it can't be determined.
///
/// The kernel's own table at /proc/net/route is consulted first; shelling out to
/// `ip route` is kept only as a fallback for environments where procfs isn't mounted.
pub fn default_route_device() -> Option<String> {
    if let Some(device) = proc_default_route_device() {
        debug!("default route on {} (/proc/net/route)", device);
        return Some(device);
    }
    let device = ip_route_default_device();
    if let Some(device) = &device {
        debug!("default route on {} (ip route)", device);
    }
    device
}

fn proc_default_route_device() -> Option<String> {
    let table = fs::read_to_string("/proc/net/route").ok()?;
    parse_route_table(&table)
}

// /proc/net/route is a header line followed by tab-separated entries:
//   Iface  Destination  Gateway  Flags  ...
// with addresses as little-endian hex. A destination of 0 is the default route.
fn parse_route_table(table: &str) -> Option<String> {
    for line in table.lines().skip(1) {
        let fields: Vec<&str> = line.split_whitespace().collect();
        if fields.len() < 2 {
            continue;
        }
        if fields[1] == "00000000" {
            return Some(fields[0].to_string());
        }
    }
    None
}

fn ip_route_default_device() -> Option<String> {
    let output = Command::new("/sbin/ip").arg("route").output().ok()?;
    if !output.status.success() {
        return None;
    }
    parse_ip_route(&String::from_utf8_lossy(&output.stdout))
}

// Scans `ip route` output for "default via <gw> dev <name> ..." and yields <name>.
fn parse_ip_route(output: &str) -> Option<String> {
    for line in output.lines() {
        if !line.starts_with("default") {
            continue;
        }
        let fields: Vec<&str> = line.split_whitespace().collect();
        for pair in fields.windows(2) {
            if pair[0] == "dev" {
                return Some(pair[1].to_string());
            }
        }
    }
    None
}

/// First IPv4 address configured on the named device, `None` if the device has no IPv4
/// address. Enumeration failures propagate.
pub fn first_ipv4_addr(device: &str) -> io::Result<Option<Ipv4Addr>> {
    // This block is marked as unsafe because it uses FFI. We believe it to be safe
    // because the list returned by getifaddrs is only walked while it is alive, every
    // pointer is null-checked before being dereferenced, and the list is always released
    // through freeifaddrs.
    unsafe {
        let mut ifap: *mut libc::ifaddrs = ptr::null_mut();
        if libc::getifaddrs(&mut ifap) != 0 {
            return Err(io::Error::last_os_error());
        }

        let mut found = None;
        let mut cursor = ifap;
        while !cursor.is_null() {
            let entry = &*cursor;
            cursor = entry.ifa_next;

            if entry.ifa_addr.is_null() || entry.ifa_name.is_null() {
                continue;
            }
            if CStr::from_ptr(entry.ifa_name).to_bytes() != device.as_bytes() {
                continue;
            }
            if libc::c_int::from((*entry.ifa_addr).sa_family) != libc::AF_INET {
                continue;
            }

            let sin = &*(entry.ifa_addr as *const libc::sockaddr_in);
            found = Some(Ipv4Addr::from(u32::from_be(sin.sin_addr.s_addr)));
            break;
        }

        libc::freeifaddrs(ifap);
        Ok(found)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_route_table_picks_default_entry() {
        let table = "Iface\tDestination\tGateway \tFlags\tRefCnt\tUse\tMetric\tMask\t\tMTU\tWindow\tIRTT\n\
                     wlan0\t0080A8C0\t00000000\t0001\t0\t0\t600\t00FFFFFF\t0\t0\t0\n\
                     wlan0\t00000000\t0180A8C0\t0003\t0\t0\t600\t00000000\t0\t0\t0\n";
        assert_eq!(parse_route_table(table), Some("wlan0".to_string()));
    }

    #[test]
    fn parse_route_table_without_default_entry() {
        let table = "Iface\tDestination\tGateway \tFlags\n\
                     eth0\t0080A8C0\t00000000\t0001\t0\t0\t600\t00FFFFFF\t0\t0\t0\n";
        assert_eq!(parse_route_table(table), None);
    }

    #[test]
    fn parse_route_table_tolerates_garbage() {
        assert_eq!(parse_route_table(""), None);
        assert_eq!(parse_route_table("Iface\n\n\nnot-a-route\n"), None);
    }

    #[test]
    fn parse_ip_route_picks_default_device() {
        let output = "default via 192.168.0.1 dev wlan0 proto dhcp metric 600\n\
                      192.168.0.0/24 dev wlan0 proto kernel scope link src 192.168.0.17\n";
        assert_eq!(parse_ip_route(output), Some("wlan0".to_string()));
    }

    #[test]
    fn parse_ip_route_without_default_line() {
        let output = "192.168.0.0/24 dev eth0 proto kernel scope link src 192.168.0.17\n";
        assert_eq!(parse_ip_route(output), None);
        assert_eq!(parse_ip_route("default\n"), None);
    }
}
