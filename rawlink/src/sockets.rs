#![deny(missing_docs)]

use crate::linux;
use libc;
use std::{
    ffi::CString,
    io,
    mem::{self, MaybeUninit},
    ptr,
    time::Duration,
};

/// Represents an unbound `AF_PACKET` socket. At this phase of a socket's lifecycle, it can
/// be configured.
pub struct Socket {
    fd: libc::c_int,
}

/// Represents an `AF_PACKET` socket bound to a network device. At this phase of a socket's
/// lifecycle, frames can be read from and written to it.
#[derive(Debug)]
pub struct BoundSocket {
    fd: libc::c_int,
    send_addr: libc::sockaddr_ll,
    hardware_addr: [u8; 6],
}

impl Socket {
    /// Creates a new unbound socket.
    pub fn new() -> io::Result<Self> {
        // This block must be marked as unsafe because it uses FFI with C code. We believe
        // the code in this block to be safe because it does not interact with any memory
        // owned by Rust code, nor does it violate the invariant of the Socket type --
        // namely, that it return an Err if it fails to initialize.
        let fd = unsafe {
            // Resources:
            // man 7 packet
            let fd = libc::socket(libc::AF_PACKET, libc::SOCK_RAW, libc::ETH_P_ALL.to_be());
            if fd < 0 {
                return Err(io::Error::last_os_error());
            }
            fd
        };
        Ok(Self { fd })
    }

    /// Binds the socket to the named network device and queries the device's hardware
    /// address. This function consumes the `Socket` instance, as no more configuration
    /// options may be safely changed.
    pub fn bind(self, iface: &str) -> io::Result<BoundSocket> {
        let name = CString::new(iface).map_err(|_| {
            io::Error::new(io::ErrorKind::InvalidInput, "device name contains a NUL byte")
        })?;
        if name.as_bytes_with_nul().len() > libc::IFNAMSIZ {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "device name longer than IFNAMSIZ",
            ));
        }

        // This block is marked as unsafe because it uses FFI, however, we believe it to be
        // safe because 1) it handles FFI failures in accordance with the bound API's
        // conventions, and 2) it only borrows the NUL-terminated name built above.
        let (send_addr, hardware_addr) = unsafe {
            let mut ifr: linux::ifreq = MaybeUninit::zeroed().assume_init();
            ptr::copy_nonoverlapping(
                name.as_ptr(),
                ifr.ifr_ifrn.ifrn_name.as_mut_ptr(),
                name.as_bytes_with_nul().len(),
            );
            // ioctl(SIOCGIFINDEX) fills in the index field of the ifreq object
            // Resources:
            // man 7 netdevice
            let err = libc::ioctl(self.fd, linux::SIOCGIFINDEX, &ifr);
            if err < 0 {
                return Err(io::Error::last_os_error());
            }
            // The ifru union is about to be refilled by the next ioctl, so take the index
            // out first.
            let ifindex = ifr.ifr_ifru.ifru_ivalue;

            let err = libc::ioctl(self.fd, linux::SIOCGIFHWADDR, &ifr);
            if err < 0 {
                return Err(io::Error::last_os_error());
            }
            let mut hardware_addr = [0u8; 6];
            for (dst, src) in hardware_addr
                .iter_mut()
                .zip(ifr.ifr_ifru.ifru_hwaddr.sa_data.iter())
            {
                *dst = *src as u8;
            }

            // bind the socket
            let mut ll: libc::sockaddr_ll = MaybeUninit::zeroed().assume_init();
            ll.sll_family = libc::AF_PACKET as libc::c_ushort;
            ll.sll_ifindex = ifindex;
            // Resources:
            // man 7 packet regarding sockaddr_ll
            let err = libc::bind(
                self.fd,
                &mut ll as *mut _ as *mut libc::sockaddr,
                mem::size_of::<libc::sockaddr_ll>() as libc::c_uint,
            );
            if err < 0 {
                return Err(io::Error::last_os_error());
            }
            (ll, hardware_addr)
        };
        let fd = self.fd;
        // This ensures that `self` does not attempt to close the file descriptor, as the
        // file descriptor is transferred to the BoundSocket we're returning. This doesn't
        // cause any resource leaks since the stack-bound `self` is consumed and deallocated
        // in `mem::forget`.
        mem::forget(self);
        Ok(BoundSocket {
            fd,
            send_addr,
            hardware_addr,
        })
    }
}

impl BoundSocket {
    /// Returns the hardware address of the device this socket is bound to.
    pub fn hardware_addr(&self) -> [u8; 6] {
        self.hardware_addr
    }

    /// Bounds how long a `recv` may block. `None` restores indefinite blocking. A receive
    /// that hits the bound fails with `WouldBlock`.
    pub fn set_recv_timeout(&mut self, timeout: Option<Duration>) -> io::Result<()> {
        // A zero timeval means "block forever" to SO_RCVTIMEO.
        let tv = match timeout {
            Some(timeout) => libc::timeval {
                tv_sec: timeout.as_secs() as libc::time_t,
                tv_usec: timeout.subsec_micros() as libc::suseconds_t,
            },
            None => libc::timeval {
                tv_sec: 0,
                tv_usec: 0,
            },
        };
        // This block is marked as unsafe because it uses FFI, however, we believe it to be
        // safe because it only borrows the stack-bound timeval for the duration of the
        // call and handles the failure return.
        unsafe {
            let err = libc::setsockopt(
                self.fd,
                libc::SOL_SOCKET,
                libc::SO_RCVTIMEO,
                &tv as *const _ as *const libc::c_void,
                mem::size_of::<libc::timeval>() as libc::socklen_t,
            );
            if err < 0 {
                return Err(io::Error::last_os_error());
            }
        }
        Ok(())
    }

    /// Sends a frame to the NIC. Blocks until the frame is queued.
    pub fn send(&mut self, frame: &[u8]) -> io::Result<usize> {
        // This block is marked as unsafe because it uses FFI. We believe this code to be
        // safe, because it safely borrows the Rust-owned frame and passes the length of
        // the frame to the libc function, so it should not exhibit any C-side undefined
        // behaviour.
        unsafe {
            let bytes = libc::sendto(
                self.fd,
                frame.as_ptr() as *const _,
                frame.len(),
                0,
                &self.send_addr as *const _ as *const libc::sockaddr,
                mem::size_of::<libc::sockaddr_ll>() as libc::socklen_t,
            );
            if bytes < 0 {
                Err(io::Error::last_os_error())
            } else {
                Ok(bytes as usize)
            }
        }
    }

    /// Receives one frame from the NIC into `frame`, blocking until one arrives (or the
    /// configured receive timeout elapses). Returns the frame's length.
    pub fn recv(&mut self, frame: &mut [u8]) -> io::Result<usize> {
        // Note comment in `send` call.
        unsafe {
            let bytes = libc::recvfrom(
                self.fd,
                frame.as_mut_ptr() as *mut _,
                frame.len(),
                0,
                ptr::null_mut(),
                ptr::null_mut(),
            );
            if bytes < 0 {
                Err(io::Error::last_os_error())
            } else {
                Ok(bytes as usize)
            }
        }
    }
}

impl Drop for Socket {
    fn drop(&mut self) {
        unsafe {
            libc::close(self.fd);
        }
    }
}

impl Drop for BoundSocket {
    fn drop(&mut self) {
        unsafe {
            libc::close(self.fd);
        }
    }
}
