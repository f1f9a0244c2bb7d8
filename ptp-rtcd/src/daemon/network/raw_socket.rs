use std::{
    ffi::CString,
    io,
    mem::size_of,
    os::fd::{AsRawFd, FromRawFd, OwnedFd},
};

use ptp_rtc::{datastructures::messages::PTP_ETHERTYPE, MacAddress};
use tokio::io::{unix::AsyncFd, Interest};
use tracing::{debug, info};

use super::NetworkError;

/// Turn a C failure (-1 is returned) into a rust Result
pub(crate) fn cerr(t: libc::c_int) -> io::Result<libc::c_int> {
    match t {
        -1 => Err(io::Error::last_os_error()),
        _ => Ok(t),
    }
}

/// A packet socket receiving and sending whole Ethernet frames of the PTP
/// EtherType on one interface.
#[derive(Debug)]
pub struct RawEthernetSocket {
    io: AsyncFd<OwnedFd>,
    interface: String,
}

impl RawEthernetSocket {
    /// Opens the socket on `interface` and joins the `multicast` group.
    /// Requires `CAP_NET_RAW`.
    pub fn open(interface: &str, multicast: MacAddress) -> Result<Self, NetworkError> {
        let name = CString::new(interface)
            .map_err(|_| NetworkError::InvalidInterfaceName(interface.to_owned()))?;

        // Safety: if_nametoindex only reads the nul-terminated string
        let index = unsafe { libc::if_nametoindex(name.as_ptr()) };
        if index == 0 {
            return Err(NetworkError::InterfaceDoesNotExist(interface.to_owned()));
        }

        let protocol = PTP_ETHERTYPE.to_be();
        let fd = cerr(unsafe {
            libc::socket(
                libc::AF_PACKET,
                libc::SOCK_RAW | libc::SOCK_NONBLOCK | libc::SOCK_CLOEXEC,
                protocol as libc::c_int,
            )
        })?;
        // Safety: the descriptor was just created and is owned by nothing else
        let fd = unsafe { OwnedFd::from_raw_fd(fd) };

        // Safety: all-zero is a valid sockaddr_ll
        let mut address: libc::sockaddr_ll = unsafe { std::mem::zeroed() };
        address.sll_family = libc::AF_PACKET as libc::c_ushort;
        address.sll_protocol = protocol;
        address.sll_ifindex = index as libc::c_int;

        // Safety:
        //
        // the pointer argument is valid, the size is accurate
        cerr(unsafe {
            libc::bind(
                fd.as_raw_fd(),
                &address as *const libc::sockaddr_ll as *const libc::sockaddr,
                size_of::<libc::sockaddr_ll>() as libc::socklen_t,
            )
        })?;

        // Safety: all-zero is a valid packet_mreq
        let mut membership: libc::packet_mreq = unsafe { std::mem::zeroed() };
        membership.mr_ifindex = index as libc::c_int;
        membership.mr_type = libc::PACKET_MR_MULTICAST as libc::c_ushort;
        membership.mr_alen = multicast.0.len() as libc::c_ushort;
        membership.mr_address[..multicast.0.len()].copy_from_slice(&multicast.0);

        // Safety:
        //
        // the pointer argument is valid, the size is accurate
        cerr(unsafe {
            libc::setsockopt(
                fd.as_raw_fd(),
                libc::SOL_PACKET,
                libc::PACKET_ADD_MEMBERSHIP,
                &membership as *const libc::packet_mreq as *const libc::c_void,
                size_of::<libc::packet_mreq>() as libc::socklen_t,
            )
        })?;

        info!(interface, %multicast, "opened raw ethernet socket");

        Ok(RawEthernetSocket {
            io: AsyncFd::new(fd)?,
            interface: interface.to_owned(),
        })
    }

    pub async fn send(&self, frame: &[u8]) -> Result<(), NetworkError> {
        let sent = self
            .io
            .async_io(Interest::WRITABLE, |fd| {
                // Safety: the buffer is valid for reads of its length
                let sent = unsafe {
                    libc::send(
                        fd.as_raw_fd(),
                        frame.as_ptr() as *const libc::c_void,
                        frame.len(),
                        0,
                    )
                };
                if sent < 0 {
                    Err(io::Error::last_os_error())
                } else {
                    Ok(sent as usize)
                }
            })
            .await?;

        if sent != frame.len() {
            return Err(NetworkError::ShortWrite {
                sent,
                len: frame.len(),
            });
        }

        Ok(())
    }

    /// Waits for the next frame from the wire. Frames this host sent itself
    /// are skipped.
    pub async fn recv(&self, buf: &mut [u8]) -> Result<usize, NetworkError> {
        loop {
            let (len, packet_type) = self
                .io
                .async_io(Interest::READABLE, |fd| {
                    // Safety: all-zero is a valid sockaddr_ll
                    let mut address: libc::sockaddr_ll = unsafe { std::mem::zeroed() };
                    let mut address_len = size_of::<libc::sockaddr_ll>() as libc::socklen_t;

                    // Safety:
                    //
                    // the buffer is valid for writes of its length, the
                    // address pointer and its length match
                    let len = unsafe {
                        libc::recvfrom(
                            fd.as_raw_fd(),
                            buf.as_mut_ptr() as *mut libc::c_void,
                            buf.len(),
                            0,
                            &mut address as *mut libc::sockaddr_ll as *mut libc::sockaddr,
                            &mut address_len,
                        )
                    };
                    if len < 0 {
                        Err(io::Error::last_os_error())
                    } else {
                        Ok((len as usize, address.sll_pkttype))
                    }
                })
                .await?;

            if packet_type as libc::c_int == libc::PACKET_OUTGOING as libc::c_int {
                debug!(interface = %self.interface, "skipping own frame");
                continue;
            }

            return Ok(len);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn unknown_interface() {
        let result = RawEthernetSocket::open("nonexistent0", MacAddress::PTP_PEER_MULTICAST);
        assert!(matches!(
            result,
            Err(NetworkError::InterfaceDoesNotExist(name)) if name == "nonexistent0"
        ));
    }

    #[tokio::test]
    async fn invalid_interface_name() {
        let result = RawEthernetSocket::open("eth\00", MacAddress::PTP_PEER_MULTICAST);
        assert!(matches!(result, Err(NetworkError::InvalidInterfaceName(_))));
    }

    #[test]
    fn cerr_maps_failure() {
        assert_eq!(cerr(3).unwrap(), 3);
        assert!(cerr(-1).is_err());
    }
}
