//! UDP multicast socket setup shared by the two feed receivers.
//!
//! `tokio::net::UdpSocket` doesn't expose `SO_REUSEADDR`/`SO_REUSEPORT` or
//! `IP_ADD_MEMBERSHIP` directly, so the socket is built and configured with
//! `socket2` and handed to tokio afterward — grounded on `md_client.py` and
//! `clearing_client.py`'s `_create_socket`, which sets the same three
//! options before binding and joining.

use std::net::{Ipv4Addr, SocketAddrV4};

use socket2::{Domain, Protocol, Socket, Type};

pub fn join_group(group: SocketAddrV4, bind_ip: Ipv4Addr) -> std::io::Result<tokio::net::UdpSocket> {
    let socket = Socket::new(Domain::IPV4, Type::DGRAM, Some(Protocol::UDP))?;
    socket.set_reuse_address(true)?;
    #[cfg(unix)]
    socket.set_reuse_port(true)?;
    socket.set_nonblocking(true)?;

    let bind_addr = SocketAddrV4::new(Ipv4Addr::UNSPECIFIED, group.port());
    socket.bind(&bind_addr.into())?;
    socket.join_multicast_v4(group.ip(), &bind_ip)?;

    tokio::net::UdpSocket::from_std(socket.into())
}
