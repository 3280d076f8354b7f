//! Connected UDP sockets driven as a byte stream
//!
//! Each write sends one datagram and each read returns one datagram, cut to
//! the read buffer. UDP has no listening side, so only the client role can
//! run over it.

use super::{Address, AddressFamily, StreamProtocol};
use crate::{NetTestError, Result};
use std::convert::Infallible;
use std::io;
use std::net::{Ipv4Addr, Ipv6Addr, SocketAddr};
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio::io::{AsyncRead, AsyncWrite, ReadBuf};
use tokio::net::UdpSocket;
use tracing::debug;

/// UDP protocol implementation (client only)
pub struct UdpProtocol;

/// A UDP socket connected to a single peer
#[derive(Debug)]
pub struct UdpStream {
    socket: UdpSocket,
}

impl UdpStream {
    /// Binds an ephemeral local port of the peer's IP version and connects it
    pub async fn connect(peer: SocketAddr) -> io::Result<Self> {
        let local: SocketAddr = if peer.is_ipv4() {
            (Ipv4Addr::UNSPECIFIED, 0).into()
        } else {
            (Ipv6Addr::UNSPECIFIED, 0).into()
        };
        let socket = UdpSocket::bind(local).await?;
        socket.connect(peer).await?;
        Ok(Self { socket })
    }

    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.socket.local_addr()
    }

    pub fn peer_addr(&self) -> io::Result<SocketAddr> {
        self.socket.peer_addr()
    }
}

impl AsyncRead for UdpStream {
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        self.socket.poll_recv(cx, buf)
    }
}

impl AsyncWrite for UdpStream {
    fn poll_write(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        self.socket.poll_send(cx, buf)
    }

    fn poll_flush(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Poll::Ready(Ok(()))
    }

    fn poll_shutdown(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Poll::Ready(Ok(()))
    }
}

impl StreamProtocol for UdpProtocol {
    type Listener = Infallible;
    type Stream = UdpStream;

    async fn bind(family: AddressFamily, address: &str) -> Result<Infallible> {
        Err(NetTestError::Listen {
            address: address.to_string(),
            source: io::Error::new(
                io::ErrorKind::Unsupported,
                format!("cannot listen for a connection on {family}"),
            ),
        })
    }

    async fn accept(listener: &mut Infallible) -> Result<UdpStream> {
        match *listener {}
    }

    async fn connect(family: AddressFamily, address: &str) -> Result<UdpStream> {
        let target = family.dial_host(address);
        let connect_error = |source| NetTestError::Connect {
            address: target.clone(),
            source,
        };
        if !family.is_udp() {
            return Err(connect_error(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("{family} is not a UDP address family"),
            )));
        }

        let mut last_error = None;
        for addr in family.resolve(&target).await.map_err(connect_error)? {
            match UdpStream::connect(addr).await {
                Ok(stream) => return Ok(stream),
                Err(e) => {
                    debug!(%addr, error = %e, "Connect attempt failed");
                    last_error = Some(e);
                }
            }
        }

        Err(connect_error(last_error.unwrap_or_else(|| {
            io::Error::new(io::ErrorKind::AddrNotAvailable, "no address to dial")
        })))
    }

    fn listener_addr(listener: &Infallible) -> Result<Address> {
        match *listener {}
    }

    fn local_addr(stream: &UdpStream) -> Result<Address> {
        Ok(stream.local_addr()?.into())
    }

    fn peer_addr(stream: &UdpStream) -> Result<Address> {
        Ok(stream.peer_addr()?.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    #[tokio::test]
    async fn test_datagrams_through_stream() {
        let peer = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let target = peer.local_addr().unwrap().to_string();

        let mut stream = UdpProtocol::connect(AddressFamily::Udp4, &target)
            .await
            .unwrap();
        assert_eq!(
            UdpProtocol::peer_addr(&stream).unwrap(),
            Address::Network(peer.local_addr().unwrap())
        );

        stream.write_all(b"hello").await.unwrap();
        let mut buffer = [0u8; 16];
        let (n, from) = peer.recv_from(&mut buffer).await.unwrap();
        assert_eq!(&buffer[..n], b"hello");
        assert_eq!(from.port(), stream.local_addr().unwrap().port());

        peer.send_to(b"world", from).await.unwrap();
        let n = stream.read(&mut buffer).await.unwrap();
        assert_eq!(&buffer[..n], b"world");
    }

    #[tokio::test]
    async fn test_bind_is_listen_error() {
        let err = UdpProtocol::bind(AddressFamily::Udp, ":9000")
            .await
            .unwrap_err();
        assert!(matches!(err, NetTestError::Listen { .. }));
        assert!(!err.is_usage());
    }

    #[tokio::test]
    async fn test_tcp_family_rejected() {
        let err = UdpProtocol::connect(AddressFamily::Tcp, "127.0.0.1:9")
            .await
            .unwrap_err();
        assert!(matches!(err, NetTestError::Connect { .. }));
    }
}
