use super::{Address, AddressFamily, StreamProtocol};
use crate::{NetTestError, Result};
use std::io;
use tokio::net::{TcpListener, TcpStream};
use tracing::debug;

/// TCP protocol implementation
pub struct TcpProtocol;

fn ensure_tcp(family: AddressFamily) -> io::Result<()> {
    if family.is_tcp() {
        Ok(())
    } else {
        Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("{family} is not a TCP address family"),
        ))
    }
}

impl StreamProtocol for TcpProtocol {
    type Listener = TcpListener;
    type Stream = TcpStream;

    async fn bind(family: AddressFamily, address: &str) -> Result<TcpListener> {
        let listen_error = |source| NetTestError::Listen {
            address: address.to_string(),
            source,
        };
        ensure_tcp(family).map_err(listen_error)?;

        let mut last_error = None;
        for target in family.listen_hosts(address) {
            let addrs = match family.resolve(&target).await {
                Ok(addrs) => addrs,
                Err(e) => {
                    debug!(%target, error = %e, "Resolve failed");
                    last_error = Some(e);
                    continue;
                }
            };
            for addr in addrs {
                match TcpListener::bind(addr).await {
                    Ok(listener) => return Ok(listener),
                    Err(e) => {
                        debug!(%addr, error = %e, "Bind attempt failed");
                        last_error = Some(e);
                    }
                }
            }
        }

        Err(listen_error(last_error.unwrap_or_else(|| {
            io::Error::new(io::ErrorKind::AddrNotAvailable, "no address to bind")
        })))
    }

    async fn accept(listener: &mut TcpListener) -> Result<TcpStream> {
        let (stream, _) = listener.accept().await?;
        Ok(stream)
    }

    async fn connect(family: AddressFamily, address: &str) -> Result<TcpStream> {
        let target = family.dial_host(address);
        let connect_error = |source| NetTestError::Connect {
            address: target.clone(),
            source,
        };

        ensure_tcp(family).map_err(connect_error)?;

        let mut last_error = None;
        for addr in family.resolve(&target).await.map_err(connect_error)? {
            match TcpStream::connect(addr).await {
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

    fn listener_addr(listener: &TcpListener) -> Result<Address> {
        Ok(listener.local_addr()?.into())
    }

    fn local_addr(stream: &TcpStream) -> Result<Address> {
        Ok(stream.local_addr()?.into())
    }

    fn peer_addr(stream: &TcpStream) -> Result<Address> {
        Ok(stream.peer_addr()?.into())
    }
}
