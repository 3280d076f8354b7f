use super::{Address, AddressFamily};
use crate::Result;
use std::future::Future;
use tokio::io::{AsyncRead, AsyncWrite};

/// Trait for stream-based protocols (TCP, Unix streams)
///
/// Implementations know how to listen on, accept from, and dial an address
/// of their family, and how to report the endpoint identities of a stream.
/// The session driver is generic over this trait; the pump only needs the
/// resulting `Stream`.
pub trait StreamProtocol {
    /// Listener type for this protocol
    type Listener: Send;
    /// Stream type for this protocol
    type Stream: AsyncRead + AsyncWrite + Send + Unpin + 'static;

    /// Binds a listener to the given address (server-side)
    fn bind(
        family: AddressFamily,
        address: &str,
    ) -> impl Future<Output = Result<Self::Listener>> + Send;

    /// Accepts a single connection from the listener (server-side)
    fn accept(listener: &mut Self::Listener) -> impl Future<Output = Result<Self::Stream>> + Send;

    /// Connects to the given address (client-side)
    fn connect(
        family: AddressFamily,
        address: &str,
    ) -> impl Future<Output = Result<Self::Stream>> + Send;

    /// Address the listener is bound to
    fn listener_addr(listener: &Self::Listener) -> Result<Address>;

    /// Local endpoint of a connected stream
    fn local_addr(stream: &Self::Stream) -> Result<Address>;

    /// Remote endpoint of a connected stream
    fn peer_addr(stream: &Self::Stream) -> Result<Address>;
}
