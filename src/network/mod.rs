//! Address families, endpoint identities, and the protocols a session can
//! run over as a byte stream

pub mod address;
pub mod family;
pub mod protocol;
pub mod tcp;
pub mod udp;
#[cfg(unix)]
pub mod unix;

pub use address::Address;
pub use family::AddressFamily;
pub use protocol::StreamProtocol;
pub use tcp::TcpProtocol;
pub use udp::{UdpProtocol, UdpStream};
#[cfg(unix)]
pub use unix::{UnixProtocol, UnixSocketListener};
