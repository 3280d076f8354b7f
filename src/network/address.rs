use std::fmt;
use std::net::SocketAddr;
use std::path::PathBuf;

/// Endpoint identity of one side of a connection
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Address {
    /// Network address (TCP)
    Network(SocketAddr),
    /// Unix domain socket path, empty for unnamed sockets
    Unix(PathBuf),
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Address::Network(addr) => write!(f, "{addr}"),
            Address::Unix(path) if path.as_os_str().is_empty() => write!(f, "unix:@"),
            Address::Unix(path) => write!(f, "unix:{}", path.display()),
        }
    }
}

impl From<SocketAddr> for Address {
    fn from(addr: SocketAddr) -> Self {
        Address::Network(addr)
    }
}

impl From<PathBuf> for Address {
    fn from(path: PathBuf) -> Self {
        Address::Unix(path)
    }
}

#[cfg(unix)]
impl From<tokio::net::unix::SocketAddr> for Address {
    fn from(addr: tokio::net::unix::SocketAddr) -> Self {
        Address::Unix(addr.as_pathname().map(PathBuf::from).unwrap_or_default())
    }
}
