use crate::NetTestError;
use std::fmt;
use std::io;
use std::net::SocketAddr;
use std::str::FromStr;
use tokio::net::lookup_host;

/// Address family of the socket to listen on or dial
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddressFamily {
    /// TCP over IPv4 or IPv6
    Tcp,
    /// TCP over IPv4 only
    Tcp4,
    /// TCP over IPv6 only
    Tcp6,
    /// Connected UDP over IPv4 or IPv6 (client only)
    Udp,
    /// Connected UDP over IPv4 only (client only)
    Udp4,
    /// Connected UDP over IPv6 only (client only)
    Udp6,
    /// Unix domain stream socket
    Unix,
}

impl FromStr for AddressFamily {
    type Err = NetTestError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "tcp" => Ok(AddressFamily::Tcp),
            "tcp4" => Ok(AddressFamily::Tcp4),
            "tcp6" => Ok(AddressFamily::Tcp6),
            "udp" => Ok(AddressFamily::Udp),
            "udp4" => Ok(AddressFamily::Udp4),
            "udp6" => Ok(AddressFamily::Udp6),
            "unix" => Ok(AddressFamily::Unix),
            other => Err(NetTestError::Config(format!(
                "Unsupported address family: {other}"
            ))),
        }
    }
}

impl fmt::Display for AddressFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            AddressFamily::Tcp => "tcp",
            AddressFamily::Tcp4 => "tcp4",
            AddressFamily::Tcp6 => "tcp6",
            AddressFamily::Udp => "udp",
            AddressFamily::Udp4 => "udp4",
            AddressFamily::Udp6 => "udp6",
            AddressFamily::Unix => "unix",
        };
        f.write_str(name)
    }
}

impl AddressFamily {
    /// Returns true for the TCP families
    pub fn is_tcp(&self) -> bool {
        matches!(
            self,
            AddressFamily::Tcp | AddressFamily::Tcp4 | AddressFamily::Tcp6
        )
    }

    /// Returns true for the UDP families
    pub fn is_udp(&self) -> bool {
        matches!(
            self,
            AddressFamily::Udp | AddressFamily::Udp4 | AddressFamily::Udp6
        )
    }

    /// Whether a resolved socket address belongs to this family
    pub fn accepts(&self, addr: &SocketAddr) -> bool {
        match self {
            AddressFamily::Tcp | AddressFamily::Udp => true,
            AddressFamily::Tcp4 | AddressFamily::Udp4 => addr.is_ipv4(),
            AddressFamily::Tcp6 | AddressFamily::Udp6 => addr.is_ipv6(),
            AddressFamily::Unix => false,
        }
    }

    /// Hosts to try, in order, when listening on `address`
    ///
    /// A `:port` address listens on the wildcard address. The dual-stack
    /// families try `[::]` first and fall back to `0.0.0.0` on hosts
    /// without IPv6.
    pub fn listen_hosts(&self, address: &str) -> Vec<String> {
        let Some(port) = address.strip_prefix(':') else {
            return vec![address.to_string()];
        };
        match self {
            AddressFamily::Tcp4 | AddressFamily::Udp4 => vec![format!("0.0.0.0:{port}")],
            AddressFamily::Tcp6 | AddressFamily::Udp6 => vec![format!("[::]:{port}")],
            _ => vec![format!("[::]:{port}"), format!("0.0.0.0:{port}")],
        }
    }

    /// Completes a `:port` address with the host to dial
    pub fn dial_host(&self, address: &str) -> String {
        match address.strip_prefix(':') {
            Some(port) if matches!(self, AddressFamily::Tcp6 | AddressFamily::Udp6) => {
                format!("[::1]:{port}")
            }
            Some(port) => format!("127.0.0.1:{port}"),
            None => address.to_string(),
        }
    }

    /// Resolves `target` and keeps only the addresses matching this family
    pub(crate) async fn resolve(&self, target: &str) -> io::Result<Vec<SocketAddr>> {
        if !self.is_tcp() && !self.is_udp() {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("{self} is not an IP address family"),
            ));
        }

        let addrs: Vec<SocketAddr> = lookup_host(target)
            .await?
            .filter(|addr| self.accepts(addr))
            .collect();

        if addrs.is_empty() {
            return Err(io::Error::new(
                io::ErrorKind::AddrNotAvailable,
                format!("no {self} address found for {target}"),
            ));
        }
        Ok(addrs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_families() {
        assert_eq!("tcp".parse::<AddressFamily>().unwrap(), AddressFamily::Tcp);
        assert_eq!("TCP4".parse::<AddressFamily>().unwrap(), AddressFamily::Tcp4);
        assert_eq!("tcp6".parse::<AddressFamily>().unwrap(), AddressFamily::Tcp6);
        assert_eq!("udp".parse::<AddressFamily>().unwrap(), AddressFamily::Udp);
        assert_eq!("udp4".parse::<AddressFamily>().unwrap(), AddressFamily::Udp4);
        assert_eq!("unix".parse::<AddressFamily>().unwrap(), AddressFamily::Unix);
    }

    #[test]
    fn test_unsupported_family_is_config_error() {
        let err = "sctp".parse::<AddressFamily>().unwrap_err();
        assert!(err.is_usage());
    }

    #[test]
    fn test_port_only_addresses() {
        assert_eq!(
            AddressFamily::Tcp.listen_hosts(":8080"),
            vec!["[::]:8080", "0.0.0.0:8080"]
        );
        assert_eq!(AddressFamily::Tcp4.listen_hosts(":8080"), vec!["0.0.0.0:8080"]);
        assert_eq!(AddressFamily::Tcp6.listen_hosts(":8080"), vec!["[::]:8080"]);
        assert_eq!(AddressFamily::Tcp.listen_hosts("10.0.0.1:80"), vec!["10.0.0.1:80"]);
        assert_eq!(AddressFamily::Tcp4.dial_host(":8080"), "127.0.0.1:8080");
        assert_eq!(AddressFamily::Tcp6.dial_host(":8080"), "[::1]:8080");
        assert_eq!(AddressFamily::Udp6.dial_host(":53"), "[::1]:53");
        assert_eq!(AddressFamily::Tcp.dial_host("example.com:80"), "example.com:80");
    }

    #[test]
    fn test_accepts_by_ip_version() {
        let v4: SocketAddr = "127.0.0.1:1".parse().unwrap();
        let v6: SocketAddr = "[::1]:1".parse().unwrap();
        assert!(AddressFamily::Tcp.accepts(&v4) && AddressFamily::Tcp.accepts(&v6));
        assert!(AddressFamily::Tcp4.accepts(&v4) && !AddressFamily::Tcp4.accepts(&v6));
        assert!(!AddressFamily::Tcp6.accepts(&v4) && AddressFamily::Tcp6.accepts(&v6));
        assert!(AddressFamily::Udp4.accepts(&v4) && !AddressFamily::Udp6.accepts(&v4));
    }

    #[tokio::test]
    async fn test_resolve_filters_by_family() {
        let addrs = AddressFamily::Udp4.resolve("127.0.0.1:9").await.unwrap();
        assert_eq!(addrs, vec!["127.0.0.1:9".parse::<SocketAddr>().unwrap()]);

        let err = AddressFamily::Tcp6.resolve("127.0.0.1:9").await.unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::AddrNotAvailable);
        assert!(AddressFamily::Unix.resolve("/tmp/x").await.is_err());
    }
}
