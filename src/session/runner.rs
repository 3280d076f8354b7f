use super::{Reporter, Role, SessionConfig};
use crate::common::{Quitter, Stats, StatsSnapshot};
use crate::network::{Address, AddressFamily, StreamProtocol, TcpProtocol, UdpProtocol};
use crate::pump::Pump;
use crate::{NetTestError, Result};
use std::sync::Arc;
use tracing::{Instrument, info, info_span, warn};

#[cfg(unix)]
use crate::network::UnixProtocol;

/// A connection established by [`Session::establish`]
pub struct Connection<S> {
    stream: S,
    local: Address,
    peer: Address,
}

impl<S> Connection<S> {
    pub fn new(stream: S, local: Address, peer: Address) -> Self {
        Self {
            stream,
            local,
            peer,
        }
    }

    /// Wraps a stream of protocol `P`, reading both endpoint identities
    pub fn from_stream<P>(stream: S) -> Result<Self>
    where
        P: StreamProtocol<Stream = S>,
    {
        let local = P::local_addr(&stream)?;
        let peer = P::peer_addr(&stream)?;
        Ok(Self::new(stream, local, peer))
    }

    pub fn local(&self) -> &Address {
        &self.local
    }

    pub fn peer(&self) -> &Address {
        &self.peer
    }
}

/// One connection driven from establishment to shutdown
///
/// The session owns the [`Quitter`] and [`Stats`] shared with the pump.
/// Quitting the session's quitter from outside (a signal watcher, a test)
/// ends the session at whatever stage it is in.
pub struct Session {
    config: SessionConfig,
    quitter: Quitter,
    stats: Arc<Stats>,
}

impl Session {
    pub fn new(config: SessionConfig) -> Self {
        Self {
            config,
            quitter: Quitter::new(),
            stats: Arc::new(Stats::new()),
        }
    }

    /// The session's shutdown signal
    pub fn quitter(&self) -> Quitter {
        self.quitter.clone()
    }

    /// Establishes the connection and drives it until quit
    ///
    /// Returns the final statistics. A pattern mismatch is a normal outcome:
    /// it shows up as a verified length below the configured end length.
    pub async fn run(&self) -> Result<StatsSnapshot> {
        self.config.validate()?;
        let span = info_span!(
            "session",
            role = %self.config.role,
            service = self.config.service.name(),
        );

        match self.config.family {
            AddressFamily::Tcp | AddressFamily::Tcp4 | AddressFamily::Tcp6 => {
                self.run_with::<TcpProtocol>().instrument(span).await
            }
            AddressFamily::Udp | AddressFamily::Udp4 | AddressFamily::Udp6 => {
                self.run_with::<UdpProtocol>().instrument(span).await
            }
            #[cfg(unix)]
            AddressFamily::Unix => self.run_with::<UnixProtocol>().instrument(span).await,
            #[cfg(not(unix))]
            AddressFamily::Unix => Err(NetTestError::Config(
                "unix sockets are not supported on this platform".to_string(),
            )),
        }
    }

    async fn run_with<P: StreamProtocol>(&self) -> Result<StatsSnapshot> {
        let connection = self.establish::<P>().await?;
        Ok(self.drive(connection).await)
    }

    /// Dials the peer or waits for one, depending on the role
    pub async fn establish<P: StreamProtocol>(&self) -> Result<Connection<P::Stream>> {
        let family = self.config.family;
        let address = self.config.address.as_str();

        let stream = match self.config.role {
            Role::Client => {
                info!(%family, address, "Connecting");
                P::connect(family, address).await?
            }
            Role::Server => {
                info!(%family, address, "Listening for a connection");
                let listener = P::bind(family, address).await?;
                self.accept::<P>(listener).await?
            }
        };

        Connection::from_stream::<P>(stream)
    }

    /// Accepts the first connection on `listener`, then closes the listener
    pub async fn accept<P: StreamProtocol>(&self, mut listener: P::Listener) -> Result<P::Stream> {
        if let Ok(address) = P::listener_addr(&listener) {
            info!(%address, "Listening");
        }

        loop {
            tokio::select! {
                biased;
                _ = self.quitter.wait() => return Err(NetTestError::Interrupted),
                accepted = P::accept(&mut listener) => match accepted {
                    Ok(stream) => return Ok(stream),
                    Err(e) => warn!(error = %e, "Failed to accept connection"),
                },
            }
        }
    }

    /// Runs the pump over an established connection until quit
    ///
    /// Prints a report at every configured interval, waits for the pump to
    /// close the connection, and prints a final report when statistics were
    /// requested.
    pub async fn drive<S>(&self, connection: Connection<S>) -> StatsSnapshot
    where
        S: tokio::io::AsyncRead + tokio::io::AsyncWrite + Send + Unpin + 'static,
    {
        info!("Connected to : {}", connection.peer());
        info!("Connected from : {}", connection.local());

        self.stats.mark_start();
        let pump = Pump::new(self.config.pump_config(), self.config.service.clone());
        let closed = pump.start(connection.stream, self.quitter.clone(), self.stats.clone());

        let reporter = Reporter::new(self.stats.clone(), self.config.service.is_pattern());
        reporter
            .run_until_quit(&self.quitter, self.config.interval)
            .await;

        if let Err(e) = closed.await {
            warn!(error = %e, "Pump did not shut down cleanly");
        }
        info!("Session finished");

        if self.config.stats {
            reporter.print();
        }
        self.stats.snapshot()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::ServiceConfig;
    use std::time::Duration;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    #[tokio::test]
    async fn test_quit_interrupts_accept() {
        let config = SessionConfig::new(
            AddressFamily::Tcp4,
            "127.0.0.1:0",
            Role::Server,
            ServiceConfig::Echo,
        );
        let session = Session::new(config);
        let quitter = session.quitter();

        let stopper = tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            quitter.quit();
        });

        let result = tokio::time::timeout(Duration::from_secs(1), session.run())
            .await
            .expect("accept should stop on quit");
        assert!(matches!(result, Err(NetTestError::Interrupted)));
        stopper.await.unwrap();
    }

    #[tokio::test]
    async fn test_invalid_config_fails_before_connecting() {
        let config = SessionConfig::new(
            AddressFamily::Tcp,
            "127.0.0.1:1",
            Role::Client,
            ServiceConfig::Echo,
        )
        .with_buffer_size(0);

        let err = Session::new(config).run().await.unwrap_err();
        assert!(err.is_usage());
    }

    #[tokio::test]
    async fn test_drive_reports_endpoint_stats() {
        let (local, mut peer) = tokio::io::duplex(256);
        let config = SessionConfig::new(
            AddressFamily::Tcp,
            "127.0.0.1:0",
            Role::Client,
            ServiceConfig::Echo,
        )
        .with_interval(Duration::ZERO);
        let session = Session::new(config);

        let addr: std::net::SocketAddr = "127.0.0.1:9".parse().unwrap();
        let connection = Connection::new(local, addr.into(), addr.into());
        let driver = tokio::spawn(async move { session.drive(connection).await });

        peer.write_all(b"xyz").await.unwrap();
        let mut reply = [0u8; 3];
        peer.read_exact(&mut reply).await.unwrap();
        drop(peer);

        let snapshot = tokio::time::timeout(Duration::from_secs(1), driver)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(snapshot.bytes_received, 3);
        assert_eq!(snapshot.bytes_sent, 3);
    }
}
