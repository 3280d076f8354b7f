use crate::common::{Quitter, StatsSnapshot};
use crate::network::{StreamProtocol, TcpProtocol};
use crate::session::{Connection, Session, SessionConfig};
use crate::Result;
use std::net::SocketAddr;
use tokio::task::JoinHandle;

/// Starts a server-side session on an ephemeral TCP port for integration tests
///
/// The listener is bound before this function returns, so clients can dial
/// the returned address right away. The address in `config` should use port
/// 0. Returns the session task, the bound address, and the session's quitter.
pub async fn spawn_tcp_session_server(
    config: SessionConfig,
) -> Result<(JoinHandle<Result<StatsSnapshot>>, SocketAddr, Quitter)> {
    config.validate()?;
    let listener = TcpProtocol::bind(config.family, &config.address).await?;
    let addr = listener.local_addr()?;

    let session = Session::new(config);
    let quitter = session.quitter();
    let handle = tokio::spawn(async move {
        let stream = session.accept::<TcpProtocol>(listener).await?;
        let connection = Connection::from_stream::<TcpProtocol>(stream)?;
        Ok(session.drive(connection).await)
    });

    Ok((handle, addr, quitter))
}
