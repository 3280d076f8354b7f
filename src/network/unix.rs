//! Unix domain stream sockets
//!
//! The listener owns its socket file. Once the single connection of a session
//! is accepted the listener is dropped and the path is unlinked, so the next
//! run can bind the same path again.

use super::{Address, AddressFamily, StreamProtocol};
use crate::{NetTestError, Result};
use std::path::PathBuf;
use tokio::net::{UnixListener, UnixStream};
use tracing::debug;

/// Unix domain stream protocol implementation
pub struct UnixProtocol;

/// A bound Unix listener that removes its socket file when dropped
#[derive(Debug)]
pub struct UnixSocketListener {
    listener: UnixListener,
    path: PathBuf,
}

impl Drop for UnixSocketListener {
    fn drop(&mut self) {
        if let Err(e) = std::fs::remove_file(&self.path) {
            debug!(path = %self.path.display(), error = %e, "Failed to remove socket file");
        }
    }
}

fn ensure_unix(family: AddressFamily) -> Result<()> {
    if family == AddressFamily::Unix {
        Ok(())
    } else {
        Err(NetTestError::Config(format!(
            "{family} is not a Unix address family"
        )))
    }
}

impl StreamProtocol for UnixProtocol {
    type Listener = UnixSocketListener;
    type Stream = UnixStream;

    async fn bind(family: AddressFamily, address: &str) -> Result<UnixSocketListener> {
        ensure_unix(family)?;
        let path = PathBuf::from(address);
        let listener = UnixListener::bind(&path).map_err(|source| NetTestError::Listen {
            address: address.to_string(),
            source,
        })?;
        Ok(UnixSocketListener { listener, path })
    }

    async fn accept(listener: &mut UnixSocketListener) -> Result<UnixStream> {
        let (stream, _) = listener.listener.accept().await?;
        Ok(stream)
    }

    async fn connect(family: AddressFamily, address: &str) -> Result<UnixStream> {
        ensure_unix(family)?;
        UnixStream::connect(address)
            .await
            .map_err(|source| NetTestError::Connect {
                address: address.to_string(),
                source,
            })
    }

    fn listener_addr(listener: &UnixSocketListener) -> Result<Address> {
        Ok(Address::Unix(listener.path.clone()))
    }

    fn local_addr(stream: &UnixStream) -> Result<Address> {
        Ok(stream.local_addr()?.into())
    }

    fn peer_addr(stream: &UnixStream) -> Result<Address> {
        Ok(stream.peer_addr()?.into())
    }
}
