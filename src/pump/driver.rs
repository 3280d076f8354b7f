use super::PumpConfig;
use crate::common::{Quitter, Stats};
use crate::service::{ServiceConfig, TrafficService};
use std::future::Future;
use std::io;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, ReadHalf, WriteHalf};
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tracing::{Instrument, debug, info_span, trace, warn};

/// Drives a traffic service over a live stream
///
/// Starting a pump spawns three tasks that share the session's [`Quitter`]:
/// a reader that feeds received bytes to the service, a writer that sends
/// what the service produces, and a closer that shuts the stream down once
/// quit is signalled. Any I/O error, deadline expiry, or end of stream quits
/// the whole session; there is no retry at this layer.
///
/// # Examples
///
/// ```
/// use nettest::common::{Quitter, Stats};
/// use nettest::pump::{Pump, PumpConfig};
/// use nettest::service::ServiceConfig;
/// use std::sync::Arc;
/// use tokio::io::{AsyncReadExt, AsyncWriteExt};
///
/// # tokio_test::block_on(async {
/// let (local, mut peer) = tokio::io::duplex(1024);
/// let quitter = Quitter::new();
/// let stats = Arc::new(Stats::new());
///
/// let pump = Pump::new(PumpConfig::default(), ServiceConfig::Echo);
/// let closed = pump.start(local, quitter.clone(), stats.clone());
///
/// peer.write_all(b"ping").await.unwrap();
/// let mut reply = [0u8; 4];
/// peer.read_exact(&mut reply).await.unwrap();
/// assert_eq!(&reply, b"ping");
///
/// drop(peer);
/// closed.await.unwrap();
/// assert!(!quitter.active());
/// # });
/// ```
#[derive(Debug, Clone)]
pub struct Pump {
    config: PumpConfig,
    service: ServiceConfig,
}

impl Pump {
    /// Creates a pump for the given service
    pub fn new(config: PumpConfig, service: ServiceConfig) -> Self {
        Self { config, service }
    }

    /// Builds the service and spawns the reader, writer, and closer tasks
    ///
    /// Returns immediately. The returned handle completes once quit has been
    /// signalled, both loops have stopped, and the stream has been closed.
    pub fn start<S>(&self, stream: S, quitter: Quitter, stats: Arc<Stats>) -> JoinHandle<()>
    where
        S: AsyncRead + AsyncWrite + Send + Unpin + 'static,
    {
        let service = self.service.build(quitter.clone(), stats.clone());
        let (reader, writer) = tokio::io::split(stream);

        debug!(
            service = self.service.name(),
            buffer_size = self.config.buffer_size,
            timeout = ?self.config.deadline(),
            "Starting pump"
        );

        let read_task = tokio::spawn(
            read_loop(
                reader,
                service.clone(),
                quitter.clone(),
                stats.clone(),
                self.config,
            )
            .instrument(info_span!("reader")),
        );
        let write_task = tokio::spawn(
            write_loop(writer, service, quitter.clone(), stats, self.config)
                .instrument(info_span!("writer")),
        );

        tokio::spawn(close_on_quit(read_task, write_task, quitter).instrument(info_span!("closer")))
    }
}

/// Runs `op`, failing with `TimedOut` if it outlives the deadline
async fn with_deadline<T>(
    deadline: Option<Duration>,
    op: impl Future<Output = io::Result<T>>,
) -> io::Result<T> {
    match deadline {
        Some(limit) => timeout(limit, op)
            .await
            .map_err(|_| io::Error::new(io::ErrorKind::TimedOut, "deadline exceeded"))?,
        None => op.await,
    }
}

async fn read_loop<R>(
    mut reader: R,
    service: Arc<dyn TrafficService>,
    quitter: Quitter,
    stats: Arc<Stats>,
    config: PumpConfig,
) -> R
where
    R: AsyncRead + Unpin,
{
    let mut buffer = vec![0u8; config.buffer_size];

    while quitter.active() {
        let read = tokio::select! {
            biased;
            _ = quitter.wait() => break,
            read = with_deadline(config.deadline(), reader.read(&mut buffer)) => read,
        };

        match read {
            Ok(0) => {
                debug!("Peer closed the connection");
                quitter.quit();
                break;
            }
            Ok(n) => {
                stats.add_received(n);
                trace!(size = n, "Received data");
                service.consume(&buffer[..n]).await;
            }
            Err(e) => {
                debug!(error = %e, "Read failed");
                quitter.quit();
                break;
            }
        }
    }

    reader
}

async fn write_loop<W>(
    mut writer: W,
    service: Arc<dyn TrafficService>,
    quitter: Quitter,
    stats: Arc<Stats>,
    config: PumpConfig,
) -> W
where
    W: AsyncWrite + Unpin,
{
    while quitter.active() {
        let Some(chunk) = service.produce().await else {
            if quitter.active() {
                debug!("Service has nothing further to send");
            }
            break;
        };

        if let Err(e) = send(&mut writer, &chunk, &quitter, &stats, config).await {
            if quitter.quit() {
                debug!(error = %e, "Write failed");
            }
            break;
        }
        trace!(size = chunk.len(), "Sent data");
    }

    writer
}

/// Writes `data` one call at a time, counting every partial write
///
/// Each write call and the final flush get their own deadline. Returns
/// `Interrupted` when quit arrives before the chunk is out.
async fn send<W>(
    writer: &mut W,
    data: &[u8],
    quitter: &Quitter,
    stats: &Stats,
    config: PumpConfig,
) -> io::Result<()>
where
    W: AsyncWrite + Unpin,
{
    let mut offset = 0;
    while offset < data.len() {
        let written = tokio::select! {
            biased;
            _ = quitter.wait() => return Err(io::ErrorKind::Interrupted.into()),
            written = with_deadline(config.deadline(), writer.write(&data[offset..])) => written?,
        };
        if written == 0 {
            return Err(io::ErrorKind::WriteZero.into());
        }
        stats.add_sent(written);
        offset += written;
    }

    tokio::select! {
        biased;
        _ = quitter.wait() => Err(io::ErrorKind::Interrupted.into()),
        flushed = with_deadline(config.deadline(), writer.flush()) => flushed,
    }
}

/// Waits for quit, collects both halves, and shuts the stream down
async fn close_on_quit<S>(
    read_task: JoinHandle<ReadHalf<S>>,
    write_task: JoinHandle<WriteHalf<S>>,
    quitter: Quitter,
) where
    S: AsyncRead + AsyncWrite + Unpin,
{
    quitter.wait().await;

    match (read_task.await, write_task.await) {
        (Ok(reader), Ok(writer)) => {
            let mut stream = reader.unsplit(writer);
            if let Err(e) = stream.shutdown().await {
                debug!(error = %e, "Shutdown failed");
            }
        }
        (Err(e), _) | (_, Err(e)) => {
            warn!(error = %e, "Pump task failed, dropping connection");
        }
    }

    debug!("Connection closed");
}
