use clap::{Args, Parser, Subcommand};
use nettest::network::AddressFamily;
use nettest::service::{PatternConfig, ServiceConfig};
use nettest::session::{Role, SessionConfig, parse_duration};
use std::time::Duration;

/// Exercise a single stream connection with echo or pattern traffic
#[derive(Debug, Parser)]
#[command(name = "nettest", version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Listen for a connection on a specified address - Echo received data back to the sender
    ServerEcho(EchoArgs),
    /// Connect to a specified address - Echo received data back to the sender
    ClientEcho(EchoArgs),
    /// Listen for a connection on a specified address - Send a pattern, receive a specific pattern
    ServerPattern(PatternArgs),
    /// Connect to a specified address - Send a pattern, receive a specific pattern
    ClientPattern(PatternArgs),
    /// Shows software information
    Info,
}

impl Command {
    /// Resolves the arguments of a session subcommand, `None` for `info`
    pub fn into_session_config(self) -> Option<nettest::Result<SessionConfig>> {
        let config = match self {
            Command::ServerEcho(args) => args.common.into_config(Role::Server, ServiceConfig::Echo),
            Command::ClientEcho(args) => args.common.into_config(Role::Client, ServiceConfig::Echo),
            Command::ServerPattern(args) => args.into_config(Role::Server),
            Command::ClientPattern(args) => args.into_config(Role::Client),
            Command::Info => return None,
        };
        Some(config.and_then(|config| config.validate().map(|_| config)))
    }
}

#[derive(Debug, Args)]
pub struct CommonArgs {
    /// Output final statistics on exit
    #[arg(long)]
    pub stats: bool,

    /// The interval between stdout reports, 0 to disable
    #[arg(long, value_name = "DURATION", default_value = "15s", value_parser = duration_arg)]
    pub interval: Duration,

    /// The timeout for sending or receiving, 0 to disable
    #[arg(long, value_name = "DURATION", default_value = "0", value_parser = duration_arg)]
    pub timeout: Duration,

    /// The size of the receive buffer in bytes
    #[arg(long, value_name = "SIZE", default_value_t = 1024)]
    pub buffer: usize,

    /// The address family of the socket (tcp, tcp4, tcp6, udp, udp4, udp6, unix)
    #[arg(value_name = "ADDR_FAMILY", value_parser = family_arg)]
    pub family: AddressFamily,

    /// The address of the socket (can include port)
    #[arg(value_name = "ADDR")]
    pub address: String,
}

impl CommonArgs {
    fn into_config(self, role: Role, service: ServiceConfig) -> nettest::Result<SessionConfig> {
        Ok(SessionConfig::new(self.family, self.address, role, service)
            .with_buffer_size(self.buffer)
            .with_timeout(self.timeout)
            .with_stats(self.stats)
            .with_interval(self.interval))
    }
}

#[derive(Debug, Args)]
pub struct EchoArgs {
    #[command(flatten)]
    pub common: CommonArgs,
}

#[derive(Debug, Args)]
pub struct PatternArgs {
    #[command(flatten)]
    pub common: CommonArgs,

    /// Pattern starting length
    #[arg(long, value_name = "LENGTH", default_value_t = PatternConfig::DEFAULT_MIN_LENGTH)]
    pub start: usize,

    /// Pattern max length
    #[arg(long, value_name = "LENGTH", default_value_t = PatternConfig::DEFAULT_MAX_LENGTH)]
    pub end: usize,

    /// The pattern is in hex format with no delimiters
    #[arg(long)]
    pub hex: bool,

    /// The pattern to send and expect
    #[arg(value_name = "PATTERN")]
    pub pattern: String,
}

impl PatternArgs {
    fn into_config(self, role: Role) -> nettest::Result<SessionConfig> {
        let pattern = if self.hex {
            PatternConfig::from_hex(&self.pattern, self.start, self.end)?
        } else {
            PatternConfig::new(self.pattern.into_bytes(), self.start, self.end)?
        };
        self.common.into_config(role, ServiceConfig::Pattern(pattern))
    }
}

fn duration_arg(value: &str) -> Result<Duration, String> {
    parse_duration(value).map_err(|e| e.to_string())
}

fn family_arg(value: &str) -> Result<AddressFamily, String> {
    value.parse().map_err(|e: nettest::NetTestError| e.to_string())
}
