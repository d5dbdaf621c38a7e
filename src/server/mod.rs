//! The simulated FTP server engine: control channel, session, host/port
//! codec and the two handler families.

pub mod controlchan;
pub mod datachan;
pub mod fake;
pub mod ftpserver;
pub mod host_port;
pub mod session;
pub mod stub;

pub use controlchan::{Command, CommandDispatcher, CommandHandler, ControlChanError, Reply, ReplyChannel, ReplyCode};
pub use ftpserver::{FakeFtpServer, StubFtpServer};
pub use host_port::HostAndPort;
pub use session::Session;
