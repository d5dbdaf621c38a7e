//! The *fake* handler family: filesystem-backed, permission-enforcing
//! behavior simulation.
//!
//! Fake handlers perform the protocol-mandated precondition checks against a
//! [`VirtualFileSystem`] and the session, short-circuiting with the matching
//! numeric reply on the first failure: logged-in (530), required parameters
//! (501), path resolution, existence/type (550, with the exact reason
//! distinguished), then the permission appropriate to the operation. Every
//! check failure ends only the current command; the control connection
//! stays usable.

mod cdup;
mod cwd;
mod dele;
mod eprt;
mod epsv;
mod list;
mod mkd;
mod nlst;
mod noop;
mod pass;
mod pasv;
mod port;
mod pwd;
mod quit;
mod retr;
mod rmd;
mod rnfr;
mod rnto;
mod stor;
mod stou;
mod syst;
mod type_;
mod user;

pub use cdup::Cdup;
pub use cwd::Cwd;
pub use dele::Dele;
pub use eprt::Eprt;
pub use epsv::Epsv;
pub use list::List;
pub use mkd::Mkd;
pub use nlst::Nlst;
pub use noop::Noop;
pub use pass::Pass;
pub use pasv::Pasv;
pub use port::Port;
pub use pwd::Pwd;
pub use quit::Quit;
pub use retr::Retr;
pub use rmd::Rmd;
pub use rnfr::Rnfr;
pub use rnto::Rnto;
pub use stor::Stor;
pub use stou::Stou;
pub use syst::Syst;
pub use type_::Type;
pub use user::User;

use crate::fs::{self, FsError, VirtualFileSystem};
use crate::messages::{MessageCatalog, keys};
use crate::server::controlchan::{Command, CommandDispatcher, ControlChanError, Reply, ReplyCode};
use crate::server::session::Session;

use dashmap::DashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};
use thiserror::Error;

/// Default answer to SYST for the fake variant.
pub const DEFAULT_SYSTEM_NAME: &str = "UNIX Type: L8";

/// Credentials plus home directory of one user the fake server accepts.
#[derive(Debug, Clone)]
pub struct Account {
    /// The password PASS is checked against.
    pub password: String,
    /// Where the session lands after login.
    pub home: PathBuf,
}

/// Everything the fake handlers share: the virtual filesystem, the reply
/// texts, the account table and the advertised system name. Injected into
/// each handler at registration time.
#[derive(Debug)]
pub struct FakeEnv {
    pub(crate) fs: Arc<dyn VirtualFileSystem>,
    pub(crate) messages: Arc<dyn MessageCatalog>,
    pub(crate) accounts: DashMap<String, Account>,
    system_name: Mutex<String>,
}

/// A failed precondition, carrying enough to build the right reply.
#[derive(Debug, Error, PartialEq, Eq)]
pub(crate) enum FakeError {
    #[error("not logged in")]
    NotLoggedIn,
    #[error("required parameter missing")]
    MissingParameter,
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),
    #[error("bad command sequence: {0}")]
    BadSequence(&'static str),
    #[error("{}: no such file or directory", .0.display())]
    DoesNotExist(PathBuf),
    #[error("{}: not a directory", .0.display())]
    NotADirectory(PathBuf),
    #[error("{}: is a directory", .0.display())]
    IsADirectory(PathBuf),
    #[error("{}: already exists", .0.display())]
    AlreadyExists(PathBuf),
    #[error("{}: directory not empty", .0.display())]
    NotEmpty(PathBuf),
    #[error("{}: read permission denied", .0.display())]
    CannotRead(PathBuf),
    #[error("{}: write permission denied", .0.display())]
    CannotWrite(PathBuf),
    #[error("{}: execute permission denied", .0.display())]
    CannotExecute(PathBuf),
}

impl From<FsError> for FakeError {
    fn from(e: FsError) -> Self {
        match e {
            FsError::NotFound(path) => FakeError::DoesNotExist(path),
            FsError::NotADirectory(path) => FakeError::NotADirectory(path),
            FsError::IsADirectory(path) => FakeError::IsADirectory(path),
            FsError::AlreadyExists(path) => FakeError::AlreadyExists(path),
            FsError::DirectoryNotEmpty(path) => FakeError::NotEmpty(path),
        }
    }
}

impl FakeError {
    fn reply(&self, messages: &dyn MessageCatalog) -> Reply {
        let (code, key, path) = match self {
            FakeError::NotLoggedIn => (ReplyCode::NotLoggedIn, keys::NOT_LOGGED_IN, None),
            FakeError::MissingParameter => (ReplyCode::ParameterSyntaxError, keys::MISSING_PARAMETER, None),
            FakeError::InvalidParameter(detail) => {
                return Reply::new(ReplyCode::ParameterSyntaxError, messages.lookup(keys::INVALID_PARAMETER, &[detail]));
            }
            FakeError::BadSequence(detail) => {
                return Reply::new(ReplyCode::BadCommandSequence, messages.lookup(keys::BAD_SEQUENCE, &[detail]));
            }
            FakeError::DoesNotExist(path) => (ReplyCode::FileError, keys::FS_DOES_NOT_EXIST, Some(path)),
            FakeError::NotADirectory(path) => (ReplyCode::FileError, keys::FS_IS_NOT_A_DIRECTORY, Some(path)),
            FakeError::IsADirectory(path) => (ReplyCode::FileError, keys::FS_IS_A_DIRECTORY, Some(path)),
            FakeError::AlreadyExists(path) => (ReplyCode::FileError, keys::FS_ALREADY_EXISTS, Some(path)),
            FakeError::NotEmpty(path) => (ReplyCode::FileError, keys::FS_NOT_EMPTY, Some(path)),
            FakeError::CannotRead(path) => (ReplyCode::FileError, keys::FS_CANNOT_READ, Some(path)),
            FakeError::CannotWrite(path) => (ReplyCode::FileError, keys::FS_CANNOT_WRITE, Some(path)),
            FakeError::CannotExecute(path) => (ReplyCode::FileError, keys::FS_CANNOT_EXECUTE, Some(path)),
        };
        let text = match path {
            Some(path) => messages.lookup(key, &[&path.display().to_string()]),
            None => messages.lookup(key, &[]),
        };
        Reply::new(code, text)
    }
}

impl FakeEnv {
    pub(crate) fn new(fs: Arc<dyn VirtualFileSystem>, messages: Arc<dyn MessageCatalog>) -> Self {
        FakeEnv {
            fs,
            messages,
            accounts: DashMap::new(),
            system_name: Mutex::new(DEFAULT_SYSTEM_NAME.to_string()),
        }
    }

    pub(crate) fn system_name(&self) -> String {
        self.system_name.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    pub(crate) fn set_system_name<N: Into<String>>(&self, name: N) {
        *self.system_name.lock().unwrap_or_else(PoisonError::into_inner) = name.into();
    }

    pub(crate) fn text(&self, key: &str, args: &[&str]) -> String {
        self.messages.lookup(key, args)
    }

    /// Sends the reply a failed precondition maps to. The failure is
    /// terminal for the current command only.
    pub(crate) async fn fail(&self, session: &mut Session, error: FakeError) -> Result<(), ControlChanError> {
        slog::debug!(session.logger, "Command precondition failed: {}", error);
        session.send(error.reply(self.messages.as_ref())).await
    }

    pub(crate) fn require_login(&self, session: &Session) -> Result<(), FakeError> {
        if session.authenticated { Ok(()) } else { Err(FakeError::NotLoggedIn) }
    }

    pub(crate) fn resolve(&self, session: &Session, argument: &str) -> PathBuf {
        fs::resolve(&session.cwd, argument)
    }

    pub(crate) fn require_exists(&self, path: &Path) -> Result<(), FakeError> {
        if self.fs.exists(path) {
            Ok(())
        } else {
            Err(FakeError::DoesNotExist(path.to_path_buf()))
        }
    }

    /// The path must exist and be a directory; the two failures are kept
    /// apart because FTP distinguishes them.
    pub(crate) fn require_directory(&self, path: &Path) -> Result<(), FakeError> {
        self.require_exists(path)?;
        if self.fs.is_directory(path) {
            Ok(())
        } else {
            Err(FakeError::NotADirectory(path.to_path_buf()))
        }
    }

    /// The path must exist and be a regular file.
    pub(crate) fn require_file(&self, path: &Path) -> Result<(), FakeError> {
        self.require_exists(path)?;
        if self.fs.is_file(path) {
            Ok(())
        } else {
            Err(FakeError::IsADirectory(path.to_path_buf()))
        }
    }

    pub(crate) fn require_read(&self, path: &Path, principal: Option<&str>) -> Result<(), FakeError> {
        if self.fs.can_read(path, principal) {
            Ok(())
        } else {
            Err(FakeError::CannotRead(path.to_path_buf()))
        }
    }

    pub(crate) fn require_execute(&self, path: &Path, principal: Option<&str>) -> Result<(), FakeError> {
        if self.fs.can_execute(path, principal) {
            Ok(())
        } else {
            Err(FakeError::CannotExecute(path.to_path_buf()))
        }
    }

    /// Write-type operations need write permission on the *parent* of the
    /// target. Returns the parent for reuse.
    pub(crate) fn require_writable_parent(&self, path: &Path, principal: Option<&str>) -> Result<PathBuf, FakeError> {
        let parent = self
            .fs
            .parent(path)
            .ok_or_else(|| FakeError::CannotWrite(path.to_path_buf()))?;
        self.require_directory(&parent)?;
        if self.fs.can_write(&parent, principal) {
            Ok(parent)
        } else {
            Err(FakeError::CannotWrite(parent))
        }
    }
}

/// The positional parameter at `index`, or the 501 condition.
pub(crate) fn required_parameter(command: &Command, index: usize) -> Result<&str, FakeError> {
    command.parameter(index).ok_or(FakeError::MissingParameter)
}

/// Builds the fake verb table, wiring the shared environment into every
/// handler.
pub(crate) fn registry(env: &Arc<FakeEnv>) -> CommandDispatcher {
    let mut dispatcher = CommandDispatcher::new();
    dispatcher.register("USER", Arc::new(User::new(env.clone())));
    dispatcher.register("PASS", Arc::new(Pass::new(env.clone())));
    dispatcher.register("QUIT", Arc::new(Quit::new(env.clone())));
    dispatcher.register("NOOP", Arc::new(Noop::new(env.clone())));
    dispatcher.register("TYPE", Arc::new(Type::new(env.clone())));
    dispatcher.register("SYST", Arc::new(Syst::new(env.clone())));
    dispatcher.register("PWD", Arc::new(Pwd::new(env.clone())));
    dispatcher.register("CWD", Arc::new(Cwd::new(env.clone())));
    dispatcher.register("CDUP", Arc::new(Cdup::new(env.clone())));
    dispatcher.register("MKD", Arc::new(Mkd::new(env.clone())));
    dispatcher.register("RMD", Arc::new(Rmd::new(env.clone())));
    dispatcher.register("DELE", Arc::new(Dele::new(env.clone())));
    dispatcher.register("RNFR", Arc::new(Rnfr::new(env.clone())));
    dispatcher.register("RNTO", Arc::new(Rnto::new(env.clone())));
    dispatcher.register("PORT", Arc::new(Port::new(env.clone())));
    dispatcher.register("EPRT", Arc::new(Eprt::new(env.clone())));
    dispatcher.register("PASV", Arc::new(Pasv::new(env.clone())));
    dispatcher.register("EPSV", Arc::new(Epsv::new(env.clone())));
    dispatcher.register("LIST", Arc::new(List::new(env.clone())));
    dispatcher.register("NLST", Arc::new(Nlst::new(env.clone())));
    dispatcher.register("RETR", Arc::new(Retr::new(env.clone())));
    dispatcher.register("STOR", Arc::new(Stor::new(env.clone())));
    dispatcher.register("STOU", Arc::new(Stou::new(env.clone())));
    dispatcher
}
