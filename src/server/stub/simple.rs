//! Stub handlers whose whole job is one canned reply and one recorded
//! snapshot.

use super::{InvocationRecord, PASSWORD_KEY, PATHNAME_KEY, RecordedValue, StubCommandHandler, StubCore, USERNAME_KEY};
use crate::server::controlchan::{Command, CommandHandler, ControlChanError, ReplyCode};
use crate::server::session::Session;

use async_trait::async_trait;

macro_rules! simple_stub {
    ($(#[$doc:meta])* $name:ident, $code:expr, $text:expr $(, records($key:expr))?) => {
        $(#[$doc])*
        #[derive(Debug)]
        pub struct $name {
            core: StubCore,
        }

        impl $name {
            pub fn new() -> Self {
                $name {
                    core: StubCore::new($code, $text),
                }
            }
        }

        impl Default for $name {
            fn default() -> Self {
                $name::new()
            }
        }

        #[async_trait]
        impl CommandHandler for $name {
            async fn handle(&self, command: &Command, session: &mut Session) -> Result<(), ControlChanError> {
                #[allow(unused_mut)]
                let mut record = InvocationRecord::new(command);
                $(
                    record = record.with(
                        $key,
                        RecordedValue::Text(command.parameter(0).unwrap_or_default().to_string()),
                    );
                )?
                self.core.finish(record, session).await
            }
        }

        impl StubCommandHandler for $name {
            fn core(&self) -> &StubCore {
                &self.core
            }
        }
    };
}

simple_stub!(
    /// Stub for the RFC 959 User Name (`USER`) command.
    User,
    ReplyCode::NeedPassword,
    "User name okay, need password.",
    records(USERNAME_KEY)
);

simple_stub!(
    /// Stub for the RFC 959 Password (`PASS`) command.
    Pass,
    ReplyCode::UserLoggedIn,
    "User logged in, proceed.",
    records(PASSWORD_KEY)
);

simple_stub!(
    /// Stub for the RFC 959 No Operation (`NOOP`) command.
    Noop,
    ReplyCode::CommandOkay,
    "OK."
);

simple_stub!(
    /// Stub for the RFC 959 Representation Type (`TYPE`) command.
    Type,
    ReplyCode::CommandOkay,
    "Type set."
);

simple_stub!(
    /// Stub for the RFC 959 System (`SYST`) command. The canned system name
    /// deliberately differs from the fake variant's default.
    Syst,
    ReplyCode::SystemType,
    "\"WINDOWS\" system type."
);

simple_stub!(
    /// Stub for the RFC 959 Print Working Directory (`PWD`) command.
    Pwd,
    ReplyCode::PathCreated,
    "\"/\" is the current directory."
);

simple_stub!(
    /// Stub for the RFC 959 Change Working Directory (`CWD`) command.
    Cwd,
    ReplyCode::FileActionOkay,
    "CWD completed.",
    records(PATHNAME_KEY)
);

simple_stub!(
    /// Stub for the RFC 959 Change To Parent Directory (`CDUP`) command.
    Cdup,
    ReplyCode::FileActionOkay,
    "CDUP completed."
);

simple_stub!(
    /// Stub for the RFC 959 Make Directory (`MKD`) command.
    Mkd,
    ReplyCode::PathCreated,
    "Directory created.",
    records(PATHNAME_KEY)
);

simple_stub!(
    /// Stub for the RFC 959 Remove Directory (`RMD`) command.
    Rmd,
    ReplyCode::FileActionOkay,
    "RMD completed.",
    records(PATHNAME_KEY)
);

simple_stub!(
    /// Stub for the RFC 959 Delete (`DELE`) command.
    Dele,
    ReplyCode::FileActionOkay,
    "DELE completed.",
    records(PATHNAME_KEY)
);

simple_stub!(
    /// Stub for the RFC 959 Rename From (`RNFR`) command.
    Rnfr,
    ReplyCode::FileActionPending,
    "Requested file action pending further information.",
    records(PATHNAME_KEY)
);

simple_stub!(
    /// Stub for the RFC 959 Rename To (`RNTO`) command.
    Rnto,
    ReplyCode::FileActionOkay,
    "RNTO completed.",
    records(PATHNAME_KEY)
);

/// Stub for the RFC 959 Logout (`QUIT`) command. Besides the canned reply it
/// ends the session, so the control loop hangs up like a real server would.
#[derive(Debug)]
pub struct Quit {
    core: StubCore,
}

impl Quit {
    pub fn new() -> Self {
        Quit {
            core: StubCore::new(ReplyCode::ClosingControlConnection, "Service closing control connection."),
        }
    }
}

impl Default for Quit {
    fn default() -> Self {
        Quit::new()
    }
}

#[async_trait]
impl CommandHandler for Quit {
    async fn handle(&self, command: &Command, session: &mut Session) -> Result<(), ControlChanError> {
        self.core.finish(InvocationRecord::new(command), session).await?;
        session.close();
        Ok(())
    }
}

impl StubCommandHandler for Quit {
    fn core(&self) -> &StubCore {
        &self.core
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::server::stub::USERNAME_KEY;
    use crate::server::testutil::{replies_of, test_session};
    use pretty_assertions::assert_eq;

    #[tokio::test]
    async fn canned_reply_and_recorded_username() {
        let user = User::new();
        let (mut session, replies) = test_session();
        let command = Command::new("USER", vec!["dolores".to_string()]);

        user.handle(&command, &mut session).await.unwrap();

        let sent = replies_of(&replies);
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].code(), 331);
        let invocations = user.core().invocations();
        assert_eq!(invocations.len(), 1);
        assert_eq!(invocations[0].text(USERNAME_KEY), Some("dolores"));
        assert_eq!(invocations[0].command().name(), "USER");
    }

    #[tokio::test]
    async fn reply_is_reconfigurable() {
        let cwd = Cwd::new();
        cwd.core().set_reply(550, "No such directory.");
        let (mut session, replies) = test_session();

        cwd.handle(&Command::new("CWD", vec!["docs".to_string()]), &mut session).await.unwrap();

        let sent = replies_of(&replies);
        assert_eq!(sent[0].code(), 550);
        assert_eq!(sent[0].text(), "No such directory.");
    }

    #[tokio::test]
    async fn quit_closes_the_session() {
        let quit = Quit::new();
        let (mut session, replies) = test_session();

        quit.handle(&Command::new("QUIT", vec![]), &mut session).await.unwrap();

        assert!(session.is_closed());
        assert_eq!(replies_of(&replies)[0].code(), 221);
    }
}
