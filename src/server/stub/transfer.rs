//! Stub handlers that drive the data connection.
//!
//! Downloads (RETR, LIST, NLST) send canned content configured by the test
//! author; uploads (STOR, STOU) read whatever the client sends and record
//! it. Each handler opens the data connection using whichever mode the
//! session negotiated, and closes it on every exit path before the final
//! control reply.

use super::{FILE_CONTENTS_KEY, InvocationRecord, PATHNAME_KEY, RecordedValue, StubCommandHandler, StubCore};
use crate::server::controlchan::{Command, CommandHandler, ControlChanError, ReplyCode};
use crate::server::session::Session;

use async_trait::async_trait;
use std::sync::{Mutex, PoisonError};

const END_OF_LINE: &str = "\r\n";

fn pathname_record(command: &Command) -> InvocationRecord {
    InvocationRecord::new(command).with(
        PATHNAME_KEY,
        RecordedValue::Text(command.parameter(0).unwrap_or_default().to_string()),
    )
}

// The 150-then-send-then-226 shape shared by the download stubs.
async fn send_canned(core: &StubCore, record: InvocationRecord, bytes: Vec<u8>, session: &mut Session) -> Result<(), ControlChanError> {
    core.record(record);
    session.send_reply(ReplyCode::FileStatusOkay, "Opening data connection.").await?;
    if let Err(e) = session.open_data_connection().await {
        return session.send_reply(ReplyCode::CantOpenDataConnection, e.to_string()).await;
    }
    let outcome = session.send_data(&bytes).await;
    session.close_data_connection().await;
    match outcome {
        Ok(()) => session.send(core.reply()).await,
        Err(e) => session.send_reply(ReplyCode::ConnectionClosed, e.to_string()).await,
    }
}

/// Stub for the RFC 959 Retrieve (`RETR`) command: serves configured file
/// content regardless of the requested path.
#[derive(Debug)]
pub struct Retr {
    core: StubCore,
    contents: Mutex<Vec<u8>>,
}

impl Retr {
    pub fn new() -> Self {
        Retr {
            core: StubCore::new(ReplyCode::ClosingDataConnection, "Transfer complete."),
            contents: Mutex::new(Vec::new()),
        }
    }

    /// Sets the bytes served on the next invocations.
    pub fn set_contents<C: Into<Vec<u8>>>(&self, contents: C) {
        *self.contents.lock().unwrap_or_else(PoisonError::into_inner) = contents.into();
    }
}

impl Default for Retr {
    fn default() -> Self {
        Retr::new()
    }
}

#[async_trait]
impl CommandHandler for Retr {
    async fn handle(&self, command: &Command, session: &mut Session) -> Result<(), ControlChanError> {
        let bytes = self.contents.lock().unwrap_or_else(PoisonError::into_inner).clone();
        send_canned(&self.core, pathname_record(command), bytes, session).await
    }
}

impl StubCommandHandler for Retr {
    fn core(&self) -> &StubCore {
        &self.core
    }
}

macro_rules! listing_stub {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(Debug)]
        pub struct $name {
            core: StubCore,
            lines: Mutex<Vec<String>>,
        }

        impl $name {
            pub fn new() -> Self {
                $name {
                    core: StubCore::new(ReplyCode::ClosingDataConnection, "Closing data connection. Requested file action successful."),
                    lines: Mutex::new(Vec::new()),
                }
            }

            /// Sets the listing lines served on the next invocations.
            pub fn set_listing<L: Into<Vec<String>>>(&self, lines: L) {
                *self.lines.lock().unwrap_or_else(PoisonError::into_inner) = lines.into();
            }

            fn rendered(&self) -> Vec<u8> {
                let lines = self.lines.lock().unwrap_or_else(PoisonError::into_inner);
                if lines.is_empty() {
                    Vec::new()
                } else {
                    let mut body = lines.join(END_OF_LINE);
                    body.push_str(END_OF_LINE);
                    body.into_bytes()
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
                send_canned(&self.core, pathname_record(command), self.rendered(), session).await
            }
        }

        impl StubCommandHandler for $name {
            fn core(&self) -> &StubCore {
                &self.core
            }
        }
    };
}

listing_stub!(
    /// Stub for the RFC 959 List (`LIST`) command.
    List
);

listing_stub!(
    /// Stub for the RFC 959 Name List (`NLST`) command.
    Nlst
);

// The 150-then-read-then-226 shape shared by the upload stubs.
async fn receive_upload(core: &StubCore, record: InvocationRecord, session: &mut Session) -> Result<(), ControlChanError> {
    session.send_reply(ReplyCode::FileStatusOkay, "Ready to receive data.").await?;
    if let Err(e) = session.open_data_connection().await {
        core.record(record);
        return session.send_reply(ReplyCode::CantOpenDataConnection, e.to_string()).await;
    }
    let outcome = session.read_data().await;
    session.close_data_connection().await;
    match outcome {
        Ok(bytes) => {
            core.record(record.with(FILE_CONTENTS_KEY, RecordedValue::Bytes(bytes)));
            session.send(core.reply()).await
        }
        Err(e) => {
            core.record(record);
            session.send_reply(ReplyCode::ConnectionClosed, e.to_string()).await
        }
    }
}

/// Stub for the RFC 959 Store (`STOR`) command: reads the upload off the
/// data connection and records the bytes for later assertions.
#[derive(Debug)]
pub struct Stor {
    core: StubCore,
}

impl Stor {
    pub fn new() -> Self {
        Stor {
            core: StubCore::new(ReplyCode::ClosingDataConnection, "Transfer complete."),
        }
    }
}

impl Default for Stor {
    fn default() -> Self {
        Stor::new()
    }
}

#[async_trait]
impl CommandHandler for Stor {
    async fn handle(&self, command: &Command, session: &mut Session) -> Result<(), ControlChanError> {
        receive_upload(&self.core, pathname_record(command), session).await
    }
}

impl StubCommandHandler for Stor {
    fn core(&self) -> &StubCore {
        &self.core
    }
}

/// Stub for the RFC 959 Store Unique (`STOU`) command; like STOR but takes
/// no pathname.
#[derive(Debug)]
pub struct Stou {
    core: StubCore,
}

impl Stou {
    pub fn new() -> Self {
        Stou {
            core: StubCore::new(ReplyCode::ClosingDataConnection, "Transfer complete."),
        }
    }
}

impl Default for Stou {
    fn default() -> Self {
        Stou::new()
    }
}

#[async_trait]
impl CommandHandler for Stou {
    async fn handle(&self, command: &Command, session: &mut Session) -> Result<(), ControlChanError> {
        receive_upload(&self.core, InvocationRecord::new(command), session).await
    }
}

impl StubCommandHandler for Stou {
    fn core(&self) -> &StubCore {
        &self.core
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::server::testutil::{replies_of, test_session};
    use pretty_assertions::assert_eq;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpStream;

    #[tokio::test]
    async fn retr_serves_the_configured_contents() {
        let retr = Retr::new();
        retr.set_contents("canned file body");
        let (mut session, replies) = test_session();
        let port = session.switch_to_passive().await.unwrap();

        let client = tokio::spawn(async move {
            let mut conn = TcpStream::connect(("127.0.0.1", port)).await.unwrap();
            let mut bytes = Vec::new();
            conn.read_to_end(&mut bytes).await.unwrap();
            bytes
        });

        retr.handle(&Command::new("RETR", vec!["whatever.txt".to_string()]), &mut session)
            .await
            .unwrap();

        assert_eq!(client.await.unwrap(), b"canned file body");
        let sent = replies_of(&replies);
        assert_eq!(sent[0].code(), 150);
        assert_eq!(sent[1].code(), 226);
        assert_eq!(retr.core().invocations()[0].text(PATHNAME_KEY), Some("whatever.txt"));
    }

    #[tokio::test]
    async fn stor_records_the_uploaded_bytes() {
        let stor = Stor::new();
        let (mut session, replies) = test_session();
        let port = session.switch_to_passive().await.unwrap();

        let client = tokio::spawn(async move {
            let mut conn = TcpStream::connect(("127.0.0.1", port)).await.unwrap();
            conn.write_all(b"uploaded body").await.unwrap();
            conn.shutdown().await.unwrap();
        });

        stor.handle(&Command::new("STOR", vec!["up.txt".to_string()]), &mut session)
            .await
            .unwrap();
        client.await.unwrap();

        let sent = replies_of(&replies);
        assert_eq!(sent[0].code(), 150);
        assert_eq!(sent[1].code(), 226);
        let invocations = stor.core().invocations();
        assert_eq!(invocations[0].bytes(FILE_CONTENTS_KEY), Some(&b"uploaded body"[..]));
        assert_eq!(invocations[0].text(PATHNAME_KEY), Some("up.txt"));
    }

    #[tokio::test]
    async fn transfer_without_negotiation_yields_425() {
        let nlst = Nlst::new();
        let (mut session, replies) = test_session();

        nlst.handle(&Command::new("NLST", vec![]), &mut session).await.unwrap();

        let sent = replies_of(&replies);
        assert_eq!(sent[0].code(), 150);
        assert_eq!(sent[1].code(), 425);
    }

    #[tokio::test]
    async fn listing_lines_are_joined_with_crlf() {
        let list = List::new();
        list.set_listing(vec!["-rw-r--r-- 1 x 12 a.txt".to_string(), "drwxr-xr-x 1 x 0 sub".to_string()]);
        let (mut session, _replies) = test_session();
        let port = session.switch_to_passive().await.unwrap();

        let client = tokio::spawn(async move {
            let mut conn = TcpStream::connect(("127.0.0.1", port)).await.unwrap();
            let mut body = String::new();
            conn.read_to_string(&mut body).await.unwrap();
            body
        });

        list.handle(&Command::new("LIST", vec![]), &mut session).await.unwrap();

        assert_eq!(client.await.unwrap(), "-rw-r--r-- 1 x 12 a.txt\r\ndrwxr-xr-x 1 x 0 sub\r\n");
    }
}
