//! The RFC 959 Store (`STOR`) command.

use super::{FakeEnv, FakeError, required_parameter};
use crate::messages::keys;
use crate::server::controlchan::{Command, CommandHandler, ControlChanError, ReplyCode};
use crate::server::session::Session;

use async_trait::async_trait;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Debug)]
pub struct Stor {
    env: Arc<FakeEnv>,
}

impl Stor {
    pub(crate) fn new(env: Arc<FakeEnv>) -> Self {
        Stor { env }
    }

    fn check(&self, command: &Command, session: &Session) -> Result<PathBuf, FakeError> {
        self.env.require_login(session)?;
        let argument = required_parameter(command, 0)?;
        let path = self.env.resolve(session, argument);
        if self.env.fs.exists(&path) {
            // Overwriting needs write permission on the file itself.
            if self.env.fs.is_directory(&path) {
                return Err(FakeError::IsADirectory(path));
            }
            if !self.env.fs.can_write(&path, session.principal()) {
                return Err(FakeError::CannotWrite(path));
            }
        } else {
            self.env.require_writable_parent(&path, session.principal())?;
        }
        Ok(path)
    }
}

#[async_trait]
impl CommandHandler for Stor {
    #[tracing_attributes::instrument]
    async fn handle(&self, command: &Command, session: &mut Session) -> Result<(), ControlChanError> {
        let path = match self.check(command, session) {
            Ok(path) => path,
            Err(e) => return self.env.fail(session, e).await,
        };

        session
            .send_reply(ReplyCode::FileStatusOkay, self.env.text(keys::DATA_OPENING, &[]))
            .await?;
        if let Err(e) = session.open_data_connection().await {
            slog::warn!(session.logger, "Could not open data connection: {}", e);
            return session
                .send_reply(ReplyCode::CantOpenDataConnection, self.env.text(keys::DATA_CANT_OPEN, &[]))
                .await;
        }

        let outcome = session.read_data().await;
        session.close_data_connection().await;
        let bytes = match outcome {
            Ok(bytes) => bytes,
            Err(e) => {
                slog::warn!(session.logger, "Data transfer failed: {}", e);
                return session
                    .send_reply(ReplyCode::ConnectionClosed, self.env.text(keys::DATA_ABORTED, &[]))
                    .await;
            }
        };

        if let Err(e) = self.env.fs.write_file(&path, &bytes) {
            return self.env.fail(session, FakeError::from(e)).await;
        }
        session
            .send_reply(ReplyCode::ClosingDataConnection, self.env.text(keys::DATA_DONE, &[]))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::{InMemoryFs, Permissions, VirtualFileSystem};
    use crate::server::testutil::{fake_env_with, login, replies_of, test_session};
    use pretty_assertions::assert_eq;
    use std::path::Path;
    use tokio::io::AsyncWriteExt;
    use tokio::net::TcpStream;

    #[tokio::test]
    async fn stor_writes_the_upload_into_the_filesystem() {
        let fs = Arc::new(InMemoryFs::new());
        fs.add_directory("/incoming").unwrap();
        let stor = Stor::new(fake_env_with(fs.clone()));
        let (mut session, replies) = test_session();
        login(&mut session, "alice");
        session.cwd = PathBuf::from("/incoming");
        let port = session.switch_to_passive().await.unwrap();

        let client = tokio::spawn(async move {
            let mut conn = TcpStream::connect(("127.0.0.1", port)).await.unwrap();
            conn.write_all(b"fresh upload").await.unwrap();
            conn.shutdown().await.unwrap();
        });

        stor.handle(&Command::new("STOR", vec!["new.txt".to_string()]), &mut session)
            .await
            .unwrap();
        client.await.unwrap();

        assert_eq!(fs.read_file(Path::new("/incoming/new.txt")).unwrap(), b"fresh upload");
        let sent = replies_of(&replies);
        assert_eq!(sent[0].code(), 150);
        assert_eq!(sent[1].code(), 226);
    }

    #[tokio::test]
    async fn stor_needs_write_permission_on_the_parent() {
        let fs = Arc::new(InMemoryFs::new());
        fs.add_directory("/readonly").unwrap();
        fs.set_permissions("/readonly", Permissions::READ_ONLY).unwrap();
        let stor = Stor::new(fake_env_with(fs));
        let (mut session, replies) = test_session();
        login(&mut session, "alice");

        stor.handle(&Command::new("STOR", vec!["/readonly/f.txt".to_string()]), &mut session)
            .await
            .unwrap();

        let sent = replies_of(&replies);
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].code(), 550);
        assert!(sent[0].text().contains("write permission"));
    }
}
