//! The RFC 959 Retrieve (`RETR`) command.
//
// All preconditions are judged before the preliminary reply; the data
// connection, once opened, is closed on every exit path before the final
// control reply goes out.

use super::{FakeEnv, FakeError, required_parameter};
use crate::messages::keys;
use crate::server::controlchan::{Command, CommandHandler, ControlChanError, ReplyCode};
use crate::server::session::Session;

use async_trait::async_trait;
use std::sync::Arc;

#[derive(Debug)]
pub struct Retr {
    env: Arc<FakeEnv>,
}

impl Retr {
    pub(crate) fn new(env: Arc<FakeEnv>) -> Self {
        Retr { env }
    }

    fn check(&self, command: &Command, session: &Session) -> Result<Vec<u8>, FakeError> {
        self.env.require_login(session)?;
        let argument = required_parameter(command, 0)?;
        let path = self.env.resolve(session, argument);
        self.env.require_file(&path)?;
        self.env.require_read(&path, session.principal())?;
        Ok(self.env.fs.read_file(&path)?)
    }
}

#[async_trait]
impl CommandHandler for Retr {
    #[tracing_attributes::instrument]
    async fn handle(&self, command: &Command, session: &mut Session) -> Result<(), ControlChanError> {
        let content = match self.check(command, session) {
            Ok(content) => content,
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

        let outcome = session.send_data(&content).await;
        session.close_data_connection().await;
        match outcome {
            Ok(()) => {
                session
                    .send_reply(ReplyCode::ClosingDataConnection, self.env.text(keys::DATA_DONE, &[]))
                    .await
            }
            Err(e) => {
                slog::warn!(session.logger, "Data transfer failed: {}", e);
                session
                    .send_reply(ReplyCode::ConnectionClosed, self.env.text(keys::DATA_ABORTED, &[]))
                    .await
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::{InMemoryFs, Permissions};
    use crate::server::testutil::{fake_env_with, login, replies_of, test_session};
    use pretty_assertions::assert_eq;
    use tokio::io::AsyncReadExt;
    use tokio::net::TcpStream;

    #[tokio::test]
    async fn retr_sends_the_file_over_the_data_connection() {
        let fs = Arc::new(InMemoryFs::new());
        fs.add_file("/pub/report.txt", "quarterly numbers").unwrap();
        let retr = Retr::new(fake_env_with(fs));
        let (mut session, replies) = test_session();
        login(&mut session, "alice");
        let port = session.switch_to_passive().await.unwrap();

        let client = tokio::spawn(async move {
            let mut conn = TcpStream::connect(("127.0.0.1", port)).await.unwrap();
            let mut body = Vec::new();
            conn.read_to_end(&mut body).await.unwrap();
            body
        });

        retr.handle(&Command::new("RETR", vec!["/pub/report.txt".to_string()]), &mut session)
            .await
            .unwrap();

        assert_eq!(client.await.unwrap(), b"quarterly numbers");
        let sent = replies_of(&replies);
        assert_eq!(sent[0].code(), 150);
        assert_eq!(sent[1].code(), 226);
    }

    #[tokio::test]
    async fn retr_refuses_unreadable_files_before_any_data_phase() {
        let fs = Arc::new(InMemoryFs::new());
        fs.add_file("/secret.txt", "classified").unwrap();
        fs.set_permissions("/secret.txt", Permissions::NONE).unwrap();
        let retr = Retr::new(fake_env_with(fs));
        let (mut session, replies) = test_session();
        login(&mut session, "alice");

        retr.handle(&Command::new("RETR", vec!["/secret.txt".to_string()]), &mut session)
            .await
            .unwrap();

        let sent = replies_of(&replies);
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].code(), 550);
        assert!(sent[0].text().contains("read permission"));
    }

    #[tokio::test]
    async fn retr_of_a_directory_is_550() {
        let fs = Arc::new(InMemoryFs::new());
        fs.add_directory("/pub").unwrap();
        let retr = Retr::new(fake_env_with(fs));
        let (mut session, replies) = test_session();
        login(&mut session, "alice");

        retr.handle(&Command::new("RETR", vec!["/pub".to_string()]), &mut session)
            .await
            .unwrap();

        let sent = replies_of(&replies);
        assert_eq!(sent[0].code(), 550);
        assert!(sent[0].text().contains("is a directory"));
    }
}
