//! The RFC 959 Delete (`DELE`) command.

use super::{FakeEnv, FakeError, required_parameter};
use crate::messages::keys;
use crate::server::controlchan::{Command, CommandHandler, ControlChanError, ReplyCode};
use crate::server::session::Session;

use async_trait::async_trait;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Debug)]
pub struct Dele {
    env: Arc<FakeEnv>,
}

impl Dele {
    pub(crate) fn new(env: Arc<FakeEnv>) -> Self {
        Dele { env }
    }

    fn check(&self, command: &Command, session: &Session) -> Result<PathBuf, FakeError> {
        self.env.require_login(session)?;
        let argument = required_parameter(command, 0)?;
        let path = self.env.resolve(session, argument);
        self.env.require_file(&path)?;
        self.env.require_writable_parent(&path, session.principal())?;
        Ok(path)
    }
}

#[async_trait]
impl CommandHandler for Dele {
    #[tracing_attributes::instrument]
    async fn handle(&self, command: &Command, session: &mut Session) -> Result<(), ControlChanError> {
        let outcome = self
            .check(command, session)
            .and_then(|path| self.env.fs.remove_file(&path).map(|_| path).map_err(FakeError::from));
        match outcome {
            Ok(path) => {
                let text = self.env.text(keys::DELE_OK, &[&path.display().to_string()]);
                session.send_reply(ReplyCode::FileActionOkay, text).await
            }
            Err(e) => self.env.fail(session, e).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::{InMemoryFs, VirtualFileSystem};
    use crate::server::testutil::{fake_env_with, login, replies_of, test_session};
    use pretty_assertions::assert_eq;
    use std::path::Path;

    #[tokio::test]
    async fn dele_removes_a_file() {
        let fs = Arc::new(InMemoryFs::new());
        fs.add_file("/data/old.txt", "x").unwrap();
        let dele = Dele::new(fake_env_with(fs.clone()));
        let (mut session, replies) = test_session();
        login(&mut session, "alice");

        dele.handle(&Command::new("DELE", vec!["/data/old.txt".to_string()]), &mut session)
            .await
            .unwrap();

        assert!(!fs.exists(Path::new("/data/old.txt")));
        assert_eq!(replies_of(&replies)[0].code(), 250);
    }

    #[tokio::test]
    async fn dele_refuses_directories() {
        let fs = Arc::new(InMemoryFs::new());
        fs.add_directory("/data").unwrap();
        let dele = Dele::new(fake_env_with(fs.clone()));
        let (mut session, replies) = test_session();
        login(&mut session, "alice");

        dele.handle(&Command::new("DELE", vec!["/data".to_string()]), &mut session)
            .await
            .unwrap();

        let sent = replies_of(&replies);
        assert_eq!(sent[0].code(), 550);
        assert!(sent[0].text().contains("is a directory"));
        assert!(fs.exists(Path::new("/data")));
    }
}
