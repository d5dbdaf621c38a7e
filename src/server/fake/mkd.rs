//! The RFC 959 Make Directory (`MKD`) command.

use super::{FakeEnv, FakeError, required_parameter};
use crate::messages::keys;
use crate::server::controlchan::{Command, CommandHandler, ControlChanError, ReplyCode};
use crate::server::session::Session;

use async_trait::async_trait;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Debug)]
pub struct Mkd {
    env: Arc<FakeEnv>,
}

impl Mkd {
    pub(crate) fn new(env: Arc<FakeEnv>) -> Self {
        Mkd { env }
    }

    fn check(&self, command: &Command, session: &Session) -> Result<PathBuf, FakeError> {
        self.env.require_login(session)?;
        let argument = required_parameter(command, 0)?;
        let path = self.env.resolve(session, argument);
        if self.env.fs.exists(&path) {
            return Err(FakeError::AlreadyExists(path));
        }
        self.env.require_writable_parent(&path, session.principal())?;
        Ok(path)
    }
}

#[async_trait]
impl CommandHandler for Mkd {
    #[tracing_attributes::instrument]
    async fn handle(&self, command: &Command, session: &mut Session) -> Result<(), ControlChanError> {
        let outcome = self
            .check(command, session)
            .and_then(|path| self.env.fs.make_directory(&path).map(|_| path).map_err(FakeError::from));
        match outcome {
            Ok(path) => {
                let text = self.env.text(keys::MKD_OK, &[&path.display().to_string()]);
                session.send_reply(ReplyCode::PathCreated, text).await
            }
            Err(e) => self.env.fail(session, e).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::{InMemoryFs, Permissions, VirtualFileSystem};
    use crate::server::testutil::{fake_env_with, login, replies_of, test_session};
    use pretty_assertions::assert_eq;
    use std::path::Path;

    #[tokio::test]
    async fn mkd_creates_inside_a_writable_parent() {
        let fs = Arc::new(InMemoryFs::new());
        fs.add_directory("/home").unwrap();
        let mkd = Mkd::new(fake_env_with(fs.clone()));
        let (mut session, replies) = test_session();
        login(&mut session, "alice");
        session.cwd = PathBuf::from("/home");

        mkd.handle(&Command::new("MKD", vec!["incoming".to_string()]), &mut session)
            .await
            .unwrap();

        assert!(fs.is_directory(Path::new("/home/incoming")));
        let sent = replies_of(&replies);
        assert_eq!(sent[0].code(), 257);
        assert!(sent[0].text().contains("/home/incoming"));
    }

    #[tokio::test]
    async fn mkd_rejects_existing_target_and_readonly_parent() {
        let fs = Arc::new(InMemoryFs::new());
        fs.add_directory("/home/taken").unwrap();
        fs.add_directory("/frozen").unwrap();
        fs.set_permissions("/frozen", Permissions::READ_ONLY).unwrap();
        let mkd = Mkd::new(fake_env_with(fs.clone()));
        let (mut session, replies) = test_session();
        login(&mut session, "alice");

        mkd.handle(&Command::new("MKD", vec!["/home/taken".to_string()]), &mut session)
            .await
            .unwrap();
        mkd.handle(&Command::new("MKD", vec!["/frozen/sub".to_string()]), &mut session)
            .await
            .unwrap();

        let sent = replies_of(&replies);
        assert_eq!(sent[0].code(), 550);
        assert!(sent[0].text().contains("already exists"));
        assert_eq!(sent[1].code(), 550);
        assert!(sent[1].text().contains("write permission"));
        assert!(!fs.exists(Path::new("/frozen/sub")));
    }
}
