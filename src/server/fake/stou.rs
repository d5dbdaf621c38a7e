//! The RFC 959 Store Unique (`STOU`) command.
//
// Like STOR, but the server picks a name guaranteed not to collide in the
// current directory and reports it in the final reply.

use super::{FakeEnv, FakeError};
use crate::messages::keys;
use crate::server::controlchan::{Command, CommandHandler, ControlChanError, ReplyCode};
use crate::server::session::Session;

use async_trait::async_trait;
use std::path::PathBuf;
use std::sync::Arc;
use uuid::Uuid;

#[derive(Debug)]
pub struct Stou {
    env: Arc<FakeEnv>,
}

impl Stou {
    pub(crate) fn new(env: Arc<FakeEnv>) -> Self {
        Stou { env }
    }

    fn check(&self, session: &Session) -> Result<PathBuf, FakeError> {
        self.env.require_login(session)?;
        let name = format!("stou-{}.tmp", Uuid::new_v4().simple());
        let path = session.cwd.join(name);
        self.env.require_writable_parent(&path, session.principal())?;
        Ok(path)
    }
}

#[async_trait]
impl CommandHandler for Stou {
    #[tracing_attributes::instrument]
    async fn handle(&self, _command: &Command, session: &mut Session) -> Result<(), ControlChanError> {
        let path = match self.check(session) {
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
        let name = path.file_name().map(|n| n.to_string_lossy().into_owned()).unwrap_or_default();
        session
            .send_reply(ReplyCode::ClosingDataConnection, self.env.text(keys::STOU_OK, &[&name]))
            .await
    }
}
