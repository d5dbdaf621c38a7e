//! The RFC 959 Name List (`NLST`) command.
//
// The preliminary reply goes out before the path is even resolved, so the
// client's data connection is already primed. A missing or empty listing
// target yields an empty listing, never an error; only a readable-but-
// forbidden target does.

use super::{FakeEnv, FakeError};
use crate::messages::keys;
use crate::server::controlchan::{Command, CommandHandler, ControlChanError, ReplyCode};
use crate::server::session::Session;

use async_trait::async_trait;
use std::sync::Arc;

const END_OF_LINE: &str = "\r\n";

#[derive(Debug)]
pub struct Nlst {
    env: Arc<FakeEnv>,
}

impl Nlst {
    pub(crate) fn new(env: Arc<FakeEnv>) -> Self {
        Nlst { env }
    }
}

#[async_trait]
impl CommandHandler for Nlst {
    #[tracing_attributes::instrument]
    async fn handle(&self, command: &Command, session: &mut Session) -> Result<(), ControlChanError> {
        if let Err(e) = self.env.require_login(session) {
            return self.env.fail(session, e).await;
        }
        session
            .send_reply(ReplyCode::FileStatusOkay, self.env.text(keys::DATA_OPENING, &[]))
            .await?;

        let path = match command.parameter(0) {
            Some(argument) => self.env.resolve(session, argument),
            None => session.cwd.clone(),
        };
        if self.env.fs.exists(&path) && !self.env.fs.can_read(&path, session.principal()) {
            return self.env.fail(session, FakeError::CannotRead(path)).await;
        }

        let names = self.env.fs.list_names(&path);
        let mut body = names.join(END_OF_LINE);
        if !body.is_empty() {
            body.push_str(END_OF_LINE);
        }

        if let Err(e) = session.open_data_connection().await {
            slog::warn!(session.logger, "Could not open data connection: {}", e);
            return session
                .send_reply(ReplyCode::CantOpenDataConnection, self.env.text(keys::DATA_CANT_OPEN, &[]))
                .await;
        }
        let outcome = session.send_data(body.as_bytes()).await;
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
