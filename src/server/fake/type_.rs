//! The RFC 959 Representation Type (`TYPE`) command.
//
// Text format conversion is out of scope: whatever the client asks for, the
// fake is always in binary mode.

use super::FakeEnv;
use crate::messages::keys;
use crate::server::controlchan::{Command, CommandHandler, ControlChanError, ReplyCode};
use crate::server::session::Session;

use async_trait::async_trait;
use std::sync::Arc;

#[derive(Debug)]
pub struct Type {
    env: Arc<FakeEnv>,
}

impl Type {
    pub(crate) fn new(env: Arc<FakeEnv>) -> Self {
        Type { env }
    }
}

#[async_trait]
impl CommandHandler for Type {
    #[tracing_attributes::instrument]
    async fn handle(&self, _command: &Command, session: &mut Session) -> Result<(), ControlChanError> {
        if let Err(e) = self.env.require_login(session) {
            return self.env.fail(session, e).await;
        }
        session.send_reply(ReplyCode::CommandOkay, self.env.text(keys::TYPE_OK, &[])).await
    }
}
