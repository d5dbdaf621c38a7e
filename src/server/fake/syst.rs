//! The RFC 959 System (`SYST`) command.
//
// This response is kind of like the User-Agent in http: very much mis-used
// to gauge the capabilities of the other peer, which is exactly why a
// simulated server wants it configurable.

use super::FakeEnv;
use crate::messages::keys;
use crate::server::controlchan::{Command, CommandHandler, ControlChanError, ReplyCode};
use crate::server::session::Session;

use async_trait::async_trait;
use std::sync::Arc;

#[derive(Debug)]
pub struct Syst {
    env: Arc<FakeEnv>,
}

impl Syst {
    pub(crate) fn new(env: Arc<FakeEnv>) -> Self {
        Syst { env }
    }
}

#[async_trait]
impl CommandHandler for Syst {
    #[tracing_attributes::instrument]
    async fn handle(&self, _command: &Command, session: &mut Session) -> Result<(), ControlChanError> {
        if let Err(e) = self.env.require_login(session) {
            return self.env.fail(session, e).await;
        }
        let text = self.env.text(keys::SYST_OK, &[&self.env.system_name()]);
        session.send_reply(ReplyCode::SystemType, text).await
    }
}
