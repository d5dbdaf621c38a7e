//! The RFC 2428 Extended Passive (`EPSV`) command.
//
// The response to this command includes only the TCP port number of the
// listening connection; the address is implicitly the one this control
// connection already runs over, which is what makes EPSV work for IPv6.

use super::FakeEnv;
use crate::messages::keys;
use crate::server::controlchan::{Command, CommandHandler, ControlChanError, ReplyCode};
use crate::server::host_port;
use crate::server::session::Session;

use async_trait::async_trait;
use std::sync::Arc;

#[derive(Debug)]
pub struct Epsv {
    env: Arc<FakeEnv>,
}

impl Epsv {
    pub(crate) fn new(env: Arc<FakeEnv>) -> Self {
        Epsv { env }
    }
}

#[async_trait]
impl CommandHandler for Epsv {
    #[tracing_attributes::instrument]
    async fn handle(&self, _command: &Command, session: &mut Session) -> Result<(), ControlChanError> {
        if let Err(e) = self.env.require_login(session) {
            return self.env.fail(session, e).await;
        }
        match session.switch_to_passive().await {
            Ok(port) => {
                let text = self.env.text(keys::EPSV_OK, &[&host_port::format_extended_port(port)]);
                session.send_reply(ReplyCode::EnteringExtendedPassiveMode, text).await
            }
            Err(e) => {
                slog::warn!(session.logger, "Could not allocate a passive port: {}", e);
                let text = self.env.text(keys::DATA_CANT_OPEN, &[]);
                session.send_reply(ReplyCode::CantOpenDataConnection, text).await
            }
        }
    }
}
