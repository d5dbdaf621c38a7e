//! The RFC 959 Passive (`PASV`) command.
//
// This command requests the server to "listen" on a data port and to wait
// for a connection rather than initiate one upon receipt of a transfer
// command. The response carries the host and port the server is listening
// on, as a comma-separated byte tuple; that encoding is IPv4-only.

use super::FakeEnv;
use crate::messages::keys;
use crate::server::controlchan::{Command, CommandHandler, ControlChanError, ReplyCode};
use crate::server::host_port;
use crate::server::session::Session;

use async_trait::async_trait;
use std::net::IpAddr;
use std::sync::Arc;

#[derive(Debug)]
pub struct Pasv {
    env: Arc<FakeEnv>,
}

impl Pasv {
    pub(crate) fn new(env: Arc<FakeEnv>) -> Self {
        Pasv { env }
    }
}

#[async_trait]
impl CommandHandler for Pasv {
    #[tracing_attributes::instrument]
    async fn handle(&self, _command: &Command, session: &mut Session) -> Result<(), ControlChanError> {
        if let Err(e) = self.env.require_login(session) {
            return self.env.fail(session, e).await;
        }
        let host = match session.server_host() {
            IpAddr::V4(host) => host,
            IpAddr::V6(_) => {
                let text = self.env.text(keys::PASV_ONLY_IPV4, &[]);
                return session.send_reply(ReplyCode::CantOpenDataConnection, text).await;
            }
        };
        match session.switch_to_passive().await {
            Ok(port) => {
                let text = self.env.text(keys::PASV_OK, &[&host_port::format_legacy(host, port)]);
                session.send_reply(ReplyCode::EnteringPassiveMode, text).await
            }
            Err(e) => {
                slog::warn!(session.logger, "Could not allocate a passive port: {}", e);
                let text = self.env.text(keys::DATA_CANT_OPEN, &[]);
                session.send_reply(ReplyCode::CantOpenDataConnection, text).await
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::server::datachan::DataConnMode;
    use crate::server::testutil::{fake_env, login, replies_of, test_session};
    use pretty_assertions::assert_eq;

    #[tokio::test]
    async fn pasv_switches_to_passive_and_advertises() {
        let pasv = Pasv::new(fake_env());
        let (mut session, replies) = test_session();
        login(&mut session, "alice");

        pasv.handle(&Command::new("PASV", vec![]), &mut session).await.unwrap();

        let sent = replies_of(&replies);
        assert_eq!(sent[0].code(), 227);
        assert!(sent[0].text().starts_with("Entering Passive Mode (127,0,0,1,"));
        assert!(matches!(session.data_mode(), Some(DataConnMode::Passive(_))));
    }

    #[tokio::test]
    async fn pasv_requires_login() {
        let pasv = Pasv::new(fake_env());
        let (mut session, replies) = test_session();

        pasv.handle(&Command::new("PASV", vec![]), &mut session).await.unwrap();

        assert_eq!(replies_of(&replies)[0].code(), 530);
        assert!(session.data_mode().is_none());
    }
}
