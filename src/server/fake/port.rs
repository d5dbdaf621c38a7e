//! The RFC 959 Data Port (`PORT`) command.
//
// The argument is the concatenation of a 32-bit internet host address and a
// 16-bit TCP port address, broken into 8-bit fields transmitted as decimal
// numbers: PORT h1,h2,h3,h4,p1,p2.

use super::{FakeEnv, FakeError};
use crate::messages::keys;
use crate::server::controlchan::{Command, CommandHandler, ControlChanError, ReplyCode};
use crate::server::host_port::{self, HostAndPort};
use crate::server::session::Session;

use async_trait::async_trait;
use std::sync::Arc;

#[derive(Debug)]
pub struct Port {
    env: Arc<FakeEnv>,
}

impl Port {
    pub(crate) fn new(env: Arc<FakeEnv>) -> Self {
        Port { env }
    }

    fn check(&self, command: &Command, session: &Session) -> Result<HostAndPort, FakeError> {
        self.env.require_login(session)?;
        host_port::parse_legacy(command.parameters()).map_err(|e| FakeError::InvalidParameter(e.to_string()))
    }
}

#[async_trait]
impl CommandHandler for Port {
    #[tracing_attributes::instrument]
    async fn handle(&self, command: &Command, session: &mut Session) -> Result<(), ControlChanError> {
        let host_port = match self.check(command, session) {
            Ok(host_port) => host_port,
            Err(e) => return self.env.fail(session, e).await,
        };
        session.set_active_mode(host_port);
        session.send_reply(ReplyCode::CommandOkay, self.env.text(keys::PORT_OK, &[])).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::server::datachan::DataConnMode;
    use crate::server::testutil::{fake_env, login, replies_of, test_session};
    use pretty_assertions::assert_eq;
    use std::net::Ipv4Addr;

    #[tokio::test]
    async fn port_stores_the_client_address() {
        let port = Port::new(fake_env());
        let (mut session, replies) = test_session();
        login(&mut session, "alice");
        let parameters = ["11", "22", "33", "44", "1", "206"].map(String::from).to_vec();

        port.handle(&Command::new("PORT", parameters), &mut session).await.unwrap();

        assert_eq!(replies_of(&replies)[0].code(), 200);
        match session.data_mode() {
            Some(DataConnMode::Active(hp)) => {
                assert_eq!(*hp, HostAndPort::new(Ipv4Addr::new(11, 22, 33, 44), 462));
            }
            other => panic!("unexpected mode: {:?}", other),
        }
    }

    #[tokio::test]
    async fn malformed_port_is_501() {
        let port = Port::new(fake_env());
        let (mut session, replies) = test_session();
        login(&mut session, "alice");

        port.handle(&Command::new("PORT", vec!["1".to_string()]), &mut session)
            .await
            .unwrap();

        assert_eq!(replies_of(&replies)[0].code(), 501);
        assert!(session.data_mode().is_none());
    }
}
