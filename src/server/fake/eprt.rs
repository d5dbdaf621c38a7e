//! The RFC 2428 Extended Port (`EPRT`) command.
//
// EPRT carries a delimited textual address so that IPv6 clients can
// advertise a data port; the delimiter is whatever character the parameter
// opens with.

use super::{FakeEnv, FakeError, required_parameter};
use crate::messages::keys;
use crate::server::controlchan::{Command, CommandHandler, ControlChanError, ReplyCode};
use crate::server::host_port::{self, HostAndPort};
use crate::server::session::Session;

use async_trait::async_trait;
use std::sync::Arc;

#[derive(Debug)]
pub struct Eprt {
    env: Arc<FakeEnv>,
}

impl Eprt {
    pub(crate) fn new(env: Arc<FakeEnv>) -> Self {
        Eprt { env }
    }

    fn check(&self, command: &Command, session: &Session) -> Result<HostAndPort, FakeError> {
        self.env.require_login(session)?;
        let parameter = required_parameter(command, 0)?;
        host_port::parse_extended(parameter).map_err(|e| FakeError::InvalidParameter(e.to_string()))
    }
}

#[async_trait]
impl CommandHandler for Eprt {
    #[tracing_attributes::instrument]
    async fn handle(&self, command: &Command, session: &mut Session) -> Result<(), ControlChanError> {
        let host_port = match self.check(command, session) {
            Ok(host_port) => host_port,
            Err(e) => return self.env.fail(session, e).await,
        };
        session.set_active_mode(host_port);
        session.send_reply(ReplyCode::CommandOkay, self.env.text(keys::EPRT_OK, &[])).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::server::datachan::DataConnMode;
    use crate::server::testutil::{fake_env, login, replies_of, test_session};
    use pretty_assertions::assert_eq;
    use std::net::IpAddr;

    #[tokio::test]
    async fn eprt_accepts_ipv6_addresses() {
        let eprt = Eprt::new(fake_env());
        let (mut session, replies) = test_session();
        login(&mut session, "alice");

        eprt.handle(
            &Command::new("EPRT", vec!["|2|1080::8:800:200C:417A|6275|".to_string()]),
            &mut session,
        )
        .await
        .unwrap();

        assert_eq!(replies_of(&replies)[0].code(), 200);
        match session.data_mode() {
            Some(DataConnMode::Active(hp)) => {
                assert_eq!(hp.host, "1080::8:800:200C:417A".parse::<IpAddr>().unwrap());
                assert_eq!(hp.port, 6275);
            }
            other => panic!("unexpected mode: {:?}", other),
        }
    }

    #[tokio::test]
    async fn eprt_without_parameter_is_501() {
        let eprt = Eprt::new(fake_env());
        let (mut session, replies) = test_session();
        login(&mut session, "alice");

        eprt.handle(&Command::new("EPRT", vec![]), &mut session).await.unwrap();

        assert_eq!(replies_of(&replies)[0].code(), 501);
    }
}
