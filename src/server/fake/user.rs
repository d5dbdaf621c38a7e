//! The RFC 959 User Name (`USER`) command.
//
// First half of the login sequence: the username is only recorded here,
// judged by PASS.

use super::{FakeEnv, required_parameter};
use crate::messages::keys;
use crate::server::controlchan::{Command, CommandHandler, ControlChanError, ReplyCode};
use crate::server::session::Session;

use async_trait::async_trait;
use std::sync::Arc;

#[derive(Debug)]
pub struct User {
    env: Arc<FakeEnv>,
}

impl User {
    pub(crate) fn new(env: Arc<FakeEnv>) -> Self {
        User { env }
    }
}

#[async_trait]
impl CommandHandler for User {
    #[tracing_attributes::instrument]
    async fn handle(&self, command: &Command, session: &mut Session) -> Result<(), ControlChanError> {
        let username = match required_parameter(command, 0) {
            Ok(username) => username,
            Err(e) => return self.env.fail(session, e).await,
        };
        session.username = Some(username.to_string());
        session.authenticated = false;
        session
            .send_reply(ReplyCode::NeedPassword, self.env.text(keys::LOGIN_NEED_PASSWORD, &[]))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::server::testutil::{fake_env, replies_of, test_session};
    use pretty_assertions::assert_eq;

    #[tokio::test]
    async fn user_stores_the_name_and_asks_for_a_password() {
        let user = User::new(fake_env());
        let (mut session, replies) = test_session();

        user.handle(&Command::new("USER", vec!["alice".to_string()]), &mut session)
            .await
            .unwrap();

        assert_eq!(session.username.as_deref(), Some("alice"));
        assert!(!session.authenticated);
        assert_eq!(replies_of(&replies)[0].code(), 331);
    }

    #[tokio::test]
    async fn user_without_a_name_is_a_syntax_error() {
        let user = User::new(fake_env());
        let (mut session, replies) = test_session();

        user.handle(&Command::new("USER", vec![]), &mut session).await.unwrap();

        assert_eq!(replies_of(&replies)[0].code(), 501);
        assert_eq!(session.username, None);
    }
}
