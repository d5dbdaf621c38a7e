//! The RFC 959 Password (`PASS`) command.
//
// Second half of the login sequence. USER must have preceded it; the
// username/password pair is checked against the account table and a
// successful login lands the session in the account's home directory.

use super::{FakeEnv, FakeError, required_parameter};
use crate::messages::keys;
use crate::server::controlchan::{Command, CommandHandler, ControlChanError, ReplyCode};
use crate::server::session::Session;

use async_trait::async_trait;
use std::sync::Arc;

#[derive(Debug)]
pub struct Pass {
    env: Arc<FakeEnv>,
}

impl Pass {
    pub(crate) fn new(env: Arc<FakeEnv>) -> Self {
        Pass { env }
    }
}

#[async_trait]
impl CommandHandler for Pass {
    #[tracing_attributes::instrument]
    async fn handle(&self, command: &Command, session: &mut Session) -> Result<(), ControlChanError> {
        let username = match &session.username {
            Some(username) => username.clone(),
            None => {
                return self.env.fail(session, FakeError::BadSequence("send USER before PASS")).await;
            }
        };
        let password = match required_parameter(command, 0) {
            Ok(password) => password,
            Err(e) => return self.env.fail(session, e).await,
        };

        let home = match self.env.accounts.get(&username) {
            Some(account) if account.password == password => account.home.clone(),
            _ => {
                slog::info!(session.logger, "Login failed"; "username" => %username);
                return session
                    .send_reply(ReplyCode::NotLoggedIn, self.env.text(keys::LOGIN_FAILED, &[]))
                    .await;
            }
        };

        session.authenticated = true;
        session.cwd = home;
        slog::info!(session.logger, "Login successful"; "username" => %username);
        session.send_reply(ReplyCode::UserLoggedIn, self.env.text(keys::LOGIN_OK, &[])).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::server::fake::Account;
    use crate::server::testutil::{fake_env, replies_of, test_session};
    use pretty_assertions::assert_eq;
    use std::path::PathBuf;

    #[tokio::test]
    async fn pass_without_user_is_a_sequence_error() {
        let pass = Pass::new(fake_env());
        let (mut session, replies) = test_session();

        pass.handle(&Command::new("PASS", vec!["secret".to_string()]), &mut session)
            .await
            .unwrap();

        assert_eq!(replies_of(&replies)[0].code(), 503);
        assert!(!session.authenticated);
    }

    #[tokio::test]
    async fn wrong_password_is_530() {
        let env = fake_env();
        env.accounts.insert(
            "alice".to_string(),
            Account {
                password: "secret".to_string(),
                home: PathBuf::from("/home/alice"),
            },
        );
        let pass = Pass::new(env);
        let (mut session, replies) = test_session();
        session.username = Some("alice".to_string());

        pass.handle(&Command::new("PASS", vec!["wrong".to_string()]), &mut session)
            .await
            .unwrap();

        assert_eq!(replies_of(&replies)[0].code(), 530);
        assert!(!session.authenticated);
    }

    #[tokio::test]
    async fn successful_login_lands_in_the_home_directory() {
        let env = fake_env();
        env.accounts.insert(
            "alice".to_string(),
            Account {
                password: "secret".to_string(),
                home: PathBuf::from("/home/alice"),
            },
        );
        let pass = Pass::new(env);
        let (mut session, replies) = test_session();
        session.username = Some("alice".to_string());

        pass.handle(&Command::new("PASS", vec!["secret".to_string()]), &mut session)
            .await
            .unwrap();

        assert_eq!(replies_of(&replies)[0].code(), 230);
        assert!(session.authenticated);
        assert_eq!(session.cwd, PathBuf::from("/home/alice"));
    }
}
