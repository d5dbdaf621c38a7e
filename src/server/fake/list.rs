//! The RFC 959 List (`LIST`) command.
//
// Same shape as NLST, but each entry goes out as a Unix-ls-style line with
// permissions, owner, size and modification time. A file target lists
// itself.

use super::{FakeEnv, FakeError};
use crate::fs::EntryMetadata;
use crate::messages::keys;
use crate::server::controlchan::{Command, CommandHandler, ControlChanError, ReplyCode};
use crate::server::session::Session;

use async_trait::async_trait;
use std::path::Path;
use std::sync::Arc;

const END_OF_LINE: &str = "\r\n";

#[derive(Debug)]
pub struct List {
    env: Arc<FakeEnv>,
}

impl List {
    pub(crate) fn new(env: Arc<FakeEnv>) -> Self {
        List { env }
    }

    fn render(&self, path: &Path) -> String {
        let mut lines: Vec<String> = Vec::new();
        if self.env.fs.is_file(path) {
            if let (Some(name), Some(meta)) = (path.file_name(), self.env.fs.metadata(path)) {
                lines.push(format_entry(&name.to_string_lossy(), &meta));
            }
        } else {
            for name in self.env.fs.list_names(path) {
                if let Some(meta) = self.env.fs.metadata(&path.join(&name)) {
                    lines.push(format_entry(&name, &meta));
                }
            }
        }
        let mut body = lines.join(END_OF_LINE);
        if !body.is_empty() {
            body.push_str(END_OF_LINE);
        }
        body
    }
}

fn format_entry(name: &str, meta: &EntryMetadata) -> String {
    let kind = if meta.is_directory { 'd' } else { '-' };
    let owner = meta.owner.as_deref().unwrap_or("none");
    format!(
        "{}{}  1 {} {:>12} {} {}",
        kind,
        meta.permissions.symbolic(),
        owner,
        meta.size,
        meta.modified.format("%b %e %H:%M"),
        name,
    )
}

#[async_trait]
impl CommandHandler for List {
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

        let body = self.render(&path);

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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::{InMemoryFs, Permissions};
    use crate::server::testutil::{fake_env_with, login, test_session};
    use chrono::Utc;
    use pretty_assertions::assert_eq;
    use tokio::io::AsyncReadExt;
    use tokio::net::TcpStream;

    #[test]
    fn entry_lines_carry_kind_permissions_owner_and_size() {
        let meta = EntryMetadata {
            is_directory: false,
            size: 1234,
            modified: Utc::now(),
            permissions: Permissions::READ_ONLY,
            owner: Some("alice".to_string()),
        };
        let line = format_entry("report.txt", &meta);
        assert!(line.starts_with("-r-x"));
        assert!(line.contains("alice"));
        assert!(line.contains("1234"));
        assert!(line.ends_with("report.txt"));
    }

    #[tokio::test]
    async fn list_writes_one_line_per_entry() {
        let fs = Arc::new(InMemoryFs::new());
        fs.add_file("/docs/a.txt", "aaaa").unwrap();
        fs.add_directory("/docs/sub").unwrap();
        let list = List::new(fake_env_with(fs));
        let (mut session, _replies) = test_session();
        login(&mut session, "alice");
        let port = session.switch_to_passive().await.unwrap();

        let client = tokio::spawn(async move {
            let mut conn = TcpStream::connect(("127.0.0.1", port)).await.unwrap();
            let mut body = String::new();
            conn.read_to_string(&mut body).await.unwrap();
            body
        });

        list.handle(&Command::new("LIST", vec!["/docs".to_string()]), &mut session)
            .await
            .unwrap();

        let body = client.await.unwrap();
        let lines: Vec<&str> = body.trim_end().split("\r\n").collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with('-'));
        assert!(lines[0].ends_with("a.txt"));
        assert!(lines[1].starts_with('d'));
        assert!(lines[1].ends_with("sub"));
    }
}
