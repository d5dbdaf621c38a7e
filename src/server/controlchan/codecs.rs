//! Codec for framing the control channel into commands and replies.

use super::command::Command;
use super::error::ControlChanError;
use super::reply::{Reply, ReplyChannel};

use async_trait::async_trait;
use bytes::BytesMut;
use futures_util::SinkExt;
use futures_util::stream::SplitSink;
use std::fmt;
use tokio::net::TcpStream;
use tokio_util::codec::{Decoder, Encoder, Framed};

/// `FtpCodec` implements tokio's `Decoder` and `Encoder` traits for the
/// control channel: incoming bytes are split on newlines and parsed into
/// [`Command`] values, outgoing [`Reply`] values are rendered as
/// `NNN text\r\n` lines.
#[derive(Debug)]
pub struct FtpCodec {
    // Stored index of the next index to examine for a '\n' character. This
    // avoids re-scanning bytes that arrived in an earlier, incomplete read.
    next_index: usize,
}

impl FtpCodec {
    pub fn new() -> Self {
        FtpCodec { next_index: 0 }
    }
}

impl Default for FtpCodec {
    fn default() -> Self {
        FtpCodec::new()
    }
}

impl Decoder for FtpCodec {
    type Item = Command;
    type Error = ControlChanError;

    fn decode(&mut self, buf: &mut BytesMut) -> Result<Option<Command>, Self::Error> {
        if let Some(newline_offset) = buf[self.next_index..].iter().position(|b| *b == b'\n') {
            let newline_index = newline_offset + self.next_index;
            let line = buf.split_to(newline_index + 1);
            self.next_index = 0;
            Ok(Some(Command::parse(&line)?))
        } else {
            self.next_index = buf.len();
            Ok(None)
        }
    }
}

impl Encoder<Reply> for FtpCodec {
    type Error = ControlChanError;

    fn encode(&mut self, reply: Reply, buf: &mut BytesMut) -> Result<(), Self::Error> {
        buf.extend_from_slice(format!("{}\r\n", reply).as_bytes());
        Ok(())
    }
}

/// The production [`ReplyChannel`]: the write half of a framed control
/// connection.
pub struct FramedReplyChannel {
    sink: SplitSink<Framed<TcpStream, FtpCodec>, Reply>,
}

impl FramedReplyChannel {
    pub fn new(sink: SplitSink<Framed<TcpStream, FtpCodec>, Reply>) -> Self {
        FramedReplyChannel { sink }
    }
}

impl fmt::Debug for FramedReplyChannel {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("FramedReplyChannel")
    }
}

#[async_trait]
impl ReplyChannel for FramedReplyChannel {
    async fn send(&mut self, reply: Reply) -> Result<(), ControlChanError> {
        self.sink.send(reply).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::server::controlchan::error::ParseError;
    use crate::server::controlchan::reply::ReplyCode;
    use pretty_assertions::assert_eq;

    #[test]
    fn decode_waits_for_a_full_line() {
        let mut codec = FtpCodec::new();
        let mut buf = BytesMut::from(&b"CWD do"[..]);
        assert!(codec.decode(&mut buf).unwrap().is_none());
        buf.extend_from_slice(b"cs\r\nNOOP\r\n");
        let cmd = codec.decode(&mut buf).unwrap().unwrap();
        assert_eq!(cmd.name(), "CWD");
        assert_eq!(cmd.parameter(0), Some("docs"));
        let cmd = codec.decode(&mut buf).unwrap().unwrap();
        assert_eq!(cmd.name(), "NOOP");
    }

    #[test]
    fn decode_empty_line_is_a_parse_error() {
        let mut codec = FtpCodec::new();
        let mut buf = BytesMut::from(&b"\r\n"[..]);
        match codec.decode(&mut buf) {
            Err(ControlChanError::Parse(ParseError::EmptyLine)) => {}
            other => panic!("unexpected decode outcome: {:?}", other),
        }
    }

    #[test]
    fn encode_terminates_with_crlf() {
        let mut codec = FtpCodec::new();
        let mut buf = BytesMut::new();
        codec.encode(Reply::new(ReplyCode::CommandOkay, "Okay"), &mut buf).unwrap();
        assert_eq!(&buf[..], b"200 Okay\r\n");
    }
}
