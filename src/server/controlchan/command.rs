//! The parsed representation of a single control-connection line.

use super::error::ParseError;

use std::fmt;
use std::str;

/// An FTP command as it came in over the control connection: a verb name
/// plus zero or more positional string parameters.
///
/// A `Command` is constructed once per received line, handed to exactly one
/// handler invocation and then discarded. The verb name keeps the casing the
/// client sent; lookup in the dispatcher is case-normalized instead.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    name: String,
    parameters: Vec<String>,
}

impl Command {
    /// Creates a command from a verb name and its positional parameters.
    pub fn new<N>(name: N, parameters: Vec<String>) -> Self
    where
        N: Into<String>,
    {
        Command {
            name: name.into(),
            parameters,
        }
    }

    /// Parse the given raw line (CRLF terminator optional) into a [`Command`].
    ///
    /// The first whitespace-delimited token is the verb; the remainder is
    /// split on spaces and commas into positional parameters, so that
    /// `PORT h1,h2,h3,h4,p1,p2` yields exactly six parameters. Verbs the
    /// server does not know about still parse fine here; routing them is the
    /// dispatcher's concern.
    pub fn parse<T: AsRef<[u8]>>(line: T) -> Result<Command, ParseError> {
        let line = str::from_utf8(line.as_ref()).map_err(|_| ParseError::InvalidUtf8)?;
        let line = line.trim_end_matches(['\r', '\n']);

        let mut split = line.splitn(2, ' ');
        let name = match split.next() {
            Some(token) if !token.is_empty() => token,
            _ => return Err(ParseError::EmptyLine),
        };
        let parameters = split
            .next()
            .unwrap_or("")
            .split([' ', ','])
            .filter(|token| !token.is_empty())
            .map(String::from)
            .collect();

        Ok(Command::new(name, parameters))
    }

    /// The verb name as sent by the client.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// All positional parameters, in wire order.
    pub fn parameters(&self) -> &[String] {
        &self.parameters
    }

    /// The parameter at `index`, if the client supplied one.
    pub fn parameter(&self, index: usize) -> Option<&str> {
        self.parameters.get(index).map(String::as_str)
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if self.parameters.is_empty() {
            write!(f, "{}", self.name)
        } else {
            write!(f, "{} {}", self.name, self.parameters.join(" "))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn parse_bare_verb_crnl() {
        let cmd = Command::parse("SYST\r\n").unwrap();
        assert_eq!(cmd.name(), "SYST");
        assert!(cmd.parameters().is_empty());
    }

    #[test]
    // Not all clients include the (actually mandatory) '\r'
    fn parse_bare_verb_nl() {
        let cmd = Command::parse("NOOP\n").unwrap();
        assert_eq!(cmd.name(), "NOOP");
    }

    #[test]
    fn parse_keeps_client_casing() {
        let cmd = Command::parse("cwd docs\r\n").unwrap();
        assert_eq!(cmd.name(), "cwd");
        assert_eq!(cmd.parameter(0), Some("docs"));
    }

    #[test]
    fn parse_port_comma_separated_parameters() {
        let cmd = Command::parse("PORT 11,22,33,44,1,206\r\n").unwrap();
        assert_eq!(cmd.name(), "PORT");
        assert_eq!(cmd.parameters(), &["11", "22", "33", "44", "1", "206"]);
    }

    #[test]
    fn parse_eprt_delimited_parameter_stays_whole() {
        let cmd = Command::parse("EPRT |1|132.235.1.2|6275|\r\n").unwrap();
        assert_eq!(cmd.parameters(), &["|1|132.235.1.2|6275|"]);
    }

    #[test]
    fn parse_empty_line() {
        assert_eq!(Command::parse("\r\n"), Err(ParseError::EmptyLine));
        assert_eq!(Command::parse(""), Err(ParseError::EmptyLine));
    }

    #[test]
    fn parse_non_utf8() {
        assert_eq!(Command::parse(b"USER \xff\xfe\r\n"), Err(ParseError::InvalidUtf8));
    }

    #[test]
    fn parameter_out_of_range_is_none() {
        let cmd = Command::parse("CWD docs\r\n").unwrap();
        assert_eq!(cmd.parameter(1), None);
    }
}
