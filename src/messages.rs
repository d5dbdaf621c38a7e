//! Reply-text templates and their lookup contract.
//!
//! Handlers never hardcode the human-readable half of a reply; they look it
//! up by key and interpolate positional arguments, so an embedding
//! application can localize or rebrand the texts by swapping the catalog.

use lazy_static::lazy_static;
use std::collections::HashMap;
use std::fmt;

/// Message keys used by the built-in handlers.
pub mod keys {
    pub const GREETING: &str = "greeting";
    pub const NOT_IMPLEMENTED: &str = "notImplemented";
    pub const COMMAND_SYNTAX_ERROR: &str = "commandSyntaxError";
    pub const MISSING_PARAMETER: &str = "missingParameter";
    pub const INVALID_PARAMETER: &str = "invalidParameter";
    pub const NOT_LOGGED_IN: &str = "notLoggedIn";
    pub const BAD_SEQUENCE: &str = "badSequence";

    pub const LOGIN_NEED_PASSWORD: &str = "login.needPassword";
    pub const LOGIN_OK: &str = "login.ok";
    pub const LOGIN_FAILED: &str = "login.failed";

    pub const FS_DOES_NOT_EXIST: &str = "filesystem.doesNotExist";
    pub const FS_IS_NOT_A_DIRECTORY: &str = "filesystem.isNotADirectory";
    pub const FS_IS_A_DIRECTORY: &str = "filesystem.isADirectory";
    pub const FS_ALREADY_EXISTS: &str = "filesystem.alreadyExists";
    pub const FS_NOT_EMPTY: &str = "filesystem.directoryNotEmpty";
    pub const FS_CANNOT_READ: &str = "filesystem.cannotRead";
    pub const FS_CANNOT_WRITE: &str = "filesystem.cannotWrite";
    pub const FS_CANNOT_EXECUTE: &str = "filesystem.cannotExecute";

    pub const CWD_OK: &str = "cwd.ok";
    pub const CDUP_OK: &str = "cdup.ok";
    pub const PWD_OK: &str = "pwd.ok";
    pub const MKD_OK: &str = "mkd.ok";
    pub const DELE_OK: &str = "dele.ok";
    pub const RMD_OK: &str = "rmd.ok";
    pub const RNFR_OK: &str = "rnfr.ok";
    pub const RNTO_OK: &str = "rnto.ok";
    pub const NOOP_OK: &str = "noop.ok";
    pub const TYPE_OK: &str = "type.ok";
    pub const QUIT_OK: &str = "quit.ok";
    pub const SYST_OK: &str = "syst.ok";
    pub const PORT_OK: &str = "port.ok";
    pub const EPRT_OK: &str = "eprt.ok";
    pub const PASV_OK: &str = "pasv.ok";
    pub const EPSV_OK: &str = "epsv.ok";

    pub const DATA_OPENING: &str = "data.opening";
    pub const DATA_DONE: &str = "data.done";
    pub const DATA_CANT_OPEN: &str = "data.cantOpen";
    pub const DATA_ABORTED: &str = "data.aborted";
    pub const STOU_OK: &str = "stou.ok";
    pub const PASV_ONLY_IPV4: &str = "pasv.onlyIpv4";
}

/// Lookup contract for reply texts: a message key plus positional arguments
/// yields the formatted explanation line. Templates use `%s` placeholders,
/// substituted left to right.
pub trait MessageCatalog: Send + Sync + fmt::Debug {
    /// Formats the template registered under `key` with `args`. Unknown keys
    /// fall back to the key itself so a missing text never breaks a reply.
    fn lookup(&self, key: &str, args: &[&str]) -> String;
}

lazy_static! {
    static ref DEFAULT_TEXTS: HashMap<&'static str, &'static str> = {
        let mut texts = HashMap::new();
        texts.insert(keys::GREETING, "Service ready for new user.");
        texts.insert(keys::NOT_IMPLEMENTED, "Command not implemented: %s.");
        texts.insert(keys::COMMAND_SYNTAX_ERROR, "Syntax error, command unrecognized.");
        texts.insert(keys::MISSING_PARAMETER, "Syntax error in parameters or arguments.");
        texts.insert(keys::INVALID_PARAMETER, "Invalid parameter: %s.");
        texts.insert(keys::NOT_LOGGED_IN, "Not logged in.");
        texts.insert(keys::BAD_SEQUENCE, "Bad sequence of commands: %s.");

        texts.insert(keys::LOGIN_NEED_PASSWORD, "User name okay, need password.");
        texts.insert(keys::LOGIN_OK, "User logged in, proceed.");
        texts.insert(keys::LOGIN_FAILED, "Not logged in: authentication failed.");

        texts.insert(keys::FS_DOES_NOT_EXIST, "%s: no such file or directory.");
        texts.insert(keys::FS_IS_NOT_A_DIRECTORY, "%s: not a directory.");
        texts.insert(keys::FS_IS_A_DIRECTORY, "%s: is a directory.");
        texts.insert(keys::FS_ALREADY_EXISTS, "%s: already exists.");
        texts.insert(keys::FS_NOT_EMPTY, "%s: directory not empty.");
        texts.insert(keys::FS_CANNOT_READ, "%s: read permission denied.");
        texts.insert(keys::FS_CANNOT_WRITE, "%s: write permission denied.");
        texts.insert(keys::FS_CANNOT_EXECUTE, "%s: execute permission denied.");

        texts.insert(keys::CWD_OK, "\"%s\" is the current directory.");
        texts.insert(keys::CDUP_OK, "\"%s\" is the current directory.");
        texts.insert(keys::PWD_OK, "\"%s\" is the current directory.");
        texts.insert(keys::MKD_OK, "\"%s\" created.");
        texts.insert(keys::DELE_OK, "\"%s\" deleted.");
        texts.insert(keys::RMD_OK, "\"%s\" removed.");
        texts.insert(keys::RNFR_OK, "Requested file action pending further information.");
        texts.insert(keys::RNTO_OK, "Rename \"%s\" to \"%s\" successful.");
        texts.insert(keys::NOOP_OK, "OK.");
        texts.insert(keys::TYPE_OK, "Always in binary mode.");
        texts.insert(keys::QUIT_OK, "Service closing control connection.");
        texts.insert(keys::SYST_OK, "%s");
        texts.insert(keys::PORT_OK, "PORT command successful.");
        texts.insert(keys::EPRT_OK, "EPRT command successful.");
        texts.insert(keys::PASV_OK, "Entering Passive Mode (%s)");
        texts.insert(keys::EPSV_OK, "Entering Extended Passive Mode (|||%s|)");

        texts.insert(keys::DATA_OPENING, "Opening data connection.");
        texts.insert(keys::DATA_DONE, "Closing data connection. Requested file action successful.");
        texts.insert(keys::DATA_CANT_OPEN, "Can't open data connection.");
        texts.insert(keys::DATA_ABORTED, "Connection closed; transfer aborted.");
        texts.insert(keys::STOU_OK, "Transfer complete; unique file name is \"%s\".");
        texts.insert(keys::PASV_ONLY_IPV4, "PASV is IPv4-only on this connection; use EPSV.");
        texts
    };
}

/// The built-in English catalog.
#[derive(Debug, Default)]
pub struct DefaultMessages;

impl MessageCatalog for DefaultMessages {
    fn lookup(&self, key: &str, args: &[&str]) -> String {
        match DEFAULT_TEXTS.get(key) {
            Some(template) => interpolate(template, args),
            None => key.to_string(),
        }
    }
}

/// Substitutes `%s` placeholders left to right; surplus placeholders render
/// empty, surplus arguments are dropped.
pub(crate) fn interpolate(template: &str, args: &[&str]) -> String {
    let mut pieces = template.split("%s");
    let mut formatted = String::new();
    if let Some(first) = pieces.next() {
        formatted.push_str(first);
    }
    let mut args = args.iter();
    for piece in pieces {
        if let Some(arg) = args.next() {
            formatted.push_str(arg);
        }
        formatted.push_str(piece);
    }
    formatted
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn interpolate_positionally() {
        assert_eq!(interpolate("Rename \"%s\" to \"%s\" done.", &["/a", "/b"]), "Rename \"/a\" to \"/b\" done.");
    }

    #[test]
    fn interpolate_handles_arity_mismatch() {
        assert_eq!(interpolate("%s and %s", &["one"]), "one and ");
        assert_eq!(interpolate("just %s", &["one", "two"]), "just one");
    }

    #[test]
    fn unknown_key_falls_back_to_the_key() {
        assert_eq!(DefaultMessages.lookup("no.such.key", &[]), "no.such.key");
    }

    #[test]
    fn lookup_formats_registered_template() {
        assert_eq!(DefaultMessages.lookup(keys::CWD_OK, &["/home/docs"]), "\"/home/docs\" is the current directory.");
    }
}
