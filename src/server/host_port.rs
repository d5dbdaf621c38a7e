//! Wire encodings of the (address, port) pair used in data-connection
//! negotiation.
//
// Legacy PORT/PASV (RFC 959) are IPv4-only and byte-oriented: the address
// and port travel as six unsigned decimal byte values separated by commas.
// EPRT/EPSV (RFC 2428) exist specifically to add IPv6: a textual address
// between repeats of an arbitrary delimiter character, commonly `|`. Nothing
// here may assume a fixed delimiter.

use derive_more::Display;
use std::net::{IpAddr, Ipv4Addr};
use thiserror::Error;

/// An IP address (v4 or v6) plus TCP port, as negotiated for a data
/// connection. Decoded from PORT/EPRT parameters; encoded into PASV replies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[display("{host}:{port}")]
pub struct HostAndPort {
    /// The IP address half of the pair.
    pub host: IpAddr,
    /// The TCP port half of the pair.
    pub port: u16,
}

impl HostAndPort {
    /// Convenience constructor.
    pub fn new<H: Into<IpAddr>>(host: H, port: u16) -> Self {
        HostAndPort { host: host.into(), port }
    }
}

/// Why a PORT or EPRT parameter list failed to decode.
///
/// `TooFewParameters` is the syntax-error condition (the client did not even
/// supply the right shape); the remaining variants are format-error
/// conditions (right shape, unparseable values). Handlers map all of them to
/// a 501 reply, but keep the kinds apart for the reply text.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AddressParseError {
    /// Fewer tokens than the encoding requires.
    #[error("expected {expected} address parameters, got {actual}")]
    TooFewParameters {
        /// How many tokens the encoding requires.
        expected: usize,
        /// How many tokens the client supplied.
        actual: usize,
    },
    /// A legacy byte value that does not parse as an unsigned 0-255 decimal.
    #[error("'{0}' is not a valid unsigned byte value")]
    InvalidOctet(String),
    /// An extended-format host that is neither IPv4 nor IPv6 text.
    #[error("'{0}' is not a valid host address")]
    InvalidHost(String),
    /// An extended-format port outside 0-65535.
    #[error("'{0}' is not a valid port number")]
    InvalidPort(String),
}

/// Decodes the six positional PORT parameters `h1,h2,h3,h4,p1,p2`.
///
/// Every value is an *unsigned* decimal byte; `255,255,255,255,255,255`
/// means `255.255.255.255:65535`, never a negative or overflowed value.
pub fn parse_legacy(parameters: &[String]) -> Result<HostAndPort, AddressParseError> {
    if parameters.len() < 6 {
        return Err(AddressParseError::TooFewParameters {
            expected: 6,
            actual: parameters.len(),
        });
    }

    let mut bytes = [0u8; 6];
    for (i, parameter) in parameters[..6].iter().enumerate() {
        bytes[i] = parameter
            .parse::<u8>()
            .map_err(|_| AddressParseError::InvalidOctet(parameter.clone()))?;
    }

    let host = Ipv4Addr::new(bytes[0], bytes[1], bytes[2], bytes[3]);
    let port = (u16::from(bytes[4]) << 8) + u16::from(bytes[5]);
    Ok(HostAndPort::new(host, port))
}

/// Encodes an IPv4 address and port as the comma-separated byte tuple used
/// in the PASV success reply, e.g. `192,168,0,2,23,77`.
pub fn format_legacy(host: Ipv4Addr, port: u16) -> String {
    let octets = host.octets();
    let p1 = port >> 8;
    let p2 = port & 0xff;
    format!("{},{},{},{},{},{}", octets[0], octets[1], octets[2], octets[3], p1, p2)
}

/// Decodes the single EPRT parameter `<d><net-prt><d><net-addr><d><tcp-port><d>`.
///
/// The delimiter is whatever character the parameter starts with. The
/// net-prt token is ignored: both 1 (IPv4) and 2 (IPv6) are accepted
/// transparently because the address text itself disambiguates.
pub fn parse_extended(parameter: &str) -> Result<HostAndPort, AddressParseError> {
    let delimiter = match parameter.chars().next() {
        Some(c) => c,
        None => {
            return Err(AddressParseError::TooFewParameters { expected: 4, actual: 0 });
        }
    };

    let tokens: Vec<&str> = parameter[delimiter.len_utf8()..].split(delimiter).collect();
    if tokens.len() < 4 {
        return Err(AddressParseError::TooFewParameters {
            expected: 4,
            actual: tokens.len(),
        });
    }

    let host = tokens[1]
        .parse::<IpAddr>()
        .map_err(|_| AddressParseError::InvalidHost(tokens[1].to_string()))?;
    let port = tokens[2]
        .parse::<u16>()
        .map_err(|_| AddressParseError::InvalidPort(tokens[2].to_string()))?;
    Ok(HostAndPort { host, port })
}

/// Encodes the port half for the EPSV success reply. The server address is
/// implicit ("this connection"), so only a plain decimal port is needed.
pub fn format_extended_port(port: u16) -> String {
    port.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::net::Ipv6Addr;

    fn params(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    #[test]
    fn parse_legacy_spec_example() {
        let hp = parse_legacy(&params(&["11", "22", "33", "44", "1", "206"])).unwrap();
        assert_eq!(hp, HostAndPort::new(Ipv4Addr::new(11, 22, 33, 44), 462));
    }

    #[test]
    // Regression against naive signed-byte parsing.
    fn parse_legacy_treats_bytes_as_unsigned() {
        let hp = parse_legacy(&params(&["255", "255", "255", "255", "255", "255"])).unwrap();
        assert_eq!(hp.host, IpAddr::V4(Ipv4Addr::new(255, 255, 255, 255)));
        assert_eq!(hp.port, 65535);
    }

    #[test]
    fn parse_legacy_too_few_parameters() {
        assert_eq!(
            parse_legacy(&params(&["1", "2", "3"])),
            Err(AddressParseError::TooFewParameters { expected: 6, actual: 3 })
        );
    }

    #[test]
    fn parse_legacy_rejects_non_numeric_and_out_of_range() {
        assert_eq!(
            parse_legacy(&params(&["a", "2", "3", "4", "5", "6"])),
            Err(AddressParseError::InvalidOctet("a".to_string()))
        );
        assert_eq!(
            parse_legacy(&params(&["256", "2", "3", "4", "5", "6"])),
            Err(AddressParseError::InvalidOctet("256".to_string()))
        );
        assert_eq!(
            parse_legacy(&params(&["-1", "2", "3", "4", "5", "6"])),
            Err(AddressParseError::InvalidOctet("-1".to_string()))
        );
    }

    #[test]
    fn legacy_round_trip() {
        for (host, port) in [
            (Ipv4Addr::new(192, 168, 0, 2), 5965u16),
            (Ipv4Addr::new(0, 0, 0, 0), 0),
            (Ipv4Addr::new(127, 0, 0, 1), 65535),
        ] {
            let encoded = format_legacy(host, port);
            let decoded = parse_legacy(&params(&encoded.split(',').collect::<Vec<_>>())).unwrap();
            assert_eq!(decoded, HostAndPort::new(host, port));
        }
    }

    #[test]
    fn format_legacy_spec_example() {
        assert_eq!(format_legacy(Ipv4Addr::new(192, 168, 0, 2), 5965), "192,168,0,2,23,77");
    }

    #[test]
    fn parse_extended_ipv4() {
        let hp = parse_extended("|1|132.235.1.2|6275|").unwrap();
        assert_eq!(hp, HostAndPort::new(Ipv4Addr::new(132, 235, 1, 2), 6275));
    }

    #[test]
    fn parse_extended_ipv6() {
        let hp = parse_extended("|2|1080::8:800:200C:417A|6275|").unwrap();
        let expected: Ipv6Addr = "1080::8:800:200C:417A".parse().unwrap();
        assert_eq!(hp, HostAndPort::new(expected, 6275));
    }

    #[test]
    // The delimiter is whatever the parameter opens with.
    fn parse_extended_arbitrary_delimiter() {
        let hp = parse_extended("#1#10.0.0.7#21000#").unwrap();
        assert_eq!(hp, HostAndPort::new(Ipv4Addr::new(10, 0, 0, 7), 21000));
    }

    #[test]
    fn parse_extended_too_few_tokens() {
        assert_eq!(
            parse_extended("|1|132.235.1.2|"),
            Err(AddressParseError::TooFewParameters { expected: 4, actual: 3 })
        );
        assert_eq!(parse_extended(""), Err(AddressParseError::TooFewParameters { expected: 4, actual: 0 }));
    }

    #[test]
    fn parse_extended_bad_host_and_port() {
        assert_eq!(
            parse_extended("|1|not-a-host|6275|"),
            Err(AddressParseError::InvalidHost("not-a-host".to_string()))
        );
        assert_eq!(
            parse_extended("|1|10.0.0.1|99999|"),
            Err(AddressParseError::InvalidPort("99999".to_string()))
        );
    }

    #[test]
    fn format_extended_port_is_plain_decimal() {
        assert_eq!(format_extended_port(6275), "6275");
    }
}
