//! The version exchange that precedes binary framing (RFC 4253, section 4.2).
//!
//! Both sides start the connection with an identification line `SSH-2.0-software\r\n`. The peer
//! may send any number of other lines before its banner; those are skipped. Everything after the
//! banner's terminating newline already belongs to the packet layer.
use std::str;
use crate::{Error, Result};

/// Hard cap on how many bytes we are willing to scan for a banner.
///
/// Without it, a peer that never sends `\r\n` could make us buffer its stream forever.
pub const MAX_IDENT_LEN: usize = 64 * 1024;

/// A peer's identification, as parsed from its banner line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PeerIdent {
    /// The full banner line without the CR-LF terminator, e.g. `SSH-2.0-OpenSSH_8.9`.
    ///
    /// The exchange hash consumes this exact byte sequence, so it is kept as received.
    pub line: String,
    /// The softwareversion token (with comments, if any), e.g. `OpenSSH_8.9`.
    pub software: String,
}

/// Scans an incoming byte stream for the peer's identification line.
///
/// Returns the parsed [`PeerIdent`] and the number of bytes consumed, including the banner's
/// CR-LF; the caller continues packet framing from that offset. Lines before the banner that do
/// not start with `SSH-` are skipped. Fails with [`Error::NeedMore`] while no complete banner
/// line is buffered yet, and with [`Error::Malformed`] once the buffer exceeds
/// [`MAX_IDENT_LEN`] without containing one.
pub fn scan(buf: &[u8]) -> Result<(PeerIdent, usize)> {
    let mut pos = 0;
    loop {
        let eol = match find_crlf(&buf[pos..]) {
            Some(eol) => eol,
            None => {
                if buf.len() > MAX_IDENT_LEN {
                    return Err(Error::Malformed("Buffer is too big".into()))
                }
                return Err(Error::NeedMore)
            },
        };

        let line = &buf[pos..pos + eol];
        pos += eol + 2;
        if line.starts_with(b"SSH-") {
            return Ok((parse_banner(line)?, pos))
        }
        log::trace!("skipping pre-banner line of {} bytes", line.len());
    }
}

/// Renders the local identification line, without the CR-LF terminator.
pub fn local_ident(software: &str) -> String {
    format!("SSH-2.0-{}", software)
}

fn find_crlf(buf: &[u8]) -> Option<usize> {
    buf.windows(2).position(|w| w == b"\r\n")
}

fn parse_banner(line: &[u8]) -> Result<PeerIdent> {
    // SSH-protoversion-softwareversion (RFC 4253, section 4.2)
    let line = str::from_utf8(line)
        .map_err(|_| Error::Malformed("identification line is not valid utf-8".into()))?;
    if line.len() < 9 {
        return Err(Error::Malformed("identification line is too short".into()))
    }

    let mut tokens = line.splitn(3, '-');
    let _ssh = tokens.next();
    let proto = tokens.next();
    let software = match (proto, tokens.next()) {
        (Some(proto), Some(software)) if !proto.is_empty() && !software.is_empty() => {
            if proto != "2.0" {
                return Err(Error::Malformed(format!("Bad version {}", proto)))
            }
            software
        },
        _ => return Err(Error::Malformed("identification line has a bad format".into())),
    };

    Ok(PeerIdent { line: line.into(), software: software.into() })
}
