pub type Result<T> = std::result::Result<T, Error>;

#[derive(thiserror::Error, Debug)]
#[non_exhaustive]
pub enum Error {
    /// The input ends before a complete item could be decoded. Feed more bytes and retry; the
    /// framing collaborator should not treat this as fatal.
    #[error("need more input")]
    NeedMore,
    /// The peer sent bytes that cannot be decoded: a length that overruns the input, an exceeded
    /// size cap, trailing garbage after a message, a bad version banner.
    #[error("malformed input: {0}")]
    Malformed(String),
    /// The message decoded fine, but is not acceptable in the current state of the connection.
    #[error("protocol error: {0}")]
    Protocol(&'static str),
    /// One of the eight negotiable algorithm slots has an empty intersection. The string is the
    /// per-slot reason, suitable for an outgoing `SSH_MSG_DISCONNECT` description.
    #[error("could not negotiate algorithm: {0}")]
    AlgoNegotiate(String),
    /// A recognized message ID that this implementation does not handle. The caller should answer
    /// with `SSH_MSG_UNIMPLEMENTED` carrying the peer's sequence number.
    #[error("packet {0} not implemented")]
    PacketNotImplemented(u8),
    /// A cryptographic primitive refused an operation. Not reachable from peer input.
    #[error("cryptography error: {0}")]
    Crypto(&'static str),
}
