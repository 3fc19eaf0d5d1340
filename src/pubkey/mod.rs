//! Server host key algorithms.
//!
//! During the key exchange the server proves its identity by signing the exchange hash with its
//! host key. The client decodes the key from the `K_S` blob in `SSH_MSG_KEXDH_REPLY` and checks
//! the signature; whether to *trust* the key is a policy question left to the caller.
//!
//! # Supported algorithms
//!
//! - "ssh-rsa" (RFC 4253, SHA-1 signatures)
use bytes::Bytes;
use std::fmt;
use crate::codec::{PacketDecode, PacketEncode};
use crate::error::{Result, Error};
pub use self::rsa::{RsaPubkey, RsaPrivkey};

mod rsa;

/// Algorithm for the server host key.
///
/// See the [module documentation][self] for details.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PubkeyAlgo {
    /// "ssh-rsa" public key algorithm from RFC 4253.
    SshRsa,
    /// Sentinel for a peer offer we do not recognize. Must never be serialized.
    Unknown,
}

impl PubkeyAlgo {
    /// Host key algorithms offered in our `SSH_MSG_KEXINIT`, most preferred first.
    pub const PREFERRED: [PubkeyAlgo; 1] = [PubkeyAlgo::SshRsa];

    /// Look up a host key algorithm by its negotiated name.
    ///
    /// Unrecognized names map to [`PubkeyAlgo::Unknown`] rather than an error; the negotiator
    /// turns that into a per-slot failure.
    pub fn from_name(name: &str) -> PubkeyAlgo {
        match name {
            "ssh-rsa" => PubkeyAlgo::SshRsa,
            _ => PubkeyAlgo::Unknown,
        }
    }

    /// Name of the algorithm.
    ///
    /// Panics for [`PubkeyAlgo::Unknown`], which must never be serialized.
    pub fn name(&self) -> &'static str {
        match self {
            PubkeyAlgo::SshRsa => "ssh-rsa",
            PubkeyAlgo::Unknown => panic!("the unknown host key algorithm has no wire name"),
        }
    }
}

/// Public key in one of the supported formats.
#[derive(Debug, Clone, PartialEq)]
#[non_exhaustive]
pub enum Pubkey {
    /// RSA public key.
    Rsa(RsaPubkey),
}

impl Pubkey {
    /// Decodes a public key from the wire blob (`K_S` of RFC 4253, section 8).
    pub fn decode(blob: Bytes) -> Result<Pubkey> {
        let mut blob = PacketDecode::new(blob);
        let format = blob.get_string()?;
        match format.as_str() {
            "ssh-rsa" => rsa::decode(&mut blob).map(Pubkey::Rsa),
            _ => {
                log::debug!("unknown pubkey format {:?}", format);
                Err(Error::Malformed("unknown public key format".into()))
            },
        }
    }

    /// Encodes the key into its wire blob.
    pub fn encode(&self) -> Bytes {
        let mut blob = PacketEncode::new();
        match self {
            Pubkey::Rsa(pubkey) => rsa::encode(&mut blob, pubkey),
        }
        blob.finish()
    }

    /// Renders the key in the one-line form used by `authorized_keys` files.
    pub fn to_authorized_key(&self) -> String {
        let algo = match self {
            Pubkey::Rsa(_) => "ssh-rsa",
        };
        format!("{} {}", algo, base64::encode(self.encode()))
    }

    /// Parses a key from the one-line `authorized_keys` form, ignoring any trailing comment.
    pub fn from_authorized_key(line: &str) -> Result<Pubkey> {
        let mut fields = line.split_ascii_whitespace();
        let algo = fields.next()
            .ok_or_else(|| Error::Malformed("empty public key line".into()))?;
        let blob_base64 = fields.next()
            .ok_or_else(|| Error::Malformed("public key line has no key data".into()))?;
        let blob = base64::decode(blob_base64)
            .map_err(|_| Error::Malformed("public key data is invalid base64".into()))?;

        let pubkey = Pubkey::decode(blob.into())?;
        match (&pubkey, PubkeyAlgo::from_name(algo)) {
            (Pubkey::Rsa(_), PubkeyAlgo::SshRsa) => Ok(pubkey),
            _ => Err(Error::Malformed("public key algorithm does not match the key".into())),
        }
    }

    /// Verifies a signature blob over `message`.
    ///
    /// The blob carries the algorithm name followed by the raw signature; the name must match
    /// the key's algorithm.
    pub fn verify(&self, message: &[u8], signature_blob: Bytes) -> Result<SignatureVerified> {
        match self {
            Pubkey::Rsa(pubkey) => rsa::verify(pubkey, message, signature_blob),
        }
    }
}

impl fmt::Display for Pubkey {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Pubkey::Rsa(pubkey) => fmt::Display::fmt(pubkey, f),
        }
    }
}

/// Witness that a signature passed verification.
#[derive(Debug)]
pub struct SignatureVerified(());

impl SignatureVerified {
    fn assertion() -> Self { Self(()) }
}

/// Private key (keypair) in one of the supported formats.
#[derive(Clone)]
#[non_exhaustive]
pub enum Privkey {
    /// RSA private key.
    Rsa(RsaPrivkey),
}

impl Privkey {
    /// Return the public key associated with this private key.
    pub fn pubkey(&self) -> Pubkey {
        match self {
            Privkey::Rsa(privkey) => Pubkey::Rsa(privkey.pubkey()),
        }
    }

    /// Signs `message`, producing the wire signature blob of RFC 4253, section 6.6.
    pub fn sign(&self, message: &[u8]) -> Result<Bytes> {
        match self {
            Privkey::Rsa(privkey) => rsa::sign(privkey, message),
        }
    }
}
