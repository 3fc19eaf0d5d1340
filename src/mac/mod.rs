//! Message authentication algorithms.
//!
//! Each encrypted packet carries a MAC tag computed over the packet sequence number and the
//! plaintext packet, providing **integrity** (the attacker cannot modify the messages that we
//! exchange over SSH).
//!
//! # Supported algorithms
//!
//! - "hmac-sha2-256", "hmac-sha2-512" (RFC 6668)
//! - "hmac-sha1", "hmac-sha1-96", "hmac-md5", "hmac-md5-96" (RFC 4253)
//!
//! [`MacAlgo::Plaintext`] stands for the phase before the first key exchange, when packets carry
//! no tag; it is never put on the wire as a name.
use crate::Result;
pub(crate) use self::none::Empty;

mod hmac;
mod none;

/// Algorithm for message authentication.
///
/// See the [module documentation][self] for details.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MacAlgo {
    /// "hmac-md5" MAC from RFC 4253.
    HmacMd5,
    /// "hmac-md5-96" MAC from RFC 4253 (first 96 bits of the digest).
    HmacMd5_96,
    /// "hmac-sha1" MAC from RFC 4253.
    HmacSha1,
    /// "hmac-sha1-96" MAC from RFC 4253 (first 96 bits of the digest).
    HmacSha1_96,
    /// "hmac-sha2-256" MAC from RFC 6668.
    HmacSha2_256,
    /// "hmac-sha2-512" MAC from RFC 6668.
    HmacSha2_512,
    /// No message authentication, used before the first key exchange completes. Cannot be
    /// negotiated.
    Plaintext,
}

impl MacAlgo {
    /// MACs offered in our `SSH_MSG_KEXINIT`, most preferred first.
    pub const PREFERRED: [MacAlgo; 6] = [
        MacAlgo::HmacSha2_256,
        MacAlgo::HmacSha2_512,
        MacAlgo::HmacSha1,
        MacAlgo::HmacSha1_96,
        MacAlgo::HmacMd5,
        MacAlgo::HmacMd5_96,
    ];

    /// Look up a MAC by its negotiated name.
    pub fn from_name(name: &str) -> Option<MacAlgo> {
        Some(match name {
            "hmac-md5" => MacAlgo::HmacMd5,
            "hmac-md5-96" => MacAlgo::HmacMd5_96,
            "hmac-sha1" => MacAlgo::HmacSha1,
            "hmac-sha1-96" => MacAlgo::HmacSha1_96,
            "hmac-sha2-256" => MacAlgo::HmacSha2_256,
            "hmac-sha2-512" => MacAlgo::HmacSha2_512,
            _ => return None,
        })
    }

    /// Name of the algorithm.
    ///
    /// Panics for [`MacAlgo::Plaintext`], which must never be serialized.
    pub fn name(&self) -> &'static str {
        match self {
            MacAlgo::HmacMd5 => "hmac-md5",
            MacAlgo::HmacMd5_96 => "hmac-md5-96",
            MacAlgo::HmacSha1 => "hmac-sha1",
            MacAlgo::HmacSha1_96 => "hmac-sha1-96",
            MacAlgo::HmacSha2_256 => "hmac-sha2-256",
            MacAlgo::HmacSha2_512 => "hmac-sha2-512",
            MacAlgo::Plaintext => panic!("the plaintext mac has no wire name"),
        }
    }

    /// Key length in bytes.
    pub const fn key_len(&self) -> usize {
        match self {
            MacAlgo::HmacMd5 | MacAlgo::HmacMd5_96 => 16,
            MacAlgo::HmacSha1 | MacAlgo::HmacSha1_96 => 20,
            MacAlgo::HmacSha2_256 => 32,
            MacAlgo::HmacSha2_512 => 64,
            MacAlgo::Plaintext => 0,
        }
    }

    /// Tag length in bytes; the truncated variants emit only a digest prefix.
    pub const fn tag_len(&self) -> usize {
        match self {
            MacAlgo::HmacMd5 => 16,
            MacAlgo::HmacSha1 => 20,
            MacAlgo::HmacMd5_96 | MacAlgo::HmacSha1_96 => 12,
            MacAlgo::HmacSha2_256 => 32,
            MacAlgo::HmacSha2_512 => 64,
            MacAlgo::Plaintext => 0,
        }
    }
}

/// Integrity key material for one direction of the connection.
///
/// The sequence number starts at zero when the keys are taken into use at `SSH_MSG_NEWKEYS` and
/// is owned by the packet layer afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MacKey {
    pub algo: MacAlgo,
    pub key: Vec<u8>,
    pub seq: u32,
}

impl MacKey {
    /// The key in force before the first key exchange: no algorithm, no key, sequence zero.
    pub fn plaintext() -> MacKey {
        MacKey { algo: MacAlgo::Plaintext, key: Vec::new(), seq: 0 }
    }

    /// Instantiate the keyed MAC.
    pub fn mac(&self) -> Box<dyn Mac + Send> {
        match self.algo {
            MacAlgo::Plaintext => Box::new(Empty),
            algo => hmac::new_mac(algo, &self.key),
        }
    }
}

/// Signing and verification of packet tags.
pub trait Mac {
    fn sign(&mut self, packet_seq: u32, plaintext: &[u8], tag: &mut [u8]);
    fn verify(&mut self, packet_seq: u32, plaintext: &[u8], tag: &[u8]) -> Result<MacVerified>;
}

/// Witness that a tag passed verification.
#[derive(Debug)]
pub struct MacVerified(());

impl MacVerified {
    pub fn assertion() -> Self {
        Self(())
    }
}
