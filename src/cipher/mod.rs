//! Encryption and decryption algorithms.
//!
//! The SSH protocol supports many symmetric encryption algorithms (ciphers), which are used to
//! provide **confidentiality** (the attacker cannot see the content of the messages that we
//! exchange over SSH).
//!
//! The client and the server exchange lists of supported algorithms, and the first algorithm on
//! the client's list that is also supported by the server is used for the connection.
//!
//! # Supported algorithms
//!
//! - "aes128-ctr", "aes192-ctr", "aes256-ctr" (RFC 4344)
//! - "aes128-cbc", "aes192-cbc", "aes256-cbc" (RFC 4253)
//!
//! [`CipherAlgo::Plaintext`] stands for the phase before the first key exchange, when packets go
//! out unencrypted; it is never put on the wire as a name.
pub(crate) use self::none::Identity;

mod block;
mod none;
mod stream;

/// Algorithm for encrypting and decrypting messages.
///
/// See the [module documentation][self] for details.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CipherAlgo {
    /// "aes128-ctr" cipher from RFC 4344.
    Aes128Ctr,
    /// "aes192-ctr" cipher from RFC 4344.
    Aes192Ctr,
    /// "aes256-ctr" cipher from RFC 4344.
    Aes256Ctr,
    /// "aes128-cbc" cipher from RFC 4253.
    Aes128Cbc,
    /// "aes192-cbc" cipher from RFC 4253.
    Aes192Cbc,
    /// "aes256-cbc" cipher from RFC 4253.
    Aes256Cbc,
    /// No encryption, used before the first key exchange completes. Cannot be negotiated.
    Plaintext,
}

impl CipherAlgo {
    /// Ciphers offered in our `SSH_MSG_KEXINIT`, most preferred first.
    pub const PREFERRED: [CipherAlgo; 6] = [
        CipherAlgo::Aes128Ctr,
        CipherAlgo::Aes192Ctr,
        CipherAlgo::Aes256Ctr,
        CipherAlgo::Aes128Cbc,
        CipherAlgo::Aes192Cbc,
        CipherAlgo::Aes256Cbc,
    ];

    /// Look up a cipher by its negotiated name.
    pub fn from_name(name: &str) -> Option<CipherAlgo> {
        Some(match name {
            "aes128-ctr" => CipherAlgo::Aes128Ctr,
            "aes192-ctr" => CipherAlgo::Aes192Ctr,
            "aes256-ctr" => CipherAlgo::Aes256Ctr,
            "aes128-cbc" => CipherAlgo::Aes128Cbc,
            "aes192-cbc" => CipherAlgo::Aes192Cbc,
            "aes256-cbc" => CipherAlgo::Aes256Cbc,
            _ => return None,
        })
    }

    /// Name of the algorithm.
    ///
    /// Panics for [`CipherAlgo::Plaintext`], which must never be serialized.
    pub fn name(&self) -> &'static str {
        match self {
            CipherAlgo::Aes128Ctr => "aes128-ctr",
            CipherAlgo::Aes192Ctr => "aes192-ctr",
            CipherAlgo::Aes256Ctr => "aes256-ctr",
            CipherAlgo::Aes128Cbc => "aes128-cbc",
            CipherAlgo::Aes192Cbc => "aes192-cbc",
            CipherAlgo::Aes256Cbc => "aes256-cbc",
            CipherAlgo::Plaintext => panic!("the plaintext cipher has no wire name"),
        }
    }

    /// Key length in bytes.
    pub const fn key_len(&self) -> usize {
        match self {
            CipherAlgo::Aes128Ctr | CipherAlgo::Aes128Cbc => 16,
            CipherAlgo::Aes192Ctr | CipherAlgo::Aes192Cbc => 24,
            CipherAlgo::Aes256Ctr | CipherAlgo::Aes256Cbc => 32,
            CipherAlgo::Plaintext => 0,
        }
    }

    /// Initialization vector length in bytes.
    pub const fn iv_len(&self) -> usize {
        match self {
            CipherAlgo::Plaintext => 0,
            _ => 16,
        }
    }

    /// Cipher block length in bytes; the packet layer aligns packets to it.
    pub const fn block_len(&self) -> usize {
        match self {
            CipherAlgo::Plaintext => 8,
            _ => 16,
        }
    }
}

/// A cipher key as derived from a completed key exchange.
///
/// The mode is part of the value, so key material can never be fed to the wrong kind of cipher.
/// The AES key width follows from the key length.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CipherKey {
    /// No encryption; the value in force before the first `SSH_MSG_NEWKEYS`.
    Plaintext,
    /// Raw key for one of the AES-CTR ciphers.
    AesCtr(Vec<u8>),
    /// Raw key for one of the AES-CBC ciphers.
    AesCbc(Vec<u8>),
}

impl CipherKey {
    /// Tags raw key material with the mode of the given algorithm.
    ///
    /// The key must have the algorithm's exact key length; anything else is a bug in the caller.
    pub fn new(algo: CipherAlgo, key: Vec<u8>) -> CipherKey {
        assert_eq!(key.len(), algo.key_len(), "cipher key has the wrong length");
        match algo {
            CipherAlgo::Aes128Ctr | CipherAlgo::Aes192Ctr | CipherAlgo::Aes256Ctr =>
                CipherKey::AesCtr(key),
            CipherAlgo::Aes128Cbc | CipherAlgo::Aes192Cbc | CipherAlgo::Aes256Cbc =>
                CipherKey::AesCbc(key),
            CipherAlgo::Plaintext => CipherKey::Plaintext,
        }
    }

    /// Instantiate the encryption half of this key.
    pub fn encrypt(&self, iv: &[u8]) -> Box<dyn Encrypt + Send> {
        match self {
            CipherKey::Plaintext => Box::new(Identity),
            CipherKey::AesCtr(key) => stream::new_encrypt(key, iv),
            CipherKey::AesCbc(key) => block::new_encrypt(key, iv),
        }
    }

    /// Instantiate the decryption half of this key.
    pub fn decrypt(&self, iv: &[u8]) -> Box<dyn Decrypt + Send> {
        match self {
            CipherKey::Plaintext => Box::new(Identity),
            CipherKey::AesCtr(key) => stream::new_decrypt(key, iv),
            CipherKey::AesCbc(key) => block::new_decrypt(key, iv),
        }
    }
}

/// Stateful encryption of a packet stream.
pub trait Encrypt {
    fn encrypt(&mut self, data: &mut [u8]);
}

/// Stateful decryption of a packet stream.
pub trait Decrypt {
    fn decrypt(&mut self, data: &mut [u8]);
}
