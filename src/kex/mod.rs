//! Key exchange algorithms and session key derivation.
//!
//! The key exchange produces a shared secret `K` and an exchange hash `H`; the first `H` of a
//! connection becomes the immutable session id. [`derive_keys()`] then expands `K` and `H` into
//! the per-direction IVs, cipher keys and integrity keys of RFC 4253, section 7.2.
//!
//! # Supported algorithms
//!
//! - "diffie-hellman-group14-sha1" (RFC 4253)
//! - "diffie-hellman-group1-sha1" (RFC 4253; the name says group 1, the group is Oakley 2)
use num_bigint_dig::BigUint;
use sha1::{Digest as _, Sha1};
use crate::cipher::CipherKey;
use crate::codec::PacketEncode;
use crate::mac::MacKey;
use crate::negotiate::Negotiation;
pub use self::dh::DhKex;

pub(crate) mod dh;

/// Algorithm for the key exchange.
///
/// See the [module documentation][self] for details.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KexAlgo {
    /// "diffie-hellman-group14-sha1" key exchange from RFC 4253.
    DhGroup14Sha1,
    /// "diffie-hellman-group1-sha1" key exchange from RFC 4253.
    DhGroup1Sha1,
}

impl KexAlgo {
    /// Key exchanges offered in our `SSH_MSG_KEXINIT`, most preferred first.
    pub const PREFERRED: [KexAlgo; 2] = [KexAlgo::DhGroup14Sha1, KexAlgo::DhGroup1Sha1];

    /// Look up a key exchange by its negotiated name.
    pub fn from_name(name: &str) -> Option<KexAlgo> {
        Some(match name {
            "diffie-hellman-group14-sha1" => KexAlgo::DhGroup14Sha1,
            "diffie-hellman-group1-sha1" => KexAlgo::DhGroup1Sha1,
            _ => return None,
        })
    }

    /// Name of the algorithm.
    pub fn name(&self) -> &'static str {
        match self {
            KexAlgo::DhGroup14Sha1 => "diffie-hellman-group14-sha1",
            KexAlgo::DhGroup1Sha1 => "diffie-hellman-group1-sha1",
        }
    }

    pub(crate) fn group(&self) -> dh::Group {
        match self {
            KexAlgo::DhGroup14Sha1 => dh::Group::group_14(),
            KexAlgo::DhGroup1Sha1 => dh::Group::group_2(),
        }
    }
}

/// Both supported key exchanges hash with SHA-1.
pub(crate) fn compute_hash(data: &[u8]) -> Vec<u8> {
    Sha1::digest(data).to_vec()
}

/// The inputs of the exchange hash `H` (RFC 4253, section 8).
///
/// The identification lines go in without their CR-LF; the `KEXINIT` payloads must be the exact
/// bytes that crossed the wire, message ID included, or the two sides will disagree on `H`.
#[derive(Debug)]
pub struct ExchangeHash<'a> {
    /// Client identification line (`V_C`).
    pub client_ident: &'a [u8],
    /// Server identification line (`V_S`).
    pub server_ident: &'a [u8],
    /// Client `SSH_MSG_KEXINIT` payload (`I_C`).
    pub client_kex_init: &'a [u8],
    /// Server `SSH_MSG_KEXINIT` payload (`I_S`).
    pub server_kex_init: &'a [u8],
    /// Server host key blob (`K_S`).
    pub server_pubkey: &'a [u8],
    /// Client ephemeral public value (`e`).
    pub client_eph_pubkey: &'a BigUint,
    /// Server ephemeral public value (`f`).
    pub server_eph_pubkey: &'a BigUint,
    /// Shared secret (`K`).
    pub shared_secret: &'a BigUint,
}

impl ExchangeHash<'_> {
    /// Computes `H` over the length-prefixed concatenation of the inputs.
    pub fn compute(&self) -> Vec<u8> {
        let mut data = PacketEncode::new();
        data.put_bytes(self.client_ident);
        data.put_bytes(self.server_ident);
        data.put_bytes(self.client_kex_init);
        data.put_bytes(self.server_kex_init);
        data.put_bytes(self.server_pubkey);
        data.put_biguint(self.client_eph_pubkey);
        data.put_biguint(self.server_eph_pubkey);
        data.put_biguint(self.shared_secret);
        compute_hash(&data.finish())
    }
}

/// Key material for one direction of the connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Keys {
    /// Initialization vector for the cipher.
    pub iv: Vec<u8>,
    /// Cipher key, tagged with its mode.
    pub cipher: CipherKey,
    /// Integrity key with its sequence number, starting at zero.
    pub mac: MacKey,
}

impl Keys {
    /// The keys in force before the first key exchange: no cipher, no MAC, empty IV.
    pub fn plaintext() -> Keys {
        Keys { iv: Vec::new(), cipher: CipherKey::Plaintext, mac: MacKey::plaintext() }
    }
}

/// The two directions' key material from one completed key exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyMaterial {
    /// Keys for the client-to-server direction.
    pub cts: Keys,
    /// Keys for the server-to-client direction.
    pub stc: Keys,
}

/// Expands the shared secret and exchange hash into both directions' keys (RFC 4253,
/// section 7.2).
///
/// On the first exchange of a connection `session_id` is `H` itself; on later exchanges it stays
/// the `H` of the first one.
pub fn derive_keys(
    algos: &Negotiation,
    shared_secret: &BigUint,
    exchange_hash: &[u8],
    session_id: &[u8],
) -> KeyMaterial {
    let derive = |key_type: u8, key_len: usize| {
        derive_key(shared_secret, exchange_hash, session_id, key_type, key_len)
    };

    let cts = Keys {
        iv: derive(b'A', algos.cipher_cts.iv_len()),
        cipher: CipherKey::new(algos.cipher_cts, derive(b'C', algos.cipher_cts.key_len())),
        mac: MacKey {
            algo: algos.mac_cts,
            key: derive(b'E', algos.mac_cts.key_len()),
            seq: 0,
        },
    };
    let stc = Keys {
        iv: derive(b'B', algos.cipher_stc.iv_len()),
        cipher: CipherKey::new(algos.cipher_stc, derive(b'D', algos.cipher_stc.key_len())),
        mac: MacKey {
            algo: algos.mac_stc,
            key: derive(b'F', algos.mac_stc.key_len()),
            seq: 0,
        },
    };
    KeyMaterial { cts, stc }
}

fn derive_key(
    shared_secret: &BigUint,
    exchange_hash: &[u8],
    session_id: &[u8],
    key_type: u8,
    key_len: usize,
) -> Vec<u8> {
    // RFC 4253, section 7.2

    let mut to_hash_prefix = PacketEncode::new();
    to_hash_prefix.put_biguint(shared_secret);
    to_hash_prefix.put_raw(exchange_hash);

    let mut key = {
        let mut to_hash = to_hash_prefix.clone();
        to_hash.put_u8(key_type);
        to_hash.put_raw(session_id);
        compute_hash(&to_hash.finish())
    };

    while key.len() < key_len {
        let mut to_hash = to_hash_prefix.clone();
        to_hash.put_raw(&key);
        key.extend_from_slice(&compute_hash(&to_hash.finish()));
    }

    key.truncate(key_len);
    key
}
