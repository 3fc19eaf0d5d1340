use bytes::Bytes;
use crate::cipher::CipherAlgo;
use crate::codec::{PacketDecode, PacketEncode};
use crate::compress::CompressAlgo;
use crate::error::{Error, Result};
use crate::kex::KexAlgo;
use crate::mac::MacAlgo;
use crate::pubkey::PubkeyAlgo;
use crate::util::CryptoRngCore;

/// The body of `SSH_MSG_KEXINIT` (RFC 4253, section 7.1).
///
/// A decoded record keeps the exact payload it was parsed from in `input_buf`, because the
/// exchange hash consumes both sides' `KEXINIT` bytes verbatim; a locally built record has
/// `input_buf` of `None` until it is first encoded for sending.
#[derive(Debug, Clone)]
pub struct KexInit {
    pub cookie: [u8; 16],
    pub kex_algos: Vec<String>,
    pub server_pubkey_algos: Vec<String>,
    pub cipher_algos_cts: Vec<String>,
    pub cipher_algos_stc: Vec<String>,
    pub mac_algos_cts: Vec<String>,
    pub mac_algos_stc: Vec<String>,
    pub compress_algos_cts: Vec<String>,
    pub compress_algos_stc: Vec<String>,
    pub languages_cts: Vec<String>,
    pub languages_stc: Vec<String>,
    pub first_kex_packet_follows: bool,
    /// The payload this record was decoded from, message ID byte included.
    pub input_buf: Option<Bytes>,
}

impl KexInit {
    /// Builds the local `KEXINIT` from the preferred algorithm lists and a fresh random cookie.
    pub fn generate(rng: &mut dyn CryptoRngCore) -> KexInit {
        let mut cookie = [0; 16];
        rng.as_rngcore().fill_bytes(&mut cookie);

        fn names<A: Copy>(algos: &[A], name: fn(&A) -> &'static str) -> Vec<String> {
            algos.iter().map(|algo| name(algo).into()).collect()
        }

        KexInit {
            cookie,
            kex_algos: names(&KexAlgo::PREFERRED, |a| a.name()),
            server_pubkey_algos: names(&PubkeyAlgo::PREFERRED, |a| a.name()),
            cipher_algos_cts: names(&CipherAlgo::PREFERRED, |a| a.name()),
            cipher_algos_stc: names(&CipherAlgo::PREFERRED, |a| a.name()),
            mac_algos_cts: names(&MacAlgo::PREFERRED, |a| a.name()),
            mac_algos_stc: names(&MacAlgo::PREFERRED, |a| a.name()),
            compress_algos_cts: names(&CompressAlgo::PREFERRED, |a| a.name()),
            compress_algos_stc: names(&CompressAlgo::PREFERRED, |a| a.name()),
            languages_cts: Vec::new(),
            languages_stc: Vec::new(),
            first_kex_packet_follows: false,
            input_buf: None,
        }
    }

    pub(super) fn encode(&self, payload: &mut PacketEncode) {
        payload.put_raw(&self.cookie);
        payload.put_name_list(&self.kex_algos);
        payload.put_name_list(&self.server_pubkey_algos);
        payload.put_name_list(&self.cipher_algos_cts);
        payload.put_name_list(&self.cipher_algos_stc);
        payload.put_name_list(&self.mac_algos_cts);
        payload.put_name_list(&self.mac_algos_stc);
        payload.put_name_list(&self.compress_algos_cts);
        payload.put_name_list(&self.compress_algos_stc);
        payload.put_name_list(&self.languages_cts);
        payload.put_name_list(&self.languages_stc);
        payload.put_bool(self.first_kex_packet_follows);
        payload.put_u32(0); // reserved
    }

    pub(super) fn decode(payload: &mut PacketDecode) -> Result<KexInit> {
        let mut cookie = [0; 16];
        cookie.copy_from_slice(&payload.get_raw(16)?);

        let kex_init = KexInit {
            cookie,
            kex_algos: payload.get_name_list()?,
            server_pubkey_algos: payload.get_name_list()?,
            cipher_algos_cts: payload.get_name_list()?,
            cipher_algos_stc: payload.get_name_list()?,
            mac_algos_cts: payload.get_name_list()?,
            mac_algos_stc: payload.get_name_list()?,
            compress_algos_cts: payload.get_name_list()?,
            compress_algos_stc: payload.get_name_list()?,
            languages_cts: payload.get_name_list()?,
            languages_stc: payload.get_name_list()?,
            first_kex_packet_follows: payload.get_bool()?,
            input_buf: Some(Bytes::copy_from_slice(payload.as_original_bytes())),
        };

        if payload.get_u32()? != 0 {
            return Err(Error::Malformed("reserved field in kex init is not zero".into()))
        }
        Ok(kex_init)
    }
}

// `input_buf` is a cache of the wire encoding, not part of the record's value
impl PartialEq for KexInit {
    fn eq(&self, other: &KexInit) -> bool {
        self.cookie == other.cookie
            && self.kex_algos == other.kex_algos
            && self.server_pubkey_algos == other.server_pubkey_algos
            && self.cipher_algos_cts == other.cipher_algos_cts
            && self.cipher_algos_stc == other.cipher_algos_stc
            && self.mac_algos_cts == other.mac_algos_cts
            && self.mac_algos_stc == other.mac_algos_stc
            && self.compress_algos_cts == other.compress_algos_cts
            && self.compress_algos_stc == other.compress_algos_stc
            && self.languages_cts == other.languages_cts
            && self.languages_stc == other.languages_stc
            && self.first_kex_packet_follows == other.first_kex_packet_follows
    }
}
