use bytes::Bytes;
use rsa::{PublicKey as _, PublicKeyParts as _};
use sha1::{Digest as _, Sha1};
use std::fmt;
use crate::codec::{PacketDecode, PacketEncode};
use crate::error::{Result, Error};
use super::SignatureVerified;

/// RSA public key.
///
/// You can convert it to and from [`rsa::RsaPublicKey`] using `from()`/`into()`.
#[derive(Debug, Clone, PartialEq)]
pub struct RsaPubkey {
    pub(crate) pubkey: rsa::RsaPublicKey,
}

/// RSA whole key (private and public parts).
///
/// You can convert it to and from [`rsa::RsaPrivateKey`] using `from()`/`into()`.
#[derive(Clone)]
pub struct RsaPrivkey {
    pub(crate) privkey: rsa::RsaPrivateKey,
}

impl RsaPrivkey {
    /// Return the public key associated with this private key.
    pub fn pubkey(&self) -> RsaPubkey {
        RsaPubkey { pubkey: self.privkey.to_public_key() }
    }
}

pub(super) fn verify(pubkey: &RsaPubkey, message: &[u8], signature_blob: Bytes) -> Result<SignatureVerified> {
    let mut signature_blob = PacketDecode::new(signature_blob);
    if signature_blob.get_string()? != "ssh-rsa" {
        return Err(Error::Malformed("unexpected signature format".into()))
    }

    let signature = signature_blob.get_bytes()?;
    let hashed = Sha1::digest(message);

    let padding = rsa::PaddingScheme::new_pkcs1v15_sign::<Sha1>();
    match pubkey.pubkey.verify(padding, hashed.as_slice(), &signature) {
        Ok(_) => Ok(SignatureVerified::assertion()),
        Err(_) => Err(Error::Malformed("signature verification failed".into())),
    }
}

pub(super) fn sign(privkey: &RsaPrivkey, message: &[u8]) -> Result<Bytes> {
    let hashed = Sha1::digest(message);

    // the padding scheme prepends the DER prefix for id-sha1 (RFC 3447, section 9.2)
    let padding = rsa::PaddingScheme::new_pkcs1v15_sign::<Sha1>();
    let signature = privkey.privkey.sign(padding, hashed.as_slice())
        .map_err(|_| Error::Crypto("could not sign with RSA"))?;

    let mut signature_blob = PacketEncode::new();
    signature_blob.put_str("ssh-rsa");
    signature_blob.put_bytes(&signature);
    Ok(signature_blob.finish())
}

pub(super) fn encode(blob: &mut PacketEncode, pubkey: &RsaPubkey) {
    blob.put_str("ssh-rsa");
    blob.put_biguint(pubkey.pubkey.e());
    blob.put_biguint(pubkey.pubkey.n());
}

pub(super) fn decode(blob: &mut PacketDecode) -> Result<RsaPubkey> {
    let e = blob.get_biguint()?;
    let n = blob.get_biguint()?;
    let pubkey = rsa::RsaPublicKey::new(n, e)
        .map_err(|_| Error::Malformed("decoded ssh-rsa pubkey is invalid".into()))?;

    Ok(RsaPubkey { pubkey })
}

impl From<rsa::RsaPublicKey> for RsaPubkey {
    fn from(pubkey: rsa::RsaPublicKey) -> Self { Self { pubkey } }
}

impl From<RsaPubkey> for rsa::RsaPublicKey {
    fn from(pubkey: RsaPubkey) -> Self { pubkey.pubkey }
}

impl From<rsa::RsaPrivateKey> for RsaPrivkey {
    fn from(privkey: rsa::RsaPrivateKey) -> Self { Self { privkey } }
}

impl From<RsaPrivkey> for rsa::RsaPrivateKey {
    fn from(privkey: RsaPrivkey) -> Self { privkey.privkey }
}

impl fmt::Display for RsaPubkey {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "rsa n {:x}, e {}", self.pubkey.n(), self.pubkey.e())
    }
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng as _;
    use crate::pubkey::{Pubkey, Privkey};
    use super::*;

    fn make_privkey() -> Privkey {
        let mut rng = rand_chacha::ChaCha8Rng::seed_from_u64(7);
        let privkey = rsa::RsaPrivateKey::new(&mut rng, 1024).unwrap();
        Privkey::Rsa(RsaPrivkey::from(privkey))
    }

    #[test]
    fn test_blob_round_trip() {
        let pubkey = make_privkey().pubkey();
        let decoded = Pubkey::decode(pubkey.encode()).unwrap();
        assert_eq!(decoded, pubkey);
    }

    #[test]
    fn test_authorized_key_round_trip() {
        let pubkey = make_privkey().pubkey();
        let line = pubkey.to_authorized_key();
        assert!(line.starts_with("ssh-rsa "));
        assert_eq!(Pubkey::from_authorized_key(&line).unwrap(), pubkey);

        let with_comment = format!("{} user@host", line);
        assert_eq!(Pubkey::from_authorized_key(&with_comment).unwrap(), pubkey);
    }

    #[test]
    fn test_sign_verify() {
        let privkey = make_privkey();
        let pubkey = privkey.pubkey();

        let blob = privkey.sign(b"exchange hash").unwrap();
        assert!(pubkey.verify(b"exchange hash", blob.clone()).is_ok());
        assert!(pubkey.verify(b"a different hash", blob).is_err());
    }

    #[test]
    fn test_verify_rejects_wrong_algo_name() {
        let privkey = make_privkey();
        let pubkey = privkey.pubkey();

        let mut blob = PacketEncode::new();
        blob.put_str("rsa-sha2-256");
        blob.put_bytes(&[0; 128]);
        assert!(pubkey.verify(b"exchange hash", blob.finish()).is_err());
    }
}
