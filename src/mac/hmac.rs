use cipher::KeyInit;
use hmac::{digest, Hmac};
use std::marker::PhantomData;
use crate::error::{Result, Error};
use super::{MacAlgo, Mac, MacVerified};

pub(super) fn new_mac(algo: MacAlgo, key: &[u8]) -> Box<dyn Mac + Send> {
    let tag_len = algo.tag_len();
    match algo {
        MacAlgo::HmacMd5 | MacAlgo::HmacMd5_96 =>
            Box::new(HmacMac::<Hmac<md5::Md5>>::new(key, tag_len)),
        MacAlgo::HmacSha1 | MacAlgo::HmacSha1_96 =>
            Box::new(HmacMac::<Hmac<sha1::Sha1>>::new(key, tag_len)),
        MacAlgo::HmacSha2_256 =>
            Box::new(HmacMac::<Hmac<sha2::Sha256>>::new(key, tag_len)),
        MacAlgo::HmacSha2_512 =>
            Box::new(HmacMac::<Hmac<sha2::Sha512>>::new(key, tag_len)),
        MacAlgo::Plaintext => panic!("the plaintext mac is not keyed"),
    }
}

struct HmacMac<M> {
    key: Vec<u8>,
    tag_len: usize,
    _phantom: PhantomData<M>,
}

impl<M> HmacMac<M> {
    fn new(key: &[u8], tag_len: usize) -> HmacMac<M> {
        HmacMac { key: key.into(), tag_len, _phantom: PhantomData }
    }
}

impl<M: digest::Mac + KeyInit + Send> Mac for HmacMac<M> {
    fn sign(&mut self, packet_seq: u32, plaintext: &[u8], tag: &mut [u8]) {
        let mut digest = <M as digest::Mac>::new_from_slice(&self.key).unwrap();
        digest.update(&packet_seq.to_be_bytes());
        digest.update(plaintext);
        tag.copy_from_slice(&digest.finalize().into_bytes()[..self.tag_len]);
    }

    fn verify(&mut self, packet_seq: u32, plaintext: &[u8], tag: &[u8]) -> Result<MacVerified> {
        if tag.len() != self.tag_len {
            return Err(Error::Malformed("mac tag has the wrong length".into()))
        }

        let mut digest = <M as digest::Mac>::new_from_slice(&self.key).unwrap();
        digest.update(&packet_seq.to_be_bytes());
        digest.update(plaintext);
        match digest.verify_truncated_left(tag) {
            Ok(_) => Ok(MacVerified::assertion()),
            Err(_) => Err(Error::Malformed("mac verification failed".into())),
        }
    }
}
