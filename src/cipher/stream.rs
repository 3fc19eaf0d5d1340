use cipher::{InnerIvInit as _, KeyInit as _, StreamCipher as _, BlockSizeUser, StreamCipherCore};
use cipher::consts::U256;
use typenum::{IsLess, Le, NonZero};
use super::{Encrypt, Decrypt};

pub(super) fn new_encrypt(key: &[u8], iv: &[u8]) -> Box<dyn Encrypt + Send> {
    match key.len() {
        16 => Box::new(new_aes128_ctr(key, iv)),
        24 => Box::new(new_aes192_ctr(key, iv)),
        32 => Box::new(new_aes256_ctr(key, iv)),
        _ => panic!("invalid key length for aes-ctr"),
    }
}

pub(super) fn new_decrypt(key: &[u8], iv: &[u8]) -> Box<dyn Decrypt + Send> {
    match key.len() {
        16 => Box::new(new_aes128_ctr(key, iv)),
        24 => Box::new(new_aes192_ctr(key, iv)),
        32 => Box::new(new_aes256_ctr(key, iv)),
        _ => panic!("invalid key length for aes-ctr"),
    }
}

struct StreamCipher<T: BlockSizeUser>
    where T::BlockSize: IsLess<U256>,
          Le<T::BlockSize, U256>: NonZero
{
    cipher: cipher::StreamCipherCoreWrapper<T>,
}

fn new_aes128_ctr(key: &[u8], iv: &[u8]) -> StreamCipher<ctr::CtrCore<aes::Aes128, ctr::flavors::Ctr128BE>> {
    let aes = aes::Aes128::new_from_slice(key).expect("invalid key length for aes128-ctr");
    let ctr = ctr::CtrCore::inner_iv_slice_init(aes, iv).expect("invalid iv length for aes128-ctr");
    let cipher = cipher::StreamCipherCoreWrapper::from_core(ctr);
    StreamCipher { cipher }
}

fn new_aes192_ctr(key: &[u8], iv: &[u8]) -> StreamCipher<ctr::CtrCore<aes::Aes192, ctr::flavors::Ctr128BE>> {
    let aes = aes::Aes192::new_from_slice(key).expect("invalid key length for aes192-ctr");
    let ctr = ctr::CtrCore::inner_iv_slice_init(aes, iv).expect("invalid iv length for aes192-ctr");
    let cipher = cipher::StreamCipherCoreWrapper::from_core(ctr);
    StreamCipher { cipher }
}

fn new_aes256_ctr(key: &[u8], iv: &[u8]) -> StreamCipher<ctr::CtrCore<aes::Aes256, ctr::flavors::Ctr128BE>> {
    let aes = aes::Aes256::new_from_slice(key).expect("invalid key length for aes256-ctr");
    let ctr = ctr::CtrCore::inner_iv_slice_init(aes, iv).expect("invalid iv length for aes256-ctr");
    let cipher = cipher::StreamCipherCoreWrapper::from_core(ctr);
    StreamCipher { cipher }
}


impl<T: BlockSizeUser> Encrypt for StreamCipher<T>
    where T::BlockSize: IsLess<U256>,
          Le<T::BlockSize, U256>: NonZero,
          T: StreamCipherCore,
{
    fn encrypt(&mut self, data: &mut [u8]) {
        self.cipher.apply_keystream(data)
    }
}

impl<T: BlockSizeUser> Decrypt for StreamCipher<T>
    where T::BlockSize: IsLess<U256>,
          Le<T::BlockSize, U256>: NonZero,
          T: StreamCipherCore,
{
    fn decrypt(&mut self, data: &mut [u8]) {
        self.cipher.apply_keystream(data)
    }
}
