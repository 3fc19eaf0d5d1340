use cipher::{BlockEncryptMut, BlockDecryptMut, BlockCipher, KeyInit, InnerIvInit as _};
use cipher::inout::InOutBuf;
use super::{Encrypt, Decrypt};

pub(super) fn new_encrypt(key: &[u8], iv: &[u8]) -> Box<dyn Encrypt + Send> {
    match key.len() {
        16 => Box::new(new_cbc_enc::<aes::Aes128>(key, iv)),
        24 => Box::new(new_cbc_enc::<aes::Aes192>(key, iv)),
        32 => Box::new(new_cbc_enc::<aes::Aes256>(key, iv)),
        _ => panic!("invalid key length for aes-cbc"),
    }
}

pub(super) fn new_decrypt(key: &[u8], iv: &[u8]) -> Box<dyn Decrypt + Send> {
    match key.len() {
        16 => Box::new(new_cbc_dec::<aes::Aes128>(key, iv)),
        24 => Box::new(new_cbc_dec::<aes::Aes192>(key, iv)),
        32 => Box::new(new_cbc_dec::<aes::Aes256>(key, iv)),
        _ => panic!("invalid key length for aes-cbc"),
    }
}

struct BlockEncrypt<T> {
    encrypt: T,
}

struct BlockDecrypt<T> {
    decrypt: T,
}

fn new_cbc_enc<C>(key: &[u8], iv: &[u8]) -> BlockEncrypt<cbc::Encryptor<C>>
    where C: BlockCipher + cipher::BlockEncrypt + KeyInit
{
    let cipher = C::new_from_slice(key).expect("invalid key length for block cipher");
    let encrypt = cbc::Encryptor::inner_iv_slice_init(cipher, iv).expect("invalid iv length for cbc");
    BlockEncrypt { encrypt }
}

fn new_cbc_dec<C>(key: &[u8], iv: &[u8]) -> BlockDecrypt<cbc::Decryptor<C>>
    where C: BlockCipher + cipher::BlockDecrypt + KeyInit
{
    let cipher = C::new_from_slice(key).expect("invalid key length for block cipher");
    let decrypt = cbc::Decryptor::inner_iv_slice_init(cipher, iv).expect("invalid iv length for cbc");
    BlockDecrypt { decrypt }
}


impl<T: BlockEncryptMut> Encrypt for BlockEncrypt<T> {
    fn encrypt(&mut self, data: &mut [u8]) {
        let (blocks, tail) = InOutBuf::from(data).into_chunks();
        debug_assert!(tail.is_empty(), "plaintext is not aligned to block");
        self.encrypt.encrypt_blocks_inout_mut(blocks)
    }
}

impl<T: BlockDecryptMut> Decrypt for BlockDecrypt<T> {
    fn decrypt(&mut self, data: &mut [u8]) {
        let (blocks, tail) = InOutBuf::from(data).into_chunks();
        debug_assert!(tail.is_empty(), "ciphertext is not aligned to block");
        self.decrypt.decrypt_blocks_inout_mut(blocks)
    }
}
