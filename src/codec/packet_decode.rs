use bytes::{Buf as _, Bytes};
use num_bigint_dig::BigUint;
use std::str;
use crate::{Error, Result};

/// Upper bound on the declared length of a single `string`.
///
/// A peer that announces a longer string is trying to make us allocate without sending the data;
/// the decoder rejects such lengths before touching the buffer.
pub const MAX_STRING_LEN: usize = 256 * 1024;

/// Decoding of SSH packets and other payloads (low level API).
///
/// The format of SSH payloads is described in RFC 4251, section 5. This struct wraps a [`Bytes`]
/// instance and a read cursor; each `get_*` either advances the cursor past exactly one decoded
/// item or fails without reading past the end. The original, undecoded bytes stay reachable
/// through [`PacketDecode::as_original_bytes()`] because the key exchange hashes them verbatim.
#[derive(Debug)]
pub struct PacketDecode {
    orig_buf: Bytes,
    buf: Bytes,
}

impl PacketDecode {
    /// Wraps the bytes into [`PacketDecode`].
    pub fn new(buf: Bytes) -> PacketDecode {
        PacketDecode { orig_buf: buf.clone(), buf }
    }

    /// Decode a `byte`.
    pub fn get_u8(&mut self) -> Result<u8> {
        self.ensure(1)?;
        Ok(self.buf.get_u8())
    }

    /// Decode a `boolean`. Any non-zero byte is true.
    pub fn get_bool(&mut self) -> Result<bool> {
        self.get_u8().map(|x| x != 0)
    }

    /// Decode a `uint32`.
    pub fn get_u32(&mut self) -> Result<u32> {
        self.ensure(4)?;
        Ok(self.buf.get_u32())
    }

    /// Decode a `string`.
    pub fn get_bytes(&mut self) -> Result<Bytes> {
        let len = self.get_u32()? as usize;
        if len > MAX_STRING_LEN {
            return Err(Error::Malformed("string is too long".into()))
        }
        self.ensure(len)?;
        Ok(self.buf.split_to(len))
    }

    /// Decode a `string` with fixed length.
    pub fn get_byte_array<const N: usize>(&mut self) -> Result<[u8; N]> {
        let bytes = self.get_bytes()?;
        if bytes.len() != N {
            return Err(Error::Malformed("wrong size of `string`".into()))
        }

        let mut array = [0; N];
        array.copy_from_slice(&bytes);
        Ok(array)
    }

    /// Decode a `string` in UTF-8.
    pub fn get_string(&mut self) -> Result<String> {
        self.get_bytes().and_then(|x| decode_string(&x))
    }

    /// Decode a `name-list`.
    pub fn get_name_list(&mut self) -> Result<Vec<String>> {
        let list = self.get_string()?;
        if !list.is_ascii() {
            return Err(Error::Malformed("name-list is not us-ascii".into()))
        }
        if list.is_empty() {
            return Ok(Vec::new())
        }
        Ok(list.split(',').map(|x| x.into()).collect())
    }

    /// Decode a `mpint` as [`BigUint`].
    pub fn get_biguint(&mut self) -> Result<BigUint> {
        self.get_bytes().map(|x| BigUint::from_bytes_be(&x))
    }

    /// Skip `len` bytes.
    pub fn skip(&mut self, len: usize) -> Result<()> {
        self.ensure(len)?;
        Ok(self.buf.advance(len))
    }

    /// Read `len` bytes directly from the buffer.
    pub fn get_raw(&mut self, len: usize) -> Result<Bytes> {
        self.ensure(len)?;
        Ok(self.buf.split_to(len))
    }

    fn ensure(&self, min_remaining: usize) -> Result<()> {
        if min_remaining <= self.buf.remaining() {
            Ok(())
        } else {
            Err(Error::Malformed("unexpected end of packet".into()))
        }
    }

    /// Return a slice of the original bytes given to [`PacketDecode::new()`].
    pub fn as_original_bytes(&self) -> &[u8] {
        &self.orig_buf
    }

    /// Return the number of remaining undecoded bytes.
    pub fn remaining_len(&self) -> usize {
        self.buf.len()
    }
}

fn decode_string(bytes: &[u8]) -> Result<String> {
    match str::from_utf8(bytes) {
        Ok(string) => Ok(string.into()),
        Err(_) => Err(Error::Malformed("string is not valid utf-8".into())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decode<D: AsRef<[u8]> + ?Sized>(data: &D) -> PacketDecode {
        PacketDecode::new(Bytes::copy_from_slice(data.as_ref()))
    }

    #[test]
    fn test_get_uint32() {
        let mut d = decode(&[0,0,0,42, 0xde,0xad,0xbe,0xef]);
        assert_eq!(d.get_u32().unwrap(), 42);
        assert_eq!(d.get_u32().unwrap(), 0xdeadbeef);

        let mut d = decode(&[0xde,0xad]);
        assert!(d.get_u32().is_err());
    }

    #[test]
    fn test_get_bool() {
        let mut d = decode(&[0, 1, 0xff]);
        assert_eq!(d.get_bool().unwrap(), false);
        assert_eq!(d.get_bool().unwrap(), true);
        assert_eq!(d.get_bool().unwrap(), true);
    }

    #[test]
    fn test_get_bytes() {
        let mut d = decode(&[0,0,0,2, 10,20]);
        assert_eq!(d.get_bytes().unwrap().as_ref(), &[10,20]);
        assert_eq!(d.remaining_len(), 0);

        // truncated length prefix
        let mut d = decode(&[0,0,2]);
        assert!(d.get_bytes().is_err());

        // declared length overruns the buffer
        let mut d = decode(&[0,0,0,8, 10,20,30]);
        assert!(d.get_bytes().is_err());
    }

    #[test]
    fn test_get_bytes_over_cap() {
        // the declared length alone must be rejected, without the payload being present
        let mut d = decode(&[0,4,0,1, 10,20,30]);
        match d.get_bytes() {
            Err(Error::Malformed(msg)) => assert!(msg.contains("too long")),
            other => panic!("unexpected result {:?}", other),
        }
    }

    #[test]
    fn test_get_byte_array() {
        let mut d = decode(&[0,0,0,4, 1,2,3,4]);
        assert_eq!(d.get_byte_array::<4>().unwrap(), [1,2,3,4]);

        let mut d = decode(&[0,0,0,3, 1,2,3]);
        assert!(d.get_byte_array::<4>().is_err());
    }

    #[test]
    fn test_get_name_list() {
        let mut d = decode(&b"\x00\x00\x00\x00"[..]);
        assert_eq!(d.get_name_list().unwrap(), Vec::<String>::new());

        let mut d = decode(&b"\x00\x00\x00\x04zlib"[..]);
        assert_eq!(d.get_name_list().unwrap(), vec!["zlib"]);

        let mut d = decode(&b"\x00\x00\x00\x09zlib,none"[..]);
        assert_eq!(d.get_name_list().unwrap(), vec!["zlib", "none"]);

        let mut d = decode(&b"\x00\x00\x00\x05zlib,"[..]);
        assert_eq!(d.get_name_list().unwrap(), vec!["zlib", ""]);

        let mut d = decode(&b"\x00\x00\x00\x05,zlib"[..]);
        assert_eq!(d.get_name_list().unwrap(), vec!["", "zlib"]);

        let mut d = decode(&[0,0,0,2, 0xc3,0xa9]);
        assert!(d.get_name_list().is_err());
    }

    #[test]
    fn test_get_biguint() {
        let mut d = decode(&[0,0,0,0]);
        assert_eq!(d.get_biguint().unwrap(), BigUint::from(0u32));

        let mut d = decode(&[0,0,0,1, 42]);
        assert_eq!(d.get_biguint().unwrap(), BigUint::from(42u32));

        let mut d = decode(&[0,0,0,4, 0,128,20,30]);
        assert_eq!(d.get_biguint().unwrap(), BigUint::from(0x80141eu32));
    }

    #[test]
    fn test_original_bytes() {
        let mut d = decode(&[7, 0,0,0,1, 42]);
        d.get_u8().unwrap();
        d.get_bytes().unwrap();
        assert_eq!(d.as_original_bytes(), &[7, 0,0,0,1, 42]);
        assert_eq!(d.remaining_len(), 0);
    }
}
