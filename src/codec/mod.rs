//! Encoding and decoding of the RFC 4251 primitives.
//!
//! [`PacketEncode`] writes the six primitive types (`byte`, `boolean`, `uint32`, `string`,
//! `mpint`, `name-list`) into a growable buffer; [`PacketDecode`] reads them back from a bounded
//! cursor. Every SSH payload in this crate is built from these two types.
pub use self::packet_encode::PacketEncode;
pub use self::packet_decode::{PacketDecode, MAX_STRING_LEN};

mod packet_encode;
mod packet_decode;
