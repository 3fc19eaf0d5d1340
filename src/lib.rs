//! The wire protocol core of SSH 2 (RFC 4251, 4252, 4253, 4254).
//!
//! This crate covers the version exchange, the binary message codec, algorithm negotiation and
//! session key derivation. It is purely synchronous and does no I/O: the encrypted packet
//! framing, channels and authentication policy live in the caller, which feeds decrypted
//! payloads in and writes encoded payloads out.
pub use crate::codec::{PacketEncode, PacketDecode};
pub use crate::error::{Result, Error};
pub use crate::handshake::Handshake;
pub use crate::ident::PeerIdent;
pub use crate::kex::{ExchangeHash, KeyMaterial, Keys};
pub use crate::msg::{AuthMethod, KexInit, Message};
pub use crate::negotiate::Negotiation;
pub use crate::pubkey::{Privkey, Pubkey};
pub use crate::util::CryptoRngCore;

pub mod cipher;
pub mod codec;
pub mod codes;
pub mod compress;
pub mod error;
pub mod handshake;
pub mod ident;
pub mod kex;
pub mod mac;
pub mod msg;
pub mod negotiate;
pub mod pubkey;
mod util;
