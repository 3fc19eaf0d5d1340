//! The SSH message family as a tagged union.
//!
//! [`Message`] covers the transport, key exchange, authentication and connection messages of
//! RFC 4253, RFC 4252 and RFC 4254 that this core handles, one variant per message ID. Encoding
//! and decoding are symmetric: re-encoding a decoded message yields the original bytes, modulo
//! boolean and `mpint` canonicalization.
//!
//! A few connection-layer IDs (`SSH_MSG_GLOBAL_REQUEST`, `SSH_MSG_CHANNEL_OPEN`,
//! `SSH_MSG_CHANNEL_DATA` and friends) are recognized but not modeled; decoding them fails with
//! [`Error::PacketNotImplemented`] so the caller can answer `SSH_MSG_UNIMPLEMENTED`.
use bytes::Bytes;
use num_bigint_dig::BigUint;
use crate::codec::{PacketDecode, PacketEncode};
use crate::codes::msg;
use crate::error::{Error, Result};
pub use self::kex_init::KexInit;
pub use self::userauth::AuthMethod;

mod kex_init;
mod userauth;

/// One decoded SSH message.
#[derive(Debug, Clone, PartialEq)]
#[non_exhaustive]
pub enum Message {
    /// `SSH_MSG_DISCONNECT` (RFC 4253, section 11.1).
    Disconnect {
        reason_code: u32,
        description: String,
        language_tag: String,
    },
    /// `SSH_MSG_IGNORE` (RFC 4253, section 11.2).
    Ignore {
        data: Bytes,
    },
    /// `SSH_MSG_UNIMPLEMENTED` (RFC 4253, section 11.4).
    Unimplemented {
        packet_seq: u32,
    },
    /// `SSH_MSG_DEBUG` (RFC 4253, section 11.3).
    Debug {
        always_display: bool,
        message: String,
        language_tag: String,
    },
    /// `SSH_MSG_SERVICE_REQUEST` (RFC 4253, section 10).
    ServiceRequest {
        service: String,
    },
    /// `SSH_MSG_SERVICE_ACCEPT` (RFC 4253, section 10).
    ServiceAccept {
        service: String,
    },
    /// `SSH_MSG_KEXINIT` (RFC 4253, section 7.1).
    KexInit(KexInit),
    /// `SSH_MSG_NEWKEYS` (RFC 4253, section 7.3).
    NewKeys,
    /// `SSH_MSG_KEXDH_INIT` (RFC 4253, section 8).
    KexdhInit {
        client_eph_pubkey: BigUint,
    },
    /// `SSH_MSG_KEXDH_REPLY` (RFC 4253, section 8).
    KexdhReply {
        server_pubkey: Bytes,
        server_eph_pubkey: BigUint,
        exchange_hash_sign: Bytes,
    },
    /// `SSH_MSG_USERAUTH_REQUEST` (RFC 4252, section 5).
    UserauthRequest {
        user: String,
        service: String,
        method: AuthMethod,
    },
    /// `SSH_MSG_USERAUTH_FAILURE` (RFC 4252, section 5.1).
    UserauthFailure {
        methods: Vec<String>,
        partial_success: bool,
    },
    /// `SSH_MSG_USERAUTH_SUCCESS` (RFC 4252, section 5.1).
    UserauthSuccess,
    /// `SSH_MSG_USERAUTH_BANNER` (RFC 4252, section 5.4).
    UserauthBanner {
        message: String,
        language_tag: String,
    },
    /// `SSH_MSG_USERAUTH_PK_OK` (RFC 4252, section 7).
    UserauthPkOk {
        algo: String,
        key_blob: Bytes,
    },
    /// `SSH_MSG_REQUEST_SUCCESS` (RFC 4254, section 4). Request-specific reply data belongs to
    /// the connection layer and is not modeled.
    RequestSuccess,
    /// `SSH_MSG_REQUEST_FAILURE` (RFC 4254, section 4).
    RequestFailure,
    /// `SSH_MSG_CHANNEL_OPEN_CONFIRMATION` (RFC 4254, section 5.1).
    ChannelOpenConfirmation {
        recipient: u32,
        sender: u32,
        initial_window: u32,
        max_packet: u32,
    },
    /// `SSH_MSG_CHANNEL_OPEN_FAILURE` (RFC 4254, section 5.1).
    ChannelOpenFailure {
        recipient: u32,
        reason_code: u32,
        description: String,
        language_tag: String,
    },
    /// `SSH_MSG_CHANNEL_WINDOW_ADJUST` (RFC 4254, section 5.2).
    ChannelWindowAdjust {
        recipient: u32,
        bytes_to_add: u32,
    },
    /// `SSH_MSG_CHANNEL_EOF` (RFC 4254, section 5.3).
    ChannelEof {
        recipient: u32,
    },
    /// `SSH_MSG_CHANNEL_CLOSE` (RFC 4254, section 5.3).
    ChannelClose {
        recipient: u32,
    },
    /// `SSH_MSG_CHANNEL_SUCCESS` (RFC 4254, section 5.4).
    ChannelSuccess {
        recipient: u32,
    },
    /// `SSH_MSG_CHANNEL_FAILURE` (RFC 4254, section 5.4).
    ChannelFailure {
        recipient: u32,
    },
}

impl Message {
    /// The message ID carried in the first payload byte.
    pub fn msg_id(&self) -> u8 {
        match self {
            Message::Disconnect { .. } => msg::DISCONNECT,
            Message::Ignore { .. } => msg::IGNORE,
            Message::Unimplemented { .. } => msg::UNIMPLEMENTED,
            Message::Debug { .. } => msg::DEBUG,
            Message::ServiceRequest { .. } => msg::SERVICE_REQUEST,
            Message::ServiceAccept { .. } => msg::SERVICE_ACCEPT,
            Message::KexInit(_) => msg::KEXINIT,
            Message::NewKeys => msg::NEWKEYS,
            Message::KexdhInit { .. } => msg::KEXDH_INIT,
            Message::KexdhReply { .. } => msg::KEXDH_REPLY,
            Message::UserauthRequest { .. } => msg::USERAUTH_REQUEST,
            Message::UserauthFailure { .. } => msg::USERAUTH_FAILURE,
            Message::UserauthSuccess => msg::USERAUTH_SUCCESS,
            Message::UserauthBanner { .. } => msg::USERAUTH_BANNER,
            Message::UserauthPkOk { .. } => msg::USERAUTH_PK_OK,
            Message::RequestSuccess => msg::REQUEST_SUCCESS,
            Message::RequestFailure => msg::REQUEST_FAILURE,
            Message::ChannelOpenConfirmation { .. } => msg::CHANNEL_OPEN_CONFIRMATION,
            Message::ChannelOpenFailure { .. } => msg::CHANNEL_OPEN_FAILURE,
            Message::ChannelWindowAdjust { .. } => msg::CHANNEL_WINDOW_ADJUST,
            Message::ChannelEof { .. } => msg::CHANNEL_EOF,
            Message::ChannelClose { .. } => msg::CHANNEL_CLOSE,
            Message::ChannelSuccess { .. } => msg::CHANNEL_SUCCESS,
            Message::ChannelFailure { .. } => msg::CHANNEL_FAILURE,
        }
    }

    /// Encodes the message into a packet payload, message ID first.
    pub fn encode(&self) -> Bytes {
        let mut payload = PacketEncode::new();
        payload.put_u8(self.msg_id());
        match self {
            Message::Disconnect { reason_code, description, language_tag } => {
                payload.put_u32(*reason_code);
                payload.put_str(description);
                payload.put_str(language_tag);
            },
            Message::Ignore { data } => {
                payload.put_bytes(data);
            },
            Message::Unimplemented { packet_seq } => {
                payload.put_u32(*packet_seq);
            },
            Message::Debug { always_display, message, language_tag } => {
                payload.put_bool(*always_display);
                payload.put_str(message);
                payload.put_str(language_tag);
            },
            Message::ServiceRequest { service } | Message::ServiceAccept { service } => {
                payload.put_str(service);
            },
            Message::KexInit(kex_init) => {
                kex_init.encode(&mut payload);
            },
            Message::NewKeys | Message::UserauthSuccess
                | Message::RequestSuccess | Message::RequestFailure => {},
            Message::KexdhInit { client_eph_pubkey } => {
                payload.put_biguint(client_eph_pubkey);
            },
            Message::KexdhReply { server_pubkey, server_eph_pubkey, exchange_hash_sign } => {
                payload.put_bytes(server_pubkey);
                payload.put_biguint(server_eph_pubkey);
                payload.put_bytes(exchange_hash_sign);
            },
            Message::UserauthRequest { user, service, method } => {
                payload.put_str(user);
                payload.put_str(service);
                method.encode(&mut payload);
            },
            Message::UserauthFailure { methods, partial_success } => {
                payload.put_name_list(methods);
                payload.put_bool(*partial_success);
            },
            Message::UserauthBanner { message, language_tag } => {
                payload.put_str(message);
                payload.put_str(language_tag);
            },
            Message::UserauthPkOk { algo, key_blob } => {
                payload.put_str(algo);
                payload.put_bytes(key_blob);
            },
            Message::ChannelOpenConfirmation { recipient, sender, initial_window, max_packet } => {
                payload.put_u32(*recipient);
                payload.put_u32(*sender);
                payload.put_u32(*initial_window);
                payload.put_u32(*max_packet);
            },
            Message::ChannelOpenFailure { recipient, reason_code, description, language_tag } => {
                payload.put_u32(*recipient);
                payload.put_u32(*reason_code);
                payload.put_str(description);
                payload.put_str(language_tag);
            },
            Message::ChannelWindowAdjust { recipient, bytes_to_add } => {
                payload.put_u32(*recipient);
                payload.put_u32(*bytes_to_add);
            },
            Message::ChannelEof { recipient } | Message::ChannelClose { recipient }
                | Message::ChannelSuccess { recipient } | Message::ChannelFailure { recipient } => {
                payload.put_u32(*recipient);
            },
        }
        payload.finish()
    }

    /// Decodes one packet payload into a message.
    ///
    /// The payload must hold exactly one message: underruns and trailing bytes both fail with
    /// [`Error::Malformed`]. A recognized-but-unmodeled or unknown message ID fails with
    /// [`Error::PacketNotImplemented`].
    pub fn decode(payload: Bytes) -> Result<Message> {
        let mut payload = PacketDecode::new(payload);
        let msg_id = payload.get_u8()?;
        let message = match msg_id {
            msg::DISCONNECT => Message::Disconnect {
                reason_code: payload.get_u32()?,
                description: payload.get_string()?,
                language_tag: payload.get_string()?,
            },
            msg::IGNORE => Message::Ignore {
                data: payload.get_bytes()?,
            },
            msg::UNIMPLEMENTED => Message::Unimplemented {
                packet_seq: payload.get_u32()?,
            },
            msg::DEBUG => Message::Debug {
                always_display: payload.get_bool()?,
                message: payload.get_string()?,
                language_tag: payload.get_string()?,
            },
            msg::SERVICE_REQUEST => Message::ServiceRequest {
                service: payload.get_string()?,
            },
            msg::SERVICE_ACCEPT => Message::ServiceAccept {
                service: payload.get_string()?,
            },
            msg::KEXINIT => Message::KexInit(KexInit::decode(&mut payload)?),
            msg::NEWKEYS => Message::NewKeys,
            msg::KEXDH_INIT => Message::KexdhInit {
                client_eph_pubkey: payload.get_biguint()?,
            },
            msg::KEXDH_REPLY => Message::KexdhReply {
                server_pubkey: payload.get_bytes()?,
                server_eph_pubkey: payload.get_biguint()?,
                exchange_hash_sign: payload.get_bytes()?,
            },
            msg::USERAUTH_REQUEST => Message::UserauthRequest {
                user: payload.get_string()?,
                service: payload.get_string()?,
                method: AuthMethod::decode(&mut payload)?,
            },
            msg::USERAUTH_FAILURE => Message::UserauthFailure {
                methods: payload.get_name_list()?,
                partial_success: payload.get_bool()?,
            },
            msg::USERAUTH_SUCCESS => Message::UserauthSuccess,
            msg::USERAUTH_BANNER => Message::UserauthBanner {
                message: payload.get_string()?,
                language_tag: payload.get_string()?,
            },
            msg::USERAUTH_PK_OK => Message::UserauthPkOk {
                algo: payload.get_string()?,
                key_blob: payload.get_bytes()?,
            },
            msg::REQUEST_SUCCESS => Message::RequestSuccess,
            msg::REQUEST_FAILURE => Message::RequestFailure,
            msg::CHANNEL_OPEN_CONFIRMATION => Message::ChannelOpenConfirmation {
                recipient: payload.get_u32()?,
                sender: payload.get_u32()?,
                initial_window: payload.get_u32()?,
                max_packet: payload.get_u32()?,
            },
            msg::CHANNEL_OPEN_FAILURE => Message::ChannelOpenFailure {
                recipient: payload.get_u32()?,
                reason_code: payload.get_u32()?,
                description: payload.get_string()?,
                language_tag: payload.get_string()?,
            },
            msg::CHANNEL_WINDOW_ADJUST => Message::ChannelWindowAdjust {
                recipient: payload.get_u32()?,
                bytes_to_add: payload.get_u32()?,
            },
            msg::CHANNEL_EOF => Message::ChannelEof { recipient: payload.get_u32()? },
            msg::CHANNEL_CLOSE => Message::ChannelClose { recipient: payload.get_u32()? },
            msg::CHANNEL_SUCCESS => Message::ChannelSuccess { recipient: payload.get_u32()? },
            msg::CHANNEL_FAILURE => Message::ChannelFailure { recipient: payload.get_u32()? },
            _ => return Err(Error::PacketNotImplemented(msg_id)),
        };

        if payload.remaining_len() != 0 {
            return Err(Error::Malformed("trailing bytes after message".into()))
        }
        Ok(message)
    }
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng as _;
    use crate::codes::disconnect;
    use super::*;

    fn b<D: AsRef<[u8]> + ?Sized>(data: &D) -> Bytes {
        Bytes::copy_from_slice(data.as_ref())
    }

    fn check_round_trip(message: Message) {
        let encoded = message.encode();
        assert_eq!(encoded[0], message.msg_id());
        let decoded = Message::decode(encoded.clone()).unwrap();
        assert_eq!(decoded, message);
        // a second encode is bytewise stable
        assert_eq!(decoded.encode(), encoded);
    }

    #[test]
    fn test_round_trip_transport() {
        check_round_trip(Message::Disconnect {
            reason_code: disconnect::PROTOCOL_ERROR,
            description: "unexpected message".into(),
            language_tag: "".into(),
        });
        check_round_trip(Message::Ignore { data: b(b"\x00padding\xff") });
        check_round_trip(Message::Unimplemented { packet_seq: 33 });
        check_round_trip(Message::Debug {
            always_display: true,
            message: "late in the handshake".into(),
            language_tag: "en".into(),
        });
        check_round_trip(Message::ServiceRequest { service: "ssh-userauth".into() });
        check_round_trip(Message::ServiceAccept { service: "ssh-userauth".into() });
        check_round_trip(Message::NewKeys);
    }

    #[test]
    fn test_round_trip_kex() {
        let mut rng = rand_chacha::ChaCha8Rng::seed_from_u64(12);
        check_round_trip(Message::KexInit(KexInit::generate(&mut rng)));
        check_round_trip(Message::KexdhInit {
            client_eph_pubkey: BigUint::from(0xf00dd00du64),
        });
        check_round_trip(Message::KexdhReply {
            server_pubkey: b(b"a host key blob"),
            server_eph_pubkey: BigUint::from(0x1122334455u64),
            exchange_hash_sign: b(b"a signature blob"),
        });
    }

    #[test]
    fn test_round_trip_userauth() {
        for method in [
            AuthMethod::None,
            AuthMethod::Password { password: "hunter2".into() },
            AuthMethod::PasswordChange {
                old_password: "hunter2".into(),
                new_password: "correct horse".into(),
            },
            AuthMethod::Pubkey {
                algo: "ssh-rsa".into(),
                key_blob: b(b"key bytes"),
                signature: None,
            },
            AuthMethod::Pubkey {
                algo: "ssh-rsa".into(),
                key_blob: b(b"key bytes"),
                signature: Some(b(b"sig bytes")),
            },
            AuthMethod::Hostbased {
                algo: "ssh-rsa".into(),
                key_blob: b(b"key bytes"),
                hostname: "client.example.com".into(),
                hostuser: "alice".into(),
                signature: b(b"sig bytes"),
            },
        ] {
            check_round_trip(Message::UserauthRequest {
                user: "alice".into(),
                service: "ssh-connection".into(),
                method,
            });
        }

        check_round_trip(Message::UserauthFailure {
            methods: vec!["publickey".into(), "password".into()],
            partial_success: false,
        });
        check_round_trip(Message::UserauthSuccess);
        check_round_trip(Message::UserauthBanner {
            message: "mind the gap\n".into(),
            language_tag: "".into(),
        });
        check_round_trip(Message::UserauthPkOk {
            algo: "ssh-rsa".into(),
            key_blob: b(b"key bytes"),
        });
    }

    #[test]
    fn test_round_trip_connection() {
        check_round_trip(Message::RequestSuccess);
        check_round_trip(Message::RequestFailure);
        check_round_trip(Message::ChannelOpenConfirmation {
            recipient: 0, sender: 1, initial_window: 1 << 20, max_packet: 32768,
        });
        check_round_trip(Message::ChannelOpenFailure {
            recipient: 2,
            reason_code: 1,
            description: "administratively prohibited".into(),
            language_tag: "".into(),
        });
        check_round_trip(Message::ChannelWindowAdjust { recipient: 3, bytes_to_add: 4096 });
        check_round_trip(Message::ChannelEof { recipient: 4 });
        check_round_trip(Message::ChannelClose { recipient: 5 });
        check_round_trip(Message::ChannelSuccess { recipient: 6 });
        check_round_trip(Message::ChannelFailure { recipient: 7 });
    }

    #[test]
    fn test_decode_normalizes_bool() {
        // any non-zero boolean decodes as true, and re-encodes as 0x01
        let mut payload = PacketEncode::new();
        payload.put_u8(crate::codes::msg::DEBUG);
        payload.put_u8(0xff);
        payload.put_str("x");
        payload.put_str("");
        let decoded = Message::decode(payload.finish()).unwrap();
        match &decoded {
            Message::Debug { always_display, .. } => assert!(*always_display),
            other => panic!("unexpected message {:?}", other),
        }
        assert_eq!(decoded.encode()[1], 1);
    }

    #[test]
    fn test_decode_trailing_bytes() {
        let mut encoded = Message::NewKeys.encode().to_vec();
        encoded.push(0);
        match Message::decode(encoded.into()) {
            Err(Error::Malformed(msg)) => assert!(msg.contains("trailing")),
            other => panic!("unexpected result {:?}", other),
        }
    }

    #[test]
    fn test_decode_truncated() {
        let encoded = Message::Disconnect {
            reason_code: 2,
            description: "oops".into(),
            language_tag: "".into(),
        }.encode();
        for len in 0..encoded.len() - 1 {
            // omitting the trailing empty string also shortens the payload, so every prefix
            // must fail
            assert!(Message::decode(encoded.slice(..len)).is_err(), "prefix of {} decoded", len);
        }
    }

    #[test]
    fn test_decode_not_implemented() {
        for msg_id in [80u8, 90, 94, 95, 98, 255] {
            match Message::decode(b(&[msg_id, 0, 0, 0, 0])) {
                Err(Error::PacketNotImplemented(id)) => assert_eq!(id, msg_id),
                other => panic!("unexpected result {:?}", other),
            }
        }
    }
}
