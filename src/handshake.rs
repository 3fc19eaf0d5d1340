//! The key exchange handshake, driven as a state machine.
//!
//! [`Handshake`] owns everything between the version exchange and `SSH_MSG_NEWKEYS`: it builds
//! the local `KEXINIT`, negotiates algorithms, runs the Diffie-Hellman exchange, checks (or
//! produces) the host key signature over the exchange hash, and derives the session keys. It
//! never touches the network: the caller sends the identification line and every payload drained
//! from [`Handshake::outbound()`], and feeds inbound bytes and payloads back in. Any message that
//! is not expected in the current state fails with [`Error::Protocol`]; the caller is expected to
//! answer with `SSH_MSG_DISCONNECT` and close the transport.
use bytes::Bytes;
use num_bigint_dig::BigUint;
use crate::error::{Error, Result};
use crate::ident::{self, PeerIdent};
use crate::kex::{derive_keys, DhKex, ExchangeHash, KeyMaterial};
use crate::msg::{KexInit, Message};
use crate::negotiate::{negotiate, Negotiation};
use crate::pubkey::{Privkey, Pubkey};
use crate::util::CryptoRngCore;

/// One side's view of the handshake.
pub struct Handshake {
    role: Role,
    state: State,
    rng: Box<dyn CryptoRngCore + Send>,
    our_ident: String,
    their_ident: Option<PeerIdent>,
    our_kex_init: KexInit,
    our_kex_init_payload: Bytes,
    their_kex_init_payload: Option<Bytes>,
    algos: Option<Negotiation>,
    dh: Option<DhKex>,
    server_pubkey: Option<Pubkey>,
    session_id: Option<Vec<u8>>,
    keys: Option<KeyMaterial>,
    send_queue: Vec<Bytes>,
}

enum Role {
    Client,
    Server { privkey: Privkey },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    AwaitingBanner,
    AwaitingPeerKexInit,
    AwaitingKexDhInit,
    AwaitingKexDhReply,
    AwaitingNewKeys,
    Established,
}

impl Handshake {
    /// Starts a client-side handshake.
    pub fn client(software: &str, rng: Box<dyn CryptoRngCore + Send>) -> Handshake {
        Handshake::new(Role::Client, software, rng)
    }

    /// Starts a server-side handshake that authenticates itself with `privkey`.
    pub fn server(software: &str, privkey: Privkey, rng: Box<dyn CryptoRngCore + Send>) -> Handshake {
        Handshake::new(Role::Server { privkey }, software, rng)
    }

    fn new(role: Role, software: &str, mut rng: Box<dyn CryptoRngCore + Send>) -> Handshake {
        let our_kex_init = KexInit::generate(&mut *rng);
        let our_kex_init_payload = Message::KexInit(our_kex_init.clone()).encode();
        Handshake {
            role,
            state: State::AwaitingBanner,
            rng,
            our_ident: ident::local_ident(software),
            their_ident: None,
            our_kex_init,
            our_kex_init_payload: our_kex_init_payload.clone(),
            their_kex_init_payload: None,
            algos: None,
            dh: None,
            server_pubkey: None,
            session_id: None,
            keys: None,
            send_queue: vec![our_kex_init_payload],
        }
    }

    /// Our identification line, without the CR-LF terminator.
    ///
    /// The caller must write this line (plus CR-LF) to the transport before any packet from
    /// [`Handshake::outbound()`].
    pub fn local_ident(&self) -> &str {
        &self.our_ident
    }

    /// Drains the packet payloads waiting to be sent.
    pub fn outbound(&mut self) -> Vec<Bytes> {
        std::mem::take(&mut self.send_queue)
    }

    /// Consumes the peer's identification line from the start of the inbound stream.
    ///
    /// Returns how many bytes were consumed; the rest of the buffer already belongs to the
    /// packet layer. Fails with [`Error::NeedMore`] until a full line is available.
    pub fn recv_ident(&mut self, buf: &[u8]) -> Result<usize> {
        if self.state != State::AwaitingBanner {
            return Err(Error::Protocol("received a second identification line"))
        }

        let (peer_ident, consumed) = ident::scan(buf)?;
        log::debug!("received peer identification {:?}", peer_ident.line);
        self.their_ident = Some(peer_ident);
        self.state = State::AwaitingPeerKexInit;
        Ok(consumed)
    }

    /// Feeds one decrypted, MAC-verified packet payload to the state machine.
    pub fn recv_packet(&mut self, payload: Bytes) -> Result<()> {
        match Message::decode(payload)? {
            Message::Ignore { .. } => Ok(()),
            Message::Debug { message, .. } => {
                log::debug!("peer sent SSH_MSG_DEBUG: {:?}", message);
                Ok(())
            },
            Message::KexInit(kex_init) => self.recv_kex_init(kex_init),
            Message::KexdhInit { client_eph_pubkey } => self.recv_kexdh_init(client_eph_pubkey),
            Message::KexdhReply { server_pubkey, server_eph_pubkey, exchange_hash_sign } =>
                self.recv_kexdh_reply(server_pubkey, server_eph_pubkey, exchange_hash_sign),
            Message::NewKeys => self.recv_new_keys(),
            _ => Err(Error::Protocol("received unexpected message during handshake")),
        }
    }

    /// True once both sides have exchanged `SSH_MSG_NEWKEYS`.
    pub fn is_established(&self) -> bool {
        self.state == State::Established
    }

    /// The negotiated algorithms, available once both `KEXINIT`s are in.
    pub fn algos(&self) -> Option<&Negotiation> {
        self.algos.as_ref()
    }

    /// The session id: the exchange hash of the first key exchange.
    pub fn session_id(&self) -> Option<&[u8]> {
        self.session_id.as_deref()
    }

    /// The derived key material for both directions.
    pub fn keys(&self) -> Option<&KeyMaterial> {
        self.keys.as_ref()
    }

    /// Moves the derived key material out, for handing to the packet layer.
    pub fn take_keys(&mut self) -> Option<KeyMaterial> {
        self.keys.take()
    }

    /// The peer's identification, once received.
    pub fn peer_ident(&self) -> Option<&PeerIdent> {
        self.their_ident.as_ref()
    }

    /// On the client, the server's host key after its signature checked out.
    ///
    /// Whether this key belongs to the host we meant to reach is the caller's decision.
    pub fn server_pubkey(&self) -> Option<&Pubkey> {
        self.server_pubkey.as_ref()
    }

    fn push_send(&mut self, message: Message) {
        self.send_queue.push(message.encode());
    }

    fn recv_kex_init(&mut self, kex_init: KexInit) -> Result<()> {
        if self.state != State::AwaitingPeerKexInit {
            return Err(Error::Protocol("received unexpected SSH_MSG_KEXINIT"))
        }
        if kex_init.first_kex_packet_follows {
            return Err(Error::Protocol("received SSH_MSG_KEXINIT with first_kex_packet_follows set"))
        }

        let algos = match self.role {
            Role::Client => negotiate(&self.our_kex_init, &kex_init)?,
            Role::Server { .. } => negotiate(&kex_init, &self.our_kex_init)?,
        };

        self.their_kex_init_payload = kex_init.input_buf;
        self.dh = Some(DhKex::new(algos.kex_algo, &mut *self.rng));
        self.algos = Some(algos);

        match self.role {
            Role::Client => {
                let client_eph_pubkey = self.dh.as_ref().unwrap().public().clone();
                self.push_send(Message::KexdhInit { client_eph_pubkey });
                self.state = State::AwaitingKexDhReply;
            },
            Role::Server { .. } => {
                self.state = State::AwaitingKexDhInit;
            },
        }
        Ok(())
    }

    fn recv_kexdh_init(&mut self, client_eph_pubkey: BigUint) -> Result<()> {
        if self.state != State::AwaitingKexDhInit {
            return Err(Error::Protocol("received unexpected SSH_MSG_KEXDH_INIT"))
        }
        let privkey = match &self.role {
            Role::Server { privkey } => privkey.clone(),
            Role::Client => return Err(Error::Protocol("received unexpected SSH_MSG_KEXDH_INIT")),
        };

        let dh = self.dh.take().unwrap();
        let shared_secret = dh.shared_secret(&client_eph_pubkey)?;
        let server_pubkey = privkey.pubkey().encode();

        let exchange_hash = ExchangeHash {
            client_ident: self.their_ident.as_ref().unwrap().line.as_bytes(),
            server_ident: self.our_ident.as_bytes(),
            client_kex_init: self.their_kex_init_payload.as_ref().unwrap(),
            server_kex_init: &self.our_kex_init_payload,
            server_pubkey: &server_pubkey,
            client_eph_pubkey: &client_eph_pubkey,
            server_eph_pubkey: dh.public(),
            shared_secret: &shared_secret,
        }.compute();
        let exchange_hash_sign = privkey.sign(&exchange_hash)?;

        self.push_send(Message::KexdhReply {
            server_pubkey,
            server_eph_pubkey: dh.public().clone(),
            exchange_hash_sign,
        });
        self.finish_kex(shared_secret, exchange_hash);
        Ok(())
    }

    fn recv_kexdh_reply(
        &mut self,
        server_pubkey: Bytes,
        server_eph_pubkey: BigUint,
        exchange_hash_sign: Bytes,
    ) -> Result<()> {
        if self.state != State::AwaitingKexDhReply {
            return Err(Error::Protocol("received unexpected SSH_MSG_KEXDH_REPLY"))
        }

        let dh = self.dh.take().unwrap();
        let shared_secret = dh.shared_secret(&server_eph_pubkey)?;

        let exchange_hash = ExchangeHash {
            client_ident: self.our_ident.as_bytes(),
            server_ident: self.their_ident.as_ref().unwrap().line.as_bytes(),
            client_kex_init: &self.our_kex_init_payload,
            server_kex_init: self.their_kex_init_payload.as_ref().unwrap(),
            server_pubkey: &server_pubkey,
            client_eph_pubkey: dh.public(),
            server_eph_pubkey: &server_eph_pubkey,
            shared_secret: &shared_secret,
        }.compute();

        let pubkey = Pubkey::decode(server_pubkey)?;
        pubkey.verify(&exchange_hash, exchange_hash_sign)?;
        log::debug!("verified signature of server host key {}", pubkey);
        self.server_pubkey = Some(pubkey);

        self.finish_kex(shared_secret, exchange_hash);
        Ok(())
    }

    fn recv_new_keys(&mut self) -> Result<()> {
        if self.state != State::AwaitingNewKeys {
            return Err(Error::Protocol("received unexpected SSH_MSG_NEWKEYS"))
        }
        log::debug!("handshake established");
        self.state = State::Established;
        Ok(())
    }

    fn finish_kex(&mut self, shared_secret: BigUint, exchange_hash: Vec<u8>) {
        let session_id = self.session_id.get_or_insert_with(|| exchange_hash.clone());
        let keys = derive_keys(
            self.algos.as_ref().unwrap(), &shared_secret, &exchange_hash, session_id);
        self.keys = Some(keys);
        self.push_send(Message::NewKeys);
        self.state = State::AwaitingNewKeys;
    }
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng as _;
    use super::*;

    fn make_client(seed: u64) -> Handshake {
        let rng = Box::new(rand_chacha::ChaCha8Rng::seed_from_u64(seed));
        Handshake::client("testclient_1", rng)
    }

    #[test]
    fn test_kex_init_is_queued_up_front() {
        let mut client = make_client(1);
        let outbound = client.outbound();
        assert_eq!(outbound.len(), 1);
        assert_eq!(outbound[0][0], 20);
        assert!(client.outbound().is_empty());
    }

    #[test]
    fn test_local_ident() {
        let client = make_client(2);
        assert_eq!(client.local_ident(), "SSH-2.0-testclient_1");
    }

    #[test]
    fn test_recv_ident_twice() {
        let mut client = make_client(3);
        client.recv_ident(b"SSH-2.0-peer\r\n").unwrap();
        assert!(matches!(
            client.recv_ident(b"SSH-2.0-peer\r\n"),
            Err(Error::Protocol(_))));
    }

    #[test]
    fn test_recv_ident_need_more() {
        let mut client = make_client(4);
        assert!(matches!(client.recv_ident(b"SSH-2.0-pe"), Err(Error::NeedMore)));
        // the scanner consumed nothing, so feeding the full line still works
        let consumed = client.recv_ident(b"SSH-2.0-peer\r\n").unwrap();
        assert_eq!(consumed, 14);
        assert_eq!(client.peer_ident().unwrap().software, "peer");
    }

    #[test]
    fn test_packet_before_ident() {
        let mut client = make_client(5);
        let kex_init = Message::KexInit(KexInit::generate(
            &mut rand_chacha::ChaCha8Rng::seed_from_u64(6))).encode();
        assert!(matches!(client.recv_packet(kex_init), Err(Error::Protocol(_))));
    }

    #[test]
    fn test_client_rejects_kexdh_init() {
        let mut client = make_client(7);
        client.recv_ident(b"SSH-2.0-peer\r\n").unwrap();
        let message = Message::KexdhInit { client_eph_pubkey: BigUint::from(4u32) };
        assert!(matches!(client.recv_packet(message.encode()), Err(Error::Protocol(_))));
    }

    #[test]
    fn test_rejects_first_kex_packet_follows() {
        let mut client = make_client(8);
        client.recv_ident(b"SSH-2.0-peer\r\n").unwrap();

        let mut kex_init = KexInit::generate(&mut rand_chacha::ChaCha8Rng::seed_from_u64(9));
        kex_init.first_kex_packet_follows = true;
        let result = client.recv_packet(Message::KexInit(kex_init).encode());
        assert!(matches!(result, Err(Error::Protocol(_))));
    }

    #[test]
    fn test_unexpected_userauth_message() {
        let mut client = make_client(10);
        client.recv_ident(b"SSH-2.0-peer\r\n").unwrap();
        let result = client.recv_packet(Message::UserauthSuccess.encode());
        assert!(matches!(result, Err(Error::Protocol(_))));
    }

    #[test]
    fn test_ignore_and_debug_are_tolerated() {
        let mut client = make_client(11);
        client.recv_ident(b"SSH-2.0-peer\r\n").unwrap();
        let ignore = Message::Ignore { data: Bytes::from_static(b"x") };
        let debug = Message::Debug {
            always_display: false,
            message: "hello".into(),
            language_tag: "".into(),
        };
        assert!(client.recv_packet(ignore.encode()).is_ok());
        assert!(client.recv_packet(debug.encode()).is_ok());
        assert!(!client.is_established());
    }
}
