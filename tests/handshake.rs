use rand::SeedableRng as _;
use rand_chacha::ChaCha8Rng;
use sshwire::cipher::CipherAlgo;
use sshwire::mac::MacAlgo;
use sshwire::kex::KexAlgo;
use sshwire::{Handshake, KeyMaterial, Privkey};

fn make_server_key() -> Privkey {
    let mut rng = ChaCha8Rng::seed_from_u64(99);
    let privkey = rsa::RsaPrivateKey::new(&mut rng, 1024).expect("could not generate RSA key");
    Privkey::Rsa(privkey.into())
}

fn run_handshake(client_seed: u64, server_seed: u64) -> (Handshake, Handshake) {
    let privkey = make_server_key();
    let mut client = Handshake::client(
        "client_0.1", Box::new(ChaCha8Rng::seed_from_u64(client_seed)));
    let mut server = Handshake::server(
        "server_0.1", privkey, Box::new(ChaCha8Rng::seed_from_u64(server_seed)));

    let client_line = format!("{}\r\n", client.local_ident());
    let server_line = format!("{}\r\n", server.local_ident());
    assert_eq!(server.recv_ident(client_line.as_bytes()).unwrap(), client_line.len());
    assert_eq!(client.recv_ident(server_line.as_bytes()).unwrap(), server_line.len());

    // pump payloads both ways until the handshake settles
    for _ in 0..8 {
        if client.is_established() && server.is_established() {
            break
        }
        for payload in client.outbound() {
            server.recv_packet(payload).unwrap();
        }
        for payload in server.outbound() {
            client.recv_packet(payload).unwrap();
        }
    }
    assert!(client.is_established(), "client did not reach the established state");
    assert!(server.is_established(), "server did not reach the established state");
    (client, server)
}

#[test]
fn test_both_sides_derive_the_same_keys() {
    let (mut client, mut server) = run_handshake(1, 2);

    assert_eq!(client.session_id().unwrap(), server.session_id().unwrap());
    assert_eq!(client.session_id().unwrap().len(), 20);
    assert_eq!(client.algos().unwrap(), server.algos().unwrap());

    let client_keys = client.take_keys().unwrap();
    let server_keys = server.take_keys().unwrap();
    assert_eq!(client_keys, server_keys);
    assert_eq!(client_keys.cts.mac.seq, 0);
}

#[test]
fn test_preferred_algos_win() {
    let (client, _server) = run_handshake(3, 4);
    let algos = client.algos().unwrap();
    assert_eq!(algos.kex_algo, KexAlgo::DhGroup14Sha1);
    assert_eq!(algos.cipher_cts, CipherAlgo::Aes128Ctr);
    assert_eq!(algos.cipher_stc, CipherAlgo::Aes128Ctr);
    assert_eq!(algos.mac_cts, MacAlgo::HmacSha2_256);
}

#[test]
fn test_client_learns_the_server_key() {
    let (client, _server) = run_handshake(5, 6);
    let expected = make_server_key().pubkey();
    assert_eq!(client.server_pubkey().unwrap(), &expected);
}

#[test]
fn test_derived_keys_carry_a_working_packet_stream() {
    let (mut client, mut server) = run_handshake(7, 8);
    let client_keys: KeyMaterial = client.take_keys().unwrap();
    let server_keys: KeyMaterial = server.take_keys().unwrap();

    // client-to-server direction: the client encrypts and signs, the server decrypts and checks
    let plaintext = b"\x00\x00\x00\x1c\x0bthis is a packet-sized blob!";
    let mut packet = plaintext.to_vec();

    client_keys.cts.cipher.encrypt(&client_keys.cts.iv).encrypt(&mut packet);
    assert_ne!(&packet, plaintext);

    let mut tag = vec![0; client_keys.cts.mac.algo.tag_len()];
    client_keys.cts.mac.mac().sign(0, plaintext, &mut tag);

    server_keys.cts.cipher.decrypt(&server_keys.cts.iv).decrypt(&mut packet);
    assert_eq!(&packet, plaintext);
    assert!(server_keys.cts.mac.mac().verify(0, &packet, &tag).is_ok());

    // the two directions must not share key material
    assert_ne!(client_keys.cts.cipher, client_keys.stc.cipher);
    assert_ne!(client_keys.cts.iv, client_keys.stc.iv);
    assert_ne!(client_keys.cts.mac.key, client_keys.stc.mac.key);
}

#[test]
fn test_handshakes_with_different_cookies_differ() {
    let (mut first, _) = run_handshake(9, 10);
    let (mut second, _) = run_handshake(11, 12);
    assert_ne!(first.session_id().unwrap(), second.session_id().unwrap());
    assert_ne!(first.take_keys().unwrap(), second.take_keys().unwrap());
}
