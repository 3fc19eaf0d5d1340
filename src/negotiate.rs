//! Algorithm negotiation (RFC 4253, section 7.1).
//!
//! Both sides announce their algorithm lists in `SSH_MSG_KEXINIT`; for every negotiable slot the
//! first entry on the **client's** list that the server also lists wins. The slots are checked
//! in a fixed order, and the failure reason names the first slot with an empty intersection,
//! because that string typically ends up in the `SSH_MSG_DISCONNECT` description.
use crate::cipher::CipherAlgo;
use crate::compress::CompressAlgo;
use crate::error::{Error, Result};
use crate::kex::KexAlgo;
use crate::mac::MacAlgo;
use crate::msg::KexInit;
use crate::pubkey::PubkeyAlgo;

/// The outcome of a successful negotiation: one algorithm per slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Negotiation {
    pub kex_algo: KexAlgo,
    pub server_pubkey_algo: PubkeyAlgo,
    pub cipher_cts: CipherAlgo,
    pub cipher_stc: CipherAlgo,
    pub mac_cts: MacAlgo,
    pub mac_stc: MacAlgo,
    pub compress_cts: CompressAlgo,
    pub compress_stc: CompressAlgo,
}

/// Intersects the two sides' `KEXINIT` lists.
///
/// The language lists take no part in negotiation. A name both sides list but this
/// implementation does not know still fails its slot, with the same per-slot reason.
pub fn negotiate(client: &KexInit, server: &KexInit) -> Result<Negotiation> {
    let kex_algo = common_name(&client.kex_algos, &server.kex_algos, "kex algorithm")
        .and_then(|name| known(KexAlgo::from_name(name), "kex algorithm"))?;

    let server_pubkey_algo = common_name(
        &client.server_pubkey_algos, &server.server_pubkey_algos, "host key algorithm")
        .and_then(|name| match PubkeyAlgo::from_name(name) {
            PubkeyAlgo::Unknown => known(None, "host key algorithm"),
            algo => Ok(algo),
        })?;

    let cipher_cts = common_name(
        &client.cipher_algos_cts, &server.cipher_algos_cts,
        "cipher algorithm client to server")
        .and_then(|name| known(CipherAlgo::from_name(name), "cipher algorithm client to server"))?;
    let cipher_stc = common_name(
        &client.cipher_algos_stc, &server.cipher_algos_stc,
        "cipher algorithm server to client")
        .and_then(|name| known(CipherAlgo::from_name(name), "cipher algorithm server to client"))?;

    let mac_cts = common_name(
        &client.mac_algos_cts, &server.mac_algos_cts, "mac algorithm client to server")
        .and_then(|name| known(MacAlgo::from_name(name), "mac algorithm client to server"))?;
    let mac_stc = common_name(
        &client.mac_algos_stc, &server.mac_algos_stc, "mac algorithm server to client")
        .and_then(|name| known(MacAlgo::from_name(name), "mac algorithm server to client"))?;

    let compress_cts = common_name(
        &client.compress_algos_cts, &server.compress_algos_cts,
        "compression algorithm client to server")
        .and_then(|name| known(
            CompressAlgo::from_name(name), "compression algorithm client to server"))?;
    let compress_stc = common_name(
        &client.compress_algos_stc, &server.compress_algos_stc,
        "compression algorithm server to client")
        .and_then(|name| known(
            CompressAlgo::from_name(name), "compression algorithm server to client"))?;

    let negotiation = Negotiation {
        kex_algo, server_pubkey_algo,
        cipher_cts, cipher_stc,
        mac_cts, mac_stc,
        compress_cts, compress_stc,
    };
    log::debug!("negotiated algorithms {:?}", negotiation);
    Ok(negotiation)
}

fn common_name<'a>(
    client_names: &'a [String],
    server_names: &[String],
    slot: &'static str,
) -> Result<&'a str> {
    for client_name in client_names {
        if server_names.contains(client_name) {
            log::debug!("negotiated algo {:?} for {}", client_name, slot);
            return Ok(client_name)
        }
    }
    Err(slot_failure(slot))
}

fn known<A>(algo: Option<A>, slot: &'static str) -> Result<A> {
    algo.ok_or_else(|| slot_failure(slot))
}

fn slot_failure(slot: &'static str) -> Error {
    Error::AlgoNegotiate(format!("Can't agree on {}", slot))
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng as _;
    use super::*;

    fn make_kex_init() -> KexInit {
        let mut rng = rand_chacha::ChaCha8Rng::seed_from_u64(5);
        KexInit::generate(&mut rng)
    }

    fn strings(names: &[&str]) -> Vec<String> {
        names.iter().map(|name| (*name).into()).collect()
    }

    #[test]
    fn test_negotiate_preferred() {
        let negotiation = negotiate(&make_kex_init(), &make_kex_init()).unwrap();
        assert_eq!(negotiation.kex_algo, KexAlgo::DhGroup14Sha1);
        assert_eq!(negotiation.server_pubkey_algo, PubkeyAlgo::SshRsa);
        assert_eq!(negotiation.cipher_cts, CipherAlgo::Aes128Ctr);
        assert_eq!(negotiation.mac_stc, MacAlgo::HmacSha2_256);
        assert_eq!(negotiation.compress_cts, CompressAlgo::None);
    }

    #[test]
    fn test_client_preference_wins() {
        let mut client = make_kex_init();
        let mut server = make_kex_init();
        client.cipher_algos_cts = strings(&["aes256-cbc", "aes128-ctr"]);
        server.cipher_algos_cts = strings(&["aes128-ctr", "aes256-cbc"]);

        let negotiation = negotiate(&client, &server).unwrap();
        assert_eq!(negotiation.cipher_cts, CipherAlgo::Aes256Cbc);
    }

    #[test]
    fn test_disjoint_kex_lists() {
        let mut client = make_kex_init();
        let mut server = make_kex_init();
        client.kex_algos = strings(&["diffie-hellman-group14-sha1"]);
        server.kex_algos = strings(&["curve25519-sha256"]);

        match negotiate(&client, &server) {
            Err(Error::AlgoNegotiate(reason)) =>
                assert_eq!(reason, "Can't agree on kex algorithm"),
            other => panic!("unexpected result {:?}", other),
        }
    }

    #[test]
    fn test_mac_failure_names_direction() {
        let mut client = make_kex_init();
        let server = make_kex_init();
        client.mac_algos_cts = strings(&["umac-64@openssh.com"]);

        match negotiate(&client, &server) {
            Err(Error::AlgoNegotiate(reason)) =>
                assert_eq!(reason, "Can't agree on mac algorithm client to server"),
            other => panic!("unexpected result {:?}", other),
        }
    }

    #[test]
    fn test_common_but_unknown_name_fails() {
        let mut client = make_kex_init();
        let mut server = make_kex_init();
        // both sides agree on a name this implementation does not support
        client.kex_algos = strings(&["sntrup761x25519-sha512", "diffie-hellman-group14-sha1"]);
        server.kex_algos = strings(&["sntrup761x25519-sha512"]);

        match negotiate(&client, &server) {
            Err(Error::AlgoNegotiate(reason)) =>
                assert_eq!(reason, "Can't agree on kex algorithm"),
            other => panic!("unexpected result {:?}", other),
        }
    }

    #[test]
    fn test_unknown_host_key_fails() {
        let mut client = make_kex_init();
        let mut server = make_kex_init();
        client.server_pubkey_algos = strings(&["ssh-ed25519"]);
        server.server_pubkey_algos = strings(&["ssh-ed25519"]);

        match negotiate(&client, &server) {
            Err(Error::AlgoNegotiate(reason)) =>
                assert_eq!(reason, "Can't agree on host key algorithm"),
            other => panic!("unexpected result {:?}", other),
        }
    }

    #[test]
    fn test_slot_order() {
        // when several slots fail, the report names the earliest one
        let mut client = make_kex_init();
        let server = make_kex_init();
        client.kex_algos = strings(&["curve25519-sha256"]);
        client.mac_algos_cts = strings(&["umac-64@openssh.com"]);

        match negotiate(&client, &server) {
            Err(Error::AlgoNegotiate(reason)) =>
                assert_eq!(reason, "Can't agree on kex algorithm"),
            other => panic!("unexpected result {:?}", other),
        }
    }
}
