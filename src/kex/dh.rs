use hex_literal::hex;
use num_bigint_dig::{BigUint, RandBigInt as _};
use crate::error::{Error, Result};
use crate::util::CryptoRngCore;
use super::KexAlgo;

/// One side of a finite-field Diffie-Hellman exchange (RFC 4253, section 8).
///
/// Constructing the value draws a fresh ephemeral private exponent; the public value is then
/// fixed. The same type serves both sides: what the client calls `e` is the server's `f`.
#[derive(Debug)]
pub struct DhKex {
    group: Group,
    our_eph_privkey: BigUint,
    our_eph_pubkey: BigUint,
}

impl DhKex {
    /// Generates an ephemeral keypair over the group of the given key exchange.
    pub fn new(algo: KexAlgo, rng: &mut dyn CryptoRngCore) -> DhKex {
        let group = algo.group();
        let our_eph_privkey =
            rng.as_rngcore().gen_biguint_range(&BigUint::from(1u32), &group.p_minus_1);
        Self::with_privkey(group, our_eph_privkey)
    }

    pub(crate) fn with_privkey(group: Group, our_eph_privkey: BigUint) -> DhKex {
        let our_eph_pubkey = group.g.modpow(&our_eph_privkey, &group.p);
        DhKex { group, our_eph_privkey, our_eph_pubkey }
    }

    /// Our public value (`e` on the client, `f` on the server).
    pub fn public(&self) -> &BigUint {
        &self.our_eph_pubkey
    }

    /// Computes the shared secret `K` from the peer's public value.
    ///
    /// The peer's value must lie strictly between 1 and `p - 1` (RFC 8268, section 4); anything
    /// else fails without touching the exponentiation.
    pub fn shared_secret(&self, peer_eph_pubkey: &BigUint) -> Result<BigUint> {
        if *peer_eph_pubkey <= BigUint::from(1u32) || *peer_eph_pubkey >= self.group.p_minus_1 {
            return Err(Error::Malformed("Can't compute shared secret".into()))
        }
        Ok(peer_eph_pubkey.modpow(&self.our_eph_privkey, &self.group.p))
    }
}

#[derive(Debug)]
pub(crate) struct Group {
    g: BigUint,
    p: BigUint,
    p_minus_1: BigUint,
}

impl Group {
    /// Oakley group 2, used by "diffie-hellman-group1-sha1" (the name says group 1, the group
    /// is 2).
    pub fn group_2() -> Group {
        // RFC 2409, section 6.2
        let g = BigUint::from(2u32);
        let p = BigUint::from_bytes_be(&hex!(
            "FFFFFFFF" "FFFFFFFF" "C90FDAA2" "2168C234" "C4C6628B" "80DC1CD1"
            "29024E08" "8A67CC74" "020BBEA6" "3B139B22" "514A0879" "8E3404DD"
            "EF9519B3" "CD3A431B" "302B0A6D" "F25F1437" "4FE1356D" "6D51C245"
            "E485B576" "625E7EC6" "F44C42E9" "A637ED6B" "0BFF5CB6" "F406B7ED"
            "EE386BFB" "5A899FA5" "AE9F2411" "7C4B1FE6" "49286651" "ECE65381"
            "FFFFFFFF" "FFFFFFFF"
        ));
        let p_minus_1 = &p - BigUint::from(1u32);
        Group { g, p, p_minus_1 }
    }

    /// Oakley group 14, used by "diffie-hellman-group14-sha1".
    pub fn group_14() -> Group {
        // RFC 3526, section 3
        let g = BigUint::from(2u32);
        let p = BigUint::from_bytes_be(&hex!(
            "FFFFFFFF" "FFFFFFFF" "C90FDAA2" "2168C234" "C4C6628B" "80DC1CD1"
            "29024E08" "8A67CC74" "020BBEA6" "3B139B22" "514A0879" "8E3404DD"
            "EF9519B3" "CD3A431B" "302B0A6D" "F25F1437" "4FE1356D" "6D51C245"
            "E485B576" "625E7EC6" "F44C42E9" "A637ED6B" "0BFF5CB6" "F406B7ED"
            "EE386BFB" "5A899FA5" "AE9F2411" "7C4B1FE6" "49286651" "ECE45B3D"
            "C2007CB8" "A163BF05" "98DA4836" "1C55D39A" "69163FA8" "FD24CF5F"
            "83655D23" "DCA3AD96" "1C62F356" "208552BB" "9ED52907" "7096966D"
            "670C354E" "4ABC9804" "F1746C08" "CA18217C" "32905E46" "2E36CE3B"
            "E39E772C" "180E8603" "9B2783A2" "EC07A28F" "B5C55DF0" "6F4C52C9"
            "DE2BCBF6" "95581718" "3995497C" "EA956AE5" "15D22618" "98FA0510"
            "15728E5A" "8AACAA68" "FFFFFFFF" "FFFFFFFF"
        ));
        let p_minus_1 = &p - BigUint::from(1u32);
        Group { g, p, p_minus_1 }
    }
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng as _;
    use super::*;

    fn make_rng(seed: u64) -> rand_chacha::ChaCha8Rng {
        rand_chacha::ChaCha8Rng::seed_from_u64(seed)
    }

    #[test]
    fn test_shared_secret_agrees() {
        let alice = DhKex::new(KexAlgo::DhGroup1Sha1, &mut make_rng(1));
        let bob = DhKex::new(KexAlgo::DhGroup1Sha1, &mut make_rng(2));

        let k_alice = alice.shared_secret(bob.public()).unwrap();
        let k_bob = bob.shared_secret(alice.public()).unwrap();
        assert_eq!(k_alice, k_bob);
    }

    #[test]
    fn test_unit_private_exponent() {
        // with x = 1 the math is transparent: e = g and K = y
        let kex = DhKex::with_privkey(Group::group_2(), BigUint::from(1u32));
        assert_eq!(*kex.public(), BigUint::from(2u32));

        let y = BigUint::from(0xdeadbeefu32);
        assert_eq!(kex.shared_secret(&y).unwrap(), y);
    }

    #[test]
    fn test_rejects_out_of_range_peer() {
        let kex = DhKex::new(KexAlgo::DhGroup14Sha1, &mut make_rng(3));

        for bad in [BigUint::from(0u32), BigUint::from(1u32)] {
            match kex.shared_secret(&bad) {
                Err(Error::Malformed(msg)) => assert_eq!(msg, "Can't compute shared secret"),
                other => panic!("unexpected result {:?}", other),
            }
        }

        let p_minus_1 = Group::group_14().p_minus_1;
        assert!(kex.shared_secret(&p_minus_1).is_err());
    }

    #[test]
    fn test_public_in_range() {
        let group = Group::group_2();
        let kex = DhKex::new(KexAlgo::DhGroup1Sha1, &mut make_rng(4));
        assert!(*kex.public() > BigUint::from(1u32));
        assert!(*kex.public() < group.p);
    }
}
