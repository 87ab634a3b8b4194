//! Bitcoin address derivation.
//!
//! Glue between the curve layer and the hash/encoding services: hash160
//! of serialized public keys, P2PKH / P2SH-P2WPKH / Bech32 address
//! construction, and WIF private-key encode/decode.
//!
//! The 4-way batched paths do not serialize keys to bytes at all: the
//! KEYBUFF packers below write a public key's 32-bit words straight
//! into the SHA-256 input schedule in big-endian order, with the
//! Merkle-Damgård padding byte and the bit-length word precomputed
//! (0x108 bits for a compressed key, 0x208 for an uncompressed one,
//! 0xB0 for the 22-byte P2SH redeem script, 0xA8 for the 21-byte
//! checksum input).

use bech32::{u5, ToBase32, Variant};

use crate::hash160::{
    ripemd160_32, ripemd160_x4_32, sha256, sha256_33, sha256_65,
    sha256_checksum, sha256_x4_1b, sha256_x4_2b, sha256_x4_checksum,
};
use crate::secp256k1::Point;
use crate::zint::Zi320;

/// Address kinds supported by the derivation helpers.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AddrKind {
    P2pkh = 0,
    P2sh = 1,
    Bech32 = 2,
}

// Compressed-key schedule: prefix byte, big-endian x, padding, 264 bits.
fn keybuff_compressed(p: &Point) -> [u32; 16] {
    let x = p.x();
    let mut b = [0u32; 16];
    b[0] = (x.dword(7) >> 8)
        | ((0x02 + (p.y().is_odd() as u32)) << 24);
    for i in 1..8 {
        b[i] = (x.dword(7 - i) >> 8) | (x.dword(8 - i) << 24);
    }
    b[8] = 0x0080_0000 | (x.dword(0) << 24);
    b[15] = 0x108;
    b
}

// Uncompressed-key schedule: 0x04, x, y, padding, 520 bits (two blocks).
fn keybuff_uncompressed(p: &Point) -> [u32; 32] {
    let x = p.x();
    let y = p.y();
    let mut b = [0u32; 32];
    b[0] = (x.dword(7) >> 8) | 0x0400_0000;
    for i in 1..8 {
        b[i] = (x.dword(7 - i) >> 8) | (x.dword(8 - i) << 24);
    }
    b[8] = (y.dword(7) >> 8) | (x.dword(0) << 24);
    for i in 9..16 {
        b[i] = (y.dword(15 - i) >> 8) | (y.dword(16 - i) << 24);
    }
    b[16] = 0x0080_0000 | (y.dword(0) << 24);
    b[31] = 0x208;
    b
}

// P2SH redeem script (OP_0 PUSH20 <hash>) schedule: 22 bytes, 176 bits.
fn keybuff_script(h: &[u8; 20]) -> [u32; 16] {
    let mut b = [0u32; 16];
    b[0] = 0x0014_0000 | ((h[0] as u32) << 8) | (h[1] as u32);
    for i in 0..4 {
        b[i + 1] = ((h[4 * i + 2] as u32) << 24)
            | ((h[4 * i + 3] as u32) << 16)
            | ((h[4 * i + 4] as u32) << 8)
            | (h[4 * i + 5] as u32);
    }
    b[5] = ((h[18] as u32) << 24) | ((h[19] as u32) << 16) | 0x8000;
    b[15] = 0xB0;
    b
}

// Checksum input schedule: 21-byte versioned hash, 168 bits.
fn keybuff_checksum(a: &[u8; 21]) -> [u32; 16] {
    let mut b = [0u32; 16];
    for i in 0..5 {
        b[i] = ((a[4 * i] as u32) << 24)
            | ((a[4 * i + 1] as u32) << 16)
            | ((a[4 * i + 2] as u32) << 8)
            | (a[4 * i + 3] as u32);
    }
    b[5] = ((a[20] as u32) << 24) | 0x0080_0000;
    b[15] = 0xA8;
    b
}

/// Hash160 (RIPEMD-160 of SHA-256) of a public key serialization; for
/// P2SH, of the P2WPKH redeem script wrapping the P2PKH hash. The point
/// must be affine.
pub fn hash160(kind: AddrKind, compressed: bool, p: &Point) -> [u8; 20] {
    match kind {
        AddrKind::P2pkh | AddrKind::Bech32 => {
            let sh = if compressed {
                sha256_33(&p.encode_compressed())
            } else {
                sha256_65(&p.encode_uncompressed())
            };
            ripemd160_32(&sh)
        }
        AddrKind::P2sh => {
            let mut script = [0u8; 22];
            script[0] = 0x00;
            script[1] = 0x14;
            script[2..].copy_from_slice(&hash160(
                AddrKind::P2pkh, compressed, p));
            ripemd160_32(&sha256(&script))
        }
    }
}

/// 4-way hash160: the keys go through the pre-padded KEYBUFF schedules
/// and the batched hash entry points. All points must be affine.
pub fn hash160_x4(kind: AddrKind, compressed: bool, pts: &[Point; 4])
    -> [[u8; 20]; 4]
{
    match kind {
        AddrKind::P2pkh | AddrKind::Bech32 => {
            if compressed {
                let b = [
                    keybuff_compressed(&pts[0]),
                    keybuff_compressed(&pts[1]),
                    keybuff_compressed(&pts[2]),
                    keybuff_compressed(&pts[3]),
                ];
                ripemd160_x4_32(&sha256_x4_1b(&b))
            } else {
                let b = [
                    keybuff_uncompressed(&pts[0]),
                    keybuff_uncompressed(&pts[1]),
                    keybuff_uncompressed(&pts[2]),
                    keybuff_uncompressed(&pts[3]),
                ];
                ripemd160_x4_32(&sha256_x4_2b(&b))
            }
        }
        AddrKind::P2sh => {
            let kh = hash160_x4(AddrKind::P2pkh, compressed, pts);
            let b = [
                keybuff_script(&kh[0]),
                keybuff_script(&kh[1]),
                keybuff_script(&kh[2]),
                keybuff_script(&kh[3]),
            ];
            ripemd160_x4_32(&sha256_x4_1b(&b))
        }
    }
}

// Base58Check: payload followed by the first four bytes of its double
// SHA-256.
fn base58check(payload: &[u8]) -> String {
    let mut v = payload.to_vec();
    v.extend_from_slice(&sha256_checksum(payload));
    bs58::encode(v).into_string()
}

// Native segwit v0 address for a 20-byte program.
fn segwit_address(prog: &[u8; 20]) -> String {
    let mut data = vec![ u5::try_from_u8(0).unwrap() ];
    data.extend(prog.to_base32());
    bech32::encode("bc", data, Variant::Bech32).unwrap()
}

/// Address of a 20-byte hash (already script-hashed for P2SH).
pub fn address_from_hash160(kind: AddrKind, h: &[u8; 20]) -> String {
    match kind {
        AddrKind::Bech32 => segwit_address(h),
        AddrKind::P2pkh | AddrKind::P2sh => {
            let mut a = [0u8; 21];
            a[0] = if kind == AddrKind::P2pkh { 0x00 } else { 0x05 };
            a[1..].copy_from_slice(h);
            base58check(&a)
        }
    }
}

/// Address of a public key. P2SH and Bech32 addresses exist only for
/// compressed keys; None otherwise. The point must be affine.
pub fn address(kind: AddrKind, compressed: bool, p: &Point)
    -> Option<String>
{
    if !compressed && kind != AddrKind::P2pkh {
        return None;
    }
    Some(address_from_hash160(kind, &hash160(kind, compressed, p)))
}

/// 4-way address construction from 20-byte hashes, using the batched
/// checksum path for the Base58Check kinds.
pub fn address_x4(kind: AddrKind, h: &[[u8; 20]; 4]) -> [String; 4] {
    match kind {
        AddrKind::Bech32 => [
            segwit_address(&h[0]),
            segwit_address(&h[1]),
            segwit_address(&h[2]),
            segwit_address(&h[3]),
        ],
        AddrKind::P2pkh | AddrKind::P2sh => {
            let version = if kind == AddrKind::P2pkh { 0x00 } else { 0x05 };
            let mut a = [[0u8; 21]; 4];
            let mut b = [[0u32; 16]; 4];
            for i in 0..4 {
                a[i][0] = version;
                a[i][1..].copy_from_slice(&h[i]);
                b[i] = keybuff_checksum(&a[i]);
            }
            let chk = sha256_x4_checksum(&b);
            core::array::from_fn(|i| {
                let mut v = [0u8; 25];
                v[..21].copy_from_slice(&a[i]);
                v[21..].copy_from_slice(&chk[i]);
                bs58::encode(v).into_string()
            })
        }
    }
}

/// WIF encoding of a private key (0x80 prefix, optional 0x01 compressed
/// suffix, Base58Check).
pub fn priv_address(compressed: bool, k: &Zi320) -> String {
    let mut buf = [0u8; 34];
    buf[0] = 0x80;
    buf[1..33].copy_from_slice(&k.to_be_bytes32());
    if compressed {
        buf[33] = 0x01;
        base58check(&buf)
    } else {
        base58check(&buf[..33])
    }
}

/// Decodes a WIF private key; returns the key and whether it encodes a
/// compressed public key. Wrong length, prefix or checksum all fail.
pub fn decode_private_key(s: &str) -> Option<(Zi320, bool)> {
    let first = *s.as_bytes().first()?;
    let raw = bs58::decode(s).into_vec().ok()?;
    let (compressed, len) = match first {
        b'5' => (false, 37),
        b'K' | b'L' => (true, 38),
        _ => return None,
    };
    if raw.len() != len || raw[0] != 0x80 {
        return None;
    }
    if compressed && raw[33] != 0x01 {
        return None;
    }
    if sha256_checksum(&raw[..len - 4]) != raw[len - 4..] {
        return None;
    }
    let mut kb = [0u8; 32];
    kb.copy_from_slice(&raw[1..33]);
    Some((Zi320::from_be_bytes32(&kb), compressed))
}

/// Verifies the Base58Check checksum of a P2PKH/P2SH address.
pub fn check_pub_address(address: &str) -> bool {
    match bs58::decode(address).into_vec() {
        Ok(v) if v.len() == 25 => sha256_checksum(&v[..21]) == v[21..25],
        _ => false,
    }
}

#[cfg(test)]
mod tests {

    use super::*;
    use crate::secp256k1::Secp256k1;

    #[test]
    fn wif_roundtrip() {
        let vectors: [(&str, &str, bool); 3] = [
            ("5HqoeNmaz17FwZRqn7kCBP1FyJKSe4tt42XZB7426EJ2MVWDeqk",
             "0372945c54e5d9a185d6a747bdd8b8ca2bc22d77d595e99e23734837728f576a",
             false),
            ("KxMUSkFhEzt2eJHscv2vNSTnnV2cgAXgL4WDQBTx7Ubd9TZmACAz",
             "21d4be8888fa67113cd6327ccb71e31e93b81329a6fc633f4fcab3d8820166f7",
             true),
            ("L2wAVD273GwAxGuEDHvrCqPfuWg5wWLZWy6H3hjsmhCvNVuCERAQ",
             "aa83217b3a11fccff8142ef0681ad774d7ab6822f574c4bb99cbf9b9dd01e7f2",
             true),
        ];
        for (wif, key, compressed) in vectors {
            let (k, c) = decode_private_key(wif).unwrap();
            assert_eq!(c, compressed);
            assert!(k == Zi320::from_base16(key).unwrap());
            assert_eq!(priv_address(compressed, &k), wif);
        }
        // Corrupted checksum and bad prefixes fail.
        assert!(decode_private_key(
            "5HqoeNmaz17FwZRqn7kCBP1FyJKSe4tt42XZB7426EJ2MVWDeqj").is_none());
        assert!(decode_private_key("Qabc").is_none());
        assert!(decode_private_key("").is_none());
    }

    #[test]
    fn known_addresses() {
        let ctx = Secp256k1::global();
        let (k, c) = decode_private_key(
            "5HqoeNmaz17FwZRqn7kCBP1FyJKSe4tt42XZB7426EJ2MVWDeqk").unwrap();
        let p = ctx.compute_public_key(&k).unwrap();
        assert_eq!(address(AddrKind::P2pkh, c, &p).unwrap(),
            "15t3Nt1zyMETkHbjJTTshxLnqPzQvAtdCe");

        let (k, c) = decode_private_key(
            "KxMUSkFhEzt2eJHscv2vNSTnnV2cgAXgL4WDQBTx7Ubd9TZmACAz").unwrap();
        let p = ctx.compute_public_key(&k).unwrap();
        assert_eq!(address(AddrKind::P2pkh, c, &p).unwrap(),
            "16S5PAsGZ8VFM1CRGGLqm37XHrp46f6CTn");
        assert_eq!(address(AddrKind::P2sh, c, &p).unwrap(),
            "3CyQYcByvcWK8BkYJabBS82yDLNWt6rWSx");

        let (k, c) = decode_private_key(
            "L2wAVD273GwAxGuEDHvrCqPfuWg5wWLZWy6H3hjsmhCvNVuCERAQ").unwrap();
        let p = ctx.compute_public_key(&k).unwrap();
        assert_eq!(address(AddrKind::Bech32, c, &p).unwrap(),
            "bc1q6tqytpg06uhmtnhn9s4f35gkt8yya5a24dptmn");
        // Known hash160 for the first key.
        let h = hash160(AddrKind::P2pkh, false,
            &ctx.compute_public_key(&decode_private_key(
                "5HqoeNmaz17FwZRqn7kCBP1FyJKSe4tt42XZB7426EJ2MVWDeqk")
                .unwrap().0).unwrap());
        assert_eq!(address_from_hash160(AddrKind::P2pkh, &h),
            "15t3Nt1zyMETkHbjJTTshxLnqPzQvAtdCe");
    }

    #[test]
    fn uncompressed_restrictions() {
        let ctx = Secp256k1::global();
        let p = ctx.compute_public_key(&Zi320::from_u64(12345)).unwrap();
        assert!(address(AddrKind::P2pkh, false, &p).is_some());
        assert!(address(AddrKind::P2sh, false, &p).is_none());
        assert!(address(AddrKind::Bech32, false, &p).is_none());
    }

    #[test]
    fn batched_match_single() {
        let ctx = Secp256k1::global();
        let pts = [
            ctx.compute_public_key(&Zi320::from_u64(101)).unwrap(),
            ctx.compute_public_key(&Zi320::from_u64(202)).unwrap(),
            ctx.compute_public_key(&Zi320::from_u64(303)).unwrap(),
            ctx.compute_public_key(&Zi320::from_u64(404)).unwrap(),
        ];
        for kind in [AddrKind::P2pkh, AddrKind::P2sh, AddrKind::Bech32] {
            for compressed in [true, false] {
                let hx = hash160_x4(kind, compressed, &pts);
                for i in 0..4 {
                    assert_eq!(hx[i], hash160(kind, compressed, &pts[i]));
                }
                let ax = address_x4(kind, &hx);
                for i in 0..4 {
                    assert_eq!(ax[i], address_from_hash160(kind, &hx[i]));
                }
            }
        }
    }

    #[test]
    fn pub_address_checksum() {
        assert!(check_pub_address("15t3Nt1zyMETkHbjJTTshxLnqPzQvAtdCe"));
        assert!(check_pub_address("3CyQYcByvcWK8BkYJabBS82yDLNWt6rWSx"));
        assert!(!check_pub_address("15t3Nt1zyMETkHbjJTTshxLnqPzQvAtdCf"));
        assert!(!check_pub_address("not an address"));
        assert!(!check_pub_address(""));
    }
}
