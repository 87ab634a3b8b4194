//! Hash service adapter.
//!
//! The curve and address layers treat hashing as an external service
//! with a fixed interface: single-shot SHA-256/RIPEMD-160 over key-sized
//! messages, a double-SHA-256 checksum, and 4-way batched entry points
//! that accept *pre-padded* SHA-256 message blocks (the address code
//! packs public keys straight into the input schedule, padding and
//! length included, so the hash never touches byte buffers).
//!
//! Everything is backed by the RustCrypto `sha2` and `ripemd` crates;
//! the pre-padded paths go through `sha2::compress256`.

use ripemd::Ripemd160;
use sha2::compress256;
use sha2::digest::generic_array::GenericArray;
use sha2::{Digest, Sha256};

// SHA-256 initial state.
const IV: [u32; 8] = [
    0x6A09E667, 0xBB67AE85, 0x3C6EF372, 0xA54FF53A,
    0x510E527F, 0x9B05688C, 0x1F83D9AB, 0x5BE0CD19,
];

fn words_to_block(w: &[u32; 16]) -> [u8; 64] {
    let mut b = [0u8; 64];
    for i in 0..16 {
        b[(4 * i)..(4 * i + 4)].copy_from_slice(&w[i].to_be_bytes());
    }
    b
}

fn state_to_digest(st: &[u32; 8]) -> [u8; 32] {
    let mut d = [0u8; 32];
    for i in 0..8 {
        d[(4 * i)..(4 * i + 4)].copy_from_slice(&st[i].to_be_bytes());
    }
    d
}

/// SHA-256 of an arbitrary message.
pub fn sha256(msg: &[u8]) -> [u8; 32] {
    Sha256::digest(msg).into()
}

/// SHA-256 of a 33-byte (compressed public key) message.
pub fn sha256_33(msg: &[u8; 33]) -> [u8; 32] {
    Sha256::digest(msg).into()
}

/// SHA-256 of a 65-byte (uncompressed public key) message.
pub fn sha256_65(msg: &[u8; 65]) -> [u8; 32] {
    Sha256::digest(msg).into()
}

/// First four bytes of SHA-256(SHA-256(data)) (Base58Check checksum).
pub fn sha256_checksum(data: &[u8]) -> [u8; 4] {
    let d = Sha256::digest(Sha256::digest(data));
    [ d[0], d[1], d[2], d[3] ]
}

/// RIPEMD-160 of a 32-byte message (a SHA-256 digest).
pub fn ripemd160_32(msg: &[u8; 32]) -> [u8; 20] {
    Ripemd160::digest(msg).into()
}

/// SHA-256 of one pre-padded message block (16 big-endian words,
/// padding and bit-length already in place).
pub fn sha256_block16(w: &[u32; 16]) -> [u8; 32] {
    let mut st = IV;
    let block = GenericArray::clone_from_slice(&words_to_block(w));
    compress256(&mut st, core::slice::from_ref(&block));
    state_to_digest(&st)
}

/// SHA-256 of two pre-padded message blocks (32 big-endian words).
pub fn sha256_block32(w: &[u32; 32]) -> [u8; 32] {
    let mut lo = [0u32; 16];
    let mut hi = [0u32; 16];
    lo.copy_from_slice(&w[..16]);
    hi.copy_from_slice(&w[16..]);
    let mut st = IV;
    let blocks = [
        GenericArray::clone_from_slice(&words_to_block(&lo)),
        GenericArray::clone_from_slice(&words_to_block(&hi)),
    ];
    compress256(&mut st, &blocks);
    state_to_digest(&st)
}

/// 4-way SHA-256 over single pre-padded blocks.
pub fn sha256_x4_1b(w: &[[u32; 16]; 4]) -> [[u8; 32]; 4] {
    [
        sha256_block16(&w[0]),
        sha256_block16(&w[1]),
        sha256_block16(&w[2]),
        sha256_block16(&w[3]),
    ]
}

/// 4-way SHA-256 over double pre-padded blocks.
pub fn sha256_x4_2b(w: &[[u32; 32]; 4]) -> [[u8; 32]; 4] {
    [
        sha256_block32(&w[0]),
        sha256_block32(&w[1]),
        sha256_block32(&w[2]),
        sha256_block32(&w[3]),
    ]
}

/// 4-way Base58Check checksum over pre-padded 21-byte address blocks:
/// one compression for the inner hash, then a plain SHA-256 over the
/// digest, keeping the first four bytes.
pub fn sha256_x4_checksum(w: &[[u32; 16]; 4]) -> [[u8; 4]; 4] {
    let inner = sha256_x4_1b(w);
    let mut out = [[0u8; 4]; 4];
    for i in 0..4 {
        let d = Sha256::digest(inner[i]);
        out[i].copy_from_slice(&d[..4]);
    }
    out
}

/// 4-way RIPEMD-160 over 32-byte messages.
pub fn ripemd160_x4_32(m: &[[u8; 32]; 4]) -> [[u8; 20]; 4] {
    [
        ripemd160_32(&m[0]),
        ripemd160_32(&m[1]),
        ripemd160_32(&m[2]),
        ripemd160_32(&m[3]),
    ]
}

#[cfg(test)]
mod tests {

    use super::*;

    fn hex(s: &str) -> Vec<u8> {
        (0..s.len() / 2)
            .map(|i| u8::from_str_radix(&s[2 * i..2 * i + 2], 16).unwrap())
            .collect()
    }

    #[test]
    fn block16_abc() {
        // "abc" padded into a single schedule: 0x61626380, length 24 bits.
        let mut w = [0u32; 16];
        w[0] = 0x61626380;
        w[15] = 24;
        assert_eq!(sha256_block16(&w).to_vec(), hex(
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"));
    }

    #[test]
    fn block_paths_match_byte_paths() {
        // A 33-byte message (bytes 0..32) packed into one padded block.
        let mut msg33 = [0u8; 33];
        for i in 0..33 {
            msg33[i] = i as u8;
        }
        let mut w = [0u32; 16];
        for i in 0..8 {
            w[i] = u32::from_be_bytes([
                msg33[4 * i], msg33[4 * i + 1], msg33[4 * i + 2],
                msg33[4 * i + 3],
            ]);
        }
        w[8] = ((msg33[32] as u32) << 24) | 0x00800000;
        w[15] = 33 * 8;
        assert_eq!(sha256_block16(&w), sha256_33(&msg33));

        // A 65-byte message packed into two padded blocks.
        let mut msg65 = [0u8; 65];
        for i in 0..65 {
            msg65[i] = i as u8;
        }
        let mut w = [0u32; 32];
        for i in 0..16 {
            w[i] = u32::from_be_bytes([
                msg65[4 * i], msg65[4 * i + 1], msg65[4 * i + 2],
                msg65[4 * i + 3],
            ]);
        }
        w[16] = ((msg65[64] as u32) << 24) | 0x00800000;
        w[31] = 65 * 8;
        assert_eq!(sha256_block32(&w), sha256_65(&msg65));
    }

    #[test]
    fn service_vectors() {
        let mut m = [0u8; 32];
        for i in 0..32 {
            m[i] = i as u8;
        }
        assert_eq!(ripemd160_32(&m).to_vec(),
            hex("e6babb9619d7a81272711fc546a16b211dd93957"));
        assert_eq!(sha256_checksum(b"hello"), [ 0x95, 0x95, 0xc9, 0xdf ]);
        assert_eq!(sha256(b"abc").to_vec(), hex(
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"));
    }

    #[test]
    fn batched_match_single() {
        let mut w = [[0u32; 16]; 4];
        for i in 0..4 {
            w[i][0] = 0x61626380 + (i as u32);
            w[i][15] = 24;
        }
        let d = sha256_x4_1b(&w);
        for i in 0..4 {
            assert_eq!(d[i], sha256_block16(&w[i]));
        }
        let m = [[0x5Au8; 32], [0x11; 32], [0x22; 32], [0x33; 32]];
        let h = ripemd160_x4_32(&m);
        for i in 0..4 {
            assert_eq!(h[i], ripemd160_32(&m[i]));
        }
    }
}
