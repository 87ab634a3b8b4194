//! Fast arithmetic modulo the secp256k1 field prime.
//!
//! The prime is p = 2^256 - 2^32 - 977, so 2^256 = 2^32 + 977 mod p and
//! a 512-bit product can be reduced by folding its top half multiplied
//! by the constant 0x1000003D1 into the bottom half. These functions are
//! the hot path of the curve layer; the generic Montgomery machinery of
//! `ModField` is bypassed entirely.
//!
//! All inputs and outputs are in the reduced range [0, p) (top limb
//! zero); every operation re-establishes that invariant.

use core::cmp::Ordering;

use crate::backend::{addcarry_u64, subborrow_u64, umull, umull_add, umull_add2};
use crate::zint::Zi320;

/// The field prime p = 2^256 - 2^32 - 977.
pub const P: Zi320 = Zi320::w64be(
    0xFFFFFFFFFFFFFFFF, 0xFFFFFFFFFFFFFFFF,
    0xFFFFFFFFFFFFFFFF, 0xFFFFFFFEFFFFFC2F);

// 2^256 - p
const T256_MINUS_P: u64 = 0x1000003D1;

// (p+1)/4 and (p-1)/2, the square-root and Euler-criterion exponents.
const PP1D4: Zi320 = Zi320::w64be(
    0x3FFFFFFFFFFFFFFF, 0xFFFFFFFFFFFFFFFF,
    0xFFFFFFFFFFFFFFFF, 0xFFFFFFFFBFFFFF0C);
const PM1D2: Zi320 = Zi320::w64be(
    0x7FFFFFFFFFFFFFFF, 0xFFFFFFFFFFFFFFFF,
    0xFFFFFFFFFFFFFFFF, 0xFFFFFFFF7FFFFE17);

/// a + b mod p.
pub fn add(a: &Zi320, b: &Zi320) -> Zi320 {
    let mut cc = 0u8;
    let mut d = [0u64; 5];
    for i in 0..4 {
        let (w, c) = addcarry_u64(a.0[i], b.0[i], cc);
        d[i] = w;
        cc = c;
    }
    let mut r = Zi320(d);
    if cc != 0 {
        // 2^256 = 2^32 + 977 mod p; since a + b < 2p, adding the fold
        // constant to the wrapped value cannot carry again.
        let (w, c) = addcarry_u64(r.0[0], T256_MINUS_P, 0);
        r.0[0] = w;
        let (w, c) = addcarry_u64(r.0[1], 0, c);
        r.0[1] = w;
        let (w, c) = addcarry_u64(r.0[2], 0, c);
        r.0[2] = w;
        let (w, _) = addcarry_u64(r.0[3], 0, c);
        r.0[3] = w;
    } else if r.ucmp(&P) != Ordering::Less {
        r.set_sub(&P);
    }
    r
}

/// a - b mod p.
pub fn sub(a: &Zi320, b: &Zi320) -> Zi320 {
    let mut cc = 0u8;
    let mut d = [0u64; 5];
    for i in 0..4 {
        let (w, c) = subborrow_u64(a.0[i], b.0[i], cc);
        d[i] = w;
        cc = c;
    }
    let mut r = Zi320(d);
    if cc != 0 {
        // Wrapped by 2^256: subtracting the fold constant lands back in
        // [0, p) and cannot underflow.
        let (w, c) = subborrow_u64(r.0[0], T256_MINUS_P, 0);
        r.0[0] = w;
        let (w, c) = subborrow_u64(r.0[1], 0, c);
        r.0[1] = w;
        let (w, c) = subborrow_u64(r.0[2], 0, c);
        r.0[2] = w;
        let (w, _) = subborrow_u64(r.0[3], 0, c);
        r.0[3] = w;
    }
    r
}

/// -a mod p.
pub fn neg(a: &Zi320) -> Zi320 {
    if a.is_zero() {
        return Zi320::ZERO;
    }
    let mut r = P;
    r.set_sub(a);
    r
}

/// 2*a mod p.
#[inline(always)]
pub fn double(a: &Zi320) -> Zi320 {
    add(a, a)
}

// Reduces an 8-limb product to [0, p) by folding the top half twice.
fn fold512(d: &[u64; 8]) -> Zi320 {
    // e = hi * (2^32 + 977), a 5-word value (e[4] <= 2^33).
    let mut e = [0u64; 5];
    let mut cc = 0u64;
    for i in 0..4 {
        let (lo, hi) = umull_add(d[4 + i], T256_MINUS_P, cc);
        e[i] = lo;
        cc = hi;
    }
    e[4] = cc;

    // t = lo + e
    let mut t = [0u64; 5];
    let mut a8 = 0u8;
    for i in 0..4 {
        let (w, c) = addcarry_u64(d[i], e[i], a8);
        t[i] = w;
        a8 = c;
    }
    t[4] = e[4] + (a8 as u64);

    // Fold the remaining top word (at most ~2^34).
    let (lo, hi) = umull(t[4], T256_MINUS_P);
    let (w0, c) = addcarry_u64(t[0], lo, 0);
    let (w1, c) = addcarry_u64(t[1], hi, c);
    let (w2, c) = addcarry_u64(t[2], 0, c);
    let (w3, c) = addcarry_u64(t[3], 0, c);
    let mut r = Zi320([ w0, w1, w2, w3, 0 ]);
    if c != 0 {
        // One final wrap; the value is now tiny, no carry possible.
        let (w, c2) = addcarry_u64(r.0[0], T256_MINUS_P, 0);
        r.0[0] = w;
        let (w, _) = addcarry_u64(r.0[1], 0, c2);
        r.0[1] = w;
    } else if r.ucmp(&P) != Ordering::Less {
        r.set_sub(&P);
    }
    r
}

/// a * b mod p (4x4 schoolbook product, then the top-half fold).
pub fn mul(a: &Zi320, b: &Zi320) -> Zi320 {
    let mut d = [0u64; 8];
    for i in 0..4 {
        let mut cc = 0u64;
        for j in 0..4 {
            let (lo, hi) = umull_add2(a.0[i], b.0[j], d[i + j], cc);
            d[i + j] = lo;
            cc = hi;
        }
        d[i + 4] = cc;
    }
    fold512(&d)
}

/// a^2 mod p.
#[inline(always)]
pub fn square(a: &Zi320) -> Zi320 {
    mul(a, a)
}

/// 1/a mod p (divstep engine); zero for a = 0.
pub fn inv(a: &Zi320) -> Zi320 {
    a.mod_inv(&P)
}

/// a^e mod p, left-to-right square-and-multiply.
pub fn pow(a: &Zi320, e: &Zi320) -> Zi320 {
    let mut x = Zi320::ONE;
    for i in (0..e.bit_length()).rev() {
        x = mul(&x, &x);
        if e.bit(i) != 0 {
            x = mul(&x, a);
        }
    }
    x
}

/// Square root mod p (p = 3 mod 4), as a^((p+1)/4). The parity of the
/// returned root is unspecified; None if `a` is not a square.
pub fn sqrt(a: &Zi320) -> Option<Zi320> {
    let s = pow(a, &PP1D4);
    if mul(&s, &s) == *a {
        Some(s)
    } else {
        None
    }
}

/// Euler's criterion: true if `a` has a square root mod p.
pub fn has_sqrt(a: &Zi320) -> bool {
    pow(a, &PM1D2).is_one()
}
