//! Modular arithmetic over a runtime-configurable odd modulus.
//!
//! A `ModField` value packages a modulus of at most 256 bits together
//! with its Montgomery constants (R, R^2, R^3, R^4, and -1/m mod 2^64).
//! Operations take and return plain (non-Montgomery) `Zi320` values in
//! the [0, m) range; Montgomery representation is an internal detail of
//! multiplication, exponentiation and inversion.
//!
//! The secp256k1 field prime has a dedicated fast path in the `k1`
//! module which bypasses Montgomery multiplication entirely; `ModField`
//! is the generic engine, used for the curve order and by the
//! Miller-Rabin primality test.

use core::cmp::Ordering;

use crate::backend::{addcarry_u64, umull_add, umull_add2};
use crate::zint::Zi320;

/// Montgomery arithmetic context for an odd modulus of at most 256 bits.
#[derive(Clone, Copy, Debug)]
pub struct ModField {
    m: Zi320,
    bitlen: u32,
    nw: usize,
    r: Zi320,
    r2: Zi320,
    r3: Zi320,
    r4: Zi320,
    m0i: u64,
}

impl ModField {

    /// Builds the context for modulus `m`. Fails (None) if `m` is even,
    /// zero, or wider than 256 bits.
    pub fn new(m: &Zi320) -> Option<Self> {
        if m.is_zero() || m.is_even() {
            return None;
        }
        let bitlen = m.bit_length();
        if bitlen > 256 {
            return None;
        }
        let k = 64 * ((bitlen + 63) >> 6);

        // R = 2^k mod m; then R^2 = R * 2^k mod m by iterated doubling.
        let mut r = Zi320::ONE;
        r.set_shl(k);
        r.set_mod(m);
        let mut r2 = r;
        for _ in 0..k {
            r2 = Self::double_mod(&r2, m);
        }

        let mut f = ModField {
            m: *m,
            bitlen,
            nw: ((bitlen + 63) >> 6) as usize,
            r,
            r2,
            r3: Zi320::ZERO,
            r4: Zi320::ZERO,
            m0i: Zi320::ninv64(m.0[0]),
        };
        // R^3 = mont(R^2, R^2), R^4 = mont(R^3, R^2).
        f.r3 = f.montgomery_mult(&f.r2, &f.r2);
        f.r4 = f.montgomery_mult(&f.r3, &f.r2);
        Some(f)
    }

    // 2*a mod m for a in [0, m).
    fn double_mod(a: &Zi320, m: &Zi320) -> Zi320 {
        let mut t = *a;
        t.set_add(a);
        if t.ucmp(m) != Ordering::Less {
            t.set_sub(m);
        }
        t
    }

    #[inline(always)]
    pub fn modulus(&self) -> Zi320 {
        self.m
    }

    #[inline(always)]
    pub fn bit_length(&self) -> u32 {
        self.bitlen
    }

    #[inline(always)]
    pub fn r(&self) -> Zi320 {
        self.r
    }

    #[inline(always)]
    pub fn r2(&self) -> Zi320 {
        self.r2
    }

    #[inline(always)]
    pub fn r3(&self) -> Zi320 {
        self.r3
    }

    #[inline(always)]
    pub fn r4(&self) -> Zi320 {
        self.r4
    }

    /// Full reduction of an arbitrary non-negative 320-bit value.
    pub fn reduce(&self, a: &Zi320) -> Zi320 {
        let mut r = *a;
        r.set_mod(&self.m);
        r
    }

    /// a + b mod m; inputs must already be in [0, m).
    pub fn add(&self, a: &Zi320, b: &Zi320) -> Zi320 {
        let mut t = *a;
        t.set_add(b);
        if t.ucmp(&self.m) != Ordering::Less {
            t.set_sub(&self.m);
        }
        t
    }

    /// a + w mod m for a small w; the input must be in [0, m).
    pub fn add_u64(&self, a: &Zi320, w: u64) -> Zi320 {
        let mut t = *a;
        t.set_add_u64(w);
        while t.ucmp(&self.m) != Ordering::Less {
            t.set_sub(&self.m);
        }
        t
    }

    /// a - b mod m; inputs must already be in [0, m).
    pub fn sub(&self, a: &Zi320, b: &Zi320) -> Zi320 {
        let mut t = *a;
        if t.set_sub(b) != 0 {
            t.set_add(&self.m);
        }
        t
    }

    /// -a mod m.
    pub fn neg(&self, a: &Zi320) -> Zi320 {
        if a.is_zero() {
            return Zi320::ZERO;
        }
        let mut t = self.m;
        t.set_sub(a);
        t
    }

    /// 2*a mod m.
    pub fn double(&self, a: &Zi320) -> Zi320 {
        Self::double_mod(a, &self.m)
    }

    /// Montgomery multiplication: a*b/R mod m (CIOS over the modulus's
    /// significant limbs, so that R = 2^(64*ceil(bitlen/64))). Inputs
    /// must be in [0, m); the result is in [0, m).
    pub fn montgomery_mult(&self, a: &Zi320, b: &Zi320) -> Zi320 {
        let nw = self.nw;
        let mut t = [0u64; 7];
        for i in 0..nw {
            // t += a_i * b
            let ai = a.0[i];
            let mut cc = 0u64;
            for j in 0..nw {
                let (lo, hi) = umull_add2(ai, b.0[j], t[j], cc);
                t[j] = lo;
                cc = hi;
            }
            let (w, ov) = addcarry_u64(t[nw], cc, 0);
            t[nw] = w;
            t[nw + 1] += ov as u64;

            // t += u*m with u chosen so that the low limb cancels; then
            // shift one limb right.
            let u = t[0].wrapping_mul(self.m0i);
            let (_, mut cc) = umull_add(u, self.m.0[0], t[0]);
            for j in 1..nw {
                let (lo, hi) = umull_add2(u, self.m.0[j], t[j], cc);
                t[j - 1] = lo;
                cc = hi;
            }
            let (w, ov) = addcarry_u64(t[nw], cc, 0);
            t[nw - 1] = w;
            t[nw] = t[nw + 1] + (ov as u64);
            t[nw + 1] = 0;
        }
        // Result is in [0, 2m); a single conditional subtraction ends it.
        let mut r = Zi320::ZERO;
        r.0[..=nw].copy_from_slice(&t[..=nw]);
        if r.ucmp(&self.m) != Ordering::Less {
            r.set_sub(&self.m);
        }
        r
    }

    /// a * b mod m (two Montgomery multiplications, via R^2).
    pub fn mul(&self, a: &Zi320, b: &Zi320) -> Zi320 {
        let t = self.montgomery_mult(a, b);
        self.montgomery_mult(&t, &self.r2)
    }

    /// a^2 mod m.
    pub fn square(&self, a: &Zi320) -> Zi320 {
        self.mul(a, a)
    }

    /// a^e mod m, left-to-right square-and-multiply over the bit length
    /// of e (e taken as unsigned).
    pub fn exp(&self, a: &Zi320, e: &Zi320) -> Zi320 {
        let am = self.montgomery_mult(a, &self.r2);
        let mut x = self.r;
        for i in (0..e.bit_length()).rev() {
            x = self.montgomery_mult(&x, &x);
            if e.bit(i) != 0 {
                x = self.montgomery_mult(&x, &am);
            }
        }
        self.montgomery_mult(&x, &Zi320::ONE)
    }

    /// 1/a mod m (divstep engine); zero for non-invertible values. The
    /// input must be in [0, m).
    pub fn inv(&self, a: &Zi320) -> Zi320 {
        a.mod_inv(&self.m)
    }

    /// Square root for a modulus m = 3 mod 4, as a^((m+1)/4); the sign
    /// of the returned root is unspecified. None if `a` has no square
    /// root (or m is not 3 mod 4).
    pub fn sqrt(&self, a: &Zi320) -> Option<Zi320> {
        if (self.m.0[0] & 3) != 3 {
            return None;
        }
        // (m+1)/4 = (m >> 2) + 1 when m = 3 mod 4.
        let mut e = self.m;
        e.set_shr(2);
        e.set_add_one();
        let s = self.exp(a, &e);
        if self.mul(&s, &s) == *a {
            Some(s)
        } else {
            None
        }
    }

    /// Euler's criterion: true if `a` has a square root modulo m.
    pub fn has_sqrt(&self, a: &Zi320) -> bool {
        let mut e = self.m;
        e.set_shr(1);
        self.exp(a, &e).is_one()
    }
}

impl Zi320 {

    /// Miller-Rabin primality test with a fixed set of small bases.
    /// Supports non-negative values of at most 256 bits.
    pub fn is_probable_prime(&self) -> bool {
        const BASES: [u64; 12] = [ 2, 3, 5, 7, 11, 13, 17, 19, 23, 29, 31, 37 ];

        if self.is_negative() || self.is_zero() || self.is_one() {
            return false;
        }
        if self.is_even() {
            return *self == Zi320::from_u64(2);
        }
        for b in BASES {
            if *self == Zi320::from_u64(b) {
                return true;
            }
        }

        // n-1 = d * 2^s with d odd.
        let mut nm1 = *self;
        nm1.set_sub_one();
        let s = nm1.lowest_bit();
        let mut d = nm1;
        d.set_shr(s);

        let f = match ModField::new(self) {
            Some(f) => f,
            None => return false,
        };
        'base: for b in BASES {
            let a = Zi320::from_u64(b);
            if a.ucmp(self) != Ordering::Less {
                continue;
            }
            let mut x = f.exp(&a, &d);
            if x.is_one() || x == nm1 {
                continue;
            }
            for _ in 1..s {
                x = f.mul(&x, &x);
                if x == nm1 {
                    continue 'base;
                }
            }
            return false;
        }
        true
    }
}

#[cfg(test)]
mod tests {

    use super::ModField;
    use crate::zint::Zi320;
    use sha2::{Sha256, Digest};

    fn fp() -> ModField {
        let p = Zi320::w64be(
            0xFFFFFFFFFFFFFFFF, 0xFFFFFFFFFFFFFFFF,
            0xFFFFFFFFFFFFFFFF, 0xFFFFFFFEFFFFFC2F);
        ModField::new(&p).unwrap()
    }

    fn fn_order() -> ModField {
        let n = Zi320::w64be(
            0xFFFFFFFFFFFFFFFF, 0xFFFFFFFFFFFFFFFE,
            0xBAAEDCE6AF48A03B, 0xBFD25E8CD0364141);
        ModField::new(&n).unwrap()
    }

    fn rnd_mod(sh: &mut Sha256, ctr: u64, f: &ModField) -> Zi320 {
        sh.update(ctr.to_le_bytes());
        let v = sh.finalize_reset();
        let mut buf = [0u8; 32];
        buf.copy_from_slice(&v);
        f.reduce(&Zi320::from_be_bytes32(&buf))
    }

    #[test]
    fn setup_constants() {
        let f = fp();
        // R..R^4 for the secp256k1 prime.
        assert!(f.r() == Zi320::from_base16("1000003d1").unwrap());
        assert!(f.r2() == Zi320::from_base16("1000007a2000e90a1").unwrap());
        assert!(f.r3() == Zi320::from_base16(
            "100000b73002bb1e33795f671").unwrap());
        assert!(f.r4() == Zi320::from_base16(
            "100000f44005763c6de57da9823518541").unwrap());
        assert_eq!(f.bit_length(), 256);

        // Even and oversized moduli are rejected.
        assert!(ModField::new(&Zi320::from_u64(10)).is_none());
        assert!(ModField::new(&Zi320::ZERO).is_none());
        let mut big = Zi320::ONE;
        big.set_shl(300);
        big.set_add_one();
        assert!(ModField::new(&big).is_none());
    }

    #[test]
    fn mul_fixed_vectors() {
        let f = fp();
        let a = Zi320::from_base16(
            "46b9e861b63d3509c88b7817275a30d22d62c8cd8fa6486ddee35ef0d8e0495f")
            .unwrap();
        let b = Zi320::from_base16(
            "2500e7f3fbddf2842903f544ddc87494ce95029ace4e257d54ba77f2bc1f3a88")
            .unwrap();
        let ab = Zi320::from_base16(
            "991005f03136468d60c3ad876fbfa42c680aa75dbfdef2cf98d1d8be5d4b28cb")
            .unwrap();
        assert!(f.mul(&a, &b) == ab);
        assert!(f.mul(&b, &a) == ab);

        let fo = fn_order();
        let abn = Zi320::from_base16(
            "5acda06c932a3b648c9726929b4a586ed4a67e3725a524249cbc46967698389c")
            .unwrap();
        assert!(fo.mul(&a, &b) == abn);

        // a^b mod p.
        let e = Zi320::from_base16(
            "ea040ee7bf5bacea5bc8b6df31f2533526a61b67afff0d94b8fa630fc7d52ef5")
            .unwrap();
        assert!(f.exp(&a, &b) == e);
    }

    #[test]
    fn ring_properties() {
        let f = fp();
        let mut sh = Sha256::new();
        for i in 0..20 {
            let a = rnd_mod(&mut sh, 3 * i, &f);
            let b = rnd_mod(&mut sh, 3 * i + 1, &f);
            let c = rnd_mod(&mut sh, 3 * i + 2, &f);
            // mul identity and commutativity
            assert!(f.mul(&a, &Zi320::ONE) == a);
            assert!(f.mul(&a, &b) == f.mul(&b, &a));
            // distributivity
            let l = f.mul(&a, &f.add(&b, &c));
            let r = f.add(&f.mul(&a, &b), &f.mul(&a, &c));
            assert!(l == r);
            // add/sub/neg consistency
            assert!(f.sub(&f.add(&a, &b), &b) == a);
            assert!(f.add(&a, &f.neg(&a)).is_zero());
            assert!(f.double(&a) == f.add(&a, &a));
            assert!(f.add_u64(&a, 7) == f.add(&a, &Zi320::from_u64(7)));
        }
    }

    #[test]
    fn inversion() {
        for f in [fp(), fn_order()] {
            let mut sh = Sha256::new();
            for i in 0..20 {
                let a = rnd_mod(&mut sh, i, &f);
                if a.is_zero() {
                    continue;
                }
                let ai = f.inv(&a);
                assert!(f.mul(&a, &ai).is_one());
            }
            assert!(f.inv(&Zi320::ZERO).is_zero());
        }
    }

    #[test]
    fn exp_properties() {
        let f = fp();
        let mut sh = Sha256::new();
        let mut pm1 = f.modulus();
        pm1.set_sub_one();
        for i in 0..10 {
            let a = rnd_mod(&mut sh, i, &f);
            if a.is_zero() {
                continue;
            }
            assert!(f.exp(&a, &Zi320::ZERO).is_one());
            assert!(f.exp(&a, &Zi320::ONE) == a);
            assert!(f.exp(&a, &Zi320::from_u64(2)) == f.mul(&a, &a));
            assert!(f.exp(&a, &Zi320::from_u64(3))
                == f.mul(&a, &f.mul(&a, &a)));
            // Fermat
            assert!(f.exp(&a, &pm1).is_one());
        }
    }

    #[test]
    fn sqrt_euler() {
        let f = fp();
        let mut sh = Sha256::new();
        for i in 0..20 {
            let a = rnd_mod(&mut sh, i, &f);
            if a.is_zero() {
                continue;
            }
            let s = f.square(&a);
            assert!(f.has_sqrt(&s));
            let r = f.sqrt(&s).unwrap();
            assert!(f.square(&r) == s);
            // r is a or -a.
            assert!(r == a || r == f.neg(&a));
            if !f.has_sqrt(&a) {
                assert!(f.sqrt(&a).is_none());
            }
        }
    }

    #[test]
    fn probable_primes() {
        // The curve constants are prime.
        assert!(fp().modulus().is_probable_prime());
        assert!(fn_order().modulus().is_probable_prime());
        // 2^89 - 1 is a Mersenne prime.
        assert!(Zi320::from_base16("1ffffffffffffffffffffff").unwrap()
            .is_probable_prime());
        for v in [2u64, 3, 5, 7, 97, 65537] {
            assert!(Zi320::from_u64(v).is_probable_prime());
        }
        // Composites, including Carmichael numbers.
        for v in [0u64, 1, 4, 9, 561, 41041, 825265, 65535] {
            assert!(!Zi320::from_u64(v).is_probable_prime());
        }
        // Product of two close primes.
        let mut c = Zi320::ZERO;
        c.set_mul(&Zi320::from_u64(4294967291), &Zi320::from_u64(4294967279));
        assert!(!c.is_probable_prime());
    }
}
