//! secp256k1 curve layer.
//!
//! This module implements point arithmetic on the short Weierstraß curve
//! `y^2 = x^3 + 7` over the field of the `k1` module, in the shape used
//! by address search: variable-time formulas, projective coordinates
//! (X:Y:Z with x = X/Z, y = Y/Z) for inversion-free chains, and a
//! precomputed 256x32 table of generator multiples so that a public key
//! costs one field inversion plus a handful of field multiplications.
//!
//! A point is *affine* when Z = 1 and *projective* otherwise; the point
//! at infinity is encoded as X = Y = 0. Projective `add`/`double`
//! produce projective points; `reduce()` divides by Z and returns to the
//! affine form expected by the serialization and hashing helpers.
//!
//! The `Secp256k1` context owns the process-wide state: the generator
//! table and the Montgomery context for the curve order. It is built
//! once by `Secp256k1::new()`, or lazily through `Secp256k1::global()`.

#![allow(non_snake_case)]

use std::sync::OnceLock;

use crate::field::ModField;
use crate::k1;
use crate::zint::Zi320;

/// A point on the curve (projective X:Y:Z; infinity when X = Y = 0).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Point {
    pub(crate) X: Zi320,
    pub(crate) Y: Zi320,
    pub(crate) Z: Zi320,
}

impl Point {

    /// The point at infinity.
    pub const INFINITY: Self = Self {
        X: Zi320::ZERO,
        Y: Zi320::ZERO,
        Z: Zi320::ZERO,
    };

    /// Builds an affine point from its coordinates (not checked against
    /// the curve equation; see `is_on_curve()`).
    pub fn from_affine(x: Zi320, y: Zi320) -> Self {
        Self { X: x, Y: y, Z: Zi320::ONE }
    }

    #[inline(always)]
    pub fn x(&self) -> Zi320 {
        self.X
    }

    #[inline(always)]
    pub fn y(&self) -> Zi320 {
        self.Y
    }

    #[inline(always)]
    pub fn z(&self) -> Zi320 {
        self.Z
    }

    /// True for the point at infinity.
    #[inline(always)]
    pub fn is_zero(&self) -> bool {
        self.X.is_zero() && self.Y.is_zero()
    }

    /// Coordinate-wise equality (both points must be in the same
    /// representation, e.g. both reduced).
    #[inline(always)]
    pub fn equals(&self, p: &Self) -> bool {
        self == p
    }

    /// Negates this point (y becomes -y).
    pub fn neg(&self) -> Self {
        Self { X: self.X, Y: k1::neg(&self.Y), Z: self.Z }
    }

    /// Divides X and Y by Z, moving to the affine representation.
    pub fn set_reduce(&mut self) {
        let zi = k1::inv(&self.Z);
        self.X = k1::mul(&self.X, &zi);
        self.Y = k1::mul(&self.Y, &zi);
        self.Z = Zi320::ONE;
    }

    /// Affine form of this point.
    pub fn reduce(&self) -> Self {
        let mut r = *self;
        r.set_reduce();
        r
    }

    /// Projective addition:
    ///
    /// ```text
    /// U1 = Y2*Z1, U2 = Y1*Z2, V1 = X2*Z1, V2 = X1*Z2
    /// U = U1-U2, V = V1-V2, W = Z1*Z2
    /// A = U^2*W - V^3 - 2*V^2*V2
    /// X3 = V*A,  Y3 = U*(V^2*V2 - A) - V^3*U2,  Z3 = V^3*W
    /// ```
    ///
    /// The formula requires distinct x-coordinates (V1 != V2); equal
    /// points are routed to `double()`. Neither operand may be the
    /// point at infinity.
    pub fn add(&self, p: &Self) -> Self {
        if self.equals(p) {
            return self.double();
        }
        let u1 = k1::mul(&p.Y, &self.Z);
        let u2 = k1::mul(&self.Y, &p.Z);
        let v1 = k1::mul(&p.X, &self.Z);
        let v2 = k1::mul(&self.X, &p.Z);
        let u = k1::sub(&u1, &u2);
        let v = k1::sub(&v1, &v2);
        let w = k1::mul(&self.Z, &p.Z);
        let us2 = k1::square(&u);
        let vs2 = k1::square(&v);
        let vs3 = k1::mul(&vs2, &v);
        let us2w = k1::mul(&us2, &w);
        let vs2v2 = k1::mul(&vs2, &v2);
        let a = k1::sub(&k1::sub(&us2w, &vs3), &k1::double(&vs2v2));

        let X = k1::mul(&v, &a);
        let vs3u2 = k1::mul(&vs3, &u2);
        let Y = k1::sub(&k1::mul(&k1::sub(&vs2v2, &a), &u), &vs3u2);
        let Z = k1::mul(&vs3, &w);
        Self { X, Y, Z }
    }

    /// Mixed addition: same as `add()` but with Z2 = 1 (the right-hand
    /// operand must be affine, as generator-table entries are).
    pub fn add_mixed(&self, p: &Self) -> Self {
        let u1 = k1::mul(&p.Y, &self.Z);
        let v1 = k1::mul(&p.X, &self.Z);
        let u = k1::sub(&u1, &self.Y);
        let v = k1::sub(&v1, &self.X);
        let us2 = k1::square(&u);
        let vs2 = k1::square(&v);
        let vs3 = k1::mul(&vs2, &v);
        let us2w = k1::mul(&us2, &self.Z);
        let vs2v2 = k1::mul(&vs2, &self.X);
        let a = k1::sub(&k1::sub(&us2w, &vs3), &k1::double(&vs2v2));

        let X = k1::mul(&v, &a);
        let vs3u2 = k1::mul(&vs3, &self.Y);
        let Y = k1::sub(&k1::mul(&k1::sub(&vs2v2, &a), &u), &vs3u2);
        let Z = k1::mul(&vs3, &self.Z);
        Self { X, Y, Z }
    }

    /// Projective doubling (the curve has a = 0, so W = 3*X^2):
    ///
    /// ```text
    /// W = 3*X^2, S = Y*Z, B = X*Y*S, H = W^2 - 8*B
    /// X' = 2*H*S,  Y' = W*(4*B - H) - 8*Y^2*S^2,  Z' = 8*S^3
    /// ```
    pub fn double(&self) -> Self {
        let x2 = k1::square(&self.X);
        let w = k1::add(&k1::double(&x2), &x2);
        let s = k1::mul(&self.Y, &self.Z);
        let b = k1::mul(&k1::mul(&self.Y, &s), &self.X);
        let b8 = k1::double(&k1::double(&k1::double(&b)));
        let h = k1::sub(&k1::square(&w), &b8);

        let X = k1::double(&k1::mul(&h, &s));
        let s2 = k1::square(&s);
        let y2 = k1::square(&self.Y);
        let y2s2_8 = k1::double(&k1::double(&k1::double(&k1::mul(&y2, &s2))));
        let b4 = k1::double(&k1::double(&b));
        let Y = k1::sub(&k1::mul(&k1::sub(&b4, &h), &w), &y2s2_8);
        let Z = k1::double(&k1::double(&k1::double(&k1::mul(&s2, &s))));
        Self { X, Y, Z }
    }

    /// Affine addition (one field inversion). Both operands must be
    /// affine; equal points are routed to `double_direct()`, and the
    /// point at infinity is handled as the neutral element.
    pub fn add_direct(&self, p: &Self) -> Self {
        if self.is_zero() {
            return *p;
        }
        if p.is_zero() {
            return *self;
        }
        if self.equals(p) {
            return self.double_direct();
        }
        let dy = k1::sub(&p.Y, &self.Y);
        let dx = k1::inv(&k1::sub(&p.X, &self.X));
        let s = k1::mul(&dy, &dx);
        let s2 = k1::square(&s);

        let X = k1::sub(&k1::sub(&s2, &self.X), &p.X);
        let Y = k1::sub(&k1::mul(&k1::sub(&p.X, &X), &s), &p.Y);
        Self { X, Y, Z: Zi320::ONE }
    }

    /// Affine subtraction: self + (-p).
    pub fn sub_direct(&self, p: &Self) -> Self {
        self.add_direct(&p.neg())
    }

    /// Affine doubling (one field inversion); the input must be affine.
    pub fn double_direct(&self) -> Self {
        if self.is_zero() {
            return *self;
        }
        let x2 = k1::square(&self.X);
        let num = k1::add(&k1::double(&x2), &x2);
        let den = k1::inv(&k1::double(&self.Y));
        let s = k1::mul(&num, &den);

        let X = k1::sub(&k1::sub(&k1::square(&s), &self.X), &self.X);
        let Y = k1::neg(&k1::add(&k1::mul(&k1::sub(&X, &self.X), &s), &self.Y));
        Self { X, Y, Z: Zi320::ONE }
    }

    /// Scalar multiplication by double-and-add over the scalar's bit
    /// length. The accumulator starts unassigned and is initialized on
    /// the first set bit; the result is reduced to affine form. Returns
    /// the point at infinity for a zero scalar.
    pub fn mul(&self, s: &Zi320) -> Self {
        let bits = s.bit_length();
        let mut p2 = *self;
        let mut r = Self::INFINITY;
        let mut assigned = false;
        for i in 0..bits {
            if s.bit(i) != 0 {
                if assigned {
                    r = r.add(&p2);
                } else {
                    r = p2;
                    assigned = true;
                }
            }
            p2 = p2.double();
        }
        if !assigned {
            return Self::INFINITY;
        }
        r.set_reduce();
        r
    }

    /// Checks the curve equation y^2 = x^3 + 7 on the (affine)
    /// coordinates.
    pub fn is_on_curve(&self) -> bool {
        let s = k1::square(&self.X);
        let c = k1::mul(&s, &self.X);
        let rhs = k1::add(&c, &Zi320::from_u64(7));
        k1::square(&self.Y) == rhs
    }

    /// Solves the curve equation for y given x, picking the root of the
    /// requested parity. None if x is not on the curve.
    pub fn y_from_x(x: &Zi320, even: bool) -> Option<Zi320> {
        let s = k1::square(x);
        let c = k1::mul(&s, x);
        let yy = k1::add(&c, &Zi320::from_u64(7));
        let mut y = k1::sqrt(&yy)?;
        if y.is_even() != even {
            y = k1::neg(&y);
        }
        Some(y)
    }

    /// Compressed SEC encoding (02/03 prefix + big-endian x). The point
    /// must be affine and not the point at infinity.
    pub fn encode_compressed(&self) -> [u8; 33] {
        let mut b = [0u8; 33];
        b[0] = if self.Y.is_even() { 0x02 } else { 0x03 };
        b[1..33].copy_from_slice(&self.X.to_be_bytes32());
        b
    }

    /// Uncompressed SEC encoding (04 prefix + big-endian x and y). The
    /// point must be affine and not the point at infinity.
    pub fn encode_uncompressed(&self) -> [u8; 65] {
        let mut b = [0u8; 65];
        b[0] = 0x04;
        b[1..33].copy_from_slice(&self.X.to_be_bytes32());
        b[33..65].copy_from_slice(&self.Y.to_be_bytes32());
        b
    }

    /// Hex form of the SEC encoding (lowercase).
    pub fn encode_hex(&self, compressed: bool) -> String {
        let mut s = String::new();
        if compressed {
            for v in self.encode_compressed() {
                s.push_str(&format!("{:02x}", v));
            }
        } else {
            for v in self.encode_uncompressed() {
                s.push_str(&format!("{:02x}", v));
            }
        }
        s
    }

    /// Parses a public key from its hex form: 66 characters with prefix
    /// 02/03 (compressed; y is recovered with the prefix parity) or 130
    /// characters with prefix 04 (uncompressed). The decoded point is
    /// verified against the curve equation. Returns the point and
    /// whether the encoding was compressed.
    pub fn decode_hex(s: &str) -> Option<(Self, bool)> {
        if !s.is_ascii() {
            return None;
        }
        fn hex32(s: &str) -> Option<Zi320> {
            let mut buf = [0u8; 32];
            for i in 0..32 {
                let hi = s.as_bytes().get(2 * i)
                    .and_then(|c| (*c as char).to_digit(16))?;
                let lo = s.as_bytes().get(2 * i + 1)
                    .and_then(|c| (*c as char).to_digit(16))?;
                buf[i] = ((hi << 4) | lo) as u8;
            }
            let v = Zi320::from_be_bytes32(&buf);
            if v.ucmp(&k1::P) != core::cmp::Ordering::Less {
                return None;
            }
            Some(v)
        }

        match s.len() {
            66 => {
                let even = match &s[0..2] {
                    "02" => true,
                    "03" => false,
                    _ => return None,
                };
                let x = hex32(&s[2..])?;
                let y = Self::y_from_x(&x, even)?;
                Some((Self::from_affine(x, y), true))
            }
            130 => {
                if &s[0..2] != "04" {
                    return None;
                }
                let x = hex32(&s[2..66])?;
                let y = hex32(&s[66..])?;
                let p = Self::from_affine(x, y);
                if !p.is_on_curve() {
                    return None;
                }
                Some((p, false))
            }
            _ => None,
        }
    }
}

/// Curve context: generator table plus the order-field constants.
///
/// Building the context walks 8192 affine additions; `global()` builds
/// it once behind a `OnceLock` and hands out a shared reference, which
/// is the expected way to use the crate.
pub struct Secp256k1 {
    gtable: Vec<Point>,
    order: ModField,
}

impl Secp256k1 {

    /// Generator point.
    pub const G: Point = Point {
        X: Zi320::w64be(
            0x79BE667EF9DCBBAC, 0x55A06295CE870B07,
            0x029BFCDB2DCE28D9, 0x59F2815B16F81798),
        Y: Zi320::w64be(
            0x483ADA7726A3C465, 0x5DA4FBFC0E1108A8,
            0xFD17B448A6855419, 0x9C47D08FFB10D4B8),
        Z: Zi320::ONE,
    };

    /// The point H with 2H = G (scalar (n+1)/2 applied to G).
    pub const HALF_G: Point = Point {
        X: Zi320::w64be(
            0x0000000000000000, 0x0000003B78CE563F,
            0x89A0ED9414F5AA28, 0xAD0D96D6795F9C63),
        Y: Zi320::w64be(
            0xC0C686408D517DFD, 0x67C2367651380D00,
            0xD126E4229631FD03, 0xF8FF35EEF1A61E3C),
        Z: Zi320::ONE,
    };

    /// Curve order n.
    pub const ORDER: Zi320 = Zi320::w64be(
        0xFFFFFFFFFFFFFFFF, 0xFFFFFFFFFFFFFFFE,
        0xBAAEDCE6AF48A03B, 0xBFD25E8CD0364141);

    /// (n >> 1) + 1, the scalar that halves a point.
    pub const HALF_ORDER: Zi320 = Zi320::w64be(
        0x7FFFFFFFFFFFFFFF, 0xFFFFFFFFFFFFFFFF,
        0x5D576E7357A4501D, 0xDFE92F46681B20A1);

    /// Builds the context: the order field and the generator table
    /// GTable[256*i + j] = (j+1) * 256^i * G for i in [0, 32), j in
    /// [0, 256). Slot j = 255 carries the running sum (the next
    /// window's base) and doubles as a sentinel for the self-test.
    pub fn new() -> Self {
        let order = ModField::new(&Self::ORDER).unwrap();
        let mut gtable = vec![Point::INFINITY; 256 * 32];
        let mut n = Self::G;
        for i in 0..32 {
            gtable[i * 256] = n;
            n = n.double_direct();
            for j in 1..255 {
                gtable[i * 256 + j] = n;
                n = n.add_direct(&gtable[i * 256]);
            }
            gtable[i * 256 + 255] = n;
        }
        Secp256k1 { gtable, order }
    }

    /// Shared, lazily-built context.
    pub fn global() -> &'static Secp256k1 {
        static CTX: OnceLock<Secp256k1> = OnceLock::new();
        CTX.get_or_init(Secp256k1::new)
    }

    /// The generator table (256*32 affine points).
    pub fn gtable(&self) -> &[Point] {
        &self.gtable
    }

    /// Montgomery context for arithmetic modulo the curve order.
    pub fn order_field(&self) -> &ModField {
        &self.order
    }

    /// Public key of a private scalar: scans the 32 key bytes from the
    /// least significant upward, adding the table entry for each nonzero
    /// byte (the first one assigns the accumulator directly), and
    /// reduces the result to affine form. Returns None for a zero
    /// scalar; the scalar must be below the curve order.
    pub fn compute_public_key(&self, k: &Zi320) -> Option<Point> {
        let mut i = 0usize;
        let mut b = 0u8;
        while i < 32 {
            b = k.byte(i);
            if b != 0 {
                break;
            }
            i += 1;
        }
        if i == 32 {
            return None;
        }
        let mut q = self.gtable[256 * i + (b as usize) - 1];
        i += 1;
        while i < 32 {
            let b = k.byte(i);
            if b != 0 {
                q = q.add_mixed(&self.gtable[256 * i + (b as usize) - 1]);
            }
            i += 1;
        }
        q.set_reduce();
        Some(q)
    }

    /// 1/k modulo the curve order (private-key division support).
    pub fn scalar_inv(&self, k: &Zi320) -> Zi320 {
        let kk = self.order.reduce(k);
        self.order.inv(&kk)
    }

    /// Point division: p * (1/s mod n).
    pub fn div(&self, p: &Point, s: &Zi320) -> Point {
        p.mul(&self.scalar_inv(s))
    }

    /// Point halving: multiplication by (n+1)/2.
    pub fn halve(p: &Point) -> Point {
        p.mul(&Self::HALF_ORDER)
    }

    /// The key after this one (input must be affine and distinct
    /// from G).
    pub fn next_key(p: &Point) -> Point {
        p.add_direct(&Self::G)
    }

    /// The key before this one (input must be affine and distinct
    /// from G).
    pub fn prev_key(p: &Point) -> Point {
        p.sub_direct(&Self::G)
    }

    /// Derives the address of the WIF-encoded private key and compares
    /// it against `address` (the address kind is taken from its first
    /// character).
    pub fn check_address(&self, address: &str, wif: &str) -> bool {
        use crate::address::{self, AddrKind};

        let (k, compressed) = match address::decode_private_key(wif) {
            Some(v) => v,
            None => return false,
        };
        let pubkey = match self.compute_public_key(&k) {
            Some(p) => p,
            None => return false,
        };
        let kind = match address.as_bytes().first() {
            Some(b'1') => AddrKind::P2pkh,
            Some(b'3') => AddrKind::P2sh,
            Some(b'b') | Some(b'B') => AddrKind::Bech32,
            _ => return false,
        };
        match address::address(kind, compressed, &pubkey) {
            Some(a) => a == address,
            None => false,
        }
    }

    fn check_gtable(&self) -> bool {
        self.gtable.iter().all(|p| p.is_on_curve())
    }

    fn check_double(&self) -> bool {
        let r = Self::G.double().reduce();
        r.is_on_curve() && r.equals(&Self::G.double_direct())
    }

    fn check_add(&self) -> bool {
        let r1 = Self::G.double();
        let r2 = Self::G.add(&r1);
        let r3 = r1.add(&r2).reduce();
        r3.is_on_curve()
    }

    fn check_gen_key(&self) -> bool {
        let k = match Zi320::from_base16(
            "46b9e861b63d3509c88b7817275a30d22d62c8cd8fa6486ddee35ef0d8e0495f")
        {
            Some(k) => k,
            None => return false,
        };
        let p = match self.compute_public_key(&k) {
            Some(p) => p,
            None => return false,
        };
        p.encode_hex(false) ==
            "042500e7f3fbddf2842903f544ddc87494ce95029ace4e257d54ba77f2bc1f3a88\
             37a9461c4f1c57fecc499753381e772a128a5820a924a2fa05162eb662987a9f"
    }

    fn check_gen_addr(&self) -> bool {
        self.check_address("15t3Nt1zyMETkHbjJTTshxLnqPzQvAtdCe",
                "5HqoeNmaz17FwZRqn7kCBP1FyJKSe4tt42XZB7426EJ2MVWDeqk")
            && self.check_address("16S5PAsGZ8VFM1CRGGLqm37XHrp46f6CTn",
                "KxMUSkFhEzt2eJHscv2vNSTnnV2cgAXgL4WDQBTx7Ubd9TZmACAz")
            && self.check_address("3CyQYcByvcWK8BkYJabBS82yDLNWt6rWSx",
                "KxMUSkFhEzt2eJHscv2vNSTnnV2cgAXgL4WDQBTx7Ubd9TZmACAz")
            && self.check_address("bc1q6tqytpg06uhmtnhn9s4f35gkt8yya5a24dptmn",
                "L2wAVD273GwAxGuEDHvrCqPfuWg5wWLZWy6H3hjsmhCvNVuCERAQ")
    }

    fn check_parse(&self) -> bool {
        // Full (uncompressed) key, then even-y and odd-y compressed keys.
        let full = Point::decode_hex(
            "0475249c39f38baa6bf20ab472191292349426dc3652382cdc45f65695946653dc\
             978b2659122fe1df1be132167f27b74e5d4a2f3ecbbbd0b3fbcc2f4983518674");
        let even = Point::decode_hex(
            "02c931af9f331b7a9eb2737667880dacb91428906fbffad0173819a873172d21c4");
        let odd = Point::decode_hex(
            "033bf3d80f868fa33c6353012cb427e98b080452f19b5c1149ea2acfe4b7599739");
        match (full, even, odd) {
            (Some((f, false)), Some((e, true)), Some((o, true))) => {
                f.is_on_curve() && e.is_on_curve() && o.is_on_curve()
                    && e.y().is_even() && o.y().is_odd()
            }
            _ => false,
        }
    }

    /// Runs the whole self-check suite; true when everything passes.
    pub fn selftest(&self) -> bool {
        self.check_gtable()
            && self.check_double()
            && self.check_add()
            && self.check_gen_key()
            && self.check_gen_addr()
            && self.check_parse()
    }
}
