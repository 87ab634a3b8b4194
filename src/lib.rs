//! Vanikey is a fixed-width big-integer and secp256k1 arithmetic
//! library tuned for bulk Bitcoin key and address derivation.
//!
//! Three layers are provided, leaves first:
//!
//!  - `zint` implements `Zi320`, a 320-bit signed integer stored as
//!    five 64-bit limbs. The extra limb above 256 bits is headroom for
//!    Knuth division, Montgomery multiplication and the divstep modular
//!    inverse. Comparison, carry-correct addition and subtraction,
//!    schoolbook multiplication, Knuth division, shifts, bitwise
//!    operations, base-N string I/O, random sampling, and Miller-Rabin
//!    primality testing live here.
//!
//!  - `field` implements `ModField`, Montgomery modular arithmetic over
//!    a runtime-chosen odd modulus of up to 256 bits, and `k1`
//!    implements the same operations specialised to the secp256k1 field
//!    prime p = 2^256 - 2^32 - 977, reducing products by folding the
//!    top half with the constant 2^32 + 977 instead of dividing.
//!
//!  - `secp256k1` implements curve points in affine and projective
//!    form, scalar multiplication, and a 256x32 table of precomputed
//!    generator multiples that turns a private key into a public key
//!    with one field inversion plus a few multiplications per nonzero
//!    key byte. `address` and `hash160` turn public keys into P2PKH,
//!    P2SH-P2WPKH and Bech32 addresses and handle WIF private keys.
//!
//! # Conventions
//!
//! This library is deliberately variable-time: it targets throughput
//! for address search over low-value throwaway keys, not constant-time
//! handling of long-lived secrets. Branches in the hot paths do not
//! depend on secret bits beyond what the algorithms inherently leak
//! (e.g. the positions of zero bytes in a scalar), but no further
//! hardening is attempted, and predicates return ordinary `bool`
//! values.
//!
//! Functions that modify a value in place have a name in `set_*()`;
//! most have a value-returning counterpart. Fallible operations
//! (parsing, decompression, division by zero, the zero scalar) return
//! `Option` or `bool` rather than panicking.
//!
//! # Initialisation
//!
//! The generator table and the order-field constants live in a
//! [`secp256k1::Secp256k1`] context. Build one with `new()`, or call
//! `Secp256k1::global()` for a process-wide instance built once behind
//! a memory barrier; all other state is constant and read-only.

pub use rand_core::{CryptoRng, RngCore};

mod backend;

pub mod zint;
pub mod field;
pub mod k1;
pub mod secp256k1;
pub mod hash160;
pub mod address;

pub use address::AddrKind;
pub use field::ModField;
pub use secp256k1::{Point, Secp256k1};
pub use zint::Zi320;
