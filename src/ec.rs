//! ECDSA verification over sect233r1, as used by console-issued (NG) and
//! application (AP) certificates.
//!
//! Curve: `y^2 + xy = x^3 + x^2 + b` over GF(2^233). Points are stored as
//! 60 bytes, `x || y`, each coordinate 30 bytes big-endian. Signatures are
//! `R || S`, 30 bytes each.

use crypto_bigint::{
    modular::runtime_mod::{DynResidue, DynResidueParams},
    Encoding, U256,
};

use crate::crypt;

use self::field::Elem;

pub mod field;

pub const CERT_SIZE: usize = 0x180;
pub const SIG_SIZE: usize = 0x40;

const CERT_SIG_R: usize = 0x04;
const CERT_SIG_S: usize = 0x22;
const CERT_SIGNED: usize = 0x80;
const CERT_PUBKEY: usize = 0x108;

const CURVE_B: [u8; 30] = [
    0x00, 0x66, 0x64, 0x7e, 0xde, 0x6c, 0x33, 0x2c, 0x7f, 0x8c, 0x09, 0x23, 0xbb, 0x58, 0x21, 0x3b,
    0x33, 0x3b, 0x20, 0xe9, 0xce, 0x42, 0x81, 0xfe, 0x11, 0x5f, 0x7d, 0x8f, 0x90, 0xad,
];
const CURVE_GX: [u8; 30] = [
    0x00, 0xfa, 0xc9, 0xdf, 0xcb, 0xac, 0x83, 0x13, 0xbb, 0x21, 0x39, 0xf1, 0xbb, 0x75, 0x5f, 0xef,
    0x65, 0xbc, 0x39, 0x1f, 0x8b, 0x36, 0xf8, 0xf8, 0xeb, 0x73, 0x71, 0xfd, 0x55, 0x8b,
];
const CURVE_GY: [u8; 30] = [
    0x01, 0x00, 0x6a, 0x08, 0xa4, 0x19, 0x03, 0x35, 0x06, 0x78, 0xe5, 0x85, 0x28, 0xbe, 0xbf, 0x8a,
    0x0b, 0xef, 0xf8, 0x67, 0xa7, 0xca, 0x36, 0x71, 0x6f, 0x7e, 0x01, 0xf8, 0x10, 0x52,
];
const CURVE_N: [u8; 30] = [
    0x01, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x13,
    0xe9, 0x74, 0xe7, 0x2f, 0x8a, 0x69, 0x22, 0x03, 0x1d, 0x26, 0x03, 0xcf, 0xe0, 0xd7,
];

/// Verifies a payload signature against its NG/AP certificate pair.
pub trait SignatureCheck {
    fn check(
        &self,
        ng_cert: &[u8; CERT_SIZE],
        ap_cert: &[u8; CERT_SIZE],
        sig: &[u8; SIG_SIZE],
        hash: &[u8; 20],
    ) -> bool;
}

impl<T: SignatureCheck + ?Sized> SignatureCheck for &T {
    fn check(
        &self,
        ng_cert: &[u8; CERT_SIZE],
        ap_cert: &[u8; CERT_SIZE],
        sig: &[u8; SIG_SIZE],
        hash: &[u8; 20],
    ) -> bool {
        (**self).check(ng_cert, ap_cert, sig, hash)
    }
}

/// The AP certificate must be signed by the NG key, and the payload hash by the AP key.
#[derive(Clone, Copy, Debug, Default)]
pub struct Sect233r1;

impl SignatureCheck for Sect233r1 {
    fn check(
        &self,
        ng_cert: &[u8; CERT_SIZE],
        ap_cert: &[u8; CERT_SIZE],
        sig: &[u8; SIG_SIZE],
        hash: &[u8; 20],
    ) -> bool {
        let ap_hash = crypt::sha1(&ap_cert[CERT_SIGNED..]);

        verify(
            &ng_cert[CERT_PUBKEY..CERT_PUBKEY + 60],
            &ap_cert[CERT_SIG_R..CERT_SIG_R + 30],
            &ap_cert[CERT_SIG_S..CERT_SIG_S + 30],
            &ap_hash,
        ) && verify(
            &ap_cert[CERT_PUBKEY..CERT_PUBKEY + 60],
            &sig[..30],
            &sig[30..60],
            hash,
        )
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Point {
    Infinity,
    Affine(Elem, Elem),
}

impl Point {
    pub fn generator() -> Point {
        Point::Affine(Elem::from_be_bytes(&CURVE_GX), Elem::from_be_bytes(&CURVE_GY))
    }

    /// Parse a 60-byte `x || y` point.
    pub fn from_bytes(bytes: &[u8]) -> Point {
        Point::Affine(
            Elem::from_be_bytes(&bytes[..30]),
            Elem::from_be_bytes(&bytes[30..60]),
        )
    }

    pub fn is_on_curve(&self) -> bool {
        match self {
            Point::Infinity => true,
            Point::Affine(x, y) => {
                let x2 = x.square();
                let lhs = y.square().add(&x.mul(y));
                let rhs = x2.mul(x).add(&x2).add(&Elem::from_be_bytes(&CURVE_B));
                lhs == rhs
            }
        }
    }

    pub fn double(&self) -> Point {
        match *self {
            Point::Affine(x, y) if !x.is_zero() => {
                let l = x.add(&y.div(&x));
                let x3 = l.square().add(&l).add(&Elem::ONE);
                let y3 = x.square().add(&l.add(&Elem::ONE).mul(&x3));
                Point::Affine(x3, y3)
            }
            _ => Point::Infinity,
        }
    }

    pub fn add(&self, other: &Point) -> Point {
        let (x1, y1, x2, y2) = match (*self, *other) {
            (Point::Infinity, p) | (p, Point::Infinity) => return p,
            (Point::Affine(x1, y1), Point::Affine(x2, y2)) => (x1, y1, x2, y2),
        };

        if x1 == x2 {
            return if y1 == y2 {
                self.double()
            } else {
                Point::Infinity
            };
        }

        let sx = x1.add(&x2);
        let l = y1.add(&y2).div(&sx);
        let x3 = l.square().add(&l).add(&sx).add(&Elem::ONE);
        let y3 = l.mul(&x1.add(&x3)).add(&x3).add(&y1);
        Point::Affine(x3, y3)
    }

    pub fn mul(&self, k: &U256) -> Point {
        let mut acc = Point::Infinity;
        for byte in k.to_be_bytes() {
            for bit in (0..8).rev() {
                acc = acc.double();
                if byte >> bit & 1 != 0 {
                    acc = acc.add(self);
                }
            }
        }
        acc
    }
}

/// Big-endian integer of at most 32 bytes.
pub fn uint(bytes: &[u8]) -> U256 {
    let mut wide = [0u8; 32];
    wide[32 - bytes.len()..].copy_from_slice(bytes);
    U256::from_be_slice(&wide)
}

pub fn order() -> U256 {
    uint(&CURVE_N)
}

/// Verify an ECDSA signature `(r, s)` over a 20-byte hash with public key `q`.
pub fn verify(q: &[u8], r: &[u8], s: &[u8], hash: &[u8; 20]) -> bool {
    let n = order();
    let (r, s) = (uint(r), uint(s));
    if r == U256::ZERO || s == U256::ZERO || r >= n || s >= n {
        return false;
    }

    let q = Point::from_bytes(q);
    if !q.is_on_curve() {
        return false;
    }

    let params = DynResidueParams::new(&n);
    let m = |v: &U256| DynResidue::new(v, params);

    // n is prime and s is in [1, n), so the inverse exists
    let (w, _) = m(&s).invert();
    let u1 = (m(&uint(hash)) * w).retrieve();
    let u2 = (m(&r) * w).retrieve();

    match Point::generator().mul(&u1).add(&q.mul(&u2)) {
        Point::Infinity => false,
        Point::Affine(x, _) => m(&U256::from_be_slice(&x.to_be_bytes())).retrieve() == r,
    }
}
