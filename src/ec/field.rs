//! GF(2^233) with reduction polynomial x^233 + x^74 + 1.

pub const BITS: usize = 233;

/// Field element, little-endian 64-bit limbs.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Elem(pub [u64; 4]);

impl Elem {
    pub const ZERO: Elem = Elem([0; 4]);
    pub const ONE: Elem = Elem([1, 0, 0, 0]);

    /// Big-endian bytes, at most 32.
    pub fn from_be_bytes(bytes: &[u8]) -> Self {
        let mut limbs = [0u64; 4];
        for (i, &b) in bytes.iter().rev().enumerate() {
            limbs[i / 8] |= (b as u64) << (8 * (i % 8));
        }
        Elem(limbs)
    }

    pub fn to_be_bytes(&self) -> [u8; 32] {
        let mut out = [0u8; 32];
        for (i, limb) in self.0.iter().enumerate() {
            out[24 - 8 * i..32 - 8 * i].copy_from_slice(&limb.to_be_bytes());
        }
        out
    }

    pub fn is_zero(&self) -> bool {
        self.0 == [0; 4]
    }

    fn bit(&self, i: usize) -> bool {
        self.0[i / 64] >> (i % 64) & 1 != 0
    }

    fn flip(&mut self, i: usize) {
        self.0[i / 64] ^= 1 << (i % 64);
    }

    /// Degree of the polynomial, `None` for zero.
    fn degree(&self) -> Option<usize> {
        (0..4)
            .rev()
            .find(|&i| self.0[i] != 0)
            .map(|i| 64 * i + 63 - self.0[i].leading_zeros() as usize)
    }

    fn shl(&self, n: usize) -> Elem {
        let (words, bits) = (n / 64, n % 64);
        let mut out = [0u64; 4];
        for i in (words..4).rev() {
            out[i] = self.0[i - words] << bits;
            if bits != 0 && i > words {
                out[i] |= self.0[i - words - 1] >> (64 - bits);
            }
        }
        Elem(out)
    }

    pub fn add(&self, other: &Elem) -> Elem {
        let mut out = self.0;
        for (o, b) in out.iter_mut().zip(other.0) {
            *o ^= b;
        }
        Elem(out)
    }

    pub fn mul(&self, other: &Elem) -> Elem {
        let mut acc = Elem::ZERO;
        for i in (0..BITS).rev() {
            acc = acc.shl(1);
            if acc.bit(BITS) {
                acc.flip(BITS);
                acc.flip(74);
                acc.flip(0);
            }
            if other.bit(i) {
                acc = acc.add(self);
            }
        }
        acc
    }

    pub fn square(&self) -> Elem {
        self.mul(self)
    }

    /// Multiplicative inverse by the extended Euclidean algorithm. Zero maps to zero.
    pub fn inv(&self) -> Elem {
        if self.is_zero() {
            return Elem::ZERO;
        }

        let mut f = Elem::ZERO;
        f.flip(BITS);
        f.flip(74);
        f.flip(0);

        let (mut u, mut v) = (*self, f);
        let (mut g1, mut g2) = (Elem::ONE, Elem::ZERO);

        while u != Elem::ONE {
            let (du, dv) = (u.degree().unwrap_or(0), v.degree().unwrap_or(0));
            if du < dv {
                std::mem::swap(&mut u, &mut v);
                std::mem::swap(&mut g1, &mut g2);
                continue;
            }
            let j = du - dv;
            u = u.add(&v.shl(j));
            g1 = g1.add(&g2.shl(j));
        }

        g1
    }

    pub fn div(&self, other: &Elem) -> Elem {
        self.mul(&other.inv())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Elem {
        Elem::from_be_bytes(&[
            0x00, 0xfa, 0xc9, 0xdf, 0xcb, 0xac, 0x83, 0x13, 0xbb, 0x21, 0x39, 0xf1, 0xbb, 0x75,
            0x5f, 0xef, 0x65, 0xbc, 0x39, 0x1f, 0x8b, 0x36, 0xf8, 0xf8, 0xeb, 0x73, 0x71, 0xfd,
            0x55, 0x8b,
        ])
    }

    #[test]
    fn inverse_round_trip() {
        let a = sample();
        assert_eq!(a.mul(&a.inv()), Elem::ONE);
        assert_eq!(Elem::ONE.inv(), Elem::ONE);

        let b = Elem([0x1234_5678_9abc_def0, 7, 0, 1 << 40]);
        assert_eq!(b.mul(&b.inv()), Elem::ONE);
        assert_eq!(a.mul(&b).div(&b), a);
    }

    #[test]
    fn byte_order_round_trips() {
        let a = sample();
        assert_eq!(Elem::from_be_bytes(&a.to_be_bytes()), a);
        assert_eq!(Elem::ONE.to_be_bytes()[31], 1);
    }

    #[test]
    fn reduction_wraps_top_bit() {
        // x^232 * x = x^233 = x^74 + 1
        let mut x232 = Elem::ZERO;
        x232.flip(232);
        let x = Elem([2, 0, 0, 0]);
        let mut expected = Elem::ONE;
        expected.flip(74);
        assert_eq!(x232.mul(&x), expected);
    }

    #[test]
    fn multiplication_commutes_and_distributes() {
        let a = sample();
        let b = Elem([0xdead_beef, 0xffff_0000_ffff, 42, 0x1ff_ffff_ffff]);
        let c = Elem([3, 5, 7, 11]);
        assert_eq!(a.mul(&b), b.mul(&a));
        assert_eq!(a.mul(&b.add(&c)), a.mul(&b).add(&a.mul(&c)));
    }
}
