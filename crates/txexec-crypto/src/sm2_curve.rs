//! Minimal short-Weierstrass point arithmetic over the SM2 recommended
//! curve (GB/T 32918.5 / GM/T 0003.5-2012), just enough to implement
//! public-key recovery for [`crate::sm2_recover`].
//!
//! This is hand-rolled rather than borrowed from a curve crate because
//! SM2's signing equation (`s = (1+d)^-1 (k - r*d)`) does not admit the
//! same off-the-shelf recovery helper that `k256`/`p256` expose for plain
//! ECDSA; the recovery formula is specific to SM2 and is derived in
//! `sm2_recover`'s doc comment.

use num_bigint::BigUint;
use num_integer::Integer;
use num_traits::{One, Zero};

fn hex_to_biguint(s: &str) -> BigUint {
    BigUint::parse_bytes(s.as_bytes(), 16).expect("static curve constant")
}

/// SM2 recommended curve parameters.
pub struct Curve {
    pub p: BigUint,
    pub a: BigUint,
    pub b: BigUint,
    pub n: BigUint,
    pub gx: BigUint,
    pub gy: BigUint,
}

impl Curve {
    pub fn sm2() -> Self {
        Self {
            p: hex_to_biguint(
                "FFFFFFFEFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFF00000000FFFFFFFFFFFFFFFF",
            ),
            a: hex_to_biguint(
                "FFFFFFFEFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFF00000000FFFFFFFFFFFFFFFC",
            ),
            b: hex_to_biguint(
                "28E9FA9E9D9F5E344D5A9E4BCF6509A7F39789F515AB8F92DDBCBD414D940E93",
            ),
            n: hex_to_biguint(
                "FFFFFFFEFFFFFFFFFFFFFFFFFFFFFFFF7203DF6B21C6052B53BBF40939D54123",
            ),
            gx: hex_to_biguint(
                "32C4AE2C1F1981195F9904466A39C9948FE30BBFF2660BE1715A4589334C74C7",
            ),
            gy: hex_to_biguint(
                "BC3736A2F4F6779C59BDCEE36B692153D0A9877CC62A474002DF32E52139F0A0",
            ),
        }
    }

    pub fn generator(&self) -> Point {
        Point::Affine(self.gx.clone(), self.gy.clone())
    }

    fn mod_p(&self, v: &BigUint) -> BigUint {
        v.mod_floor(&self.p)
    }

    fn inv_mod(&self, v: &BigUint, modulus: &BigUint) -> Option<BigUint> {
        mod_inverse(v, modulus)
    }

    /// Reconstructs a curve point from its x-coordinate and the parity of y
    /// (the low bit of `recovery_id`), mirroring SEC1 point decompression.
    pub fn point_from_x(&self, x: &BigUint, y_is_odd: bool) -> Option<Point> {
        if x >= &self.p {
            return None;
        }
        // y^2 = x^3 + a*x + b (mod p)
        let x3 = x.modpow(&BigUint::from(3u32), &self.p);
        let ax = self.mod_p(&(&self.a * x));
        let rhs = self.mod_p(&(&self.mod_p(&(&x3 + &ax)) + &self.b));
        let y = mod_sqrt(&rhs, &self.p)?;
        let y = if (y.bit(0)) == y_is_odd { y } else { &self.p - &y };
        Some(Point::Affine(x.clone(), y))
    }

    pub fn add(&self, p1: &Point, p2: &Point) -> Point {
        match (p1, p2) {
            (Point::Infinity, p) | (p, Point::Infinity) => p.clone(),
            (Point::Affine(x1, y1), Point::Affine(x2, y2)) => {
                if x1 == x2 {
                    if (y1 + y2).mod_floor(&self.p) == BigUint::zero() {
                        return Point::Infinity;
                    }
                    return self.double(p1);
                }
                let num = self.mod_p(&(self.p.clone() + y2 - y1));
                let den = self.mod_p(&(self.p.clone() + x2 - x1));
                let lambda = match self.inv_mod(&den, &self.p) {
                    Some(inv) => self.mod_p(&(num * inv)),
                    None => return Point::Infinity,
                };
                let x3 = self.mod_p(
                    &(lambda.modpow(&BigUint::from(2u32), &self.p) + &self.p + &self.p - x1 - x2),
                );
                let y3 = self.mod_p(&(lambda * self.mod_p(&(&self.p + x1 - &x3)) + &self.p - y1));
                Point::Affine(x3, y3)
            }
        }
    }

    pub fn double(&self, p: &Point) -> Point {
        match p {
            Point::Infinity => Point::Infinity,
            Point::Affine(x, y) => {
                if y.is_zero() {
                    return Point::Infinity;
                }
                let num = self.mod_p(&(BigUint::from(3u32) * x.modpow(&BigUint::from(2u32), &self.p) + &self.a));
                let den = self.mod_p(&(BigUint::from(2u32) * y));
                let lambda = match self.inv_mod(&den, &self.p) {
                    Some(inv) => self.mod_p(&(num * inv)),
                    None => return Point::Infinity,
                };
                let x3 = self.mod_p(
                    &(lambda.modpow(&BigUint::from(2u32), &self.p) + &self.p + &self.p
                        - x
                        - x),
                );
                let y3 = self.mod_p(&(lambda * self.mod_p(&(&self.p + x - &x3)) + &self.p - y));
                Point::Affine(x3, y3)
            }
        }
    }

    pub fn negate(&self, p: &Point) -> Point {
        match p {
            Point::Infinity => Point::Infinity,
            Point::Affine(x, y) => Point::Affine(x.clone(), self.mod_p(&(&self.p - y))),
        }
    }

    pub fn mul(&self, scalar: &BigUint, point: &Point) -> Point {
        let mut result = Point::Infinity;
        let mut addend = point.clone();
        let mut k = scalar.clone();
        while !k.is_zero() {
            if k.bit(0) {
                result = self.add(&result, &addend);
            }
            addend = self.double(&addend);
            k >>= 1;
        }
        result
    }

    /// Scalar inverse modulo the curve order `n`.
    pub fn inv_mod_n(&self, scalar: &BigUint) -> Option<BigUint> {
        mod_inverse(&scalar.mod_floor(&self.n), &self.n)
    }

    pub fn mod_n(&self, v: &BigUint) -> BigUint {
        v.mod_floor(&self.n)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Point {
    Infinity,
    Affine(BigUint, BigUint),
}

/// Extended Euclidean algorithm based modular inverse.
fn mod_inverse(a: &BigUint, modulus: &BigUint) -> Option<BigUint> {
    let a = a.to_bigint_signed();
    let m = modulus.to_bigint_signed();
    let (mut old_r, mut r) = (a, m.clone());
    let (mut old_s, mut s) = (num_bigint::BigInt::one(), num_bigint::BigInt::zero());
    while !r.is_zero() {
        let q = &old_r / &r;
        let tmp_r = &old_r - &q * &r;
        old_r = r;
        r = tmp_r;
        let tmp_s = &old_s - &q * &s;
        old_s = s;
        s = tmp_s;
    }
    if old_r != num_bigint::BigInt::one() {
        return None;
    }
    let mut result = old_s.mod_floor(&m);
    if result.sign() == num_bigint::Sign::Minus {
        result += &m;
    }
    result.to_biguint()
}

trait ToSigned {
    fn to_bigint_signed(&self) -> num_bigint::BigInt;
}
impl ToSigned for BigUint {
    fn to_bigint_signed(&self) -> num_bigint::BigInt {
        num_bigint::BigInt::from_biguint(num_bigint::Sign::Plus, self.clone())
    }
}

/// Modular square root for `p % 4 == 3`, which holds for the SM2 prime.
fn mod_sqrt(a: &BigUint, p: &BigUint) -> Option<BigUint> {
    if a.is_zero() {
        return Some(BigUint::zero());
    }
    let exp = (p + BigUint::one()) >> 2u32;
    let candidate = a.modpow(&exp, p);
    if candidate.modpow(&BigUint::from(2u32), p) == a.mod_floor(p) {
        Some(candidate)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generator_satisfies_curve_equation() {
        let c = Curve::sm2();
        let Point::Affine(x, y) = c.generator() else {
            panic!()
        };
        let lhs = y.modpow(&BigUint::from(2u32), &c.p);
        let rhs = c.mod_p(&(x.modpow(&BigUint::from(3u32), &c.p) + &c.a * &x + &c.b));
        assert_eq!(lhs, rhs);
    }

    #[test]
    fn double_and_add_agree_for_2g() {
        let c = Curve::sm2();
        let g = c.generator();
        let doubled = c.double(&g);
        let added = c.add(&g, &g);
        assert_eq!(doubled, added);
    }

    #[test]
    fn point_from_x_round_trips_generator() {
        let c = Curve::sm2();
        let Point::Affine(gx, gy) = c.generator() else {
            panic!()
        };
        let recovered = c.point_from_x(&gx, gy.bit(0)).unwrap();
        assert_eq!(recovered, Point::Affine(gx, gy));
    }
}
