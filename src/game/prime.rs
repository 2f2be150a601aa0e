//! Sophie-Germain prime generation for the shared modulus.
//!
//! The server publishes `(p, q)` with `p = 2q + 1`, both prime; the
//! commutative cipher itself runs peer-side against this modulus. The
//! modulus is small (32-bit by default, as in the reference protocol),
//! so a deterministic u64 Miller-Rabin is sufficient and avoids pulling
//! a number-theory stack into the crate.

use rand::Rng;

/// Deterministic Miller-Rabin witnesses covering the full u64 range.
const WITNESSES: [u64; 12] = [2, 3, 5, 7, 11, 13, 17, 19, 23, 29, 31, 37];

fn mul_mod(a: u64, b: u64, m: u64) -> u64 {
    ((u128::from(a) * u128::from(b)) % u128::from(m)) as u64
}

fn pow_mod(mut base: u64, mut exp: u64, m: u64) -> u64 {
    let mut acc = 1u64;
    base %= m;
    while exp > 0 {
        if exp & 1 == 1 {
            acc = mul_mod(acc, base, m);
        }
        base = mul_mod(base, base, m);
        exp >>= 1;
    }
    acc
}

/// Deterministic Miller-Rabin primality test for u64.
#[must_use]
pub fn is_prime(n: u64) -> bool {
    if n < 2 {
        return false;
    }
    for p in WITNESSES {
        if n == p {
            return true;
        }
        if n % p == 0 {
            return false;
        }
    }
    let mut d = n - 1;
    let mut r = 0u32;
    while d % 2 == 0 {
        d /= 2;
        r += 1;
    }
    'witness: for a in WITNESSES {
        let mut x = pow_mod(a, d, n);
        if x == 1 || x == n - 1 {
            continue;
        }
        for _ in 1..r {
            x = mul_mod(x, x, n);
            if x == n - 1 {
                continue 'witness;
            }
        }
        return false;
    }
    true
}

fn random_prime(bits: u32, rng: &mut impl Rng) -> u64 {
    let low = 1u64 << (bits - 1);
    let high = 1u64 << bits;
    loop {
        let candidate = rng.random_range(low..high) | 1;
        if is_prime(candidate) {
            return candidate;
        }
    }
}

/// Generate a Sophie-Germain pair `(p, q)` where `q` has `bits` bits,
/// `p = 2q + 1`, and both are prime.
///
/// # Panics
///
/// `bits` must be in `2..=62` so that `p` fits in a u64.
pub fn sophie_germain_pair(bits: u32, rng: &mut impl Rng) -> (u64, u64) {
    assert!((2..=62).contains(&bits), "prime bits out of range");
    loop {
        let q = random_prime(bits, rng);
        let p = 2 * q + 1;
        if is_prime(p) {
            return (p, q);
        }
    }
}
