//! Constant-time verification of the `state` parameter echoed back by the provider.
//!
//! The comparison walks the full length of the longer input regardless of where (or
//! whether) the inputs differ. Past the end of the shorter input the first byte of that
//! input is substituted and the result is forced to a mismatch, so a length difference
//! never short-circuits the loop. Empty or absent inputs are always a mismatch.

// crates.io
use subtle::{Choice, ConstantTimeEq};

/// Compares the expected request identifier with the `state` returned by the provider.
pub fn verify_state(expected: &str, returned: Option<&str>) -> bool {
	match returned {
		Some(returned) => constant_time_eq(expected.as_bytes(), returned.as_bytes()),
		None => false,
	}
}

/// Byte-wise equality whose running time depends only on the longer input's length.
pub fn constant_time_eq(lhs: &[u8], rhs: &[u8]) -> bool {
	let (Some(&lhs_fill), Some(&rhs_fill)) = (lhs.first(), rhs.first()) else {
		return false;
	};
	let len = lhs.len().max(rhs.len());
	let mut equal = Choice::from(u8::from(lhs.len() == rhs.len()));

	for idx in 0..len {
		let l = lhs.get(idx).copied().unwrap_or(lhs_fill);
		let r = rhs.get(idx).copied().unwrap_or(rhs_fill);

		equal &= l.ct_eq(&r);
	}

	bool::from(equal)
}
