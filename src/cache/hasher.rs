//! Key Hasher Module
//!
//! Turns cache keys into fixed-width map keys and derives memoization keys
//! from a callable's identity plus its arguments.

use serde::Serialize;
use sha2::{Digest, Sha256};

use crate::cache::arg_text::{self, RenderError};

const FNV_OFFSET_BASIS: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;

// == Key Hash ==
/// 64-bit FNV-1a hash of a cache key.
///
/// Stable across runs and platforms; used as the entry map key.
pub fn hash_key(key: &str) -> u64 {
    key.bytes().fold(FNV_OFFSET_BASIS, |hash, byte| {
        (hash ^ u64::from(byte)).wrapping_mul(FNV_PRIME)
    })
}

// == Call Key ==
/// Derives the cache key of a memoized call.
///
/// The arguments are rendered as text through serde, so a tuple `(a, b)`
/// is positional. The key is the hex SHA-256 digest of `identity` and the
/// rendered arguments joined by `_`.
///
/// Arguments containing maps with unordered iteration (e.g. `HashMap`)
/// render differently between calls; use ordered maps for memoized calls.
pub fn derive_call_key<A>(identity: &str, args: &A) -> Result<String, RenderError>
where
    A: Serialize + ?Sized,
{
    let rendered = arg_text::render(args)?;

    let mut hasher = Sha256::new();
    hasher.update(identity.as_bytes());
    hasher.update(b"_");
    hasher.update(rendered.as_bytes());
    Ok(format!("{:x}", hasher.finalize()))
}
