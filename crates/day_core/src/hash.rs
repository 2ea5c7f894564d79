//! Deterministic hash-to-bucket primitive.
//!
//! Every feature that needs a stable per-user slot (experiment variants, rollout
//! percentages) goes through [`bucket`], so a user lands in the same place no
//! matter which feature asks. The hash walks UTF-16 code units, which keeps
//! bucket assignments identical to the ones produced by the browser client.

/// FNV-1a 32-bit offset basis.
pub const FNV_OFFSET_BASIS: u32 = 2_166_136_261;

/// FNV-1a 32-bit prime.
pub const FNV_PRIME: u32 = 16_777_619;

/// Hash `key` with 32-bit FNV-1a over its UTF-16 code units.
pub fn fnv1a32(key: &str) -> u32 {
    let mut hash = FNV_OFFSET_BASIS;
    for unit in key.encode_utf16() {
        hash ^= u32::from(unit);
        hash = hash.wrapping_mul(FNV_PRIME);
    }
    hash
}

/// Compose the canonical `"<user>:<key>"` string fed to the hash.
pub fn composite_key(user_id: &str, key: &str) -> String {
    format!("{}:{}", user_id, key)
}

/// Map `(user_id, key)` onto `[0, buckets)`.
///
/// The 32-bit hash is read as a signed integer and its magnitude taken before
/// the modulo. Returns `0` when `buckets` is zero.
pub fn bucket(user_id: &str, key: &str, buckets: u32) -> u32 {
    if buckets == 0 {
        return 0;
    }
    let hash = fnv1a32(&composite_key(user_id, key));
    (hash as i32).unsigned_abs() % buckets
}
