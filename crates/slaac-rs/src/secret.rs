use crate::hal::{EntropySource, KeyStorage, NonCryptoRng};
use core::fmt;
use log::{debug, info, warn};

/// Size of the IID secret key in octets. RFC 7217 (Section 5) requires at
/// least 128 bits; a full hash block's worth is kept.
pub const SECRET_KEY_LENGTH: usize = 32;

/// Secret key mixed into every IID derivation.
///
/// Created at most once per device lifetime and persisted before first
/// use: regenerating it would silently change every derived address, so
/// stability across restarts is part of the contract.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct SecretKey(pub [u8; SECRET_KEY_LENGTH]);

impl fmt::Debug for SecretKey {
    /// Key material stays out of debug output and logs.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SecretKey(..)")
    }
}

/// Returns the persisted IID secret key, generating and persisting one on
/// first use.
///
/// A stored key always wins, whatever its provenance. When none exists,
/// the key is filled from the true-random source, falling back to the
/// pseudo-random source when that fails. Storage failures are best-effort
/// in both directions: an unreadable key is treated as absent and a
/// failed save is logged and the fresh key returned anyway.
pub fn load_or_generate(
    storage: &mut dyn KeyStorage,
    entropy: &mut dyn EntropySource,
    rng: &mut dyn NonCryptoRng,
) -> SecretKey {
    match storage.load_iid_key() {
        Ok(Some(key)) => return key,
        Ok(None) => {}
        Err(e) => debug!("[SLAAC] IID secret key unreadable ({}), treating as absent", e),
    }

    let mut key = SecretKey([0; SECRET_KEY_LENGTH]);
    if entropy.try_fill_bytes(&mut key.0).is_err() {
        info!("[SLAAC] True-random source unavailable, filling IID secret key from PRNG");
        rng.fill_bytes(&mut key.0);
    }

    if let Err(e) = storage.save_iid_key(&key) {
        warn!("[SLAAC] Could not persist IID secret key: {}", e);
    }
    info!("[SLAAC] Generated and saved IID secret key");

    key
}
