use crate::addr::{prefix_octets, Ipv6Address};
use crate::hal::NonCryptoRng;
use crate::secret::SecretKey;
use crate::types::{SlaacConfig, IID_LENGTH};
use log::warn;
use sha2::{Digest, Sha256};

/// Derives semantically opaque interface identifiers per RFC 7217.
///
/// RID = F(Prefix, Net_Iface, DAD_Counter, secret_key)
///
/// - `F()` is SHA-256; the leading [`IID_LENGTH`] octets of the digest
///   form the candidate identifier.
/// - `Net_Iface` is the fixed tag from [`SlaacConfig`].
/// - `Network_ID` is not used (optional per RFC 7217).
/// - `DAD_Counter` is encoded as a fixed-width little-endian `u16`.
///
/// For a given (prefix, secret key) pair the derivation is a pure
/// function, so an address re-derived after a restart is the address that
/// was installed before it.
pub struct IidGenerator<'a> {
    config: &'a SlaacConfig,
}

impl<'a> IidGenerator<'a> {
    pub fn new(config: &'a SlaacConfig) -> Self {
        Self { config }
    }

    /// Fills in the interface identifier of `address`, whose prefix bits
    /// up to `prefix_length` must already be in place.
    ///
    /// Candidates that collide with a reserved identifier are retried
    /// with the next counter value. If every attempt collides, the
    /// identifier is drawn from the pseudo-random source instead; the
    /// address then loses cross-restart stability but stays usable.
    pub fn generate(
        &self,
        address: &mut Ipv6Address,
        prefix_length: u8,
        key: &SecretKey,
        rng: &mut dyn NonCryptoRng,
    ) {
        let octets = prefix_octets(prefix_length);

        for counter in 0..self.config.max_iid_attempts {
            let mut hasher = Sha256::new();
            hasher.update(&address.octets()[..octets]);
            hasher.update(self.config.iface_tag);
            hasher.update(counter.to_le_bytes());
            hasher.update(key.0);
            let digest = hasher.finalize();

            let mut iid = [0u8; IID_LENGTH];
            iid.copy_from_slice(&digest[..IID_LENGTH]);
            address.set_iid(&iid);

            if !address.is_iid_reserved() {
                return;
            }
        }

        warn!(
            "[SLAAC] No acceptable IID after {} attempts, falling back to a random identifier",
            self.config.max_iid_attempts
        );
        let mut iid = [0u8; IID_LENGTH];
        rng.fill_bytes(&mut iid);
        address.set_iid(&iid);
    }
}
