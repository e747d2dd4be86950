use crate::addr::{Ipv6Address, OnMeshPrefix, UnicastAddress};
use crate::pool::SlaacAddress;
use crate::secret::SecretKey;
use alloc::boxed::Box;
use core::fmt;

/// Defines a portable, descriptive Error type for the platform seam.
///
/// These errors surface only from the platform traits below; the engine's
/// public operations absorb them (logging where useful) and never fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlaacError {
    /// An underlying I/O error occurred.
    IoError,
    /// An error occurred in the storage backend.
    StorageError(&'static str),
    /// The true-random source could not produce bytes.
    EntropyUnavailable,
    /// The interface does not carry the requested address.
    AddressNotFound,
}

impl fmt::Display for SlaacError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::IoError => write!(f, "An underlying I/O error occurred"),
            Self::StorageError(s) => write!(f, "Storage error: {}", s),
            Self::EntropyUnavailable => write!(f, "True-random source unavailable"),
            Self::AddressNotFound => write!(f, "Address not present on the interface"),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for SlaacError {}

impl From<&'static str> for SlaacError {
    fn from(s: &'static str) -> Self {
        SlaacError::StorageError(s)
    }
}

/// Read-only view of the network-wide advertised prefix set.
///
/// Every reconciliation pass calls [`Self::on_mesh_prefixes`] afresh and
/// walks the returned snapshot; the engine never stores prefixes between
/// passes. The enumeration order is the provider's own and is only stable
/// within a single snapshot, so which prefixes win slots under capacity
/// pressure follows that order.
pub trait PrefixSource {
    /// Enumerates the currently advertised on-mesh prefixes.
    fn on_mesh_prefixes(&self) -> Box<dyn Iterator<Item = OnMeshPrefix> + '_>;
}

/// The interface's unicast address list, owned by the host network stack.
///
/// The engine only ever adds and removes through this trait and never
/// keeps a reference to an address past the call that removes it.
pub trait AddressRegistry {
    /// Returns a snapshot of the current unicast addresses.
    fn unicast_addresses(&self) -> Box<dyn Iterator<Item = UnicastAddress> + '_>;

    /// Installs a SLAAC-generated address on the interface.
    fn add_unicast(&mut self, entry: &SlaacAddress) -> Result<(), SlaacError>;

    /// Removes a previously installed address from the interface.
    fn remove_unicast(&mut self, address: &Ipv6Address) -> Result<(), SlaacError>;
}

/// Non-volatile storage for the IID secret key.
pub trait KeyStorage {
    /// Loads the stored secret key, or `None` if none was ever saved.
    fn load_iid_key(&mut self) -> Result<Option<SecretKey>, SlaacError>;

    /// Persists the secret key for future boots.
    fn save_iid_key(&mut self, key: &SecretKey) -> Result<(), SlaacError>;
}

/// A true-random byte source. May legitimately be unavailable on
/// constrained hardware; callers fall back to [`NonCryptoRng`].
pub trait EntropySource {
    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), SlaacError>;
}

/// A pseudo-random byte source that always succeeds.
pub trait NonCryptoRng {
    fn fill_bytes(&mut self, dest: &mut [u8]);
}

/// Explicit bundle of the platform collaborators, passed to every engine
/// operation. Keeping these out of the engine struct lets independent
/// engine instances share or swap collaborators freely in tests.
pub struct SlaacPlatform<'a> {
    pub net_data: &'a dyn PrefixSource,
    pub netif: &'a mut dyn AddressRegistry,
    pub storage: &'a mut dyn KeyStorage,
    pub entropy: &'a mut dyn EntropySource,
    pub rng: &'a mut dyn NonCryptoRng,
}
