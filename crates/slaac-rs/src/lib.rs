#![cfg_attr(not(feature = "std"), no_std)]


// 'alloc' is used for boxed trait objects at the platform seam
// (prefix filter strategies and snapshot iterator handles).
extern crate alloc;

// --- Foundation Modules ---
pub mod types;
pub mod hal;
pub mod addr;

// --- Address Generation ---
pub mod secret;
pub mod iid;

// --- Reconciliation ---
pub mod pool;
pub mod engine;

// --- Top-level Exports ---
pub use addr::{Ipv6Address, Ipv6Prefix, OnMeshPrefix, UnicastAddress};
pub use engine::{PrefixFilter, SlaacEngine};
pub use hal::{
    AddressRegistry, EntropySource, KeyStorage, NonCryptoRng, PrefixSource, SlaacError,
    SlaacPlatform,
};
pub use iid::IidGenerator;
pub use pool::{AddressPool, SlaacAddress};
pub use secret::SecretKey;
pub use types::{ChangedFlags, SlaacConfig, UpdateMode};
