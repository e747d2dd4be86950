// crates/slaac-rs/tests/simulator/mod.rs
//
// Fake platform collaborators for exercising the engine against scripted
// advertisement and interface states.

use slaac_rs::{
    AddressRegistry, EntropySource, Ipv6Address, Ipv6Prefix, KeyStorage, NonCryptoRng,
    OnMeshPrefix, PrefixSource, SecretKey, SlaacAddress, SlaacError, SlaacPlatform,
    UnicastAddress,
};

/// Scripted advertisement source. Tests edit `prefixes` between passes to
/// simulate network-data changes.
pub struct FakeNetData {
    pub prefixes: Vec<OnMeshPrefix>,
}

impl PrefixSource for FakeNetData {
    fn on_mesh_prefixes(&self) -> Box<dyn Iterator<Item = OnMeshPrefix> + '_> {
        Box::new(self.prefixes.iter().copied())
    }
}

/// In-memory interface address list that records every add and remove for
/// assertions.
#[derive(Default)]
pub struct FakeNetif {
    pub addresses: Vec<UnicastAddress>,
    pub added: Vec<UnicastAddress>,
    pub removed: Vec<Ipv6Address>,
}

impl AddressRegistry for FakeNetif {
    fn unicast_addresses(&self) -> Box<dyn Iterator<Item = UnicastAddress> + '_> {
        Box::new(self.addresses.iter().copied())
    }

    fn add_unicast(&mut self, entry: &SlaacAddress) -> Result<(), SlaacError> {
        let unicast = UnicastAddress {
            address: entry.address,
            prefix_length: entry.prefix_length,
        };
        self.addresses.push(unicast);
        self.added.push(unicast);
        Ok(())
    }

    fn remove_unicast(&mut self, address: &Ipv6Address) -> Result<(), SlaacError> {
        let position = self
            .addresses
            .iter()
            .position(|existing| existing.address == *address)
            .ok_or(SlaacError::AddressNotFound)?;
        self.addresses.remove(position);
        self.removed.push(*address);
        Ok(())
    }
}

#[derive(Default)]
pub struct MemKeyStorage {
    pub key: Option<SecretKey>,
}

impl KeyStorage for MemKeyStorage {
    fn load_iid_key(&mut self) -> Result<Option<SecretKey>, SlaacError> {
        Ok(self.key)
    }

    fn save_iid_key(&mut self, key: &SecretKey) -> Result<(), SlaacError> {
        self.key = Some(*key);
        Ok(())
    }
}

/// Deterministic "true-random" source that can be switched off to
/// exercise the PRNG fallback.
pub struct FakeEntropy {
    pub available: bool,
}

impl EntropySource for FakeEntropy {
    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), SlaacError> {
        if !self.available {
            return Err(SlaacError::EntropyUnavailable);
        }
        for (i, byte) in dest.iter_mut().enumerate() {
            *byte = 0xe0 ^ (i as u8);
        }
        Ok(())
    }
}

/// Counting byte sequence standing in for the non-crypto RNG.
#[derive(Default)]
pub struct SeqRng {
    pub next: u8,
    pub calls: usize,
}

impl NonCryptoRng for SeqRng {
    fn fill_bytes(&mut self, dest: &mut [u8]) {
        self.calls += 1;
        for byte in dest.iter_mut() {
            *byte = self.next;
            self.next = self.next.wrapping_add(1);
        }
    }
}

/// Owns one set of fake collaborators and lends them out as a platform
/// context per engine call.
pub struct Harness {
    pub net_data: FakeNetData,
    pub netif: FakeNetif,
    pub storage: MemKeyStorage,
    pub entropy: FakeEntropy,
    pub rng: SeqRng,
}

impl Harness {
    pub fn new(prefixes: Vec<OnMeshPrefix>) -> Self {
        Self {
            net_data: FakeNetData { prefixes },
            netif: FakeNetif::default(),
            storage: MemKeyStorage::default(),
            entropy: FakeEntropy { available: true },
            rng: SeqRng::default(),
        }
    }

    pub fn platform(&mut self) -> SlaacPlatform<'_> {
        SlaacPlatform {
            net_data: &self.net_data,
            netif: &mut self.netif,
            storage: &mut self.storage,
            entropy: &mut self.entropy,
            rng: &mut self.rng,
        }
    }

    /// Removes an address behind the engine's back, as the host stack
    /// does when duplicate address detection fails or a user deletes it.
    pub fn remove_externally(&mut self, address: &Ipv6Address) {
        self.netif
            .addresses
            .retain(|existing| existing.address != *address);
    }
}

/// Builds a /64 on-mesh prefix from a textual IPv6 address.
pub fn on_mesh(text: &str) -> OnMeshPrefix {
    OnMeshPrefix {
        prefix: prefix(text, 64),
        slaac: true,
        preferred: true,
    }
}

pub fn prefix(text: &str, length: u8) -> Ipv6Prefix {
    let parsed: std::net::Ipv6Addr = text.parse().expect("test prefix must parse");
    Ipv6Prefix::new(parsed.octets(), length)
}

pub fn address(text: &str) -> Ipv6Address {
    let parsed: std::net::Ipv6Addr = text.parse().expect("test address must parse");
    Ipv6Address::from(parsed.octets())
}
