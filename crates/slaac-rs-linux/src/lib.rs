// crates/slaac-rs-linux/src/lib.rs
#![cfg(target_os = "linux")]

use log::warn;
use rand::rngs::{OsRng, StdRng};
use rand::{RngCore, SeedableRng};
use slaac_rs::secret::SECRET_KEY_LENGTH;
use slaac_rs::{
    AddressRegistry, EntropySource, Ipv6Address, KeyStorage, NonCryptoRng, OnMeshPrefix,
    PrefixSource, SecretKey, SlaacAddress, SlaacError, UnicastAddress,
};
use std::path::PathBuf;
use std::process::Command;
use std::time::{SystemTime, UNIX_EPOCH};

/// Secret-key persistence as a raw 32-byte file, typically somewhere
/// under `/var/lib`. A key of the wrong size is reported as a storage
/// error; the engine then regenerates and overwrites it.
pub struct FileKeyStorage {
    path: PathBuf,
}

impl FileKeyStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl KeyStorage for FileKeyStorage {
    fn load_iid_key(&mut self) -> Result<Option<SecretKey>, SlaacError> {
        let bytes = match std::fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(_) => return Err(SlaacError::StorageError("could not read key file")),
        };

        let octets: [u8; SECRET_KEY_LENGTH] = bytes
            .try_into()
            .map_err(|_| SlaacError::StorageError("stored key has unexpected length"))?;
        Ok(Some(SecretKey(octets)))
    }

    fn save_iid_key(&mut self, key: &SecretKey) -> Result<(), SlaacError> {
        std::fs::write(&self.path, key.0)
            .map_err(|_| SlaacError::StorageError("could not write key file"))
    }
}

/// Operating-system entropy as the true-random source.
#[derive(Default)]
pub struct OsEntropy;

impl EntropySource for OsEntropy {
    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), SlaacError> {
        OsRng
            .try_fill_bytes(dest)
            .map_err(|_| SlaacError::EntropyUnavailable)
    }
}

/// Seeded PRNG standing in for the always-available non-crypto source.
/// Seeding uses the wall clock on purpose: this source must keep working
/// when the OS entropy pool is the thing that failed.
pub struct SystemRng {
    rng: StdRng,
}

impl SystemRng {
    pub fn new() -> Self {
        let seed = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|elapsed| elapsed.as_nanos() as u64)
            .unwrap_or(0x5eed);
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl Default for SystemRng {
    fn default() -> Self {
        Self::new()
    }
}

impl NonCryptoRng for SystemRng {
    fn fill_bytes(&mut self, dest: &mut [u8]) {
        self.rng.fill_bytes(dest);
    }
}

/// A fixed advertisement list, for embedders that learn prefixes out of
/// band and for demos.
pub struct StaticPrefixSource {
    pub prefixes: Vec<OnMeshPrefix>,
}

impl PrefixSource for StaticPrefixSource {
    fn on_mesh_prefixes(&self) -> Box<dyn Iterator<Item = OnMeshPrefix> + '_> {
        Box::new(self.prefixes.iter().copied())
    }
}

/// Interface address management through the `ip(8)` utility.
///
/// Addresses whose advertisement cleared the preferred flag are installed
/// with `preferred_lft 0`, which the kernel treats as deprecated: usable,
/// but not chosen as a source address for new connections.
pub struct IpCommandRegistry {
    interface: String,
}

impl IpCommandRegistry {
    pub fn new(interface: impl Into<String>) -> Self {
        Self {
            interface: interface.into(),
        }
    }

    fn run(&self, args: &[&str]) -> Result<(), SlaacError> {
        let status = Command::new("ip")
            .args(args)
            .status()
            .map_err(|_| SlaacError::IoError)?;
        if status.success() {
            Ok(())
        } else {
            Err(SlaacError::IoError)
        }
    }

    fn query(&self) -> Vec<UnicastAddress> {
        let output = Command::new("ip")
            .args([
                "-6", "-o", "addr", "show", "dev", &self.interface, "scope", "global",
            ])
            .output();

        let output = match output {
            Ok(output) if output.status.success() => output,
            _ => {
                warn!("[SLAAC] Could not list addresses on {}", self.interface);
                return Vec::new();
            }
        };

        String::from_utf8_lossy(&output.stdout)
            .lines()
            .filter_map(parse_addr_show_line)
            .collect()
    }
}

impl AddressRegistry for IpCommandRegistry {
    fn unicast_addresses(&self) -> Box<dyn Iterator<Item = UnicastAddress> + '_> {
        Box::new(self.query().into_iter())
    }

    fn add_unicast(&mut self, entry: &SlaacAddress) -> Result<(), SlaacError> {
        let cidr = format!("{}/{}", entry.address, entry.prefix_length);
        let mut args = vec!["-6", "addr", "add", &cidr, "dev", &self.interface];
        if !entry.preferred {
            args.extend(["preferred_lft", "0"]);
        }
        self.run(&args)
    }

    fn remove_unicast(&mut self, address: &Ipv6Address) -> Result<(), SlaacError> {
        // `ip addr del` wants the exact address/prefix pair, so look the
        // prefix length up in the current list.
        let entry = self
            .query()
            .into_iter()
            .find(|existing| existing.address == *address)
            .ok_or(SlaacError::AddressNotFound)?;

        let cidr = format!("{}/{}", entry.address, entry.prefix_length);
        self.run(&["-6", "addr", "del", &cidr, "dev", &self.interface])
    }
}

/// Extracts the `inet6 <addr>/<len>` pair from one `ip -o addr show`
/// output line.
fn parse_addr_show_line(line: &str) -> Option<UnicastAddress> {
    let mut tokens = line.split_whitespace();
    while let Some(token) = tokens.next() {
        if token != "inet6" {
            continue;
        }
        let (addr, len) = tokens.next()?.split_once('/')?;
        let parsed: std::net::Ipv6Addr = addr.parse().ok()?;
        return Some(UnicastAddress {
            address: Ipv6Address::from(parsed.octets()),
            prefix_length: len.parse().ok()?,
        });
    }
    None
}
