// crates/slaac-rs/src/engine.rs
use crate::addr::Ipv6Prefix;
use crate::hal::SlaacPlatform;
use crate::iid::IidGenerator;
use crate::pool::{AddressPool, SlaacAddress};
use crate::secret;
use crate::types::{ChangedFlags, SlaacConfig, UpdateMode, DEFAULT_POOL_CAPACITY};
use alloc::boxed::Box;
use log::{info, warn};

/// Strategy for excluding advertised prefixes from address formation.
pub trait PrefixFilter {
    /// Returns `true` if no SLAAC address may be formed from `prefix`.
    fn exclude(&self, prefix: &Ipv6Prefix) -> bool;
}

impl<F> PrefixFilter for F
where
    F: Fn(&Ipv6Prefix) -> bool,
{
    fn exclude(&self, prefix: &Ipv6Prefix) -> bool {
        self(prefix)
    }
}

fn excluded(filter: &Option<Box<dyn PrefixFilter>>, prefix: &Ipv6Prefix) -> bool {
    filter.as_ref().is_some_and(|f| f.exclude(prefix))
}

/// Reconciles the interface's SLAAC addresses with the advertised
/// on-mesh prefix set.
///
/// The engine owns a bounded pool of generated addresses and nothing
/// else: the prefix set, the interface address list, key storage and the
/// random sources are reached through the [`SlaacPlatform`] context
/// handed to each operation. `update` runs synchronously to completion in
/// the caller's dispatch context; the surrounding event model is expected
/// to serialize calls, as a pass's scan-then-mutate sequence is not
/// atomic.
///
/// A new engine starts disabled; the owner wires up notifications and
/// calls [`Self::enable`].
pub struct SlaacEngine<const CAP: usize = DEFAULT_POOL_CAPACITY> {
    enabled: bool,
    filter: Option<Box<dyn PrefixFilter>>,
    config: SlaacConfig,
    pool: AddressPool<CAP>,
}

impl<const CAP: usize> SlaacEngine<CAP> {
    pub fn new(config: SlaacConfig) -> Self {
        Self {
            enabled: false,
            filter: None,
            config,
            pool: AddressPool::new(),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Iterates over the currently installed SLAAC addresses.
    pub fn addresses(&self) -> impl Iterator<Item = &SlaacAddress> {
        self.pool.iter_valid()
    }

    pub fn address_count(&self) -> usize {
        self.pool.valid_count()
    }

    /// Starts address management and installs addresses for the prefixes
    /// advertised right now. No-op when already enabled.
    pub fn enable(&mut self, p: &mut SlaacPlatform<'_>) {
        if self.enabled {
            return;
        }

        info!("[SLAAC] Enabling");
        self.enabled = true;
        self.update(UpdateMode::Add, p);
    }

    /// Stops address management and retires every installed address.
    /// No-op when already disabled.
    pub fn disable(&mut self, p: &mut SlaacPlatform<'_>) {
        if !self.enabled {
            return;
        }

        info!("[SLAAC] Disabling");
        self.enabled = false;
        // With the engine disabled no entry is justified, so a Remove
        // pass clears the whole pool.
        self.update(UpdateMode::Remove, p);
    }

    /// Replaces the prefix filter. Runs a full pass when enabled, since
    /// previously accepted prefixes may now be excluded and vice versa.
    pub fn set_filter(&mut self, filter: Option<Box<dyn PrefixFilter>>, p: &mut SlaacPlatform<'_>) {
        self.filter = filter;
        info!(
            "[SLAAC] Filter {}",
            if self.filter.is_some() { "updated" } else { "disabled" }
        );

        if self.enabled {
            self.update(UpdateMode::Both, p);
        }
    }

    /// Maps a state-change notification from the owning stack to a
    /// reconciliation pass. Notifications arriving while disabled are
    /// ignored.
    pub fn handle_changed(&mut self, flags: ChangedFlags, p: &mut SlaacPlatform<'_>) {
        if !self.enabled {
            return;
        }

        let mode = if flags.contains(ChangedFlags::NET_DATA) {
            Some(UpdateMode::Both)
        } else if flags.contains(ChangedFlags::ADDRESS_REMOVED) {
            // When a unicast address is removed, check whether a SLAAC
            // address should be added in its place.
            //
            // An address matching an advertised SLAAC prefix may have been
            // present already (e.g. the user added one with the same
            // prefix), in which case no SLAAC address was formed for that
            // prefix. Once such an address goes away, the prefix is up
            // for grabs again.
            Some(UpdateMode::Add)
        } else {
            None
        };

        if let Some(mode) = mode {
            self.update(mode, p);
        }
    }

    /// Runs one reconciliation pass over the advertised prefix snapshot.
    pub fn update(&mut self, mode: UpdateMode, p: &mut SlaacPlatform<'_>) {
        let net_data = p.net_data;

        if mode.includes_remove() {
            // If enabled, retire any address with no matching advertised
            // prefix; when disabled, retire all of them.
            let enabled = self.enabled;
            let filter = &self.filter;

            for slot in self.pool.slots_mut() {
                if !slot.valid {
                    continue;
                }

                let justified = enabled
                    && net_data.on_mesh_prefixes().any(|adv| {
                        adv.slaac
                            && !excluded(filter, &adv.prefix)
                            && slot.matches_prefix(&adv.prefix)
                    });
                if justified {
                    continue;
                }

                info!("[SLAAC] Removing address {}", slot.address);
                if let Err(e) = p.netif.remove_unicast(&slot.address) {
                    warn!("[SLAAC] Interface rejected removal of {}: {}", slot.address, e);
                }
                slot.valid = false;
            }
        }

        if mode.includes_add() && self.enabled {
            // Generate and install addresses for newly advertised prefixes.
            for adv in net_data.on_mesh_prefixes() {
                if !adv.slaac || excluded(&self.filter, &adv.prefix) {
                    continue;
                }

                // Never shadow an address the interface already carries
                // for this prefix; it may have been assigned by the user.
                let covered = p
                    .netif
                    .unicast_addresses()
                    .any(|existing| existing.covers(&adv.prefix));
                if covered {
                    continue;
                }

                let Some(index) = self.pool.find_free() else {
                    warn!(
                        "[SLAAC] Cannot add address for {}: all {} slots in use",
                        adv.prefix, CAP
                    );
                    continue;
                };

                let key = secret::load_or_generate(&mut *p.storage, &mut *p.entropy, &mut *p.rng);

                let slot = self.pool.slot_mut(index);
                *slot = SlaacAddress::EMPTY;
                let prefix_bits = adv.prefix.significant_octets();
                slot.address.0[..prefix_bits.len()].copy_from_slice(prefix_bits);
                slot.prefix_length = adv.prefix.length;
                slot.preferred = adv.preferred;
                IidGenerator::new(&self.config).generate(
                    &mut slot.address,
                    slot.prefix_length,
                    &key,
                    &mut *p.rng,
                );
                slot.valid = true;

                info!("[SLAAC] Adding address {}", slot.address);
                if let Err(e) = p.netif.add_unicast(slot) {
                    // Keep the pool honest: a slot must not claim an
                    // address the interface refused. The next Add pass
                    // retries.
                    warn!("[SLAAC] Interface rejected {}: {}", slot.address, e);
                    self.pool.invalidate(index);
                }
            }
        }
    }
}

impl<const CAP: usize> Default for SlaacEngine<CAP> {
    fn default() -> Self {
        Self::new(SlaacConfig::default())
    }
}
