//! The player's energy account.
//!
//! A single persisted milliwatt balance, lazily initialized on first open.
//! This account is the sole gate for node connection: a connect debits it,
//! and a shortfall rejects the transition with no side effects.

use crate::error::{GameError, GameResult};
use relink_store::backend::StorageBackend;
use relink_store::cell::{CellEvent, PersistentCell};

/// Energy denomination.
pub type MilliWatts = u64;

/// Backend key the balance persists under.
pub const ENERGY_KEY: &str = "player.energy";

/// Balance installed the first time the account is opened with no
/// persisted value.
pub const DEFAULT_ENERGY_MW: MilliWatts = 982;

/// The persisted energy balance.
#[derive(Debug)]
pub struct EnergyAccount {
    cell: PersistentCell<MilliWatts>,
}

impl EnergyAccount {
    /// Restore the account, installing [`DEFAULT_ENERGY_MW`] if no value
    /// was ever persisted. A corrupt persisted balance self-heals to the
    /// default.
    pub fn open(backend: &mut dyn StorageBackend) -> GameResult<Self> {
        let cell = PersistentCell::open_or(backend, ENERGY_KEY, DEFAULT_ENERGY_MW)?;
        Ok(Self { cell })
    }

    /// Current balance in milliwatts.
    pub fn get(&self) -> MilliWatts {
        *self.cell.get()
    }

    /// Replace the balance. Always persists; the caller refreshes the
    /// energy display afterwards.
    pub fn set(&mut self, backend: &mut dyn StorageBackend, mw: MilliWatts) -> GameResult<()> {
        self.cell.set(backend, mw)?;
        Ok(())
    }

    /// Subtract `mw`, rejecting overdraw. On rejection the balance is
    /// untouched.
    pub fn debit(&mut self, backend: &mut dyn StorageBackend, mw: MilliWatts) -> GameResult<()> {
        let available = self.get();
        if available < mw {
            return Err(GameError::InsufficientEnergy {
                required: mw,
                available,
            });
        }
        self.set(backend, available - mw)
    }

    /// Add `mw`, saturating at the type limit.
    pub fn credit(&mut self, backend: &mut dyn StorageBackend, mw: MilliWatts) -> GameResult<()> {
        let next = self.get().saturating_add(mw);
        self.set(backend, next)
    }

    /// Drain accumulated change events.
    pub fn drain_events(&mut self) -> Vec<CellEvent> {
        self.cell.drain_events()
    }
}
