//! Traits describing read-only engine inputs.
//!
//! Oracles expose static spell data, item templates, immunity and dispel
//! policy, tunables and the deterministic RNG. The [`Env`] aggregate bundles
//! them so the engine can reach everything it needs without hard coupling to
//! concrete implementations.
mod catalog;
mod config;
mod error;
mod items;
mod policy;
mod rng;
mod spells;

use std::sync::Arc;

use crate::spell::SpellDefinition;
use crate::types::SpellId;

pub use catalog::SpellCatalog;
pub use config::ConfigOracle;
pub use error::OracleError;
pub use items::{ItemOracle, ItemTemplate};
pub use policy::{DefaultPolicy, PolicyOracle};
pub use rng::{FixedRng, PcgRng, RngOracle, compute_seed};
pub use spells::SpellOracle;

/// Aggregates read-only oracles required by the engine.
pub struct Env<'a, S, I, P, C, R>
where
    S: SpellOracle + ?Sized,
    I: ItemOracle + ?Sized,
    P: PolicyOracle + ?Sized,
    C: ConfigOracle + ?Sized,
    R: RngOracle + ?Sized,
{
    spells: Option<&'a S>,
    items: Option<&'a I>,
    policy: Option<&'a P>,
    config: Option<&'a C>,
    rng: Option<&'a R>,
}

// Manual impls: derived ones would demand `S: Clone`, which trait objects never are.
impl<S, I, P, C, R> Clone for Env<'_, S, I, P, C, R>
where
    S: SpellOracle + ?Sized,
    I: ItemOracle + ?Sized,
    P: PolicyOracle + ?Sized,
    C: ConfigOracle + ?Sized,
    R: RngOracle + ?Sized,
{
    fn clone(&self) -> Self {
        *self
    }
}

impl<S, I, P, C, R> Copy for Env<'_, S, I, P, C, R>
where
    S: SpellOracle + ?Sized,
    I: ItemOracle + ?Sized,
    P: PolicyOracle + ?Sized,
    C: ConfigOracle + ?Sized,
    R: RngOracle + ?Sized,
{
}

pub type SpellEnv<'a> = Env<
    'a,
    dyn SpellOracle + 'a,
    dyn ItemOracle + 'a,
    dyn PolicyOracle + 'a,
    dyn ConfigOracle + 'a,
    dyn RngOracle + 'a,
>;

impl<'a, S, I, P, C, R> Env<'a, S, I, P, C, R>
where
    S: SpellOracle + ?Sized,
    I: ItemOracle + ?Sized,
    P: PolicyOracle + ?Sized,
    C: ConfigOracle + ?Sized,
    R: RngOracle + ?Sized,
{
    pub fn new(
        spells: Option<&'a S>,
        items: Option<&'a I>,
        policy: Option<&'a P>,
        config: Option<&'a C>,
        rng: Option<&'a R>,
    ) -> Self {
        Self {
            spells,
            items,
            policy,
            config,
            rng,
        }
    }

    pub fn with_all(spells: &'a S, items: &'a I, policy: &'a P, config: &'a C, rng: &'a R) -> Self {
        Self::new(Some(spells), Some(items), Some(policy), Some(config), Some(rng))
    }

    pub fn empty() -> Self {
        Self {
            spells: None,
            items: None,
            policy: None,
            config: None,
            rng: None,
        }
    }

    /// Returns the SpellOracle, or an error if not available.
    ///
    /// # Errors
    ///
    /// Returns `OracleError::SpellsNotAvailable` if no spell oracle was provided.
    pub fn spells(&self) -> Result<&'a S, OracleError> {
        self.spells.ok_or(OracleError::SpellsNotAvailable)
    }

    /// Returns the ItemOracle, or an error if not available.
    ///
    /// # Errors
    ///
    /// Returns `OracleError::ItemsNotAvailable` if no items oracle was provided.
    pub fn items(&self) -> Result<&'a I, OracleError> {
        self.items.ok_or(OracleError::ItemsNotAvailable)
    }

    /// Returns the PolicyOracle, or an error if not available.
    ///
    /// # Errors
    ///
    /// Returns `OracleError::PolicyNotAvailable` if no policy oracle was provided.
    pub fn policy(&self) -> Result<&'a P, OracleError> {
        self.policy.ok_or(OracleError::PolicyNotAvailable)
    }

    /// Returns the ConfigOracle, or an error if not available.
    ///
    /// # Errors
    ///
    /// Returns `OracleError::ConfigNotAvailable` if no config oracle was provided.
    pub fn config(&self) -> Result<&'a C, OracleError> {
        self.config.ok_or(OracleError::ConfigNotAvailable)
    }

    /// Returns the RngOracle, or an error if not available.
    ///
    /// # Errors
    ///
    /// Returns `OracleError::RngNotAvailable` if no rng oracle was provided.
    pub fn rng(&self) -> Result<&'a R, OracleError> {
        self.rng.ok_or(OracleError::RngNotAvailable)
    }

    /// Looks up a spell definition by id.
    ///
    /// # Errors
    ///
    /// Returns `OracleError::SpellsNotAvailable` without a spell oracle and
    /// `OracleError::SpellNotFound` for an unknown id.
    pub fn spell(&self, id: SpellId) -> Result<Arc<SpellDefinition>, OracleError> {
        self.spells()?.spell(id).ok_or(OracleError::SpellNotFound(id))
    }
}

impl<'a, S, I, P, C, R> Env<'a, S, I, P, C, R>
where
    S: SpellOracle + 'a,
    I: ItemOracle + 'a,
    P: PolicyOracle + 'a,
    C: ConfigOracle + 'a,
    R: RngOracle + 'a,
{
    /// Converts this environment into a trait-object based `SpellEnv` (consumes self).
    pub fn into_spell_env(self) -> SpellEnv<'a> {
        self.as_spell_env()
    }

    /// Converts this environment into a trait-object based `SpellEnv` (borrows self).
    ///
    /// Use this when you need to convert multiple times (e.g., in a loop).
    pub fn as_spell_env(&self) -> SpellEnv<'a> {
        let spells: Option<&'a dyn SpellOracle> = self.spells.map(|spells| spells as _);
        let items: Option<&'a dyn ItemOracle> = self.items.map(|items| items as _);
        let policy: Option<&'a dyn PolicyOracle> = self.policy.map(|policy| policy as _);
        let config: Option<&'a dyn ConfigOracle> = self.config.map(|config| config as _);
        let rng: Option<&'a dyn RngOracle> = self.rng.map(|rng| rng as _);
        Env::new(spells, items, policy, config, rng)
    }
}
