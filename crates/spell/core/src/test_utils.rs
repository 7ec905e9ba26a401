//! Shared fixture for engine unit tests.

use crate::config::AuraConfig;
use crate::engine::SpellEngine;
use crate::env::{DefaultPolicy, FixedRng, PcgRng, RngOracle, SpellCatalog, SpellEnv};
use crate::spell::{PowerType, SpellDefinition};
use crate::types::{Position, SpellId, UnitId};
use crate::unit::{Faction, Unit, UnitKind};
use crate::world::World;

pub(crate) struct Fixture {
    pub catalog: SpellCatalog,
    pub policy: DefaultPolicy,
    pub config: AuraConfig,
    pub rng: Box<dyn RngOracle>,
    pub world: World,
}

impl Fixture {
    pub fn new() -> Self {
        Self {
            catalog: SpellCatalog::new(),
            policy: DefaultPolicy,
            config: AuraConfig::deterministic(),
            rng: Box::new(PcgRng),
            world: World::new(7),
        }
    }

    /// Pins every roll to `value`.
    pub fn with_fixed_rng(mut self, value: u32) -> Self {
        self.rng = Box::new(FixedRng(value));
        self
    }

    pub fn engine(&mut self) -> SpellEngine<'_> {
        let env = SpellEnv::with_all(
            &self.catalog,
            &self.catalog,
            &self.policy,
            &self.config,
            self.rng.as_ref(),
        );
        SpellEngine::new(&mut self.world, env).expect("fixture provides every oracle")
    }

    pub fn spell(&mut self, spell: SpellDefinition) -> SpellId {
        self.catalog.insert_spell(spell).id
    }

    /// Alliance player with health and mana at `x`.
    pub fn player(&mut self, id: u32, x: i32) -> UnitId {
        self.world.add_unit(
            Unit::new(UnitId(id), UnitKind::Player, 60, Faction::Alliance)
                .with_health(1000)
                .with_power(PowerType::Mana, 1000)
                .at(Position::new(x, 0)),
        )
    }

    /// Hostile creature with health at `x`.
    pub fn creature(&mut self, id: u32, x: i32) -> UnitId {
        self.world.add_unit(
            Unit::new(UnitId(id), UnitKind::Creature, 60, Faction::Hostile)
                .with_health(1000)
                .at(Position::new(x, 0)),
        )
    }

    pub fn unit(&self, id: UnitId) -> &Unit {
        self.world.unit(id).expect("unit registered")
    }
}
