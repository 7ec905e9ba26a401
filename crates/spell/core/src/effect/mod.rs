//! One-shot spell effects, one handler per [`SpellEffectKind`].
//!
//! [`SpellEngine::dispatch_effect`] is a total `match`. Handlers either
//! mutate unit state directly, accumulate damage into the cast context for
//! mitigation once every effect on the target has run, or delegate to the
//! aura system by building auras into the pending holder. A handler that
//! lacks the context it needs (no unit target, missing caster, missing
//! trigger spell) returns without doing anything.

mod aura;
mod damage;
mod dispel;
mod heal;
mod items;
mod kind;
mod misc;
mod movement;
mod summon;
mod threat;

use std::sync::Arc;

pub use kind::SpellEffectKind;

use crate::engine::{CastRequest, SpellEngine};
use crate::event::SpellEvent;
use crate::holder::SpellAuraHolder;
use crate::spell::{SpellDefinition, SpellEffectEntry};
use crate::types::{EffectIndex, ItemId, Position, SpellId, UnitId};
use crate::unit::SpellModOp;

/// State shared by the effects of one cast on one target.
#[derive(Debug)]
pub(crate) struct EffectCtx {
    pub caster: UnitId,
    pub spell: Arc<SpellDefinition>,
    /// `None` for destination-only effects.
    pub target: Option<UnitId>,
    pub destination: Option<Position>,
    pub cast_item: Option<ItemId>,
    pub triggered: bool,
    pub index: EffectIndex,
    /// Per-stack amount of the current effect.
    pub amount: i32,
    /// Damage accumulated for the target, mitigated after the last effect.
    pub damage: u32,
    /// Holder the aura effects of this cast build into.
    pub pending: Option<SpellAuraHolder>,
}

impl EffectCtx {
    pub(crate) fn new(
        caster: UnitId,
        spell: Arc<SpellDefinition>,
        target: Option<UnitId>,
        request: &CastRequest,
    ) -> Self {
        Self {
            caster,
            spell,
            target,
            destination: request.destination,
            cast_item: request.cast_item,
            triggered: request.triggered,
            index: EffectIndex::Effect0,
            amount: 0,
            damage: 0,
            pending: None,
        }
    }

    pub fn effect(&self) -> &SpellEffectEntry {
        self.spell.effect(self.index)
    }

    pub fn kind(&self) -> SpellEffectKind {
        self.effect().kind
    }

    pub fn spell_id(&self) -> SpellId {
        self.spell.id
    }

    /// Target of effects that fall back to the caster.
    pub fn target_or_caster(&self) -> UnitId {
        self.target.unwrap_or(self.caster)
    }
}

impl SpellEngine<'_> {
    pub(crate) fn dispatch_effect(&mut self, ctx: &mut EffectCtx) {
        use SpellEffectKind as E;

        tracing::trace!(
            caster = %ctx.caster,
            target = ?ctx.target,
            spell = %ctx.spell_id(),
            index = %ctx.index,
            effect = %ctx.kind(),
            amount = ctx.amount,
            "effect"
        );
        match ctx.kind() {
            E::Null => {}

            // Damage
            E::Instakill => self.effect_instakill(ctx),
            E::SchoolDamage => self.effect_school_damage(ctx),
            E::EnvironmentalDamage => self.effect_environmental_damage(ctx),
            E::PowerDrain => self.effect_power_drain(ctx),
            E::HealthLeech => self.effect_health_leech(ctx),
            E::WeaponDamageNoschool
            | E::WeaponDamage
            | E::NormalizedWeaponDmg
            | E::WeaponPercentDamage => self.effect_weapon_damage(ctx),
            E::PowerBurn => self.effect_power_burn(ctx),

            // Healing and resurrection
            E::Heal => self.effect_heal(ctx),
            E::HealMaxHealth => self.effect_heal_max_health(ctx),
            E::HealMechanical => self.effect_heal_mechanical(ctx),
            E::Energize => self.effect_energize(ctx),
            E::Resurrect => self.effect_resurrect(ctx),
            E::ResurrectNew => self.effect_resurrect_new(ctx),
            E::SelfResurrect => self.effect_self_resurrect(ctx),
            E::SpiritHeal => self.effect_spirit_heal(ctx),

            // Auras
            E::ApplyAura => self.effect_apply_aura(ctx),
            E::ApplyAreaAuraParty | E::ApplyAreaAuraPet => self.effect_apply_area_aura(ctx),
            E::PersistentAreaAura => self.effect_persistent_area_aura(ctx),
            E::Dispel => self.effect_dispel(ctx),
            E::DispelMechanic => self.effect_dispel_mechanic(ctx),

            // Threat and combat
            E::Threat => self.effect_threat(ctx),
            E::ModifyThreatPercent => self.effect_modify_threat_percent(ctx),
            E::AttackMe => self.effect_attack_me(ctx),
            E::Attack => self.effect_attack(ctx),
            E::Sanctuary => self.effect_sanctuary(ctx),
            E::Distract => self.effect_distract(ctx),
            E::InterruptCast => self.effect_interrupt_cast(ctx),
            E::AddComboPoints => self.effect_add_combo_points(ctx),
            E::AddExtraAttacks => self.effect_add_extra_attacks(ctx),

            // Movement
            E::TeleportUnits => self.effect_teleport_units(ctx),
            E::TeleportUnitsFaceCaster => self.effect_teleport_face_caster(ctx),
            E::Leap => self.effect_leap(ctx),
            E::Charge => self.effect_charge(ctx),
            E::KnockBack => self.effect_knock_back(ctx),
            E::Pull | E::PlayerPull => self.effect_pull(ctx),
            E::Stuck => self.effect_stuck(ctx),
            E::Bind => self.effect_bind(ctx),
            E::TeleportGraveyard => self.effect_teleport_graveyard(ctx),
            E::SummonPlayer => self.effect_summon_player(ctx),

            // Summons
            E::Summon
            | E::SummonWild
            | E::SummonGuardian
            | E::SummonPossessed
            | E::SummonPhantasm
            | E::SummonCritter
            | E::SummonDemon => self.effect_summon(ctx),
            E::SummonTotem
            | E::SummonTotemSlot1
            | E::SummonTotemSlot2
            | E::SummonTotemSlot3
            | E::SummonTotemSlot4 => self.effect_summon_totem(ctx),
            E::SummonPet => self.effect_summon_pet(ctx),
            E::SummonDeadPet => self.effect_summon_dead_pet(ctx),
            E::DismissPet => self.effect_dismiss_pet(ctx),
            E::DestroyAllTotems => self.effect_destroy_all_totems(ctx),
            E::Tamecreature => self.effect_tame_creature(ctx),
            E::AddFarsight => self.effect_add_farsight(ctx),

            // Items
            E::CreateItem => self.effect_create_item(ctx),
            E::EnchantItem => self.effect_enchant_item(ctx),
            E::EnchantItemTemporary => self.effect_enchant_item_temporary(ctx),
            E::EnchantHeldItem => self.effect_enchant_held_item(ctx),
            E::DurabilityDamage => self.effect_durability_damage(ctx),
            E::DurabilityDamagePct => self.effect_durability_damage_pct(ctx),
            E::Pickpocket => self.effect_pickpocket(ctx),
            E::Skinning => self.effect_skinning(ctx),
            E::SkinPlayerCorpse => self.effect_skin_player_corpse(ctx),
            E::FeedPet => self.effect_feed_pet(ctx),

            // Character progress
            E::LearnSpell => self.effect_learn_spell(ctx),
            E::LearnPetSpell => self.effect_learn_pet_spell(ctx),
            E::SkillStep | E::Skill => self.effect_skill_step(ctx),
            E::Parry | E::Block | E::DualWield => self.effect_player_ability(ctx),
            E::AddHonor => self.effect_add_honor(ctx),
            E::Reputation => self.effect_reputation(ctx),
            E::QuestComplete => self.effect_quest_complete(ctx),
            E::Inebriate => self.effect_inebriate(ctx),

            // Triggers and scripts
            E::TriggerSpell => self.effect_trigger_spell(ctx),
            E::TriggerMissile => self.effect_trigger_missile(ctx),
            E::ScriptEffect | E::SendEvent => self.effect_script(ctx),
            E::Dummy => self.effect_dummy(ctx),

            // Game objects, trade and travel are not simulated; observers get a record.
            E::OpenLock
            | E::OpenLockItem
            | E::SummonChangeItem
            | E::Spawn
            | E::TradeSkill
            | E::TransDoor
            | E::SummonObjectWild
            | E::SummonObjectSlot1
            | E::SummonObjectSlot2
            | E::SummonObjectSlot3
            | E::SummonObjectSlot4
            | E::ActivateObject
            | E::Duel
            | E::Disenchant
            | E::SendTaxi => self.effect_record(ctx),

            E::PortalTeleport
            | E::Portal
            | E::RitualBase
            | E::RitualSpecialize
            | E::RitualActivatePortal
            | E::Dodge
            | E::Evade
            | E::Weapon
            | E::Defense
            | E::SpellDefense
            | E::Language
            | E::Proficiency
            | E::Stealth
            | E::Detect
            | E::ForceCriticalHit
            | E::GuaranteeHit
            | E::HealthFunnel
            | E::PowerFunnel
            | E::CreateHouse
            | E::BindSight
            | E::ThreatAll
            | E::Unused122
            | E::Unused126
            | E::Unused127
            | E::Unused128
            | E::Unused129 => self.effect_unused(ctx),
        }
    }

    fn effect_unused(&mut self, ctx: &EffectCtx) {
        tracing::trace!(spell = %ctx.spell_id(), effect = %ctx.kind(), "effect has no behavior");
    }

    fn effect_record(&mut self, ctx: &EffectCtx) {
        self.emit(SpellEvent::EffectRecorded {
            caster: ctx.caster,
            target: ctx.target,
            spell: ctx.spell_id(),
            effect: ctx.kind(),
        });
    }

    /// Leech and drain multiplier after the caster's spell modifiers.
    pub(crate) fn effect_transfer_multiplier(&self, ctx: &EffectCtx) -> f32 {
        let base = ctx.effect().transfer_multiplier();
        self.world.unit(ctx.caster).map_or(base, |caster| {
            caster
                .spell_mods
                .apply_f32(&ctx.spell, SpellModOp::MultipleValue, base)
        })
    }

    /// Living unit target of the effect, if any.
    pub(crate) fn living_target(&self, ctx: &EffectCtx) -> Option<UnitId> {
        ctx.target.filter(|t| self.is_alive(*t))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::Fixture;

    #[test]
    fn recorded_effects_reach_observers() {
        let mut fx = Fixture::new();
        let spell = fx.spell(
            SpellDefinition::builder(70)
                .effect(
                    EffectIndex::Effect0,
                    SpellEffectEntry::new(SpellEffectKind::OpenLock),
                )
                .build(),
        );
        let caster = fx.player(1, 0);
        let chest = fx.creature(2, 3);
        fx.engine().cast(CastRequest::new(caster, spell).on(chest)).expect("cast");
        assert!(fx.world.events().contains(&SpellEvent::EffectRecorded {
            caster,
            target: Some(chest),
            spell,
            effect: SpellEffectKind::OpenLock,
        }));
    }

    #[test]
    fn unused_effects_leave_the_world_alone() {
        let mut fx = Fixture::new();
        let spell = fx.spell(
            SpellDefinition::builder(71)
                .effect(
                    EffectIndex::Effect0,
                    SpellEffectEntry::new(SpellEffectKind::Unused126),
                )
                .build(),
        );
        let caster = fx.player(1, 0);
        let before = fx.world.unit(caster).cloned();
        fx.engine().cast(CastRequest::new(caster, spell)).expect("cast");
        assert_eq!(fx.world.unit(caster).cloned(), before);
        assert_eq!(fx.world.holder_count(), 0);
    }
}
