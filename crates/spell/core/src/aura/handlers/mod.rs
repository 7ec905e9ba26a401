//! Apply/unapply handlers, one per aura type.
//!
//! [`SpellEngine::handle_aura`] is a total `match` over [`AuraType`]. Every
//! handler receives a snapshot [`AuraCtx`], the direction (`apply`) and
//! whether this is a genuine add/remove (`real`) or a recompute after an
//! amount change. Types that only matter to calculations elsewhere (damage
//! bonuses, absorbs, proc triggers, periodic payloads) are scanned from the
//! unit's listed auras when needed and have nothing to do here. A further
//! group has no built-in behavior at all and only stays listed for hooks.

mod control;
mod immunity;
mod misc;
mod movement;
mod stats;
mod stealth;

use crate::aura::{AuraCtx, AuraType};
use crate::engine::SpellEngine;

impl SpellEngine<'_> {
    pub(crate) fn handle_aura(&mut self, ctx: &AuraCtx, apply: bool, real: bool) {
        use AuraType as A;

        if self.world.unit(ctx.target).is_none() {
            tracing::trace!(unit = %ctx.target, aura = %ctx.aura_type, "aura target missing");
            return;
        }
        match ctx.aura_type {
            A::None | A::Unused46 | A::Unused48 | A::Unused164 => {}

            // Control
            A::ModStun => self.aura_mod_stun(ctx, apply, real),
            A::ModRoot => self.aura_mod_root(ctx, apply),
            A::ModSilence => self.aura_mod_silence(ctx, apply, real),
            A::ModPacify => self.aura_mod_pacify(ctx, apply, real),
            A::ModPacifySilence => self.aura_mod_pacify_silence(ctx, apply, real),
            A::ModConfuse => self.aura_mod_confuse(ctx, apply, real),
            A::ModFear => self.aura_mod_fear(ctx, apply, real),
            A::PreventsFleeing => self.aura_prevents_fleeing(ctx, apply),
            A::ModDisarm => self.aura_mod_disarm(ctx, apply),
            A::ModCharm | A::ModPossess | A::ModPossessPet | A::AoeCharm => {
                self.aura_mod_charm(ctx, apply, real)
            }
            A::ModTaunt => self.aura_mod_taunt(ctx, apply, real),
            A::FeignDeath => self.aura_feign_death(ctx, apply, real),
            A::ModUnattackable => self.aura_mod_unattackable(ctx, apply),
            A::Transform => self.aura_transform(ctx, apply),
            A::ModShapeshift => self.aura_mod_shapeshift(ctx, apply, real),
            A::Mounted => self.aura_mounted(ctx, apply),
            A::BindSight | A::FarSight => self.aura_bind_sight(ctx, apply),
            A::ModStalked => self.aura_mod_stalked(ctx, apply),
            A::Ghost => self.aura_ghost(ctx, apply),
            A::SpiritOfRedemption => self.aura_spirit_of_redemption(ctx, apply, real),

            // Stats
            A::ModStat | A::ModPercentStat | A::ModTotalStatPercentage => {
                self.aura_mod_stat(ctx, apply)
            }
            A::ModIncreaseHealth | A::ModIncreaseHealthPercent => {
                self.aura_mod_increase_health(ctx, apply)
            }
            A::ModIncreaseEnergy | A::ModIncreaseEnergyPercent => {
                self.aura_mod_increase_energy(ctx, apply)
            }
            A::ModResistance | A::ModBaseResistance | A::ModResistancePct | A::ModBaseResistancePct => {
                self.aura_mod_resistance(ctx, apply)
            }
            A::ModResistanceExclusive => self.aura_mod_resistance_exclusive(ctx),
            A::ModAttackPower
            | A::ModRangedAttackPower
            | A::ModAttackPowerPct
            | A::ModRangedAttackPowerPct => self.aura_mod_attack_power(ctx, apply),
            A::ModParryPercent
            | A::ModDodgePercent
            | A::ModBlockPercent
            | A::ModCritPercent
            | A::ModHitChance
            | A::ModSpellHitChance
            | A::ModSpellCritChance
            | A::ModSpellCritChanceSchool
            | A::ModCastingSpeedNotStack
            | A::ModAttackspeed
            | A::ModMeleeHaste
            | A::ModRangedHaste
            | A::ModRangedAmmoHaste
            | A::ModOffhandDamagePct
            | A::ModShieldBlockvalue
            | A::ModShieldBlockvaluePct
            | A::ModDetectRange
            | A::ModScale
            | A::ModSpellDamageOfStatPercent
            | A::ModSpellHealingOfStatPercent => self.aura_mod_rating(ctx, apply),
            A::ModPowerCostSchool | A::ModPowerCostSchoolPct => self.aura_mod_power_cost(ctx, apply),
            A::ModThreat => self.aura_mod_threat(ctx, apply),
            A::ModTotalThreat => self.aura_mod_total_threat(ctx, apply),
            A::AddFlatModifier | A::AddPctModifier => self.aura_add_modifier(ctx, apply),
            A::ModSkill | A::ModSkillTalent => self.aura_mod_skill(ctx, apply),

            // Movement
            A::ModIncreaseSpeed
            | A::ModIncreaseMountedSpeed
            | A::ModDecreaseSpeed
            | A::ModIncreaseSwimSpeed
            | A::ModSpeedAlways
            | A::ModMountedSpeedAlways
            | A::ModSpeedNotStack
            | A::ModMountedSpeedNotStack
            | A::UseNormalMovementSpeed => self.aura_mod_speed(ctx),
            A::WaterWalk => self.aura_water_walk(ctx, apply),
            A::FeatherFall | A::SafeFall => self.aura_safe_fall(ctx, apply),
            A::Hover => self.aura_hover(ctx, apply),
            A::WaterBreathing => self.aura_water_breathing(ctx, apply),

            // Immunity
            A::EffectImmunity => self.aura_effect_immunity(ctx, apply),
            A::StateImmunity => self.aura_state_immunity(ctx, apply, real),
            A::SchoolImmunity => self.aura_school_immunity(ctx, apply, real),
            A::DamageImmunity => self.aura_damage_immunity(ctx, apply),
            A::DispelImmunity => self.aura_dispel_immunity(ctx, apply, real),
            A::MechanicImmunity | A::MechanicImmunityMask => {
                self.aura_mechanic_immunity(ctx, apply, real)
            }

            // Stealth and detection
            A::ModStealth | A::ModStealthLevel => self.aura_mod_stealth(ctx, apply, real),
            A::ModStealthDetect => self.aura_mod_stealth_detect(ctx),
            A::ModInvisibility => self.aura_mod_invisibility(ctx, apply, real),
            A::ModInvisibilityDetection => self.aura_mod_invisibility_detection(ctx),
            A::TrackStealthed | A::DetectAmore | A::AurasVisible => {
                self.aura_player_flag(ctx, apply)
            }
            A::Untrackable => self.aura_untrackable(ctx, apply),
            A::Empathy => self.aura_empathy(ctx, apply),

            // Misc
            A::Dummy => self.aura_dummy(ctx, apply, real),
            A::ForceReaction => self.aura_force_reaction(ctx, apply),
            A::ExtraAttacks => self.aura_extra_attacks(ctx, apply),
            A::RetainComboPoints => self.aura_retain_combo_points(ctx, apply),
            A::ChannelDeathItem => self.aura_channel_death_item(ctx, apply, real),

            // Periodic payloads; the ticker drives them.
            A::PeriodicDamage
            | A::PeriodicHeal
            | A::ObsModHealth
            | A::ObsModMana
            | A::PeriodicTriggerSpell
            | A::PeriodicEnergize
            | A::PeriodicLeech
            | A::PeriodicHealthFunnel
            | A::PeriodicManaFunnel
            | A::PeriodicManaLeech
            | A::PeriodicDamagePercent
            | A::PowerBurnMana
            | A::ModRegen
            | A::ModPowerRegen => self.aura_periodic(ctx, apply),

            // Consulted by damage, heal, resist and proc calculations.
            A::ModDamageDone
            | A::ModDamageTaken
            | A::ModDamagePercentDone
            | A::ModDamagePercentTaken
            | A::ModHealing
            | A::ModHealingPct
            | A::ModHealingDone
            | A::ModHealingDonePercent
            | A::ModTargetResistance
            | A::ModMechanicResistance
            | A::ModDebuffResistance
            | A::SchoolAbsorb
            | A::ManaShield
            | A::DamageShield
            | A::SplitDamagePct
            | A::SplitDamageFlat
            | A::ProcTriggerSpell
            | A::ProcTriggerDamage => self.aura_scanned(ctx, apply),

            // No built-in behavior. They stay listed on the holder for proc
            // hooks and the host to read.
            A::ModDamageDoneCreature
            | A::ModDamageDoneVersus
            | A::ModMeleeDamageTaken
            | A::ModMeleeDamageTakenPct
            | A::ModRangedDamageTaken
            | A::ModRangedDamageTakenPct
            | A::ModFlatSpellDamageVersus
            | A::ModFlatSpellCritDamageVersus
            | A::ModCritDamageBonus
            | A::ModCritPercentVersus
            | A::ModCriticalThreat
            | A::ModMeleeAttackPowerVersus
            | A::ModRangedAttackPowerVersus
            | A::RangedAttackPowerAttackerBonus
            | A::MeleeAttackPowerAttackerBonus
            | A::ModAttackerSpellCritChance
            | A::ModAttackerMeleeHitChance
            | A::ModAttackerRangedHitChance
            | A::ModAttackerSpellHitChance
            | A::ModAttackerMeleeCritChance
            | A::ModAttackerRangedCritChance
            | A::ModResistChance
            | A::ModResistanceOfStatPercent
            | A::ModBlockSkill
            | A::ModAoeAvoidance
            | A::PetDamageMulti
            | A::ReflectSpells
            | A::ReflectSpellsSchool
            | A::SpellMagnet
            | A::AddTargetTrigger
            | A::AddCasterHitTrigger
            | A::OverrideClassScripts
            | A::InterruptRegen
            | A::ModManaRegenInterrupt
            | A::ModHealthRegenPercent
            | A::ModRegenDuringCombat
            | A::ModHealthRegenInCombat
            | A::ModPowerRegenPercent
            | A::ModWaterBreathing
            | A::ModDetectedRange
            | A::ModRating
            | A::ModReputationGain
            | A::ModFactionReputationGain
            | A::ModLanguage
            | A::Charisma
            | A::Persuaded
            | A::NoPvpCredit
            | A::AllowChampionSpells
            | A::ResistPushback
            | A::TrackCreatures
            | A::TrackResources
            | A::SharePetTracking => self.aura_listed_only(ctx, apply),
        }
    }

    fn aura_scanned(&mut self, ctx: &AuraCtx, apply: bool) {
        tracing::trace!(
            unit = %ctx.target,
            aura = %ctx.aura_type,
            amount = ctx.amount,
            apply,
            "scanned aura"
        );
    }

    fn aura_listed_only(&mut self, ctx: &AuraCtx, apply: bool) {
        tracing::trace!(
            unit = %ctx.target,
            aura = %ctx.aura_type,
            apply,
            "aura without built-in behavior"
        );
    }

    fn aura_periodic(&mut self, ctx: &AuraCtx, apply: bool) {
        tracing::trace!(
            unit = %ctx.target,
            aura = %ctx.aura_type,
            period = ctx.period,
            apply,
            "periodic aura"
        );
    }

    /// Whether another listed aura of one of `types` remains on the target,
    /// ignoring the aura `ctx` describes.
    pub(crate) fn other_aura_of(&self, ctx: &AuraCtx, types: &[AuraType]) -> bool {
        self.world
            .listed_auras(ctx.target)
            .any(|(holder, aura)| {
                types.contains(&aura.aura_type)
                    && !(holder.id == ctx.holder && aura.effect_index == ctx.index)
            })
    }
}
