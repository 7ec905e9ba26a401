//! Crowd control, control transfer and appearance handlers.
//!
//! Flag-holding types never clear a target-wide flag while another listed
//! aura of a type that sets it remains.

use crate::aura::{AuraCtx, AuraType};
use crate::engine::SpellEngine;
use crate::spell::{PreventionType, SchoolMask};
use crate::unit::{
    AuraStateFlags, DynamicFlags, MovementFlags, PlayerFlags, ShapeshiftForm, UnitFlags, UnitState,
};

impl SpellEngine<'_> {
    /// Sets `flags`/`state` on apply; on remove clears them unless another
    /// listed aura of `types` still holds them.
    fn toggle_control(
        &mut self,
        ctx: &AuraCtx,
        apply: bool,
        types: &[AuraType],
        flags: UnitFlags,
        state: UnitState,
    ) {
        if !apply && self.other_aura_of(ctx, types) {
            return;
        }
        self.with_unit(ctx.target, |unit| {
            unit.flags.set(flags, apply);
            unit.state.set(state, apply);
        });
    }

    /// Frost stuns and roots mark the target frozen until the last one goes.
    fn update_frozen(&mut self, ctx: &AuraCtx, apply: bool) {
        if !ctx.spell.school_mask.contains(SchoolMask::FROST) {
            return;
        }
        if apply {
            self.with_unit(ctx.target, |unit| unit.aura_state.insert(AuraStateFlags::FROZEN));
            return;
        }
        let frozen_remains = self.world.listed_auras(ctx.target).any(|(holder, aura)| {
            matches!(aura.aura_type, AuraType::ModStun | AuraType::ModRoot)
                && holder.spell.school_mask.contains(SchoolMask::FROST)
                && !(holder.id == ctx.holder && aura.effect_index == ctx.index)
        });
        if !frozen_remains {
            self.with_unit(ctx.target, |unit| unit.aura_state.remove(AuraStateFlags::FROZEN));
        }
    }

    pub(super) fn aura_mod_stun(&mut self, ctx: &AuraCtx, apply: bool, real: bool) {
        self.toggle_control(ctx, apply, &[AuraType::ModStun], UnitFlags::STUNNED, UnitState::STUNNED);
        if apply && real {
            self.interrupt_cast(ctx.target);
        }
        self.update_frozen(ctx, apply);
    }

    pub(super) fn aura_mod_root(&mut self, ctx: &AuraCtx, apply: bool) {
        if apply || !self.other_aura_of(ctx, &[AuraType::ModRoot]) {
            self.with_unit(ctx.target, |unit| {
                unit.state.set(UnitState::ROOT, apply);
                unit.movement.set(MovementFlags::ROOT, apply);
            });
        }
        self.update_frozen(ctx, apply);
    }

    pub(super) fn aura_mod_silence(&mut self, ctx: &AuraCtx, apply: bool, real: bool) {
        let types = [AuraType::ModSilence, AuraType::ModPacifySilence];
        self.toggle_control(ctx, apply, &types, UnitFlags::SILENCED, UnitState::empty());
        if apply && real {
            self.interrupt_cast_prevented_by(ctx.target, PreventionType::Silence);
        }
    }

    pub(super) fn aura_mod_pacify(&mut self, ctx: &AuraCtx, apply: bool, real: bool) {
        let types = [AuraType::ModPacify, AuraType::ModPacifySilence];
        self.toggle_control(ctx, apply, &types, UnitFlags::PACIFIED, UnitState::empty());
        if apply && real {
            self.interrupt_cast_prevented_by(ctx.target, PreventionType::Pacify);
        }
    }

    pub(super) fn aura_mod_pacify_silence(&mut self, ctx: &AuraCtx, apply: bool, real: bool) {
        self.aura_mod_pacify(ctx, apply, real);
        self.aura_mod_silence(ctx, apply, real);
    }

    pub(super) fn aura_mod_confuse(&mut self, ctx: &AuraCtx, apply: bool, real: bool) {
        self.toggle_control(
            ctx,
            apply,
            &[AuraType::ModConfuse],
            UnitFlags::CONFUSED,
            UnitState::CONFUSED,
        );
        if apply && real {
            self.interrupt_cast(ctx.target);
        }
    }

    pub(super) fn aura_mod_fear(&mut self, ctx: &AuraCtx, apply: bool, real: bool) {
        if apply && self.world.has_aura_type(ctx.target, AuraType::PreventsFleeing) {
            return;
        }
        self.toggle_control(ctx, apply, &[AuraType::ModFear], UnitFlags::FLEEING, UnitState::FLEEING);
        if apply && real {
            self.interrupt_cast(ctx.target);
        }
    }

    /// Suppresses fleeing while it lasts; fear resumes once it goes.
    pub(super) fn aura_prevents_fleeing(&mut self, ctx: &AuraCtx, apply: bool) {
        let feared = self.world.has_aura_type(ctx.target, AuraType::ModFear);
        if !feared {
            return;
        }
        if !apply && self.other_aura_of(ctx, &[AuraType::PreventsFleeing]) {
            return;
        }
        self.with_unit(ctx.target, |unit| {
            unit.flags.set(UnitFlags::FLEEING, !apply);
            unit.state.set(UnitState::FLEEING, !apply);
        });
    }

    pub(super) fn aura_mod_disarm(&mut self, ctx: &AuraCtx, apply: bool) {
        self.toggle_control(ctx, apply, &[AuraType::ModDisarm], UnitFlags::DISARMED, UnitState::empty());
    }

    pub(super) fn aura_mod_unattackable(&mut self, ctx: &AuraCtx, apply: bool) {
        self.toggle_control(
            ctx,
            apply,
            &[AuraType::ModUnattackable],
            UnitFlags::NON_ATTACKABLE,
            UnitState::empty(),
        );
    }

    /// Control transfer. The charmed unit's threat list and cast are only
    /// reset by a real apply.
    pub(super) fn aura_mod_charm(&mut self, ctx: &AuraCtx, apply: bool, real: bool) {
        let possess = matches!(ctx.aura_type, AuraType::ModPossess | AuraType::ModPossessPet);
        let (target, caster) = (ctx.target, ctx.caster);
        if apply {
            let Some(faction) = self.world.unit(caster).map(|c| c.faction) else {
                return;
            };
            if real {
                self.interrupt_cast(target);
            }
            self.with_unit(target, |unit| {
                unit.charmer = Some(caster);
                unit.faction = faction;
                unit.state.insert(UnitState::CHARMED);
                unit.flags.set(UnitFlags::POSSESSED, possess);
                if real {
                    unit.threat.clear();
                }
            });
            self.with_unit(caster, |unit| unit.charm = Some(target));
        } else {
            self.with_unit(target, |unit| {
                if unit.charmer == Some(caster) {
                    unit.charmer = None;
                }
                unit.faction = unit.native_faction;
                unit.state.remove(UnitState::CHARMED);
                unit.flags.remove(UnitFlags::POSSESSED);
            });
            self.with_unit(caster, |unit| {
                if unit.charm == Some(target) {
                    unit.charm = None;
                }
            });
        }
    }

    pub(super) fn aura_mod_taunt(&mut self, ctx: &AuraCtx, apply: bool, real: bool) {
        if !real {
            return;
        }
        let caster = ctx.caster;
        let Some(unit) = self.world.unit(ctx.target) else {
            return;
        };
        if !unit.can_have_threat_list() {
            return;
        }
        let remaining = if apply {
            None
        } else {
            self.world
                .listed_auras(ctx.target)
                .find(|(holder, aura)| aura.aura_type == AuraType::ModTaunt && holder.id != ctx.holder)
                .map(|(holder, _)| holder.caster)
        };
        self.with_unit(ctx.target, |unit| {
            if apply {
                unit.threat.add_threat(caster, 0.0);
                unit.threat.taunted_by = Some(caster);
                unit.state.insert(UnitState::TAUNTED);
            } else if unit.threat.taunted_by == Some(caster) {
                unit.threat.taunted_by = remaining;
                unit.state.set(UnitState::TAUNTED, remaining.is_some());
            }
        });
    }

    /// Feigning units drop out of every threat list.
    pub(super) fn aura_feign_death(&mut self, ctx: &AuraCtx, apply: bool, real: bool) {
        self.toggle_control(
            ctx,
            apply,
            &[AuraType::FeignDeath],
            UnitFlags::FEIGN_DEATH,
            UnitState::FEIGN_DEATH,
        );
        if !apply || !real {
            return;
        }
        self.interrupt_cast(ctx.target);
        for id in self.world.unit_ids() {
            self.with_unit(id, |unit| unit.threat.remove(ctx.target));
        }
    }

    pub(super) fn aura_transform(&mut self, ctx: &AuraCtx, apply: bool) {
        let replacement = if apply {
            Some((ctx.spell_id(), ctx.misc_value))
        } else {
            self.world
                .listed_auras(ctx.target)
                .filter(|(holder, aura)| {
                    aura.aura_type == AuraType::Transform && holder.id != ctx.holder
                })
                .last()
                .map(|(holder, aura)| (holder.spell.id, aura.misc_value))
        };
        let own = ctx.spell_id();
        self.with_unit(ctx.target, |unit| match replacement {
            Some((spell, display)) => {
                unit.transform_spell = Some(spell);
                if display > 0 {
                    unit.display_id = display as u32;
                }
            }
            None => {
                if unit.transform_spell == Some(own) {
                    unit.transform_spell = None;
                    unit.display_id = unit.native_display_id;
                }
            }
        });
    }

    /// Form changes only follow a real add or remove; a recompute keeps the
    /// current form and the holders bound to it.
    pub(super) fn aura_mod_shapeshift(&mut self, ctx: &AuraCtx, apply: bool, real: bool) {
        if !real {
            return;
        }
        if apply {
            let others: Vec<_> = self
                .world
                .holders_on(ctx.target)
                .filter(|h| h.id != ctx.holder && h.spell.has_aura(AuraType::ModShapeshift))
                .map(|h| h.id)
                .collect();
            for id in others {
                self.remove_holder(id, crate::holder::RemovalMode::Default);
            }
            self.set_form(ctx.target, ShapeshiftForm::from_misc(ctx.misc_value));
        } else if !self.other_aura_of(ctx, &[AuraType::ModShapeshift]) {
            self.set_form(ctx.target, ShapeshiftForm::None);
        }
    }

    pub(super) fn aura_mounted(&mut self, ctx: &AuraCtx, apply: bool) {
        if apply {
            let display = u32::try_from(ctx.misc_value).ok();
            self.with_unit(ctx.target, |unit| {
                unit.flags.insert(UnitFlags::MOUNTED);
                unit.mount_display = display;
            });
        } else if !self.other_aura_of(ctx, &[AuraType::Mounted]) {
            self.with_unit(ctx.target, |unit| {
                unit.flags.remove(UnitFlags::MOUNTED);
                unit.mount_display = None;
            });
        }
        self.update_speed(ctx.target);
    }

    /// The caster sees through the aura target.
    pub(super) fn aura_bind_sight(&mut self, ctx: &AuraCtx, apply: bool) {
        let target = ctx.target;
        self.with_unit(ctx.caster, |unit| {
            if apply {
                unit.farsight = Some(target);
            } else if unit.farsight == Some(target) {
                unit.farsight = None;
            }
        });
    }

    pub(super) fn aura_mod_stalked(&mut self, ctx: &AuraCtx, apply: bool) {
        if !apply && self.other_aura_of(ctx, &[AuraType::ModStalked]) {
            return;
        }
        self.with_unit(ctx.target, |unit| unit.dynamic_flags.set(DynamicFlags::TRACK_UNIT, apply));
    }

    pub(super) fn aura_ghost(&mut self, ctx: &AuraCtx, apply: bool) {
        if !apply && self.other_aura_of(ctx, &[AuraType::Ghost]) {
            return;
        }
        self.with_unit(ctx.target, |unit| unit.player_flags.set(PlayerFlags::GHOST, apply));
    }

    /// The unit lingers untargetable and dies when the aura ends.
    pub(super) fn aura_spirit_of_redemption(&mut self, ctx: &AuraCtx, apply: bool, real: bool) {
        self.with_unit(ctx.target, |unit| {
            unit.flags.set(UnitFlags::NOT_SELECTABLE, apply);
            unit.form = if apply {
                ShapeshiftForm::SpiritOfRedemption
            } else {
                ShapeshiftForm::None
            };
        });
        if !apply && real && self.is_alive(ctx.target) {
            self.kill_unit(ctx.target, None);
        }
    }
}
