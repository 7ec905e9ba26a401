//! Spell effect kind discriminant.

/// One-shot effect executed when a cast resolves against a target.
#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    strum::Display,
    strum::EnumCount,
    strum::EnumIter,
    strum::FromRepr,
    strum::IntoStaticStr,
)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(u8)]
pub enum SpellEffectKind {
    #[default]
    Null = 0,
    Instakill = 1,
    SchoolDamage = 2,
    Dummy = 3,
    PortalTeleport = 4,
    TeleportUnits = 5,
    ApplyAura = 6,
    EnvironmentalDamage = 7,
    PowerDrain = 8,
    HealthLeech = 9,
    Heal = 10,
    Bind = 11,
    Portal = 12,
    RitualBase = 13,
    RitualSpecialize = 14,
    RitualActivatePortal = 15,
    QuestComplete = 16,
    WeaponDamageNoschool = 17,
    Resurrect = 18,
    AddExtraAttacks = 19,
    Dodge = 20,
    Evade = 21,
    Parry = 22,
    Block = 23,
    CreateItem = 24,
    Weapon = 25,
    Defense = 26,
    PersistentAreaAura = 27,
    Summon = 28,
    Leap = 29,
    Energize = 30,
    WeaponPercentDamage = 31,
    TriggerMissile = 32,
    OpenLock = 33,
    SummonChangeItem = 34,
    ApplyAreaAuraParty = 35,
    LearnSpell = 36,
    SpellDefense = 37,
    Dispel = 38,
    Language = 39,
    DualWield = 40,
    SummonWild = 41,
    SummonGuardian = 42,
    TeleportUnitsFaceCaster = 43,
    SkillStep = 44,
    AddHonor = 45,
    Spawn = 46,
    TradeSkill = 47,
    Stealth = 48,
    Detect = 49,
    TransDoor = 50,
    ForceCriticalHit = 51,
    GuaranteeHit = 52,
    EnchantItem = 53,
    EnchantItemTemporary = 54,
    Tamecreature = 55,
    SummonPet = 56,
    LearnPetSpell = 57,
    WeaponDamage = 58,
    OpenLockItem = 59,
    Proficiency = 60,
    SendEvent = 61,
    PowerBurn = 62,
    Threat = 63,
    TriggerSpell = 64,
    HealthFunnel = 65,
    PowerFunnel = 66,
    HealMaxHealth = 67,
    InterruptCast = 68,
    Distract = 69,
    Pull = 70,
    Pickpocket = 71,
    AddFarsight = 72,
    SummonPossessed = 73,
    SummonTotem = 74,
    HealMechanical = 75,
    SummonObjectWild = 76,
    ScriptEffect = 77,
    Attack = 78,
    Sanctuary = 79,
    AddComboPoints = 80,
    CreateHouse = 81,
    BindSight = 82,
    Duel = 83,
    Stuck = 84,
    SummonPlayer = 85,
    ActivateObject = 86,
    SummonTotemSlot1 = 87,
    SummonTotemSlot2 = 88,
    SummonTotemSlot3 = 89,
    SummonTotemSlot4 = 90,
    ThreatAll = 91,
    EnchantHeldItem = 92,
    SummonPhantasm = 93,
    SelfResurrect = 94,
    Skinning = 95,
    Charge = 96,
    SummonCritter = 97,
    KnockBack = 98,
    Disenchant = 99,
    Inebriate = 100,
    FeedPet = 101,
    DismissPet = 102,
    Reputation = 103,
    SummonObjectSlot1 = 104,
    SummonObjectSlot2 = 105,
    SummonObjectSlot3 = 106,
    SummonObjectSlot4 = 107,
    DispelMechanic = 108,
    SummonDeadPet = 109,
    DestroyAllTotems = 110,
    DurabilityDamage = 111,
    SummonDemon = 112,
    ResurrectNew = 113,
    AttackMe = 114,
    DurabilityDamagePct = 115,
    SkinPlayerCorpse = 116,
    SpiritHeal = 117,
    Skill = 118,
    ApplyAreaAuraPet = 119,
    TeleportGraveyard = 120,
    NormalizedWeaponDmg = 121,
    Unused122 = 122,
    SendTaxi = 123,
    PlayerPull = 124,
    ModifyThreatPercent = 125,
    Unused126 = 126,
    Unused127 = 127,
    Unused128 = 128,
    Unused129 = 129,
}

impl SpellEffectKind {
    pub fn from_raw(raw: u32) -> Option<Self> {
        u8::try_from(raw).ok().and_then(Self::from_repr)
    }

    pub const fn raw(self) -> u8 {
        self as u8
    }

    /// Effects that build an aura into the cast's pending holder.
    pub const fn applies_aura(self) -> bool {
        matches!(
            self,
            Self::ApplyAura | Self::ApplyAreaAuraParty | Self::ApplyAreaAuraPet
        )
    }

    pub const fn is_area_aura(self) -> bool {
        matches!(self, Self::ApplyAreaAuraParty | Self::ApplyAreaAuraPet)
    }

    /// Effects that only make sense against a dead target.
    pub const fn targets_dead(self) -> bool {
        matches!(
            self,
            Self::Resurrect
                | Self::ResurrectNew
                | Self::SelfResurrect
                | Self::SpiritHeal
                | Self::Skinning
                | Self::SkinPlayerCorpse
                | Self::SummonDeadPet
        )
    }

    /// Effects that are always harmful to their target.
    pub const fn is_harmful(self) -> bool {
        matches!(
            self,
            Self::Instakill
                | Self::SchoolDamage
                | Self::EnvironmentalDamage
                | Self::PowerDrain
                | Self::HealthLeech
                | Self::WeaponDamageNoschool
                | Self::WeaponPercentDamage
                | Self::WeaponDamage
                | Self::NormalizedWeaponDmg
                | Self::PowerBurn
                | Self::InterruptCast
                | Self::AttackMe
                | Self::DurabilityDamage
                | Self::DurabilityDamagePct
                | Self::KnockBack
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strum::EnumCount;

    #[test]
    fn covers_every_raw_value() {
        assert_eq!(SpellEffectKind::COUNT, 130);
        for raw in 0..130u32 {
            let kind = SpellEffectKind::from_raw(raw).expect("raw value maps to a variant");
            assert_eq!(u32::from(kind.raw()), raw);
        }
        assert_eq!(SpellEffectKind::from_raw(130), None);
    }

    #[test]
    fn aura_effects() {
        assert!(SpellEffectKind::ApplyAura.applies_aura());
        assert!(SpellEffectKind::ApplyAreaAuraPet.is_area_aura());
        assert!(!SpellEffectKind::PersistentAreaAura.applies_aura());
        assert_eq!(SpellEffectKind::from_raw(6), Some(SpellEffectKind::ApplyAura));
        assert_eq!(SpellEffectKind::from_raw(114), Some(SpellEffectKind::AttackMe));
    }
}
