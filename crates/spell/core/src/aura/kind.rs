//! Aura type discriminant.
//!
//! One variant per aura type; the numeric values are the ones stored in
//! spell data files. Dispatch over this enum is a total `match` in
//! [`crate::aura::handlers`].

/// Kind of modifier an aura applies to its target.
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
#[repr(u16)]
pub enum AuraType {
    #[default]
    None = 0,
    BindSight = 1,
    ModPossess = 2,
    PeriodicDamage = 3,
    Dummy = 4,
    ModConfuse = 5,
    ModCharm = 6,
    ModFear = 7,
    PeriodicHeal = 8,
    ModAttackspeed = 9,
    ModThreat = 10,
    ModTaunt = 11,
    ModStun = 12,
    ModDamageDone = 13,
    ModDamageTaken = 14,
    DamageShield = 15,
    ModStealth = 16,
    ModStealthDetect = 17,
    ModInvisibility = 18,
    ModInvisibilityDetection = 19,
    ObsModHealth = 20,
    ObsModMana = 21,
    ModResistance = 22,
    PeriodicTriggerSpell = 23,
    PeriodicEnergize = 24,
    ModPacify = 25,
    ModRoot = 26,
    ModSilence = 27,
    ReflectSpells = 28,
    ModStat = 29,
    ModSkill = 30,
    ModIncreaseSpeed = 31,
    ModIncreaseMountedSpeed = 32,
    ModDecreaseSpeed = 33,
    ModIncreaseHealth = 34,
    ModIncreaseEnergy = 35,
    ModShapeshift = 36,
    EffectImmunity = 37,
    StateImmunity = 38,
    SchoolImmunity = 39,
    DamageImmunity = 40,
    DispelImmunity = 41,
    ProcTriggerSpell = 42,
    ProcTriggerDamage = 43,
    TrackCreatures = 44,
    TrackResources = 45,
    Unused46 = 46,
    ModParryPercent = 47,
    Unused48 = 48,
    ModDodgePercent = 49,
    ModBlockSkill = 50,
    ModBlockPercent = 51,
    ModCritPercent = 52,
    PeriodicLeech = 53,
    ModHitChance = 54,
    ModSpellHitChance = 55,
    Transform = 56,
    ModSpellCritChance = 57,
    ModIncreaseSwimSpeed = 58,
    ModDamageDoneCreature = 59,
    ModPacifySilence = 60,
    ModScale = 61,
    PeriodicHealthFunnel = 62,
    PeriodicManaFunnel = 63,
    PeriodicManaLeech = 64,
    ModCastingSpeedNotStack = 65,
    FeignDeath = 66,
    ModDisarm = 67,
    ModStalked = 68,
    SchoolAbsorb = 69,
    ExtraAttacks = 70,
    ModSpellCritChanceSchool = 71,
    ModPowerCostSchoolPct = 72,
    ModPowerCostSchool = 73,
    ReflectSpellsSchool = 74,
    ModLanguage = 75,
    FarSight = 76,
    MechanicImmunity = 77,
    Mounted = 78,
    ModDamagePercentDone = 79,
    ModPercentStat = 80,
    SplitDamagePct = 81,
    WaterBreathing = 82,
    ModBaseResistance = 83,
    ModRegen = 84,
    ModPowerRegen = 85,
    ChannelDeathItem = 86,
    ModDamagePercentTaken = 87,
    ModHealthRegenPercent = 88,
    PeriodicDamagePercent = 89,
    ModResistChance = 90,
    ModDetectRange = 91,
    PreventsFleeing = 92,
    ModUnattackable = 93,
    InterruptRegen = 94,
    Ghost = 95,
    SpellMagnet = 96,
    ManaShield = 97,
    ModSkillTalent = 98,
    ModAttackPower = 99,
    AurasVisible = 100,
    ModResistancePct = 101,
    ModMeleeAttackPowerVersus = 102,
    ModTotalThreat = 103,
    WaterWalk = 104,
    FeatherFall = 105,
    Hover = 106,
    AddFlatModifier = 107,
    AddPctModifier = 108,
    AddTargetTrigger = 109,
    ModPowerRegenPercent = 110,
    AddCasterHitTrigger = 111,
    OverrideClassScripts = 112,
    ModRangedDamageTaken = 113,
    ModRangedDamageTakenPct = 114,
    ModHealing = 115,
    ModRegenDuringCombat = 116,
    ModMechanicResistance = 117,
    ModHealingPct = 118,
    SharePetTracking = 119,
    Untrackable = 120,
    Empathy = 121,
    ModOffhandDamagePct = 122,
    ModTargetResistance = 123,
    ModRangedAttackPower = 124,
    ModMeleeDamageTaken = 125,
    ModMeleeDamageTakenPct = 126,
    RangedAttackPowerAttackerBonus = 127,
    ModPossessPet = 128,
    ModSpeedAlways = 129,
    ModMountedSpeedAlways = 130,
    ModRangedAttackPowerVersus = 131,
    ModIncreaseEnergyPercent = 132,
    ModIncreaseHealthPercent = 133,
    ModManaRegenInterrupt = 134,
    ModHealingDone = 135,
    ModHealingDonePercent = 136,
    ModTotalStatPercentage = 137,
    ModMeleeHaste = 138,
    ForceReaction = 139,
    ModRangedHaste = 140,
    ModRangedAmmoHaste = 141,
    ModBaseResistancePct = 142,
    ModResistanceExclusive = 143,
    SafeFall = 144,
    Charisma = 145,
    Persuaded = 146,
    MechanicImmunityMask = 147,
    RetainComboPoints = 148,
    ResistPushback = 149,
    ModShieldBlockvaluePct = 150,
    TrackStealthed = 151,
    ModDetectedRange = 152,
    SplitDamageFlat = 153,
    ModStealthLevel = 154,
    ModWaterBreathing = 155,
    ModReputationGain = 156,
    PetDamageMulti = 157,
    ModShieldBlockvalue = 158,
    NoPvpCredit = 159,
    ModAoeAvoidance = 160,
    ModHealthRegenInCombat = 161,
    PowerBurnMana = 162,
    ModCritDamageBonus = 163,
    Unused164 = 164,
    MeleeAttackPowerAttackerBonus = 165,
    ModAttackPowerPct = 166,
    ModRangedAttackPowerPct = 167,
    ModDamageDoneVersus = 168,
    ModCritPercentVersus = 169,
    DetectAmore = 170,
    ModSpeedNotStack = 171,
    ModMountedSpeedNotStack = 172,
    AllowChampionSpells = 173,
    ModSpellDamageOfStatPercent = 174,
    ModSpellHealingOfStatPercent = 175,
    SpiritOfRedemption = 176,
    AoeCharm = 177,
    ModDebuffResistance = 178,
    ModAttackerSpellCritChance = 179,
    ModFlatSpellDamageVersus = 180,
    ModFlatSpellCritDamageVersus = 181,
    ModResistanceOfStatPercent = 182,
    ModCriticalThreat = 183,
    ModAttackerMeleeHitChance = 184,
    ModAttackerRangedHitChance = 185,
    ModAttackerSpellHitChance = 186,
    ModAttackerMeleeCritChance = 187,
    ModAttackerRangedCritChance = 188,
    ModRating = 189,
    ModFactionReputationGain = 190,
    UseNormalMovementSpeed = 191,
}

impl AuraType {
    /// Looks up an aura type by its numeric value; unknown values map to `None`.
    pub fn from_raw(raw: u32) -> Option<Self> {
        u16::try_from(raw).ok().and_then(Self::from_repr)
    }

    pub const fn raw(self) -> u16 {
        self as u16
    }

    /// Aura types whose handler marks the aura periodic on apply.
    pub const fn is_periodic(self) -> bool {
        matches!(
            self,
            Self::PeriodicDamage
                | Self::PeriodicHeal
                | Self::ObsModHealth
                | Self::ObsModMana
                | Self::PeriodicTriggerSpell
                | Self::PeriodicEnergize
                | Self::PeriodicLeech
                | Self::PeriodicHealthFunnel
                | Self::PeriodicManaLeech
                | Self::ModRegen
                | Self::ModPowerRegen
                | Self::PeriodicDamagePercent
                | Self::PowerBurnMana
        )
    }

    /// Types that hold a target-wide flag; removal re-scans the remaining auras.
    pub const fn is_exclusive_flag(self) -> bool {
        matches!(
            self,
            Self::ModStun
                | Self::ModRoot
                | Self::ModSilence
                | Self::ModPacify
                | Self::ModPacifySilence
                | Self::ModConfuse
                | Self::ModFear
                | Self::ModDisarm
                | Self::ModStealth
                | Self::ModInvisibility
                | Self::MechanicImmunity
                | Self::MechanicImmunityMask
                | Self::FeignDeath
                | Self::ModUnattackable
                | Self::Ghost
                | Self::WaterWalk
                | Self::FeatherFall
                | Self::Hover
                | Self::WaterBreathing
        )
    }

    /// Holders of the same spell from different casters may coexist when every
    /// aura is one of these types.
    pub const fn stacks_across_casters(self) -> bool {
        matches!(
            self,
            Self::None
                | Self::PeriodicDamage
                | Self::Dummy
                | Self::PeriodicLeech
                | Self::PeriodicHeal
                | Self::ObsModHealth
                | Self::PeriodicManaLeech
                | Self::ObsModMana
                | Self::PowerBurnMana
        )
    }

    /// Aura types that are harmful regardless of their amount.
    pub const fn is_always_negative(self) -> bool {
        matches!(
            self,
            Self::ModPossess
                | Self::PeriodicDamage
                | Self::ModConfuse
                | Self::ModCharm
                | Self::ModFear
                | Self::ModTaunt
                | Self::ModStun
                | Self::ModPacify
                | Self::ModRoot
                | Self::ModSilence
                | Self::PeriodicLeech
                | Self::ModPacifySilence
                | Self::PeriodicManaLeech
                | Self::ModDisarm
                | Self::ModStalked
                | Self::PeriodicDamagePercent
                | Self::PowerBurnMana
                | Self::ModDecreaseSpeed
                | Self::AoeCharm
        )
    }

    /// Aura types whose sign decides benefit the other way round (more is worse).
    pub const fn is_inverted_benefit(self) -> bool {
        matches!(
            self,
            Self::ModDamageTaken
                | Self::ModDamagePercentTaken
                | Self::ModPowerCostSchool
                | Self::ModPowerCostSchoolPct
                | Self::ModCastingSpeedNotStack
                | Self::ModMeleeDamageTaken
                | Self::ModMeleeDamageTakenPct
                | Self::ModRangedDamageTaken
                | Self::ModRangedDamageTakenPct
        )
    }
}
