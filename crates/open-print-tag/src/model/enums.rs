//! Enumerated field values.
//!
//! Each enumeration is an open newtype over its wire integer: codes this
//! version does not name still decode, round-trip and compare, they just
//! have no text name.

use std::fmt;
use std::str::FromStr;

use lazy_static::lazy_static;
use rustc_hash::FxHashMap;

use crate::error::FieldError;

/// Identifies which enumeration a field draws its codes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EnumKind {
    MaterialClass,
    MaterialType,
    TagFlag,
    MaterialCertification,
    WriteProtection,
}

impl EnumKind {
    /// Returns the (code, name) table for this enumeration.
    pub fn names(self) -> &'static [(u64, &'static str)] {
        match self {
            EnumKind::MaterialClass => MaterialClass::NAMES,
            EnumKind::MaterialType => MaterialType::NAMES,
            EnumKind::TagFlag => TagFlag::NAMES,
            EnumKind::MaterialCertification => MaterialCertification::NAMES,
            EnumKind::WriteProtection => WriteProtection::NAMES,
        }
    }

    /// Returns the text name of a code, if it has one.
    pub fn name_of(self, code: u64) -> Option<&'static str> {
        self.names()
            .iter()
            .find(|(c, _)| *c == code)
            .map(|(_, name)| *name)
    }

    /// Looks up a code by its text name.
    pub fn code_of(self, name: &str) -> Option<u64> {
        NAME_LOOKUP.get(&self)?.get(name).copied()
    }

    /// Parses either a known name or a decimal code.
    pub fn parse(self, text: &str) -> Result<u64, FieldError> {
        let text = text.trim();
        if let Some(code) = self.code_of(text) {
            return Ok(code);
        }
        text.parse::<u64>().map_err(|_| FieldError::UnknownEnumName {
            name: text.to_string(),
        })
    }

    /// Formats a code as its name, or as a number if it has none.
    pub fn format(self, code: u64) -> String {
        match self.name_of(code) {
            Some(name) => name.to_string(),
            None => code.to_string(),
        }
    }
}

impl fmt::Display for EnumKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EnumKind::MaterialClass => "material class",
            EnumKind::MaterialType => "material type",
            EnumKind::TagFlag => "tag",
            EnumKind::MaterialCertification => "certification",
            EnumKind::WriteProtection => "write protection",
        };
        f.write_str(name)
    }
}

lazy_static! {
    static ref NAME_LOOKUP: FxHashMap<EnumKind, FxHashMap<&'static str, u64>> = {
        let kinds = [
            EnumKind::MaterialClass,
            EnumKind::MaterialType,
            EnumKind::TagFlag,
            EnumKind::MaterialCertification,
            EnumKind::WriteProtection,
        ];
        kinds
            .into_iter()
            .map(|kind| {
                let names = kind.names().iter().map(|(code, name)| (*name, *code)).collect();
                (kind, names)
            })
            .collect()
    };
}

/// Common behavior of the enumeration newtypes.
pub trait Enumeration: Copy {
    const KIND: EnumKind;

    fn code(self) -> u64;

    fn from_code(code: u64) -> Self;

    /// Returns the text name, if this code has one.
    fn name(self) -> Option<&'static str> {
        Self::KIND.name_of(self.code())
    }
}

macro_rules! enumeration {
    (
        $(#[$meta:meta])*
        pub struct $name:ident: $kind:ident {
            $($const_name:ident = $code:literal => $text:literal,)*
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(pub u64);

        impl $name {
            $(pub const $const_name: Self = Self($code);)*

            pub(crate) const NAMES: &'static [(u64, &'static str)] = &[$(($code, $text)),*];
        }

        impl Enumeration for $name {
            const KIND: EnumKind = EnumKind::$kind;

            fn code(self) -> u64 {
                self.0
            }

            fn from_code(code: u64) -> Self {
                Self(code)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&EnumKind::$kind.format(self.0))
            }
        }

        impl FromStr for $name {
            type Err = FieldError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                EnumKind::$kind.parse(s).map(Self)
            }
        }
    };
}

enumeration! {
    /// Printing technology the material is meant for.
    pub struct MaterialClass: MaterialClass {
        FFF = 0 => "FFF",
        SLA = 1 => "SLA",
    }
}

enumeration! {
    /// Base polymer of the material.
    pub struct MaterialType: MaterialType {
        PLA = 0 => "PLA",
        PETG = 1 => "PETG",
        TPU = 2 => "TPU",
        ABS = 3 => "ABS",
        ASA = 4 => "ASA",
        PC = 5 => "PC",
        PCTG = 6 => "PCTG",
        PP = 7 => "PP",
        PA6 = 8 => "PA6",
        PA11 = 9 => "PA11",
        PA12 = 10 => "PA12",
        PA66 = 11 => "PA66",
        CPE = 12 => "CPE",
        TPE = 13 => "TPE",
        HIPS = 14 => "HIPS",
        PHA = 15 => "PHA",
        PET = 16 => "PET",
        PEI = 17 => "PEI",
        PBT = 18 => "PBT",
        PVB = 19 => "PVB",
        PVA = 20 => "PVA",
        PEKK = 21 => "PEKK",
        PEEK = 22 => "PEEK",
        BVOH = 23 => "BVOH",
        TPC = 24 => "TPC",
        PPS = 25 => "PPS",
        PPSU = 26 => "PPSU",
        PVC = 27 => "PVC",
        PEBA = 28 => "PEBA",
        PVDF = 29 => "PVDF",
        PPA = 30 => "PPA",
        PCL = 31 => "PCL",
        PES = 32 => "PES",
        PMMA = 33 => "PMMA",
        POM = 34 => "POM",
        PPE = 35 => "PPE",
        PS = 36 => "PS",
        PSU = 37 => "PSU",
        TPI = 38 => "TPI",
        SBS = 39 => "SBS",
        OBC = 40 => "OBC",
        EVA = 41 => "EVA",
    }
}

enumeration! {
    /// Material property flag carried in the `tags` list.
    pub struct TagFlag: TagFlag {
        FILTRATION_RECOMMENDED = 0 => "filtration_recommended",
        BIOCOMPATIBLE = 1 => "biocompatible",
        ANTIBACTERIAL = 2 => "antibacterial",
        AIR_FILTERING = 3 => "air_filtering",
        ABRASIVE = 4 => "abrasive",
        FOAMING = 5 => "foaming",
        SELF_EXTINGUISHING = 6 => "self_extinguishing",
        PARAMAGNETIC = 7 => "paramagnetic",
        RADIATION_SHIELDING = 8 => "radiation_shielding",
        HIGH_TEMPERATURE = 9 => "high_temperature",
        ESD_SAFE = 10 => "esd_safe",
        CONDUCTIVE = 11 => "conductive",
        BLEND = 12 => "blend",
        WATER_SOLUBLE = 13 => "water_soluble",
        IPA_SOLUBLE = 14 => "ipa_soluble",
        LIMONENE_SOLUBLE = 15 => "limonene_soluble",
        MATTE = 16 => "matte",
        SILK = 17 => "silk",
        TRANSLUCENT = 19 => "translucent",
        TRANSPARENT = 20 => "transparent",
        IRIDESCENT = 21 => "iridescent",
        PEARLESCENT = 22 => "pearlescent",
        GLITTER = 23 => "glitter",
        GLOW_IN_THE_DARK = 24 => "glow_in_the_dark",
        NEON = 25 => "neon",
        ILLUMINESCENT_COLOR_CHANGE = 26 => "illuminescent_color_change",
        TEMPERATURE_COLOR_CHANGE = 27 => "temperature_color_change",
        GRADUAL_COLOR_CHANGE = 28 => "gradual_color_change",
        COEXTRUDED = 29 => "coextruded",
        CONTAINS_CARBON = 30 => "contains_carbon",
        CONTAINS_CARBON_FIBER = 31 => "contains_carbon_fiber",
        CONTAINS_CARBON_NANO_TUBES = 32 => "contains_carbon_nano_tubes",
        CONTAINS_GLASS = 33 => "contains_glass",
        CONTAINS_GLASS_FIBER = 34 => "contains_glass_fiber",
        CONTAINS_KEVLAR = 35 => "contains_kevlar",
        CONTAINS_STONE = 36 => "contains_stone",
        CONTAINS_MAGNETITE = 37 => "contains_magnetite",
        CONTAINS_ORGANIC_MATERIAL = 38 => "contains_organic_material",
        CONTAINS_CORK = 39 => "contains_cork",
        CONTAINS_WAX = 40 => "contains_wax",
        CONTAINS_WOOD = 41 => "contains_wood",
        CONTAINS_BAMBOO = 42 => "contains_bamboo",
        CONTAINS_PINE = 43 => "contains_pine",
        CONTAINS_CERAMIC = 44 => "contains_ceramic",
        CONTAINS_BORON_CARBIDE = 45 => "contains_boron_carbide",
        CONTAINS_METAL = 46 => "contains_metal",
        CONTAINS_BRONZE = 47 => "contains_bronze",
        CONTAINS_IRON = 48 => "contains_iron",
        CONTAINS_STEEL = 49 => "contains_steel",
        CONTAINS_SILVER = 50 => "contains_silver",
        CONTAINS_COPPER = 51 => "contains_copper",
        CONTAINS_ALUMINIUM = 52 => "contains_aluminium",
        CONTAINS_BRASS = 53 => "contains_brass",
        CONTAINS_TUNGSTEN = 54 => "contains_tungsten",
        IMITATES_WOOD = 55 => "imitates_wood",
        IMITATES_METAL = 56 => "imitates_metal",
        IMITATES_MARBLE = 57 => "imitates_marble",
        IMITATES_STONE = 58 => "imitates_stone",
        LITHOPHANE = 59 => "lithophane",
        RECYCLED = 60 => "recycled",
        HOME_COMPOSTABLE = 61 => "home_compostable",
        INDUSTRIALLY_COMPOSTABLE = 62 => "industrially_compostable",
        BIO_BASED = 63 => "bio_based",
        LOW_OUTGASSING = 64 => "low_outgassing",
        WITHOUT_PIGMENTS = 65 => "without_pigments",
        CONTAINS_ALGAE = 66 => "contains_algae",
        CASTABLE = 67 => "castable",
        CONTAINS_PTFE = 68 => "contains_ptfe",
        LIMITED_EDITION = 69 => "limited_edition",
        EMI_SHIELDING = 70 => "emi_shielding",
        HIGH_SPEED = 71 => "high_speed",
        CONTAINS_GRAPHENE = 72 => "contains_graphene",
    }
}

enumeration! {
    /// Safety certification held by the material.
    pub struct MaterialCertification: MaterialCertification {
        UL_2818 = 0 => "ul_2818",
        UL_94_V0 = 1 => "ul_94_v0",
        UL_2904 = 2 => "ul_2904",
    }
}

enumeration! {
    /// Write protection mode of the tag. No codes are named yet.
    pub struct WriteProtection: WriteProtection {}
}
