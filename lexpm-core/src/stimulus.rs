use serde::{Deserialize, Serialize};

use crate::task::BlockPhase;

/// Response key for a real-word decision.
pub const WORD_KEY: char = 'n';
/// Response key for a non-word decision.
pub const NONWORD_KEY: char = 'm';

/// What kind of letter string a trial shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StimulusKind {
    #[serde(rename = "word")]
    Word,
    #[serde(rename = "nonword")]
    NonWord,
    #[serde(rename = "pm_cue")]
    PmCue,
}

/// A prospective-memory cue word, bound to its own response key and a
/// display color for the host's key legend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PmCue {
    pub word: &'static str,
    pub key: char,
    pub color: &'static str,
}

static PM_CUES: [PmCue; 3] = [
    PmCue { word: "BLUE", key: 'q', color: "#3B82F6" },
    PmCue { word: "PURPLE", key: 'w', color: "#8B5CF6" },
    PmCue { word: "GREEN", key: 'e', color: "#22C55E" },
];

/// The fixed cue set, in the round-robin order the generator cycles
/// through.
pub fn pm_cues() -> &'static [PmCue] {
    &PM_CUES
}

/// Word pool for a phase. Pools are disjoint between phases and from
/// the training pool, so no participant sees a stimulus twice.
pub fn word_pool(phase: BlockPhase) -> &'static [&'static str] {
    match phase {
        BlockPhase::Before => &WORDS_BEFORE,
        BlockPhase::After => &WORDS_AFTER,
    }
}

/// Non-word pool for a phase. Entry i differs from the phase's word i
/// by one or two letters.
pub fn nonword_pool(phase: BlockPhase) -> &'static [&'static str] {
    match phase {
        BlockPhase::Before => &NONWORDS_BEFORE,
        BlockPhase::After => &NONWORDS_AFTER,
    }
}

pub fn training_words() -> &'static [&'static str] {
    &TRAINING_WORDS
}

pub fn training_nonwords() -> &'static [&'static str] {
    &TRAINING_NONWORDS
}

static WORDS_BEFORE: [&str; 80] = [
    "KITCHEN", "MORNING", "BALANCE", "CABINET", "DOLPHIN",
    "ELEMENT", "FANTASY", "GENUINE", "HISTORY", "JOURNEY",
    "KINGDOM", "LIBRARY", "MACHINE", "NATURAL", "OPINION",
    "PATTERN", "QUARTER", "REMAINS", "SOCIETY", "THOUGHT",
    "VILLAGE", "WEATHER", "BLANKET", "CAPTAIN", "DIAMOND",
    "EVENING", "FICTION", "GATEWAY", "HARMONY", "IMAGINE",
    "JUSTICE", "LEATHER", "MINERAL", "NOTHING", "OPERATE",
    "PIONEER", "QUALITY", "RELEASE", "SILENCE", "TOBACCO",
    "UNIFORM", "VERSION", "WITNESS", "ANCIENT", "BENEFIT",
    "CLIMATE", "DEPOSIT", "EMOTION", "FINANCE", "GALLERY",
    "HIGHWAY", "INSTANT", "JOURNAL", "LECTURE", "MAMMOTH",
    "NETWORK", "OVERALL", "PLASTIC", "PREMIUM", "RAINBOW",
    "SHELTER", "TRIBUTE", "UNUSUAL", "VENTURE", "WELFARE",
    "WRITTEN", "ACHIEVE", "BEDROOM", "CENTURY", "DECLINE",
    "ENDLESS", "FOREIGN", "GLIMPSE", "HOLIDAY", "IMPULSE",
    "LEISURE", "MISSILE", "NAPKINS", "OBSERVE", "PASSAGE",
];

static NONWORDS_BEFORE: [&str; 80] = [
    "KITCHAN", "MORBING", "BALENCE", "CABIMET", "DOLPKIN",
    "ELEMANT", "FANTISY", "GANUINE", "HISTIRY", "JOURLEY",
    "KINGDOB", "LIBRACY", "MACHIRE", "NATIRAL", "OPINEON",
    "PATTERM", "QUARTOR", "REMAIRS", "SOCIEFY", "THOUGLT",
    "VILLAKE", "WEATHIR", "BLANKAT", "CAPTAEN", "DIAMONT",
    "EVENIMG", "FICEION", "GATEWEY", "HARMOLY", "IMAGIRE",
    "JUSTACE", "LEATHOR", "MINORAL", "NOTHENG", "OPERITE",
    "PIOMEER", "QUALINY", "RELEAST", "SILERCE", "TOBACCA",
    "UNIFORN", "VERSIOL", "WITNASS", "ANCIENG", "BENIFIT",
    "CLIMETE", "DEPOSIL", "EMOTIAN", "FINANCA", "GALLARY",
    "HIGHWEY", "INSTANK", "JOURNEL", "LECTURA", "MAMMATH",
    "NETWARK", "OVERAIL", "PLASTEC", "PREMIAM", "RAINBEW",
    "SHELTAR", "TRIBUTI", "UNUSIAL", "VENTORE", "WELFARA",
    "WRITTAN", "ACHIAVE", "BEDROON", "CENTIRY", "DECLINA",
    "ENDIESS", "FOREIGH", "GLIMPSA", "HOLIDEY", "IMPULSA",
    "LEISURA", "MISSILA", "NAPKANS", "OBSERFE", "PASSAGA",
];

static WORDS_AFTER: [&str; 80] = [
    "WHISPER", "ALGEBRA", "BONFIRE", "CHAPTER", "DISPLAY",
    "EXPENSE", "FORMULA", "HUNDRED", "INITIAL", "LOGICAL",
    "MASSIVE", "NUCLEAR", "OUTLINE", "PARKING", "RECEIPT",
    "SALVAGE", "TEACHER", "UTILITY", "VANILLA", "ARTWORK",
    "BICYCLE", "CONTEST", "DIGITAL", "ENQUIRE", "FASHION",
    "GRAVITY", "HARVEST", "INQUIRY", "LAUNDRY", "MIDTERM",
    "NEUTRAL", "ORBITAL", "PENGUIN", "REBUILD", "STORAGE",
    "TRAFFIC", "VARIOUS", "WESTERN", "ANXIETY", "BILLION",
    "COMPLEX", "DENSITY", "EXHIBIT", "GLUCOSE", "HOSTAGE",
    "INSIGHT", "MEDICAL", "NOTABLE", "OPTIMAL", "PRIVATE",
    "ROUTINE", "SURFACE", "TYPICAL", "VETERAN", "WARRIOR",
    "AVERAGE", "BRACKET", "CANTEEN", "ELEVATE", "FISHING",
    "RADICAL", "SEGMENT", "QUANTUM", "PILGRIM", "OVERLAP",
    "NURSING", "TORTURE", "SCANDAL", "THERAPY", "VOLTAGE",
    "REALITY", "COUNTRY", "MONSTER", "BATTERY", "COMBINE",
    "CULTURE", "DESTINY", "EMPEROR", "FERTILE", "GENERAL",
];

static NONWORDS_AFTER: [&str; 80] = [
    "WHISPOR", "ALGEBRI", "BONFIRA", "CHAPTOR", "DISPLIY",
    "EXPENSA", "FORMULI", "HUNDRAD", "INITIEL", "LOGICOL",
    "MASSIVA", "NUCLEER", "OUTLINA", "PARKENG", "RECEINT",
    "SALVEGE", "TEACHAR", "UTILILY", "VANILLI", "ARTWORT",
    "BICYCLA", "CONTESK", "DIGITOL", "ENQUIRA", "FASHIOM",
    "GRAVILY", "HARVAST", "INQUARY", "LAUNDRI", "MIDTARM",
    "NEUTREL", "ORBITEL", "PENGUEN", "REBUELD", "STORAGA",
    "TRAFFEC", "VARIOOS", "WESTARN", "ANXIELY", "BILLIAN",
    "COMPLAX", "DENSILY", "EXHIBET", "GLUCOSA", "HOSTAGI",
    "INSIGLT", "MEDICOL", "NOTABLA", "OPTIMEL", "PRIVATA",
    "ROUTIME", "SURFACA", "TYPICOL", "VETERAI", "WARRIAR",
    "AVERAGA", "BRACKAT", "CANTEAM", "ELEVATA", "FISHENG",
    "RADICOL", "SEGMANT", "QUANTEM", "PILGRAM", "OVERLEP",
    "NURSENG", "TORTURA", "SCANDEL", "THEREPY", "VOLTEGE",
    "REALILY", "COUNTRI", "MONSTAR", "BATTERI", "COMBINA",
    "CULTURA", "DESTANY", "EMPERIR", "FERTILA", "GENEROL",
];

static TRAINING_WORDS: [&str; 5] = [
    "GARDEN", "SIMPLE", "PLANET", "WONDER", "BASKET",
];

static TRAINING_NONWORDS: [&str; 5] = [
    "GARDAN", "SIMPLA", "PLANAT", "WONDAR", "BASKAT",
];
