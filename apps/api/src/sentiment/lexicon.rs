//! Word lists and patterns used by the text sentiment scorer and its built-in estimators.

/// Filler words and hedges that signal nervousness. Matched as substrings of the
/// lower-cased answer; each term counts once no matter how often it appears.
pub const NERVOUSNESS_TERMS: &[&str] = &[
    "um",
    "uh",
    "er",
    "ah",
    "like",
    "you know",
    "i mean",
    "sorry",
    "apologies",
    "i think",
    "maybe",
    "perhaps",
    "i guess",
    "kind of",
    "sort of",
    "a bit",
    "a little",
];

/// Distress vocabulary. Each distinct hit adds 0.2 to the nervousness score.
pub const DISTRESS_TERMS: &[&str] = &[
    "crying",
    "cry",
    "tears",
    "sad",
    "upset",
    "frustrated",
    "stressed",
    "anxious",
    "worried",
    "nervous",
    "scared",
    "afraid",
    "difficult",
    "hard",
    "struggle",
    "problem",
];

/// Hesitation markers; every match counts.
pub const HESITATION_PATTERNS: &[&str] = &[
    r"\b(um|uh|er|ah)\b",
    r"\b(like|you know|i mean)\b",
    r"\b(maybe|perhaps|i think|i guess)\b",
    r"\.\.\.",
    r"\?{2,}",
];

/// Tokens that flip the valence of the following sentiment word.
pub const NEGATIONS: &[&str] = &[
    "not", "no", "never", "none", "nobody", "nothing", "neither", "nor", "cannot", "can't",
    "don't", "doesn't", "didn't", "isn't", "wasn't", "aren't", "won't", "wouldn't",
    "shouldn't", "couldn't", "haven't", "hasn't", "without",
];

/// Intensity modifiers: (token, scalar added in the direction of the valence).
pub const BOOSTERS: &[(&str, f64)] = &[
    ("absolutely", 0.293),
    ("very", 0.293),
    ("really", 0.293),
    ("extremely", 0.293),
    ("incredibly", 0.293),
    ("highly", 0.293),
    ("so", 0.293),
    ("totally", 0.293),
    ("quite", 0.15),
    ("slightly", -0.293),
    ("somewhat", -0.293),
    ("barely", -0.293),
    ("hardly", -0.293),
];

/// Word valences on a -4..4 scale.
pub const VALENCE: &[(&str, f64)] = &[
    ("accomplished", 1.9),
    ("achieve", 1.8),
    ("achieved", 1.8),
    ("amazing", 2.8),
    ("awesome", 3.1),
    ("benefit", 1.6),
    ("best", 3.2),
    ("better", 1.9),
    ("confident", 2.2),
    ("delighted", 2.9),
    ("effective", 1.5),
    ("efficient", 1.4),
    ("enjoy", 2.2),
    ("enjoyed", 2.3),
    ("excellent", 2.7),
    ("excited", 1.4),
    ("fantastic", 2.6),
    ("glad", 2.0),
    ("good", 1.9),
    ("great", 3.1),
    ("happy", 2.7),
    ("improve", 1.9),
    ("improved", 2.1),
    ("love", 3.2),
    ("passionate", 2.4),
    ("proud", 2.1),
    ("solved", 1.3),
    ("success", 2.7),
    ("successful", 2.8),
    ("successfully", 2.8),
    ("strong", 2.3),
    ("thanks", 1.9),
    ("win", 2.8),
    ("won", 2.7),
    ("wonderful", 2.7),
    ("afraid", -2.2),
    ("angry", -2.3),
    ("anxious", -1.0),
    ("awful", -2.0),
    ("bad", -2.5),
    ("confused", -1.3),
    ("cry", -2.1),
    ("crying", -2.1),
    ("difficult", -1.5),
    ("disappointed", -1.9),
    ("fail", -2.5),
    ("failed", -2.3),
    ("failure", -2.3),
    ("frustrated", -2.4),
    ("hate", -2.7),
    ("horrible", -2.5),
    ("lost", -1.3),
    ("mistake", -1.5),
    ("nervous", -1.1),
    ("poor", -2.1),
    ("problem", -1.7),
    ("sad", -2.1),
    ("scared", -1.9),
    ("sorry", -0.3),
    ("stressed", -1.4),
    ("struggle", -1.3),
    ("terrible", -2.1),
    ("tears", -0.9),
    ("upset", -1.6),
    ("worried", -1.2),
    ("worst", -3.1),
    ("wrong", -2.1),
];

/// Adjective polarity (-1..1) and subjectivity (0..1).
pub const POLARITY: &[(&str, f64, f64)] = &[
    ("amazing", 0.6, 0.9),
    ("awesome", 1.0, 1.0),
    ("bad", -0.7, 0.67),
    ("best", 1.0, 0.3),
    ("better", 0.5, 0.5),
    ("clear", 0.1, 0.38),
    ("confident", 0.5, 0.67),
    ("confusing", -0.3, 0.5),
    ("difficult", -0.5, 1.0),
    ("easy", 0.43, 0.83),
    ("effective", 0.6, 0.8),
    ("efficient", 0.5, 0.6),
    ("excellent", 1.0, 1.0),
    ("fantastic", 0.4, 0.9),
    ("good", 0.7, 0.6),
    ("great", 0.8, 0.75),
    ("happy", 0.8, 1.0),
    ("hard", -0.29, 0.54),
    ("horrible", -1.0, 1.0),
    ("interesting", 0.5, 0.5),
    ("nervous", -0.2, 0.5),
    ("nice", 0.6, 1.0),
    ("poor", -0.4, 0.6),
    ("proud", 0.8, 1.0),
    ("sad", -0.5, 1.0),
    ("simple", 0.0, 0.36),
    ("strong", 0.43, 0.73),
    ("successful", 0.75, 0.95),
    ("terrible", -1.0, 1.0),
    ("useful", 0.3, 0.0),
    ("worried", -0.3, 0.6),
    ("worst", -1.0, 1.0),
    ("wrong", -0.5, 0.9),
];

/// Modifiers that scale polarity and subjectivity of the next adjective.
pub const INTENSIFIERS: &[(&str, f64)] = &[
    ("very", 1.3),
    ("really", 1.3),
    ("extremely", 1.5),
    ("quite", 1.1),
    ("somewhat", 0.8),
    ("slightly", 0.7),
];
