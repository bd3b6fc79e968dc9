//! Static mapping tables: cluster codes to phonemic fragments and semantic
//! tokens, plus the fixed control chords.

use crate::keymap::{self, Hand};
use crate::types::Mode;
use lazy_static::lazy_static;
use std::collections::HashMap;
use std::fmt;

/// Consonant fragment for each left-hand cluster code. Code 0 is silent.
pub const CONSONANTS: [Option<&str>; 32] = [
    None, Some("f"), Some("p"), Some("st"), Some("t"), Some("s"), Some("θ"), Some("ð"), // 0-7
    Some("r"), Some("ʃ"), Some("nd"), Some("tr"), Some("k"), Some("h"), Some("pr"), Some("str"), // 8-15
    Some("b"), Some("v"), Some("m"), Some("w"), Some("d"), Some("z"), Some("n"), Some("dʒ"), // 16-23
    Some("l"), Some("ʒ"), Some("nt"), Some("tʃ"), Some("g"), Some("sp"), Some("ŋ"), Some("j"), // 24-31
];

/// Vowel fragment for each right-hand cluster code. Code 0 is silent.
pub const VOWELS: [Option<&str>; 32] = [
    None, Some("i"), Some("o"), Some("u"), Some("e"), Some("ə"), Some("at"), Some("in"), // 0-7
    Some("a"), Some("an"), Some("on"), Some("it"), Some("er"), Some("or"), Some("al"), Some("ing"), // 8-15
    Some("ot"), Some("ī"), Some("ō"), Some("ū"), Some("ē"), Some("et"), Some("ut"), Some("en"), // 16-23
    Some("ā"), Some("un"), Some("ad"), Some("is"), Some("il"), Some("aw"), Some("oi"), Some("ow"), // 24-31
];

// Left-hand key bits, spelled out for the category table below.
const A: u8 = 1 << 0;
const S: u8 = 1 << 1;
const D: u8 = 1 << 2;
const F: u8 = 1 << 3;
const C: u8 = 1 << 4;

/// Right-hand thumb bit. Set on a right code to select a category's
/// extended token row.
pub const EXTENDED_BIT: u8 = 1 << 4;

/// Control chords, resolved before any mode-specific lookup.
pub const CONTROL_BACKSPACE: (u8, u8) = (C, EXTENDED_BIT); // C+M, both thumbs
pub const CONTROL_ENTER: (u8, u8) = (C, 0b00001); // C+;
pub const CONTROL_TOGGLE_MODE: (u8, u8) = (S | C, EXTENDED_BIT); // S+C+M
pub const CONTROL_REFERENCE: (u8, u8) = (C, EXTENDED_BIT | 0b00100); // C+M+K

struct Category {
    name: &'static str,
    left: u8,
    base: &'static [&'static str],
    extended: &'static [&'static str],
}

/// Token vocabulary. Each category owns one left-hand mask; the right code
/// indexes into the base row (1..=15) or, with [`EXTENDED_BIT`] set, the
/// extended row. Lookup order matters only for duplicated token names, where
/// the earliest category wins the reverse mapping.
const CATEGORIES: &[Category] = &[
    Category {
        name: "ACTIONS",
        left: A,
        base: &[
            "MAKE", "CHANGE", "REMOVE", "FIX", "FIND", "SHOW", "TRY", "USE", "EXPLAIN", "IMPROVE",
            "COMPARE", "ANALYZE", "SUMMARIZE", "EXPAND", "SIMPLIFY",
        ],
        extended: &[
            "ADD", "KEEP", "GIVE", "TAKE", "THINK", "HELP", "CHECK", "LIST", "COMBINE", "SPLIT",
            "GENERATE", "TRANSLATE", "REWRITE", "FORMAT",
        ],
    },
    Category {
        name: "SUBJECTS",
        left: S,
        base: &[
            "THIS", "THAT", "IT", "IDEA", "TEXT", "CODE", "QUESTION", "ANSWER", "PROBLEM",
            "SOLUTION", "EXAMPLE", "RESULT", "REASON", "WAY", "POINT",
        ],
        extended: &[
            "FILE", "FUNCTION", "DATA", "NAME", "LIST", "STEP", "PART", "OPTION", "ERROR",
            "OUTPUT", "INPUT", "CONTENT", "CONTEXT", "DETAIL",
        ],
    },
    Category {
        name: "QUALITY",
        left: D,
        base: &[
            "GOOD", "BAD", "MORE", "LESS", "SIMPLE", "COMPLEX", "NEW", "OLD", "SAME", "DIFFERENT",
            "GENERAL", "SPECIFIC", "MAIN", "OTHER", "ALL",
        ],
        extended: &[
            "FAST", "SLOW", "BIG", "SMALL", "SHORT", "LONG", "CLEAR", "BETTER", "WORSE", "CORRECT",
            "WRONG", "SIMILAR", "EXACT", "ENOUGH",
        ],
    },
    Category {
        name: "CONNECT",
        left: F,
        base: &[
            "AND", "OR", "BUT", "SO", "IF", "THEN", "BECAUSE", "WITH", "WITHOUT", "FOR", "TO",
            "FROM", "LIKE", "AS", "ABOUT",
        ],
        extended: &[
            "ALSO", "HOWEVER", "INSTEAD", "RATHER", "BEFORE", "AFTER", "WHILE", "WHEN", "WHERE",
            "ALTHOUGH", "UNLESS", "UNTIL", "SINCE", "WHETHER",
        ],
    },
    Category {
        name: "RESPOND",
        left: C,
        base: &[
            "YES", "NO", "MAYBE", "OK", "THANKS", "PLEASE", "SORRY", "WAIT", "DONE", "AGAIN",
            "WHAT", "WHY", "HOW", "WHICH", "WHO",
        ],
        extended: &[
            "CONTINUE", "STOP", "UNDO", "SKIP", "FOCUS", "IGNORE", "REMEMBER", "FORGET", "CONFIRM",
            "NEVERMIND", "PERFECT", "ALMOST", "NOT_QUITE", "EXACTLY",
        ],
    },
    Category {
        name: "PRONOUNS",
        left: S | F,
        base: &[
            "I", "YOU", "WE", "THEY", "HE", "SHE", "SOMEONE", "EVERYONE", "ANYONE", "NOONE",
            "SOMETHING", "EVERYTHING", "ANYTHING", "NOTHING", "ITSELF",
        ],
        extended: &[
            "MY", "YOUR", "OUR", "THEIR", "HIS", "HER", "MYSELF", "ME", "US", "THEM", "HIMSELF",
            "HERSELF", "THEMSELVES", "OURSELVES", "YOURSELF",
        ],
    },
    Category {
        name: "NEGATION",
        left: A | C,
        base: &[
            "NOT", "CAN", "WILL", "SHOULD", "NEVER", "CANNOT", "WONT", "MUST", "MIGHT", "WOULD",
            "ALWAYS", "SOMETIMES", "USUALLY", "BARELY", "HARDLY",
        ],
        extended: &[
            "DONT", "DIDNT", "DOESNT", "ISNT", "HAVENT", "WASNT", "WERENT", "COULDNT", "SHOULDNT",
            "WOULDNT", "ARENT", "WONT_BE", "CANT_BE", "MUSTNT", "NEEDNT",
        ],
    },
    Category {
        name: "PREPOSITIONS",
        left: F | C,
        base: &[
            "IN", "ON", "AT", "BY", "OUT", "UP", "DOWN", "OVER", "UNDER", "THROUGH", "WITHIN",
            "THROUGHOUT", "ALONG", "AGAINST", "AMONG",
        ],
        extended: &[
            "INTO", "ONTO", "NEAR", "AROUND", "BETWEEN", "BEHIND", "ABOVE", "BELOW", "BESIDE",
            "ACROSS", "TOWARD", "AWAY", "APART", "TOGETHER", "INSIDE",
        ],
    },
    Category {
        name: "DAILY",
        left: A | S,
        base: &[
            "GREET", "ASK", "TELL", "WANT", "NEED", "KNOW", "MEET", "CALL", "SEND", "GET", "START",
            "FINISH", "SCHEDULE", "CANCEL", "COMPLETE",
        ],
        extended: &[
            "GO", "COME", "LEAVE", "STAY", "RETURN", "BRING", "ARRIVE", "PUT", "MOVE", "OPEN",
            "SEE", "HEAR", "FEEL", "CLOSE", "TOUCH",
        ],
    },
    Category {
        name: "VERBS",
        left: S | C,
        base: &[
            "PLAY", "WORK", "REST", "SLEEP", "WAKE", "EAT", "DRINK", "READ", "WRITE", "SPEAK",
            "LISTEN", "WATCH", "LEARN", "TEACH", "PRACTICE",
        ],
        extended: &[
            "RUN", "WALK", "SIT", "STAND", "JUMP", "CLIMB", "FALL", "PUSH", "PULL", "HOLD",
            "DROP", "THROW", "CATCH", "CARRY", "DRAG",
        ],
    },
    Category {
        name: "NOUNS",
        left: D | S,
        base: &[
            "NAME", "PERSON", "PLACE", "THING", "TEAM", "COMPANY", "GROUP", "PROJECT", "MEETING",
            "EVENT", "WORLD", "HOME", "OFFICE", "ROOM", "BUILDING",
        ],
        extended: &[
            "EMAIL", "MESSAGE", "PHONE", "MONEY", "DOCUMENT", "REPORT", "TASK", "ISSUE", "REQUEST",
            "UPDATE", "SCREEN", "BUTTON", "WINDOW", "LINK", "IMAGE",
        ],
    },
    Category {
        name: "TIME",
        left: A | D,
        base: &[
            "TODAY", "TOMORROW", "NOW", "LATER", "SOON", "YESTERDAY", "ALWAYS", "TIME", "DATE",
            "MOMENT", "WEEK", "MONTH", "YEAR", "HOUR", "MINUTE",
        ],
        extended: &[
            "MORNING", "AFTERNOON", "EVENING", "NIGHT", "NOON", "MIDNIGHT", "WEEKEND", "DAILY",
            "WEEKLY", "MONTHLY", "YEARLY", "ONCE", "TWICE", "OFTEN", "RARELY",
        ],
    },
    Category {
        name: "STATES",
        left: F | D,
        base: &[
            "HAPPY", "BUSY", "READY", "SURE", "AVAILABLE", "INTERESTED", "EXCITED", "URGENT",
            "IMPORTANT", "NECESSARY", "POSSIBLE", "IMPOSSIBLE", "REQUIRED", "OPTIONAL",
            "RECOMMENDED",
        ],
        extended: &[
            "SAD", "ANGRY", "TIRED", "CONFUSED", "WORRIED", "NERVOUS", "CALM", "BORED", "STUCK",
            "LOST", "FOUND", "BROKEN", "FIXED", "PENDING", "COMPLETE",
        ],
    },
    Category {
        name: "STYLE",
        left: D | C,
        base: &[
            "FORMAL", "CASUAL", "POLITE", "DIRECT", "TECHNICAL", "FRIENDLY", "PROFESSIONAL",
            "BRIEF", "DETAILED", "AS_QUESTION", "AS_COMMAND", "AS_REQUEST", "AS_STATEMENT",
            "AS_LIST", "AS_SUMMARY",
        ],
        extended: &[
            "REPROMPT", "URGENT_TONE", "GENTLE", "FIRM", "HUMOROUS", "SERIOUS", "EMPATHETIC",
            "CONFIDENT", "HUMBLE", "ENTHUSIASTIC", "SKEPTICAL", "SUPPORTIVE", "CRITICAL",
            "NEUTRAL", "PERSUASIVE",
        ],
    },
    Category {
        name: "SYMBOLS",
        left: A | F,
        base: &[
            "1", "2", "3", "4", "5", "6", "7", "8", "9", "0", ".", ",", "?", "!", ":",
        ],
        extended: &[
            "-", "_", "/", "@", "#", "$", "%", "&", "*", "+", "=", "(", ")", "\"", ";",
        ],
    },
    Category {
        name: "TECH",
        left: A | D | S,
        base: &[
            "DEBUG", "TEST", "BUILD", "DEPLOY", "COMMIT", "PUSH", "PULL", "MERGE", "BRANCH",
            "CLONE", "INSTALL", "UNINSTALL", "UPGRADE", "CONFIGURE", "INITIALIZE",
        ],
        extended: &[
            "SERVER", "CLIENT", "DATABASE", "API", "ENDPOINT", "REQUEST_NOUN", "RESPONSE",
            "QUERY", "CACHE", "LOG", "VARIABLE", "CONSTANT", "PARAMETER", "ARGUMENT", "EXCEPTION",
        ],
    },
];

lazy_static! {
    static ref SEMANTIC_TOKENS: HashMap<(u8, u8), &'static str> = {
        let mut map = HashMap::new();
        for cat in CATEGORIES {
            for (i, &token) in cat.base.iter().enumerate() {
                map.insert((cat.left, i as u8 + 1), token);
            }
            for (i, &token) in cat.extended.iter().enumerate() {
                map.insert((cat.left, EXTENDED_BIT | (i as u8 + 1)), token);
            }
        }
        map
    };
    static ref TOKEN_CHORDS: HashMap<&'static str, ChordSpec> = {
        let mut map = HashMap::new();
        for cat in CATEGORIES {
            for (i, &token) in cat.base.iter().enumerate() {
                map.entry(token).or_insert(ChordSpec {
                    left: cat.left,
                    right: i as u8 + 1,
                });
            }
            for (i, &token) in cat.extended.iter().enumerate() {
                map.entry(token).or_insert(ChordSpec {
                    left: cat.left,
                    right: EXTENDED_BIT | (i as u8 + 1),
                });
            }
        }
        map
    };
}

/// Semantic token for a cluster code pair, if the pair is mapped.
pub fn semantic_token(left: u8, right: u8) -> Option<&'static str> {
    SEMANTIC_TOKENS.get(&(left, right)).copied()
}

pub fn consonant(code: u8) -> Option<&'static str> {
    CONSONANTS[(code & 0x1F) as usize]
}

pub fn vowel(code: u8) -> Option<&'static str> {
    VOWELS[(code & 0x1F) as usize]
}

/// Cluster code pair for a token, rendered in canonical key order by its
/// `Display` impl. Duplicated token names resolve to their first category.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChordSpec {
    pub left: u8,
    pub right: u8,
}

impl fmt::Display for ChordSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for bit in keymap::left_bits(self.left) {
            if !first {
                f.write_str("+")?;
            }
            f.write_str(keymap::key_label(Hand::Left, bit))?;
            first = false;
        }
        for bit in keymap::right_bits(self.right) {
            if !first {
                f.write_str("+")?;
            }
            f.write_str(keymap::key_label(Hand::Right, bit))?;
            first = false;
        }
        Ok(())
    }
}

pub fn chord_for_token(token: &str) -> Option<ChordSpec> {
    TOKEN_CHORDS.get(token).copied()
}

/// Plain-text reference card for the given mode, one mapping per line.
pub fn reference_card(mode: Mode) -> String {
    match mode {
        Mode::Phonemic => phonemic_card(),
        Mode::Semantic | Mode::Text => semantic_card(),
    }
}

fn semantic_card() -> String {
    let mut out = String::new();
    for cat in CATEGORIES {
        card_section(&mut out, cat.name, cat.left, 0, cat.base);
        if !cat.extended.is_empty() {
            let name = format!("{}+", cat.name);
            card_section(&mut out, &name, cat.left, EXTENDED_BIT, cat.extended);
        }
    }
    out
}

fn card_section(out: &mut String, name: &str, left: u8, right_base: u8, tokens: &[&str]) {
    let header = ChordSpec {
        left,
        right: right_base,
    };
    out.push_str(&format!("{} ({})\n", name, header));
    for (i, token) in tokens.iter().enumerate() {
        let chord = ChordSpec {
            left,
            right: right_base | (i as u8 + 1),
        };
        out.push_str(&format!("  {}: {}\n", chord, token));
    }
}

fn phonemic_card() -> String {
    let mut out = String::new();
    out.push_str("CONSONANTS (left hand)\n");
    for (code, frag) in CONSONANTS.iter().enumerate() {
        if let Some(frag) = frag {
            out.push_str(&format!("  {:02}: {}\n", code, frag));
        }
    }
    out.push_str("VOWELS (right hand)\n");
    for (code, frag) in VOWELS.iter().enumerate() {
        if let Some(frag) = frag {
            out.push_str(&format!("  {:02}: {}\n", code, frag));
        }
    }
    out
}
