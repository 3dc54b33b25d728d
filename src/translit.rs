// Transliteration - converts romanized Sanskrit into Devanagari script

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// Romanization schemes accepted as input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Scheme {
    Itrans,
    Hk,
    Iast,
    Slp1,
    Velthuis,
    Wx,
}

impl Scheme {
    pub fn as_str(&self) -> &'static str {
        match self {
            Scheme::Itrans => "itrans",
            Scheme::Hk => "hk",
            Scheme::Iast => "iast",
            Scheme::Slp1 => "slp1",
            Scheme::Velthuis => "velthuis",
            Scheme::Wx => "wx",
        }
    }

    /// Parse a scheme name, falling back to ITRANS for anything unrecognized.
    pub fn parse_or_default(name: &str) -> Self {
        match name.trim().to_lowercase().as_str() {
            "hk" | "harvard-kyoto" => Scheme::Hk,
            "iast" => Scheme::Iast,
            "slp1" | "slp" => Scheme::Slp1,
            "velthuis" => Scheme::Velthuis,
            "wx" => Scheme::Wx,
            _ => Scheme::Itrans,
        }
    }
}

/// One romanized token and what it stands for.
#[derive(Debug, Clone, Copy)]
enum Sound {
    /// Index into `VOWELS`/`MATRAS`.
    Vowel(usize),
    /// A consonant glyph carrying the inherent `a`.
    Consonant(&'static str),
    /// A sign that attaches after a syllable (anusvara, visarga, ...).
    Mark(&'static str),
}

const VIRAMA: char = '\u{094D}';

// Independent vowel forms, order: a ā i ī u ū ṛ ṝ ḷ ḹ e ai o au
const VOWELS: [&str; 14] = [
    "अ", "आ", "इ", "ई", "उ", "ऊ", "ऋ", "ॠ", "ऌ", "ॡ", "ए", "ऐ", "ओ", "औ",
];

// Dependent (matra) forms in the same order; inherent `a` has no sign.
const MATRAS: [&str; 14] = [
    "", "ा", "ि", "ी", "ु", "ू", "ृ", "ॄ", "ॢ", "ॣ", "े", "ै", "ो", "ौ",
];

const ANUSVARA: &str = "ं";
const VISARGA: &str = "ः";
const CANDRABINDU: &str = "ँ";
const AVAGRAHA: &str = "ऽ";
const DANDA: &str = "।";
const DOUBLE_DANDA: &str = "॥";

const DIGITS: [(&str, &str); 10] = [
    ("0", "०"),
    ("1", "१"),
    ("2", "२"),
    ("3", "३"),
    ("4", "४"),
    ("5", "५"),
    ("6", "६"),
    ("7", "७"),
    ("8", "८"),
    ("9", "९"),
];

// Consonant glyphs shared by every scheme table, in traditional order:
// velars, palatals, retroflexes, dentals, labials, semivowels, sibilants.
const KA: &str = "क";
const KHA: &str = "ख";
const GA: &str = "ग";
const GHA: &str = "घ";
const NGA: &str = "ङ";
const CA: &str = "च";
const CHA: &str = "छ";
const JA: &str = "ज";
const JHA: &str = "झ";
const NYA: &str = "ञ";
const TTA: &str = "ट";
const TTHA: &str = "ठ";
const DDA: &str = "ड";
const DDHA: &str = "ढ";
const NNA: &str = "ण";
const TA: &str = "त";
const THA: &str = "थ";
const DA: &str = "द";
const DHA: &str = "ध";
const NA: &str = "न";
const PA: &str = "प";
const PHA: &str = "फ";
const BA: &str = "ब";
const BHA: &str = "भ";
const MA: &str = "म";
const YA: &str = "य";
const RA: &str = "र";
const LA: &str = "ल";
const VA: &str = "व";
const SHA: &str = "श";
const SSA: &str = "ष";
const SA: &str = "स";
const HA: &str = "ह";

fn push_common(table: &mut Vec<(&'static str, Sound)>) {
    for (roman, glyph) in DIGITS {
        table.push((roman, Sound::Mark(glyph)));
    }
    table.push(("||", Sound::Mark(DOUBLE_DANDA)));
    table.push(("|", Sound::Mark(DANDA)));
}

fn itrans_table() -> Vec<(&'static str, Sound)> {
    let mut t = vec![
        ("aa", Sound::Vowel(1)),
        ("A", Sound::Vowel(1)),
        ("a", Sound::Vowel(0)),
        ("ii", Sound::Vowel(3)),
        ("I", Sound::Vowel(3)),
        ("i", Sound::Vowel(2)),
        ("uu", Sound::Vowel(5)),
        ("U", Sound::Vowel(5)),
        ("u", Sound::Vowel(4)),
        ("RRi", Sound::Vowel(6)),
        ("R^i", Sound::Vowel(6)),
        ("RRI", Sound::Vowel(7)),
        ("R^I", Sound::Vowel(7)),
        ("LLi", Sound::Vowel(8)),
        ("L^i", Sound::Vowel(8)),
        ("LLI", Sound::Vowel(9)),
        ("L^I", Sound::Vowel(9)),
        ("ai", Sound::Vowel(11)),
        ("au", Sound::Vowel(13)),
        ("e", Sound::Vowel(10)),
        ("o", Sound::Vowel(12)),
        ("kh", Sound::Consonant(KHA)),
        ("k", Sound::Consonant(KA)),
        ("gh", Sound::Consonant(GHA)),
        ("g", Sound::Consonant(GA)),
        ("~N", Sound::Consonant(NGA)),
        ("chh", Sound::Consonant(CHA)),
        ("Ch", Sound::Consonant(CHA)),
        ("ch", Sound::Consonant(CA)),
        ("jh", Sound::Consonant(JHA)),
        ("j", Sound::Consonant(JA)),
        ("~n", Sound::Consonant(NYA)),
        ("Th", Sound::Consonant(TTHA)),
        ("T", Sound::Consonant(TTA)),
        ("Dh", Sound::Consonant(DDHA)),
        ("D", Sound::Consonant(DDA)),
        ("N", Sound::Consonant(NNA)),
        ("th", Sound::Consonant(THA)),
        ("t", Sound::Consonant(TA)),
        ("dh", Sound::Consonant(DHA)),
        ("d", Sound::Consonant(DA)),
        ("n", Sound::Consonant(NA)),
        ("ph", Sound::Consonant(PHA)),
        ("p", Sound::Consonant(PA)),
        ("bh", Sound::Consonant(BHA)),
        ("b", Sound::Consonant(BA)),
        ("m", Sound::Consonant(MA)),
        ("y", Sound::Consonant(YA)),
        ("r", Sound::Consonant(RA)),
        ("l", Sound::Consonant(LA)),
        ("v", Sound::Consonant(VA)),
        ("w", Sound::Consonant(VA)),
        ("shh", Sound::Consonant(SSA)),
        ("Sh", Sound::Consonant(SSA)),
        ("sh", Sound::Consonant(SHA)),
        ("s", Sound::Consonant(SA)),
        ("h", Sound::Consonant(HA)),
        (".m", Sound::Mark(ANUSVARA)),
        (".n", Sound::Mark(ANUSVARA)),
        ("M", Sound::Mark(ANUSVARA)),
        ("H", Sound::Mark(VISARGA)),
        (".N", Sound::Mark(CANDRABINDU)),
        (".a", Sound::Mark(AVAGRAHA)),
    ];
    push_common(&mut t);
    t
}

fn hk_table() -> Vec<(&'static str, Sound)> {
    let mut t = vec![
        ("A", Sound::Vowel(1)),
        ("a", Sound::Vowel(0)),
        ("I", Sound::Vowel(3)),
        ("i", Sound::Vowel(2)),
        ("U", Sound::Vowel(5)),
        ("u", Sound::Vowel(4)),
        ("RR", Sound::Vowel(7)),
        ("R", Sound::Vowel(6)),
        ("lRR", Sound::Vowel(9)),
        ("lR", Sound::Vowel(8)),
        ("ai", Sound::Vowel(11)),
        ("au", Sound::Vowel(13)),
        ("e", Sound::Vowel(10)),
        ("o", Sound::Vowel(12)),
        ("kh", Sound::Consonant(KHA)),
        ("k", Sound::Consonant(KA)),
        ("gh", Sound::Consonant(GHA)),
        ("g", Sound::Consonant(GA)),
        ("G", Sound::Consonant(NGA)),
        ("ch", Sound::Consonant(CHA)),
        ("c", Sound::Consonant(CA)),
        ("jh", Sound::Consonant(JHA)),
        ("j", Sound::Consonant(JA)),
        ("J", Sound::Consonant(NYA)),
        ("Th", Sound::Consonant(TTHA)),
        ("T", Sound::Consonant(TTA)),
        ("Dh", Sound::Consonant(DDHA)),
        ("D", Sound::Consonant(DDA)),
        ("N", Sound::Consonant(NNA)),
        ("th", Sound::Consonant(THA)),
        ("t", Sound::Consonant(TA)),
        ("dh", Sound::Consonant(DHA)),
        ("d", Sound::Consonant(DA)),
        ("n", Sound::Consonant(NA)),
        ("ph", Sound::Consonant(PHA)),
        ("p", Sound::Consonant(PA)),
        ("bh", Sound::Consonant(BHA)),
        ("b", Sound::Consonant(BA)),
        ("m", Sound::Consonant(MA)),
        ("y", Sound::Consonant(YA)),
        ("r", Sound::Consonant(RA)),
        ("l", Sound::Consonant(LA)),
        ("v", Sound::Consonant(VA)),
        ("z", Sound::Consonant(SHA)),
        ("S", Sound::Consonant(SSA)),
        ("s", Sound::Consonant(SA)),
        ("h", Sound::Consonant(HA)),
        ("M", Sound::Mark(ANUSVARA)),
        ("H", Sound::Mark(VISARGA)),
        ("~", Sound::Mark(CANDRABINDU)),
        ("'", Sound::Mark(AVAGRAHA)),
    ];
    push_common(&mut t);
    t
}

fn iast_table() -> Vec<(&'static str, Sound)> {
    let mut t = vec![
        ("ā", Sound::Vowel(1)),
        ("a", Sound::Vowel(0)),
        ("ī", Sound::Vowel(3)),
        ("i", Sound::Vowel(2)),
        ("ū", Sound::Vowel(5)),
        ("u", Sound::Vowel(4)),
        ("ṝ", Sound::Vowel(7)),
        ("ṛ", Sound::Vowel(6)),
        ("ḹ", Sound::Vowel(9)),
        ("ḷ", Sound::Vowel(8)),
        ("ai", Sound::Vowel(11)),
        ("au", Sound::Vowel(13)),
        ("e", Sound::Vowel(10)),
        ("o", Sound::Vowel(12)),
        ("kh", Sound::Consonant(KHA)),
        ("k", Sound::Consonant(KA)),
        ("gh", Sound::Consonant(GHA)),
        ("g", Sound::Consonant(GA)),
        ("ṅ", Sound::Consonant(NGA)),
        ("ch", Sound::Consonant(CHA)),
        ("c", Sound::Consonant(CA)),
        ("jh", Sound::Consonant(JHA)),
        ("j", Sound::Consonant(JA)),
        ("ñ", Sound::Consonant(NYA)),
        ("ṭh", Sound::Consonant(TTHA)),
        ("ṭ", Sound::Consonant(TTA)),
        ("ḍh", Sound::Consonant(DDHA)),
        ("ḍ", Sound::Consonant(DDA)),
        ("ṇ", Sound::Consonant(NNA)),
        ("th", Sound::Consonant(THA)),
        ("t", Sound::Consonant(TA)),
        ("dh", Sound::Consonant(DHA)),
        ("d", Sound::Consonant(DA)),
        ("n", Sound::Consonant(NA)),
        ("ph", Sound::Consonant(PHA)),
        ("p", Sound::Consonant(PA)),
        ("bh", Sound::Consonant(BHA)),
        ("b", Sound::Consonant(BA)),
        ("m", Sound::Consonant(MA)),
        ("y", Sound::Consonant(YA)),
        ("r", Sound::Consonant(RA)),
        ("l", Sound::Consonant(LA)),
        ("v", Sound::Consonant(VA)),
        ("ś", Sound::Consonant(SHA)),
        ("ṣ", Sound::Consonant(SSA)),
        ("s", Sound::Consonant(SA)),
        ("h", Sound::Consonant(HA)),
        ("ṃ", Sound::Mark(ANUSVARA)),
        ("ḥ", Sound::Mark(VISARGA)),
        ("m̐", Sound::Mark(CANDRABINDU)),
        ("'", Sound::Mark(AVAGRAHA)),
    ];
    push_common(&mut t);
    t
}

fn slp1_table() -> Vec<(&'static str, Sound)> {
    let mut t = vec![
        ("A", Sound::Vowel(1)),
        ("a", Sound::Vowel(0)),
        ("I", Sound::Vowel(3)),
        ("i", Sound::Vowel(2)),
        ("U", Sound::Vowel(5)),
        ("u", Sound::Vowel(4)),
        ("f", Sound::Vowel(6)),
        ("F", Sound::Vowel(7)),
        ("x", Sound::Vowel(8)),
        ("X", Sound::Vowel(9)),
        ("e", Sound::Vowel(10)),
        ("E", Sound::Vowel(11)),
        ("o", Sound::Vowel(12)),
        ("O", Sound::Vowel(13)),
        ("k", Sound::Consonant(KA)),
        ("K", Sound::Consonant(KHA)),
        ("g", Sound::Consonant(GA)),
        ("G", Sound::Consonant(GHA)),
        ("N", Sound::Consonant(NGA)),
        ("c", Sound::Consonant(CA)),
        ("C", Sound::Consonant(CHA)),
        ("j", Sound::Consonant(JA)),
        ("J", Sound::Consonant(JHA)),
        ("Y", Sound::Consonant(NYA)),
        ("w", Sound::Consonant(TTA)),
        ("W", Sound::Consonant(TTHA)),
        ("q", Sound::Consonant(DDA)),
        ("Q", Sound::Consonant(DDHA)),
        ("R", Sound::Consonant(NNA)),
        ("t", Sound::Consonant(TA)),
        ("T", Sound::Consonant(THA)),
        ("d", Sound::Consonant(DA)),
        ("D", Sound::Consonant(DHA)),
        ("n", Sound::Consonant(NA)),
        ("p", Sound::Consonant(PA)),
        ("P", Sound::Consonant(PHA)),
        ("b", Sound::Consonant(BA)),
        ("B", Sound::Consonant(BHA)),
        ("m", Sound::Consonant(MA)),
        ("y", Sound::Consonant(YA)),
        ("r", Sound::Consonant(RA)),
        ("l", Sound::Consonant(LA)),
        ("v", Sound::Consonant(VA)),
        ("S", Sound::Consonant(SHA)),
        ("z", Sound::Consonant(SSA)),
        ("s", Sound::Consonant(SA)),
        ("h", Sound::Consonant(HA)),
        ("M", Sound::Mark(ANUSVARA)),
        ("H", Sound::Mark(VISARGA)),
        ("~", Sound::Mark(CANDRABINDU)),
        ("'", Sound::Mark(AVAGRAHA)),
    ];
    push_common(&mut t);
    t
}

fn velthuis_table() -> Vec<(&'static str, Sound)> {
    let mut t = vec![
        ("aa", Sound::Vowel(1)),
        ("a", Sound::Vowel(0)),
        ("ii", Sound::Vowel(3)),
        ("i", Sound::Vowel(2)),
        ("uu", Sound::Vowel(5)),
        ("u", Sound::Vowel(4)),
        (".rr", Sound::Vowel(7)),
        (".r", Sound::Vowel(6)),
        (".ll", Sound::Vowel(9)),
        (".l", Sound::Vowel(8)),
        ("ai", Sound::Vowel(11)),
        ("au", Sound::Vowel(13)),
        ("e", Sound::Vowel(10)),
        ("o", Sound::Vowel(12)),
        ("kh", Sound::Consonant(KHA)),
        ("k", Sound::Consonant(KA)),
        ("gh", Sound::Consonant(GHA)),
        ("g", Sound::Consonant(GA)),
        ("\"n", Sound::Consonant(NGA)),
        ("ch", Sound::Consonant(CHA)),
        ("c", Sound::Consonant(CA)),
        ("jh", Sound::Consonant(JHA)),
        ("j", Sound::Consonant(JA)),
        ("~n", Sound::Consonant(NYA)),
        (".th", Sound::Consonant(TTHA)),
        (".t", Sound::Consonant(TTA)),
        (".dh", Sound::Consonant(DDHA)),
        (".d", Sound::Consonant(DDA)),
        (".n", Sound::Consonant(NNA)),
        ("th", Sound::Consonant(THA)),
        ("t", Sound::Consonant(TA)),
        ("dh", Sound::Consonant(DHA)),
        ("d", Sound::Consonant(DA)),
        ("n", Sound::Consonant(NA)),
        ("ph", Sound::Consonant(PHA)),
        ("p", Sound::Consonant(PA)),
        ("bh", Sound::Consonant(BHA)),
        ("b", Sound::Consonant(BA)),
        ("m", Sound::Consonant(MA)),
        ("y", Sound::Consonant(YA)),
        ("r", Sound::Consonant(RA)),
        ("l", Sound::Consonant(LA)),
        ("v", Sound::Consonant(VA)),
        ("\"s", Sound::Consonant(SHA)),
        (".s", Sound::Consonant(SSA)),
        ("s", Sound::Consonant(SA)),
        ("h", Sound::Consonant(HA)),
        (".m", Sound::Mark(ANUSVARA)),
        (".h", Sound::Mark(VISARGA)),
        ("/", Sound::Mark(CANDRABINDU)),
        (".a", Sound::Mark(AVAGRAHA)),
    ];
    push_common(&mut t);
    t
}

fn wx_table() -> Vec<(&'static str, Sound)> {
    let mut t = vec![
        ("A", Sound::Vowel(1)),
        ("a", Sound::Vowel(0)),
        ("I", Sound::Vowel(3)),
        ("i", Sound::Vowel(2)),
        ("U", Sound::Vowel(5)),
        ("u", Sound::Vowel(4)),
        ("q", Sound::Vowel(6)),
        ("Q", Sound::Vowel(7)),
        ("e", Sound::Vowel(10)),
        ("E", Sound::Vowel(11)),
        ("o", Sound::Vowel(12)),
        ("O", Sound::Vowel(13)),
        ("k", Sound::Consonant(KA)),
        ("K", Sound::Consonant(KHA)),
        ("g", Sound::Consonant(GA)),
        ("G", Sound::Consonant(GHA)),
        ("f", Sound::Consonant(NGA)),
        ("c", Sound::Consonant(CA)),
        ("C", Sound::Consonant(CHA)),
        ("j", Sound::Consonant(JA)),
        ("J", Sound::Consonant(JHA)),
        ("F", Sound::Consonant(NYA)),
        ("t", Sound::Consonant(TTA)),
        ("T", Sound::Consonant(TTHA)),
        ("d", Sound::Consonant(DDA)),
        ("D", Sound::Consonant(DDHA)),
        ("N", Sound::Consonant(NNA)),
        ("w", Sound::Consonant(TA)),
        ("W", Sound::Consonant(THA)),
        ("x", Sound::Consonant(DA)),
        ("X", Sound::Consonant(DHA)),
        ("n", Sound::Consonant(NA)),
        ("p", Sound::Consonant(PA)),
        ("P", Sound::Consonant(PHA)),
        ("b", Sound::Consonant(BA)),
        ("B", Sound::Consonant(BHA)),
        ("m", Sound::Consonant(MA)),
        ("y", Sound::Consonant(YA)),
        ("r", Sound::Consonant(RA)),
        ("l", Sound::Consonant(LA)),
        ("v", Sound::Consonant(VA)),
        ("S", Sound::Consonant(SHA)),
        ("R", Sound::Consonant(SSA)),
        ("s", Sound::Consonant(SA)),
        ("h", Sound::Consonant(HA)),
        ("M", Sound::Mark(ANUSVARA)),
        ("H", Sound::Mark(VISARGA)),
        ("z", Sound::Mark(CANDRABINDU)),
    ];
    push_common(&mut t);
    t
}

fn scheme_table(scheme: Scheme) -> Vec<(&'static str, Sound)> {
    let mut table = match scheme {
        Scheme::Itrans => itrans_table(),
        Scheme::Hk => hk_table(),
        Scheme::Iast => iast_table(),
        Scheme::Slp1 => slp1_table(),
        Scheme::Velthuis => velthuis_table(),
        Scheme::Wx => wx_table(),
    };
    // Longest-match tokenization relies on this ordering.
    table.sort_by(|a, b| b.0.len().cmp(&a.0.len()));
    table
}

/// True if the text contains any Devanagari code points.
pub fn is_devanagari(text: &str) -> bool {
    text.chars().any(|c| ('\u{0900}'..='\u{097F}').contains(&c))
}

/// Guess the romanization scheme of an input.
///
/// IAST is unmistakable from its diacritics, and Velthuis from its dotted
/// consonant markers. Everything else defaults to ITRANS, which is also the
/// fallback the CLI `--scheme` flag can override.
pub fn detect_scheme(text: &str) -> Scheme {
    const IAST_MARKS: &str = "āīūṛṝḷḹṅñṭḍṇśṣṃḥ";
    if text.chars().any(|c| IAST_MARKS.contains(c)) {
        return Scheme::Iast;
    }
    let velthuis_marker = text.as_bytes().windows(2).any(|w| {
        w[0] == b'.' && matches!(w[1], b't' | b'd' | b'n' | b'r' | b'm' | b'h' | b's' | b'l')
    });
    if velthuis_marker || text.contains("\"s") || text.contains("\"n") {
        return Scheme::Velthuis;
    }
    Scheme::Itrans
}

/// Convert romanized Sanskrit text into Devanagari.
///
/// Unknown characters (whitespace, punctuation, existing Devanagari) pass
/// through unchanged. A consonant not followed by a vowel keeps its virama,
/// so `rAm` becomes `राम्` and clusters join as expected.
pub fn to_devanagari(input: &str, scheme: Scheme) -> String {
    let table = scheme_table(scheme);
    let mut out = String::with_capacity(input.len());
    let mut pending_consonant = false;
    let mut i = 0;

    while i < input.len() {
        let rest = &input[i..];
        let matched = table.iter().find(|(tok, _)| rest.starts_with(tok));

        match matched {
            Some((tok, Sound::Vowel(v))) => {
                if pending_consonant {
                    out.push_str(MATRAS[*v]);
                    pending_consonant = false;
                } else {
                    out.push_str(VOWELS[*v]);
                }
                i += tok.len();
            }
            Some((tok, Sound::Consonant(glyph))) => {
                if pending_consonant {
                    out.push(VIRAMA);
                }
                out.push_str(glyph);
                pending_consonant = true;
                i += tok.len();
            }
            Some((tok, Sound::Mark(glyph))) => {
                if pending_consonant {
                    out.push(VIRAMA);
                    pending_consonant = false;
                }
                out.push_str(glyph);
                i += tok.len();
            }
            None => {
                let ch = rest.chars().next().expect("non-empty remainder");
                if pending_consonant {
                    out.push(VIRAMA);
                    pending_consonant = false;
                }
                out.push(ch);
                i += ch.len_utf8();
            }
        }
    }

    if pending_consonant {
        out.push(VIRAMA);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_iast_basic() {
        assert_eq!(to_devanagari("namaste", Scheme::Iast), "नमस्ते");
        assert_eq!(to_devanagari("bhagavadgītā", Scheme::Iast), "भगवद्गीता");
        assert_eq!(to_devanagari("kṛṣṇa", Scheme::Iast), "कृष्ण");
    }

    #[test]
    fn test_hk_anusvara_and_cluster() {
        assert_eq!(to_devanagari("saMskRtam", Scheme::Hk), "संस्कृतम्");
        assert_eq!(to_devanagari("zAntiH", Scheme::Hk), "शान्तिः");
    }

    #[test]
    fn test_itrans_verse_fragment() {
        assert_eq!(
            to_devanagari("dharmakShetre kurukShetre", Scheme::Itrans),
            "धर्मक्षेत्रे कुरुक्षेत्रे"
        );
        assert_eq!(to_devanagari("rAm", Scheme::Itrans), "राम्");
        assert_eq!(to_devanagari("rAma", Scheme::Itrans), "राम");
    }

    #[test]
    fn test_slp1_aspirates() {
        assert_eq!(to_devanagari("Darma", Scheme::Slp1), "धर्म");
        assert_eq!(to_devanagari("yogaH", Scheme::Slp1), "योगः");
    }

    #[test]
    fn test_velthuis_retroflex() {
        assert_eq!(to_devanagari("k.r.s.na", Scheme::Velthuis), "कृष्ण");
        assert_eq!(to_devanagari("\"saanti.h", Scheme::Velthuis), "शान्तिः");
    }

    #[test]
    fn test_wx_dentals_vs_retroflex() {
        assert_eq!(to_devanagari("Barawa", Scheme::Wx), "भरत");
        assert_eq!(to_devanagari("wawwvam", Scheme::Wx), "तत्त्वम्");
    }

    #[test]
    fn test_digits_and_danda() {
        assert_eq!(to_devanagari("108", Scheme::Itrans), "१०८");
        assert_eq!(to_devanagari("namaH ||", Scheme::Hk), "नमः ॥");
        assert_eq!(to_devanagari("namaH |", Scheme::Hk), "नमः ।");
    }

    #[test]
    fn test_passthrough() {
        assert_eq!(to_devanagari("", Scheme::Itrans), "");
        assert_eq!(to_devanagari("धर्म", Scheme::Iast), "धर्म");
        assert_eq!(to_devanagari("(om)", Scheme::Hk), "(ओम्)");
    }

    #[test]
    fn test_scheme_fallback() {
        assert_eq!(Scheme::parse_or_default("slp1"), Scheme::Slp1);
        assert_eq!(Scheme::parse_or_default("not-a-scheme"), Scheme::Itrans);
        assert_eq!(Scheme::parse_or_default(""), Scheme::Itrans);
    }

    #[test]
    fn test_detect_scheme() {
        assert_eq!(detect_scheme("bhagavadgītā"), Scheme::Iast);
        assert_eq!(detect_scheme("k.r.s.na"), Scheme::Velthuis);
        assert_eq!(detect_scheme("dharmakShetre"), Scheme::Itrans);
    }

    #[test]
    fn test_is_devanagari() {
        assert!(is_devanagari("धर्म"));
        assert!(!is_devanagari("dharma"));
    }
}
