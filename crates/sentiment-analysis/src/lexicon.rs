//! Weighted finance lexicon used by the keyword tier.

const NEGATION_WORDS: &[&str] = &[
    "not", "no", "never", "don't", "doesn't", "didn't", "isn't", "aren't",
    "wasn't", "weren't", "won't", "wouldn't", "couldn't", "shouldn't", "hardly",
    "barely", "neither", "nor", "without", "fails", "failed",
];

const NEGATION_WINDOW: usize = 3;

/// Bullish terms and their weights. Phrases are matched on word boundaries.
const BULLISH: &[(&str, f64)] = &[
    // Strong
    ("rally", 3.0), ("rallies", 3.0), ("rallied", 3.0),
    ("surge", 3.0), ("surges", 3.0), ("surged", 3.0), ("soar", 3.0), ("soars", 3.0),
    ("breakout", 3.0), ("bull market", 3.0), ("record high", 3.0), ("all-time high", 3.0),
    ("earnings beat", 3.0), ("beats estimates", 3.0), ("rate cut", 2.5), ("rate cuts", 2.5),
    // Moderate
    ("bullish", 2.0), ("upgrade", 2.0), ("upgraded", 2.0), ("outperform", 2.0),
    ("recovery", 2.0), ("rebound", 2.0), ("rebounds", 2.0), ("jumps", 2.0), ("jumped", 2.0),
    ("climb", 2.0), ("climbs", 2.0), ("gains", 2.0), ("momentum", 2.0),
    ("revenue growth", 2.0), ("buyback", 2.0), ("stimulus", 2.0), ("uptrend", 2.0),
    // Mild
    ("gain", 1.0), ("rise", 1.0), ("rises", 1.0), ("rose", 1.0), ("advance", 1.0),
    ("advances", 1.0), ("higher", 1.0), ("strong", 1.0), ("positive", 1.0),
    ("optimistic", 1.0), ("optimism", 1.0), ("growth", 1.0), ("profit", 1.0),
    ("expansion", 1.0), ("dividend", 1.0), ("boost", 1.0), ("upbeat", 1.0),
    ("buying", 1.0), ("robust", 1.0), ("tailwind", 1.0),
];

/// Bearish terms and their weights.
const BEARISH: &[(&str, f64)] = &[
    // Strong
    ("crash", 3.0), ("crashes", 3.0), ("plunge", 3.0), ("plunges", 3.0), ("plunged", 3.0),
    ("recession", 3.0), ("crisis", 3.0), ("bankruptcy", 3.0), ("bear market", 3.0),
    ("earnings miss", 3.0), ("misses estimates", 3.0), ("sell-off", 3.0), ("selloff", 3.0),
    ("collapse", 3.0), ("rate hike", 2.5), ("rate hikes", 2.5),
    // Moderate
    ("bearish", 2.0), ("downgrade", 2.0), ("downgraded", 2.0), ("underperform", 2.0),
    ("slump", 2.0), ("slumps", 2.0), ("tumble", 2.0), ("tumbles", 2.0), ("sinks", 2.0),
    ("layoffs", 2.0), ("default", 2.0), ("downtrend", 2.0), ("contraction", 2.0),
    ("revenue decline", 2.0), ("tariffs", 2.0), ("inflation", 2.0),
    // Mild
    ("fall", 1.0), ("falls", 1.0), ("fell", 1.0), ("drop", 1.0), ("drops", 1.0),
    ("decline", 1.0), ("declines", 1.0), ("lower", 1.0), ("weak", 1.0), ("weakness", 1.0),
    ("negative", 1.0), ("pessimistic", 1.0), ("loss", 1.0), ("losses", 1.0),
    ("concern", 1.0), ("concerns", 1.0), ("fear", 1.0), ("fears", 1.0), ("risk", 1.0),
    ("selling", 1.0), ("headwind", 1.0), ("uncertainty", 1.0), ("volatility", 1.0),
];

/// Macro and market-wide topics that make a headline set worth more weight.
const HIGH_IMPACT: &[&str] = &[
    "federal reserve", "fed", "fomc", "inflation", "cpi", "interest rates", "gdp",
    "unemployment", "earnings", "guidance", "forecast", "outlook", "economic data",
    "trade war", "geopolitical", "oil prices", "cryptocurrency", "nasdaq", "dow jones",
    "sp 500", "s&p 500",
];

struct Entry {
    tokens: Vec<&'static str>,
    weight: f64,
    bullish: bool,
}

/// Bullish and bearish weight found in one text.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct LexiconHits {
    pub bullish: f64,
    pub bearish: f64,
}

impl LexiconHits {
    /// `(bull - bear) / (bull + bear)`, 0 when nothing matched.
    pub fn score(&self) -> f64 {
        let total = self.bullish + self.bearish;
        if total <= 0.0 {
            return 0.0;
        }
        ((self.bullish - self.bearish) / total).clamp(-1.0, 1.0)
    }
}

pub struct KeywordLexicon {
    /// Longest phrases first so "bull market" wins over any single-word entry.
    entries: Vec<Entry>,
    high_impact: Vec<Vec<&'static str>>,
}

impl Default for KeywordLexicon {
    fn default() -> Self {
        Self::new()
    }
}

impl KeywordLexicon {
    pub fn new() -> Self {
        let mut entries: Vec<Entry> = BULLISH
            .iter()
            .map(|&(phrase, weight)| (phrase, weight, true))
            .chain(BEARISH.iter().map(|&(phrase, weight)| (phrase, weight, false)))
            .map(|(phrase, weight, bullish)| Entry {
                tokens: phrase.split_whitespace().collect(),
                weight,
                bullish,
            })
            .collect();
        entries.sort_by(|a, b| b.tokens.len().cmp(&a.tokens.len()));

        let mut high_impact: Vec<Vec<&'static str>> =
            HIGH_IMPACT.iter().map(|&phrase| tokenize(phrase)).collect();
        high_impact.dedup();

        Self { entries, high_impact }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Per-headline score in [-1, 1].
    pub fn score(&self, text: &str) -> f64 {
        self.hits(text).score()
    }

    pub fn hits(&self, text: &str) -> LexiconHits {
        let lower = text.to_lowercase();
        let words = tokenize(&lower);

        let negation_positions: Vec<usize> = words
            .iter()
            .enumerate()
            .filter(|(_, w)| NEGATION_WORDS.contains(*w))
            .map(|(i, _)| i)
            .collect();

        let mut hits = LexiconHits::default();
        let mut i = 0;
        while i < words.len() {
            let Some(entry) = self.match_at(&words, i) else {
                i += 1;
                continue;
            };

            // A negation up to NEGATION_WINDOW words before the phrase flips it
            let negated = negation_positions
                .iter()
                .any(|&neg| neg < i && (i - neg) <= NEGATION_WINDOW);

            if entry.bullish != negated {
                hits.bullish += entry.weight;
            } else {
                hits.bearish += entry.weight;
            }
            i += entry.tokens.len();
        }
        hits
    }

    /// Number of distinct high-impact topics mentioned in `text`.
    pub fn high_impact_count(&self, text: &str) -> usize {
        let lower = text.to_lowercase();
        let words = tokenize(&lower);
        self.high_impact
            .iter()
            .filter(|phrase| words.windows(phrase.len()).any(|w| w == &phrase[..]))
            .count()
    }

    fn match_at(&self, words: &[&str], start: usize) -> Option<&Entry> {
        self.entries.iter().find(|entry| {
            let end = start + entry.tokens.len();
            end <= words.len() && words[start..end] == entry.tokens[..]
        })
    }
}

/// Split on whitespace and punctuation, keeping hyphens and apostrophes inside words.
fn tokenize(text: &str) -> Vec<&str> {
    text.split(|c: char| !(c.is_alphanumeric() || c == '-' || c == '\''))
        .map(|w| w.trim_matches(|c: char| c == '-' || c == '\''))
        .filter(|w| !w.is_empty())
        .collect()
}
