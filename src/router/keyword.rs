// Keyword classifier
//
// Pure substring scoring against a hand-curated keyword table. No I/O and
// no failure path: this is the last line of defense behind the semantic layer.

use super::decision::Route;

const FAQ_KEYWORDS: &[&str] = &[
    "return",
    "policy",
    "payment",
    "delivery",
    "refund",
    "discount",
    "warranty",
    "track",
    "order",
    "emi",
    "installation",
    "exchange",
    "flipkart",
    "plus",
    "invoice",
    "gift",
    "card",
    "damaged",
    "counterfeit",
    "cash",
    "cod",
    "pincode",
    "open-box",
    "international",
    "promo",
    "code",
    "defective",
    "hdfc",
    "credit",
];

const PRODUCT_SEARCH_KEYWORDS: &[&str] = &[
    "shoes",
    "nike",
    "adidas",
    "puma",
    "reebok",
    "price",
    "buy",
    "show",
    "size",
    "formal",
    "running",
    "sneakers",
    "rating",
    "sale",
    "women",
    "men",
    "kids",
    "black",
    "white",
    "pink",
    "sports",
    "bestselling",
    "discount",
    "under",
    "below",
    "above",
    "between",
    "top",
    "sort",
];

const SMALL_TALK_KEYWORDS: &[&str] = &[
    "hi",
    "hello",
    "hey",
    "how are you",
    "what is your name",
    "name",
    "robot",
    "what are you",
    "what do you do",
    "who made you",
    "tell me about yourself",
    "what can you do",
    "can you help",
    "thanks",
    "thank you",
    "bye",
    "goodbye",
    "human",
];

/// Route → trigger substrings. Entries are stored lower-cased and
/// de-duplicated per route; overlap between routes is allowed.
#[derive(Debug, Clone)]
pub struct KeywordTable {
    entries: Vec<(Route, Vec<String>)>,
}

impl KeywordTable {
    pub fn builtin() -> Self {
        Self::new(vec![
            (Route::Faq, FAQ_KEYWORDS.to_vec()),
            (Route::ProductSearch, PRODUCT_SEARCH_KEYWORDS.to_vec()),
            (Route::SmallTalk, SMALL_TALK_KEYWORDS.to_vec()),
        ])
    }

    pub fn new(entries: Vec<(Route, Vec<&str>)>) -> Self {
        let mut table: Vec<(Route, Vec<String>)> = Vec::new();

        for (route, keywords) in entries {
            let idx = match table.iter().position(|(r, _)| *r == route) {
                Some(idx) => idx,
                None => {
                    table.push((route, Vec::new()));
                    table.len() - 1
                }
            };

            let slot = &mut table[idx].1;
            for keyword in keywords {
                let keyword = keyword.trim().to_lowercase();
                if !keyword.is_empty() && !slot.contains(&keyword) {
                    slot.push(keyword);
                }
            }
        }

        Self { entries: table }
    }

    pub fn keywords_for(&self, route: Route) -> &[String] {
        self.entries
            .iter()
            .find(|(r, _)| *r == route)
            .map(|(_, k)| k.as_slice())
            .unwrap_or(&[])
    }
}

impl Default for KeywordTable {
    fn default() -> Self {
        Self::builtin()
    }
}

/// What settled a keyword classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeywordBasis {
    /// At least one keyword matched
    Matched,
    /// Nothing matched but the query contains a digit
    DigitHeuristic,
    /// Nothing matched at all
    Default,
}

/// Keyword classification with the scores behind it.
#[derive(Debug, Clone)]
pub struct KeywordDecision {
    pub route: Route,
    pub basis: KeywordBasis,
    /// Hit count per route, in `Route::PRIORITY` order
    pub hits: Vec<(Route, usize)>,
    /// Keywords of the winning route found in the query
    pub matched: Vec<String>,
}

impl KeywordDecision {
    pub fn hits_for(&self, route: Route) -> usize {
        self.hits
            .iter()
            .find(|(r, _)| *r == route)
            .map(|(_, n)| *n)
            .unwrap_or(0)
    }
}

pub struct KeywordClassifier {
    table: KeywordTable,
}

impl KeywordClassifier {
    pub fn new(table: KeywordTable) -> Self {
        Self { table }
    }

    pub fn builtin() -> Self {
        Self::new(KeywordTable::builtin())
    }

    pub fn table(&self) -> &KeywordTable {
        &self.table
    }

    /// Classify a query. Always returns a route.
    pub fn classify(&self, query: &str) -> Route {
        self.decide(query).route
    }

    /// Classify a query and report how the route was chosen.
    pub fn decide(&self, query: &str) -> KeywordDecision {
        let normalized = query.trim().to_lowercase();

        let hits: Vec<(Route, usize)> = Route::PRIORITY
            .iter()
            .map(|route| {
                let count = self
                    .table
                    .keywords_for(*route)
                    .iter()
                    .filter(|kw| normalized.contains(kw.as_str()))
                    .count();
                (*route, count)
            })
            .collect();

        // PRIORITY order plus strict `>` keeps the higher-priority route on ties
        let mut best: Option<(Route, usize)> = None;
        for (route, count) in &hits {
            if *count > best.map(|(_, c)| c).unwrap_or(0) {
                best = Some((*route, *count));
            }
        }

        let (route, basis) = match best {
            Some((route, _)) => (route, KeywordBasis::Matched),
            None if query.chars().any(|c| c.is_ascii_digit()) => {
                (Route::ProductSearch, KeywordBasis::DigitHeuristic)
            }
            None => (Route::SmallTalk, KeywordBasis::Default),
        };

        let matched = if basis == KeywordBasis::Matched {
            self.table
                .keywords_for(route)
                .iter()
                .filter(|kw| normalized.contains(kw.as_str()))
                .cloned()
                .collect()
        } else {
            Vec::new()
        };

        tracing::debug!(
            "Keyword hits {:?} -> {} ({:?}, matched: {:?})",
            hits,
            route,
            basis,
            matched
        );

        KeywordDecision {
            route,
            basis,
            hits,
            matched,
        }
    }
}

impl Default for KeywordClassifier {
    fn default() -> Self {
        Self::builtin()
    }
}
