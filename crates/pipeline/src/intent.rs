//! Query preprocessing and intent classification.
//!
//! Assigns a coarse topic label and a query kind from lexical signals.
//! Deterministic and side-effect-free: the same text always yields the same
//! labels, and absence of signal degrades to `Unknown` rather than an error.

use sahayak_retrieval::Topic;
use serde::Serialize;
use std::collections::BTreeMap;

/// Keyword tables per specific topic, in tie-break priority order.
///
/// Domain-specific tables come before generic signals; when two topics score
/// equally, the earlier table wins.
const TOPIC_KEYWORDS: &[(Topic, &[&str])] = &[
    (
        Topic::Eligibility,
        &[
            "eligibility",
            "eligible",
            "criteria",
            "qualify",
            "qualification",
            "who can",
        ],
    ),
    (
        Topic::Registration,
        &[
            "register",
            "registration",
            "apply",
            "application",
            "recognition",
            "dpiit",
            "incorporate",
        ],
    ),
    (
        Topic::Funding,
        &[
            "funding",
            "fund",
            "grant",
            "scheme",
            "financial",
            "investment",
            "loan",
            "seed fund",
            "venture capital",
            "money",
        ],
    ),
    (
        Topic::Tax,
        &[
            "tax",
            "exemption",
            "deduction",
            "income tax",
            "relief",
            "80-iac",
        ],
    ),
    (
        Topic::WomenEntrepreneurs,
        &["women", "woman", "female", "mahila"],
    ),
];

/// Generic in-domain signals. These only distinguish General from Unknown;
/// they never outrank a specific topic.
const DOMAIN_KEYWORDS: &[&str] = &[
    "startup",
    "startup india",
    "business",
    "company",
    "enterprise",
    "entrepreneur",
    "incubator",
    "policy",
    "benefit",
];

/// Signals that the query is clearly outside the policy domain.
const OFF_TOPIC_KEYWORDS: &[&str] = &[
    "weather",
    "cricket",
    "movie",
    "film",
    "recipe",
    "song",
    "football",
    "joke",
    "horoscope",
];

/// Conversational prefixes stripped before classification and embedding.
const QUERY_PREFIXES: &[&str] = &[
    "can you",
    "could you",
    "please",
    "tell me",
    "what is",
    "what are",
    "how to",
    "how do",
    "how can",
    "i want to know",
    "i need to know",
    "i am looking for",
];

/// The kind of answer a query is asking for. Drives prompt specialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryKind {
    Definition,
    Process,
    Criteria,
    Listing,
    General,
}

impl QueryKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Definition => "definition",
            Self::Process => "process",
            Self::Criteria => "criteria",
            Self::Listing => "listing",
            Self::General => "general",
        }
    }
}

/// Classification output with the per-topic keyword hit counts behind it.
#[derive(Debug, Clone)]
pub struct IntentSignal {
    pub topic: Topic,
    pub scores: BTreeMap<String, usize>,
}

/// Normalize whitespace and strip conversational prefixes.
///
/// "Can you tell me about funding?" → "about funding?"
pub fn preprocess(query: &str) -> String {
    let mut text = query.split_whitespace().collect::<Vec<_>>().join(" ");

    // Prefixes stack ("can you please tell me..."), so strip repeatedly
    loop {
        let lower = text.to_lowercase();
        let mut stripped = false;

        for prefix in QUERY_PREFIXES {
            // Byte offsets line up only when lowercasing didn't resize;
            // the boundary check keeps non-ASCII text safe
            if lower.starts_with(prefix) && text.is_char_boundary(prefix.len()) {
                let rest = text[prefix.len()..].trim_start();
                // Only treat it as a prefix when something follows
                if !rest.is_empty() {
                    text = rest.to_string();
                    stripped = true;
                    break;
                }
            }
        }

        if !stripped {
            break;
        }
    }

    text.trim().to_string()
}

/// Classify a query into a topic label.
///
/// Contract: deterministic, never errors. Ties resolve by the fixed table
/// order; no specific match falls through to General (in-domain wording) or
/// OffTopic (clearly foreign wording), and otherwise Unknown.
pub fn classify(query: &str) -> Topic {
    classify_with_scores(query).topic
}

/// Classify and expose the per-topic scores (for debug output).
pub fn classify_with_scores(query: &str) -> IntentSignal {
    let lower = query.to_lowercase();

    let mut scores = BTreeMap::new();
    let mut best: Option<(Topic, usize)> = None;

    for (topic, keywords) in TOPIC_KEYWORDS {
        let score = keywords.iter().filter(|kw| lower.contains(*kw)).count();
        if score > 0 {
            scores.insert(topic.as_str().to_string(), score);
            // Strictly greater, so the earlier table wins ties
            if best.map_or(true, |(_, s)| score > s) {
                best = Some((*topic, score));
            }
        }
    }

    let topic = if let Some((topic, _)) = best {
        topic
    } else if DOMAIN_KEYWORDS.iter().any(|kw| lower.contains(kw)) {
        Topic::General
    } else if OFF_TOPIC_KEYWORDS.iter().any(|kw| lower.contains(kw)) {
        Topic::OffTopic
    } else {
        Topic::Unknown
    };

    IntentSignal { topic, scores }
}

/// Detect the query kind from the raw (untrimmed-of-prefixes) text.
///
/// Runs on the original wording because preprocessing strips exactly the
/// interrogatives ("what is", "how to") this detection keys on.
pub fn detect_kind(query: &str) -> QueryKind {
    let lower = query.to_lowercase();

    let contains_any = |words: &[&str]| words.iter().any(|w| lower.contains(w));

    if contains_any(&["what", "definition", "meaning", "explain"]) {
        QueryKind::Definition
    } else if contains_any(&["how", "process", "step", "procedure"]) {
        QueryKind::Process
    } else if contains_any(&["eligibility", "criteria", "qualify", "who can"]) {
        QueryKind::Criteria
    } else if contains_any(&["list", "types", "options", "available"]) {
        QueryKind::Listing
    } else {
        QueryKind::General
    }
}
