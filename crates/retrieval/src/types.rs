//! Passage and topic type definitions.

use serde::{Deserialize, Serialize};

/// Closed set of topic labels.
///
/// Dynamic topic strings in the index are parsed into this enum so that a
/// typo cannot silently propagate as a new "topic". Unrecognized labels map
/// to `Unknown`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Topic {
    General,
    Eligibility,
    Registration,
    Funding,
    Tax,
    WomenEntrepreneurs,
    OffTopic,
    Unknown,
}

impl Topic {
    /// Parse a topic label from its stored string form.
    pub fn parse(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "general" => Self::General,
            "eligibility" => Self::Eligibility,
            "registration" => Self::Registration,
            "funding" => Self::Funding,
            "tax" | "tax_benefits" => Self::Tax,
            "women_entrepreneurs" => Self::WomenEntrepreneurs,
            "off_topic" => Self::OffTopic,
            _ => Self::Unknown,
        }
    }

    /// The canonical label string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::General => "general",
            Self::Eligibility => "eligibility",
            Self::Registration => "registration",
            Self::Funding => "funding",
            Self::Tax => "tax",
            Self::WomenEntrepreneurs => "women_entrepreneurs",
            Self::OffTopic => "off_topic",
            Self::Unknown => "unknown",
        }
    }

    /// Whether this label names a concrete policy area.
    ///
    /// Only specific topics participate in retrieval boosting; General,
    /// OffTopic and Unknown carry no re-ranking signal.
    pub fn is_specific(&self) -> bool {
        !matches!(self, Self::General | Self::OffTopic | Self::Unknown)
    }
}

impl std::fmt::Display for Topic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A passage stored in the vector index.
///
/// Owned by the index; the pipeline only reads copies returned by retrieval.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Passage {
    /// Unique passage identifier
    pub id: String,

    /// Source document title (e.g., "Startup India Initiative")
    pub title: String,

    /// Source URL, if the passage came from a public page
    pub url: Option<String>,

    /// Topic tag assigned by the indexer
    pub topic: Topic,

    /// Text content
    pub text: String,

    /// Embedding vector (normalized)
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub embedding: Vec<f32>,
}

/// A passage returned by retrieval, with its distance to the query.
///
/// Ephemeral: created per query, discarded after response assembly.
#[derive(Debug, Clone)]
pub struct RetrievedPassage {
    pub passage: Passage,

    /// Dissimilarity to the query embedding; lower means more similar.
    /// Never negative.
    pub distance: f32,
}

impl RetrievedPassage {
    /// Similarity in [0, 1], derived from distance.
    pub fn similarity(&self) -> f32 {
        (1.0 - self.distance).clamp(0.0, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_topic_parse_roundtrip() {
        for topic in [
            Topic::General,
            Topic::Eligibility,
            Topic::Registration,
            Topic::Funding,
            Topic::Tax,
            Topic::WomenEntrepreneurs,
            Topic::OffTopic,
            Topic::Unknown,
        ] {
            assert_eq!(Topic::parse(topic.as_str()), topic);
        }
    }

    #[test]
    fn test_topic_parse_legacy_label() {
        // The original index used "tax_benefits"
        assert_eq!(Topic::parse("tax_benefits"), Topic::Tax);
    }

    #[test]
    fn test_topic_parse_unrecognized() {
        assert_eq!(Topic::parse("fundnig"), Topic::Unknown);
        assert_eq!(Topic::parse(""), Topic::Unknown);
    }

    #[test]
    fn test_topic_specificity() {
        assert!(Topic::Funding.is_specific());
        assert!(Topic::WomenEntrepreneurs.is_specific());
        assert!(!Topic::General.is_specific());
        assert!(!Topic::OffTopic.is_specific());
        assert!(!Topic::Unknown.is_specific());
    }

    #[test]
    fn test_similarity_clamped() {
        let passage = Passage {
            id: "p1".to_string(),
            title: "Test".to_string(),
            url: None,
            topic: Topic::General,
            text: "text".to_string(),
            embedding: vec![],
        };

        let close = RetrievedPassage {
            passage: passage.clone(),
            distance: 0.1,
        };
        assert!((close.similarity() - 0.9).abs() < 1e-6);

        let far = RetrievedPassage {
            passage,
            distance: 1.7,
        };
        assert_eq!(far.similarity(), 0.0);
    }
}
