//! Provider routing with automatic failover

use super::{GroqClient, HuggingFaceClient, LanguageModel, LlmRequest};
use crate::error::LlmError;
use tracing::{info, warn};

/// Keywords that steer a request toward the secondary backend (larger
/// output budget, code-tuned model available)
const CODE_INTENT_KEYWORDS: &[&str] = &[
    "map",
    "coordinates",
    "visualization",
    "plot",
    "geojson",
    "plotly",
];

/// Rough token estimate: words × 1.3. Exactness is not required; this only
/// feeds the routing heuristic.
pub fn estimate_tokens(text: &str) -> usize {
    let words = text.split_whitespace().count();
    ((words as f64) * 1.3).max(1.0) as usize
}

/// Routes requests between the two provider backends
pub struct MultiLlmGateway {
    primary: GroqClient,
    secondary: HuggingFaceClient,
}

impl MultiLlmGateway {
    pub fn new(primary: GroqClient, secondary: HuggingFaceClient) -> Self {
        Self { primary, secondary }
    }

    /// Secondary-first when the request smells like code/visualization
    /// output or would blow the primary's token cap.
    fn prefer_secondary(&self, request: &LlmRequest) -> bool {
        if request.use_code_model {
            return true;
        }
        let text = request.full_text().to_lowercase();
        if CODE_INTENT_KEYWORDS.iter().any(|kw| text.contains(kw)) {
            return true;
        }
        estimate_tokens(&text) > self.primary.hard_token_limit()
    }
}

#[async_trait::async_trait]
impl LanguageModel for MultiLlmGateway {
    async fn generate(&self, request: &LlmRequest) -> Result<String, LlmError> {
        let estimated = estimate_tokens(&request.full_text());
        let secondary_first = self.prefer_secondary(request);

        let (first, second) = if secondary_first {
            ("huggingface", "groq")
        } else {
            ("groq", "huggingface")
        };

        let first_result = if secondary_first {
            self.secondary.complete(request).await
        } else {
            self.primary.complete(request).await
        };

        match first_result {
            Ok(text) => {
                info!(provider = first, estimated_tokens = estimated, "LLM provider used");
                return Ok(text);
            }
            Err(e) => {
                warn!(provider = first, error = %e, "LLM provider failed, trying fallback provider");
            }
        }

        let second_result = if secondary_first {
            self.primary.complete(request).await
        } else {
            self.secondary.complete(request).await
        };

        match second_result {
            Ok(text) => {
                info!(
                    provider = second,
                    estimated_tokens = estimated,
                    fallback = true,
                    "LLM provider used"
                );
                Ok(text)
            }
            Err(e) => Err(LlmError::AllProvidersFailed(e.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_estimate_tokens() {
        assert_eq!(estimate_tokens(""), 1);
        assert_eq!(estimate_tokens("one two three four"), 5); // 4 * 1.3 = 5.2
    }

    #[test]
    fn test_code_keywords_cover_visualization_intent() {
        for kw in ["geojson", "plot", "map"] {
            assert!(CODE_INTENT_KEYWORDS.contains(&kw));
        }
    }
}
