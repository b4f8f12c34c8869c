use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClassifyError {
    #[error("classifier unavailable: {0}")]
    Unavailable(String),
}

/// Spam classifier behind the prediction endpoint.
///
/// The trait abstracts the model backend so the HTTP layer and tests do not
/// care whether predictions come from a remote model service or a local
/// stand-in.
#[async_trait]
pub trait Classifier: Send + Sync + 'static {
    /// Classify one message, returning the result label (`spam` / `ham`).
    async fn classify(&self, message: &str) -> Result<String, ClassifyError>;
}

/// Keyword-lookup classifier used as the default backend.
pub struct LexiconClassifier {
    spam_terms: Vec<&'static str>,
}

impl LexiconClassifier {
    pub fn new() -> Self {
        Self {
            spam_terms: vec![
                "free", "winner", "prize", "urgent", "claim", "lottery", "congratulations",
            ],
        }
    }
}

impl Default for LexiconClassifier {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Classifier for LexiconClassifier {
    async fn classify(&self, message: &str) -> Result<String, ClassifyError> {
        let lowered = message.to_lowercase();
        let result = if self.spam_terms.iter().any(|term| lowered.contains(term)) {
            "spam"
        } else {
            "ham"
        };
        Ok(result.to_string())
    }
}
