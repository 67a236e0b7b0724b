#![forbid(unsafe_code)]

use std::sync::Arc;

/// Model families the estimator recognizes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ModelFamily {
    OpenAi,
    Anthropic,
    Generic,
}

impl ModelFamily {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::OpenAi => "openai",
            Self::Anthropic => "anthropic",
            Self::Generic => "generic",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "openai" => Some(Self::OpenAi),
            "anthropic" => Some(Self::Anthropic),
            "generic" => Some(Self::Generic),
            _ => None,
        }
    }
}

impl Default for ModelFamily {
    fn default() -> Self {
        Self::Generic
    }
}

type CountFn = Arc<dyn Fn(&str) -> usize + Send + Sync>;

/// Token counting capability. Exact per-family encoders are installed at
/// construction when available; everything else uses the word/punctuation
/// heuristic. Estimation is pure and called many times per bundle.
#[derive(Clone)]
pub struct TokenEstimator {
    default_family: ModelFamily,
    openai: Option<CountFn>,
    anthropic: Option<CountFn>,
}

impl std::fmt::Debug for TokenEstimator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenEstimator")
            .field("default_family", &self.default_family)
            .field("openai_backend", &self.openai.is_some())
            .field("anthropic_backend", &self.anthropic.is_some())
            .finish()
    }
}

impl TokenEstimator {
    pub fn new(default_family: ModelFamily) -> Self {
        Self {
            default_family,
            openai: None,
            anthropic: None,
        }
    }

    pub fn default_family(&self) -> ModelFamily {
        self.default_family
    }

    /// Install an exact counting backend for a family. `Generic` never takes
    /// a backend; it is the heuristic by definition.
    pub fn with_backend(
        mut self,
        family: ModelFamily,
        count: impl Fn(&str) -> usize + Send + Sync + 'static,
    ) -> Self {
        let count: CountFn = Arc::new(count);
        match family {
            ModelFamily::OpenAi => self.openai = Some(count),
            ModelFamily::Anthropic => self.anthropic = Some(count),
            ModelFamily::Generic => {}
        }
        self
    }

    pub fn estimate(&self, text: &str, family: ModelFamily) -> usize {
        let backend = match family {
            ModelFamily::OpenAi => self.openai.as_ref(),
            ModelFamily::Anthropic => self.anthropic.as_ref(),
            ModelFamily::Generic => None,
        };
        match backend {
            Some(count) => count(text).max(1),
            None => heuristic_estimate(text),
        }
    }

    pub fn estimate_default(&self, text: &str) -> usize {
        self.estimate(text, self.default_family)
    }
}

/// `max(1, ceil(words*1.25 + punctuation*0.5 + non_ascii*0.5))` where words
/// are maximal non-whitespace runs.
pub fn heuristic_estimate(text: &str) -> usize {
    let words = text.split_whitespace().count() as f64;
    let mut punctuation = 0usize;
    let mut non_ascii = 0usize;
    for ch in text.chars() {
        if matches!(
            ch,
            '.' | ',' | ';' | ':' | '!' | '?' | '(' | ')' | '[' | ']' | '{' | '}' | '"' | '\''
                | '`'
        ) {
            punctuation += 1;
        }
        if !ch.is_ascii() {
            non_ascii += 1;
        }
    }
    let raw = words * 1.25 + punctuation as f64 * 0.5 + non_ascii as f64 * 0.5;
    (raw.ceil() as usize).max(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn heuristic_minimum_is_one() {
        assert_eq!(heuristic_estimate(""), 1);
        assert_eq!(heuristic_estimate("   "), 1);
    }

    #[test]
    fn heuristic_counts_words_punctuation_non_ascii() {
        // 2 words * 1.25 = 2.5, 1 punct * 0.5 = 0.5 -> ceil(3.0) = 3
        assert_eq!(heuristic_estimate("hello world."), 3);
        // 1 word * 1.25 + 2 non-ascii * 0.5 -> ceil(2.25) = 3
        assert_eq!(heuristic_estimate("héllö"), 3);
        // backtick counts as punctuation
        assert_eq!(heuristic_estimate("`x`"), 3);
    }

    #[test]
    fn backend_is_used_when_installed() {
        let est = TokenEstimator::new(ModelFamily::OpenAi)
            .with_backend(ModelFamily::OpenAi, |text| text.len() / 4);
        assert_eq!(est.estimate("aaaaaaaa", ModelFamily::OpenAi), 2);
        // Other families still fall back to the heuristic.
        assert_eq!(
            est.estimate("aaaaaaaa", ModelFamily::Anthropic),
            heuristic_estimate("aaaaaaaa")
        );
    }

    #[test]
    fn backend_never_reports_zero() {
        let est = TokenEstimator::new(ModelFamily::OpenAi)
            .with_backend(ModelFamily::OpenAi, |_| 0);
        assert_eq!(est.estimate("", ModelFamily::OpenAi), 1);
    }
}
