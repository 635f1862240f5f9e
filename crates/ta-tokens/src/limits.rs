//! Per-model request and token rates

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModelLimits {
    /// Requests per minute
    pub rpm: u32,
    /// Tokens per minute, also the default prompt budget
    pub tpm: usize,
}

const DEFAULT: ModelLimits = ModelLimits { rpm: 10, tpm: 8_000 };

const KNOWN: &[(&str, ModelLimits)] = &[
    ("gpt-4o-mini", ModelLimits { rpm: 500, tpm: 200_000 }),
    ("gpt-3.5-turbo", ModelLimits { rpm: 3_500, tpm: 90_000 }),
    ("gpt-4", ModelLimits { rpm: 10, tpm: 10_000 }),
    ("claude-3-5-sonnet", ModelLimits { rpm: 50, tpm: 40_000 }),
];

/// Limits for `model`, matching dated variants by prefix
/// (`claude-3-5-sonnet-20241022`)
pub fn limits_for(model: &str) -> ModelLimits {
    KNOWN
        .iter()
        .find(|(name, _)| model == *name)
        .or_else(|| {
            KNOWN
                .iter()
                .filter(|(name, _)| model.starts_with(&format!("{name}-")))
                .max_by_key(|(name, _)| name.len())
        })
        .map_or(DEFAULT, |(_, limits)| *limits)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_models() {
        assert_eq!(limits_for("gpt-4o-mini").tpm, 200_000);
        assert_eq!(limits_for("gpt-4").tpm, 10_000);
        assert_eq!(limits_for("claude-3-5-sonnet-20241022").rpm, 50);
        assert_eq!(limits_for("gpt-3.5-turbo-0125").tpm, 90_000);
    }

    #[test]
    fn test_unknown_model_defaults() {
        assert_eq!(limits_for("mistral-large"), DEFAULT);
        // "gpt-4o" is not "gpt-4" with a suffix
        assert_eq!(limits_for("gpt-4o"), DEFAULT);
    }
}
