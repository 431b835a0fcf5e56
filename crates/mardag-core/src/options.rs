//! Conversion options.

/// `__generated_with` stamp used when no marimo version is known.
pub const FALLBACK_MARIMO_VERSION: &str = "0.0.0";

/// Caller-supplied settings for one conversion.
///
/// The core never inspects the environment; callers that want the installed
/// marimo version detect it themselves and pass it in.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConvertOptions {
    /// marimo version recorded in generated notebooks.
    pub generated_with: Option<String>,
}

impl ConvertOptions {
    pub fn with_generated_with(mut self, version: impl Into<String>) -> Self {
        self.generated_with = Some(version.into());
        self
    }

    /// Version to stamp, falling back to [`FALLBACK_MARIMO_VERSION`].
    pub fn marimo_version(&self) -> &str {
        self.generated_with
            .as_deref()
            .filter(|v| !v.trim().is_empty())
            .unwrap_or(FALLBACK_MARIMO_VERSION)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fallback_version() {
        assert_eq!(ConvertOptions::default().marimo_version(), "0.0.0");
        assert_eq!(
            ConvertOptions::default().with_generated_with("").marimo_version(),
            "0.0.0"
        );
        assert_eq!(
            ConvertOptions::default()
                .with_generated_with("0.10.2")
                .marimo_version(),
            "0.10.2"
        );
    }
}
