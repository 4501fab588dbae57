//! Enhancement styles and instruction framing.

use std::fmt;
use std::str::FromStr;

/// How the provider is asked to rewrite a prompt.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Style {
    Concise,
    Detailed,
    Creative,
    Technical,
    #[default]
    Balanced,
}

impl Style {
    pub const ALL: [Style; 5] = [
        Style::Concise,
        Style::Detailed,
        Style::Creative,
        Style::Technical,
        Style::Balanced,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Style::Concise => "concise",
            Style::Detailed => "detailed",
            Style::Creative => "creative",
            Style::Technical => "technical",
            Style::Balanced => "balanced",
        }
    }

    /// The instruction placed in front of the original prompt.
    pub fn instruction(&self) -> &'static str {
        match self {
            Style::Concise => {
                "Make this prompt more concise and direct while maintaining clarity:"
            }
            Style::Detailed => "Expand this prompt with more specific details and context:",
            Style::Creative => "Enhance this prompt to be more creative and imaginative:",
            Style::Technical => "Make this prompt more technical and precise:",
            Style::Balanced => {
                "Optimize this prompt for clarity, specificity, and effectiveness:"
            }
        }
    }

    /// Comma-separated list of accepted style keys.
    pub fn accepted() -> String {
        Style::ALL
            .iter()
            .map(Style::as_str)
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl fmt::Display for Style {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Style {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Style::ALL
            .into_iter()
            .find(|style| style.as_str() == s)
            .ok_or_else(|| format!("unknown style '{}'", s))
    }
}

/// Frame `original` for the provider using `style`.
pub fn build_instruction(style: Style, original: &str) -> String {
    format!(
        "{}\n\nOriginal Prompt:\n{}\n\nEnhanced Prompt (respond with only the enhanced prompt, no explanations):",
        style.instruction(),
        original
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_style_keys() {
        assert_eq!("technical".parse::<Style>(), Ok(Style::Technical));
        assert!("poetic".parse::<Style>().is_err());
        assert_eq!(Style::default(), Style::Balanced);
    }

    #[test]
    fn test_build_instruction() {
        let instruction = build_instruction(Style::Concise, "Tell me about cats");
        assert!(instruction.starts_with(Style::Concise.instruction()));
        assert!(instruction.contains("\n\nOriginal Prompt:\nTell me about cats\n\n"));
        assert!(instruction.ends_with("no explanations):"));
    }

    #[test]
    fn test_every_style_has_distinct_instruction() {
        let instructions: std::collections::HashSet<_> =
            Style::ALL.iter().map(Style::instruction).collect();
        assert_eq!(instructions.len(), Style::ALL.len());
    }
}
