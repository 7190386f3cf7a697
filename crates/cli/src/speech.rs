use regex::Regex;

/// Strips text down to what a speech synthesizer should read aloud.
#[derive(Debug, Clone)]
pub struct SpeechCleaner {
    asides: Regex,
    markdown: Regex,
    list_markers: Regex,
    whitespace: Regex,
}

impl SpeechCleaner {
    pub fn new() -> Result<Self, regex::Error> {
        Ok(Self {
            asides: Regex::new(r"\s*\([^)]*\)")?,
            markdown: Regex::new(r"[*_`#]")?,
            list_markers: Regex::new(r"(?m)^\s*[\d.\-*]+\s*")?,
            whitespace: Regex::new(r"\s+")?,
        })
    }

    /// Drops parenthesised asides, markdown markers, and per-line list
    /// numbering, spells out the rupee sign, and collapses whitespace.
    pub fn clean_for_speech(&self, text: &str) -> String {
        let text = self.asides.replace_all(text, "");
        let text = self.markdown.replace_all(&text, "");
        let text = self.list_markers.replace_all(&text, "");
        let text = text.replace('₹', "rupees");
        self.whitespace.replace_all(&text, " ").trim().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::SpeechCleaner;

    #[test]
    fn markdown_report_reads_as_plain_sentence() {
        let cleaner = SpeechCleaner::new().expect("patterns compile");
        let report = "**Weather for Pune:**\n- Condition: Light Rain (drizzle)\n- Temperature: 24°C\n1. Sell at ₹1000";

        assert_eq!(
            cleaner.clean_for_speech(report),
            "Weather for Pune: Condition: Light Rain Temperature: 24°C Sell at rupees1000"
        );
    }

    #[test]
    fn blank_or_markup_only_text_cleans_to_empty() {
        let cleaner = SpeechCleaner::new().expect("patterns compile");
        assert_eq!(cleaner.clean_for_speech("  ## \n * "), "");
    }
}
