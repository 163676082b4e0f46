use std::collections::HashMap;

const DEFAULT_MATCH_PROMPT: &str = "You are a professional liquid fund investor, please see if this content has the similar information as the \"content provided\" or is related to an industry, token analysis that would help investment. Respond with \"yes\" or \"no\".";

const DEFAULT_REPLY_PROMPT: &str = "You craft concise, human replies for a professional liquid fund account. Read the user's post and propose a short, friendly reply that adds value, acknowledges the topic, and avoids hype. Use relevant domain knowledge if helpful. Keep it under 100 words (aim for brevity). Do not include placeholders or ask for more info. Return only the reply text.";

/// The decision prompt and the reply-drafting prompt for a run.
///
/// Defaults are compiled in; a prompts worksheet with `name` / `prompt`
/// columns can override either one. A run never fails for lack of prompts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptSet {
    pub match_prompt: String,
    pub reply_prompt: String,
}

impl Default for PromptSet {
    fn default() -> Self {
        Self {
            match_prompt: DEFAULT_MATCH_PROMPT.to_string(),
            reply_prompt: DEFAULT_REPLY_PROMPT.to_string(),
        }
    }
}

impl PromptSet {
    /// Apply worksheet overrides. Rows with a blank name or blank prompt are
    /// skipped; unrecognized names are ignored. Later rows win.
    pub fn with_overrides(mut self, records: &[HashMap<String, String>]) -> Self {
        for record in records {
            let name = record.get("name").map(|s| s.trim()).unwrap_or_default();
            let prompt = record.get("prompt").map(|s| s.trim()).unwrap_or_default();
            if name.is_empty() || prompt.is_empty() {
                continue;
            }
            match name {
                "match_prompt" => self.match_prompt = prompt.to_string(),
                "reply_prompt" => self.reply_prompt = prompt.to_string(),
                _ => {}
            }
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(name: &str, prompt: &str) -> HashMap<String, String> {
        [
            ("name".to_string(), name.to_string()),
            ("prompt".to_string(), prompt.to_string()),
        ]
        .into_iter()
        .collect()
    }

    #[test]
    fn defaults_ask_for_a_yes_no_answer() {
        let prompts = PromptSet::default();
        assert!(prompts.match_prompt.contains("\"yes\" or \"no\""));
        assert!(!prompts.reply_prompt.is_empty());
    }

    #[test]
    fn worksheet_rows_override_matching_names() {
        let prompts = PromptSet::default().with_overrides(&[
            record("match_prompt", "Is this about rust? yes or no."),
            record("reply_prompt", "Write a reply."),
        ]);
        assert_eq!(prompts.match_prompt, "Is this about rust? yes or no.");
        assert_eq!(prompts.reply_prompt, "Write a reply.");
    }

    #[test]
    fn blank_and_unknown_rows_keep_defaults() {
        let prompts = PromptSet::default().with_overrides(&[
            record("match_prompt", ""),
            record("", "orphan prompt"),
            record("other_prompt", "ignored"),
        ]);
        assert_eq!(prompts, PromptSet::default());
    }

    #[test]
    fn later_rows_win_over_earlier_ones() {
        let prompts = PromptSet::default().with_overrides(&[
            record("match_prompt", "first"),
            record("match_prompt", "second"),
        ]);
        assert_eq!(prompts.match_prompt, "second");
    }
}
