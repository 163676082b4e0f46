use std::sync::Arc;

use piggyback_common::ClassificationDecision;
use tracing::warn;

use crate::traits::RelevanceLlm;

/// Appended to the configured match prompt so the model explains itself in
/// a parseable two-line shape.
const REASON_SUFFIX: &str = "After your yes/no decision, provide a brief reason (1 sentence) for your decision. Format: 'yes' or 'no', then reason on next line.";

const DECISION_MAX_TOKENS: u32 = 80;
const REPLY_MAX_TOKENS: u32 = 120;

/// Prompt-template name recorded alongside every decision.
const MATCH_PROMPT_NAME: &str = "match_prompt";

/// Wraps the completion call with decision parsing and total error
/// handling: a model failure becomes a negative decision, never an `Err`.
pub struct RelevanceClassifier {
    llm: Arc<dyn RelevanceLlm>,
}

impl RelevanceClassifier {
    pub fn new(llm: Arc<dyn RelevanceLlm>) -> Self {
        Self { llm }
    }

    /// Decide whether one post matches the configured interest prompt.
    pub async fn classify(&self, match_prompt: &str, post_text: &str) -> ClassificationDecision {
        let enhanced = format!("{match_prompt}\n\n{REASON_SUFFIX}");
        match self
            .llm
            .complete(&enhanced, post_text, DECISION_MAX_TOKENS)
            .await
        {
            Ok(reply) => parse_decision(&reply),
            Err(e) => {
                warn!(error = %e, "LLM decision call failed");
                ClassificationDecision {
                    decision: false,
                    decision_text: "error".to_string(),
                    reason: format!("Error getting LLM decision: {e}"),
                    prompt_used: MATCH_PROMPT_NAME.to_string(),
                }
            }
        }
    }

    /// Draft a short reply for a matched post. Failures degrade to a fixed
    /// placeholder so one flaky call cannot sink the run.
    pub async fn suggest_reply(&self, reply_prompt: &str, post_text: &str) -> String {
        match self
            .llm
            .complete(reply_prompt, post_text, REPLY_MAX_TOKENS)
            .await
        {
            Ok(reply) => reply.trim().to_string(),
            Err(e) => {
                warn!(error = %e, "Reply suggestion call failed");
                "No recommendation generated.".to_string()
            }
        }
    }
}

/// The first line carries the yes/no; everything after the first newline is
/// the reason. A "yes" anywhere in the first line counts as a match.
fn parse_decision(reply: &str) -> ClassificationDecision {
    let trimmed = reply.trim();
    let (first_line, rest) = match trimmed.split_once('\n') {
        Some((first, rest)) => (first, Some(rest)),
        None => (trimmed, None),
    };
    let decision = first_line.to_lowercase().contains("yes");
    let reason = rest
        .map(|r| r.trim().to_string())
        .filter(|r| !r.is_empty())
        .unwrap_or_else(|| "No reason provided".to_string());

    ClassificationDecision {
        decision,
        decision_text: if decision { "yes" } else { "no" }.to_string(),
        reason,
        prompt_used: MATCH_PROMPT_NAME.to_string(),
    }
}
