//! Payload builders for the main role's two turns: drafting the candidate
//! answer from research, and the final rewrite after critique.

use super::critic::CriticVerdict;
use super::research::ResearchRecord;

const ASSEMBLE_GUIDELINES: &str = "\
Using the structured research JSON below, assemble a clear, concise answer to the user's question.
Guidelines:
- Write a direct explanatory response (not pros/cons/checklists) unless the question explicitly asks for them.
- Keep it clear and focused.
- Add bracketed citation IDs like [S1], [S2] right after specific claims, using the 'citations' list if present, or map from 'sources'.
- No planner JSON, no tool logs, no meta.";

const FINAL_INSTRUCTIONS: &str = "\
Produce the final user-facing answer. Apply critic fixes. Include explicit bracketed citations [Sx] for factual claims.
Do NOT reprint planner JSON or tool-call logs. Avoid checklists unless the question asks for steps.";

/// Task text for the candidate draft
pub fn assemble_payload(research: &ResearchRecord) -> Result<String, serde_json::Error> {
    let research_json = serde_json::to_string_pretty(research)?;
    Ok(format!(
        "{}\n\nRESEARCH_JSON:\n{}",
        ASSEMBLE_GUIDELINES, research_json
    ))
}

/// Task text for the final answer
pub fn final_payload(
    candidate: &str,
    critic: &CriticVerdict,
    research: &ResearchRecord,
) -> Result<String, serde_json::Error> {
    let critic_json = serde_json::to_string_pretty(critic)?;
    let summary_json = serde_json::to_string_pretty(&research.summary())?;
    Ok(format!(
        "{}\n\nCandidate:\n{}\n\nCritic (parsed):\n{}\n\nResearch (summary):\n{}",
        FINAL_INSTRUCTIONS, candidate, critic_json, summary_json
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_assemble_payload_embeds_research() {
        let research = ResearchRecord::fallback("ARC-AGI measures skill acquisition");
        let payload = assemble_payload(&research).unwrap();
        assert!(payload.starts_with("Using the structured research JSON below"));
        assert!(payload.contains("\n- No planner JSON, no tool logs, no meta.\n\nRESEARCH_JSON:\n{"));
        assert!(payload.contains("\"answer\": \"arc-agi measures skill acquisition\""));
    }

    #[test]
    fn test_final_payload_sections_in_order() {
        let research = ResearchRecord::fallback("short");
        let critic = CriticVerdict::fallback("bad");
        let payload = final_payload("Candidate text", &critic, &research).unwrap();

        let candidate = payload.find("Candidate:\nCandidate text").unwrap();
        let critic_at = payload.find("Critic (parsed):\n{").unwrap();
        let summary = payload.find("Research (summary):\n{").unwrap();
        assert!(candidate < critic_at && critic_at < summary);
        assert!(payload.contains("\"verdict\": \"REVISE\""));
        assert!(payload.contains("\"top_sources\": []"));
    }
}
