use crate::{AgentError, Role, Session, DEFAULT_CONTEXT_MESSAGES};

/// Builds the user-turn instruction for each pipeline stage from the session so far
pub struct StagePrompts;

impl StagePrompts {
    /// Build the instruction for `role` given the current session.
    pub fn build(role: Role, session: &Session) -> Result<String, AgentError> {
        let query = session
            .query()
            .ok_or(AgentError::MissingContext("user query"))?;

        match role {
            Role::Retriever => Ok(Self::retrieval_prompt(query)),
            Role::Synthesizer => {
                let retrieved = session
                    .latest(Role::Retriever)
                    .ok_or(AgentError::MissingContext("retrieved information"))?;

                // A critique on record means this is the refinement pass
                match (session.latest(Role::Critic), session.latest(Role::Synthesizer)) {
                    (Some(critique), Some(draft)) => Ok(Self::refinement_prompt(
                        query,
                        retrieved.content(),
                        draft.content(),
                        critique.content(),
                    )),
                    _ => Ok(Self::synthesis_prompt(query, retrieved.content())),
                }
            }
            Role::Critic => {
                let draft = session
                    .latest(Role::Synthesizer)
                    .ok_or(AgentError::MissingContext("synthesized response"))?;
                // On the refinement pass the critic also sees how the answer got here
                let history = (session.count(Role::Critic) > 0)
                    .then(|| session.conversation_context(DEFAULT_CONTEXT_MESSAGES));
                Ok(Self::critique_prompt(query, draft.content(), history.as_deref()))
            }
            Role::User => Err(AgentError::UnsupportedRole(role)),
        }
    }

    pub fn retrieval_prompt(query: &str) -> String {
        format!(
            r#"Given the query: "{query}"

Provide relevant information that would help answer this query.
Focus on facts, definitions, and key concepts.
If you don't have specific information, provide general context."#
        )
    }

    pub fn synthesis_prompt(query: &str, retrieved: &str) -> String {
        format!(
            r#"Original query: "{query}"

Retrieved information:
{retrieved}

Please synthesize this information into a clear, comprehensive answer.
Ensure the response is well-structured and directly addresses the query."#,
            retrieved = truncate_output(retrieved, 8000),
        )
    }

    pub fn refinement_prompt(query: &str, retrieved: &str, draft: &str, critique: &str) -> String {
        format!(
            r#"Original query: "{query}"

Retrieved information:
{retrieved}

## Previous Draft
{draft}

## Critique
{critique}

Rewrite the answer so that it addresses every issue raised in the critique.
Keep what was correct, fix what was wrong, and fill any gaps.
Respond with the improved answer only."#,
            retrieved = truncate_output(retrieved, 6000),
            draft = truncate_output(draft, 6000),
            critique = truncate_output(critique, 4000),
        )
    }

    pub fn critique_prompt(query: &str, response: &str, history: Option<&str>) -> String {
        let history = match history {
            Some(history) => format!(
                "This is a revised answer. Check whether it resolves the earlier critique.\n\n{}\n",
                truncate_output(history, 8000)
            ),
            None => String::new(),
        };
        format!(
            r#"Original query: "{query}"

{history}Response to evaluate:
{response}

Please evaluate this response for:
1. Accuracy and factual correctness
2. Completeness in addressing the query
3. Clarity and coherence
4. Any potential hallucinations or unsupported claims

Start your reply with the line:
Score: N/10
where N is an integer from 1 (unusable) to 10 (excellent).

Then provide:
- Specific issues found
- Suggested improvements"#,
            response = truncate_output(response, 8000),
        )
    }
}

/// Cut `output` to at most `max_len` bytes, preferring a line boundary
pub fn truncate_output(output: &str, max_len: usize) -> &str {
    if output.len() <= max_len {
        return output;
    }

    let mut end = max_len;
    while !output.is_char_boundary(end) {
        end -= 1;
    }

    match output[..end].rfind('\n') {
        Some(pos) if pos > 0 => &output[..pos],
        _ => &output[..end],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Message, Score};

    fn session_with(messages: Vec<Message>) -> Session {
        let mut session = Session::new("What is quantum computing?");
        for m in messages {
            session.push(m);
        }
        session
    }

    #[test]
    fn test_retriever_prompt_contains_query() {
        let session = session_with(vec![]);
        let prompt = StagePrompts::build(Role::Retriever, &session).unwrap();
        assert!(prompt.contains("\"What is quantum computing?\""));
    }

    #[test]
    fn test_synthesizer_requires_retrieval() {
        let session = session_with(vec![]);
        let err = StagePrompts::build(Role::Synthesizer, &session).unwrap_err();
        assert!(matches!(err, AgentError::MissingContext(_)));
    }

    #[test]
    fn test_first_synthesis_vs_refinement() {
        let mut session = session_with(vec![Message::new(Role::Retriever, "qubits, superposition")]);
        let first = StagePrompts::build(Role::Synthesizer, &session).unwrap();
        assert!(first.contains("qubits, superposition"));
        assert!(!first.contains("Critique"));

        session.push(Message::new(Role::Synthesizer, "draft answer"));
        session.push(Message::critique("Score: 5/10\nToo vague", Score::new(5).unwrap()));

        let refined = StagePrompts::build(Role::Synthesizer, &session).unwrap();
        assert!(refined.contains("## Previous Draft\ndraft answer"));
        assert!(refined.contains("Too vague"));
    }

    #[test]
    fn test_critic_uses_latest_draft() {
        let session = session_with(vec![
            Message::new(Role::Retriever, "facts"),
            Message::new(Role::Synthesizer, "old draft"),
            Message::critique("Score: 4/10", Score::new(4).unwrap()),
            Message::new(Role::Synthesizer, "new draft"),
        ]);
        let prompt = StagePrompts::build(Role::Critic, &session).unwrap();
        let (history, evaluated) = prompt.split_once("Response to evaluate:").unwrap();

        assert!(evaluated.contains("new draft"));
        assert!(!evaluated.contains("old draft"));
        assert!(evaluated.contains("Score: N/10"));
        // The revised answer is reviewed with the earlier exchange in view
        assert!(history.contains("revised answer"));
        assert!(history.contains("[synthesizer]: old draft"));
        assert!(history.contains("[critic]: Score: 4/10"));
    }

    #[test]
    fn test_first_critique_has_no_history() {
        let session = session_with(vec![
            Message::new(Role::Retriever, "facts"),
            Message::new(Role::Synthesizer, "draft"),
        ]);
        let prompt = StagePrompts::build(Role::Critic, &session).unwrap();
        assert!(!prompt.contains("Previous conversation"));
        assert!(!prompt.contains("revised answer"));
    }

    #[test]
    fn test_user_role_unsupported() {
        let session = session_with(vec![]);
        assert!(matches!(
            StagePrompts::build(Role::User, &session),
            Err(AgentError::UnsupportedRole(Role::User))
        ));
    }

    #[test]
    fn test_truncate_output() {
        assert_eq!(truncate_output("short", 100), "short");
        assert_eq!(truncate_output("line one\nline two", 12), "line one");
        assert_eq!(truncate_output("abcdef", 3), "abc");
        // never splits a multi-byte character
        assert_eq!(truncate_output("ééé", 3), "é");
    }
}
