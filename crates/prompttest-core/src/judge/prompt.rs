use crate::model::{Message, Role};

/// Fixed internal grading prompt: present the criteria and the response,
/// request a last-line verdict the parser understands.
pub(crate) fn build_grading_prompt(criteria: &str, response: &str) -> Vec<Message> {
    let text = format!(
        "You are an expert evaluator. Your task is to determine if the following AI-generated response strictly adheres to the given criteria.\n\
         \n\
         **Criteria:**\n\
         {criteria}\n\
         \n\
         **Response to Evaluate:**\n\
         {response}\n\
         \n\
         Analyze the response against the criteria.\n\
         Your final verdict must be on the last line, in the format:\n\
         `EVALUATION: (PASS|FAIL) - <brief, one-sentence justification>`\n\
         For example: `EVALUATION: PASS - The response correctly identified the user's premium status.`\n\
         Another example: `EVALUATION: FAIL - The response was defensive and did not adopt an empathetic tone.`"
    );
    vec![Message::new(Role::User, text)]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grading_prompt_embeds_criteria_and_response_verbatim() {
        let messages = build_grading_prompt("Must be polite.", "Hello there!");
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].role, Role::User);
        assert!(messages[0].content.contains("**Criteria:**\nMust be polite."));
        assert!(messages[0]
            .content
            .contains("**Response to Evaluate:**\nHello there!"));
        assert!(messages[0].content.contains("EVALUATION: (PASS|FAIL)"));
    }
}
