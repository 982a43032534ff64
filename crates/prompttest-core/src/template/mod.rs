use crate::errors::RunError;
use crate::model::{Message, Role};
use lazy_static::lazy_static;
use regex::Regex;
use std::collections::BTreeMap;

lazy_static! {
    static ref SECTION_RE: Regex = Regex::new(r"^---\[([A-Za-z]+)\]---\s*$").expect("section regex");
    static ref PLACEHOLDER_RE: Regex =
        Regex::new(r"\{([A-Za-z_][A-Za-z0-9_]*)\}").expect("placeholder regex");
}

/// A parsed prompt template: ordered role-tagged sections with `{name}`
/// placeholders. Immutable once parsed; unknown section tags are rejected
/// here, at load time, never at render time.
#[derive(Debug, Clone)]
pub struct PromptTemplate {
    sections: Vec<(Role, String)>,
}

impl PromptTemplate {
    /// Parse a template file. Text before the first `---[ROLE]---` marker
    /// belongs to an implicit user section; whitespace-only sections are
    /// dropped.
    pub fn parse(source: &str, path: &str) -> Result<Self, RunError> {
        let mut sections: Vec<(Role, String)> = Vec::new();
        let mut role = Role::User;
        let mut buf: Vec<&str> = Vec::new();

        let flush = |role: Role, buf: &mut Vec<&str>, sections: &mut Vec<(Role, String)>| {
            let text = buf.join("\n");
            let text = text.trim();
            if !text.is_empty() {
                sections.push((role, text.to_string()));
            }
            buf.clear();
        };

        for line in source.lines() {
            if let Some(caps) = SECTION_RE.captures(line) {
                let tag = &caps[1];
                let next = match tag.to_ascii_uppercase().as_str() {
                    "SYSTEM" => Role::System,
                    "USER" => Role::User,
                    "ASSISTANT" => Role::Assistant,
                    _ => return Err(RunError::malformed_template(tag, path)),
                };
                flush(role, &mut buf, &mut sections);
                role = next;
            } else {
                buf.push(line);
            }
        }
        flush(role, &mut buf, &mut sections);

        Ok(Self { sections })
    }

    /// Distinct placeholder names in section order.
    pub fn placeholders(&self) -> Vec<String> {
        let mut seen = Vec::new();
        for (_, text) in &self.sections {
            for caps in PLACEHOLDER_RE.captures_iter(text) {
                let name = caps[1].to_string();
                if !seen.contains(&name) {
                    seen.push(name);
                }
            }
        }
        seen
    }

    /// Substitute inputs into every section. Substitution is textual and
    /// exact-match on `{name}` tokens; inserted values are not rescanned.
    /// Fails with `MissingVariable` naming the first unresolved placeholder.
    pub fn render(&self, inputs: &BTreeMap<String, String>) -> Result<Vec<Message>, RunError> {
        for name in self.placeholders() {
            if !inputs.contains_key(&name) {
                return Err(RunError::missing_variable(name));
            }
        }

        let messages = self
            .sections
            .iter()
            .map(|(role, text)| {
                let content = PLACEHOLDER_RE.replace_all(text, |caps: &regex::Captures<'_>| {
                    inputs[&caps[1]].clone()
                });
                Message::new(*role, content.into_owned())
            })
            .collect();
        Ok(messages)
    }
}

/// Flatten rendered messages into one text block for reporting and cache
/// keys. Single-section prompts flatten to their bare content.
pub fn flatten_messages(messages: &[Message]) -> String {
    if let [only] = messages {
        return only.content.clone();
    }
    messages
        .iter()
        .map(|m| format!("[{}]\n{}", m.role.as_str(), m.content))
        .collect::<Vec<_>>()
        .join("\n\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::RunErrorKind;

    fn inputs(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn renders_system_section_with_inputs() {
        let t = PromptTemplate::parse("---[SYSTEM]---\nHello {name}", "greeting.txt").unwrap();
        let messages = t.render(&inputs(&[("name", "Jane")])).unwrap();
        assert_eq!(messages, vec![Message::new(Role::System, "Hello Jane")]);
    }

    #[test]
    fn missing_input_names_the_placeholder() {
        let t = PromptTemplate::parse("---[SYSTEM]---\nHello {name}", "greeting.txt").unwrap();
        let err = t.render(&BTreeMap::new()).unwrap_err();
        assert_eq!(err.kind, RunErrorKind::MissingVariable);
        assert_eq!(err.detail.as_deref(), Some("name"));
    }

    #[test]
    fn unknown_section_tag_is_rejected_at_parse_time() {
        let err = PromptTemplate::parse("---[TOOL]---\nhi", "bad.txt").unwrap_err();
        assert_eq!(err.kind, RunErrorKind::MalformedTemplate);
        assert!(err.message.contains("TOOL"));
        assert_eq!(err.path.as_deref(), Some("bad.txt"));
    }

    #[test]
    fn file_without_markers_is_a_single_user_section() {
        let t = PromptTemplate::parse("Summarize: {text}", "plain.txt").unwrap();
        let messages = t.render(&inputs(&[("text", "the memo")])).unwrap();
        assert_eq!(messages, vec![Message::new(Role::User, "Summarize: the memo")]);
    }

    #[test]
    fn covering_inputs_leave_no_placeholder_tokens() {
        let source = "---[SYSTEM]---\nYou help {customer_name}.\n---[USER]---\n{customer_name} ({plan}) asks:\n{message}";
        let t = PromptTemplate::parse(source, "support.txt").unwrap();
        assert_eq!(t.placeholders(), vec!["customer_name", "plan", "message"]);

        let messages = t
            .render(&inputs(&[
                ("customer_name", "Jane"),
                ("plan", "premium"),
                ("message", "Where is my order?"),
            ]))
            .unwrap();
        for m in &messages {
            assert!(
                !PLACEHOLDER_RE.is_match(&m.content),
                "unresolved token in {:?}",
                m.content
            );
        }
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[1].role, Role::User);
    }

    #[test]
    fn section_tags_are_case_insensitive_and_blank_sections_drop() {
        let t = PromptTemplate::parse(
            "---[system]---\n\n---[User]---\nhi there",
            "mixed.txt",
        )
        .unwrap();
        let messages = t.render(&BTreeMap::new()).unwrap();
        assert_eq!(messages, vec![Message::new(Role::User, "hi there")]);
    }

    #[test]
    fn unused_inputs_are_permitted() {
        let t = PromptTemplate::parse("Hello {name}", "p.txt").unwrap();
        let messages = t
            .render(&inputs(&[("name", "Jane"), ("extra", "ignored")]))
            .unwrap();
        assert_eq!(messages[0].content, "Hello Jane");
    }

    #[test]
    fn substitution_is_single_pass() {
        let t = PromptTemplate::parse("{a}", "p.txt").unwrap();
        let messages = t.render(&inputs(&[("a", "{b}"), ("b", "nope")])).unwrap();
        assert_eq!(messages[0].content, "{b}");
    }

    #[test]
    fn flatten_joins_multi_section_prompts_with_role_tags() {
        let messages = vec![
            Message::new(Role::System, "be brief"),
            Message::new(Role::User, "hello"),
        ];
        let flat = flatten_messages(&messages);
        assert!(flat.contains("[system]\nbe brief"));
        assert!(flat.contains("[user]\nhello"));

        let single = vec![Message::new(Role::User, "hello")];
        assert_eq!(flatten_messages(&single), "hello");
    }
}
