use crate::model::Message;
use sha2::{Digest, Sha256};

/// Deterministic cache key for one completion request. `scope` separates
/// generation keys from judge keys so the two never collide.
pub fn completion_key(scope: &str, model: &str, temperature: f32, messages: &[Message]) -> String {
    let mut h = Sha256::new();
    h.update(scope.as_bytes());
    h.update(b"\n");
    h.update(model.as_bytes());
    h.update(b"\n");
    h.update(temperature.to_string().as_bytes());
    for m in messages {
        h.update(b"\n");
        h.update(m.role.as_str().as_bytes());
        h.update(b":");
        h.update(m.content.as_bytes());
    }
    hex::encode(h.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Message, Role};

    #[test]
    fn key_is_stable_and_sensitive_to_every_component() {
        let messages = vec![Message::new(Role::User, "hello")];
        let base = completion_key("gen", "m", 0.0, &messages);
        assert_eq!(base, completion_key("gen", "m", 0.0, &messages));
        assert_ne!(base, completion_key("judge", "m", 0.0, &messages));
        assert_ne!(base, completion_key("gen", "other", 0.0, &messages));
        assert_ne!(base, completion_key("gen", "m", 0.7, &messages));
        assert_ne!(
            base,
            completion_key("gen", "m", 0.0, &[Message::new(Role::System, "hello")])
        );
    }
}
