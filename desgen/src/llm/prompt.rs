//! Prompt composition.

/// Combines a role instruction and a user instruction into one prompt.
///
/// The layout is fixed so identical inputs always produce identical prompts.
#[must_use]
pub fn compose_prompt(system_instruction: &str, user_instruction: &str) -> String {
    format!("\nSYSTEM:\n{system_instruction}\n\nUSER:\n{user_instruction}\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compose_prompt_layout() {
        assert_eq!(
            compose_prompt("You are a UX designer.", "A habit tracker"),
            "\nSYSTEM:\nYou are a UX designer.\n\nUSER:\nA habit tracker\n"
        );
    }

    #[test]
    fn test_compose_prompt_is_deterministic() {
        assert_eq!(compose_prompt("s", "u"), compose_prompt("s", "u"));
    }
}
