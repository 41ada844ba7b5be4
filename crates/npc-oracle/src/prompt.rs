//! Prompt template loading and rendering via `minijinja`.
//!
//! Templates are loaded from the filesystem (default: `templates/`
//! directory) so operators can tune agent voice and framing without
//! recompiling. The engine renders the Brain's assembled context
//! (spec §4.6 step 1 -- personality, vitals, mood, memories, rumors,
//! faction stance, goals) into the system/user messages sent to an
//! [`crate::llm::LlmBackend`].

use minijinja::Environment;

use crate::error::OracleError;

/// The complete rendered prompt ready to send to an LLM backend.
#[derive(Debug, Clone)]
pub struct RenderedPrompt {
    /// System message establishing the agent's identity and personality.
    pub system: String,
    /// User message containing situation, memory, and the response-format
    /// instructions.
    pub user: String,
}

/// Manages prompt template loading and rendering.
pub struct PromptEngine {
    env: Environment<'static>,
}

impl PromptEngine {
    /// Create a new prompt engine loading templates from the given
    /// directory.
    ///
    /// The directory must contain: `system.j2`, `identity.j2`,
    /// `situation.j2`, `memory.j2`, `response_format.j2`.
    pub fn new(templates_dir: &str) -> Result<Self, OracleError> {
        let mut env = Environment::new();

        for (name, file) in [
            ("system", "system.j2"),
            ("identity", "identity.j2"),
            ("situation", "situation.j2"),
            ("memory", "memory.j2"),
            ("response_format", "response_format.j2"),
        ] {
            let source = load_template(templates_dir, file)?;
            env.add_template_owned(name, source)
                .map_err(|e| OracleError::Template(format!("failed to add {name} template: {e}")))?;
        }

        Ok(Self { env })
    }

    /// Render the full prompt for one cognition call.
    pub fn render(&self, context: &serde_json::Value) -> Result<RenderedPrompt, OracleError> {
        let render_one = |name: &str| -> Result<String, OracleError> {
            self.env
                .get_template(name)
                .map_err(|e| OracleError::Template(format!("missing {name} template: {e}")))?
                .render(context)
                .map_err(|e| OracleError::Template(format!("{name} render failed: {e}")))
        };

        let system = render_one("system")?;
        let identity = render_one("identity")?;
        let situation = render_one("situation")?;
        let memory = render_one("memory")?;
        let response_format = render_one("response_format")?;

        let user = format!("{identity}\n\n{situation}\n\n{memory}\n\n{response_format}");

        Ok(RenderedPrompt { system, user })
    }
}

fn load_template(dir: &str, filename: &str) -> Result<String, OracleError> {
    let path = format!("{dir}/{filename}");
    std::fs::read_to_string(&path)
        .map_err(|e| OracleError::Template(format!("failed to read {path}: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_test_templates(dir: &std::path::Path) {
        std::fs::write(
            dir.join("system.j2"),
            "You are {{ agent_role }}, personality curiosity={{ personality.curiosity }}.",
        )
        .ok();
        std::fs::write(dir.join("identity.j2"), "## Identity\nMood: {{ mood.label }}").ok();
        std::fs::write(
            dir.join("situation.j2"),
            "## Situation\nPlayer says: {{ utterance }}",
        )
        .ok();
        std::fs::write(
            dir.join("memory.j2"),
            "## Memories\n{% for m in memories %}- {{ m }}\n{% endfor %}",
        )
        .ok();
        std::fs::write(
            dir.join("response_format.j2"),
            "Respond with JSON matching the CognitiveFrame schema.",
        )
        .ok();
    }

    #[test]
    fn template_loading_and_rendering() {
        let unique = format!(
            "npc_oracle_test_templates_{}_{:?}",
            std::process::id(),
            std::thread::current().id(),
        );
        let dir = std::env::temp_dir().join(unique);
        std::fs::create_dir_all(&dir).ok();
        write_test_templates(&dir);

        let engine = PromptEngine::new(dir.to_str().unwrap_or(""));
        assert!(engine.is_ok());
        let Ok(engine) = engine else { return };

        let context = serde_json::json!({
            "agent_role": "a watchman",
            "personality": {"curiosity": 0.6},
            "mood": {"label": "wary"},
            "utterance": "Have you seen any bandits?",
            "memories": ["saw a stranger near the gate"],
        });

        let result = engine.render(&context);
        assert!(result.is_ok());
        let Ok(prompt) = result else { return };
        assert!(prompt.system.contains("watchman"));
        assert!(prompt.user.contains("bandits"));
        assert!(prompt.user.contains("stranger"));

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn missing_template_returns_error() {
        let unique = format!(
            "npc_oracle_missing_templates_{}_{:?}",
            std::process::id(),
            std::thread::current().id(),
        );
        let dir = std::env::temp_dir().join(unique);
        std::fs::create_dir_all(&dir).ok();
        std::fs::write(dir.join("system.j2"), "test").ok();

        let result = PromptEngine::new(dir.to_str().unwrap_or(""));
        assert!(result.is_err());

        std::fs::remove_dir_all(&dir).ok();
    }
}
