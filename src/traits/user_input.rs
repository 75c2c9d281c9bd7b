use anyhow::Result;
use inquire::InquireError;
use inquire::validator::Validation;
use std::collections::VecDeque;
use std::sync::Mutex;

use crate::error::DeployError;

/// Response type for mock user input
#[derive(Debug, Clone)]
#[allow(dead_code)]
pub enum MockResponse {
    Select(String),
    Text(String),
    Confirm(bool),
    /// Behaves like the user pressing Esc or Ctrl-C on the prompt
    Abort,
}

/// Validation applied to free-text input before it is accepted
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InputRule {
    /// Empty input is rejected
    pub required: bool,
    /// Non-empty input must parse as a number
    pub numeric: bool,
}

impl InputRule {
    #[cfg(test)]
    pub const ANY: InputRule = InputRule {
        required: false,
        numeric: false,
    };

    pub const REQUIRED: InputRule = InputRule {
        required: true,
        numeric: false,
    };

    pub fn check(&self, input: &str) -> std::result::Result<(), String> {
        if input.is_empty() {
            return if self.required {
                Err("value cannot be empty".to_string())
            } else {
                Ok(())
            };
        }
        if self.numeric {
            let text = input.trim();
            let is_number = text.parse::<i64>().is_ok()
                || text.parse::<f64>().is_ok_and(|f| f.is_finite());
            if !is_number {
                return Err(format!("'{}' is not a number", input));
            }
        }
        Ok(())
    }
}

/// Trait for user input operations to enable testing with mocks
pub trait UserInput: Send + Sync {
    /// Display a selection prompt with options
    fn select(&self, prompt: &str, options: Vec<String>) -> Result<String>;

    /// Display a text input prompt
    fn text(&self, prompt: &str, default: Option<&str>) -> Result<String>;

    /// Text prompt that re-asks until `rule` accepts the input
    fn text_validated(&self, prompt: &str, placeholder: Option<&str>, rule: InputRule) -> Result<String>;

    /// Masked input; the typed value is never echoed
    fn password(&self, prompt: &str, placeholder: Option<&str>, rule: InputRule) -> Result<String>;

    /// Display a confirmation prompt (yes/no)
    fn confirm(&self, prompt: &str, default: bool) -> Result<bool>;
}

/// Cancellation from the terminal becomes `DeployError::Aborted`
fn prompt_error(err: InquireError) -> anyhow::Error {
    match err {
        InquireError::OperationCanceled | InquireError::OperationInterrupted => DeployError::Aborted.into(),
        other => DeployError::Prompt(other.to_string()).into(),
    }
}

fn validator(rule: InputRule) -> impl Fn(&str) -> std::result::Result<Validation, inquire::CustomUserError> + Clone {
    move |input: &str| match rule.check(input) {
        Ok(()) => Ok(Validation::Valid),
        Err(message) => Ok(Validation::Invalid(message.into())),
    }
}

/// Real user input implementation using inquire crate
pub struct InquireUserInput;

impl UserInput for InquireUserInput {
    fn select(&self, prompt: &str, options: Vec<String>) -> Result<String> {
        use inquire::Select;
        Select::new(prompt, options).prompt().map_err(prompt_error)
    }

    fn text(&self, prompt: &str, default: Option<&str>) -> Result<String> {
        use inquire::Text;
        let mut text_prompt = Text::new(prompt);
        if let Some(default_val) = default {
            text_prompt = text_prompt.with_default(default_val);
        }
        text_prompt.prompt().map_err(prompt_error)
    }

    fn text_validated(&self, prompt: &str, placeholder: Option<&str>, rule: InputRule) -> Result<String> {
        use inquire::Text;
        let mut text_prompt = Text::new(prompt).with_validator(validator(rule));
        if let Some(hint) = placeholder {
            text_prompt = text_prompt.with_placeholder(hint);
        }
        text_prompt.prompt().map_err(prompt_error)
    }

    fn password(&self, prompt: &str, placeholder: Option<&str>, rule: InputRule) -> Result<String> {
        use inquire::{Password, PasswordDisplayMode};
        let mut password_prompt = Password::new(prompt)
            .without_confirmation()
            .with_display_mode(PasswordDisplayMode::Masked)
            .with_validator(validator(rule));
        if let Some(hint) = placeholder {
            password_prompt = password_prompt.with_help_message(hint);
        }
        password_prompt.prompt().map_err(prompt_error)
    }

    fn confirm(&self, prompt: &str, default: bool) -> Result<bool> {
        use inquire::Confirm;
        Confirm::new(prompt)
            .with_default(default)
            .prompt()
            .map_err(prompt_error)
    }
}

/// Mock user input implementation for testing
#[allow(dead_code)]
pub struct MockUserInput {
    responses: Mutex<VecDeque<MockResponse>>,
    prompts: Mutex<Vec<String>>,
}

#[allow(dead_code)]
impl MockUserInput {
    /// Create new mock with no pre-configured responses
    pub fn new() -> Self {
        Self::with_responses(Vec::new())
    }

    /// Create mock with pre-configured responses
    pub fn with_responses(responses: Vec<MockResponse>) -> Self {
        Self {
            responses: Mutex::new(responses.into()),
            prompts: Mutex::new(Vec::new()),
        }
    }

    /// Add a response to the queue
    pub fn add_response(&self, response: MockResponse) {
        self.responses.lock().unwrap().push_back(response);
    }

    /// Prompt titles shown so far, in order
    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }

    /// Responses not consumed yet
    pub fn remaining(&self) -> usize {
        self.responses.lock().unwrap().len()
    }

    /// Get the next response from the queue
    fn next_response(&self, prompt: &str) -> Result<MockResponse> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        let response = self
            .responses
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| anyhow::anyhow!("No more mock responses available"))?;
        if let MockResponse::Abort = response {
            return Err(DeployError::Aborted.into());
        }
        Ok(response)
    }

    /// Pop text answers until one passes `rule`, like a re-prompting terminal
    fn next_valid_text(&self, prompt: &str, rule: InputRule) -> Result<String> {
        loop {
            match self.next_response(prompt)? {
                MockResponse::Text(answer) => {
                    if rule.check(&answer).is_ok() {
                        return Ok(answer);
                    }
                }
                _ => anyhow::bail!("Expected Text response but got a different type"),
            }
        }
    }
}

impl Default for MockUserInput {
    fn default() -> Self {
        Self::new()
    }
}

impl UserInput for MockUserInput {
    fn select(&self, prompt: &str, options: Vec<String>) -> Result<String> {
        match self.next_response(prompt)? {
            MockResponse::Select(answer) => {
                // Verify the answer is in the options
                if options.contains(&answer) {
                    Ok(answer)
                } else {
                    anyhow::bail!(
                        "Mock response '{}' is not in the provided options: {:?}",
                        answer,
                        options
                    )
                }
            }
            _ => anyhow::bail!("Expected Select response but got a different type"),
        }
    }

    fn text(&self, prompt: &str, default: Option<&str>) -> Result<String> {
        match self.next_response(prompt)? {
            MockResponse::Text(answer) if answer.is_empty() => Ok(default.unwrap_or_default().to_string()),
            MockResponse::Text(answer) => Ok(answer),
            _ => anyhow::bail!("Expected Text response but got a different type"),
        }
    }

    fn text_validated(&self, prompt: &str, _placeholder: Option<&str>, rule: InputRule) -> Result<String> {
        self.next_valid_text(prompt, rule)
    }

    fn password(&self, prompt: &str, _placeholder: Option<&str>, rule: InputRule) -> Result<String> {
        self.next_valid_text(prompt, rule)
    }

    fn confirm(&self, prompt: &str, _default: bool) -> Result<bool> {
        match self.next_response(prompt)? {
            MockResponse::Confirm(answer) => Ok(answer),
            _ => anyhow::bail!("Expected Confirm response but got a different type"),
        }
    }
}
