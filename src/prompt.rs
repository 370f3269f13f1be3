use dialoguer::Confirm;

use crate::error::FlowResult;

/// Asks the operator yes/no questions.
pub trait Prompter {
    fn confirm(&self, question: &str) -> FlowResult<bool>;
}

/// Blocks on the terminal until the operator answers.
pub struct TerminalPrompter;

impl Prompter for TerminalPrompter {
    fn confirm(&self, question: &str) -> FlowResult<bool> {
        Ok(Confirm::new()
            .with_prompt(question)
            .default(false)
            .interact()?)
    }
}

// -----------------------------------------------------------------------------
// FakePrompter

/// Answers from a script and records every question asked.
#[cfg(test)]
pub struct FakePrompter {
    pub answers: std::cell::RefCell<std::collections::VecDeque<bool>>,
    pub questions: std::cell::RefCell<Vec<String>>,
}

#[cfg(test)]
impl FakePrompter {
    pub fn new() -> Self {
        Self::answering(&[])
    }

    pub fn answering(answers: &[bool]) -> Self {
        Self {
            answers: std::cell::RefCell::new(answers.iter().copied().collect()),
            questions: std::cell::RefCell::new(Vec::new()),
        }
    }

    pub fn questions(&self) -> Vec<String> {
        self.questions.borrow().clone()
    }
}

#[cfg(test)]
impl Prompter for FakePrompter {
    fn confirm(&self, question: &str) -> FlowResult<bool> {
        self.questions.borrow_mut().push(question.to_string());
        // An unscripted question is declined
        Ok(self.answers.borrow_mut().pop_front().unwrap_or(false))
    }
}
