//! Per-session conversation: a four-step form collecting the CV request.
//!
//! `Conversation` is plain data with no I/O; the dispatcher feeds it one input
//! at a time and performs whatever `Step` comes back.

pub mod prompts;

use tracing::debug;

use crate::models::CvRequest;

/// Identifies one session: a user in a chat.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionKey {
    pub chat_id: i64,
    pub user_id: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Start,
    Help,
    GenerateCv,
}

/// One incoming message, as the form sees it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
    Command(Command),
    /// Slash-prefixed text that names none of the bot's commands.
    UnknownCommand(String),
    Text(String),
    /// Photo, sticker, voice and the like.
    NonText,
}

impl Input {
    pub fn from_text(text: Option<&str>) -> Self {
        let Some(text) = text else {
            return Input::NonText;
        };
        let trimmed = text.trim();
        if !trimmed.starts_with('/') {
            return Input::Text(text.to_string());
        }
        // "/start@SomeBot extra" addresses the command to this bot.
        let word = trimmed.split_whitespace().next().unwrap_or_default();
        let name = word.split('@').next().unwrap_or_default();
        match name {
            "/start" => Input::Command(Command::Start),
            "/help" => Input::Command(Command::Help),
            "/generate_cv" => Input::Command(Command::GenerateCv),
            _ => Input::UnknownCommand(text.to_string()),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FormState {
    #[default]
    Idle,
    AwaitingName,
    AwaitingExperience,
    AwaitingEducation,
    AwaitingTechStack,
}

/// Answers collected so far.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CvDraft {
    pub name: String,
    pub experience: String,
    pub education: String,
}

/// What the caller should do after an input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    Reply(&'static str),
    /// Form complete: generate the CV. State is already back to `Idle`.
    Submit(CvRequest),
    Ignore,
}

#[derive(Debug, Clone, Default)]
pub struct Conversation {
    state: FormState,
    draft: CvDraft,
}

impl Conversation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> FormState {
        self.state
    }

    pub fn handle(&mut self, input: Input) -> Step {
        match input {
            Input::Command(Command::Start) => Step::Reply(prompts::WELCOME),
            Input::Command(Command::Help) => Step::Reply(prompts::HELP),
            Input::Command(Command::GenerateCv) => {
                self.draft = CvDraft::default();
                self.state = FormState::AwaitingName;
                Step::Reply(prompts::ASK_NAME)
            }
            // Mid-form, "/usr/local maintainer" is an answer, not a command.
            Input::UnknownCommand(text) if self.state != FormState::Idle => {
                self.accept_text(text)
            }
            Input::UnknownCommand(_) => Step::Ignore,
            Input::NonText => match self.pending_prompt() {
                Some(prompt) => Step::Reply(prompt),
                None => Step::Ignore,
            },
            Input::Text(text) => self.accept_text(text),
        }
    }

    fn accept_text(&mut self, text: String) -> Step {
        match self.state {
            FormState::Idle => Step::Ignore,
            FormState::AwaitingName => {
                self.draft.name = text;
                self.state = FormState::AwaitingExperience;
                Step::Reply(prompts::ASK_EXPERIENCE)
            }
            FormState::AwaitingExperience => {
                self.draft.experience = text;
                self.state = FormState::AwaitingEducation;
                Step::Reply(prompts::ASK_EDUCATION)
            }
            FormState::AwaitingEducation => {
                self.draft.education = text;
                self.state = FormState::AwaitingTechStack;
                Step::Reply(prompts::ASK_TECH_STACK)
            }
            FormState::AwaitingTechStack => {
                let draft = std::mem::take(&mut self.draft);
                self.state = FormState::Idle;
                let request = CvRequest {
                    name: draft.name,
                    experience: draft.experience,
                    education: draft.education,
                    tech_stack: split_tech_stack(&text),
                };
                debug!("Form complete with {} skills", request.tech_stack.len());
                Step::Submit(request)
            }
        }
    }

    /// The question the form is currently waiting on, if any.
    fn pending_prompt(&self) -> Option<&'static str> {
        match self.state {
            FormState::Idle => None,
            FormState::AwaitingName => Some(prompts::ASK_NAME),
            FormState::AwaitingExperience => Some(prompts::ASK_EXPERIENCE),
            FormState::AwaitingEducation => Some(prompts::ASK_EDUCATION),
            FormState::AwaitingTechStack => Some(prompts::ASK_TECH_STACK),
        }
    }
}

/// Comma-separated skills, trimmed, empties dropped.
pub fn split_tech_stack(text: &str) -> Vec<String> {
    text.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(s: &str) -> Input {
        Input::Text(s.to_string())
    }

    fn fill_form(conv: &mut Conversation) -> Step {
        conv.handle(Input::Command(Command::GenerateCv));
        conv.handle(text("Ann Lee"));
        conv.handle(text("5 years at Acme"));
        conv.handle(text("BSc CS"));
        conv.handle(text("Go, SQL"))
    }

    #[test]
    fn test_input_parsing() {
        assert_eq!(Input::from_text(Some("/start")), Input::Command(Command::Start));
        assert_eq!(
            Input::from_text(Some("/generate_cv@CvForgeBot")),
            Input::Command(Command::GenerateCv)
        );
        assert_eq!(Input::from_text(Some("/help now")), Input::Command(Command::Help));
        assert_eq!(
            Input::from_text(Some("/unknown")),
            Input::UnknownCommand("/unknown".to_string())
        );
        assert_eq!(Input::from_text(Some("Ann Lee")), text("Ann Lee"));
        assert_eq!(Input::from_text(None), Input::NonText);
    }

    #[test]
    fn test_full_form_submits_request_and_resets() {
        let mut conv = Conversation::new();
        assert_eq!(
            conv.handle(Input::Command(Command::GenerateCv)),
            Step::Reply(prompts::ASK_NAME)
        );
        assert_eq!(conv.handle(text("Ann Lee")), Step::Reply(prompts::ASK_EXPERIENCE));
        assert_eq!(conv.state(), FormState::AwaitingExperience);
        assert_eq!(conv.handle(text("5 years at Acme")), Step::Reply(prompts::ASK_EDUCATION));
        assert_eq!(conv.handle(text("BSc CS")), Step::Reply(prompts::ASK_TECH_STACK));

        let step = conv.handle(text(" Go , SQL,, Rust "));
        assert_eq!(
            step,
            Step::Submit(CvRequest {
                name: "Ann Lee".to_string(),
                experience: "5 years at Acme".to_string(),
                education: "BSc CS".to_string(),
                tech_stack: vec!["Go".to_string(), "SQL".to_string(), "Rust".to_string()],
            })
        );
        assert_eq!(conv.state(), FormState::Idle);
        assert_eq!(conv.draft, CvDraft::default());
    }

    #[test]
    fn test_generate_cv_restarts_form_midway() {
        let mut conv = Conversation::new();
        conv.handle(Input::Command(Command::GenerateCv));
        conv.handle(text("Ann Lee"));
        conv.handle(text("5 years at Acme"));

        assert_eq!(
            conv.handle(Input::Command(Command::GenerateCv)),
            Step::Reply(prompts::ASK_NAME)
        );
        assert_eq!(conv.state(), FormState::AwaitingName);
        assert_eq!(conv.draft, CvDraft::default());
    }

    #[test]
    fn test_start_and_help_leave_state_alone() {
        let mut conv = Conversation::new();
        conv.handle(Input::Command(Command::GenerateCv));
        conv.handle(text("Ann Lee"));

        assert_eq!(conv.handle(Input::Command(Command::Help)), Step::Reply(prompts::HELP));
        assert_eq!(conv.handle(Input::Command(Command::Start)), Step::Reply(prompts::WELCOME));
        assert_eq!(conv.state(), FormState::AwaitingExperience);
        assert_eq!(conv.draft.name, "Ann Lee");
    }

    #[test]
    fn test_non_text_repeats_pending_question() {
        let mut conv = Conversation::new();
        assert_eq!(conv.handle(Input::NonText), Step::Ignore);

        conv.handle(Input::Command(Command::GenerateCv));
        conv.handle(text("Ann Lee"));
        assert_eq!(conv.handle(Input::NonText), Step::Reply(prompts::ASK_EXPERIENCE));
        assert_eq!(conv.state(), FormState::AwaitingExperience);
    }

    #[test]
    fn test_idle_text_and_unknown_commands_are_ignored() {
        let mut conv = Conversation::new();
        assert_eq!(conv.handle(text("hello")), Step::Ignore);
        assert_eq!(
            conv.handle(Input::UnknownCommand("/unknown".to_string())),
            Step::Ignore
        );
        assert_eq!(conv.state(), FormState::Idle);
    }

    #[test]
    fn test_second_form_after_submit_starts_clean() {
        let mut conv = Conversation::new();
        assert!(matches!(fill_form(&mut conv), Step::Submit(_)));
        assert!(matches!(fill_form(&mut conv), Step::Submit(_)));
        assert_eq!(conv.state(), FormState::Idle);
    }

    #[test]
    fn test_empty_skills_list_is_allowed() {
        assert!(split_tech_stack(" , ,").is_empty());
        assert_eq!(split_tech_stack("Go"), vec!["Go".to_string()]);
    }

    #[test]
    fn test_slash_prefixed_answer_fills_pending_field() {
        let mut conv = Conversation::new();
        conv.handle(Input::Command(Command::GenerateCv));
        conv.handle(text("Ann"));

        let answer = Input::from_text(Some("/usr/local maintainer, 5 years"));
        assert_eq!(conv.handle(answer), Step::Reply(prompts::ASK_EDUCATION));
        assert_eq!(conv.state(), FormState::AwaitingEducation);
        assert_eq!(conv.draft.experience, "/usr/local maintainer, 5 years");
    }
}
