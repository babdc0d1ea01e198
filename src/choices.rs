//! Operator choices and the injectable chooser capability.
//!
//! Every interactive question goes through the `Chooser` trait, so choice
//! collection can be driven by a terminal, by `--yes` defaults, or by a
//! scripted answer list in tests.

use crate::error::{Result, SetupError};
use crate::types::AiBackend;
use dialoguer::theme::ColorfulTheme;
use dialoguer::Select;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use strum::IntoEnumIterator;
use tracing::debug;

/// What to install. Collected once, immutable thereafter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct UserChoices {
    pub ai_backend: AiBackend,
    pub install_vision: bool,
    pub install_3d: bool,
}

/// Partially known choices from flags and the config file.
///
/// `None` fields are asked through the chooser.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ChoicePreset {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ai_backend: Option<AiBackend>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub install_vision: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub install_3d: Option<bool>,
}

impl ChoicePreset {
    /// Fields set in `self` win over `fallback`
    pub fn or(self, fallback: ChoicePreset) -> ChoicePreset {
        ChoicePreset {
            ai_backend: self.ai_backend.or(fallback.ai_backend),
            install_vision: self.install_vision.or(fallback.install_vision),
            install_3d: self.install_3d.or(fallback.install_3d),
        }
    }

    /// Returns true if every field is already decided
    pub fn is_complete(&self) -> bool {
        self.ai_backend.is_some() && self.install_vision.is_some() && self.install_3d.is_some()
    }
}

impl From<UserChoices> for ChoicePreset {
    fn from(choices: UserChoices) -> Self {
        Self {
            ai_backend: Some(choices.ai_backend),
            install_vision: Some(choices.install_vision),
            install_3d: Some(choices.install_3d),
        }
    }
}

/// Returns one of N labeled options.
pub trait Chooser {
    /// Ask the operator to pick one of `options`; returns its index.
    fn choose(&mut self, prompt: &str, options: &[&str], default: usize) -> Result<usize>;

    /// Yes/no question expressed as a two-option choice.
    fn confirm(&mut self, prompt: &str, default: bool) -> Result<bool> {
        let default_index = if default { 0 } else { 1 };
        Ok(self.choose(prompt, &["Yes", "No"], default_index)? == 0)
    }
}

/// Terminal chooser backed by `dialoguer::Select`.
#[derive(Default)]
pub struct DialoguerChooser {
    theme: ColorfulTheme,
}

impl DialoguerChooser {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Chooser for DialoguerChooser {
    fn choose(&mut self, prompt: &str, options: &[&str], default: usize) -> Result<usize> {
        Select::with_theme(&self.theme)
            .with_prompt(prompt)
            .items(options)
            .default(default)
            .interact()
            .map_err(|e| SetupError::prompt(e.to_string()))
    }
}

/// Always answers with the default. Backs `--yes`.
#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultChooser;

impl Chooser for DefaultChooser {
    fn choose(&mut self, prompt: &str, _options: &[&str], default: usize) -> Result<usize> {
        debug!("Auto-answering '{}' with option {}", prompt, default);
        Ok(default)
    }
}

/// Answers from a fixed list, for tests and scripted runs.
#[derive(Debug, Default, Clone)]
pub struct ScriptedChooser {
    answers: VecDeque<usize>,
    /// Prompts seen, in order
    pub asked: Vec<String>,
}

impl ScriptedChooser {
    pub fn new(answers: impl IntoIterator<Item = usize>) -> Self {
        Self {
            answers: answers.into_iter().collect(),
            asked: Vec::new(),
        }
    }
}

impl Chooser for ScriptedChooser {
    fn choose(&mut self, prompt: &str, options: &[&str], _default: usize) -> Result<usize> {
        self.asked.push(prompt.to_string());
        let answer = self
            .answers
            .pop_front()
            .ok_or_else(|| SetupError::prompt(format!("no scripted answer for '{}'", prompt)))?;
        if answer >= options.len() {
            return Err(SetupError::prompt(format!(
                "scripted answer {} out of range for '{}'",
                answer, prompt
            )));
        }
        Ok(answer)
    }
}

pub const AI_PROMPT: &str = "Install an AI backend?";
pub const VISION_PROMPT: &str = "Install camera object recognition (OpenCV + YOLO)?";
pub const THREE_D_PROMPT: &str = "Install 3D material preview (PyVista + Matplotlib)?";

/// Resolve every undecided field through `chooser`.
///
/// Defaults offered: no AI backend, no vision, no 3D. Declining a question
/// simply leaves the corresponding group out of the plan.
pub fn collect_choices(preset: ChoicePreset, chooser: &mut dyn Chooser) -> Result<UserChoices> {
    let ai_backend = match preset.ai_backend {
        Some(backend) => backend,
        None => {
            let backends: Vec<AiBackend> = AiBackend::iter().collect();
            let labels: Vec<&str> = backends.iter().map(AiBackend::label).collect();
            let index = chooser.choose(AI_PROMPT, &labels, 0)?;
            backends.get(index).copied().ok_or_else(|| {
                SetupError::prompt(format!("answer {} is out of range for: {}", index, AI_PROMPT))
            })?
        }
    };

    let install_vision = match preset.install_vision {
        Some(v) => v,
        None => chooser.confirm(VISION_PROMPT, false)?,
    };

    let install_3d = match preset.install_3d {
        Some(v) => v,
        None => chooser.confirm(THREE_D_PROMPT, false)?,
    };

    Ok(UserChoices {
        ai_backend,
        install_vision,
        install_3d,
    })
}
