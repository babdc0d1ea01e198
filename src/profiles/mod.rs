//! Package catalogue for the assistant's dependency groups.
//!
//! Package lists are kept as Rust constants so a typo in a distribution or
//! module name fails a unit test instead of an operator's install.
//!
//! | Group   | Required | Packages |
//! |---------|----------|----------|
//! | core    | yes      | cryptography, pyyaml, numpy |
//! | ai      | no       | Ollama set or local offline set |
//! | vision  | no       | opencv-python, ultralytics |
//! | 3d      | no       | pyvista, matplotlib |
//! | tts     | no       | pyttsx3 |

use serde::{Deserialize, Serialize};
use std::fmt;

/// A single installable package.
///
/// `name` is what the package manager installs; `module` is what the
/// verification pass imports. They differ for several packages
/// (`opencv-python` imports as `cv2`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct Package {
    pub name: &'static str,
    pub module: &'static str,
    /// Builds native extensions from source on platforms without wheels
    pub needs_toolchain: bool,
}

impl Package {
    const fn pure(name: &'static str, module: &'static str) -> Self {
        Self { name, module, needs_toolchain: false }
    }

    const fn native(name: &'static str, module: &'static str) -> Self {
        Self { name, module, needs_toolchain: true }
    }
}

impl fmt::Display for Package {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

/// Names of the dependency groups, in the order they are planned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[derive(strum::Display, strum::EnumString, strum::EnumIter)]
pub enum GroupKind {
    #[strum(serialize = "core")]
    #[serde(rename = "core")]
    Core,
    #[strum(serialize = "ai")]
    #[serde(rename = "ai")]
    Ai,
    #[strum(serialize = "vision")]
    #[serde(rename = "vision")]
    Vision,
    #[strum(serialize = "3d")]
    #[serde(rename = "3d")]
    ThreeD,
    #[strum(serialize = "tts")]
    #[serde(rename = "tts")]
    Tts,
}

impl GroupKind {
    /// Feature the group enables, for the final availability summary
    pub fn feature(&self) -> &'static str {
        match self {
            Self::Core => "security and configuration",
            Self::Ai => "AI conversation",
            Self::Vision => "camera object recognition",
            Self::ThreeD => "3D material previews",
            Self::Tts => "text-to-speech",
        }
    }
}

/// Security and configuration packages, always installed
pub const CORE: &[Package] = &[
    Package::pure("cryptography", "cryptography"),
    Package::pure("pyyaml", "yaml"),
    Package::pure("numpy", "numpy"),
];

/// AI backend package sets (mutually exclusive)
pub mod ai_packages {
    use super::Package;

    /// Ollama chat client plus DuckDuckGo web search
    pub const OLLAMA: &[Package] = &[
        Package::pure("ollama", "ollama"),
        Package::pure("duckduckgo-search", "duckduckgo_search"),
    ];

    /// llama.cpp bindings, Whisper speech recognition and microphone capture
    pub const LOCAL_OFFLINE: &[Package] = &[
        Package::native("llama-cpp-python", "llama_cpp"),
        Package::pure("openai-whisper", "whisper"),
        Package::native("pyaudio", "pyaudio"),
    ];
}

/// YOLO object recognition over the webcam feed
pub const VISION: &[Package] = &[
    Package::pure("opencv-python", "cv2"),
    Package::pure("ultralytics", "ultralytics"),
];

/// Material preview rendering without Blender
pub const THREE_D: &[Package] = &[
    Package::pure("pyvista", "pyvista"),
    Package::pure("matplotlib", "matplotlib"),
];

/// Speech synthesis, always offered as an optional group
pub const TTS: &[Package] = &[Package::pure("pyttsx3", "pyttsx3")];

/// Model the assistant asks Ollama for unless configured otherwise
pub const DEFAULT_OLLAMA_MODEL: &str = "llama3.2";

/// Group whose packages provide `module`, if any pip group does.
///
/// `tkinter` ships with the interpreter and has no group.
pub fn group_for_module(module: &str) -> Option<GroupKind> {
    let sets: [(GroupKind, &[Package]); 6] = [
        (GroupKind::Core, CORE),
        (GroupKind::Ai, ai_packages::OLLAMA),
        (GroupKind::Ai, ai_packages::LOCAL_OFFLINE),
        (GroupKind::Vision, VISION),
        (GroupKind::ThreeD, THREE_D),
        (GroupKind::Tts, TTS),
    ];
    sets.iter()
        .find(|(_, set)| set.iter().any(|p| p.module == module))
        .map(|(kind, _)| *kind)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn all_sets() -> Vec<&'static [Package]> {
        vec![
            CORE,
            ai_packages::OLLAMA,
            ai_packages::LOCAL_OFFLINE,
            VISION,
            THREE_D,
            TTS,
        ]
    }

    #[test]
    fn test_no_empty_sets() {
        for set in all_sets() {
            assert!(!set.is_empty());
        }
    }

    #[test]
    fn test_names_are_valid_identifiers() {
        for pkg in all_sets().into_iter().flatten() {
            assert!(!pkg.name.is_empty());
            assert!(!pkg.name.contains(' '), "{} contains a space", pkg.name);
            assert!(
                pkg.module.chars().all(|c| c.is_ascii_alphanumeric() || c == '_'),
                "{} is not an importable module name",
                pkg.module
            );
        }
    }

    #[test]
    fn test_ai_sets_are_disjoint() {
        let ollama: HashSet<_> = ai_packages::OLLAMA.iter().map(|p| p.name).collect();
        let offline: HashSet<_> = ai_packages::LOCAL_OFFLINE.iter().map(|p| p.name).collect();
        assert!(ollama.is_disjoint(&offline));
    }

    #[test]
    fn test_module_differs_from_name_where_expected() {
        let opencv = VISION.iter().find(|p| p.name == "opencv-python").unwrap();
        assert_eq!(opencv.module, "cv2");
        let yaml = CORE.iter().find(|p| p.name == "pyyaml").unwrap();
        assert_eq!(yaml.module, "yaml");
    }

    #[test]
    fn test_group_for_module() {
        assert_eq!(group_for_module("cv2"), Some(GroupKind::Vision));
        assert_eq!(group_for_module("yaml"), Some(GroupKind::Core));
        assert_eq!(group_for_module("whisper"), Some(GroupKind::Ai));
        assert_eq!(group_for_module("tkinter"), None);
    }

    #[test]
    fn test_group_kind_names() {
        assert_eq!(GroupKind::ThreeD.to_string(), "3d");
        assert_eq!("tts".parse::<GroupKind>().unwrap(), GroupKind::Tts);
    }
}
