//! Type-safe arguments for system lookups.

use crate::command_traits::CommandArgs;

/// Type-safe arguments for a PATH lookup (`which` on unix, `where` on Windows).
#[derive(Debug, Clone)]
pub struct LocateBinaryArgs {
    pub binary: String,
}

impl LocateBinaryArgs {
    pub fn new(binary: impl Into<String>) -> Self {
        Self { binary: binary.into() }
    }
}

impl CommandArgs for LocateBinaryArgs {
    fn program(&self) -> &str {
        if cfg!(windows) { "where" } else { "which" }
    }

    fn to_cli_args(&self) -> Vec<String> {
        vec![self.binary.clone()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_locate_binary_args() {
        let args = LocateBinaryArgs::new("g++");
        assert_eq!(args.to_cli_args(), vec!["g++"]);
        assert!(!args.is_destructive());
        #[cfg(unix)]
        assert_eq!(args.program(), "which");
    }
}
