//! Command building utilities.

use thiserror::Error;

/// Command build error.
#[derive(Debug, Error)]
pub enum CommandBuildError {
    #[error("Base command cannot be parsed: {0}")]
    InvalidBase(String),
    #[error("Base command is empty after parsing")]
    EmptyCommand,
}

/// Parsed command parts (program + args).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandParts {
    pub program: String,
    pub args: Vec<String>,
}

impl CommandParts {
    /// Create new command parts.
    #[must_use]
    pub const fn new(program: String, args: Vec<String>) -> Self {
        Self { program, args }
    }

    /// Shell-quoted rendering for logs and error messages.
    #[must_use]
    pub fn display(&self) -> String {
        let words = std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str));
        shlex::try_join(words).unwrap_or_else(|_| {
            let mut joined = self.program.clone();
            for arg in &self.args {
                joined.push(' ');
                joined.push_str(arg);
            }
            joined
        })
    }

    /// A `std::process::Command` running these parts.
    #[must_use]
    pub fn to_command(&self) -> std::process::Command {
        let mut cmd = std::process::Command::new(&self.program);
        cmd.args(&self.args);
        cmd
    }
}

/// Builder for constructing commands.
#[derive(Debug, Clone)]
pub struct CommandBuilder {
    /// Base command line, possibly carrying its own options.
    pub base: String,
    /// Parameters appended after the base.
    pub params: Vec<String>,
}

impl CommandBuilder {
    /// Create a new command builder.
    #[must_use]
    pub fn new<S: Into<String>>(base: S) -> Self {
        Self {
            base: base.into(),
            params: Vec::new(),
        }
    }

    /// Append one parameter.
    #[must_use]
    pub fn param<S: Into<String>>(mut self, param: S) -> Self {
        self.params.push(param.into());
        self
    }

    /// Append an option and its value when the value is present.
    #[must_use]
    pub fn option<S: Into<String>>(self, flag: &str, value: Option<S>) -> Self {
        match value {
            Some(value) => self.param(flag).param(value),
            None => self,
        }
    }

    /// Override the base program, keeping any options the base carried.
    #[must_use]
    pub fn override_program<F>(mut self, rewrite: F) -> Self
    where
        F: FnOnce(&str) -> String,
    {
        if let Some(mut words) = shlex::split(&self.base) {
            if let Some(program) = words.first_mut() {
                *program = rewrite(program);
                self.base = shlex::try_join(words.iter().map(String::as_str))
                    .unwrap_or_else(|_| words.join(" "));
            }
        }
        self
    }

    /// Build the command.
    ///
    /// # Errors
    /// Returns error if the base command is invalid.
    pub fn build(&self) -> Result<CommandParts, CommandBuildError> {
        let mut parts = split_command_line(&self.base)?;
        parts.extend(self.params.iter().cloned());

        if parts.is_empty() {
            return Err(CommandBuildError::EmptyCommand);
        }

        let program = parts.remove(0);
        Ok(CommandParts::new(program, parts))
    }
}

fn split_command_line(input: &str) -> Result<Vec<String>, CommandBuildError> {
    shlex::split(input).ok_or_else(|| CommandBuildError::InvalidBase(input.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_with_options() {
        let parts = CommandBuilder::new("scp")
            .option("-i", Some("/home/me/.ssh/id"))
            .option::<String>("-P", None)
            .param("host:/tmp/a.sas7bdat")
            .param("/tmp/x_a.sas7bdat")
            .build()
            .unwrap();
        assert_eq!(parts.program, "scp");
        assert_eq!(
            parts.args,
            vec!["-i", "/home/me/.ssh/id", "host:/tmp/a.sas7bdat", "/tmp/x_a.sas7bdat"]
        );
    }

    #[test]
    fn test_base_carries_options() {
        let parts = CommandBuilder::new("ssh -o BatchMode=yes")
            .override_program(|p| p.replace("ssh", "scp"))
            .param("a")
            .build()
            .unwrap();
        assert_eq!(parts.program, "scp");
        assert_eq!(parts.args, vec!["-o", "BatchMode=yes", "a"]);
    }

    #[test]
    fn test_empty_and_invalid_base() {
        assert!(matches!(
            CommandBuilder::new("").build(),
            Err(CommandBuildError::EmptyCommand)
        ));
        assert!(matches!(
            CommandBuilder::new("scp \"unterminated").build(),
            Err(CommandBuildError::InvalidBase(_))
        ));
    }

    #[test]
    fn test_display_quotes_spaces() {
        let parts = CommandParts::new("scp".into(), vec!["host:/a b".into(), "/tmp/c".into()]);
        let rendered = parts.display();
        assert_eq!(
            shlex::split(&rendered).unwrap(),
            vec!["scp", "host:/a b", "/tmp/c"]
        );
    }
}
