//! Notebook-facing metadata of the SAS language module.

/// Static description of how notebooks present and drive SAS.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LanguageInfo {
    /// Language name shown to users.
    pub name: &'static str,
    /// Jupyter kernel names that provide this language.
    pub kernels: &'static [&'static str],
    /// Prompt background color.
    pub background_color: &'static str,
    /// Statement template changing the working directory; `{dir}` is replaced.
    pub cd_command: &'static str,
}

/// SAS language module metadata.
pub const SAS_LANGUAGE: LanguageInfo = LanguageInfo {
    name: "SAS",
    kernels: &["sas"],
    background_color: "#9CD4F9",
    cd_command: "x 'cd {dir}';",
};

impl LanguageInfo {
    /// Whether `kernel` provides this language.
    #[must_use]
    pub fn supports_kernel(&self, kernel: &str) -> bool {
        self.kernels.iter().any(|k| k.eq_ignore_ascii_case(kernel))
    }

    /// Statement changing the engine's working directory to `dir`.
    #[must_use]
    pub fn cd_statement(&self, dir: &str) -> String {
        // SAS doubles quotes inside quoted strings.
        self.cd_command.replace("{dir}", &dir.replace('\'', "''"))
    }
}
