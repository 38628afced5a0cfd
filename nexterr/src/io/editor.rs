//! Editor launch.
//!
//! Selectors form a closed set: the two built-in editors, or an explicit
//! command template. Unknown selectors fail at argument parsing.

use std::process::{Command, Stdio};
use std::str::FromStr;

use anyhow::{Context, Result, anyhow, bail};
use tracing::{debug, instrument};

use crate::core::types::Diagnostic;

/// Placeholders accepted in `cmd:` templates.
pub const PLACEHOLDERS: &[&str] = &["{file}", "{line}", "{column}", "{location}"];

/// Opens a diagnostic location for the developer.
pub trait Editor {
    /// Launch the editor. The editor's exit status is not inspected.
    fn open(&self, diagnostic: &Diagnostic) -> Result<()>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditorKind {
    /// `code -g file:line:column`
    VsCode,
    /// `goland --line N [--column N] file`
    GoLand,
    /// Whitespace-separated argv with placeholders, from `cmd:<template>`.
    Template(Vec<String>),
}

impl FromStr for EditorKind {
    type Err = anyhow::Error;

    fn from_str(selector: &str) -> Result<Self> {
        match selector.trim() {
            "vscode" | "code" => Ok(EditorKind::VsCode),
            "goland" => Ok(EditorKind::GoLand),
            other => {
                let Some(template) = other.strip_prefix("cmd:") else {
                    bail!("unknown editor {other:?} (expected vscode, goland, or cmd:<template>)");
                };
                let argv: Vec<String> = template.split_whitespace().map(str::to_string).collect();
                if argv.is_empty() {
                    bail!("editor template must name a program");
                }
                if !argv
                    .iter()
                    .any(|arg| PLACEHOLDERS.iter().any(|p| arg.contains(p)))
                {
                    bail!(
                        "editor template must use one of {}",
                        PLACEHOLDERS.join(", ")
                    );
                }
                Ok(EditorKind::Template(argv))
            }
        }
    }
}

impl EditorKind {
    /// Argv that opens `diagnostic`; the first element is the program.
    pub fn argv(&self, diagnostic: &Diagnostic) -> Vec<String> {
        match self {
            EditorKind::VsCode => vec![
                "code".to_string(),
                "-g".to_string(),
                diagnostic.key().to_string(),
            ],
            EditorKind::GoLand => {
                let mut argv = vec![
                    "goland".to_string(),
                    "--line".to_string(),
                    diagnostic.line.to_string(),
                ];
                if let Some(column) = diagnostic.column {
                    argv.push("--column".to_string());
                    argv.push(column.to_string());
                }
                argv.push(diagnostic.file.clone());
                argv
            }
            EditorKind::Template(template) => template
                .iter()
                .map(|arg| substitute(arg, diagnostic))
                .collect(),
        }
    }
}

impl Editor for EditorKind {
    #[instrument(skip_all, fields(location = %diagnostic.key()))]
    fn open(&self, diagnostic: &Diagnostic) -> Result<()> {
        let argv = self.argv(diagnostic);
        let (program, args) = argv
            .split_first()
            .ok_or_else(|| anyhow!("editor command is empty"))?;
        let status = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .status()
            .with_context(|| format!("launch editor {program}"))?;
        debug!(exit_code = ?status.code(), "editor returned");
        Ok(())
    }
}

fn substitute(arg: &str, diagnostic: &Diagnostic) -> String {
    arg.replace("{location}", &diagnostic.key().to_string())
        .replace("{file}", &diagnostic.file)
        .replace("{line}", &diagnostic.line.to_string())
        .replace("{column}", &diagnostic.column.unwrap_or(1).to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Diagnostic {
        Diagnostic::new("pkg/a.go", 10, Some(4), "undefined: x")
    }

    #[test]
    fn vscode_uses_goto_location() {
        let editor: EditorKind = "vscode".parse().expect("selector");
        assert_eq!(editor.argv(&sample()), vec!["code", "-g", "pkg/a.go:10:4"]);
    }

    #[test]
    fn goland_passes_line_and_column() {
        let editor: EditorKind = "goland".parse().expect("selector");
        assert_eq!(
            editor.argv(&sample()),
            vec!["goland", "--line", "10", "--column", "4", "pkg/a.go"]
        );
    }

    #[test]
    fn goland_omits_absent_column() {
        let diagnostic = Diagnostic::new("a_test.go", 25, None, "");
        assert_eq!(
            EditorKind::GoLand.argv(&diagnostic),
            vec!["goland", "--line", "25", "a_test.go"]
        );
    }

    #[test]
    fn template_substitutes_placeholders() {
        let editor: EditorKind = "cmd:nvim --remote +{line} {file}".parse().expect("selector");
        assert_eq!(
            editor.argv(&sample()),
            vec!["nvim", "--remote", "+10", "pkg/a.go"]
        );
    }

    #[test]
    fn unknown_selector_is_rejected() {
        let err = "emacs".parse::<EditorKind>().unwrap_err();
        assert!(err.to_string().contains("unknown editor"));
    }

    #[test]
    fn template_without_placeholder_is_rejected() {
        assert!("cmd:true".parse::<EditorKind>().is_err());
        assert!("cmd:   ".parse::<EditorKind>().is_err());
    }

    #[test]
    fn missing_editor_binary_is_an_error() {
        let editor = EditorKind::Template(vec![
            "nexterr-definitely-missing-editor".to_string(),
            "{location}".to_string(),
        ]);
        assert!(editor.open(&sample()).is_err());
    }
}
