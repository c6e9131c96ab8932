// ABOUTME: Docker-flavored command arguments and per-runtime translation.
// ABOUTME: Produces argument lists for direct exec; shell lines are only rendered for logs.

use super::types::RuntimeType;
use std::fmt;

const FORMAT_FLAG: &str = "--format";

/// Namespace nerdctl must use to see images managed by the kubelet.
pub const NERDCTL_NAMESPACE: &str = "k8s.io";

/// A runtime-agnostic command expressed in `docker` subcommand form.
///
/// ```
/// use imagedash::runtime::RuntimeCommand;
///
/// let cmd = RuntimeCommand::new("images").arg("--format").arg("{{json .}}");
/// assert_eq!(cmd.as_args(), ["images", "--format", "{{json .}}"]);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuntimeCommand {
    args: Vec<String>,
}

impl RuntimeCommand {
    pub fn new(subcommand: impl Into<String>) -> Self {
        Self {
            args: vec![subcommand.into()],
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn subcommand(&self) -> &str {
        self.args.first().map(String::as_str).unwrap_or_default()
    }

    pub fn as_args(&self) -> &[String] {
        &self.args
    }
}

/// A command translated for a concrete runtime, ready to execute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComposedCommand {
    runtime: RuntimeType,
    args: Vec<String>,
}

impl ComposedCommand {
    pub fn runtime(&self) -> RuntimeType {
        self.runtime
    }

    pub fn program(&self) -> &'static str {
        self.runtime.binary()
    }

    pub fn args(&self) -> &[String] {
        &self.args
    }

    /// Render as a shell line for logging.
    ///
    /// docker double-quotes `--format` values, nerdctl single-quotes them and
    /// crictl passes them through untouched.
    pub fn shell_line(&self) -> String {
        let mut parts = vec![self.program().to_string()];
        let mut after_format = false;
        for arg in &self.args {
            let rendered = if after_format {
                match self.runtime {
                    RuntimeType::Docker => format!("\"{}\"", arg.replace('"', "\\\"")),
                    RuntimeType::Nerdctl => single_quote(arg),
                    RuntimeType::Crictl => arg.clone(),
                }
            } else {
                quote_if_needed(arg)
            };
            after_format = arg == FORMAT_FLAG;
            parts.push(rendered);
        }
        parts.join(" ")
    }
}

impl fmt::Display for ComposedCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.shell_line())
    }
}

impl RuntimeType {
    /// Translate a docker-flavored command into this runtime's argument list.
    pub fn compose(&self, command: &RuntimeCommand) -> ComposedCommand {
        let args = match self {
            RuntimeType::Docker | RuntimeType::Crictl => command.args.clone(),
            RuntimeType::Nerdctl => {
                let mut args = vec!["--namespace".to_string(), NERDCTL_NAMESPACE.to_string()];
                for arg in &command.args {
                    match arg.strip_prefix("--format=") {
                        Some(format) => {
                            args.push(FORMAT_FLAG.to_string());
                            args.push(format.to_string());
                        }
                        None => args.push(arg.clone()),
                    }
                }
                args
            }
        };
        ComposedCommand {
            runtime: *self,
            args,
        }
    }
}

fn single_quote(s: &str) -> String {
    format!("'{}'", s.replace('\'', "'\\''"))
}

fn quote_if_needed(s: &str) -> String {
    let safe = !s.is_empty()
        && s.chars().all(|c| {
            c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.' | '/' | ':' | '@' | '=' | ',')
        });
    if safe { s.to_string() } else { single_quote(s) }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn list_ids() -> RuntimeCommand {
        RuntimeCommand::new("images").args(["--format", "{{.ID}}"])
    }

    #[test]
    fn docker_uses_args_verbatim() {
        let composed = RuntimeType::Docker.compose(&list_ids());
        assert_eq!(composed.program(), "docker");
        assert_eq!(composed.args(), ["images", "--format", "{{.ID}}"]);
        assert_eq!(composed.shell_line(), r#"docker images --format "{{.ID}}""#);
    }

    #[test]
    fn nerdctl_adds_namespace_and_single_quotes_format() {
        let composed = RuntimeType::Nerdctl.compose(&list_ids());
        assert_eq!(composed.program(), "nerdctl");
        assert_eq!(
            composed.args(),
            ["--namespace", "k8s.io", "images", "--format", "{{.ID}}"]
        );
        assert_eq!(
            composed.shell_line(),
            "nerdctl --namespace k8s.io images --format '{{.ID}}'"
        );
    }

    #[test]
    fn nerdctl_splits_joined_format_argument() {
        let cmd = RuntimeCommand::new("images").arg("--format={{json .}}");
        let composed = RuntimeType::Nerdctl.compose(&cmd);
        assert_eq!(
            composed.args(),
            ["--namespace", "k8s.io", "images", "--format", "{{json .}}"]
        );
    }

    #[test]
    fn crictl_passes_command_through_unmodified() {
        let composed = RuntimeType::Crictl.compose(&list_ids());
        assert_eq!(composed.program(), "crictl");
        assert_eq!(composed.args(), ["images", "--format", "{{.ID}}"]);
        assert_eq!(composed.shell_line(), "crictl images --format {{.ID}}");
    }

    #[test]
    fn shell_line_quotes_unsafe_arguments() {
        let cmd = RuntimeCommand::new("save").args(["-o", "/tmp/my images.tar", "nginx:1.25"]);
        let composed = RuntimeType::Docker.compose(&cmd);
        assert_eq!(
            composed.shell_line(),
            "docker save -o '/tmp/my images.tar' nginx:1.25"
        );
    }

    #[test]
    fn subcommand_is_first_argument() {
        assert_eq!(list_ids().subcommand(), "images");
    }
}
