//! External-binary validation bridge.
//!
//! The optional `goneat` binary is probed on PATH (or at an explicit
//! location) and invoked per validation call: the schema path goes on the
//! command line, the data document on stdin, and a JSON report comes back
//! on stdout. Any probe or execution failure is recoverable by the caller
//! falling back to the in-process engine.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::time::{Duration, Instant};

use serde::Deserialize;
use serde_json::Value;

use crate::diagnostics::{Diagnostic, EngineSource, SchemaError, Severity, ValidationReport};

/// Binary name probed on PATH.
pub const GONEAT_BINARY: &str = "goneat";

/// Exit code the bridge treats as "data invalid" rather than failure.
const EXIT_DATA_INVALID: i32 = 60;

/// Poll interval while waiting on the subprocess under a timeout.
const WAIT_POLL: Duration = Duration::from_millis(10);

/// Handle to a probed external validator binary.
#[derive(Debug, Clone)]
pub struct ExternalValidator {
    binary: PathBuf,
}

#[derive(Debug, Deserialize)]
struct BridgeReport {
    #[serde(default)]
    diagnostics: Vec<BridgeDiagnostic>,
}

#[derive(Debug, Deserialize)]
struct BridgeDiagnostic {
    #[serde(default)]
    severity: Option<String>,
    message: String,
    #[serde(default)]
    pointer: Option<String>,
    #[serde(default)]
    keyword: Option<String>,
}

impl ExternalValidator {
    /// Probe for the binary: an explicit path must exist; otherwise every
    /// PATH entry is checked.
    pub fn probe(explicit: Option<&Path>) -> Option<Self> {
        match explicit {
            Some(path) => path.is_file().then(|| Self {
                binary: path.to_path_buf(),
            }),
            None => {
                let path_var = std::env::var_os("PATH")?;
                for dir in std::env::split_paths(&path_var) {
                    let candidate = dir.join(GONEAT_BINARY);
                    if candidate.is_file() {
                        return Some(Self { binary: candidate });
                    }
                    #[cfg(windows)]
                    {
                        let exe = dir.join(format!("{}.exe", GONEAT_BINARY));
                        if exe.is_file() {
                            return Some(Self { binary: exe });
                        }
                    }
                }
                None
            }
        }
    }

    pub fn binary(&self) -> &Path {
        &self.binary
    }

    /// Run the external engine for one data/schema pair.
    pub fn validate(
        &self,
        schema_path: &Path,
        data: &Value,
        timeout: Option<Duration>,
        schema_id: &str,
    ) -> Result<ValidationReport, SchemaError> {
        let engine_error = |message: String| SchemaError::Engine {
            schema_id: schema_id.to_string(),
            source_engine: EngineSource::ExternalBinary,
            diagnostics: Vec::new(),
            source: Some(message.into()),
        };

        let mut child = Command::new(&self.binary)
            .arg("validate")
            .arg("--schema")
            .arg(schema_path)
            .arg("--format")
            .arg("json")
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| engine_error(format!("failed to spawn {}: {}", self.binary.display(), e)))?;

        let payload = serde_json::to_vec(data)
            .map_err(|e| engine_error(format!("failed to encode data: {}", e)))?;
        if let Some(mut stdin) = child.stdin.take() {
            // A closed pipe just means the binary stopped reading early.
            let _ = stdin.write_all(&payload);
        }

        let status = match timeout {
            None => child
                .wait()
                .map_err(|e| engine_error(format!("failed to wait on validator: {}", e)))?,
            Some(limit) => {
                let deadline = Instant::now() + limit;
                loop {
                    match child.try_wait() {
                        Ok(Some(status)) => break status,
                        Ok(None) if Instant::now() >= deadline => {
                            let _ = child.kill();
                            let _ = child.wait();
                            return Err(engine_error(format!(
                                "external validator timed out after {:?}",
                                limit
                            )));
                        }
                        Ok(None) => std::thread::sleep(WAIT_POLL),
                        Err(e) => {
                            return Err(engine_error(format!(
                                "failed to poll validator: {}",
                                e
                            )));
                        }
                    }
                }
            }
        };

        let mut stdout = Vec::new();
        if let Some(mut pipe) = child.stdout.take() {
            use std::io::Read;
            let _ = pipe.read_to_end(&mut stdout);
        }

        let code = status.code().unwrap_or(-1);
        if code != 0 && code != EXIT_DATA_INVALID {
            let mut stderr = Vec::new();
            if let Some(mut pipe) = child.stderr.take() {
                use std::io::Read;
                let _ = pipe.read_to_end(&mut stderr);
            }
            return Err(engine_error(format!(
                "external validator exited with {}: {}",
                code,
                String::from_utf8_lossy(&stderr).trim()
            )));
        }

        let report: BridgeReport = serde_json::from_slice(&stdout)
            .map_err(|e| engine_error(format!("unreadable validator output: {}", e)))?;
        let diagnostics = report
            .diagnostics
            .into_iter()
            .map(BridgeDiagnostic::into_diagnostic)
            .collect();
        Ok(ValidationReport::from_diagnostics(
            diagnostics,
            EngineSource::ExternalBinary,
        ))
    }
}

impl BridgeDiagnostic {
    fn into_diagnostic(self) -> Diagnostic {
        let severity = match self.severity.as_deref() {
            Some("WARN") | Some("warn") | Some("warning") => Severity::Warn,
            Some("INFO") | Some("info") => Severity::Info,
            _ => Severity::Error,
        };
        let mut diagnostic = match severity {
            Severity::Error => Diagnostic::error(self.message),
            Severity::Warn => Diagnostic::warn(self.message),
            Severity::Info => Diagnostic::info(self.message),
        };
        if let Some(pointer) = self.pointer {
            diagnostic = diagnostic.with_pointer(pointer);
        }
        if let Some(keyword) = self.keyword {
            diagnostic = diagnostic.with_keyword(keyword);
        }
        diagnostic
    }
}
