//! fulmen - developer CLI over the fulmen-core schema and asset surface.

use std::path::{Path, PathBuf};
use std::process::ExitCode as ProcessExitCode;

use clap::{Parser, Subcommand};
use colored::Colorize;

use fulmen_core::schema::{EnginePreference, ExportFormat, ExportOptions, ValidateOptions};
use fulmen_core::{
    AssetCatalog, ExitCode, FulmenError, LoadOptions, NormalizeSchemaOptions, SchemaRegistry,
    ValidationReport, render,
};

#[derive(Parser)]
#[command(
    name = "fulmen",
    version,
    about = "Crucible schema and asset tooling",
    propagate_version = true
)]
struct Cli {
    /// Root of the vendored asset tree.
    #[arg(long, global = true, env = "FULMEN_ASSET_ROOT")]
    asset_root: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List schemas, optionally filtered by ID prefix.
    List {
        prefix: Option<String>,
    },
    /// Show one schema's metadata and document.
    Show {
        #[arg(long = "schema-id")]
        schema_id: String,
    },
    /// Validate a JSON/YAML data file against a schema.
    Validate {
        #[arg(long = "schema-id")]
        schema_id: String,
        file: PathBuf,
        /// Require the external goneat engine; no fallback on failure.
        #[arg(long = "use-goneat")]
        use_goneat: bool,
        /// Explicit path to the goneat binary.
        #[arg(long = "goneat-path")]
        goneat_path: Option<PathBuf>,
    },
    /// Validate a schema document against its meta-schema.
    ValidateSchema {
        file: PathBuf,
    },
    /// Canonically normalize a schema document.
    Normalize {
        file: PathBuf,
        #[arg(long)]
        compact: bool,
        /// Write to a file instead of stdout.
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Compare two schema documents after normalization.
    Compare {
        a: PathBuf,
        b: PathBuf,
        #[arg(long = "show-normalized")]
        show_normalized: bool,
    },
    /// Export a schema to disk.
    Export {
        #[arg(long = "schema-id")]
        schema_id: String,
        #[arg(long)]
        out: PathBuf,
        /// Overwrite an existing file.
        #[arg(long)]
        force: bool,
        #[arg(long = "no-provenance")]
        no_provenance: bool,
        #[arg(long = "no-validate")]
        no_validate: bool,
        #[arg(long, default_value = "auto")]
        format: String,
    },
    /// Show the resolved application identity.
    IdentityShow {
        #[arg(long)]
        path: Option<PathBuf>,
        #[arg(long)]
        json: bool,
    },
    /// Validate an identity file (or the discovered one).
    IdentityValidate {
        file: Option<PathBuf>,
    },
}

enum CliFailure {
    Core(FulmenError),
    Usage(String),
    /// A failure with its own exit code and message.
    Message(ExitCode, String),
    /// A business outcome already reported on stdout.
    Outcome(ExitCode),
}

impl From<FulmenError> for CliFailure {
    fn from(error: FulmenError) -> Self {
        CliFailure::Core(error)
    }
}

impl From<fulmen_core::SchemaError> for CliFailure {
    fn from(error: fulmen_core::SchemaError) -> Self {
        CliFailure::Core(error.into())
    }
}

impl From<fulmen_core::AppIdentityError> for CliFailure {
    fn from(error: fulmen_core::AppIdentityError) -> Self {
        CliFailure::Core(error.into())
    }
}

fn main() -> ProcessExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ProcessExitCode::from(ExitCode::Success.code() as u8),
        Err(CliFailure::Core(error)) => {
            eprintln!("{} {}", "error:".red().bold(), render(&error));
            ProcessExitCode::from(ExitCode::from_error(&error).code() as u8)
        }
        Err(CliFailure::Usage(message)) => {
            eprintln!("{} {}", "error:".red().bold(), message);
            ProcessExitCode::from(ExitCode::InvalidArgument.code() as u8)
        }
        Err(CliFailure::Message(code, message)) => {
            eprintln!("{} {}", "error:".red().bold(), message);
            ProcessExitCode::from(code.code() as u8)
        }
        Err(CliFailure::Outcome(code)) => ProcessExitCode::from(code.code() as u8),
    }
}

fn registry(asset_root: &Option<PathBuf>) -> Result<SchemaRegistry, CliFailure> {
    let root = asset_root.clone().ok_or_else(|| {
        CliFailure::Usage("asset root not set; pass --asset-root or FULMEN_ASSET_ROOT".to_string())
    })?;
    tracing::debug!(root = %root.display(), "using asset root");
    Ok(SchemaRegistry::new(AssetCatalog::new(root)))
}

fn run(cli: Cli) -> Result<(), CliFailure> {
    match cli.command {
        Command::List { prefix } => {
            let registry = registry(&cli.asset_root)?;
            let schemas = registry.list_schemas(prefix.as_deref())?;
            if schemas.is_empty() {
                println!("no schemas found");
                return Ok(());
            }
            for schema in schemas {
                match &schema.version {
                    Some(version) => println!("{}  (v{})", schema.id, version),
                    None => println!("{}", schema.id),
                }
            }
            Ok(())
        }

        Command::Show { schema_id } => {
            let registry = registry(&cli.asset_root)?;
            let compiled = registry.get_schema(&schema_id)?;
            println!("{}: {}", "id".bold(), compiled.info.id);
            println!("{}: {}", "path".bold(), compiled.info.path.display());
            if let Some(draft) = &compiled.info.schema_draft {
                println!("{}: {}", "draft".bold(), draft);
            }
            if let Some(description) = &compiled.info.description {
                println!("{}: {}", "description".bold(), description);
            }
            println!();
            println!(
                "{}",
                fulmen_core::schema::normalize_schema_value(
                    &compiled.document,
                    &NormalizeSchemaOptions::default()
                )
            );
            Ok(())
        }

        Command::Validate {
            schema_id,
            file,
            use_goneat,
            goneat_path,
        } => {
            let registry = registry(&cli.asset_root)?;
            let data = read_data_file(&file)?;
            let report = if use_goneat {
                let options = ValidateOptions {
                    engine: EnginePreference::External,
                    external_path: goneat_path,
                    fallback: false,
                    timeout: None,
                };
                registry.validate_data_with(&data, &schema_id, &options)?
            } else {
                registry.validate_data(&data, &schema_id)?
            };
            finish_report(&report, &format!("{} against {}", file.display(), schema_id))
        }

        Command::ValidateSchema { file } => {
            let registry = registry(&cli.asset_root)?;
            let content = read_data_file(&file)?;
            let report = registry.validate_schema(&content);
            finish_report(&report, &format!("{} against its meta-schema", file.display()))
        }

        Command::Normalize {
            file,
            compact,
            output,
        } => {
            let text = read_text(&file)?;
            let normalized = fulmen_core::normalize_schema(
                &text,
                &NormalizeSchemaOptions { compact },
            )?;
            match output {
                Some(out) => std::fs::write(&out, &normalized).map_err(|e| {
                    CliFailure::Usage(format!("cannot write {}: {}", out.display(), e))
                })?,
                None => print!("{}", normalized),
            }
            Ok(())
        }

        Command::Compare {
            a,
            b,
            show_normalized,
        } => {
            let text_a = read_text(&a)?;
            let text_b = read_text(&b)?;
            let result = fulmen_core::compare_schemas(&text_a, &text_b)?;
            if show_normalized {
                println!("--- {}", a.display());
                print!("{}", result.normalized_a);
                println!("--- {}", b.display());
                print!("{}", result.normalized_b);
            }
            if result.equal {
                println!("{} schemas are semantically equal", "✓".green());
                Ok(())
            } else {
                println!("{} schemas differ", "✗".red());
                Err(CliFailure::Outcome(ExitCode::DataInvalid))
            }
        }

        Command::Export {
            schema_id,
            out,
            force,
            no_provenance,
            no_validate,
            format,
        } => {
            let registry = registry(&cli.asset_root)?;
            let format: ExportFormat = format
                .parse()
                .map_err(CliFailure::Usage)?;
            let options = ExportOptions {
                schema_id,
                out_path: out,
                include_provenance: !no_provenance,
                validate: !no_validate,
                overwrite: force,
                format,
                base_dir: None,
            };
            let outcome = registry.export_schema(&options)?;
            println!(
                "{} exported to {}",
                "✓".green(),
                outcome.out_path.display()
            );
            if let Some(sidecar) = outcome.provenance_path {
                println!("  provenance: {}", sidecar.display());
            }
            Ok(())
        }

        Command::IdentityShow { path, json } => {
            let identity = fulmen_core::load_identity(&LoadOptions {
                path,
                ..Default::default()
            })?;
            if json {
                let rendered = serde_json::to_string_pretty(&*identity)
                    .map_err(|e| CliFailure::Usage(format!("cannot render identity: {}", e)))?;
                println!("{}", rendered);
            } else {
                println!("{}: {}", "binary_name".bold(), identity.app.binary_name);
                println!("{}: {}", "vendor".bold(), identity.app.vendor);
                println!("{}: {}", "env_prefix".bold(), identity.app.env_prefix);
                println!("{}: {}", "config_name".bold(), identity.app.config_name);
                println!("{}: {}", "description".bold(), identity.app.description);
            }
            Ok(())
        }

        Command::IdentityValidate { file } => match file {
            Some(path) => {
                let text = read_text(&path)?;
                let value: serde_yaml::Value = serde_yaml::from_str(&text).map_err(|e| {
                    CliFailure::Usage(format!("{} is not valid YAML: {}", path.display(), e))
                })?;
                match fulmen_core::identity::validate_identity_value(&value) {
                    Ok(()) => {
                        println!("{} {} is a valid identity", "✓".green(), path.display());
                        Ok(())
                    }
                    Err(diagnostics) => {
                        println!("{} {} is invalid", "✗".red(), path.display());
                        for diagnostic in &diagnostics {
                            println!("  {}", diagnostic);
                        }
                        Err(CliFailure::Outcome(ExitCode::DataInvalid))
                    }
                }
            }
            None => {
                let identity = fulmen_core::load_identity(&LoadOptions::default())?;
                println!(
                    "{} resolved identity '{}' is valid",
                    "✓".green(),
                    identity.app.binary_name
                );
                Ok(())
            }
        },
    }
}

fn finish_report(report: &ValidationReport, subject: &str) -> Result<(), CliFailure> {
    if report.valid {
        println!("{} {} is valid ({})", "✓".green(), subject, report.source);
        for diagnostic in &report.diagnostics {
            println!("  {}", diagnostic);
        }
        Ok(())
    } else {
        println!("{} {} is invalid ({})", "✗".red(), subject, report.source);
        for diagnostic in &report.diagnostics {
            println!("  {}", diagnostic);
        }
        Err(CliFailure::Outcome(ExitCode::DataInvalid))
    }
}

fn read_text(path: &Path) -> Result<String, CliFailure> {
    std::fs::read_to_string(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            CliFailure::Message(
                ExitCode::FileNotFound,
                format!("file not found: {}", path.display()),
            )
        } else {
            CliFailure::Usage(format!("cannot read {}: {}", path.display(), e))
        }
    })
}

fn read_data_file(path: &Path) -> Result<serde_json::Value, CliFailure> {
    let text = read_text(path)?;
    let is_yaml = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("yaml") || e.eq_ignore_ascii_case("yml"));
    if is_yaml {
        let value: serde_yaml::Value = serde_yaml::from_str(&text).map_err(|e| {
            CliFailure::Usage(format!("{} is not valid YAML: {}", path.display(), e))
        })?;
        serde_json::to_value(value)
            .map_err(|e| CliFailure::Usage(format!("cannot map {} to JSON: {}", path.display(), e)))
    } else {
        serde_json::from_str(&text).map_err(|e| {
            CliFailure::Usage(format!("{} is not valid JSON: {}", path.display(), e))
        })
    }
}
