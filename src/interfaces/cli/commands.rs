use std::path::{Path, PathBuf};

use super::{Command, ReportFormat, SummaryFormat, WriteArgs};
use crate::application::use_cases::comparer::FolderComparer;
use crate::application::use_cases::dedupe::{DedupeOptions, DedupeService};
use crate::application::use_cases::duplicate_resolver::DedupeScope;
use crate::application::use_cases::encoding_converter::convert_encoding;
use crate::application::use_cases::fixer::LocFixer;
use crate::application::use_cases::line_endings::fix_line_endings;
use crate::application::use_cases::report;
use crate::application::use_cases::scanner::{existing_keys, KeyScanner};
use crate::application::use_cases::validator::LocValidator;
use crate::domain::error::{AppError, Result};
use crate::domain::loc::FixReport;
use crate::infrastructure::config::AppConfig;
use crate::infrastructure::csv::{issues_to_csv, LocParser};
use crate::infrastructure::encoding::resolve_encoding;

/// What a command produced: report text, where it goes, and the exit status
#[derive(Debug)]
pub struct CommandOutput {
    pub body: Vec<u8>,
    pub output_path: Option<PathBuf>,
    pub exit_code: u8,
}

impl CommandOutput {
    fn text(body: String, exit_code: u8) -> Self {
        Self {
            body: body.into_bytes(),
            output_path: None,
            exit_code,
        }
    }

    fn with_output_path(mut self, output_path: Option<PathBuf>) -> Self {
        self.output_path = output_path;
        self
    }
}

fn batch_output(report: FixReport) -> CommandOutput {
    let exit_code = if report.files_failed() > 0 { 1 } else { 0 };
    CommandOutput::text(report::fix_markdown(&report), exit_code)
}

fn dedupe_service(
    config: &AppConfig,
    scope: DedupeScope,
    write: WriteArgs,
    delete: bool,
) -> DedupeService {
    DedupeService::new(
        LocParser::new(config.format.clone()),
        DedupeOptions {
            scope,
            priority: config.dedupe.priority,
            annotate: config.dedupe.annotate_removed && !delete,
            write: config.write_options(write.dry_run, write.no_backup),
        },
    )
}

fn validate(config: &AppConfig, path: &Path, format: ReportFormat) -> Result<CommandOutput> {
    let validator = LocValidator::new(config.format.clone(), config.dedupe.priority)?;
    let report = validator.validate_path(path)?;
    let exit_code = if report.total_errors() > 0 { 1 } else { 0 };

    let body = match format {
        ReportFormat::Markdown => report::validation_markdown(&report).into_bytes(),
        ReportFormat::Json => report::to_json(&report)?.into_bytes(),
        ReportFormat::Csv => issues_to_csv(&report)?,
    };
    Ok(CommandOutput {
        body,
        output_path: None,
        exit_code,
    })
}

fn missing(
    config: &AppConfig,
    mod_root: &Path,
    localisation: Option<&Path>,
    format: SummaryFormat,
) -> Result<CommandOutput> {
    let localisation = localisation
        .map(Path::to_path_buf)
        .unwrap_or_else(|| mod_root.join("localisation"));
    if !localisation.exists() {
        return Err(AppError::NotFound(format!(
            "Localisation folder does not exist: {}",
            localisation.display()
        )));
    }

    let existing = existing_keys(&LocParser::new(config.format.clone()), &localisation)?;
    tracing::info!(
        "{} keys defined under {}",
        existing.len(),
        localisation.display()
    );
    let report = KeyScanner::new(mod_root).find_missing(&existing)?;

    let body = match format {
        SummaryFormat::Markdown => report::missing_markdown(&report),
        SummaryFormat::Json => report::to_json(&report)?,
    };
    Ok(CommandOutput::text(body, 0))
}

fn compare(
    config: &AppConfig,
    problem: &Path,
    reference: &Path,
    format: SummaryFormat,
) -> Result<CommandOutput> {
    let report = FolderComparer::new(config.format.clone())?.compare(problem, reference)?;
    let body = match format {
        SummaryFormat::Markdown => report::comparison_markdown(&report),
        SummaryFormat::Json => report::to_json(&report)?,
    };
    Ok(CommandOutput::text(body, 0))
}

/// Run one parsed command against the loaded configuration
pub fn execute(command: Command, config: &AppConfig) -> Result<CommandOutput> {
    match command {
        Command::Validate {
            path,
            format,
            output,
        } => Ok(validate(config, &path, format)?.with_output_path(output)),

        Command::Fix {
            path,
            write,
            dedupe,
        } => {
            let fixer = LocFixer::new(config.format.clone())?
                .with_dedupe(dedupe || config.dedupe.within_file_on_fix);
            let options = config.write_options(write.dry_run, write.no_backup);
            Ok(batch_output(fixer.fix_path(&path, &options)?))
        }

        Command::LineEndings {
            path,
            target,
            write,
        } => {
            let target = target.map(Into::into).unwrap_or(config.format.line_ending);
            let options = config.write_options(write.dry_run, write.no_backup);
            Ok(batch_output(fix_line_endings(&path, target, &options)?))
        }

        Command::Convert { path, to, write } => {
            let label = to.as_deref().unwrap_or(&config.format.encoding);
            let encoding = resolve_encoding(label)?;
            let options = config.write_options(write.dry_run, write.no_backup);
            Ok(batch_output(convert_encoding(&path, encoding, &options)?))
        }

        Command::Dedupe {
            dir,
            scope,
            write,
            delete,
        } => {
            let report = dedupe_service(config, scope.into(), write, delete).dedupe(&dir)?;
            let exit_code = if report.files_failed() > 0 { 1 } else { 0 };
            Ok(CommandOutput::text(report::dedupe_markdown(&report), exit_code))
        }

        Command::RemoveKeys {
            file,
            keys_file,
            write,
            delete,
        } => {
            let service = dedupe_service(config, DedupeScope::All, write, delete);
            Ok(batch_output(service.remove_listed_keys(&file, &keys_file)?))
        }

        Command::Missing {
            mod_root,
            localisation,
            format,
            output,
        } => Ok(missing(config, &mod_root, localisation.as_deref(), format)?.with_output_path(output)),

        Command::Compare {
            problem,
            reference,
            format,
            output,
        } => Ok(compare(config, &problem, &reference, format)?.with_output_path(output)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn good_line(key: &str) -> String {
        format!("{};text;;;;;;;;;;;;;x;;;;\r\r\n", key)
    }

    #[test]
    fn test_validate_exit_codes() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a.csv"), good_line("A")).unwrap();

        let command = Command::Validate {
            path: dir.path().to_path_buf(),
            format: ReportFormat::Markdown,
            output: None,
        };
        let output = execute(command, &AppConfig::default()).unwrap();
        assert_eq!(output.exit_code, 0);

        fs::write(dir.path().join("b.csv"), "B;short\n").unwrap();
        let command = Command::Validate {
            path: dir.path().to_path_buf(),
            format: ReportFormat::Csv,
            output: Some(dir.path().join("report.csv")),
        };
        let output = execute(command, &AppConfig::default()).unwrap();
        assert_eq!(output.exit_code, 1);
        assert_eq!(output.output_path, Some(dir.path().join("report.csv")));
        assert!(String::from_utf8(output.body).unwrap().contains("column_count"));
    }

    #[test]
    fn test_fix_then_validate_is_clean() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a.csv"), "A;x\n\nB;y;z\n").unwrap();
        let write = WriteArgs {
            dry_run: false,
            no_backup: true,
        };

        let fixed = execute(
            Command::Fix {
                path: dir.path().to_path_buf(),
                write,
                dedupe: false,
            },
            &AppConfig::default(),
        )
        .unwrap();
        assert_eq!(fixed.exit_code, 0);
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);

        let validated = execute(
            Command::Validate {
                path: dir.path().to_path_buf(),
                format: ReportFormat::Json,
                output: None,
            },
            &AppConfig::default(),
        )
        .unwrap();
        assert_eq!(validated.exit_code, 0);
    }

    #[test]
    fn test_compare_reports_json() {
        let dir = tempfile::tempdir().unwrap();
        let (problem, reference) = (dir.path().join("broken"), dir.path().join("working"));
        fs::create_dir_all(&problem).unwrap();
        fs::create_dir_all(&reference).unwrap();
        fs::write(problem.join("a.csv"), good_line("A")).unwrap();
        fs::write(reference.join("a.csv"), good_line("B")).unwrap();

        let output = execute(
            Command::Compare {
                problem,
                reference,
                format: SummaryFormat::Json,
                output: None,
            },
            &AppConfig::default(),
        )
        .unwrap();
        assert_eq!(output.exit_code, 0);
        let json: serde_json::Value = serde_json::from_slice(&output.body).unwrap();
        assert_eq!(json["files"][0]["problem_only_keys"][0], "A");
        assert_eq!(json["files"][0]["reference_only_keys"][0], "B");
    }

    #[test]
    fn test_missing_requires_localisation_folder() {
        let dir = tempfile::tempdir().unwrap();
        let err = execute(
            Command::Missing {
                mod_root: dir.path().to_path_buf(),
                localisation: None,
                format: SummaryFormat::Markdown,
                output: None,
            },
            &AppConfig::default(),
        )
        .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }
}
