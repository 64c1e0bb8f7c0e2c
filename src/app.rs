//! Application orchestration.
//!
//! Wires the pipeline together: pre-flight validation, indexing, candidate
//! narrowing, the listing + confirmation gate, the selected file operation,
//! and the report files. Returns an [`ExitCode`] for `main` to map onto the
//! process exit status.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use bytesize::ByteSize;
use indicatif::ProgressBar;
use yansi::Paint;

use crate::cli::Cli;
use crate::config::Config;
use crate::duplicates::{
    all_records, extras, masters, CandidateFilter, Criterion, CriterionSet, DuplicateGroup,
    FilterError, Narrowed, ReferenceDiffEngine,
};
use crate::error::{AppError, ExitCode};
use crate::ops::{
    confirm, copy::copy_uniques, extras::hardlink_extras, extras::remove_extras,
    links::link_duplicates, relocate::move_back, relocate::move_duplicates, FileOperation,
    OpOutcome, DUPLICATES_DIR,
};
use crate::report::{
    ReportWriter, COPIED_REPORT, DUPLICATES_REPORT, EXTRAS_REPORT, MASTERS_REPORT, MOVED_REPORT,
};
use crate::scanner::{Indexer, IndexerConfig, Prober, ProberConfig};
use crate::{logging, signal};

/// Run the application logic for parsed CLI arguments.
///
/// # Errors
///
/// Pre-flight failures ([`AppError`]) and interruption
/// ([`FilterError::Interrupted`]) propagate; everything per-file is
/// reported and folded into the exit code instead.
pub fn run_app(cli: Cli) -> anyhow::Result<ExitCode> {
    logging::init_logging(cli.verbose, cli.quiet);
    if cli.no_color {
        yansi::disable();
    }

    let target = validate_directory(&cli.target)?;
    let operation = cli.operation();
    let config = Config::load();
    let shutdown = signal::install();

    log::debug!("Operation: {operation}, target: {}", target.display());

    // Move-back consults only the relocation directory; no scan, no criteria.
    if operation == FileOperation::MoveBack {
        return run_move_back(&target, cli.yes);
    }

    let mut criteria = cli.criteria();
    if criteria.is_empty() {
        criteria = CriterionSet::default_set();
        log::debug!("No match criteria selected, defaulting to {criteria}");
    }
    if operation.requires_checksum() && criteria.require_checksum() {
        log::info!("Checksum matching auto-enabled for --{operation}");
    }
    if criteria.contains(Criterion::Inode) && criteria.iter().count() > 1 {
        // Defense in depth; clap already rejects these combinations.
        return Err(AppError::InvalidArgumentCombination(
            "--match-inode terminates the pipeline and cannot combine with other criteria"
                .to_string(),
        )
        .into());
    }

    let indexer_config = IndexerConfig::default()
        .with_max_depth(cli.max_depth())
        .with_shutdown_flag(Arc::clone(&shutdown));
    let prober = Prober::new(
        ProberConfig::default()
            .with_headtail_bytes(cli.headtail_bytes.unwrap_or(config.headtail_bytes))
            .with_io_threads(cli.io_threads.unwrap_or(config.io_threads))
            .with_shutdown_flag(Arc::clone(&shutdown)),
    );
    let filter = CandidateFilter::new(criteria, prober);

    if let FileOperation::CopyUniques(reference_root) = &operation {
        return run_copy_uniques(&target, reference_root, &filter, indexer_config, cli.yes);
    }

    let spinner = phase_spinner(cli.quiet, "Indexing...");
    let indexed = Indexer::new(&target, indexer_config).index()?;
    spinner.finish_and_clear();
    check_interrupted(&shutdown)?;

    let scan_issues = indexed.errors.len();
    let spinner = phase_spinner(cli.quiet, "Narrowing candidates...");
    let narrowed = filter.narrow(indexed.records)?;
    spinner.finish_and_clear();
    let issues = scan_issues + narrowed.probe_failures.len();

    if narrowed.is_empty() {
        println!("No duplicates found.");
        return Ok(ExitCode::NoDuplicates);
    }

    print_listing(&narrowed);
    let reports = ReportWriter::new(&target);

    match operation {
        FileOperation::List => {
            reports.write_records(DUPLICATES_REPORT, &all_records(&narrowed.groups))?;
            reports.write_records(MASTERS_REPORT, &masters(&narrowed.groups))?;
            reports.write_records(EXTRAS_REPORT, &extras(&narrowed.groups))?;
            println!(
                "\nReports written under {} ({DUPLICATES_REPORT}, {MASTERS_REPORT}, {EXTRAS_REPORT})",
                target.display()
            );
            Ok(completion_code(0, issues))
        }
        FileOperation::SoftLink => {
            let outcome = link_duplicates(&target, &all_records(&narrowed.groups))?;
            println!("{}", outcome.summary("Linked"));
            Ok(completion_code(outcome.failure_count(), issues))
        }
        FileOperation::Move => {
            let records = all_records(&narrowed.groups);
            let question = format!(
                "Move {} duplicate files into {}?",
                records.len(),
                target.join(DUPLICATES_DIR).display()
            );
            if !confirm(&question, cli.yes) {
                return Ok(declined());
            }
            let outcome = move_duplicates(&target, records)?;
            reports.write_records(MOVED_REPORT, &outcome.completed)?;
            println!("{}", outcome.summary("Moved"));
            Ok(completion_code(outcome.failure_count(), issues))
        }
        FileOperation::HardlinkExtras => {
            let question = format!(
                "Replace {} extra files with hard links to their masters?",
                extras(&narrowed.groups).len()
            );
            if !confirm(&question, cli.yes) {
                return Ok(declined());
            }
            let outcome = hardlink_extras(&narrowed.groups);
            finish_extras_run(&reports, &narrowed.groups, &outcome, "Hard-linked")?;
            Ok(completion_code(outcome.failure_count(), issues))
        }
        FileOperation::RemoveExtras => {
            let doomed = extras(&narrowed.groups);
            let question = format!(
                "Permanently remove {} extra files ({})?",
                doomed.len(),
                ByteSize(doomed.iter().map(|r| r.size).sum())
            );
            if !confirm(&question, cli.yes) {
                return Ok(declined());
            }
            let outcome = remove_extras(&narrowed.groups);
            finish_extras_run(&reports, &narrowed.groups, &outcome, "Removed")?;
            Ok(completion_code(outcome.failure_count(), issues))
        }
        FileOperation::MoveBack | FileOperation::CopyUniques(_) => {
            unreachable!("dispatched before the scan")
        }
    }
}

fn run_move_back(target: &Path, assume_yes: bool) -> anyhow::Result<ExitCode> {
    let dup_dir = target.join(DUPLICATES_DIR);
    let question = format!(
        "Restore all relocated files from {} to their original paths?",
        dup_dir.display()
    );
    if !confirm(&question, assume_yes) {
        return Ok(declined());
    }
    let outcome = move_back(target)?;
    println!("{}", outcome.summary("Restored"));
    for (path, error) in &outcome.failures {
        println!("  {} {}: {error}", "failed".red(), path.display());
    }
    Ok(completion_code(outcome.failure_count(), 0))
}

fn run_copy_uniques(
    target: &Path,
    reference_root: &Path,
    filter: &CandidateFilter,
    indexer_config: IndexerConfig,
    assume_yes: bool,
) -> anyhow::Result<ExitCode> {
    let reference_root = validate_directory(reference_root)?;
    let engine = ReferenceDiffEngine::new(target, &reference_root, indexer_config);
    // Unwrap the error layers so main can map interruption to exit 130.
    let diff = engine.diff(filter).map_err(|e| match e {
        crate::duplicates::ReferenceError::Filter(inner) => anyhow::Error::new(inner),
        other => anyhow::Error::new(other),
    })?;
    let issues = diff.scan_errors.len() + diff.narrowed.probe_failures.len();

    if diff.uniques.is_empty() {
        println!("Nothing to import: every reference file already exists in the target.");
        return Ok(completion_code(0, issues));
    }

    println!(
        "{}",
        format!(
            "{} reference files not present in the target ({} already there):",
            diff.uniques.len(),
            diff.extras.len()
        )
        .bold()
    );
    for record in &diff.uniques {
        println!("  {}", record.path.display());
    }

    let question = format!(
        "Copy {} files from {} into {}?",
        diff.uniques.len(),
        reference_root.display(),
        target.display()
    );
    if !confirm(&question, assume_yes) {
        return Ok(declined());
    }

    let outcome = copy_uniques(target, &reference_root, &diff.uniques);
    ReportWriter::new(target).write_records(COPIED_REPORT, &outcome.completed)?;
    println!("{}", outcome.summary("Copied"));
    Ok(completion_code(outcome.failure_count(), issues))
}

fn finish_extras_run(
    reports: &ReportWriter,
    groups: &[DuplicateGroup],
    outcome: &OpOutcome,
    verb: &str,
) -> anyhow::Result<()> {
    reports.write_records(MASTERS_REPORT, &masters(groups))?;
    reports.write_records(EXTRAS_REPORT, &outcome.completed)?;
    println!("{}", outcome.summary(verb));
    for (path, error) in &outcome.failures {
        println!("  {} {}: {error}", "failed".red(), path.display());
    }
    Ok(())
}

/// Print the candidate listing shown before any confirmation.
fn print_listing(narrowed: &Narrowed) {
    let wasted: u64 = narrowed.groups.iter().map(DuplicateGroup::wasted_space).sum();
    println!(
        "{}",
        format!(
            "Found {} duplicate group(s), {} files, {} reclaimable",
            narrowed.groups.len(),
            narrowed.record_count(),
            ByteSize(wasted)
        )
        .bold()
    );
    for (i, group) in narrowed.groups.iter().enumerate() {
        println!(
            "\n{} {} files, {} each",
            format!("Group {}:", i + 1).bold(),
            group.len(),
            ByteSize(group.master().size)
        );
        println!("  {} {}", "master".green(), group.master().path.display());
        for extra in group.extras() {
            println!("  {}  {}", "extra".yellow(), extra.path.display());
        }
    }
    for failure in &narrowed.probe_failures {
        println!("{} {failure}", "probe failed:".red());
    }
}

fn validate_directory(path: &Path) -> Result<PathBuf, AppError> {
    if !path.is_dir() {
        return Err(AppError::InvalidDirectory(path.to_path_buf()));
    }
    path.canonicalize()
        .map_err(|_| AppError::InvalidDirectory(path.to_path_buf()))
}

fn check_interrupted(shutdown: &Arc<AtomicBool>) -> Result<(), FilterError> {
    if shutdown.load(Ordering::SeqCst) {
        return Err(FilterError::Interrupted);
    }
    Ok(())
}

fn declined() -> ExitCode {
    println!("Aborted; nothing was modified.");
    ExitCode::Success
}

fn completion_code(file_failures: usize, scan_issues: usize) -> ExitCode {
    if file_failures > 0 || scan_issues > 0 {
        ExitCode::PartialSuccess
    } else {
        ExitCode::Success
    }
}

fn phase_spinner(quiet: bool, message: &'static str) -> ProgressBar {
    if quiet {
        return ProgressBar::hidden();
    }
    let spinner = ProgressBar::new_spinner();
    spinner.set_message(message);
    spinner.enable_steady_tick(Duration::from_millis(100));
    spinner
}
