//! `md3kit validate`

use std::path::PathBuf;
use std::time::Instant;

use console::style;

use crate::batch::{find_md3_files, validate_files_with_progress};
use crate::cli::progress::{CUBE, LOOKING_GLASS, print_done, print_step, simple_bar};

/// Validate files and directories of MD3 models.
///
/// # Errors
/// Fails if any file does not decode.
pub fn execute(paths: &[PathBuf], lenient: bool, quiet: bool) -> anyhow::Result<()> {
    let started = Instant::now();

    if !quiet {
        print_step(1, 2, &LOOKING_GLASS, "Collecting MD3 files...");
    }
    let files = collect(paths);
    if files.is_empty() {
        println!("No MD3 files found");
        return Ok(());
    }

    if !quiet {
        print_step(2, 2, &CUBE, &format!("Validating {} files...", files.len()));
    }
    let pb = if quiet {
        indicatif::ProgressBar::hidden()
    } else {
        simple_bar(files.len() as u64, "Validating")
    };
    let result = validate_files_with_progress(&files, &super::read_options(lenient), |progress| {
        pb.set_position(progress.current as u64);
        if let Some(ref name) = progress.current_file {
            pb.set_message(name.clone());
        }
    });
    pb.finish_and_clear();

    for report in &result.results {
        let name = report.path.display();
        match &report.error {
            Some(error) => println!("{} {name}: {error}", style("FAIL").red().bold()),
            None if !quiet && report.warning_count() > 0 => {
                println!("{} {name}", style("WARN").yellow().bold());
            }
            None if !quiet => println!("{} {name}", style("OK").green()),
            None => {}
        }
        if !quiet || report.error.is_some() {
            for d in &report.diagnostics {
                println!("    {d}");
            }
        }
    }

    if !quiet {
        println!();
        println!("Validation complete:");
        println!("  Success: {}", result.success_count);
        println!("  Failed: {}", result.fail_count);
        print_done(started.elapsed());
    }

    if result.fail_count > 0 {
        anyhow::bail!("{} of {} files failed to decode", result.fail_count, files.len());
    }
    Ok(())
}

/// Expand directories to the MD3 files beneath them; files pass through.
fn collect(paths: &[PathBuf]) -> Vec<PathBuf> {
    paths
        .iter()
        .flat_map(|p| {
            if p.is_dir() {
                find_md3_files(p)
            } else {
                vec![p.clone()]
            }
        })
        .collect()
}
