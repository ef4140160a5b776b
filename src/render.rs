//! Diff and apply result display

use colored::Colorize;
use reconcile::{ApplyResult, Diff, Manifest, Phase, PhaseOutcome, ProgressCallback, VersionChange};
use serde_json::json;

use crate::ui;

const RULE: &str = "─────────────────────────────────────────────────────";

/// Display a diff in a user-friendly format
pub fn display_diff(diff: &Diff) {
    if diff.is_empty() {
        println!();
        println!("  {} Host matches the state file", "✓".green());
        return;
    }

    println!();
    println!("{}", box_top("Package Diff"));
    println!("│");

    let additions = diff.sorted_additions();
    if !additions.is_empty() {
        println!("│ {}", "To install".bold());
        for record in additions {
            println!(
                "│   {} {:<30} {}",
                "+".green(),
                record.name,
                version_or_blank(record.version.as_deref()).dimmed()
            );
        }
        println!("│");
    }

    let removals = diff.sorted_removals();
    if !removals.is_empty() {
        println!("│ {}", "To remove".bold());
        for record in removals {
            println!(
                "│   {} {:<30} {}",
                "-".red(),
                record.name,
                version_or_blank(record.version.as_deref()).dimmed()
            );
        }
        println!("│");
    }

    let changes = diff.sorted_changes();
    if !changes.is_empty() {
        println!("│ {}", "Version differs".bold());
        for change in changes {
            println!(
                "│   {} {:<30} {}",
                "~".yellow(),
                change.name,
                describe_change(change).dimmed()
            );
        }
        println!("│");
    }

    let summary = diff.summary();
    println!("├{RULE}┤");
    println!(
        "│ Summary: {} differences ({} to install, {} to remove, {} changed)",
        summary.total().to_string().bold(),
        summary.additions.to_string().green(),
        summary.removals.to_string().red(),
        summary.changes.to_string().yellow()
    );
    println!("└{RULE}┘");
}

/// `┌─ title ──┐`, as wide as the rule lines below it
fn box_top(title: &str) -> String {
    let fill = RULE
        .chars()
        .count()
        .saturating_sub(title.chars().count() + 3);
    format!("┌─ {title} {}┐", "─".repeat(fill))
}

fn version_or_blank(version: Option<&str>) -> String {
    version.unwrap_or_default().to_string()
}

/// `installed → declared`, with `?` for an unknown side
pub fn describe_change(change: &VersionChange) -> String {
    format!(
        "{} → {}",
        change.previous_version.as_deref().unwrap_or("?"),
        change.new_version.as_deref().unwrap_or("?")
    )
}

/// Diff as JSON: name-sorted arrays plus a summary
pub fn diff_json(diff: &Diff) -> serde_json::Value {
    json!({
        "additions": diff.sorted_additions(),
        "removals": diff.sorted_removals(),
        "changes": diff.sorted_changes(),
        "summary": diff.summary(),
    })
}

/// Print the observed manifest, one package per line
pub fn display_manifest(manifest: &Manifest) {
    for record in manifest.sorted() {
        match &record.version {
            Some(version) => println!("{} {}", record.name, version.dimmed()),
            None => println!("{}", record.name),
        }
    }
}

/// Display the outcome of both phases and any unapplied changes
pub fn display_apply_result(result: &ApplyResult) {
    ui::section("Result");
    for (phase, outcome) in [(Phase::Install, &result.install), (Phase::Removal, &result.removal)] {
        match outcome {
            PhaseOutcome::Skipped => ui::dim(&format!("{phase}: nothing to do")),
            PhaseOutcome::Planned { names } => {
                ui::info(&format!("{phase}: would run for {}", ui::packages(names.len())));
            }
            PhaseOutcome::Succeeded { names, .. } => {
                ui::success(&format!("{phase}: {}", ui::packages(names.len())));
            }
            PhaseOutcome::Failed { names, error, .. } => {
                ui::error(&format!("{phase} failed for {}", ui::packages(names.len())));
                ui::dim_err(error);
            }
        }
    }

    if !result.unapplied_changes.is_empty() {
        println!();
        ui::warn(&format!(
            "{} left unchanged (version differs, use --reinstall-changed):",
            ui::packages(result.unapplied_changes.len())
        ));
        for change in &result.unapplied_changes {
            println!("    {} {:<30} {}", "~".yellow(), change.name, describe_change(change).dimmed());
        }
    }
}

/// Reports phase progress and echoes pacman's captured output
pub struct TerminalProgress {
    quiet: bool,
}

impl TerminalProgress {
    pub fn new(quiet: bool) -> Self {
        Self { quiet }
    }
}

impl ProgressCallback for TerminalProgress {
    fn on_phase_start(&mut self, phase: Phase, names: &[String]) {
        let num = match phase {
            Phase::Install => 1,
            Phase::Removal => 2,
        };
        ui::step(num, 2, &format!("{phase}: {}", names.join(" ")));
    }

    fn on_phase_complete(&mut self, _phase: Phase, outcome: &PhaseOutcome) {
        if self.quiet {
            return;
        }
        if let PhaseOutcome::Succeeded { output, .. } | PhaseOutcome::Failed { output, .. } = outcome
            && !output.is_empty()
        {
            print!("{output}");
            if !output.ends_with('\n') {
                println!();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reconcile::{PackageRecord, compute_diff};

    fn manifest(list: &[(&str, Option<&str>)]) -> Manifest {
        Manifest::from_records(list.iter().map(|(n, v)| {
            let record = PackageRecord::new(*n).unwrap();
            match v {
                Some(v) => record.with_version(*v),
                None => record,
            }
        }))
        .unwrap()
    }

    #[test]
    fn test_box_edges_line_up() {
        let top = box_top("Package Diff");
        let rule = format!("├{RULE}┤");

        assert_eq!(top.chars().count(), rule.chars().count());
        assert!(top.starts_with("┌─ Package Diff ─"));
        assert!(top.ends_with("─┐"));
    }

    #[test]
    fn test_describe_change() {
        let change = VersionChange {
            name: "curl".into(),
            previous_version: Some("8.0".into()),
            new_version: None,
        };
        assert_eq!(describe_change(&change), "8.0 → ?");
    }

    #[test]
    fn test_diff_json_is_sorted() {
        let desired = manifest(&[("zsh", None), ("git", None), ("curl", Some("8.1"))]);
        let observed = manifest(&[("htop", None), ("curl", Some("8.0")), ("bash", None)]);

        let value = diff_json(&compute_diff(&desired, &observed));

        assert_eq!(value["additions"][0]["name"], "git");
        assert_eq!(value["additions"][1]["name"], "zsh");
        assert_eq!(value["removals"][0]["name"], "bash");
        assert_eq!(value["removals"][1]["name"], "htop");
        assert_eq!(value["changes"][0]["previous_version"], "8.0");
        assert_eq!(value["summary"]["additions"], 2);
        assert_eq!(value["summary"]["changes"], 1);
    }
}
