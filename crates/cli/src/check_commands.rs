use std::path::Path;

use {
    anyhow::Result,
    roster_config::{ResolverConfig, RosterConfig, Severity},
    roster_content::{ContentTable, SlotOutcome, inspect},
};

/// ANSI color codes.
const RED: &str = "\x1b[31m";
const YELLOW: &str = "\x1b[33m";
const GREEN: &str = "\x1b[32m";
const BOLD: &str = "\x1b[1m";
const RESET: &str = "\x1b[0m";

/// One slot that will not be sent as-is.
#[derive(Debug, PartialEq, Eq)]
struct SlotIssue {
    row: usize,
    name: String,
    slot: usize,
    malformed: bool,
    detail: String,
}

#[derive(Debug, Default, PartialEq, Eq)]
struct TableReport {
    rows: usize,
    characters: usize,
    wallpapers: usize,
    duplicates: Vec<String>,
    issues: Vec<SlotIssue>,
}

fn report(table: &ContentTable, resolver: &ResolverConfig) -> TableReport {
    let mut issues = Vec::new();
    for entry in table.load_all() {
        for slot in inspect(entry) {
            let (malformed, detail) = match slot.outcome {
                SlotOutcome::Malformed(reason) => (true, reason),
                SlotOutcome::UnknownKind(Some(kind)) => {
                    (false, format!("unknown type \"{kind}\", skipped"))
                },
                SlotOutcome::UnknownKind(None) => (false, "missing type, skipped".to_string()),
                SlotOutcome::Empty | SlotOutcome::Decoded(_) => continue,
            };
            issues.push(SlotIssue {
                row: entry.row,
                name: entry.name.clone(),
                slot: slot.slot,
                malformed,
                detail,
            });
        }
    }

    TableReport {
        rows: table.len(),
        characters: table.find_by_action(&resolver.intro_action).len(),
        wallpapers: table.find_by_action(&resolver.wallpaper_action).len(),
        duplicates: table
            .duplicates()
            .into_iter()
            .map(|(name, action, row)| format!("row {row}: {name}/{action} shadowed by an earlier row"))
            .collect(),
        issues,
    }
}

pub fn check(config: &RosterConfig, source: Option<&Path>) -> Result<()> {
    if let Some(path) = source {
        eprintln!("Checking {}\n", path.display());
    } else {
        eprintln!("No config file found; checking defaults.\n");
    }

    let result = roster_config::validate(config);
    for d in &result.diagnostics {
        let (color, label) = match d.severity {
            Severity::Error => (RED, "error"),
            Severity::Warning => (YELLOW, "warning"),
        };
        eprintln!("  {BOLD}{color}{label}{RESET} {}: {}", d.path, d.message);
    }

    let table_path = &config.content.path;
    let table = match ContentTable::load(table_path) {
        Ok(table) => table,
        Err(e) => {
            eprintln!("  {BOLD}{RED}error{RESET} content.path: {e}");
            anyhow::bail!("reply table {} could not be loaded", table_path.display());
        },
    };

    let report = report(&table, &config.resolver);
    eprintln!(
        "\n{BOLD}{}{RESET}: {} rows, {} characters, {} wallpapers",
        table_path.display(),
        report.rows,
        report.characters,
        report.wallpapers
    );
    for line in &report.duplicates {
        eprintln!("  {BOLD}{YELLOW}warning{RESET} {line}");
    }
    for issue in &report.issues {
        let (color, label) = if issue.malformed {
            (RED, "malformed")
        } else {
            (YELLOW, "skipped")
        };
        eprintln!(
            "  {BOLD}{color}{label}{RESET} row {} ({}) message{}: {}",
            issue.row, issue.name, issue.slot, issue.detail
        );
    }

    let errors = result.count(Severity::Error);
    let warnings = result.count(Severity::Warning) + report.duplicates.len();
    if errors == 0 && warnings == 0 && report.issues.is_empty() {
        eprintln!("\n{GREEN}No issues found.{RESET}");
    } else {
        eprintln!(
            "\n{errors} error(s), {warnings} warning(s), {} slot issue(s)",
            report.issues.len()
        );
    }

    if result.has_errors() {
        anyhow::bail!("configuration has {errors} error(s)");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use roster_content::ReplyEntry;

    use super::*;

    #[test]
    fn report_counts_pools_and_flags_bad_slots() {
        let table = ContentTable::from_entries([
            ReplyEntry::new("Alice", "intro")
                .with_slot(1, r#"{"type":"text","text":"hi"}"#)
                .with_slot(2, r#"{"type":"carousel"}"#)
                .with_slot(4, "{oops"),
            ReplyEntry::new("Bob", "intro"),
            ReplyEntry::new("wallpaper1", "img"),
            ReplyEntry::new("Alice", "intro"),
        ]);

        let report = report(&table, &ResolverConfig::default());
        assert_eq!(report.rows, 4);
        assert_eq!(report.characters, 3);
        assert_eq!(report.wallpapers, 1);
        assert_eq!(report.duplicates.len(), 1);

        let slots: Vec<_> = report
            .issues
            .iter()
            .map(|i| (i.slot, i.malformed))
            .collect();
        assert_eq!(slots, vec![(2, false), (4, true)]);
        assert!(report.issues[0].detail.contains("carousel"));
    }

    #[test]
    fn check_fails_when_table_is_missing() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = RosterConfig::default();
        config.content.path = dir.path().join("absent.xlsx");
        assert!(check(&config, None).is_err());
    }

    #[test]
    fn check_passes_on_a_clean_csv() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("reply.csv");
        std::fs::write(
            &path,
            "name,action,message1,message2,message3,message4,message5\n\
             Alice,intro,\"{\"\"type\"\":\"\"text\"\",\"\"text\"\":\"\"hi\"\"}\",,,,\n",
        )
        .unwrap();
        let mut config = RosterConfig::default();
        config.content.path = path;
        assert!(check(&config, None).is_ok());
    }
}
