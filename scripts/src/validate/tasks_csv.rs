//! Tasks CSV: one row per task with the columns in [`EXPECTED_HEADERS`].

use csv::{ReaderBuilder, StringRecord, Trim};
use std::{collections::HashSet, path::Path};

use super::{VALID_PILLARS, ValidationReport, read_input};

pub const EXPECTED_HEADERS: [&str; 8] = [
    "Pillar",
    "Task ID",
    "Title",
    "Description",
    "Status",
    "Priority",
    "Tags",
    "Example",
];
pub const VALID_STATUSES: [&str; 5] = ["pending", "in_progress", "review", "completed", "blocked"];
pub const VALID_PRIORITIES: [&str; 4] = ["low", "medium", "high", "critical"];

struct TaskRow<'a> {
    line: u64,
    headers: &'a StringRecord,
    fields: StringRecord,
}

impl TaskRow<'_> {
    fn get(&self, header: &str) -> &str {
        self.headers
            .iter()
            .position(|h| h == header)
            .and_then(|index| self.fields.get(index))
            .unwrap_or_default()
    }
}

fn check_known(
    report: &mut ValidationReport,
    line: u64,
    column: &str,
    value: &str,
    valid: &[&str],
) {
    if value.is_empty() {
        report.error(format!("Row {line}: Missing {column}"));
    } else if !valid.contains(&value) {
        report.warning(format!(
            "Row {line}: Unknown {} \"{value}\" (expected: {})",
            column.to_lowercase(),
            valid.join(", ")
        ));
    }
}

fn validate_row(report: &mut ValidationReport, row: &TaskRow, task_ids: &mut HashSet<String>) {
    let line = row.line;
    let pillar = row.get("Pillar");
    let task_id = row.get("Task ID");

    check_known(report, line, "Pillar", pillar, &VALID_PILLARS);

    if task_id.is_empty() {
        report.error(format!("Row {line}: Missing Task ID"));
    } else {
        if !task_ids.insert(task_id.to_string()) {
            report.error(format!("Row {line}: Duplicate Task ID \"{task_id}\""));
        }
        if !pillar.is_empty() && !task_id.starts_with(&format!("{pillar}-")) {
            report.warning(format!(
                "Row {line}: Task ID \"{task_id}\" should start with \"{pillar}-\""
            ));
        }
    }

    if row.get("Title").is_empty() {
        report.error(format!("Row {line}: Missing Title"));
    }
    if row.get("Description").is_empty() {
        report.warning(format!("Row {line}: Missing Description"));
    }

    check_known(report, line, "Status", row.get("Status"), &VALID_STATUSES);
    check_known(report, line, "Priority", row.get("Priority"), &VALID_PRIORITIES);
}

pub fn validate_tasks_csv(content: &str) -> anyhow::Result<ValidationReport> {
    let mut report = ValidationReport::default();

    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(Trim::All)
        .from_reader(content.trim().as_bytes());
    let mut records = reader.records();

    let Some(headers) = records.next().transpose()? else {
        report.error("CSV file is empty");
        return Ok(report);
    };

    let missing: Vec<&str> = EXPECTED_HEADERS
        .iter()
        .copied()
        .filter(|expected| !headers.iter().any(|h| h == *expected))
        .collect();
    if !missing.is_empty() {
        report.error(format!("Missing required headers: {}", missing.join(", ")));
    }

    let unexpected: Vec<&str> = headers
        .iter()
        .filter(|h| !EXPECTED_HEADERS.contains(h))
        .collect();
    if !unexpected.is_empty() {
        report.warning(format!("Unexpected headers: {}", unexpected.join(", ")));
    }

    let mut task_ids = HashSet::new();
    let mut task_count = 0;
    for record in records {
        let fields = record?;
        let line = fields.position().map(|p| p.line()).unwrap_or_default();

        if fields.len() != headers.len() {
            report.warning(format!(
                "Row {line}: Expected {} fields, found {}",
                headers.len(),
                fields.len()
            ));
        }

        let row = TaskRow {
            line,
            headers: &headers,
            fields,
        };
        validate_row(&mut report, &row, &mut task_ids);
        task_count += 1;
    }

    report.summary = format!(
        "Validated {task_count} task(s) across {} pillars",
        VALID_PILLARS.len()
    );

    Ok(report)
}

pub fn validate_file(path: &Path) -> anyhow::Result<ValidationReport> {
    let report = validate_tasks_csv(&read_input(path)?)?;
    report.log(path);

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const HEADER: &str = "Pillar,Task ID,Title,Description,Status,Priority,Tags,Example";

    #[test]
    fn test_valid_tasks() {
        let content = format!(
            "{HEADER}\n\
             BUILD,BUILD-1,Set up webhooks,\"Verify, dedupe, dispatch\",pending,high,infra,\n\
             PAYMENT,PAYMENT-1,Checkout,Stripe checkout,in_progress,critical,stripe,cs_test\n"
        );

        let report = validate_tasks_csv(&content).unwrap();

        assert!(report.errors.is_empty(), "{:?}", report.errors);
        assert!(report.warnings.is_empty(), "{:?}", report.warnings);
        assert_eq!(report.summary, "Validated 2 task(s) across 3 pillars");
    }

    #[test]
    fn test_empty_file() {
        let report = validate_tasks_csv("  \n").unwrap();

        assert_eq!(report.errors, vec!["CSV file is empty"]);
    }

    #[test]
    fn test_header_problems() {
        let report = validate_tasks_csv("Pillar,Task ID,Title,Owner\n").unwrap();

        assert_eq!(
            report.errors,
            vec!["Missing required headers: Description, Status, Priority, Tags, Example"]
        );
        assert_eq!(report.warnings, vec!["Unexpected headers: Owner"]);
    }

    #[test]
    fn test_row_problems() {
        let content = format!(
            "{HEADER}\n\
             BUILD,BUILD-1,Title,Desc,pending,low,,\n\
             BUILD,BUILD-1,,,,,,\n\
             MARKETING,X-2,Title,Desc,waiting,urgent,,\n\
             PAYMENT,PAYMENT-3,Title,Desc,review,medium\n"
        );

        let report = validate_tasks_csv(&content).unwrap();

        assert_eq!(
            report.errors,
            vec![
                "Row 3: Duplicate Task ID \"BUILD-1\"",
                "Row 3: Missing Title",
                "Row 3: Missing Status",
                "Row 3: Missing Priority",
            ]
        );
        assert_eq!(
            report.warnings,
            vec![
                "Row 3: Missing Description",
                "Row 4: Unknown pillar \"MARKETING\" (expected: BUILD, PAYMENT, YOUTUBE)",
                "Row 4: Task ID \"X-2\" should start with \"MARKETING-\"",
                "Row 4: Unknown status \"waiting\" (expected: pending, in_progress, review, completed, blocked)",
                "Row 4: Unknown priority \"urgent\" (expected: low, medium, high, critical)",
                "Row 5: Expected 8 fields, found 6",
            ]
        );
    }

    #[test]
    fn test_validate_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "{HEADER}").unwrap();
        writeln!(file, "YOUTUBE,YOUTUBE-1,Intro video,,completed,low,,").unwrap();

        let report = validate_file(file.path()).unwrap();

        assert!(report.is_valid());
        assert_eq!(report.warnings, vec!["Row 2: Missing Description"]);
    }
}
