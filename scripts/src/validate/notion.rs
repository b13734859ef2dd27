//! Notion template: a JSON document describing the pillars and their tasks.

use serde_json::Value;
use std::{collections::HashSet, path::Path};

use super::{VALID_PILLARS, ValidationReport, read_input};

pub const REQUIRED_FIELDS: [&str; 5] = ["title", "version", "created", "description", "pillars"];
pub const TASK_REQUIRED_FIELDS: [&str; 5] = ["id", "title", "description", "status", "priority"];

/// Absent, `null`, `false`, `0` and `""` count as not provided.
fn is_present(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => false,
        Some(Value::Bool(flag)) => *flag,
        Some(Value::Number(number)) => number.as_f64().is_some_and(|n| n != 0.0),
        Some(Value::String(text)) => !text.is_empty(),
        Some(Value::Array(_)) | Some(Value::Object(_)) => true,
    }
}

/// Label used for a pillar in messages: its name, or its index when unnamed.
fn pillar_label(pillar: &Value, index: usize) -> String {
    match pillar.get("name") {
        Some(name) if is_present(Some(name)) => name
            .as_str()
            .map(str::to_string)
            .unwrap_or_else(|| name.to_string()),
        _ => index.to_string(),
    }
}

fn validate_tasks(report: &mut ValidationReport, label: &str, tasks: &[Value]) {
    for (task_index, task) in tasks.iter().enumerate() {
        for field in TASK_REQUIRED_FIELDS {
            if !is_present(task.get(field)) {
                report.error(format!(
                    "Task at pillar \"{label}\" index {task_index} missing \"{field}\""
                ));
            }
        }

        if let Some(task_id) = task.get("id").and_then(Value::as_str) {
            let prefix = format!("{label}-");
            if !task_id.is_empty() && !task_id.starts_with(&prefix) {
                report.warning(format!(
                    "Task ID \"{task_id}\" should start with \"{prefix}\""
                ));
            }
        }
    }
}

fn validate_pillars(report: &mut ValidationReport, pillars: &[Value]) {
    let mut found_pillars = HashSet::new();

    for (index, pillar) in pillars.iter().enumerate() {
        let label = pillar_label(pillar, index);
        let name = pillar
            .get("name")
            .and_then(Value::as_str)
            .filter(|name| !name.is_empty());

        match name {
            None if !is_present(pillar.get("name")) => {
                report.error(format!("Pillar at index {index} missing \"name\" field"));
            }
            _ => {
                found_pillars.insert(label.clone());
                if !VALID_PILLARS.contains(&label.as_str()) {
                    report.warning(format!(
                        "Pillar \"{label}\" is not a standard pillar name (expected: {})",
                        VALID_PILLARS.join(", ")
                    ));
                }
            }
        }

        if !is_present(pillar.get("focus")) {
            report.error(format!("Pillar \"{label}\" missing \"focus\" field"));
        }
        if !is_present(pillar.get("color")) {
            report.warning(format!("Pillar \"{label}\" missing \"color\" field"));
        }

        match pillar.get("tasks") {
            tasks if !is_present(tasks) => {
                report.error(format!("Pillar \"{label}\" missing \"tasks\" field"));
            }
            Some(Value::Array(tasks)) => validate_tasks(report, &label, tasks),
            _ => report.error(format!("Pillar \"{label}\" tasks must be an array")),
        }
    }

    for name in VALID_PILLARS {
        if !found_pillars.contains(name) {
            report.warning(format!("Standard pillar \"{name}\" not found"));
        }
    }
}

/// `<PILLAR>-<NNN>`, e.g. `BUILD-001`
fn is_task_id_format(task_id: &str) -> bool {
    task_id.split_once('-').is_some_and(|(pillar, number)| {
        !pillar.is_empty()
            && pillar.chars().all(|c| c.is_ascii_uppercase())
            && number.len() == 3
            && number.chars().all(|c| c.is_ascii_digit())
    })
}

/// `#RRGGBB`
fn is_hex_color(color: &str) -> bool {
    color.len() == 7
        && color.starts_with('#')
        && color[1..].chars().all(|c| c.is_ascii_hexdigit())
}

fn is_emoji(c: char) -> bool {
    matches!(c, '\u{1F300}'..='\u{1F9FF}' | '\u{2600}'..='\u{26FF}' | '\u{2700}'..='\u{27BF}')
}

fn workflow_values<'a>(data: &'a Value, key: &str) -> Option<HashSet<&'a str>> {
    data.get("workflow")?
        .get(key)?
        .as_array()
        .map(|values| values.iter().filter_map(Value::as_str).collect())
}

/// Formatting problems that Notion imports tolerate but that make the board inconsistent.
fn check_quality(report: &mut ValidationReport, data: &Value, pillars: &[Value]) {
    let statuses = workflow_values(data, "statuses");
    let priorities = workflow_values(data, "priorities");
    let mut task_ids = HashSet::new();

    for (index, pillar) in pillars.iter().enumerate() {
        let label = pillar_label(pillar, index);

        if let Some(color) = pillar.get("color").and_then(Value::as_str) {
            if !color.is_empty() && !is_hex_color(color) {
                report.warning(format!(
                    "Pillar \"{label}\" has invalid color format: {color}"
                ));
            }
        }

        let Some(tasks) = pillar.get("tasks").and_then(Value::as_array) else {
            continue;
        };

        for task in tasks {
            let Some(task_id) = task.get("id").and_then(Value::as_str) else {
                continue;
            };

            if !is_task_id_format(task_id) {
                report.warning(format!(
                    "Invalid task ID format: \"{task_id}\" (expected: PILLAR-NNN)"
                ));
            }
            if !task_ids.insert(task_id) {
                report.error(format!("Duplicate task ID found: \"{task_id}\""));
            }

            if task
                .get("tags")
                .and_then(Value::as_array)
                .is_some_and(|tags| {
                    tags.iter()
                        .any(|tag| tag.as_str().is_none_or(|tag| tag.trim().is_empty()))
                })
            {
                report.warning(format!("Task \"{task_id}\" has empty tags"));
            }

            for (field, allowed) in [("status", &statuses), ("priority", &priorities)] {
                let (Some(allowed), Some(value)) =
                    (allowed, task.get(field).and_then(Value::as_str))
                else {
                    continue;
                };
                if !allowed.contains(value) {
                    report.warning(format!(
                        "Task \"{task_id}\" has {field} \"{value}\" not in workflow"
                    ));
                }
            }
        }
    }
}

/// Emojis break some Notion CSV/API imports; every string in the document is checked.
fn check_for_emojis(report: &mut ValidationReport, value: &Value, path: &str) {
    match value {
        Value::String(text) if text.chars().any(is_emoji) => {
            report.warning(format!("Emoji found at {path}: \"{text}\""));
        }
        Value::Array(items) => {
            for (index, item) in items.iter().enumerate() {
                check_for_emojis(report, item, &format!("{path}[{index}]"));
            }
        }
        Value::Object(fields) => {
            for (key, field) in fields {
                check_for_emojis(report, field, &format!("{path}.{key}"));
            }
        }
        _ => {}
    }
}

pub fn validate_notion(data: &Value) -> ValidationReport {
    let mut report = ValidationReport::default();

    for field in REQUIRED_FIELDS {
        if !is_present(data.get(field)) {
            report.error(format!("Missing required field: {field}"));
        }
    }

    match data.get("pillars") {
        Some(Value::Array(pillars)) => validate_pillars(&mut report, pillars),
        pillars if is_present(pillars) => report.error("Field \"pillars\" must be an array"),
        _ => {}
    }

    if let Some(workflow) = data.get("workflow").filter(|w| is_present(Some(*w))) {
        if !workflow.get("statuses").is_some_and(Value::is_array) {
            report.warning("Workflow statuses should be defined as an array");
        }
        if !workflow.get("priorities").is_some_and(Value::is_array) {
            report.warning("Workflow priorities should be defined as an array");
        }
    }

    let pillars = data
        .get("pillars")
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or_default();
    check_quality(&mut report, data, pillars);
    check_for_emojis(&mut report, data, "root");

    let task_count: usize = pillars
        .iter()
        .filter_map(|pillar| pillar.get("tasks").and_then(Value::as_array))
        .map(Vec::len)
        .sum();
    report.summary = format!(
        "Found {} pillars with {task_count} total tasks",
        pillars.len()
    );

    report
}

pub fn validate_file(path: &Path) -> anyhow::Result<ValidationReport> {
    let data: Value = serde_json::from_str(&read_input(path)?)
        .map_err(|e| anyhow::anyhow!("Failed to parse JSON: {}", e))?;

    let report = validate_notion(&data);
    report.log(path);

    Ok(report)
}
