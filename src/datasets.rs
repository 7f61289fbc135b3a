//! Dataset-scoped model-id extraction from the generated trigger config.
//!
//! The config is a narrow, machine-generated YAML shape: a `datasets:`
//! sequence of `- name:` blocks, each carrying a `models` property either
//! inline or as an indented list, plus an unrelated `dags:` section that uses
//! the same block syntax and must never contribute ids. A full YAML parser
//! would accept far more than the generator ever emits, so this is a
//! deliberate line scanner that only recognizes that one shape.
use crate::ids::normalize_unique_id;
use regex::Regex;

/// Open regions of the scan, tracked as indentation thresholds. A region
/// closes when a non-blank line at indentation at or below its threshold
/// arrives; that line is then reconsidered in its own right.
#[derive(Debug, Default)]
struct Scan {
    /// Indent of an open `dags:` header whose body is ignored entirely.
    dags_indent: Option<usize>,
    /// Indent of the `- name:` line that opened the target block.
    target_indent: Option<usize>,
    /// Indent of an open `models:` property line inside the target block.
    models_indent: Option<usize>,
}

/// Collect the quoted model ids listed under the `models` property of the
/// dataset block named `dataset_target`. An unmatched target or a block with
/// no models yields an empty list; this is a pure function of its inputs.
pub fn dataset_model_ids(content: &str, dataset_target: &str) -> Vec<String> {
    let dags_re = Regex::new(r"^(\s*)dags\s*:\s*$").expect("regex for dags header");
    let name_re = Regex::new(r"^(\s*)-\s*name:\s*(.+)$").expect("regex for name lines");
    let models_re = Regex::new(r"\bmodels\s*:").expect("regex for models property");
    let quoted_re = Regex::new(r#""([^"]+)"|'([^']+)'"#).expect("regex for quoted spans");

    let mut unique_ids = Vec::new();
    let mut scan = Scan::default();

    for line in content.lines() {
        let indent = line.len() - line.trim_start().len();
        let blank = line.trim().is_empty();

        // The dags ignore region takes precedence over name matching: nothing
        // inside it is inspected, even a block named like the target.
        if let Some(dags_indent) = scan.dags_indent {
            if blank || indent > dags_indent {
                continue;
            }
            scan.dags_indent = None;
        }

        if let Some(models_indent) = scan.models_indent {
            if !blank && indent <= models_indent {
                // Closes the models block without being consumed as an entry.
                scan.models_indent = None;
            }
        }
        if let Some(target_indent) = scan.target_indent {
            if !blank && indent <= target_indent {
                scan.target_indent = None;
                scan.models_indent = None;
            }
        }

        if let Some(caps) = dags_re.captures(line) {
            scan.dags_indent = Some(caps[1].len());
            continue;
        }

        if let Some(caps) = name_re.captures(line) {
            let raw_name = normalize_unique_id(&caps[2]);
            scan.target_indent = (raw_name == dataset_target).then_some(indent);
            scan.models_indent = None;
            continue;
        }

        if scan.target_indent.is_none() {
            continue;
        }

        if models_re.is_match(line) {
            scan.models_indent = Some(indent);
            unique_ids.extend(extract_quoted(&quoted_re, line));
            continue;
        }

        if scan.models_indent.is_some() {
            unique_ids.extend(extract_quoted(&quoted_re, line));
        }
    }

    unique_ids
}

/// All double- or single-quoted spans on one line, in order. Depends only on
/// the line text, never on scanner state.
fn extract_quoted(quoted_re: &Regex, line: &str) -> Vec<String> {
    quoted_re
        .captures_iter(line)
        .filter_map(|caps| caps.get(1).or_else(|| caps.get(2)))
        .map(|span| span.as_str().to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
dags:
  - name: other_dag
    models: \"model.other\"
datasets:
  - name: my_dataset
    models: \"model.alpha\", \"model.beta\"
  - name: another_dataset
    models:
      - \"model.gamma\"
      - \"model.delta\"
";

    #[test]
    fn inline_models_are_extracted() {
        let ids = dataset_model_ids(SAMPLE, "my_dataset");
        assert_eq!(ids, vec!["model.alpha", "model.beta"]);
    }

    #[test]
    fn block_models_are_extracted() {
        let ids = dataset_model_ids(SAMPLE, "another_dataset");
        assert_eq!(ids, vec!["model.gamma", "model.delta"]);
    }

    #[test]
    fn unmatched_target_yields_empty() {
        assert_eq!(dataset_model_ids(SAMPLE, "nonexistent"), Vec::<String>::new());
    }

    #[test]
    fn sibling_datasets_do_not_leak() {
        let ids = dataset_model_ids(SAMPLE, "my_dataset");
        assert!(!ids.contains(&"model.gamma".to_string()));
        assert!(!ids.contains(&"model.delta".to_string()));
        assert!(!ids.contains(&"model.other".to_string()));
    }

    #[test]
    fn dags_section_is_ignored() {
        let content = "\
dags:
  - name: dag_one
    models: \"model.should_not_appear\"
datasets:
  - name: target_ds
    models: \"model.correct\"
";
        let ids = dataset_model_ids(content, "target_ds");
        assert_eq!(ids, vec!["model.correct"]);
    }

    #[test]
    fn dags_entry_sharing_the_target_name_never_matches() {
        let content = "\
dags:
  - name: my_ds
    models: \"model.from_dag\"
datasets:
  - name: my_ds
    models: \"model.from_dataset\"
";
        let ids = dataset_model_ids(content, "my_ds");
        assert_eq!(ids, vec!["model.from_dataset"]);
    }

    #[test]
    fn quoted_names_match_unquoted_targets() {
        let content = "\
datasets:
  - name: \"quoted_ds\"
    models: \"model.a\"
";
        assert_eq!(dataset_model_ids(content, "quoted_ds"), vec!["model.a"]);
    }

    #[test]
    fn line_closing_the_models_block_is_not_consumed() {
        let content = "\
datasets:
  - name: target_ds
    models:
      - \"model.a\"
    owner: \"team@example.com\"
";
        let ids = dataset_model_ids(content, "target_ds");
        assert_eq!(ids, vec!["model.a"]);
    }

    #[test]
    fn blank_lines_do_not_close_the_models_block() {
        let content = "\
datasets:
  - name: target_ds
    models:
      - \"model.a\"

      - \"model.b\"
";
        let ids = dataset_model_ids(content, "target_ds");
        assert_eq!(ids, vec!["model.a", "model.b"]);
    }

    #[test]
    fn single_quoted_entries_are_extracted() {
        let content = "\
datasets:
  - name: target_ds
    models: 'model.a', \"model.b\"
";
        assert_eq!(
            dataset_model_ids(content, "target_ds"),
            vec!["model.a", "model.b"]
        );
    }

    #[test]
    fn bare_tokens_are_never_identifiers() {
        let content = "\
datasets:
  - name: target_ds
    models:
      - model.bare
      - \"model.quoted\"
";
        assert_eq!(
            dataset_model_ids(content, "target_ds"),
            vec!["model.quoted"]
        );
    }

    #[test]
    fn extraction_is_idempotent() {
        let first = dataset_model_ids(SAMPLE, "another_dataset");
        let second = dataset_model_ids(SAMPLE, "another_dataset");
        assert_eq!(first, second);
    }
}
