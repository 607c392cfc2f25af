//! Per-environment Helm values files.
//!
//! # Storage layout
//!
//! ```text
//! <values_root>/
//!   environments/
//!     <env>/
//!       helm-values/
//!         <app>-values.yaml
//! ```
//!
//! # Editing
//!
//! Flat keys are edited line by line so that comments, ordering and every
//! untouched byte survive. Dotted keys go through `serde_yaml`, creating
//! intermediate mappings as needed; if the document is not a mapping the
//! editor falls back to line editing with the full dotted key.
//!
//! Every `_at` function takes the values root explicitly so tests can point it
//! at a `TempDir`.

use std::path::{Path, PathBuf};

use serde_yaml::{Mapping, Value};

use crate::error::{io_err, ValuesError};
use crate::types::{AppName, Environment, HelmParameter};

// ---------------------------------------------------------------------------
// 1. Path helpers
// ---------------------------------------------------------------------------

/// `<root>/environments/<env>/helm-values/`: pure, no I/O.
pub fn values_dir_at(root: &Path, environment: Environment) -> PathBuf {
    root.join("environments")
        .join(environment.as_str())
        .join("helm-values")
}

/// `<root>/environments/<env>/helm-values/<app>-values.yaml`: pure, no I/O.
pub fn values_path_at(root: &Path, environment: Environment, app: &AppName) -> PathBuf {
    values_dir_at(root, environment).join(format!("{}-values.yaml", app.0))
}

/// What [`ensure_values_file_at`] had to create.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnsuredFile {
    pub path: PathBuf,
    pub created_dir: bool,
    pub created_file: bool,
}

/// Make sure the values directory and file exist, creating an empty file if needed.
pub fn ensure_values_file_at(
    root: &Path,
    environment: Environment,
    app: &AppName,
) -> Result<EnsuredFile, ValuesError> {
    let dir = values_dir_at(root, environment);
    let created_dir = !dir.exists();
    if created_dir {
        std::fs::create_dir_all(&dir).map_err(|e| io_err(&dir, e))?;
    }

    let path = values_path_at(root, environment, app);
    let created_file = !path.exists();
    if created_file {
        std::fs::write(&path, "").map_err(|e| io_err(&path, e))?;
    }

    Ok(EnsuredFile {
        path,
        created_dir,
        created_file,
    })
}

// ---------------------------------------------------------------------------
// 2. Read / save
// ---------------------------------------------------------------------------

pub fn read_values(path: &Path) -> Result<String, ValuesError> {
    std::fs::read_to_string(path).map_err(|e| io_err(path, e))
}

/// Write `content` through a `.tmp` sibling and rename it into place.
pub fn save_values(path: &Path, content: &str) -> Result<(), ValuesError> {
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "values.yaml".to_string());
    let tmp = path.with_file_name(format!("{file_name}.tmp"));

    std::fs::write(&tmp, content).map_err(|e| io_err(&tmp, e))?;
    if let Err(e) = std::fs::rename(&tmp, path) {
        let _ = std::fs::remove_file(&tmp);
        return Err(io_err(path, e));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// 3. Lookup
// ---------------------------------------------------------------------------

/// Current scalar stored under `key`, or `None` when it is not set.
///
/// Dotted keys are looked up as nested mappings first, then as a literal
/// top-level `a.b:` line written by the fallback editor.
pub fn current_value(content: &str, key: &str) -> Option<String> {
    if !key.contains('.') {
        return line_value(content, key);
    }

    match serde_yaml::from_str::<Value>(content) {
        Ok(Value::Mapping(root)) => {
            nested_value(&root, key).or_else(|| line_value(content, key))
        }
        _ => line_value(content, key),
    }
}

fn nested_value(root: &Mapping, key: &str) -> Option<String> {
    let mut segments = key.split('.');
    let mut node = root.get(segments.next()?)?;
    for segment in segments {
        node = node.as_mapping()?.get(segment)?;
    }
    render_value(node)
}

fn line_value(content: &str, key: &str) -> Option<String> {
    let prefix = format!("{key}:");
    content
        .lines()
        .find(|line| is_top_level_key_line(line, &prefix))
        .and_then(|line| line.split_once(':'))
        .map(|(_, value)| value.trim().to_string())
}

fn render_value(node: &Value) -> Option<String> {
    match node {
        Value::Mapping(_) | Value::Sequence(_) => serde_yaml::to_string(node)
            .ok()
            .map(|s| s.trim_end().to_string()),
        other => scalar_to_string(other),
    }
}

// ---------------------------------------------------------------------------
// 4. Edit
// ---------------------------------------------------------------------------

/// How a value was written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditStrategy {
    /// In-place line replacement or a single appended line.
    LineEdit,
    /// Parsed, updated and re-serialized as YAML.
    Structured,
    /// Structured edit was not possible; line editing was used instead.
    LineEditFallback { reason: String },
}

/// Result of applying [`set_value`] to a document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValuesEdit {
    pub content: String,
    pub strategy: EditStrategy,
}

/// Set `key` to `value` in `content`. Pure; the caller persists the result.
pub fn set_value(content: &str, key: &str, value: &str) -> Result<ValuesEdit, ValuesError> {
    let segments: Vec<&str> = key.split('.').collect();
    if segments.iter().any(|s| s.trim().is_empty()) {
        return Err(ValuesError::InvalidKey(key.to_string()));
    }

    if segments.len() == 1 {
        return Ok(ValuesEdit {
            content: line_edit(content, key, value),
            strategy: EditStrategy::LineEdit,
        });
    }

    match structured_edit(content, &segments, value) {
        Ok(content) => Ok(ValuesEdit {
            content,
            strategy: EditStrategy::Structured,
        }),
        Err(reason) => Ok(ValuesEdit {
            content: line_edit(content, key, value),
            strategy: EditStrategy::LineEditFallback { reason },
        }),
    }
}

fn line_edit(content: &str, key: &str, value: &str) -> String {
    let prefix = format!("{key}:");
    let replacement = format!("{key}: {value}");

    let mut out = String::with_capacity(content.len() + replacement.len() + 1);
    let mut replaced = false;
    for line in content.split_inclusive('\n') {
        let (body, terminator) = split_terminator(line);
        if !replaced && is_top_level_key_line(body, &prefix) {
            out.push_str(&replacement);
            out.push_str(terminator);
            replaced = true;
        } else {
            out.push_str(line);
        }
    }

    if !replaced {
        if !out.is_empty() && !out.ends_with('\n') {
            out.push('\n');
        }
        out.push_str(&replacement);
        out.push('\n');
    }
    out
}

fn split_terminator(line: &str) -> (&str, &str) {
    if let Some(body) = line.strip_suffix("\r\n") {
        (body, "\r\n")
    } else if let Some(body) = line.strip_suffix('\n') {
        (body, "\n")
    } else {
        (line, "")
    }
}

/// Unindented line that starts with `<key>:`.
fn is_top_level_key_line(line: &str, prefix: &str) -> bool {
    line.starts_with(prefix)
}

fn structured_edit(content: &str, segments: &[&str], value: &str) -> Result<String, String> {
    let mut doc = if content.trim().is_empty() {
        Value::Mapping(Mapping::new())
    } else {
        serde_yaml::from_str::<Value>(content).map_err(|e| e.to_string())?
    };
    if doc.is_null() {
        doc = Value::Mapping(Mapping::new());
    }

    let root = doc
        .as_mapping_mut()
        .ok_or_else(|| "document root is not a mapping".to_string())?;

    let (leaf, parents) = segments
        .split_last()
        .ok_or_else(|| "empty key".to_string())?;

    let mut current: &mut Mapping = root;
    for segment in parents {
        let needs_mapping = !matches!(current.get(*segment), Some(Value::Mapping(_)));
        if needs_mapping {
            match current.get(*segment) {
                None | Some(Value::Null) => {
                    current.insert(
                        Value::String((*segment).to_string()),
                        Value::Mapping(Mapping::new()),
                    );
                }
                Some(_) => return Err(format!("'{segment}' is not a mapping")),
            }
        }
        current = match current.get_mut(*segment) {
            Some(Value::Mapping(child)) => child,
            _ => return Err(format!("'{segment}' is not a mapping")),
        };
    }

    current.insert(Value::String((*leaf).to_string()), parse_scalar(value));
    serde_yaml::to_string(&doc).map_err(|e| e.to_string())
}

/// `5` → integer, `true` → boolean, anything else stays a string.
///
/// A typed scalar is kept only when it renders back to exactly the input, so
/// `1.10`, `0x1F` or `1e3` are stored verbatim.
fn parse_scalar(value: &str) -> Value {
    match serde_yaml::from_str::<Value>(value) {
        Ok(Value::Bool(b)) if b.to_string() == value => Value::Bool(b),
        Ok(Value::Number(n)) if (n.is_i64() || n.is_u64()) && n.to_string() == value => {
            Value::Number(n)
        }
        _ => Value::String(value.to_string()),
    }
}

// ---------------------------------------------------------------------------
// 5. Helm parameters
// ---------------------------------------------------------------------------

/// Derive `spec.source.helm.parameters` from a values document.
///
/// Parsed documents are flattened to `--set` style names (`image.tag`,
/// `hosts[0]`). Documents that do not parse as a mapping contribute only their
/// unindented, non-comment `key: value` lines.
pub fn helm_parameters(content: &str) -> Vec<HelmParameter> {
    match serde_yaml::from_str::<Value>(content) {
        Ok(Value::Mapping(root)) => {
            let mut params = Vec::new();
            flatten_mapping("", &root, &mut params);
            params
        }
        Ok(Value::Null) => Vec::new(),
        _ => line_parameters(content),
    }
}

fn flatten_mapping(prefix: &str, mapping: &Mapping, out: &mut Vec<HelmParameter>) {
    for (key, value) in mapping {
        let Some(key) = scalar_to_string(key) else {
            continue;
        };
        let name = if prefix.is_empty() {
            key
        } else {
            format!("{prefix}.{key}")
        };
        flatten_value(name, value, out);
    }
}

fn flatten_value(name: String, value: &Value, out: &mut Vec<HelmParameter>) {
    match value {
        Value::Mapping(child) => flatten_mapping(&name, child, out),
        Value::Sequence(items) => {
            for (i, item) in items.iter().enumerate() {
                flatten_value(format!("{name}[{i}]"), item, out);
            }
        }
        Value::Tagged(tagged) => flatten_value(name, &tagged.value, out),
        scalar => {
            if let Some(rendered) = scalar_to_string(scalar) {
                out.push(HelmParameter::new(name, rendered));
            }
        }
    }
}

fn line_parameters(content: &str) -> Vec<HelmParameter> {
    content
        .lines()
        .filter(|line| !line.starts_with(char::is_whitespace))
        .filter(|line| !line.starts_with('#') && !line.starts_with('-'))
        .filter_map(|line| line.split_once(':'))
        .filter(|(name, _)| !name.trim().is_empty())
        .map(|(name, value)| HelmParameter::new(name.trim(), value.trim()))
        .collect()
}

fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Null => Some("null".to_string()),
        Value::Tagged(tagged) => scalar_to_string(&tagged.value),
        Value::Mapping(_) | Value::Sequence(_) => None,
    }
}

// ---------------------------------------------------------------------------
// 6. Modify (ensure → read → edit → save)
// ---------------------------------------------------------------------------

/// Everything the editor did to a values file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValuesChange {
    pub path: PathBuf,
    pub created_dir: bool,
    pub created_file: bool,
    /// Value before the edit; `None` when the key was not set.
    pub previous: Option<String>,
    pub before: String,
    pub after: String,
    pub strategy: EditStrategy,
}

/// Ensure the values file for `app` in `environment` exists and set `key` to `value`.
pub fn modify_at(
    root: &Path,
    environment: Environment,
    app: &AppName,
    key: &str,
    value: &str,
) -> Result<ValuesChange, ValuesError> {
    let ensured = ensure_values_file_at(root, environment, app)?;
    let before = read_values(&ensured.path)?;
    let previous = current_value(&before, key);

    let edit = set_value(&before, key, value)?;
    save_values(&ensured.path, &edit.content)?;

    Ok(ValuesChange {
        path: ensured.path,
        created_dir: ensured.created_dir,
        created_file: ensured.created_file,
        previous,
        before,
        after: edit.content,
        strategy: edit.strategy,
    })
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use tempfile::TempDir;

    fn app() -> AppName {
        AppName::from("app1")
    }

    #[test]
    fn values_path_is_correct() {
        let path = values_path_at(Path::new("gitops"), Environment::Staging, &app());
        assert_eq!(
            path,
            PathBuf::from("gitops/environments/staging/helm-values/app1-values.yaml")
        );
    }

    #[test]
    fn ensure_creates_dir_and_empty_file_once() {
        let root = TempDir::new().unwrap();
        let first = ensure_values_file_at(root.path(), Environment::Dev, &app()).unwrap();
        assert!(first.created_dir);
        assert!(first.created_file);
        assert_eq!(std::fs::read_to_string(&first.path).unwrap(), "");

        let second = ensure_values_file_at(root.path(), Environment::Dev, &app()).unwrap();
        assert!(!second.created_dir);
        assert!(!second.created_file);
    }

    #[test]
    fn empty_file_gets_single_line() {
        let edit = set_value("", "replicaCount", "5").unwrap();
        assert_eq!(edit.content, "replicaCount: 5\n");
        assert_eq!(edit.strategy, EditStrategy::LineEdit);
    }

    #[test]
    fn existing_key_is_replaced_in_place() {
        let before = "# comment\nreplicaCount: 2\nimage:   nginx\n";
        let edit = set_value(before, "replicaCount", "4").unwrap();
        assert_eq!(edit.content, "# comment\nreplicaCount: 4\nimage:   nginx\n");
    }

    #[test]
    fn crlf_terminator_is_kept_on_replaced_line() {
        let edit = set_value("a: 1\r\nb: 2\r\n", "a", "9").unwrap();
        assert_eq!(edit.content, "a: 9\r\nb: 2\r\n");
    }

    #[test]
    fn missing_trailing_newline_is_repaired_before_append() {
        let edit = set_value("a: 1", "b", "2").unwrap();
        assert_eq!(edit.content, "a: 1\nb: 2\n");
    }

    #[test]
    fn indented_child_with_same_name_is_not_touched() {
        let before = "image:\n  tag: v1\n";
        let edit = set_value(before, "tag", "v2").unwrap();
        assert_eq!(edit.content, "image:\n  tag: v1\ntag: v2\n");
    }

    #[test]
    fn only_first_matching_line_is_replaced() {
        let edit = set_value("a: 1\na: 2\n", "a", "3").unwrap();
        assert_eq!(edit.content, "a: 3\na: 2\n");
    }

    #[test]
    fn dotted_key_creates_nested_mapping() {
        let edit = set_value("replicaCount: 1\n", "image.tag", "v2").unwrap();
        assert_eq!(edit.strategy, EditStrategy::Structured);
        let doc: Value = serde_yaml::from_str(&edit.content).unwrap();
        assert_eq!(doc["image"]["tag"], Value::String("v2".into()));
        assert_eq!(doc["replicaCount"], Value::from(1));
    }

    #[test]
    fn dotted_key_stores_typed_scalars() {
        let edit = set_value("", "autoscaling.enabled", "true").unwrap();
        let doc: Value = serde_yaml::from_str(&edit.content).unwrap();
        assert_eq!(doc["autoscaling"]["enabled"], Value::Bool(true));
    }

    #[test]
    fn dotted_key_through_scalar_falls_back_to_line_edit() {
        let edit = set_value("image: nginx\n", "image.tag", "v2").unwrap();
        assert!(matches!(edit.strategy, EditStrategy::LineEditFallback { .. }));
        assert_eq!(edit.content, "image: nginx\nimage.tag: v2\n");
    }

    #[test]
    fn fallback_written_key_reads_back() {
        let edit = set_value("image: nginx\n", "image.tag", "v2").unwrap();
        assert_eq!(current_value(&edit.content, "image.tag"), Some("v2".into()));
        assert_eq!(current_value(&edit.content, "image"), Some("nginx".into()));
    }

    #[test]
    fn nested_value_wins_over_literal_dotted_line() {
        let content = "image:\n  tag: v1\n";
        assert_eq!(current_value(content, "image.tag"), Some("v1".into()));
        assert_eq!(current_value(content, "image.digest"), None);
    }

    #[rstest]
    #[case("1.10")]
    #[case("0x1F")]
    #[case("1e3")]
    #[case("05")]
    #[case("True")]
    fn non_canonical_literals_are_stored_verbatim(#[case] literal: &str) {
        let edit = set_value("image:\n  repository: nginx\n", "image.tag", literal).unwrap();
        let doc: Value = serde_yaml::from_str(&edit.content).unwrap();
        assert_eq!(doc["image"]["tag"], Value::String(literal.into()));
        assert_eq!(current_value(&edit.content, "image.tag"), Some(literal.into()));

        let params = helm_parameters(&edit.content);
        assert!(params.contains(&HelmParameter::new("image.tag", literal)));
    }

    #[test]
    fn plain_integers_stay_numbers() {
        let edit = set_value("", "resources.replicas", "5").unwrap();
        let doc: Value = serde_yaml::from_str(&edit.content).unwrap();
        assert_eq!(doc["resources"]["replicas"], Value::from(5));
    }

    #[test]
    fn unparseable_document_falls_back_to_line_edit() {
        let edit = set_value("a: [unclosed\n", "x.y", "1").unwrap();
        assert!(matches!(edit.strategy, EditStrategy::LineEditFallback { .. }));
        assert!(edit.content.ends_with("x.y: 1\n"));
    }

    #[test]
    fn invalid_keys_are_rejected() {
        assert!(matches!(
            set_value("", "", "1"),
            Err(ValuesError::InvalidKey(_))
        ));
        assert!(matches!(
            set_value("", "image..tag", "1"),
            Err(ValuesError::InvalidKey(_))
        ));
    }

    #[test]
    fn current_value_reads_flat_and_nested_keys() {
        let content = "replicaCount: 3\nimage:\n  tag: v1\n";
        assert_eq!(current_value(content, "replicaCount").as_deref(), Some("3"));
        assert_eq!(current_value(content, "image.tag").as_deref(), Some("v1"));
        assert_eq!(current_value(content, "missing"), None);
        assert_eq!(current_value(content, "image.missing"), None);
    }

    #[test]
    fn parameters_flatten_nested_documents() {
        let content = "replicaCount: 2\nimage:\n  repository: nginx\n  tag: \"1.25\"\nhosts:\n  - a.example\n  - b.example\n";
        let params = helm_parameters(content);
        assert_eq!(
            params,
            vec![
                HelmParameter::new("replicaCount", "2"),
                HelmParameter::new("image.repository", "nginx"),
                HelmParameter::new("image.tag", "1.25"),
                HelmParameter::new("hosts[0]", "a.example"),
                HelmParameter::new("hosts[1]", "b.example"),
            ]
        );
    }

    #[test]
    fn parameters_from_unparseable_document_use_top_level_lines() {
        let content = "# header\na: [unclosed\n  nested: 1\nb: 2\n";
        let params = helm_parameters(content);
        assert_eq!(
            params,
            vec![
                HelmParameter::new("a", "[unclosed"),
                HelmParameter::new("b", "2"),
            ]
        );
    }

    #[test]
    fn parameters_of_empty_document_are_empty() {
        assert!(helm_parameters("").is_empty());
        assert!(helm_parameters("# only a comment\n").is_empty());
    }

    #[test]
    fn modify_reports_previous_value_and_persists() {
        let root = TempDir::new().unwrap();
        let path = values_path_at(root.path(), Environment::Production, &app());
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, "replicaCount: 2\n").unwrap();

        let change =
            modify_at(root.path(), Environment::Production, &app(), "replicaCount", "6").unwrap();
        assert_eq!(change.previous.as_deref(), Some("2"));
        assert!(!change.created_file);
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "replicaCount: 6\n");
    }

    #[test]
    fn save_cleans_up_tmp() {
        let root = TempDir::new().unwrap();
        let path = root.path().join("app1-values.yaml");
        save_values(&path, "a: 1\n").unwrap();
        assert!(!root.path().join("app1-values.yaml.tmp").exists());
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "a: 1\n");
    }
}
