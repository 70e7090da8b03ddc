use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use serde_yaml::{Mapping, Value};
use tracing::{debug, warn};

use crate::action::Action;
use crate::condition::{Condition, Pattern};
use crate::error::RuleError;
use crate::fact::FactField;
use crate::rule::Rule;

const INLINE_SOURCE: &str = "<inline>";

/// Loads rules from a file, or from every `json`/`yaml`/`yml` file of a
/// directory in file-name order. Declared order is preserved.
pub fn load_rules(path: impl AsRef<Path>) -> Result<Vec<Rule>, RuleError> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(RuleError::MissingPath(path.display().to_string()));
    }

    let rules = if path.is_dir() {
        load_from_directory(path)?
    } else {
        load_from_file(path)?
    };

    warn_on_duplicate_names(&rules);
    Ok(rules)
}

/// Parses an in-memory rule document.
pub fn parse_rules(raw: &str) -> Result<Vec<Rule>, RuleError> {
    let rules = parse_document(raw, Path::new(INLINE_SOURCE))?;
    warn_on_duplicate_names(&rules);
    Ok(rules)
}

fn load_from_directory(path: &Path) -> Result<Vec<Rule>, RuleError> {
    let mut files: Vec<PathBuf> = Vec::new();
    for entry in fs::read_dir(path).map_err(|err| RuleError::from_io(path, err))? {
        let entry = entry.map_err(|err| RuleError::from_io(path, err))?;
        let file_type = entry
            .file_type()
            .map_err(|err| RuleError::from_io(entry.path(), err))?;
        if file_type.is_dir() {
            continue;
        }

        let entry_path = entry.path();
        if let Some(ext) = entry_path.extension().and_then(|value| value.to_str()) {
            if matches!(ext, "json" | "yaml" | "yml") {
                files.push(entry_path);
            }
        }
    }
    files.sort();

    let mut rules = Vec::new();
    for file in files {
        let mut file_rules = load_from_file(&file)?;
        rules.append(&mut file_rules);
    }
    Ok(rules)
}

fn load_from_file(path: &Path) -> Result<Vec<Rule>, RuleError> {
    let raw = fs::read_to_string(path).map_err(|err| RuleError::from_io(path, err))?;
    parse_document(&raw, path)
}

fn parse_document(raw: &str, path: &Path) -> Result<Vec<Rule>, RuleError> {
    let document: Value = serde_yaml::from_str(raw)
        .map_err(|err| RuleError::parse_error(path.to_path_buf(), err.to_string()))?;

    let entries = match document {
        Value::Null => return Ok(Vec::new()),
        Value::Sequence(entries) => entries,
        Value::Mapping(mut map) => {
            let section = ["pull_request_rules", "rules"]
                .into_iter()
                .find_map(|key| map.remove(key));
            for key in map.keys() {
                debug!(path = %path.display(), key = ?key, "ignoring top-level section");
            }
            match section {
                Some(Value::Sequence(entries)) => entries,
                Some(Value::Null) => Vec::new(),
                Some(_) => {
                    return Err(RuleError::parse_error(
                        path.to_path_buf(),
                        "rule section must be a list",
                    ))
                }
                None => {
                    return Err(RuleError::parse_error(
                        path.to_path_buf(),
                        "expected a `pull_request_rules` or `rules` list",
                    ))
                }
            }
        }
        _ => {
            return Err(RuleError::parse_error(
                path.to_path_buf(),
                "expected a mapping or a list of rules",
            ))
        }
    };

    entries
        .into_iter()
        .enumerate()
        .map(|(index, entry)| {
            let raw: RawRule = serde_yaml::from_value(entry).map_err(|err| {
                RuleError::parse_error(path.to_path_buf(), format!("rule #{}: {}", index + 1, err))
            })?;
            raw.compile()
        })
        .collect()
}

fn warn_on_duplicate_names(rules: &[Rule]) {
    let mut seen = HashSet::new();
    for rule in rules {
        if !seen.insert(rule.name.as_str()) {
            warn!(rule = %rule.name, "rule name is declared more than once");
        }
    }
}

#[derive(Debug, Deserialize)]
struct RawRule {
    name: String,
    #[serde(default)]
    description: Option<String>,
    #[serde(default = "Rule::default_enabled")]
    enabled: bool,
    #[serde(default)]
    conditions: Vec<Value>,
    #[serde(default)]
    actions: Mapping,
}

impl RawRule {
    fn compile(self) -> Result<Rule, RuleError> {
        let conditions = self
            .conditions
            .iter()
            .map(|entry| compile_condition(&self.name, entry))
            .collect::<Result<Vec<_>, _>>()?;
        let actions = compile_actions(&self.name, &self.actions)?;

        Ok(Rule {
            name: self.name,
            description: self.description,
            enabled: self.enabled,
            condition: Condition::and(conditions),
            actions,
        })
    }
}

fn compile_condition(rule: &str, entry: &Value) -> Result<Condition, RuleError> {
    match entry {
        Value::String(expression) => parse_expression(rule, expression),
        Value::Mapping(map) if map.len() == 1 => {
            let (key, value) = map
                .iter()
                .next()
                .ok_or_else(|| RuleError::invalid_condition(rule, "empty condition mapping"))?;
            let operator = key
                .as_str()
                .ok_or_else(|| RuleError::invalid_condition(rule, "condition keys must be strings"))?;
            match operator {
                "or" => Ok(Condition::or(compile_list(rule, operator, value)?)),
                "and" => Ok(Condition::and(compile_list(rule, operator, value)?)),
                "not" => Ok(Condition::not(compile_condition(rule, value)?)),
                other => Err(RuleError::unknown_operator(rule, other)),
            }
        }
        Value::Mapping(_) => Err(RuleError::invalid_condition(
            rule,
            "a condition mapping must have exactly one of `or`, `and`, `not`",
        )),
        other => Err(RuleError::invalid_condition(
            rule,
            format!("unsupported condition entry {:?}", other),
        )),
    }
}

fn compile_list(rule: &str, operator: &str, value: &Value) -> Result<Vec<Condition>, RuleError> {
    match value {
        Value::Sequence(entries) => entries
            .iter()
            .map(|entry| compile_condition(rule, entry))
            .collect(),
        _ => Err(RuleError::invalid_condition(
            rule,
            format!("`{}` expects a list of conditions", operator),
        )),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Operator {
    Eq,
    Ne,
    Search,
}

enum Attribute {
    Field(FactField),
    Success,
    Failure,
    Pending,
    Label,
}

impl Attribute {
    fn parse(name: &str) -> Option<Self> {
        if let Some(field) = FactField::from_attribute(name) {
            return Some(Attribute::Field(field));
        }
        match name {
            "status-success" | "check-success" => Some(Attribute::Success),
            "status-failure" | "check-failure" => Some(Attribute::Failure),
            "status-pending" | "check-pending" => Some(Attribute::Pending),
            "label" => Some(Attribute::Label),
            _ => None,
        }
    }
}

/// Known operators, longest first so `==` is not read as `=` followed by `=`.
const OPERATORS: [(&str, Operator); 4] = [
    ("!=", Operator::Ne),
    ("~=", Operator::Search),
    ("==", Operator::Eq),
    ("=", Operator::Eq),
];

/// Splits the leading operator off `rest`; the remainder is the value verbatim,
/// so values may themselves start with `!`, `=` or `<`.
fn split_operator(rest: &str) -> Option<(Operator, &str)> {
    OPERATORS
        .iter()
        .find_map(|(token, operator)| rest.strip_prefix(token).map(|value| (*operator, value)))
}

/// Parses `[-]attribute<op>value`, e.g. `base=master`, `base~=2\.\d`,
/// `-status-success=DCO`.
fn parse_expression(rule: &str, expression: &str) -> Result<Condition, RuleError> {
    let trimmed = expression.trim();
    let (negated, body) = match trimmed.strip_prefix('-') {
        Some(rest) => (true, rest.trim_start()),
        None => (false, trimmed),
    };

    let name_len = body
        .find(|c: char| !(c.is_ascii_alphanumeric() || c == '-' || c == '_'))
        .unwrap_or(body.len());
    let (name, rest) = body.split_at(name_len);
    if name.is_empty() {
        return Err(RuleError::invalid_condition(
            rule,
            format!("cannot parse condition {:?}", expression),
        ));
    }

    let attribute =
        Attribute::parse(name).ok_or_else(|| RuleError::unknown_operator(rule, name))?;

    let rest = rest.trim_start();
    if rest.is_empty() {
        return Err(RuleError::invalid_condition(
            rule,
            format!("attribute `{}` requires an operator and a value", name),
        ));
    }
    let (operator, value) = match split_operator(rest) {
        Some((operator, value)) => (operator, value.trim()),
        None => {
            let token_len = rest
                .find(|c: char| !matches!(c, '=' | '!' | '~' | '<' | '>'))
                .unwrap_or(rest.len());
            if token_len == 0 {
                return Err(RuleError::invalid_condition(
                    rule,
                    format!("missing operator after `{}` in {:?}", name, expression),
                ));
            }
            return Err(RuleError::unknown_operator(
                rule,
                format!("{}{}", name, &rest[..token_len]),
            ));
        }
    };

    let condition = match attribute {
        Attribute::Field(field) => match operator {
            Operator::Eq => Condition::equals(field, value),
            Operator::Ne => Condition::not(Condition::equals(field, value)),
            Operator::Search => Condition::RegexMatch {
                field,
                pattern: Pattern::new(value).map_err(|err| RuleError::InvalidPattern {
                    rule: rule.to_string(),
                    pattern: value.to_string(),
                    message: err.to_string(),
                })?,
            },
        },
        Attribute::Success | Attribute::Failure | Attribute::Pending | Attribute::Label => {
            let leaf = match attribute {
                Attribute::Success => Condition::StatusSuccess {
                    check: value.to_string(),
                },
                Attribute::Failure => Condition::StatusFailure {
                    check: value.to_string(),
                },
                Attribute::Pending => Condition::StatusPending {
                    check: value.to_string(),
                },
                _ => Condition::has_label(value),
            };
            match operator {
                Operator::Eq => leaf,
                Operator::Ne => Condition::not(leaf),
                Operator::Search => {
                    return Err(RuleError::unknown_operator(rule, format!("{}~=", name)))
                }
            }
        }
    };

    Ok(if negated {
        Condition::not(condition)
    } else {
        condition
    })
}

fn compile_actions(rule: &str, actions: &Mapping) -> Result<Vec<Action>, RuleError> {
    let mut compiled = Vec::new();
    for (key, value) in actions {
        match key.as_str() {
            Some("label") => {
                let label = match value {
                    Value::Mapping(map) => map,
                    Value::Null => continue,
                    _ => {
                        return Err(RuleError::InvalidAction {
                            rule: rule.to_string(),
                            message: "`label` expects a mapping with `add`/`remove`".into(),
                        })
                    }
                };
                for (op, names) in label {
                    let make: fn(String) -> Action = match op.as_str() {
                        Some("add") => Action::AddLabel,
                        Some("remove") => Action::RemoveLabel,
                        other => {
                            return Err(RuleError::UnknownAction {
                                rule: rule.to_string(),
                                field: format!("label.{}", other.unwrap_or("?")),
                            })
                        }
                    };
                    compiled.extend(label_names(rule, names)?.into_iter().map(make));
                }
            }
            other => {
                return Err(RuleError::UnknownAction {
                    rule: rule.to_string(),
                    field: other.unwrap_or("?").to_string(),
                })
            }
        }
    }
    Ok(compiled)
}

fn label_names(rule: &str, value: &Value) -> Result<Vec<String>, RuleError> {
    let invalid = || RuleError::InvalidAction {
        rule: rule.to_string(),
        message: "label names must be a string or a list of strings".into(),
    };
    match value {
        Value::Null => Ok(Vec::new()),
        Value::String(name) => Ok(vec![name.clone()]),
        Value::Sequence(items) => items
            .iter()
            .map(|item| item.as_str().map(str::to_string).ok_or_else(invalid))
            .collect(),
        _ => Err(invalid()),
    }
}
