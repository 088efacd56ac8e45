//! Text projection of a [`DiffReport`] as JSON or YAML.

use serde_json::{json, Map, Value as Json};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

use super::flat::{ChangeRecord, DiffReport};
use super::report::ReportType;
use crate::level::{child_path, Relationship};
use crate::value::{Mapping, Node, NodeId, Number, TypeTag, Value};

/// RenderError is returned when a report cannot be rendered as text.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("no converter registered for type {type_tag} at {path}")]
    MissingConverter { type_tag: TypeTag, path: String },

    #[error("mapping keys render to the same name {key:?} at {path}")]
    DuplicateKey { key: String, path: String },

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("yaml error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

type ConvertFn = dyn Fn(&Value) -> Json + Send + Sync;

/// Converters turns values with no natural text form into JSON.
///
/// A converter registered for a type tag takes precedence over the
/// built-in rendering of that tag.
#[derive(Clone)]
pub struct Converters {
    by_type: BTreeMap<TypeTag, Arc<ConvertFn>>,
}

impl Converters {
    /// Creates a registry with the default `bytes` converter.
    pub fn new() -> Self {
        Converters::empty().register(TypeTag::BYTES, |value| match value {
            Value::Bytes(b) => Json::String(String::from_utf8_lossy(b).into_owned()),
            other => Json::String(other.to_string()),
        })
    }

    /// Creates a registry with no converters.
    pub fn empty() -> Self {
        Converters {
            by_type: BTreeMap::new(),
        }
    }

    pub fn register<F>(mut self, tag: impl Into<TypeTag>, convert: F) -> Self
    where
        F: Fn(&Value) -> Json + Send + Sync + 'static,
    {
        self.by_type.insert(tag.into(), Arc::new(convert));
        self
    }

    pub fn get(&self, tag: &TypeTag) -> Option<&ConvertFn> {
        self.by_type.get(tag).map(|f| f.as_ref())
    }
}

impl Default for Converters {
    fn default() -> Self {
        Converters::new()
    }
}

impl fmt::Debug for Converters {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.by_type.keys()).finish()
    }
}

struct Renderer<'a> {
    converters: &'a Converters,
    stack: Vec<NodeId>,
    verbose_level: u8,
}

impl Renderer<'_> {
    fn number(n: &Number) -> Json {
        match n {
            Number::Int(i) => Json::from(*i),
            Number::UInt(u) => Json::from(*u),
            Number::Float(f) => serde_json::Number::from_f64(*f)
                .map(Json::Number)
                .unwrap_or_else(|| Json::String(n.to_string())),
        }
    }

    fn value(&mut self, value: &Value, path: &str) -> Result<Json, RenderError> {
        let tag = value.type_tag();
        if let Some(convert) = self.converters.get(&tag) {
            return Ok(convert(value));
        }

        if let Some(id) = value.node_id() {
            if self.stack.contains(&id) {
                return Ok(Json::String(format!("<recursion: {}>", tag)));
            }
            self.stack.push(id);
            let result = self.container(value, &tag, path);
            self.stack.pop();
            return result;
        }

        match value {
            Value::Null => Ok(Json::Null),
            Value::Bool(b) => Ok(Json::Bool(*b)),
            Value::Number(n) => Ok(Self::number(n)),
            Value::Text(s) => Ok(Json::String(s.clone())),
            _ => Err(RenderError::MissingConverter {
                type_tag: tag,
                path: path.to_string(),
            }),
        }
    }

    fn items(&mut self, items: &[Value], path: &str) -> Result<Json, RenderError> {
        let mut out = Vec::with_capacity(items.len());
        for (i, item) in items.iter().enumerate() {
            out.push(self.value(item, &child_path(path, &Relationship::index(i)))?);
        }
        Ok(Json::Array(out))
    }

    fn container(&mut self, value: &Value, tag: &TypeTag, path: &str) -> Result<Json, RenderError> {
        match value {
            Value::Sequence(node) => {
                let items = node.borrow().items.clone();
                self.items(&items, path)
            }
            Value::Set(node) => {
                let items = node.borrow().items.clone();
                self.items(&items, path)
            }
            Value::Mapping(node) => self.mapping(node, path),
            _ => Err(RenderError::MissingConverter {
                type_tag: tag.clone(),
                path: path.to_string(),
            }),
        }
    }

    fn mapping(&mut self, node: &Node<Mapping>, path: &str) -> Result<Json, RenderError> {
        let entries: Vec<(Value, Value)> = node
            .borrow()
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        let mut out = Map::new();
        for (key, item) in entries {
            let item_path = child_path(path, &Relationship::DictKey(key.clone()));
            let name = match key {
                Value::Text(s) => s,
                other => other.to_string(),
            };
            if out.contains_key(&name) {
                return Err(RenderError::DuplicateKey {
                    key: name,
                    path: path.to_string(),
                });
            }
            let rendered = self.value(&item, &item_path)?;
            out.insert(name, rendered);
        }
        Ok(Json::Object(out))
    }

    fn record(&mut self, record: &ChangeRecord, path: &str) -> Result<Json, RenderError> {
        Ok(match record {
            ChangeRecord::Item { value } => self.value(value, path)?,
            ChangeRecord::ValueChange {
                old_value,
                new_value,
                diff,
            } => {
                let mut detail = Map::new();
                detail.insert("new_value".into(), self.value(new_value, path)?);
                detail.insert("old_value".into(), self.value(old_value, path)?);
                if let Some(diff) = diff {
                    detail.insert("diff".into(), Json::String(diff.clone()));
                }
                Json::Object(detail)
            }
            ChangeRecord::TypeChange {
                old_type,
                new_type,
                old_value,
                new_value,
            } if self.verbose_level == 0 => json!({
                "old_type": old_type.as_str(),
                "new_type": new_type.as_str(),
            }),
            ChangeRecord::TypeChange {
                old_type,
                new_type,
                old_value,
                new_value,
            } => json!({
                "old_type": old_type.as_str(),
                "new_type": new_type.as_str(),
                "old_value": self.value(old_value, path)?,
                "new_value": self.value(new_value, path)?,
            }),
            ChangeRecord::Repetition {
                value,
                old_repeat,
                new_repeat,
                old_indexes,
                new_indexes,
            } => json!({
                "old_repeat": old_repeat,
                "new_repeat": new_repeat,
                "old_indexes": old_indexes,
                "new_indexes": new_indexes,
                "value": self.value(value, path)?,
            }),
            ChangeRecord::Unprocessed { left, right, .. } => {
                let side = |v: &Option<Value>| v.as_ref().map_or_else(|| "null".to_string(), Value::to_string);
                Json::String(format!("{}: {} and {}", path, side(left), side(right)))
            }
        })
    }
}

/// Report types rendered as a plain list of paths.
fn lists_paths(report_type: ReportType, verbose_level: u8) -> bool {
    match report_type {
        ReportType::SetItemAdded | ReportType::SetItemRemoved => true,
        ReportType::DictionaryItemAdded
        | ReportType::DictionaryItemRemoved
        | ReportType::AttributeAdded
        | ReportType::AttributeRemoved => verbose_level < 2,
        _ => false,
    }
}

impl DiffReport {
    /// Renders the report as a JSON document keyed by report type name.
    ///
    /// Added and removed keys, attributes and set members are listed as
    /// paths; iterable items map their path to the value; changes map
    /// their path to a detail object; unprocessed values are listed as
    /// strings. At verbose level 2 added and removed keys and attributes
    /// map their path to the value too. At level 0 type changes carry
    /// only the two type names.
    pub fn to_json(&self, converters: &Converters) -> Result<Json, RenderError> {
        let mut renderer = Renderer {
            converters,
            stack: Vec::new(),
            verbose_level: self.verbose_level(),
        };
        let mut out = Map::new();
        for report_type in self.report_types() {
            let Some(records) = self.bucket(report_type) else {
                continue;
            };
            let rendered = if lists_paths(report_type, renderer.verbose_level) {
                Json::Array(records.keys().map(|p| Json::String(p.clone())).collect())
            } else if report_type == ReportType::Unprocessed {
                let mut lines = Vec::with_capacity(records.len());
                for (path, record) in records {
                    lines.push(renderer.record(record, path)?);
                }
                Json::Array(lines)
            } else {
                let mut by_path = Map::new();
                for (path, record) in records {
                    by_path.insert(path.clone(), renderer.record(record, path)?);
                }
                Json::Object(by_path)
            };
            out.insert(report_type.as_str().to_string(), rendered);
        }
        Ok(Json::Object(out))
    }

    pub fn to_json_string(&self, converters: &Converters) -> Result<String, RenderError> {
        Ok(serde_json::to_string_pretty(&self.to_json(converters)?)?)
    }

    pub fn to_yaml_string(&self, converters: &Converters) -> Result<String, RenderError> {
        Ok(serde_yaml::to_string(&self.to_json(converters)?)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::diff::diff;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_render_text_view() {
        let left = Value::map(vec![
            (Value::text("a"), Value::from(1)),
            (Value::text("b"), Value::list(vec![1.into()])),
            (Value::text("gone"), Value::Null),
        ]);
        let right = Value::map(vec![
            (Value::text("a"), Value::from(2)),
            (Value::text("b"), Value::list(vec![1.into(), 2.into()])),
            (Value::text("new"), Value::text("x")),
        ]);
        let report = diff(&left, &right, &Config::default());

        let rendered = report.to_json(&Converters::new()).unwrap();
        assert_eq!(
            rendered,
            json!({
                "dictionary_item_added": ["root['new']"],
                "dictionary_item_removed": ["root['gone']"],
                "values_changed": {"root['a']": {"new_value": 2, "old_value": 1}},
                "iterable_item_added": {"root['b'][1]": 2},
            })
        );
    }

    #[test]
    fn test_render_type_change_and_bytes() {
        let report = diff(&Value::bytes("hi"), &Value::from(1.5), &Config::default());
        let rendered = report.to_json(&Converters::new()).unwrap();
        assert_eq!(
            rendered,
            json!({
                "type_changes": {"root": {
                    "old_type": "bytes",
                    "new_type": "float",
                    "old_value": "hi",
                    "new_value": 1.5,
                }}
            })
        );
    }

    #[test]
    fn test_missing_converter_names_type_and_path() {
        let left = Value::list(vec![Value::record("Point", vec![("x", 1)])]);
        let right = Value::list(vec![]);
        let report = diff(&left, &right, &Config::default());

        let err = report.to_json(&Converters::new()).unwrap_err();
        match err {
            RenderError::MissingConverter { type_tag, path } => {
                assert_eq!(type_tag.as_str(), "Point");
                assert_eq!(path, "root[0]");
            }
            other => panic!("unexpected error: {}", other),
        }

        let converters = Converters::new().register("Point", |v| Json::String(v.to_string()));
        let rendered = report.to_json(&converters).unwrap();
        assert_eq!(
            rendered,
            json!({"iterable_item_removed": {"root[0]": "Point(x=1)"}})
        );
    }

    #[test]
    fn test_non_finite_and_recursive_values() {
        let looped = Value::list(vec![Value::from(f64::NAN)]);
        if let Value::Sequence(node) = &looped {
            node.borrow_mut().items.push(looped.clone());
        }
        let report = diff(&Value::list(vec![]), &Value::list(vec![looped]), &Config::default());
        let rendered = report.to_json(&Converters::new()).unwrap();
        assert_eq!(
            rendered,
            json!({"iterable_item_added": {"root[0]": ["nan", "<recursion: list>"]}})
        );
    }

    #[test]
    fn test_verbose_levels() {
        let left = Value::map(vec![
            (Value::text("kind"), Value::from(1)),
            (Value::text("gone"), Value::list(vec![1.into()])),
        ]);
        let right = Value::map(vec![
            (Value::text("kind"), Value::text("1")),
            (Value::text("new"), Value::from(true)),
        ]);
        let report = diff(&left, &right, &Config::default());
        assert_eq!(report.verbose_level(), 1);

        let quiet = report.clone().with_verbose_level(0);
        assert_eq!(
            quiet.to_json(&Converters::new()).unwrap(),
            json!({
                "dictionary_item_added": ["root['new']"],
                "dictionary_item_removed": ["root['gone']"],
                "type_changes": {"root['kind']": {"old_type": "int", "new_type": "str"}},
            })
        );

        let config = Config::builder().verbose_level(2).build().unwrap();
        let detailed = diff(&left, &right, &config);
        assert_eq!(detailed.verbose_level(), 2);
        assert_eq!(
            detailed.to_json(&Converters::new()).unwrap(),
            json!({
                "dictionary_item_added": {"root['new']": true},
                "dictionary_item_removed": {"root['gone']": [1]},
                "type_changes": {"root['kind']": {
                    "old_type": "int",
                    "new_type": "str",
                    "old_value": 1,
                    "new_value": "1",
                }},
            })
        );
    }

    #[test]
    fn test_keys_rendering_alike_are_rejected() {
        let added = Value::map(vec![
            (Value::text("1"), Value::text("text")),
            (Value::from(1), Value::text("int")),
        ]);
        let report = diff(&Value::list(vec![]), &Value::list(vec![added]), &Config::default());

        let err = report.to_json(&Converters::new()).unwrap_err();
        match err {
            RenderError::DuplicateKey { key, path } => {
                assert_eq!(key, "1");
                assert_eq!(path, "root[0]");
            }
            other => panic!("unexpected error: {}", other),
        }
    }

    #[test]
    fn test_yaml_and_json_strings() {
        let report = diff(&Value::from(1), &Value::from(2), &Config::default());
        let json = report.to_json_string(&Converters::new()).unwrap();
        assert!(json.contains("\"values_changed\""));
        let yaml = report.to_yaml_string(&Converters::new()).unwrap();
        assert!(yaml.starts_with("values_changed:"));
    }
}
