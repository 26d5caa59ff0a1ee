//! Declarative input shapes for tool arguments.
//!
//! A shape is static data: a list of fields (type, presence, description), a
//! small alias table and an unknown-field policy. [`InputShape::validate`]
//! rewrites aliases onto canonical keys, checks every declared field, applies
//! defaults and returns the normalized argument object, which tools then
//! deserialize into their typed input struct. The same data renders the JSON
//! Schema published in `tools/list`.

use rmcp::model::JsonObject;
use serde_json::{json, Value};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ShapeError {
    #[error("unrecognized field `{0}`")]
    UnknownField(String),
    #[error("missing required field `{0}`")]
    Missing(&'static str),
    #[error("field `{field}` must be {expected}")]
    WrongType {
        field: &'static str,
        expected: &'static str,
    },
    #[error("field `{field}` must be between {min} and {max}, got {value}")]
    OutOfRange {
        field: &'static str,
        min: i64,
        max: i64,
        value: i64,
    },
    #[error("field `{field}` must be one of {allowed}, got `{value}`")]
    NotAllowed {
        field: &'static str,
        value: String,
        allowed: String,
    },
    #[error("both `{canonical}` and its alias `{alias}` were supplied")]
    AliasConflict {
        alias: &'static str,
        canonical: &'static str,
    },
}

#[derive(Debug, Clone, Copy)]
pub enum Kind {
    String,
    Boolean,
    Integer { min: i64, max: i64 },
    Enum(&'static [&'static str]),
    StringArray,
}

impl Kind {
    fn expected(&self) -> &'static str {
        match self {
            Kind::String | Kind::Enum(_) => "a string",
            Kind::Boolean => "a boolean",
            Kind::Integer { .. } => "an integer",
            Kind::StringArray => "an array of strings",
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub enum Literal {
    Bool(bool),
    Int(i64),
    Str(&'static str),
}

impl Literal {
    fn to_value(self) -> Value {
        match self {
            Literal::Bool(b) => Value::Bool(b),
            Literal::Int(n) => Value::from(n),
            Literal::Str(s) => Value::String(s.to_owned()),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub enum Presence {
    Required,
    Optional,
    Default(Literal),
}

#[derive(Debug, Clone, Copy)]
pub struct Field {
    pub name: &'static str,
    pub kind: Kind,
    pub presence: Presence,
    pub description: &'static str,
}

impl Field {
    pub const fn required(name: &'static str, kind: Kind, description: &'static str) -> Self {
        Self { name, kind, presence: Presence::Required, description }
    }

    pub const fn optional(name: &'static str, kind: Kind, description: &'static str) -> Self {
        Self { name, kind, presence: Presence::Optional, description }
    }

    pub const fn defaulted(
        name: &'static str,
        kind: Kind,
        default: Literal,
        description: &'static str,
    ) -> Self {
        Self { name, kind, presence: Presence::Default(default), description }
    }

    fn check(&self, value: &Value) -> Result<(), ShapeError> {
        let wrong = || ShapeError::WrongType { field: self.name, expected: self.kind.expected() };
        match self.kind {
            Kind::String => value.as_str().map(|_| ()).ok_or_else(wrong),
            Kind::Boolean => value.as_bool().map(|_| ()).ok_or_else(wrong),
            Kind::Integer { min, max } => {
                let n = value.as_i64().ok_or_else(wrong)?;
                if n < min || n > max {
                    return Err(ShapeError::OutOfRange { field: self.name, min, max, value: n });
                }
                Ok(())
            }
            Kind::Enum(allowed) => {
                let s = value.as_str().ok_or_else(wrong)?;
                if allowed.contains(&s) {
                    Ok(())
                } else {
                    Err(ShapeError::NotAllowed {
                        field: self.name,
                        value: s.to_owned(),
                        allowed: allowed.join(", "),
                    })
                }
            }
            Kind::StringArray => {
                let items = value.as_array().ok_or_else(wrong)?;
                if items.iter().all(Value::is_string) {
                    Ok(())
                } else {
                    Err(wrong())
                }
            }
        }
    }

    fn schema(&self) -> Value {
        let mut prop = match self.kind {
            Kind::String => json!({ "type": "string" }),
            Kind::Boolean => json!({ "type": "boolean" }),
            Kind::Integer { min, max } => json!({ "type": "integer", "minimum": min, "maximum": max }),
            Kind::Enum(allowed) => json!({ "type": "string", "enum": allowed }),
            Kind::StringArray => json!({ "type": "array", "items": { "type": "string" } }),
        };
        prop["description"] = Value::String(self.description.to_owned());
        if let Presence::Default(lit) = self.presence {
            prop["default"] = lit.to_value();
        }
        prop
    }
}

/// What happens to argument keys that are neither declared nor aliased.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Extra {
    Strict,
    Passthrough,
}

#[derive(Debug)]
pub struct InputShape {
    pub fields: &'static [Field],
    /// `(alias, canonical)` pairs.
    pub aliases: &'static [(&'static str, &'static str)],
    pub extra: Extra,
}

impl InputShape {
    pub const fn strict(
        fields: &'static [Field],
        aliases: &'static [(&'static str, &'static str)],
    ) -> Self {
        Self { fields, aliases, extra: Extra::Strict }
    }

    pub const fn passthrough(
        fields: &'static [Field],
        aliases: &'static [(&'static str, &'static str)],
    ) -> Self {
        Self { fields, aliases, extra: Extra::Passthrough }
    }

    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn validate(&self, args: JsonObject) -> Result<JsonObject, ShapeError> {
        let mut args = self.resolve_aliases(args)?;

        if self.extra == Extra::Strict {
            if let Some(unknown) = args.keys().find(|k| self.field(k).is_none()) {
                return Err(ShapeError::UnknownField(unknown.clone()));
            }
        }

        for field in self.fields {
            // An explicit null reads as "not supplied".
            if matches!(args.get(field.name), Some(Value::Null)) {
                args.remove(field.name);
            }
            match (args.get(field.name), field.presence) {
                (Some(value), _) => field.check(value)?,
                (None, Presence::Required) => return Err(ShapeError::Missing(field.name)),
                (None, Presence::Default(lit)) => {
                    args.insert(field.name.to_owned(), lit.to_value());
                }
                (None, Presence::Optional) => {}
            }
        }
        Ok(args)
    }

    fn resolve_aliases(&self, mut args: JsonObject) -> Result<JsonObject, ShapeError> {
        for &(alias, canonical) in self.aliases {
            if let Some(value) = args.remove(alias) {
                if args.contains_key(canonical) {
                    return Err(ShapeError::AliasConflict { alias, canonical });
                }
                args.insert(canonical.to_owned(), value);
            }
        }
        Ok(args)
    }

    /// JSON Schema for `tools/list`.
    pub fn json_schema(&self) -> JsonObject {
        let mut properties = JsonObject::new();
        for field in self.fields {
            properties.insert(field.name.to_owned(), field.schema());
        }
        for &(alias, canonical) in self.aliases {
            if let Some(field) = self.field(canonical) {
                let mut prop = field.schema();
                prop["description"] = Value::String(format!("Alias for `{canonical}`."));
                if let Some(obj) = prop.as_object_mut() {
                    obj.remove("default");
                }
                properties.insert(alias.to_owned(), prop);
            }
        }
        let required: Vec<&str> = self
            .fields
            .iter()
            .filter(|f| matches!(f.presence, Presence::Required))
            .map(|f| f.name)
            .collect();

        let mut schema = JsonObject::new();
        schema.insert("type".into(), json!("object"));
        schema.insert("properties".into(), Value::Object(properties));
        if !required.is_empty() {
            schema.insert("required".into(), json!(required));
        }
        schema.insert(
            "additionalProperties".into(),
            Value::Bool(self.extra == Extra::Passthrough),
        );
        schema
    }
}
