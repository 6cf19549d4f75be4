use platform_hal::{FieldDescriptor, HalError, HalResult, Links, Response};
use serde_json::{Map, Value};
use thiserror::Error;

/// An employee fetched by its self link, with the entity tag that guards
/// updates.
#[derive(Clone, Debug, PartialEq)]
pub struct EmployeeResource {
    pub record: Map<String, Value>,
    pub links: Links,
    pub etag: Option<String>,
}

impl EmployeeResource {
    pub fn from_response(response: Response) -> HalResult<Self> {
        let etag = response.etag().map(str::to_string);
        let links = response.links()?;
        let Value::Object(mut record) = response.entity else {
            return Err(HalError::Schema(format!(
                "employee at {} is not an object",
                response.url
            )));
        };
        record.remove("_links");
        record.remove("_embedded");
        Ok(Self {
            record,
            links,
            etag,
        })
    }

    /// Self link with any template expressions removed.
    pub fn self_uri(&self) -> HalResult<String> {
        let link = self.links.require("self", "employee")?;
        Ok(link.uri())
    }

    pub fn field(&self, name: &str) -> Option<&Value> {
        self.record.get(name)
    }

    pub fn display_field(&self, name: &str) -> String {
        match self.record.get(name) {
            None | Some(Value::Null) => String::new(),
            Some(Value::String(text)) => text.clone(),
            Some(other) => other.to_string(),
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RecordError {
    #[error("expected field=value, got `{0}`")]
    Malformed(String),
    #[error("unknown field `{0}`")]
    UnknownField(String),
    #[error("`{value}` is not a valid {kind} for {field}")]
    InvalidValue {
        field: String,
        kind: &'static str,
        value: String,
    },
}

/// Splits `field=value` arguments.
pub fn parse_assignments<S: AsRef<str>>(args: &[S]) -> Result<Vec<(String, String)>, RecordError> {
    args.iter()
        .map(|arg| {
            let arg = arg.as_ref();
            arg.split_once('=')
                .filter(|(field, _)| !field.trim().is_empty())
                .map(|(field, value)| (field.trim().to_string(), value.to_string()))
                .ok_or_else(|| RecordError::Malformed(arg.to_string()))
        })
        .collect()
}

/// Builds a new record from assignments, checked against the editable fields.
pub fn build_record(
    fields: &[FieldDescriptor],
    assignments: &[(String, String)],
) -> Result<Map<String, Value>, RecordError> {
    let mut record = Map::new();
    apply(fields, assignments, &mut record)?;
    Ok(record)
}

/// Starts from the existing record's editable fields and applies the
/// assignments on top.
pub fn merge_record(
    existing: &EmployeeResource,
    fields: &[FieldDescriptor],
    assignments: &[(String, String)],
) -> Result<Map<String, Value>, RecordError> {
    let mut record = Map::new();
    for field in fields {
        if let Some(value) = existing.field(&field.name) {
            record.insert(field.name.clone(), value.clone());
        }
    }
    apply(fields, assignments, &mut record)?;
    Ok(record)
}

fn apply(
    fields: &[FieldDescriptor],
    assignments: &[(String, String)],
    record: &mut Map<String, Value>,
) -> Result<(), RecordError> {
    for (name, raw) in assignments {
        let field = fields
            .iter()
            .find(|field| &field.name == name)
            .ok_or_else(|| RecordError::UnknownField(name.clone()))?;
        let value = field.coerce(raw).ok_or_else(|| RecordError::InvalidValue {
            field: name.clone(),
            kind: field.kind.as_str(),
            value: raw.clone(),
        })?;
        record.insert(name.clone(), value);
    }
    Ok(())
}
