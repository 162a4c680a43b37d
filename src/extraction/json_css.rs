use super::{ExtractionInput, ExtractionStrategy};
use crate::{ExtractionError, ValidationError};
use async_trait::async_trait;
use scraper::{ElementRef, Html, Selector};
use serde::Deserialize;
use serde_json::{Map, Value};

/// Structured extraction driven by a CSS selector schema
///
/// `params.schema` looks like:
///
/// ```json
/// {
///   "name": "articles",
///   "baseSelector": "article",
///   "fields": [
///     {"name": "title", "selector": "h2", "type": "text"},
///     {"name": "link", "selector": "a", "type": "attribute", "attribute": "href"}
///   ]
/// }
/// ```
///
/// Each element matching `baseSelector` becomes one JSON object.
#[derive(Debug, Clone)]
pub struct JsonCssExtraction {
    schema: CssSchema,
}

#[derive(Debug, Clone, Deserialize)]
struct CssSchema {
    #[serde(default)]
    name: Option<String>,
    #[serde(rename = "baseSelector")]
    base_selector: String,
    #[serde(default)]
    fields: Vec<CssField>,
}

#[derive(Debug, Clone, Deserialize)]
struct CssField {
    name: String,
    selector: String,
    #[serde(rename = "type", default)]
    kind: FieldKind,
    #[serde(default)]
    attribute: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
enum FieldKind {
    #[default]
    Text,
    Attribute,
    Html,
}

impl JsonCssExtraction {
    /// Builds the strategy, rejecting schemas with unparsable selectors
    pub fn from_params(params: &Map<String, Value>) -> Result<Self, ValidationError> {
        let schema_value = params.get("schema").cloned().ok_or_else(|| {
            ValidationError::ExtractionParams("json_css requires params.schema".to_string())
        })?;

        let schema: CssSchema = serde_json::from_value(schema_value)
            .map_err(|e| ValidationError::ExtractionParams(format!("invalid schema: {}", e)))?;

        parse_selector(&schema.base_selector).map_err(invalid_schema)?;

        for field in &schema.fields {
            parse_selector(&field.selector).map_err(invalid_schema)?;
            if field.kind == FieldKind::Attribute && field.attribute.is_none() {
                return Err(ValidationError::ExtractionParams(format!(
                    "field '{}' has type attribute but no attribute name",
                    field.name
                )));
            }
        }

        if let Some(name) = &schema.name {
            tracing::debug!("json_css schema '{}' with {} fields", name, schema.fields.len());
        }

        Ok(Self { schema })
    }

    fn extract_items(&self, html: &str) -> Result<Vec<Map<String, Value>>, ExtractionError> {
        let document = Html::parse_document(html);
        let base = parse_selector(&self.schema.base_selector)?;

        let mut fields = Vec::with_capacity(self.schema.fields.len());
        for field in &self.schema.fields {
            fields.push((field, parse_selector(&field.selector)?));
        }

        let items = document
            .select(&base)
            .map(|element| {
                fields
                    .iter()
                    .map(|(field, selector)| {
                        let value = element
                            .select(selector)
                            .next()
                            .and_then(|found| field_value(field, found))
                            .map_or(Value::Null, Value::String);
                        (field.name.clone(), value)
                    })
                    .collect::<Map<String, Value>>()
            })
            .collect();

        Ok(items)
    }
}

#[async_trait]
impl ExtractionStrategy for JsonCssExtraction {
    fn name(&self) -> &'static str {
        "json_css"
    }

    async fn extract(&self, input: ExtractionInput<'_>) -> Result<String, ExtractionError> {
        let items = self.extract_items(input.html)?;
        Ok(serde_json::to_string(&items)?)
    }
}

fn field_value(field: &CssField, element: ElementRef<'_>) -> Option<String> {
    match field.kind {
        FieldKind::Text => {
            let text = element.text().collect::<Vec<_>>().join(" ");
            let text = text.split_whitespace().collect::<Vec<_>>().join(" ");
            Some(text)
        }
        FieldKind::Html => Some(element.inner_html()),
        FieldKind::Attribute => field
            .attribute
            .as_deref()
            .and_then(|name| element.value().attr(name))
            .map(str::to_string),
    }
}

fn parse_selector(selector: &str) -> Result<Selector, ExtractionError> {
    Selector::parse(selector).map_err(|_| ExtractionError::InvalidSelector(selector.to_string()))
}

fn invalid_schema(e: ExtractionError) -> ValidationError {
    ValidationError::ExtractionParams(e.to_string())
}
