use decor_contracts::prompts::PromptPair;
use serde_json::{json, Map, Value};

use crate::pipeline::GenerationParams;

#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Text(String),
    File {
        bytes: Vec<u8>,
        file_name: String,
        mime_type: String,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct FormField {
    pub name: String,
    pub value: FieldValue,
}

/// Ordered multipart/form-data fields, independent of any HTTP client.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MultipartForm {
    fields: Vec<FormField>,
}

impl MultipartForm {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.push(FormField {
            name: name.into(),
            value: FieldValue::Text(value.into()),
        });
        self
    }

    pub fn file(
        mut self,
        name: impl Into<String>,
        bytes: Vec<u8>,
        file_name: impl Into<String>,
        mime_type: impl Into<String>,
    ) -> Self {
        self.fields.push(FormField {
            name: name.into(),
            value: FieldValue::File {
                bytes,
                file_name: file_name.into(),
                mime_type: mime_type.into(),
            },
        });
        self
    }

    pub fn fields(&self) -> &[FormField] {
        &self.fields
    }

    pub fn field_names(&self) -> Vec<&str> {
        self.fields.iter().map(|field| field.name.as_str()).collect()
    }

    pub fn text_value(&self, name: &str) -> Option<&str> {
        self.fields.iter().find_map(|field| match &field.value {
            FieldValue::Text(text) if field.name == name => Some(text.as_str()),
            _ => None,
        })
    }

    /// JSON description of the form for receipts; file parts are reduced to
    /// their name, type and size.
    pub fn manifest(&self) -> Map<String, Value> {
        let mut out = Map::new();
        for field in &self.fields {
            let value = match &field.value {
                FieldValue::Text(text) => Value::String(text.clone()),
                FieldValue::File {
                    bytes,
                    file_name,
                    mime_type,
                } => json!({
                    "file_name": file_name,
                    "mime_type": mime_type,
                    "size_bytes": bytes.len(),
                }),
            };
            out.insert(field.name.clone(), value);
        }
        out
    }
}

/// Lays out the image-to-image form. Prompts whose text is blank are left
/// out entirely and the remaining ones are indexed from zero.
pub fn build_generation_form(
    prompts: &PromptPair,
    init_image: Vec<u8>,
    params: &GenerationParams,
) -> MultipartForm {
    let mut form = MultipartForm::new()
        .file("init_image", init_image, "init_image.jpg", "image/jpeg")
        .text("image_strength", trim_float(params.image_strength()));

    let weighted = [(prompts.positive.as_str(), 1.0), (prompts.negative.as_str(), -1.0)];
    let mut index = 0usize;
    for (text, weight) in weighted {
        let text = text.trim();
        if text.is_empty() {
            continue;
        }
        form = form
            .text(format!("text_prompts[{index}][text]"), text)
            .text(format!("text_prompts[{index}][weight]"), trim_float(weight));
        index += 1;
    }

    form = form
        .text("cfg_scale", trim_float(params.cfg_scale()))
        .text("steps", params.steps().to_string())
        .text("samples", "1");
    if let Some(style_preset) = params.style_preset() {
        form = form.text("style_preset", style_preset);
    }
    form
}

pub(crate) fn trim_float(value: f64) -> String {
    let text = format!("{value:.6}");
    text.trim_end_matches('0').trim_end_matches('.').to_string()
}
