//! Prompt engineering for document generation

use crate::types::FieldSelection;
use scrivener_domain::{FieldCatalog, FieldKind, FieldPath, SchemaField, Segment};

/// Builds the generation prompt for one note
pub struct PromptBuilder<'a> {
    title: &'a str,
    body: &'a str,
    document_type: &'a str,
    catalog: Option<&'a FieldCatalog>,
    selection: Option<&'a FieldSelection>,
}

impl<'a> PromptBuilder<'a> {
    /// Create a new prompt builder
    pub fn new(title: &'a str, body: &'a str, document_type: &'a str) -> Self {
        Self {
            title,
            body,
            document_type,
            catalog: None,
            selection: None,
        }
    }

    /// Describe the fields to generate
    pub fn with_fields(mut self, catalog: &'a FieldCatalog, selection: &'a FieldSelection) -> Self {
        self.catalog = Some(catalog);
        self.selection = Some(selection);
        self
    }

    /// Build the complete generation prompt
    pub fn build(&self) -> String {
        let mut prompt = String::new();

        prompt.push_str(GENERATION_INSTRUCTIONS);
        prompt.push_str("\n\n");

        prompt.push_str(&format!("Document type: {}\n\n", self.document_type));

        if let Some(catalog) = self.catalog {
            let fields = self.selected(catalog);
            if !fields.is_empty() {
                prompt.push_str("Fields to fill:\n");
                for field in &fields {
                    self.describe_field(&mut prompt, field);
                }
                prompt.push('\n');
            }

            let arrays: Vec<&SchemaField> = fields
                .iter()
                .copied()
                .filter(|f| f.kind == FieldKind::Array && !f.is_array_item)
                .filter(|f| !catalog.nested_fields(&f.path).is_empty())
                .collect();
            if !arrays.is_empty() {
                prompt.push_str(ARRAY_KEY_CONVENTION);
                prompt.push('\n');
                for array in arrays {
                    for nested in catalog.nested_fields(&array.path) {
                        prompt.push_str(&format!("  {}\n", indexed_example(nested)));
                    }
                }
                prompt.push('\n');
            }
        }

        prompt.push_str("Note:\n");
        prompt.push_str("---\n");
        if !self.title.is_empty() {
            prompt.push_str(&format!("# {}\n\n", self.title));
        }
        prompt.push_str(self.body);
        prompt.push_str("\n---\n\n");

        prompt.push_str(OUTPUT_FORMAT_REMINDER);

        prompt
    }

    /// Enabled, non-virtual fields in lexicographic order
    fn selected(&self, catalog: &'a FieldCatalog) -> Vec<&'a SchemaField> {
        catalog
            .sorted()
            .into_iter()
            .filter(|f| !f.is_virtual)
            .filter(|f| match self.selection {
                Some(selection) if !selection.is_empty() => {
                    selection.is_enabled(&f.path.to_string())
                }
                _ => true,
            })
            .collect()
    }

    fn describe_field(&self, prompt: &mut String, field: &SchemaField) {
        let path = field.path.to_string();
        prompt.push_str(&format!("- `{}` ({}): {}\n", path, type_hint(&field.kind), field.title));
        if let Some(instructions) = self.selection.and_then(|s| s.instructions(&path)) {
            prompt.push_str(&format!("  Instructions: {}\n", instructions));
        }
    }
}

fn type_hint(kind: &FieldKind) -> String {
    match kind {
        FieldKind::Date => "date, YYYY-MM-DD".to_string(),
        FieldKind::Datetime => "datetime, ISO 8601".to_string(),
        FieldKind::BlockContent => "rich text, paragraphs separated by blank lines".to_string(),
        FieldKind::Slug => "slug, short url-safe phrase".to_string(),
        other => other.to_string(),
    }
}

/// `modules[].quoteModule.quote` rendered as `modules[0].quoteModule.quote`
fn indexed_example(field: &SchemaField) -> String {
    let mut indexed = false;
    let segments = field
        .path
        .segments()
        .iter()
        .map(|segment| match segment {
            Segment::Array { name, index: None } if !indexed => {
                indexed = true;
                Segment::Array {
                    name: name.clone(),
                    index: Some(0),
                }
            }
            other => other.clone(),
        })
        .collect();
    FieldPath::from_segments(segments).to_string()
}

const GENERATION_INSTRUCTIONS: &str = r#"Expand the note below into a complete article for a content platform.
Fill each listed field with content derived from the note.

Rules:
- Answer with a single flat JSON object whose keys are the field paths listed below
- Write plain text; simple markdown (emphasis, links, lists) is allowed in long-form fields
- Do not invent citations, footnote markers or reference sections
- Omit a field, or set it to null, only when the note gives nothing to write"#;

const ARRAY_KEY_CONVENTION: &str = r#"Array items are addressed by index and module name. Use the same index for
every field of one item, and a new index for each further item, for example:"#;

const OUTPUT_FORMAT_REMINDER: &str =
    "Remember: Return ONLY one valid JSON object, no markdown code blocks, no explanations.";

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog() -> FieldCatalog {
        let mut catalog = FieldCatalog::new("article");
        for (path, kind, title) in [
            ("title", FieldKind::String, "Title"),
            ("publishedAt", FieldKind::Date, "Published At"),
            ("modules", FieldKind::Array, "Modules"),
        ] {
            catalog
                .insert(SchemaField::new(FieldPath::parse(path).unwrap(), kind, title))
                .unwrap();
        }
        catalog
            .insert(
                SchemaField::new(
                    FieldPath::parse("modules[].quoteModule.quote").unwrap(),
                    FieldKind::String,
                    "Modules → Quote",
                )
                .with_parent(FieldPath::root("modules"))
                .in_array_item(Some("quoteModule".to_string())),
            )
            .unwrap();
        catalog
    }

    #[test]
    fn test_prompt_includes_note_and_type() {
        let prompt = PromptBuilder::new("Trip", "We went north.", "article").build();
        assert!(prompt.contains("Document type: article"));
        assert!(prompt.contains("# Trip"));
        assert!(prompt.contains("We went north."));
        assert!(prompt.contains("Return ONLY one valid JSON object"));
    }

    #[test]
    fn test_fields_listed_in_order_with_hints() {
        let catalog = catalog();
        let selection = FieldSelection::all(&catalog);
        let prompt = PromptBuilder::new("T", "B", "article")
            .with_fields(&catalog, &selection)
            .build();

        let published = prompt.find("- `publishedAt` (date, YYYY-MM-DD)").unwrap();
        let title = prompt.find("- `title` (string): Title").unwrap();
        assert!(published < title);
    }

    #[test]
    fn test_array_convention_uses_indexed_keys() {
        let catalog = catalog();
        let selection = FieldSelection::all(&catalog);
        let prompt = PromptBuilder::new("T", "B", "article")
            .with_fields(&catalog, &selection)
            .build();
        assert!(prompt.contains("modules[0].quoteModule.quote"));
    }

    #[test]
    fn test_indexed_example_fills_first_array_only() {
        let field = |path: &str| SchemaField::new(FieldPath::parse(path).unwrap(), FieldKind::String, path);
        assert_eq!(
            indexed_example(&field("sections[].rows[].label")),
            "sections[0].rows[].label"
        );
        assert_eq!(indexed_example(&field("links[].url")), "links[0].url");
        assert_eq!(indexed_example(&field("title")), "title");
    }

    #[test]
    fn test_disabled_fields_and_instructions() {
        let catalog = catalog();
        let selection = FieldSelection::new()
            .enable("title")
            .with_instructions("title", "Keep it under eight words");
        let prompt = PromptBuilder::new("T", "B", "article")
            .with_fields(&catalog, &selection)
            .build();

        assert!(prompt.contains("Instructions: Keep it under eight words"));
        assert!(!prompt.contains("`publishedAt`"));
        assert!(!prompt.contains("Array items are addressed"));
    }
}
