//! Copyright sub-form shared by file fields

use semform_types::{Field, Label};

/// Semantics of the copyright dialog every file and image field carries
pub fn copyright_field() -> Field {
    let entries = [
        ("title", "Title"),
        ("author", "Author"),
        ("year", "Year(s)"),
        ("source", "Source"),
        ("license", "License"),
    ];
    let fields = entries
        .iter()
        .map(|(name, label)| {
            let mut field = Field::new(*name, "text").optional();
            field.label = Some(Label::Text(label.to_string()));
            field
        })
        .collect();

    let mut group = Field::new("copyright", "group").with_fields(fields);
    group.label = Some(Label::Text("Copyright information".to_string()));
    group.expanded = true;
    group
}
