use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    CreateFile,
    UploadFile,
    AnalyzeCode,
    OptimizeCode,
}

impl Action {
    /// Trigger-key order: keys 1 through 4.
    pub const ALL: [Action; 4] = [
        Action::CreateFile,
        Action::UploadFile,
        Action::AnalyzeCode,
        Action::OptimizeCode,
    ];

    pub fn endpoint(self) -> &'static str {
        match self {
            Action::CreateFile => "create",
            Action::UploadFile => "upload",
            Action::AnalyzeCode => "analyze",
            Action::OptimizeCode => "optimize",
        }
    }

    pub fn form_schema(self) -> FormSchema {
        match self {
            Action::CreateFile => FormSchema {
                title: "Create File",
                fields: &[
                    FormField {
                        name: "filename",
                        label: "File name",
                        kind: FieldKind::Text,
                        required: true,
                    },
                    FormField {
                        name: "content",
                        label: "Content",
                        kind: FieldKind::Multiline,
                        required: false,
                    },
                ],
            },
            Action::UploadFile => FormSchema {
                title: "Upload File",
                fields: &[FormField {
                    name: "file",
                    label: "File",
                    kind: FieldKind::File,
                    required: true,
                }],
            },
            Action::AnalyzeCode => FormSchema {
                title: "Analyze Code",
                fields: &[
                    FormField {
                        name: "code",
                        label: "Code",
                        kind: FieldKind::Multiline,
                        required: true,
                    },
                    FormField {
                        name: "language",
                        label: "Language",
                        kind: FieldKind::Text,
                        required: false,
                    },
                ],
            },
            Action::OptimizeCode => FormSchema {
                title: "Optimize Code",
                fields: &[
                    FormField {
                        name: "code",
                        label: "Code",
                        kind: FieldKind::Multiline,
                        required: true,
                    },
                    FormField {
                        name: "language",
                        label: "Language",
                        kind: FieldKind::Text,
                        required: false,
                    },
                ],
            },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Text,
    Multiline,
    File,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FormField {
    pub name: &'static str,
    pub label: &'static str,
    pub kind: FieldKind,
    pub required: bool,
}

#[derive(Debug, Clone, Copy)]
pub struct FormSchema {
    pub title: &'static str,
    pub fields: &'static [FormField],
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileUpload {
    pub filename: String,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    Text(String),
    File(FileUpload),
}

/// Field values collected from one form fill. Built up by the presentation
/// layer and consumed whole by a single submit call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormSubmission {
    values: BTreeMap<String, FieldValue>,
}

impl FormSubmission {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_text(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.values
            .insert(name.into(), FieldValue::Text(value.into()));
    }

    pub fn insert_file(
        &mut self,
        name: impl Into<String>,
        filename: impl Into<String>,
        bytes: Vec<u8>,
    ) {
        self.values.insert(
            name.into(),
            FieldValue::File(FileUpload {
                filename: filename.into(),
                bytes,
            }),
        );
    }

    pub fn with_text(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert_text(name, value);
        self
    }

    pub fn with_file(
        mut self,
        name: impl Into<String>,
        filename: impl Into<String>,
        bytes: Vec<u8>,
    ) -> Self {
        self.insert_file(name, filename, bytes);
        self
    }

    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.values.get(name)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.values.iter().map(|(name, value)| (name.as_str(), value))
    }
}

impl IntoIterator for FormSubmission {
    type Item = (String, FieldValue);
    type IntoIter = std::collections::btree_map::IntoIter<String, FieldValue>;

    fn into_iter(self) -> Self::IntoIter {
        self.values.into_iter()
    }
}
