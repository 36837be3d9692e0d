use serde::Deserialize;

/// Conformance report from an external SHACL engine. Only `conforms` and the
/// violation count feed into scoring.
#[derive(Debug, Clone, Deserialize)]
pub struct ShaclReport {
    pub conforms: bool,
    #[serde(default)]
    pub violations: Vec<ShaclViolation>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ShaclViolation {
    #[serde(default)]
    pub severity: Option<String>,
    #[serde(default, rename = "focusNode")]
    pub focus_node: Option<String>,
    #[serde(default)]
    pub path: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

impl ShaclReport {
    pub fn passes(&self) -> bool {
        self.conforms && self.violations.is_empty()
    }
}
