//! Form layout descriptor
//!
//! One presentation layer serves every page variant: either explicit feature
//! groups from configuration, or a flat layout derived from the model's
//! feature list.

use crate::config::UiConfig;
use crate::error::StartupError;
use crate::features::FeatureSpec;
use serde::Deserialize;
use std::collections::HashSet;

/// Which layout the form uses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LayoutKind {
    /// Titled groups of fields, two columns each
    #[default]
    Grouped,
    /// One field per model feature with name-based hints
    Flat,
}

/// A titled group of form fields
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct GroupConfig {
    pub title: String,
    #[serde(default)]
    pub fields: Vec<FieldConfig>,
}

/// One input control bound to a model feature
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct FieldConfig {
    pub feature: String,
    pub label: String,
    #[serde(default)]
    pub widget: WidgetConfig,
}

/// Input control kind and its constraints
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum WidgetConfig {
    Number {
        #[serde(default)]
        default: f64,
        #[serde(default)]
        min: Option<f64>,
        #[serde(default)]
        max: Option<f64>,
        #[serde(default = "default_step")]
        step: f64,
    },
    Integer {
        #[serde(default)]
        default: i64,
        #[serde(default)]
        min: Option<i64>,
    },
    /// 0/1 radio pair
    Flag {
        #[serde(default)]
        default: u8,
    },
    Slider {
        min: i64,
        max: i64,
        default: i64,
    },
}

fn default_step() -> f64 {
    0.1
}

impl Default for WidgetConfig {
    fn default() -> Self {
        WidgetConfig::Number {
            default: 0.0,
            min: Some(0.0),
            max: None,
            step: default_step(),
        }
    }
}

impl WidgetConfig {
    /// Initial value shown in an empty form
    pub fn default_value(&self) -> String {
        match self {
            WidgetConfig::Number { default, .. } => format!("{:.3}", default),
            WidgetConfig::Integer { default, .. } => default.to_string(),
            WidgetConfig::Flag { default } => default.to_string(),
            WidgetConfig::Slider { default, .. } => default.to_string(),
        }
    }
}

/// Group ready for rendering
#[derive(Debug, Clone, PartialEq)]
pub struct FormGroup {
    pub title: Option<String>,
    pub columns: usize,
    pub fields: Vec<FieldConfig>,
}

/// Resolved form layout, checked against the model's features
#[derive(Debug, Clone, PartialEq)]
pub struct FormLayout {
    pub kind: LayoutKind,
    pub groups: Vec<FormGroup>,
}

impl FormLayout {
    /// Build the layout selected by `ui` for the given features.
    pub fn resolve(ui: &UiConfig, features: &FeatureSpec) -> Result<Self, StartupError> {
        match ui.layout {
            LayoutKind::Grouped => Self::grouped(&ui.groups, features),
            LayoutKind::Flat => Ok(Self::flat(features)),
        }
    }

    /// Explicit groups; every model feature must appear exactly once.
    pub fn grouped(groups: &[GroupConfig], features: &FeatureSpec) -> Result<Self, StartupError> {
        let mut seen = HashSet::new();

        for field in groups.iter().flat_map(|g| &g.fields) {
            if !features.contains(&field.feature) {
                return Err(StartupError::Layout(format!(
                    "field '{}' is not a model feature",
                    field.feature
                )));
            }
            if !seen.insert(field.feature.as_str()) {
                return Err(StartupError::Layout(format!(
                    "feature '{}' appears more than once",
                    field.feature
                )));
            }
            if let WidgetConfig::Slider { min, max, default } = field.widget {
                if min > max || default < min || default > max {
                    return Err(StartupError::Layout(format!(
                        "slider for '{}' has an invalid range",
                        field.feature
                    )));
                }
            }
        }

        let missing: Vec<&str> = features
            .names()
            .iter()
            .map(String::as_str)
            .filter(|name| !seen.contains(name))
            .collect();
        if !missing.is_empty() {
            return Err(StartupError::Layout(format!(
                "no form field for {}",
                missing.join(", ")
            )));
        }

        Ok(Self {
            kind: LayoutKind::Grouped,
            groups: groups
                .iter()
                .map(|g| FormGroup {
                    title: Some(g.title.clone()),
                    columns: 2,
                    fields: g.fields.clone(),
                })
                .collect(),
        })
    }

    /// One numeric field per feature, columns adapted to the feature count.
    pub fn flat(features: &FeatureSpec) -> Self {
        let columns = if features.len() > 6 { 3 } else { 2 };

        let fields = features
            .names()
            .iter()
            .map(|name| {
                let (hint, default) = flat_hint(name);
                FieldConfig {
                    feature: name.clone(),
                    label: format!("{} {}", name, hint),
                    widget: WidgetConfig::Number {
                        default,
                        min: None,
                        max: None,
                        step: 0.001,
                    },
                }
            })
            .collect();

        Self {
            kind: LayoutKind::Flat,
            groups: vec![FormGroup {
                title: None,
                columns,
                fields,
            }],
        }
    }

    pub fn fields(&self) -> impl Iterator<Item = &FieldConfig> {
        self.groups.iter().flat_map(|g| g.fields.iter())
    }

    /// Display label for a feature, falling back to its name
    pub fn label_for<'a>(&'a self, feature: &'a str) -> &'a str {
        self.fields()
            .find(|f| f.feature == feature)
            .map(|f| f.label.as_str())
            .unwrap_or(feature)
    }
}

/// Unit hint and default value guessed from a feature name
fn flat_hint(name: &str) -> (&'static str, f64) {
    let lower = name.to_lowercase();
    if lower.contains("age") || name.contains("年龄") {
        ("(years)", 60.0)
    } else if lower.contains("score") || name.contains("评分") || name.contains("分数") {
        ("(points)", 10.0)
    } else {
        ("(units)", 0.0)
    }
}
