//! HTML rendering for the prediction page

use crate::config::UiConfig;
use crate::error::{ScoringError, ValidationError};
use crate::types::assessment::PredictionResult;
use crate::types::record::InputRecord;
use crate::web::layout::{FieldConfig, FormLayout, WidgetConfig};

const POSITIVE_COLOR: &str = "#FF4B4B";
const NEGATIVE_COLOR: &str = "#0F9D58";

const STYLE: &str = r#"
body { font-family: sans-serif; margin: 0; display: flex; }
aside { width: 22rem; background: #f0f2f6; padding: 1.5rem; min-height: 100vh; box-sizing: border-box; }
main { flex: 1; padding: 2rem 3rem; }
h1, h2.subtitle { text-align: center; }
.instructions { font-size: 1.1em; }
.grid { display: grid; gap: 1rem 2rem; }
.field label { display: block; font-weight: 600; margin-bottom: 0.25rem; }
.field input[type=number], .field input[type=range] { width: 100%; }
.alert { padding: 0.75rem 1rem; border-radius: 0.4rem; margin: 0.5rem 0; }
.error { background: #ffe9e9; color: #7d1a1a; }
.success { background: #e6f6ec; color: #0b5132; }
.info { background: #e8f0fe; color: #1a3d7d; }
.warning { background: #fff6dc; color: #6b4e00; }
.probability { text-align: center; }
progress { width: 100%; height: 1.2rem; }
"#;

/// What happened to the last submission, if anything
#[derive(Debug)]
pub enum Outcome {
    Empty,
    Predicted(PredictionResult),
    Invalid(ValidationError),
    Failed(ScoringError),
}

/// Which artifacts can currently be downloaded
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Downloads {
    pub model: bool,
    pub config: bool,
}

/// Everything the page needs that does not change between requests
#[derive(Debug, Clone)]
pub struct PageContext {
    pub ui: UiConfig,
    pub layout: FormLayout,
    pub algorithm: String,
    pub threshold: f64,
    pub features: Vec<String>,
}

impl PageContext {
    /// Render the full page
    pub fn render(&self, values: Option<&InputRecord>, outcome: &Outcome, downloads: Downloads) -> String {
        let mut html = String::with_capacity(16 * 1024);

        html.push_str("<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n");
        html.push_str(&format!("<title>{}</title>\n", escape(&self.ui.page_title)));
        html.push_str(&format!("<style>{}</style>\n</head>\n<body>\n", STYLE));

        html.push_str(&self.render_sidebar(downloads));

        html.push_str("<main>\n");
        html.push_str(&format!("<h1>{}</h1>\n", escape(&self.ui.title)));
        if !self.ui.subtitle.is_empty() {
            html.push_str(&format!("<h2 class=\"subtitle\">{}</h2>\n", escape(&self.ui.subtitle)));
        }
        html.push_str(&self.render_instructions());
        html.push_str(&self.render_form(values));
        html.push_str(&self.render_outcome(outcome));
        html.push_str("</main>\n</body>\n</html>\n");

        html
    }

    fn render_instructions(&self) -> String {
        let mut html = String::from("<div class=\"instructions\">\n<p><strong>Instructions / 说明:</strong></p>\n");
        for paragraph in &self.ui.instructions {
            html.push_str(&format!("<p>{}</p>\n", escape(paragraph)));
        }
        html.push_str(&format!(
            "<p>Number of model features: <code>{}</code>, Optimal threshold: <code>{:.4}</code></p>\n</div>\n",
            self.features.len(),
            self.threshold
        ));
        html
    }

    fn render_form(&self, values: Option<&InputRecord>) -> String {
        let mut html = String::from("<form method=\"post\" action=\"/predict\">\n");

        for group in &self.layout.groups {
            if let Some(title) = &group.title {
                html.push_str(&format!("<h3>{}</h3>\n", escape(title)));
            }
            html.push_str(&format!(
                "<div class=\"grid\" style=\"grid-template-columns: repeat({}, 1fr);\">\n",
                group.columns
            ));
            for field in &group.fields {
                let value = values
                    .and_then(|record| record.display_value(&field.feature))
                    .unwrap_or_else(|| field.widget.default_value());
                html.push_str(&render_field(field, &value));
            }
            html.push_str("</div>\n");
        }

        html.push_str("<p><button type=\"submit\">🚀 Predict / 点击预测</button></p>\n</form>\n");
        html
    }

    fn render_outcome(&self, outcome: &Outcome) -> String {
        match outcome {
            Outcome::Empty => String::new(),
            Outcome::Predicted(result) => render_result(result),
            Outcome::Invalid(err) => {
                let mut html =
                    String::from("<div class=\"alert error\"><strong>Input Errors / 输入错误:</strong></div>\n");
                for field in &err.fields {
                    let label = escape(self.layout.label_for(&field.feature));
                    html.push_str(&format!(
                        "<div class=\"alert error\">'{label}' requires a valid value<br>'{label}' 需要提供有效值</div>\n"
                    ));
                }
                html
            }
            Outcome::Failed(err) => {
                let msg = escape(&err.to_string());
                format!(
                    "<div class=\"alert error\">Prediction error: {msg}<br>预测过程中发生错误: {msg}</div>\n\
                     <div class=\"alert info\">Please check the input data format / 请检查输入数据的格式是否正确</div>\n"
                )
            }
        }
    }

    fn render_sidebar(&self, downloads: Downloads) -> String {
        let mut html = String::from("<aside>\n<h2>ℹ️ Model Information / 模型信息</h2>\n");
        html.push_str(&format!(
            "<p><strong>Algorithm / 算法</strong>: {}</p>\n",
            escape(&self.algorithm)
        ));
        html.push_str(&format!(
            "<p><strong>Number of Features / 特征数</strong>: {}</p>\n",
            self.features.len()
        ));
        html.push_str(&format!(
            "<p><strong>Optimal Threshold / 最佳阈值</strong>: {:.4}</p>\n",
            self.threshold
        ));

        if self.ui.show_feature_list {
            html.push_str("<h3>Clinical Features / 临床特征</h3>\n<ul>\n");
            for feature in &self.features {
                html.push_str(&format!("<li><small>{}</small></li>\n", escape(feature)));
            }
            html.push_str("</ul>\n");
        }

        html.push_str("<hr>\n");
        if !self.ui.development_notes.is_empty() {
            html.push_str(&format!(
                "<p><strong>Development Notes / 开发说明</strong>: {}</p>\n",
                escape(&self.ui.development_notes)
            ));
        }
        if !self.ui.team.is_empty() {
            html.push_str("<h3>Development Team / 开发团队</h3>\n<ul>\n");
            for member in &self.ui.team {
                html.push_str(&format!("<li><small>{}</small></li>\n", escape(member)));
            }
            html.push_str("</ul>\n");
        }

        html.push_str("<hr>\n<h3>Download Resources / 资源下载</h3>\n");
        html.push_str(&if downloads.model {
            "<p><a href=\"/download/model\">Download Model / 下载模型</a></p>\n".to_string()
        } else {
            "<div class=\"alert warning\">Model file not available for download / 模型文件不可下载</div>\n".to_string()
        });
        html.push_str(&if downloads.config {
            "<p><a href=\"/download/config\">Download Config / 下载配置</a></p>\n".to_string()
        } else {
            "<div class=\"alert warning\">Config file not available for download / 配置文件不可下载</div>\n".to_string()
        });

        html.push_str("</aside>\n");
        html
    }
}

fn render_field(field: &FieldConfig, value: &str) -> String {
    let name = escape(&field.feature);
    let label = escape(&field.label);
    let value = escape(value);

    let control = match &field.widget {
        WidgetConfig::Number { min, max, step, .. } => {
            let mut attrs = format!("step=\"{}\"", step);
            if let Some(min) = min {
                attrs.push_str(&format!(" min=\"{}\"", min));
            }
            if let Some(max) = max {
                attrs.push_str(&format!(" max=\"{}\"", max));
            }
            format!("<input type=\"number\" id=\"input_{name}\" name=\"{name}\" value=\"{value}\" {attrs}>")
        }
        WidgetConfig::Integer { min, .. } => {
            let min = min.map(|m| format!(" min=\"{}\"", m)).unwrap_or_default();
            format!("<input type=\"number\" id=\"input_{name}\" name=\"{name}\" value=\"{value}\" step=\"1\"{min}>")
        }
        WidgetConfig::Flag { .. } => {
            let checked = |option: &str| if value == option { " checked" } else { "" };
            format!(
                "<label><input type=\"radio\" name=\"{name}\" value=\"0\"{}> 0</label> \
                 <label><input type=\"radio\" name=\"{name}\" value=\"1\"{}> 1</label>",
                checked("0"),
                checked("1")
            )
        }
        WidgetConfig::Slider { min, max, .. } => format!(
            "<input type=\"range\" id=\"input_{name}\" name=\"{name}\" min=\"{min}\" max=\"{max}\" step=\"1\" value=\"{value}\" \
             oninput=\"this.nextElementSibling.value = this.value\"><output>{value}</output>"
        ),
    };

    let label_tag = match field.widget {
        WidgetConfig::Flag { .. } => format!("<label>{label}</label>"),
        _ => format!("<label for=\"input_{name}\">{label}</label>"),
    };

    format!("<div class=\"field\">{label_tag}{control}</div>\n")
}

fn render_result(result: &PredictionResult) -> String {
    let positive = result.label.is_positive();
    let color = if positive { POSITIVE_COLOR } else { NEGATIVE_COLOR };
    let (class, icon) = if positive { ("error", "⚠️") } else { ("success", "✅") };

    let mut html = String::from("<hr>\n<h3>🧠 Prediction Results / 模型预测结果</h3>\n");
    html.push_str(&format!(
        "<div class=\"probability\"><h2 style=\"color: {color};\">{}</h2><p>Predicted Probability / 预测概率</p></div>\n",
        result.probability_display()
    ));
    html.push_str(&format!(
        "<div class=\"alert {class}\">{icon} <strong>{}</strong></div>\n",
        result.label.headline()
    ));

    html.push_str("<p><strong>Clinical Recommendations / 临床建议:</strong></p>\n<ol>\n");
    for rec in &result.recommendations {
        html.push_str(&format!(
            "<li>{}<br>{}</li>\n",
            escape(&rec.text),
            escape(&rec.text_zh)
        ));
    }
    html.push_str("</ol>\n");

    html.push_str(&format!(
        "<progress value=\"{:.4}\" max=\"1\"></progress>\n<p>Risk Level: {}</p>\n",
        result.probability,
        result.bucket.label()
    ));
    html.push_str(&format!(
        "<p><small>Threshold / 阈值: {:.4} · Assessment {}</small></p>\n",
        result.threshold, result.assessment_id
    ));

    html
}

/// Escape text for HTML bodies and attribute values
pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{FieldError, FieldIssue};
    use crate::features::FeatureSpec;

    fn context() -> PageContext {
        let ui = UiConfig::default();
        let features: Vec<String> = ui
            .groups
            .iter()
            .flat_map(|g| g.fields.iter().map(|f| f.feature.clone()))
            .collect();
        let spec = FeatureSpec::new(features.clone()).unwrap();
        let layout = FormLayout::resolve(&ui, &spec).unwrap();

        PageContext {
            ui,
            layout,
            algorithm: "CatBoost (SHAP Simplified)".to_string(),
            threshold: 0.4585,
            features,
        }
    }

    const ALL: Downloads = Downloads {
        model: true,
        config: true,
    };

    #[test]
    fn test_empty_page_has_every_field_and_defaults() {
        let html = context().render(None, &Outcome::Empty, ALL);

        assert!(html.contains("name=\"admission_age\" value=\"60.000\""));
        assert!(html.contains("type=\"range\" id=\"input_gcs_min\""));
        assert!(html.contains("name=\"hypertension\" value=\"0\" checked"));
        assert!(html.contains("Optimal Threshold / 最佳阈值</strong>: 0.4585"));
        assert!(html.contains("href=\"/download/model\""));
        assert!(!html.contains("Prediction Results"));
    }

    #[test]
    fn test_json_flag_keeps_radio_selected() {
        let record = InputRecord::new().with("hypertension", true);
        let html = context().render(Some(&record), &Outcome::Empty, ALL);

        assert!(html.contains("name=\"hypertension\" value=\"1\" checked"));
        assert!(!html.contains("name=\"hypertension\" value=\"0\" checked"));
    }

    #[test]
    fn test_result_shows_probability_and_advice() {
        let result = PredictionResult::new(0.10, 0.4585);
        let html = context().render(None, &Outcome::Predicted(result), ALL);

        assert!(html.contains("0.1000"));
        assert!(html.contains(NEGATIVE_COLOR));
        assert!(html.contains("Low Risk: Delirium Unlikely"));
        assert!(html.contains("Maintain routine monitoring"));
        assert!(html.contains("Risk Level: Low Risk / 低风险"));
    }

    #[test]
    fn test_validation_errors_use_display_labels() {
        let err = ValidationError {
            fields: vec![FieldError {
                feature: "sbp".to_string(),
                issue: FieldIssue::Missing,
            }],
        };
        let html = context().render(None, &Outcome::Invalid(err), ALL);

        assert!(html.contains("Input Errors / 输入错误"));
        assert!(html.contains(
            "'Systolic Blood Pressure (SBP) / 收缩压 (mmHg)' requires a valid value"
        ));
    }

    #[test]
    fn test_missing_artifacts_degrade_to_warnings() {
        let html = context().render(
            None,
            &Outcome::Empty,
            Downloads {
                model: false,
                config: true,
            },
        );

        assert!(html.contains("Model file not available for download"));
        assert!(!html.contains("href=\"/download/model\""));
        assert!(html.contains("href=\"/download/config\""));
    }

    #[test]
    fn test_submitted_values_are_escaped_back_into_form() {
        let record = InputRecord::new().with("sbp", "<b>12");
        let html = context().render(Some(&record), &Outcome::Empty, ALL);

        assert!(html.contains("value=\"&lt;b&gt;12\""));
    }

    #[test]
    fn test_escape() {
        assert_eq!(escape(r#"a<b>&"c'"#), "a&lt;b&gt;&amp;&quot;c&#39;");
    }
}
