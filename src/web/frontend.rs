//! Embedded HTML form page.
//!
//! The page is assembled in-process from the form field tables; no external
//! assets or scripts. Submitting the form posts it back to `/predict`, and
//! the reply is the same page with `#result` filled in.

use std::fmt::Write;

use crate::form::{self, FieldSource, FormSnapshot};

/// Label and input step for each numeric field.
const NUMERIC_INPUTS: [(&str, &str, &str); 4] = [
    (form::AGE, "Edad", "1"),
    (form::BMI, "Índice de masa corporal", "0.1"),
    (form::LIVER_FUNCTION_SCORE, "Puntuación de función hepática", "0.1"),
    (form::ALPHA_FETOPROTEIN_LEVEL, "Nivel de alfa-fetoproteína", "0.01"),
];

const SELECT_LABELS: [(&str, &str); 4] = [
    (form::GENDER, "Género"),
    (form::ALCOHOL_CONSUMPTION, "Consumo de alcohol"),
    (form::SMOKING_STATUS, "Tabaquismo"),
    (form::PHYSICAL_ACTIVITY_LEVEL, "Actividad física"),
];

const CHECKBOX_LABELS: [(&str, &str); 5] = [
    (form::HEPATITIS_B, "Hepatitis B"),
    (form::HEPATITIS_C, "Hepatitis C"),
    (form::CIRRHOSIS_HISTORY, "Historial de cirrosis"),
    (form::FAMILY_HISTORY_CANCER, "Antecedentes familiares de cáncer"),
    (form::DIABETES, "Diabetes"),
];

const STYLE: &str = r#"
body { font-family: -apple-system, 'Segoe UI', Helvetica, Arial, sans-serif; background: #f6f8fa; color: #1f2328; }
main { max-width: 640px; margin: 32px auto; background: #fff; padding: 24px 32px; border: 1px solid #d0d7de; border-radius: 8px; }
h1 { font-size: 22px; margin-bottom: 20px; }
label { display: block; margin: 10px 0 4px; font-weight: 600; font-size: 14px; }
input[type=number], select { width: 100%; padding: 6px 8px; border: 1px solid #d0d7de; border-radius: 6px; }
.checks label { display: flex; align-items: center; gap: 8px; font-weight: 400; }
button { margin-top: 20px; padding: 8px 20px; border: none; border-radius: 6px; background: #0969da; color: #fff; font-size: 14px; cursor: pointer; }
#result { margin-top: 24px; }
"#;

/// Render the full page. `form` pre-fills the inputs with the values just
/// submitted; `result_html` becomes the contents of `#result`.
pub fn render_page(form: Option<&FormSnapshot>, result_html: &str) -> String {
    let mut fields = String::new();

    for (id, label, step) in NUMERIC_INPUTS {
        let value = form.and_then(|f| f.value(id)).unwrap_or_default();
        let _ = writeln!(
            fields,
            r#"<label for="{id}">{label}</label>
<input type="number" id="{id}" name="{id}" step="{step}" value="{}" required>"#,
            attr_escape(&value)
        );
    }

    for (id, label) in SELECT_LABELS {
        let selected = form.and_then(|f| f.value(id));
        let _ = writeln!(fields, r#"<label for="{id}">{label}</label>"#);
        let _ = writeln!(fields, r#"<select id="{id}" name="{id}">"#);
        for option in select_options(id) {
            let marker = if selected.as_deref() == Some(*option) {
                " selected"
            } else {
                ""
            };
            let _ = writeln!(fields, r#"  <option value="{option}"{marker}>{option}</option>"#);
        }
        let _ = writeln!(fields, "</select>");
    }

    let _ = writeln!(fields, r#"<div class="checks">"#);
    for (id, label) in CHECKBOX_LABELS {
        let checked = form.and_then(|f| f.checked(id)).unwrap_or(false);
        let marker = if checked { " checked" } else { "" };
        let _ = writeln!(
            fields,
            r#"<label><input type="checkbox" id="{id}" name="{id}"{marker}> {label}</label>"#
        );
    }
    let _ = writeln!(fields, "</div>");

    format!(
        r#"<!DOCTYPE html>
<html lang="es">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>Predicción de riesgo de cáncer de hígado</title>
<style>{STYLE}</style>
</head>
<body>
<main>
<h1>Predicción de riesgo de cáncer de hígado</h1>
<form method="post" action="/predict">
{fields}<button type="submit">Predecir</button>
</form>
<div id="result">{result_html}</div>
</main>
</body>
</html>
"#
    )
}

fn select_options(id: &str) -> &'static [&'static str] {
    form::SELECT_OPTIONS
        .iter()
        .find(|(field, _)| *field == id)
        .map(|(_, options)| *options)
        .unwrap_or(&[])
}

fn attr_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('"', "&quot;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}
