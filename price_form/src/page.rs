use car_price_model::{FuelType, InputRecord, Transmission};

const STYLE: &str = r#"
body { background-color: #1e1e1e; color: #f0f0f0; font-family: sans-serif; margin: 0; display: flex; }
aside { width: 18rem; padding: 1.5rem; background-color: #262626; min-height: 100vh; }
main { flex: 1; max-width: 44rem; margin: 0 auto; padding: 1.5rem; }
h1 { color: #ff4b4b; text-align: center; }
.columns { display: grid; grid-template-columns: 1fr 1fr; gap: 1rem; }
label { display: block; margin-bottom: 0.75rem; }
input, select { width: 100%; box-sizing: border-box; border-radius: 8px; padding: 8px; background-color: #2b2b2b; color: white; border: 1px solid #444; }
button { background-color: #ff4b4b; color: white; font-size: 16px; border: none; border-radius: 10px; padding: 10px; width: 100%; cursor: pointer; }
.notice { padding: 0.75rem 1rem; border-radius: 8px; margin-bottom: 1rem; }
.success { background-color: #1f3d2b; }
.warning { background-color: #4a3f12; }
.error { background-color: #5a1f1f; }
.price { background-color: #ff4b4b; padding: 15px; border-radius: 10px; text-align: center; margin-top: 1rem; }
"#;

/// What the single page shows for the current session.
#[derive(Debug, Clone, Default)]
pub struct PageView {
    pub model_name: Option<String>,
    pub record: InputRecord,
    pub price: Option<f64>,
    pub error: Option<String>,
}

/// Formats a price as dollars with two decimals and comma thousands
/// separators. The sign follows the dollar sign: `$-1,234.50`.
pub fn format_currency(value: f64) -> String {
    let digits = format!("{:.2}", value.abs());
    let (whole, fraction) = digits.split_once('.').unwrap_or((digits.as_str(), "00"));

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (index, digit) in whole.chars().enumerate() {
        if index > 0 && (whole.len() - index) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }

    let sign = if value < 0.0 { "-" } else { "" };
    format!("${}{}.{}", sign, grouped, fraction)
}

pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            other => escaped.push(other),
        }
    }
    escaped
}

fn options<T: Copy + PartialEq>(choices: &[T], selected: T, label: fn(&T) -> &'static str) -> String {
    choices
        .iter()
        .map(|choice| {
            let name = label(choice);
            let marker = if *choice == selected { " selected" } else { "" };
            format!(r#"<option value="{0}"{1}>{0}</option>"#, name, marker)
        })
        .collect()
}

fn upload_panel() -> String {
    r#"<aside>
<h2>Upload Model</h2>
<form action="/model" method="post" enctype="multipart/form-data">
<label>Upload your trained car price model (.onnx file)
<input type="file" name="model" accept=".onnx" required></label>
<button type="submit">Load model</button>
</form>
<form action="/reset" method="post"><p><button type="submit">Reset session</button></p></form>
</aside>"#
        .to_string()
}

fn details_form(record: &InputRecord) -> String {
    format!(
        r#"<h3>Enter Car Details:</h3>
<form action="/predict" method="post">
<div class="columns">
<div>
<label>Year <input type="number" name="year" min="1980" max="2026" value="{year}"></label>
<label>Mileage (in km) <input type="number" name="mileage" min="0" value="{mileage}"></label>
<label>Engine Size (L) <input type="number" name="engine_size" min="0.5" max="8.0" step="0.1" value="{engine_size:.1}"></label>
</div>
<div>
<label>Fuel Type <select name="fuel_type">{fuel_types}</select></label>
<label>Transmission <select name="transmission">{transmissions}</select></label>
<label>Brand <input type="text" name="brand" value="{brand}"></label>
</div>
</div>
<button type="submit">Predict Price</button>
</form>"#,
        year = record.year,
        mileage = record.mileage,
        engine_size = record.engine_size,
        fuel_types = options(&FuelType::ALL, record.fuel_type, FuelType::as_str),
        transmissions = options(&Transmission::ALL, record.transmission, Transmission::as_str),
        brand = escape_html(&record.brand),
    )
}

pub fn render_page(view: &PageView) -> String {
    let mut content = String::new();

    if let Some(error) = &view.error {
        content.push_str(&format!(
            r#"<div class="notice error">&#10060; {}</div>"#,
            escape_html(error)
        ));
    }

    match &view.model_name {
        None => content.push_str(
            r#"<div class="notice warning">&#9888;&#65039; Please upload your trained car price model (.onnx file) from the sidebar to start predicting.</div>"#,
        ),
        Some(name) => {
            content.push_str(&format!(
                r#"<div class="notice success">&#9989; Model <code>{}</code> loaded successfully!</div>"#,
                escape_html(name)
            ));
            content.push_str(&details_form(&view.record));
        }
    }

    if let Some(price) = view.price {
        content.push_str(&format!(
            r#"<div class="price"><h2>Estimated Price: &#128176; {}</h2></div>"#,
            format_currency(price)
        ));
    }

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<title>Sports Car Price Predictor</title>
<style>{style}</style>
</head>
<body>
{panel}
<main>
<h1>&#127950;&#65039; Sports Car Price Predictor</h1>
{content}
</main>
</body>
</html>"#,
        style = STYLE,
        panel = upload_panel(),
        content = content,
    )
}
