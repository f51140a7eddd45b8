use crate::model::classifier::Prediction;
use html_escape::encode_text;

pub const INDEX_HTML: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="utf-8">
  <title>Waste Classifier</title>
</head>
<body>
  <h1>What kind of waste is this?</h1>
  <form action="/upload" method="post" enctype="multipart/form-data">
    <input type="file" name="file" accept=".png,.jpg,.jpeg" required>
    <button type="submit">Classify</button>
  </form>
</body>
</html>
"#;

pub fn render_result(filename: &str, prediction: &Prediction) -> String {
    let categories: String = prediction
        .categories
        .iter()
        .map(|c| format!("      <li>{}</li>\n", encode_text(c)))
        .collect();

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="utf-8">
  <title>Result - {label}</title>
</head>
<body>
  <h1>Prediction</h1>
  <img src="/static/uploads/{filename}" alt="uploaded image" width="224">
  <p>Predicted class: <strong>{label}</strong></p>
  <p>Confidence: {confidence:.2}%</p>
  <h2>Functional categories</h2>
  <ul>
{categories}  </ul>
  <a href="/">Classify another image</a>
</body>
</html>
"#,
        label = encode_text(&prediction.label),
        filename = encode_text(filename),
        confidence = prediction.confidence,
        categories = categories,
    )
}
