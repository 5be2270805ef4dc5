/// What the page shows under the form.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Result {
        label: String,
        score: f32,
        positive: bool,
    },
    Warning(String),
    Error(String),
}

const STYLE: &str = r#"
body { font-family: 'Roboto', sans-serif; background: #121212; color: #E0E0E0; }
main { max-width: 640px; margin: 40px auto; }
h1 { color: #03DAC6; text-align: center; }
textarea { width: 100%; height: 150px; background: #1E1E1E; color: #E0E0E0;
  border: 1px solid #333; border-radius: 8px; padding: 12px; font-size: 1rem; }
button { display: block; margin: 20px auto 0; border: 2px solid #03DAC6; border-radius: 25px;
  color: #03DAC6; background: transparent; padding: 10px 24px; font-weight: bold;
  text-transform: uppercase; letter-spacing: 1px; }
button:hover { background: #03DAC6; color: #121212; }
.result { padding: 25px; border-radius: 10px; margin-top: 25px; text-align: center; border-left: 5px solid; }
.positive { border-color: #00BFA6; background: rgba(0, 191, 166, 0.1); color: #00BFA6; }
.negative { border-color: #FF5252; background: rgba(255, 82, 82, 0.1); color: #FF5252; }
.header { font-size: 2rem; font-weight: 700; }
.score { font-size: 1.1rem; color: #A0A0A0; margin-top: 10px; }
.warning { color: #FFC107; margin-top: 20px; }
.error { color: #FF5252; margin-top: 20px; }
"#;

pub fn escape_html(input: &str) -> String {
    let mut escaped = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#x27;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// Confidence as a percentage with two decimals, e.g. `0.73` -> `73.00%`.
pub fn format_score(score: f32) -> String {
    format!("{:.2}%", score * 100.0)
}

fn render_outcome(outcome: &Outcome, api_url: &str) -> String {
    match outcome {
        Outcome::Result {
            label,
            score,
            positive,
        } => {
            let (class, icon) = if *positive {
                ("positive", "&#x1F44D;")
            } else {
                ("negative", "&#x1F44E;")
            };
            format!(
                r#"<div class="result {class}"><div class="header">{icon} {label}</div><p class="score">Confidence score: <strong>{score}</strong></p></div>"#,
                label = escape_html(label),
                score = format_score(*score),
            )
        }
        Outcome::Warning(message) => {
            format!(r#"<p class="warning">{}</p>"#, escape_html(message))
        }
        Outcome::Error(message) => format!(
            r#"<p class="error">API error: {}</p><p class="error">Make sure the API is running at {}</p>"#,
            escape_html(message),
            escape_html(api_url),
        ),
    }
}

pub fn render(input: &str, outcome: Option<&Outcome>, api_url: &str) -> String {
    let outcome = outcome
        .map(|outcome| render_outcome(outcome, api_url))
        .unwrap_or_default();

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<title>Sentiment Analysis</title>
<style>{STYLE}</style>
</head>
<body>
<main>
<h1>&#x1F3AD; Sentiment Analyzer</h1>
<p>Enter a comment (in <strong>English</strong>) and the model will predict whether its sentiment is <strong>positive</strong> or <strong>negative</strong>.</p>
<form method="post" action="/">
<label for="text">Your comment:</label>
<textarea id="text" name="text" placeholder="Ex: 'This movie was absolutely fantastic, the acting was superb!'">{input}</textarea>
<button type="submit">Analyze sentiment</button>
</form>
{outcome}
</main>
</body>
</html>
"#,
        input = escape_html(input),
    )
}
