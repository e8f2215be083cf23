//! Server-rendered HTML pages.

use crate::charts::{BAR_CHART_FILE, PIE_CHART_FILE};
use crate::models::Label;
use crate::report::ReportSummary;

pub const EMPTY_STORE_MESSAGE: &str = "No data submitted yet.";

pub fn escape_html(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

fn layout(title: &str, body: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<title>{title}</title>
</head>
<body>
{body}
</body>
</html>
"#
    )
}

pub fn login_page() -> String {
    layout(
        "Insurance Fraud Detection - Login",
        r#"<h1>Insurance Fraud Detection</h1>
<form method="post" action="/login">
<label>Role
<select name="role">
<option value="user">User</option>
<option value="admin">Admin</option>
</select>
</label>
<label>Password <input type="password" name="password"></label>
<button type="submit">Login</button>
</form>"#,
    )
}

/// User dashboard with the claim form, and either the last prediction or
/// the reason the form was rejected.
pub fn user_dashboard(result: Option<Label>, error: Option<&str>) -> String {
    let mut body = String::from(
        r#"<h1>Submit a Claim</h1>
<form method="post" action="/predict">
<label>Age <input name="age" inputmode="numeric" required></label>
<label>Months as customer <input name="months" inputmode="numeric" required></label>
<label>Policy annual premium <input name="premium" inputmode="decimal" required></label>
<label>Total claim amount <input name="claim" inputmode="decimal" required></label>
<button type="submit">Predict</button>
</form>"#,
    );
    if let Some(error) = error {
        body.push_str(&format!(
            "\n<p class=\"error\">Invalid claim: {}</p>",
            escape_html(error)
        ));
    }
    if let Some(result) = result {
        body.push_str(&format!(
            "\n<h2>Prediction: <span class=\"result\">{result}</span></h2>"
        ));
    }
    layout("User Dashboard", &body)
}

pub fn admin_dashboard(summary: &ReportSummary) -> String {
    // Counts change whenever the charts do; use them to bust browser caches.
    let version = format!("{}-{}", summary.counts.fraud, summary.counts.genuine);
    let body = format!(
        r#"<h1>Admin Dashboard</h1>
<ul>
<li>Fraud: <strong id="fraud">{fraud}</strong></li>
<li>Genuine: <strong id="genuine">{genuine}</strong></li>
<li>Total: <strong id="total">{total}</strong></li>
</ul>
<img src="/static/{BAR_CHART_FILE}?v={version}" alt="Fraud vs Genuine">
<img src="/static/{PIE_CHART_FILE}?v={version}" alt="Fraud Distribution">
{table}"#,
        fraud = summary.counts.fraud,
        genuine = summary.counts.genuine,
        total = summary.total_count,
        table = summary.table_html,
    );
    layout("Admin Dashboard", &body)
}
