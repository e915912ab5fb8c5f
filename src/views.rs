//! Server-rendered HTML pages.

use std::fmt::Write as _;

use axum::http::StatusCode;

use crate::records::{dto::RecordRow, services::Aggregate};

const CHART_JS: &str = "https://cdn.jsdelivr.net/npm/chart.js@4";

pub fn escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
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

fn notice_text(notice: Option<&str>) -> Option<&'static str> {
    match notice? {
        "added" => Some("Record added."),
        "deleted" => Some("Record deleted."),
        _ => None,
    }
}

fn layout(title: &str, notice: Option<&str>, body: &str) -> String {
    let banner = notice_text(notice)
        .map(|t| format!(r#"<div class="notice">{t}</div>"#))
        .unwrap_or_default();
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<title>{title} · School Meal Waste</title>
<style>
body {{ font-family: sans-serif; margin: 2rem; }}
nav a {{ margin-right: 1rem; }}
table {{ border-collapse: collapse; width: 100%; }}
th, td {{ border: 1px solid #ccc; padding: .4rem; text-align: left; }}
.notice {{ background: #e6f4ea; padding: .6rem; margin: 1rem 0; }}
.stats span {{ display: inline-block; margin-right: 2rem; }}
</style>
</head>
<body>
<nav><a href="/">Dashboard</a><a href="/add">Add record</a><a href="/reports">Reports</a></nav>
{banner}
<h1>{title}</h1>
{body}
</body>
</html>
"#,
        title = escape(title),
    )
}

fn records_table(rows: &[RecordRow], with_delete: bool) -> String {
    if rows.is_empty() {
        return "<p>No records yet.</p>".into();
    }
    let mut html = String::from(
        "<table><thead><tr><th>Date</th><th>School</th><th>Meal</th>\
         <th>Prepared</th><th>Served</th><th>Wasted</th><th>Waste %</th>",
    );
    if with_delete {
        html.push_str("<th></th>");
    }
    html.push_str("</tr></thead><tbody>");
    for r in rows {
        let _ = write!(
            html,
            "<tr><td>{}</td><td>{}</td><td>{}</td><td>{:.1}</td><td>{:.1}</td><td>{:.1}</td><td>{:.1}%</td>",
            r.date,
            escape(&r.school_name),
            escape(&r.meal_type),
            r.food_prepared,
            r.food_served,
            r.food_wasted,
            r.waste_percentage,
        );
        if with_delete {
            let _ = write!(
                html,
                r#"<td><form method="post" action="/delete/{}"><button type="submit">Delete</button></form></td>"#,
                r.id
            );
        }
        html.push_str("</tr>");
    }
    html.push_str("</tbody></table>");
    html
}

pub fn dashboard(rows: &[RecordRow], total_records: i64, totals: &Aggregate, notice: Option<&str>) -> String {
    let body = format!(
        r#"<div class="stats">
<span>Records: <strong>{total_records}</strong></span>
<span>Total wasted: <strong>{:.1}</strong></span>
<span>Total prepared: <strong>{:.1}</strong></span>
<span>Average waste: <strong>{:.1}%</strong></span>
</div>
<h2>Latest records</h2>
{}"#,
        totals.total_wasted,
        totals.total_prepared,
        totals.avg_waste_percentage,
        records_table(rows, false),
    );
    layout("Dashboard", notice, &body)
}

pub fn add_form(today: &str) -> String {
    let body = format!(
        r#"<form method="post" action="/add">
<p><label>School <input name="school_name" maxlength="100" required></label></p>
<p><label>Meal <select name="meal_type">
<option value="breakfast">Breakfast</option>
<option value="lunch" selected>Lunch</option>
<option value="snack">Snack</option>
<option value="dinner">Dinner</option>
</select></label></p>
<p><label>Food prepared <input name="food_prepared" type="number" step="0.1" min="0" required></label></p>
<p><label>Food served <input name="food_served" type="number" step="0.1" min="0" required></label></p>
<p><label>Date <input name="date" type="date" value="{}"></label></p>
<p><button type="submit">Save</button></p>
</form>"#,
        escape(today)
    );
    layout("Add record", None, &body)
}

pub fn reports(rows: &[RecordRow], chart_json: &str, notice: Option<&str>) -> String {
    // Keep the payload from closing the script element.
    let chart_json = chart_json.replace("</", "<\\/");
    let body = format!(
        r#"<canvas id="trend" height="100"></canvas>
<script id="chart-data" type="application/json">{chart_json}</script>
<script src="{CHART_JS}"></script>
<script>
const points = JSON.parse(document.getElementById('chart-data').textContent);
new Chart(document.getElementById('trend'), {{
  type: 'line',
  data: {{
    labels: points.map(p => p.date),
    datasets: [{{ label: 'Food wasted', data: points.map(p => p.waste) }}]
  }}
}});
</script>
<h2>All records</h2>
{}"#,
        records_table(rows, true)
    );
    layout("Reports", notice, &body)
}

pub fn error_page(status: StatusCode, detail: Option<&str>) -> String {
    let title = status.canonical_reason().unwrap_or("Error");
    let body = match detail {
        Some(d) => format!("<p>{}</p>", escape(d)),
        None => format!("<p>The request could not be completed ({}).</p>", status.as_u16()),
    };
    layout(title, None, &body)
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::date;

    fn row(name: &str) -> RecordRow {
        RecordRow {
            id: 7,
            school_name: name.into(),
            meal_type: "lunch".into(),
            food_prepared: 50.0,
            food_served: 45.0,
            food_wasted: 5.0,
            waste_percentage: 10.0,
            date: date!(2024 - 05 - 10),
        }
    }

    #[test]
    fn escapes_markup() {
        assert_eq!(escape(r#"<a href="x">&'"#), "&lt;a href=&quot;x&quot;&gt;&amp;&#39;");
    }

    #[test]
    fn school_names_are_escaped_in_tables() {
        let html = records_table(&[row("<script>")], false);
        assert!(html.contains("&lt;script&gt;"));
        assert!(!html.contains("<script>"));
    }

    #[test]
    fn reports_table_has_delete_forms() {
        let html = reports(&[row("EMEF Sul")], "[]", None);
        assert!(html.contains(r#"action="/delete/7""#));
        assert!(html.contains("10.0%"));
    }

    #[test]
    fn known_notice_renders_banner() {
        assert!(layout("x", Some("added"), "").contains("Record added."));
        assert!(!layout("x", Some("<b>"), "").contains("notice\""));
    }

    #[test]
    fn chart_payload_cannot_close_script() {
        let html = reports(&[], r#"[{"date":"</script>"}]"#, None);
        assert!(html.contains(r#"<\/script>"#));
    }
}
