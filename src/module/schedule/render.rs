///! HTML rendering for email reports
use super::types::{ChangeReport, ModifiedEntry, ScheduleEntry};
use chrono::NaiveDateTime;

const CHANGE_REPORT_STYLE: &str = r#"
    body { font-family: Arial, sans-serif; }
    h2 { color: #333; }
    h3 { margin-top: 20px; }
    table { border-collapse: collapse; width: 100%; margin-top: 10px; }
    th { background-color: #4CAF50; color: white; padding: 8px; text-align: left; }
    td { border: 1px solid #ddd; padding: 8px; }
    tr:nth-child(even) { background-color: #f2f2f2; }
    .added { background-color: #d4edda; }
    .removed { background-color: #f8d7da; }
    .modified { background-color: #fff3cd; }
"#;

const WEEKLY_REPORT_STYLE: &str = r#"
    body { font-family: Arial, sans-serif; }
    h2 { color: #2c3e50; }
    table { border-collapse: collapse; width: 100%; margin: 20px 0; }
    th { background-color: #3498db; color: white; padding: 12px; text-align: left; }
    td { border: 1px solid #ddd; padding: 10px; }
    tr:nth-child(even) { background-color: #f2f2f2; }
    .summary { background-color: #d4edda; border-left: 4px solid #28a745;
               padding: 15px; margin: 20px 0; border-radius: 5px; }
    .footer { margin-top: 30px; font-size: 12px; color: #7f8c8d; }
    .test-mode { background-color: #fff3cd; border-left: 4px solid #ffc107;
                 padding: 10px; margin: 10px 0; }
"#;

fn escape(raw: &str) -> String {
    raw.replace('&', "&amp;").replace('<', "&lt;").replace('>', "&gt;")
}

fn time_display(entry: &ScheduleEntry) -> String {
    if entry.end_time.is_empty() {
        entry.start_time.clone()
    } else {
        format!("{} - {}", entry.start_time, entry.end_time)
    }
}

fn entry_row(entry: &ScheduleEntry, css_class: &str) -> String {
    format!(
        "<tr class='{}'><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td></tr>",
        css_class,
        escape(&entry.date),
        escape(&time_display(entry)),
        entry.schedule_type,
        escape(&entry.league),
        escape(&entry.team),
        escape(&entry.venue),
    )
}

const ENTRY_TABLE_HEADER: &str =
    "<tr><th>Date</th><th>Time</th><th>Type</th><th>League</th><th>Team</th><th>Venue</th></tr>";

/// Human-readable description of what changed on a modified booking,
/// one line per differing field.
fn describe_changes(modified: &ModifiedEntry) -> String {
    let mut parts = Vec::new();
    if modified.old.team != modified.new.team {
        parts.push(format!(
            "<strong>Team:</strong> {} &rarr; {}",
            escape(&modified.old.team),
            escape(&modified.new.team)
        ));
    }
    if modified.old.end_time != modified.new.end_time {
        parts.push(format!(
            "<strong>End:</strong> {} &rarr; {}",
            escape(&modified.old.end_time),
            escape(&modified.new.end_time)
        ));
    }
    if modified.old.venue != modified.new.venue {
        parts.push(format!(
            "<strong>Venue:</strong> {} &rarr; {}",
            escape(&modified.old.venue),
            escape(&modified.new.venue)
        ));
    }
    parts.join("<br>")
}

/// Render a change report as a styled HTML document.
///
/// The report assumes `added` and `removed` arrive sorted by
/// `(date, start_time)`; the diff engine guarantees that ordering.
pub fn render_change_report(
    report: &ChangeReport,
    venue: &str,
    horizon_days: i64,
    detected_at: NaiveDateTime,
) -> String {
    if !report.has_changes {
        return "<p>No changes detected.</p>".to_string();
    }

    let mut html = String::new();
    html.push_str("<html><head><style>");
    html.push_str(CHANGE_REPORT_STYLE);
    html.push_str("</style></head><body>");

    html.push_str(&format!(
        "<h2>&#128276; Schedule Changes Detected at {} (Next {} Days)</h2>",
        escape(venue),
        horizon_days
    ));
    html.push_str(&format!(
        "<p><strong>Detected at:</strong> {}</p>",
        detected_at.format("%Y-%m-%d %I:%M %p")
    ));

    if !report.added.is_empty() {
        html.push_str("<h3 style='color: green;'>&#10133; New Ice Times Added</h3><table>");
        html.push_str(ENTRY_TABLE_HEADER);
        for entry in &report.added {
            html.push_str(&entry_row(entry, "added"));
        }
        html.push_str("</table>");
    }

    if !report.removed.is_empty() {
        html.push_str("<h3 style='color: red;'>&#10134; Ice Times Cancelled/Removed</h3><table>");
        html.push_str(ENTRY_TABLE_HEADER);
        for entry in &report.removed {
            html.push_str(&entry_row(entry, "removed"));
        }
        html.push_str("</table>");
    }

    if !report.modified.is_empty() {
        html.push_str("<h3 style='color: orange;'>&#128260; Ice Times Modified</h3><table>");
        html.push_str(
            "<tr><th>Date</th><th>Time</th><th>Type</th><th>League</th><th>Changes</th></tr>",
        );
        for modified in &report.modified {
            html.push_str(&format!(
                "<tr class='modified'><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td></tr>",
                escape(&modified.new.date),
                escape(&time_display(&modified.new)),
                modified.new.schedule_type,
                escape(&modified.new.league),
                describe_changes(modified),
            ));
        }
        html.push_str("</table>");
    }

    html.push_str(&format!(
        "<div style='margin-top: 30px; padding: 15px; background-color: #f0f0f0; \
         border-left: 4px solid #4CAF50;'><h3 style='margin-top: 0;'>Summary</h3><ul>\
         <li><strong>{}</strong> ice times added</li>\
         <li><strong>{}</strong> ice times removed</li>\
         <li><strong>{}</strong> ice times modified</li></ul></div>",
        report.added.len(),
        report.removed.len(),
        report.modified.len()
    ));

    html.push_str(
        "<p style='margin-top: 30px; color: #666; font-size: 12px;'>\
         This is an automated notification from the rinkwatch schedule monitor.</p>\
         </body></html>",
    );

    html
}

/// Render the weekly full-schedule report.
pub fn render_weekly_report(
    entries: &[ScheduleEntry],
    venue: &str,
    schedule_url: &str,
    generated_at: NaiveDateTime,
    test_mode: bool,
) -> String {
    if entries.is_empty() {
        return format!(
            "<html><body style=\"font-family: Arial, sans-serif;\">\
             <h2 style=\"color: #2c3e50;\">Weekly Schedule Report - {venue}</h2>\
             <p style=\"background-color: #fff3cd; padding: 15px; border-left: 4px solid #ffc107;\">\
             <strong>No ice times scheduled</strong> at {venue} for the upcoming week.</p>\
             <p style=\"color: #7f8c8d; font-size: 12px;\"><em>Report generated: {ts}</em></p>\
             </body></html>",
            venue = escape(venue),
            ts = generated_at.format("%Y-%m-%d %H:%M"),
        );
    }

    let mut html = String::new();
    html.push_str("<html><head><style>");
    html.push_str(WEEKLY_REPORT_STYLE);
    html.push_str("</style></head><body>");

    html.push_str(&format!(
        "<h2>&#127954; Weekly Schedule Report - {}</h2>\
         <div class='summary'><strong>Summary:</strong> {} ice time(s) scheduled at {} \
         for the upcoming week</div>",
        escape(venue),
        entries.len(),
        escape(venue)
    ));

    html.push_str("<table><thead>");
    html.push_str(ENTRY_TABLE_HEADER);
    html.push_str("</thead><tbody>");
    for entry in entries {
        html.push_str(&entry_row(entry, ""));
    }
    html.push_str("</tbody></table>");

    if test_mode {
        html.push_str(
            "<div class='test-mode'><strong>&#9888; TEST MODE:</strong> This email was \
             generated in test mode and would not normally be sent.</div>",
        );
    }

    html.push_str(&format!(
        "<div class='footer'><p><em>Report generated: {}</em></p>\
         <p>This is an automated report. For the latest schedule, visit \
         <a href=\"{}\">the league schedule page</a>.</p></div></body></html>",
        generated_at.format("%Y-%m-%d %H:%M"),
        schedule_url,
    ));

    html
}
