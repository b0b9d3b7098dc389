use crate::model::{DeviceAlert, GatewayAlert};
use crate::surface::Surface;

/// Cards per row on the dashboard summary sections.
pub const SUMMARY_CHUNK: usize = 3;
/// Cards per row on the device detail section.
pub const DETAIL_CHUNK: usize = 2;

/// One rendered row's worth of alert cards.
pub type RowGroup<T> = Vec<T>;

/// Render plan for one alert section. Zero records is an explicit state,
/// not an empty row list, so the section always renders something.
#[derive(Debug, Clone, PartialEq)]
pub enum RenderPlan<T> {
    Empty,
    Rows(Vec<RowGroup<T>>),
}

/// Partition records into contiguous chunks of `chunk_size`, preserving
/// backend order. The backend's ordering is authoritative; re-rendering
/// identical input yields identical rows.
pub fn build_row_groups<T: Clone>(records: &[T], chunk_size: usize) -> RenderPlan<T> {
    if records.is_empty() {
        return RenderPlan::Empty;
    }
    RenderPlan::Rows(records.chunks(chunk_size).map(|chunk| chunk.to_vec()).collect())
}

/// Which card shape a section renders.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CardShape {
    Summary,
    Detail,
}

/// Card rendering per alert variant: which fields are shown and which URL
/// template backs the click-through.
pub trait AlertCard {
    fn card(&self, shape: CardShape) -> String;
}

fn summary_card(subject: &str, issue: &str, class: &str, uid: &str, link_kind: &str) -> String {
    format!(
        concat!(
            "<div class=\"col-sm-4 grid-margin\">",
            "<div class=\"card {class}\" onclick=\"location.href='/{link}?alert_uid={uid}';\">",
            "<div class=\"card-body\">",
            "<a href=\"/delete_alert?uid={uid}\" class=\"delete\">&#x2715;</a>",
            "<h5>{subject}</h5>",
            "<h3 class=\"mb-0\">{issue}</h3>",
            "</div></div></div>"
        ),
        class = class,
        link = link_kind,
        uid = uid,
        subject = subject,
        issue = issue,
    )
}

impl AlertCard for DeviceAlert {
    fn card(&self, shape: CardShape) -> String {
        match shape {
            CardShape::Summary => summary_card(
                &self.device,
                &self.issue,
                self.severity.class(),
                &self.uid,
                "device",
            ),
            CardShape::Detail => format!(
                concat!(
                    "<div class=\"col-6\">",
                    "<div class=\"card {class}\">",
                    "<div class=\"card-alert\">",
                    "<a href=\"/delete_alert?uid={uid}\" class=\"delete\">&#x2715;</a>",
                    "<h3 class=\"mb-0\">{issue}</h3>",
                    "<h5><span class=\"alert-key\">Name:</span> {device}</h5>",
                    "<h5><span class=\"alert-key\">Gateway:</span> {gateway}</h5>",
                    "<h5>{message}</h5>",
                    "</div></div></div>"
                ),
                class = self.severity.class(),
                uid = self.uid,
                issue = self.issue,
                device = self.device,
                gateway = self.gateway,
                message = self.message,
            ),
        }
    }
}

impl AlertCard for GatewayAlert {
    fn card(&self, shape: CardShape) -> String {
        match shape {
            CardShape::Summary => summary_card(
                &self.gateway,
                &self.issue,
                self.severity.class(),
                &self.uid,
                "gateway",
            ),
            CardShape::Detail => format!(
                concat!(
                    "<div class=\"col-6\">",
                    "<div class=\"card {class}\">",
                    "<div class=\"card-alert\">",
                    "<a href=\"/delete_alert?uid={uid}\" class=\"delete\">&#x2715;</a>",
                    "<h3 class=\"mb-0\">{issue}</h3>",
                    "<h5><span class=\"alert-key\">Name:</span> {gateway}</h5>",
                    "<h5>{message}</h5>",
                    "</div></div></div>"
                ),
                class = self.severity.class(),
                uid = self.uid,
                issue = self.issue,
                gateway = self.gateway,
                message = self.message,
            ),
        }
    }
}

/// Render an alert section into its slot: one row container per RowGroup,
/// or the placeholder when there is nothing to show.
pub fn render_alert_rows<T: AlertCard>(
    surface: &mut dyn Surface,
    target_id: &str,
    plan: &RenderPlan<T>,
    shape: CardShape,
) {
    let html = match plan {
        RenderPlan::Empty => "<p>No alerts available.</p>".to_string(),
        RenderPlan::Rows(rows) => {
            let row_class = match shape {
                CardShape::Summary => "row",
                CardShape::Detail => "row g-2",
            };
            let mut html = String::new();
            for row in rows {
                html.push_str(&format!("<div class=\"{}\">", row_class));
                for alert in row {
                    html.push_str(&alert.card(shape));
                }
                html.push_str("</div>");
            }
            html
        }
    };
    surface.set_content(target_id, html);
}
