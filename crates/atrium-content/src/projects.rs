use std::sync::OnceLock;

use serde::{Deserialize, Serialize};

/// Publication stage of a project space.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProjectStatus {
    Discovery,
    Beta,
    #[serde(rename = "GA")]
    Ga,
}

/// Accent used when the project card is rendered.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tone {
    Info,
    Success,
    Warning,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Metric {
    pub label: String,
    pub value: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Section {
    pub title: String,
    pub body: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub points: Option<Vec<String>>,
}

/// One project space on the portfolio site.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Project {
    pub slug: String,
    pub title: String,
    pub status: ProjectStatus,
    pub tone: Tone,
    pub description: String,
    pub tags: Vec<String>,
    pub highlights: Vec<String>,
    pub metrics: Vec<Metric>,
    pub next_steps: Vec<String>,
    pub narrative: String,
    pub sections: Vec<Section>,
}

fn metric(label: &str, value: &str) -> Metric {
    Metric {
        label: label.into(),
        value: value.into(),
    }
}

fn section(title: &str, body: &str, points: &[&str]) -> Section {
    Section {
        title: title.into(),
        body: body.into(),
        points: if points.is_empty() {
            None
        } else {
            Some(points.iter().map(|p| (*p).to_string()).collect())
        },
    }
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| (*s).to_string()).collect()
}

/// The ordered project catalog. The first entry is the featured project on
/// the overview page.
pub fn projects() -> &'static [Project] {
    static CATALOG: OnceLock<Vec<Project>> = OnceLock::new();
    CATALOG.get_or_init(build_catalog)
}

/// Look up a project by its slug.
pub fn get_project(slug: &str) -> Option<&'static Project> {
    projects().iter().find(|p| p.slug == slug)
}

fn build_catalog() -> Vec<Project> {
    vec![
        Project {
            slug: "ledger-desk".into(),
            title: "Ledger Desk".into(),
            status: ProjectStatus::Discovery,
            tone: Tone::Info,
            description:
                "Self-hosted knowledge desk that joins wiki notes with live data pulled from the \
                 homelab Postgres instance."
                    .into(),
            tags: strings(&["Rust", "Postgres", "Content API"]),
            highlights: strings(&[
                "Composable landing sections assembled from shared tokens",
                "Read-only sync against Postgres views",
                "Embeddable summary cards for sibling sites",
            ]),
            metrics: vec![
                metric("Demo routes", "4 ready"),
                metric("Query latency", "< 60 ms"),
                metric("Content blocks", "12 reusable"),
            ],
            next_steps: strings(&[
                "Publish calendar feed for livestream drop-ins",
                "Open a webhook endpoint for automation flows",
            ]),
            narrative:
                "Ledger Desk is the entry point for external demos. Each route is assembled from \
                 tokens so experiments can be rearranged without redeploying the container."
                    .into(),
            sections: vec![
                section(
                    "Experience goals",
                    "Responsive grids and a quick publish loop keep demos aligned with production.",
                    &[
                        "Curated hero patterns for narrative builds",
                        "Live feed of operational stats",
                        "Self-documenting component notes",
                    ],
                ),
                section(
                    "Technical wiring",
                    "An axum server renders page data while the reverse proxy terminates TLS on the lab network.",
                    &["Strict typed content records", "Caddy front door", "Tailnet reachability"],
                ),
                section(
                    "What to try next",
                    "Clone this entry, point it at a new data source, and the navigation updates automatically.",
                    &[],
                ),
            ],
        },
        Project {
            slug: "dispatch-notes".into(),
            title: "Dispatch Notes".into(),
            status: ProjectStatus::Beta,
            tone: Tone::Success,
            description: "Story-driven portal for release notes and lab diaries.".into(),
            tags: strings(&["Markdown", "Automation", "Webhooks"]),
            highlights: strings(&[
                "Markdown-to-HTML pipeline driven by scheduled flows",
                "Automatic linking to assets on lab storage",
                "Accent highlights for shipped milestones",
            ]),
            metrics: vec![
                metric("Entries synced", "28 posts"),
                metric("Automation coverage", "70%"),
                metric("Review turnaround", "< 10 min"),
            ],
            next_steps: strings(&["Expose an RSS endpoint", "Add audience targeting toggles"]),
            narrative:
                "Dispatch Notes keeps stakeholders in the loop. It is tuned for quick publishing \
                 and scheduled digests."
                    .into(),
            sections: vec![
                section(
                    "Publishing workflow",
                    "Drafts flow through the converter pipeline for PDF snapshots before landing here.",
                    &["Hot folder watched by the automation runner", "Review links expire after 48 hours"],
                ),
                section(
                    "Audience modes",
                    "Tags decide which updates surface on the homepage, separating investor and engineering views.",
                    &[],
                ),
                section(
                    "Next integrations",
                    "Form submissions will be routed through the webhook bus to update the backlog automatically.",
                    &["Form endpoints on the callback bus", "RSVP status badges"],
                ),
            ],
        },
        Project {
            slug: "beacon-wall".into(),
            title: "Beacon Wall".into(),
            status: ProjectStatus::Ga,
            tone: Tone::Warning,
            description:
                "Live observability wall for workloads running behind the lab network.".into(),
            tags: strings(&["Dashboards", "Telemetry"]),
            highlights: strings(&[
                "Composable widget grid",
                "Contrast-safe palette for critical views",
                "Embeds cleanly into existing front doors",
            ]),
            metrics: vec![
                metric("Widgets online", "9"),
                metric("Refresh interval", "15s"),
                metric("Avg. uptime", "99.8%"),
            ],
            next_steps: strings(&[
                "Add an on-call rotation timeline",
                "Surface incident postmortems",
            ]),
            narrative:
                "Beacon Wall focuses on reliability drills. Every widget can be popped out into \
                 its own project route."
                    .into(),
            sections: vec![
                section(
                    "Observability grid",
                    "Grid primitives make it easy to rearrange telemetry panels per drill.",
                    &[],
                ),
                section(
                    "Accessibility",
                    "All colors are double-A compliant and carry dark overlays for readability.",
                    &[],
                ),
                section(
                    "Expansion",
                    "Server-sent events bring in real-time notifications without polling.",
                    &[],
                ),
            ],
        },
    ]
}
