use serde::{Deserialize, Serialize};

use crate::projects::{projects, Project};

/// A single label/value stat shown on the overview page.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Insight {
    pub label: String,
    pub value: String,
}

/// Data for the overview page: one featured project, the rest supporting.
#[derive(Clone, Debug, Serialize)]
pub struct OverviewData {
    pub featured: &'static Project,
    pub supporting: Vec<&'static Project>,
    pub insights: Vec<Insight>,
}

/// Data for a project detail page.
#[derive(Clone, Debug, Serialize)]
pub struct DetailData {
    pub project: &'static Project,
}

/// Build the overview page data. The catalog is never empty, so there is
/// always a featured entry.
pub fn overview() -> OverviewData {
    let catalog = projects();
    let (featured, supporting) = catalog
        .split_first()
        .expect("project catalog is never empty");

    let insights = vec![
        Insight {
            label: "Projects online".into(),
            value: catalog.len().to_string(),
        },
        Insight {
            label: "Shared UI tokens".into(),
            value: "18".into(),
        },
        Insight {
            label: "Automation hooks".into(),
            value: "6 flows".into(),
        },
    ];

    OverviewData {
        featured,
        supporting: supporting.iter().collect(),
        insights,
    }
}

/// Build the detail page data for a slug, or `None` when unknown.
pub fn detail(slug: &str) -> Option<DetailData> {
    crate::projects::get_project(slug).map(|project| DetailData { project })
}
