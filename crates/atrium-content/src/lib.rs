pub mod pages;
pub mod projects;

pub use pages::{detail, overview, DetailData, Insight, OverviewData};
pub use projects::{get_project, projects, Metric, Project, ProjectStatus, Section, Tone};
