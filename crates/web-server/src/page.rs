use configuration::DeploymentMode;
use serde::Serialize;
use status_tracker::{ConnectionStatus, StatusSnapshot, SUCCESS_MARKER};
use tera::{Context, Tera};

const TEMPLATE_NAME: &str = "status.html";

/// The compiled status page template.
///
/// The `.html` name turns on Tera's auto-escaping, so driver messages are
/// rendered as text.
#[derive(Debug)]
pub struct StatusPage {
    tera: Tera,
}

#[derive(Serialize)]
struct PageContext<'a> {
    status: String,
    status_class: &'a str,
    updated_at: String,
    attempts: u64,
    mode: String,
}

impl StatusPage {
    pub fn new() -> Result<Self, tera::Error> {
        let mut tera = Tera::default();
        tera.add_raw_template(TEMPLATE_NAME, include_str!("../templates/status.html"))?;
        Ok(Self { tera })
    }

    pub fn render(
        &self,
        snapshot: &StatusSnapshot,
        mode: DeploymentMode,
    ) -> Result<String, tera::Error> {
        let page = PageContext {
            status: snapshot.status.to_string(),
            status_class: status_class(&snapshot.status),
            updated_at: snapshot.updated_at.format("%Y-%m-%d %H:%M:%S UTC").to_string(),
            attempts: snapshot.attempts,
            mode: mode.to_string(),
        };
        self.tera.render(TEMPLATE_NAME, &Context::from_serialize(&page)?)
    }
}

/// `success` when the status text carries the success marker, `fail` otherwise.
pub fn status_class(status: &ConnectionStatus) -> &'static str {
    if status.to_string().contains(SUCCESS_MARKER) {
        "success"
    } else {
        "fail"
    }
}
