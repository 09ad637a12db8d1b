use anyhow::{Context, Result};
use handlebars::Handlebars;
use serde_json::{json, Value};

use crate::model::StopRecord;
use crate::slug::{bucket, name_to_slug, SlugKey, SEPARATOR};

use super::index::IndexGroup;

const STOP: &str = "stop";
const MISSING: &str = "missing";
const INDEX: &str = "index";

/// Page templates and helpers, registered once per build.
pub struct Renderer {
    handlebars: Handlebars<'static>,
}

impl Renderer {
    pub fn new() -> Result<Self> {
        let mut handlebars = Handlebars::new();

        handlebars
            .register_template_string(STOP, include_str!("../../templates/stop.hbs"))
            .context("Failed to register stop template")?;
        handlebars
            .register_template_string(MISSING, include_str!("../../templates/missing.hbs"))
            .context("Failed to register missing template")?;
        handlebars
            .register_template_string(INDEX, include_str!("../../templates/index.hbs"))
            .context("Failed to register index template")?;

        handlebars.register_helper("letter", Box::new(letter_helper));
        handlebars.register_helper("name_url", Box::new(name_url_helper));

        Ok(Self { handlebars })
    }

    /// The record's fields plus `name` (primary) and `bucket`.
    pub fn stop_page(&self, key: &SlugKey, record: &StopRecord) -> Result<String> {
        let name = record
            .primary_name()
            .map(|n| n.name.clone())
            .unwrap_or_else(|| key.slug.replace(SEPARATOR, " "));

        let mut data = serde_json::to_value(record)?;
        if let Value::Object(map) = &mut data {
            map.insert("name".into(), json!(name));
            map.insert("bucket".into(), json!(key.bucket));
        }
        self.handlebars
            .render(STOP, &data)
            .with_context(|| format!("Failed to render {}", key))
    }

    pub fn missing_page(&self, key: &SlugKey) -> Result<String> {
        let data = json!({
            "name": key.slug.replace(SEPARATOR, " "),
            "bucket": key.bucket,
        });
        self.handlebars
            .render(MISSING, &data)
            .with_context(|| format!("Failed to render missing page {}", key))
    }

    pub fn index_page(&self, groups: &[IndexGroup]) -> Result<String> {
        self.handlebars
            .render(INDEX, &json!({ "groups": groups }))
            .context("Failed to render index")
    }
}

// ── Helpers ──

fn letter_helper(
    h: &handlebars::Helper,
    _: &Handlebars,
    _: &handlebars::Context,
    _: &mut handlebars::RenderContext,
    out: &mut dyn handlebars::Output,
) -> handlebars::HelperResult {
    let param = h.param(0).and_then(|v| v.value().as_str()).unwrap_or("");
    out.write(&handlebars::html_escape(&bucket(param)))?;
    Ok(())
}

fn name_url_helper(
    h: &handlebars::Helper,
    _: &Handlebars,
    _: &handlebars::Context,
    _: &mut handlebars::RenderContext,
    out: &mut dyn handlebars::Output,
) -> handlebars::HelperResult {
    let param = h.param(0).and_then(|v| v.value().as_str()).unwrap_or("");
    out.write(&handlebars::html_escape(&name_to_slug(param)))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ClipFile, Division, NameEntry, SoundClip, StopLink};
    use crate::site::index::NameIndexEntry;

    fn trumpet() -> StopRecord {
        StopRecord {
            names: vec![
                NameEntry {
                    name: "Trumpet".into(),
                    origin: "English".into(),
                    link: String::new(),
                    primary: true,
                },
                NameEntry {
                    name: "Tromba".into(),
                    origin: "Italian".into(),
                    link: "Tromba".into(),
                    primary: false,
                },
            ],
            description: "A chorus reed <bright> & brassy.".into(),
            construction: String::new(),
            usage: "Solo use.".into(),
            images: vec![],
            variants: vec![StopLink {
                name: "Tuba Mirabilis".into(),
                link: "Tuba_Mirabilis".into(),
            }],
            comparisons: vec![],
            examples_description: String::new(),
            examples: vec![],
            sound_clips: vec![Division {
                division_name: "Manual".into(),
                clips: vec![SoundClip {
                    name: "Trumpet 8'".into(),
                    files: vec![ClipFile {
                        name: "Arpeggio".into(),
                        file: "Trumpet1.mp3".into(),
                    }],
                    ..Default::default()
                }],
            }],
            bibliography: vec![],
        }
    }

    #[test]
    fn stop_page_links_and_escapes() {
        let renderer = Renderer::new().unwrap();
        let html = renderer.stop_page(&SlugKey::from_name("Trumpet"), &trumpet()).unwrap();

        assert!(html.contains("<h1 id=\"Trumpet\">Trumpet</h1>"));
        assert!(html.contains("<a href=\"../t/Tromba.html\">Tromba</a>"));
        assert!(html.contains("<a href=\"../t/Tuba_Mirabilis.html\">Tuba Mirabilis</a>"));
        assert!(html.contains("../audio/t/Trumpet1.mp3"));
        assert!(html.contains("&lt;bright&gt; &amp; brassy"));
        assert!(!html.contains("<h3>Construction</h3>"));
        assert!(html.contains("<h3>Usage</h3>"));
    }

    #[test]
    fn missing_page_names_the_slug() {
        let renderer = Renderer::new().unwrap();
        let html = renderer.missing_page(&SlugKey::from_slug("Tuba_Mirabilis")).unwrap();
        assert!(html.contains("<h1>Tuba Mirabilis</h1>"));
    }

    #[test]
    fn index_marks_missing_entries() {
        let renderer = Renderer::new().unwrap();
        let groups = vec![IndexGroup {
            initial: "T".into(),
            entries: vec![
                NameIndexEntry {
                    name: "Trumpet".into(),
                    origin: Some("English".into()),
                    link: "Trumpet".into(),
                    exists: true,
                },
                NameIndexEntry {
                    name: "Tuba Mirabilis".into(),
                    origin: None,
                    link: "Tuba_Mirabilis".into(),
                    exists: false,
                },
            ],
        }];
        let html = renderer.index_page(&groups).unwrap();
        assert!(html.contains("<h2 id=\"T\">T</h2>"));
        assert!(html.contains("<li><a href=\"t/Trumpet.html\">Trumpet</a> (English)</li>"));
        assert!(html.contains("<li class=\"missing\"><a href=\"t/Tuba_Mirabilis.html\">Tuba Mirabilis</a></li>"));
    }
}
