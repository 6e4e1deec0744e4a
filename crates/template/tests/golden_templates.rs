use serde::Deserialize;
use std::env;
use std::fs;
use std::path::PathBuf;
use template::{ComponentLookup, Template, TemplateSource};

#[derive(Debug, Deserialize)]
struct FixtureFile {
    #[serde(rename = "case")]
    cases: Vec<Fixture>,
}

#[derive(Debug, Deserialize)]
struct Fixture {
    name: String,
    segments: Vec<String>,
    #[serde(default)]
    components: Vec<String>,
    markup: Option<String>,
    content: Option<String>,
    error: Option<String>,
}

struct Names<'a>(&'a [String]);

impl ComponentLookup for Names<'_> {
    fn is_component(&self, name: &str) -> bool {
        self.0.iter().any(|known| known.eq_ignore_ascii_case(name))
    }
}

fn load_fixtures() -> Vec<Fixture> {
    let path = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/templates.toml");
    let content = fs::read_to_string(&path)
        .unwrap_or_else(|err| panic!("failed to read template fixtures {path:?}: {err}"));
    let file: FixtureFile = toml::from_str(&content)
        .unwrap_or_else(|err| panic!("failed to parse template fixtures {path:?}: {err}"));
    file.cases
}

fn fixture_filter() -> Option<String> {
    env::var("WEAVE_TEMPLATE_FIXTURE").ok().filter(|f| !f.is_empty())
}

#[test]
fn golden_templates() {
    let filter = fixture_filter();
    let mut ran = 0usize;
    for fixture in load_fixtures() {
        if filter.as_deref().is_some_and(|f| !fixture.name.contains(f)) {
            continue;
        }
        ran += 1;
        let source = TemplateSource::leak(fixture.segments.iter().cloned());
        let result = Template::compile(source, &Names(&fixture.components));
        match (&fixture.error, result) {
            (Some(expected), Err(err)) => {
                assert_eq!(&err.to_string(), expected, "fixture '{}'", fixture.name);
            }
            (Some(expected), Ok(template)) => panic!(
                "fixture '{}' expected error {expected:?}, compiled to {:?}",
                fixture.name,
                template.markup()
            ),
            (None, Err(err)) => panic!("fixture '{}' failed to compile: {err}", fixture.name),
            (None, Ok(template)) => {
                if let Some(markup) = &fixture.markup {
                    assert_eq!(template.markup(), markup, "markup of fixture '{}'", fixture.name);
                }
                if let Some(content) = &fixture.content {
                    let actual = template.document().inner_html(template.root().content());
                    assert_eq!(&actual, content, "content of fixture '{}'", fixture.name);
                }
            }
        }
    }
    assert!(ran > 0, "no fixtures matched filter");
}
