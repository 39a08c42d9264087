//! Standalone HTML page showing a map in the Escher viewer
//!
//! The page loads Escher from a CDN and embeds the map, the model and the reaction
//! fluxes, so it can be opened directly from disk.
use std::path::Path;

use indexmap::IndexMap;
use thiserror::Error;

use crate::escher::{EscherMap, MapError};
use crate::io::json::JsonError;
use crate::metabolic_model::model::Model;

pub const ESCHER_SCRIPT_URL: &str = "https://unpkg.com/escher@1.7.3/dist/escher.min.js";

#[derive(Error, Debug)]
pub enum ViewerError {
    #[error("Unable to serialize the map")]
    Map(#[from] MapError),
    #[error("Unable to serialize the model")]
    Model(#[from] JsonError),
    #[error("Unable to serialize the reaction data")]
    ReactionData(#[from] serde_json::Error),
    #[error("Unable to write the viewer page")]
    UnableToWrite(#[from] std::io::Error),
}

/// Render the viewer page for a map, its model and the flux of every reaction
pub fn viewer_html(
    title: &str,
    map: &EscherMap,
    model: &Model,
    fluxes: &IndexMap<String, f64>,
) -> Result<String, ViewerError> {
    let map_json = map.dump_json()?;
    let model_json = model.to_json_string()?;
    let flux_json = serde_json::to_string(fluxes)?;
    Ok(format!(
        r#"<!DOCTYPE html>
<html>
<head>
<meta charset="utf-8">
<title>{title}</title>
<script src="{script}"></script>
<style>html, body {{ margin: 0; height: 100%; }} #map_container {{ height: 100%; }}</style>
</head>
<body>
<div id="map_container"></div>
<script>
const mapData = {map};
const modelData = {model};
const reactionData = {fluxes};
escher.Builder(mapData, modelData, null, escher.libs.d3_select('#map_container'), {{
  menu: 'all',
  fill_screen: true,
  reaction_data: reactionData,
  never_ask_before_quit: true
}});
</script>
</body>
</html>
"#,
        title = escape_html(title),
        script = ESCHER_SCRIPT_URL,
        map = escape_script(&map_json),
        model = escape_script(&model_json),
        fluxes = escape_script(&flux_json),
    ))
}

pub fn write_viewer<P: AsRef<Path>>(
    path: P,
    title: &str,
    map: &EscherMap,
    model: &Model,
    fluxes: &IndexMap<String, f64>,
) -> Result<(), ViewerError> {
    std::fs::write(path, viewer_html(title, map, model, fluxes)?)?;
    Ok(())
}

fn escape_html(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => result.push_str("&amp;"),
            '<' => result.push_str("&lt;"),
            '>' => result.push_str("&gt;"),
            '"' => result.push_str("&quot;"),
            _ => result.push(c),
        }
    }
    result
}

/// JSON embedded in a script element must not close it
fn escape_script(json: &str) -> String {
    json.replace("</", "<\\/")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::escher::{MapBuilder, MapSettings};
    use indexmap::IndexSet;

    #[test]
    fn escaping() {
        assert_eq!(escape_html("a < b & \"c\""), "a &lt; b &amp; &quot;c&quot;");
        assert_eq!(escape_script(r#"{"name":"</script>"}"#), r#"{"name":"<\/script>"}"#);
    }

    #[test]
    fn page_embeds_data() {
        let model = Model::new_empty();
        let map = MapBuilder::new(&model, MapSettings::default())
            .build(&IndexSet::new(), &IndexSet::new())
            .unwrap();
        let mut fluxes = IndexMap::new();
        fluxes.insert("ALCD2x".to_string(), 20.);
        let html = viewer_html("<fluxmap>", &map, &model, &fluxes).unwrap();
        assert!(html.contains("<title>&lt;fluxmap&gt;</title>"));
        assert!(html.contains(ESCHER_SCRIPT_URL));
        assert!(html.contains(r#"const reactionData = {"ALCD2x":20.0};"#));
        assert!(html.contains(&map.header().map_id));
    }

    #[test]
    fn writes_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("escher.html");
        let model = Model::new_empty();
        let map = MapBuilder::new(&model, MapSettings::default())
            .build(&IndexSet::new(), &IndexSet::new())
            .unwrap();
        write_viewer(&path, "map", &map, &model, &IndexMap::new()).unwrap();
        let html = std::fs::read_to_string(&path).unwrap();
        assert!(html.starts_with("<!DOCTYPE html>"));
    }
}
