//! Écriture d'un document SVG autonome

use std::fmt::Write;

use super::choropleth::RenderedFeature;
use super::palette::{Severity, NO_DATA_FILL, STROKE, STROKE_WIDTH};

/// Titre de la légende
pub const LEGEND_TITLE: &str = "Casos reportados por departamento";

/// Hauteur réservée à la légende sous la carte
const LEGEND_HEIGHT: f64 = 56.0;

const SELECTED_STROKE: &str = "#111827";
const SELECTED_STROKE_WIDTH: f64 = 2.0;

/// Échappe le texte pour un nœud ou un attribut XML
pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(c),
        }
    }
    out
}

/// Document complet : carte, entité sélectionnée mise en avant, légende
pub fn document(
    features: &[RenderedFeature],
    width: f64,
    height: f64,
    selected: Option<&str>,
) -> String {
    let total_height = height + LEGEND_HEIGHT;
    let mut out = String::new();

    let _ = writeln!(
        out,
        r#"<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 {w} {h}" width="{w}" height="{h}">"#,
        w = width,
        h = total_height
    );
    let _ = writeln!(out, r#"  <g id="departamentos">"#);

    for feature in features.iter().filter(|f| !f.path.is_empty()) {
        let is_selected = selected.is_some_and(|s| s == feature.selection_label());
        let (stroke, stroke_width) = if is_selected {
            (SELECTED_STROKE, SELECTED_STROKE_WIDTH)
        } else {
            (STROKE, STROKE_WIDTH)
        };
        let _ = writeln!(
            out,
            r#"    <path d="{}" fill="{}" stroke="{}" stroke-width="{}" data-index="{}"><title>{}</title></path>"#,
            feature.path,
            feature.fill,
            stroke,
            stroke_width,
            feature.index,
            escape(&feature.title())
        );
    }

    let _ = writeln!(out, "  </g>");
    write_legend(&mut out, height, width);
    out.push_str("</svg>\n");
    out
}

fn write_legend(out: &mut String, top: f64, width: f64) {
    let _ = writeln!(out, r#"  <g id="leyenda" font-family="sans-serif" font-size="11">"#);
    let _ = writeln!(
        out,
        r#"    <text x="8" y="{}" font-weight="bold">{}</text>"#,
        top + 16.0,
        escape(LEGEND_TITLE)
    );

    let entries: Vec<(&str, String)> = Severity::ALL
        .iter()
        .map(|s| (s.color(), s.legend_label()))
        .chain(std::iter::once((NO_DATA_FILL, "Sin datos".to_string())))
        .collect();

    let step = width / entries.len() as f64;
    for (i, (color, label)) in entries.iter().enumerate() {
        let x = 8.0 + step * i as f64;
        let _ = writeln!(
            out,
            r#"    <rect x="{}" y="{}" width="12" height="12" fill="{}" stroke="{}" stroke-width="0.5"/>"#,
            x,
            top + 28.0,
            color,
            STROKE
        );
        let _ = writeln!(
            out,
            r#"    <text x="{}" y="{}">{}</text>"#,
            x + 16.0,
            top + 38.0,
            escape(label)
        );
    }
    let _ = writeln!(out, "  </g>");
}

/// Document réduit à un message (chargement ou échec définitif)
pub fn message(width: f64, height: f64, text: &str) -> String {
    format!(
        "<svg xmlns=\"http://www.w3.org/2000/svg\" viewBox=\"0 0 {w} {h}\" width=\"{w}\" height=\"{h}\">\n  \
         <text x=\"16\" y=\"32\" font-family=\"sans-serif\" font-size=\"14\" fill=\"#b91c1c\">{t}</text>\n</svg>\n",
        w = width,
        h = height,
        t = escape(text)
    )
}
