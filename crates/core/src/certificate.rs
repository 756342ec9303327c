//! Data-wiping certificate renderer.
//!
//! Produces the fixed-layout PDF a town hall hands to the recipient
//! association: title, parties, the wiping procedure boilerplate, a
//! signature line, the issue date, and the decorative circular seal text.
//! Rendering is pure: callers pass resolved names and get bytes back;
//! persistence is the API layer's concern.

use chrono::Utc;
use printpdf::{
    BuiltinFont, Color, IndirectFontRef, Line, Mm, PdfDocument, PdfLayerReference, Point, Pt, Rgb,
    TextMatrix,
};

use crate::error::CoreError;

/// US-letter page size in points (matches the reference layout grid).
const PAGE_WIDTH_PT: f32 = 612.0;
const PAGE_HEIGHT_PT: f32 = 792.0;

/// Center and radius of the circular seal text, in points.
const SEAL_CENTER_X: f32 = 450.0;
const SEAL_CENTER_Y: f32 = 150.0;
const SEAL_RADIUS: f32 = 65.0;

/// Body boilerplate between the reference block and the signature.
const BODY_LINES: [&str; 18] = [
    "Ce document atteste que l'ordinateur mentionné ci-dessus a été entièrement formaté.",
    "Toutes les données personnelles ont été supprimées conformément aux normes en vigueur.",
    "",
    "Le processus de formatage inclut les étapes suivantes :",
    "- Analyse initiale pour vérifier l'état du disque et identifier toutes les partitions existantes.",
    "- Suppression complète des partitions et des données associées.",
    "- Réinstallation d'un système d'exploitation propre et exempt de toute donnée résiduelle.",
    "- Configuration minimale pour permettre un usage immédiat par les nouveaux bénéficiaires.",
    "",
    "L'objectif de cette opération est double :",
    "1. Assurer la confidentialité des données de l'ancien propriétaire.",
    "2. Préparer l'appareil pour qu'il soit pleinement opérationnel pour de nouveaux usages.",
    "",
    "Nous tenons à vous remercier chaleureusement pour votre générosité. Grâce à votre contribution,",
    "vous participez activement à une démarche solidaire et responsable, en réduisant les déchets",
    "électroniques et en favorisant l'accès au numérique pour tous.",
    "",
    "Ce certificat est signé par la mairie et garantit que toutes les procédures ont été suivies.",
];

/// Circular seal text; spaces are dropped before layout so the glyphs are
/// evenly distributed around the circle.
const SEAL_TEXT: &str = "Liberté, égalité, fraternité,";

/// Render the wiping certificate for a donation.
///
/// `town_hall_name` and `association_name` are the resolved party names;
/// `reference` is the donation's immutable reference. Returns the PDF as
/// in-memory bytes.
pub fn render_certificate(
    town_hall_name: &str,
    association_name: &str,
    reference: &str,
) -> Result<Vec<u8>, CoreError> {
    let (doc, page, layer) = PdfDocument::new(
        "Certificat de Formatage d'Ordinateur",
        Mm::from(Pt(PAGE_WIDTH_PT)),
        Mm::from(Pt(PAGE_HEIGHT_PT)),
        "certificate",
    );
    let layer = doc.get_page(page).get_layer(layer);

    let helvetica = doc
        .add_builtin_font(BuiltinFont::Helvetica)
        .map_err(render_error)?;
    let helvetica_bold = doc
        .add_builtin_font(BuiltinFont::HelveticaBold)
        .map_err(render_error)?;

    // Header.
    center_text(
        &layer,
        "Certificat de Formatage d'Ordinateur",
        18.0,
        750.0,
        &helvetica_bold,
    );
    center_text(
        &layer,
        &format!("Délivré par la Mairie de {town_hall_name}"),
        12.0,
        730.0,
        &helvetica,
    );

    // Reference block and boilerplate body.
    let mut y = 670.0;
    layer.use_text(
        format!("Référence du produit : {reference}"),
        11.0,
        pt(60.0),
        pt(y),
        &helvetica,
    );
    y -= 20.0;
    layer.use_text(
        format!("Association bénéficiaire : {association_name}"),
        11.0,
        pt(60.0),
        pt(y),
        &helvetica,
    );
    y -= 20.0;
    for line in BODY_LINES {
        if !line.is_empty() {
            layer.use_text(line, 11.0, pt(60.0), pt(y), &helvetica);
        }
        y -= 20.0;
    }

    // Signature line.
    layer.use_text(
        format!("Signé par la Mairie de {town_hall_name}"),
        12.0,
        pt(100.0),
        pt(y - 30.0),
        &helvetica_bold,
    );
    layer.set_outline_color(Color::Rgb(Rgb::new(0.0, 0.0, 0.55, None)));
    layer.set_outline_thickness(1.0);
    layer.add_line(Line {
        points: vec![
            (Point::new(pt(100.0), pt(y - 40.0)), false),
            (Point::new(pt(300.0), pt(y - 40.0)), false),
        ],
        is_closed: false,
    });

    // Footer: issue date and page marker.
    let date = Utc::now().format("%d-%m-%Y").to_string();
    layer.use_text(format!("Date : {date}"), 10.0, pt(100.0), pt(50.0), &helvetica);
    layer.use_text("Page 1/1", 10.0, pt(460.0), pt(50.0), &helvetica);

    draw_seal(&layer, &helvetica, &helvetica_bold, town_hall_name);

    doc.save_to_bytes().map_err(render_error)
}

/// Draw the decorative circular seal: the motto around a circle with the
/// town-hall name centered inside it.
fn draw_seal(
    layer: &PdfLayerReference,
    font: &IndirectFontRef,
    bold: &IndirectFontRef,
    town_hall_name: &str,
) {
    let glyphs: Vec<char> = SEAL_TEXT.chars().filter(|c| !c.is_whitespace()).collect();
    let step = 360.0 / glyphs.len() as f32;

    layer.begin_text_section();
    layer.set_font(font, 8.0);
    for (i, glyph) in glyphs.iter().enumerate() {
        let angle = step * i as f32;
        let x = SEAL_CENTER_X + SEAL_RADIUS * angle.to_radians().cos();
        let y = SEAL_CENTER_Y + SEAL_RADIUS * angle.to_radians().sin();
        layer.set_text_matrix(TextMatrix::TranslateRotate(Pt(x), Pt(y), angle + 90.0));
        layer.write_text(glyph.to_string(), font);
    }
    layer.end_text_section();

    layer.use_text("Maire de", 10.0, pt(SEAL_CENTER_X - 20.0), pt(140.0), bold);
    layer.use_text(
        town_hall_name,
        10.0,
        pt(SEAL_CENTER_X - 20.0),
        pt(125.0),
        bold,
    );
}

/// Draw a horizontally centered line of text at the given baseline (points).
fn center_text(
    layer: &PdfLayerReference,
    text: &str,
    size: f32,
    baseline: f32,
    font: &IndirectFontRef,
) {
    // Builtin-font metrics are not exposed, so approximate the width from
    // an average glyph advance. Good enough for a decorative layout.
    let approx_width = text.chars().count() as f32 * size * 0.5;
    let x = (PAGE_WIDTH_PT - approx_width) / 2.0;
    layer.use_text(text, size, pt(x), pt(baseline), font);
}

fn pt(value: f32) -> Mm {
    Mm::from(Pt(value))
}

fn render_error(err: printpdf::Error) -> CoreError {
    CoreError::Internal(format!("PDF rendering failed: {err}"))
}
