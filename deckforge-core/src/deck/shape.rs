//! Shapes that can be placed on a slide, and their DrawingML serialisation.

use std::fmt::{self, Write as FmtWrite};

use super::inches;

/// Characters allowed in an XML 1.0 document.
fn is_xml_char(c: char) -> bool {
    matches!(
        c,
        '\t' | '\n' | '\r' | '\u{20}'..='\u{D7FF}' | '\u{E000}'..='\u{FFFD}' | '\u{10000}'..='\u{10FFFF}'
    )
}

/// Escape XML special characters and drop characters XML 1.0 cannot carry, such as
/// terminal escapes in model output.
pub(crate) fn escape_xml(s: &str) -> String {
    let mut escaped = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            c if is_xml_char(c) => escaped.push(c),
            _ => {}
        }
    }
    escaped
}

/// Position and size in EMUs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rect {
    pub x: i64,
    pub y: i64,
    pub width: i64,
    pub height: i64,
}

impl Rect {
    pub fn inches(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x: inches(x),
            y: inches(y),
            width: inches(width),
            height: inches(height),
        }
    }

    fn write_xfrm(&self, xml: &mut String) -> fmt::Result {
        xml.push_str("<a:xfrm>");
        write!(xml, r#"<a:off x="{}" y="{}"/>"#, self.x, self.y)?;
        write!(xml, r#"<a:ext cx="{}" cy="{}"/>"#, self.width, self.height)?;
        xml.push_str("</a:xfrm>");
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    pub fn hex(&self) -> String {
        format!("{:02X}{:02X}{:02X}", self.0, self.1, self.2)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Align {
    #[default]
    Left,
    Center,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextStyle {
    pub size_pt: f64,
    pub bold: bool,
    pub italic: bool,
    pub color: Rgb,
    pub align: Align,
}

impl Default for TextStyle {
    fn default() -> Self {
        Self {
            size_pt: 18.0,
            bold: false,
            italic: false,
            color: Rgb(0, 0, 0),
            align: Align::Left,
        }
    }
}

/// A word-wrapped text box. Each line of `text` becomes its own paragraph; a vertical
/// tab also starts a new paragraph.
#[derive(Debug, Clone, PartialEq)]
pub struct TextBox {
    pub rect: Rect,
    pub text: String,
    pub style: TextStyle,
}

impl TextBox {
    pub fn new(rect: Rect, text: impl Into<String>, style: TextStyle) -> Self {
        Self {
            rect,
            text: text.into(),
            style,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PictureFormat {
    Png,
    Jpeg,
    Gif,
    Bmp,
}

impl PictureFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            PictureFormat::Png => "png",
            PictureFormat::Jpeg => "jpeg",
            PictureFormat::Gif => "gif",
            PictureFormat::Bmp => "bmp",
        }
    }

    pub fn content_type(&self) -> &'static str {
        match self {
            PictureFormat::Png => "image/png",
            PictureFormat::Jpeg => "image/jpeg",
            PictureFormat::Gif => "image/gif",
            PictureFormat::Bmp => "image/bmp",
        }
    }

    pub(crate) const ALL: [PictureFormat; 4] = [
        PictureFormat::Png,
        PictureFormat::Jpeg,
        PictureFormat::Gif,
        PictureFormat::Bmp,
    ];
}

impl TryFrom<image::ImageFormat> for PictureFormat {
    type Error = image::ImageFormat;

    fn try_from(format: image::ImageFormat) -> Result<Self, Self::Error> {
        match format {
            image::ImageFormat::Png => Ok(PictureFormat::Png),
            image::ImageFormat::Jpeg => Ok(PictureFormat::Jpeg),
            image::ImageFormat::Gif => Ok(PictureFormat::Gif),
            image::ImageFormat::Bmp => Ok(PictureFormat::Bmp),
            other => Err(other),
        }
    }
}

/// An embedded raster image, stretched to fill its rectangle.
#[derive(Debug, Clone, PartialEq)]
pub struct Picture {
    pub rect: Rect,
    pub data: Vec<u8>,
    pub format: PictureFormat,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Shape {
    Text(TextBox),
    Picture(Picture),
    /// Filled rounded rectangle used as a visual closer.
    Accent { rect: Rect, fill: Rgb },
}

impl Shape {
    /// Serialise as a `p:sp`/`p:pic` element. `image_rel` is the relationship id of the
    /// picture's media part and is only used for pictures.
    pub(crate) fn write_xml(&self, xml: &mut String, shape_id: u32, image_rel: Option<&str>) -> fmt::Result {
        match self {
            Shape::Text(text_box) => write_text_box(xml, shape_id, text_box),
            Shape::Picture(picture) => write_picture(xml, shape_id, picture, image_rel.unwrap_or("rId2")),
            Shape::Accent { rect, fill } => write_accent(xml, shape_id, rect, *fill),
        }
    }
}

fn write_text_box(xml: &mut String, shape_id: u32, text_box: &TextBox) -> fmt::Result {
    let style = &text_box.style;
    xml.push_str("<p:sp>");
    xml.push_str("<p:nvSpPr>");
    write!(xml, r#"<p:cNvPr id="{shape_id}" name="TextBox {shape_id}"/>"#)?;
    xml.push_str(r#"<p:cNvSpPr txBox="1"/>"#);
    xml.push_str("<p:nvPr/>");
    xml.push_str("</p:nvSpPr>");

    xml.push_str("<p:spPr>");
    text_box.rect.write_xfrm(xml)?;
    xml.push_str(r#"<a:prstGeom prst="rect"><a:avLst/></a:prstGeom>"#);
    xml.push_str("<a:noFill/>");
    xml.push_str("</p:spPr>");

    xml.push_str("<p:txBody>");
    xml.push_str(r#"<a:bodyPr wrap="square" rtlCol="0"><a:noAutofit/></a:bodyPr>"#);
    xml.push_str("<a:lstStyle/>");

    let size = (style.size_pt * 100.0).round() as u32;
    let mut run_props = format!(r#"lang="en-US" sz="{size}""#);
    if style.bold {
        run_props.push_str(r#" b="1""#);
    }
    if style.italic {
        run_props.push_str(r#" i="1""#);
    }
    run_props.push_str(r#" dirty="0""#);
    let fill = format!(
        r#"<a:solidFill><a:srgbClr val="{}"/></a:solidFill>"#,
        style.color.hex()
    );
    let para_props = match style.align {
        Align::Center => r#"<a:pPr algn="ctr"/>"#,
        Align::Left => "<a:pPr/>",
    };

    for line in text_box.text.split(['\n', '\u{0B}']) {
        let line = line.trim_end_matches('\r');
        xml.push_str("<a:p>");
        xml.push_str(para_props);
        if !line.is_empty() {
            write!(
                xml,
                "<a:r><a:rPr {run_props}>{fill}</a:rPr><a:t>{}</a:t></a:r>",
                escape_xml(line)
            )?;
        }
        write!(xml, "<a:endParaRPr {run_props}/>")?;
        xml.push_str("</a:p>");
    }
    xml.push_str("</p:txBody>");
    xml.push_str("</p:sp>");
    Ok(())
}

fn write_picture(xml: &mut String, shape_id: u32, picture: &Picture, rel_id: &str) -> fmt::Result {
    xml.push_str("<p:pic>");
    xml.push_str("<p:nvPicPr>");
    write!(
        xml,
        r#"<p:cNvPr id="{shape_id}" name="Picture {shape_id}" descr="{}"/>"#,
        escape_xml(&picture.description)
    )?;
    xml.push_str(r#"<p:cNvPicPr><a:picLocks noChangeAspect="1"/></p:cNvPicPr>"#);
    xml.push_str("<p:nvPr/>");
    xml.push_str("</p:nvPicPr>");

    xml.push_str("<p:blipFill>");
    write!(xml, r#"<a:blip r:embed="{rel_id}"/>"#)?;
    xml.push_str("<a:stretch><a:fillRect/></a:stretch>");
    xml.push_str("</p:blipFill>");

    xml.push_str("<p:spPr>");
    picture.rect.write_xfrm(xml)?;
    xml.push_str(r#"<a:prstGeom prst="rect"><a:avLst/></a:prstGeom>"#);
    xml.push_str("</p:spPr>");
    xml.push_str("</p:pic>");
    Ok(())
}

fn write_accent(xml: &mut String, shape_id: u32, rect: &Rect, fill: Rgb) -> fmt::Result {
    xml.push_str("<p:sp>");
    xml.push_str("<p:nvSpPr>");
    write!(xml, r#"<p:cNvPr id="{shape_id}" name="Rounded Rectangle {shape_id}"/>"#)?;
    xml.push_str("<p:cNvSpPr/>");
    xml.push_str("<p:nvPr/>");
    xml.push_str("</p:nvSpPr>");

    xml.push_str("<p:spPr>");
    rect.write_xfrm(xml)?;
    xml.push_str(r#"<a:prstGeom prst="roundRect"><a:avLst/></a:prstGeom>"#);
    write!(
        xml,
        r#"<a:solidFill><a:srgbClr val="{}"/></a:solidFill>"#,
        fill.hex()
    )?;
    xml.push_str("<a:ln><a:noFill/></a:ln>");
    xml.push_str("</p:spPr>");
    xml.push_str("</p:sp>");
    Ok(())
}
