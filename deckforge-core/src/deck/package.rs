//! OPC packaging: content types, relationships, and the zip container.

use std::fmt::Write as FmtWrite;
use std::io::{self, Seek, Write};

use zip::result::{ZipError, ZipResult};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use super::shape::{escape_xml, PictureFormat, Shape};
use super::template::*;
use super::{Presentation, Slide};

/// First relationship id used for slides in `presentation.xml.rels`
/// (rId1 master, rId2 theme, rId3 presProps).
const FIRST_SLIDE_REL: usize = 4;
/// First `p:sldId` value allowed by the schema.
const FIRST_SLIDE_ID: usize = 256;

fn xml_err(e: std::fmt::Error) -> ZipError {
    ZipError::from(io::Error::other(e))
}

struct Relationship {
    id: String,
    kind: &'static str,
    target: String,
}

fn relationships_xml(rels: &[Relationship]) -> String {
    let mut xml = String::with_capacity(256 + rels.len() * 160);
    xml.push_str(XML_DECL);
    xml.push_str(
        r#"<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">"#,
    );
    for rel in rels {
        let _ = write!(
            xml,
            r#"<Relationship Id="{}" Type="{}" Target="{}"/>"#,
            rel.id, rel.kind, rel.target
        );
    }
    xml.push_str("</Relationships>");
    xml
}

fn rel(id: impl Into<String>, kind: &'static str, target: impl Into<String>) -> Relationship {
    Relationship {
        id: id.into(),
        kind,
        target: target.into(),
    }
}

fn content_types_xml(slide_count: usize) -> String {
    let mut xml = String::with_capacity(2048);
    xml.push_str(XML_DECL);
    xml.push_str(
        r#"<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">"#,
    );
    xml.push_str(r#"<Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>"#);
    xml.push_str(r#"<Default Extension="xml" ContentType="application/xml"/>"#);
    for format in PictureFormat::ALL {
        let _ = write!(
            xml,
            r#"<Default Extension="{}" ContentType="{}"/>"#,
            format.extension(),
            format.content_type()
        );
    }
    let overrides = [
        ("/ppt/presentation.xml", CT_PRESENTATION),
        ("/ppt/slideMasters/slideMaster1.xml", CT_SLIDE_MASTER),
        ("/ppt/slideLayouts/slideLayout1.xml", CT_SLIDE_LAYOUT),
        ("/ppt/theme/theme1.xml", CT_THEME),
        ("/ppt/presProps.xml", CT_PRES_PROPS),
        ("/docProps/core.xml", CT_CORE_PROPS),
        ("/docProps/app.xml", CT_EXTENDED_PROPS),
    ];
    for (part, content_type) in overrides {
        let _ = write!(
            xml,
            r#"<Override PartName="{part}" ContentType="{content_type}"/>"#
        );
    }
    for n in 1..=slide_count {
        let _ = write!(
            xml,
            r#"<Override PartName="/ppt/slides/slide{n}.xml" ContentType="{CT_SLIDE}"/>"#
        );
    }
    xml.push_str("</Types>");
    xml
}

fn presentation_xml(pres: &Presentation) -> String {
    let mut xml = String::with_capacity(1024);
    xml.push_str(XML_DECL);
    let _ = write!(
        xml,
        r#"<p:presentation xmlns:a="{NS_A}" xmlns:r="{NS_R}" xmlns:p="{NS_P}" saveSubsetFonts="1">"#
    );
    xml.push_str(r#"<p:sldMasterIdLst><p:sldMasterId id="2147483648" r:id="rId1"/></p:sldMasterIdLst>"#);
    if !pres.slides.is_empty() {
        xml.push_str("<p:sldIdLst>");
        for i in 0..pres.slides.len() {
            let _ = write!(
                xml,
                r#"<p:sldId id="{}" r:id="rId{}"/>"#,
                FIRST_SLIDE_ID + i,
                FIRST_SLIDE_REL + i
            );
        }
        xml.push_str("</p:sldIdLst>");
    }
    let _ = write!(
        xml,
        r#"<p:sldSz cx="{}" cy="{}"/>"#,
        pres.width, pres.height
    );
    xml.push_str(r#"<p:notesSz cx="6858000" cy="9144000"/>"#);
    xml.push_str("</p:presentation>");
    xml
}

/// Slide XML plus the media it references, numbered from `first_media`.
fn slide_part(slide: &Slide, first_media: usize) -> Result<(String, Vec<Relationship>), std::fmt::Error> {
    let mut rels = vec![rel("rId1", REL_SLIDE_LAYOUT, "../slideLayouts/slideLayout1.xml")];
    let mut xml = String::with_capacity(4096);
    xml.push_str(XML_DECL);
    write!(
        xml,
        r#"<p:sld xmlns:a="{NS_A}" xmlns:r="{NS_R}" xmlns:p="{NS_P}">"#
    )?;
    write!(xml, r#"<p:cSld name="{}">"#, escape_xml(slide.name()))?;
    xml.push_str("<p:spTree>");
    xml.push_str(r#"<p:nvGrpSpPr><p:cNvPr id="1" name=""/><p:cNvGrpSpPr/><p:nvPr/></p:nvGrpSpPr>"#);
    xml.push_str(r#"<p:grpSpPr><a:xfrm><a:off x="0" y="0"/><a:ext cx="0" cy="0"/><a:chOff x="0" y="0"/><a:chExt cx="0" cy="0"/></a:xfrm></p:grpSpPr>"#);

    let mut media = first_media;
    for (i, shape) in slide.shapes().iter().enumerate() {
        // Group shape uses id=1.
        let shape_id = i as u32 + 2;
        match shape {
            Shape::Picture(picture) => {
                let rel_id = format!("rId{}", rels.len() + 1);
                rels.push(rel(
                    rel_id.clone(),
                    REL_IMAGE,
                    format!("../media/image{}.{}", media, picture.format.extension()),
                ));
                media += 1;
                shape.write_xml(&mut xml, shape_id, Some(&rel_id))?;
            }
            _ => shape.write_xml(&mut xml, shape_id, None)?,
        }
    }

    xml.push_str("</p:spTree>");
    xml.push_str("</p:cSld>");
    xml.push_str("<p:clrMapOvr><a:masterClrMapping/></p:clrMapOvr>");
    xml.push_str("</p:sld>");
    Ok((xml, rels))
}

pub(super) fn write_package<W: Write + Seek>(pres: &Presentation, writer: W) -> ZipResult<W> {
    let mut zip = ZipWriter::new(writer);
    // Media parts are stored uncompressed.
    let put = |zip: &mut ZipWriter<W>, name: &str, body: &[u8], media: bool| -> ZipResult<()> {
        let options = if media {
            SimpleFileOptions::default().compression_method(CompressionMethod::Stored)
        } else {
            SimpleFileOptions::default().compression_method(CompressionMethod::Deflated)
        };
        zip.start_file(name, options)?;
        zip.write_all(body)?;
        Ok(())
    };

    let slide_count = pres.slides.len();
    put(&mut zip, "[Content_Types].xml", content_types_xml(slide_count).as_bytes(), false)?;
    put(
        &mut zip,
        "_rels/.rels",
        relationships_xml(&[
            rel("rId1", REL_OFFICE_DOCUMENT, "ppt/presentation.xml"),
            rel("rId2", REL_CORE_PROPS, "docProps/core.xml"),
            rel("rId3", REL_EXTENDED_PROPS, "docProps/app.xml"),
        ])
        .as_bytes(),
        false,
    )?;
    put(&mut zip, "docProps/core.xml", core_props_xml(&escape_xml(&pres.title)).as_bytes(), false)?;
    put(&mut zip, "docProps/app.xml", app_props_xml(slide_count).as_bytes(), false)?;

    let mut pres_rels = vec![
        rel("rId1", REL_SLIDE_MASTER, "slideMasters/slideMaster1.xml"),
        rel("rId2", REL_THEME, "theme/theme1.xml"),
        rel("rId3", REL_PRES_PROPS, "presProps.xml"),
    ];
    for i in 0..slide_count {
        pres_rels.push(rel(
            format!("rId{}", FIRST_SLIDE_REL + i),
            REL_SLIDE,
            format!("slides/slide{}.xml", i + 1),
        ));
    }
    put(&mut zip, "ppt/presentation.xml", presentation_xml(pres).as_bytes(), false)?;
    put(&mut zip, "ppt/_rels/presentation.xml.rels", relationships_xml(&pres_rels).as_bytes(), false)?;
    put(&mut zip, "ppt/presProps.xml", pres_props_xml().as_bytes(), false)?;

    put(&mut zip, "ppt/slideMasters/slideMaster1.xml", slide_master_xml().as_bytes(), false)?;
    put(
        &mut zip,
        "ppt/slideMasters/_rels/slideMaster1.xml.rels",
        relationships_xml(&[
            rel("rId1", REL_SLIDE_LAYOUT, "../slideLayouts/slideLayout1.xml"),
            rel("rId2", REL_THEME, "../theme/theme1.xml"),
        ])
        .as_bytes(),
        false,
    )?;
    put(&mut zip, "ppt/slideLayouts/slideLayout1.xml", slide_layout_xml().as_bytes(), false)?;
    put(
        &mut zip,
        "ppt/slideLayouts/_rels/slideLayout1.xml.rels",
        relationships_xml(&[rel("rId1", REL_SLIDE_MASTER, "../slideMasters/slideMaster1.xml")])
            .as_bytes(),
        false,
    )?;
    put(&mut zip, "ppt/theme/theme1.xml", theme_xml().as_bytes(), false)?;

    let mut next_media = 1;
    for (i, slide) in pres.slides.iter().enumerate() {
        let (xml, rels) = slide_part(slide, next_media).map_err(xml_err)?;
        put(&mut zip, &format!("ppt/slides/slide{}.xml", i + 1), xml.as_bytes(), false)?;
        put(
            &mut zip,
            &format!("ppt/slides/_rels/slide{}.xml.rels", i + 1),
            relationships_xml(&rels).as_bytes(),
            false,
        )?;
        for picture in slide.pictures() {
            put(
                &mut zip,
                &format!("ppt/media/image{}.{}", next_media, picture.format.extension()),
                &picture.data,
                true,
            )?;
            next_media += 1;
        }
    }

    zip.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::deck::{inches, Picture, Rect, Rgb, TextBox, TextStyle};

    #[test]
    fn test_presentation_xml_lists_slides_and_size() {
        let mut pres = Presentation::new(inches(16.0), inches(9.0));
        pres.push_slide(Slide::new("title"));
        pres.push_slide(Slide::new("content"));
        let xml = presentation_xml(&pres);
        assert!(xml.contains(r#"<p:sldId id="256" r:id="rId4"/>"#));
        assert!(xml.contains(r#"<p:sldId id="257" r:id="rId5"/>"#));
        assert!(xml.contains(r#"<p:sldSz cx="14630400" cy="8229600"/>"#));
    }

    #[test]
    fn test_slide_part_numbers_media_relationships() {
        let mut slide = Slide::new("content");
        slide.add(Shape::Text(TextBox::new(
            Rect::inches(0.5, 0.5, 15.0, 1.5),
            "Title",
            TextStyle::default(),
        )));
        slide.add(Shape::Picture(Picture {
            rect: Rect::inches(8.5, 2.0, 6.5, 5.0),
            data: vec![0u8; 4],
            format: PictureFormat::Jpeg,
            description: String::new(),
        }));
        slide.add(Shape::Accent {
            rect: Rect::inches(7.0, 7.0, 2.0, 0.5),
            fill: Rgb(31, 78, 121),
        });

        let (xml, rels) = slide_part(&slide, 3).unwrap();

        assert_eq!(rels.len(), 2);
        assert_eq!(rels[1].id, "rId2");
        assert_eq!(rels[1].target, "../media/image3.jpeg");
        assert!(xml.contains(r#"<p:cSld name="content">"#));
        assert!(xml.contains(r#"r:embed="rId2""#));
        assert!(xml.contains(r#"<p:cNvPr id="4" name="Rounded Rectangle 4"/>"#));
    }
}
