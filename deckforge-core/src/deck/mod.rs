//! Minimal PresentationML (PPTX) writer.
//!
//! Only what the slide layouts need: blank slides with positioned text boxes, pictures
//! and filled accent shapes on a single blank master/layout. Positions are in EMUs
//! (914400 per inch).

mod package;
pub mod shape;
mod template;

use std::io::{Seek, Write};

pub use shape::{Align, Picture, PictureFormat, Rect, Rgb, Shape, TextBox, TextStyle};

pub const EMU_PER_INCH: i64 = 914_400;

pub fn inches(value: f64) -> i64 {
    (value * EMU_PER_INCH as f64).round() as i64
}

/// A presentation under construction.
#[derive(Debug, Clone)]
pub struct Presentation {
    title: String,
    slides: Vec<Slide>,
    width: i64,
    height: i64,
}

impl Presentation {
    /// Empty presentation with the given slide size in EMUs.
    pub fn new(width: i64, height: i64) -> Self {
        Self {
            title: String::new(),
            slides: Vec::new(),
            width,
            height,
        }
    }

    /// Document title stored in the package's core properties.
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn width(&self) -> i64 {
        self.width
    }

    pub fn height(&self) -> i64 {
        self.height
    }

    pub fn push_slide(&mut self, slide: Slide) {
        self.slides.push(slide);
    }

    pub fn slides(&self) -> &[Slide] {
        &self.slides
    }

    pub fn slide_count(&self) -> usize {
        self.slides.len()
    }

    /// Write the complete `.pptx` package.
    pub fn write_to<W: Write + Seek>(&self, writer: W) -> zip::result::ZipResult<W> {
        package::write_package(self, writer)
    }
}

/// One slide: a name (shown in the slide sorter) and its shapes in z-order.
#[derive(Debug, Clone, Default)]
pub struct Slide {
    name: String,
    shapes: Vec<Shape>,
}

impl Slide {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            shapes: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn shapes(&self) -> &[Shape] {
        &self.shapes
    }

    pub fn shape_count(&self) -> usize {
        self.shapes.len()
    }

    pub fn add(&mut self, shape: Shape) {
        self.shapes.push(shape);
    }

    /// Drop every shape added after the first `len`.
    pub fn truncate(&mut self, len: usize) {
        self.shapes.truncate(len);
    }

    pub(crate) fn pictures(&self) -> impl Iterator<Item = &Picture> {
        self.shapes.iter().filter_map(|shape| match shape {
            Shape::Picture(picture) => Some(picture),
            _ => None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inches_to_emu() {
        assert_eq!(inches(1.0), 914_400);
        assert_eq!(inches(16.0), 14_630_400);
        assert_eq!(inches(0.5), 457_200);
    }

    #[test]
    fn test_truncate_rolls_back_shapes() {
        let mut slide = Slide::new("content");
        slide.add(Shape::Text(TextBox::new(
            Rect::inches(0.5, 0.5, 15.0, 1.5),
            "Title",
            TextStyle::default(),
        )));
        let checkpoint = slide.shape_count();
        slide.add(Shape::Accent {
            rect: Rect::inches(7.0, 7.0, 2.0, 0.5),
            fill: Rgb(31, 78, 121),
        });
        slide.truncate(checkpoint);
        assert_eq!(slide.shape_count(), 1);
    }
}
