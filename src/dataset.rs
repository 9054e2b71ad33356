//! Reading and writing the imglab dataset XML schema.
//!
//! This is the format the detector and shape-predictor trainers consume and
//! the imglab annotation tool edits:
//!
//! ```xml
//! <dataset>
//!   <name>imglab dataset</name>
//!   <comment>Created by imglab tool.</comment>
//!   <images>
//!     <image file="cat.jpg">
//!       <box top="78" left="137" width="175" height="121">
//!         <part name="LEFT_EYE" x="175" y="160"/>
//!         ...
//!       </box>
//!     </image>
//!   </images>
//! </dataset>
//! ```
//!
//! Attribute order and indentation are cosmetic; the attribute names and the
//! full 9-part set per box are what the consuming tools require.

use std::fs;
use std::path::Path;

use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};

use crate::error::{Error, Result};
use crate::face::Face;
use crate::landmark::{Landmark, LANDMARK_COUNT};
use crate::types::{BoundingBox, BoxStyle, Point};

/// All annotated faces of one source image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageEntry {
    pub file: String,
    pub faces: Vec<Face>,
}

/// An annotated image collection, mirroring one dataset XML document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dataset {
    pub name: String,
    pub comment: String,
    pub images: Vec<ImageEntry>,
}

impl Default for Dataset {
    fn default() -> Self {
        Self::new()
    }
}

impl Dataset {
    /// Empty dataset with the stock imglab header fields.
    pub fn new() -> Self {
        Self {
            name: "imglab dataset".to_string(),
            comment: "Created by imglab tool.".to_string(),
            images: Vec::new(),
        }
    }

    /// Collect faces into a dataset, grouping by source image and keeping
    /// first-seen image order.
    pub fn with_faces<I: IntoIterator<Item = Face>>(faces: I) -> Self {
        let mut dataset = Self::new();
        for face in faces {
            dataset.push(face);
        }
        dataset
    }

    /// Add one face under its source image, creating the image entry on
    /// first sight.
    pub fn push(&mut self, face: Face) {
        let file = face.file().to_string_lossy().into_owned();
        match self.images.iter_mut().find(|entry| entry.file == file) {
            Some(entry) => entry.faces.push(face),
            None => self.images.push(ImageEntry {
                file,
                faces: vec![face],
            }),
        }
    }

    /// Total number of annotated boxes across all images.
    pub fn face_count(&self) -> usize {
        self.images.iter().map(|entry| entry.faces.len()).sum()
    }

    /// Serialize to an indented XML document.
    ///
    /// `style` is the bounding-box derivation for every `<box>` element;
    /// training exports use [`BoxStyle::Square`] so the detector sees a
    /// fixed aspect ratio.
    pub fn to_xml(&self, style: BoxStyle) -> Result<String> {
        let mut writer = Writer::new_with_indent(Vec::new(), b' ', 2);

        writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("utf-8"), None)))?;
        writer.write_event(Event::Start(BytesStart::new("dataset")))?;
        write_text_element(&mut writer, "name", &self.name)?;
        write_text_element(&mut writer, "comment", &self.comment)?;
        writer.write_event(Event::Start(BytesStart::new("images")))?;

        for entry in &self.images {
            let mut image = BytesStart::new("image");
            image.push_attribute(("file", entry.file.as_str()));

            if entry.faces.is_empty() {
                writer.write_event(Event::Empty(image))?;
                continue;
            }

            writer.write_event(Event::Start(image))?;
            for face in &entry.faces {
                let bbox = style.derive(face.landmarks())?;
                let mut boxel = BytesStart::new("box");
                boxel.push_attribute(("top", bbox.top.to_string().as_str()));
                boxel.push_attribute(("left", bbox.left.to_string().as_str()));
                boxel.push_attribute(("width", bbox.width.to_string().as_str()));
                boxel.push_attribute(("height", bbox.height.to_string().as_str()));
                writer.write_event(Event::Start(boxel))?;

                for landmark in Landmark::ALL {
                    let point = face.landmark(landmark);
                    let mut part = BytesStart::new("part");
                    part.push_attribute(("name", landmark.part_name()));
                    part.push_attribute(("x", point.x.to_string().as_str()));
                    part.push_attribute(("y", point.y.to_string().as_str()));
                    writer.write_event(Event::Empty(part))?;
                }

                writer.write_event(Event::End(BytesEnd::new("box")))?;
            }
            writer.write_event(Event::End(BytesEnd::new("image")))?;
        }

        writer.write_event(Event::End(BytesEnd::new("images")))?;
        writer.write_event(Event::End(BytesEnd::new("dataset")))?;

        String::from_utf8(writer.into_inner()).map_err(|e| Error::Serialization(e.to_string()))
    }

    /// Write the dataset to a file.
    pub fn save<P: AsRef<Path>>(&self, path: P, style: BoxStyle) -> Result<()> {
        fs::write(path, self.to_xml(style)?)?;
        Ok(())
    }

    /// Load a dataset from a file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::from_xml_str(&fs::read_to_string(path)?)
    }

    /// Parse a dataset XML document.
    ///
    /// Every `<box>` must carry integer geometry attributes and exactly the
    /// 9 canonical parts; a missing, duplicate, unknown or non-integer part
    /// fails with [`Error::Serialization`] rather than yielding a partial
    /// record.
    pub fn from_xml_str(xml: &str) -> Result<Self> {
        #[derive(PartialEq)]
        enum TextField {
            None,
            Name,
            Comment,
        }

        let mut reader = Reader::from_str(xml);
        reader.trim_text(true);

        let mut dataset = Dataset {
            name: String::new(),
            comment: String::new(),
            images: Vec::new(),
        };
        let mut field = TextField::None;
        let mut current_image: Option<ImageEntry> = None;
        let mut current_box: Option<PendingBox> = None;

        loop {
            match reader.read_event()? {
                Event::Start(e) => match e.name().as_ref() {
                    b"name" => field = TextField::Name,
                    b"comment" => field = TextField::Comment,
                    b"image" => current_image = Some(open_image(&e)?),
                    b"box" => current_box = Some(PendingBox::open(&e)?),
                    b"part" => read_part(&e, current_box.as_mut())?,
                    _ => {}
                },
                Event::Empty(e) => match e.name().as_ref() {
                    b"image" => dataset.images.push(open_image(&e)?),
                    b"box" => {
                        // An empty box element has no parts at all.
                        PendingBox::open(&e)?.close(current_image.as_mut())?;
                    }
                    b"part" => read_part(&e, current_box.as_mut())?,
                    _ => {}
                },
                Event::End(e) => match e.name().as_ref() {
                    b"name" | b"comment" => field = TextField::None,
                    b"box" => {
                        let pending = current_box.take().ok_or_else(|| {
                            Error::Serialization("unexpected </box>".to_string())
                        })?;
                        pending.close(current_image.as_mut())?;
                    }
                    b"image" => {
                        let entry = current_image.take().ok_or_else(|| {
                            Error::Serialization("unexpected </image>".to_string())
                        })?;
                        dataset.images.push(entry);
                    }
                    _ => {}
                },
                Event::Text(t) => {
                    let text = t.unescape()?.into_owned();
                    match field {
                        TextField::Name => dataset.name = text,
                        TextField::Comment => dataset.comment = text,
                        TextField::None => {}
                    }
                }
                Event::Eof => break,
                _ => {}
            }
        }

        Ok(dataset)
    }
}

/// A `<box>` being parsed: geometry plus the parts seen so far.
struct PendingBox {
    bounds: BoundingBox,
    parts: [Option<Point>; LANDMARK_COUNT],
}

impl PendingBox {
    fn open(e: &BytesStart) -> Result<Self> {
        let bounds = BoundingBox::new(
            int_attr(e, b"left")?,
            int_attr(e, b"top")?,
            int_attr(e, b"width")?,
            int_attr(e, b"height")?,
        );
        Ok(Self {
            bounds,
            parts: [None; LANDMARK_COUNT],
        })
    }

    fn close(self, image: Option<&mut ImageEntry>) -> Result<()> {
        let image = image
            .ok_or_else(|| Error::Serialization("box outside of an image element".to_string()))?;

        let present = self.parts.iter().filter(|p| p.is_some()).count();
        if present != LANDMARK_COUNT {
            return Err(Error::Serialization(format!(
                "box in {:?} has {} of {} parts",
                image.file, present, LANDMARK_COUNT
            )));
        }

        let mut landmarks = [Point::new(0, 0); LANDMARK_COUNT];
        for (slot, point) in landmarks.iter_mut().zip(self.parts.iter().flatten()) {
            *slot = *point;
        }

        image
            .faces
            .push(Face::from_detection(&image.file, self.bounds, landmarks));
        Ok(())
    }
}

fn open_image(e: &BytesStart) -> Result<ImageEntry> {
    let file = attr_value(e, b"file")?
        .ok_or_else(|| Error::Serialization("image element without file attribute".to_string()))?;
    Ok(ImageEntry {
        file,
        faces: Vec::new(),
    })
}

fn read_part(e: &BytesStart, current_box: Option<&mut PendingBox>) -> Result<()> {
    let pending = current_box
        .ok_or_else(|| Error::Serialization("part outside of a box element".to_string()))?;

    let name = attr_value(e, b"name")?
        .ok_or_else(|| Error::Serialization("part element without name attribute".to_string()))?;
    let landmark = Landmark::from_part_name(&name)
        .ok_or_else(|| Error::Serialization(format!("unknown part name: {:?}", name)))?;

    if pending.parts[landmark.index()].is_some() {
        return Err(Error::Serialization(format!("duplicate part: {:?}", name)));
    }

    let x = int_attr(e, b"x")?;
    let y = int_attr(e, b"y")?;
    pending.parts[landmark.index()] = Some(Point::new(x, y));
    Ok(())
}

fn attr_value(e: &BytesStart, key: &[u8]) -> Result<Option<String>> {
    for attr in e.attributes() {
        let attr = attr.map_err(quick_xml::Error::from)?;
        if attr.key.as_ref() == key {
            return Ok(Some(attr.unescape_value()?.into_owned()));
        }
    }
    Ok(None)
}

fn int_attr(e: &BytesStart, key: &[u8]) -> Result<i32> {
    let name = String::from_utf8_lossy(e.name().as_ref()).into_owned();
    let value = attr_value(e, key)?.ok_or_else(|| {
        Error::Serialization(format!(
            "{} element missing {} attribute",
            name,
            String::from_utf8_lossy(key)
        ))
    })?;
    value.parse().map_err(|_| {
        Error::Serialization(format!(
            "{} attribute {} is not an integer: {:?}",
            name,
            String::from_utf8_lossy(key),
            value
        ))
    })
}

fn write_text_element<W: std::io::Write>(
    writer: &mut Writer<W>,
    tag: &str,
    text: &str,
) -> Result<()> {
    writer.write_event(Event::Start(BytesStart::new(tag)))?;
    writer.write_event(Event::Text(BytesText::new(text)))?;
    writer.write_event(Event::End(BytesEnd::new(tag)))?;
    Ok(())
}
