//! In-memory presentation packages for tests.
#![allow(dead_code)]

use std::io::{Cursor, Write};
use zip::ZipWriter;
use zip::write::SimpleFileOptions;

pub const NS_DECLS: &str = concat!(
    r#"xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" "#,
    r#"xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships" "#,
    r#"xmlns:p="http://schemas.openxmlformats.org/presentationml/2006/main""#
);

pub const PRESENTATION_MAIN: &str =
    "application/vnd.openxmlformats-officedocument.presentationml.presentation.main+xml";

const REL_NS: &str = "http://schemas.openxmlformats.org/package/2006/relationships";
const RT_BASE: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";

const SP_TREE_HEADER: &str = r#"<p:nvGrpSpPr><p:cNvPr id="1" name=""/><p:cNvGrpSpPr/><p:nvPr/></p:nvGrpSpPr><p:grpSpPr/>"#;

pub const APP_XML: &[u8] = br#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Properties xmlns="http://schemas.openxmlformats.org/officeDocument/2006/extended-properties"><Application>Test &amp; Co</Application></Properties>"#;

/// Minimal PNG signature used as image content.
pub const PNG: &[u8] = &[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A];

struct SlideLike {
    background: String,
    shapes: String,
    images: Vec<(String, String)>,
}

impl SlideLike {
    fn new(background: &str, shapes: &str) -> Self {
        Self {
            background: background.to_string(),
            shapes: shapes.to_string(),
            images: Vec::new(),
        }
    }

    fn c_sld(&self) -> String {
        format!(
            "<p:cSld>{}<p:spTree>{}{}</p:spTree></p:cSld>",
            self.background, SP_TREE_HEADER, self.shapes
        )
    }
}

struct MasterSpec {
    body: SlideLike,
    layouts: Vec<SlideLike>,
}

/// Builds a presentation package member by member.
pub struct PptxBuilder {
    main_content_type: String,
    masters: Vec<MasterSpec>,
    slides: Vec<(SlideLike, usize)>,
    extra: Vec<(String, Vec<u8>)>,
    without: Vec<String>,
    replaced: Vec<(String, Vec<u8>)>,
}

impl Default for PptxBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl PptxBuilder {
    pub fn new() -> Self {
        Self {
            main_content_type: PRESENTATION_MAIN.to_string(),
            masters: Vec::new(),
            slides: Vec::new(),
            extra: Vec::new(),
            without: Vec::new(),
            replaced: Vec::new(),
        }
    }

    pub fn main_content_type(mut self, content_type: &str) -> Self {
        self.main_content_type = content_type.to_string();
        self
    }

    /// Add a master with the given background and shapes and no layouts.
    pub fn master(mut self, background: &str, shapes: &str) -> Self {
        self.masters.push(MasterSpec {
            body: SlideLike::new(background, shapes),
            layouts: Vec::new(),
        });
        self
    }

    /// Add a master without background carrying `count` blank layouts.
    pub fn master_with_layouts(mut self, count: usize) -> Self {
        self = self.master("", "");
        for _ in 0..count {
            self = self.layout("", "");
        }
        self
    }

    /// Add a layout to the most recently added master.
    pub fn layout(mut self, background: &str, shapes: &str) -> Self {
        if self.masters.is_empty() {
            self = self.master("", "");
        }
        if let Some(master) = self.masters.last_mut() {
            master.layouts.push(SlideLike::new(background, shapes));
        }
        self
    }

    /// Add a slide based on the first layout.
    pub fn slide(self, background: &str, shapes: &str) -> Self {
        self.slide_with_layout(background, shapes, 1)
    }

    /// Add a slide based on layout number `layout` (1-based, counted across masters).
    pub fn slide_with_layout(mut self, background: &str, shapes: &str, layout: usize) -> Self {
        self.slides.push((SlideLike::new(background, shapes), layout));
        self
    }

    /// Give the most recently added slide an image relationship `rid` to `/ppt/media/{name}`.
    pub fn slide_image(mut self, rid: &str, name: &str) -> Self {
        if let Some((slide, _)) = self.slides.last_mut() {
            slide.images.push((rid.to_string(), name.to_string()));
        }
        self
    }

    /// Add a member outside the relationship graph.
    pub fn member(mut self, name: &str, blob: &[u8]) -> Self {
        self.extra.push((name.to_string(), blob.to_vec()));
        self
    }

    /// Leave a member out of the archive.
    pub fn without_member(mut self, name: &str) -> Self {
        self.without.push(name.to_string());
        self
    }

    /// Write `blob` in place of a generated member, keeping its name and content type.
    pub fn replace_member(mut self, name: &str, blob: &[u8]) -> Self {
        self.replaced.push((name.to_string(), blob.to_vec()));
        self
    }

    /// Replace the extended properties part, `docProps/app.xml`.
    pub fn app_xml(self, blob: &[u8]) -> Self {
        self.replace_member("docProps/app.xml", blob)
    }

    pub fn build(self) -> Vec<u8> {
        let mut members: Vec<(String, Vec<u8>)> = Vec::new();
        let mut overrides = vec![("/ppt/presentation.xml".to_string(), self.main_content_type.clone())];
        overrides.push((
            "/docProps/app.xml".to_string(),
            "application/vnd.openxmlformats-officedocument.extended-properties+xml".to_string(),
        ));

        members.push((
            "_rels/.rels".to_string(),
            rels_xml(&[
                ("rId1", "officeDocument", "ppt/presentation.xml".to_string()),
                ("rId2", "extended-properties", "docProps/app.xml".to_string()),
            ]),
        ));
        members.push(("docProps/app.xml".to_string(), APP_XML.to_vec()));

        let mut pres_rels = Vec::new();
        let mut master_ids = String::new();
        let mut slide_ids = String::new();
        let mut layout_no = 0usize;
        let mut media = Vec::new();

        for (m, master) in self.masters.iter().enumerate() {
            let master_no = m + 1;
            let rid = format!("rId{}", pres_rels.len() + 1);
            master_ids.push_str(&format!(
                r#"<p:sldMasterId id="{}" r:id="{}"/>"#,
                2147483648usize + m * 100,
                rid
            ));
            pres_rels.push((rid, "slideMaster", format!("slideMasters/slideMaster{}.xml", master_no)));

            let mut master_rels = Vec::new();
            let mut layout_ids = String::new();
            for (l, layout) in master.layouts.iter().enumerate() {
                layout_no += 1;
                let lrid = format!("rId{}", l + 1);
                layout_ids.push_str(&format!(
                    r#"<p:sldLayoutId id="{}" r:id="{}"/>"#,
                    2147483649usize + m * 100 + l,
                    lrid
                ));
                master_rels.push((lrid, "slideLayout", format!("../slideLayouts/slideLayout{}.xml", layout_no)));

                members.push((
                    format!("ppt/slideLayouts/slideLayout{}.xml", layout_no),
                    format!(
                        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<p:sldLayout {}>{}</p:sldLayout>"#,
                        NS_DECLS,
                        layout.c_sld()
                    )
                    .into_bytes(),
                ));
                members.push((
                    format!("ppt/slideLayouts/_rels/slideLayout{}.xml.rels", layout_no),
                    rels_xml_owned(&[(
                        "rId1".to_string(),
                        "slideMaster",
                        format!("../slideMasters/slideMaster{}.xml", master_no),
                    )]),
                ));
                overrides.push((
                    format!("/ppt/slideLayouts/slideLayout{}.xml", layout_no),
                    "application/vnd.openxmlformats-officedocument.presentationml.slideLayout+xml"
                        .to_string(),
                ));
            }

            members.push((
                format!("ppt/slideMasters/slideMaster{}.xml", master_no),
                format!(
                    r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<p:sldMaster {}>{}<p:sldLayoutIdLst>{}</p:sldLayoutIdLst></p:sldMaster>"#,
                    NS_DECLS,
                    master.body.c_sld(),
                    layout_ids
                )
                .into_bytes(),
            ));
            members.push((
                format!("ppt/slideMasters/_rels/slideMaster{}.xml.rels", master_no),
                rels_xml_owned(&master_rels),
            ));
            overrides.push((
                format!("/ppt/slideMasters/slideMaster{}.xml", master_no),
                "application/vnd.openxmlformats-officedocument.presentationml.slideMaster+xml"
                    .to_string(),
            ));
        }

        for (s, (slide, layout)) in self.slides.iter().enumerate() {
            let slide_no = s + 1;
            let rid = format!("rId{}", pres_rels.len() + 1);
            slide_ids.push_str(&format!(r#"<p:sldId id="{}" r:id="{}"/>"#, 256 + s, rid));
            pres_rels.push((rid, "slide", format!("slides/slide{}.xml", slide_no)));

            let mut slide_rels = vec![(
                "rId1".to_string(),
                "slideLayout",
                format!("../slideLayouts/slideLayout{}.xml", layout),
            )];
            for (image_rid, name) in &slide.images {
                slide_rels.push((image_rid.clone(), "image", format!("../media/{}", name)));
                if !media.contains(name) {
                    media.push(name.clone());
                }
            }

            members.push((
                format!("ppt/slides/slide{}.xml", slide_no),
                format!(
                    r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<p:sld {}>{}</p:sld>"#,
                    NS_DECLS,
                    slide.c_sld()
                )
                .into_bytes(),
            ));
            members.push((
                format!("ppt/slides/_rels/slide{}.xml.rels", slide_no),
                rels_xml_owned(&slide_rels),
            ));
            overrides.push((
                format!("/ppt/slides/slide{}.xml", slide_no),
                "application/vnd.openxmlformats-officedocument.presentationml.slide+xml".to_string(),
            ));
        }

        for name in media {
            members.push((format!("ppt/media/{}", name), PNG.to_vec()));
        }

        members.insert(
            1,
            (
                "ppt/presentation.xml".to_string(),
                format!(
                    r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<p:presentation {}><p:sldMasterIdLst>{}</p:sldMasterIdLst><p:sldIdLst>{}</p:sldIdLst><p:sldSz cx="12192000" cy="6858000"/></p:presentation>"#,
                    NS_DECLS, master_ids, slide_ids
                )
                .into_bytes(),
            ),
        );
        members.insert(2, ("ppt/_rels/presentation.xml.rels".to_string(), rels_xml_owned(&pres_rels)));
        members.extend(self.extra);

        let mut content_types = String::from(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="xml" ContentType="application/xml"/><Default Extension="png" ContentType="image/png"/>"#,
        );
        for (partname, content_type) in overrides {
            content_types.push_str(&format!(
                r#"<Override PartName="{}" ContentType="{}"/>"#,
                partname, content_type
            ));
        }
        content_types.push_str("</Types>");
        members.insert(0, ("[Content_Types].xml".to_string(), content_types.into_bytes()));

        let mut data = Vec::new();
        {
            let mut writer = ZipWriter::new(Cursor::new(&mut data));
            let options = SimpleFileOptions::default();
            for (name, blob) in members {
                if self.without.contains(&name) {
                    continue;
                }
                let blob = self
                    .replaced
                    .iter()
                    .find(|(replaced, _)| *replaced == name)
                    .map_or(blob.as_slice(), |(_, replacement)| replacement.as_slice());
                writer.start_file(name, options).unwrap();
                writer.write_all(blob).unwrap();
            }
            writer.finish().unwrap();
        }
        data
    }
}

fn rels_xml(rels: &[(&str, &str, String)]) -> Vec<u8> {
    let owned: Vec<(String, &str, String)> = rels
        .iter()
        .map(|(id, kind, target)| (id.to_string(), *kind, target.clone()))
        .collect();
    rels_xml_owned(&owned)
}

fn rels_xml_owned(rels: &[(String, &str, String)]) -> Vec<u8> {
    let mut xml = format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="{}">"#,
        REL_NS
    );
    for (id, kind, target) in rels {
        xml.push_str(&format!(
            r#"<Relationship Id="{}" Type="{}/{}" Target="{}"/>"#,
            id, RT_BASE, kind, target
        ));
    }
    xml.push_str("</Relationships>");
    xml.into_bytes()
}

/// Every member of a zip archive, in archive order.
pub fn read_members(data: &[u8]) -> Vec<(String, Vec<u8>)> {
    let mut archive = zip::ZipArchive::new(Cursor::new(data)).unwrap();
    let mut members = Vec::new();
    for i in 0..archive.len() {
        let mut file = archive.by_index(i).unwrap();
        let mut blob = Vec::new();
        std::io::Read::read_to_end(&mut file, &mut blob).unwrap();
        members.push((file.name().to_string(), blob));
    }
    members
}

/// Content of one member as a string.
pub fn member_str(data: &[u8], name: &str) -> Option<String> {
    read_members(data)
        .into_iter()
        .find(|(n, _)| n == name)
        .map(|(_, blob)| String::from_utf8(blob).unwrap())
}
