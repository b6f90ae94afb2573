mod common;

use common::{APP_XML, PNG, PptxBuilder, member_str, read_members};
use lucent::ooxml::opc::constants::namespace::{DML_MAIN, PML_MAIN};
use lucent::ooxml::pptx::backgrounds::is_transparent;
use lucent::ooxml::xml::{NodeId, XmlDocument};
use lucent::{BackgroundPolicy, OoxmlError, RewriteConfig, make_transparent, make_transparent_bytes};

const PICTURE_BG: &str = r#"<p:bg><p:bgPr><a:blipFill><a:blip r:embed="rId2"/><a:stretch><a:fillRect/></a:stretch></a:blipFill><a:effectLst/></p:bgPr></p:bg>"#;

const SOLID_SHAPE: &str = r#"<p:sp><p:nvSpPr><p:cNvPr id="2" name="Box"/><p:cNvSpPr/><p:nvPr/></p:nvSpPr><p:spPr><a:xfrm><a:off x="0" y="0"/><a:ext cx="10" cy="10"/></a:xfrm><a:prstGeom prst="rect"><a:avLst/></a:prstGeom><a:solidFill><a:srgbClr val="FF0000"/></a:solidFill><a:ln><a:solidFill><a:srgbClr val="000000"/></a:solidFill></a:ln></p:spPr></p:sp>"#;

const PLAIN_SHAPE: &str = r#"<p:sp><p:nvSpPr><p:cNvPr id="3" name="Plain"/><p:cNvSpPr/><p:nvPr/></p:nvSpPr><p:spPr/></p:sp>"#;

const PICTURE: &str = r#"<p:pic><p:nvPicPr><p:cNvPr id="4" name="Logo"/><p:cNvPicPr/><p:nvPr/></p:nvPicPr><p:blipFill><a:blip r:embed="rId2"/></p:blipFill><p:spPr/></p:pic>"#;

const TEXT_SHAPE: &str = r#"<p:sp><p:nvSpPr><p:cNvPr id="5" name="Title"/><p:cNvSpPr/><p:nvPr/></p:nvSpPr><p:spPr/><p:txBody><a:bodyPr/><a:p><a:r><a:t>Q&amp;A &lt;draft&gt; &#169;</a:t></a:r></a:p></p:txBody></p:sp>"#;

fn part(data: &[u8], name: &str) -> XmlDocument {
    let xml = member_str(data, name).unwrap_or_else(|| panic!("missing member {name}"));
    XmlDocument::parse(xml.as_bytes()).unwrap()
}

fn c_sld(doc: &XmlDocument) -> NodeId {
    doc.find_child(doc.root().unwrap(), PML_MAIN, "cSld").unwrap()
}

fn sp_tree(doc: &XmlDocument) -> NodeId {
    doc.find_child(c_sld(doc), PML_MAIN, "spTree").unwrap()
}

fn count(doc: &XmlDocument, ns: &str, local: &str) -> usize {
    doc.descendants(doc.document()).into_iter().filter(|&n| doc.is(n, ns, local)).count()
}

/// Fill element names under each `p:spPr` of each `p:sp` in the part.
fn shape_fills(doc: &XmlDocument) -> Vec<Vec<String>> {
    let fills = ["noFill", "solidFill", "gradFill", "blipFill", "pattFill", "grpFill"];
    doc.descendants(sp_tree(doc))
        .into_iter()
        .filter(|&n| doc.is(n, PML_MAIN, "sp"))
        .filter_map(|sp| doc.find_child(sp, PML_MAIN, "spPr"))
        .map(|sp_pr| {
            doc.child_elements(sp_pr)
                .filter_map(|c| doc.element(c))
                .filter(|e| e.namespace.as_deref() == Some(DML_MAIN) && fills.contains(&e.local_name()))
                .map(|e| e.local_name().to_string())
                .collect()
        })
        .collect()
}

fn rewrite(data: &[u8]) -> Vec<u8> {
    make_transparent_bytes(data, &RewriteConfig::default()).unwrap().0
}

#[test]
fn test_picture_background_becomes_transparent() {
    let data = PptxBuilder::new().master(PICTURE_BG, "").layout("", "").slide("", "").build();

    let (out, report) = make_transparent_bytes(&data, &RewriteConfig::default()).unwrap();
    assert_eq!(report.backgrounds_replaced, 1);

    let master = part(&out, "ppt/slideMasters/slideMaster1.xml");
    assert!(is_transparent(&master, c_sld(&master)));
    assert_eq!(count(&master, DML_MAIN, "blipFill"), 0);
}

#[test]
fn test_nested_group_shapes_lose_fills() {
    let shapes = format!(
        r#"<p:grpSp><p:nvGrpSpPr><p:cNvPr id="10" name="Outer"/><p:cNvGrpSpPr/><p:nvPr/></p:nvGrpSpPr><p:grpSpPr><a:xfrm><a:off x="1" y="2"/></a:xfrm></p:grpSpPr>{}<p:grpSp><p:nvGrpSpPr><p:cNvPr id="11" name="Inner"/><p:cNvGrpSpPr/><p:nvPr/></p:nvGrpSpPr><p:grpSpPr/>{}{}</p:grpSp></p:grpSp>"#,
        PLAIN_SHAPE, PLAIN_SHAPE, SOLID_SHAPE
    );
    let data = PptxBuilder::new().master_with_layouts(1).slide("", &shapes).build();

    let (out, report) = make_transparent_bytes(&data, &RewriteConfig::default()).unwrap();
    assert_eq!(report.fills_replaced, 3);

    let slide = part(&out, "ppt/slides/slide1.xml");
    assert_eq!(shape_fills(&slide), vec![vec!["noFill".to_string()]; 3]);

    let xml = member_str(&out, "ppt/slides/slide1.xml").unwrap();
    assert!(xml.contains(r#"<p:grpSpPr><a:xfrm><a:off x="1" y="2"/></a:xfrm></p:grpSpPr>"#));
    // outline fills belong to a:ln and stay
    assert!(xml.contains(r#"<a:ln><a:solidFill><a:srgbClr val="000000"/></a:solidFill></a:ln>"#));
    // noFill sits where the solid fill was, after the geometry
    assert!(xml.contains(r#"</a:prstGeom><a:noFill/><a:ln>"#));
}

#[test]
fn test_decorative_pictures_removed() {
    let shapes = format!("{}{}{}{}", PICTURE, PICTURE, TEXT_SHAPE, PICTURE);
    let data = PptxBuilder::new()
        .master_with_layouts(1)
        .slide("", &shapes)
        .slide_image("rId2", "logo.png")
        .build();

    let (out, report) = make_transparent_bytes(&data, &RewriteConfig::default()).unwrap();
    assert_eq!(report.pictures_removed, 3);

    let slide = part(&out, "ppt/slides/slide1.xml");
    assert_eq!(count(&slide, PML_MAIN, "pic"), 0);
    assert_eq!(count(&slide, PML_MAIN, "sp"), 1);
    // pruning is off by default
    let logo = read_members(&out).into_iter().find(|(name, _)| name == "ppt/media/logo.png");
    assert_eq!(logo.map(|(_, blob)| blob), Some(PNG.to_vec()));
}

#[test]
fn test_master_without_background_follows_policy() {
    let data = PptxBuilder::new()
        .master("", "")
        .layout("", "")
        .layout(PICTURE_BG, "")
        .slide("", "")
        .slide_with_layout("", "", 2)
        .build();

    let inherited = rewrite(&data);
    let master = part(&inherited, "ppt/slideMasters/slideMaster1.xml");
    assert!(master.find_child(c_sld(&master), PML_MAIN, "bg").is_none());
    assert_eq!(
        member_str(&inherited, "ppt/slideMasters/slideMaster1.xml"),
        member_str(&data, "ppt/slideMasters/slideMaster1.xml")
    );
    let layout = part(&inherited, "ppt/slideLayouts/slideLayout2.xml");
    assert!(is_transparent(&layout, c_sld(&layout)));

    let config = RewriteConfig::default().with_missing_background(BackgroundPolicy::Synthesize);
    let (synthesized, report) = make_transparent_bytes(&data, &config).unwrap();
    assert_eq!(report.backgrounds_replaced, 1);
    assert_eq!(report.backgrounds_synthesized, 4);
    for name in [
        "ppt/slideMasters/slideMaster1.xml",
        "ppt/slideLayouts/slideLayout1.xml",
        "ppt/slideLayouts/slideLayout2.xml",
        "ppt/slides/slide1.xml",
        "ppt/slides/slide2.xml",
    ] {
        let doc = part(&synthesized, name);
        assert!(is_transparent(&doc, c_sld(&doc)), "{name}");
    }
}

#[test]
fn test_rewrite_is_idempotent() {
    let data = PptxBuilder::new()
        .master(PICTURE_BG, SOLID_SHAPE)
        .layout(r#"<p:bg><p:bgRef idx="1001"><a:schemeClr val="bg1"/></p:bgRef></p:bg>"#, PICTURE)
        .slide("", &format!("{}{}", TEXT_SHAPE, SOLID_SHAPE))
        .build();
    let config = RewriteConfig::default().with_missing_background(BackgroundPolicy::Synthesize);

    let (once, _) = make_transparent_bytes(&data, &config).unwrap();
    let (twice, report) = make_transparent_bytes(&once, &config).unwrap();

    assert_eq!(report.pictures_removed, 0);
    assert_eq!(report.fills_replaced, 0);
    assert_eq!(report.backgrounds_synthesized, 0);
    assert_eq!(read_members(&once), read_members(&twice));
}

#[test]
fn test_utf16_extended_properties_kept() {
    let app_xml: Vec<u8> = [0xFF, 0xFE]
        .into_iter()
        .chain(
            r#"<?xml version="1.0" encoding="UTF-16" standalone="yes"?><Properties xmlns="http://schemas.openxmlformats.org/officeDocument/2006/extended-properties"><Application>Microsoft Office PowerPoint</Application></Properties>"#
                .encode_utf16()
                .flat_map(u16::to_le_bytes),
        )
        .collect();
    let data = PptxBuilder::new()
        .master(PICTURE_BG, "")
        .layout("", "")
        .slide("", "")
        .app_xml(&app_xml)
        .build();
    let config = RewriteConfig::default().with_prune_orphaned_media(true);

    let (out, report) = make_transparent_bytes(&data, &config).unwrap();

    assert_eq!(report.backgrounds_replaced, 1);
    let kept = read_members(&out).into_iter().find(|(name, _)| name == "docProps/app.xml");
    assert_eq!(kept.map(|(_, blob)| blob), Some(app_xml));
}

#[test]
fn test_ole_fallback_picture_removed() {
    let frame = r#"<p:graphicFrame><p:nvGraphicFramePr><p:cNvPr id="7" name="Object"/><p:cNvGraphicFramePr/><p:nvPr/></p:nvGraphicFramePr><p:xfrm/><a:graphic><a:graphicData uri="http://schemas.openxmlformats.org/presentationml/2006/ole"><p:oleObj r:id="rId3" progId="Excel.Sheet.12"><p:embed/><p:pic><p:nvPicPr><p:cNvPr id="0" name=""/><p:cNvPicPr/><p:nvPr/></p:nvPicPr><p:blipFill><a:blip r:embed="rId2"/></p:blipFill><p:spPr/></p:pic></p:oleObj></a:graphicData></a:graphic></p:graphicFrame>"#;
    let connector = r#"<p:cxnSp><p:nvCxnSpPr><p:cNvPr id="8" name="Line"/><p:cNvCxnSpPr/><p:nvPr/></p:nvCxnSpPr><p:spPr><a:prstGeom prst="line"><a:avLst/></a:prstGeom><a:solidFill><a:srgbClr val="00FF00"/></a:solidFill></p:spPr></p:cxnSp>"#;
    let data = PptxBuilder::new()
        .master_with_layouts(1)
        .slide("", &format!("{}{}", frame, connector))
        .slide_image("rId2", "emf.png")
        .build();

    let (out, report) = make_transparent_bytes(&data, &RewriteConfig::default()).unwrap();

    assert_eq!(report.pictures_removed, 1);
    assert_eq!(report.fills_replaced, 0);
    let slide = part(&out, "ppt/slides/slide1.xml");
    assert_eq!(count(&slide, PML_MAIN, "pic"), 0);
    assert_eq!(count(&slide, PML_MAIN, "oleObj"), 1);
    let xml = member_str(&out, "ppt/slides/slide1.xml").unwrap();
    assert!(xml.contains(r#"<a:solidFill><a:srgbClr val="00FF00"/></a:solidFill>"#));
}

#[test]
fn test_unrelated_content_untouched() {
    let data = PptxBuilder::new()
        .master(PICTURE_BG, "")
        .layout("", "")
        .slide("", TEXT_SHAPE)
        .slide("", SOLID_SHAPE)
        .slide("", TEXT_SHAPE)
        .member("customXml/item1.xml", b"<stray>kept &amp; untouched</stray>")
        .member("notes.txt", b"not xml at all")
        .build();

    let out = rewrite(&data);

    let names = |d: &[u8]| read_members(d).into_iter().map(|(n, _)| n).collect::<Vec<_>>();
    assert_eq!(names(&out), names(&data));

    assert_eq!(member_str(&out, "docProps/app.xml").unwrap().as_bytes(), APP_XML);
    assert_eq!(
        member_str(&out, "customXml/item1.xml").unwrap(),
        "<stray>kept &amp; untouched</stray>"
    );
    assert_eq!(member_str(&out, "notes.txt").unwrap(), "not xml at all");
    assert_eq!(
        member_str(&out, "ppt/presentation.xml"),
        member_str(&data, "ppt/presentation.xml")
    );

    let slide = member_str(&out, "ppt/slides/slide1.xml").unwrap();
    assert!(slide.contains("<a:t>Q&amp;A &lt;draft&gt; &#169;</a:t>"));

    let package = lucent::Package::from_bytes(out).unwrap();
    let slides: Vec<String> = package.slides().iter().map(|p| p.to_string()).collect();
    assert_eq!(
        slides,
        ["/ppt/slides/slide1.xml", "/ppt/slides/slide2.xml", "/ppt/slides/slide3.xml"]
    );
}

#[test]
fn test_prune_media_removes_only_orphans() {
    let shapes = format!(
        r#"{}<p:sp><p:nvSpPr><p:cNvPr id="6" name="Textured"/><p:cNvSpPr/><p:nvPr/></p:nvSpPr><p:spPr><a:blipFill><a:blip r:embed="rId3"/></a:blipFill></p:spPr></p:sp>"#,
        PICTURE
    );
    let data = PptxBuilder::new()
        .master_with_layouts(1)
        .slide("", &shapes)
        .slide_image("rId2", "logo.png")
        .slide_image("rId3", "texture.png")
        .slide("", r#"<p:graphicFrame><a:graphic><a:graphicData uri="x"><p:oleObj r:id="rId2"/></a:graphicData></a:graphic></p:graphicFrame>"#)
        .slide_image("rId2", "chart-preview.png")
        .build();
    let config = RewriteConfig::default().with_prune_orphaned_media(true);

    let (out, report) = make_transparent_bytes(&data, &config).unwrap();

    assert_eq!(report.media_relationships_removed, 2);
    assert_eq!(report.media_parts_removed, 2);
    let names: Vec<String> = read_members(&out).into_iter().map(|(name, _)| name).collect();
    assert!(!names.iter().any(|n| n == "ppt/media/logo.png"));
    assert!(!names.iter().any(|n| n == "ppt/media/texture.png"));
    assert!(names.iter().any(|n| n == "ppt/media/chart-preview.png"));

    let rels = member_str(&out, "ppt/slides/_rels/slide1.xml.rels").unwrap();
    assert!(!rels.contains("rId2") && !rels.contains("rId3"));
    assert!(rels.contains("slideLayout"));
}

#[test]
fn test_file_round_trip_and_in_place() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("deck.pptx");
    let output = dir.path().join("deck-clear.pptx");
    let data = PptxBuilder::new().master(PICTURE_BG, "").layout("", "").slide("", PICTURE).build();
    std::fs::write(&input, &data).unwrap();

    let report = make_transparent(&input, &output, &RewriteConfig::default()).unwrap();
    assert_eq!(report.pictures_removed, 1);
    assert_eq!(std::fs::read(&input).unwrap(), data);

    make_transparent(&input, &input, &RewriteConfig::default()).unwrap();
    assert_eq!(
        read_members(&std::fs::read(&input).unwrap()),
        read_members(&std::fs::read(&output).unwrap())
    );
}

#[test]
fn test_corrupt_archive_leaves_input_alone() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("broken.pptx");
    let garbage = b"PK\x03\x04 this is not really a zip archive".to_vec();
    std::fs::write(&input, &garbage).unwrap();

    let result = make_transparent(&input, &input, &RewriteConfig::default());

    assert!(matches!(result, Err(OoxmlError::MalformedPackage(_))));
    assert_eq!(std::fs::read(&input).unwrap(), garbage);
    assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
}

#[test]
fn test_missing_input() {
    let dir = tempfile::tempdir().unwrap();
    let result = make_transparent(
        dir.path().join("absent.pptx"),
        dir.path().join("out.pptx"),
        &RewriteConfig::default(),
    );
    assert!(matches!(result, Err(OoxmlError::PackageNotFound(_))));
}

#[test]
fn test_word_document_rejected() {
    let data = PptxBuilder::new()
        .main_content_type("application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml")
        .master_with_layouts(1)
        .slide("", "")
        .build();

    let result = make_transparent_bytes(&data, &RewriteConfig::default());
    assert!(matches!(result, Err(OoxmlError::UnsupportedFormat { .. })));
}

#[test]
fn test_macro_enabled_presentation_accepted() {
    let data = PptxBuilder::new()
        .main_content_type("application/vnd.ms-powerpoint.slideshow.macroEnabled.main+xml")
        .master(PICTURE_BG, "")
        .layout("", "")
        .slide("", "")
        .build();

    let (_, report) = make_transparent_bytes(&data, &RewriteConfig::default()).unwrap();
    assert_eq!(report.backgrounds_replaced, 1);
}

#[test]
fn test_dangling_layout_is_malformed() {
    let data = PptxBuilder::new()
        .master_with_layouts(1)
        .slide("", "")
        .without_member("ppt/slideLayouts/slideLayout1.xml")
        .build();

    let result = make_transparent_bytes(&data, &RewriteConfig::default());
    assert!(matches!(result, Err(OoxmlError::MalformedPackage(_))));
}

#[test]
fn test_unwritable_destination() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("deck.pptx");
    std::fs::write(&input, PptxBuilder::new().master_with_layouts(1).slide("", "").build()).unwrap();

    let result = make_transparent(
        &input,
        dir.path().join("no-such-dir").join("out.pptx"),
        &RewriteConfig::default(),
    );
    assert!(matches!(result, Err(OoxmlError::WriteFailure(_))));
}

#[test]
fn test_shared_layout_rewritten_once() {
    let data = PptxBuilder::new()
        .master("", "")
        .layout("", PICTURE)
        .slide("", "")
        .slide("", "")
        .build();

    let (_, report) = make_transparent_bytes(&data, &RewriteConfig::default()).unwrap();
    assert_eq!(report.parts_processed, 4);
    assert_eq!(report.pictures_removed, 1);
}

#[test]
fn test_default_namespace_slide() {
    let slide = format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<sld xmlns="http://schemas.openxmlformats.org/presentationml/2006/main" {}><cSld><bg><bgRef idx="1001"/></bg><spTree><sp><spPr><a:gradFill/></spPr></sp></spTree></cSld></sld>"#,
        r#"xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main""#
    );
    let data = PptxBuilder::new()
        .master_with_layouts(1)
        .slide("", "")
        .build();
    let mut package = lucent::Package::from_bytes(data).unwrap();
    let partname = package.slides()[0].clone();
    package
        .opc_package_mut()
        .get_part_mut(&partname)
        .unwrap()
        .set_blob(slide.into_bytes())
        .unwrap();

    let report = package.make_transparent(&RewriteConfig::default()).unwrap();
    assert_eq!(report.backgrounds_replaced, 1);
    assert_eq!(report.fills_replaced, 1);

    let out = package.to_bytes().unwrap();
    let doc = part(&out, "ppt/slides/slide1.xml");
    assert!(is_transparent(&doc, c_sld(&doc)));
    assert_eq!(shape_fills(&doc), vec![vec!["noFill".to_string()]]);
}
