//! Slide-deck writer (PPTX).
//!
//! A PPTX file is a zip package of XML parts. [`PptxWriter`] streams it:
//! every [`add_frame`](DocumentWriter::add_frame) immediately writes the
//! frame's JPEG, its slide and the slide's relationships into the archive,
//! so finished slides never stay in memory. [`finalize`](DocumentWriter::finalize)
//! adds the parts that list the slides (presentation, content types,
//! document properties) together with one blank master, layout and theme.
//!
//! # Layout
//!
//! Slide size is fixed for the whole deck (see
//! [`SlideSize`](crate::SlideSize)). The image area
//! is the full slide, minus a [`SLIDE_CAPTION_BAND`] strip at the bottom when
//! captions are enabled. Each frame is placed with [`letterbox`]: uniformly
//! scaled to fit the area, centered, never cropped. The slide background is
//! black so the bars look the same on every slide.
//!
//! Entries carry a fixed modification time, so identical frames produce
//! byte-identical decks.

use std::{
    borrow::Cow,
    fs::File,
    io::Write,
    path::{Path, PathBuf},
};

use zip::{CompressionMethod, DateTime, ZipWriter, write::SimpleFileOptions};

use crate::{
    configuration::DocumentOptions,
    document::{self, DocumentWriter, OutputFormat},
    error::FramedeckError,
    frame::Frame,
    layout::{Placement, SLIDE_CAPTION_BAND, letterbox},
    output_lock::OutputLease,
};

const FIRST_SLIDE_ID: u64 = 256;
const SLIDE_MASTER_ID: u64 = 2_147_483_648;
const SLIDE_LAYOUT_ID: u64 = 2_147_483_649;
/// Relationships 1 and 2 of the presentation are the master and the theme.
const FIRST_SLIDE_RELATIONSHIP: usize = 3;

const CAPTION_FONT_SIZE: u32 = 1800;

const XML_DECLARATION: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#;
const NS_PRESENTATION: &str = "http://schemas.openxmlformats.org/presentationml/2006/main";
const NS_DRAWING: &str = "http://schemas.openxmlformats.org/drawingml/2006/main";
const NS_RELATIONSHIPS: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships";
const NS_PACKAGE_RELATIONSHIPS: &str =
    "http://schemas.openxmlformats.org/package/2006/relationships";
const REL_TYPE_BASE: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";

/// Writes frames into a PPTX deck, one slide each.
///
/// # Example
///
/// ```no_run
/// use framedeck::{DocumentOptions, DocumentWriter, PptxWriter, SlideSize};
///
/// let options = DocumentOptions {
///     slide_size: SlideSize::Standard,
///     ..DocumentOptions::default()
/// };
/// let mut writer = PptxWriter::open("frames.pptx", options)?;
/// // writer.add_frame(frame)?;
/// writer.finalize()?;
/// # Ok::<(), framedeck::FramedeckError>(())
/// ```
pub struct PptxWriter {
    path: PathBuf,
    options: DocumentOptions,
    archive: Option<ZipWriter<File>>,
    /// Resolved on the first frame.
    slide_dimensions: Option<(u64, u64)>,
    slides: u64,
    lease: Option<OutputLease>,
}

impl PptxWriter {
    /// Create the output file and start a new deck.
    ///
    /// # Errors
    ///
    /// [`FramedeckError::OutputPathInUse`] or
    /// [`FramedeckError::OutputPathInvalid`].
    pub fn open<P: AsRef<Path>>(path: P, options: DocumentOptions) -> Result<Self, FramedeckError> {
        let path = path.as_ref().to_path_buf();
        let lease = OutputLease::acquire(&path)?;
        let file = document::create_output_file(&path)?;
        log::debug!("Opened PPTX writer on {}", lease.path().display());

        Ok(Self {
            path,
            options,
            archive: Some(ZipWriter::new(file)),
            slide_dimensions: None,
            slides: 0,
            lease: Some(lease),
        })
    }

    fn caption_band(&self) -> u64 {
        if self.options.caption_style.is_enabled() {
            SLIDE_CAPTION_BAND
        } else {
            0
        }
    }

    /// Slide size, fixing it from `first_frame` if not yet resolved.
    fn slide_dimensions(&mut self, first_frame: (u32, u32)) -> (u64, u64) {
        let band = self.caption_band();
        let slide_size = self.options.slide_size;
        *self
            .slide_dimensions
            .get_or_insert_with(|| slide_size.dimensions(first_frame, band))
    }
}

impl DocumentWriter for PptxWriter {
    fn format(&self) -> OutputFormat {
        OutputFormat::Pptx
    }

    fn path(&self) -> &Path {
        &self.path
    }

    fn add_frame(&mut self, frame: Frame) -> Result<(), FramedeckError> {
        if self.archive.is_none() {
            return Err(FramedeckError::WriterClosed);
        }

        let jpeg = document::encode_jpeg(&frame.image, self.options.jpeg_quality)?;
        let caption = self.options.caption_style.text(frame.index, frame.timestamp);
        let (pixel_width, pixel_height) = (frame.width(), frame.height());
        drop(frame);

        let (slide_width, slide_height) = self.slide_dimensions((pixel_width, pixel_height));
        let band = self.caption_band().min(slide_height);
        let image_area = Placement::new(0, 0, slide_width, slide_height - band);
        let picture = letterbox(pixel_width, pixel_height, image_area);
        let caption_area = Placement::new(0, slide_height - band, slide_width, band);

        let number = self.slides + 1;
        let slide_xml = slide_part(number, picture, caption.as_deref().map(|t| (t, caption_area)));

        let Some(archive) = self.archive.as_mut() else {
            return Err(FramedeckError::WriterClosed);
        };
        write_entry(archive, &format!("ppt/media/image{number}.jpeg"), &jpeg, stored())?;
        write_entry(
            archive,
            &format!("ppt/slides/slide{number}.xml"),
            slide_xml.as_bytes(),
            deflated(),
        )?;
        write_entry(
            archive,
            &format!("ppt/slides/_rels/slide{number}.xml.rels"),
            slide_relationships(number).as_bytes(),
            deflated(),
        )?;
        self.slides = number;

        log::debug!(
            "PPTX slide {} ({}x{} px at {},{} {}x{} EMU)",
            number,
            pixel_width,
            pixel_height,
            picture.x,
            picture.y,
            picture.width,
            picture.height
        );
        Ok(())
    }

    fn finalize(&mut self) -> Result<PathBuf, FramedeckError> {
        let Some(mut archive) = self.archive.take() else {
            return Err(FramedeckError::WriterClosed);
        };
        let _lease = self.lease.take();

        if self.slides == 0 {
            log::warn!("Finalizing {} with no slides", self.path.display());
        }
        let (slide_width, slide_height) = self.slide_dimensions((0, 0));
        let slides = self.slides;

        let parts: [(&str, String); 12] = [
            ("ppt/presentation.xml", presentation_part(slides, slide_width, slide_height)),
            ("ppt/_rels/presentation.xml.rels", presentation_relationships(slides)),
            ("ppt/slideMasters/slideMaster1.xml", slide_master_part()),
            ("ppt/slideMasters/_rels/slideMaster1.xml.rels", slide_master_relationships()),
            ("ppt/slideLayouts/slideLayout1.xml", SLIDE_LAYOUT.replace("{ns}", &namespaces())),
            ("ppt/slideLayouts/_rels/slideLayout1.xml.rels", slide_layout_relationships()),
            ("ppt/theme/theme1.xml", THEME.replace("{a}", NS_DRAWING)),
            ("ppt/presProps.xml", presentation_properties()),
            ("docProps/core.xml", core_properties()),
            ("docProps/app.xml", app_properties(slides)),
            ("_rels/.rels", package_relationships()),
            ("[Content_Types].xml", content_types(slides)),
        ];
        for (name, xml) in &parts {
            write_entry(&mut archive, name, xml.as_bytes(), deflated())?;
        }

        let mut file = archive.finish()?;
        file.flush()
            .map_err(|error| FramedeckError::Encode(format!("failed to write PPTX: {error}")))?;

        log::info!("Wrote {} ({} slides)", self.path.display(), slides);
        Ok(self.path.clone())
    }

    fn frames_written(&self) -> u64 {
        self.slides
    }
}

fn deflated() -> SimpleFileOptions {
    SimpleFileOptions::default()
        .compression_method(CompressionMethod::Deflated)
        .last_modified_time(DateTime::default())
}

/// JPEG data does not compress further.
fn stored() -> SimpleFileOptions {
    SimpleFileOptions::default()
        .compression_method(CompressionMethod::Stored)
        .last_modified_time(DateTime::default())
}

fn write_entry(
    archive: &mut ZipWriter<File>,
    name: &str,
    data: &[u8],
    options: SimpleFileOptions,
) -> Result<(), FramedeckError> {
    archive.start_file(name, options)?;
    archive
        .write_all(data)
        .map_err(|error| FramedeckError::Encode(format!("failed to write {name}: {error}")))
}

fn escape_xml(text: &str) -> Cow<'_, str> {
    if !text.contains(['<', '>', '&', '"', '\'']) {
        return Cow::Borrowed(text);
    }
    let mut escaped = String::with_capacity(text.len() + 8);
    for c in text.chars() {
        match c {
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '&' => escaped.push_str("&amp;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            _ => escaped.push(c),
        }
    }
    Cow::Owned(escaped)
}

fn namespaces() -> String {
    format!(r#"xmlns:a="{NS_DRAWING}" xmlns:r="{NS_RELATIONSHIPS}" xmlns:p="{NS_PRESENTATION}""#)
}

fn relationship(id: usize, kind: &str, target: &str) -> String {
    format!(r#"<Relationship Id="rId{id}" Type="{REL_TYPE_BASE}/{kind}" Target="{target}"/>"#)
}

fn relationships(entries: &[String]) -> String {
    format!(
        r#"{XML_DECLARATION}<Relationships xmlns="{NS_PACKAGE_RELATIONSHIPS}">{}</Relationships>"#,
        entries.concat()
    )
}

fn slide_part(number: u64, picture: Placement, caption: Option<(&str, Placement)>) -> String {
    let caption_shape = caption
        .filter(|(_, area)| area.height > 0)
        .map(|(text, area)| {
            format!(
                concat!(
                    r#"<p:sp><p:nvSpPr><p:cNvPr id="3" name="Caption"/><p:cNvSpPr txBox="1"/><p:nvPr/></p:nvSpPr>"#,
                    r#"<p:spPr><a:xfrm><a:off x="{x}" y="{y}"/><a:ext cx="{cx}" cy="{cy}"/></a:xfrm>"#,
                    r#"<a:prstGeom prst="rect"><a:avLst/></a:prstGeom><a:noFill/></p:spPr>"#,
                    r#"<p:txBody><a:bodyPr wrap="none" anchor="ctr"/><a:lstStyle/>"#,
                    r#"<a:p><a:pPr algn="ctr"/><a:r><a:rPr lang="en-US" sz="{sz}" dirty="0">"#,
                    r#"<a:solidFill><a:srgbClr val="FFFFFF"/></a:solidFill></a:rPr>"#,
                    r#"<a:t>{text}</a:t></a:r></a:p></p:txBody></p:sp>"#,
                ),
                x = area.x,
                y = area.y,
                cx = area.width,
                cy = area.height,
                sz = CAPTION_FONT_SIZE,
                text = escape_xml(text),
            )
        })
        .unwrap_or_default();

    format!(
        concat!(
            "{decl}<p:sld {ns}><p:cSld>",
            r#"<p:bg><p:bgPr><a:solidFill><a:srgbClr val="000000"/></a:solidFill><a:effectLst/></p:bgPr></p:bg>"#,
            r#"<p:spTree><p:nvGrpSpPr><p:cNvPr id="1" name=""/><p:cNvGrpSpPr/><p:nvPr/></p:nvGrpSpPr>"#,
            r#"<p:grpSpPr><a:xfrm><a:off x="0" y="0"/><a:ext cx="0" cy="0"/><a:chOff x="0" y="0"/><a:chExt cx="0" cy="0"/></a:xfrm></p:grpSpPr>"#,
            r#"<p:pic><p:nvPicPr><p:cNvPr id="2" name="Frame {number}"/><p:cNvPicPr><a:picLocks noChangeAspect="1"/></p:cNvPicPr><p:nvPr/></p:nvPicPr>"#,
            r#"<p:blipFill><a:blip r:embed="rId2"/><a:stretch><a:fillRect/></a:stretch></p:blipFill>"#,
            r#"<p:spPr><a:xfrm><a:off x="{x}" y="{y}"/><a:ext cx="{cx}" cy="{cy}"/></a:xfrm><a:prstGeom prst="rect"><a:avLst/></a:prstGeom></p:spPr></p:pic>"#,
            "{caption}</p:spTree></p:cSld>",
            r#"<p:clrMapOvr><a:masterClrMapping/></p:clrMapOvr></p:sld>"#,
        ),
        decl = XML_DECLARATION,
        ns = namespaces(),
        number = number,
        x = picture.x,
        y = picture.y,
        cx = picture.width,
        cy = picture.height,
        caption = caption_shape,
    )
}

fn slide_relationships(number: u64) -> String {
    relationships(&[
        relationship(1, "slideLayout", "../slideLayouts/slideLayout1.xml"),
        relationship(2, "image", &format!("../media/image{number}.jpeg")),
    ])
}

fn presentation_part(slides: u64, width: u64, height: u64) -> String {
    // An empty sldIdLst is invalid; omit it for a deck without slides.
    let slide_list = if slides == 0 {
        String::new()
    } else {
        let entries: String = (0..slides)
            .map(|i| {
                format!(
                    r#"<p:sldId id="{}" r:id="rId{}"/>"#,
                    FIRST_SLIDE_ID + i,
                    FIRST_SLIDE_RELATIONSHIP as u64 + i
                )
            })
            .collect();
        format!("<p:sldIdLst>{entries}</p:sldIdLst>")
    };

    format!(
        concat!(
            r#"{decl}<p:presentation {ns} saveSubsetFonts="1">"#,
            r#"<p:sldMasterIdLst><p:sldMasterId id="{master}" r:id="rId1"/></p:sldMasterIdLst>"#,
            "{slides}",
            r#"<p:sldSz cx="{cx}" cy="{cy}"/><p:notesSz cx="6858000" cy="9144000"/>"#,
            "<p:defaultTextStyle/></p:presentation>",
        ),
        decl = XML_DECLARATION,
        ns = namespaces(),
        master = SLIDE_MASTER_ID,
        slides = slide_list,
        cx = width,
        cy = height,
    )
}

fn presentation_relationships(slides: u64) -> String {
    let mut entries = vec![
        relationship(1, "slideMaster", "slideMasters/slideMaster1.xml"),
        relationship(2, "theme", "theme/theme1.xml"),
        relationship(
            FIRST_SLIDE_RELATIONSHIP + slides as usize,
            "presProps",
            "presProps.xml",
        ),
    ];
    entries.extend((0..slides as usize).map(|i| {
        relationship(
            FIRST_SLIDE_RELATIONSHIP + i,
            "slide",
            &format!("slides/slide{}.xml", i + 1),
        )
    }));
    relationships(&entries)
}

fn slide_master_part() -> String {
    SLIDE_MASTER
        .replace("{ns}", &namespaces())
        .replace("{layout}", &SLIDE_LAYOUT_ID.to_string())
}

fn slide_master_relationships() -> String {
    relationships(&[
        relationship(1, "slideLayout", "../slideLayouts/slideLayout1.xml"),
        relationship(2, "theme", "../theme/theme1.xml"),
    ])
}

fn slide_layout_relationships() -> String {
    relationships(&[relationship(1, "slideMaster", "../slideMasters/slideMaster1.xml")])
}

fn presentation_properties() -> String {
    format!(r#"{XML_DECLARATION}<p:presentationPr {}/>"#, namespaces())
}

fn package_relationships() -> String {
    relationships(&[
        relationship(1, "officeDocument", "ppt/presentation.xml"),
        concat!(
            r#"<Relationship Id="rId2" "#,
            r#"Type="http://schemas.openxmlformats.org/package/2006/relationships/metadata/core-properties" "#,
            r#"Target="docProps/core.xml"/>"#,
        )
        .to_string(),
        relationship(3, "extended-properties", "docProps/app.xml"),
    ])
}

fn core_properties() -> String {
    format!(
        concat!(
            "{decl}",
            r#"<cp:coreProperties xmlns:cp="http://schemas.openxmlformats.org/package/2006/metadata/core-properties" "#,
            r#"xmlns:dc="http://purl.org/dc/elements/1.1/">"#,
            "<dc:title>Video frames</dc:title><dc:creator>framedeck</dc:creator>",
            "</cp:coreProperties>",
        ),
        decl = XML_DECLARATION,
    )
}

fn app_properties(slides: u64) -> String {
    format!(
        concat!(
            "{decl}",
            r#"<Properties xmlns="http://schemas.openxmlformats.org/officeDocument/2006/extended-properties">"#,
            "<Application>framedeck</Application><Slides>{slides}</Slides>",
            "</Properties>",
        ),
        decl = XML_DECLARATION,
        slides = slides,
    )
}

fn content_types(slides: u64) -> String {
    const PML: &str = "application/vnd.openxmlformats-officedocument.presentationml";
    let slide_overrides: String = (1..=slides)
        .map(|n| {
            format!(
                r#"<Override PartName="/ppt/slides/slide{n}.xml" ContentType="{PML}.slide+xml"/>"#
            )
        })
        .collect();

    format!(
        concat!(
            "{decl}",
            r#"<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">"#,
            r#"<Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>"#,
            r#"<Default Extension="xml" ContentType="application/xml"/>"#,
            r#"<Default Extension="jpeg" ContentType="image/jpeg"/>"#,
            r#"<Override PartName="/ppt/presentation.xml" ContentType="{pml}.presentation.main+xml"/>"#,
            r#"<Override PartName="/ppt/presProps.xml" ContentType="{pml}.presProps+xml"/>"#,
            r#"<Override PartName="/ppt/slideMasters/slideMaster1.xml" ContentType="{pml}.slideMaster+xml"/>"#,
            r#"<Override PartName="/ppt/slideLayouts/slideLayout1.xml" ContentType="{pml}.slideLayout+xml"/>"#,
            r#"<Override PartName="/ppt/theme/theme1.xml" ContentType="application/vnd.openxmlformats-officedocument.theme+xml"/>"#,
            r#"<Override PartName="/docProps/core.xml" ContentType="application/vnd.openxmlformats-package.core-properties+xml"/>"#,
            r#"<Override PartName="/docProps/app.xml" ContentType="application/vnd.openxmlformats-officedocument.extended-properties+xml"/>"#,
            "{slides}</Types>",
        ),
        decl = XML_DECLARATION,
        pml = PML,
        slides = slide_overrides,
    )
}

const SLIDE_MASTER: &str = concat!(
    r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
    "<p:sldMaster {ns}><p:cSld>",
    r#"<p:bg><p:bgRef idx="1001"><a:schemeClr val="bg1"/></p:bgRef></p:bg>"#,
    r#"<p:spTree><p:nvGrpSpPr><p:cNvPr id="1" name=""/><p:cNvGrpSpPr/><p:nvPr/></p:nvGrpSpPr>"#,
    r#"<p:grpSpPr><a:xfrm><a:off x="0" y="0"/><a:ext cx="0" cy="0"/><a:chOff x="0" y="0"/><a:chExt cx="0" cy="0"/></a:xfrm></p:grpSpPr>"#,
    "</p:spTree></p:cSld>",
    r#"<p:clrMap bg1="lt1" tx1="dk1" bg2="lt2" tx2="dk2" accent1="accent1" accent2="accent2" accent3="accent3" "#,
    r#"accent4="accent4" accent5="accent5" accent6="accent6" hlink="hlink" folHlink="folHlink"/>"#,
    r#"<p:sldLayoutIdLst><p:sldLayoutId id="{layout}" r:id="rId1"/></p:sldLayoutIdLst>"#,
    "<p:txStyles><p:titleStyle/><p:bodyStyle/><p:otherStyle/></p:txStyles>",
    "</p:sldMaster>",
);

const SLIDE_LAYOUT: &str = concat!(
    r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
    r#"<p:sldLayout {ns} type="blank" preserve="1"><p:cSld name="Blank">"#,
    r#"<p:spTree><p:nvGrpSpPr><p:cNvPr id="1" name=""/><p:cNvGrpSpPr/><p:nvPr/></p:nvGrpSpPr>"#,
    r#"<p:grpSpPr><a:xfrm><a:off x="0" y="0"/><a:ext cx="0" cy="0"/><a:chOff x="0" y="0"/><a:chExt cx="0" cy="0"/></a:xfrm></p:grpSpPr>"#,
    "</p:spTree></p:cSld>",
    "<p:clrMapOvr><a:masterClrMapping/></p:clrMapOvr></p:sldLayout>",
);

const THEME: &str = concat!(
    r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
    r#"<a:theme xmlns:a="{a}" name="Office Theme"><a:themeElements>"#,
    r#"<a:clrScheme name="Office">"#,
    r#"<a:dk1><a:sysClr val="windowText" lastClr="000000"/></a:dk1>"#,
    r#"<a:lt1><a:sysClr val="window" lastClr="FFFFFF"/></a:lt1>"#,
    r#"<a:dk2><a:srgbClr val="44546A"/></a:dk2><a:lt2><a:srgbClr val="E7E6E6"/></a:lt2>"#,
    r#"<a:accent1><a:srgbClr val="4472C4"/></a:accent1><a:accent2><a:srgbClr val="ED7D31"/></a:accent2>"#,
    r#"<a:accent3><a:srgbClr val="A5A5A5"/></a:accent3><a:accent4><a:srgbClr val="FFC000"/></a:accent4>"#,
    r#"<a:accent5><a:srgbClr val="5B9BD5"/></a:accent5><a:accent6><a:srgbClr val="70AD47"/></a:accent6>"#,
    r#"<a:hlink><a:srgbClr val="0563C1"/></a:hlink><a:folHlink><a:srgbClr val="954F72"/></a:folHlink>"#,
    "</a:clrScheme>",
    r#"<a:fontScheme name="Office">"#,
    r#"<a:majorFont><a:latin typeface="Calibri Light"/><a:ea typeface=""/><a:cs typeface=""/></a:majorFont>"#,
    r#"<a:minorFont><a:latin typeface="Calibri"/><a:ea typeface=""/><a:cs typeface=""/></a:minorFont>"#,
    "</a:fontScheme>",
    r#"<a:fmtScheme name="Office"><a:fillStyleLst>"#,
    r#"<a:solidFill><a:schemeClr val="phClr"/></a:solidFill>"#,
    r#"<a:solidFill><a:schemeClr val="phClr"/></a:solidFill>"#,
    r#"<a:solidFill><a:schemeClr val="phClr"/></a:solidFill>"#,
    "</a:fillStyleLst><a:lnStyleLst>",
    r#"<a:ln w="6350"><a:solidFill><a:schemeClr val="phClr"/></a:solidFill></a:ln>"#,
    r#"<a:ln w="12700"><a:solidFill><a:schemeClr val="phClr"/></a:solidFill></a:ln>"#,
    r#"<a:ln w="19050"><a:solidFill><a:schemeClr val="phClr"/></a:solidFill></a:ln>"#,
    "</a:lnStyleLst><a:effectStyleLst>",
    "<a:effectStyle><a:effectLst/></a:effectStyle>",
    "<a:effectStyle><a:effectLst/></a:effectStyle>",
    "<a:effectStyle><a:effectLst/></a:effectStyle>",
    "</a:effectStyleLst><a:bgFillStyleLst>",
    r#"<a:solidFill><a:schemeClr val="phClr"/></a:solidFill>"#,
    r#"<a:solidFill><a:schemeClr val="phClr"/></a:solidFill>"#,
    r#"<a:solidFill><a:schemeClr val="phClr"/></a:solidFill>"#,
    "</a:bgFillStyleLst></a:fmtScheme>",
    "</a:themeElements></a:theme>",
);
