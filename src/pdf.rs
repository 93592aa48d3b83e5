//! Paginated-document writer (PDF).
//!
//! One page per frame. Each page is sized to its frame at 96 dpi (one pixel
//! is 0.75 pt), with a caption band of [`CAPTION_BAND_PT`] underneath when
//! captions are enabled. A caption wider than its frame widens the page and
//! the frame is centered above it. Frames are embedded as JPEG (`DCTDecode`)
//! so the file stays close to the size of the compressed pictures; captions
//! use the standard Helvetica font, which every reader provides.
//!
//! Every object goes to disk as soon as its frame arrives. Only the byte
//! offset of each object is kept, and [`finalize`](DocumentWriter::finalize)
//! appends the page tree, the cross-reference table and the trailer. Memory
//! use is flat in the length of the video.

use std::{
    fs::File,
    io::{BufWriter, Write},
    path::{Path, PathBuf},
};

use pdf_writer::{Chunk, Content, Filter, Finish, Name, Rect, Ref, Str, TextStr};

use crate::{
    configuration::DocumentOptions,
    document::{self, DocumentWriter, OutputFormat},
    error::FramedeckError,
    frame::Frame,
    output_lock::OutputLease,
};

/// Points per pixel (72 / 96).
pub const POINTS_PER_PIXEL: f32 = 0.75;

/// Height of the caption band under each frame, in points.
pub const CAPTION_BAND_PT: f32 = 28.0;

/// Space kept on each side of a caption, in points.
pub const CAPTION_MARGIN_PT: f32 = 8.0;

const CAPTION_FONT_SIZE: f32 = 12.0;
const IMAGE_NAME: Name<'static> = Name(b"Im0");
const FONT_NAME: Name<'static> = Name(b"F1");

const HEADER: &[u8] = b"%PDF-1.7\n%\x80\x80\x80\x80\n";
const CATALOG_ID: Ref = Ref::new(1);
const PAGE_TREE_ID: Ref = Ref::new(2);
const FONT_ID: Ref = Ref::new(3);
const INFO_ID: Ref = Ref::new(4);
const FIRST_FREE_ID: i32 = 5;

/// Writes frames into a PDF, one page each.
///
/// # Example
///
/// ```no_run
/// use framedeck::{DocumentOptions, DocumentWriter, PdfWriter};
///
/// let mut writer = PdfWriter::open("frames.pdf", DocumentOptions::default())?;
/// // writer.add_frame(frame)?;
/// writer.finalize()?;
/// # Ok::<(), framedeck::FramedeckError>(())
/// ```
pub struct PdfWriter {
    path: PathBuf,
    options: DocumentOptions,
    file: Option<BufWriter<File>>,
    written: usize,
    /// Byte offset of each object, indexed by object id.
    offsets: Vec<Option<usize>>,
    pages: Vec<Ref>,
    next_id: i32,
    lease: Option<OutputLease>,
}

impl PdfWriter {
    /// Create the output file and write the document header.
    ///
    /// # Errors
    ///
    /// [`FramedeckError::OutputPathInUse`] or
    /// [`FramedeckError::OutputPathInvalid`].
    pub fn open<P: AsRef<Path>>(path: P, options: DocumentOptions) -> Result<Self, FramedeckError> {
        let path = path.as_ref().to_path_buf();
        let lease = OutputLease::acquire(&path)?;
        let file = document::create_output_file(&path)?;
        log::debug!("Opened PDF writer on {}", lease.path().display());

        let mut writer = Self {
            path,
            options,
            file: Some(BufWriter::new(file)),
            written: 0,
            offsets: vec![None; FIRST_FREE_ID as usize],
            pages: Vec::new(),
            next_id: FIRST_FREE_ID,
            lease: Some(lease),
        };
        writer.write_raw(HEADER)?;
        Ok(writer)
    }

    fn allocate(&mut self) -> Ref {
        let id = Ref::new(self.next_id);
        self.next_id += 1;
        self.offsets.push(None);
        id
    }

    fn write_raw(&mut self, bytes: &[u8]) -> Result<(), FramedeckError> {
        let Some(file) = self.file.as_mut() else {
            return Err(FramedeckError::WriterClosed);
        };
        file.write_all(bytes)
            .map_err(|error| FramedeckError::Encode(format!("failed to write PDF: {error}")))?;
        self.written += bytes.len();
        Ok(())
    }

    /// Append a chunk holding the single object `id`.
    fn write_object(&mut self, id: Ref, chunk: &Chunk) -> Result<(), FramedeckError> {
        let offset = self.written;
        self.write_raw(chunk.as_bytes())?;
        if let Some(slot) = usize::try_from(id.get())
            .ok()
            .and_then(|index| self.offsets.get_mut(index))
        {
            *slot = Some(offset);
        }
        Ok(())
    }

    fn write_trailer(&mut self) -> Result<(), FramedeckError> {
        let size = self.offsets.len();
        let start = self.written;

        let mut table = format!("xref\n0 {size}\n0000000000 65535 f\r\n");
        for offset in self.offsets.iter().skip(1) {
            match offset {
                Some(offset) => table.push_str(&format!("{offset:010} 00000 n\r\n")),
                None => table.push_str("0000000000 65535 f\r\n"),
            }
        }
        table.push_str(&format!(
            "trailer\n<< /Size {size} /Root {root} 0 R /Info {info} 0 R >>\nstartxref\n{start}\n%%EOF\n",
            root = CATALOG_ID.get(),
            info = INFO_ID.get(),
        ));
        self.write_raw(table.as_bytes())
    }
}

impl DocumentWriter for PdfWriter {
    fn format(&self) -> OutputFormat {
        OutputFormat::Pdf
    }

    fn path(&self) -> &Path {
        &self.path
    }

    fn add_frame(&mut self, frame: Frame) -> Result<(), FramedeckError> {
        if self.file.is_none() {
            return Err(FramedeckError::WriterClosed);
        }

        let jpeg = document::encode_jpeg(&frame.image, self.options.jpeg_quality)?;
        let caption = self.options.caption_style.text(frame.index, frame.timestamp);
        let (pixel_width, pixel_height) = (frame.width(), frame.height());
        drop(frame);

        let page_id = self.allocate();
        let image_id = self.allocate();
        let content_id = self.allocate();

        let image_width = pixel_width as f32 * POINTS_PER_PIXEL;
        let image_height = pixel_height as f32 * POINTS_PER_PIXEL;
        let text_width = caption
            .as_deref()
            .map(|text| helvetica_width(text, CAPTION_FONT_SIZE));
        let band = if caption.is_some() { CAPTION_BAND_PT } else { 0.0 };
        let page_width = page_width(image_width, text_width);
        let page_height = image_height + band;

        let mut content = Content::new();
        content.save_state();
        content.transform([
            image_width,
            0.0,
            0.0,
            image_height,
            (page_width - image_width) / 2.0,
            band,
        ]);
        content.x_object(IMAGE_NAME);
        content.restore_state();
        if let (Some(text), Some(text_width)) = (&caption, text_width) {
            let x = (page_width - text_width) / 2.0;
            let y = (band - CAPTION_FONT_SIZE * 0.7) / 2.0;
            content.begin_text();
            content.set_font(FONT_NAME, CAPTION_FONT_SIZE);
            content.next_line(x, y);
            content.show(Str(text.as_bytes()));
            content.end_text();
        }
        let content = content.finish();

        let mut chunk = Chunk::new();
        let mut image = chunk.image_xobject(image_id, &jpeg);
        image.filter(Filter::DctDecode);
        image.width(i32::try_from(pixel_width).unwrap_or(i32::MAX));
        image.height(i32::try_from(pixel_height).unwrap_or(i32::MAX));
        image.color_space().device_rgb();
        image.bits_per_component(8);
        image.finish();
        self.write_object(image_id, &chunk)?;

        let mut chunk = Chunk::new();
        let mut page = chunk.page(page_id);
        page.media_box(Rect::new(0.0, 0.0, page_width, page_height));
        page.parent(PAGE_TREE_ID);
        page.contents(content_id);
        let mut resources = page.resources();
        resources.x_objects().pair(IMAGE_NAME, image_id);
        if caption.is_some() {
            resources.fonts().pair(FONT_NAME, FONT_ID);
        }
        resources.finish();
        page.finish();
        self.write_object(page_id, &chunk)?;

        let mut chunk = Chunk::new();
        chunk.stream(content_id, &content);
        self.write_object(content_id, &chunk)?;

        self.pages.push(page_id);
        log::debug!(
            "PDF page {} ({}x{} px, {} JPEG bytes)",
            self.pages.len(),
            pixel_width,
            pixel_height,
            jpeg.len()
        );
        Ok(())
    }

    fn finalize(&mut self) -> Result<PathBuf, FramedeckError> {
        if self.file.is_none() {
            return Err(FramedeckError::WriterClosed);
        }
        if self.pages.is_empty() {
            self.file = None;
            self.lease = None;
            return Err(FramedeckError::EmptyDocument {
                format: OutputFormat::Pdf,
            });
        }

        let mut chunk = Chunk::new();
        chunk
            .indirect(CATALOG_ID)
            .dict()
            .pair(Name(b"Type"), Name(b"Catalog"))
            .pair(Name(b"Pages"), PAGE_TREE_ID);
        self.write_object(CATALOG_ID, &chunk)?;

        let mut chunk = Chunk::new();
        let page_count = i32::try_from(self.pages.len()).unwrap_or(i32::MAX);
        chunk
            .pages(PAGE_TREE_ID)
            .kids(self.pages.iter().copied())
            .count(page_count);
        self.write_object(PAGE_TREE_ID, &chunk)?;

        let mut chunk = Chunk::new();
        chunk.type1_font(FONT_ID).base_font(Name(b"Helvetica"));
        self.write_object(FONT_ID, &chunk)?;

        let mut chunk = Chunk::new();
        chunk
            .indirect(INFO_ID)
            .dict()
            .pair(Name(b"Producer"), TextStr("framedeck"));
        self.write_object(INFO_ID, &chunk)?;

        self.write_trailer()?;
        let result = match self.file.take() {
            Some(mut file) => file
                .flush()
                .map_err(|error| FramedeckError::Encode(format!("failed to write PDF: {error}"))),
            None => Err(FramedeckError::WriterClosed),
        };
        self.lease = None;
        result?;

        log::info!(
            "Wrote {} ({} pages, {} bytes)",
            self.path.display(),
            self.pages.len(),
            self.written
        );
        Ok(self.path.clone())
    }

    fn frames_written(&self) -> u64 {
        self.pages.len() as u64
    }
}

/// Page width for a frame `image_width` points wide, widened to fit a
/// caption of `text_width` points plus its margins.
fn page_width(image_width: f32, text_width: Option<f32>) -> f32 {
    match text_width {
        Some(text_width) => image_width.max(text_width + 2.0 * CAPTION_MARGIN_PT),
        None => image_width,
    }
}

/// Approximate advance width of `text` in Helvetica at `size` points.
fn helvetica_width(text: &str, size: f32) -> f32 {
    let units: u32 = text
        .chars()
        .map(|c| match c {
            ' ' | ':' | '.' | ',' => 278,
            'F' => 611,
            'r' => 333,
            'm' => 833,
            'i' | 'l' => 222,
            _ => 556,
        })
        .sum();
    units as f32 * size / 1000.0
}
