use anyhow::Result;

/// Text recognition over PNG bytes.
///
/// Uses the Windows.Media.Ocr engine; other platforms report the backend as
/// unavailable so detections fail at the extraction stage.
#[derive(Debug, Clone)]
pub struct OcrReader {
    language: String,
}

impl OcrReader {
    /// `language` is a BCP-47 tag such as "en"
    pub fn new(language: impl Into<String>) -> Self {
        Self {
            language: language.into(),
        }
    }

    pub fn language(&self) -> &str {
        &self.language
    }

    pub async fn recognize(&self, png: Vec<u8>) -> Result<String> {
        let language = self.language.clone();
        let text = tokio::task::spawn_blocking(move || recognize_blocking(&language, &png)).await??;
        tracing::debug!(chars = text.len(), "OCR finished");
        Ok(text)
    }
}

#[cfg(windows)]
fn recognize_blocking(language: &str, png: &[u8]) -> Result<String> {
    use anyhow::Context;
    use windows::{
        Globalization::Language,
        Graphics::Imaging::BitmapDecoder,
        Media::Ocr::OcrEngine,
        Storage::Streams::{DataWriter, InMemoryRandomAccessStream},
        core::HSTRING,
    };

    let _com = crate::com::ComGuard::initialize()?;

    let language =
        Language::CreateLanguage(&HSTRING::from(language)).context("Failed to create language")?;
    let engine = OcrEngine::TryCreateFromLanguage(&language)
        .context("Failed to create OCR engine for language")?;

    let stream = InMemoryRandomAccessStream::new().context("Failed to create stream")?;
    let writer = DataWriter::CreateDataWriter(&stream).context("Failed to create writer")?;
    writer
        .WriteBytes(png)
        .context("Failed to write image bytes")?;
    writer
        .StoreAsync()
        .context("Failed to store async")?
        .get()
        .context("Failed to store data")?;
    writer.FlushAsync().context("Failed to flush")?.get()?;
    stream.Seek(0).context("Failed to seek")?;

    let decoder = BitmapDecoder::CreateAsync(&stream)
        .context("Failed to create decoder async")?
        .get()
        .context("Failed to get decoder")?;
    let bitmap = decoder
        .GetSoftwareBitmapAsync()
        .context("Failed to get bitmap async")?
        .get()
        .context("Failed to get software bitmap")?;

    let result = engine
        .RecognizeAsync(&bitmap)
        .context("Failed to recognize async")?
        .get()
        .context("Failed to get OCR result")?;

    // One entry per recognized line
    let mut lines = Vec::new();
    for line in result.Lines().context("Failed to get OCR lines")? {
        lines.push(line.Text().context("Failed to get line text")?.to_string());
    }
    Ok(lines.join("\n"))
}

#[cfg(not(windows))]
fn recognize_blocking(language: &str, _png: &[u8]) -> Result<String> {
    anyhow::bail!("no OCR backend for language '{language}' on this platform")
}
