//! Text extraction for uploaded files.
//!
//! Wraps the `pdf-extract` crate so that corrupt files, parser errors, and
//! parser panics all surface as `ExtractError::Unreadable`.

use bytes::Bytes;
use thiserror::Error;
use tracing::warn;

/// An uploaded file as received from the multipart body.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub bytes: Bytes,
    pub filename: Option<String>,
    pub content_type: Option<String>,
}

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("Unsupported file type")]
    UnsupportedMedia,

    #[error("Could not read PDF file")]
    Unreadable,

    #[error("No extractable text in file")]
    NoText,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    PlainText,
    Pdf,
}

/// Classifies by filename extension first, then by declared content type.
pub fn classify(filename: Option<&str>, content_type: Option<&str>) -> Option<MediaKind> {
    let by_extension = filename
        .and_then(|name| name.rsplit_once('.'))
        .and_then(|(_, ext)| match ext.to_ascii_lowercase().as_str() {
            "txt" => Some(MediaKind::PlainText),
            "pdf" => Some(MediaKind::Pdf),
            _ => None,
        });

    by_extension.or_else(|| {
        let essence = content_type?
            .split(';')
            .next()
            .unwrap_or_default()
            .trim()
            .to_ascii_lowercase();
        match essence.as_str() {
            "text/plain" => Some(MediaKind::PlainText),
            "application/pdf" => Some(MediaKind::Pdf),
            _ => None,
        }
    })
}

/// Converts an uploaded file into a single non-blank text string.
pub async fn extract_text(file: UploadedFile) -> Result<String, ExtractError> {
    let kind = classify(file.filename.as_deref(), file.content_type.as_deref())
        .ok_or(ExtractError::UnsupportedMedia)?;

    let text = match kind {
        MediaKind::PlainText => String::from_utf8_lossy(&file.bytes).into_owned(),
        MediaKind::Pdf => {
            let bytes = file.bytes;
            // pdf-extract is CPU-bound and may panic on malformed input;
            // a panic in the blocking task comes back as a JoinError.
            let extracted =
                tokio::task::spawn_blocking(move || pdf_extract::extract_text_from_mem(&bytes))
                    .await;
            match extracted {
                Ok(Ok(raw)) => join_pages(&raw),
                Ok(Err(e)) => {
                    warn!("PDF extraction failed: {e:?}");
                    return Err(ExtractError::Unreadable);
                }
                Err(e) => {
                    warn!("PDF extraction panicked: {e}");
                    return Err(ExtractError::Unreadable);
                }
            }
        }
    };

    if text.trim().is_empty() {
        return Err(ExtractError::NoText);
    }
    Ok(text)
}

/// Trims each page (pages are separated by form feeds), joins them with
/// newlines and trims the result. Blank pages are dropped.
fn join_pages(raw: &str) -> String {
    raw.split('\u{000C}')
        .map(str::trim)
        .filter(|page| !page.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
pub mod testing {
    /// Builds a single-page PDF with an empty content stream, computing the
    /// xref offsets as objects are written.
    pub fn blank_pdf() -> Vec<u8> {
        let objects = [
            "<< /Type /Catalog /Pages 2 0 R >>".to_string(),
            "<< /Type /Pages /Kids [3 0 R] /Count 1 >>".to_string(),
            "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 612 792] /Resources << >> /Contents 4 0 R >>"
                .to_string(),
            "<< /Length 0 >>\nstream\n\nendstream".to_string(),
        ];

        let mut out = b"%PDF-1.4\n".to_vec();
        let mut offsets = Vec::with_capacity(objects.len());
        for (i, body) in objects.iter().enumerate() {
            offsets.push(out.len());
            out.extend_from_slice(format!("{} 0 obj\n{}\nendobj\n", i + 1, body).as_bytes());
        }

        let xref_start = out.len();
        out.extend_from_slice(format!("xref\n0 {}\n", objects.len() + 1).as_bytes());
        out.extend_from_slice(b"0000000000 65535 f \n");
        for offset in offsets {
            out.extend_from_slice(format!("{offset:010} 00000 n \n").as_bytes());
        }
        out.extend_from_slice(
            format!(
                "trailer\n<< /Size {} /Root 1 0 R >>\nstartxref\n{}\n%%EOF\n",
                objects.len() + 1,
                xref_start
            )
            .as_bytes(),
        );
        out
    }
}
