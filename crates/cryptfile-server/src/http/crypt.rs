//! `POST /crypt` - encrypt or decrypt an uploaded file

use axum::{
    extract::{multipart::MultipartError, Multipart, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};
use tracing::{debug, info, warn};

use super::error::AppError;
use super::AppState;
use cryptfile_core::crypto::MIN_ENVELOPE_LEN;
use cryptfile_core::{CipherError, CryptAction, Limits};

/// Download name used when the upload carries no filename
const FALLBACK_FILENAME: &str = "file";

/// Room for multipart boundaries, part headers and the password/action fields
const FORM_OVERHEAD: usize = 16 * 1024;

/// Request body ceiling for `/crypt`: the largest envelope plus form overhead
pub(super) fn body_limit(limits: &Limits) -> usize {
    limits
        .max_content_size
        .saturating_add(MIN_ENVELOPE_LEN)
        .saturating_add(FORM_OVERHEAD)
}

/// Largest file accepted for `action`. Decrypt allows for the envelope
/// overhead so anything encrypted here can be decrypted here.
fn max_file_size(limits: &Limits, action: CryptAction) -> usize {
    match action {
        CryptAction::Encrypt => limits.max_content_size,
        CryptAction::Decrypt => limits.max_content_size.saturating_add(MIN_ENVELOPE_LEN),
    }
}

/// Uploaded file part
struct Upload {
    filename: Option<String>,
    data: Vec<u8>,
}

/// Fields of the multipart form, as received
#[derive(Default)]
struct CryptForm {
    file: Option<Upload>,
    password: Option<String>,
    action: Option<String>,
}

impl CryptForm {
    async fn read(mut multipart: Multipart) -> Result<Self, AppError> {
        let mut form = CryptForm::default();

        while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
            let name = field.name().map(str::to_owned);
            match name.as_deref() {
                Some("file") => {
                    let filename = field.file_name().map(str::to_owned);
                    let data = field.bytes().await.map_err(multipart_error)?;
                    form.file = Some(Upload {
                        filename,
                        data: data.to_vec(),
                    });
                }
                Some("password") => {
                    form.password = Some(field.text().await.map_err(multipart_error)?);
                }
                Some("action") => {
                    form.action = Some(field.text().await.map_err(multipart_error)?);
                }
                other => debug!("Ignoring multipart field {:?}", other),
            }
        }

        Ok(form)
    }
}

fn multipart_error(err: MultipartError) -> AppError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        AppError::PayloadTooLarge
    } else {
        AppError::BadRequest(err.body_text())
    }
}

pub async fn crypt(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Response, AppError> {
    let form = CryptForm::read(multipart).await?;

    let file = form
        .file
        .ok_or_else(|| CipherError::MissingInput("file".to_string()))?;
    let password = form
        .password
        .filter(|p| !p.is_empty())
        .ok_or_else(|| CipherError::MissingInput("password".to_string()))?;
    let action: CryptAction = form
        .action
        .ok_or_else(|| CipherError::MissingInput("action".to_string()))?
        .parse()?;

    let size = file.data.len();
    let max = max_file_size(&state.limits, action);
    if size > max {
        warn!(%action, size, max, "Rejected oversized upload");
        return Err(AppError::PayloadTooLarge);
    }

    let output = state.cipher.apply(action, file.data, &password).await?;
    info!(%action, input_bytes = size, output_bytes = output.len(), "crypt request completed");

    let filename = file
        .filename
        .filter(|name| !name.is_empty())
        .unwrap_or_else(|| FALLBACK_FILENAME.to_string());

    Ok((
        [
            (header::CONTENT_TYPE, "application/octet-stream".to_string()),
            (header::CONTENT_DISPOSITION, content_disposition(&filename)),
        ],
        output,
    )
        .into_response())
}

/// Build an attachment disposition that keeps the original name.
///
/// `filename` carries an ASCII approximation; `filename*` carries the exact
/// UTF-8 name when it differs.
fn content_disposition(filename: &str) -> String {
    let ascii: String = filename
        .chars()
        .map(|c| match c {
            '"' | '\\' => '_',
            c if c.is_ascii() && !c.is_ascii_control() => c,
            _ => '_',
        })
        .collect();

    if ascii == filename {
        format!("attachment; filename=\"{ascii}\"")
    } else {
        format!(
            "attachment; filename=\"{ascii}\"; filename*=UTF-8''{}",
            percent_encode(filename)
        )
    }
}

/// RFC 5987 `attr-char` percent encoding
fn percent_encode(value: &str) -> String {
    let mut out = String::with_capacity(value.len() * 3);
    for byte in value.bytes() {
        match byte {
            b'a'..=b'z'
            | b'A'..=b'Z'
            | b'0'..=b'9'
            | b'!'
            | b'#'
            | b'$'
            | b'&'
            | b'+'
            | b'-'
            | b'.'
            | b'^'
            | b'_'
            | b'`'
            | b'|'
            | b'~' => out.push(byte as char),
            _ => out.push_str(&format!("%{byte:02X}")),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decrypt_allows_envelope_overhead() {
        let limits = Limits {
            max_content_size: 4096,
            ..Limits::default()
        };

        assert_eq!(max_file_size(&limits, CryptAction::Encrypt), 4096);
        assert_eq!(
            max_file_size(&limits, CryptAction::Decrypt),
            4096 + MIN_ENVELOPE_LEN
        );
        assert!(body_limit(&limits) > max_file_size(&limits, CryptAction::Decrypt));
    }

    #[test]
    fn test_plain_filename() {
        assert_eq!(
            content_disposition("report.pdf"),
            "attachment; filename=\"report.pdf\""
        );
    }

    #[test]
    fn test_quotes_are_replaced() {
        assert_eq!(
            content_disposition("a\"b.txt"),
            "attachment; filename=\"a_b.txt\"; filename*=UTF-8''a%22b.txt"
        );
    }

    #[test]
    fn test_unicode_filename() {
        assert_eq!(
            content_disposition("été.txt"),
            "attachment; filename=\"_t_.txt\"; filename*=UTF-8''%C3%A9t%C3%A9.txt"
        );
    }
}
