//! Resolution of user input into a Drive folder ID.

use super::error::{AppError, Result};

const FOLDERS_SEGMENT: &str = "/folders/";

fn is_id_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '-'
}

/// Extract a folder ID from a Drive folder URL or a bare ID.
///
/// Accepts `https://drive.google.com/drive/folders/<ID>`, the `/u/<n>/`
/// variant, trailing query strings, and IDs passed directly.
///
/// # Errors
/// Returns `AppError::InvalidFolderRef` if no ID can be found.
pub fn parse_folder_ref(input: &str) -> Result<String> {
    let input = input.trim();

    if let Some(pos) = input.find(FOLDERS_SEGMENT) {
        let id: String = input[pos + FOLDERS_SEGMENT.len()..]
            .chars()
            .take_while(|c| is_id_char(*c))
            .collect();
        if !id.is_empty() {
            return Ok(id);
        }
    } else if !input.is_empty() && input.chars().all(is_id_char) {
        return Ok(input.to_string());
    }

    Err(AppError::InvalidFolderRef {
        input: input.to_string(),
    })
}
