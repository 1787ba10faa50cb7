// Copyright 2025 JiangLong.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! User-facing diagnostics built from classified errors.

use crate::shared::error::{ErrorKind, KindError};
use regex::Regex;
use std::fmt;
use std::sync::OnceLock;

/// Upper bound on how much raw tool output a diagnostic may carry.
pub const MAX_RAW_OUTPUT_BYTES: usize = 2048;

const REDACTED: &str = "[REDACTED]";

fn secret_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(
            r"(?m)^(\s*-?\s*(?:certificate-authority-data|client-certificate-data|client-key-data|token|password)\s*:\s*).+$",
        )
        .expect("static redaction pattern compiles")
    })
}

/// Short title plus detail, the shape every failure is reported in.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct Diagnostic {
    pub kind: ErrorKind,
    pub summary: String,
    pub detail: String,
}

impl Diagnostic {
    pub fn from_error(operation: &str, err: &KindError) -> Self {
        let kind = err.kind();
        let summary = match kind {
            ErrorKind::InvalidConfiguration => "Invalid Configuration".to_string(),
            ErrorKind::RuntimeUnavailable => "Container Runtime Unavailable".to_string(),
            ErrorKind::AlreadyExists => "Cluster Already Exists".to_string(),
            ErrorKind::NotFound => "Cluster Not Found".to_string(),
            ErrorKind::Timeout => format!("Timed Out During {}", operation),
            ErrorKind::Cancelled => format!("{} Cancelled", operation),
            ErrorKind::UnexpectedEmptyOutput => "Unexpected Empty Output".to_string(),
            ErrorKind::Unknown => format!("Failed To {}", operation),
        };

        let mut detail = format!("[{}] {}", kind, err);
        if let Some(raw) = err.raw_output().filter(|raw| !raw.trim().is_empty()) {
            detail.push_str("\n\nkind output:\n");
            detail.push_str(&sanitize_output(raw));
        }

        Self {
            kind,
            summary,
            detail,
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.summary, self.detail)
    }
}

/// Redacts kubeconfig credential values and truncates to
/// [`MAX_RAW_OUTPUT_BYTES`] on a char boundary.
pub fn sanitize_output(raw: &str) -> String {
    let redacted = secret_pattern().replace_all(raw.trim_end(), format!("${{1}}{}", REDACTED));
    truncate(&redacted, MAX_RAW_OUTPUT_BYTES)
}

fn truncate(text: &str, max_bytes: usize) -> String {
    if text.len() <= max_bytes {
        return text.to_string();
    }
    let mut end = max_bytes;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}... (truncated {} bytes)", &text[..end], text.len() - end)
}
