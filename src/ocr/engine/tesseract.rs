use anyhow::{Context, Result, anyhow};
use std::path::Path;
use std::process::Command;
use tracing::warn;

pub fn list_tesseract_languages() -> Result<Vec<String>> {
    let output = Command::new("tesseract")
        .arg("--list-langs")
        .output()
        .with_context(|| "failed to run tesseract --list-langs")?;
    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(anyhow!("tesseract --list-langs failed: {}", stderr.trim()));
    }
    let stdout = String::from_utf8_lossy(&output.stdout);
    let mut langs = Vec::new();
    for (idx, line) in stdout.lines().enumerate() {
        // First line is the "List of available languages" banner.
        if idx == 0 {
            continue;
        }
        let value = line.trim();
        if !value.is_empty() {
            langs.push(value.to_string());
        }
    }
    Ok(langs)
}

/// Validates the requested language packs against the installed ones.
/// Accepts `+`, `,` or space separated lists and returns the tesseract
/// `lang+lang` form. Unknown packs are dropped with a warning as long as at
/// least one remains.
pub(super) fn normalize_languages(requested: &str) -> Result<String> {
    let trimmed = requested.trim();
    if trimmed.is_empty() {
        return Err(anyhow!("ocr languages is empty"));
    }

    let available = match list_tesseract_languages() {
        Ok(list) => list,
        // tesseract missing or too old to list; let the real run report it
        Err(_) => return Ok(trimmed.to_string()),
    };

    let mut chosen = Vec::new();
    let mut missing = Vec::new();
    for raw in trimmed.split(['+', ',', ' ']) {
        let lang = raw.trim();
        if lang.is_empty() {
            continue;
        }
        if available.iter().any(|value| value == lang) {
            chosen.push(lang.to_string());
        } else {
            missing.push(lang.to_string());
        }
    }

    if chosen.is_empty() {
        return Err(anyhow!(
            "ocr language(s) not available: {} (available: {})",
            missing.join(", "),
            available.join(", ")
        ));
    }
    if !missing.is_empty() {
        warn!(
            "ocr language(s) not installed, continuing without: {}",
            missing.join(", ")
        );
    }

    Ok(chosen.join("+"))
}

pub(super) fn run_tesseract(
    path: &Path,
    languages: &str,
    format: &str,
    dpi: u32,
) -> Result<String> {
    let output = Command::new("tesseract")
        .arg(path)
        .arg("stdout")
        .arg("-l")
        .arg(languages)
        .arg("--oem")
        .arg("1")
        .arg("--psm")
        .arg("3")
        .arg("--dpi")
        .arg(dpi.to_string())
        .arg(format)
        .output()
        .with_context(|| "failed to run tesseract (is it installed?)")?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(anyhow!("tesseract failed: {}", stderr.trim()));
    }
    Ok(String::from_utf8_lossy(&output.stdout).to_string())
}
