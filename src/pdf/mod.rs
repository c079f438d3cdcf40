use anyhow::{Context, Result, anyhow};
use std::fs;
use std::path::Path;
use std::process::Command;
use tempfile::tempdir;

/// Renders every page of a PDF to PNG bytes at the given resolution,
/// using whichever of mutool or pdftoppm is installed.
pub fn rasterize_pdf(input: &Path, dpi: u32) -> Result<Vec<Vec<u8>>> {
    let dir = tempdir().context("failed to create temp dir for rendered pages")?;

    if command_exists("mutool") {
        let output = Command::new("mutool")
            .arg("draw")
            .arg("-r")
            .arg(dpi.to_string())
            .arg("-o")
            .arg(dir.path().join("page-%03d.png"))
            .arg(input)
            .output()
            .context("failed to run mutool draw")?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(anyhow!("mutool draw failed: {}", stderr.trim()));
        }
    } else if command_exists("pdftoppm") {
        let output = Command::new("pdftoppm")
            .arg("-png")
            .arg("-r")
            .arg(dpi.to_string())
            .arg(input)
            .arg(dir.path().join("page"))
            .output()
            .context("failed to run pdftoppm")?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(anyhow!("pdftoppm failed: {}", stderr.trim()));
        }
    } else {
        return Err(anyhow!(
            "pdf rendering requires mutool or pdftoppm (install mupdf or poppler)"
        ));
    }

    let mut entries: Vec<_> = fs::read_dir(dir.path())
        .context("failed to read rendered page directory")?
        .filter_map(|entry| entry.ok())
        .collect();
    entries.sort_by_key(|entry| entry.path());

    let mut pages = Vec::new();
    for entry in entries {
        let path = entry.path();
        let is_page = path
            .file_name()
            .and_then(|name| name.to_str())
            .map(|name| name.starts_with("page"))
            .unwrap_or(false)
            && path
                .extension()
                .and_then(|ext| ext.to_str())
                .map(|ext| ext.eq_ignore_ascii_case("png"))
                .unwrap_or(false);
        if is_page {
            let bytes = fs::read(&path).context("failed to read rendered page")?;
            pages.push(bytes);
        }
    }
    Ok(pages)
}

/// Packs rendered page images back into a single PDF. Each page keeps the
/// physical size of the original by embedding the image at the same DPI
/// it was rasterized at.
pub fn assemble_pdf(pages: &[Vec<u8>], dpi: u32) -> Result<Vec<u8>> {
    use printpdf::{Image, ImageTransform, Mm, PdfDocument};

    let first = pages
        .first()
        .ok_or_else(|| anyhow!("no pages to assemble"))?;
    let first_image = decode_page(first)?;
    let (doc, page, layer) = PdfDocument::new(
        "translated",
        Mm(px_to_mm(first_image.width(), dpi)),
        Mm(px_to_mm(first_image.height(), dpi)),
        "Layer 1",
    );

    let mut placements = vec![(page, layer, first_image)];
    for (index, bytes) in pages.iter().enumerate().skip(1) {
        let image = decode_page(bytes)?;
        let (page, layer) = doc.add_page(
            Mm(px_to_mm(image.width(), dpi)),
            Mm(px_to_mm(image.height(), dpi)),
            format!("Layer {}", index + 1),
        );
        placements.push((page, layer, image));
    }

    for (page, layer, image) in placements {
        let current_layer = doc.get_page(page).get_layer(layer);
        let pdf_image = Image::from_dynamic_image(&image);
        let transform = ImageTransform {
            translate_x: Some(Mm(0.0)),
            translate_y: Some(Mm(0.0)),
            rotate: None,
            scale_x: Some(1.0),
            scale_y: Some(1.0),
            dpi: Some(dpi as f32),
        };
        pdf_image.add_to_layer(current_layer, transform);
    }

    let mut buffer = Vec::new();
    {
        let mut writer = std::io::BufWriter::new(&mut buffer);
        doc.save(&mut writer).context("failed to write pdf")?;
    }
    Ok(buffer)
}

fn decode_page(bytes: &[u8]) -> Result<printpdf::image_crate::DynamicImage> {
    printpdf::image_crate::load_from_memory(bytes).context("failed to decode rendered page")
}

fn command_exists(cmd: &str) -> bool {
    match Command::new(cmd).arg("-h").output() {
        Ok(_) => true,
        Err(err) => err.kind() != std::io::ErrorKind::NotFound,
    }
}

fn px_to_mm(px: u32, dpi: u32) -> f32 {
    let inches = px as f32 / dpi.max(1) as f32;
    inches * 25.4
}
