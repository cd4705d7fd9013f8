use std::path::Path;
use std::path::PathBuf;

use base64::Engine;
use base64::prelude::BASE64_STANDARD;
use chrono::Utc;

use crate::Result;
use crate::actions::ElementScreenshotParams;
use crate::actions::SavePdfParams;
use crate::actions::ScreenshotParams;
use crate::driver::PageHandle;
use crate::driver::PdfMargins;
use crate::driver::PdfOptions;
use crate::driver::ScreenshotArea;
use crate::driver::Target;

pub async fn screenshot(
    page: &dyn PageHandle,
    params: &ScreenshotParams,
    element_timeout_ms: u64,
) -> Result<Vec<String>> {
    let area = match &params.selector {
        Some(selector) => ScreenshotArea::Element(Target::Css(selector.clone())),
        None if params.full_page => ScreenshotArea::FullPage,
        None => ScreenshotArea::Viewport {
            width: params.width,
            height: params.height,
        },
    };
    let png = page.screenshot(&area, element_timeout_ms).await?;

    let mut messages = Vec::new();
    if params.save_png {
        let stamp = Utc::now().format("%Y-%m-%dT%H-%M-%S%.3fZ");
        let dir = downloads_dir(params.downloads_dir.as_deref());
        let path = dir.join(format!("{}-{stamp}.png", params.name));
        write_file(&path, &png).await?;
        messages.push(format!("Screenshot saved to: {}", path.display()));
    }
    if params.store_base64 {
        messages.push(format!("Screenshot captured: {}", params.name));
        messages.push(BASE64_STANDARD.encode(&png));
    }
    if messages.is_empty() {
        messages.push(format!("Screenshot captured: {}", params.name));
    }
    Ok(messages)
}

pub async fn element_screenshot(
    page: &dyn PageHandle,
    params: &ElementScreenshotParams,
) -> Result<Vec<String>> {
    let area = ScreenshotArea::Element(Target::Css(params.selector.clone()));
    let png = page.screenshot(&area, params.timeout).await?;
    let path = PathBuf::from(&params.path);
    write_file(&path, &png).await?;
    Ok(vec![format!("Screenshot saved to: {}", path.display())])
}

pub async fn save_pdf(page: &dyn PageHandle, params: &SavePdfParams) -> Result<Vec<String>> {
    let options = PdfOptions {
        format: params.format.clone(),
        print_background: params.print_background,
        margins: params.margin.as_ref().map(|m| PdfMargins {
            top: m.top.clone(),
            right: m.right.clone(),
            bottom: m.bottom.clone(),
            left: m.left.clone(),
        }),
    };
    let bytes = page.pdf(&options).await?;
    let path = PathBuf::from(&params.output_path).join(&params.filename);
    write_file(&path, &bytes).await?;
    Ok(vec![format!("Saved page as PDF: {}", path.display())])
}

fn downloads_dir(override_dir: Option<&str>) -> PathBuf {
    if let Some(dir) = override_dir {
        return PathBuf::from(dir);
    }
    dirs::download_dir()
        .or_else(|| dirs::home_dir().map(|home| home.join("Downloads")))
        .unwrap_or_else(|| PathBuf::from("."))
}

async fn write_file(path: &Path, bytes: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        tokio::fs::create_dir_all(parent).await?;
    }
    tokio::fs::write(path, bytes).await?;
    Ok(())
}
