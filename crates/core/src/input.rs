//! CDP input and capture primitives dispatched at a session's active
//! tab. All functions take a cloned page handle so callers never hold
//! the session lock across these awaits.

use std::time::Duration;

use chromiumoxide::cdp::browser_protocol::input::{
    DispatchKeyEventParams, DispatchKeyEventType, DispatchMouseEventParams,
    DispatchMouseEventType, InsertTextParams, MouseButton,
};
use chromiumoxide::cdp::browser_protocol::page::CaptureScreenshotFormat;
use chromiumoxide::page::{Page, ScreenshotParams};
use periscope_protocol::Viewport;
use url::Url;

use crate::error::{Error, Result};

/// Converts normalized coordinates to absolute pixels. Values outside
/// [0, 1] are converted as-is and simply land outside the viewport.
pub fn to_pixels(x: f64, y: f64, viewport: Viewport) -> (f64, f64) {
    (x * f64::from(viewport.width), y * f64::from(viewport.height))
}

/// Pointer click at normalized viewport coordinates.
pub async fn click(page: &Page, viewport: Viewport, x: f64, y: f64) -> Result<()> {
    let (px, py) = to_pixels(x, y, viewport);

    let press = DispatchMouseEventParams::builder()
        .r#type(DispatchMouseEventType::MousePressed)
        .x(px)
        .y(py)
        .button(MouseButton::Left)
        .click_count(1)
        .build()
        .map_err(Error::InvalidInput)?;
    page.execute(press).await?;

    let release = DispatchMouseEventParams::builder()
        .r#type(DispatchMouseEventType::MouseReleased)
        .x(px)
        .y(py)
        .button(MouseButton::Left)
        .click_count(1)
        .build()
        .map_err(Error::InvalidInput)?;
    page.execute(release).await?;

    Ok(())
}

/// Inserts text one character at a time with a small delay to emulate
/// human typing.
pub async fn type_text(page: &Page, text: &str, delay: Duration) -> Result<()> {
    for ch in text.chars() {
        page.execute(InsertTextParams::new(ch.to_string())).await?;
        tokio::time::sleep(delay).await;
    }
    Ok(())
}

/// Raw key transition without text semantics.
pub async fn key_event(page: &Page, key: &str, down: bool) -> Result<()> {
    let kind = if down {
        DispatchKeyEventType::KeyDown
    } else {
        DispatchKeyEventType::KeyUp
    };
    let event = DispatchKeyEventParams::builder()
        .r#type(kind)
        .key(key)
        .build()
        .map_err(Error::InvalidInput)?;
    page.execute(event).await?;
    Ok(())
}

/// Wheel delta dispatched at the viewport center.
pub async fn scroll(page: &Page, viewport: Viewport, delta_x: f64, delta_y: f64) -> Result<()> {
    let (cx, cy) = to_pixels(0.5, 0.5, viewport);
    let wheel = DispatchMouseEventParams::builder()
        .r#type(DispatchMouseEventType::MouseWheel)
        .x(cx)
        .y(cy)
        .delta_x(delta_x)
        .delta_y(delta_y)
        .build()
        .map_err(Error::InvalidInput)?;
    page.execute(wheel).await?;
    Ok(())
}

/// Navigates the page to an already-normalized URL.
pub async fn goto(page: &Page, url: &Url) -> Result<()> {
    page.goto(url.as_str()).await?;
    Ok(())
}

/// Captures the visible viewport (never the full page, to bound frame
/// cost) as a JPEG at the given quality.
pub async fn capture_jpeg(page: &Page, quality: i64) -> Result<Vec<u8>> {
    let params = ScreenshotParams::builder()
        .format(CaptureScreenshotFormat::Jpeg)
        .quality(quality)
        .full_page(false)
        .build();
    page.screenshot(params)
        .await
        .map_err(|e| Error::Capture(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    const VIEWPORT: Viewport = Viewport {
        width: 1024,
        height: 576,
    };

    #[test]
    fn normalized_coordinates_scale_exactly() {
        assert_eq!(to_pixels(0.0, 0.0, VIEWPORT), (0.0, 0.0));
        assert_eq!(to_pixels(1.0, 1.0, VIEWPORT), (1024.0, 576.0));
        assert_eq!(to_pixels(0.5, 0.5, VIEWPORT), (512.0, 288.0));
        assert_eq!(to_pixels(0.25, 0.75, VIEWPORT), (256.0, 432.0));
    }

    #[test]
    fn out_of_range_coordinates_are_not_clamped() {
        assert_eq!(to_pixels(1.5, -0.5, VIEWPORT), (1536.0, -288.0));
    }
}
