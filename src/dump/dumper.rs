//! Saves each page element of a paginated viewer to its own PNG.

use std::path::PathBuf;

use tracing::{debug, info, warn};

use crate::browser::{Browser, ImageFormat, Tab, WaitOptions};
use crate::error::{Error, Result};

use super::config::DumpConfig;

// ============================================================================
// Types
// ============================================================================

/// Summary of a finished dump.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DumpReport {
    /// Tab URL at attach time.
    pub url: String,
    /// Files written, in page order.
    pub files: Vec<PathBuf>,
}

// ============================================================================
// PageDumper
// ============================================================================

/// Attaches to a running browser and screenshots one page element at a time.
#[derive(Debug, Clone)]
pub struct PageDumper {
    config: DumpConfig,
}

impl PageDumper {
    /// Creates a dumper.
    ///
    /// # Errors
    ///
    /// - [`Error::Config`](crate::Error::Config) if `config` is invalid
    pub fn new(config: DumpConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    /// Returns the configuration.
    #[inline]
    #[must_use]
    pub fn config(&self) -> &DumpConfig {
        &self.config
    }

    /// Connects, dumps every page, and disconnects.
    ///
    /// Any error ends the run. Files already written are left in place.
    ///
    /// # Errors
    ///
    /// - [`Error::TabNotFound`](crate::Error::TabNotFound) if no tab URL matches
    /// - [`Error::Timeout`](crate::Error::Timeout) if a page or the control never appears
    pub async fn run(&self) -> Result<DumpReport> {
        let browser = Browser::connect(&self.config.endpoint).await?;

        let result = match browser.find_tab(&self.config.url_pattern).await {
            Ok(tab) => self.dump(&tab).await,
            Err(e) => Err(e),
        };

        browser.disconnect().await;
        result
    }

    /// Dumps every page from an already attached tab.
    pub async fn dump(&self, tab: &Tab) -> Result<DumpReport> {
        let config = &self.config;
        info!(url = tab.url(), pages = config.page_count, "Dumping pages");

        tokio::fs::create_dir_all(&config.output_dir).await?;

        let wait = WaitOptions::default().with_timeout(config.wait_timeout());
        let page_down = tab
            .wait_for_element(&config.page_down_locator(), wait)
            .await?;

        let end = config.end_index().ok_or_else(|| {
            Error::config(format!(
                "Page range {} + {} exceeds the index range",
                config.start_index, config.page_count
            ))
        })?;
        let mut files = Vec::new();

        for index in config.start_index..end {
            let page = tab
                .wait_for_element(&config.page_locator(index), wait.visible())
                .await?;
            page.scroll_into_view().await?;

            let bytes = page.screenshot(ImageFormat::Png, 1.0).await?;
            let path = config.page_path(index);
            tokio::fs::write(&path, &bytes).await?;
            debug!(index, path = %path.display(), bytes = bytes.len(), "Saved page");

            if let Err(e) = page.release().await {
                warn!(index, error = %e, "Failed to release page handle");
            }

            page_down.click().await?;
            if !config.step_delay().is_zero() {
                tokio::time::sleep(config.step_delay()).await;
            }

            files.push(path);
            info!(page = index + 1, last = end, "Dumped page");
        }

        Ok(DumpReport {
            url: tab.url().to_string(),
            files,
        })
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use base64::Engine;
    use base64::engine::general_purpose::STANDARD as Base64Standard;
    use futures_util::{SinkExt, StreamExt};
    use image::{ExtendedColorType, ImageEncoder, Rgb, RgbImage};
    use serde_json::{Value, json};
    use tokio::net::TcpListener;
    use tokio_tungstenite::tungstenite::Message;


    fn tiny_png() -> String {
        let img = RgbImage::from_pixel(2, 2, Rgb([255, 0, 0]));
        let mut buf = Vec::new();
        image::codecs::png::PngEncoder::new(&mut buf)
            .write_image(img.as_raw(), 2, 2, ExtendedColorType::Rgb8)
            .expect("encode");
        Base64Standard.encode(buf)
    }

    /// Fake browser with one viewer tab.
    ///
    /// Every element exists except lookups mentioning `missing`. Counts
    /// `mousePressed` events in `clicks`.
    async fn spawn_viewer(clicks: Arc<AtomicUsize>, missing: Option<&'static str>) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let addr = listener.local_addr().expect("addr");
        let png = tiny_png();

        tokio::spawn(async move {
            let (stream, _) = listener.accept().await.expect("accept");
            let mut ws = tokio_tungstenite::accept_async(stream)
                .await
                .expect("handshake");
            let mut next_object = 0u32;

            while let Some(Ok(Message::Text(text))) = ws.next().await {
                let request: Value = serde_json::from_str(&text).expect("request json");
                let params = &request["params"];
                let result = match request["method"].as_str().unwrap_or_default() {
                    "Target.getTargets" => json!({"targetInfos": [{
                        "targetId": "T1", "type": "page", "title": "AUD",
                        "url": "https://reader.example.com/aud_etextbook_url", "attached": false
                    }]}),
                    "Target.attachToTarget" => json!({"sessionId": "S1"}),
                    "Runtime.evaluate"
                        if missing.is_some_and(|m| {
                            params["expression"].as_str().unwrap_or_default().contains(m)
                        }) =>
                    {
                        json!({"result": {"type": "object", "subtype": "null", "value": null}})
                    }
                    "Runtime.evaluate" => {
                        next_object += 1;
                        json!({"result": {"type": "object", "subtype": "node",
                                          "objectId": format!("obj-{next_object}")}})
                    }
                    "Runtime.callFunctionOn" => {
                        let declaration = params["functionDeclaration"].as_str().unwrap_or_default();
                        if declaration.contains("getBoundingClientRect") {
                            json!({"result": {"type": "object",
                                              "value": {"x": 5, "y": 5, "width": 20, "height": 30}}})
                        } else {
                            json!({"result": {"type": "undefined"}})
                        }
                    }
                    "Page.captureScreenshot" => json!({"data": png}),
                    "Input.dispatchMouseEvent" => {
                        if params["type"] == "mousePressed" {
                            clicks.fetch_add(1, Ordering::SeqCst);
                        }
                        json!({})
                    }
                    _ => json!({}),
                };
                let reply = json!({"id": request["id"], "result": result});
                if ws.send(Message::Text(reply.to_string().into())).await.is_err() {
                    break;
                }
            }
        });

        format!("ws://{addr}")
    }

    #[tokio::test]
    async fn test_dump_writes_one_file_per_page() {
        let clicks = Arc::new(AtomicUsize::new(0));
        let endpoint = spawn_viewer(clicks.clone(), None).await;
        let dir = tempfile::tempdir().expect("tempdir");
        let out = dir.path().join("aud");

        let config = DumpConfig::new("aud_etextbook_url", &out, 3)
            .with_endpoint(endpoint)
            .with_step_delay(Duration::ZERO);
        let report = PageDumper::new(config).expect("dumper").run().await.expect("run");

        assert_eq!(report.files, vec![out.join("0.png"), out.join("1.png"), out.join("2.png")]);
        for file in &report.files {
            let bytes = std::fs::read(file).expect("read page");
            assert!(bytes.starts_with(b"\x89PNG"));
        }
        assert_eq!(clicks.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_dump_tab_not_found() {
        let endpoint = spawn_viewer(Arc::new(AtomicUsize::new(0)), None).await;
        let dir = tempfile::tempdir().expect("tempdir");

        let config = DumpConfig::new("far_etextbook_url", dir.path(), 3).with_endpoint(endpoint);
        let err = PageDumper::new(config).expect("dumper").run().await.unwrap_err();
        assert!(matches!(err, Error::TabNotFound { .. }));
    }

    #[tokio::test]
    async fn test_dump_stops_when_page_never_appears() {
        let clicks = Arc::new(AtomicUsize::new(0));
        let endpoint = spawn_viewer(clicks.clone(), Some("#div-lecture-1.")).await;
        let dir = tempfile::tempdir().expect("tempdir");
        let out = dir.path().join("aud");

        let config = DumpConfig::new("aud_etextbook_url", &out, 3)
            .with_endpoint(endpoint)
            .with_step_delay(Duration::ZERO)
            .with_wait_timeout(Duration::from_millis(250));
        let err = PageDumper::new(config).expect("dumper").run().await.unwrap_err();

        assert!(matches!(err, Error::Timeout { .. }), "unexpected error: {err}");
        assert!(out.join("0.png").exists());
        assert!(!out.join("1.png").exists());
        assert!(!out.join("2.png").exists());
        assert_eq!(clicks.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_invalid_config_rejected() {
        assert!(PageDumper::new(DumpConfig::default()).is_err());
    }

    #[test]
    fn test_overflowing_page_range_rejected() {
        let dir = tempfile::tempdir().expect("tempdir");
        let config = DumpConfig::new("aud_etextbook_url", dir.path(), 2).with_start_index(u32::MAX);
        let err = PageDumper::new(config).unwrap_err();
        assert!(matches!(err, Error::Config { .. }));
    }
}
