use std::io::Cursor;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use anyhow::{bail, Result};
use image::codecs::jpeg::JpegEncoder;
use image::{ImageFormat, Rgb, RgbImage, RgbaImage};
use serde_json::json;

use crate::transport::{HttpReply, HttpTransport, MultipartPost};

pub(crate) fn solid_jpeg(width: u32, height: u32, rgb: [u8; 3]) -> Vec<u8> {
    let image = RgbImage::from_pixel(width, height, Rgb(rgb));
    let mut bytes = Vec::new();
    JpegEncoder::new_with_quality(&mut bytes, 90)
        .encode_image(&image)
        .expect("encode test jpeg");
    bytes
}

pub(crate) fn encode_png(image: &RgbaImage) -> Vec<u8> {
    let mut bytes = Vec::new();
    image
        .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
        .expect("encode test png");
    bytes
}

pub(crate) fn artifacts_body(artifacts: &[(String, &str, i64)]) -> Vec<u8> {
    let rows: Vec<_> = artifacts
        .iter()
        .map(|(base64, finish_reason, seed)| {
            json!({ "base64": base64, "finish_reason": finish_reason, "seed": seed })
        })
        .collect();
    serde_json::to_vec(&json!({ "artifacts": rows })).expect("encode artifacts body")
}

enum Outcome {
    Reply(HttpReply),
    Fail(String),
}

/// Records every request and answers with a canned outcome.
pub(crate) struct FakeTransport {
    outcome: Outcome,
    delay: Option<Duration>,
    calls: AtomicUsize,
    last: Mutex<Option<MultipartPost>>,
}

impl FakeTransport {
    pub(crate) fn replying(status: u16, body: Vec<u8>) -> Self {
        Self::with_outcome(Outcome::Reply(HttpReply { status, body }))
    }

    pub(crate) fn failing(message: &str) -> Self {
        Self::with_outcome(Outcome::Fail(message.to_string()))
    }

    fn with_outcome(outcome: Outcome) -> Self {
        Self {
            outcome,
            delay: None,
            calls: AtomicUsize::new(0),
            last: Mutex::new(None),
        }
    }

    pub(crate) fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub(crate) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub(crate) fn last_request(&self) -> Option<MultipartPost> {
        self.last.lock().expect("fake transport lock").clone()
    }
}

impl HttpTransport for FakeTransport {
    fn post_multipart(&self, request: &MultipartPost) -> Result<HttpReply> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last.lock().expect("fake transport lock") = Some(request.clone());
        if let Some(delay) = self.delay {
            std::thread::sleep(delay);
        }
        match &self.outcome {
            Outcome::Reply(reply) => Ok(reply.clone()),
            Outcome::Fail(message) => bail!("{message}"),
        }
    }
}
