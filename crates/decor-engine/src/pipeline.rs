use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use anyhow::Result;
use decor_contracts::access::{ensure_entitled, EntitlementStatus};
use decor_contracts::catalog::{RoomKind, StyleKind};
use decor_contracts::prompts::{build_prompt, PromptPair};
use serde::Deserialize;

use crate::codec::{decode_result_image, prepare_source_image};
use crate::config::StabilityConfig;
use crate::error::GenerationError;
use crate::form::{build_generation_form, MultipartForm};
use crate::transport::{error_chain_text, HttpTransport, MultipartPost, ReqwestTransport};

pub const IMAGE_STRENGTH_RANGE: (f64, f64) = (0.0, 1.0);
pub const STEPS_RANGE: (u32, u32) = (10, 50);
pub const CFG_SCALE_RANGE: (f64, f64) = (0.0, 35.0);
pub const DEFAULT_STEPS: u32 = 30;
pub const DEFAULT_CFG_SCALE: f64 = 7.0;

const CANCEL_POLL_INTERVAL: Duration = Duration::from_millis(50);
const TRANSPORT_ERROR_MAX_CHARS: usize = 1024;

/// Tuning knobs for one generation. Only constructible with values the
/// image API accepts.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationParams {
    image_strength: f64,
    steps: u32,
    cfg_scale: f64,
    style_preset: Option<String>,
}

impl GenerationParams {
    pub fn new(
        image_strength: f64,
        steps: u32,
        cfg_scale: f64,
        style_preset: Option<String>,
    ) -> Result<Self, GenerationError> {
        let (min_strength, max_strength) = IMAGE_STRENGTH_RANGE;
        if !(min_strength..=max_strength).contains(&image_strength) {
            return Err(GenerationError::InvalidParameters(format!(
                "image_strength must be within [{min_strength}, {max_strength}], got {image_strength}"
            )));
        }
        let (min_steps, max_steps) = STEPS_RANGE;
        if !(min_steps..=max_steps).contains(&steps) {
            return Err(GenerationError::InvalidParameters(format!(
                "steps must be within [{min_steps}, {max_steps}], got {steps}"
            )));
        }
        let (min_cfg, max_cfg) = CFG_SCALE_RANGE;
        if !(min_cfg..=max_cfg).contains(&cfg_scale) {
            return Err(GenerationError::InvalidParameters(format!(
                "cfg_scale must be within [{min_cfg}, {max_cfg}], got {cfg_scale}"
            )));
        }
        let style_preset = style_preset
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty());
        Ok(Self {
            image_strength,
            steps,
            cfg_scale,
            style_preset,
        })
    }

    /// Default steps and cfg scale; `image_strength` has no default.
    pub fn with_strength(image_strength: f64) -> Result<Self, GenerationError> {
        Self::new(image_strength, DEFAULT_STEPS, DEFAULT_CFG_SCALE, None)
    }

    pub fn image_strength(&self) -> f64 {
        self.image_strength
    }

    pub fn steps(&self) -> u32 {
        self.steps
    }

    pub fn cfg_scale(&self) -> f64 {
        self.cfg_scale
    }

    pub fn style_preset(&self) -> Option<&str> {
        self.style_preset.as_deref()
    }
}

#[derive(Debug, Clone)]
pub struct GenerationRequest {
    pub source_image: Vec<u8>,
    pub room: RoomKind,
    pub style: StyleKind,
    pub params: GenerationParams,
    /// Replaces the stock negative prompt. An empty value sends none.
    pub negative_prompt: Option<String>,
}

impl GenerationRequest {
    pub fn prompts(&self) -> PromptPair {
        let built = build_prompt(self.room, self.style);
        match &self.negative_prompt {
            Some(negative) => PromptPair::new(built.positive, negative.as_str()),
            None => built,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationResult {
    pub image_bytes: Vec<u8>,
    pub finish_reason: String,
    pub seed: i64,
}

#[derive(Debug, Deserialize)]
struct ArtifactEnvelope {
    artifacts: Vec<Artifact>,
}

#[derive(Debug, Deserialize)]
struct Artifact {
    base64: String,
    finish_reason: String,
    seed: i64,
}

/// Caller-side flag for abandoning a wait. The remote job is not aborted.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    cancelled: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }
}

#[derive(Clone)]
pub struct DesignGenerator {
    config: StabilityConfig,
    transport: Arc<dyn HttpTransport>,
}

impl DesignGenerator {
    pub fn new(config: StabilityConfig) -> Result<Self> {
        let transport = ReqwestTransport::new(config.timeout())?;
        Ok(Self::with_transport(config, Arc::new(transport)))
    }

    pub fn with_transport(config: StabilityConfig, transport: Arc<dyn HttpTransport>) -> Self {
        Self { config, transport }
    }

    pub fn config(&self) -> &StabilityConfig {
        &self.config
    }

    /// The form that `generate` would send for `request`, without the
    /// entitlement check or any I/O.
    pub fn preview_form(
        &self,
        request: &GenerationRequest,
    ) -> Result<MultipartForm, GenerationError> {
        let init_image = prepare_source_image(&request.source_image)?;
        Ok(build_generation_form(
            &request.prompts(),
            init_image,
            &request.params,
        ))
    }

    /// Runs one generation. The entitlement snapshot is checked before any
    /// work happens, and at most one HTTP request is made.
    pub fn generate(
        &self,
        request: &GenerationRequest,
        entitlement: EntitlementStatus,
    ) -> Result<GenerationResult, GenerationError> {
        ensure_entitled(entitlement)?;

        let prompts = request.prompts();
        let init_image = prepare_source_image(&request.source_image)?;
        let form = build_generation_form(&prompts, init_image, &request.params);
        let post = MultipartPost {
            url: self.config.endpoint()?,
            bearer_token: self.config.api_key().to_string(),
            form,
        };

        let reply = self
            .transport
            .post_multipart(&post)
            .map_err(|err| GenerationError::Api {
                status: None,
                body: error_chain_text(&err, TRANSPORT_ERROR_MAX_CHARS),
            })?;
        if reply.status != 200 {
            return Err(GenerationError::Api {
                status: Some(reply.status),
                body: reply.body_text(),
            });
        }

        let envelope: ArtifactEnvelope = serde_json::from_slice(&reply.body)
            .map_err(|err| GenerationError::Decoding(err.to_string()))?;
        let Some(artifact) = envelope.artifacts.into_iter().next() else {
            return Err(GenerationError::ImageConversion(
                "response contained no artifacts".to_string(),
            ));
        };
        let image_bytes = decode_result_image(&artifact.base64)?;
        Ok(GenerationResult {
            image_bytes,
            finish_reason: artifact.finish_reason,
            seed: artifact.seed,
        })
    }

    /// Like `generate`, but the work runs on a worker thread and the caller
    /// stops waiting as soon as `cancel` fires.
    pub fn generate_cancellable(
        &self,
        request: GenerationRequest,
        entitlement: EntitlementStatus,
        cancel: &CancelToken,
    ) -> Result<GenerationResult, GenerationError> {
        ensure_entitled(entitlement)?;
        if cancel.is_cancelled() {
            return Err(GenerationError::Cancelled);
        }

        let (tx, rx) = mpsc::channel();
        let worker = self.clone();
        thread::spawn(move || {
            let _ = tx.send(worker.generate(&request, entitlement));
        });

        loop {
            if cancel.is_cancelled() {
                return Err(GenerationError::Cancelled);
            }
            match rx.recv_timeout(CANCEL_POLL_INTERVAL) {
                Ok(outcome) => return outcome,
                Err(RecvTimeoutError::Timeout) => continue,
                Err(RecvTimeoutError::Disconnected) => {
                    return Err(GenerationError::Api {
                        status: None,
                        body: "generation worker stopped before replying".to_string(),
                    })
                }
            }
        }
    }
}
