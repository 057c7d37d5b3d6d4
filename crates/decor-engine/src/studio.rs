use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Instant, SystemTime, UNIX_EPOCH};

use anyhow::{Context, Result};
use decor_contracts::access::{ensure_entitled, EntitlementSource};
use decor_contracts::events::{now_utc_iso, EventKind, EventPayload, EventWriter};
use decor_contracts::runs::receipts::{
    build_receipt, write_receipt, DesignRequestRecord, DesignResultRecord,
};
use decor_contracts::runs::summary::{write_summary, SessionSummary};
use serde_json::{json, Map, Value};
use sha2::{Digest, Sha256};

use crate::codec::image_extension;
use crate::error::GenerationError;
use crate::form::build_generation_form;
use crate::pipeline::{CancelToken, DesignGenerator, GenerationRequest, GenerationResult};

#[derive(Debug, Clone, PartialEq)]
pub struct SavedDesign {
    pub image_path: PathBuf,
    pub receipt_path: PathBuf,
    pub seed: i64,
    pub finish_reason: String,
    pub latency_s: f64,
}

/// A working session around `DesignGenerator`: it owns an output
/// directory, records events, and saves each finished design with a
/// receipt next to it.
pub struct DesignStudio {
    out_dir: PathBuf,
    events: EventWriter,
    summary_path: PathBuf,
    started_at: String,
    generator: DesignGenerator,
    attempted: u64,
    created: u64,
    failed: u64,
    designs: Vec<Map<String, Value>>,
}

impl DesignStudio {
    pub fn new(
        out_dir: impl Into<PathBuf>,
        events_path: impl Into<PathBuf>,
        generator: DesignGenerator,
    ) -> Result<Self> {
        let out_dir = out_dir.into();
        fs::create_dir_all(&out_dir)
            .with_context(|| format!("failed to create {}", out_dir.display()))?;
        let session_id = out_dir
            .file_name()
            .and_then(|value| value.to_str())
            .filter(|value| !value.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| format!("session-{}", uuid::Uuid::new_v4()));
        let events = EventWriter::new(events_path.into(), session_id);
        let summary_path = out_dir.join("summary.json");

        events.emit(
            EventKind::SessionStarted,
            map_object(json!({
                "out_dir": out_dir.to_string_lossy().to_string(),
                "engine_id": generator.config().engine_id(),
            })),
        )?;

        Ok(Self {
            out_dir,
            events,
            summary_path,
            started_at: now_utc_iso(),
            generator,
            attempted: 0,
            created: 0,
            failed: 0,
            designs: Vec::new(),
        })
    }

    pub fn session_id(&self) -> &str {
        self.events.session_id()
    }

    pub fn out_dir(&self) -> &Path {
        &self.out_dir
    }

    pub fn events_path(&self) -> &Path {
        self.events.path()
    }

    /// Generates and saves one design. Pipeline failures come back as a
    /// `GenerationError` inside the `anyhow::Error`.
    pub fn generate(
        &mut self,
        request: GenerationRequest,
        entitlement: &dyn EntitlementSource,
        cancel: Option<&CancelToken>,
    ) -> Result<SavedDesign> {
        self.attempted += 1;

        // Fast path: skip all work when the user is clearly not subscribed.
        // The pipeline re-reads the entitlement before it sends anything.
        if let Err(denied) = ensure_entitled(entitlement.snapshot()) {
            self.failed += 1;
            self.events.emit(
                EventKind::GenerationBlocked,
                map_object(json!({
                    "room": request.room,
                    "style": request.style,
                    "reason": denied.to_string(),
                })),
            )?;
            return Err(GenerationError::from(denied).into());
        }

        let prompts = request.prompts();
        let record = DesignRequestRecord {
            room: request.room,
            style: request.style,
            image_strength: request.params.image_strength(),
            steps: request.params.steps(),
            cfg_scale: request.params.cfg_scale(),
            style_preset: request.params.style_preset().map(str::to_string),
            prompt: prompts.positive.clone(),
            negative_prompt: prompts.negative.clone(),
            source_image_sha256: sha256_hex(&request.source_image),
        };
        let request_hash = sha256_hex(&serde_json::to_vec(&record)?);
        let mut fields = build_generation_form(&prompts, Vec::new(), &request.params).manifest();
        fields.remove("init_image");
        let endpoint = match self.generator.config().endpoint() {
            Ok(url) => url,
            Err(err) => {
                self.record_failure(err.kind(), err.to_string(), None, 0.0, &request_hash)?;
                return Err(err.into());
            }
        };
        let provider_request = map_object(json!({
            "endpoint": endpoint.to_string(),
            "fields": fields,
        }));

        self.events.emit(
            EventKind::GenerationStarted,
            map_object(json!({
                "room": record.room,
                "style": record.style,
                "image_strength": record.image_strength,
                "steps": record.steps,
                "cfg_scale": record.cfg_scale,
                "style_preset": record.style_preset,
                "request_hash": request_hash,
            })),
        )?;

        let started = Instant::now();
        let snapshot = entitlement.snapshot();
        let outcome = match cancel {
            Some(token) => self
                .generator
                .generate_cancellable(request, snapshot, token),
            None => self.generator.generate(&request, snapshot),
        };
        let latency_s = started.elapsed().as_secs_f64();

        let result = match outcome {
            Ok(result) => result,
            Err(err) => {
                self.record_failure(
                    err.kind(),
                    err.to_string(),
                    err.status_code(),
                    latency_s,
                    &request_hash,
                )?;
                return Err(err.into());
            }
        };

        let (image_path, receipt_path) =
            match self.save_design(&record, &provider_request, &result, latency_s) {
                Ok(paths) => paths,
                Err(err) => {
                    self.record_failure("io", format!("{err:#}"), None, latency_s, &request_hash)?;
                    return Err(err);
                }
            };

        self.created += 1;
        self.designs.push(map_object(json!({
            "image_path": image_path.to_string_lossy().to_string(),
            "receipt_path": receipt_path.to_string_lossy().to_string(),
            "room": record.room,
            "style": record.style,
            "seed": result.seed,
        })));
        self.events.emit(
            EventKind::DesignCreated,
            map_object(json!({
                "image_path": image_path.to_string_lossy().to_string(),
                "receipt_path": receipt_path.to_string_lossy().to_string(),
                "seed": result.seed,
                "finish_reason": result.finish_reason,
                "latency_s": latency_s,
                "request_hash": request_hash,
            })),
        )?;

        Ok(SavedDesign {
            image_path,
            receipt_path,
            seed: result.seed,
            finish_reason: result.finish_reason,
            latency_s,
        })
    }

    fn record_failure(
        &mut self,
        error_kind: &str,
        message: String,
        status: Option<u16>,
        latency_s: f64,
        request_hash: &str,
    ) -> Result<()> {
        self.failed += 1;
        self.events.emit(
            EventKind::GenerationFailed,
            map_object(json!({
                "error_kind": error_kind,
                "message": message,
                "status": status,
                "latency_s": latency_s,
                "request_hash": request_hash,
            })),
        )?;
        Ok(())
    }

    fn save_design(
        &self,
        record: &DesignRequestRecord,
        provider_request: &Map<String, Value>,
        result: &GenerationResult,
        latency_s: f64,
    ) -> Result<(PathBuf, PathBuf)> {
        let stamp = timestamp_millis();
        let image_path = self.out_dir.join(format!(
            "design-{stamp}.{}",
            image_extension(&result.image_bytes)
        ));
        let receipt_path = self.out_dir.join(format!("receipt-design-{stamp}.json"));
        fs::write(&image_path, &result.image_bytes)
            .with_context(|| format!("failed to write {}", image_path.display()))?;
        let result_record = DesignResultRecord {
            seed: result.seed,
            finish_reason: result.finish_reason.clone(),
            latency_s,
            image_bytes: result.image_bytes.len() as u64,
        };
        let receipt = build_receipt(
            record,
            provider_request,
            &result_record,
            &image_path,
            &receipt_path,
        );
        write_receipt(&receipt_path, &receipt)
            .with_context(|| format!("failed to write {}", receipt_path.display()))?;
        Ok((image_path, receipt_path))
    }

    pub fn finish(&mut self) -> Result<SessionSummary> {
        let summary = SessionSummary {
            session_id: self.session_id().to_string(),
            started_at: self.started_at.clone(),
            finished_at: now_utc_iso(),
            attempted: self.attempted,
            created: self.created,
            failed: self.failed,
            designs: self.designs.clone(),
        };
        let mut extra = Map::new();
        extra.insert(
            "engine_id".to_string(),
            Value::String(self.generator.config().engine_id().to_string()),
        );
        write_summary(&self.summary_path, &summary, Some(&extra))?;
        self.events.emit(
            EventKind::SessionFinished,
            map_object(json!({
                "summary_path": self.summary_path.to_string_lossy().to_string(),
                "events_path": self.events_path().to_string_lossy().to_string(),
                "created": self.created,
                "failed": self.failed,
            })),
        )?;
        Ok(summary)
    }
}

fn sha256_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}

fn timestamp_millis() -> u128 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|duration| duration.as_millis())
        .unwrap_or(0)
}

fn map_object(value: Value) -> EventPayload {
    value.as_object().cloned().unwrap_or_default()
}
