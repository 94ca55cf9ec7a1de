//! End-to-end generation: plan, write, illustrate, assemble.
//!
//! Only invalid input and a failed save make a run fail. Everything upstream of the
//! document is recovered inside its stage, so a run with every service down still yields
//! a deck built from fallback text.

use std::sync::Arc;

use futures::future::join_all;
use serde::{Deserialize, Serialize};
use tracing::{error, info};

use crate::assemble::DocumentAssembler;
use crate::config::GeneratorConfig;
use crate::contract::{ImageGeneration, TextCompletion};
use crate::error::{AssemblyError, PipelineError};
use crate::images::ImageAcquirer;
use crate::outline::OutlinePlanner;
use crate::slide::{AssetRef, SlideRecord, SlideSpec};
use crate::store::FileStore;
use crate::writer::SlideWriter;

pub const MIN_SLIDES: usize = 3;
pub const MAX_SLIDES: usize = 20;

pub const SUCCESS_MESSAGE: &str = "Presentation generated successfully!";
pub const FAILURE_MESSAGE: &str = "Error generating presentation";

/// A slide whose layout failed and was kept title-only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlideFailure {
    pub index: usize,
    pub reason: String,
}

impl From<&AssemblyError> for SlideFailure {
    fn from(err: &AssemblyError) -> Self {
        let index = match err {
            AssemblyError::Layout { index, .. } => *index,
        };
        Self {
            index,
            reason: err.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineResult {
    pub succeeded: bool,
    pub slides: Vec<SlideRecord>,
    pub document: Option<AssetRef>,
    pub error: Option<String>,
    pub message: String,
    pub slide_failures: Vec<SlideFailure>,
}

impl PipelineResult {
    fn success(slides: Vec<SlideRecord>, document: AssetRef, slide_failures: Vec<SlideFailure>) -> Self {
        Self {
            succeeded: true,
            slides,
            document: Some(document),
            error: None,
            message: SUCCESS_MESSAGE.to_string(),
            slide_failures,
        }
    }

    fn failure(err: &PipelineError, slides: Vec<SlideRecord>) -> Self {
        Self {
            succeeded: false,
            slides,
            document: None,
            error: Some(err.to_string()),
            message: FAILURE_MESSAGE.to_string(),
            slide_failures: Vec::new(),
        }
    }
}

/// Reject requests the pipeline will not run: blank topic or slide count out of range.
pub fn validate_request(topic: &str, slide_count: usize) -> Result<(), PipelineError> {
    if topic.trim().is_empty() {
        return Err(PipelineError::EmptyTopic);
    }
    if !(MIN_SLIDES..=MAX_SLIDES).contains(&slide_count) {
        return Err(PipelineError::SlideCount {
            min: MIN_SLIDES,
            max: MAX_SLIDES,
            got: slide_count,
        });
    }
    Ok(())
}

pub struct PresentationPipeline {
    planner: OutlinePlanner,
    writer: SlideWriter,
    images: ImageAcquirer,
    assembler: DocumentAssembler,
    store: FileStore,
    parallel: bool,
}

impl PresentationPipeline {
    /// Wire every stage to the given clients. Without an image client the deck is built
    /// without illustrations.
    pub fn new(
        text: Arc<dyn TextCompletion>,
        images: Option<Arc<dyn ImageGeneration>>,
        config: &GeneratorConfig,
    ) -> Self {
        let store = FileStore::new(config.output_dir.clone());
        Self {
            planner: OutlinePlanner::new(Arc::clone(&text)),
            writer: SlideWriter::new(text),
            images: ImageAcquirer::new(
                images,
                config.image_model.clone(),
                store.clone(),
                config.images_dir.clone(),
            ),
            assembler: DocumentAssembler::new(store.clone(), config.presentations_dir.clone()),
            store,
            parallel: config.parallel_slides,
        }
    }

    /// Swap the document assembler, e.g. to register custom slide layouts.
    pub fn with_assembler(mut self, assembler: DocumentAssembler) -> Self {
        self.assembler = assembler;
        self
    }

    pub fn store(&self) -> &FileStore {
        &self.store
    }

    pub async fn run_pipeline(&self, topic: &str, slide_count: usize) -> PipelineResult {
        info!(topic, slide_count, parallel = self.parallel, "[PIPELINE] Starting presentation generation");
        if let Err(e) = validate_request(topic, slide_count) {
            error!(error = %e, "[PIPELINE] Rejected request");
            return PipelineResult::failure(&e, Vec::new());
        }
        let topic = topic.trim();

        let specs = self.planner.plan(topic, slide_count).await;
        info!(slides = specs.len(), "[PIPELINE] Outline ready");

        let records = self.write_slides(specs, topic).await;
        info!(slides = records.len(), "[PIPELINE] Slide content ready");

        let records = self.illustrate(records).await;
        let with_images = records.iter().filter(|r| r.image.is_some()).count();
        info!(slides = records.len(), with_images, "[PIPELINE] Images acquired");

        match self.assembler.assemble(&records, topic) {
            Ok(report) => {
                let failures: Vec<SlideFailure> = report.failures().map(SlideFailure::from).collect();
                info!(
                    document = %report.document,
                    slide_failures = failures.len(),
                    "[PIPELINE] Presentation generated"
                );
                PipelineResult::success(records, report.document, failures)
            }
            Err(e) => {
                let e = PipelineError::from(e);
                error!(error = %e, "[PIPELINE] Could not save presentation");
                PipelineResult::failure(&e, records)
            }
        }
    }

    async fn write_slides(&self, specs: Vec<SlideSpec>, topic: &str) -> Vec<SlideRecord> {
        if self.parallel {
            let contents = join_all(specs.iter().map(|spec| self.writer.write(spec, topic))).await;
            return specs
                .into_iter()
                .zip(contents)
                .map(|(spec, content)| spec.into_record(content))
                .collect();
        }

        let mut records = Vec::with_capacity(specs.len());
        for spec in specs {
            let content = self.writer.write(&spec, topic).await;
            records.push(spec.into_record(content));
        }
        records
    }

    async fn illustrate(&self, records: Vec<SlideRecord>) -> Vec<SlideRecord> {
        if !self.images.is_available() {
            info!("[PIPELINE] No image service configured, building deck without images");
            return records;
        }

        if self.parallel {
            let images = join_all(
                records
                    .iter()
                    .map(|record| self.images.acquire(&record.image_prompt, record.index())),
            )
            .await;
            return records
                .into_iter()
                .zip(images)
                .map(|(record, image)| record.with_image(image))
                .collect();
        }

        let mut illustrated = Vec::with_capacity(records.len());
        for record in records {
            let image = self.images.acquire(&record.image_prompt, record.index()).await;
            illustrated.push(record.with_image(image));
        }
        illustrated
    }
}
