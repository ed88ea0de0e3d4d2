//! Path-based operations: load, compute, persist, encode.
//!
//! `Engine` holds configuration only. Every call decodes its own images and
//! drops them before returning, so calls can run concurrently.

use crate::artifact::ArtifactStore;
use crate::compare::diff::render_diff;
use crate::compare::{compare_images, ComparisonConfig, Metadata};
use crate::image::io::load_rgba_image;
use crate::locate::{locate, Location};
use crate::region::parse_regions;
use crate::report::{parse_metadata, CompareEnvelope, LocateEnvelope, SearchEnvelope};
use crate::search::{MatchConfig, MatchResult, Matcher};
use crate::trace::{trace_event, trace_span, trace_warn};
use crate::util::{VtError, VtResult};
use std::path::PathBuf;

/// Engine-wide settings.
#[derive(Clone, Debug, PartialEq)]
pub struct EngineConfig {
    /// Diff artifact directory; `None` defers to `VTSDK_ARTIFACT_DIR` or the temp dir.
    pub artifact_dir: Option<PathBuf>,
    /// Parallelize pixel comparison when the `rayon` feature is enabled.
    pub parallel: bool,
    pub matcher: MatchConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            artifact_dir: None,
            parallel: true,
            matcher: MatchConfig::default(),
        }
    }
}

impl EngineConfig {
    pub fn with_artifact_dir<P: Into<PathBuf>>(mut self, dir: P) -> Self {
        self.artifact_dir = Some(dir.into());
        self
    }

    pub fn with_match_config(mut self, matcher: MatchConfig) -> Self {
        self.matcher = matcher;
        self
    }

    /// Sets the parallel flag for both comparison and matching.
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self.matcher.parallel = parallel;
        self
    }

    fn artifact_store(&self) -> ArtifactStore {
        match &self.artifact_dir {
            Some(dir) => ArtifactStore::new(dir.clone()),
            None => ArtifactStore::from_env(),
        }
    }
}

/// Compare request: two image paths and the comparison parameters.
#[derive(Clone, Debug, PartialEq)]
pub struct CompareRequest {
    pub baseline_path: PathBuf,
    pub input_path: PathBuf,
    pub config: ComparisonConfig,
}

impl CompareRequest {
    /// Builds a request from boundary arguments, parsing the JSON documents.
    pub fn parse(
        baseline_path: &str,
        input_path: &str,
        min_similarity: i32,
        noise_tolerance: i32,
        excluded_regions_json: Option<&str>,
        metadata_json: Option<&str>,
    ) -> VtResult<Self> {
        let metadata = parse_metadata(metadata_json)?;
        let regions = parse_regions(excluded_regions_json)?;
        Ok(Self {
            baseline_path: baseline_path.into(),
            input_path: input_path.into(),
            config: ComparisonConfig::new(min_similarity, noise_tolerance)
                .with_excluded_regions(regions)
                .with_metadata(metadata),
        })
    }
}

/// Search request: find `child` inside `parent`.
#[derive(Clone, Debug, PartialEq)]
pub struct SearchRequest {
    pub parent_path: PathBuf,
    pub child_path: PathBuf,
    pub metadata: Metadata,
}

/// Locate request: find `main` and `relative` inside `container`.
#[derive(Clone, Debug, PartialEq)]
pub struct LocateRequest {
    pub container_path: PathBuf,
    pub main_path: PathBuf,
    pub relative_path: PathBuf,
    pub metadata: Metadata,
}

/// Outcome of a compare request, including the persisted diff artifact.
#[derive(Clone, Debug, PartialEq)]
pub struct ComparisonResult {
    pub obtained_similarity: f64,
    pub passed: bool,
    pub diff_pixel_count: u64,
    pub total_pixel_count: u64,
    pub excluded_pixel_count: u64,
    pub result_image_ref: Option<String>,
    pub metadata: Metadata,
}

/// Stateless visual regression engine.
#[derive(Clone, Debug, Default)]
pub struct Engine {
    config: EngineConfig,
}

impl Engine {
    pub fn new(config: EngineConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    fn matcher(&self) -> Matcher {
        Matcher::new().with_config(self.config.matcher.clone())
    }

    /// Compares two image files and writes the diff artifact.
    ///
    /// The artifact is produced for every successful comparison, passed or not.
    pub fn compare(&self, req: &CompareRequest) -> VtResult<ComparisonResult> {
        let _span = trace_span!(
            "compare",
            baseline = %req.baseline_path.display(),
            input = %req.input_path.display(),
        )
        .entered();

        req.config.validate()?;
        let baseline = load_rgba_image(&req.baseline_path)?;
        let candidate = load_rgba_image(&req.input_path)?;
        let comparison =
            compare_images(baseline.view(), candidate.view(), &req.config, self.config.parallel)?;

        let diff_image = render_diff(baseline.view(), &comparison.diff)?;
        let artifact = self.config.artifact_store().persist(&diff_image)?;
        trace_event!(
            "compare_done",
            similarity = comparison.obtained_similarity,
            passed = comparison.passed
        );

        Ok(ComparisonResult {
            obtained_similarity: comparison.obtained_similarity,
            passed: comparison.passed,
            diff_pixel_count: comparison.diff.diff_pixel_count(),
            total_pixel_count: comparison.diff.total_pixel_count(),
            excluded_pixel_count: comparison.diff.excluded_pixel_count(),
            result_image_ref: Some(artifact.display().to_string()),
            metadata: req.config.metadata.clone(),
        })
    }

    /// Searches the parent image file for the child image file.
    pub fn search(&self, req: &SearchRequest) -> VtResult<MatchResult> {
        let _span = trace_span!("search", parent = %req.parent_path.display()).entered();
        let parent = load_rgba_image(&req.parent_path)?;
        let child = load_rgba_image(&req.child_path)?;
        self.matcher().find(parent.view(), child.view())
    }

    /// Locates the main and relative image files inside the container file.
    pub fn locate(&self, req: &LocateRequest) -> VtResult<Location> {
        let _span = trace_span!("locate", container = %req.container_path.display()).entered();
        let container = load_rgba_image(&req.container_path)?;
        let main = load_rgba_image(&req.main_path)?;
        let relative = load_rgba_image(&req.relative_path)?;
        locate(&self.matcher(), container.view(), main.view(), relative.view())
    }

    /// Runs `compare` and encodes the outcome, success or error.
    pub fn compare_envelope(&self, req: &CompareRequest) -> CompareEnvelope {
        match self.compare(req) {
            Ok(result) => CompareEnvelope::success(result),
            Err(err) => {
                log_failure("compare", &err);
                CompareEnvelope::failure(&err, req.config.metadata.clone())
            }
        }
    }

    /// Runs `search` and encodes the outcome, success or error.
    pub fn search_envelope(&self, req: &SearchRequest) -> SearchEnvelope {
        match self.search(req) {
            Ok(result) => SearchEnvelope::success(&result, req.metadata.clone()),
            Err(err) => {
                log_failure("search", &err);
                SearchEnvelope::failure(&err, req.metadata.clone())
            }
        }
    }

    /// Runs `locate` and encodes the outcome, success or error.
    pub fn locate_envelope(&self, req: &LocateRequest) -> LocateEnvelope {
        match self.locate(req) {
            Ok(location) => LocateEnvelope::success(&location, req.metadata.clone()),
            Err(err) => {
                log_failure("locate", &err);
                LocateEnvelope::failure(&err, req.metadata.clone())
            }
        }
    }
}

fn log_failure(operation: &'static str, err: &VtError) {
    trace_warn!("operation_failed", operation = operation, kind = err.kind(), error = err);
}
