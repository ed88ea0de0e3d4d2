//! VTSDK is a CPU visual regression engine for screenshots.
//!
//! It compares a candidate image to a baseline under a per-channel noise
//! tolerance and excluded regions, renders a diff artifact, and finds
//! templates inside larger images (`search`, `locate`). Every operation is
//! synchronous and stateless; results are encoded as fixed JSON envelopes for
//! the C boundary in `vtsdk-ffi`. Row parallelism is available via the `rayon`
//! feature and vectorized SSD via `simd`.

pub mod artifact;
mod candidate;
pub mod compare;
pub mod engine;
pub mod image;
pub mod kernel;
pub mod locate;
pub mod region;
pub mod report;
pub mod search;
pub mod template;
mod trace;
pub mod util;

pub use artifact::ArtifactStore;
pub use candidate::topk::Peak;
pub use compare::{compare_images, Comparison, ComparisonConfig, Metadata, PixelClass, PixelDiff};
pub use engine::{
    CompareRequest, ComparisonResult, Engine, EngineConfig, LocateRequest, SearchRequest,
};
pub use image::io::{load_rgba_image, save_png};
pub use image::{ImageView, OwnedImage, Rgba};
pub use locate::{locate, Location, Offset, RelativePosition};
pub use region::{ExclusionMask, Rect};
pub use report::{CompareEnvelope, Envelope, LocateEnvelope, MatchBody, SearchEnvelope};
pub use search::{MatchConfig, MatchResult, Matcher, Metric, Placement};
pub use util::{ErrorKind, VtError, VtResult};
