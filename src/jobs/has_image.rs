//! `gxdResultHasImage`: classical results that carry an image.

use super::result::{ClassicalStrategy, ResultContext};
use super::{IndexJob, JobContext};
use crate::error::Result;
use crate::scan::{ChunkedPipeline, PipelineStats};
use crate::source::FactSource;

pub const NAME: &str = "gxdResultHasImage";

/// Rebuilds the has-image result collection
#[derive(Debug, Clone, Copy, Default)]
pub struct ResultHasImageJob;

impl IndexJob for ResultHasImageJob {
    fn name(&self) -> &'static str {
        NAME
    }

    fn collection(&self) -> &'static str {
        NAME
    }

    fn populate(
        &self,
        ctx: &JobContext,
        source: &dyn FactSource,
        pipeline: &mut ChunkedPipeline<'_>,
    ) -> Result<PipelineStats> {
        let mut shared = ResultContext::load(ctx, source)?;
        pipeline.run(&mut ClassicalStrategy::images_only(
            &mut shared,
            ctx.config.chunk_sizes.has_image,
        ))
    }
}
