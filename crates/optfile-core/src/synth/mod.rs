//! Artifact Synthesizers
//!
//! One thin table per executable family, composed from the Resource
//! Resolver and either the line rewriter or the tree patcher:
//!
//! | family | template | transformer |
//! |---|---|---|
//! | Whizard | `whizard.in` | [`LineRewriter`], marker or token mode |
//! | Mokka | steering file | [`LineRewriter`] + generated mac file |
//! | SLIC | mac file (optional) | [`LineRewriter`] with header |
//! | Marlin | steering XML | [`TreePatcher`] |
//! | LCSIM | job XML | [`TreePatcher`] |
//!
//! Every synthesizer reads its template once, transforms it in memory and
//! writes the output only after the whole transformation succeeded.

mod inputs;
mod lcsim;
mod marlin;
mod mokka;
mod slic;
mod whizard;

pub use inputs::{derive_seed, generator_names, locate_mac, pick_generator_file};
pub use lcsim::lcsim_directives;
pub use marlin::marlin_directives;
pub use mokka::{mokka_mac, mokka_rewriter};
pub use slic::slic_rewriter;
pub use whizard::{whizard_marker_rewriter, whizard_token_rewriter, PROCESS_ID_FOUND};

use crate::error::{PrepError, PrepResult};
use crate::resolver::Resolver;
use crate::types::{ArtifactMetadata, Family, ParameterSet, PrepConfig, SynthesisOutput};
use optfile_artifact::{ContentHash, LineDocument, PatchDirective, PatchReport, XmlDocument};
use optfile_template::{
    LineRewriter, NoOverlay, OverlayProvider, ParameterLookup, Rewritten, TemplateLayer,
    TreePatcher,
};
use std::path::{Path, PathBuf};

/// Synthesizer front end bound to one working directory
pub struct Preparer<'a> {
    config: PrepConfig,
    layer: TemplateLayer,
    resolver: Resolver,
    overlay: &'a dyn OverlayProvider,
}

impl std::fmt::Debug for Preparer<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Preparer")
            .field("config", &self.config)
            .field("root", &self.resolver.root())
            .finish_non_exhaustive()
    }
}

impl Preparer<'static> {
    /// Preparer without an overlay provider; any directive needing overlay
    /// files fails
    #[must_use]
    pub fn new(resolver: Resolver, config: PrepConfig) -> Self {
        Self::with_overlay(resolver, config, &NoOverlay)
    }
}

impl<'a> Preparer<'a> {
    /// Preparer fetching background files from `overlay`
    #[must_use]
    pub fn with_overlay(
        resolver: Resolver,
        config: PrepConfig,
        overlay: &'a dyn OverlayProvider,
    ) -> Self {
        let layer = TemplateLayer::with_max_size(config.max_template_size);
        Self {
            config,
            layer,
            resolver,
            overlay,
        }
    }

    /// Configuration
    #[inline]
    #[must_use]
    pub fn config(&self) -> &PrepConfig {
        &self.config
    }

    /// Resolver
    #[inline]
    #[must_use]
    pub fn resolver(&self) -> &Resolver {
        &self.resolver
    }

    /// Synthesize an artifact for `family`
    ///
    /// Only SLIC accepts a missing template.
    ///
    /// # Errors
    /// Any [`PrepError`] of the family's synthesizer; a missing template
    /// for another family is [`PrepError::ResourceNotFound`]
    pub fn prepare(
        &self,
        family: Family,
        template: Option<&Path>,
        output: &Path,
        params: &ParameterSet,
    ) -> PrepResult<SynthesisOutput> {
        if family == Family::Slic {
            return self.slic(template, output, params);
        }
        let template =
            template.ok_or_else(|| PrepError::resource_not_found(format!("{family} template")))?;
        match family {
            Family::Whizard => self.whizard(template, output, params),
            Family::WhizardTemplate => self.whizard_template(template, output, params),
            Family::Mokka => self.mokka(template, output, params),
            Family::Marlin => self.marlin(template, output, params),
            Family::Lcsim => self.lcsim(template, output, params),
            Family::Slic => self.slic(Some(template), output, params),
        }
    }

    fn read_lines(&self, template: &Path) -> PrepResult<LineDocument> {
        Ok(self.layer.read_lines(template)?)
    }

    fn read_xml(&self, template: &Path) -> PrepResult<XmlDocument> {
        Ok(self.layer.read_xml(template)?)
    }

    fn rewrite(
        &self,
        template: Option<&Path>,
        rewriter: &LineRewriter,
        document: &LineDocument,
        params: &dyn ParameterLookup,
    ) -> PrepResult<Rewritten> {
        rewriter
            .rewrite(document, params)
            .map_err(|e| PrepError::patch(template, e))
    }

    fn patch(
        &self,
        template: &Path,
        document: &XmlDocument,
        directives: &[PatchDirective],
    ) -> PrepResult<(XmlDocument, PatchReport)> {
        TreePatcher::new(self.overlay)
            .with_separator(self.config.overlay_separator.clone())
            .patch(document, directives)
            .map_err(|e| PrepError::patch(Some(template), e))
    }

    fn write_lines(
        &self,
        template: Option<&Path>,
        output: &Path,
        document: &LineDocument,
    ) -> PrepResult<ContentHash> {
        self.layer
            .write_lines(output, document)
            .map_err(|e| PrepError::write(template, e))
    }

    fn write_xml(
        &self,
        template: &Path,
        output: &Path,
        document: &XmlDocument,
    ) -> PrepResult<ContentHash> {
        self.layer
            .write_xml(output, document)
            .map_err(|e| PrepError::write(Some(template), e))
    }

    /// Resolve logical names into displayable absolute paths
    fn resolve_all(&self, names: &[String]) -> PrepResult<Vec<PathBuf>> {
        Ok(self.resolver.resolve(names)?)
    }

    /// Resolved generator file for the step, if any
    fn generator_file(&self, params: &ParameterSet) -> PrepResult<Option<String>> {
        let names = generator_names(params);
        if names.is_empty() {
            return Ok(None);
        }
        let resolved = self.resolve_all(&names)?;
        Ok(resolved.first().map(|path| path.display().to_string()))
    }
}

fn finish(
    family: Family,
    output: &Path,
    checksum: ContentHash,
    metadata: ArtifactMetadata,
) -> SynthesisOutput {
    tracing::info!(
        family = %family,
        output = %output.display(),
        checksum = %checksum.short(),
        "artifact synthesized"
    );
    SynthesisOutput {
        family,
        output: output.to_path_buf(),
        checksum,
        metadata,
    }
}
