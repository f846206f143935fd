//! SLIC mac file

use super::{derive_seed, finish, locate_mac, Preparer};
use crate::error::PrepResult;
use crate::keys;
use crate::types::{ArtifactMetadata, Family, ParameterSet, SynthesisOutput};
use optfile_artifact::LineDocument;
use optfile_template::{LineRewriter, LineRule};
use std::path::{Path, PathBuf};

/// Rule table, header and trailers for one mac file
///
/// # Errors
/// Fails when the detector model or the event count is missing
pub fn slic_rewriter(
    params: &ParameterSet,
    seed: &str,
    generator: Option<&str>,
) -> PrepResult<LineRewriter> {
    let detector = params.require_text(keys::DETECTOR_MODEL)?;
    let events = params.require_text(keys::NB_EVENTS)?;
    let output = params.text(keys::OUTPUT_FILE);
    let start = params.int(keys::START_FROM).unwrap_or(0);

    let rules = vec![
        LineRule::drop_line("/generator/filename"),
        LineRule::drop_line("/generator/skipEvents"),
        LineRule::drop_line("/random/seed"),
        LineRule::drop_line("/lcio/path"),
        LineRule::drop_line("/run/beamOn"),
        LineRule::drop_line("/lcdd/url"),
        LineRule::drop_line("/lcio/filename").when(output.is_some()),
    ];

    let mut header = vec![format!("/lcdd/url {detector}.lcdd")];
    if let Some(output) = &output {
        header.push(format!("/lcio/filename {output}"));
    }

    let mut trailer = Vec::new();
    if let Some(generator) = generator {
        trailer.push(format!("/generator/filename {generator}"));
    }
    trailer.push(format!("/generator/skipEvents {start}"));
    trailer.push(format!("/random/seed {seed}"));
    trailer.push(format!("/run/beamOn {events}"));

    Ok(LineRewriter::new(rules)
        .with_header(header)
        .with_trailer(trailer))
}

impl Preparer<'_> {
    /// Prepare a SLIC mac file
    ///
    /// The template is `template` when given, else the user mac file named
    /// by the parameters; with neither the mac holds only the job's own
    /// lines.
    ///
    /// # Errors
    /// - missing detector model, event count or seed
    /// - user mac or generator file not found
    /// - parse and write failures naming the template
    pub fn slic(
        &self,
        template: Option<&Path>,
        output: &Path,
        params: &ParameterSet,
    ) -> PrepResult<SynthesisOutput> {
        let source = match template {
            Some(path) => Some(path.to_path_buf()),
            None => self.user_mac(params)?,
        };
        let result = self.slic_mac(source.as_deref(), output, params);
        match &source {
            Some(path) => result.map_err(|e| e.in_template(path)),
            None => result,
        }
    }

    fn user_mac(&self, params: &ParameterSet) -> PrepResult<Option<PathBuf>> {
        params
            .text(keys::MAC_FILE)
            .map(|name| {
                locate_mac(
                    &name,
                    self.resolver().root(),
                    self.config().steering_dir.as_deref(),
                )
            })
            .transpose()
    }

    fn slic_mac(
        &self,
        template: Option<&Path>,
        output: &Path,
        params: &ParameterSet,
    ) -> PrepResult<SynthesisOutput> {
        let seed = derive_seed(params)?;
        let generator = self.generator_file(params)?;
        let rewriter = slic_rewriter(params, &seed, generator.as_deref())?;

        let document = match template {
            Some(path) => self.read_lines(path)?,
            None => LineDocument::new(),
        };
        let rewritten = self.rewrite(template, &rewriter, &document, params)?;
        let checksum = self.write_lines(template, output, &rewritten.document)?;
        Ok(finish(
            Family::Slic,
            output,
            checksum,
            ArtifactMetadata::Slic {
                input_file: generator,
                seed,
            },
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ErrorKind;
    use pretty_assertions::assert_eq;

    fn params() -> ParameterSet {
        ParameterSet::new()
            .with(keys::DETECTOR_MODEL, "clic_sid_cdr")
            .with(keys::NB_EVENTS, 25i64)
            .with(keys::OUTPUT_FILE, "sim.slcio")
    }

    #[test]
    fn header_body_trailer() {
        let template = LineDocument::from_text(
            "/lcdd/url old.lcdd\n/run/initialize\n/lcio/filename old.slcio\n/random/seed 3\n/run/beamOn 1\n",
        );
        let out = slic_rewriter(&params(), "42", Some("/work/run1/gen.stdhep"))
            .unwrap()
            .rewrite(&template, &params())
            .unwrap();
        assert_eq!(
            out.document.to_text(),
            "/lcdd/url clic_sid_cdr.lcdd\n\
             /lcio/filename sim.slcio\n\
             /run/initialize\n\
             /generator/filename /work/run1/gen.stdhep\n\
             /generator/skipEvents 0\n\
             /random/seed 42\n\
             /run/beamOn 25\n"
        );
    }

    #[test]
    fn no_template_gives_header_and_trailers() {
        let params = params().with(keys::OUTPUT_FILE, "").with(keys::START_FROM, 5i64);
        let out = slic_rewriter(&params, "7", None)
            .unwrap()
            .rewrite(&LineDocument::new(), &params)
            .unwrap();
        assert_eq!(
            out.document.to_text(),
            "/lcdd/url clic_sid_cdr.lcdd\n/generator/skipEvents 5\n/random/seed 7\n/run/beamOn 25\n"
        );
    }

    #[test]
    fn detector_is_mandatory() {
        let params = ParameterSet::new().with(keys::NB_EVENTS, 1i64);
        let err = slic_rewriter(&params, "1", None).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::FieldMissing);
        assert!(err.to_string().contains("detectorModel"));
    }
}
