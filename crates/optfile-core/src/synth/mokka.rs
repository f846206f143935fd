//! Mokka steering file
//!
//! Control lines the job owns are filtered out of the template body and
//! re-emitted as annotated trailers. Without a user mac file a small one is
//! generated next to the steering file.

use super::{derive_seed, finish, locate_mac, Preparer};
use crate::error::PrepResult;
use crate::keys;
use crate::types::{ArtifactMetadata, Family, ParameterSet, SynthesisOutput};
use optfile_artifact::LineDocument;
use optfile_template::{LineRewriter, LineRule};
use std::path::{Path, PathBuf};

const DETECTOR_NOTE: &str = "#Set detector model to value specified";
const DEBUG_NOTE: &str = "#Set debug level to 1";
const BATCH_NOTE: &str = "#Set batch mode to true";
const MAC_NOTE: &str = "#Set mac file to the one created on the site";
const SEED_NOTE: &str = "#Setting random seed";
const OUTPUT_NOTE: &str = "#Set outputfile name to job specified";
const START_NOTE: &str = "#Set event start number to value given as job parameter";

const NOTES: [&str; 7] = [
    DETECTOR_NOTE,
    DEBUG_NOTE,
    BATCH_NOTE,
    MAC_NOTE,
    SEED_NOTE,
    OUTPUT_NOTE,
    START_NOTE,
];

/// Rule table and trailers for one steering file
#[must_use]
pub fn mokka_rewriter(params: &ParameterSet, seed: &str, mac_file: &Path) -> LineRewriter {
    let detector = params.text(keys::DETECTOR_MODEL);
    let output = params.text(keys::OUTPUT_FILE);
    let debug = params.flag(keys::DEBUG);
    let start = params.int(keys::START_FROM).unwrap_or(0);

    let mut rules: Vec<LineRule> = NOTES
        .iter()
        .map(|note| LineRule::drop_line(*note).exact())
        .collect();
    rules.extend([
        LineRule::drop_line("/Mokka/init/initialMacroFile"),
        LineRule::drop_line("/Mokka/init/BatchMode"),
        LineRule::drop_line("/Mokka/init/randomSeed"),
        LineRule::drop_line("/Mokka/init/startEventNumber"),
        LineRule::drop_line("/Mokka/init/lcioFilename").when(output.is_some()),
        LineRule::drop_line("/Mokka/init/detectorModel").when(detector.is_some()),
        LineRule::drop_line("/Mokka/init/printLevel").when(!debug),
    ]);

    let mut trailer = Vec::new();
    if let Some(detector) = &detector {
        trailer.push(DETECTOR_NOTE.to_string());
        trailer.push(format!("/Mokka/init/detectorModel {detector}"));
    }
    if !debug {
        trailer.push(DEBUG_NOTE.to_string());
        trailer.push("/Mokka/init/printLevel 1".to_string());
    }
    trailer.push(BATCH_NOTE.to_string());
    trailer.push("/Mokka/init/BatchMode true".to_string());
    trailer.push(MAC_NOTE.to_string());
    trailer.push(format!("/Mokka/init/initialMacroFile {}", mac_file.display()));
    trailer.push(SEED_NOTE.to_string());
    trailer.push(format!("/Mokka/init/randomSeed {seed}"));
    if let Some(output) = &output {
        trailer.push(OUTPUT_NOTE.to_string());
        trailer.push(format!("/Mokka/init/lcioFilename {output}"));
    }
    trailer.push(START_NOTE.to_string());
    trailer.push(format!("/Mokka/init/startEventNumber {start}"));

    LineRewriter::new(rules).with_trailer(trailer)
}

/// Generated mac file: optional generator binding, then the event count
#[must_use]
pub fn mokka_mac(generator: Option<&str>, events: &str) -> LineDocument {
    let mut mac = LineDocument::new();
    if let Some(generator) = generator {
        mac.push_line(&format!("/generator/generator {generator}"));
    }
    mac.push_line(&format!("/run/beamOn {events}"));
    mac
}

impl Preparer<'_> {
    /// Prepare a Mokka steering file, generating its mac file if needed
    ///
    /// # Errors
    /// - missing seed, or missing event count when a mac must be generated
    /// - user mac file not found
    /// - parse and write failures naming `template`
    pub fn mokka(
        &self,
        template: &Path,
        output: &Path,
        params: &ParameterSet,
    ) -> PrepResult<SynthesisOutput> {
        self.mokka_steering(template, output, params)
            .map_err(|e| e.in_template(template))
    }

    fn mokka_steering(
        &self,
        template: &Path,
        output: &Path,
        params: &ParameterSet,
    ) -> PrepResult<SynthesisOutput> {
        let seed = derive_seed(params)?;
        let document = self.read_lines(template)?;

        let (mac_file, generated) = match params.text(keys::MAC_FILE) {
            Some(name) => {
                let path = locate_mac(
                    &name,
                    self.resolver().root(),
                    self.config().steering_dir.as_deref(),
                )?;
                (path, None)
            }
            None => {
                let events = params.require_text(keys::NB_EVENTS)?;
                let generator = self.generator_file(params)?;
                let path = output
                    .parent()
                    .map_or_else(PathBuf::new, Path::to_path_buf)
                    .join(&self.config().mokka_mac_name);
                (path, Some(mokka_mac(generator.as_deref(), &events)))
            }
        };

        let rewriter = mokka_rewriter(params, &seed, &mac_file);
        let rewritten = self.rewrite(Some(template), &rewriter, &document, params)?;

        if let Some(mac) = &generated {
            self.write_lines(Some(template), &mac_file, mac)?;
            tracing::debug!(mac = %mac_file.display(), "mokka mac file generated");
        }
        let checksum = self.write_lines(Some(template), output, &rewritten.document)?;
        Ok(finish(
            Family::Mokka,
            output,
            checksum,
            ArtifactMetadata::Mokka {
                mac_file,
                generated_mac: generated.is_some(),
            },
        ))
    }
}
