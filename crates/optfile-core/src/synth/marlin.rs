//! Marlin steering XML

use super::{finish, Preparer};
use crate::error::PrepResult;
use crate::keys;
use crate::types::{ArtifactMetadata, Family, ParameterSet, SynthesisOutput};
use optfile_artifact::{ElementPath, PatchAction, PatchDirective, PatchValue, Selector, WhenAbsent};
use std::path::{Path, PathBuf};

fn global_parameter(name: &str) -> ElementPath {
    ElementPath::new(vec![
        Selector::tag("global"),
        Selector::tag("parameter").with_attr("name", name),
    ])
}

fn processor_parameter(processor: Selector, name: &str) -> ElementPath {
    ElementPath::new(vec![
        processor,
        Selector::tag("parameter").with_attr("name", name),
    ])
}

/// Directive table for one steering file
///
/// `inputs` are the resolved event files; an empty list leaves the
/// template's input list alone.
#[must_use]
pub fn marlin_directives(params: &ParameterSet, inputs: &[PathBuf]) -> Vec<PatchDirective> {
    let mut directives = Vec::new();

    if !inputs.is_empty() {
        let joined = inputs
            .iter()
            .map(|path| path.display().to_string())
            .collect::<Vec<_>>()
            .join(" ");
        directives.push(
            PatchDirective::new(
                "input file list",
                global_parameter("LCIOInputFiles"),
                PatchAction::SetText(joined.into()),
            )
            .when_absent(WhenAbsent::Create),
        );
    }
    if let Some(events) = params.text(keys::NB_EVENTS) {
        directives.push(PatchDirective::new(
            "MaxRecordNumber",
            global_parameter("MaxRecordNumber"),
            PatchAction::SetValueOrText(events),
        ));
    }
    if let Some(gear) = params.text(keys::GEAR_FILE) {
        directives.push(PatchDirective::new(
            "input gear",
            global_parameter("GearXMLFile"),
            PatchAction::SetValueOrText(gear),
        ));
    }
    if !params.flag(keys::DEBUG) {
        directives.push(PatchDirective::new(
            "verbosity",
            global_parameter("Verbosity"),
            PatchAction::SetText("SILENT".into()),
        ));
    }

    let outputs = [
        ("REC file", "MyLCIOOutputProcessor", keys::OUTPUT_REC),
        ("DST file", "DSTOutput", keys::OUTPUT_DST),
    ];
    for (label, processor, key) in outputs {
        if let Some(file) = params.text(key) {
            directives.push(PatchDirective::new(
                label,
                processor_parameter(
                    Selector::tag("processor").with_attr("name", processor),
                    "LCIOOutputFile",
                ),
                PatchAction::SetText(file.into()),
            ));
        }
    }

    directives.push(
        PatchDirective::new(
            "Overlay files",
            processor_parameter(
                Selector::tag("processor").with_attr_containing("name", "overlaytiming"),
                "BackgroundFileNames",
            ),
            PatchAction::SetText(PatchValue::Overlay),
        )
        .when_absent(WhenAbsent::CreateLeaf),
    );

    directives
}

impl Preparer<'_> {
    /// Prepare a Marlin steering file
    ///
    /// # Errors
    /// - input file not found
    /// - an overlay timing processor is present and the overlay provider
    ///   has no files
    /// - parse and write failures naming `template`
    pub fn marlin(
        &self,
        template: &Path,
        output: &Path,
        params: &ParameterSet,
    ) -> PrepResult<SynthesisOutput> {
        self.marlin_steering(template, output, params)
            .map_err(|e| e.in_template(template))
    }

    fn marlin_steering(
        &self,
        template: &Path,
        output: &Path,
        params: &ParameterSet,
    ) -> PrepResult<SynthesisOutput> {
        let document = self.read_xml(template)?;
        let inputs = self.resolve_all(&params.list(keys::INPUT_FILES))?;
        let directives = marlin_directives(params, &inputs);
        let (patched, report) = self.patch(template, &document, &directives)?;
        tracing::debug!(changed = report.changed_count(), "marlin steering patched");
        let checksum = self.write_xml(template, output, &patched)?;
        Ok(finish(
            Family::Marlin,
            output,
            checksum,
            ArtifactMetadata::Marlin { inputs },
        ))
    }
}
