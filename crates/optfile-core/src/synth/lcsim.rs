//! LCSIM job XML
//!
//! Besides plain field updates the job needs an event marker driver and,
//! for every requested output, a writer driver. Drivers synthesized here
//! are also listed in the `execute` section so the job actually runs them.

use super::{finish, Preparer};
use crate::error::PrepResult;
use crate::keys;
use crate::types::{ArtifactMetadata, Family, ParameterSet, PrepConfig, SynthesisOutput};
use optfile_artifact::{
    ElementPath, PatchAction, PatchDirective, PatchValue, Registration, Selector, TextCondition,
    WhenAbsent,
};
use std::path::{Path, PathBuf};

const EVENT_MARKER_DRIVER: &str = "org.lcsim.job.EventMarkerDriver";
const OVERLAY_DRIVER: &str = "org.lcsim.util.OverlayDriver";
const LCIO_DRIVER: &str = "org.lcsim.util.loop.LCIODriver";

/// Label of the marker directive, used to read the marker back
const MARKER_LABEL: &str = "event marker";

const WRITERS: [(&str, &str); 3] = [
    ("Writer", keys::OUTPUT_FILE),
    ("RECWriter", keys::OUTPUT_REC),
    ("DSTWriter", keys::OUTPUT_DST),
];

fn path(segments: impl IntoIterator<Item = Selector>) -> ElementPath {
    ElementPath::new(segments.into_iter().collect())
}

/// Any driver's child `tag`
fn any_driver(tag: &str) -> ElementPath {
    path([Selector::tag("drivers"), Selector::tag("driver"), Selector::tag(tag)])
}

/// Child `tag` of the first event marker driver, created as `evtMarker`
fn event_marker(tag: &str) -> ElementPath {
    path([
        Selector::tag("drivers"),
        Selector::tag("driver")
            .with_attr("type", EVENT_MARKER_DRIVER)
            .creating_with("name", "evtMarker"),
        Selector::tag(tag),
    ])
}

/// Directive table for one job file
#[must_use]
pub fn lcsim_directives(
    params: &ParameterSet,
    config: &PrepConfig,
    inputs: &[PathBuf],
) -> Vec<PatchDirective> {
    let mut directives = Vec::new();

    if !inputs.is_empty() {
        directives.push(
            PatchDirective::new(
                "input file list",
                path([Selector::tag("inputFiles")]),
                PatchAction::FillList {
                    item_tag: "file".to_string(),
                    items: inputs.iter().map(|p| p.display().to_string()).collect(),
                },
            )
            .when_absent(WhenAbsent::Create),
        );
    }

    let jars = params.list(keys::JARS);
    if !jars.is_empty() {
        directives.push(
            PatchDirective::new(
                "classpath",
                path([Selector::tag("classpath")]),
                PatchAction::FillList {
                    item_tag: "jar".to_string(),
                    items: jars,
                },
            )
            .when_absent(WhenAbsent::Create),
        );
    }

    if params.flag(keys::DEBUG) {
        directives.push(
            PatchDirective::new(
                "verbosity",
                path([Selector::tag("control"), Selector::tag("verbose")]),
                PatchAction::SetText("true".into()),
            )
            .when_absent(WhenAbsent::Create),
        );
    }

    if let Some(cache) = params.text(keys::CACHE_DIR) {
        directives.push(
            PatchDirective::new(
                "cache directory",
                path([Selector::tag("control"), Selector::tag("cacheDirectory")]),
                PatchAction::SetText(cache.into()),
            )
            .when_absent(WhenAbsent::Create),
        );
    }

    directives.push(
        PatchDirective::new(
            "event interval",
            any_driver("eventInterval"),
            PatchAction::SetTextIf {
                value: config.lcsim_print_every_event.to_string(),
                condition: TextCondition::IntegerBelow(i64::from(config.event_interval_floor)),
            },
        )
        .when_absent(WhenAbsent::CreateAt(event_marker("eventInterval")))
        .registering(Registration::execute_drivers()),
    );

    directives.push(
        PatchDirective::new(
            MARKER_LABEL,
            any_driver("marker"),
            PatchAction::Preserve {
                default: config.lcsim_marker.clone(),
            },
        )
        .when_absent(WhenAbsent::CreateAt(event_marker("marker")))
        .registering(Registration::execute_drivers()),
    );

    directives.push(
        PatchDirective::new(
            "overlay files",
            path([
                Selector::tag("drivers"),
                Selector::tag("driver").with_attr("type", OVERLAY_DRIVER),
                Selector::tag("overlayFiles"),
            ]),
            PatchAction::SetText(PatchValue::Overlay),
        )
        .when_absent(WhenAbsent::CreateLeaf),
    );

    for (writer, key) in WRITERS {
        let Some(file) = params.text(key) else {
            continue;
        };
        directives.push(
            PatchDirective::new(
                format!("{writer} output"),
                path([
                    Selector::tag("drivers"),
                    Selector::tag("driver")
                        .with_attr("name", writer)
                        .with_attr("type", LCIO_DRIVER),
                    Selector::tag("outputFilePath"),
                ]),
                PatchAction::SetText(file.into()),
            )
            .when_absent(WhenAbsent::Create)
            .registering(Registration::execute_drivers()),
        );
    }

    directives
}

impl Preparer<'_> {
    /// Prepare an LCSIM job file
    ///
    /// # Errors
    /// - input file not found
    /// - an overlay driver is present and the overlay provider has no files
    /// - parse and write failures naming `template`
    pub fn lcsim(
        &self,
        template: &Path,
        output: &Path,
        params: &ParameterSet,
    ) -> PrepResult<SynthesisOutput> {
        self.lcsim_job(template, output, params)
            .map_err(|e| e.in_template(template))
    }

    fn lcsim_job(
        &self,
        template: &Path,
        output: &Path,
        params: &ParameterSet,
    ) -> PrepResult<SynthesisOutput> {
        let document = self.read_xml(template)?;
        let inputs = self.resolve_all(&params.list(keys::INPUT_FILES))?;
        let directives = lcsim_directives(params, self.config(), &inputs);
        let (patched, report) = self.patch(template, &document, &directives)?;
        let marker = report.get(MARKER_LABEL).and_then(|o| o.text.clone());
        tracing::debug!(marker = ?marker, changed = report.changed_count(), "lcsim job patched");
        let checksum = self.write_xml(template, output, &patched)?;
        Ok(finish(
            Family::Lcsim,
            output,
            checksum,
            ArtifactMetadata::Lcsim { marker },
        ))
    }
}
