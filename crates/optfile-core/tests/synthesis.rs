//! End-to-end synthesis tests.
//!
//! Each scenario lays out a job working directory on disk, runs one
//! synthesizer through [`Preparer`] and inspects the written artifact:
//! - line-oriented families (Whizard, Mokka, SLIC) produce exact text
//! - structured families (Marlin, LCSIM) keep the template's shape and only
//!   touch the fields the job owns
//! - every failure names the template and the missing field or resource,
//!   and leaves no output behind

use optfile_core::{
    keys, ArtifactMetadata, ErrorKind, Family, ParameterSet, PrepConfig, Preparer,
};
use optfile_test_utils::{checksum_of, fixtures, init_tracing, params, Scratch};
use pretty_assertions::assert_eq;

fn whizard_params() -> ParameterSet {
    ParameterSet::new()
        .with(keys::SEED, 42i64)
        .with(keys::ENERGY, 3000i64)
        .with(keys::NB_EVENTS, 100i64)
        .with(keys::EVENT_TYPE, "zh")
}

/// Marker mode rewrites only the lines naming a job field.
#[test]
fn whizard_marker_mode_end_to_end() {
    init_tracing();
    let scratch = Scratch::new();
    let template = scratch.file("whizard.in", fixtures::WHIZARD_IN);
    let output = scratch.join("whizard.out");

    let out = scratch
        .preparer(PrepConfig::default())
        .prepare(Family::Whizard, Some(&template), &output, &whizard_params())
        .unwrap();

    assert_eq!(
        scratch.read("whizard.out"),
        "&process_input\n \
         process_id = \"ee_zh\"\n \
         sqrts = 3000\n \
         luminosity = 0\n\
         /\n\
         &integration_input\n \
         seed = 42\n\
         /\n\
         &simulation_input\n \
         n_events = 100\n \
         write_events_file = \"zh\" \n\
         /\n"
    );
    assert_eq!(out.family, Family::Whizard);
    assert_eq!(out.metadata, ArtifactMetadata::Whizard { process_id_found: true });
    assert_eq!(out.checksum, checksum_of(&output));
}

/// Without an explicit seed the production and job ids form it.
#[test]
fn whizard_seed_from_job_identity() {
    let scratch = Scratch::new();
    let template = scratch.file("whizard.in", fixtures::WHIZARD_IN);
    let output = scratch.join("whizard.out");
    let params = ParameterSet::new()
        .with(keys::PRODUCTION_ID, 12i64)
        .with(keys::JOB_ID, 34i64);

    scratch
        .preparer(PrepConfig::default())
        .whizard(&template, &output, &params)
        .unwrap();

    let text = scratch.read("whizard.out");
    assert!(text.contains("\n seed = 1234\n"));
    assert!(text.contains("\n sqrts = 500\n"));
    assert!(text.contains("\n write_events_file = \"\"\n"));
}

#[test]
fn whizard_token_mode_end_to_end() {
    use optfile_core::keys::whizard as token;

    let scratch = Scratch::new();
    let template = scratch.file("whizard.template", fixtures::WHIZARD_TEMPLATE);
    let output = scratch.join("whizard.in");
    let params = ParameterSet::new()
        .with(token::SEED, 5i64)
        .with(token::ENERGY, 3000i64)
        .with(token::NBEVTS, 100i64)
        .with(token::LUMI, 0i64)
        .with(token::PNAME1, "e1")
        .with(token::POLAB1, "0.8 0.0");

    let out = scratch
        .preparer(PrepConfig::default())
        .prepare(Family::WhizardTemplate, Some(&template), &output, &params)
        .unwrap();

    assert_eq!(
        scratch.read("whizard.in"),
        "&process_input\n \
         process_id = \"ee_h\"\n \
         seed = 5\n \
         sqrts = 3000\n \
         n_events = 100\n\
         LUMILUMI\n\
         /\n\
         &beam_input\n \
         particle_name = 'e1'\n \
         polarization = 0.8 0.0\n\
         /\n"
    );
    assert_eq!(out.metadata, ArtifactMetadata::Whizard { process_id_found: true });
}

#[test]
fn whizard_token_without_value_names_template() {
    let scratch = Scratch::new();
    let template = scratch.file("whizard.template", fixtures::WHIZARD_TEMPLATE);
    let output = scratch.join("whizard.in");
    let params = ParameterSet::new().with(keys::whizard::SEED, 5i64);

    let err = scratch
        .preparer(PrepConfig::default())
        .whizard_template(&template, &output, &params)
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::FieldMissing);
    assert_eq!(err.template(), Some(template.as_path()));
    assert!(err.to_string().contains("'ENERGY'"));
    assert!(err.to_string().contains("whizard.template"));
    assert!(!output.exists());
}

fn mokka_params() -> ParameterSet {
    ParameterSet::new()
        .with(keys::SEED, 7i64)
        .with(keys::NB_EVENTS, 20i64)
        .with(keys::DETECTOR_MODEL, "CLIC_SiD_CDR")
        .with(keys::OUTPUT_FILE, "sim.slcio")
        .with(keys::INPUT_DATA, vec!["LFN:/ilc/prod/gen.stdhep"])
}

/// The generator file is found in a subdirectory and bound in a mac file
/// written next to the steering file.
#[test]
fn mokka_generates_mac_next_to_output() {
    init_tracing();
    let scratch = Scratch::new();
    let template = scratch.file("mokka.steer", fixtures::MOKKA_STEERING);
    let generator = scratch.file("run1/gen.stdhep", "events");
    let output = scratch.join("mokka.out");

    let out = scratch
        .preparer(PrepConfig::default())
        .prepare(Family::Mokka, Some(&template), &output, &mokka_params())
        .unwrap();

    let mac = scratch.join("mokkamac.mac");
    assert_eq!(
        out.metadata,
        ArtifactMetadata::Mokka {
            mac_file: mac.clone(),
            generated_mac: true,
        }
    );
    assert_eq!(
        scratch.read("mokkamac.mac"),
        format!("/generator/generator {}\n/run/beamOn 20\n", generator.display())
    );
    assert_eq!(
        scratch.read("mokka.out"),
        format!(
            "/Mokka/init/dbHost polui01.in2p3.fr\n\
             /Mokka/init/user consult\n\
             #Set detector model to value specified\n\
             /Mokka/init/detectorModel CLIC_SiD_CDR\n\
             #Set debug level to 1\n\
             /Mokka/init/printLevel 1\n\
             #Set batch mode to true\n\
             /Mokka/init/BatchMode true\n\
             #Set mac file to the one created on the site\n\
             /Mokka/init/initialMacroFile {}\n\
             #Setting random seed\n\
             /Mokka/init/randomSeed 7\n\
             #Set outputfile name to job specified\n\
             /Mokka/init/lcioFilename sim.slcio\n\
             #Set event start number to value given as job parameter\n\
             /Mokka/init/startEventNumber 0\n",
            mac.display()
        )
    );
}

#[test]
fn mokka_user_mac_is_not_regenerated() {
    let scratch = Scratch::new();
    let template = scratch.file("mokka.steer", fixtures::MOKKA_STEERING);
    let user_mac = scratch.file("user.mac", "/run/beamOn 3\n");
    let output = scratch.join("mokka.out");
    let params = ParameterSet::new()
        .with(keys::SEED, 7i64)
        .with(keys::MAC_FILE, "LFN:/ilc/user/user.mac");

    let out = scratch
        .preparer(PrepConfig::default())
        .mokka(&template, &output, &params)
        .unwrap();

    assert_eq!(
        out.metadata,
        ArtifactMetadata::Mokka {
            mac_file: user_mac.clone(),
            generated_mac: false,
        }
    );
    assert!(!scratch.exists("mokkamac.mac"));
    assert_eq!(scratch.read("user.mac"), "/run/beamOn 3\n");
    assert!(scratch
        .read("mokka.out")
        .contains(&format!("/Mokka/init/initialMacroFile {}\n", user_mac.display())));
}

#[test]
fn mokka_without_event_count_writes_nothing() {
    let scratch = Scratch::new();
    let template = scratch.file("mokka.steer", fixtures::MOKKA_STEERING);
    let output = scratch.join("mokka.out");
    let params = ParameterSet::new().with(keys::SEED, 7i64);

    let err = scratch
        .preparer(PrepConfig::default())
        .mokka(&template, &output, &params)
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::FieldMissing);
    assert_eq!(err.template(), Some(template.as_path()));
    assert!(err.to_string().contains("'nbEvents'"));
    assert!(!scratch.exists("mokka.out"));
    assert!(!scratch.exists("mokkamac.mac"));
}

fn slic_params() -> ParameterSet {
    ParameterSet::new()
        .with(keys::DETECTOR_MODEL, "clic_sid_cdr")
        .with(keys::NB_EVENTS, 10i64)
        .with(keys::SEED, 3i64)
        .with(keys::OUTPUT_FILE, "out.slcio")
}

#[test]
fn slic_with_template() {
    let scratch = Scratch::new();
    let template = scratch.file("slic.mac", fixtures::SLIC_MAC);
    let generator = scratch.file("gen.stdhep", "events");
    let output = scratch.join("slicmac.mac");
    let params = slic_params().with(keys::GENERATOR_FILE, "gen.stdhep");

    let out = scratch
        .preparer(PrepConfig::default())
        .prepare(Family::Slic, Some(&template), &output, &params)
        .unwrap();

    assert_eq!(
        scratch.read("slicmac.mac"),
        format!(
            "/lcdd/url clic_sid_cdr.lcdd\n\
             /lcio/filename out.slcio\n\
             /run/initialize\n\
             /generator/filename {}\n\
             /generator/skipEvents 0\n\
             /random/seed 3\n\
             /run/beamOn 10\n",
            generator.display()
        )
    );
    assert_eq!(
        out.metadata,
        ArtifactMetadata::Slic {
            input_file: Some(generator.display().to_string()),
            seed: "3".to_string(),
        }
    );
}

#[test]
fn slic_without_any_template() {
    let scratch = Scratch::new();
    let output = scratch.join("slicmac.mac");

    scratch
        .preparer(PrepConfig::default())
        .prepare(Family::Slic, None, &output, &slic_params().with(keys::START_FROM, 100i64))
        .unwrap();

    assert_eq!(
        scratch.read("slicmac.mac"),
        "/lcdd/url clic_sid_cdr.lcdd\n\
         /lcio/filename out.slcio\n\
         /generator/skipEvents 100\n\
         /random/seed 3\n\
         /run/beamOn 10\n"
    );
}

#[test]
fn slic_user_mac_from_steering_directory() {
    let scratch = Scratch::new();
    let install = Scratch::new();
    install.file("steering/user.mac", "/run/initialize\n/vis/disable\n");
    let output = scratch.join("slicmac.mac");
    let config = PrepConfig::default().with_steering_dir(install.join("steering"));
    let params = slic_params().with(keys::MAC_FILE, "user.mac");

    scratch
        .preparer(config)
        .slic(None, &output, &params)
        .unwrap();

    let text = scratch.read("slicmac.mac");
    assert!(text.starts_with("/lcdd/url clic_sid_cdr.lcdd\n/lcio/filename out.slcio\n/run/initialize\n/vis/disable\n"));
    assert!(text.ends_with("/run/beamOn 10\n"));
}

#[test]
fn slic_missing_detector_names_field_and_template() {
    let scratch = Scratch::new();
    let template = scratch.file("slic.mac", fixtures::SLIC_MAC);
    let output = scratch.join("slicmac.mac");
    let params = ParameterSet::new()
        .with(keys::NB_EVENTS, 10i64)
        .with(keys::SEED, 3i64);

    let err = scratch
        .preparer(PrepConfig::default())
        .slic(Some(&template), &output, &params)
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::FieldMissing);
    assert!(err.to_string().contains("'detectorModel'"));
    assert!(err.to_string().contains("slic.mac"));
    assert!(!output.exists());
}

#[test]
fn slic_missing_user_mac_is_resource_not_found() {
    let scratch = Scratch::new();
    let output = scratch.join("slicmac.mac");
    let params = slic_params().with(keys::MAC_FILE, "nowhere.mac");

    let err = scratch
        .preparer(PrepConfig::default())
        .slic(None, &output, &params)
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::ResourceNotFound);
    assert!(err.to_string().contains("nowhere.mac"));
}

#[test]
fn marlin_steering_end_to_end() {
    init_tracing();
    let scratch = Scratch::new();
    let template = scratch.file("marlin.xml", fixtures::MARLIN_XML);
    let first = scratch.file("a.slcio", "rec");
    let second = scratch.file("run1/b.slcio", "rec");
    let output = scratch.join("marlin_out.xml");
    let params = ParameterSet::new()
        .with(keys::INPUT_FILES, vec!["LFN:/ilc/a.slcio", "b.slcio"])
        .with(keys::NB_EVENTS, 50i64)
        .with(keys::OUTPUT_REC, "rec_out.slcio");

    let out = scratch
        .preparer(PrepConfig::default())
        .prepare(Family::Marlin, Some(&template), &output, &params)
        .unwrap();

    let text = scratch.read("marlin_out.xml");
    assert!(text.starts_with("<?xml version=\"1.0\" encoding=\"us-ascii\"?>"));
    assert!(text.contains(&format!(
        "<parameter name=\"LCIOInputFiles\">{} {}</parameter>",
        first.display(),
        second.display()
    )));
    assert!(text.contains("<parameter name=\"MaxRecordNumber\" value=\"50\"/>"));
    assert!(text.contains("<parameter name=\"GearXMLFile\">gear.xml</parameter>"));
    assert!(text.contains("options=\"DEBUG0-4,MESSAGE0-4,WARNING0-4,ERROR0-4,SILENT\">SILENT</parameter>"));
    assert!(text.contains("<!--REC file changed-->"));
    assert!(text.contains("<parameter name=\"LCIOOutputFile\" type=\"string\">rec_out.slcio</parameter>"));
    assert_eq!(out.metadata, ArtifactMetadata::Marlin { inputs: vec![first, second] });
}

#[test]
fn marlin_overlay_needs_a_provider() {
    let scratch = Scratch::new();
    let template = scratch.file("marlin.xml", fixtures::MARLIN_OVERLAY_XML);
    let output = scratch.join("marlin_out.xml");
    let params = ParameterSet::new();

    let err = scratch
        .preparer(PrepConfig::default())
        .marlin(&template, &output, &params)
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ResourceNotFound);
    assert_eq!(err.template(), Some(template.as_path()));
    assert!(!output.exists());

    let background = vec!["/bg/1.slcio".to_string(), "/bg/2.slcio".to_string()];
    let preparer = Preparer::with_overlay(scratch.resolver(), PrepConfig::default(), &background);
    preparer.marlin(&template, &output, &params).unwrap();
    assert!(scratch.read("marlin_out.xml").contains(
        "<parameter name=\"BackgroundFileNames\" type=\"StringVec\">/bg/1.slcio\n/bg/2.slcio</parameter>"
    ));
}

#[test]
fn marlin_missing_input_fails_whole_call() {
    let scratch = Scratch::new();
    let template = scratch.file("marlin.xml", fixtures::MARLIN_XML);
    let output = scratch.join("marlin_out.xml");
    let params = params([(keys::INPUT_FILES, vec!["missing.slcio"])]);

    let err = scratch
        .preparer(PrepConfig::default())
        .marlin(&template, &output, &params)
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::ResourceNotFound);
    assert!(err.to_string().contains("missing.slcio"));
    assert!(err.to_string().contains("marlin.xml"));
    assert!(!output.exists());
}

/// A requested writer that the template lacks is synthesized and listed
/// for execution exactly once.
#[test]
fn lcsim_writer_is_synthesized_and_registered() {
    init_tracing();
    let scratch = Scratch::new();
    let template = scratch.file("job.lcsim", fixtures::LCSIM_XML);
    let output = scratch.join("job_out.lcsim");
    let params = ParameterSet::new().with(keys::OUTPUT_FILE, "out.slcio");

    let out = scratch
        .preparer(PrepConfig::default())
        .prepare(Family::Lcsim, Some(&template), &output, &params)
        .unwrap();

    let text = scratch.read("job_out.lcsim");
    assert_eq!(text.matches("<driver name=\"Writer\"/>").count(), 1);
    assert_eq!(text.matches("<driver name=\"evtMarker\"/>").count(), 1);
    assert!(text.contains("<driver name=\"Reco\"/>"));
    assert!(text.contains(
        "<driver name=\"Writer\" type=\"org.lcsim.util.loop.LCIODriver\"><!--Writer output changed--><outputFilePath>out.slcio</outputFilePath></driver>"
    ));
    assert!(text.contains("<eventInterval>1</eventInterval>"));
    assert!(text.contains("<marker>LCSIM</marker>"));
    assert_eq!(
        out.metadata,
        ArtifactMetadata::Lcsim {
            marker: Some("LCSIM".to_string()),
        }
    );
}

/// A declared Writer without an output path gets one; nothing is duplicated.
#[test]
fn lcsim_existing_writer_gains_output_path() {
    let scratch = Scratch::new();
    let template = scratch.file(
        "job.lcsim",
        r#"<lcsim>
  <execute>
    <driver name="Reco"/>
    <driver name="Writer"/>
  </execute>
  <drivers>
    <driver name="Reco" type="org.lcsim.recon.Reconstruction"/>
    <driver name="Writer" type="org.lcsim.util.loop.LCIODriver"/>
  </drivers>
</lcsim>
"#,
    );
    let output = scratch.join("job_out.lcsim");
    let params = ParameterSet::new().with(keys::OUTPUT_FILE, "out.slcio");

    scratch
        .preparer(PrepConfig::default())
        .lcsim(&template, &output, &params)
        .unwrap();

    let text = scratch.read("job_out.lcsim");
    assert_eq!(text.matches("<driver name=\"Writer\" type=").count(), 1);
    assert!(text.contains(
        "<driver name=\"Writer\" type=\"org.lcsim.util.loop.LCIODriver\"><!--Writer output changed--><outputFilePath>out.slcio</outputFilePath></driver>"
    ));
    assert_eq!(text.matches("<driver name=\"Writer\"/>").count(), 1);
    assert!(!text.contains("Writer registered for execution"));
}

/// An execute list that already names Writer is not extended.
#[test]
fn lcsim_listed_writer_is_not_registered_twice() {
    let scratch = Scratch::new();
    let template = scratch.file(
        "job.lcsim",
        r#"<lcsim>
  <execute>
    <driver name="Writer"/>
    <driver name="Reco"/>
  </execute>
  <drivers>
    <driver name="Reco" type="org.lcsim.recon.Reconstruction"/>
  </drivers>
</lcsim>
"#,
    );
    let output = scratch.join("job_out.lcsim");
    let params = ParameterSet::new().with(keys::OUTPUT_FILE, "out.slcio");

    scratch
        .preparer(PrepConfig::default())
        .lcsim(&template, &output, &params)
        .unwrap();

    let text = scratch.read("job_out.lcsim");
    assert_eq!(text.matches("<driver name=\"Writer\"/>").count(), 1);
    assert!(text.contains("<driver name=\"Writer\" type=\"org.lcsim.util.loop.LCIODriver\">"));
    assert!(!text.contains("Writer registered for execution"));
    assert!(text.contains("evtMarker registered for execution"));
}

/// Running on an already prepared job file changes nothing.
#[test]
fn lcsim_rerun_is_byte_identical() {
    let scratch = Scratch::new();
    let template = scratch.file("job.lcsim", fixtures::LCSIM_XML);
    let once = scratch.join("once.lcsim");
    let twice = scratch.join("twice.lcsim");
    let params = ParameterSet::new()
        .with(keys::OUTPUT_REC, "rec.slcio")
        .with(keys::OUTPUT_DST, "dst.slcio")
        .with(keys::JARS, vec!["extra.jar"])
        .with(keys::DEBUG, true);
    let preparer = scratch.preparer(PrepConfig::default());

    let first = preparer.lcsim(&template, &once, &params).unwrap();
    let second = preparer.lcsim(&once, &twice, &params).unwrap();

    assert_eq!(scratch.read("once.lcsim"), scratch.read("twice.lcsim"));
    assert_eq!(first.checksum, second.checksum);
}

#[test]
fn lcsim_settings_from_config_file() {
    let scratch = Scratch::new();
    let config_path = scratch.file(
        "optfile.toml",
        "lcsim_print_every_event = 5\nlcsim_marker = \"PROD\"\n",
    );
    let config = PrepConfig::from_file(&config_path).unwrap();
    let template = scratch.file("job.lcsim", fixtures::LCSIM_XML);
    let output = scratch.join("job_out.lcsim");

    let out = scratch
        .preparer(config)
        .lcsim(&template, &output, &ParameterSet::new())
        .unwrap();

    let text = scratch.read("job_out.lcsim");
    assert!(text.contains("<eventInterval>5</eventInterval>"));
    assert!(text.contains("<marker>PROD</marker>"));
    assert_eq!(out.metadata, ArtifactMetadata::Lcsim { marker: Some("PROD".to_string()) });
}

/// Subdirectory consumption is scoped to a single resolve call.
#[test]
fn resolver_claims_are_per_call() {
    let scratch = Scratch::new();
    let expected = scratch.file("run1/evts.slcio", "x");
    let resolver = scratch.resolver();

    assert_eq!(resolver.resolve(&["evts.slcio"]).unwrap(), vec![expected.clone()]);
    assert_eq!(resolver.resolve(&["LFN:/a/b/evts.slcio"]).unwrap(), vec![expected]);
}

#[test]
fn resolver_exhausts_subdirectories() {
    let scratch = Scratch::new();
    let first = scratch.file("run1/evts.slcio", "x");
    let second = scratch.file("run2/evts.slcio", "x");
    let resolver = scratch.resolver();

    assert_eq!(
        resolver.resolve(&["evts.slcio", "evts.slcio"]).unwrap(),
        vec![first, second]
    );
    let err = resolver
        .resolve(&["evts.slcio", "evts.slcio", "evts.slcio"])
        .unwrap_err();
    assert!(err.to_string().contains("evts.slcio"));
}

#[test]
fn same_inputs_same_checksum() {
    let scratch = Scratch::new();
    let template = scratch.file("marlin.xml", fixtures::MARLIN_XML);
    let params = ParameterSet::new().with(keys::NB_EVENTS, 5i64);
    let preparer = scratch.preparer(PrepConfig::default());

    let a = preparer.marlin(&template, &scratch.join("a.xml"), &params).unwrap();
    let b = preparer.marlin(&template, &scratch.join("b.xml"), &params).unwrap();

    assert_eq!(a.checksum, b.checksum);
    assert_eq!(a.checksum, checksum_of(&scratch.join("a.xml")));
    assert_eq!(scratch.read("a.xml"), scratch.read("b.xml"));
}

#[test]
fn malformed_template_is_parse_error_naming_path() {
    let scratch = Scratch::new();
    let template = scratch.file("broken.xml", "<marlin><global></marlin>");
    let output = scratch.join("out.xml");

    let err = scratch
        .preparer(PrepConfig::default())
        .marlin(&template, &output, &ParameterSet::new())
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Parse);
    assert!(!err.is_retryable());
    assert!(err.to_string().contains("broken.xml"));
    assert!(!output.exists());
}

#[test]
fn unreadable_template_is_parse_error() {
    let scratch = Scratch::new();
    let template = scratch.join("absent.in");

    let err = scratch
        .preparer(PrepConfig::default())
        .whizard(&template, &scratch.join("out"), &whizard_params())
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Parse);
    assert_eq!(err.template(), Some(template.as_path()));
}

#[test]
fn unwritable_output_is_write_error() {
    let scratch = Scratch::new();
    let template = scratch.file("whizard.in", fixtures::WHIZARD_IN);
    let output = scratch.join("no/such/dir/whizard.out");

    let err = scratch
        .preparer(PrepConfig::default())
        .whizard(&template, &output, &whizard_params())
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Write);
    assert_eq!(err.template(), Some(template.as_path()));
    assert!(err.to_string().contains("whizard.out"));
}

#[test]
fn template_required_except_for_slic() {
    let scratch = Scratch::new();
    let err = scratch
        .preparer(PrepConfig::default())
        .prepare(Family::Marlin, None, &scratch.join("out.xml"), &ParameterSet::new())
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::ResourceNotFound);
    assert!(err.to_string().contains("marlin template"));
}
