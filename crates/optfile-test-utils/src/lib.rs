//! Testing utilities for the optfile workspace
//!
//! Sample templates for each family, a scratch working directory, and
//! tracing setup for tests.

#![allow(missing_docs)]

use optfile_artifact::ContentHash;
use optfile_core::{ParamValue, ParameterSet, PrepConfig, Preparer, Resolver};
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Sample templates, one per family
pub mod fixtures {
    pub const WHIZARD_IN: &str = "\
&process_input
 process_id = \"ee_zh\"
 sqrts = 500
 luminosity = 0
/
&integration_input
 seed = 12345
/
&simulation_input
 n_events = 10
 write_events_file = \"\"
/
";

    pub const WHIZARD_TEMPLATE: &str = "\
&process_input
 process_id = \"ee_h\"
SEEDSEED
ENERGYENERGY
NBEVTSNBEVTS
LUMILUMI
/
&beam_input
PNAME1PNAME1
POLAB1POLAB1
/
";

    pub const MOKKA_STEERING: &str = "\
/Mokka/init/detectorModel CLIC_ILD_CDR
/Mokka/init/dbHost polui01.in2p3.fr
/Mokka/init/user consult
/Mokka/init/BatchMode false
/Mokka/init/printLevel 5
/Mokka/init/lcioFilename template.slcio
";

    pub const SLIC_MAC: &str = "\
/lcdd/url old_detector.lcdd
/run/initialize
/generator/filename old.stdhep
/random/seed 1
/lcio/filename old.slcio
/run/beamOn 1
";

    pub const MARLIN_XML: &str = r#"<?xml version="1.0" encoding="us-ascii"?>
<marlin>
  <execute>
    <processor name="MyLCIOOutputProcessor"/>
  </execute>
  <global>
    <parameter name="LCIOInputFiles">input.slcio</parameter>
    <parameter name="MaxRecordNumber" value="0"/>
    <parameter name="GearXMLFile">gear.xml</parameter>
    <parameter name="Verbosity" options="DEBUG0-4,MESSAGE0-4,WARNING0-4,ERROR0-4,SILENT">DEBUG</parameter>
  </global>
  <processor name="MyLCIOOutputProcessor" type="LCIOOutputProcessor">
    <parameter name="LCIOOutputFile" type="string">rec.slcio</parameter>
  </processor>
</marlin>
"#;

    pub const MARLIN_OVERLAY_XML: &str = r#"<marlin>
  <global>
    <parameter name="Verbosity">DEBUG</parameter>
  </global>
  <processor name="MyOverlayTiming" type="OverlayTiming">
    <parameter name="BackgroundFileNames" type="StringVec">none</parameter>
  </processor>
</marlin>
"#;

    pub const LCSIM_XML: &str = r#"<lcsim xmlns:xs="http://www.w3.org/2001/XMLSchema-instance">
  <control>
    <numberOfEvents>-1</numberOfEvents>
  </control>
  <execute>
    <driver name="Reco"/>
  </execute>
  <drivers>
    <driver name="Reco" type="org.lcsim.recon.Reconstruction"/>
  </drivers>
</lcsim>
"#;
}

/// Install a test subscriber honouring `RUST_LOG`; later calls are no-ops
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Temporary job working directory
#[derive(Debug)]
pub struct Scratch {
    dir: TempDir,
}

impl Scratch {
    pub fn new() -> Self {
        Self {
            dir: tempfile::tempdir().expect("create scratch directory"),
        }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn join(&self, rel: &str) -> PathBuf {
        self.dir.path().join(rel)
    }

    /// Write `content` at `rel`, creating parent directories
    pub fn file(&self, rel: &str, content: &str) -> PathBuf {
        let path = self.join(rel);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).expect("create parent directories");
        }
        std::fs::write(&path, content).expect("write scratch file");
        path
    }

    pub fn subdir(&self, rel: &str) -> PathBuf {
        let path = self.join(rel);
        std::fs::create_dir_all(&path).expect("create subdirectory");
        path
    }

    pub fn read(&self, rel: &str) -> String {
        std::fs::read_to_string(self.join(rel)).expect("read scratch file")
    }

    pub fn exists(&self, rel: &str) -> bool {
        self.join(rel).exists()
    }

    pub fn resolver(&self) -> Resolver {
        Resolver::new(self.path())
    }

    pub fn preparer(&self, config: PrepConfig) -> Preparer<'static> {
        Preparer::new(self.resolver(), config)
    }
}

impl Default for Scratch {
    fn default() -> Self {
        Self::new()
    }
}

/// Parameter set from `(key, value)` pairs
pub fn params<V: Into<ParamValue>>(pairs: impl IntoIterator<Item = (&'static str, V)>) -> ParameterSet {
    pairs.into_iter().collect()
}

/// Fingerprint of a file on disk
pub fn checksum_of(path: &Path) -> ContentHash {
    ContentHash::compute(&std::fs::read(path).expect("read artifact"))
}
