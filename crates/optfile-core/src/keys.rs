//! Parameter Set keys understood by the synthesizers

/// Random seed
pub const SEED: &str = "seed";
/// Centre-of-mass energy
pub const ENERGY: &str = "energy";
/// Number of events to generate or process
pub const NB_EVENTS: &str = "nbEvents";
/// Integrated luminosity (generation by luminosity instead of event count)
pub const LUMINOSITY: &str = "lumi";
/// Process type, used as the generator output stem
pub const EVENT_TYPE: &str = "evtType";
/// First event to read from the generator file
pub const START_FROM: &str = "startFrom";
/// Detector geometry name
pub const DETECTOR_MODEL: &str = "detectorModel";
/// Main output file
pub const OUTPUT_FILE: &str = "outputFile";
/// Reconstruction output file
pub const OUTPUT_REC: &str = "outputREC";
/// Data summary output file
pub const OUTPUT_DST: &str = "outputDST";
/// Keep the template's verbosity instead of forcing quiet output
pub const DEBUG: &str = "debug";
/// Logical names of event input files
pub const INPUT_FILES: &str = "inputFiles";
/// Geometry description file
pub const GEAR_FILE: &str = "gearFile";
/// Extra classpath entries
pub const JARS: &str = "jars";
/// Conditions cache directory
pub const CACHE_DIR: &str = "cacheDir";
/// Generator event file
pub const GENERATOR_FILE: &str = "stdhepFile";
/// User-supplied macro file
pub const MAC_FILE: &str = "macFile";
/// Job identifier
pub const JOB_ID: &str = "jobID";
/// Production identifier
pub const PRODUCTION_ID: &str = "productionID";
/// Job input data (logical file names)
pub const INPUT_DATA: &str = "InputData";

/// Keys of the token-mode whizard template
pub mod whizard {
    /// Random seed
    pub const SEED: &str = "SEED";
    /// Centre-of-mass energy
    pub const ENERGY: &str = "ENERGY";
    /// Beam recoil switch
    pub const RECOIL: &str = "RECOIL";
    /// Number of events
    pub const NBEVTS: &str = "NBEVTS";
    /// Luminosity
    pub const LUMI: &str = "LUMI";
    /// Keep initial-state particles
    pub const INITIALS: &str = "INITIALS";
    /// First beam particle
    pub const PNAME1: &str = "PNAME1";
    /// Second beam particle
    pub const PNAME2: &str = "PNAME2";
    /// First beam polarization
    pub const POLAB1: &str = "POLAB1";
    /// Second beam polarization
    pub const POLAB2: &str = "POLAB2";
    /// First beam user spectrum
    pub const USERB1: &str = "USERB1";
    /// Second beam user spectrum
    pub const USERB2: &str = "USERB2";
    /// First beam ISR
    pub const ISRB1: &str = "ISRB1";
    /// Second beam ISR
    pub const ISRB2: &str = "ISRB2";
    /// First beam EPA
    pub const EPAB1: &str = "EPAB1";
    /// Second beam EPA
    pub const EPAB2: &str = "EPAB2";
}
