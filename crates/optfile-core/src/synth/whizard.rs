//! Whizard generator input
//!
//! Two template styles exist. Marker mode rewrites the lines of a plain
//! `whizard.in` that mention a field name; token mode substitutes lines
//! carrying a doubled upper-case token such as `SEEDSEED`.

use super::{derive_seed, finish, Preparer};
use crate::error::PrepResult;
use crate::keys::{self, whizard as token};
use crate::types::{ArtifactMetadata, Family, ParameterSet, SynthesisOutput};
use optfile_template::{FlagCheck, LineRewriter, LineRule};
use std::path::Path;

/// Flag raised when a `process_id` line carries a quoted value
pub const PROCESS_ID_FOUND: &str = "process_id_found";

/// Token table: token, parameter, rendered line
const TOKENS: [(&str, &str, &str); 16] = [
    ("SEEDSEED", token::SEED, " seed = {}"),
    ("ENERGYENERGY", token::ENERGY, " sqrts = {}"),
    ("RECOILRECOIL", token::RECOIL, " beam_recoil = {}"),
    ("NBEVTSNBEVTS", token::NBEVTS, " n_events = {}"),
    ("LUMILUMI", token::LUMI, " luminosity={}"),
    ("INITIALSINITIALS", token::INITIALS, " keep_initials = {}"),
    ("PNAME1PNAME1", token::PNAME1, " particle_name = '{}'"),
    ("PNAME2PNAME2", token::PNAME2, " particle_name = '{}'"),
    ("POLAB1POLAB1", token::POLAB1, " polarization = {}"),
    ("POLAB2POLAB2", token::POLAB2, " polarization = {}"),
    ("USERB1USERB1", token::USERB1, " USER_spectrum_on = {}"),
    ("USERB2USERB2", token::USERB2, " USER_spectrum_on = {}"),
    ("ISRB1ISRB1", token::ISRB1, " ISR_on = {}"),
    ("ISRB2ISRB2", token::ISRB2, " ISR_on = {}"),
    ("EPAB1EPAB1", token::EPAB1, " EPA_on = {}"),
    ("EPAB2EPAB2", token::EPAB2, " EPA_on = {}"),
];

fn trailing_rules(event_type: Option<&str>) -> [LineRule; 2] {
    [
        LineRule::replace(
            "write_events_file",
            format!(" write_events_file = \"{}\" ", event_type.unwrap_or_default()),
        )
        .when(event_type.is_some()),
        LineRule::flag("process_id", PROCESS_ID_FOUND, FlagCheck::QuotedValueNonEmpty),
    ]
}

/// Marker-mode rule table for `params`
///
/// # Errors
/// Fails when no seed can be derived
pub fn whizard_marker_rewriter(params: &ParameterSet) -> PrepResult<LineRewriter> {
    let seed = derive_seed(params)?;
    let energy = params.text(keys::ENERGY);
    let events = params.text(keys::NB_EVENTS);
    let lumi = params.text(keys::LUMINOSITY).filter(|_| params.flag(keys::LUMINOSITY));
    let event_type = params.text(keys::EVENT_TYPE);

    let mut rules = vec![
        LineRule::replace("seed", format!(" seed = {seed}")),
        LineRule::replace("sqrts", format!(" sqrts = {}", energy.as_deref().unwrap_or_default()))
            .when(energy.is_some()),
        LineRule::replace("n_events", format!(" n_events = {}", events.as_deref().unwrap_or_default()))
            .when(lumi.is_none() && events.is_some()),
        LineRule::replace("luminosity", format!(" luminosity = {}", lumi.as_deref().unwrap_or_default()))
            .when(lumi.is_some()),
    ];
    rules.extend(trailing_rules(event_type.as_deref()));
    Ok(LineRewriter::new(rules))
}

/// Token-mode rule table; token values are read at rewrite time
#[must_use]
pub fn whizard_token_rewriter(event_type: Option<&str>) -> LineRewriter {
    let mut rules: Vec<LineRule> = TOKENS
        .iter()
        .map(|(marker, param, line)| {
            let rule = LineRule::render(*marker, *param, *line);
            if *param == token::LUMI {
                rule.when_truthy(token::LUMI)
            } else {
                rule
            }
        })
        .collect();
    rules.extend(trailing_rules(event_type));
    LineRewriter::new(rules)
}

impl Preparer<'_> {
    /// Prepare a marker-mode `whizard.in`
    ///
    /// # Errors
    /// Parse, field and write failures naming `template`
    pub fn whizard(
        &self,
        template: &Path,
        output: &Path,
        params: &ParameterSet,
    ) -> PrepResult<SynthesisOutput> {
        let rewriter = whizard_marker_rewriter(params).map_err(|e| e.in_template(template))?;
        self.whizard_with(Family::Whizard, template, output, params, &rewriter)
    }

    /// Prepare a token-mode whizard template
    ///
    /// # Errors
    /// Parse and write failures naming `template`; a token whose parameter
    /// is absent is a missing field
    pub fn whizard_template(
        &self,
        template: &Path,
        output: &Path,
        params: &ParameterSet,
    ) -> PrepResult<SynthesisOutput> {
        let rewriter = whizard_token_rewriter(params.text(keys::EVENT_TYPE).as_deref());
        self.whizard_with(Family::WhizardTemplate, template, output, params, &rewriter)
    }

    fn whizard_with(
        &self,
        family: Family,
        template: &Path,
        output: &Path,
        params: &ParameterSet,
        rewriter: &LineRewriter,
    ) -> PrepResult<SynthesisOutput> {
        let document = self.read_lines(template)?;
        let rewritten = self.rewrite(Some(template), rewriter, &document, params)?;
        let process_id_found = rewritten.flag(PROCESS_ID_FOUND);
        tracing::debug!(process_id_found, "whizard input rewritten");
        let checksum = self.write_lines(Some(template), output, &rewritten.document)?;
        Ok(finish(
            family,
            output,
            checksum,
            ArtifactMetadata::Whizard { process_id_found },
        ))
    }
}
