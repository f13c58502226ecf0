//! Built-in jobs.
//!
//! `plot_tuple` histograms the mu-tau and e-tau final states of a PAT tuple:
//! kinematics, overlap flags, b-tag discriminators and trigger bits.

use hc_core::Result;

use crate::descriptor::{DescriptorFields, Overrides};
use crate::job::{AnalyzerConfig, ExecutionPath, JobBuilder, JobConfig};
use crate::options::JobOptions;
use crate::store::TemplateStore;

/// Process name of the plot-tuple job.
pub const PLOT_TUPLE_PROCESS: &str = "TUPLETEST";

/// Histograms of the `mt` analyzer, in output order.
const MU_TAU_HISTOGRAMS: [&str; 15] = [
    "pt",
    "hasMuons",
    "hasElectrons",
    "muon_jetpt",
    "tau_disc",
    "muon_reljetpt",
    "hasTaus",
    "extras_jetbtag",
    "jetbtag",
    "extras_jetpt",
    "lhe_info",
    "hltPass",
    "hltGroup",
    "hltPrescale",
    "process_id",
];

/// Option defaults of the plot-tuple job.
pub fn plot_tuple_options() -> JobOptions {
    let mut options = JobOptions::new().register_int("ewkSkim", 1);
    options.input_files = vec!["file:output.root".into()];
    options.output_file = "plots.root".into();
    options
}

/// Templates used by the plot-tuple job, keyed as in its configuration.
pub fn plot_tuple_templates() -> Result<TemplateStore> {
    let mut store = TemplateStore::new();

    store.define(
        "pt",
        DescriptorFields {
            name: "Pt".into(),
            description: "p_{T}".into(),
            plotquantity: "pt".into(),
            min: 0.0,
            max: 200.0,
            nbins: 100,
            lazy_parsing: true,
        },
    )?;
    store.define(
        "hasMuons",
        DescriptorFields {
            name: "hasExtMuons".into(),
            description: "Has Ext Muons".into(),
            plotquantity: "hasOverlaps('extMuons')".into(),
            min: -0.5,
            max: 1.5,
            nbins: 2,
            lazy_parsing: true,
        },
    )?;

    store.derive(
        "hasElectrons",
        "hasMuons",
        &Overrides::new()
            .set("description", "Has Ext Electrons")
            .set("name", "hasExtElectrons")
            .set("plotquantity", "hasOverlaps('extElecs')"),
    )?;
    store.derive(
        "hasTaus",
        "hasMuons",
        &Overrides::new()
            .set("description", "Has Ext Taus")
            .set("name", "hasExtTaus")
            .set("plotquantity", "hasOverlaps('extTaus')"),
    )?;

    store.derive(
        "muon_jetpt",
        "pt",
        &Overrides::new()
            .set("name", "MuJetPt")
            .set("plotquantity", "daughter(0).userFloat('jetPt')"),
    )?;
    store.derive(
        "tau_disc",
        "pt",
        &Overrides::new()
            .set("name", "TauIso")
            .set("plotquantity", "daughter(1).tauID('byVLooseCombinedIsolationDeltaBetaCorr')"),
    )?;
    store.derive(
        "muon_reljetpt",
        "pt",
        &Overrides::new()
            .set("min", 0)
            .set("max", 5)
            .set("nbins", 100)
            .set("name", "RelMuJetPt")
            .set("plotquantity", "daughter(0).pt/daughter(0).userFloat('jetPt')"),
    )?;
    store.derive(
        "extras_jetpt",
        "pt",
        &Overrides::new().set("description", "Ext Jet Pt").set("name", "extJetPt").set(
            "plotquantity",
            "? extras('extTaus', '').size() ? extras('extTaus', '')[0].userCand('patJet').pt : -1",
        ),
    )?;

    let btag = |description: &str, name: &str, plotquantity: &str| {
        Overrides::new()
            .set("min", -5)
            .set("max", 5)
            .set("nbins", 100)
            .set("description", description)
            .set("name", name)
            .set("plotquantity", plotquantity)
    };
    store.derive(
        "extras_jetbtag",
        "pt",
        &btag(
            "Ext Jet Btag",
            "extBtag",
            "? extras('extTaus', '').size() ? \
             extras('extTaus', '')[0].userCand('patJet').bDiscriminator('') : -1",
        ),
    )?;
    store.derive(
        "jetbtag",
        "pt",
        &btag(
            "CSV Jet Btag",
            "csvJet",
            "? extras('extTaus', '').size() ? \
             extras('extJets', '')[0].bDiscriminator('combinedSecondaryVertexBJetTags') : -5 ",
        ),
    )?;

    // Trigger expressions are regex lists matched by the evaluator.
    store.derive(
        "hltPass",
        "pt",
        &btag("HLT_15_or_30", "hlt", r"evt.hltResult('HLT_Mu15_v\d+,HLT_Mu30_v\d+')"),
    )?;
    store.derive(
        "hltGroup",
        "pt",
        &btag("HLT_15_or_30", "hltGrp", r"evt.hltGroup('HLT_Mu15_v\\d+,HLT_Mu30_v\\d+')"),
    )?;
    store.derive(
        "hltPrescale",
        "pt",
        &btag("HLT_15_or_30", "hltPrescale", r"evt.hltPrescale('HLT_Mu15_v\\d+,HLT_Mu30_v\\d+')"),
    )?;

    let counter = |description: &str, name: &str, plotquantity: &str| {
        Overrides::new()
            .set("min", 0)
            .set("max", 100)
            .set("nbins", 100)
            .set("description", description)
            .set("name", name)
            .set("plotquantity", plotquantity)
    };
    store.derive("lhe_info", "pt", &counter("LHE flag", "LHEFlag", "evt().lesHouches().NUP"))?;
    store.derive(
        "process_id",
        "pt",
        &counter("Process ID", "ProcessID", "evt().genEventInfo.signalProcessID()"),
    )?;

    store.derive(
        "calib_pt_diff",
        "pt",
        &Overrides::new()
            .set("min", -10)
            .set("max", 10)
            .set("nbins", 100)
            .set("description", "Diff between calib and uncalib energy")
            .set("name", "CalibPtDiff")
            .set("plotquantity", r#"daughter(0).pt - daughter(0).userCand("calibrated").pt"#),
    )?;

    Ok(store)
}

/// The plot-tuple job: `mt` over `finalStateMuTau`, `et` over
/// `finalStateElecTau`, scheduled as `mt*et`.
pub fn plot_tuple(options: &JobOptions) -> Result<JobConfig> {
    let store = plot_tuple_templates()?;

    let mt = store.list("mt", "finalStateMuTau", &MU_TAU_HISTOGRAMS)?;
    let et = store.list("et", "finalStateElecTau", &["calib_pt_diff"])?;

    JobBuilder::new(PLOT_TUPLE_PROCESS)
        .options(options)
        .add_analyzer(AnalyzerConfig::new(mt))
        .add_analyzer(AnalyzerConfig::new(et))
        .path(ExecutionPath::parse("p", "mt*et")?)
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn mu_tau_histograms_in_order() {
        let job = plot_tuple(&plot_tuple_options()).unwrap();
        let mt = job.analyzer("mt").unwrap();
        assert_eq!(
            mt.histograms().names(),
            vec![
                "Pt",
                "hasExtMuons",
                "hasExtElectrons",
                "MuJetPt",
                "TauIso",
                "RelMuJetPt",
                "hasExtTaus",
                "extBtag",
                "csvJet",
                "extJetPt",
                "LHEFlag",
                "hlt",
                "hltGrp",
                "hltPrescale",
                "ProcessID",
            ]
        );
        assert_eq!(mt.src(), "finalStateMuTau");
        assert_eq!(job.analyzer("et").unwrap().histograms().names(), vec!["CalibPtDiff"]);
        assert_eq!(job.path.sequence, vec!["mt", "et"]);
    }

    #[test]
    fn derived_templates_inherit_unset_fields() {
        let store = plot_tuple_templates().unwrap();

        let taus = store.get("hasTaus").unwrap();
        assert_eq!(taus.nbins(), 2);
        assert_relative_eq!(taus.min(), -0.5);

        let rel = store.get("muon_reljetpt").unwrap();
        assert_eq!(rel.description(), "p_{T}");
        assert_relative_eq!(rel.max(), 5.0);

        let hlt = store.get("hltPass").unwrap();
        assert_eq!(hlt.plotquantity(), r"evt.hltResult('HLT_Mu15_v\d+,HLT_Mu30_v\d+')");
        assert!(store.iter().all(|(_, d)| d.lazy_parsing()));
    }

    #[test]
    fn options_reach_the_job() {
        let mut options = plot_tuple_options();
        assert_eq!(options.get_int("ewkSkim"), Some(1));
        options.parse_arguments(["inputFiles=a.root", "maxEvents=50", "skipEvents=3"]).unwrap();
        let job = plot_tuple(&options).unwrap();
        assert_eq!(job.source.file_names, vec!["a.root"]);
        assert_eq!(job.max_events, 50);
        assert_eq!(job.source.skip_events, 3);
        assert_eq!(job.service.file_name, "plots.root");
    }
}
